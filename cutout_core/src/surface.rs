// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing contract between the scene and a render target.

use alloc::string::String;
use core::fmt;

use kurbo::Rect;

use crate::matrix::Matrix;

/// An opaque reference to a source image.
///
/// Images are decoded and owned by the host; the scene only passes the id
/// through to [`Surface::draw_image`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageId(pub u32);

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}

/// Error returned by a surface that could not draw an image region.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PasteError {
    /// The surface has no image registered under this id.
    #[error("unknown image {0:?}")]
    MissingImage(ImageId),
    /// The source rectangle extends past the image.
    #[error("source rect {src:?} is outside {image:?}")]
    SourceOutOfBounds {
        /// Image being drawn.
        image: ImageId,
        /// Requested source rectangle.
        src: Rect,
    },
    /// The platform rejected the draw call.
    #[error("draw rejected: {0}")]
    Rejected(String),
}

/// A 2D drawing context with a current transform and a global alpha.
///
/// Painting sets the transform once per node, then pastes each of the
/// node's payloads with [`draw_image`](Self::draw_image).
pub trait Surface {
    /// Replaces the current transform.
    fn set_transform(&mut self, matrix: &Matrix);

    /// Returns the current global alpha.
    fn alpha(&self) -> f64;

    /// Replaces the current global alpha.
    fn set_alpha(&mut self, alpha: f64);

    /// Draws the `src` region of `image` into `dst`, in the coordinate
    /// space of the current transform.
    ///
    /// # Errors
    ///
    /// Returns [`PasteError`] when the image is unknown or the region cannot
    /// be drawn. The scene logs the first failure per payload and keeps
    /// painting.
    fn draw_image(&mut self, image: ImageId, src: Rect, dst: Rect) -> Result<(), PasteError>;
}
