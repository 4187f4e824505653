// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Software RGBA8 surface.
//!
//! [`Raster`] owns a target [`Image`] and a set of source images keyed by
//! [`ImageId`]. A paste covers every target pixel whose center maps (through
//! the inverse of the current transform) into the destination rectangle,
//! samples the nearest source pixel and composites source-over. Pixels are
//! straight (not premultiplied) RGBA.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use cutout_core::matrix::Matrix;
use cutout_core::surface::{ImageId, PasteError, Surface};
use kurbo::{Affine, Point, Rect};

/// An RGBA8 pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Image {
    /// Creates a fully transparent image.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0; 4])
    }

    /// Creates an image with every pixel set to `color`.
    #[must_use]
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Wraps row-major pixels; returns `None` if the length does not match.
    #[must_use]
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<[u8; 4]>) -> Option<Self> {
        (pixels.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major pixels.
    #[must_use]
    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    /// Returns one pixel.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        self.pixels[self.index(x, y)]
    }

    /// Sets every pixel to `color`.
    pub fn fill(&mut self, color: [u8; 4]) {
        self.pixels.fill(color);
    }

    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// A software surface that rasterizes pastes into an owned [`Image`].
#[derive(Clone, Debug)]
pub struct Raster {
    target: Image,
    images: BTreeMap<ImageId, Image>,
    transform: Affine,
    alpha: f64,
}

impl Raster {
    /// Creates a transparent target of the given size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            target: Image::new(width, height),
            images: BTreeMap::new(),
            transform: Affine::IDENTITY,
            alpha: 1.0,
        }
    }

    /// Registers a source image, returning the one it replaces.
    pub fn insert_image(&mut self, id: ImageId, image: Image) -> Option<Image> {
        self.images.insert(id, image)
    }

    /// Unregisters a source image.
    pub fn remove_image(&mut self, id: ImageId) -> Option<Image> {
        self.images.remove(&id)
    }

    /// The target image.
    #[must_use]
    pub fn target(&self) -> &Image {
        &self.target
    }

    /// Clears the target to `color` and resets the drawing state.
    pub fn clear(&mut self, color: [u8; 4]) {
        self.target.fill(color);
        self.transform = Affine::IDENTITY;
        self.alpha = 1.0;
    }
}

impl Surface for Raster {
    fn set_transform(&mut self, matrix: &Matrix) {
        self.transform = matrix.as_affine();
    }

    fn alpha(&self) -> f64 {
        self.alpha
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha;
    }

    fn draw_image(&mut self, image: ImageId, src: Rect, dst: Rect) -> Result<(), PasteError> {
        let source = self
            .images
            .get(&image)
            .ok_or(PasteError::MissingImage(image))?;
        if !src.is_finite() || src.union(source.bounds()) != source.bounds() {
            return Err(PasteError::SourceOutOfBounds { image, src });
        }
        if dst.width() <= 0.0 || dst.height() <= 0.0 || src.width() <= 0.0 || src.height() <= 0.0
        {
            return Ok(());
        }
        if self.transform.determinant() == 0.0 {
            return Ok(());
        }

        let area = self
            .transform
            .transform_rect_bbox(dst)
            .intersect(self.target.bounds());
        if area.width() <= 0.0 || area.height() <= 0.0 {
            return Ok(());
        }
        let inverse = self.transform.inverse();
        let (kx, ky) = (src.width() / dst.width(), src.height() / dst.height());
        let (x0, y0) = (to_index(area.x0), to_index(area.y0));
        let x1 = to_index(area.x1).saturating_add(1).min(self.target.width);
        let y1 = to_index(area.y1).saturating_add(1).min(self.target.height);
        let max_sx = to_index(src.x1).saturating_sub(1);
        let max_sy = to_index(src.y1).saturating_sub(1);

        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let local = inverse * center;
                if !dst.contains(local) {
                    continue;
                }
                let sx = to_index(src.x0 + (local.x - dst.x0) * kx).min(max_sx);
                let sy = to_index(src.y0 + (local.y - dst.y0) * ky).min(max_sy);
                let color = source.pixels[source.index(sx, sy)];
                let i = self.target.index(x, y);
                self.target.pixels[i] = over(color, self.target.pixels[i], self.alpha);
            }
        }
        Ok(())
    }
}

/// Truncates a non-negative coordinate to a pixel index.
#[expect(
    clippy::cast_possible_truncation,
    reason = "coordinates are clamped to image bounds, which fit in u32"
)]
fn to_index(v: f64) -> u32 {
    v.max(0.0) as u32
}

/// Straight-alpha source-over of `src` (scaled by `alpha`) onto `dst`.
#[expect(
    clippy::cast_possible_truncation,
    reason = "channel values are clamped to 0..=255 before the cast"
)]
fn over(src: [u8; 4], dst: [u8; 4], alpha: f64) -> [u8; 4] {
    let sa = f64::from(src[3]) / 255.0 * alpha.clamp(0.0, 1.0);
    let da = f64::from(dst[3]) / 255.0;
    let oa = sa + da * (1.0 - sa);
    if oa <= 0.0 {
        return [0; 4];
    }
    let mut out = [0_u8; 4];
    for ((o, s), d) in out.iter_mut().zip(src).zip(dst).take(3) {
        let v = (f64::from(s) * sa + f64::from(d) * da * (1.0 - sa)) / oa;
        *o = (v + 0.5).clamp(0.0, 255.0) as u8;
    }
    out[3] = (oa * 255.0 + 0.5).clamp(0.0, 255.0) as u8;
    out
}
