// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw payloads: a region of a source image and where to paste it.

use alloc::rc::Rc;
use alloc::string::String;
use core::cell::Cell;
use core::fmt;

use kurbo::{Insets, Rect};

use crate::surface::{ImageId, Surface};

/// A named region of a texture, in texture pixels.
///
/// The margins describe a nine-slice grid for stretching filters; they are
/// zero when unused.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cutout {
    /// Name used by selectors.
    pub name: String,
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
    /// Nine-slice top margin.
    pub top: f64,
    /// Nine-slice bottom margin.
    pub bottom: f64,
    /// Nine-slice left margin.
    pub left: f64,
    /// Nine-slice right margin.
    pub right: f64,
}

impl Cutout {
    /// Creates a cutout without margins.
    #[must_use]
    pub fn new(name: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    /// Returns the cutout with nine-slice margins.
    #[must_use]
    pub fn with_margins(mut self, top: f64, bottom: f64, left: f64, right: f64) -> Self {
        self.top = top;
        self.bottom = bottom;
        self.left = left;
        self.right = right;
        self
    }
}

/// A lazily resolved image handle shared between a texture and its outs.
///
/// Outs created before the host finishes loading hold an empty slot and
/// start drawing as soon as the slot is filled.
#[derive(Clone, Default)]
pub struct ImageSlot(Rc<Cell<Option<ImageId>>>);

impl ImageSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a slot that already holds `image`.
    #[must_use]
    pub fn filled(image: ImageId) -> Self {
        Self(Rc::new(Cell::new(Some(image))))
    }

    /// Returns the image, if loaded.
    #[must_use]
    pub fn get(&self) -> Option<ImageId> {
        self.0.get()
    }

    /// Fills (or clears) the slot for every holder.
    pub fn set(&self, image: Option<ImageId>) {
        self.0.set(image);
    }
}

impl fmt::Debug for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(id) => write!(f, "ImageSlot({id:?})"),
            None => f.write_str("ImageSlot(empty)"),
        }
    }
}

/// Result of one [`Out::paste`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Paste {
    /// The region was drawn.
    Drawn,
    /// The image is not loaded yet; nothing was drawn.
    Pending,
    /// The surface rejected the draw.
    Failed,
}

/// A draw payload: a source rectangle in an image and a destination
/// rectangle in node space.
///
/// Source coordinates are multiplied by the texture's image ratio, so a
/// high-density image can back a cutout declared in logical pixels.
#[derive(Clone, Debug)]
pub struct Out {
    cutout: Cutout,
    image: ImageSlot,
    ratio: f64,
    sx: f64,
    sy: f64,
    sw: f64,
    sh: f64,
    dx: f64,
    dy: f64,
    dw: f64,
    dh: f64,
    failed: bool,
}

impl Out {
    /// Creates an out covering the whole cutout.
    #[must_use]
    pub fn new(cutout: Cutout, image: ImageSlot, ratio: f64) -> Self {
        let mut out = Self {
            cutout,
            image,
            ratio,
            sx: 0.0,
            sy: 0.0,
            sw: 0.0,
            sh: 0.0,
            dx: 0.0,
            dy: 0.0,
            dw: 0.0,
            dh: 0.0,
            failed: false,
        };
        out.reset();
        out
    }

    /// Restores the source and destination rectangles of the full cutout.
    pub fn reset(&mut self) -> &mut Self {
        let c = &self.cutout;
        self.sx = c.x * self.ratio;
        self.sy = c.y * self.ratio;
        self.sw = c.width * self.ratio;
        self.sh = c.height * self.ratio;
        self.dx = 0.0;
        self.dy = 0.0;
        self.dw = c.width;
        self.dh = c.height;
        self
    }

    /// Cutout name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.cutout.name
    }

    /// The cutout this out was built from.
    #[must_use]
    pub fn cutout(&self) -> &Cutout {
        &self.cutout
    }

    /// Destination width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.dw
    }

    /// Destination height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.dh
    }

    /// Sets the destination width, stretching the source region.
    pub fn set_width(&mut self, width: f64) -> &mut Self {
        self.dw = width;
        self
    }

    /// Sets the destination height, stretching the source region.
    pub fn set_height(&mut self, height: f64) -> &mut Self {
        self.dh = height;
        self
    }

    /// Keeps a horizontal strip of width `w` starting `x` pixels into the
    /// cutout.
    pub fn crop_x(&mut self, w: f64, x: f64) -> &mut Self {
        self.sx = (self.cutout.x + x) * self.ratio;
        self.dw = (self.cutout.width - x).min(w);
        self.sw = self.dw * self.ratio;
        self
    }

    /// Keeps a vertical strip of height `h` starting `y` pixels into the
    /// cutout.
    pub fn crop_y(&mut self, h: f64, y: f64) -> &mut Self {
        self.sy = (self.cutout.y + y) * self.ratio;
        self.dh = (self.cutout.height - y).min(h);
        self.sh = self.dh * self.ratio;
        self
    }

    /// Moves the destination rectangle within node space.
    pub fn offset(&mut self, x: f64, y: f64) -> &mut Self {
        self.dx = x;
        self.dy = y;
        self
    }

    /// Source rectangle in image pixels.
    #[must_use]
    pub fn source(&self) -> Rect {
        Rect::new(self.sx, self.sy, self.sx + self.sw, self.sy + self.sh)
    }

    /// Destination rectangle in node space.
    #[must_use]
    pub fn dest(&self) -> Rect {
        Rect::new(self.dx, self.dy, self.dx + self.dw, self.dy + self.dh)
    }

    /// Nine-slice margins of the cutout.
    #[must_use]
    pub fn margins(&self) -> Insets {
        let c = &self.cutout;
        Insets::new(c.left, c.top, c.right, c.bottom)
    }

    /// Image handle, if loaded.
    #[must_use]
    pub fn image(&self) -> Option<ImageId> {
        self.image.get()
    }

    /// Whether a paste has failed before.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Draws this payload onto `surface`.
    ///
    /// A failed draw is logged the first time only and never propagates.
    pub fn paste<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Paste {
        let Some(image) = self.image.get() else {
            return Paste::Pending;
        };
        match surface.draw_image(image, self.source(), self.dest()) {
            Ok(()) => Paste::Drawn,
            Err(err) => {
                if !self.failed {
                    log::warn!(
                        "unable to paste `{}` {:?} -> {:?}: {err}",
                        self.cutout.name,
                        self.source(),
                        self.dest()
                    );
                }
                self.failed = true;
                Paste::Failed
            }
        }
    }
}

impl fmt::Display for Out {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}: {}x{}]", self.cutout.name, self.dw, self.dh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;
    use crate::surface::PasteError;

    #[derive(Default)]
    struct Log {
        draws: alloc::vec::Vec<(ImageId, Rect, Rect)>,
        reject: bool,
        alpha: f64,
    }

    impl Surface for Log {
        fn set_transform(&mut self, _matrix: &Matrix) {}

        fn alpha(&self) -> f64 {
            self.alpha
        }

        fn set_alpha(&mut self, alpha: f64) {
            self.alpha = alpha;
        }

        fn draw_image(&mut self, image: ImageId, src: Rect, dst: Rect) -> Result<(), PasteError> {
            if self.reject {
                return Err(PasteError::MissingImage(image));
            }
            self.draws.push((image, src, dst));
            Ok(())
        }
    }

    fn out(ratio: f64) -> Out {
        Out::new(
            Cutout::new("coin", 10.0, 20.0, 30.0, 40.0),
            ImageSlot::filled(ImageId(7)),
            ratio,
        )
    }

    #[test]
    fn ratio_scales_source_only() {
        let o = out(2.0);
        assert_eq!(o.source(), Rect::new(20.0, 40.0, 80.0, 120.0));
        assert_eq!(o.dest(), Rect::new(0.0, 0.0, 30.0, 40.0));
    }

    #[test]
    fn crop_clamps_to_cutout() {
        let mut o = out(1.0);
        o.crop_x(100.0, 10.0);
        assert_eq!(o.width(), 20.0);
        assert_eq!(o.source(), Rect::new(20.0, 20.0, 40.0, 60.0));
        o.crop_y(5.0, 0.0);
        assert_eq!(o.height(), 5.0);
        o.reset();
        assert_eq!(o.dest(), Rect::new(0.0, 0.0, 30.0, 40.0));
    }

    #[test]
    fn pending_image_is_skipped() {
        let mut o = Out::new(Cutout::new("a", 0.0, 0.0, 1.0, 1.0), ImageSlot::new(), 1.0);
        let mut s = Log::default();
        assert_eq!(o.paste(&mut s), Paste::Pending);
        assert!(s.draws.is_empty());
    }

    #[test]
    fn slot_fill_reaches_existing_outs() {
        let slot = ImageSlot::new();
        let mut o = Out::new(Cutout::new("a", 0.0, 0.0, 1.0, 1.0), slot.clone(), 1.0);
        slot.set(Some(ImageId(3)));
        let mut s = Log::default();
        assert_eq!(o.paste(&mut s), Paste::Drawn);
        assert_eq!(s.draws[0].0, ImageId(3));
    }

    #[test]
    fn failure_is_sticky_and_non_fatal() {
        let mut o = out(1.0);
        let mut s = Log {
            reject: true,
            ..Log::default()
        };
        assert_eq!(o.paste(&mut s), Paste::Failed);
        assert_eq!(o.paste(&mut s), Paste::Failed);
        assert!(o.has_failed());
        s.reject = false;
        assert_eq!(o.paste(&mut s), Paste::Drawn);
    }

    #[test]
    fn margins_map_to_insets() {
        let o = Out::new(
            Cutout::new("panel", 0.0, 0.0, 50.0, 50.0).with_margins(1.0, 2.0, 3.0, 4.0),
            ImageSlot::new(),
            1.0,
        );
        assert_eq!(o.margins(), Insets::new(3.0, 1.0, 4.0, 2.0));
    }
}
