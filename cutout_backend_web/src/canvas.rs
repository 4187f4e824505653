// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canvas 2D surface.

use alloc::collections::BTreeMap;
use alloc::format;

use cutout_core::matrix::Matrix;
use cutout_core::surface::{ImageId, PasteError, Surface};
use kurbo::Rect;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

/// Draws scene payloads onto a `CanvasRenderingContext2d`.
///
/// Images are registered by id with [`insert_image`](Self::insert_image).
/// Every transform is pre-multiplied by the device pixel ratio so the scene
/// can work in CSS pixels.
pub struct CanvasSurface {
    context: CanvasRenderingContext2d,
    images: BTreeMap<ImageId, HtmlImageElement>,
    pixel_ratio: f64,
}

impl core::fmt::Debug for CanvasSurface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CanvasSurface")
            .field("context", &"CanvasRenderingContext2d")
            .field("images", &self.images.len())
            .field("pixel_ratio", &self.pixel_ratio)
            .finish()
    }
}

impl CanvasSurface {
    /// Creates a surface over `context` with a pixel ratio of 1.
    #[must_use]
    pub fn new(context: CanvasRenderingContext2d) -> Self {
        Self {
            context,
            images: BTreeMap::new(),
            pixel_ratio: 1.0,
        }
    }

    /// Returns the underlying context.
    #[must_use]
    pub fn context(&self) -> &CanvasRenderingContext2d {
        &self.context
    }

    /// Sets the device pixel ratio applied ahead of every transform.
    pub fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
    }

    /// Registers an image, returning the one it replaced.
    pub fn insert_image(
        &mut self,
        id: ImageId,
        image: HtmlImageElement,
    ) -> Option<HtmlImageElement> {
        self.images.insert(id, image)
    }

    /// Unregisters an image.
    pub fn remove_image(&mut self, id: ImageId) -> Option<HtmlImageElement> {
        self.images.remove(&id)
    }

    /// Clears the whole canvas in device pixels and resets the transform
    /// and alpha.
    pub fn clear(&mut self) {
        let _ = self.context.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        self.context.set_global_alpha(1.0);
        if let Some(canvas) = self.context.canvas() {
            self.context.clear_rect(
                0.0,
                0.0,
                f64::from(canvas.width()),
                f64::from(canvas.height()),
            );
        }
    }
}

fn rejected(err: &JsValue) -> PasteError {
    PasteError::Rejected(format!("{err:?}"))
}

impl Surface for CanvasSurface {
    fn set_transform(&mut self, matrix: &Matrix) {
        let r = self.pixel_ratio;
        let [a, b, c, d, tx, ty] = matrix.coeffs();
        if let Err(err) = self
            .context
            .set_transform(a * r, b * r, c * r, d * r, tx * r, ty * r)
        {
            log::warn!("setTransform failed: {err:?}");
        }
    }

    fn alpha(&self) -> f64 {
        self.context.global_alpha()
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.context.set_global_alpha(alpha);
    }

    fn draw_image(&mut self, image: ImageId, src: Rect, dst: Rect) -> Result<(), PasteError> {
        let element = self
            .images
            .get(&image)
            .ok_or(PasteError::MissingImage(image))?;
        let bounds = Rect::new(
            0.0,
            0.0,
            f64::from(element.natural_width()),
            f64::from(element.natural_height()),
        );
        if src.union(bounds) != bounds {
            return Err(PasteError::SourceOutOfBounds { image, src });
        }
        self.context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                element,
                src.x0,
                src.y0,
                src.width(),
                src.height(),
                dst.x0,
                dst.y0,
                dst.width(),
                dst.height(),
            )
            .map_err(|err| rejected(&err))
    }
}
