// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: an ordered sequence of pastes for one frame.

use alloc::vec::Vec;

use cutout_core::matrix::Matrix;
use cutout_core::surface::{ImageId, PasteError, Surface};
use kurbo::{Affine, Rect};

/// A single paste recorded by [`RenderPlan`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PasteItem {
    /// Source image.
    pub image: ImageId,
    /// Region of the source image.
    pub src: Rect,
    /// Destination rectangle in the coordinate space of `transform`.
    pub dst: Rect,
    /// Transform current at the time of the paste.
    pub transform: Affine,
    /// Global alpha current at the time of the paste.
    pub alpha: f64,
}

/// An ordered list of pastes for a single frame.
///
/// Items are recorded back to front, matching the scene's paint order.
/// Backends can replay the plan onto a native canvas, or tests can inspect
/// it directly.
#[derive(Clone, Debug)]
pub struct RenderPlan {
    /// Pastes in paint order.
    pub items: Vec<PasteItem>,
    transform: Affine,
    alpha: f64,
}

impl Default for RenderPlan {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPlan {
    /// Creates an empty plan with an identity transform and full alpha.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            transform: Affine::IDENTITY,
            alpha: 1.0,
        }
    }

    /// Clears the plan for reuse and resets the drawing state.
    pub fn clear(&mut self) {
        self.items.clear();
        self.transform = Affine::IDENTITY;
        self.alpha = 1.0;
    }
}

impl Surface for RenderPlan {
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
        self.items.push(PasteItem {
            image,
            src,
            dst,
            transform: self.transform,
            alpha: self.alpha,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cutout_core::out::{Cutout, ImageSlot, Out};
    use cutout_core::pin::{PinOption, PinUpdate};
    use cutout_core::scene::Scene;

    use super::*;

    #[test]
    fn records_pastes_in_paint_order() {
        let mut scene = Scene::new();
        let root = scene.create_node();
        let back = scene.create_node();
        let front = scene.create_node();
        scene.append(root, &[back, front]);
        for (node, id) in [(back, 1), (front, 2)] {
            scene.set_image(
                node,
                Out::new(
                    Cutout::new("tile", 0.0, 0.0, 8.0, 8.0),
                    ImageSlot::filled(ImageId(id)),
                    1.0,
                ),
            );
        }
        scene.set_pin(
            front,
            PinUpdate::new()
                .with(PinOption::OffsetX(20.0))
                .with(PinOption::Alpha(0.5)),
        );

        let mut plan = RenderPlan::new();
        scene.render(root, 0.0, &mut plan);
        let images: Vec<_> = plan.items.iter().map(|i| i.image).collect();
        assert_eq!(images, [ImageId(1), ImageId(2)]);
        assert_eq!(plan.items[1].transform, Affine::translate((20.0, 0.0)));
        assert_eq!(plan.items[1].alpha, 0.5);
        assert_eq!(plan.items[0].dst, Rect::new(0.0, 0.0, 8.0, 8.0));
    }

    #[test]
    fn clear_resets_state() {
        let mut plan = RenderPlan::new();
        plan.set_alpha(0.25);
        plan.draw_image(ImageId(0), Rect::ZERO, Rect::ZERO).unwrap();
        plan.clear();
        assert!(plan.items.is_empty());
        assert_eq!(plan.alpha(), 1.0);
    }
}
