// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Box layout and pin-children behaviors.
//!
//! A box node positions its visible children and sizes itself to them once
//! per frame, as the last step of its tick (after every child and every
//! after-children callback). Children that align to the box therefore read
//! the box size computed on the previous frame. Both writes go through the
//! pin, so a pass that computes the same values as the last one changes
//! nothing and the tree settles.
//!
//! Pin-children applies a fixed set of options to every visible child
//! whenever the children list changes. [`Scene::row`] and [`Scene::column`]
//! combine the two.

use crate::pin::{PinOption, PinUpdate};
use crate::scene::{NodeId, Scene};

/// How a box node arranges its children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoxKind {
    /// Left to right; each child's `offsetX` is the running width.
    Row,
    /// Top to bottom; each child's `offsetY` is the running height.
    Column,
    /// Children keep their positions; the node takes the largest child
    /// bound.
    #[default]
    Plain,
}

/// Box layout configuration of one node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxLayout {
    /// Arrangement.
    pub kind: BoxKind,
    /// Added on each side of the computed size.
    pub padding: f64,
    /// Inserted between consecutive visible children.
    pub spacing: f64,
}

impl BoxLayout {
    /// Layout of the given kind with no padding and no spacing.
    #[must_use]
    pub const fn new(kind: BoxKind) -> Self {
        Self {
            kind,
            padding: 0.0,
            spacing: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct LayoutState {
    config: BoxLayout,
    seen_touch: Option<u64>,
}

#[derive(Clone, Debug)]
pub(crate) struct PinChildren {
    update: PinUpdate,
    seen_children: Option<u64>,
}

impl Scene {
    // -- Box layout --

    /// Makes `node` a box of the given kind.
    ///
    /// Only the first call on a node takes effect; later calls keep the
    /// existing layout.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn box_layout(&mut self, node: NodeId, kind: BoxKind) {
        let idx = self.validate(node) as usize;
        let hooks = &mut self.hooks[idx];
        if hooks.layout.is_none() {
            hooks.layout = Some(LayoutState {
                config: BoxLayout::new(kind),
                seen_touch: None,
            });
            self.touch_idx(idx as u32);
        }
    }

    /// Makes `node` a row box; with `align`, every child also aligns
    /// vertically at that fraction.
    pub fn row(&mut self, node: NodeId, align: Option<f64>) {
        self.box_layout(node, BoxKind::Row);
        self.pin_children(node, align.map(PinOption::AlignY).into_iter().collect());
    }

    /// Makes `node` a column box; with `align`, every child also aligns
    /// horizontally at that fraction.
    pub fn column(&mut self, node: NodeId, align: Option<f64>) {
        self.box_layout(node, BoxKind::Column);
        self.pin_children(node, align.map(PinOption::AlignX).into_iter().collect());
    }

    /// Sets the padding of a box node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a box or the handle is stale.
    pub fn set_padding(&mut self, node: NodeId, padding: f64) {
        self.configure_box(node, |config| config.padding = padding);
    }

    /// Sets the spacing of a box node.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a box or the handle is stale.
    pub fn set_spacing(&mut self, node: NodeId, spacing: f64) {
        self.configure_box(node, |config| config.spacing = spacing);
    }

    /// Returns the box layout of `node`, if it has one.
    #[must_use]
    pub fn layout(&self, node: NodeId) -> Option<BoxLayout> {
        let idx = self.validate(node) as usize;
        self.hooks[idx].layout.map(|state| state.config)
    }

    fn configure_box(&mut self, node: NodeId, f: impl FnOnce(&mut BoxLayout)) {
        let idx = self.validate(node) as usize;
        let Some(state) = &mut self.hooks[idx].layout else {
            panic!("node has no box layout");
        };
        let before = state.config;
        f(&mut state.config);
        if state.config != before {
            self.touch_idx(idx as u32);
        }
    }

    /// Lays out the children of a box node and sizes it, unless nothing in
    /// its subtree changed since the last pass.
    pub(crate) fn run_layout(&mut self, idx: u32) {
        let i = idx as usize;
        let touch = self.stamps[i].touch;
        let Some(state) = &mut self.hooks[i].layout else {
            return;
        };
        if state.seen_touch == Some(touch) {
            return;
        }
        state.seen_touch = Some(touch);
        let config = state.config;

        let (mut width, mut height) = (0.0_f64, 0.0_f64);
        for (n, child) in self.visible_children(idx).into_iter().enumerate() {
            self.refresh_relative_at(child);
            let bound = self.pins[child as usize].bound();
            match config.kind {
                BoxKind::Row => {
                    if n > 0 {
                        width += config.spacing;
                    }
                    self.apply_pin(child, &PinOption::OffsetX(width).into());
                    width += bound.width();
                    height = height.max(bound.height());
                }
                BoxKind::Column => {
                    if n > 0 {
                        height += config.spacing;
                    }
                    self.apply_pin(child, &PinOption::OffsetY(height).into());
                    width = width.max(bound.width());
                    height += bound.height();
                }
                BoxKind::Plain => {
                    width = width.max(bound.width());
                    height = height.max(bound.height());
                }
            }
        }
        width += config.padding * 2.0;
        height += config.padding * 2.0;
        let size = PinUpdate::new()
            .with(PinOption::Width(width))
            .with(PinOption::Height(height));
        self.apply_pin(idx, &size);
    }

    // -- Pin children --

    /// Adds `update` to the options applied to every visible child of
    /// `node` whenever its children change.
    ///
    /// The options accumulate across calls and are re-applied on the next
    /// tick.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn pin_children(&mut self, node: NodeId, update: PinUpdate) {
        let idx = self.validate(node) as usize;
        let state = self.hooks[idx].pin_children.get_or_insert_with(|| PinChildren {
            update: PinUpdate::new(),
            seen_children: None,
        });
        if !update.is_empty() {
            state.update.merge(&update);
            state.seen_children = None;
        }
    }

    pub(crate) fn run_pin_children(&mut self, idx: u32) {
        let i = idx as usize;
        let children = self.stamps[i].children;
        let Some(state) = &mut self.hooks[i].pin_children else {
            return;
        };
        if state.seen_children == Some(children) {
            return;
        }
        state.seen_children = Some(children);
        if state.update.is_empty() {
            return;
        }
        let update = state.update.clone();
        for child in self.visible_children(idx) {
            self.apply_pin(child, &update);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::PinKey;

    fn sized(scene: &mut Scene, w: f64, h: f64) -> NodeId {
        let node = scene.create_node();
        scene.set_pin(
            node,
            PinUpdate::new()
                .with(PinOption::Width(w))
                .with(PinOption::Height(h)),
        );
        node
    }

    #[test]
    fn row_offsets_children_and_sizes_parent() {
        let mut scene = Scene::new();
        let row = scene.create_node();
        scene.row(row, None);
        scene.set_spacing(row, 2.0);
        let kids = [(10.0, 5.0), (20.0, 8.0), (30.0, 3.0)].map(|(w, h)| sized(&mut scene, w, h));
        scene.append(row, &kids);

        scene.tick(row, 0.0);
        let xs = kids.map(|k| scene.pin(k).offset().x);
        assert_eq!(xs, [0.0, 12.0, 34.0]);
        assert_eq!(scene.pin(row).width(), 64.0);
        assert_eq!(scene.pin(row).height(), 8.0);
    }

    #[test]
    fn column_stacks_children() {
        let mut scene = Scene::new();
        let col = scene.create_node();
        scene.column(col, None);
        let kids = [(10.0, 5.0), (20.0, 8.0)].map(|(w, h)| sized(&mut scene, w, h));
        scene.append(col, &kids);

        scene.tick(col, 0.0);
        assert_eq!(scene.pin(kids[1]).offset().y, 5.0);
        assert_eq!(scene.pin(col).width(), 20.0);
        assert_eq!(scene.pin(col).height(), 13.0);
    }

    #[test]
    fn plain_box_takes_largest_child_plus_padding() {
        let mut scene = Scene::new();
        let node = scene.create_node();
        scene.box_layout(node, BoxKind::Plain);
        scene.set_padding(node, 3.0);
        let kids = [(10.0, 50.0), (40.0, 8.0)].map(|(w, h)| sized(&mut scene, w, h));
        scene.append(node, &kids);

        scene.tick(node, 0.0);
        assert_eq!(scene.pin(node).width(), 46.0);
        assert_eq!(scene.pin(node).height(), 56.0);
        assert_eq!(scene.pin(kids[1]).offset().x, 0.0, "plain does not move");
    }

    #[test]
    fn hidden_children_are_not_laid_out() {
        let mut scene = Scene::new();
        let row = scene.create_node();
        scene.row(row, None);
        let kids = [(10.0, 5.0), (20.0, 8.0), (30.0, 3.0)].map(|(w, h)| sized(&mut scene, w, h));
        scene.append(row, &kids);
        scene.hide(kids[1]);

        scene.tick(row, 0.0);
        assert_eq!(scene.pin(kids[2]).offset().x, 10.0);
        assert_eq!(scene.pin(row).width(), 40.0);
    }

    #[test]
    fn layout_converges() {
        let mut scene = Scene::new();
        let row = scene.create_node();
        scene.row(row, Some(0.5));
        let kids = [(10.0, 5.0), (20.0, 8.0)].map(|(w, h)| sized(&mut scene, w, h));
        scene.append(row, &kids);

        for _ in 0..3 {
            scene.tick(row, 0.0);
        }
        let settled = scene.clock().current();
        scene.tick(row, 0.0);
        assert_eq!(scene.clock().current(), settled);
    }

    #[test]
    fn row_align_pins_children() {
        let mut scene = Scene::new();
        let row = scene.create_node();
        scene.row(row, Some(0.5));
        let child = sized(&mut scene, 10.0, 4.0);
        scene.append_to(child, row);
        scene.tick(row, 0.0);
        assert_eq!(scene.pin_value(child, PinKey::AlignY), Some(0.5));
        assert_eq!(scene.pin_value(child, PinKey::AlignX), Some(0.0));
    }

    #[test]
    fn box_kind_is_fixed_by_first_call() {
        let mut scene = Scene::new();
        let node = scene.create_node();
        scene.box_layout(node, BoxKind::Column);
        scene.box_layout(node, BoxKind::Row);
        assert_eq!(scene.layout(node).map(|l| l.kind), Some(BoxKind::Column));
    }

    #[test]
    #[should_panic(expected = "node has no box layout")]
    fn padding_requires_box() {
        let mut scene = Scene::new();
        let node = scene.create_node();
        scene.set_padding(node, 1.0);
    }
}
