// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame tick and paint passes.
//!
//! A frame is a [`tick`](Scene::tick) over the tree followed by a
//! [`paint`](Scene::paint). Ticking runs, per visible node: the pin step,
//! the pin-children step, the before-children callbacks, every child, the
//! after-children callbacks and finally the box layout. Painting recomputes
//! stale absolute matrices top-down and pastes each node's payloads.
//!
//! Nothing is invalidated eagerly. A node recomputes a matrix only when its
//! traversal reaches it and a dependency stamp is newer than the cache.

use alloc::vec::Vec;
use core::mem;

use kurbo::Rect;

use crate::matrix::Matrix;
use crate::out::Paste;
use crate::pin::ParentView;
use crate::surface::Surface;
#[cfg(feature = "trace-rich")]
use crate::trace::PasteFailure;

use super::id::{INVALID, NodeId};
use super::store::{Scene, TickOrder};

/// Node counters for one tick and/or paint pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Visible nodes ticked.
    pub ticked: u32,
    /// Visible nodes painted.
    pub painted: u32,
    /// Payloads drawn.
    pub pasted: u32,
    /// Payloads whose draw failed.
    pub failed: u32,
}

impl FrameStats {
    fn merge(&mut self, other: Self) {
        self.ticked += other.ticked;
        self.painted += other.painted;
        self.pasted += other.pasted;
        self.failed += other.failed;
    }
}

impl Scene {
    // -- Frame API --

    /// Ticks and then paints the subtree rooted at `root`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn render<S: Surface + ?Sized>(
        &mut self,
        root: NodeId,
        elapsed_ms: f64,
        surface: &mut S,
    ) -> FrameStats {
        let mut stats = self.tick(root, elapsed_ms);
        stats.merge(self.paint(root, surface));
        stats
    }

    /// Runs the update pass over the subtree rooted at `root`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn tick(&mut self, root: NodeId, elapsed_ms: f64) -> FrameStats {
        let idx = self.validate(root);
        let mut stats = FrameStats::default();
        self.tick_node(idx, elapsed_ms, &mut stats);
        stats
    }

    /// Runs the draw pass over the subtree rooted at `root`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn paint<S: Surface + ?Sized>(&mut self, root: NodeId, surface: &mut S) -> FrameStats {
        let idx = self.validate(root);
        #[cfg(feature = "trace-rich")]
        self.paste_failures.clear();
        let parent = self.parent[idx as usize];
        let (view, alpha) = if parent == INVALID {
            (None, 1.0)
        } else {
            self.refresh_absolute_chain(parent);
            (
                Some(self.pins[parent as usize].view()),
                self.resolved_alpha[parent as usize],
            )
        };
        let mut stats = FrameStats::default();
        self.paint_node(idx, view, alpha, surface, &mut stats);
        stats
    }

    /// Payloads that failed during the last paint pass.
    #[cfg(feature = "trace-rich")]
    #[must_use]
    pub fn paste_failures(&self) -> &[PasteFailure] {
        &self.paste_failures
    }

    // -- Matrix reads --

    /// Returns the up-to-date absolute matrix of `node`, refreshing its
    /// ancestors first.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn matrix(&mut self, node: NodeId) -> &Matrix {
        let idx = self.validate(node);
        self.refresh_absolute_chain(idx);
        self.pins[idx as usize].absolute_matrix()
    }

    /// Returns the up-to-date relative matrix of `node`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn relative_matrix(&mut self, node: NodeId) -> &Matrix {
        let idx = self.validate(node);
        self.refresh_relative_at(idx);
        self.pins[idx as usize].relative_matrix()
    }

    /// Returns the up-to-date bound of `node` in its parent's space, before
    /// translation.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn bound(&mut self, node: NodeId) -> Rect {
        let idx = self.validate(node);
        self.refresh_relative_at(idx);
        self.pins[idx as usize].bound()
    }

    // -- Internals --

    /// Refreshes the relative matrix of `idx`.
    pub(crate) fn refresh_relative_at(&mut self, idx: u32) {
        let i = idx as usize;
        let parent = self.parent[i];
        let view = (parent != INVALID).then(|| self.pins[parent as usize].view());
        let parent_ts = self.stamps[i].parent;
        self.pins[i].refresh_relative(view.as_ref(), parent_ts);
    }

    /// Refreshes absolute matrices from the root of `idx`'s tree down to
    /// `idx`.
    fn refresh_absolute_chain(&mut self, idx: u32) {
        let mut chain = mem::take(&mut self.chain_scratch);
        chain.clear();
        let mut cur = idx;
        while cur != INVALID {
            chain.push(cur);
            cur = self.parent[cur as usize];
        }
        let mut view: Option<ParentView> = None;
        for &node in chain.iter().rev() {
            let i = node as usize;
            let parent_ts = self.stamps[i].parent;
            self.pins[i].refresh_absolute(view.as_ref(), parent_ts, &mut self.clock);
            view = Some(self.pins[i].view());
        }
        self.chain_scratch = chain;
    }

    fn tick_node(&mut self, idx: u32, elapsed_ms: f64, stats: &mut FrameStats) {
        let i = idx as usize;
        if !self.visible[i] {
            return;
        }
        stats.ticked += 1;

        let parent = self.parent[i];
        let parent_ts = (parent != INVALID).then(|| self.pins[parent as usize].transform_stamp());
        self.pins[i].tick(parent_ts, &mut self.clock);

        self.run_pin_children(idx);
        self.run_tickers(idx, TickOrder::BeforeChildren, elapsed_ms);

        let mut child = self.first_child[i];
        while child != INVALID {
            let next = self.next_sibling[child as usize];
            self.tick_node(child, elapsed_ms, stats);
            child = next;
        }

        self.run_tickers(idx, TickOrder::AfterChildren, elapsed_ms);
        self.run_layout(idx);
    }

    /// Runs the callbacks of one order. Callbacks registered while running
    /// are kept and first run on the next frame.
    fn run_tickers(&mut self, idx: u32, order: TickOrder, elapsed_ms: f64) {
        let id = self.id_at(idx);
        let mut taken = mem::take(self.tickers_mut(idx, order));
        if taken.is_empty() {
            return;
        }
        for ticker in &mut taken {
            ticker(self, id, elapsed_ms);
        }
        if self.is_alive(id) {
            let slot = self.tickers_mut(idx, order);
            taken.append(slot);
            *slot = taken;
        }
    }

    fn tickers_mut(&mut self, idx: u32, order: TickOrder) -> &mut Vec<super::store::Ticker> {
        let hooks = &mut self.hooks[idx as usize];
        match order {
            TickOrder::BeforeChildren => &mut hooks.before,
            TickOrder::AfterChildren => &mut hooks.after,
        }
    }

    fn paint_node<S: Surface + ?Sized>(
        &mut self,
        idx: u32,
        parent: Option<ParentView>,
        parent_alpha: f64,
        surface: &mut S,
        stats: &mut FrameStats,
    ) {
        let i = idx as usize;
        if !self.visible[i] {
            return;
        }
        stats.painted += 1;

        let parent_ts = self.stamps[i].parent;
        self.pins[i].refresh_absolute(parent.as_ref(), parent_ts, &mut self.clock);
        let pin = &self.pins[i];
        surface.set_transform(pin.absolute_matrix());

        let alpha = pin.alpha() * parent_alpha;
        let texture_alpha = pin.texture_alpha() * alpha;
        self.resolved_alpha[i] = alpha;

        if !self.outs[i].is_empty() {
            if surface.alpha() != texture_alpha {
                surface.set_alpha(texture_alpha);
            }
            for out in &mut self.outs[i] {
                match out.paste(surface) {
                    Paste::Drawn => stats.pasted += 1,
                    Paste::Pending => {}
                    Paste::Failed => {
                        stats.failed += 1;
                        #[cfg(feature = "trace-rich")]
                        if let Some(image) = out.image() {
                            self.paste_failures.push(PasteFailure {
                                node: NodeId {
                                    idx,
                                    generation: self.generation[i],
                                },
                                image,
                                src: out.source(),
                            });
                        }
                    }
                }
            }
        }
        if surface.alpha() != alpha {
            surface.set_alpha(alpha);
        }

        let view = self.pins[i].view();
        let mut child = self.first_child[i];
        while child != INVALID {
            let next = self.next_sibling[child as usize];
            self.paint_node(child, Some(view), alpha, surface, stats);
            child = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use kurbo::Point;

    use super::*;
    use crate::out::{Cutout, ImageSlot, Out};
    use crate::pin::{PinOption, PinUpdate};
    use crate::surface::{ImageId, PasteError};

    const EPS: f64 = 1e-9;

    #[derive(Default)]
    struct Recorder {
        transform: [f64; 6],
        alpha: f64,
        draws: Vec<([f64; 6], f64, ImageId)>,
    }

    impl Surface for Recorder {
        fn set_transform(&mut self, matrix: &Matrix) {
            self.transform = matrix.coeffs();
        }

        fn alpha(&self) -> f64 {
            self.alpha
        }

        fn set_alpha(&mut self, alpha: f64) {
            self.alpha = alpha;
        }

        fn draw_image(&mut self, image: ImageId, _src: Rect, _dst: Rect) -> Result<(), PasteError> {
            if image == ImageId(99) {
                return Err(PasteError::MissingImage(image));
            }
            self.draws.push((self.transform, self.alpha, image));
            Ok(())
        }
    }

    fn out(image: u32) -> Out {
        Out::new(
            Cutout::new("o", 0.0, 0.0, 4.0, 4.0),
            ImageSlot::filled(ImageId(image)),
            1.0,
        )
    }

    fn close(a: &Matrix, b: &Matrix) -> bool {
        a.coeffs()
            .iter()
            .zip(b.coeffs())
            .all(|(x, y)| (x - y).abs() < EPS)
    }

    #[test]
    fn absolute_is_relative_then_parent() {
        let mut scene = Scene::new();
        let root = scene.create_node();
        let mid = scene.create_node();
        let leaf = scene.create_node();
        scene.append_to(mid, root);
        scene.append_to(leaf, mid);
        scene.set_pin(
            root,
            PinUpdate::new()
                .with(PinOption::Scale(2.0))
                .with(PinOption::OffsetX(3.0)),
        );
        scene.set_pin(mid, PinOption::Rotation(0.4));
        scene.set_pin(
            leaf,
            PinUpdate::new()
                .with(PinOption::Offset(7.0))
                .with(PinOption::SkewX(0.2)),
        );

        let root_abs = scene.matrix(root).clone();
        let root_rel = scene.relative_matrix(root).clone();
        assert!(close(&root_abs, &root_rel), "root: absolute == relative");

        for (child, parent) in [(mid, root), (leaf, mid)] {
            let parent_abs = scene.matrix(parent).clone();
            let mut expected = scene.relative_matrix(child).clone();
            expected.concat(&parent_abs);
            assert!(close(scene.matrix(child), &expected));
        }
    }

    #[test]
    fn parent_move_reaches_child_on_next_read() {
        let mut scene = Scene::new();
        let root = scene.create_node();
        let child = scene.create_node();
        scene.append_to(child, root);
        scene.set_pin(child, PinOption::OffsetX(5.0));
        assert_eq!(scene.matrix(child).tx(), 5.0);

        scene.set_pin(root, PinOption::OffsetX(100.0));
        assert_eq!(scene.matrix(child).tx(), 105.0);
    }

    #[test]
    fn reparent_recomputes_matrix() {
        let mut scene = Scene::new();
        let a = scene.create_node();
        let b = scene.create_node();
        let child = scene.create_node();
        scene.set_pin(a, PinOption::OffsetX(10.0));
        scene.set_pin(b, PinOption::OffsetX(50.0));
        scene.append_to(child, a);
        assert_eq!(scene.matrix(child).tx(), 10.0);
        scene.append_to(child, b);
        assert_eq!(scene.matrix(child).tx(), 50.0);
        scene.remove(child);
        assert_eq!(scene.matrix(child).tx(), 0.0);
    }

    #[test]
    fn unchanged_tree_does_not_recompute() {
        let mut scene = Scene::new();
        let root = scene.create_node();
        let child = scene.create_node();
        scene.append_to(child, root);
        let mut surface = Recorder::default();
        scene.render(root, 0.0, &mut surface);
        let stamp = scene.pin(child).matrix_stamp();
        scene.render(root, 16.0, &mut surface);
        assert_eq!(scene.pin(child).matrix_stamp(), stamp);
    }

    #[test]
    fn alpha_multiplies_down_the_tree() {
        let mut scene = Scene::new();
        let root = scene.create_node();
        let child = scene.create_node();
        scene.append_to(child, root);
        scene.set_pin(root, PinOption::Alpha(0.5));
        scene.set_pin(
            child,
            PinUpdate::new()
                .with(PinOption::Alpha(0.5))
                .with(PinOption::TextureAlpha(0.5)),
        );
        scene.add_out(root, out(1));
        scene.add_out(child, out(2));

        let mut surface = Recorder::default();
        let stats = scene.render(root, 0.0, &mut surface);
        assert_eq!(stats.pasted, 2);
        assert_eq!(surface.draws[0].1, 0.5);
        assert_eq!(surface.draws[1].1, 0.125);
        assert_eq!(surface.alpha, 0.25, "node alpha restored after payloads");
    }

    #[test]
    fn hidden_subtree_is_skipped() {
        let mut scene = Scene::new();
        let root = scene.create_node();
        let child = scene.create_node();
        let grandchild = scene.create_node();
        scene.append_to(child, root);
        scene.append_to(grandchild, child);
        scene.add_out(grandchild, out(1));
        scene.hide(child);

        let mut surface = Recorder::default();
        let stats = scene.render(root, 0.0, &mut surface);
        assert_eq!(stats.ticked, 1);
        assert_eq!(stats.painted, 1);
        assert!(surface.draws.is_empty());
    }

    #[test]
    fn failed_paste_does_not_abort_frame() {
        let mut scene = Scene::new();
        let root = scene.create_node();
        let a = scene.create_node();
        let b = scene.create_node();
        scene.append(root, &[a, b]);
        scene.add_out(a, out(99));
        scene.add_out(b, out(3));

        let mut surface = Recorder::default();
        let stats = scene.render(root, 0.0, &mut surface);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.pasted, 1);
        assert_eq!(surface.draws[0].2, ImageId(3));
        assert!(scene.outs(a)[0].has_failed());
    }

    #[test]
    fn tick_order_is_before_children_after() {
        let mut scene = Scene::new();
        let root = scene.create_node();
        let child = scene.create_node();
        scene.append_to(child, root);
        let log = Rc::new(RefCell::new(Vec::new()));

        for (node, order, tag) in [
            (root, TickOrder::AfterChildren, "root-after"),
            (root, TickOrder::BeforeChildren, "root-before"),
            (child, TickOrder::BeforeChildren, "child-before"),
        ] {
            let log = Rc::clone(&log);
            scene.register_tick(node, order, move |_, _, _| log.borrow_mut().push(tag));
        }
        scene.tick(root, 0.0);
        assert_eq!(*log.borrow(), ["root-before", "child-before", "root-after"]);
    }

    #[test]
    fn ticker_receives_elapsed_and_may_mutate_scene() {
        let mut scene = Scene::new();
        let root = scene.create_node();
        scene.register_tick(root, TickOrder::BeforeChildren, |scene, node, elapsed| {
            let x = scene.pin(node).offset().x;
            scene.set_pin(node, PinOption::OffsetX(x + elapsed));
        });
        scene.tick(root, 16.0);
        scene.tick(root, 4.0);
        assert_eq!(scene.pin(root).offset(), Point::new(20.0, 0.0));
    }

    #[test]
    fn ticker_registered_during_tick_runs_next_frame() {
        let mut scene = Scene::new();
        let root = scene.create_node();
        let count = Rc::new(RefCell::new(0));
        let inner = Rc::clone(&count);
        scene.register_tick(root, TickOrder::BeforeChildren, move |scene, node, _| {
            let inner = Rc::clone(&inner);
            if scene.pin(node).alpha() == 1.0 {
                scene.set_pin(node, PinOption::Alpha(0.9));
                scene.register_tick(node, TickOrder::BeforeChildren, move |_, _, _| {
                    *inner.borrow_mut() += 1;
                });
            }
        });
        scene.tick(root, 0.0);
        assert_eq!(*count.borrow(), 0);
        scene.tick(root, 0.0);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn aligned_child_follows_parent_size() {
        let mut scene = Scene::new();
        let root = scene.create_node();
        let child = scene.create_node();
        scene.append_to(child, root);
        scene.set_pin(
            root,
            PinUpdate::new()
                .with(PinOption::Width(100.0))
                .with(PinOption::Height(40.0)),
        );
        scene.set_pin(
            child,
            PinUpdate::new()
                .with(PinOption::Width(10.0))
                .with(PinOption::Height(10.0))
                .with(PinOption::Align(1.0)),
        );
        scene.tick(root, 0.0);
        assert_eq!(scene.matrix(child).tx(), 90.0);

        scene.set_pin(root, PinOption::Width(200.0));
        scene.tick(root, 0.0);
        assert_eq!(scene.matrix(child).tx(), 190.0);
    }

    #[test]
    fn repeated_matrix_reads_reuse_the_ancestor_buffer() {
        let mut scene = Scene::new();
        let mut node = scene.create_node();
        for _ in 0..4 {
            let child = scene.create_node();
            scene.append_to(child, node);
            scene.set_pin(child, PinOption::OffsetX(1.0));
            node = child;
        }
        assert_eq!(scene.matrix(node).tx(), 4.0);
        let capacity = scene.chain_scratch.capacity();
        let ptr = scene.chain_scratch.as_ptr();
        assert!(capacity >= 5, "buffer kept after the first read");

        for _ in 0..3 {
            assert_eq!(scene.matrix(node).tx(), 4.0);
        }
        assert_eq!(scene.chain_scratch.capacity(), capacity);
        assert_eq!(scene.chain_scratch.as_ptr(), ptr, "no reallocation");

        let root = scene.roots().next().unwrap();
        scene.set_pin(root, PinOption::OffsetX(10.0));
        assert_eq!(scene.matrix(node).tx(), 14.0);
    }
}
