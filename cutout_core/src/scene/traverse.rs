// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, NodeId};
use super::store::Scene;

/// An iterator over the direct children of a node.
///
/// Created by [`Scene::children`].
#[derive(Debug)]
pub struct Children<'a> {
    scene: &'a Scene,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(scene: &'a Scene, first: u32) -> Self {
        Self {
            scene,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.scene.next_sibling[idx as usize];
        Some(self.scene.id_at(idx))
    }
}

/// Callbacks for [`Scene::visit`].
///
/// Returning `true` from [`start`](Self::start) skips the node's subtree;
/// returning `true` from [`end`](Self::end) stops the whole walk.
pub trait Visitor {
    /// Called before a node's children (pre-order).
    fn start(&mut self, scene: &Scene, node: NodeId) -> bool {
        _ = (scene, node);
        false
    }

    /// Called after a node's children (post-order).
    fn end(&mut self, scene: &Scene, node: NodeId) -> bool {
        _ = (scene, node);
        false
    }

    /// Whether children are walked last to first.
    fn reverse(&self) -> bool {
        false
    }

    /// Whether hidden children (and their subtrees) are skipped.
    fn visible_only(&self) -> bool {
        false
    }
}

impl Scene {
    /// Returns an iterator over the children of `node`, first to last.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Children<'_> {
        let idx = self.validate(node);
        Children::new(self, self.first_child[idx as usize])
    }

    /// Returns every live node without a parent, in slot order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.len)
            .filter(|&i| self.alive[i as usize] && self.parent[i as usize] == INVALID)
            .map(|i| self.id_at(i))
    }

    /// First child of `node`, skipping hidden ones if `visible_only`.
    #[must_use]
    pub fn first(&self, node: NodeId, visible_only: bool) -> Option<NodeId> {
        let idx = self.validate(node);
        self.id_opt(self.forward(self.first_child[idx as usize], visible_only))
    }

    /// Last child of `node`, skipping hidden ones if `visible_only`.
    #[must_use]
    pub fn last(&self, node: NodeId, visible_only: bool) -> Option<NodeId> {
        let idx = self.validate(node);
        self.id_opt(self.backward(self.last_child[idx as usize], visible_only))
    }

    /// Next sibling of `node`, skipping hidden ones if `visible_only`.
    #[must_use]
    pub fn next(&self, node: NodeId, visible_only: bool) -> Option<NodeId> {
        let idx = self.validate(node);
        self.id_opt(self.forward(self.next_sibling[idx as usize], visible_only))
    }

    /// Previous sibling of `node`, skipping hidden ones if `visible_only`.
    #[must_use]
    pub fn prev(&self, node: NodeId, visible_only: bool) -> Option<NodeId> {
        let idx = self.validate(node);
        self.id_opt(self.backward(self.prev_sibling[idx as usize], visible_only))
    }

    /// Walks the subtree rooted at `node` with `visitor`.
    ///
    /// Returns `true` if the walk was stopped by [`Visitor::end`].
    pub fn visit<V: Visitor + ?Sized>(&self, node: NodeId, visitor: &mut V) -> bool {
        let idx = self.validate(node);
        self.visit_idx(idx, visitor)
    }

    fn visit_idx<V: Visitor + ?Sized>(&self, idx: u32, visitor: &mut V) -> bool {
        let id = self.id_at(idx);
        if visitor.start(self, id) {
            return false;
        }
        let reverse = visitor.reverse();
        let visible = visitor.visible_only();
        let mut child = if reverse {
            self.backward(self.last_child[idx as usize], visible)
        } else {
            self.forward(self.first_child[idx as usize], visible)
        };
        while child != INVALID {
            let next = if reverse {
                self.backward(self.prev_sibling[child as usize], visible)
            } else {
                self.forward(self.next_sibling[child as usize], visible)
            };
            if self.visit_idx(child, visitor) {
                return true;
            }
            child = next;
        }
        visitor.end(self, id)
    }

    /// Visible children of `idx`, first to last, as slot indices.
    pub(crate) fn visible_children(&self, idx: u32) -> alloc::vec::Vec<u32> {
        let mut out = alloc::vec::Vec::new();
        let mut child = self.forward(self.first_child[idx as usize], true);
        while child != INVALID {
            out.push(child);
            child = self.forward(self.next_sibling[child as usize], true);
        }
        out
    }

    fn forward(&self, mut idx: u32, visible_only: bool) -> u32 {
        while idx != INVALID && visible_only && !self.visible[idx as usize] {
            idx = self.next_sibling[idx as usize];
        }
        idx
    }

    fn backward(&self, mut idx: u32, visible_only: bool) -> u32 {
        while idx != INVALID && visible_only && !self.visible[idx as usize] {
            idx = self.prev_sibling[idx as usize];
        }
        idx
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    struct Collect {
        pre: Vec<NodeId>,
        post: Vec<NodeId>,
        skip: Option<NodeId>,
        stop_at: Option<NodeId>,
        reverse: bool,
        visible: bool,
    }

    impl Collect {
        fn new() -> Self {
            Self {
                pre: Vec::new(),
                post: Vec::new(),
                skip: None,
                stop_at: None,
                reverse: false,
                visible: false,
            }
        }
    }

    impl Visitor for Collect {
        fn start(&mut self, _scene: &Scene, node: NodeId) -> bool {
            self.pre.push(node);
            self.skip == Some(node)
        }

        fn end(&mut self, _scene: &Scene, node: NodeId) -> bool {
            self.post.push(node);
            self.stop_at == Some(node)
        }

        fn reverse(&self) -> bool {
            self.reverse
        }

        fn visible_only(&self) -> bool {
            self.visible
        }
    }

    /// root -> [a -> [a1, a2], b]
    fn tree() -> (Scene, [NodeId; 5]) {
        let mut scene = Scene::new();
        let [root, a, a1, a2, b] = [(); 5].map(|()| scene.create_node());
        scene.append(root, &[a, b]);
        scene.append(a, &[a1, a2]);
        (scene, [root, a, a1, a2, b])
    }

    #[test]
    fn children_iterates_in_order() {
        let (scene, [root, a, _, _, b]) = tree();
        assert_eq!(scene.children(root).collect::<Vec<_>>(), [a, b]);
    }

    #[test]
    fn visit_pre_and_post_order() {
        let (scene, [root, a, a1, a2, b]) = tree();
        let mut v = Collect::new();
        assert!(!scene.visit(root, &mut v));
        assert_eq!(v.pre, [root, a, a1, a2, b]);
        assert_eq!(v.post, [a1, a2, a, b, root]);
    }

    #[test]
    fn visit_reverse() {
        let (scene, [root, a, a1, a2, b]) = tree();
        let mut v = Collect::new();
        v.reverse = true;
        scene.visit(root, &mut v);
        assert_eq!(v.pre, [root, b, a, a2, a1]);
    }

    #[test]
    fn start_true_skips_subtree() {
        let (scene, [root, a, _, _, b]) = tree();
        let mut v = Collect::new();
        v.skip = Some(a);
        scene.visit(root, &mut v);
        assert_eq!(v.pre, [root, a, b]);
        assert!(!v.post.contains(&a), "skipped node gets no end call");
    }

    #[test]
    fn end_true_stops_walk() {
        let (scene, [root, _, a1, _, _]) = tree();
        let mut v = Collect::new();
        v.stop_at = Some(a1);
        assert!(scene.visit(root, &mut v));
        assert_eq!(v.post, [a1]);
    }

    #[test]
    fn visible_only_skips_hidden() {
        let (mut scene, [root, a, _, _, b]) = tree();
        scene.hide(a);
        let mut v = Collect::new();
        v.visible = true;
        scene.visit(root, &mut v);
        assert_eq!(v.pre, [root, b]);
        assert_eq!(scene.first(root, true), Some(b));
        assert_eq!(scene.first(root, false), Some(a));
        assert_eq!(scene.prev(b, true), None);
        assert_eq!(scene.last(root, true), Some(b));
    }

    #[test]
    fn roots_lists_detached_nodes() {
        let (mut scene, [root, a, _, _, _]) = tree();
        scene.remove(a);
        assert_eq!(scene.roots().collect::<Vec<_>>(), [root, a]);
    }
}
