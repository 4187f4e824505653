// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, and property
//! management.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::layout::{LayoutState, PinChildren};
use crate::out::Out;
use crate::pin::{Pin, PinChange, PinKey, PinOption, PinParseError, PinUpdate, PinValue};
use crate::stamp::VersionClock;
#[cfg(feature = "trace-rich")]
use crate::trace::PasteFailure;

use super::id::{INVALID, NodeId};

/// Callback run once per frame while ticking a node; receives the elapsed
/// milliseconds since the previous frame.
pub type Ticker = Box<dyn FnMut(&mut Scene, NodeId, f64)>;

/// Event listener; receives the emitted arguments.
pub type Listener = Rc<dyn Fn(&mut Scene, NodeId, &[f64])>;

/// When a [`Ticker`] runs relative to the node's children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickOrder {
    /// Before any child is ticked.
    BeforeChildren,
    /// After every child has been ticked.
    AfterChildren,
}

/// Observer notified whenever a touch reaches the node it is attached to.
pub(crate) trait TouchHook {
    fn touched(&self);
}

/// Behavior attached to a node.
#[derive(Default)]
pub(crate) struct NodeHooks {
    pub(crate) before: Vec<Ticker>,
    pub(crate) after: Vec<Ticker>,
    pub(crate) listeners: BTreeMap<String, Vec<Listener>>,
    pub(crate) layout: Option<LayoutState>,
    pub(crate) pin_children: Option<PinChildren>,
    pub(crate) touch_hook: Option<Rc<dyn TouchHook>>,
}

impl fmt::Debug for NodeHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHooks")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .field("listeners", &self.listeners.keys().collect::<Vec<_>>())
            .field("layout", &self.layout)
            .field("pin_children", &self.pin_children)
            .field("touch_hook", &self.touch_hook.is_some())
            .finish()
    }
}

/// Structural version stamps of one node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct NodeStamps {
    /// Last change anywhere in the subtree.
    pub(crate) touch: u64,
    /// Last change to the list of children (or their visibility).
    pub(crate) children: u64,
    /// Last change of parent.
    pub(crate) parent: u64,
}

/// Application identity of one node.
#[derive(Clone, Debug, Default)]
pub(crate) struct NodeMeta {
    pub(crate) id: String,
    pub(crate) attrs: BTreeMap<String, String>,
}

/// Struct-of-arrays storage for all nodes of one scene.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
///
/// Children form a doubly linked list per parent. Parent and sibling links
/// are plain indices, so the tree has no ownership cycles.
pub struct Scene {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) last_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Per-node state --
    pub(crate) meta: Vec<NodeMeta>,
    pub(crate) visible: Vec<bool>,
    pub(crate) pins: Vec<Pin>,
    pub(crate) outs: Vec<Vec<Out>>,
    pub(crate) hooks: Vec<NodeHooks>,
    pub(crate) stamps: Vec<NodeStamps>,

    // -- Written by paint --
    pub(crate) resolved_alpha: Vec<f64>,
    #[cfg(feature = "trace-rich")]
    pub(crate) paste_failures: Vec<PasteFailure>,

    /// Reused ancestor buffer for out-of-pass matrix reads.
    pub(crate) chain_scratch: Vec<u32>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    pub(crate) clock: VersionClock,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("len", &self.len)
            .field("free", &self.free_list.len())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            last_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            meta: Vec::new(),
            visible: Vec::new(),
            pins: Vec::new(),
            outs: Vec::new(),
            hooks: Vec::new(),
            stamps: Vec::new(),
            resolved_alpha: Vec::new(),
            #[cfg(feature = "trace-rich")]
            paste_failures: Vec::new(),
            chain_scratch: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            clock: VersionClock::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new, detached, visible node with an identity pin.
    pub fn create_node(&mut self) -> NodeId {
        let pin = Pin::new(&mut self.clock);
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.last_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.meta[i] = NodeMeta::default();
            self.visible[i] = true;
            self.pins[i] = pin;
            self.outs[i].clear();
            self.hooks[i] = NodeHooks::default();
            self.stamps[i] = NodeStamps::default();
            self.resolved_alpha[i] = 1.0;
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.last_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.meta.push(NodeMeta::default());
            self.visible.push(true);
            self.pins.push(pin);
            self.outs.push(Vec::new());
            self.hooks.push(NodeHooks::default());
            self.stamps.push(NodeStamps::default());
            self.resolved_alpha.push(1.0);
            self.generation.push(0);
            self.alive.push(true);
            idx
        };
        self.id_at(idx)
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// The node is detached from its parent first. Its callbacks, listeners
    /// and payloads are dropped.
    ///
    /// # Panics
    ///
    /// Panics if the node has children (remove or destroy them first) or if
    /// the handle is stale.
    pub fn destroy_node(&mut self, id: NodeId) {
        let c = self.validate(id);
        assert!(
            self.first_child[c as usize] == INVALID,
            "cannot destroy node with children"
        );
        if self.parent[c as usize] != INVALID {
            self.detach(c);
        }
        let i = c as usize;
        self.generation[i] += 1;
        self.alive[i] = false;
        self.hooks[i] = NodeHooks::default();
        self.outs[i].clear();
        self.meta[i] = NodeMeta::default();
        self.free_list.push(c);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.alive[id.idx as usize]
            && self.generation[id.idx as usize] == id.generation
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    /// Returns the scene's version clock.
    #[must_use]
    pub fn clock(&self) -> &VersionClock {
        &self.clock
    }

    // -- Topology API --

    /// Makes `child` the last child of `parent`, detaching it from any
    /// current parent first.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` is `parent`, or if
    /// `parent` lies inside `child`'s subtree.
    pub fn append_to(&mut self, child: NodeId, parent: NodeId) {
        let (c, p) = self.validate_pair(child, parent);
        self.detach(c);
        let last = self.last_child[p as usize];
        if last != INVALID {
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        } else {
            self.first_child[p as usize] = c;
        }
        self.last_child[p as usize] = c;
        self.parent[c as usize] = p;
        self.attached(c, p);
    }

    /// Makes `child` the first child of `parent`, detaching it from any
    /// current parent first.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` is `parent`, or if
    /// `parent` lies inside `child`'s subtree.
    pub fn prepend_to(&mut self, child: NodeId, parent: NodeId) {
        let (c, p) = self.validate_pair(child, parent);
        self.detach(c);
        let first = self.first_child[p as usize];
        if first != INVALID {
            self.prev_sibling[first as usize] = c;
            self.next_sibling[c as usize] = first;
        } else {
            self.last_child[p as usize] = c;
        }
        self.first_child[p as usize] = c;
        self.parent[c as usize] = p;
        self.attached(c, p);
    }

    /// Places `node` immediately before `next`, under `next`'s parent.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if they are the same node, if
    /// `next` has no parent, or if `next` lies inside `node`'s subtree.
    pub fn insert_before(&mut self, node: NodeId, next: NodeId) {
        let (c, n) = self.validate_pair(node, next);
        assert!(
            self.parent[n as usize] != INVALID,
            "sibling has no parent"
        );
        self.detach(c);
        let p = self.parent[n as usize];
        let prev = self.prev_sibling[n as usize];
        self.prev_sibling[n as usize] = c;
        if prev != INVALID {
            self.next_sibling[prev as usize] = c;
        } else {
            self.first_child[p as usize] = c;
        }
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = prev;
        self.next_sibling[c as usize] = n;
        self.attached(c, p);
    }

    /// Places `node` immediately after `prev`, under `prev`'s parent.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if they are the same node, if
    /// `prev` has no parent, or if `prev` lies inside `node`'s subtree.
    pub fn insert_after(&mut self, node: NodeId, prev: NodeId) {
        let (c, v) = self.validate_pair(node, prev);
        assert!(
            self.parent[v as usize] != INVALID,
            "sibling has no parent"
        );
        self.detach(c);
        let p = self.parent[v as usize];
        let next = self.next_sibling[v as usize];
        self.next_sibling[v as usize] = c;
        if next != INVALID {
            self.prev_sibling[next as usize] = c;
        } else {
            self.last_child[p as usize] = c;
        }
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = v;
        self.next_sibling[c as usize] = next;
        self.attached(c, p);
    }

    /// Appends each of `children` to `parent`, in order.
    pub fn append(&mut self, parent: NodeId, children: &[NodeId]) {
        for &child in children {
            self.append_to(child, parent);
        }
    }

    /// Prepends each of `children` to `parent`, in order (so the last one
    /// ends up first).
    pub fn prepend(&mut self, parent: NodeId, children: &[NodeId]) {
        for &child in children {
            self.prepend_to(child, parent);
        }
    }

    /// Inserts each of `nodes` directly after `node`, in order (so the last
    /// one ends up adjacent).
    pub fn insert_next(&mut self, node: NodeId, nodes: &[NodeId]) {
        for &n in nodes {
            self.insert_after(n, node);
        }
    }

    /// Inserts each of `nodes` directly before `node`, in order.
    pub fn insert_prev(&mut self, node: NodeId, nodes: &[NodeId]) {
        for &n in nodes {
            self.insert_before(n, node);
        }
    }

    /// Detaches `node` from its parent. Its own children stay attached to
    /// it. Detaching a root only advances its parent stamp.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove(&mut self, node: NodeId) {
        let c = self.validate(node);
        self.detach(c);
    }

    /// Detaches every child of `node`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn empty(&mut self, node: NodeId) {
        let p = self.validate(node);
        let mut child = self.first_child[p as usize];
        while child != INVALID {
            let next = self.next_sibling[child as usize];
            self.parent[child as usize] = INVALID;
            self.prev_sibling[child as usize] = INVALID;
            self.next_sibling[child as usize] = INVALID;
            self.stamps[child as usize].parent = self.clock.advance();
            child = next;
        }
        self.first_child[p as usize] = INVALID;
        self.last_child[p as usize] = INVALID;
        self.stamps[p as usize].children = self.clock.advance();
        self.touch_idx(p);
    }

    /// Returns the parent of `node`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        let c = self.validate(node);
        self.id_opt(self.parent[c as usize])
    }

    /// Marks `node` and all of its ancestors as changed.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn touch(&mut self, node: NodeId) {
        let idx = self.validate(node);
        self.touch_idx(idx);
    }

    // -- Property API --

    /// Returns the application id of `node` (empty by default).
    #[must_use]
    pub fn id(&self, node: NodeId) -> &str {
        &self.meta[self.validate(node) as usize].id
    }

    /// Sets the application id of `node`.
    pub fn set_id(&mut self, node: NodeId, id: impl Into<String>) {
        let idx = self.validate(node);
        self.meta[idx as usize].id = id.into();
    }

    /// Returns an attribute of `node`.
    #[must_use]
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        let idx = self.validate(node);
        self.meta[idx as usize].attrs.get(name).map(String::as_str)
    }

    /// Sets an attribute of `node`.
    pub fn set_attr(&mut self, node: NodeId, name: impl Into<String>, value: impl Into<String>) {
        let idx = self.validate(node);
        self.meta[idx as usize]
            .attrs
            .insert(name.into(), value.into());
    }

    /// Returns whether `node` is visible.
    #[must_use]
    pub fn is_visible(&self, node: NodeId) -> bool {
        self.visible[self.validate(node) as usize]
    }

    /// Shows or hides `node` and its subtree.
    ///
    /// A change advances the parent's children stamp (so child-dependent
    /// behavior such as box layout re-runs) and touches the node.
    pub fn set_visible(&mut self, node: NodeId, visible: bool) {
        let idx = self.validate(node) as usize;
        if self.visible[idx] == visible {
            return;
        }
        self.visible[idx] = visible;
        let p = self.parent[idx];
        if p != INVALID {
            self.stamps[p as usize].children = self.clock.advance();
        }
        self.touch_idx(idx as u32);
    }

    /// Hides `node`.
    pub fn hide(&mut self, node: NodeId) {
        self.set_visible(node, false);
    }

    /// Shows `node`.
    pub fn show(&mut self, node: NodeId) {
        self.set_visible(node, true);
    }

    /// Returns the pin of `node`.
    #[must_use]
    pub fn pin(&self, node: NodeId) -> &Pin {
        &self.pins[self.validate(node) as usize]
    }

    /// Applies a batch of pin options to `node` and touches it if anything
    /// changed.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set_pin(&mut self, node: NodeId, update: impl Into<PinUpdate>) -> PinChange {
        let idx = self.validate(node);
        self.apply_pin(idx, &update.into())
    }

    /// Applies one string-keyed option to `node`.
    ///
    /// An unknown key or a mistyped value is logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns the [`PinParseError`] that was logged.
    pub fn pin_named<'a>(
        &mut self,
        node: NodeId,
        key: &str,
        value: impl Into<PinValue<'a>>,
    ) -> Result<PinChange, PinParseError> {
        match PinOption::parse(key, value.into()) {
            Ok(option) => Ok(self.set_pin(node, option)),
            Err(err) => {
                log::warn!("{err}");
                Err(err)
            }
        }
    }

    /// Reads one string-keyed option of `node`.
    #[must_use]
    pub fn pin_value(&self, node: NodeId, key: PinKey) -> Option<f64> {
        self.pin(node).get(key)
    }

    pub(crate) fn apply_pin(&mut self, idx: u32, update: &PinUpdate) -> PinChange {
        let change = self.pins[idx as usize].apply(update, &mut self.clock);
        if !change.is_empty() {
            self.touch_idx(idx);
        }
        change
    }

    /// Returns the draw payloads of `node`.
    #[must_use]
    pub fn outs(&self, node: NodeId) -> &[Out] {
        &self.outs[self.validate(node) as usize]
    }

    /// Adds a draw payload to `node`.
    pub fn add_out(&mut self, node: NodeId, out: Out) {
        let idx = self.validate(node);
        self.outs[idx as usize].push(out);
        self.touch_idx(idx);
    }

    /// Replaces the draw payloads of `node`.
    pub fn set_outs(&mut self, node: NodeId, outs: Vec<Out>) {
        let idx = self.validate(node);
        self.outs[idx as usize] = outs;
        self.touch_idx(idx);
    }

    /// Makes `out` the single payload of `node` and sizes the node to it.
    pub fn set_image(&mut self, node: NodeId, out: Out) {
        let idx = self.validate(node);
        let update = PinUpdate::new()
            .with(PinOption::Width(out.width()))
            .with(PinOption::Height(out.height()));
        self.outs[idx as usize] = alloc::vec![out];
        self.pins[idx as usize].apply(&update, &mut self.clock);
        self.touch_idx(idx);
    }

    /// Registers a per-frame callback on `node`.
    ///
    /// Callbacks of one order run in registration order.
    pub fn register_tick(
        &mut self,
        node: NodeId,
        order: TickOrder,
        ticker: impl FnMut(&mut Self, NodeId, f64) + 'static,
    ) {
        let idx = self.validate(node) as usize;
        let list = match order {
            TickOrder::BeforeChildren => &mut self.hooks[idx].before,
            TickOrder::AfterChildren => &mut self.hooks[idx].after,
        };
        list.push(Box::new(ticker));
    }

    // -- Stamps --

    /// Stamp of the last change anywhere in `node`'s subtree.
    #[must_use]
    pub fn touch_stamp(&self, node: NodeId) -> u64 {
        self.stamps[self.validate(node) as usize].touch
    }

    /// Stamp of the last change to `node`'s children list.
    #[must_use]
    pub fn children_stamp(&self, node: NodeId) -> u64 {
        self.stamps[self.validate(node) as usize].children
    }

    /// Stamp of the last time `node` changed parent.
    #[must_use]
    pub fn parent_stamp(&self, node: NodeId) -> u64 {
        self.stamps[self.validate(node) as usize].parent
    }

    pub(crate) fn set_touch_hook(&mut self, node: NodeId, hook: Rc<dyn TouchHook>) {
        let idx = self.validate(node) as usize;
        self.hooks[idx].touch_hook = Some(hook);
    }

    // -- Internal helpers --

    /// Validates a handle and returns its slot index.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[inline]
    pub(crate) fn validate(&self, id: NodeId) -> u32 {
        assert!(self.is_alive(id), "stale NodeId");
        id.idx
    }

    fn validate_pair(&self, node: NodeId, other: NodeId) -> (u32, u32) {
        let (a, b) = (self.validate(node), self.validate(other));
        assert!(a != b, "cannot attach a node relative to itself");
        assert!(
            !self.is_ancestor(a, b),
            "cannot attach a node inside its own subtree"
        );
        (a, b)
    }

    fn is_ancestor(&self, ancestor: u32, mut node: u32) -> bool {
        while node != INVALID {
            if node == ancestor {
                return true;
            }
            node = self.parent[node as usize];
        }
        false
    }

    #[inline]
    pub(crate) fn id_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    #[inline]
    pub(crate) fn id_opt(&self, idx: u32) -> Option<NodeId> {
        (idx != INVALID).then(|| self.id_at(idx))
    }

    pub(crate) fn touch_idx(&mut self, mut idx: u32) {
        while idx != INVALID {
            let i = idx as usize;
            self.stamps[i].touch = self.clock.advance();
            if let Some(hook) = &self.hooks[i].touch_hook {
                hook.touched();
            }
            idx = self.parent[i];
        }
    }

    /// Stamps a completed attach of `c` under `p`.
    fn attached(&mut self, c: u32, p: u32) {
        self.stamps[c as usize].parent = self.clock.advance();
        self.stamps[p as usize].children = self.clock.advance();
        self.touch_idx(p);
    }

    /// Unlinks `c` from its siblings and parent, then stamps the change.
    fn detach(&mut self, c: u32) {
        let i = c as usize;
        let p = self.parent[i];
        let prev = self.prev_sibling[i];
        let next = self.next_sibling[i];
        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else if p != INVALID {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        } else if p != INVALID {
            self.last_child[p as usize] = prev;
        }
        self.parent[i] = INVALID;
        self.prev_sibling[i] = INVALID;
        self.next_sibling[i] = INVALID;
        if p != INVALID {
            self.stamps[p as usize].children = self.clock.advance();
            self.touch_idx(p);
        }
        self.stamps[i].parent = self.clock.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::out::{Cutout, ImageSlot};

    fn kids(scene: &Scene, node: NodeId) -> Vec<NodeId> {
        scene.children(node).collect()
    }

    #[test]
    fn create_and_destroy() {
        let mut scene = Scene::new();
        let a = scene.create_node();
        assert!(scene.is_alive(a));
        assert_eq!(scene.node_count(), 1);
        scene.destroy_node(a);
        assert!(!scene.is_alive(a));
        assert_eq!(scene.node_count(), 0);
    }

    #[test]
    fn slot_reuse_bumps_generation() {
        let mut scene = Scene::new();
        let a = scene.create_node();
        scene.destroy_node(a);
        let b = scene.create_node();
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert!(!scene.is_alive(a));
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn stale_handle_panics() {
        let mut scene = Scene::new();
        let a = scene.create_node();
        scene.destroy_node(a);
        scene.touch(a);
    }

    #[test]
    #[should_panic(expected = "cannot destroy node with children")]
    fn destroy_with_children_panics() {
        let mut scene = Scene::new();
        let p = scene.create_node();
        let c = scene.create_node();
        scene.append_to(c, p);
        scene.destroy_node(p);
    }

    #[test]
    #[should_panic(expected = "cannot attach a node inside its own subtree")]
    fn attach_under_own_descendant_panics() {
        let mut scene = Scene::new();
        let a = scene.create_node();
        let b = scene.create_node();
        scene.append_to(b, a);
        scene.append_to(a, b);
    }

    #[test]
    #[should_panic(expected = "cannot attach a node inside its own subtree")]
    fn insert_next_to_own_descendant_panics() {
        let mut scene = Scene::new();
        let a = scene.create_node();
        let b = scene.create_node();
        let c = scene.create_node();
        scene.append_to(b, a);
        scene.append_to(c, b);
        scene.insert_after(a, c);
    }

    #[test]
    fn append_and_prepend_order() {
        let mut scene = Scene::new();
        let p = scene.create_node();
        let [a, b, c] = [scene.create_node(), scene.create_node(), scene.create_node()];
        scene.append(p, &[a, b]);
        scene.prepend_to(c, p);
        assert_eq!(kids(&scene, p), [c, a, b]);
        assert_eq!(scene.parent(a), Some(p));
    }

    #[test]
    fn append_to_moves_between_parents() {
        let mut scene = Scene::new();
        let p1 = scene.create_node();
        let p2 = scene.create_node();
        let [a, b, c] = [scene.create_node(), scene.create_node(), scene.create_node()];
        scene.append(p1, &[a, b, c]);
        scene.append_to(b, p2);
        assert_eq!(kids(&scene, p1), [a, c]);
        assert_eq!(kids(&scene, p2), [b]);
        assert_eq!(scene.parent(b), Some(p2));
    }

    #[test]
    fn insert_before_and_after() {
        let mut scene = Scene::new();
        let p = scene.create_node();
        let [a, b, c, d] = [
            scene.create_node(),
            scene.create_node(),
            scene.create_node(),
            scene.create_node(),
        ];
        scene.append(p, &[a, b]);
        scene.insert_before(c, a);
        scene.insert_after(d, a);
        assert_eq!(kids(&scene, p), [c, a, d, b]);
        // Moving within the same parent.
        scene.insert_after(c, b);
        assert_eq!(kids(&scene, p), [a, d, b, c]);
    }

    #[test]
    fn insert_next_reverses_insert_prev_keeps_order() {
        let mut scene = Scene::new();
        let p = scene.create_node();
        let [m, x, y] = [scene.create_node(), scene.create_node(), scene.create_node()];
        scene.append_to(m, p);
        scene.insert_next(m, &[x, y]);
        assert_eq!(kids(&scene, p), [m, y, x]);
        scene.insert_prev(m, &[x, y]);
        assert_eq!(kids(&scene, p), [x, y, m]);
    }

    #[test]
    #[should_panic(expected = "sibling has no parent")]
    fn insert_next_to_root_panics() {
        let mut scene = Scene::new();
        let a = scene.create_node();
        let b = scene.create_node();
        scene.insert_after(b, a);
    }

    #[test]
    fn remove_keeps_grandchildren() {
        let mut scene = Scene::new();
        let p = scene.create_node();
        let c = scene.create_node();
        let g = scene.create_node();
        scene.append_to(c, p);
        scene.append_to(g, c);
        scene.remove(c);
        assert_eq!(scene.parent(c), None);
        assert!(kids(&scene, p).is_empty());
        assert_eq!(kids(&scene, c), [g]);
    }

    #[test]
    fn empty_detaches_all_children() {
        let mut scene = Scene::new();
        let p = scene.create_node();
        let [a, b] = [scene.create_node(), scene.create_node()];
        scene.append(p, &[a, b]);
        let before = scene.parent_stamp(a);
        scene.empty(p);
        assert!(kids(&scene, p).is_empty());
        assert_eq!(scene.parent(a), None);
        assert!(scene.parent_stamp(a) > before);
        assert_eq!(scene.next(a, false), None);
    }

    #[test]
    fn structural_ops_stamp_and_touch() {
        let mut scene = Scene::new();
        let root = scene.create_node();
        let p = scene.create_node();
        let c = scene.create_node();
        scene.append_to(p, root);
        let (root_touch, p_children) = (scene.touch_stamp(root), scene.children_stamp(p));
        scene.append_to(c, p);
        assert!(scene.touch_stamp(root) > root_touch, "touch reaches the root");
        assert!(scene.children_stamp(p) > p_children);
        assert!(scene.parent_stamp(c) > 0);
    }

    #[test]
    fn redundant_pin_write_does_not_touch() {
        let mut scene = Scene::new();
        let a = scene.create_node();
        scene.set_pin(a, PinOption::OffsetX(5.0));
        let touched = scene.touch_stamp(a);
        let change = scene.set_pin(a, PinOption::OffsetX(5.0));
        assert!(change.is_empty());
        assert_eq!(scene.touch_stamp(a), touched);
    }

    #[test]
    fn pin_named_reports_unknown_keys() {
        let mut scene = Scene::new();
        let a = scene.create_node();
        assert!(scene.pin_named(a, "rotation", 1.5).is_ok());
        assert_eq!(scene.pin_value(a, PinKey::Rotation), Some(1.5));
        assert!(scene.pin_named(a, "spin", 1.0).is_err());
    }

    #[test]
    fn visibility_change_stamps_parent_children() {
        let mut scene = Scene::new();
        let p = scene.create_node();
        let c = scene.create_node();
        scene.append_to(c, p);
        let before = scene.children_stamp(p);
        scene.hide(c);
        assert!(!scene.is_visible(c));
        assert!(scene.children_stamp(p) > before);
        let after = scene.children_stamp(p);
        scene.hide(c);
        assert_eq!(scene.children_stamp(p), after, "no-op visibility write");
    }

    #[test]
    fn id_and_attrs() {
        let mut scene = Scene::new();
        let a = scene.create_node();
        assert_eq!(scene.id(a), "");
        scene.set_id(a, "hero");
        scene.set_attr(a, "team", "red");
        assert_eq!(scene.id(a), "hero");
        assert_eq!(scene.attr(a, "team"), Some("red"));
        assert_eq!(scene.attr(a, "hp"), None);
    }

    #[test]
    fn set_image_sizes_node() {
        let mut scene = Scene::new();
        let a = scene.create_node();
        let out = Out::new(Cutout::new("box", 0.0, 0.0, 24.0, 12.0), ImageSlot::new(), 1.0);
        scene.set_image(a, out);
        assert_eq!(scene.outs(a).len(), 1);
        assert_eq!(scene.pin(a).width(), 24.0);
        assert_eq!(scene.pin(a).height(), 12.0);
    }
}
