// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named event listeners on nodes.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use super::id::NodeId;
use super::store::{Listener, Scene};

impl Scene {
    /// Registers `listener` on `node` for every whitespace-separated event
    /// type in `types`.
    ///
    /// Returns the shared listener handle, which [`off`](Self::off) accepts.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn on(
        &mut self,
        node: NodeId,
        types: &str,
        listener: impl Fn(&mut Self, NodeId, &[f64]) + 'static,
    ) -> Listener {
        let listener: Listener = Rc::new(listener);
        self.on_shared(node, types, &listener);
        listener
    }

    /// Registers an existing listener handle, like [`on`](Self::on).
    pub fn on_shared(&mut self, node: NodeId, types: &str, listener: &Listener) {
        let idx = self.validate(node) as usize;
        for ty in types.split_whitespace() {
            self.hooks[idx]
                .listeners
                .entry(String::from(ty))
                .or_default()
                .push(Rc::clone(listener));
        }
    }

    /// Removes `listener` from every type in `types`.
    pub fn off(&mut self, node: NodeId, types: &str, listener: &Listener) {
        let idx = self.validate(node) as usize;
        let listeners = &mut self.hooks[idx].listeners;
        for ty in types.split_whitespace() {
            if let Some(list) = listeners.get_mut(ty) {
                list.retain(|l| !Rc::ptr_eq(l, listener));
                if list.is_empty() {
                    listeners.remove(ty);
                }
            }
        }
    }

    /// Calls every listener of `ty` on `node`, in registration order.
    ///
    /// Listeners added or removed while emitting take effect on the next
    /// emit. Returns whether at least one listener ran.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn emit(&mut self, node: NodeId, ty: &str, args: &[f64]) -> bool {
        let idx = self.validate(node) as usize;
        let Some(list) = self.hooks[idx].listeners.get(ty) else {
            return false;
        };
        let list: Vec<Listener> = list.iter().map(Rc::clone).collect();
        for listener in &list {
            listener(self, node, args);
        }
        !list.is_empty()
    }

    /// Number of listeners of `ty` on `node`.
    #[must_use]
    pub fn listener_count(&self, node: NodeId, ty: &str) -> usize {
        let idx = self.validate(node) as usize;
        self.hooks[idx].listeners.get(ty).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use core::cell::RefCell;

    use super::*;

    #[test]
    fn emit_without_listeners_is_false() {
        let mut scene = Scene::new();
        let a = scene.create_node();
        assert!(!scene.emit(a, "click", &[]));
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let mut scene = Scene::new();
        let a = scene.create_node();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in [1.0, 2.0] {
            let log = Rc::clone(&log);
            scene.on(a, "ping", move |_, _, args| {
                log.borrow_mut().push(tag * args[0]);
            });
        }
        assert!(scene.emit(a, "ping", &[10.0]));
        assert_eq!(*log.borrow(), vec![10.0, 20.0]);
    }

    #[test]
    fn one_listener_many_types() {
        let mut scene = Scene::new();
        let a = scene.create_node();
        let listener = scene.on(a, "down  up", |_, _, _| {});
        assert_eq!(scene.listener_count(a, "down"), 1);
        assert_eq!(scene.listener_count(a, "up"), 1);
        scene.off(a, "down", &listener);
        assert_eq!(scene.listener_count(a, "down"), 0);
        assert!(scene.emit(a, "up", &[]));
        assert!(!scene.emit(a, "down", &[]));
    }

    #[test]
    fn listener_may_mutate_scene() {
        let mut scene = Scene::new();
        let a = scene.create_node();
        scene.on(a, "resize", |scene, node, args| {
            scene.set_pin(node, crate::pin::PinOption::Width(args[0]));
        });
        scene.emit(a, "resize", &[320.0]);
        assert_eq!(scene.pin(a).width(), 320.0);
    }
}
