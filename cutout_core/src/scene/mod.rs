// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene node tree.
//!
//! A *node* is an entry in a [`Scene`]. Each node has:
//!
//! - An identity ([`NodeId`]), a generational handle that becomes stale when
//!   the node is destroyed. Nodes also carry an application id string and an
//!   attribute map.
//! - Topology: parent, first/last child and sibling links forming an ordered
//!   tree. Structural operations are O(1) except [`empty`](Scene::empty).
//! - A [`Pin`](crate::pin::Pin) holding layout inputs and cached matrices.
//! - Draw payloads ([`Out`](crate::out::Out)), per-frame callbacks
//!   ([`Ticker`]) and event listeners ([`Listener`]).
//!
//! # Invalidation
//!
//! Every mutation advances the scene's [`VersionClock`](crate::stamp::VersionClock)
//! and records the new value in a stamp. A node keeps three structural stamps:
//!
//! - **touch**: last change anywhere in the subtree. [`touch`](Scene::touch)
//!   walks the parent chain so a frame driver at the root can detect change
//!   in O(depth).
//! - **children**: last change to the children list or their visibility.
//! - **parent**: last time the node was attached or detached.
//!
//! Cached values are never invalidated eagerly. Each one is recomputed when
//! it is read and a dependency stamp is newer than the stamp it was computed
//! at.

mod evaluate;
mod event;
mod id;
mod store;
mod traverse;

pub use evaluate::FrameStats;
pub use id::{INVALID, NodeId};
pub use store::{Listener, Scene, TickOrder, Ticker};
pub(crate) use store::TouchHook;
pub use traverse::{Children, Visitor};
