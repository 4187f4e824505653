// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained-mode 2D scene graph with pull-based transform invalidation.
//!
//! `cutout_core` keeps a tree of positioned nodes, re-evaluates it once per
//! frame and draws it by pasting rectangular image regions through affine
//! transforms. It is `no_std` compatible (with `alloc`) and stores nodes in
//! struct-of-arrays form addressed by generational handles.
//!
//! # Architecture
//!
//! ```text
//!   FrameHost ──► FrameDriver::frame()
//!                      │
//!                      ▼
//!   Scene::tick() ── pins, pin-children, tickers, children, box layout
//!                      │
//!                      ▼
//!   Scene::paint() ── absolute matrices, alpha ──► Out::paste() ──► Surface
//!                      │
//!   root touch unchanged? ──► pause until the next touch
//! ```
//!
//! **[`scene`]**: node arena, tree operations, tick and paint passes,
//! traversal and events. Every mutation advances a per-scene
//! [`VersionClock`](stamp::VersionClock); cached values compare stamps when
//! read instead of being invalidated eagerly.
//!
//! **[`pin`]**: per-node layout inputs and the cached relative matrix,
//! absolute matrix and bound derived from them.
//!
//! **[`matrix`]**: 2D affine transform with a lazily cached inverse.
//!
//! **[`layout`]**: row, column and plain box layout, and pin-children.
//!
//! **[`out`]** and **[`atlas`]**: draw payloads and the texture atlas that
//! cuts them. **[`surface`]**: the drawing contract payloads paste onto.
//!
//! **[`driver`]**: demand-driven frame loop over a root node.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! frame-loop instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-frame
//!   paste failure events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod atlas;
pub mod driver;
pub mod layout;
pub mod matrix;
pub mod out;
pub mod pin;
pub mod scene;
pub mod stamp;
pub mod surface;
pub mod time;
pub mod trace;
