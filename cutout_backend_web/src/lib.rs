// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for cutout.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`RafRequester`]: a [`FrameHost`] backed by `requestAnimationFrame`
//! - [`CanvasSurface`]: a [`Surface`](cutout_core::surface::Surface) over a
//!   canvas 2D context

#![no_std]

extern crate alloc;

mod canvas;
mod raf;

pub use canvas::CanvasSurface;
pub use cutout_core::driver::FrameHost;
pub use raf::RafRequester;

use cutout_core::time::{HostTime, Timebase};

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks. Use [`timebase`] to
/// convert to nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    ms_to_host(raf::performance_now())
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::new(1000, 1)
}

fn ms_to_host(ms: f64) -> HostTime {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "performance.now() returns small positive f64; µs fits in u64"
    )]
    let us = (ms.max(0.0) * 1000.0) as u64;
    HostTime(us)
}
