// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostic trace sinks for the cutout frame driver.
//!
//! - [`pretty::PrettyPrintSink`]: one human-readable line per event.
//! - [`chrome::ChromeTraceSink`]: collects events and writes Chrome Trace
//!   Event Format JSON for `chrome://tracing` or Perfetto.
//!
//! Both implement [`TraceSink`](cutout_core::trace::TraceSink) and are passed
//! to [`FrameDriver::frame`](cutout_core::driver::FrameDriver::frame) through
//! a [`Tracer`](cutout_core::trace::Tracer).

pub mod chrome;
pub mod pretty;
