// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are converted to microseconds using a [`Timebase`].

use std::io::Write;

use cutout_core::time::{HostTime, Timebase};
use cutout_core::trace::{
    FrameSummary, FrameTickEvent, PasteFailure, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Consumes the sink and returns the destination.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn ticks_to_us(&self, ticks: u64) -> f64 {
        self.timebase.ticks_to_nanos(ticks) as f64 / 1000.0
    }

    fn host_us(&self, t: HostTime) -> f64 {
        self.ticks_to_us(t.ticks())
    }
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Tick => "tick",
        PhaseKind::Paint => "paint",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_tick(&mut self, e: &FrameTickEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] frame={} now={:.1}µs elapsed={:.3}ms",
            e.frame_index,
            self.host_us(e.now),
            e.elapsed_ms,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {} at {:.1}µs",
            e.frame_index,
            phase_name(e.phase),
            self.host_us(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} at {:.1}µs",
            e.frame_index,
            phase_name(e.phase),
            self.host_us(e.timestamp),
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let state = if s.paused { "idle" } else { "running" };
        let _ = writeln!(
            self.writer,
            "[summary] frame={} tick={:.1}µs paint={:.1}µs ticked={} painted={} \
             pasted={} failed={} state={state}",
            s.frame_index,
            self.ticks_to_us(s.tick_ticks),
            self.ticks_to_us(s.paint_ticks),
            s.stats.ticked,
            s.stats.painted,
            s.stats.pasted,
            s.stats.failed,
        );
    }

    fn on_paste_failures(&mut self, frame_index: u64, failures: &[PasteFailure]) {
        for f in failures {
            let _ = writeln!(
                self.writer,
                "[paste:failed] frame={frame_index} node={:?} image={:?} src={:?}",
                f.node, f.image, f.src,
            );
        }
    }
}
