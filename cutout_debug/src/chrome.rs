// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`ChromeTraceSink`] collects frame driver events as they arrive and
//! [`write_to`](ChromeTraceSink::write_to) emits them as
//! [Chrome Trace Event Format][format] JSON.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use cutout_core::time::Timebase;
use cutout_core::trace::{
    FrameSummary, FrameTickEvent, PasteFailure, PhaseBeginEvent, PhaseEndEvent, TraceSink,
};

/// Collects trace events as Chrome Trace Event Format objects.
///
/// Pass phases become `B`/`E` duration pairs, frame starts and summaries
/// become instant events, and per-frame node counters become a `C` counter
/// track. Timestamps are converted to microseconds using the provided
/// [`Timebase`].
#[derive(Debug)]
pub struct ChromeTraceSink {
    timebase: Timebase,
    events: Vec<Value>,
}

impl ChromeTraceSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new(timebase: Timebase) -> Self {
        Self {
            timebase,
            events: Vec::new(),
        }
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the collected events.
    #[must_use]
    pub fn events(&self) -> &[Value] {
        &self.events
    }

    /// Discards all collected events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Writes the collected events as a JSON array, suitable for loading
    /// into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(writer, &self.events)?;
        Ok(())
    }

    fn us(&self, ticks: u64) -> f64 {
        self.timebase.ticks_to_nanos(ticks) as f64 / 1000.0
    }
}

impl TraceSink for ChromeTraceSink {
    fn on_frame_tick(&mut self, e: &FrameTickEvent) {
        let ts = self.us(e.now.ticks());
        self.events.push(json!({
            "ph": "i",
            "name": "Frame",
            "cat": "Driver",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "s": "g",
            "args": {
                "frame_index": e.frame_index,
                "elapsed_ms": e.elapsed_ms,
            }
        }));
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let ts = self.us(e.timestamp.ticks());
        self.events.push(json!({
            "ph": "B",
            "name": format!("{:?}", e.phase),
            "cat": "Frame",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "args": {
                "frame_index": e.frame_index,
            }
        }));
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let ts = self.us(e.timestamp.ticks());
        self.events.push(json!({
            "ph": "E",
            "name": format!("{:?}", e.phase),
            "cat": "Frame",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "args": {
                "frame_index": e.frame_index,
            }
        }));
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let ts = self.us(s.now.ticks());
        self.events.push(json!({
            "ph": "i",
            "name": "FrameSummary",
            "cat": "Summary",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "s": "g",
            "args": {
                "frame_index": s.frame_index,
                "tick_us": self.us(s.tick_ticks),
                "paint_us": self.us(s.paint_ticks),
                "paused": s.paused,
            }
        }));
        self.events.push(json!({
            "ph": "C",
            "name": "Nodes",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "args": {
                "ticked": s.stats.ticked,
                "painted": s.stats.painted,
                "pasted": s.stats.pasted,
                "failed": s.stats.failed,
            }
        }));
    }

    fn on_paste_failures(&mut self, frame_index: u64, failures: &[PasteFailure]) {
        if failures.is_empty() {
            return;
        }
        let images: Vec<u32> = failures.iter().map(|f| f.image.0).collect();
        self.events.push(json!({
            "ph": "i",
            "name": "PasteFailures",
            "cat": "Rich",
            "ts": 0,
            "pid": 0,
            "tid": 0,
            "s": "p",
            "args": {
                "frame_index": frame_index,
                "count": failures.len(),
                "images": images,
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use cutout_core::driver::{FrameDriver, FrameHost};
    use cutout_core::matrix::Matrix;
    use cutout_core::out::{Cutout, ImageSlot, Out};
    use cutout_core::scene::Scene;
    use cutout_core::surface::{ImageId, PasteError, Surface};
    use cutout_core::time::HostTime;
    use cutout_core::trace::{PhaseKind, Tracer};
    use kurbo::Rect;

    use super::*;

    struct StepHost {
        now: Cell<u64>,
    }

    impl FrameHost for StepHost {
        fn request_frame(&self) {}

        fn now(&self) -> HostTime {
            let t = self.now.get();
            self.now.set(t + 1_000);
            HostTime(t)
        }
    }

    struct RejectingSurface;

    impl Surface for RejectingSurface {
        fn set_transform(&mut self, _: &Matrix) {}

        fn alpha(&self) -> f64 {
            1.0
        }

        fn set_alpha(&mut self, _: f64) {}

        fn draw_image(&mut self, image: ImageId, _: Rect, _: Rect) -> Result<(), PasteError> {
            Err(PasteError::MissingImage(image))
        }
    }

    fn parse(sink: &ChromeTraceSink) -> Vec<Value> {
        let mut out = Vec::new();
        sink.write_to(&mut out).unwrap();
        serde_json::from_str(&String::from_utf8(out).unwrap()).unwrap()
    }

    #[test]
    fn phases_become_duration_pairs() {
        let mut sink = ChromeTraceSink::new(Timebase::NANOS);
        sink.on_phase_begin(&PhaseBeginEvent {
            frame_index: 0,
            phase: PhaseKind::Tick,
            timestamp: HostTime(1_000_000),
        });
        sink.on_phase_end(&PhaseEndEvent {
            frame_index: 0,
            phase: PhaseKind::Tick,
            timestamp: HostTime(1_000_500),
        });

        let parsed = parse(&sink);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "Tick");
        assert_eq!(parsed[0]["ts"], 1000.0);
        assert_eq!(parsed[1]["ph"], "E");
        assert_eq!(parsed[1]["ts"], 1000.5);
    }

    #[test]
    fn empty_sink_writes_empty_array() {
        let sink = ChromeTraceSink::new(Timebase::NANOS);
        assert!(sink.is_empty());
        assert!(parse(&sink).is_empty());
    }

    #[test]
    fn records_a_driven_frame() {
        let mut scene = Scene::new();
        let driver = FrameDriver::new(&mut scene, StepHost { now: Cell::new(0) });
        let node = scene.create_node();
        scene.append_to(node, driver.root());
        scene.set_image(
            node,
            Out::new(
                Cutout::new("missing", 0.0, 0.0, 4.0, 4.0),
                ImageSlot::filled(ImageId(9)),
                1.0,
            ),
        );
        driver.start();

        let mut sink = ChromeTraceSink::new(Timebase::NANOS);
        let stats = driver
            .frame(&mut scene, &mut RejectingSurface, &mut Tracer::new(&mut sink))
            .unwrap();
        assert_eq!(stats.failed, 1);

        let parsed = parse(&sink);
        let phases: Vec<&str> = parsed.iter().map(|e| e["ph"].as_str().unwrap()).collect();
        assert_eq!(phases, ["i", "B", "E", "B", "E", "i", "i", "C"]);
        assert_eq!(parsed[0]["name"], "Frame");
        assert_eq!(parsed[5]["name"], "PasteFailures");
        assert_eq!(parsed[5]["args"]["images"][0], 9);
        assert_eq!(parsed[7]["args"]["failed"], 1);

        sink.clear();
        assert_eq!(sink.len(), 0);
    }
}
