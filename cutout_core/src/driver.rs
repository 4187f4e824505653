// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Demand-driven frame loop.
//!
//! A [`FrameDriver`] owns the root node of a scene and asks its
//! [`FrameHost`] for a frame only while something changes. Each call to
//! [`frame`](FrameDriver::frame) ticks and paints the tree, requests the next
//! frame, and pauses if the root's touch stamp did not move during the
//! render. Any later touch that reaches the root resumes the loop.
//!
//! ```text
//!   start/resume ──► host.request_frame()
//!                          │
//!                          ▼
//!   host calls frame() ──► tick + paint ──► request_frame()
//!                                   │
//!                     root touch unchanged? ──► pause
//!                                   ▲
//!   touch anywhere under root ──────┴── resume
//! ```

use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;

use crate::pin::{FitMode, PinOption, PinUpdate};
use crate::scene::{FrameStats, NodeId, Scene, TouchHook};
use crate::surface::Surface;
use crate::time::{HostTime, Timebase};
use crate::trace::{
    FrameSummaryBuilder, FrameTickEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, Tracer,
};

/// Event type emitted on the root by [`FrameDriver::resize`].
pub const RESIZE: &str = "resize";

/// Platform side of the frame loop.
pub trait FrameHost {
    /// Schedules one call to [`FrameDriver::frame`], typically on the next
    /// display refresh.
    fn request_frame(&self);

    /// Current monotonic host time.
    fn now(&self) -> HostTime;

    /// Tick-to-nanosecond factor of [`now`](Self::now).
    fn timebase(&self) -> Timebase {
        Timebase::NANOS
    }
}

/// Logical size the root is fitted into on resize.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewbox {
    /// Logical width.
    pub width: f64,
    /// Logical height.
    pub height: f64,
    /// How the logical size maps onto the resized size.
    pub mode: FitMode,
}

impl Viewbox {
    /// A viewbox that fits inside the resized size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            mode: FitMode::In,
        }
    }

    /// Returns the viewbox with the given fit mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: FitMode) -> Self {
        self.mode = mode;
        self
    }
}

struct DriverInner<H> {
    host: H,
    paused: Cell<bool>,
    frame_index: Cell<u64>,
    last_frame: Cell<Option<HostTime>>,
    viewbox: Cell<Option<Viewbox>>,
}

impl<H: FrameHost> DriverInner<H> {
    fn resume(&self, force: bool) {
        if self.paused.get() || force {
            self.paused.set(false);
            self.host.request_frame();
        }
    }

    fn resize_update(&self, width: f64, height: f64) -> PinUpdate {
        match self.viewbox.get() {
            Some(viewbox) => PinUpdate::new()
                .with(PinOption::Width(viewbox.width))
                .with(PinOption::Height(viewbox.height))
                .with(PinOption::ResizeMode(viewbox.mode))
                .with(PinOption::ResizeWidth(width))
                .with(PinOption::ResizeHeight(height)),
            None => PinUpdate::new()
                .with(PinOption::Width(width))
                .with(PinOption::Height(height)),
        }
    }
}

impl<H: FrameHost> TouchHook for DriverInner<H> {
    fn touched(&self) {
        self.resume(false);
    }
}

/// Drives tick and paint passes over one root node.
///
/// The driver starts paused. Call [`start`](Self::start), then call
/// [`frame`](Self::frame) each time the host fires a requested frame.
pub struct FrameDriver<H> {
    root: NodeId,
    inner: Rc<DriverInner<H>>,
}

impl<H> fmt::Debug for FrameDriver<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameDriver")
            .field("root", &self.root)
            .field("paused", &self.inner.paused.get())
            .field("frame_index", &self.inner.frame_index.get())
            .field("viewbox", &self.inner.viewbox.get())
            .finish_non_exhaustive()
    }
}

impl<H: FrameHost + 'static> FrameDriver<H> {
    /// Creates a root node in `scene` and a paused driver for it.
    ///
    /// The root listens for [`RESIZE`] and resumes the driver whenever a
    /// touch reaches it.
    pub fn new(scene: &mut Scene, host: H) -> Self {
        let root = scene.create_node();
        let inner = Rc::new(DriverInner {
            host,
            paused: Cell::new(true),
            frame_index: Cell::new(0),
            last_frame: Cell::new(None),
            viewbox: Cell::new(None),
        });
        scene.set_touch_hook(root, Rc::clone(&inner) as Rc<dyn TouchHook>);
        let listener = Rc::clone(&inner);
        scene.on(root, RESIZE, move |scene, node, args| {
            let &[width, height] = args else {
                log::warn!("resize expects width and height, got {} values", args.len());
                return;
            };
            scene.set_pin(node, listener.resize_update(width, height));
        });
        Self { root, inner }
    }
}

impl<H: FrameHost> FrameDriver<H> {
    /// The root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The host this driver requests frames from.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.inner.host
    }

    /// Starts the loop; same as `resume(false)`.
    pub fn start(&self) {
        self.resume(false);
    }

    /// Stops requesting frames until the next resume.
    pub fn pause(&self) {
        self.inner.paused.set(true);
    }

    /// Requests a frame if paused, or unconditionally with `force`.
    pub fn resume(&self, force: bool) {
        self.inner.resume(force);
    }

    /// Whether the loop is idle.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.paused.get()
    }

    /// Number of frames rendered so far.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.inner.frame_index.get()
    }

    /// Sets the logical size the root is fitted into on resize.
    pub fn set_viewbox(&self, viewbox: Viewbox) {
        self.inner.viewbox.set(Some(viewbox));
    }

    /// Returns the configured viewbox.
    #[must_use]
    pub fn viewbox(&self) -> Option<Viewbox> {
        self.inner.viewbox.get()
    }

    /// Emits [`RESIZE`] on the root with the new surface size.
    pub fn resize(&self, scene: &mut Scene, width: f64, height: f64) {
        scene.emit(self.root, RESIZE, &[width, height]);
    }

    /// Renders one frame if the driver is running.
    ///
    /// Returns `None` without touching the scene while paused (a frame that
    /// was requested before the driver went idle).
    ///
    /// # Panics
    ///
    /// Panics if the root node was destroyed.
    pub fn frame<S: Surface + ?Sized>(
        &self,
        scene: &mut Scene,
        surface: &mut S,
        tracer: &mut Tracer<'_>,
    ) -> Option<FrameStats> {
        let inner = &*self.inner;
        if inner.paused.get() {
            return None;
        }
        let host = &inner.host;
        let now = host.now();
        let elapsed_ms = inner
            .last_frame
            .replace(Some(now))
            .map_or(0.0, |last| {
                now.saturating_duration_since(last)
                    .as_millis_f64(host.timebase())
            });
        let frame_index = inner.frame_index.get();
        inner.frame_index.set(frame_index + 1);

        let tick = FrameTickEvent {
            frame_index,
            now,
            elapsed_ms,
        };
        tracer.frame_tick(&tick);
        let mut summary = FrameSummaryBuilder::new(&tick);
        let mo = scene.touch_stamp(self.root);

        let mut stats = self.phase(tracer, &mut summary, frame_index, PhaseKind::Tick, || {
            scene.tick(self.root, elapsed_ms)
        });
        let painted = self.phase(tracer, &mut summary, frame_index, PhaseKind::Paint, || {
            scene.paint(self.root, surface)
        });
        stats.painted = painted.painted;
        stats.pasted = painted.pasted;
        stats.failed = painted.failed;

        #[cfg(feature = "trace-rich")]
        if !scene.paste_failures().is_empty() {
            tracer.paste_failures(frame_index, scene.paste_failures());
        }

        host.request_frame();
        let paused = mo == scene.touch_stamp(self.root);
        if paused {
            log::trace!("frame {frame_index}: no change, pausing");
            inner.paused.set(true);
        }
        tracer.frame_summary(&summary.finish(stats, paused));
        Some(stats)
    }

    fn phase(
        &self,
        tracer: &mut Tracer<'_>,
        summary: &mut FrameSummaryBuilder,
        frame_index: u64,
        phase: PhaseKind,
        pass: impl FnOnce() -> FrameStats,
    ) -> FrameStats {
        let host = &self.inner.host;
        let start = host.now();
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase,
            timestamp: start,
        });
        summary.phase_begin(phase, start);
        let stats = pass();
        let end = host.now();
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase,
            timestamp: end,
        });
        summary.phase_end(phase, end);
        stats
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use crate::matrix::Matrix;
    use crate::pin::PinKey;
    use crate::scene::TickOrder;
    use crate::surface::{ImageId, PasteError};

    #[derive(Default)]
    struct MockHost {
        requests: Cell<u32>,
        clock: Cell<u64>,
    }

    impl FrameHost for MockHost {
        fn request_frame(&self) {
            self.requests.set(self.requests.get() + 1);
        }

        fn now(&self) -> HostTime {
            // 16 ms per call, in nanoseconds.
            let t = self.clock.get();
            self.clock.set(t + 16_000_000);
            HostTime(t)
        }
    }

    #[derive(Default)]
    struct NullSurface {
        alpha: f64,
    }

    impl Surface for NullSurface {
        fn set_transform(&mut self, _matrix: &Matrix) {}

        fn alpha(&self) -> f64 {
            self.alpha
        }

        fn set_alpha(&mut self, alpha: f64) {
            self.alpha = alpha;
        }

        fn draw_image(&mut self, _: ImageId, _: Rect, _: Rect) -> Result<(), PasteError> {
            Ok(())
        }
    }

    fn setup() -> (Scene, FrameDriver<MockHost>, NullSurface) {
        let mut scene = Scene::new();
        let driver = FrameDriver::new(&mut scene, MockHost::default());
        (scene, driver, NullSurface::default())
    }

    #[test]
    fn starts_paused_and_start_requests_once() {
        let (mut scene, driver, mut surface) = setup();
        assert!(driver.is_paused());
        assert_eq!(driver.frame(&mut scene, &mut surface, &mut Tracer::none()), None);
        driver.start();
        driver.start();
        assert_eq!(driver.host().requests.get(), 1);
        assert!(!driver.is_paused());
    }

    #[test]
    fn idle_frame_pauses() {
        let (mut scene, driver, mut surface) = setup();
        driver.start();
        let stats = driver.frame(&mut scene, &mut surface, &mut Tracer::none());
        assert_eq!(stats.map(|s| s.ticked), Some(1));
        assert!(driver.is_paused());
        assert_eq!(driver.frame(&mut scene, &mut surface, &mut Tracer::none()), None);
    }

    #[test]
    fn touch_under_root_resumes() {
        let (mut scene, driver, mut surface) = setup();
        let child = scene.create_node();
        scene.append_to(child, driver.root());
        driver.start();
        driver.frame(&mut scene, &mut surface, &mut Tracer::none());
        assert!(driver.is_paused());

        let requests = driver.host().requests.get();
        scene.set_pin(child, PinOption::OffsetX(4.0));
        assert!(!driver.is_paused());
        assert_eq!(driver.host().requests.get(), requests + 1);
    }

    #[test]
    fn animating_ticker_keeps_loop_running() {
        let (mut scene, driver, mut surface) = setup();
        scene.register_tick(driver.root(), TickOrder::BeforeChildren, |scene, node, _| {
            let r = scene.pin(node).get(PinKey::Rotation).unwrap_or(0.0);
            scene.set_pin(node, PinOption::Rotation(r + 0.1));
        });
        driver.start();
        for _ in 0..3 {
            driver.frame(&mut scene, &mut surface, &mut Tracer::none());
        }
        assert!(!driver.is_paused());
        assert_eq!(driver.frame_index(), 3);
    }

    #[test]
    fn elapsed_is_zero_on_first_frame() {
        let (mut scene, driver, mut surface) = setup();
        let seen = Rc::new(Cell::new(-1.0));
        let sink = Rc::clone(&seen);
        scene.register_tick(driver.root(), TickOrder::BeforeChildren, move |_, _, dt| {
            sink.set(dt);
        });
        driver.start();
        driver.frame(&mut scene, &mut surface, &mut Tracer::none());
        assert_eq!(seen.get(), 0.0);
        driver.resume(true);
        driver.frame(&mut scene, &mut surface, &mut Tracer::none());
        // Five host reads per frame: frame start plus both bounds of each pass.
        assert_eq!(seen.get(), 80.0);
    }

    #[test]
    fn resize_without_viewbox_pins_size() {
        let (mut scene, driver, _) = setup();
        driver.resize(&mut scene, 800.0, 600.0);
        let root = driver.root();
        assert_eq!(scene.pin(root).width(), 800.0);
        assert_eq!(scene.pin(root).height(), 600.0);
        assert!(!driver.is_paused(), "resize touches the root");
    }

    #[test]
    fn resize_with_viewbox_fits_logical_size() {
        let (mut scene, driver, _) = setup();
        driver.set_viewbox(Viewbox::new(400.0, 300.0));
        driver.resize(&mut scene, 800.0, 900.0);
        let root = driver.root();
        assert_eq!(scene.pin_value(root, PinKey::ScaleX), Some(2.0));
        assert_eq!(scene.pin_value(root, PinKey::ScaleY), Some(2.0));
        assert_eq!(scene.pin(root).width(), 400.0);
        assert_eq!(scene.pin(root).height(), 450.0);
    }
}
