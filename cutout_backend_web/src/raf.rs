// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` frame host.
//!
//! [`RafRequester`] implements [`FrameHost`] for the
//! [`FrameDriver`](cutout_core::driver::FrameDriver). Each
//! [`request_frame`](FrameHost::request_frame) schedules at most one
//! animation frame; when it fires, the installed callback runs once. The
//! callback is expected to call `FrameDriver::frame`, which requests the next
//! frame for as long as the scene keeps changing.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use cutout_core::driver::FrameHost;
use cutout_core::time::{HostTime, Timebase};

// Direct global bindings instead of `web_sys::Window` methods, so nothing
// has to fetch the Window/Performance objects on every frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

type RafClosure = Closure<dyn FnMut(f64)>;

struct RafInner {
    /// The JS closure registered with `requestAnimationFrame`, created lazily
    /// on the first request.
    closure: RefCell<Option<RafClosure>>,

    /// Runs once per fired animation frame.
    callback: RefCell<Option<Box<dyn FnMut()>>>,

    /// ID of the outstanding request, if any.
    pending: Cell<Option<i32>>,
}

/// A [`FrameHost`] that schedules frames with `requestAnimationFrame`.
///
/// Cloning shares the same request state, so one clone can be moved into a
/// [`FrameDriver`](cutout_core::driver::FrameDriver) while another installs
/// the callback that drives it.
#[derive(Clone)]
pub struct RafRequester {
    inner: Rc<RafInner>,
}

impl Default for RafRequester {
    fn default() -> Self {
        Self::new()
    }
}

impl RafRequester {
    /// Creates a requester with no callback installed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RafInner {
                closure: RefCell::new(None),
                callback: RefCell::new(None),
                pending: Cell::new(None),
            }),
        }
    }

    /// Installs the callback run on every fired frame, replacing any
    /// previous one.
    pub fn set_callback(&self, callback: impl FnMut() + 'static) {
        *self.inner.callback.borrow_mut() = Some(Box::new(callback));
    }

    /// Returns `true` if a frame has been requested but not yet fired.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.pending.get().is_some()
    }

    /// Cancels the outstanding request, if any.
    pub fn cancel(&self) {
        if let Some(id) = self.inner.pending.take() {
            cancel_animation_frame(id);
        }
    }

    fn ensure_closure(&self) {
        if self.inner.closure.borrow().is_some() {
            return;
        }
        // A weak handle avoids a cycle between the closure and `RafInner`.
        let weak = Rc::downgrade(&self.inner);
        let closure = Closure::wrap(Box::new(move |_timestamp_ms: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.pending.set(None);
            // Taken out for the call so the callback may replace itself.
            let taken = inner.callback.borrow_mut().take();
            if let Some(mut callback) = taken {
                callback();
                let mut slot = inner.callback.borrow_mut();
                if slot.is_none() {
                    *slot = Some(callback);
                }
            } else {
                log::debug!("animation frame fired with no callback installed");
            }
        }) as Box<dyn FnMut(f64)>);
        *self.inner.closure.borrow_mut() = Some(closure);
    }
}

impl FrameHost for RafRequester {
    fn request_frame(&self) {
        if self.is_pending() {
            return;
        }
        self.ensure_closure();
        if let Some(ref closure) = *self.inner.closure.borrow() {
            let id = request_animation_frame(closure.as_ref().unchecked_ref());
            self.inner.pending.set(Some(id));
        }
    }

    fn now(&self) -> HostTime {
        crate::now()
    }

    fn timebase(&self) -> Timebase {
        crate::timebase()
    }
}

impl Drop for RafInner {
    fn drop(&mut self) {
        if let Some(id) = self.pending.take() {
            cancel_animation_frame(id);
        }
    }
}

impl core::fmt::Debug for RafRequester {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RafRequester")
            .field("pending", &self.inner.pending.get())
            .field("has_callback", &self.inner.callback.borrow().is_some())
            .finish_non_exhaustive()
    }
}
