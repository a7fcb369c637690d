#![forbid(unsafe_code)]

//! Viewport observation with trailing-edge debounce.
//!
//! One subscription is shared by the whole registry. A resize burst
//! restarts the single pending timer (single-flight, trailing edge), so
//! only the last firing in the window survives; when the timer fires,
//! every active record is escalated to layout-dirty and one frame is
//! requested. The per-record width check in the redraw filter then skips
//! elements whose container did not actually change.

use std::rc::Rc;
use std::time::Duration;

use snugfit_core::{Dirty, SignalFn};

use crate::scheduler::{Cmd, Engine, Host};

impl<H: Host + 'static> Engine<H> {
    /// Subscribe the shared viewport signal. Idempotent; a host without a
    /// viewport signal leaves observing disabled.
    pub(crate) fn enable_viewport_observing(&self) {
        if self.inner.state.borrow().viewport_sub.is_some() {
            return;
        }
        let weak = self.downgrade();
        let signal: SignalFn = Rc::new(move || {
            if let Some(engine) = Engine::from_weak(&weak) {
                engine.on_viewport();
            }
        });
        let sub = self.inner.host.observe_viewport(signal);
        self.inner.state.borrow_mut().viewport_sub = sub;
    }

    /// Drop the shared viewport subscription and any pending debounce
    /// timer. Records keep whatever dirty level they already have.
    pub(crate) fn disable_viewport_observing(&self) {
        let (sub, timer) = {
            let mut st = self.inner.state.borrow_mut();
            (st.viewport_sub.take(), st.debounce_timer.take())
        };
        if let Some(timer) = timer {
            self.inner.host.cancel_timer(timer);
        }
        if let Some(sub) = sub {
            self.inner.host.unobserve_viewport(sub);
        }
    }

    pub(crate) fn set_viewport_debounce(&self, delay: Duration) {
        self.inner.state.borrow_mut().debounce_delay = delay;
    }

    pub(crate) fn viewport_debounce(&self) -> Duration {
        self.inner.state.borrow().debounce_delay
    }

    /// Raw viewport firing: restart the debounce timer. Repeated firings
    /// inside the window collapse into the trailing one.
    pub(crate) fn on_viewport(&self) {
        let stale = {
            let Ok(mut st) = self.inner.state.try_borrow_mut() else {
                self.inner.deferred.borrow_mut().push(Cmd::ViewportFired);
                return;
            };
            st.debounce_timer.take()
        };
        if let Some(timer) = stale {
            self.inner.host.cancel_timer(timer);
        }

        let weak = self.downgrade();
        let callback: SignalFn = Rc::new(move || {
            if let Some(engine) = Engine::from_weak(&weak) {
                engine.on_debounce_fire();
            }
        });
        let delay = self.inner.state.borrow().debounce_delay;
        let timer = self.inner.host.set_timer(delay, callback);
        self.inner.state.borrow_mut().debounce_timer = Some(timer);
        tracing::trace!(delay_ms = delay.as_millis() as u64, "viewport debounce armed");
    }

    /// Debounce expiry: every active record becomes layout-dirty and one
    /// frame is requested.
    fn on_debounce_fire(&self) {
        {
            let mut st = self.inner.state.borrow_mut();
            st.debounce_timer = None;
            for slot in &mut st.slots {
                if slot.record.active {
                    slot.record.escalate(Dirty::LAYOUT);
                }
            }
        }
        tracing::debug!("viewport debounce fired");
        self.request_redraw();
    }
}
