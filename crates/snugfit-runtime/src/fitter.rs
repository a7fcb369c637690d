#![forbid(unsafe_code)]

//! Public facade: the [`Fitter`] engine instance and per-element
//! [`FitHandle`]s.
//!
//! # Usage
//!
//! ```ignore
//! use snugfit_runtime::Fitter;
//! use snugfit_core::FitOptions;
//!
//! let engine = Fitter::new(host);
//! let handle = engine.fit(element, FitOptions::default().max_size(256.0));
//!
//! handle.fit();         // force a re-fit on the next frame
//! handle.freeze();      // halt scheduling, keep the registration
//! handle.unfreeze();    // resume and catch up
//! handle.unsubscribe(); // remove and restore the original inline style
//! ```
//!
//! Viewport observing is enabled at construction (hosts without a
//! viewport signal simply stay unobserved) and can be toggled explicitly
//! with [`Fitter::enable_viewport_observing`] /
//! [`Fitter::disable_viewport_observing`].
//!
//! # Failure Modes
//!
//! - Host without a frame primitive: every registration succeeds but no
//!   redraw ever runs; no error is raised.
//! - Handle outliving its engine: all handle methods become no-ops (the
//!   handle holds only a weak reference).
//! - Registering the same element twice: the second registration
//!   reconfigures the existing record; both handles address it.

use std::rc::Weak;
use std::time::Duration;

use snugfit_core::{Dirty, FitOptions};

use crate::scheduler::{Engine, EngineInner, Host, RecordId};

/// An engine instance bound to one host environment.
///
/// Owns the registry; dropping it releases every host-side subscription
/// and pending callback. There is no global state: independent instances
/// never interact.
pub struct Fitter<H: Host + 'static> {
    engine: Engine<H>,
}

impl<H: Host + 'static> Fitter<H> {
    /// Build an engine on `host` and enable viewport observing.
    pub fn new(host: H) -> Self {
        let engine = Engine::new(host);
        engine.enable_viewport_observing();
        Self { engine }
    }

    /// Register one element. The record starts fully dirty and a frame is
    /// requested, so the first fit happens on the next frame.
    pub fn fit(&self, element: H::Element, options: FitOptions) -> FitHandle<H> {
        let id = self.engine.register(element.clone(), &options);
        FitHandle {
            engine: self.engine.downgrade(),
            id,
            element,
        }
    }

    /// Register a batch of elements with the same options. An empty input
    /// yields an empty handle list, not an error.
    pub fn fit_many(
        &self,
        elements: impl IntoIterator<Item = H::Element>,
        options: FitOptions,
    ) -> Vec<FitHandle<H>> {
        elements
            .into_iter()
            .map(|element| self.fit(element, options))
            .collect()
    }

    /// Force every registered record (frozen ones included) to full
    /// dirty and request one frame. Frozen records redraw once unfrozen.
    pub fn fit_all(&self) {
        self.engine.escalate_all(Dirty::FULL, false);
    }

    /// Start observing global viewport changes. Idempotent.
    pub fn enable_viewport_observing(&self) {
        self.engine.enable_viewport_observing();
    }

    /// Stop observing global viewport changes and cancel any pending
    /// debounce timer.
    pub fn disable_viewport_observing(&self) {
        self.engine.disable_viewport_observing();
    }

    /// Set the trailing-edge debounce window for the viewport signal
    /// (default 100 ms).
    pub fn set_viewport_debounce(&self, delay: Duration) {
        self.engine.set_viewport_debounce(delay);
    }

    /// The current viewport debounce window.
    #[must_use]
    pub fn viewport_debounce(&self) -> Duration {
        self.engine.viewport_debounce()
    }
}

impl<H: Host + 'static> Drop for Fitter<H> {
    fn drop(&mut self) {
        self.engine.teardown();
    }
}

/// Handle to one registered element.
///
/// Holds a weak reference to its engine: once the engine is dropped every
/// method is a no-op. Clones address the same record.
pub struct FitHandle<H: Host> {
    engine: Weak<EngineInner<H>>,
    id: RecordId,
    element: H::Element,
}

impl<H: Host> Clone for FitHandle<H> {
    fn clone(&self) -> Self {
        Self {
            engine: Weak::clone(&self.engine),
            id: self.id,
            element: self.element.clone(),
        }
    }
}

impl<H: Host + 'static> FitHandle<H> {
    /// The element this handle addresses.
    #[must_use]
    pub fn element(&self) -> &H::Element {
        &self.element
    }

    /// Force a full re-fit on the next frame. Recomputation is not
    /// immediate; it runs in the coalesced frame callback like any other
    /// redraw.
    pub fn fit(&self) {
        if let Some(engine) = Engine::from_weak(&self.engine) {
            engine.escalate(self.id, Dirty::FULL);
        }
    }

    /// Halt scheduling for this element without removing it from the
    /// registry or restoring its style.
    pub fn freeze(&self) {
        if let Some(engine) = Engine::from_weak(&self.engine) {
            engine.set_active(self.id, false);
        }
    }

    /// Resume scheduling and force a full redraw so the element catches
    /// up with changes that happened while frozen.
    pub fn unfreeze(&self) {
        if let Some(engine) = Engine::from_weak(&self.engine) {
            engine.set_active(self.id, true);
        }
    }

    /// Remove the registration: disconnect its content signal and restore
    /// the inline style captured before the engine's first write.
    pub fn unsubscribe(&self) {
        if let Some(engine) = Engine::from_weak(&self.engine) {
            engine.unsubscribe(self.id);
        }
    }
}
