#![forbid(unsafe_code)]

//! The redraw engine: registry, frame coalescing, and the batched
//! measure→compute→apply pass.
//!
//! # Pass structure
//!
//! One pass runs over the set of dirty-and-active records in five phases,
//! ordered so that all document reads for all records happen before any
//! document write for any record (interleaving them would force a layout
//! recomputation between every read, which is the dominant cost this
//! design exists to avoid):
//!
//! 1. **Bootstrap** — records seen for the first time get their computed
//!    style sampled once, and the one-time pre-style test runs: the
//!    element needs `display: inline-block` unless its computed display
//!    already starts with `inline-`, and `white-space: nowrap` unless it
//!    already has it.
//! 2. **Pre-style** — the corrections from phase 1 are written. This can
//!    reflow, which is why it is isolated in its own phase ahead of all
//!    measurement.
//! 3. **Filter** — a record whose only dirt is layout-level is skipped
//!    when its parent's available width has not actually changed.
//! 4. **Measure & compute** — parent and natural boxes are read and the
//!    new font size derived by single-step proportional scaling, clamped
//!    to the record's bounds.
//! 5. **Apply** — the computed white-space/display/font-size triple is
//!    written back and the record marked clean.
//!
//! Fit notifications are emitted after the pass releases the registry, so
//! a notification listener can call straight back into the engine.
//!
//! # Re-entrancy
//!
//! Engine entry points that find the registry locked (a host delivering a
//! mutation signal synchronously from inside one of the pass's style
//! writes) defer themselves into a command queue that is drained when the
//! pass finishes. Self-triggered follow-up passes converge because a
//! stable font size recomputes to itself.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use snugfit_core::style::StylePatch;
use snugfit_core::{
    ChangeSignals, Dirty, FitNotice, FitOptions, FitRecord, FrameClock, MutationPolicy, SignalFn,
    Size, StylePort, WhiteSpace, compose_inline,
};

/// Everything the engine needs from a host environment.
///
/// Blanket-implemented for any type providing the three port traits.
pub trait Host: StylePort + ChangeSignals + FrameClock {}

impl<T: StylePort + ChangeSignals + FrameClock> Host for T {}

/// Trailing-edge debounce window for the viewport signal.
pub const DEFAULT_VIEWPORT_DEBOUNCE: Duration = Duration::from_millis(100);

pub(crate) type RecordId = u64;

/// A registered record plus its host-side content subscription.
pub(crate) struct Slot<H: Host> {
    pub(crate) id: RecordId,
    pub(crate) record: FitRecord<H::Element>,
    pub(crate) content_sub: Option<H::ContentHandle>,
}

pub(crate) struct EngineState<H: Host> {
    pub(crate) slots: Vec<Slot<H>>,
    pub(crate) next_id: RecordId,
    pub(crate) pending_frame: Option<H::FrameHandle>,
    pub(crate) viewport_sub: Option<H::ViewportHandle>,
    pub(crate) debounce_timer: Option<H::TimerHandle>,
    pub(crate) debounce_delay: Duration,
}

/// Engine entry points deferred because the registry was locked.
pub(crate) enum Cmd {
    Escalate(RecordId, Dirty),
    EscalateAll { level: Dirty, active_only: bool },
    SetActive(RecordId, bool),
    Unsubscribe(RecordId),
    ViewportFired,
}

pub(crate) struct EngineInner<H: Host> {
    pub(crate) host: H,
    pub(crate) state: RefCell<EngineState<H>>,
    pub(crate) deferred: RefCell<Vec<Cmd>>,
}

/// Cheap-clone handle to the shared engine core.
pub(crate) struct Engine<H: Host> {
    pub(crate) inner: Rc<EngineInner<H>>,
}

impl<H: Host> Clone for Engine<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: Host + 'static> Engine<H> {
    pub(crate) fn new(host: H) -> Self {
        Self {
            inner: Rc::new(EngineInner {
                host,
                state: RefCell::new(EngineState {
                    slots: Vec::new(),
                    next_id: 1,
                    pending_frame: None,
                    viewport_sub: None,
                    debounce_timer: None,
                    debounce_delay: DEFAULT_VIEWPORT_DEBOUNCE,
                }),
                deferred: RefCell::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<EngineInner<H>> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn from_weak(weak: &Weak<EngineInner<H>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register an element, or reconfigure it if it already has a record
    /// (the registry keeps one record per element).
    pub(crate) fn register(&self, element: H::Element, options: &FitOptions) -> RecordId {
        let existing = {
            let st = self.inner.state.borrow();
            st.slots
                .iter()
                .find(|slot| slot.record.element == element)
                .map(|slot| slot.id)
        };
        if let Some(id) = existing {
            self.reconfigure(id, options);
            return id;
        }

        let id = {
            let mut st = self.inner.state.borrow_mut();
            let id = st.next_id;
            st.next_id += 1;
            st.slots.push(Slot {
                id,
                record: FitRecord::new(element, options),
                content_sub: None,
            });
            id
        };
        self.subscribe_content(id);
        self.request_redraw();
        tracing::trace!(record = id, "registered element");
        id
    }

    /// Re-registration path: update the record's configuration in place
    /// and redo its content subscription under the new policy.
    fn reconfigure(&self, id: RecordId, options: &FitOptions) {
        let old_sub = {
            let mut st = self.inner.state.borrow_mut();
            let Some(slot) = st.slots.iter_mut().find(|slot| slot.id == id) else {
                return;
            };
            let record = &mut slot.record;
            record.min_size = options.min_size;
            record.max_size = options.max_size.max(options.min_size);
            record.multi_line = options.multi_line;
            record.fit_height = options.fit_height;
            record.observe_mutations = options.observe_mutations;
            record.escalate(Dirty::FULL);
            slot.content_sub.take()
        };
        if let Some(sub) = old_sub {
            self.inner.host.unobserve_content(sub);
        }
        self.subscribe_content(id);
        self.request_redraw();
        tracing::trace!(record = id, "reconfigured element");
    }

    /// Subscribe the record's content signal per its mutation policy.
    /// When the host lacks the capability the policy silently resolves
    /// to off.
    fn subscribe_content(&self, id: RecordId) {
        let target = {
            let st = self.inner.state.borrow();
            st.slots.iter().find(|slot| slot.id == id).and_then(|slot| {
                slot.record
                    .observe_mutations
                    .filter()
                    .map(|filter| (slot.record.element.clone(), filter))
            })
        };
        let Some((element, filter)) = target else {
            return;
        };

        let weak = self.downgrade();
        let signal: SignalFn = Rc::new(move || {
            if let Some(engine) = Engine::from_weak(&weak) {
                engine.escalate(id, Dirty::CONTENT);
            }
        });
        let sub = self.inner.host.observe_content(&element, &filter, signal);

        let leftover = {
            let mut st = self.inner.state.borrow_mut();
            match st.slots.iter_mut().find(|slot| slot.id == id) {
                Some(slot) => {
                    match sub {
                        Some(sub) => slot.content_sub = Some(sub),
                        None => slot.record.observe_mutations = MutationPolicy::Off,
                    }
                    None
                }
                // record vanished while we were subscribing
                None => sub,
            }
        };
        if let Some(sub) = leftover {
            self.inner.host.unobserve_content(sub);
        }
    }

    /// Remove a record, disconnect its content signal, and restore the
    /// element's original inline style.
    pub(crate) fn unsubscribe(&self, id: RecordId) {
        let slot = {
            let Ok(mut st) = self.inner.state.try_borrow_mut() else {
                self.inner.deferred.borrow_mut().push(Cmd::Unsubscribe(id));
                return;
            };
            let Some(position) = st.slots.iter().position(|slot| slot.id == id) else {
                return;
            };
            st.slots.remove(position)
        };
        if let Some(sub) = slot.content_sub {
            self.inner.host.unobserve_content(sub);
        }
        if let Some(original) = &slot.record.original_style {
            self.inner.host.set_inline_style(&slot.record.element, original);
        }
        tracing::trace!(record = id, "unsubscribed element");
    }

    // ------------------------------------------------------------------
    // Dirty escalation
    // ------------------------------------------------------------------

    /// Raise one record's dirty level and request a frame if it is
    /// active. Defers when the registry is locked by a running pass.
    pub(crate) fn escalate(&self, id: RecordId, level: Dirty) {
        let active = {
            let Ok(mut st) = self.inner.state.try_borrow_mut() else {
                self.inner.deferred.borrow_mut().push(Cmd::Escalate(id, level));
                return;
            };
            let Some(slot) = st.slots.iter_mut().find(|slot| slot.id == id) else {
                return;
            };
            slot.record.escalate(level);
            slot.record.active
        };
        if active {
            self.request_redraw();
        }
    }

    /// Raise every record's dirty level (optionally active records only)
    /// and request one frame.
    pub(crate) fn escalate_all(&self, level: Dirty, active_only: bool) {
        {
            let Ok(mut st) = self.inner.state.try_borrow_mut() else {
                self.inner
                    .deferred
                    .borrow_mut()
                    .push(Cmd::EscalateAll { level, active_only });
                return;
            };
            for slot in &mut st.slots {
                if !active_only || slot.record.active {
                    slot.record.escalate(level);
                }
            }
        }
        self.request_redraw();
    }

    /// Freeze or unfreeze a record. Freezing halts scheduling without
    /// restoring style; unfreezing forces a full redraw so the element
    /// catches up with anything it missed.
    pub(crate) fn set_active(&self, id: RecordId, active: bool) {
        let reactivated = {
            let Ok(mut st) = self.inner.state.try_borrow_mut() else {
                self.inner.deferred.borrow_mut().push(Cmd::SetActive(id, active));
                return;
            };
            let Some(slot) = st.slots.iter_mut().find(|slot| slot.id == id) else {
                return;
            };
            if slot.record.active == active {
                return;
            }
            slot.record.active = active;
            if active {
                slot.record.escalate(Dirty::FULL);
            }
            tracing::trace!(record = id, active, "record activity toggled");
            active
        };
        if reactivated {
            self.request_redraw();
        }
    }

    // ------------------------------------------------------------------
    // Frame scheduling
    // ------------------------------------------------------------------

    /// Request a redraw on the next frame. A request while one is pending
    /// cancels and replaces it, so any number of synchronous requests
    /// produce exactly one pass. On a host without a frame primitive this
    /// is a no-op and the engine stays inert.
    pub(crate) fn request_redraw(&self) {
        let mut st = self.inner.state.borrow_mut();
        if let Some(handle) = st.pending_frame.take() {
            self.inner.host.cancel_frame(handle);
        }
        let weak = self.downgrade();
        let callback: SignalFn = Rc::new(move || {
            if let Some(engine) = Engine::from_weak(&weak) {
                engine.on_frame();
            }
        });
        st.pending_frame = self.inner.host.request_frame(callback);
    }

    pub(crate) fn on_frame(&self) {
        let notices = {
            let mut st = self.inner.state.borrow_mut();
            st.pending_frame = None;
            self.run_pass(&mut st)
        };
        for (element, notice) in &notices {
            self.inner.host.notify_fit(element, notice);
        }
        self.drain_deferred();
    }

    /// Run deferred entry points now that the registry is unlocked.
    fn drain_deferred(&self) {
        loop {
            let cmds = std::mem::take(&mut *self.inner.deferred.borrow_mut());
            if cmds.is_empty() {
                break;
            }
            for cmd in cmds {
                match cmd {
                    Cmd::Escalate(id, level) => self.escalate(id, level),
                    Cmd::EscalateAll { level, active_only } => {
                        self.escalate_all(level, active_only);
                    }
                    Cmd::SetActive(id, active) => self.set_active(id, active),
                    Cmd::Unsubscribe(id) => self.unsubscribe(id),
                    Cmd::ViewportFired => self.on_viewport(),
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // The pass itself
    // ------------------------------------------------------------------

    fn run_pass(&self, st: &mut EngineState<H>) -> Vec<(H::Element, FitNotice)> {
        let _span = tracing::debug_span!("redraw_pass").entered();
        let host = &self.inner.host;

        // Phase 1: bootstrap.
        for slot in &mut st.slots {
            let record = &mut slot.record;
            if !record.active || record.dirty.is_idle() {
                continue;
            }
            if !record.style_computed {
                let sample = host.computed_style(&record.element);
                record.current_font_size = sample.font_size;
                record.display = sample.display;
                record.white_space = WhiteSpace::from_computed(&sample.white_space);
                record.style_computed = true;
            }
            if !record.pre_style_test_completed {
                let mut needs = false;
                if !record.display.starts_with("inline-") {
                    record.display = "inline-block".to_owned();
                    needs = true;
                }
                if record.white_space != WhiteSpace::Nowrap {
                    record.white_space = WhiteSpace::Nowrap;
                    needs = true;
                }
                record.needs_pre_style = needs;
                record.pre_style_test_completed = true;
            }
        }

        // Phase 2: pre-style. The only write phase ahead of measurement;
        // runs at most once per record lifetime.
        for slot in &mut st.slots {
            let record = &mut slot.record;
            if record.active && !record.dirty.is_idle() && record.needs_pre_style {
                apply_style(host, record);
                record.needs_pre_style = false;
            }
        }

        // Phase 3: redraw filter. Layout-only dirt with an unchanged
        // parent width is left as-is; the next escalation picks it up.
        let mut selected = Vec::new();
        for (index, slot) in st.slots.iter().enumerate() {
            let record = &slot.record;
            if !record.active || record.dirty.is_idle() {
                continue;
            }
            if record.dirty.is_layout_only()
                && host.parent_box(&record.element).width == record.available_width
            {
                continue;
            }
            selected.push(index);
        }

        // Phase 4: measure and compute for every selected record.
        for &index in &selected {
            let record = &mut st.slots[index].record;
            let available = host.parent_box(&record.element);
            let natural = host.natural_box(&record.element);
            record.available_width = available.width;
            record.available_height = available.height;
            record.current_width = natural.width;
            record.current_height = natural.height;
            record.previous_font_size = record.current_font_size;
            record.current_font_size = fitted_font_size(
                available,
                natural,
                record.previous_font_size,
                record.min_size,
                record.max_size,
                record.fit_height,
            );
            // Wrapping is only allowed once the size has bottomed out;
            // anywhere above the minimum the content must stay measurable
            // on a single line.
            record.white_space = if record.multi_line && record.current_font_size == record.min_size
            {
                WhiteSpace::Normal
            } else {
                WhiteSpace::Nowrap
            };
        }

        // Phase 5: apply and mark clean.
        let mut notices = Vec::with_capacity(selected.len());
        for &index in &selected {
            let record = &mut st.slots[index].record;
            apply_style(host, record);
            record.mark_clean();
            notices.push((
                record.element.clone(),
                FitNotice::from_sizes(record.previous_font_size, record.current_font_size),
            ));
        }

        if !selected.is_empty() {
            tracing::debug!(processed = selected.len(), "redraw pass applied");
        }
        notices
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Release every host-side resource: pending frame, debounce timer,
    /// viewport subscription, content subscriptions. Styles are not
    /// restored here; that is what unsubscribing a record is for.
    pub(crate) fn teardown(&self) {
        let (frame, timer, viewport, subs) = {
            let mut st = self.inner.state.borrow_mut();
            let subs: Vec<_> = st
                .slots
                .iter_mut()
                .filter_map(|slot| slot.content_sub.take())
                .collect();
            (
                st.pending_frame.take(),
                st.debounce_timer.take(),
                st.viewport_sub.take(),
                subs,
            )
        };
        if let Some(handle) = frame {
            self.inner.host.cancel_frame(handle);
        }
        if let Some(handle) = timer {
            self.inner.host.cancel_timer(handle);
        }
        if let Some(handle) = viewport {
            self.inner.host.unobserve_viewport(handle);
        }
        for sub in subs {
            self.inner.host.unobserve_content(sub);
        }
    }
}

/// Capture the original inline style on first write, then replace the
/// attribute with original + overrides.
fn apply_style<H: Host>(host: &H, record: &mut FitRecord<H::Element>) {
    if record.original_style.is_none() {
        record.original_style = Some(host.inline_style(&record.element));
    }
    let patch = StylePatch {
        white_space: record.white_space,
        display: &record.display,
        font_size: record.current_font_size,
    };
    let css = compose_inline(record.original_style.as_deref().unwrap_or(""), &patch);
    host.set_inline_style(&record.element, &css);
}

/// Single-step proportional scaling: assume the rendered box scales
/// linearly with font size and jump straight to the size that fills the
/// available box, clamped to the record's bounds.
///
/// A zero or non-finite ratio (detached element, empty content) computes
/// to "no change this pass": the previous size, clamped. A non-finite
/// font size is never returned.
fn fitted_font_size(
    available: Size,
    natural: Size,
    previous: f32,
    min: f32,
    max: f32,
    fit_height: bool,
) -> f32 {
    let ratio_w = available.width / natural.width;
    let multiplier = if fit_height {
        ratio_w.min(available.height / natural.height)
    } else {
        ratio_w
    };
    let candidate = multiplier * previous;
    if candidate.is_finite() {
        candidate.clamp(min, max)
    } else {
        previous.clamp(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(width: f32, height: f32) -> Size {
        Size::new(width, height)
    }

    #[test]
    fn scales_up_to_fill_width() {
        let computed = fitted_font_size(size(800.0, 100.0), size(400.0, 20.0), 16.0, 16.0, 512.0, false);
        assert_eq!(computed, 32.0);
    }

    #[test]
    fn clamps_to_minimum() {
        let computed = fitted_font_size(size(200.0, 100.0), size(400.0, 20.0), 16.0, 16.0, 512.0, false);
        assert_eq!(computed, 16.0);
    }

    #[test]
    fn clamps_to_maximum() {
        let computed = fitted_font_size(size(8000.0, 100.0), size(40.0, 20.0), 16.0, 16.0, 512.0, false);
        assert_eq!(computed, 512.0);
    }

    #[test]
    fn height_constraint_takes_the_smaller_ratio() {
        // width would allow 2x, height only 1.5x
        let computed = fitted_font_size(size(800.0, 30.0), size(400.0, 20.0), 16.0, 16.0, 512.0, true);
        assert_eq!(computed, 24.0);
    }

    #[test]
    fn zero_natural_width_keeps_previous_size() {
        let computed = fitted_font_size(size(800.0, 100.0), Size::ZERO, 24.0, 16.0, 512.0, false);
        assert_eq!(computed, 24.0);
        assert!(computed.is_finite());
    }

    #[test]
    fn zero_everything_still_lands_in_bounds() {
        let computed = fitted_font_size(Size::ZERO, Size::ZERO, 0.0, 16.0, 512.0, false);
        assert!((16.0..=512.0).contains(&computed));
    }
}
