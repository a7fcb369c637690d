#![forbid(unsafe_code)]

//! Host port traits: the engine's only view of the document.
//!
//! A host environment (a real DOM binding, or the deterministic double in
//! `snugfit-harness`) implements three small traits:
//!
//! - [`StylePort`] — synchronous box measurement and inline-style
//!   read/write for a single element.
//! - [`ChangeSignals`] — subscription to the two external change sources
//!   (per-element content mutation, global viewport change) plus delivery
//!   of the per-redraw fit notification.
//! - [`FrameClock`] — frame-aligned callback scheduling and one-shot
//!   timers.
//!
//! # Contract
//!
//! 1. **No errors surface here.** An absent or detached element measures
//!    as [`Size::ZERO`](crate::Size::ZERO); style writes on it are
//!    ignored. The engine tolerates degenerate measurements.
//! 2. **Capabilities are optional, not fallible.** A host without a frame
//!    primitive returns `None` from [`FrameClock::request_frame`] and the
//!    engine degrades to a permanent no-op. A host without mutation
//!    observation returns `None` from [`ChangeSignals::observe_content`]
//!    and the registration behaves as if observation were off.
//! 3. **Unsubscribing is deterministic.** After
//!    [`ChangeSignals::unobserve_content`] /
//!    [`ChangeSignals::unobserve_viewport`] returns, the associated
//!    callback fires no more.
//! 4. **Callbacks may re-enter the engine.** Hosts are free to invoke a
//!    signal callback synchronously from inside a style write (an
//!    observer seeing the engine's own mutation); the engine is
//!    responsible for keeping that convergent.
//! 5. All measurement calls are synchronous reads; nothing here blocks.

use std::rc::Rc;
use std::time::Duration;

use crate::config::MutationFilter;
use crate::geometry::Size;
use crate::style::ComputedSample;

/// Callback handed to a host at subscription or scheduling time.
///
/// Plain `Rc`, not `Send`: the whole system is single-threaded and hosts
/// invoke callbacks on the same thread that registered them.
pub type SignalFn = Rc<dyn Fn()>;

/// Payload of the per-redraw change notification.
///
/// Emitted once per processed record per completed redraw pass, after all
/// style writes have been flushed. This is the engine's only externally
/// observable artifact besides the style attributes themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitNotice {
    /// Font size before this pass, in pixels.
    pub old_value: f32,
    /// Font size applied by this pass, in pixels.
    pub new_value: f32,
    /// `new_value / old_value`; reported as `1.0` when `old_value` is
    /// zero so a non-finite ratio never escapes.
    pub scale_factor: f32,
}

impl FitNotice {
    /// Build a notice from the pass's before/after font sizes.
    #[must_use]
    pub fn from_sizes(old_value: f32, new_value: f32) -> Self {
        let scale_factor = if old_value == 0.0 {
            1.0
        } else {
            new_value / old_value
        };
        Self {
            old_value,
            new_value,
            scale_factor,
        }
    }
}

/// Synchronous style reads and writes for one element.
pub trait StylePort {
    /// Host handle for one element. Cheap to clone; equality identifies
    /// the underlying node (the registry keeps one record per element).
    type Element: Clone + PartialEq;

    /// Content box of the element's parent container: the space to fill.
    fn parent_box(&self, element: &Self::Element) -> Size;

    /// The element's own scroll box: its natural rendered size at the
    /// currently applied font size.
    fn natural_box(&self, element: &Self::Element) -> Size;

    /// One-shot sample of the live computed style. Only called during a
    /// record's bootstrap; never repeated for the record's lifetime.
    fn computed_style(&self, element: &Self::Element) -> ComputedSample;

    /// The element's current inline style attribute, used once to capture
    /// the original style before the engine's first write.
    fn inline_style(&self, element: &Self::Element) -> String;

    /// Replace the element's inline style attribute wholesale. The engine
    /// composes the original style with its overrides (see
    /// [`compose_inline`](crate::style::compose_inline)) so author-set
    /// properties survive; restore passes the captured original back
    /// unchanged.
    fn set_inline_style(&self, element: &Self::Element, css: &str);
}

/// The two external change sources, plus fit-notification delivery.
pub trait ChangeSignals: StylePort {
    /// Host token for an active content subscription.
    type ContentHandle;
    /// Host token for an active viewport subscription.
    type ViewportHandle;

    /// Start observing content/subtree mutation of `element`. Returns
    /// `None` when the host lacks the capability, in which case the
    /// registration proceeds without content observation.
    fn observe_content(
        &self,
        element: &Self::Element,
        filter: &MutationFilter,
        signal: SignalFn,
    ) -> Option<Self::ContentHandle>;

    /// Stop a content subscription and release the underlying observer.
    fn unobserve_content(&self, handle: Self::ContentHandle);

    /// Start observing global viewport changes (resize/orientation).
    /// A single subscription is shared by all records; returns `None`
    /// when the host has no viewport signal.
    fn observe_viewport(&self, signal: SignalFn) -> Option<Self::ViewportHandle>;

    /// Stop the viewport subscription.
    fn unobserve_viewport(&self, handle: Self::ViewportHandle);

    /// Deliver the per-redraw change notification for `element`. How it
    /// surfaces (a DOM custom event, a recorded list in a test double) is
    /// the host's concern.
    fn notify_fit(&self, element: &Self::Element, notice: &FitNotice);
}

/// Frame-aligned scheduling and one-shot timers.
pub trait FrameClock {
    /// Host token for a pending frame request.
    type FrameHandle;
    /// Host token for a pending timer.
    type TimerHandle;

    /// Schedule `callback` for the next frame. `None` means the host has
    /// no frame primitive at all; the caller must degrade to a no-op
    /// rather than fall back to immediate invocation.
    fn request_frame(&self, callback: SignalFn) -> Option<Self::FrameHandle>;

    /// Cancel a pending frame request. Cancelling an already-fired
    /// request is a no-op.
    fn cancel_frame(&self, handle: Self::FrameHandle);

    /// Schedule `callback` once after `delay`.
    fn set_timer(&self, delay: Duration, callback: SignalFn) -> Self::TimerHandle;

    /// Cancel a pending timer. Cancelling an already-fired timer is a
    /// no-op.
    fn cancel_timer(&self, handle: Self::TimerHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_reports_ratio() {
        let notice = FitNotice::from_sizes(16.0, 32.0);
        assert_eq!(notice.scale_factor, 2.0);
    }

    #[test]
    fn notice_guards_zero_old_value() {
        let notice = FitNotice::from_sizes(0.0, 16.0);
        assert_eq!(notice.scale_factor, 1.0);
        assert!(notice.scale_factor.is_finite());
    }
}
