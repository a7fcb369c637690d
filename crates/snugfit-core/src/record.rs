#![forbid(unsafe_code)]

//! Per-element state: the record the scheduler batches over.
//!
//! A [`FitRecord`] is pure data. It is created at registration, mutated
//! only by the scheduler's redraw pass and by signal callbacks (which do
//! nothing but escalate [`Dirty`]), and dropped at unsubscribe.
//!
//! # Invariants
//!
//! 1. Dirty flags are monotonic between passes: [`FitRecord::escalate`]
//!    only inserts bits; only [`FitRecord::mark_clean`] (end of a pass
//!    that processed the record) clears them.
//! 2. `min_size <= max_size` always holds; registration normalizes the
//!    pair rather than failing.
//! 3. The bootstrap flags are one-way: once `style_computed` or
//!    `pre_style_test_completed` is set it is never cleared.

use bitflags::bitflags;

use crate::config::{FitOptions, MutationPolicy};
use crate::style::WhiteSpace;

bitflags! {
    /// Why a record needs recomputation.
    ///
    /// Empty means idle. `CONTENT` and `LAYOUT` are independent reasons
    /// and the union of both is the "redraw no matter what" level used
    /// for registration and manual fit requests.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Dirty: u8 {
        /// The element's own content (or subtree) changed.
        const CONTENT = 1 << 0;
        /// The viewport changed; the parent box *may* have changed.
        const LAYOUT = 1 << 1;
        /// Unconditional redraw: registration and manual fit requests.
        const FULL = Self::CONTENT.bits() | Self::LAYOUT.bits();
    }
}

impl Dirty {
    /// True when no redraw is pending for this record.
    #[must_use]
    pub fn is_idle(self) -> bool {
        self.is_empty()
    }

    /// True when `LAYOUT` is the only reason set. Layout-only dirt is the
    /// one level that allows the cheap parent-width skip in the redraw
    /// filter.
    #[must_use]
    pub fn is_layout_only(self) -> bool {
        self == Self::LAYOUT
    }
}

/// State tracked for one observed element.
///
/// The `element` is a host handle; the record never owns the underlying
/// node and only ever reads and writes its style attributes through the
/// ports.
#[derive(Debug, Clone)]
pub struct FitRecord<E> {
    pub element: E,

    // configuration, fixed at registration
    pub min_size: f32,
    pub max_size: f32,
    pub multi_line: bool,
    pub fit_height: bool,
    pub observe_mutations: MutationPolicy,

    // scheduling state
    pub active: bool,
    pub dirty: Dirty,

    // one-time bootstrap
    pub style_computed: bool,
    pub pre_style_test_completed: bool,
    pub needs_pre_style: bool,
    pub original_style: Option<String>,

    // measurement cache, recomputed each pass that includes this record
    pub current_font_size: f32,
    pub previous_font_size: f32,
    pub available_width: f32,
    pub available_height: f32,
    pub current_width: f32,
    pub current_height: f32,
    pub display: String,
    pub white_space: WhiteSpace,
}

impl<E> FitRecord<E> {
    /// Build a fresh record from registration options.
    ///
    /// A new record is active and fully dirty so the first pass always
    /// redraws it. An inverted `min_size`/`max_size` pair is normalized
    /// (`max_size` is raised to `min_size`) so the clamp invariant holds
    /// without a fallible constructor.
    #[must_use]
    pub fn new(element: E, options: &FitOptions) -> Self {
        let min_size = options.min_size;
        let max_size = options.max_size.max(min_size);
        Self {
            element,
            min_size,
            max_size,
            multi_line: options.multi_line,
            fit_height: options.fit_height,
            observe_mutations: options.observe_mutations,
            active: true,
            dirty: Dirty::FULL,
            style_computed: false,
            pre_style_test_completed: false,
            needs_pre_style: false,
            original_style: None,
            current_font_size: 0.0,
            previous_font_size: 0.0,
            available_width: 0.0,
            available_height: 0.0,
            current_width: 0.0,
            current_height: 0.0,
            display: String::new(),
            white_space: WhiteSpace::Nowrap,
        }
    }

    /// Raise the dirty level. Never downgrades: bits are only added.
    pub fn escalate(&mut self, level: Dirty) {
        self.dirty.insert(level);
    }

    /// Clear the dirty level at the end of a pass that processed this
    /// record.
    pub fn mark_clean(&mut self) {
        self.dirty = Dirty::empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_is_union() {
        assert_eq!(Dirty::FULL, Dirty::CONTENT | Dirty::LAYOUT);
        assert!(Dirty::FULL.contains(Dirty::CONTENT));
        assert!(Dirty::FULL.contains(Dirty::LAYOUT));
    }

    #[test]
    fn layout_only_detection() {
        assert!(Dirty::LAYOUT.is_layout_only());
        assert!(!Dirty::FULL.is_layout_only());
        assert!(!Dirty::CONTENT.is_layout_only());
        assert!(!Dirty::empty().is_layout_only());
    }

    #[test]
    fn escalation_never_downgrades() {
        let mut record = FitRecord::new((), &FitOptions::default());
        record.mark_clean();
        record.escalate(Dirty::LAYOUT);
        record.escalate(Dirty::CONTENT);
        assert_eq!(record.dirty, Dirty::FULL);
        // escalating with a lower level keeps the higher bits
        record.escalate(Dirty::LAYOUT);
        assert_eq!(record.dirty, Dirty::FULL);
    }

    #[test]
    fn new_record_is_fully_dirty_and_active() {
        let record = FitRecord::new((), &FitOptions::default());
        assert!(record.active);
        assert_eq!(record.dirty, Dirty::FULL);
        assert!(!record.style_computed);
        assert!(record.original_style.is_none());
    }

    #[test]
    fn inverted_bounds_are_normalized() {
        let record = FitRecord::new((), &FitOptions::default().min_size(64.0).max_size(8.0));
        assert!(record.min_size <= record.max_size);
        assert_eq!(record.max_size, 64.0);
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            /// Between cleanings, any escalation sequence accumulates
            /// bits and never drops one.
            #[test]
            fn escalation_is_monotone(levels in proptest::collection::vec(0u8..=3, 0..16)) {
                let mut record = FitRecord::new((), &FitOptions::default());
                record.mark_clean();
                let mut seen = Dirty::empty();
                for bits in levels {
                    let level = Dirty::from_bits_truncate(bits);
                    record.escalate(level);
                    seen |= level;
                    prop_assert_eq!(record.dirty, seen);
                    prop_assert!(record.dirty.contains(level));
                }
            }
        }
    }
}
