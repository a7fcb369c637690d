#![forbid(unsafe_code)]

//! Registration configuration.
//!
//! All options are plain named fields with enumerated defaults; there is
//! no dynamic option merging. Builder methods are provided for call-site
//! ergonomics.
//!
//! ```
//! use snugfit_core::FitOptions;
//!
//! let opts = FitOptions::default()
//!     .min_size(12.0)
//!     .max_size(96.0)
//!     .multi_line(false);
//! assert_eq!(opts.min_size, 12.0);
//! assert!(!opts.multi_line);
//! assert!(!opts.fit_height);
//! ```

/// Which kinds of content mutation the host should report for an element.
///
/// This mirrors the subtree/child-list/character-data triple of the DOM
/// mutation API; hosts with a different notification primitive map it as
/// closely as they can.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationFilter {
    /// Observe the element's whole subtree, not just direct children.
    pub subtree: bool,
    /// Observe child additions and removals.
    pub child_list: bool,
    /// Observe text content changes.
    pub character_data: bool,
}

impl Default for MutationFilter {
    /// The default filter observes everything that can change rendered
    /// width: subtree structure, direct children, and text content.
    fn default() -> Self {
        Self {
            subtree: true,
            child_list: true,
            character_data: true,
        }
    }
}

/// Whether (and how) to observe content mutations for a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationPolicy {
    /// Never observe content changes; only viewport changes and manual
    /// `fit()` calls re-fit this element.
    Off,
    /// Observe with [`MutationFilter::default`]. Silently resolves to
    /// [`MutationPolicy::Off`] when the host lacks the capability.
    #[default]
    Default,
    /// Observe with a caller-supplied filter. Same capability fallback
    /// as [`MutationPolicy::Default`].
    Custom(MutationFilter),
}

impl MutationPolicy {
    /// The filter to subscribe with, or `None` for [`MutationPolicy::Off`].
    #[must_use]
    pub fn filter(&self) -> Option<MutationFilter> {
        match self {
            Self::Off => None,
            Self::Default => Some(MutationFilter::default()),
            Self::Custom(filter) => Some(*filter),
        }
    }
}

/// Per-registration options.
///
/// | Field | Default |
/// |-------|---------|
/// | `min_size` | `16.0` |
/// | `max_size` | `512.0` |
/// | `multi_line` | `true` |
/// | `fit_height` | `false` |
/// | `observe_mutations` | [`MutationPolicy::Default`] |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Lower font-size bound in pixels.
    pub min_size: f32,
    /// Upper font-size bound in pixels.
    pub max_size: f32,
    /// Permit wrapping once the font size has reached `min_size`.
    pub multi_line: bool,
    /// Constrain on both width and height instead of width alone.
    pub fit_height: bool,
    /// Content mutation observation policy.
    pub observe_mutations: MutationPolicy,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            min_size: 16.0,
            max_size: 512.0,
            multi_line: true,
            fit_height: false,
            observe_mutations: MutationPolicy::Default,
        }
    }
}

impl FitOptions {
    #[must_use]
    pub fn min_size(mut self, px: f32) -> Self {
        self.min_size = px;
        self
    }

    #[must_use]
    pub fn max_size(mut self, px: f32) -> Self {
        self.max_size = px;
        self
    }

    #[must_use]
    pub fn multi_line(mut self, enabled: bool) -> Self {
        self.multi_line = enabled;
        self
    }

    #[must_use]
    pub fn fit_height(mut self, enabled: bool) -> Self {
        self.fit_height = enabled;
        self
    }

    #[must_use]
    pub fn observe_mutations(mut self, policy: MutationPolicy) -> Self {
        self.observe_mutations = policy;
        self
    }
}
