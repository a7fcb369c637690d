#![forbid(unsafe_code)]

//! Style values read from and written to the host document.
//!
//! The engine only ever touches three inline style properties:
//! `white-space`, `display`, and `font-size`. Everything an author set on
//! the element is preserved by composing the engine's overrides *after*
//! the captured original inline style, and restored by writing that
//! original string back wholesale on unsubscribe.
//!
//! # Invariants
//!
//! 1. [`compose_inline`] never reorders or rewrites the original style
//!    string; the overrides are appended after it.
//! 2. Applying [`compose_inline`] output and then restoring the original
//!    string is an exact round trip for the author-visible style.

use std::fmt;

/// Applied `white-space` mode.
///
/// Wrapping is only ever permitted once the font size has bottomed out at
/// the configured minimum; at any larger size the content must stay on a
/// single line so its natural width is measurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhiteSpace {
    /// Wrapping allowed (`white-space: normal`).
    Normal,
    /// Single line (`white-space: nowrap`).
    #[default]
    Nowrap,
}

impl WhiteSpace {
    /// The CSS keyword for this mode.
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Nowrap => "nowrap",
        }
    }

    /// Classify a computed `white-space` value. Anything other than
    /// `nowrap` counts as wrapping-capable and will be corrected by the
    /// one-time pre-style pass.
    #[must_use]
    pub fn from_computed(value: &str) -> Self {
        if value == "nowrap" {
            Self::Nowrap
        } else {
            Self::Normal
        }
    }
}

impl fmt::Display for WhiteSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_css())
    }
}

/// One-shot sample of an element's live computed style.
///
/// Taken exactly once per record, during the bootstrap phase of the first
/// redraw pass that includes it. Never re-sampled.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedSample {
    /// Computed font size in pixels.
    pub font_size: f32,
    /// Computed `display` value (e.g. `"block"`, `"inline-block"`).
    pub display: String,
    /// Computed `white-space` value.
    pub white_space: String,
}

/// The three properties the engine writes back per redraw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StylePatch<'a> {
    pub white_space: WhiteSpace,
    pub display: &'a str,
    /// Font size in pixels.
    pub font_size: f32,
}

/// Compose the full inline style string for an element: the captured
/// original author style followed by the engine's three overrides.
///
/// ```
/// use snugfit_core::style::{StylePatch, WhiteSpace, compose_inline};
///
/// let css = compose_inline(
///     "color:red",
///     &StylePatch {
///         white_space: WhiteSpace::Nowrap,
///         display: "inline-block",
///         font_size: 32.0,
///     },
/// );
/// assert_eq!(css, "color:red;white-space:nowrap;display:inline-block;font-size:32px");
/// ```
#[must_use]
pub fn compose_inline(original: &str, patch: &StylePatch<'_>) -> String {
    format!(
        "{original};white-space:{};display:{};font-size:{}px",
        patch.white_space, patch.display, patch.font_size
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nowrap_is_default() {
        assert_eq!(WhiteSpace::default(), WhiteSpace::Nowrap);
    }

    #[test]
    fn computed_classification() {
        assert_eq!(WhiteSpace::from_computed("nowrap"), WhiteSpace::Nowrap);
        assert_eq!(WhiteSpace::from_computed("normal"), WhiteSpace::Normal);
        assert_eq!(WhiteSpace::from_computed("pre-wrap"), WhiteSpace::Normal);
    }

    #[test]
    fn compose_preserves_author_style() {
        let patch = StylePatch {
            white_space: WhiteSpace::Normal,
            display: "inline-block",
            font_size: 16.0,
        };
        let css = compose_inline("color:blue;padding:2px", &patch);
        assert!(css.starts_with("color:blue;padding:2px;"));
        assert!(css.ends_with("font-size:16px"));
    }

    #[test]
    fn compose_with_empty_original() {
        let patch = StylePatch {
            white_space: WhiteSpace::Nowrap,
            display: "inline-block",
            font_size: 24.5,
        };
        assert_eq!(
            compose_inline("", &patch),
            ";white-space:nowrap;display:inline-block;font-size:24.5px"
        );
    }
}
