#![forbid(unsafe_code)]

//! snugfit public facade and prelude.
//!
//! Snugly scales text to fill its parent container. Register elements
//! with a [`Fitter`] engine and the batched redraw scheduler keeps their
//! font size fitted across content mutations and viewport changes.
//!
//! This crate re-exports the record model and port traits from
//! `snugfit-core` and the engine from `snugfit-runtime`. Enable the
//! `harness` feature to pull in the deterministic host double for your
//! own tests.

pub use snugfit_core::{
    ChangeSignals, ComputedSample, Dirty, FitNotice, FitOptions, FitRecord, FrameClock,
    MutationFilter, MutationPolicy, SignalFn, Size, StylePort, WhiteSpace,
};
pub use snugfit_runtime::{DEFAULT_VIEWPORT_DEBOUNCE, FitHandle, Fitter, Host};

#[cfg(feature = "harness")]
pub use snugfit_harness as harness;

/// Everything a typical caller needs.
pub mod prelude {
    pub use snugfit_core::{FitNotice, FitOptions, MutationFilter, MutationPolicy};
    pub use snugfit_runtime::{FitHandle, Fitter, Host};
}
