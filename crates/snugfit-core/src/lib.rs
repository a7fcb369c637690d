#![forbid(unsafe_code)]

//! Core data model and host port traits for snugfit.
//!
//! This crate holds everything the redraw engine in `snugfit-runtime`
//! operates *on*, with no engine logic of its own:
//!
//! - [`FitRecord`]: the per-element state tracked for one observed element.
//! - [`Dirty`]: the escalating redraw-reason flags.
//! - [`FitOptions`] / [`MutationPolicy`]: registration configuration.
//! - [`StylePort`], [`ChangeSignals`], [`FrameClock`]: the three port
//!   traits a host environment implements to connect the engine to a real
//!   document (or to a test double).
//!
//! # Architecture
//!
//! The engine is single-threaded and callback-driven. Nothing in this crate
//! is `Send`; shared state lives behind `Rc`/`RefCell` in the runtime, and
//! signal callbacks are plain `Rc<dyn Fn()>` values. Hosts deliver change
//! notifications by invoking the callbacks they were handed at
//! subscription time.
//!
//! # Invariants
//!
//! 1. A record's `current_font_size` is clamped to
//!    `[min_size, max_size]` after every computation.
//! 2. Dirty flags only escalate between redraw passes; only a completed
//!    pass clears them.
//! 3. Bootstrap flags (`style_computed`, `pre_style_test_completed`) are
//!    set once and never re-derived.
//! 4. `original_style` is captured at most once, before the first style
//!    write, and restored verbatim on unsubscribe.

pub mod config;
pub mod geometry;
pub mod port;
pub mod record;
pub mod style;

pub use config::{FitOptions, MutationFilter, MutationPolicy};
pub use geometry::Size;
pub use port::{ChangeSignals, FitNotice, FrameClock, SignalFn, StylePort};
pub use record::{Dirty, FitRecord};
pub use style::{ComputedSample, StylePatch, WhiteSpace, compose_inline};
