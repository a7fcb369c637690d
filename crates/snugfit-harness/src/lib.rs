#![forbid(unsafe_code)]

//! Deterministic host double for exercising the snugfit engine without a
//! document.
//!
//! [`FakeDom`] implements all three port traits over an in-memory element
//! arena with a manual frame pump and a virtual clock, so tests drive
//! every asynchronous edge by hand:
//!
//! ```ignore
//! let dom = FakeDom::new();
//! let el = dom.element().parent_size(800.0, 100.0).natural_size(400.0, 20.0).create();
//!
//! let engine = Fitter::new(dom.clone());
//! let _handle = engine.fit(el, FitOptions::default());
//!
//! dom.run_frame();                       // the registration pass
//! assert_eq!(dom.applied_font_size(el), Some(32.0));
//! ```
//!
//! # Measurement model
//!
//! An element's natural box scales linearly with the applied font size
//! relative to the fixture's base size/base font pair, which is exactly
//! the relationship the engine's single-step proportional scaling
//! assumes. When the applied `white-space` is `normal` the natural width
//! saturates at the parent width, approximating wrap. A detached element
//! measures zero on every axis.
//!
//! # Recording
//!
//! Every port interaction is recorded in order ([`DomOp`]) alongside fit
//! notices and subscription lifecycles, so tests can assert read/write
//! phase ordering, write counts, and notification payloads.

mod fake_dom;

pub use fake_dom::{DomOp, ElementBuilder, FakeDom, FakeElement};
