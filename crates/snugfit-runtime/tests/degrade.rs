#![forbid(unsafe_code)]

//! Integration tests: degrade-to-noop behavior when host capabilities
//! are missing or elements go away. Nothing in here should error or
//! panic; elements simply stop resizing.

use snugfit_core::FitOptions;
use snugfit_harness::FakeDom;
use snugfit_runtime::Fitter;

#[test]
fn frameless_host_is_permanently_inert() {
    let dom = FakeDom::new().without_frames();
    let el = dom
        .element()
        .parent_size(800.0, 100.0)
        .natural_size(400.0, 20.0)
        .create();

    let engine = Fitter::new(dom.clone());
    let handle = engine.fit(el, FitOptions::default());
    handle.fit();
    engine.fit_all();

    assert_eq!(dom.pending_frames(), 0);
    assert_eq!(dom.run_frame(), 0);
    assert_eq!(dom.applied_font_size(el), None);
    assert_eq!(dom.style_writes(el), 0);
}

#[test]
fn missing_mutation_capability_resolves_observation_off() {
    let dom = FakeDom::new().without_mutation_observation();
    let el = dom
        .element()
        .parent_size(800.0, 100.0)
        .natural_size(400.0, 20.0)
        .create();

    let engine = Fitter::new(dom.clone());
    let _handle = engine.fit(el, FitOptions::default());
    dom.run_frame();
    assert_eq!(dom.applied_font_size(el), Some(32.0));
    assert_eq!(dom.content_sub_count(), 0);

    // content changes go unnoticed; no error either
    dom.clear_notices();
    dom.set_natural_base(el, 800.0, 20.0);
    dom.mutate(el);
    dom.run_frame();
    assert!(dom.notices_for(el).is_empty());
    assert_eq!(dom.applied_font_size(el), Some(32.0));
}

#[test]
fn host_without_viewport_signal_still_fits_on_registration() {
    let dom = FakeDom::new().without_viewport_signal();
    let el = dom
        .element()
        .parent_size(800.0, 100.0)
        .natural_size(400.0, 20.0)
        .create();

    let engine = Fitter::new(dom.clone());
    assert_eq!(dom.viewport_sub_count(), 0);

    let _handle = engine.fit(el, FitOptions::default());
    dom.run_frame();
    assert_eq!(dom.applied_font_size(el), Some(32.0));
}

#[test]
fn detached_element_never_receives_a_non_finite_size() {
    let dom = FakeDom::new();
    let el = dom
        .element()
        .parent_size(800.0, 100.0)
        .natural_size(400.0, 20.0)
        .create();

    let engine = Fitter::new(dom.clone());
    let handle = engine.fit(el, FitOptions::default());
    dom.run_frame();
    assert_eq!(dom.applied_font_size(el), Some(32.0));

    dom.detach(el);
    handle.fit();
    dom.run_frame();

    // zero-sized measurements compute to "no change this pass"
    let applied = dom.applied_font_size(el).unwrap();
    assert!(applied.is_finite());
    assert_eq!(applied, 32.0);
    let notices = dom.notices_for(el);
    assert_eq!(notices.last().map(|n| n.scale_factor), Some(1.0));
}

#[test]
fn empty_registration_yields_empty_handles() {
    let dom = FakeDom::new();
    let engine = Fitter::new(dom.clone());
    let handles = engine.fit_many(std::iter::empty(), FitOptions::default());
    assert!(handles.is_empty());
}

#[test]
fn zero_sized_element_from_the_start_lands_at_the_minimum() {
    let dom = FakeDom::new();
    let el = dom
        .element()
        .parent_size(800.0, 100.0)
        .natural_size(0.0, 0.0)
        .create();

    let engine = Fitter::new(dom.clone());
    let _handle = engine.fit(el, FitOptions::default());
    dom.run_frame();

    let applied = dom.applied_font_size(el).unwrap();
    assert!(applied.is_finite());
    assert!((16.0..=512.0).contains(&applied));
}
