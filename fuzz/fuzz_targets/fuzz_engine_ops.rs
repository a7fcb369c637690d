#![no_main]

//! Drive arbitrary operation sequences through the engine and check the
//! clamp/finiteness invariants after every step.

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use snugfit_core::FitOptions;
use snugfit_harness::FakeDom;
use snugfit_runtime::Fitter;

#[derive(Arbitrary, Debug)]
enum Op {
    Mutate(u8),
    GrowContent(u8, u16),
    ResizeParent(u8, u16),
    ManualFit(u8),
    Freeze(u8),
    Unfreeze(u8),
    Unsubscribe(u8),
    FitAll,
    RunFrame,
    Advance(u16),
    ToggleViewport(bool),
}

fuzz_target!(|ops: Vec<Op>| {
    let dom = FakeDom::new();
    let engine = Fitter::new(dom.clone());

    let elements: Vec<_> = (0..4)
        .map(|i| {
            dom.element()
                .parent_size(200.0 + 100.0 * i as f32, 80.0)
                .natural_size(150.0, 20.0)
                .create()
        })
        .collect();
    let handles: Vec<_> = elements
        .iter()
        .map(|el| engine.fit(*el, FitOptions::default()))
        .collect();

    let pick = |i: u8| (i as usize) % elements.len();
    for op in ops {
        match op {
            Op::Mutate(i) => dom.mutate(elements[pick(i)]),
            Op::GrowContent(i, w) => {
                let el = elements[pick(i)];
                dom.set_natural_base(el, f32::from(w % 2000) + 1.0, 20.0);
                dom.mutate(el);
            }
            Op::ResizeParent(i, w) => {
                let el = elements[pick(i)];
                dom.set_parent_size(el, f32::from(w % 2000), 80.0);
                dom.resize_viewport();
            }
            Op::ManualFit(i) => handles[pick(i)].fit(),
            Op::Freeze(i) => handles[pick(i)].freeze(),
            Op::Unfreeze(i) => handles[pick(i)].unfreeze(),
            Op::Unsubscribe(i) => handles[pick(i)].unsubscribe(),
            Op::FitAll => engine.fit_all(),
            Op::RunFrame => {
                dom.run_frame();
            }
            Op::Advance(ms) => dom.advance(Duration::from_millis(u64::from(ms % 500))),
            Op::ToggleViewport(on) => {
                if on {
                    engine.enable_viewport_observing();
                } else {
                    engine.disable_viewport_observing();
                }
            }
        }
        for el in &elements {
            if let Some(applied) = dom.applied_font_size(*el) {
                assert!(applied.is_finite());
                assert!((16.0..=512.0).contains(&applied));
            }
        }
    }
});
