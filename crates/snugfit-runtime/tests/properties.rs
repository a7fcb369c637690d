#![forbid(unsafe_code)]

//! Property tests: the clamp and convergence invariants hold over
//! arbitrary geometry and arbitrary operation interleavings.

use std::time::Duration;

use proptest::prelude::*;
use snugfit_core::FitOptions;
use snugfit_harness::FakeDom;
use snugfit_runtime::Fitter;

#[derive(Debug, Clone)]
enum Op {
    Mutate,
    GrowContent(f32),
    ResizeParent(f32),
    ManualFit,
    Freeze,
    Unfreeze,
    RunFrame,
    Advance(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Mutate),
        (50.0f32..1500.0).prop_map(Op::GrowContent),
        (50.0f32..1500.0).prop_map(Op::ResizeParent),
        Just(Op::ManualFit),
        Just(Op::Freeze),
        Just(Op::Unfreeze),
        Just(Op::RunFrame),
        (0u64..200).prop_map(Op::Advance),
    ]
}

proptest! {
    /// After any first pass, the applied size is finite and within the
    /// configured bounds, whatever the geometry.
    #[test]
    fn applied_size_is_always_finite_and_bounded(
        parent_w in 0.0f32..2000.0,
        parent_h in 0.0f32..400.0,
        natural_w in 0.0f32..2000.0,
        natural_h in 0.0f32..200.0,
        font in 1.0f32..100.0,
        bound_a in 1.0f32..600.0,
        bound_b in 1.0f32..600.0,
        multi_line in any::<bool>(),
        fit_height in any::<bool>(),
    ) {
        let min = bound_a.min(bound_b);
        let max = bound_a.max(bound_b);

        let dom = FakeDom::new();
        let el = dom
            .element()
            .parent_size(parent_w, parent_h)
            .natural_size(natural_w, natural_h)
            .font_size(font)
            .create();
        let engine = Fitter::new(dom.clone());
        let _handle = engine.fit(
            el,
            FitOptions::default()
                .min_size(min)
                .max_size(max)
                .multi_line(multi_line)
                .fit_height(fit_height),
        );
        dom.run_frame();

        let applied = dom.applied_font_size(el).expect("first pass applies a size");
        prop_assert!(applied.is_finite());
        prop_assert!(applied >= min && applied <= max);
    }

    /// A forced refit with no intervening document change recomputes the
    /// same size: scale factor 1 on the second pass.
    #[test]
    fn second_pass_is_idempotent(
        parent_w in 0.0f32..2000.0,
        natural_w in 0.0f32..2000.0,
        font in 1.0f32..100.0,
        multi_line in any::<bool>(),
        fit_height in any::<bool>(),
    ) {
        let dom = FakeDom::new();
        let el = dom
            .element()
            .parent_size(parent_w, 120.0)
            .natural_size(natural_w, 24.0)
            .font_size(font)
            .create();
        let engine = Fitter::new(dom.clone());
        let handle = engine.fit(
            el,
            FitOptions::default().multi_line(multi_line).fit_height(fit_height),
        );
        dom.run_frame();
        let settled = dom.applied_font_size(el).expect("first pass applies a size");
        dom.clear_notices();

        handle.fit();
        dom.run_frame();

        // The harness measures with f32 arithmetic rather than the
        // integer pixel boxes a document reports, so the recomputed size
        // can drift by a few ulps; the deterministic scenario tests pin
        // the exact-equality cases.
        let refit = dom.applied_font_size(el).expect("second pass applies a size");
        prop_assert!((refit - settled).abs() <= settled * 1e-3);
        let notices = dom.notices_for(el);
        prop_assert_eq!(notices.len(), 1);
        prop_assert!((notices[0].scale_factor - 1.0).abs() <= 1e-3);
    }

    /// Arbitrary interleavings of mutations, resizes, freezes, manual
    /// fits, timer advances, and frame pumps never push the applied size
    /// out of bounds, never produce a non-finite size, and never panic.
    #[test]
    fn arbitrary_interleavings_stay_bounded(
        ops in proptest::collection::vec(op_strategy(), 0..40)
    ) {
        let dom = FakeDom::new();
        let el = dom
            .element()
            .parent_size(800.0, 100.0)
            .natural_size(400.0, 20.0)
            .create();
        let engine = Fitter::new(dom.clone());
        let handle = engine.fit(el, FitOptions::default());
        dom.run_frame();

        for op in ops {
            match op {
                Op::Mutate => dom.mutate(el),
                Op::GrowContent(width) => {
                    dom.set_natural_base(el, width, 20.0);
                    dom.mutate(el);
                }
                Op::ResizeParent(width) => {
                    dom.set_parent_size(el, width, 100.0);
                    dom.resize_viewport();
                }
                Op::ManualFit => handle.fit(),
                Op::Freeze => handle.freeze(),
                Op::Unfreeze => handle.unfreeze(),
                Op::RunFrame => {
                    dom.run_frame();
                }
                Op::Advance(ms) => dom.advance(Duration::from_millis(ms)),
            }
            if let Some(applied) = dom.applied_font_size(el) {
                prop_assert!(applied.is_finite());
                prop_assert!((16.0..=512.0).contains(&applied));
            }
        }

        // settle whatever is still pending
        dom.advance(Duration::from_millis(500));
        dom.run_frame();
        dom.run_frame();
        if let Some(applied) = dom.applied_font_size(el) {
            prop_assert!(applied.is_finite());
            prop_assert!((16.0..=512.0).contains(&applied));
        }
    }
}
