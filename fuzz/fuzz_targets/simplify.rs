#![no_main]

use arbitrary::Unstructured;
use kurbo::{PathEl, Shape};
use libfuzzer_sys::fuzz_target;
use pathsweep::{arbitrary::filled_path, simplify, FillRule};

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(input) = filled_path(100.0, &mut u) else {
        return;
    };
    let Ok(as_fill) = u.arbitrary::<bool>() else {
        return;
    };

    let out = match simplify(&input, as_fill) {
        Ok(out) => out,
        Err(e) => panic!("failed to simplify {input:?}: {e}"),
    };
    assert_eq!(out.fill_rule, FillRule::EvenOdd);
    assert!(out
        .path
        .elements()
        .iter()
        .all(|el| matches!(el, PathEl::MoveTo(_) | PathEl::LineTo(_) | PathEl::ClosePath)));
    assert!(out.path.area().is_finite());
});
