use kurbo::{BezPath, ParamCurveNearest, PathEl, PathSeg, Shape};
use proptest::prelude::*;

use pathsweep::{simplify, FillRule, FilledPath, SimplifyOptions, TraceEvent};

fn polygon(path: &mut BezPath, points: &[(f64, f64)]) {
    path.move_to(points[0]);
    for &p in &points[1..] {
        path.line_to(p);
    }
    path.close_path();
}

fn contours(path: &BezPath) -> usize {
    path.elements()
        .iter()
        .filter(|el| matches!(el, PathEl::MoveTo(_)))
        .count()
}

fn inside(path: &FilledPath, p: kurbo::Point) -> bool {
    let w = path.path.winding(p);
    match path.fill_rule {
        FillRule::EvenOdd => w % 2 != 0,
        FillRule::NonZero => w != 0,
    }
}

// Sample points that stay well away from any line between two points
// with small integer coordinates.
fn samples(radius: i32) -> impl Iterator<Item = kurbo::Point> {
    (-radius..=radius).flat_map(move |i| {
        (-radius..=radius).map(move |j| kurbo::Point::new(i as f64 + 0.3183, j as f64 + 0.2718))
    })
}

fn assert_same_fill(input: &FilledPath, output: &FilledPath, radius: i32) {
    assert_eq!(output.fill_rule, FillRule::EvenOdd);
    for p in samples(radius) {
        assert_eq!(inside(input, p), inside(output, p), "disagreement at {p:?}");
    }
}

fn assert_lines_only(path: &BezPath) {
    assert!(path
        .elements()
        .iter()
        .all(|el| matches!(el, PathEl::MoveTo(_) | PathEl::LineTo(_) | PathEl::ClosePath)));
}

fn assert_closed(path: &BezPath) {
    let mut open = false;
    for el in path.elements() {
        match el {
            PathEl::MoveTo(_) => {
                assert!(!open, "unclosed contour");
                open = true;
            }
            PathEl::ClosePath => open = false,
            _ => assert!(open, "drawing outside a contour"),
        }
    }
    assert!(!open, "unclosed contour");
}

fn orient(a: kurbo::Point, b: kurbo::Point, c: kurbo::Point) -> f64 {
    (b - a).cross(c - a)
}

// Do the two segments cross at a point interior to both, by more than
// rounding error could account for?
fn properly_cross(a: (kurbo::Point, kurbo::Point), b: (kurbo::Point, kurbo::Point)) -> bool {
    let eps = 1e-9;
    let o = [
        orient(a.0, a.1, b.0),
        orient(a.0, a.1, b.1),
        orient(b.0, b.1, a.0),
        orient(b.0, b.1, a.1),
    ];
    o.iter().all(|x| x.abs() > eps) && (o[0] > 0.0) != (o[1] > 0.0) && (o[2] > 0.0) != (o[3] > 0.0)
}

fn lines(path: &BezPath) -> Vec<(kurbo::Point, kurbo::Point)> {
    path.segments()
        .filter_map(|seg| match seg {
            PathSeg::Line(l) => Some((l.p0, l.p1)),
            _ => None,
        })
        .collect()
}

fn assert_no_crossings(path: &BezPath) {
    let lines = lines(path);
    for (i, &a) in lines.iter().enumerate() {
        for &b in &lines[(i + 1)..] {
            assert!(!properly_cross(a, b), "{a:?} crosses {b:?}");
        }
    }
}

// Points on a grid that isn't aligned with the input, skipping any that are
// too close to an edge of one of `paths` to have a reliable winding number.
fn samples_away_from(paths: &[&BezPath], radius: f64) -> Vec<kurbo::Point> {
    let n = (radius * 10.0) as i32;
    let segs: Vec<PathSeg> = paths.iter().flat_map(|p| p.segments()).collect();
    (-n..=n)
        .flat_map(|i| {
            (-n..=n).map(move |j| kurbo::Point::new(i as f64 * 0.1 + 0.0317, j as f64 * 0.1 + 0.0271))
        })
        .filter(|&p| segs.iter().all(|s| s.nearest(p, 1e-9).distance_sq > 1e-12))
        .collect()
}

fn assert_same_fill_at(input: &FilledPath, output: &FilledPath, samples: &[kurbo::Point]) {
    assert_eq!(output.fill_rule, FillRule::EvenOdd);
    for &p in samples {
        assert_eq!(inside(input, p), inside(output, p), "disagreement at {p:?}");
    }
}

#[test]
fn overlapping_copies() {
    let mut path = BezPath::new();
    polygon(&mut path, &[(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 3.0)]);
    polygon(&mut path, &[(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 3.0)]);

    let out = simplify(&FilledPath::new(path.clone(), FillRule::NonZero), true).unwrap();
    assert_eq!(contours(&out.path), 1);
    assert_eq!(out.path.area().abs(), 12.0);

    let out = simplify(&FilledPath::new(path, FillRule::EvenOdd), true).unwrap();
    assert!(out.path.elements().is_empty());
}

#[test]
fn figure_eight() {
    let mut path = BezPath::new();
    polygon(&mut path, &[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]);
    let input = FilledPath::new(path, FillRule::EvenOdd);
    for as_fill in [true, false] {
        let out = simplify(&input, as_fill).unwrap();
        assert_eq!(contours(&out.path), 2);
        assert_lines_only(&out.path);
        assert_same_fill(&input, &out, 3);
    }
}

#[test]
fn off_grid_figure_eight() {
    let mut path = BezPath::new();
    polygon(&mut path, &[(0.8, 1.8), (1.6, -0.6), (-1.4, 0.6), (-0.5, -0.6)]);
    let input = FilledPath::new(path, FillRule::NonZero);
    for as_fill in [true, false] {
        let out = simplify(&input, as_fill).unwrap();
        assert_eq!(contours(&out.path), 2);
        assert_closed(&out.path);
        assert_no_crossings(&out.path);
        let samples = samples_away_from(&[&input.path, &out.path], 2.5);
        assert_same_fill_at(&input, &out, &samples);
    }
}

#[test]
fn shared_partial_edge() {
    let mut path = BezPath::new();
    polygon(&mut path, &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
    polygon(&mut path, &[(0.0, 0.0), (0.0, 1.0), (-1.0, 2.0), (-1.0, 0.0)]);
    let input = FilledPath::new(path, FillRule::NonZero);
    let out = simplify(&input, true).unwrap();
    assert_eq!(contours(&out.path), 1);
    assert_eq!(out.path.area().abs(), 5.5);
    assert_same_fill(&input, &out, 3);
}

#[test]
fn hole() {
    let mut path = BezPath::new();
    polygon(&mut path, &[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
    polygon(&mut path, &[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);
    let input = FilledPath::new(path, FillRule::EvenOdd);
    for as_fill in [true, false] {
        let out = simplify(&input, as_fill).unwrap();
        assert_eq!(contours(&out.path), 2);
        assert_same_fill(&input, &out, 5);
    }
}

#[test]
fn tracing() {
    let mut path = BezPath::new();
    polygon(&mut path, &[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]);
    let input = FilledPath::new(path, FillRule::EvenOdd);

    let mut events: Vec<TraceEvent> = Vec::new();
    let out =
        pathsweep::simplify_with(&input, true, &SimplifyOptions::default(), &mut events).unwrap();
    let emitted = events
        .iter()
        .filter(|ev| matches!(ev, TraceEvent::Emit { .. }))
        .count();
    let traced_contours = events
        .iter()
        .filter(|ev| matches!(ev, TraceEvent::Contour { .. }))
        .count();
    assert_eq!(emitted, 8);
    assert_eq!(traced_contours, contours(&out.path));

    // Logging the trace gives the same answer.
    let options = SimplifyOptions {
        trace: true,
        ..SimplifyOptions::default()
    };
    let logged = pathsweep::simplify_with_options(&input, true, &options).unwrap();
    assert_eq!(logged, out);
}

#[test]
fn idempotent_on_checkerboard() {
    let mut path = BezPath::new();
    for i in 0..3 {
        for j in 0..3 {
            let (x, y) = (3.0 * i as f64 - 4.0, 3.0 * j as f64 - 4.0);
            polygon(&mut path, &[(x, y), (x + 2.0, y), (x + 2.0, y + 2.0), (x, y + 2.0)]);
            let (x, y) = (x + 1.0, y + 1.0);
            polygon(&mut path, &[(x, y), (x + 2.0, y), (x + 2.0, y + 2.0), (x, y + 2.0)]);
        }
    }
    let input = FilledPath::new(path, FillRule::NonZero);
    let once = simplify(&input, true).unwrap();
    assert_same_fill(&input, &once, 7);

    let twice = simplify(&once, true).unwrap();
    assert_same_fill(&input, &twice, 7);
    assert!((once.path.area().abs() - twice.path.area().abs()).abs() < 1e-9);
}

fn integer_polygons() -> impl Strategy<Value = BezPath> {
    prop::collection::vec(
        prop::collection::vec((-10i32..=10, -10i32..=10), 3..7),
        1..4,
    )
    .prop_map(|polys| {
        let mut path = BezPath::new();
        for poly in polys {
            let points: Vec<_> = poly.into_iter().map(|(x, y)| (x as f64, y as f64)).collect();
            polygon(&mut path, &points);
        }
        path
    })
}

// Coordinates on a 0.1 grid, most of which aren't exactly representable.
fn tenth() -> impl Strategy<Value = f64> {
    (-20i32..=20).prop_map(|i| i as f64 / 10.0)
}

fn grid_point() -> impl Strategy<Value = kurbo::Point> {
    (tenth(), tenth()).prop_map(|(x, y)| kurbo::Point::new(x, y))
}

fn grid_polygons() -> impl Strategy<Value = BezPath> {
    prop::collection::vec(prop::collection::vec(grid_point(), 3..7), 1..4).prop_map(|polys| {
        let mut path = BezPath::new();
        for poly in polys {
            let points: Vec<_> = poly.into_iter().map(|p| (p.x, p.y)).collect();
            polygon(&mut path, &points);
        }
        path
    })
}

proptest! {
    #[test]
    fn same_fill_as_input(
        path in integer_polygons(),
        even_odd in any::<bool>(),
        as_fill in any::<bool>(),
    ) {
        let fill_rule = if even_odd { FillRule::EvenOdd } else { FillRule::NonZero };
        let input = FilledPath::new(path, fill_rule);
        let out = simplify(&input, as_fill).unwrap();
        assert_lines_only(&out.path);
        assert_same_fill(&input, &out, 11);
    }

    #[test]
    fn off_grid_polygons(
        path in grid_polygons(),
        even_odd in any::<bool>(),
        as_fill in any::<bool>(),
    ) {
        let fill_rule = if even_odd { FillRule::EvenOdd } else { FillRule::NonZero };
        let input = FilledPath::new(path, fill_rule);
        let once = simplify(&input, as_fill).unwrap();
        assert_lines_only(&once.path);
        assert_closed(&once.path);
        assert_no_crossings(&once.path);

        let twice = simplify(&once, as_fill).unwrap();
        assert_closed(&twice.path);
        assert_no_crossings(&twice.path);

        let samples = samples_away_from(&[&input.path, &once.path, &twice.path], 2.5);
        assert_same_fill_at(&input, &once, &samples);
        assert_same_fill_at(&input, &twice, &samples);
    }
}

proptest! {
    // Most sets of four points don't make a figure eight.
    #![proptest_config(ProptestConfig {
        max_global_rejects: 100_000,
        ..ProptestConfig::default()
    })]

    #[test]
    fn off_grid_figure_eights(
        p0 in grid_point(),
        p1 in grid_point(),
        p2 in grid_point(),
        p3 in grid_point(),
        even_odd in any::<bool>(),
        as_fill in any::<bool>(),
    ) {
        // The first and third edges cross well away from any endpoint, so
        // the polygon is two triangles meeting at a point.
        prop_assume!(orient(p0, p1, p2).abs() > 0.01 && orient(p0, p1, p3).abs() > 0.01);
        prop_assume!(orient(p2, p3, p0).abs() > 0.01 && orient(p2, p3, p1).abs() > 0.01);
        prop_assume!(properly_cross((p0, p1), (p2, p3)));

        let mut path = BezPath::new();
        polygon(&mut path, &[(p0.x, p0.y), (p1.x, p1.y), (p2.x, p2.y), (p3.x, p3.y)]);
        let fill_rule = if even_odd { FillRule::EvenOdd } else { FillRule::NonZero };
        let out = simplify(&FilledPath::new(path, fill_rule), as_fill).unwrap();
        assert_eq!(contours(&out.path), 2);
        assert_closed(&out.path);
        assert_no_crossings(&out.path);
    }
}
