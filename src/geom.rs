//! Geometric primitives, like points, bounds and line segments.

use arrayvec::ArrayVec;

use crate::num::CheapOrderedFloat;

/// A two-dimensional point.
///
/// Points are sorted by `y` and then by `x`, for the convenience of our sweep-line
/// algorithm (which moves in increasing `y`).
#[derive(Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    /// Vertical coordinate.
    ///
    /// Although it isn't important for functionality, the documentation and method naming
    /// assumes that larger values are down.
    pub y: f64,
    /// Horizontal component.
    ///
    /// Although it isn't important for functionality, the documentation and method naming
    /// assumes that larger values are to the right.
    pub x: f64,
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (
            CheapOrderedFloat::from(self.y),
            CheapOrderedFloat::from(self.x),
        )
            .cmp(&(
                CheapOrderedFloat::from(other.y),
                CheapOrderedFloat::from(other.x),
            ))
    }
}

impl PartialOrd for Point {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for Point {}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:?}, {:?})", self.x, self.y)
    }
}

impl Point {
    /// Create a new point.
    ///
    /// Note that the `x` coordinate comes first. This might be a tiny bit
    /// confusing because we're sorting by `y` coordinate first, but `(x, y)` is
    /// the only sane order (prove me wrong).
    pub fn new(x: f64, y: f64) -> Self {
        debug_assert!(x.is_finite());
        debug_assert!(y.is_finite());
        Point { x, y }
    }

    /// Convert to a `kurbo` point.
    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// An axis-aligned bounding box.
///
/// Unlike [`kurbo::Rect`], a box with zero width or height is not treated as
/// empty: the bounds of a vertical segment still overlap the bounds of
/// anything crossing it.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    /// The smallest `x` coordinate.
    pub left: f64,
    /// The smallest `y` coordinate.
    pub top: f64,
    /// The largest `x` coordinate.
    pub right: f64,
    /// The largest `y` coordinate.
    pub bottom: f64,
}

impl Bounds {
    /// The bounds of a single point.
    pub fn from_point(p: Point) -> Self {
        Bounds {
            left: p.x,
            top: p.y,
            right: p.x,
            bottom: p.y,
        }
    }

    /// The smallest bounds containing all the points, or `None` if there are none.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = Bounds::from_point(points.next()?);
        Some(points.fold(first, |b, p| b.add_point(p)))
    }

    /// Grows the bounds to include `p`.
    pub fn add_point(self, p: Point) -> Self {
        Bounds {
            left: self.left.min(p.x),
            top: self.top.min(p.y),
            right: self.right.max(p.x),
            bottom: self.bottom.max(p.y),
        }
    }

    /// Do the two (closed) boxes share at least one point?
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    /// Convert to a `kurbo` rectangle.
    pub fn to_kurbo(self) -> kurbo::Rect {
        kurbo::Rect::new(self.left, self.top, self.right, self.bottom)
    }
}

/// Evaluates the line from `p0` to `p1` at parameter `t`.
///
/// The parameter endpoints evaluate exactly to `p0` and `p1`, and interior
/// values are clamped to the segment's box so that evaluating an increasing
/// sequence of parameters on a top-to-bottom segment never goes back up.
pub fn lerp(p0: Point, p1: Point, t: f64) -> Point {
    if t <= 0.0 {
        return p0;
    }
    if t >= 1.0 {
        return p1;
    }
    let x = p0.x + (p1.x - p0.x) * t;
    let y = p0.y + (p1.y - p0.y) * t;
    Point {
        x: x.clamp(p0.x.min(p1.x), p0.x.max(p1.x)),
        y: y.clamp(p0.y.min(p1.y), p0.y.max(p1.y)),
    }
}

/// The point on the segment from `above` to `below` at height `y`.
///
/// The segment must go downwards (`above.y < below.y`). The returned point
/// has a `y` coordinate of exactly `y`, unless `y` is outside the segment's
/// range, in which case the nearest endpoint is returned.
pub fn point_at_y(above: Point, below: Point, y: f64) -> Point {
    if y <= above.y {
        return above;
    }
    if y >= below.y {
        return below;
    }
    let t = (y - above.y) / (below.y - above.y);
    let x = above.x + (below.x - above.x) * t;
    Point {
        x: x.clamp(above.x.min(below.x), above.x.max(below.x)),
        y,
    }
}

/// Intersects a segment with the horizontal run from `left` to `right` at height `y`.
///
/// Returns the parameter of the crossing along the segment. Horizontal
/// segments never cross horizontal runs.
pub fn horizontal_intersect(p0: Point, p1: Point, left: f64, right: f64, y: f64) -> Option<f64> {
    let (y_min, y_max) = (p0.y.min(p1.y), p0.y.max(p1.y));
    if y < y_min || y > y_max || y_min == y_max {
        return None;
    }
    let t = (y - p0.y) / (p1.y - p0.y);
    if !t.is_finite() {
        return None;
    }
    let x = lerp(p0, p1, t).x;
    (left <= x && x <= right).then_some(t)
}

// Above this, products of coordinate differences can overflow.
const TAME_LIMIT: f64 = 1e120;

/// Scales all the points by the same power of two so that products of
/// their coordinates (and of differences between them) are finite.
///
/// Scaling by a power of two is exact, so the signs and ratios of such
/// products are unchanged. Points that are already small enough are
/// returned as they are.
pub fn tame<const N: usize>(pts: [Point; N]) -> [Point; N] {
    let max = pts
        .iter()
        .fold(0.0f64, |m, p| m.max(p.x.abs()).max(p.y.abs()));
    if max <= TAME_LIMIT || !max.is_finite() {
        return pts;
    }
    let scale = 2.0f64.powi(-(max.log2().ceil() as i32));
    pts.map(|p| Point {
        x: p.x * scale,
        y: p.y * scale,
    })
}

fn cross(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ax * by - ay * bx
}

/// Intersects the segment `a0 -> a1` with the segment `b0 -> b1`.
///
/// Returns pairs `(t, u)` of parameters along the first and second segment.
/// Crossing segments produce one pair; collinear overlapping segments produce
/// one pair for each end of the overlap (or one, if the overlap is a single
/// point). Both segments must have non-zero length.
pub fn intersect_lines(a0: Point, a1: Point, b0: Point, b1: Point) -> ArrayVec<(f64, f64), 2> {
    let mut ret = ArrayVec::new();
    let [a0, a1, b0, b1] = tame([a0, a1, b0, b1]);
    let (ax, ay) = (a1.x - a0.x, a1.y - a0.y);
    let (bx, by) = (b1.x - b0.x, b1.y - b0.y);
    let (abx, aby) = (b0.x - a0.x, b0.y - a0.y);

    let mut denom = cross(ax, ay, bx, by);
    let mut numer_a = cross(abx, aby, bx, by);
    let mut numer_b = cross(abx, aby, ax, ay);

    if !(denom.is_finite() && numer_a.is_finite() && numer_b.is_finite()) {
        return ret;
    }
    if denom == 0.0 {
        if numer_b != 0.0 {
            // Parallel, but not on the same line.
            return ret;
        }
        return collinear_overlap(a0, a1, b0, b1);
    }

    if denom < 0.0 {
        denom = -denom;
        numer_a = -numer_a;
        numer_b = -numer_b;
    }
    if numer_a < 0.0 || numer_a > denom || numer_b < 0.0 || numer_b > denom {
        return ret;
    }
    let (t, u) = (numer_a / denom, numer_b / denom);
    if t.is_finite() && u.is_finite() {
        ret.push((t, u));
    }
    ret
}

fn collinear_overlap(a0: Point, a1: Point, b0: Point, b1: Point) -> ArrayVec<(f64, f64), 2> {
    let mut ret = ArrayVec::new();
    let use_x = (a1.x - a0.x).abs() >= (a1.y - a0.y).abs();
    let coord = |p: Point| if use_x { p.x } else { p.y };
    let la = coord(a1) - coord(a0);
    let lb = coord(b1) - coord(b0);
    if la == 0.0 || lb == 0.0 {
        return ret;
    }
    let t_of = |p: Point| (coord(p) - coord(a0)) / la;
    let u_of = |p: Point| (coord(p) - coord(b0)) / lb;

    // The overlap (if any) starts and ends at endpoints of the two segments.
    let candidates = [
        (0.0, u_of(a0)),
        (1.0, u_of(a1)),
        (t_of(b0), 0.0),
        (t_of(b1), 1.0),
    ];
    let in_range = |s: f64| (0.0..=1.0).contains(&s);
    let mut first: Option<(f64, f64)> = None;
    let mut last: Option<(f64, f64)> = None;
    for (t, u) in candidates {
        if !in_range(t) || !in_range(u) {
            continue;
        }
        if first.is_none_or(|(t0, _)| t < t0) {
            first = Some((t, u));
        }
        if last.is_none_or(|(t1, _)| t > t1) {
            last = Some((t, u));
        }
    }
    if let (Some(first), Some(last)) = (first, last) {
        ret.push(first);
        if last.0 != first.0 {
            ret.push(last);
        }
    }
    ret
}
