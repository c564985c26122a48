//! Splitting paths into edges that are monotonic in `y`.
//!
//! An [`Edge`] is a maximal run of path segments that all go down the page
//! (or all go up). Edges are stored top-to-bottom no matter which way the
//! path went; the original direction is kept in the edge's winding
//! contribution. Horizontal segments don't become edges at all. They're
//! recorded as [`HorizontalEdge`]s so that edges crossing them can be split
//! there.

use kurbo::{BezPath, PathEl};

use crate::geom::{Bounds, Point};
use crate::num::CheapOrderedFloat;
use crate::Error;

/// The kind of a path segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Verb {
    /// A straight line.
    Line,
    /// A quadratic Bézier.
    Quad,
    /// A cubic Bézier.
    Cubic,
    /// The end of a closed subpath.
    Close,
}

impl Verb {
    /// How many points the verb adds after its start point.
    pub fn point_count(self) -> usize {
        match self {
            Verb::Line => 1,
            Verb::Quad => 2,
            Verb::Cubic => 3,
            Verb::Close => 0,
        }
    }
}

/// The intersections found on a single segment of an edge.
///
/// Each split point is stored both as a parameter along the segment (which
/// decides the order) and as a point. Two edges that cross each other are
/// given the same point, so that their pieces meet exactly.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct Intercepts {
    ts: Vec<f64>,
    points: Vec<Point>,
    top_count: u32,
    bottom_count: u32,
}

impl Intercepts {
    /// Records an intersection at parameter `t`, passing through `p`, on the
    /// segment from `start` to `end`.
    ///
    /// Intersections at (or within `min_delta` of) either end of the segment
    /// are only counted. Others are inserted in sorted order, unless there's
    /// already one within `min_delta`. The point is clamped so that the
    /// split points never go back up, or outside the segment's box.
    ///
    /// Returns the point that the segment is actually split at, or `None`
    /// if `t` or `p` isn't finite.
    pub fn add(
        &mut self,
        t: f64,
        p: Point,
        (start, end): (Point, Point),
        min_delta: f64,
    ) -> Option<Point> {
        if !t.is_finite() || !p.x.is_finite() || !p.y.is_finite() {
            return None;
        }
        if t <= min_delta {
            self.top_count += 1;
            return Some(start);
        }
        if t >= 1.0 - min_delta {
            self.bottom_count += 1;
            return Some(end);
        }
        let idx = self.ts.partition_point(|&s| s < t);
        if idx > 0 && t - self.ts[idx - 1] < min_delta {
            return Some(self.points[idx - 1]);
        }
        if idx < self.ts.len() && self.ts[idx] - t < min_delta {
            return Some(self.points[idx]);
        }

        let above = if idx > 0 { self.points[idx - 1].y } else { start.y };
        let below = self.points.get(idx).map_or(end.y, |q| q.y);
        let p = Point {
            x: p.x.clamp(start.x.min(end.x), start.x.max(end.x)),
            y: p.y.clamp(above, below),
        };
        self.ts.insert(idx, t);
        self.points.insert(idx, p);
        Some(p)
    }

    /// The sorted split points strictly inside the segment, as parameters.
    pub fn ts(&self) -> &[f64] {
        &self.ts
    }

    /// How many intersections landed on the segment's start.
    pub fn top_count(&self) -> u32 {
        self.top_count
    }

    /// How many intersections landed on the segment's end.
    pub fn bottom_count(&self) -> u32 {
        self.bottom_count
    }

    /// The `i`th boundary between sub-segments, where `0` is `start` and
    /// `ts().len() + 1` is `end`.
    pub fn point(&self, i: usize, start: Point, end: Point) -> Point {
        match i {
            0 => start,
            i if i > self.points.len() => end,
            i => self.points[i - 1],
        }
    }

    fn is_interesting(&self) -> bool {
        !self.ts.is_empty() || self.top_count > 1 || self.bottom_count > 1
    }
}

typed_vec!(
    /// A vector of edges, indexed by [`EdgeIdx`].
    EdgeVec,
    /// The identity of an edge.
    EdgeIdx,
    "e"
);

/// A run of path segments that is monotonic in `y`, stored top-to-bottom.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Edge {
    points: Vec<Point>,
    verbs: Vec<Verb>,
    // The index in `points` of each verb's start point.
    starts: Vec<usize>,
    intercepts: Vec<Intercepts>,
    /// `1` if the input path went down this edge, `-1` if it went up.
    pub winding: i32,
    /// Contains all the points (including control points) of the edge.
    pub bounds: Bounds,
    cached: Vec<EdgeIdx>,
}

impl Edge {
    fn new(mut points: Vec<Point>, mut verbs: Vec<Verb>, winding: i32) -> Option<Self> {
        let bounds = Bounds::from_points(points.iter().copied())?;
        if verbs.is_empty() {
            return None;
        }
        if winding < 0 {
            points.reverse();
            verbs.reverse();
        }
        let starts = verbs
            .iter()
            .scan(0, |start, v| {
                let ret = *start;
                *start += v.point_count();
                Some(ret)
            })
            .collect();
        let intercepts = vec![Intercepts::default(); verbs.len()];
        Some(Edge {
            points,
            verbs,
            starts,
            intercepts,
            winding,
            bounds,
            cached: Vec::new(),
        })
    }

    /// All the points of the edge, from top to bottom.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The edge's segments, from top to bottom.
    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    /// The intersections recorded on each segment.
    pub fn intercepts(&self) -> &[Intercepts] {
        &self.intercepts
    }

    /// The points of segment `verb`, including its start and end.
    pub fn verb_points(&self, verb: usize) -> &[Point] {
        let start = self.starts[verb];
        &self.points[start..=start + self.verbs[verb].point_count()]
    }

    /// The bounding box of segment `verb`.
    pub fn verb_bounds(&self, verb: usize) -> Bounds {
        let pts = self.verb_points(verb);
        pts[1..]
            .iter()
            .fold(Bounds::from_point(pts[0]), |b, &p| b.add_point(p))
    }

    /// The endpoints of segment `verb`, if it's a straight line.
    pub fn line(&self, verb: usize) -> Result<(Point, Point), Error> {
        match self.verbs[verb] {
            Verb::Line => {
                let pts = self.verb_points(verb);
                Ok((pts[0], pts[1]))
            }
            Verb::Quad | Verb::Cubic => Err(Error::UnsupportedCurve),
            Verb::Close => Err(Error::MalformedPath),
        }
    }

    /// The `i`th split point of segment `verb` (see [`Intercepts::point`]).
    pub fn split_point(&self, verb: usize, i: usize) -> Result<Point, Error> {
        let (p0, p1) = self.line(verb)?;
        Ok(self.intercepts[verb].point(i, p0, p1))
    }

    /// Splits segment `verb` at parameter `t`, passing through `p`.
    ///
    /// Returns the point the segment was split at (which might not be `p`;
    /// see [`Intercepts::add`]).
    pub fn split(
        &mut self,
        verb: usize,
        t: f64,
        p: Point,
        min_delta: f64,
    ) -> Result<Option<Point>, Error> {
        let ends = self.line(verb)?;
        Ok(self.intercepts[verb].add(t, p, ends, min_delta))
    }

    /// Has this edge already been tested against `other`? If not, remember
    /// that it now has been.
    pub fn cached(&mut self, other: EdgeIdx) -> bool {
        match self.cached.binary_search(&other) {
            Ok(_) => true,
            Err(idx) => {
                self.cached.insert(idx, other);
                false
            }
        }
    }

    /// Does this edge need to be split anywhere, or was it touched more than
    /// once at one of its vertices?
    pub fn contains_intercepts(&self) -> bool {
        self.intercepts.iter().any(Intercepts::is_interesting)
    }
}

/// A horizontal run of the input path.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct HorizontalEdge {
    /// The smallest `x` coordinate.
    pub left: f64,
    /// The largest `x` coordinate.
    pub right: f64,
    /// The height of the run.
    pub y: f64,
}

impl HorizontalEdge {
    fn sort_key(&self) -> (CheapOrderedFloat, CheapOrderedFloat, CheapOrderedFloat) {
        (self.y.into(), self.left.into(), self.right.into())
    }
}

/// The output of [`build_edges`].
#[derive(Clone, Debug, Default)]
pub struct BuiltEdges {
    /// The monotonic edges, in the order they were found.
    pub edges: EdgeVec<Edge>,
    /// The horizontal runs, sorted by height and then by position.
    pub horizontals: Vec<HorizontalEdge>,
}

#[derive(Default)]
struct EdgeBuilder {
    out: BuiltEdges,
    points: Vec<Point>,
    verbs: Vec<Verb>,
    winding: i32,
}

impl EdgeBuilder {
    fn complete(&mut self) {
        let points = std::mem::take(&mut self.points);
        let verbs = std::mem::take(&mut self.verbs);
        if let Some(edge) = Edge::new(points, verbs, self.winding) {
            self.out.edges.push(edge);
        }
        self.winding = 0;
    }

    fn add(&mut self, verb: Verb, pts: &[Point]) {
        let direction = direction(pts);
        if direction == 0 {
            let (left, right) = pts.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(l, r), p| {
                (l.min(p.x), r.max(p.x))
            });
            self.out.horizontals.push(HorizontalEdge {
                left,
                right,
                y: pts[0].y,
            });
            self.complete();
            return;
        }
        if self.winding + direction == 0 {
            self.complete();
        }
        if self.verbs.is_empty() {
            self.points.clear();
            self.points.push(pts[0]);
            self.winding = direction;
        }
        debug_assert_eq!(self.points.last(), Some(&pts[0]));
        self.points.extend_from_slice(&pts[1..]);
        self.verbs.push(verb);
    }
}

/// `0` for horizontal segments, `1` for segments going down and `-1` for
/// segments going up.
///
/// Curves that end at the same height they started use their horizontal
/// direction as a tie-breaker.
fn direction(pts: &[Point]) -> i32 {
    let (first, last) = (pts[0], pts[pts.len() - 1]);
    if pts.iter().all(|p| p.y == first.y) {
        return 0;
    }
    match (last.y.partial_cmp(&first.y), last.x.partial_cmp(&first.x)) {
        (Some(std::cmp::Ordering::Greater), _) => 1,
        (Some(std::cmp::Ordering::Less), _) => -1,
        (_, Some(std::cmp::Ordering::Less)) => -1,
        _ => 1,
    }
}

/// Splits a path into monotonic edges and horizontal runs.
///
/// Every subpath is treated as closed: if it doesn't end where it started,
/// a line back to the start is added.
pub fn build_edges(path: &BezPath) -> Result<BuiltEdges, Error> {
    build_edges_from(path.iter())
}

/// Like [`build_edges`], but for any sequence of path elements.
///
/// Drawing anything before the first move-to is an error.
pub fn build_edges_from(
    elements: impl IntoIterator<Item = PathEl>,
) -> Result<BuiltEdges, Error> {
    let mut builder = EdgeBuilder::default();
    // The start of the current subpath, and the current point.
    let mut subpath: Option<(Point, Point)> = None;

    fn close(builder: &mut EdgeBuilder, start: Point, last: Point) {
        if start != last {
            builder.add(Verb::Line, &[last, start]);
        }
        builder.complete();
    }

    for el in elements {
        let (verb, pts): (Verb, Vec<Point>) = match el {
            PathEl::MoveTo(p) => {
                if let Some((start, last)) = subpath {
                    close(&mut builder, start, last);
                }
                subpath = Some((p.into(), p.into()));
                continue;
            }
            PathEl::ClosePath => {
                if let Some((start, last)) = subpath.as_mut() {
                    close(&mut builder, *start, *last);
                    *last = *start;
                }
                continue;
            }
            PathEl::LineTo(p1) => (Verb::Line, vec![p1.into()]),
            PathEl::QuadTo(p1, p2) => (Verb::Quad, vec![p1.into(), p2.into()]),
            PathEl::CurveTo(p1, p2, p3) => (Verb::Cubic, vec![p1.into(), p2.into(), p3.into()]),
        };
        let Some((_, last)) = subpath.as_mut() else {
            return Err(Error::MalformedPath);
        };
        let mut all = Vec::with_capacity(pts.len() + 1);
        all.push(*last);
        all.extend(pts);
        builder.add(verb, &all);
        *last = all[all.len() - 1];
    }
    if let Some((start, last)) = subpath {
        close(&mut builder, start, last);
    }

    let mut out = builder.out;
    out.horizontals.sort_by_key(HorizontalEdge::sort_key);
    Ok(out)
}

/// All edge indices, sorted by the top of the edge and then by its left side.
pub fn sorted_by_top(edges: &EdgeVec<Edge>) -> Vec<EdgeIdx> {
    let mut ret: Vec<_> = edges.indices().collect();
    ret.sort_by_key(|&e| {
        (
            CheapOrderedFloat::from(edges[e].bounds.top),
            CheapOrderedFloat::from(edges[e].bounds.left),
        )
    });
    ret
}
