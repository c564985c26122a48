//! Stitching the sweep's output segments into closed contours.
//!
//! The sweep hands us a bag of segments, each of which crosses exactly one
//! band. We look at all the segment ends at a given height, sorted from left
//! to right. Just above that height, inside-ness flips at every end of a
//! segment coming from above; just below, at every end of a segment going
//! down. So the places where the inside differs above and below the line,
//! which are exactly the horizontal parts of the boundary, run from the
//! first end to the second, from the third to the fourth, and so on.
//! Connecting the ends in those pairs gives every end exactly one partner,
//! and following segments and partners traces out closed loops.

use std::collections::BTreeMap;

use kurbo::BezPath;

use crate::edge::{EdgeIdx, Verb};
use crate::geom::{tame, Point};
use crate::num::{ulps_close, ulps_diff, ulps_step};
use crate::trace::{SweepObserver, TraceEvent};
use crate::{Error, Tolerances};

typed_vec!(
    /// A vector of output segments, indexed by [`OutIdx`].
    OutEdgeVec,
    /// The identity of an output segment.
    OutIdx,
    "o"
);

/// A piece of the boundary found by the sweep.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct OutEdge {
    /// The endpoints, with the first one on top (or on the left, for
    /// horizontal segments).
    pub pts: [Point; 2],
    /// The edge and segment index that this came from, or `None` for
    /// horizontal pieces of the boundary.
    pub source: Option<(EdgeIdx, usize)>,
    /// The kind of segment that this came from.
    pub verb: Verb,
    /// This came from an edge that was too close to call against one of its
    /// neighbors, so its ends may be slightly off from where they should meet.
    pub close_call: bool,
}

/// One end of an output segment.
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
struct HalfOutIdx {
    idx: OutIdx,
    first_half: bool,
}

impl HalfOutIdx {
    fn other_half(self) -> Self {
        Self {
            idx: self.idx,
            first_half: !self.first_half,
        }
    }
}

impl std::fmt::Debug for HalfOutIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.first_half {
            write!(f, "o{}->", self.idx.0)
        } else {
            write!(f, "o{}<-", self.idx.0)
        }
    }
}

/// A vector indexed by the ends of output segments.
struct HalfOutVec<T> {
    first: Vec<T>,
    second: Vec<T>,
}

impl<T: Clone> HalfOutVec<T> {
    fn filled(value: T, size: usize) -> Self {
        Self {
            first: vec![value.clone(); size],
            second: vec![value; size],
        }
    }
}

impl<T> std::ops::Index<HalfOutIdx> for HalfOutVec<T> {
    type Output = T;

    fn index(&self, index: HalfOutIdx) -> &T {
        if index.first_half {
            &self.first[index.idx.0]
        } else {
            &self.second[index.idx.0]
        }
    }
}

impl<T> std::ops::IndexMut<HalfOutIdx> for HalfOutVec<T> {
    fn index_mut(&mut self, index: HalfOutIdx) -> &mut T {
        if index.first_half {
            &mut self.first[index.idx.0]
        } else {
            &mut self.second[index.idx.0]
        }
    }
}

/// A point on a contour, and the source of the segment starting there.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Vertex {
    p: Point,
    tag: Option<(EdgeIdx, usize)>,
}

/// The output segments of a sweep.
#[derive(Clone, Debug, Default)]
pub struct OutEdges {
    edges: OutEdgeVec<OutEdge>,
}

impl OutEdges {
    /// Adds a new segment.
    pub fn push(&mut self, edge: OutEdge) -> OutIdx {
        self.edges.push(edge)
    }

    /// The number of segments.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Are there no segments at all?
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Iterates over the segments and their indices.
    pub fn iter(&self) -> impl Iterator<Item = (OutIdx, &OutEdge)> + '_ {
        self.edges.iter()
    }

    fn point(&self, half: HalfOutIdx) -> Point {
        let pts = &self.edges[half.idx].pts;
        if half.first_half {
            pts[0]
        } else {
            pts[1]
        }
    }

    fn point_mut(&mut self, half: HalfOutIdx) -> &mut Point {
        let pts = &mut self.edges[half.idx].pts;
        if half.first_half {
            &mut pts[0]
        } else {
            &mut pts[1]
        }
    }

    fn halves(&self) -> impl Iterator<Item = HalfOutIdx> + '_ {
        self.edges.indices().flat_map(|idx| {
            [true, false]
                .into_iter()
                .map(move |first_half| HalfOutIdx { idx, first_half })
        })
    }

    /// All segment ends, sorted by position.
    ///
    /// Ends at the same point are sorted by where their segment goes: first
    /// the ones coming from above, then horizontal ones, then the ones going
    /// down, each group from left to right.
    fn sorted_ends(&self) -> Vec<HalfOutIdx> {
        let key = |h: HalfOutIdx| {
            let p = self.point(h);
            let q = self.point(h.other_half());
            let class = match q.y.total_cmp(&p.y) {
                std::cmp::Ordering::Less => 0,
                std::cmp::Ordering::Equal => 1,
                std::cmp::Ordering::Greater => 2,
            };
            let slope = if class == 1 {
                q.x - p.x
            } else {
                (q.x - p.x) / (q.y - p.y).abs()
            };
            (p, class, slope)
        };
        let mut ends: Vec<_> = self.halves().collect();
        ends.sort_by(|&a, &b| {
            let (pa, ca, sa) = key(a);
            let (pb, cb, sb) = key(b);
            pa.cmp(&pb).then(ca.cmp(&cb)).then(sa.total_cmp(&sb))
        });
        ends
    }

    /// Moves segment ends that are at the same height, and within a few ULPs
    /// of each other, onto the same point.
    ///
    /// The window is `gap_ulps`, or `close_call_ulps` if either end belongs
    /// to a close-call segment. Each end is compared against the leftmost
    /// end of its cluster, so clusters don't creep.
    pub fn snap_ends(&mut self, tolerances: &Tolerances) {
        let ends = self.sorted_ends();
        let mut moves = Vec::new();
        for row in ends.chunk_by(|&a, &b| self.point(a).y == self.point(b).y) {
            let mut anchor = row[0];
            for &h in &row[1..] {
                let (x0, x1) = (self.point(anchor).x, self.point(h).x);
                if x0 == x1 {
                    continue;
                }
                let close_call = self.edges[anchor.idx].close_call || self.edges[h.idx].close_call;
                let ulps = if close_call {
                    tolerances.close_call_ulps
                } else {
                    tolerances.gap_ulps
                };
                if ulps_close(x0, x1, ulps) {
                    moves.push((h, x0));
                } else {
                    anchor = h;
                }
            }
        }
        for (h, x) in moves {
            self.point_mut(h).x = x;
        }
    }

    /// Adds the horizontal parts of the boundary as explicit segments.
    ///
    /// At every height where segments end, the ends are paired up from left
    /// to right and each pair at different positions gets a horizontal
    /// segment between them.
    pub fn add_horizontal_runs(&mut self) -> Result<(), Error> {
        let ends = self.sorted_ends();
        let mut runs = Vec::new();
        for row in ends.chunk_by(|&a, &b| self.point(a).y == self.point(b).y) {
            let y = self.point(row[0]).y;
            if row.len() % 2 != 0 {
                return Err(Error::AssemblyMismatch { y0: y, y1: y });
            }
            for pair in row.chunks_exact(2) {
                let (left, right) = (self.point(pair[0]), self.point(pair[1]));
                if left.x != right.x {
                    runs.push(OutEdge {
                        pts: [left, right],
                        source: None,
                        verb: Verb::Line,
                        close_call: false,
                    });
                }
            }
        }
        for run in runs {
            self.push(run);
        }
        Ok(())
    }

    /// Pairs up segment ends by position, allowing slightly different heights.
    fn bridge_filled(
        &self,
        ends: &[HalfOutIdx],
        tolerances: &Tolerances,
        observer: &mut dyn SweepObserver,
    ) -> Result<HalfOutVec<Option<HalfOutIdx>>, Error> {
        let mut partners = HalfOutVec::filled(None, self.len());
        let mut pairs = ends.chunks_exact(2);
        for pair in pairs.by_ref() {
            let (y0, y1) = (self.point(pair[0]).y, self.point(pair[1]).y);
            let diff = ulps_diff(y0, y1);
            if diff > u64::from(tolerances.bridge_ulps) {
                return Err(Error::AssemblyMismatch { y0, y1 });
            }
            if diff > u64::from(tolerances.strict_bridge_ulps) {
                observer.event(TraceEvent::LooseBridge { y0, y1 });
            }
            partners[pair[0]] = Some(pair[1]);
            partners[pair[1]] = Some(pair[0]);
        }
        if let [odd] = pairs.remainder() {
            let y = self.point(*odd).y;
            return Err(Error::AssemblyMismatch { y0: y, y1: y });
        }
        Ok(partners)
    }

    /// Pairs up segment ends that are at exactly the same point.
    fn bridge_exact(&self, ends: &[HalfOutIdx]) -> Result<HalfOutVec<Option<HalfOutIdx>>, Error> {
        let mut partners = HalfOutVec::filled(None, self.len());
        for group in ends.chunk_by(|&a, &b| self.point(a) == self.point(b)) {
            if group.len() % 2 != 0 {
                let p = self.point(group[0]);
                return Err(Error::AssemblyMismatch { y0: p.y, y1: p.y });
            }
            for pair in group.chunks_exact(2) {
                partners[pair[0]] = Some(pair[1]);
                partners[pair[1]] = Some(pair[0]);
            }
        }
        Ok(partners)
    }

    /// Follows segments and partners from `start` until we get back to it.
    fn walk(
        &self,
        start: HalfOutIdx,
        partners: &HalfOutVec<Option<HalfOutIdx>>,
        visited: &mut OutEdgeVec<bool>,
        tolerances: &Tolerances,
    ) -> Result<Vec<Vertex>, Error> {
        let mut ret = Vec::new();
        let mut cur = start;
        loop {
            visited[cur.idx] = true;
            ret.push(Vertex {
                p: self.point(cur),
                tag: self.edges[cur.idx].source,
            });
            let far = cur.other_half();
            let far_p = self.point(far);
            let Some(next) = partners[far] else {
                return Err(Error::AssemblyMismatch {
                    y0: far_p.y,
                    y1: far_p.y,
                });
            };
            let next_p = self.point(next);
            let snapped = ulps_close(far_p.x, next_p.x, tolerances.gap_ulps)
                && ulps_close(far_p.y, next_p.y, tolerances.gap_ulps);
            if !snapped {
                ret.push(Vertex { p: far_p, tag: None });
            }
            if next == start {
                return Ok(ret);
            }
            cur = next;
        }
    }

    /// Joins the segments into closed contours.
    ///
    /// If `as_fill` is true, ends at the same height are joined by position,
    /// and the gaps between them become horizontal lines. Otherwise, ends are
    /// only joined if they're at exactly the same point, so the horizontal
    /// parts of the boundary must already be present (see
    /// [`add_horizontal_runs`](Self::add_horizontal_runs)).
    pub fn assemble(
        &self,
        as_fill: bool,
        tolerances: &Tolerances,
        observer: &mut dyn SweepObserver,
    ) -> Result<BezPath, Error> {
        let ends = self.sorted_ends();
        let partners = if as_fill {
            self.bridge_filled(&ends, tolerances, observer)?
        } else {
            self.bridge_exact(&ends)?
        };

        let mut ret = BezPath::new();
        let mut visited = OutEdgeVec::filled(false, self.len());
        for &start in &ends {
            if visited[start.idx] {
                continue;
            }
            let walked = self.walk(start, &partners, &mut visited, tolerances)?;
            for contour in split_pinches(walked, tolerances.gap_ulps) {
                let contour = merge_collinear(contour);
                if contour.len() < 3 {
                    continue;
                }
                observer.event(TraceEvent::Contour {
                    points: contour.len(),
                });
                ret.move_to(contour[0].p.to_kurbo());
                for v in &contour[1..] {
                    ret.line_to(v.p.to_kurbo());
                }
                ret.line_to(contour[0].p.to_kurbo());
                ret.close_path();
            }
        }
        Ok(ret)
    }
}

/// Splits a closed walk into loops that don't revisit any point.
///
/// Points within `ulps` of one another in both coordinates count as the
/// same point.
fn split_pinches(walk: Vec<Vertex>, ulps: u32) -> Vec<Vec<Vertex>> {
    let mut ret = Vec::new();
    let mut stack: Vec<Vertex> = Vec::with_capacity(walk.len());
    let mut seen: BTreeMap<Point, usize> = BTreeMap::new();
    for v in walk {
        let lo = Point::new(f64::NEG_INFINITY, ulps_step(v.p.y, -i64::from(ulps)));
        let hi = Point::new(f64::INFINITY, ulps_step(v.p.y, i64::from(ulps)));
        let prev = seen
            .range(lo..=hi)
            .find(|(p, _)| ulps_close(p.x, v.p.x, ulps))
            .map(|(_, &i)| i);
        if let Some(prev) = prev {
            let inner = stack.split_off(prev);
            for w in &inner {
                seen.remove(&w.p);
            }
            ret.push(inner);
        }
        seen.insert(v.p, stack.len());
        stack.push(v);
    }
    ret.push(stack);
    ret
}

/// Is `b` unnecessary on the way from `a` to `c`?
fn redundant(a: &Vertex, b: &Vertex, c: &Vertex) -> bool {
    if a.tag.is_some() && a.tag == b.tag {
        return true;
    }
    let [a, b, c] = tame([a.p, b.p, c.p]);
    let (dx0, dy0) = (b.x - a.x, b.y - a.y);
    let (dx1, dy1) = (c.x - b.x, c.y - b.y);
    dx0 * dy1 - dy0 * dx1 == 0.0
}

/// Removes repeated points, and points in the middle of straight lines
/// (including the tips of zero-width spikes).
fn merge_collinear(contour: Vec<Vertex>) -> Vec<Vertex> {
    let mut ret: Vec<Vertex> = Vec::with_capacity(contour.len());
    for v in contour {
        loop {
            let n = ret.len();
            if n >= 1 && ret[n - 1].p == v.p {
                ret.pop();
            } else if n >= 2 && redundant(&ret[n - 2], &ret[n - 1], &v) {
                ret.pop();
            } else {
                break;
            }
        }
        ret.push(v);
    }

    // The contour is closed, so also clean up where it wraps around.
    loop {
        let n = ret.len();
        if n < 3 {
            break;
        }
        if ret[n - 1].p == ret[0].p || redundant(&ret[n - 2], &ret[n - 1], &ret[0]) {
            ret.pop();
        } else if redundant(&ret[n - 1], &ret[0], &ret[1]) {
            ret.remove(0);
        } else {
            break;
        }
    }
    ret
}

#[cfg(test)]
mod tests {
    use kurbo::{PathEl, Shape};

    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64, edge: usize) -> OutEdge {
        OutEdge {
            pts: [p(x0, y0), p(x1, y1)],
            source: Some((EdgeIdx(edge), 0)),
            verb: Verb::Line,
            close_call: false,
        }
    }

    fn out(segs: &[OutEdge]) -> OutEdges {
        let mut ret = OutEdges::default();
        for s in segs {
            ret.push(s.clone());
        }
        ret
    }

    fn points(path: &BezPath) -> Vec<Vec<Point>> {
        let mut ret = Vec::new();
        for el in path.elements() {
            match el {
                PathEl::MoveTo(q) => ret.push(vec![Point::from(*q)]),
                PathEl::LineTo(q) => {
                    if let Some(last) = ret.last_mut() {
                        last.push(Point::from(*q));
                    }
                }
                _ => {}
            }
        }
        ret
    }

    #[test]
    fn rectangle_filled() {
        let out = out(&[seg(0.0, 0.0, 0.0, 3.0, 0), seg(4.0, 0.0, 4.0, 3.0, 1)]);
        let mut events: Vec<TraceEvent> = Vec::new();
        let path = out.assemble(true, &Tolerances::default(), &mut events).unwrap();
        assert_eq!(
            points(&path),
            vec![vec![
                p(0.0, 0.0),
                p(0.0, 3.0),
                p(4.0, 3.0),
                p(4.0, 0.0),
                p(0.0, 0.0)
            ]]
        );
        assert_eq!(path.elements().last(), Some(&PathEl::ClosePath));
        assert_eq!(events, vec![TraceEvent::Contour { points: 4 }]);
    }

    #[test]
    fn rectangle_outline() {
        let mut out = out(&[seg(0.0, 0.0, 0.0, 3.0, 0), seg(4.0, 0.0, 4.0, 3.0, 1)]);
        out.add_horizontal_runs().unwrap();
        assert_eq!(out.len(), 4);
        let horizontal: Vec<_> = out
            .iter()
            .filter(|(_, e)| e.source.is_none())
            .map(|(_, e)| e.pts)
            .collect();
        assert_eq!(
            horizontal,
            vec![[p(0.0, 0.0), p(4.0, 0.0)], [p(0.0, 3.0), p(4.0, 3.0)]]
        );

        let path = out.assemble(false, &Tolerances::default(), &mut ()).unwrap();
        assert_eq!(path.area().abs(), 12.0);
        assert_eq!(points(&path)[0].len(), 5);
    }

    #[test]
    fn continuations_are_merged() {
        // A triangle whose right side was cut into three pieces.
        let out = out(&[
            seg(0.0, 0.0, 0.0, 3.0, 0),
            seg(0.0, 0.0, 1.0, 1.0, 1),
            seg(1.0, 1.0, 2.0, 2.0, 1),
            seg(2.0, 2.0, 3.0, 3.0, 1),
        ]);
        let path = out.assemble(true, &Tolerances::default(), &mut ()).unwrap();
        let pts = points(&path);
        assert_eq!(pts.len(), 1);
        assert_eq!(pts[0].len(), 4);
        assert_eq!(path.area().abs(), 4.5);
    }

    #[test]
    fn pinches_are_split() {
        // Two triangles touching at (1, 1).
        let out = out(&[
            seg(0.0, 0.0, 0.0, 1.0, 0),
            seg(0.0, 1.0, 0.0, 2.0, 0),
            seg(0.0, 0.0, 1.0, 1.0, 1),
            seg(1.0, 1.0, 0.0, 2.0, 2),
            seg(2.0, 0.0, 1.0, 1.0, 3),
            seg(1.0, 1.0, 2.0, 2.0, 4),
            seg(2.0, 0.0, 2.0, 1.0, 5),
            seg(2.0, 1.0, 2.0, 2.0, 5),
        ]);
        let path = out.assemble(true, &Tolerances::default(), &mut ()).unwrap();
        let pts = points(&path);
        assert_eq!(pts.len(), 2);
        for contour in &pts {
            // Three corners, plus the closing point.
            assert_eq!(contour.len(), 4);
        }
        assert_eq!(path.area().abs(), 2.0);
    }

    #[test]
    fn mismatches() {
        let lonely = out(&[seg(0.0, 0.0, 0.0, 3.0, 0)]);
        assert!(matches!(
            lonely.assemble(true, &Tolerances::default(), &mut ()),
            Err(Error::AssemblyMismatch { .. })
        ));
        let mut copy = lonely.clone();
        assert!(matches!(
            copy.add_horizontal_runs(),
            Err(Error::AssemblyMismatch { .. })
        ));

        // Ends at the same height, but not at the same point, can't be
        // joined exactly.
        let apart = out(&[seg(0.0, 0.0, 0.0, 3.0, 0), seg(4.0, 0.0, 4.0, 3.0, 1)]);
        assert!(matches!(
            apart.assemble(false, &Tolerances::default(), &mut ()),
            Err(Error::AssemblyMismatch { .. })
        ));
    }

    #[test]
    fn loose_bridges() {
        let y: f64 = 3.0;
        let nudged = f64::from_bits(y.to_bits() + 3);
        let out = out(&[seg(0.0, 0.0, 0.0, y, 0), seg(4.0, 0.0, 4.0, nudged, 1)]);
        let mut events: Vec<TraceEvent> = Vec::new();
        out.assemble(true, &Tolerances::default(), &mut events)
            .unwrap();
        assert!(events.contains(&TraceEvent::LooseBridge { y0: y, y1: nudged }));

        let strict = Tolerances {
            bridge_ulps: 2,
            ..Tolerances::default()
        };
        assert_eq!(
            out.assemble(true, &strict, &mut ()).unwrap_err(),
            Error::AssemblyMismatch { y0: y, y1: nudged }
        );
    }

    #[test]
    fn nearby_ends_snap() {
        let x = 1.0f64;
        let near = f64::from_bits(x.to_bits() + 3);
        let nearish = f64::from_bits(x.to_bits() + 20);
        let mut out = out(&[
            seg(0.0, 0.0, x, 1.0, 0),
            seg(near, 1.0, 2.0, 2.0, 1),
            seg(5.0, 0.0, nearish, 1.0, 2),
        ]);
        out.snap_ends(&Tolerances::default());
        let pts: Vec<_> = out.iter().map(|(_, e)| e.pts).collect();
        assert_eq!(pts[1][0], p(x, 1.0));
        // Too far for an ordinary end...
        assert_eq!(pts[2][1], p(nearish, 1.0));
        // ...but not for a close call.
        out.edges[OutIdx(2)].close_call = true;
        out.snap_ends(&Tolerances::default());
        assert_eq!(out.edges[OutIdx(2)].pts[1], p(x, 1.0));
        // Different heights never snap.
        assert_eq!(out.edges[OutIdx(0)].pts[0], p(0.0, 0.0));
    }

    #[test]
    fn pinch_splitting() {
        let v = |x: f64, y: f64| Vertex {
            p: p(x, y),
            tag: None,
        };
        let walk = vec![
            v(0.0, 0.0),
            v(1.0, 1.0),
            v(2.0, 0.0),
            v(2.0, 2.0),
            v(1.0, 1.0),
            v(0.0, 2.0),
        ];
        let loops = split_pinches(walk.clone(), 0);
        assert_eq!(
            loops,
            vec![
                vec![v(1.0, 1.0), v(2.0, 0.0), v(2.0, 2.0)],
                vec![v(0.0, 0.0), v(1.0, 1.0), v(0.0, 2.0)],
            ]
        );

        // A revisit that's off by a few ulps is still a revisit, but only
        // within the tolerance.
        let mut nearly = walk;
        nearly[4] = v(1.0 + 2.0 * f64::EPSILON, 1.0 - f64::EPSILON);
        assert_eq!(split_pinches(nearly.clone(), 4).len(), 2);
        assert_eq!(split_pinches(nearly, 1).len(), 1);
    }

    #[test]
    fn spikes_collapse() {
        let v = |x: f64, y: f64| Vertex {
            p: p(x, y),
            tag: None,
        };
        assert!(merge_collinear(vec![v(0.0, 0.0), v(1.0, 1.0), v(2.0, 2.0)]).len() < 3);
        assert_eq!(
            merge_collinear(vec![
                v(0.0, 0.0),
                v(2.0, 0.0),
                v(2.0, 2.0),
                v(2.0, 3.0),
                v(2.0, 2.0),
                v(0.0, 2.0),
                v(0.0, 1.0),
            ]),
            vec![v(0.0, 0.0), v(2.0, 0.0), v(2.0, 2.0), v(0.0, 2.0)]
        );
    }
}
