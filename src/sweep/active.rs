//! Edges crossing the sweep line, and the comparisons used to order them.

use crate::edge::{Edge, EdgeIdx, EdgeVec};
use crate::geom::{tame, Point};
use crate::num::ulps_diff;
use crate::Error;

/// A straight piece of an edge, between two consecutive split points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Span {
    pub above: Point,
    pub below: Point,
}

fn tame_spans(a: &Span, b: &Span) -> (Span, Span) {
    let [a0, a1, b0, b1] = tame([a.above, a.below, b.above, b.below]);
    (
        Span {
            above: a0,
            below: a1,
        },
        Span {
            above: b0,
            below: b1,
        },
    )
}

/// Is `a` to the left of `b`?
///
/// Each span is compared against the other's line at whichever end is
/// higher (for the top) and lower (for the bottom), and the larger of the
/// two signed distances decides. This isn't guaranteed to be transitive for
/// spans that nearly touch, so callers must cope with inconsistent answers.
pub(crate) fn span_less(a: &Span, b: &Span) -> bool {
    let (a, b) = &tame_spans(a, b);
    let mut top = a.above.x - b.above.x;
    if b.above.y < a.above.y {
        top = (b.below.y - b.above.y) * top - (a.above.y - b.above.y) * (b.below.x - b.above.x);
    } else if b.above.y > a.above.y {
        top = (a.below.y - a.above.y) * top + (b.above.y - a.above.y) * (a.below.x - a.above.x);
    }
    let mut bottom = a.below.x - b.below.x;
    if b.below.y > a.below.y {
        bottom =
            (b.below.y - b.above.y) * bottom - (a.below.y - b.below.y) * (b.below.x - b.above.x);
    } else if b.below.y < a.below.y {
        bottom =
            (a.below.y - a.above.y) * bottom + (b.below.y - a.below.y) * (a.below.x - a.above.x);
    }
    let decider = if top.abs() > bottom.abs() { top } else { bottom };
    decider < 0.0
}

/// Are the two spans so nearly collinear that [`span_less`] can't be trusted
/// to order them?
///
/// One endpoint is tested against the other span's line, and the two sides
/// of the cross-product are compared in ULPs.
pub(crate) fn too_close_to_call(a: &Span, b: &Span, ulps: u32) -> bool {
    let (a, b) = &tame_spans(a, b);
    let b_inside_a = (b.above.y - a.above.y > a.below.y - b.above.y && a.below.y < b.below.y)
        || (a.above.y - b.above.y < b.below.y - a.above.y && b.below.y < a.below.y);
    let diff = if b_inside_a {
        let check = if b.below.y <= a.below.y && a.below != b.below {
            b.below
        } else {
            b.above
        };
        ulps_diff(
            (check.y - a.above.y) * (a.below.x - a.above.x),
            (a.below.y - a.above.y) * (check.x - a.above.x),
        )
    } else {
        let check = if a.below.y <= b.below.y && a.below != b.below {
            a.below
        } else {
            a.above
        };
        ulps_diff(
            (b.below.y - b.above.y) * (check.x - b.above.x),
            (check.y - b.above.y) * (b.below.x - b.above.x),
        )
    };
    diff <= u64::from(ulps)
}

/// Is `winding` inside, according to the fill rule's `mask`?
pub(crate) fn inside(winding: i32, mask: i32) -> bool {
    winding & mask != 0
}

/// An edge that crosses the sweep line, together with a cursor pointing at
/// its current span.
#[derive(Clone, Debug)]
pub(crate) struct ActiveEdge {
    pub edge: EdgeIdx,
    pub winding: i32,
    /// The segment of the edge that we're in.
    pub verb: usize,
    // Span `k` of a segment runs from its `k`th to its `k + 1`th split point.
    t_index: usize,
    pub span: Span,
    /// The index (in the sorted sweep line) of the first edge in this edge's
    /// coincident group. Edges that aren't coincident with anything are in a
    /// group of their own.
    pub group: usize,
    /// This edge contributes nothing to the output in the current band.
    pub skip: bool,
    /// This edge was grouped with a neighbor that is close to, but not
    /// exactly the same as, it.
    pub close_call: bool,
    /// We've run off the bottom of the edge.
    pub done: bool,
}

impl ActiveEdge {
    /// Starts at the top span of `edge`.
    pub fn new(edge: EdgeIdx, edges: &EdgeVec<Edge>) -> Result<Self, Error> {
        let mut ret = ActiveEdge {
            edge,
            winding: edges[edge].winding,
            verb: 0,
            t_index: 0,
            span: Span {
                above: edges[edge].points()[0],
                below: edges[edge].points()[0],
            },
            group: 0,
            skip: false,
            close_call: false,
            done: false,
        };
        ret.load_span(edges)?;
        Ok(ret)
    }

    fn load_span(&mut self, edges: &EdgeVec<Edge>) -> Result<(), Error> {
        let e = &edges[self.edge];
        self.span = Span {
            above: e.split_point(self.verb, self.t_index)?,
            below: e.split_point(self.verb, self.t_index + 1)?,
        };
        Ok(())
    }

    /// Moves on to the next span, or marks the edge as done if there isn't one.
    pub fn advance(&mut self, edges: &EdgeVec<Edge>) -> Result<(), Error> {
        let e = &edges[self.edge];
        if self.t_index < e.intercepts()[self.verb].ts().len() {
            self.t_index += 1;
        } else if self.verb + 1 < e.verbs().len() {
            self.verb += 1;
            self.t_index = 0;
        } else {
            self.done = true;
            return Ok(());
        }
        self.load_span(edges)
    }

    /// Advances until the current span reaches strictly below `y`.
    ///
    /// Spans of zero height are skipped along the way.
    pub fn calc_left(&mut self, edges: &EdgeVec<Edge>, y: f64) -> Result<(), Error> {
        while !self.done && self.span.below.y <= y {
            self.advance(edges)?;
        }
        Ok(())
    }

    /// Should this close-call edge trade places with `next`, its right
    /// neighbor?
    ///
    /// `prior` and `wind` are the winding numbers just before and just after
    /// this edge. The shorter edge is moved to where the winding crosses the
    /// fill boundary.
    pub fn swap_close(&self, next: &ActiveEdge, prior: i32, wind: i32, mask: i32) -> bool {
        if !inside(prior, mask) || !inside(wind, mask) {
            return next.span.below.y < self.span.below.y;
        }
        if !inside(wind + next.winding, mask) {
            return self.span.below.y < next.span.below.y;
        }
        false
    }

    /// Should this edge trade places with `next`, which currently occupies
    /// exactly the same span?
    ///
    /// Both edges are walked forward until their spans can be ordered.
    pub fn swap_coincident(
        &self,
        next: &ActiveEdge,
        edges: &EdgeVec<Edge>,
    ) -> Result<bool, Error> {
        let mut this = self.clone();
        let mut other = next.clone();
        loop {
            this.advance(edges)?;
            other.advance(edges)?;
            if this.done || other.done {
                return Ok(false);
            }
            if span_less(&this.span, &other.span) {
                return Ok(false);
            }
            if span_less(&other.span, &this.span) {
                return Ok(true);
            }
        }
    }
}
