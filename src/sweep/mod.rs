//! The sweep-line that decides which pieces of which edges are on the boundary.
//!
//! The sweep moves down the page in bands. A band starts at the current
//! height `y` and ends at the next height where anything interesting
//! happens: an edge starts, or some active edge reaches the end of its
//! current span. Because every crossing was turned into a split point
//! before the sweep started, no two spans cross inside a band. So within a
//! band, the active edges have a well-defined left-to-right order, and
//! adding up their windings from the left tells us which of them separate
//! the inside from the outside.
//!
//! Every emitted segment runs exactly from the top of its band to the
//! bottom, which makes the output easy to stitch back together: all the
//! segment ends that meet at a given height have exactly that height.

mod active;

use active::{inside, span_less, too_close_to_call, ActiveEdge};

use crate::assemble::{OutEdge, OutEdges};
use crate::edge::{Edge, EdgeIdx, EdgeVec};
use crate::geom::point_at_y;
use crate::num::ulps_close;
use crate::trace::{SweepObserver, TraceEvent};
use crate::{Error, Tolerances};

/// Runs the sweep, returning the boundary segments.
///
/// `order` must be the edges sorted by top, as returned by
/// [`sorted_by_top`](crate::edge::sorted_by_top), and all the edges should
/// have had their intersections recorded. `mask` is the fill rule's
/// [winding mask](crate::FillRule::winding_mask).
///
/// If `as_fill` is true, emitted segments must have non-zero height;
/// otherwise they only need to have distinct endpoints.
pub fn sweep(
    edges: &EdgeVec<Edge>,
    order: &[EdgeIdx],
    mask: i32,
    as_fill: bool,
    tolerances: &Tolerances,
    observer: &mut dyn SweepObserver,
) -> Result<OutEdges, Error> {
    let mut out = OutEdges::default();
    let Some(&first) = order.first() else {
        return Ok(out);
    };

    let mut active: Vec<ActiveEdge> = Vec::new();
    let mut next = 0;
    let mut y = edges[first].bounds.top;
    loop {
        while let Some(&idx) = order.get(next) {
            if edges[idx].bounds.top > y {
                break;
            }
            active.push(ActiveEdge::new(idx, edges)?);
            next += 1;
        }
        for a in &mut active {
            a.calc_left(edges, y)?;
        }
        active.retain(|a| !a.done);

        let pending = order.get(next).map(|&idx| edges[idx].bounds.top);
        if active.is_empty() {
            match pending {
                Some(top) => {
                    y = top;
                    continue;
                }
                None => break,
            }
        }
        let bottom = find_bottom(&active, pending);
        // Spans are finite and never go back up, so this only fails if
        // something produced a NaN.
        if bottom.is_nan() || bottom <= y {
            return Err(Error::NaN);
        }
        observer.event(TraceEvent::Band {
            y,
            bottom,
            active: active.len(),
        });

        sort_active(&mut active);
        if group_coincident(&mut active, y, bottom, tolerances) {
            order_coincident(&mut active, edges, mask)?;
        }
        mark_skipped(&mut active, mask, y, observer);

        for a in active.iter().filter(|a| !a.skip) {
            let from = point_at_y(a.span.above, a.span.below, y);
            let to = point_at_y(a.span.above, a.span.below, bottom);
            let degenerate = if as_fill { from.y == to.y } else { from == to };
            if degenerate {
                continue;
            }
            observer.event(TraceEvent::Emit {
                edge: a.edge,
                from,
                to,
            });
            out.push(OutEdge {
                pts: [from, to],
                source: Some((a.edge, a.verb)),
                verb: edges[a.edge].verbs()[a.verb],
                close_call: a.close_call,
            });
        }

        y = bottom;
    }
    Ok(out)
}

/// The bottom of the band starting at the current height: the closest of
/// the next edge to start, and the ends of all the active spans.
fn find_bottom(active: &[ActiveEdge], pending: Option<f64>) -> f64 {
    active
        .iter()
        .map(|a| a.span.below.y)
        .chain(pending)
        .fold(f64::INFINITY, f64::min)
}

/// Sorts the sweep line from left to right.
///
/// [`span_less`] isn't necessarily consistent, so we use an insertion sort
/// (which the standard library's sorts would be entitled to panic on). The
/// sweep line is mostly sorted already from the previous band.
fn sort_active(active: &mut [ActiveEdge]) {
    for i in 1..active.len() {
        let mut j = i;
        while j > 0 && span_less(&active[j].span, &active[j - 1].span) {
            active.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// Groups runs of neighboring edges that are coincident (or too close to
/// tell apart). Returns true if there were any such groups.
///
/// Spans that are too close to call must also be close at both the top and
/// the bottom of the band, which rules out pairs that only meet at a
/// (slightly misrounded) crossing.
fn group_coincident(
    active: &mut [ActiveEdge],
    y: f64,
    bottom: f64,
    tolerances: &Tolerances,
) -> bool {
    let ulps = tolerances.close_call_ulps;
    let x_at = |a: &ActiveEdge, h: f64| point_at_y(a.span.above, a.span.below, h).x;
    for a in active.iter_mut() {
        a.skip = false;
        a.close_call = false;
    }
    let mut found = false;
    let mut first = 0;
    for i in 0..active.len() {
        active[i].group = first;
        if i + 1 == active.len() {
            break;
        }
        let (a, b) = (&active[i], &active[i + 1]);
        let identical = a.span == b.span;
        let close = !identical
            && too_close_to_call(&a.span, &b.span, ulps)
            && ulps_close(x_at(a, y), x_at(b, y), ulps)
            && ulps_close(x_at(a, bottom), x_at(b, bottom), ulps);
        if identical || close {
            found = true;
            active[i].close_call |= close;
            active[i + 1].close_call |= close;
        } else {
            first = i + 1;
        }
    }
    found
}

/// Fixes up the order within each coincident group, so that the edge that
/// ends up representing the group is the one that best tracks the boundary.
fn order_coincident(
    active: &mut [ActiveEdge],
    edges: &EdgeVec<Edge>,
    mask: i32,
) -> Result<(), Error> {
    let mut winding = 0;
    for i in 1..active.len() {
        let prior = winding;
        winding += active[i - 1].winding;
        if active[i - 1].group != active[i].group {
            continue;
        }
        let swap = if active[i - 1].close_call {
            active[i - 1].swap_close(&active[i], prior, winding, mask)
        } else {
            active[i - 1].swap_coincident(&active[i], edges)?
        };
        if swap {
            winding -= active[i - 1].winding;
            active.swap(i - 1, i);
            winding += active[i - 1].winding;
        }
    }
    Ok(())
}

/// Decides which edges contribute to the output in the current band.
///
/// A lone edge contributes if the inside-ness changes across it. A
/// coincident group contributes at most one of its edges: the outermost one,
/// and only if the inside-ness changes across the whole group.
fn mark_skipped(active: &mut [ActiveEdge], mask: i32, y: f64, observer: &mut dyn SweepObserver) {
    let mut winding = 0;
    let mut start = 0;
    while start < active.len() {
        let group = active[start].group;
        let end = start
            + active[start..]
                .iter()
                .take_while(|a| a.group == group)
                .count();
        let before = winding;
        winding += active[start..end].iter().map(|a| a.winding).sum::<i32>();
        let boundary = inside(before, mask) != inside(winding, mask);

        if end - start == 1 {
            active[start].skip = !boundary;
        } else {
            for a in &mut active[start..end] {
                a.skip = true;
            }
            let kept = boundary.then(|| if before != 0 { end - 1 } else { start });
            if let Some(k) = kept {
                active[k].skip = false;
            }
            observer.event(TraceEvent::CoincidentGroup {
                y,
                kept: kept.map(|k| active[k].edge),
                len: end - start,
                close_call: active[start..end].iter().any(|a| a.close_call),
            });
        }
        start = end;
    }
}

#[cfg(test)]
mod tests {
    use kurbo::BezPath;

    use super::*;
    use crate::edge::{build_edges, sorted_by_top, Verb};
    use crate::geom::Point;
    use crate::intersect::{bind_horizontals, intersect_edges};
    use crate::FillRule;

    fn polygon(path: &mut BezPath, points: &[(f64, f64)]) {
        path.move_to(points[0]);
        for &p in &points[1..] {
            path.line_to(p);
        }
        path.close_path();
    }

    fn run(path: &BezPath, fill_rule: FillRule) -> (Vec<OutEdge>, Vec<TraceEvent>) {
        let built = build_edges(path).unwrap();
        let mut edges = built.edges;
        let order = sorted_by_top(&edges);
        let tol = Tolerances::default();
        bind_horizontals(&mut edges, &order, &built.horizontals, &tol).unwrap();
        intersect_edges(&mut edges, &order, &tol).unwrap();
        let mut events: Vec<TraceEvent> = Vec::new();
        let out = sweep(
            &edges,
            &order,
            fill_rule.winding_mask(),
            true,
            &tol,
            &mut events,
        )
        .unwrap();
        (out.iter().map(|(_, e)| e.clone()).collect(), events)
    }

    fn pts(out: &[OutEdge]) -> Vec<[Point; 2]> {
        let mut ret: Vec<_> = out.iter().map(|e| e.pts).collect();
        ret.sort();
        ret
    }

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn rectangle() {
        let mut path = BezPath::new();
        polygon(&mut path, &[(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 3.0)]);
        let (out, _) = run(&path, FillRule::NonZero);
        assert_eq!(
            pts(&out),
            vec![[p(0.0, 0.0), p(0.0, 3.0)], [p(4.0, 0.0), p(4.0, 3.0)]]
        );
    }

    #[test]
    fn bowtie_is_split_at_the_crossing() {
        let mut path = BezPath::new();
        polygon(&mut path, &[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]);
        let (out, events) = run(&path, FillRule::EvenOdd);
        assert_eq!(out.len(), 8);
        let bands: Vec<_> = events
            .iter()
            .filter_map(|ev| match ev {
                TraceEvent::Band { y, bottom, .. } => Some((*y, *bottom)),
                _ => None,
            })
            .collect();
        assert_eq!(bands, vec![(0.0, 1.0), (1.0, 2.0)]);
        // Every output segment fits exactly in one band.
        for e in &out {
            assert!(e.pts[0].y == 0.0 || e.pts[0].y == 1.0);
            assert_eq!(e.pts[1].y - e.pts[0].y, 1.0);
        }
    }

    #[test]
    fn duplicate_rectangles() {
        let mut path = BezPath::new();
        polygon(&mut path, &[(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 3.0)]);
        polygon(&mut path, &[(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 3.0)]);

        let (out, events) = run(&path, FillRule::NonZero);
        assert_eq!(
            pts(&out),
            vec![[p(0.0, 0.0), p(0.0, 3.0)], [p(4.0, 0.0), p(4.0, 3.0)]]
        );
        // Exactly coincident isn't a close call.
        assert!(out.iter().all(|e| e.verb == Verb::Line && !e.close_call));
        let groups = events
            .iter()
            .filter(|ev| {
                matches!(
                    ev,
                    TraceEvent::CoincidentGroup {
                        len: 2,
                        kept: Some(_),
                        close_call: false,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(groups, 2);

        // Under even-odd, the two copies cancel out.
        let (out, _) = run(&path, FillRule::EvenOdd);
        assert!(out.is_empty());
    }

    #[test]
    fn nested_squares() {
        let mut path = BezPath::new();
        polygon(&mut path, &[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        polygon(&mut path, &[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);

        // Same orientation: the inner square is swallowed under non-zero...
        let (out, _) = run(&path, FillRule::NonZero);
        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|e| e.pts[0].x == 0.0 || e.pts[0].x == 4.0));

        // ...but makes a hole under even-odd.
        let (out, _) = run(&path, FillRule::EvenOdd);
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn empty() {
        let (out, events) = run(&BezPath::new(), FillRule::NonZero);
        assert!(out.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn insertion_sort_copes() {
        let mut path = BezPath::new();
        polygon(&mut path, &[(0.0, 0.0), (1.0, 3.0), (-1.0, 3.0)]);
        polygon(&mut path, &[(5.0, 0.0), (6.0, 3.0), (4.0, 3.0)]);
        let built = build_edges(&path).unwrap();
        let mut active: Vec<_> = built
            .edges
            .indices()
            .rev()
            .map(|e| ActiveEdge::new(e, &built.edges).unwrap())
            .collect();
        sort_active(&mut active);
        let xs: Vec<_> = active.iter().map(|a| a.span.below.x).collect();
        assert_eq!(xs, vec![-1.0, 1.0, 4.0, 6.0]);
    }
}
