//! Finding every place where edges need to be split.
//!
//! After this phase, every point at which an edge crosses another edge (or a
//! horizontal run of the input) is recorded as a split point on the edges
//! involved. The sweep can then treat each edge as a sequence of straight
//! pieces that only meet other edges at their ends.

use crate::edge::{Edge, EdgeIdx, EdgeVec, HorizontalEdge};
use crate::geom::{horizontal_intersect, intersect_lines, lerp, Point};
use crate::{Error, Tolerances};

/// Splits every edge that crosses one of the horizontal runs.
///
/// `order` must be the edges sorted by top, as returned by
/// [`sorted_by_top`](crate::edge::sorted_by_top), and `horizontals` must be
/// sorted by height.
pub fn bind_horizontals(
    edges: &mut EdgeVec<Edge>,
    order: &[EdgeIdx],
    horizontals: &[HorizontalEdge],
    tolerances: &Tolerances,
) -> Result<(), Error> {
    let mut hits = Vec::new();
    for group in horizontals.chunk_by(|h0, h1| h0.y == h1.y) {
        let y = group[0].y;
        let left = group.iter().map(|h| h.left).fold(f64::INFINITY, f64::min);
        let right = group.iter().map(|h| h.right).fold(f64::NEG_INFINITY, f64::max);

        // Only edges starting strictly above the runs can cross them.
        let candidates = order.partition_point(|&e| edges[e].bounds.top < y);
        for &idx in &order[..candidates] {
            let edge = &edges[idx];
            if edge.bounds.bottom <= y || edge.bounds.right < left || edge.bounds.left > right {
                continue;
            }
            for verb in 0..edge.verbs().len() {
                let b = edge.verb_bounds(verb);
                if y <= b.top || y >= b.bottom {
                    continue;
                }
                let (p0, p1) = edge.line(verb)?;
                for h in group {
                    if let Some(t) = horizontal_intersect(p0, p1, h.left, h.right, y) {
                        // The split must be at exactly the run's height.
                        let p = Point { x: lerp(p0, p1, t).x, y };
                        hits.push((idx, verb, t, p));
                    }
                }
            }
        }
    }

    for (idx, verb, t, p) in hits {
        edges[idx].split(verb, t, p, tolerances.min_t_delta)?;
    }
    Ok(())
}

/// Intersects every pair of edges whose bounding boxes overlap, recording
/// the intersections as split points on both edges.
///
/// `order` must be the edges sorted by top, as returned by
/// [`sorted_by_top`](crate::edge::sorted_by_top).
pub fn intersect_edges(
    edges: &mut EdgeVec<Edge>,
    order: &[EdgeIdx],
    tolerances: &Tolerances,
) -> Result<(), Error> {
    // The edges that are alive at the current height.
    let mut window: Vec<EdgeIdx> = Vec::new();
    let mut next = 0;
    while let Some(&first) = order.get(next) {
        let y = edges[first].bounds.top;
        while let Some(&idx) = order.get(next) {
            if edges[idx].bounds.top > y {
                break;
            }
            window.push(idx);
            next += 1;
        }
        window.retain(|&idx| edges[idx].bounds.bottom > y);

        for (i, &a) in window.iter().enumerate() {
            for &b in &window[(i + 1)..] {
                if !edges[a].bounds.overlaps(&edges[b].bounds) || edges[a].cached(b) {
                    continue;
                }
                edges[b].cached(a);
                intersect_pair(edges, a, b, tolerances)?;
            }
        }
    }
    Ok(())
}

/// Intersects two edges, walking down both of them at once.
fn intersect_pair(
    edges: &mut EdgeVec<Edge>,
    a: EdgeIdx,
    b: EdgeIdx,
    tolerances: &Tolerances,
) -> Result<(), Error> {
    let mut hits = Vec::new();
    let (edge_a, edge_b) = (&edges[a], &edges[b]);
    let (mut i, mut j) = (0, 0);
    while i < edge_a.verbs().len() && j < edge_b.verbs().len() {
        let bounds_a = edge_a.verb_bounds(i);
        let bounds_b = edge_b.verb_bounds(j);
        if bounds_a.overlaps(&bounds_b) {
            let (a0, a1) = edge_a.line(i)?;
            let (b0, b1) = edge_b.line(j)?;
            for (t, u) in intersect_lines(a0, a1, b0, b1) {
                let p = crossing_point((a0, a1, t), (b0, b1, u), tolerances.min_t_delta);
                hits.push((i, t, j, u, p));
            }
        }
        // Step past whichever segment ends first. If they end together, the
        // next segments can only touch the current ones at their ends.
        if bounds_a.bottom <= bounds_b.bottom {
            i += 1;
        }
        if bounds_b.bottom <= bounds_a.bottom {
            j += 1;
        }
    }

    // Both edges get split at the same point: whichever one `a` actually
    // used.
    for (i, t, j, u, p) in hits {
        if let Some(p) = edges[a].split(i, t, p, tolerances.min_t_delta)? {
            edges[b].split(j, u, p, tolerances.min_t_delta)?;
        }
    }
    Ok(())
}

/// The point where two segments cross, given the crossing's parameter along
/// each of them.
///
/// Crossings at (or very near) an endpoint of either segment are snapped to
/// that endpoint. Otherwise the point is computed along the first segment
/// and then clamped to both segments' boxes.
fn crossing_point(
    (a0, a1, t): (Point, Point, f64),
    (b0, b1, u): (Point, Point, f64),
    min_delta: f64,
) -> Point {
    if t <= min_delta {
        return a0;
    }
    if t >= 1.0 - min_delta {
        return a1;
    }
    if u <= min_delta {
        return b0;
    }
    if u >= 1.0 - min_delta {
        return b1;
    }
    let p = lerp(a0, a1, t);
    let clamp = |v: f64, (a, b): (f64, f64), (c, d): (f64, f64)| {
        let lo = a.min(b).max(c.min(d));
        let hi = a.max(b).min(c.max(d));
        if lo <= hi {
            v.clamp(lo, hi)
        } else {
            v
        }
    };
    Point {
        x: clamp(p.x, (a0.x, a1.x), (b0.x, b1.x)),
        y: clamp(p.y, (a0.y, a1.y), (b0.y, b1.y)),
    }
}
