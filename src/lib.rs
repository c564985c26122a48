#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod typed_vec;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
pub mod assemble;
pub mod edge;
mod geom;
pub mod intersect;
mod num;
mod options;
pub mod sweep;
pub mod trace;

#[cfg(feature = "generators")]
pub mod generators;

use kurbo::{BezPath, PathEl};

pub use geom::{Bounds, Point};
pub use options::{SimplifyOptions, Tolerances};
pub use trace::{LogObserver, SweepObserver, TraceEvent};

/// A fill rule tells us how to decide whether a point is "inside" a path.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FillRule {
    /// The point is "inside" if its winding number is odd.
    EvenOdd,
    /// The point is "inside" if its winding number is non-zero.
    NonZero,
}

impl FillRule {
    /// The bits of a winding number that decide whether it's inside.
    ///
    /// A winding number `w` is inside if `w & mask != 0`.
    pub fn winding_mask(self) -> i32 {
        match self {
            FillRule::EvenOdd => 1,
            FillRule::NonZero => -1,
        }
    }
}

/// A path, together with the rule that decides which points it fills.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FilledPath {
    /// The path's outline.
    pub path: BezPath,
    /// How `path` decides what's inside.
    pub fill_rule: FillRule,
}

impl FilledPath {
    /// Wraps a path and its fill rule.
    pub fn new(path: BezPath, fill_rule: FillRule) -> Self {
        FilledPath { path, fill_rule }
    }
}

/// Something went wrong while simplifying a path.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// At least one of the inputs was infinite.
    #[error("one of the inputs was infinite")]
    Infinity,
    /// At least one of the inputs was not a number.
    #[error("one of the inputs had a NaN")]
    NaN,
    /// The path drew something before its first move-to, or an edge ended up
    /// holding a close command.
    #[error("the path is malformed: it draws before moving to a start point")]
    MalformedPath,
    /// A quadratic or cubic segment needed to be evaluated, split or intersected.
    #[error("curved segments cannot be intersected or split; flatten the path first")]
    UnsupportedCurve,
    /// The requested flattening tolerance was not a positive, finite number.
    #[error("invalid flattening tolerance {0}")]
    InvalidFlattenTolerance(f64),
    /// Two output segments that should meet ended at different heights.
    #[error("output segments ending at heights {y0} and {y1} could not be joined")]
    AssemblyMismatch {
        /// The height of one end.
        y0: f64,
        /// The height of the other end.
        y1: f64,
    },
}

/// Simplifies a path into non-overlapping, non-self-intersecting contours.
///
/// The output covers the same points as `path` does under its own fill rule,
/// and is always even-odd filled. It contains only move, line and close
/// commands.
///
/// If `as_fill` is false, the outline is assembled with every horizontal
/// run as an explicit segment and only exactly-matching endpoints are
/// joined; otherwise nearby endpoints at the same height are connected by
/// position.
pub fn simplify(path: &FilledPath, as_fill: bool) -> Result<FilledPath, Error> {
    simplify_with_options(path, as_fill, &SimplifyOptions::default())
}

/// Like [`simplify`], but with configurable tolerances.
///
/// If `options.trace` is set, the sweep is traced to the [`log`] crate at
/// `trace` and `debug` levels.
pub fn simplify_with_options(
    path: &FilledPath,
    as_fill: bool,
    options: &SimplifyOptions,
) -> Result<FilledPath, Error> {
    if options.trace {
        simplify_with(path, as_fill, options, &mut LogObserver)
    } else {
        simplify_with(path, as_fill, options, &mut ())
    }
}

/// Like [`simplify`], but reporting progress to `observer`.
pub fn simplify_with(
    path: &FilledPath,
    as_fill: bool,
    options: &SimplifyOptions,
    observer: &mut dyn SweepObserver,
) -> Result<FilledPath, Error> {
    check_finite(&path.path)?;

    let flattened;
    let input = match options.flatten_tolerance {
        Some(tolerance) => {
            if !(tolerance > 0.0 && tolerance.is_finite()) {
                return Err(Error::InvalidFlattenTolerance(tolerance));
            }
            flattened = flatten(&path.path, tolerance)?;
            &flattened
        }
        None => &path.path,
    };

    let tolerances = &options.tolerances;
    let edge::BuiltEdges {
        mut edges,
        horizontals,
    } = edge::build_edges(input)?;
    for (idx, e) in edges.iter() {
        observer.event(TraceEvent::EdgeBuilt {
            edge: idx,
            winding: e.winding,
            verbs: e.verbs().len(),
            bounds: e.bounds,
        });
    }

    let order = edge::sorted_by_top(&edges);
    intersect::bind_horizontals(&mut edges, &order, &horizontals, tolerances)?;
    intersect::intersect_edges(&mut edges, &order, tolerances)?;
    for (idx, e) in edges.iter() {
        if e.contains_intercepts() {
            observer.event(TraceEvent::Intercepts {
                edge: idx,
                interior: e.intercepts().iter().map(|i| i.ts().len()).sum(),
                at_top: e.intercepts().iter().map(|i| i.top_count()).sum(),
                at_bottom: e.intercepts().iter().map(|i| i.bottom_count()).sum(),
            });
        }
    }

    let mask = path.fill_rule.winding_mask();
    let mut out = sweep::sweep(&edges, &order, mask, as_fill, tolerances, observer)?;
    out.snap_ends(tolerances);
    if !as_fill {
        out.add_horizontal_runs()?;
    }
    let path = out.assemble(as_fill, tolerances, observer)?;
    Ok(FilledPath {
        path,
        fill_rule: FillRule::EvenOdd,
    })
}

fn check_finite(path: &BezPath) -> Result<(), Error> {
    let check = |p: &kurbo::Point| {
        if p.x.is_nan() || p.y.is_nan() {
            Err(Error::NaN)
        } else if p.x.is_infinite() || p.y.is_infinite() {
            Err(Error::Infinity)
        } else {
            Ok(())
        }
    };
    for el in path.elements() {
        match el {
            PathEl::MoveTo(p0) | PathEl::LineTo(p0) => check(p0)?,
            PathEl::QuadTo(p0, p1) => {
                check(p0)?;
                check(p1)?;
            }
            PathEl::CurveTo(p0, p1, p2) => {
                check(p0)?;
                check(p1)?;
                check(p2)?;
            }
            PathEl::ClosePath => {}
        }
    }
    Ok(())
}

fn flatten(path: &BezPath, tolerance: f64) -> Result<BezPath, Error> {
    // kurbo's flattener assumes a leading move-to, so check for it first.
    if matches!(
        path.elements().first(),
        Some(PathEl::LineTo(_) | PathEl::QuadTo(..) | PathEl::CurveTo(..) | PathEl::ClosePath)
    ) {
        return Err(Error::MalformedPath);
    }
    let mut ret = BezPath::new();
    kurbo::flatten(path.iter(), tolerance, |el| ret.push(el));
    Ok(ret)
}
