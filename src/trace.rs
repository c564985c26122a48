//! Observing the simplifier as it runs.
//!
//! The sweep's comparison and bookkeeping code never logs by itself. Instead,
//! the interesting steps are reported as [`TraceEvent`]s to a
//! [`SweepObserver`] chosen by the caller: `()` ignores everything, a
//! `Vec<TraceEvent>` collects everything, and [`LogObserver`] forwards to
//! the [`log`] crate.

use crate::edge::EdgeIdx;
use crate::geom::{Bounds, Point};

/// Something that happened while simplifying a path.
#[derive(Clone, Debug, PartialEq)]
pub enum TraceEvent {
    /// The edge builder finished an edge.
    EdgeBuilt {
        /// The new edge.
        edge: EdgeIdx,
        /// `1` if the edge runs down the page in the input, `-1` if it runs up.
        winding: i32,
        /// How many segments the edge has.
        verbs: usize,
        /// The edge's bounding box.
        bounds: Bounds,
    },
    /// After intersection, an edge had intersections recorded on it.
    Intercepts {
        /// The edge.
        edge: EdgeIdx,
        /// The number of split points strictly inside its segments.
        interior: usize,
        /// The number of intersections landing on the start of a segment.
        at_top: u32,
        /// The number of intersections landing on the end of a segment.
        at_bottom: u32,
    },
    /// The sweep is about to process the horizontal band from `y` to `bottom`.
    Band {
        /// The top of the band.
        y: f64,
        /// The bottom of the band.
        bottom: f64,
        /// How many edges cross the band.
        active: usize,
    },
    /// Some adjacent edges were found to coincide within the current band.
    CoincidentGroup {
        /// The top of the band.
        y: f64,
        /// The edge that was kept (if the group is on the boundary).
        kept: Option<EdgeIdx>,
        /// The number of edges in the group.
        len: usize,
        /// Were any of the edges merely close, rather than identical?
        close_call: bool,
    },
    /// An output segment was emitted.
    Emit {
        /// The edge it came from.
        edge: EdgeIdx,
        /// The top of the output segment.
        from: Point,
        /// The bottom of the output segment.
        to: Point,
    },
    /// Two output endpoints were joined even though they're at slightly different heights.
    LooseBridge {
        /// The height of one endpoint.
        y0: f64,
        /// The height of the other endpoint.
        y1: f64,
    },
    /// A closed contour was written to the output.
    Contour {
        /// The number of distinct points in the contour.
        points: usize,
    },
}

/// Receives [`TraceEvent`]s.
pub trait SweepObserver {
    /// Called for every event, in the order they happen.
    fn event(&mut self, event: TraceEvent);
}

/// Ignores all events.
impl SweepObserver for () {
    fn event(&mut self, _event: TraceEvent) {}
}

/// Collects all events.
impl SweepObserver for Vec<TraceEvent> {
    fn event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// Writes events to the [`log`] crate.
///
/// Near-misses while joining output segments are logged at `debug` level;
/// everything else at `trace` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl SweepObserver for LogObserver {
    fn event(&mut self, event: TraceEvent) {
        match event {
            TraceEvent::LooseBridge { y0, y1 } => {
                log::debug!("joined output segments at different heights {y0:?} and {y1:?}")
            }
            TraceEvent::EdgeBuilt {
                edge,
                winding,
                verbs,
                bounds,
            } => log::trace!("built {edge:?}: winding {winding}, {verbs} segments, {bounds:?}"),
            TraceEvent::Intercepts {
                edge,
                interior,
                at_top,
                at_bottom,
            } => log::trace!(
                "{edge:?} has {interior} split points ({at_top} at tops, {at_bottom} at bottoms)"
            ),
            TraceEvent::Band { y, bottom, active } => {
                log::trace!("band {y:?}..{bottom:?} with {active} active edges")
            }
            TraceEvent::CoincidentGroup {
                y,
                kept,
                len,
                close_call,
            } => log::trace!(
                "at {y:?}, {len} coincident edges (close call: {close_call}), keeping {kept:?}"
            ),
            TraceEvent::Emit { edge, from, to } => log::trace!("{edge:?} emits {from:?} -> {to:?}"),
            TraceEvent::Contour { points } => log::trace!("contour with {points} points"),
        }
    }
}
