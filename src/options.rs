//! Runtime knobs for the simplifier.

/// Numerical tolerances used by the sweep and by contour assembly.
///
/// The ULP counts measure distance in representable `f64`s, so they scale
/// with the magnitude of the coordinates involved.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Two adjacent sweep spans whose collinearity test differs by at most
    /// this many ULPs are treated as one coincident span.
    pub close_call_ulps: u32,
    /// Output endpoints this close in both coordinates are joined without an
    /// extra connecting segment.
    pub gap_ulps: u32,
    /// Bridged output endpoints may differ in height by at most this many
    /// ULPs before assembly gives up with [`Error::AssemblyMismatch`](crate::Error::AssemblyMismatch).
    pub bridge_ulps: u32,
    /// Bridged output endpoints that differ in height by more than this are
    /// reported to the observer, but still joined.
    pub strict_bridge_ulps: u32,
    /// Intersection parameters closer than this to each other (or to the
    /// ends of a segment) are merged.
    pub min_t_delta: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            close_call_ulps: 32,
            gap_ulps: 10,
            bridge_ulps: 10,
            strict_bridge_ulps: 1,
            min_t_delta: 1e-12,
        }
    }
}

/// Options for [`simplify_with_options`](crate::simplify_with_options).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SimplifyOptions {
    /// Send a trace of the sweep to the `log` crate.
    pub trace: bool,
    /// If set, curves are flattened to lines with this accuracy before
    /// simplifying. Otherwise, paths containing curves are rejected.
    pub flatten_tolerance: Option<f64>,
    /// Numerical tolerances.
    pub tolerances: Tolerances,
}
