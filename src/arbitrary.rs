//! Utilities for fuzz and/or property testing using `arbitrary`.

use arbitrary::Unstructured;
use kurbo::{BezPath, Point};

use crate::{FillRule, FilledPath};

/// Generate an arbitrary float in some range.
pub fn float_in_range(
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let num: u32 = u.arbitrary()?;
    let t = num as f64 / u32::MAX as f64;
    Ok((1.0 - t) * start + t * end)
}

/// Generate a float in some range, but give it a chance to be close to another float.
fn another_float_in_range(
    orig: f64,
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let close: bool = u.arbitrary()?;
    if close {
        let ulps: i32 = u.int_in_range(-32..=32)?;
        let scale = 1.0f64 + ulps as f64 * f64::EPSILON;
        Ok((orig * scale).clamp(start, end))
    } else {
        float_in_range(start, end, u)
    }
}

/// Generate a point whose coordinates are at most `size` in absolute value.
///
/// Half the time the coordinates are snapped to integers, to make
/// horizontal and vertical lines (and exactly shared points) likely.
pub fn point(size: f64, u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    let snap: bool = u.arbitrary()?;
    let x = float_in_range(-size, size, u)?;
    let y = float_in_range(-size, size, u)?;
    if snap {
        Ok(Point::new(x.round(), y.round()))
    } else {
        Ok(Point::new(x, y))
    }
}

/// Generate a point that has a good chance of being on top of, or very
/// close to, one of `prev`.
fn another_point(
    size: f64,
    prev: &[Point],
    u: &mut Unstructured<'_>,
) -> Result<Point, arbitrary::Error> {
    if prev.is_empty() || !u.arbitrary::<bool>()? {
        return point(size, u);
    }
    let orig = *u.choose(prev)?;
    let exact: bool = u.arbitrary()?;
    if exact {
        Ok(orig)
    } else {
        Ok(Point::new(
            another_float_in_range(orig.x, -size, size, u)?,
            another_float_in_range(orig.y, -size, size, u)?,
        ))
    }
}

/// Generate an arbitrary path made of closed polygons.
///
/// The polygons tend to share points with each other, so the sweep sees
/// plenty of coincident and almost-coincident edges.
pub fn polygons(size: f64, u: &mut Unstructured<'_>) -> Result<BezPath, arbitrary::Error> {
    let count = u.int_in_range(1..=4)?;
    let mut all: Vec<Point> = Vec::new();
    let mut ret = BezPath::new();
    for _ in 0..count {
        let len = u.int_in_range(3..=8)?;
        let start = another_point(size, &all, u)?;
        ret.move_to(start);
        all.push(start);
        for _ in 1..len {
            let p = another_point(size, &all, u)?;
            ret.line_to(p);
            all.push(p);
        }
        ret.close_path();
    }
    Ok(ret)
}

/// Generate an arbitrary fill rule.
pub fn fill_rule(u: &mut Unstructured<'_>) -> Result<FillRule, arbitrary::Error> {
    Ok(if u.arbitrary()? {
        FillRule::EvenOdd
    } else {
        FillRule::NonZero
    })
}

/// Generate an arbitrary filled path.
pub fn filled_path(size: f64, u: &mut Unstructured<'_>) -> Result<FilledPath, arbitrary::Error> {
    Ok(FilledPath::new(polygons(size, u)?, fill_rule(u)?))
}
