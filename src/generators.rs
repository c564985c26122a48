//! Utilities for generating examples, benchmarks, and test cases.

use kurbo::BezPath;

/// Appends a closed polygon to `path`.
fn polygon(path: &mut BezPath, points: &[(f64, f64)]) {
    let Some((&first, rest)) = points.split_first() else {
        return;
    };
    path.move_to(first);
    for &p in rest {
        path.line_to(p);
    }
    path.close_path();
}

/// Adds a bunch of squares, arranged in a grid.
///
/// The top-left of the first square is at (x0, y0). Each square has size `size
/// x size`, and the distance between squares (both horizontally and vertically)
/// is `offset`.
///
/// If `slant` is non-zero, adds parallelograms instead of squares: the
/// right-hand side of each square gets translated down by `slant`.
fn squares(
    path: &mut BezPath,
    (x0, y0): (f64, f64),
    size: f64,
    offset: f64,
    slant: f64,
    count: usize,
) {
    for i in 0..count {
        let x = x0 + i as f64 * offset;
        for j in 0..count {
            let y = y0 + j as f64 * offset;
            polygon(
                path,
                &[
                    (x, y),
                    (x, y + size),
                    (x + size, y + size + slant),
                    (x + size, y + slant),
                ],
            );
        }
    }
}

/// Generate an `n` by `n` checkerboard-like pattern with overlapping squares.
/// For `n = 3`, it looks like:
///
/// ```text
/// ┌────┐ ┌────┐ ┌────┐
/// │    │ │    │ │    │
/// │  ┌─┼─┼─┐┌─┼─┼─┐  │
/// └──┼─┘ └─┼┼─┘ └─┼──┘
/// ┌──┼─┐ ┌─┼┼─┐ ┌─┼──┐
/// │  └─┼─┼─┘└─┼─┼─┘  │
/// │  ┌─┼─┼─┐┌─┼─┼─┐  │
/// └──┼─┘ └─┼┼─┘ └─┼──┘
/// ┌──┼─┐ ┌─┼┼─┐ ┌─┼──┐
/// │  └─┼─┼─┘└─┼─┼─┘  │
/// │    │ │    │ │    │
/// └────┘ └────┘ └────┘
/// ```
///
/// All the squares go the same way around, so under the non-zero rule the
/// result is their union.
pub fn checkerboard(n: usize) -> BezPath {
    let mut ret = BezPath::new();
    squares(&mut ret, (0.0, 0.0), 30.0, 40.0, 0.0, n);
    squares(&mut ret, (20.0, 20.0), 30.0, 40.0, 0.0, n.saturating_sub(1));
    ret
}

/// Like `checkerboard`, but with no exactly-horizontal lines.
///
/// Every square becomes a parallelogram, so every band of the sweep has
/// edges crossing each other.
pub fn slanted_checkerboard(n: usize) -> BezPath {
    let mut ret = BezPath::new();
    squares(&mut ret, (0.0, 0.0), 30.0, 40.0, 1.0, n);
    squares(&mut ret, (20.0, 20.0), 30.0, 40.0, 1.0, n.saturating_sub(1));
    ret
}

/// Long, skinny parallelograms: `n` of them going from top-left to
/// bottom-right, crossed by `n` going from top-right to bottom-left.
pub fn slanties(n: usize) -> BezPath {
    let h = 20.0 * n as f64;
    let mut ret = BezPath::new();
    for i in 0..n {
        let x_off = 20.0 * i as f64;
        polygon(
            &mut ret,
            &[
                (x_off, 0.0),
                (x_off + h, h),
                (x_off + h + 10.0, h),
                (x_off + 10.0, 0.0),
            ],
        );
        polygon(
            &mut ret,
            &[
                (x_off + h, 0.0),
                (x_off, h),
                (x_off + 10.0, h),
                (x_off + h + 10.0, 0.0),
            ],
        );
    }
    ret
}
