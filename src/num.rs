//! Float ordering and ULP-distance helpers.

/// A wrapper for `f64` that implements `Ord`.
///
/// Unlike the more principled wrappers in the `ordered_float` crate, this one
/// doesn't guard against NaN on construction. Inputs are checked for NaN
/// before any sweep starts, so everything we wrap is comparable.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CheapOrderedFloat(f64);

impl From<f64> for CheapOrderedFloat {
    fn from(value: f64) -> Self {
        debug_assert!(!value.is_nan());
        CheapOrderedFloat(value)
    }
}

// Now comes the fishy stuff.
impl Eq for CheapOrderedFloat {}

impl PartialOrd for CheapOrderedFloat {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CheapOrderedFloat {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if self.0 < other.0 {
            std::cmp::Ordering::Less
        } else if self.0 > other.0 {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    }
}

/// Maps a float onto an integer line on which adjacent floats are adjacent
/// integers. Both zeros map to zero.
fn ulps_key(x: f64) -> i64 {
    let bits = x.to_bits() as i64;
    if bits < 0 {
        // Sign-magnitude to two's complement.
        i64::MIN.wrapping_sub(bits)
    } else {
        bits
    }
}

/// The float `n` representable values away from `x`, stopping at the
/// infinities.
pub fn ulps_step(x: f64, n: i64) -> f64 {
    let lo = ulps_key(f64::NEG_INFINITY);
    let hi = ulps_key(f64::INFINITY);
    let key = ulps_key(x).saturating_add(n).clamp(lo, hi);
    let bits = if key < 0 {
        i64::MIN.wrapping_sub(key)
    } else {
        key
    };
    f64::from_bits(bits as u64)
}

/// The number of representable `f64`s between `a` and `b`.
///
/// Saturates instead of overflowing, so values of wildly different magnitude
/// (or of different signs) just report a huge distance.
pub fn ulps_diff(a: f64, b: f64) -> u64 {
    ulps_key(a).abs_diff(ulps_key(b))
}

/// Are `a` and `b` within `ulps` representable values of one another?
pub fn ulps_close(a: f64, b: f64, ulps: u32) -> bool {
    ulps_diff(a, b) <= u64::from(ulps)
}
