//! Bounded comparison helpers.
//!
//! These use `<` as the only ordering primitive, so they work for any
//! [`PartialOrd`] type, including `f32` where `Ord` is not available.
//!
//! # Example
//!
//! ```rust
//! use rs_roaster::clamp::{clamp, max, min};
//!
//! assert_eq!(min(3, 7), 3);
//! assert_eq!(max(3, 7), 7);
//! assert_eq!(clamp(512, 0, 450), 450);
//! assert_eq!(clamp(-4.0_f32, 0.0, 100.0), 0.0);
//! ```

/// Returns the larger of `a` and `b`. Returns `a` when they compare equal.
#[inline]
pub fn max<T: PartialOrd>(a: T, b: T) -> T {
    if a < b {
        b
    } else {
        a
    }
}

/// Returns the smaller of `a` and `b`. Returns `a` when they compare equal.
#[inline]
pub fn min<T: PartialOrd>(a: T, b: T) -> T {
    if b < a {
        b
    } else {
        a
    }
}

/// Restricts `value` to the closed range `[low, high]`.
///
/// Returns `low` if `value < low`, `high` if `high < value`, else `value`.
/// A NaN `value` comes back as `low`.
///
/// # Precondition
///
/// `low <= high`. This is only checked in debug builds; bounds coming from
/// configuration are validated once at startup by
/// [`Config::validate`](crate::config::Config::validate).
#[inline]
pub fn clamp<T: PartialOrd>(value: T, low: T, high: T) -> T {
    debug_assert!(!(high < low), "clamp called with low > high");
    max(low, min(value, high))
}
