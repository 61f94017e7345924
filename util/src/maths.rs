//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into the range `[-limit, limit]`.
///
/// A negative limit is treated as its magnitude. `NAN` values are clamped to
/// zero so that a bad input can never produce a nonzero demand.
pub fn clamp_abs<T>(value: T, limit: T) -> T
where
    T: Float,
{
    if value.is_nan() {
        return T::zero();
    }

    let limit = limit.abs();

    value.max(-limit).min(limit)
}

/// Apply a deadzone to a value, returning zero if its magnitude is strictly
/// less than the deadzone width.
pub fn deadzone<T>(value: T, width: T) -> T
where
    T: Float,
{
    if value.abs() < width {
        T::zero()
    } else {
        value
    }
}

/// Wrap an angle into the range `[-pi, pi]`.
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float,
{
    let pi_t = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);
    let tau_t = pi_t + pi_t;

    rem_euclid(angle + pi_t, tau_t) - pi_t
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}
