//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Clamp `value` into `[min, max]`.
///
/// The lower bound is applied last, so if `min > max` the result is `min`. Control code relies on
/// this to never output a negative power when a ceiling collapses below zero. A NaN value is
/// returned unchanged.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    let mut ret = value;

    if ret > max {
        ret = max
    }
    if ret < min {
        ret = min
    }

    ret
}

/// Clamp `value` into `[-limit.abs(), limit.abs()]`.
pub fn clamp_sym<T>(value: T, limit: T) -> T
where
    T: Float,
{
    clamp(value, -limit.abs(), limit.abs())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 100f64), (0f64, 1023f64), 100f64), 1023f64);
        assert_eq!(lin_map((0f64, 100f64), (0f64, 1023f64), 50f64), 511.5f64);
        assert_eq!(lin_map((0f64, 1023f64), (0f64, 2400f64), 0f64), 0f64);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(1100f64, 0f64, 1023f64), 1023f64);
        assert_eq!(clamp(-3f64, 0f64, 1023f64), 0f64);
        assert_eq!(clamp(512f64, 0f64, 1023f64), 512f64);

        // Collapsed range resolves to the lower bound
        assert_eq!(clamp(10f64, 0f64, -5f64), 0f64);
    }

    #[test]
    fn test_clamp_sym() {
        assert_eq!(clamp_sym(250f64, 100f64), 100f64);
        assert_eq!(clamp_sym(-250f64, 100f64), -100f64);
        assert_eq!(clamp_sym(-250f64, -100f64), -100f64);
        assert_eq!(clamp_sym(42f64, 100f64), 42f64);
    }
}
