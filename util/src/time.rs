//! General time utility functions

use std::time::Duration;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a chrono duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Period of a loop running at `frequency_hz`.
///
/// Returns `None` if the frequency is not a positive finite number.
pub fn period_from_frequency(frequency_hz: f64) -> Option<Duration> {
    if frequency_hz.is_finite() && frequency_hz > 0.0 {
        Some(Duration::from_secs_f64(1.0 / frequency_hz))
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_period_from_frequency() {
        assert_eq!(period_from_frequency(50.0), Some(Duration::from_millis(20)));
        assert_eq!(period_from_frequency(0.0), None);
        assert_eq!(period_from_frequency(-5.0), None);
        assert_eq!(period_from_frequency(f64::NAN), None);
    }

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
    }
}
