//! # Range sensor conversion
//!
//! The range sensor returns an analog sample which falls as the distance to the target grows.
//! Its usable range is 10 to 100 cm, so converted distances and thresholds are both clamped into
//! that range before being compared.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::RangeSensor;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Numerator of the sensor's distance curve.
pub const CURVE_NUMERATOR: f64 = 10_000_000.0;

/// Gain applied to the analog sample in the denominator of the distance curve.
pub const CURVE_GAIN: f64 = 135.0;

/// Offset subtracted in the denominator of the distance curve.
pub const CURVE_OFFSET: f64 = 4500.0;

/// Closest distance the sensor can measure.
///
/// Units: millimeters
pub const MIN_RANGE_MM: f64 = 100.0;

/// Furthest distance the sensor can measure.
///
/// Units: millimeters
pub const MAX_RANGE_MM: f64 = 1000.0;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert an analog sample into a distance, without limiting it to the sensor's range.
///
/// Samples too small to give a positive distance return `None`.
pub fn analog_to_mm(analog: u16) -> Option<f64> {
    let denominator = CURVE_GAIN * analog as f64 - CURVE_OFFSET;

    if denominator > 0.0 {
        Some(CURVE_NUMERATOR / denominator)
    } else {
        None
    }
}

/// Convert an analog sample into a distance within the sensor's range.
///
/// Samples below the curve's origin are beyond the far limit.
pub fn analog_to_range_mm(analog: u16) -> f64 {
    match analog_to_mm(analog) {
        Some(mm) => clamp(mm, MIN_RANGE_MM, MAX_RANGE_MM),
        None => MAX_RANGE_MM,
    }
}

/// Analog sample the sensor gives for a target at `distance_mm`.
///
/// Used by the simulated chassis.
pub fn mm_to_analog(distance_mm: f64) -> u16 {
    let distance_mm = clamp(distance_mm, MIN_RANGE_MM, MAX_RANGE_MM);
    let analog = (CURVE_NUMERATOR / distance_mm + CURVE_OFFSET) / CURVE_GAIN;
    analog.round() as u16
}

/// Take a reading from `sensor` as a distance within its range.
///
/// Units: millimeters
pub fn read_range_mm<S: RangeSensor>(sensor: &mut S) -> f64 {
    analog_to_range_mm(sensor.read_raw())
}

/// Convert a threshold in centimeters into millimeters within the sensor's range.
pub fn threshold_to_mm(threshold_cm: f64) -> f64 {
    clamp(threshold_cm * 10.0, MIN_RANGE_MM, MAX_RANGE_MM)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_analog_to_mm() {
        let mm = analog_to_mm(100).unwrap();
        assert!((mm - 1111.111).abs() < 1e-3);

        assert!((analog_to_mm(400).unwrap() - 10_000_000.0 / 49_500.0).abs() < 1e-9);

        // 135 * 33 < 4500
        assert_eq!(analog_to_mm(33), None);
        assert_eq!(analog_to_mm(0), None);
    }

    #[test]
    fn test_range_clamp() {
        assert_eq!(analog_to_range_mm(100), MAX_RANGE_MM);
        assert_eq!(analog_to_range_mm(0), MAX_RANGE_MM);
        assert_eq!(analog_to_range_mm(1000), MIN_RANGE_MM);

        let mid = analog_to_range_mm(400);
        assert!(mid > MIN_RANGE_MM && mid < MAX_RANGE_MM);
    }

    #[test]
    fn test_threshold() {
        assert_eq!(threshold_to_mm(5.0), 100.0);
        assert_eq!(threshold_to_mm(50.0), 500.0);
        assert_eq!(threshold_to_mm(150.0), 1000.0);
    }

    #[test]
    fn test_mm_to_analog() {
        // 1e7 / 500 + 4500 = 24500, / 135 = 181.48
        assert_eq!(mm_to_analog(500.0), 181);
        assert!((analog_to_range_mm(mm_to_analog(300.0)) - 300.0).abs() < 10.0);
    }
}
