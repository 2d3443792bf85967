//! Edge counting wheel encoders

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use comms_if::eqpt::{EncoderFeed, Wheel};
use log::warn;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Pulses counted per meter of wheel travel before calibration, counting both edges.
pub const DEFAULT_PULSES_PER_METER: f64 = 2000.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Per-wheel edge counters.
///
/// Shared between the code handling encoder edges, usually an interrupt handler, and the
/// [`PulseEncoders`] feed.
#[derive(Debug, Default)]
pub struct PulseCounters {
    counts: [AtomicU32; 2],
}

/// Encoder feed reading a set of [`PulseCounters`].
#[derive(Debug, Clone)]
pub struct PulseEncoders {
    counters: Arc<PulseCounters>,
    pulses_per_meter: [f64; 2],
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl PulseCounters {
    /// Count one edge of `wheel`'s encoder.
    pub fn on_edge(&self, wheel: Wheel) {
        self.counts[wheel as usize].fetch_add(1, Ordering::Relaxed);
    }

    /// Count `n` edges of `wheel`'s encoder.
    pub fn add_edges(&self, wheel: Wheel, n: u32) {
        self.counts[wheel as usize].fetch_add(n, Ordering::Relaxed);
    }

    pub fn count(&self, wheel: Wheel) -> u32 {
        self.counts[wheel as usize].load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        for count in &self.counts {
            count.store(0, Ordering::Relaxed);
        }
    }
}

impl PulseEncoders {
    /// Create a feed over `counters` using the default calibration.
    pub fn new(counters: Arc<PulseCounters>) -> Self {
        Self {
            counters,
            pulses_per_meter: [DEFAULT_PULSES_PER_METER; 2],
        }
    }

    pub fn counters(&self) -> &Arc<PulseCounters> {
        &self.counters
    }

    pub fn pulses_per_meter(&self, wheel: Wheel) -> f64 {
        self.pulses_per_meter[wheel as usize]
    }
}

impl EncoderFeed for PulseEncoders {
    fn reset_counters(&mut self) {
        self.counters.reset();
    }

    fn distance_mm(&mut self, wheel: Wheel) -> f64 {
        self.counters.count(wheel) as f64 * 1000.0 / self.pulses_per_meter[wheel as usize]
    }

    fn pulse_count(&mut self, wheel: Wheel) -> u32 {
        self.counters.count(wheel)
    }

    fn set_pulses_per_meter(&mut self, wheel: Wheel, pulses_per_meter: f64) {
        if pulses_per_meter > 0.0 && pulses_per_meter.is_finite() {
            self.pulses_per_meter[wheel as usize] = pulses_per_meter;
        } else {
            warn!(
                "Ignoring invalid calibration of {} pulses/m for wheel {:?}",
                pulses_per_meter, wheel
            );
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
