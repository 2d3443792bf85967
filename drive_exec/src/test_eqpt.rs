//! Test doubles for the drive equipment

use comms_if::eqpt::{EncoderFeed, MotorDirection, MotorOutput, RangeSensor, Wheel};

use crate::motion_ctrl::Params;

/// Parameters with a fast control loop so tests don't wait on real time.
pub fn fast_params() -> Params {
    Params {
        loop_frequency_hz: 1000.0,
        ..Params::default()
    }
}

/// Encoders where each wheel advances a fixed step every time it is read.
#[derive(Debug, Default)]
pub struct StepEncoders {
    pub step_mm: [f64; 2],
    pub distance_mm: [f64; 2],
    pub pulses_per_meter: [f64; 2],
    pub resets: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorCall {
    Power(Wheel, MotorDirection, u16),
    Stop(Wheel),
}

/// Motors which record every call made on them.
#[derive(Debug, Default)]
pub struct RecordingMotors {
    pub calls: Vec<MotorCall>,
}

/// Range sensor returning a fixed sequence of samples, repeating the last one.
#[derive(Debug)]
pub struct SequenceSensor {
    pub samples: Vec<u16>,
    pub reads: usize,
}

impl StepEncoders {
    pub fn new(step_mm: f64) -> Self {
        Self {
            step_mm: [step_mm, step_mm],
            pulses_per_meter: [2000.0, 2000.0],
            ..Self::default()
        }
    }
}

impl EncoderFeed for StepEncoders {
    fn reset_counters(&mut self) {
        self.distance_mm = [0.0, 0.0];
        self.resets += 1;
    }

    fn distance_mm(&mut self, wheel: Wheel) -> f64 {
        let i = wheel as usize;
        self.distance_mm[i] += self.step_mm[i];
        self.distance_mm[i]
    }

    fn pulse_count(&mut self, wheel: Wheel) -> u32 {
        let i = wheel as usize;
        (self.distance_mm[i] * self.pulses_per_meter[i] / 1000.0) as u32
    }

    fn set_pulses_per_meter(&mut self, wheel: Wheel, pulses_per_meter: f64) {
        self.pulses_per_meter[wheel as usize] = pulses_per_meter;
    }
}

impl RecordingMotors {
    pub fn power_calls(&self) -> Vec<MotorCall> {
        self.calls
            .iter()
            .filter(|c| matches!(c, MotorCall::Power(..)))
            .copied()
            .collect()
    }

    /// Directions of the first pair of power calls.
    pub fn first_directions(&self) -> Option<(MotorDirection, MotorDirection)> {
        let calls = self.power_calls();
        match calls.as_slice() {
            [MotorCall::Power(Wheel::A, dir_a, _), MotorCall::Power(Wheel::B, dir_b, _), ..] => {
                Some((*dir_a, *dir_b))
            }
            _ => None,
        }
    }
}

impl MotorOutput for RecordingMotors {
    fn set_power(&mut self, wheel: Wheel, direction: MotorDirection, pwm: u16) {
        self.calls.push(MotorCall::Power(wheel, direction, pwm));
    }

    fn stop(&mut self, wheel: Wheel) {
        self.calls.push(MotorCall::Stop(wheel));
    }
}

impl SequenceSensor {
    pub fn new(samples: Vec<u16>) -> Self {
        Self { samples, reads: 0 }
    }
}

impl RangeSensor for SequenceSensor {
    fn read_raw(&mut self) -> u16 {
        let i = self.reads.min(self.samples.len().saturating_sub(1));
        self.reads += 1;
        self.samples.get(i).copied().unwrap_or(0)
    }
}
