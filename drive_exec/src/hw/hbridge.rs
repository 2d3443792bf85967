//! H-bridge motor output

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Debug;

use comms_if::eqpt::{MotorDirection, MotorOutput, Wheel, MAX_PWM};
use embedded_hal::{digital::v2::OutputPin, PwmPin};
use log::warn;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One motor of the bridge.
///
/// The direction pin selects which side of the bridge the PWM is applied to. In reverse the low
/// side is switched by the PWM, so the duty is inverted.
pub struct HBridgeChannel<P, D> {
    pwm: P,
    dir: D,
}

/// Both drive motors, wheel A on channel `a` and wheel B on channel `b`.
pub struct HBridgeMotors<PA, DA, PB, DB> {
    a: HBridgeChannel<PA, DA>,
    b: HBridgeChannel<PB, DB>,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl<P, D> HBridgeChannel<P, D>
where
    P: PwmPin<Duty = u16>,
    D: OutputPin,
    D::Error: Debug,
{
    /// Create a stopped channel from its pins.
    pub fn new(pwm: P, dir: D) -> Self {
        let mut channel = Self { pwm, dir };
        channel.stop();
        channel.pwm.enable();
        channel
    }

    /// Release the pins.
    pub fn free(self) -> (P, D) {
        (self.pwm, self.dir)
    }

    fn drive(&mut self, direction: MotorDirection, pwm: u16) {
        let pwm = pwm.min(MAX_PWM);

        let (level, dir_result) = match direction {
            MotorDirection::Forward => (pwm, self.dir.set_low()),
            MotorDirection::Reverse => (MAX_PWM - pwm, self.dir.set_high()),
        };

        if let Err(e) = dir_result {
            warn!("Could not set motor direction pin: {:?}", e);
        }

        let duty = scale_duty(level, self.pwm.get_max_duty());
        self.pwm.set_duty(duty);
    }

    fn stop(&mut self) {
        self.pwm.set_duty(0);

        if let Err(e) = self.dir.set_low() {
            warn!("Could not set motor direction pin: {:?}", e);
        }
    }
}

impl<PA, DA, PB, DB> HBridgeMotors<PA, DA, PB, DB>
where
    PA: PwmPin<Duty = u16>,
    DA: OutputPin,
    DA::Error: Debug,
    PB: PwmPin<Duty = u16>,
    DB: OutputPin,
    DB::Error: Debug,
{
    pub fn new(a: HBridgeChannel<PA, DA>, b: HBridgeChannel<PB, DB>) -> Self {
        Self { a, b }
    }

    pub fn free(self) -> (HBridgeChannel<PA, DA>, HBridgeChannel<PB, DB>) {
        (self.a, self.b)
    }
}

impl<PA, DA, PB, DB> MotorOutput for HBridgeMotors<PA, DA, PB, DB>
where
    PA: PwmPin<Duty = u16>,
    DA: OutputPin,
    DA::Error: Debug,
    PB: PwmPin<Duty = u16>,
    DB: OutputPin,
    DB::Error: Debug,
{
    fn set_power(&mut self, wheel: Wheel, direction: MotorDirection, pwm: u16) {
        match wheel {
            Wheel::A => self.a.drive(direction, pwm),
            Wheel::B => self.b.drive(direction, pwm),
        }
    }

    fn stop(&mut self, wheel: Wheel) {
        match wheel {
            Wheel::A => self.a.stop(),
            Wheel::B => self.b.stop(),
        }
    }
}

/// Scale a level in `[0, MAX_PWM]` to a pin duty in `[0, max_duty]`.
fn scale_duty(level: u16, max_duty: u16) -> u16 {
    (level as u32 * max_duty as u32 / MAX_PWM as u32) as u16
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::convert::Infallible;

    struct FakePwm {
        duty: u16,
        max_duty: u16,
        enabled: bool,
    }

    struct FakePin {
        high: bool,
    }

    impl PwmPin for FakePwm {
        type Duty = u16;

        fn disable(&mut self) {
            self.enabled = false;
        }

        fn enable(&mut self) {
            self.enabled = true;
        }

        fn get_duty(&self) -> u16 {
            self.duty
        }

        fn get_max_duty(&self) -> u16 {
            self.max_duty
        }

        fn set_duty(&mut self, duty: u16) {
            self.duty = duty;
        }
    }

    impl OutputPin for FakePin {
        type Error = Infallible;

        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            Ok(())
        }
    }

    fn channel(max_duty: u16) -> HBridgeChannel<FakePwm, FakePin> {
        HBridgeChannel::new(
            FakePwm {
                duty: 77,
                max_duty,
                enabled: false,
            },
            FakePin { high: true },
        )
    }

    #[test]
    fn test_new_channel_stopped() {
        let (pwm, dir) = channel(MAX_PWM).free();
        assert_eq!(pwm.duty, 0);
        assert!(pwm.enabled);
        assert!(!dir.high);
    }

    #[test]
    fn test_directions() {
        let mut motors = HBridgeMotors::new(channel(MAX_PWM), channel(MAX_PWM));

        motors.set_power(Wheel::A, MotorDirection::Forward, 600);
        motors.set_power(Wheel::B, MotorDirection::Reverse, 600);

        let (a, b) = motors.free();
        let (pwm_a, dir_a) = a.free();
        let (pwm_b, dir_b) = b.free();

        assert_eq!(pwm_a.duty, 600);
        assert!(!dir_a.high);

        // Reverse inverts the duty
        assert_eq!(pwm_b.duty, 423);
        assert!(dir_b.high);
    }

    #[test]
    fn test_stop_and_scaling() {
        let mut motors = HBridgeMotors::new(channel(4095), channel(MAX_PWM));

        motors.set_power(Wheel::A, MotorDirection::Forward, MAX_PWM);
        motors.set_power(Wheel::B, MotorDirection::Forward, 2000);
        {
            let HBridgeMotors { a, b } = &motors;
            assert_eq!(a.pwm.duty, 4095);
            assert_eq!(b.pwm.duty, MAX_PWM);
        }

        motors.set_power(Wheel::B, MotorDirection::Reverse, 1000);
        motors.stop(Wheel::B);

        let (_, b) = motors.free();
        let (pwm_b, dir_b) = b.free();
        assert_eq!(pwm_b.duty, 0);
        assert!(!dir_b.high);
    }
}
