//! Execution of motion telecommands

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{
    eqpt::{EncoderFeed, MotorOutput, RangeSensor},
    tc::motion_ctrl::MotionCmd,
};

use super::{MotionCtrl, MotionReport};

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<E, M> MotionCtrl<E, M>
where
    E: EncoderFeed + Send,
    M: MotorOutput + Send,
{
    /// Execute `cmd`, blocking until it finishes.
    ///
    /// `sensor` is only read by the commands that need a range.
    pub fn exec<S: RangeSensor>(&self, cmd: MotionCmd, sensor: &mut S) -> MotionReport {
        match cmd {
            MotionCmd::Forward { distance_cm } => self.forward(distance_cm),
            MotionCmd::Backward { distance_cm } => self.backward(distance_cm),
            MotionCmd::TurnRight { angle_deg } => self.turn_right(angle_deg),
            MotionCmd::TurnLeft { angle_deg } => self.turn_left(angle_deg),
            MotionCmd::ForwardUntil { distance_cm } => self.forward_until(distance_cm, sensor),
            MotionCmd::FollowWall { side, distance_cm } => {
                self.follow_wall(side, distance_cm, sensor)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
