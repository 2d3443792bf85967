//! # Motion control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::eqpt::Side;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A motion that can be completed by motion control.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionCmd {
    /// Drive straight forward.
    Forward {
        /// Distance to drive in centimeters. Negative distances drive backwards.
        distance_cm: f64,
    },

    /// Drive straight backward.
    Backward {
        /// Distance to drive in centimeters. Negative distances drive forwards.
        distance_cm: f64,
    },

    /// Turn on the spot to the right (clockwise seen from above).
    TurnRight {
        /// Angle to turn in degrees. Negative angles turn left.
        angle_deg: f64,
    },

    /// Turn on the spot to the left (anticlockwise seen from above).
    TurnLeft {
        /// Angle to turn in degrees. Negative angles turn right.
        angle_deg: f64,
    },

    /// Drive forward until the range sensor reads at or below the given distance.
    ForwardUntil {
        /// Threshold in centimeters, valid between 10 and 100 cm.
        distance_cm: f64,
    },

    /// Hold the current distance to a wall while driving forward.
    FollowWall {
        /// The side of the robot the wall is on.
        side: Side,

        /// Distance to travel along the wall in centimeters.
        distance_cm: f64,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl MotionCmd {
    /// Determine if every numeric argument of the command is finite.
    pub fn is_finite(&self) -> bool {
        match *self {
            MotionCmd::Forward { distance_cm }
            | MotionCmd::Backward { distance_cm }
            | MotionCmd::ForwardUntil { distance_cm }
            | MotionCmd::FollowWall { distance_cm, .. } => distance_cm.is_finite(),
            MotionCmd::TurnRight { angle_deg } | MotionCmd::TurnLeft { angle_deg } => {
                angle_deg.is_finite()
            }
        }
    }
}
