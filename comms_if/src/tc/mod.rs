//! # Telecommand module
//!
//! This module provides the telecommands that can be sent to the drive executable, either from a
//! script or from any other source able to produce JSON.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod motion_ctrl;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
use motion_ctrl::MotionCmd;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the robot.
///
/// Serialised as `{"type": "<TYPE>", "payload": <payload>}`, where types with no data carry no
/// payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tc {
    /// Execute a motion command. Discarded by the controller if another command is running.
    Motion(MotionCmd),

    /// Abort the running motion command, if any.
    Abort,

    /// Replace the distance regulator gains. Takes effect from the next command.
    SetGains {
        p: f64,
        i: f64,
        d: f64,
    },
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC contains a non-finite value in {0}")]
    NonFinite(&'static str),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        let tc: Tc = serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)?;

        // NaN or infinite arguments would never satisfy a done predicate, reject them here rather
        // than let a command run forever.
        match tc {
            Tc::Motion(ref cmd) if !cmd.is_finite() => Err(TcParseError::NonFinite("MOTION")),
            Tc::SetGains { p, i, d } if !(p.is_finite() && i.is_finite() && d.is_finite()) => {
                Err(TcParseError::NonFinite("SET_GAINS"))
            }
            _ => Ok(tc),
        }
    }

    /// Serialise the TC into a JSON packet
    pub fn to_json(&self) -> Result<String, TcParseError> {
        serde_json::to_string(self).map_err(TcParseError::InvalidJson)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
