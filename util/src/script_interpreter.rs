//! # Drive script interpreter module
//!
//! This module provides an interpreter for drive scripts, allowing telecommands to be executed at
//! set times after the start of a run.
//!
//! A script is a text file in which each command is written as
//!
//! ```text
//! <exec time in seconds>: <telecommand JSON>;
//! ```
//!
//! Anything that does not match this pattern (blank lines, comments) is ignored.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal
use comms_if::tc::{Tc, TcParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A telecommand which is scripted to occur at a specific time.
#[derive(Debug)]
struct ScriptedTc {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    /// The Telecommand to run
    tc: Tc,
}

/// A script interpreter.
///
/// After loading a script use `.get_pending_tcs` to acquire the telecommands that are due.
#[derive(Debug)]
pub struct ScriptInterpreter {
    script_path: Option<PathBuf>,
    tcs: VecDeque<ScriptedTc>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("Script contains an invalid timestamp: {0}. Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script timestamps must not decrease, found {1} s after {0} s")]
    OutOfOrder(f64, f64),

    #[error("Script contains an invalid TC at {0} s: {1}")]
    InvalidTc(f64, TcParseError),

    #[error("Could not build the script pattern: {0}")]
    PatternError(regex::Error),
}

/// Telecommands due for execution.
#[derive(Debug)]
pub enum PendingTcs {
    None,
    Some(Vec<Tc>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let path = PathBuf::from(script_path.as_ref());

        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        let script = fs::read_to_string(&path).map_err(ScriptError::ScriptLoadError)?;

        let mut si = Self::from_script(&script)?;
        si.script_path = Some(path);

        Ok(si)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_script(script: &str) -> Result<Self, ScriptError> {
        let mut tcs: VecDeque<ScriptedTc> = VecDeque::new();

        let re = RegexBuilder::new(r"^\s*(\d+(?:\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .map_err(ScriptError::PatternError)?;

        for cap in re.captures_iter(script) {
            let time_str = cap.get(1).map_or("", |m| m.as_str());
            let exec_time_s: f64 = time_str
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}: {}", time_str, e)))?;

            if let Some(prev) = tcs.back() {
                if exec_time_s < prev.exec_time_s {
                    return Err(ScriptError::OutOfOrder(prev.exec_time_s, exec_time_s));
                }
            }

            // The scripts contain JSON only
            let tc = Tc::from_json(cap.get(2).map_or("", |m| m.as_str()))
                .map_err(|e| ScriptError::InvalidTc(exec_time_s, e))?;

            tcs.push_back(ScriptedTc { exec_time_s, tc });
        }

        if tcs.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        Ok(ScriptInterpreter {
            script_path: None,
            tcs,
        })
    }

    /// Return the TCs whose execution time is at or before `current_time_s`.
    pub fn get_pending_tcs(&mut self, current_time_s: f64) -> PendingTcs {
        if self.tcs.is_empty() {
            return PendingTcs::EndOfScript;
        }

        let mut tc_vec: Vec<Tc> = vec![];

        while let Some(head) = self.tcs.front() {
            if head.exec_time_s > current_time_s {
                break;
            }
            if let Some(scripted) = self.tcs.pop_front() {
                tc_vec.push(scripted.tc);
            }
        }

        if tc_vec.is_empty() {
            PendingTcs::None
        } else {
            PendingTcs::Some(tc_vec)
        }
    }

    /// Get the path the script was loaded from, if it came from a file.
    pub fn script_path(&self) -> Option<&Path> {
        self.script_path.as_deref()
    }

    /// Get the number of TCs remaining in the script
    pub fn get_num_tcs(&self) -> usize {
        self.tcs.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        self.tcs.back().map_or(0.0, |c| c.exec_time_s)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tc::motion_ctrl::MotionCmd;

    const SCRIPT: &str = r#"
# Drive a short leg, turn, and give up on the second leg early
0.0: {"type": "SET_GAINS", "payload": {"p": 4.0, "i": 5.0, "d": 0.0}};
0.5: {"type": "MOTION", "payload": {"forward": {"distance_cm": 25.0}}};
3.0: {"type": "MOTION", "payload": {"turn_right": {"angle_deg": 90.0}}};
4.25: {"type": "ABORT"};
"#;

    #[test]
    fn test_script_pending() {
        let mut si = ScriptInterpreter::from_script(SCRIPT).unwrap();

        assert_eq!(si.get_num_tcs(), 4);
        assert_eq!(si.get_duration(), 4.25);

        match si.get_pending_tcs(0.6) {
            PendingTcs::Some(tcs) => {
                assert_eq!(tcs.len(), 2);
                assert_eq!(
                    tcs[1],
                    Tc::Motion(MotionCmd::Forward { distance_cm: 25.0 })
                );
            }
            p => panic!("Expected two pending TCs, got {:?}", p),
        }

        assert!(matches!(si.get_pending_tcs(1.0), PendingTcs::None));
        assert!(matches!(si.get_pending_tcs(3.0), PendingTcs::Some(ref t) if t.len() == 1));
        assert!(matches!(si.get_pending_tcs(10.0), PendingTcs::Some(ref t) if t[0] == Tc::Abort));
        assert!(matches!(si.get_pending_tcs(10.0), PendingTcs::EndOfScript));
    }

    #[test]
    fn test_script_errors() {
        assert!(matches!(
            ScriptInterpreter::from_script("# nothing here\n"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::from_script(r#"1.0: {"type": "JUMP"};"#),
            Err(ScriptError::InvalidTc(t, _)) if t == 1.0
        ));
        assert!(matches!(
            ScriptInterpreter::from_script("2.0: {\"type\": \"ABORT\"};\n1.0: {\"type\": \"ABORT\"};"),
            Err(ScriptError::OutOfOrder(_, _))
        ));
    }
}
