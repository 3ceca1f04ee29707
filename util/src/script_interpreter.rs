//! # Message script interpreter module
//!
//! This module provides an interpreter for message scripts, which play timed messages into the
//! controllers as if they had been sent by the recognition service, the layout manager or the
//! viewer.
//!
//! Each script line has the form:
//!
//! ```text
//! <time_s>: <target> <sender> <message ...>;
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use thiserror::Error;

// Internal
use comms_if::msg::{Envelope, MsgParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A message which is scripted to be delivered at a specific time.
#[derive(Debug, Clone)]
pub struct Command {
    /// The time the message is supposed to be delivered at
    exec_time_s: f64,

    /// The message to deliver
    msg: Envelope
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending_msgs` to
/// acquire a list of messages that need delivering.
#[derive(Debug)]
pub struct ScriptInterpreter {
    _script_path: PathBuf,
    cmds: VecDeque<Command>
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

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid message at {0} s: {1}")]
    InvalidMsg(f64, MsgParseError),

    #[error("Could not build the script regex: {0}")]
    RegexError(regex::Error)
}

#[derive(Debug)]
pub enum PendingMsgs {
    None,
    Some(Vec<Envelope>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());
        
        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        // Load the script into a string
        let script = fs::read_to_string(&path).map_err(ScriptError::ScriptLoadError)?;

        let cmds = Self::parse(&script)?;

        Ok(ScriptInterpreter {
            _script_path: path,
            cmds
        })
    }

    /// Create a new interpreter from the script's text.
    pub fn from_text(script: &str) -> Result<Self, ScriptError> {
        Ok(ScriptInterpreter {
            _script_path: PathBuf::new(),
            cmds: Self::parse(script)?
        })
    }

    /// Return the messages due at `current_time_s`.
    pub fn get_pending_msgs(&mut self, current_time_s: f64) -> PendingMsgs {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.cmds.is_empty() {
            return PendingMsgs::EndOfScript
        }

        let mut msg_vec: Vec<Envelope> = vec![];

        // Pop items from the queue while the head's exec time has been reached.
        while let Some(cmd) = self.cmds.front() {
            if cmd.exec_time_s > current_time_s {
                break;
            }

            if let Some(cmd) = self.cmds.pop_front() {
                msg_vec.push(cmd.msg);
            }
        }

        // If the vector is longer than 0 return Some, otherwise None
        if !msg_vec.is_empty() {
            PendingMsgs::Some(msg_vec)
        }
        else {
            PendingMsgs::None
        }
    }

    /// Get the number of messages in the script
    pub fn get_num_msgs(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64
        }
    }

    fn parse(script: &str) -> Result<VecDeque<Command>, ScriptError> {
        // Empty queue of commands
        let mut queue: VecDeque<Command> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .map_err(ScriptError::RegexError)?;

        for cap in re.captures_iter(script) {
            let time_str = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            let payload = cap.get(3).map(|m| m.as_str()).unwrap_or("");

            // Parse the exec time
            let exec_time_s: f64 = time_str
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            let msg = Envelope::from_script_payload(payload)
                .map_err(|e| ScriptError::InvalidMsg(exec_time_s, e))?;

            queue.push_back(Command {
                exec_time_s,
                msg
            });
        }

        if queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        // Scripts are allowed to be written out of order
        queue
            .make_contiguous()
            .sort_by(|a, b| a.exec_time_s.partial_cmp(&b.exec_time_s).unwrap_or(std::cmp::Ordering::Equal));

        Ok(queue)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SCRIPT: &str = "
        // Comments are ignored as they don't match
        0.5: robot_000 RecogTrash ObjDir 50.0 0.0 50.0 10.0;
        0.1: robot_000 SIGViewer RobotAngle 90;
        2: robot_000 RecogTrash grab;
    ";

    #[test]
    fn test_pending_msgs() {
        let mut si = ScriptInterpreter::from_text(SCRIPT).unwrap();

        assert_eq!(si.get_num_msgs(), 3);
        assert_eq!(si.get_duration(), 2.0);

        match si.get_pending_msgs(0.0) {
            PendingMsgs::None => (),
            p => panic!("Expected no messages, got {:?}", p)
        }

        match si.get_pending_msgs(0.5) {
            PendingMsgs::Some(v) => {
                assert_eq!(v.len(), 2);
                assert_eq!(v[0].text, "RobotAngle 90");
                assert_eq!(v[1].sender, "RecogTrash");
            },
            p => panic!("Expected two messages, got {:?}", p)
        }

        match si.get_pending_msgs(10.0) {
            PendingMsgs::Some(v) => assert_eq!(v[0].text, "grab"),
            p => panic!("Expected one message, got {:?}", p)
        }

        match si.get_pending_msgs(11.0) {
            PendingMsgs::EndOfScript => (),
            p => panic!("Expected end of script, got {:?}", p)
        }
    }

    #[test]
    fn test_bad_scripts() {
        assert!(matches!(
            ScriptInterpreter::from_text("nothing here"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::from_text("1.0: robot_000 grab;"),
            Err(ScriptError::InvalidMsg(_, _))
        ));
    }
}
