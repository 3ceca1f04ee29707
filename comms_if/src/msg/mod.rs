//! # Message module
//!
//! Messages are whitespace delimited ASCII strings. The first token is the keyword of the message,
//! and the remaining tokens are positional arguments. Each keyword has a fixed number of arguments,
//! there are no optional fields. A message which does not match its keyword's arity is rejected
//! with a [`MsgParseError`] rather than being partially parsed.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod layout;
pub mod reply;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Serialize, Deserialize};
use thiserror::Error;

// Internal
pub use layout::{EntityKind, LayoutMsg, LayoutReply};
pub use reply::Reply;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A message together with its routing information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Name of the controller (entity) the message is delivered to
    pub target: String,

    /// Name of the sender, either a service name or an entity name
    pub sender: String,

    /// The raw message text
    pub text: String,
}

/// A tokenised message, split into the keyword and its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Tokens<'a> {
    pub keyword: &'a str,
    pub args: Vec<&'a str>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Messages understood by the cleanup robot's task controller.
///
/// Positions are in world units (centimeters), angles in degrees as they are on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Msg {
    /// `AskRobotPos` - report the robot position to the service
    AskRobotPos,

    /// `ObjDir x y z range` - direction to the next object
    ObjDir {
        x_cm: f64,
        y_cm: f64,
        z_cm: f64,
        range_cm: f64,
    },

    /// `TrashBoxDir x y z range` - direction to the box the held object goes in
    TrashBoxDir {
        x_cm: f64,
        y_cm: f64,
        z_cm: f64,
        range_cm: f64,
    },

    /// `grab` - start the grasp sequence on the current target
    Grab,

    /// `ThrowTrash` - release the held object into the box
    ThrowTrash,

    /// `Finish` - stop all motion
    Finish,

    /// `FindObjPlease` - pick a candidate and plan a route to it without the service
    FindObjPlease,

    /// `RandomRouteStart` - start the random walk scene capture
    RandomRouteStart,

    /// `RandomRouteArrived` - the service acknowledged the last scene
    RandomRouteArrived,

    /// `RandomRoute x z range lookX lookZ lookFlag` - next random walk waypoint
    RandomRoute {
        x_cm: f64,
        z_cm: f64,
        range_cm: f64,
        look_x_cm: f64,
        look_z_cm: f64,
        look: bool,
    },

    /// `GoForwardVelocity c` - drive straight with the velocity scaled by `c`
    GoForwardVelocity(f64),

    /// `RotateVelocity c` - turn on the spot with the velocity scaled by `c`
    RotateVelocity(f64),

    /// `Stop` - stop the wheels and report the scene
    Stop,

    /// `CamID n` - select the camera used in scene reports
    CamId(u32),

    /// `CaptureData x z angle` - teleport and report the scene
    CaptureData {
        x_cm: f64,
        z_cm: f64,
        heading_deg: f64,
    },

    /// `SetRobotPosition x z lookX lookZ` - teleport, facing the look point
    SetRobotPosition {
        x_cm: f64,
        z_cm: f64,
        look_x_cm: f64,
        look_z_cm: f64,
    },

    /// `RESET` - return to the reset pose
    Reset,

    /// `CameraAngle a` - point the head camera (viewer only)
    CameraAngle(f64),

    /// `RobotAngle a` - set the robot heading (viewer only)
    RobotAngle(f64),

    /// `RotateDir x z` - turn to face a point (viewer only)
    RotateDir {
        x_cm: f64,
        z_cm: f64,
    },

    /// `RobotPosition x z` - teleport (viewer only)
    RobotPosition {
        x_cm: f64,
        z_cm: f64,
    },
}

/// Possible parsing errors.
#[derive(Debug, Error, PartialEq)]
pub enum MsgParseError {
    #[error("The message is empty")]
    Empty,

    #[error("\"{0}\" is not a recognised message keyword")]
    UnknownKeyword(String),

    #[error("Message \"{keyword}\" expects {expected} argument(s), found {found}")]
    WrongArity {
        keyword: String,
        expected: usize,
        found: usize,
    },

    #[error("Argument {index} of message \"{keyword}\" is not a valid number: \"{token}\"")]
    InvalidNumber {
        keyword: String,
        index: usize,
        token: String,
    },

    #[error("Argument {index} of message \"{keyword}\" must be finite, found \"{token}\"")]
    NonFinite {
        keyword: String,
        index: usize,
        token: String,
    },

    #[error("Script payload \"{0}\" must be \"<target> <sender> <message>\"")]
    InvalidEnvelope(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Envelope {
    /// Parse an envelope from a script payload of the form `<target> <sender> <message...>`.
    pub fn from_script_payload(payload: &str) -> Result<Self, MsgParseError> {
        let mut parts = payload.trim().splitn(3, char::is_whitespace);

        match (parts.next(), parts.next(), parts.next()) {
            (Some(target), Some(sender), Some(text))
                if !target.is_empty() && !sender.is_empty() && !text.trim().is_empty() =>
            {
                Ok(Self {
                    target: target.to_string(),
                    sender: sender.to_string(),
                    text: text.trim().to_string(),
                })
            }
            _ => Err(MsgParseError::InvalidEnvelope(payload.to_string())),
        }
    }
}

impl<'a> Tokens<'a> {
    /// Split the text into a keyword and arguments.
    pub fn split(text: &'a str) -> Result<Self, MsgParseError> {
        let mut iter = text.split_whitespace();

        let keyword = iter.next().ok_or(MsgParseError::Empty)?;

        Ok(Self {
            keyword,
            args: iter.collect(),
        })
    }

    /// Check that exactly `expected` arguments are present.
    pub fn expect_arity(&self, expected: usize) -> Result<(), MsgParseError> {
        if self.args.len() != expected {
            return Err(MsgParseError::WrongArity {
                keyword: self.keyword.to_string(),
                expected,
                found: self.args.len(),
            });
        }

        Ok(())
    }

    /// Parse the argument at `index` as a finite number.
    ///
    /// `nan`, `inf` and `infinity` are rejected.
    pub fn f64_at(&self, index: usize) -> Result<f64, MsgParseError> {
        let token = self.args.get(index).copied().unwrap_or("");

        match token.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            Ok(_) => Err(MsgParseError::NonFinite {
                keyword: self.keyword.to_string(),
                index,
                token: token.to_string(),
            }),
            Err(_) => Err(MsgParseError::InvalidNumber {
                keyword: self.keyword.to_string(),
                index,
                token: token.to_string(),
            }),
        }
    }

    /// Parse the argument at `index` as an unsigned integer.
    pub fn u32_at(&self, index: usize) -> Result<u32, MsgParseError> {
        let token = self.args.get(index).copied().unwrap_or("");

        token.parse::<u32>().map_err(|_| MsgParseError::InvalidNumber {
            keyword: self.keyword.to_string(),
            index,
            token: token.to_string(),
        })
    }

    /// Get the argument at `index` as a string slice.
    pub fn str_at(&self, index: usize) -> &'a str {
        self.args.get(index).copied().unwrap_or("")
    }

    /// Parse `N` consecutive numeric arguments, checking the arity first.
    pub fn numbers<const N: usize>(&self) -> Result<[f64; N], MsgParseError> {
        self.expect_arity(N)?;

        let mut out = [0f64; N];
        for (i, o) in out.iter_mut().enumerate() {
            *o = self.f64_at(i)?;
        }

        Ok(out)
    }
}

impl Msg {
    /// Parse a message from its text.
    pub fn parse(text: &str) -> Result<Self, MsgParseError> {
        let t = Tokens::split(text)?;

        let msg = match t.keyword {
            "AskRobotPos" => t.numbers::<0>().map(|_| Msg::AskRobotPos)?,
            "ObjDir" => {
                let [x_cm, y_cm, z_cm, range_cm] = t.numbers::<4>()?;
                Msg::ObjDir { x_cm, y_cm, z_cm, range_cm }
            }
            "TrashBoxDir" => {
                let [x_cm, y_cm, z_cm, range_cm] = t.numbers::<4>()?;
                Msg::TrashBoxDir { x_cm, y_cm, z_cm, range_cm }
            }
            "grab" => t.numbers::<0>().map(|_| Msg::Grab)?,
            "ThrowTrash" => t.numbers::<0>().map(|_| Msg::ThrowTrash)?,
            "Finish" => t.numbers::<0>().map(|_| Msg::Finish)?,
            "FindObjPlease" => t.numbers::<0>().map(|_| Msg::FindObjPlease)?,
            "RandomRouteStart" => t.numbers::<0>().map(|_| Msg::RandomRouteStart)?,
            "RandomRouteArrived" => t.numbers::<0>().map(|_| Msg::RandomRouteArrived)?,
            "RandomRoute" => {
                let [x_cm, z_cm, range_cm, look_x_cm, look_z_cm, flag] = t.numbers::<6>()?;
                Msg::RandomRoute {
                    x_cm,
                    z_cm,
                    range_cm,
                    look_x_cm,
                    look_z_cm,
                    look: flag.trunc() as i64 == 1,
                }
            }
            "GoForwardVelocity" => {
                let [c] = t.numbers::<1>()?;
                Msg::GoForwardVelocity(c)
            }
            "RotateVelocity" => {
                let [c] = t.numbers::<1>()?;
                Msg::RotateVelocity(c)
            }
            "Stop" => t.numbers::<0>().map(|_| Msg::Stop)?,
            "CamID" => {
                t.expect_arity(1)?;
                Msg::CamId(t.u32_at(0)?)
            }
            "CaptureData" => {
                let [x_cm, z_cm, heading_deg] = t.numbers::<3>()?;
                Msg::CaptureData { x_cm, z_cm, heading_deg }
            }
            "SetRobotPosition" => {
                let [x_cm, z_cm, look_x_cm, look_z_cm] = t.numbers::<4>()?;
                Msg::SetRobotPosition { x_cm, z_cm, look_x_cm, look_z_cm }
            }
            "RESET" => t.numbers::<0>().map(|_| Msg::Reset)?,
            "CameraAngle" => {
                let [a] = t.numbers::<1>()?;
                Msg::CameraAngle(a)
            }
            "RobotAngle" => {
                let [a] = t.numbers::<1>()?;
                Msg::RobotAngle(a)
            }
            "RotateDir" => {
                let [x_cm, z_cm] = t.numbers::<2>()?;
                Msg::RotateDir { x_cm, z_cm }
            }
            "RobotPosition" => {
                let [x_cm, z_cm] = t.numbers::<2>()?;
                Msg::RobotPosition { x_cm, z_cm }
            }
            k => return Err(MsgParseError::UnknownKeyword(k.to_string())),
        };

        Ok(msg)
    }

    /// Returns true if the message is only accepted from the viewer.
    pub fn is_viewer_msg(&self) -> bool {
        matches!(
            self,
            Msg::CameraAngle(_)
                | Msg::RobotAngle(_)
                | Msg::RotateDir { .. }
                | Msg::RobotPosition { .. }
        )
    }

    /// Returns true if the message is accepted from any sender.
    pub fn is_broadcast_msg(&self) -> bool {
        matches!(self, Msg::Reset)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_directions() {
        assert_eq!(
            Msg::parse("ObjDir 50.0 0.0 50.0 10.0").unwrap(),
            Msg::ObjDir { x_cm: 50.0, y_cm: 0.0, z_cm: 50.0, range_cm: 10.0 }
        );
        assert_eq!(
            Msg::parse("  TrashBoxDir -150 0   -100 35\n").unwrap(),
            Msg::TrashBoxDir { x_cm: -150.0, y_cm: 0.0, z_cm: -100.0, range_cm: 35.0 }
        );
        assert_eq!(Msg::parse("grab").unwrap(), Msg::Grab);
        assert_eq!(Msg::parse("RESET").unwrap(), Msg::Reset);
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        for text in ["ObjDir nan 0.0 50.0 10.0", "ObjDir inf 0.0 50.0 10.0", "TrashBoxDir 0 0 -infinity 35"] {
            assert!(
                matches!(Msg::parse(text), Err(MsgParseError::NonFinite { .. })),
                "{} was accepted",
                text
            );
        }

        assert!(matches!(
            Msg::parse("ObjDir 1.0 abc 50.0 10.0"),
            Err(MsgParseError::InvalidNumber { index: 1, .. })
        ));
    }

    #[test]
    fn test_parse_random_route() {
        assert_eq!(
            Msg::parse("RandomRoute 10 20 5 0 0 1").unwrap(),
            Msg::RandomRoute {
                x_cm: 10.0,
                z_cm: 20.0,
                range_cm: 5.0,
                look_x_cm: 0.0,
                look_z_cm: 0.0,
                look: true
            }
        );

        match Msg::parse("RandomRoute 10 20 5 0 0 0").unwrap() {
            Msg::RandomRoute { look, .. } => assert!(!look),
            m => panic!("Unexpected message {:?}", m),
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Msg::parse("   "), Err(MsgParseError::Empty));

        assert_eq!(
            Msg::parse("ObjDir 50.0 0.0 50.0"),
            Err(MsgParseError::WrongArity {
                keyword: "ObjDir".into(),
                expected: 4,
                found: 3
            })
        );

        assert_eq!(
            Msg::parse("Finish now"),
            Err(MsgParseError::WrongArity {
                keyword: "Finish".into(),
                expected: 0,
                found: 1
            })
        );

        assert_eq!(
            Msg::parse("RotateDir 1.0 abc"),
            Err(MsgParseError::InvalidNumber {
                keyword: "RotateDir".into(),
                index: 1,
                token: "abc".into()
            })
        );

        assert_eq!(
            Msg::parse("CamID -1"),
            Err(MsgParseError::InvalidNumber {
                keyword: "CamID".into(),
                index: 0,
                token: "-1".into()
            })
        );

        assert_eq!(
            Msg::parse("Dance 1 2"),
            Err(MsgParseError::UnknownKeyword("Dance".into()))
        );
    }

    #[test]
    fn test_sender_classes() {
        assert!(Msg::parse("CameraAngle 30").unwrap().is_viewer_msg());
        assert!(!Msg::parse("Stop").unwrap().is_viewer_msg());
        assert!(Msg::parse("RESET").unwrap().is_broadcast_msg());
    }

    #[test]
    fn test_envelope() {
        let env = Envelope::from_script_payload("robot_000 RecogTrash ObjDir 1 2 3 4").unwrap();
        assert_eq!(env.target, "robot_000");
        assert_eq!(env.sender, "RecogTrash");
        assert_eq!(env.text, "ObjDir 1 2 3 4");

        assert!(Envelope::from_script_payload("robot_000 RecogTrash").is_err());
    }
}
