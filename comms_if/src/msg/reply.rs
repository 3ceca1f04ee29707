//! # Outbound messages
//!
//! All numeric fields are written with a fixed width of 6 and one decimal place, i.e. C's `%6.1lf`.
//! The recognition service parses these positionally so the width must not change.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt::{self, Display};
use serde::{Serialize, Deserialize};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A message sent by the cleanup robot to the recognition service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reply {
    /// `Start` - ready for a new directive
    Start,

    /// `AskObjPos x z heading` - ask for the direction to the next object
    AskObjPos {
        x_cm: f64,
        z_cm: f64,
        heading_deg: f64,
    },

    /// `AskRoute x z heading tx ty tz` - ask for a route to the chosen object
    AskRoute {
        x_cm: f64,
        z_cm: f64,
        heading_deg: f64,
        target_cm: [f64; 3],
    },

    /// `AskTrashBoxRoute x z heading bx by bz` - ask for a route to the chosen box
    AskTrashBoxRoute {
        x_cm: f64,
        z_cm: f64,
        heading_deg: f64,
        box_cm: [f64; 3],
    },

    /// `AskTrashBoxPos x z heading` - ask for the direction to any suitable box
    AskTrashBoxPos {
        x_cm: f64,
        z_cm: f64,
        heading_deg: f64,
    },

    /// `<header> x z heading camX camY camZ dirX dirY dirZ` - a description of what the robot's
    /// camera can currently see
    SceneInfo {
        header: String,
        x_cm: f64,
        z_cm: f64,
        heading_deg: f64,
        cam_pos_cm: [f64; 3],
        cam_dir: [f64; 3],
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Start => write!(f, "Start"),
            Reply::AskObjPos { x_cm, z_cm, heading_deg } => {
                write!(f, "AskObjPos {}", Fixed(&[*x_cm, *z_cm, *heading_deg]))
            }
            Reply::AskRoute { x_cm, z_cm, heading_deg, target_cm } => write!(
                f,
                "AskRoute {} {}",
                Fixed(&[*x_cm, *z_cm, *heading_deg]),
                Fixed(target_cm)
            ),
            Reply::AskTrashBoxRoute { x_cm, z_cm, heading_deg, box_cm } => write!(
                f,
                "AskTrashBoxRoute {} {}",
                Fixed(&[*x_cm, *z_cm, *heading_deg]),
                Fixed(box_cm)
            ),
            Reply::AskTrashBoxPos { x_cm, z_cm, heading_deg } => {
                write!(f, "AskTrashBoxPos {}", Fixed(&[*x_cm, *z_cm, *heading_deg]))
            }
            Reply::SceneInfo { header, x_cm, z_cm, heading_deg, cam_pos_cm, cam_dir } => write!(
                f,
                "{} {} {} {}",
                header,
                Fixed(&[*x_cm, *z_cm, *heading_deg]),
                Fixed(cam_pos_cm),
                Fixed(cam_dir)
            ),
        }
    }
}

/// Formats a list of numbers as space separated `%6.1lf` fields.
pub struct Fixed<'a>(pub &'a [f64]);

impl<'a> Display for Fixed<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:6.1}", v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fixed_width() {
        assert_eq!(format!("{}", Fixed(&[1.0, -50.24, 123.46])), "   1.0  -50.2  123.5");
        assert_eq!(format!("{}", Fixed(&[12345.67])), "12345.7");
    }

    #[test]
    fn test_reply_format() {
        let r = Reply::AskObjPos { x_cm: 0.0, z_cm: -50.0, heading_deg: 45.0 };
        assert_eq!(r.to_string(), "AskObjPos    0.0  -50.0   45.0");

        let r = Reply::AskRoute {
            x_cm: 1.0,
            z_cm: 2.0,
            heading_deg: 3.0,
            target_cm: [4.0, 5.0, 6.0],
        };
        assert_eq!(r.to_string(), "AskRoute    1.0    2.0    3.0    4.0    5.0    6.0");

        let r = Reply::SceneInfo {
            header: "Start".into(),
            x_cm: 0.0,
            z_cm: 0.0,
            heading_deg: 0.0,
            cam_pos_cm: [0.0, 100.0, 10.0],
            cam_dir: [0.0, 0.0, 1.0],
        };
        assert_eq!(
            r.to_string(),
            "Start    0.0    0.0    0.0    0.0  100.0   10.0    0.0    0.0    1.0"
        );

        assert_eq!(Reply::Start.to_string(), "Start");
        assert_eq!(
            Reply::AskTrashBoxPos { x_cm: -1.0, z_cm: 0.0, heading_deg: 180.0 }.to_string(),
            "AskTrashBoxPos   -1.0    0.0  180.0"
        );
    }
}
