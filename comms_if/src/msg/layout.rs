//! # Layout service messages
//!
//! Messages exchanged with the layout manager service, which collects and sets the positions of
//! the entities in a scene.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt::{self, Display};
use serde::{Serialize, Deserialize};

use super::{MsgParseError, Tokens, reply::Fixed};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The kinds of entity the layout service asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Object,
    Obstacle,
    Robot,
}

/// Messages sent by the layout service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayoutMsg {
    /// `Ask<Kind>Position` - report the next entity of that kind
    AskPosition(EntityKind),

    /// `StartSetPosition` - the service is about to move entities
    StartSetPosition,

    /// `SetEntityPosition index name x y z` - move an entity
    SetEntityPosition {
        index: u32,
        name: String,
        pos_cm: [f64; 3],
    },

    /// `FinishSetPosition` - the service has finished moving entities
    FinishSetPosition,
}

/// Messages sent to the layout service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayoutReply {
    StartAskPosition,
    AnswerPosition {
        kind: EntityKind,
        index: usize,
        name: String,
        pos_cm: [f64; 3],
    },
    FinishAskPosition(EntityKind),
    RequestEntityPosition,
    FinishSetPosition,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Object => write!(f, "Object"),
            EntityKind::Obstacle => write!(f, "Obstacle"),
            EntityKind::Robot => write!(f, "Robot"),
        }
    }
}

impl LayoutMsg {
    /// Parse a layout message from its text.
    pub fn parse(text: &str) -> Result<Self, MsgParseError> {
        let t = Tokens::split(text)?;

        let msg = match t.keyword {
            "AskObjectPosition" => t.numbers::<0>().map(|_| LayoutMsg::AskPosition(EntityKind::Object))?,
            "AskObstaclePosition" => t.numbers::<0>().map(|_| LayoutMsg::AskPosition(EntityKind::Obstacle))?,
            "AskRobotPosition" => t.numbers::<0>().map(|_| LayoutMsg::AskPosition(EntityKind::Robot))?,
            "StartSetPosition" => t.numbers::<0>().map(|_| LayoutMsg::StartSetPosition)?,
            "FinishSetPosition" => t.numbers::<0>().map(|_| LayoutMsg::FinishSetPosition)?,
            "SetEntityPosition" => {
                t.expect_arity(5)?;
                LayoutMsg::SetEntityPosition {
                    index: t.u32_at(0)?,
                    name: t.str_at(1).to_string(),
                    pos_cm: [t.f64_at(2)?, t.f64_at(3)?, t.f64_at(4)?],
                }
            }
            k => return Err(MsgParseError::UnknownKeyword(k.to_string())),
        };

        Ok(msg)
    }
}

impl Display for LayoutReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutReply::StartAskPosition => write!(f, "StartAskPosition"),
            LayoutReply::AnswerPosition { kind, index, name, pos_cm } => write!(
                f,
                "Answer{}Position {} {} {}",
                kind,
                index,
                name,
                Fixed(pos_cm)
            ),
            LayoutReply::FinishAskPosition(kind) => write!(f, "FinishAsk{}Position", kind),
            LayoutReply::RequestEntityPosition => write!(f, "RequestEntityPosition"),
            LayoutReply::FinishSetPosition => write!(f, "FinishSetPosition"),
        }
    }
}
