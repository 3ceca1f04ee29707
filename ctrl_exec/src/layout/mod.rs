//! # Layout reporter
//!
//! The [`LayoutReporter`] lets the layout service record a scene and set it up again. Positions are
//! reported one entity per request, in the order given in the parameters, for each kind of entity
//! independently.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::HashMap;

use comms_if::msg::{EntityKind, LayoutMsg, LayoutReply, MsgParseError};
use log::{debug, info, trace, warn};
use nalgebra::Vector3;

use crate::sim::{Controller, Simulator};

pub use params::LayoutParams;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

pub struct LayoutReporter {
    pub params: LayoutParams,

    connected: bool,

    /// Index of the next entity to report, for each kind
    cursors: HashMap<EntityKind, usize>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Failed to load layout parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Could not parse the message: {0}")]
    ParseError(#[from] MsgParseError),

    #[error("Not connected to the {0} service")]
    NotConnected(String),
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl LayoutReporter {
    pub fn new(params: LayoutParams) -> Self {
        Self {
            params,
            connected: false,
            cursors: HashMap::new(),
        }
    }

    /// Load the parameters from the given file, relative to the params directory.
    pub fn init(params_path: &str) -> Result<Self, LayoutError> {
        let params = util::params::load(params_path).map_err(LayoutError::ParamLoadError)?;
        Ok(Self::new(params))
    }

    fn names(&self, kind: EntityKind) -> &[String] {
        match kind {
            EntityKind::Object => &self.params.objects,
            EntityKind::Obstacle => &self.params.obstacles,
            EntityKind::Robot => &self.params.robots,
        }
    }

    fn try_connect(&mut self, sim: &mut dyn Simulator) {
        if self.connected || !sim.connect_service(&self.params.service) {
            return;
        }

        info!("Connected to the {} service", self.params.service);
        self.connected = true;
        sim.send_to_service(&self.params.service, &LayoutReply::StartAskPosition.to_string());
    }

    fn reply(&self, sim: &mut dyn Simulator, reply: &LayoutReply) -> Result<(), LayoutError> {
        if !self.connected {
            return Err(LayoutError::NotConnected(self.params.service.clone()));
        }
        sim.send_to_service(&self.params.service, &reply.to_string());
        Ok(())
    }

    /// Build the answer to the next position request of a kind.
    ///
    /// Entities which no longer exist are skipped. Once every entity has been reported the list is
    /// finished and the cursor goes back to the start.
    pub fn next_answer(&mut self, sim: &dyn Simulator, kind: EntityKind) -> LayoutReply {
        let mut cursor = self.cursors.get(&kind).copied().unwrap_or(0);
        let mut answer = None;

        while answer.is_none() && cursor < self.names(kind).len() {
            let name = self.names(kind)[cursor].clone();
            match sim.resolve(&name).and_then(|id| sim.entity_position(id)) {
                Some(p) => {
                    answer = Some(LayoutReply::AnswerPosition {
                        kind,
                        index: cursor,
                        name,
                        pos_cm: [p.x, p.y, p.z],
                    })
                }
                None => warn!("Skipping {}, it does not exist", name),
            }
            cursor += 1;
        }

        match answer {
            Some(a) => {
                self.cursors.insert(kind, cursor);
                a
            }
            None => {
                self.cursors.insert(kind, 0);
                LayoutReply::FinishAskPosition(kind)
            }
        }
    }

    fn handle(&mut self, sim: &mut dyn Simulator, text: &str) -> Result<(), LayoutError> {
        let msg = LayoutMsg::parse(text)?;
        trace!("Layout message {:?}", msg);

        match msg {
            LayoutMsg::AskPosition(kind) => {
                let answer = self.next_answer(sim, kind);
                self.reply(sim, &answer)
            }
            LayoutMsg::StartSetPosition => self.reply(sim, &LayoutReply::RequestEntityPosition),
            LayoutMsg::SetEntityPosition { index, name, pos_cm } => {
                // The manager waits for a request after every placement, known entity or not
                match sim.resolve(&name) {
                    Some(id) => {
                        sim.set_entity_position(id, Vector3::from(pos_cm));
                        debug!("Placed entity {} ({}) at {:?}", index, name, pos_cm);
                    }
                    None => warn!("Cannot place entity {} ({}), it does not exist", index, name),
                }
                self.reply(sim, &LayoutReply::RequestEntityPosition)
            }
            LayoutMsg::FinishSetPosition => self.reply(sim, &LayoutReply::FinishSetPosition),
        }
    }
}

impl Controller for LayoutReporter {
    fn on_init(&mut self, sim: &mut dyn Simulator) {
        self.try_connect(sim);
    }

    fn on_action(&mut self, sim: &mut dyn Simulator, _now_s: f64) -> f64 {
        self.try_connect(sim);
        self.params.tick_period_s
    }

    fn on_recv_msg(&mut self, sim: &mut dyn Simulator, sender: &str, text: &str) {
        if sender != self.params.service {
            warn!("Dropping \"{}\" from unexpected sender {}", text, sender);
            return;
        }

        if let Err(e) = self.handle(sim, text) {
            warn!("Could not handle \"{}\": {}", text, e);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::World;

    fn setup() -> (World, LayoutReporter, crate::sim::EntityId) {
        let mut world = World::new();
        world.add_service("LayoutManager");
        let robot = world.add_robot("robot_000", Vector3::new(0.0, 0.0, -50.0), 0.0);
        world.add_entity("can_0", Vector3::new(10.0, 70.0, 5.0));
        world.add_entity("petbottle_0", Vector3::new(-20.0, 70.0, 0.0));

        let mut layout = LayoutReporter::new(LayoutParams::default());
        {
            let mut view = world.view(robot).unwrap();
            layout.on_init(&mut view);
        }

        (world, layout, robot)
    }

    fn texts(world: &mut World) -> Vec<String> {
        world.take_outbox().into_iter().map(|e| e.text).collect()
    }

    #[test]
    fn test_ask_positions() {
        let (mut world, mut layout, robot) = setup();
        assert_eq!(texts(&mut world), vec![String::from("StartAskPosition")]);

        {
            let mut view = world.view(robot).unwrap();
            for _ in 0..3 {
                layout.on_recv_msg(&mut view, "LayoutManager", "AskObjectPosition");
            }
            layout.on_recv_msg(&mut view, "LayoutManager", "AskRobotPosition");
            layout.on_recv_msg(&mut view, "LayoutManager", "AskObjectPosition");
        }

        // can_1 does not exist and is skipped, the cursor of each kind is kept separately
        assert_eq!(
            texts(&mut world),
            vec![
                String::from("AnswerObjectPosition 0 can_0   10.0   70.0    5.0"),
                String::from("AnswerObjectPosition 2 petbottle_0  -20.0   70.0    0.0"),
                String::from("FinishAskObjectPosition"),
                String::from("AnswerRobotPosition 0 robot_000    0.0    0.0  -50.0"),
                String::from("AnswerObjectPosition 0 can_0   10.0   70.0    5.0"),
            ]
        );
    }

    #[test]
    fn test_set_positions() {
        let (mut world, mut layout, robot) = setup();
        texts(&mut world);

        {
            let mut view = world.view(robot).unwrap();
            layout.on_recv_msg(&mut view, "LayoutManager", "StartSetPosition");
            layout.on_recv_msg(&mut view, "LayoutManager", "SetEntityPosition 0 can_0 1 2 3");
            layout.on_recv_msg(&mut view, "LayoutManager", "SetEntityPosition 1 mugcup 1 2 3");
            layout.on_recv_msg(&mut view, "RecogTrash", "FinishSetPosition");
            layout.on_recv_msg(&mut view, "LayoutManager", "FinishSetPosition");
        }

        assert_eq!(world.position_of("can_0"), Some(Vector3::new(1.0, 2.0, 3.0)));
        assert_eq!(
            texts(&mut world),
            vec![
                String::from("RequestEntityPosition"),
                String::from("RequestEntityPosition"),
                String::from("RequestEntityPosition"),
                String::from("FinishSetPosition"),
            ]
        );
    }
}
