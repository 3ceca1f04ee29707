//! # Trash box zone
//!
//! A [`TrashBoxZone`] is attached to a box. Anything let go of above the box's opening is dropped
//! into it, first to half its height and then, after a short delay, to the floor of the box.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, warn};
use nalgebra::Vector3;

use crate::sim::{Controller, EntityId, Simulator};

pub use params::ZoneParams;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Controller for one trash box.
pub struct TrashBoxZone {
    pub params: ZoneParams,

    /// Entities half way through a drop
    dropping: Vec<PendingDrop>,

    /// Time the current drops complete
    settle_at_s: f64,
}

#[derive(Debug, Clone)]
struct PendingDrop {
    id: EntityId,
    name: String,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ZoneError {
    #[error("Failed to load zone parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("{0} vanished while being dropped")]
    EntityVanished(String),
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl TrashBoxZone {
    pub fn new(params: ZoneParams) -> Self {
        Self {
            params,
            dropping: vec![],
            settle_at_s: 0.0,
        }
    }

    /// Load the parameters from the given file, relative to the params directory.
    pub fn init(params_path: &str) -> Result<Self, ZoneError> {
        let params = util::params::load(params_path).map_err(ZoneError::ParamLoadError)?;
        Ok(Self::new(params))
    }

    /// Returns true if the position lies in the box opening.
    pub fn contains(&self, box_cm: &Vector3<f64>, pos_cm: &Vector3<f64>) -> bool {
        let d = pos_cm - box_cm;

        d.x.abs() < self.params.half_width_cm
            && d.z.abs() < self.params.half_depth_cm
            && pos_cm.y > self.params.min_height_cm
            && pos_cm.y < self.params.max_height_cm
    }

    /// Start dropping every released entity in the opening, returning the number found.
    fn scan(&mut self, sim: &mut dyn Simulator) -> usize {
        let me = sim.my_position();
        let my_name = sim.my_name().to_string();

        for name in sim.entity_names() {
            if name == my_name || self.params.exclusions.contains(&name) {
                continue;
            }

            let id = match sim.resolve(&name) {
                Some(id) => id,
                None => continue,
            };
            let pos = match sim.entity_position(id) {
                Some(p) => p,
                None => continue,
            };

            if !self.contains(&me, &pos) || sim.is_grasped(id) {
                continue;
            }

            debug!("{} is over {}, dropping it", name, my_name);
            sim.set_entity_position(id, Vector3::new(pos.x, pos.y / 2.0, pos.z));
            self.dropping.push(PendingDrop { id, name });
        }

        self.dropping.len()
    }

    /// Finish a drop by putting the entity on the floor.
    fn settle(sim: &mut dyn Simulator, d: &PendingDrop) -> Result<(), ZoneError> {
        let pos = sim
            .entity_position(d.id)
            .ok_or_else(|| ZoneError::EntityVanished(d.name.clone()))?;

        if !sim.set_entity_position(d.id, Vector3::new(pos.x, 0.0, pos.z)) {
            return Err(ZoneError::EntityVanished(d.name.clone()));
        }

        Ok(())
    }
}

impl Controller for TrashBoxZone {
    fn on_init(&mut self, sim: &mut dyn Simulator) {
        info!("TrashBoxZone initialised for {}", sim.my_name());
    }

    fn on_action(&mut self, sim: &mut dyn Simulator, now_s: f64) -> f64 {
        if !self.dropping.is_empty() {
            if now_s < self.settle_at_s {
                return self.settle_at_s - now_s;
            }

            for d in self.dropping.drain(..) {
                match Self::settle(sim, &d) {
                    Ok(()) => info!("Clean Up succeeded: {} is in {}", d.name, sim.my_name()),
                    Err(e) => warn!("{}", e),
                }
            }
        }

        if self.scan(sim) > 0 {
            self.settle_at_s = now_s + self.params.drop_delay_s;
            self.params.drop_delay_s
        } else {
            self.params.tick_period_s
        }
    }

    fn on_recv_msg(&mut self, _sim: &mut dyn Simulator, sender: &str, text: &str) {
        debug!("TrashBoxZone ignoring \"{}\" from {}", text, sender);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::World;

    #[test]
    fn test_two_phase_drop() {
        let mut world = World::new();
        let zone_id = world.add_entity("trashbox_0", Vector3::new(-150.0, 0.0, 0.0));
        world.add_entity("can_0", Vector3::new(-145.0, 60.0, 15.0));
        world.add_entity("can_1", Vector3::new(-135.0, 60.0, 0.0));
        world.add_entity("can_2", Vector3::new(-150.0, 30.0, 0.0));
        world.add_entity("trashbox_1", Vector3::new(-150.0, 50.0, 0.0));

        let mut zone = TrashBoxZone::new(ZoneParams::default());
        let mut view = world.view(zone_id).unwrap();
        zone.on_init(&mut view);

        // First phase halves the height and asks to be woken for the second
        let next = zone.on_action(&mut view, 1.0);
        assert!((next - 0.5).abs() < 1e-12);
        drop(view);
        assert_eq!(world.position_of("can_0").unwrap().y, 30.0);

        // Outside the opening, below it, or excluded
        assert_eq!(world.position_of("can_1").unwrap().y, 60.0);
        assert_eq!(world.position_of("can_2").unwrap().y, 30.0);
        assert_eq!(world.position_of("trashbox_1").unwrap().y, 50.0);

        let mut view = world.view(zone_id).unwrap();
        let next = zone.on_action(&mut view, 1.5);
        assert!((next - 1.0).abs() < 1e-12);
        drop(view);
        let pos = world.position_of("can_0").unwrap();
        assert_eq!((pos.x, pos.y, pos.z), (-145.0, 0.0, 15.0));
    }

    #[test]
    fn test_held_entities_not_dropped() {
        let mut world = World::new();
        let robot = world.add_robot("robot_001", Vector3::new(-133.5, 0.0, -12.0), 0.0);
        let zone_id = world.add_entity("trashbox_0", Vector3::new(-150.0, 0.0, 0.0));
        world.add_entity("can_0", Vector3::new(-150.0, 60.0, 0.0));

        {
            let mut view = world.view(robot).unwrap();
            assert!(view.grasp("RARM_LINK7", "can_0"));
        }
        world.step(0.01);
        let held_at = world.position_of("can_0").unwrap();

        let mut zone = TrashBoxZone::new(ZoneParams::default());
        let mut view = world.view(zone_id).unwrap();
        assert!(zone.contains(&view.my_position(), &held_at));
        assert_eq!(zone.on_action(&mut view, 0.0), 1.0);
        drop(view);
        assert_eq!(world.position_of("can_0").unwrap(), held_at);
    }
}
