//! # Simulator interface
//!
//! The simulation host owns every entity in the scene. A controller only ever sees the host through
//! the [`Simulator`] trait, which is the view of the host's object API from one controlled entity,
//! and is driven by the host through the [`Controller`] callbacks.
//!
//! [`World`] provides an in-memory host used by the executable and by the tests.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod world;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Quaternion, Vector3};
use serde::{Deserialize, Serialize};

pub use world::{World, WorldView, WorldParams, EntityDef, GripperParams, CameraDef};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Handle to an entity in the simulation, resolved once from the entity's name.
///
/// A handle is not a guarantee that the entity still exists, any access through the handle can
/// fail softly (returning `None`/`false`) if the entity has since been removed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub usize);

/// A collision between one of the controlled entity's parts and another entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    /// The part of the controlled entity which collided
    pub my_part: String,

    /// The name of the other entity
    pub with: String,

    /// The part of the other entity which collided
    pub with_part: String,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The host object API as seen by a single controlled entity.
///
/// Positions are world coordinates in centimeters with y up, angles are radians.
pub trait Simulator {
    /// Name of the controlled entity.
    fn my_name(&self) -> &str;

    /// Position of the controlled entity.
    fn my_position(&self) -> Vector3<f64>;

    /// Teleport the controlled entity.
    fn set_my_position(&mut self, pos_cm: Vector3<f64>);

    /// Raw orientation quaternion of the controlled entity.
    fn my_rotation(&self) -> Quaternion<f64>;

    /// Set the orientation of the controlled entity to a rotation about the y axis.
    fn set_my_heading(&mut self, heading_rad: f64);

    /// Set the wheel geometry of the controlled robot.
    fn set_wheel(&mut self, radius_cm: f64, distance_cm: f64);

    /// Set the left and right wheel angular velocities.
    fn set_wheel_velocity(&mut self, left_rads: f64, right_rads: f64);

    /// Set the angular velocity of a named joint.
    fn set_joint_velocity(&mut self, joint: &str, vel_rads: f64);

    /// Direction of a camera, or `None` if the camera does not exist.
    fn camera_dir(&self, cam_id: u32) -> Option<Vector3<f64>>;

    /// Point a camera in the given direction.
    fn set_camera_dir(&mut self, cam_id: u32, dir: Vector3<f64>);

    /// Position of a camera in the frame of the link it is mounted on.
    fn camera_pos(&self, cam_id: u32) -> Option<Vector3<f64>>;

    /// Name of the link a camera is mounted on.
    fn camera_link(&self, cam_id: u32) -> Option<String>;

    /// World position of one of the controlled entity's parts.
    fn part_position(&self, part: &str) -> Option<Vector3<f64>>;

    /// Attach the named entity to one of the controlled entity's parts.
    fn grasp(&mut self, part: &str, entity: &str) -> bool;

    /// Release whatever is attached to the part.
    fn release(&mut self, part: &str);

    /// Names of all entities in the scene.
    fn entity_names(&self) -> Vec<String>;

    /// Resolve an entity's name into a handle.
    fn resolve(&self, name: &str) -> Option<EntityId>;

    /// Position of an entity, `None` if it no longer exists.
    fn entity_position(&self, id: EntityId) -> Option<Vector3<f64>>;

    /// Move an entity, returns false if it no longer exists.
    fn set_entity_position(&mut self, id: EntityId, pos_cm: Vector3<f64>) -> bool;

    /// Returns true if the entity is currently held by any robot.
    fn is_grasped(&self, id: EntityId) -> bool;

    /// Check a service is available and connect to it.
    fn connect_service(&mut self, service: &str) -> bool;

    /// Send a message to a connected service.
    fn send_to_service(&mut self, service: &str, msg: &str);

    /// Broadcast a message to all services.
    fn broadcast(&mut self, msg: &str);

    /// Capture the view of a camera into the named file.
    fn capture_view(&mut self, cam_id: u32, file_name: &str) -> bool;
}

/// The callbacks the host invokes on each controller.
///
/// The host never calls two callbacks of the same controller concurrently. Collisions for a tick
/// are delivered before that tick's `on_action`.
pub trait Controller {
    /// Called once when the scene starts.
    fn on_init(&mut self, sim: &mut dyn Simulator);

    /// Called once per tick, returns the number of seconds until the next tick.
    fn on_action(&mut self, sim: &mut dyn Simulator, now_s: f64) -> f64;

    /// Called for every message delivered to the controlled entity.
    fn on_recv_msg(&mut self, sim: &mut dyn Simulator, sender: &str, text: &str);

    /// Called with the collisions of the controlled entity since the last tick.
    fn on_collision(&mut self, _sim: &mut dyn Simulator, _collisions: &[Collision]) {}
}
