//! # In-memory simulation world
//!
//! A minimal kinematic host: robots integrate their wheel and joint velocities, held entities
//! follow the gripper, and a moving arm produces gripper collisions with nearby entities. There is
//! no physics beyond this, released entities stay where they are let go.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::{BTreeMap, HashMap};

use comms_if::msg::Envelope;
use log::{debug, trace};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::Deserialize;

use super::{Collision, EntityId, Simulator};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Target name used in the outbox for broadcast messages.
pub const BROADCAST_TARGET: &str = "*";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters describing the scene of a [`World`].
#[derive(Debug, Clone, Deserialize)]
pub struct WorldParams {
    /// Services that controllers may connect to
    pub services: Vec<String>,

    /// Entities in the scene
    pub entities: Vec<EntityDef>,

    /// Gripper geometry shared by all robots
    pub gripper: GripperParams,

    /// Cameras mounted on every robot
    pub cameras: Vec<CameraDef>,
}

/// Definition of an entity in the scene.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityDef {
    pub name: String,

    /// Units: centimeters
    pub position_cm: [f64; 3],

    /// Units: degrees
    #[serde(default)]
    pub heading_deg: f64,

    /// True if the entity is a wheeled robot
    #[serde(default)]
    pub robot: bool,
}

/// Gripper geometry, relative to the robot's body frame.
#[derive(Debug, Clone, Deserialize)]
pub struct GripperParams {
    /// Name of the gripper link
    pub part: String,

    /// Forward offset of the gripper from the robot centre.
    ///
    /// Units: centimeters
    pub reach_cm: f64,

    /// Sideways offset of the gripper (the arm's shoulder offset).
    ///
    /// Units: centimeters
    pub lateral_cm: f64,

    /// Height of the gripper above the robot origin.
    ///
    /// Units: centimeters
    pub height_cm: f64,

    /// Planar distance at which an entity touches the gripper.
    ///
    /// Units: centimeters
    pub contact_radius_cm: f64,
}

/// A camera mounted on a robot.
#[derive(Debug, Clone, Deserialize)]
pub struct CameraDef {
    pub id: u32,

    /// Link the camera is mounted on
    pub link: String,

    /// Position in the link frame.
    ///
    /// Units: centimeters
    pub pos_cm: [f64; 3],

    /// Initial view direction
    pub dir: [f64; 3],
}

/// The in-memory host.
#[derive(Debug)]
pub struct World {
    entities: Vec<Entity>,
    services: Vec<String>,
    gripper: GripperParams,
    cameras: Vec<CameraDef>,
    outbox: Vec<Envelope>,
    captures: Vec<String>,
}

/// A [`Simulator`] view of the world from one entity.
pub struct WorldView<'w> {
    world: &'w mut World,
    me: EntityId,
}

#[derive(Debug)]
struct Entity {
    name: String,
    position_cm: Vector3<f64>,
    heading_rad: f64,
    removed: bool,
    body: Option<RobotBody>,
}

#[derive(Debug, Default)]
struct RobotBody {
    wheel_radius_cm: f64,
    axle_distance_cm: f64,
    left_rads: f64,
    right_rads: f64,
    joint_vel_rads: HashMap<String, f64>,
    joint_angle_rad: HashMap<String, f64>,
    cam_dirs: BTreeMap<u32, Vector3<f64>>,
    held: HashMap<String, EntityId>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for GripperParams {
    fn default() -> Self {
        Self {
            part: String::from("RARM_LINK7"),
            reach_cm: 12.0,
            lateral_cm: 16.5,
            height_cm: 60.0,
            contact_radius_cm: 10.0,
        }
    }
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            services: vec![],
            entities: vec![],
            gripper: GripperParams::default(),
            cameras: vec![
                CameraDef {
                    id: 1,
                    link: String::from("HEAD_LINK"),
                    pos_cm: [0.0, 10.0, 5.0],
                    dir: [0.0, -1.0, 1.0],
                },
                CameraDef {
                    id: 2,
                    link: String::from("HEAD_LINK"),
                    pos_cm: [0.0, 10.0, 5.0],
                    dir: [0.0, -1.0, 1.0],
                },
                CameraDef {
                    id: 3,
                    link: String::from("WAIST_LINK0"),
                    pos_cm: [0.0, 100.0, 10.0],
                    dir: [0.0, 0.0, 1.0],
                },
            ],
        }
    }
}

impl World {
    /// Create an empty world using the default gripper and cameras.
    pub fn new() -> Self {
        Self::from_params(&WorldParams::default())
    }

    /// Build the world described by the parameters.
    pub fn from_params(params: &WorldParams) -> Self {
        let mut world = Self {
            entities: vec![],
            services: params.services.clone(),
            gripper: params.gripper.clone(),
            cameras: params.cameras.clone(),
            outbox: vec![],
            captures: vec![],
        };

        for def in params.entities.iter() {
            let pos = Vector3::from(def.position_cm);
            if def.robot {
                world.add_robot(&def.name, pos, def.heading_deg.to_radians());
            } else {
                world.add_entity(&def.name, pos);
            }
        }

        world
    }

    /// Add a passive entity.
    pub fn add_entity(&mut self, name: &str, position_cm: Vector3<f64>) -> EntityId {
        self.entities.push(Entity {
            name: name.to_string(),
            position_cm,
            heading_rad: 0.0,
            removed: false,
            body: None,
        });
        EntityId(self.entities.len() - 1)
    }

    /// Add a wheeled robot.
    pub fn add_robot(&mut self, name: &str, position_cm: Vector3<f64>, heading_rad: f64) -> EntityId {
        let mut body = RobotBody::default();
        for cam in self.cameras.iter() {
            body.cam_dirs.insert(cam.id, Vector3::from(cam.dir));
        }

        self.entities.push(Entity {
            name: name.to_string(),
            position_cm,
            heading_rad,
            removed: false,
            body: Some(body),
        });
        EntityId(self.entities.len() - 1)
    }

    /// Make a service available for connection.
    pub fn add_service(&mut self, name: &str) {
        if !self.services.iter().any(|s| s == name) {
            self.services.push(name.to_string());
        }
    }

    /// Remove an entity from the scene, existing handles to it become invalid.
    pub fn remove_entity(&mut self, name: &str) -> bool {
        match self.id_of(name) {
            Some(id) => {
                self.entities[id.0].removed = true;
                for e in self.entities.iter_mut() {
                    if let Some(b) = e.body.as_mut() {
                        b.held.retain(|_, h| *h != id);
                    }
                }
                true
            }
            None => false,
        }
    }

    /// Get the handle of a live entity.
    pub fn id_of(&self, name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .position(|e| !e.removed && e.name == name)
            .map(EntityId)
    }

    /// Get a [`Simulator`] view of the world from the given entity.
    pub fn view(&mut self, me: EntityId) -> Option<WorldView<'_>> {
        if me.0 < self.entities.len() {
            Some(WorldView { world: self, me })
        } else {
            None
        }
    }

    /// Position of a live entity.
    pub fn position_of(&self, name: &str) -> Option<Vector3<f64>> {
        self.id_of(name).map(|id| self.entities[id.0].position_cm)
    }

    /// Heading of a live entity.
    pub fn heading_of(&self, name: &str) -> Option<f64> {
        self.id_of(name).map(|id| self.entities[id.0].heading_rad)
    }

    /// Wheel velocities of a robot.
    pub fn wheel_velocity(&self, name: &str) -> Option<(f64, f64)> {
        self.body(name).map(|b| (b.left_rads, b.right_rads))
    }

    /// Velocity of a robot's joint, zero if it has never been commanded.
    pub fn joint_velocity(&self, name: &str, joint: &str) -> Option<f64> {
        self.body(name)
            .map(|b| b.joint_vel_rads.get(joint).copied().unwrap_or(0.0))
    }

    /// Name of the entity held by a robot's part.
    pub fn held_by(&self, name: &str, part: &str) -> Option<String> {
        self.body(name)
            .and_then(|b| b.held.get(part))
            .map(|id| self.entities[id.0].name.clone())
    }

    /// All messages sent so far.
    pub fn outbox(&self) -> &[Envelope] {
        &self.outbox
    }

    /// Take all messages sent so far, leaving the outbox empty.
    pub fn take_outbox(&mut self) -> Vec<Envelope> {
        std::mem::take(&mut self.outbox)
    }

    /// File names of all captured views.
    pub fn captures(&self) -> &[String] {
        &self.captures
    }

    /// Advance the world by `dt_s` seconds, returning the collisions each robot had.
    pub fn step(&mut self, dt_s: f64) -> Vec<(EntityId, Collision)> {
        let mut collisions = vec![];

        for i in 0..self.entities.len() {
            if self.entities[i].removed {
                continue;
            }

            let (arm_moving, held) = {
                let e = &mut self.entities[i];
                let body = match e.body.as_mut() {
                    Some(b) => b,
                    None => continue,
                };

                let speed_cms = body.wheel_radius_cm * (body.left_rads + body.right_rads) / 2.0;
                let yaw_rate_rads = if body.axle_distance_cm > 0.0 {
                    body.wheel_radius_cm * (body.right_rads - body.left_rads) / body.axle_distance_cm
                } else {
                    0.0
                };

                e.position_cm.x += speed_cms * e.heading_rad.sin() * dt_s;
                e.position_cm.z += speed_cms * e.heading_rad.cos() * dt_s;
                e.heading_rad = util::maths::wrap_pi(e.heading_rad + yaw_rate_rads * dt_s);

                for (joint, vel) in body.joint_vel_rads.iter() {
                    *body.joint_angle_rad.entry(joint.clone()).or_insert(0.0) += vel * dt_s;
                }

                (
                    body.joint_vel_rads.values().any(|v| *v != 0.0),
                    body.held.values().copied().collect::<Vec<_>>(),
                )
            };

            let gripper = self.gripper_position(EntityId(i));

            for id in held.iter() {
                self.entities[id.0].position_cm = gripper;
            }

            if !arm_moving || !held.is_empty() {
                continue;
            }

            for (j, other) in self.entities.iter().enumerate() {
                if j == i || other.removed || other.body.is_some() || self.is_held(EntityId(j)) {
                    continue;
                }

                let dist_sq = util::maths::planar_dist_sq(
                    (gripper.x, gripper.z),
                    (other.position_cm.x, other.position_cm.z),
                );

                if dist_sq < self.gripper.contact_radius_cm.powi(2) {
                    trace!("{} touched {}", self.entities[i].name, other.name);
                    collisions.push((
                        EntityId(i),
                        Collision {
                            my_part: self.gripper.part.clone(),
                            with: other.name.clone(),
                            with_part: String::from("body"),
                        },
                    ));
                }
            }
        }

        collisions
    }

    fn body(&self, name: &str) -> Option<&RobotBody> {
        self.id_of(name).and_then(|id| self.entities[id.0].body.as_ref())
    }

    fn is_held(&self, id: EntityId) -> bool {
        self.entities
            .iter()
            .filter_map(|e| e.body.as_ref())
            .any(|b| b.held.values().any(|h| *h == id))
    }

    fn gripper_position(&self, id: EntityId) -> Vector3<f64> {
        let e = &self.entities[id.0];
        let (s, c) = e.heading_rad.sin_cos();
        let forward = Vector3::new(s, 0.0, c);
        let lateral = Vector3::new(-c, 0.0, s);

        e.position_cm
            + forward * self.gripper.reach_cm
            + lateral * self.gripper.lateral_cm
            + Vector3::new(0.0, self.gripper.height_cm, 0.0)
    }

    fn camera(&self, cam_id: u32) -> Option<&CameraDef> {
        self.cameras.iter().find(|c| c.id == cam_id)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl<'w> WorldView<'w> {
    fn me(&self) -> &Entity {
        &self.world.entities[self.me.0]
    }

    fn me_mut(&mut self) -> &mut Entity {
        &mut self.world.entities[self.me.0]
    }

    fn body_mut(&mut self) -> Option<&mut RobotBody> {
        self.me_mut().body.as_mut()
    }

    fn push_msg(&mut self, target: &str, msg: &str) {
        let sender = self.me().name.clone();
        debug!("{} -> {}: {}", sender, target, msg);
        self.world.outbox.push(Envelope {
            target: target.to_string(),
            sender,
            text: msg.to_string(),
        });
    }
}

impl<'w> Simulator for WorldView<'w> {
    fn my_name(&self) -> &str {
        &self.me().name
    }

    fn my_position(&self) -> Vector3<f64> {
        self.me().position_cm
    }

    fn set_my_position(&mut self, pos_cm: Vector3<f64>) {
        self.me_mut().position_cm = pos_cm;
    }

    fn my_rotation(&self) -> Quaternion<f64> {
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), self.me().heading_rad).into_inner()
    }

    fn set_my_heading(&mut self, heading_rad: f64) {
        self.me_mut().heading_rad = util::maths::wrap_pi(heading_rad);
    }

    fn set_wheel(&mut self, radius_cm: f64, distance_cm: f64) {
        if let Some(b) = self.body_mut() {
            b.wheel_radius_cm = radius_cm;
            b.axle_distance_cm = distance_cm;
        }
    }

    fn set_wheel_velocity(&mut self, left_rads: f64, right_rads: f64) {
        if let Some(b) = self.body_mut() {
            b.left_rads = left_rads;
            b.right_rads = right_rads;
        }
    }

    fn set_joint_velocity(&mut self, joint: &str, vel_rads: f64) {
        if let Some(b) = self.body_mut() {
            b.joint_vel_rads.insert(joint.to_string(), vel_rads);
        }
    }

    fn camera_dir(&self, cam_id: u32) -> Option<Vector3<f64>> {
        self.me().body.as_ref().and_then(|b| b.cam_dirs.get(&cam_id)).copied()
    }

    fn set_camera_dir(&mut self, cam_id: u32, dir: Vector3<f64>) {
        if let Some(b) = self.body_mut() {
            if let Some(d) = b.cam_dirs.get_mut(&cam_id) {
                *d = dir;
            }
        }
    }

    fn camera_pos(&self, cam_id: u32) -> Option<Vector3<f64>> {
        self.me().body.as_ref()?;
        self.world.camera(cam_id).map(|c| Vector3::from(c.pos_cm))
    }

    fn camera_link(&self, cam_id: u32) -> Option<String> {
        self.me().body.as_ref()?;
        self.world.camera(cam_id).map(|c| c.link.clone())
    }

    fn part_position(&self, part: &str) -> Option<Vector3<f64>> {
        self.me().body.as_ref()?;

        if part == self.world.gripper.part {
            Some(self.world.gripper_position(self.me))
        } else if self.world.cameras.iter().any(|c| c.link == part) {
            Some(self.me().position_cm)
        } else {
            None
        }
    }

    fn grasp(&mut self, part: &str, entity: &str) -> bool {
        if part != self.world.gripper.part {
            return false;
        }

        let id = match self.world.id_of(entity) {
            Some(id) if id != self.me && !self.world.is_held(id) => id,
            _ => return false,
        };

        match self.body_mut() {
            Some(b) if !b.held.contains_key(part) => {
                b.held.insert(part.to_string(), id);
                true
            }
            _ => false,
        }
    }

    fn release(&mut self, part: &str) {
        if let Some(b) = self.body_mut() {
            b.held.remove(part);
        }
    }

    fn entity_names(&self) -> Vec<String> {
        self.world
            .entities
            .iter()
            .filter(|e| !e.removed)
            .map(|e| e.name.clone())
            .collect()
    }

    fn resolve(&self, name: &str) -> Option<EntityId> {
        self.world.id_of(name)
    }

    fn entity_position(&self, id: EntityId) -> Option<Vector3<f64>> {
        self.world
            .entities
            .get(id.0)
            .filter(|e| !e.removed)
            .map(|e| e.position_cm)
    }

    fn set_entity_position(&mut self, id: EntityId, pos_cm: Vector3<f64>) -> bool {
        match self.world.entities.get_mut(id.0) {
            Some(e) if !e.removed => {
                e.position_cm = pos_cm;
                true
            }
            _ => false,
        }
    }

    fn is_grasped(&self, id: EntityId) -> bool {
        self.world.is_held(id)
    }

    fn connect_service(&mut self, service: &str) -> bool {
        self.world.services.iter().any(|s| s == service)
    }

    fn send_to_service(&mut self, service: &str, msg: &str) {
        self.push_msg(service, msg)
    }

    fn broadcast(&mut self, msg: &str) {
        self.push_msg(BROADCAST_TARGET, msg)
    }

    fn capture_view(&mut self, cam_id: u32, file_name: &str) -> bool {
        if self.world.camera(cam_id).is_none() {
            return false;
        }
        self.world.captures.push(file_name.to_string());
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_differential_drive_integration() {
        let mut world = World::new();
        let id = world.add_robot("robot_000", Vector3::zeros(), 0.0);

        {
            let mut view = world.view(id).unwrap();
            view.set_wheel(10.0, 10.0);
            view.set_wheel_velocity(1.0, 1.0);
        }

        // Straight ahead along +z at r * w = 10 cm/s
        for _ in 0..10 {
            world.step(0.1);
        }
        let pos = world.position_of("robot_000").unwrap();
        assert!(pos.x.abs() < 1e-9);
        assert!((pos.z - 10.0).abs() < 1e-9);

        // Left forward, right back turns clockwise (heading decreases) at 2 rad/s
        {
            let mut view = world.view(id).unwrap();
            view.set_wheel_velocity(1.0, -1.0);
        }
        world.step(0.25);
        assert!((world.heading_of("robot_000").unwrap() + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_grasp_and_carry() {
        let mut world = World::new();
        let robot = world.add_robot("robot_000", Vector3::zeros(), 0.0);
        let can = world.add_entity("can_0", Vector3::new(-16.5, 0.0, 12.0));

        {
            let mut view = world.view(robot).unwrap();
            view.set_joint_velocity("RARM_JOINT4", 0.6);
        }

        let collisions = world.step(0.1);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].1.with, "can_0");

        {
            let mut view = world.view(robot).unwrap();
            assert!(view.grasp("RARM_LINK7", "can_0"));
            assert!(view.is_grasped(can));
            assert!(!view.grasp("RARM_LINK7", "can_0"));
        }

        world.step(0.1);
        assert_eq!(world.held_by("robot_000", "RARM_LINK7"), Some("can_0".into()));
        assert!((world.position_of("can_0").unwrap().y - 60.0).abs() < 1e-9);

        {
            let mut view = world.view(robot).unwrap();
            view.release("RARM_LINK7");
            assert!(!view.is_grasped(can));
        }
    }

    #[test]
    fn test_removed_entities_fail_softly() {
        let mut world = World::new();
        let robot = world.add_robot("robot_000", Vector3::zeros(), 0.0);
        let can = world.add_entity("can_0", Vector3::new(0.0, 0.0, 30.0));

        assert!(world.remove_entity("can_0"));

        let mut view = world.view(robot).unwrap();
        assert_eq!(view.resolve("can_0"), None);
        assert_eq!(view.entity_position(can), None);
        assert!(!view.set_entity_position(can, Vector3::zeros()));
        assert_eq!(view.entity_names(), vec![String::from("robot_000")]);
    }

    #[test]
    fn test_messages() {
        let mut world = World::new();
        world.add_service("RecogTrash");
        let robot = world.add_robot("robot_000", Vector3::zeros(), 0.0);

        let mut view = world.view(robot).unwrap();
        assert!(view.connect_service("RecogTrash"));
        assert!(!view.connect_service("LayoutManager"));
        view.send_to_service("RecogTrash", "Start");
        view.broadcast("I found trash");

        let out = world.take_outbox();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].target, "RecogTrash");
        assert_eq!(out[0].sender, "robot_000");
        assert_eq!(out[1].target, BROADCAST_TARGET);
        assert!(world.outbox().is_empty());
    }
}
