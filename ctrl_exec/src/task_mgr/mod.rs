//! # TaskMgr module
//!
//! This module implements the [`TaskMgr`] state machine, which performs the pick-and-place task of
//! a cleanup robot. The machine is broken down into a number of phases:
//!
//! - `Connect` - Wait for the recognition service, stow the arms and announce readiness.
//! - `Locate` - Report the robot's position to the service and wait for a directive.
//! - `Approach` - Turn to and drive towards a target given by the service.
//! - `Routed` - Follow a route planned on board around a room obstacle, node by node.
//! - `Grasp` - Line the offset arm up with the object, lower it, and check the grasp.
//! - `Deliver` - Take the held object to its box, release it, and ask for the next one.
//! - `Explore` - Random walk scene capture, directed by the service.
//!
//! Each timed state issues its command on the first tick it is in, storing a completion time, and
//! completes on the first tick at or after that time. Messages from the service set the targets
//! and re-arm the machine in a new state.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod approach;
mod candidates;
mod connect;
mod deliver;
mod explore;
mod grasp;
mod locate;
mod params;
mod routed;
mod scene;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt::Display;

use comms_if::msg::{Msg, Reply};
use log::{debug, error, info, trace, warn};
use nalgebra::Vector3;
use serde::Serialize;

use crate::{
    kinematics::{DiffDrive, DriveParams, KinematicsError, Pose},
    msg_processor,
    router::{Route, RouteError, Router, RouterParams},
    sim::{Collision, Controller, Simulator},
};

pub use candidates::{CandidatePool, Target};
pub use params::{BoxFootprint, MissionProfile, TaskMgrParams};
pub use scene::{RANDOM_ROUTE_HEADER, RESET_HEADER};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Task Manager
///
/// Drives one cleanup robot through the pick-and-place task.
pub struct TaskMgr {
    /// Parameters for the TaskMgr and its mission profile.
    pub params: TaskMgrParams,

    pub(crate) drive: DiffDrive,

    pub(crate) router: Router,

    /// The current state.
    state: TaskState,

    /// Set once the current state's action has been issued.
    executed: bool,

    /// Time at which the current timed state completes.
    deadline_s: f64,

    /// Data valid over all states.
    pub(crate) data: TaskData,
}

/// Data which persists across states.
#[derive(Debug)]
pub struct TaskData {
    /// The service, once connected
    pub service: Option<String>,

    /// Which flow the current pick follows
    pub mode: PickMode,

    /// Point given by the latest directive.
    ///
    /// Units: centimeters
    pub next_pos: Vector3<f64>,

    /// Arrival range given by the latest directive.
    ///
    /// Units: centimeters
    pub range_cm: f64,

    /// Point to face after a random walk step, and whether to face it.
    pub looking_pos: Vector3<f64>,
    pub look: bool,

    /// The object being collected
    pub target: Option<Target>,

    /// Where the held object is to be put.
    ///
    /// Units: centimeters
    pub box_pos: Vector3<f64>,

    /// Route being followed in the self-routed flow
    pub route: Route,

    /// Objects still to be collected
    pub candidates: CandidatePool,

    /// True while the gripper holds something
    pub grasped: bool,

    /// Name of the entity in the gripper
    pub held: Option<String>,

    /// True while the grasp joint is away from its raised position
    pub arm_lowered: bool,

    /// Ticks spent checking the grasp
    pub grasp_polls: u32,

    /// Camera used in scene reports
    pub cam_id: u32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can occur in the task manager.
#[derive(Debug, thiserror::Error)]
pub enum TaskMgrError {
    #[error("Failed to load TaskMgr parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Entity {0} does not exist")]
    MissingEntity(String),

    #[error("Cannot plan a route: {0}")]
    NoRoute(String),

    #[error("Not connected to the {0} service")]
    NotConnected(String),

    #[error("Kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),

    #[error("Routing error: {0}")]
    Route(#[from] RouteError),

    #[error("{0} computed a non-finite completion time")]
    NonFiniteDeadline(TaskState),
}

/// How an object is being picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PickMode {
    /// The service directs each approach
    Guided,

    /// The robot plans its own routes around the room obstacles
    Routed,
}

/// What a route leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RouteGoal {
    Object,
    Box,
}

/// States of the task machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskState {
    // ---- CONNECT ----
    Init,
    AwaitService,

    // ---- LOCATE ----
    AskPos,
    AskRoute,
    AwaitDirection,

    // ---- APPROACH ----
    RotateToTarget,
    Translate,
    Arrived,

    // ---- ROUTED ----
    FollowRoute(RouteGoal),
    RouteTranslate(RouteGoal),
    RouteNodeReached(RouteGoal),

    // ---- GRASP ----
    FaceObject,
    AdjustApproachAngle,
    LowerArm,
    RetractArm,
    CheckGrasp,
    RecoverArm,

    // ---- DELIVER ----
    RotateToBox,
    TranslateToBox,
    ArrivedAtBox,
    FaceBox,
    AlignForRelease,
    Release,
    SettleRelease,
    RaiseArm,
    AskNext,

    // ---- EXPLORE ----
    SceneReport,
    ExploreTurn,
    ExploreDrive,
    ExploreLook,
    ExploreSettled,
    TurnToDir,

    // ---- END ----
    Finish,
    Idle,
}

/// Outcome of stepping a state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Transition {
    Stay,
    To(TaskState),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TaskMgr {
    pub fn new(params: TaskMgrParams, drive: DriveParams, router: RouterParams) -> Self {
        let candidates =
            CandidatePool::new(params.profile.candidates.clone(), params.profile.seed);

        Self {
            data: TaskData {
                service: None,
                mode: PickMode::Guided,
                next_pos: Vector3::zeros(),
                range_cm: 0.0,
                looking_pos: Vector3::zeros(),
                look: false,
                target: None,
                box_pos: Vector3::zeros(),
                route: Route::default(),
                candidates,
                grasped: false,
                held: None,
                arm_lowered: false,
                grasp_polls: 0,
                cam_id: params.profile.scene_cam_id,
            },
            params,
            drive: DiffDrive::new(drive),
            router: Router::new(router),
            state: TaskState::Init,
            executed: false,
            deadline_s: 0.0,
        }
    }

    /// Load the parameters from the given files, relative to the params directory.
    pub fn init(task_path: &str, drive_path: &str, router_path: &str) -> Result<Self, TaskMgrError> {
        let params = util::params::load(task_path).map_err(TaskMgrError::ParamLoadError)?;
        let drive = util::params::load(drive_path).map_err(TaskMgrError::ParamLoadError)?;
        let router = util::params::load(router_path).map_err(TaskMgrError::ParamLoadError)?;

        Ok(Self::new(params, drive, router))
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn deadline_s(&self) -> f64 {
        self.deadline_s
    }

    pub fn data(&self) -> &TaskData {
        &self.data
    }

    /// Step the machine once.
    pub fn step(&mut self, sim: &mut dyn Simulator, now_s: f64) {
        use TaskState::*;

        let out = match self.state {
            Init => self.step_init(sim),
            AwaitService => self.step_await_service(sim, now_s),

            AskPos => self.step_ask_pos(sim),
            AskRoute => self.step_ask_route(sim),
            AwaitDirection => Ok(Transition::Stay),

            RotateToTarget => self.step_rotate_to_target(sim, now_s),
            Translate => self.step_translate(sim, now_s),
            Arrived => self.step_arrived(sim),

            FollowRoute(g) => self.step_follow_route(sim, now_s, g),
            RouteTranslate(g) => self.step_route_translate(sim, now_s, g),
            RouteNodeReached(g) => self.step_route_node_reached(g),

            FaceObject => self.step_face_object(sim, now_s),
            AdjustApproachAngle => self.step_adjust_approach_angle(sim, now_s),
            LowerArm => self.step_lower_arm(sim, now_s),
            RetractArm => self.step_retract_arm(sim, now_s),
            CheckGrasp => self.step_check_grasp(sim),
            RecoverArm => self.step_recover_arm(sim, now_s),

            RotateToBox => self.step_rotate_to_box(sim, now_s),
            TranslateToBox => self.step_translate_to_box(sim, now_s),
            ArrivedAtBox => self.step_arrived_at_box(sim),
            FaceBox => self.step_face_box(sim, now_s),
            AlignForRelease => self.step_align_for_release(sim, now_s),
            Release => self.step_release(sim),
            SettleRelease => self.step_settle_release(sim, now_s),
            RaiseArm => self.step_raise_arm(sim, now_s),
            AskNext => self.step_ask_next(sim),

            SceneReport => self.step_scene_report(sim),
            ExploreTurn => self.step_explore_turn(sim, now_s),
            ExploreDrive => self.step_explore_drive(sim, now_s),
            ExploreLook => self.step_explore_look(sim, now_s),
            ExploreSettled => self.step_explore_settled(sim),
            TurnToDir => self.step_turn_to_dir(sim, now_s),

            Finish => {
                self.stop_all(sim);
                Ok(Transition::To(Idle))
            }
            Idle => Ok(Transition::Stay),
        };

        // An erroring state stops the robot and parks the machine until a new directive arrives
        match out {
            Ok(Transition::Stay) => (),
            Ok(Transition::To(s)) => self.set_state(s),
            Err(e) => {
                error!("{} failed: {}", self.state, e);
                self.stop_all(sim);
                self.set_state(TaskState::Idle);
            }
        }
    }

    /// Move to a new state, arming it for the next tick.
    pub(crate) fn set_state(&mut self, state: TaskState) {
        self.state = state;
        self.executed = false;
        info!("TaskMgr state change to: {}", self.state);
    }

    /// Move to a new state which has nothing left to issue.
    pub(crate) fn set_state_latched(&mut self, state: TaskState) {
        self.set_state(state);
        self.executed = true;
    }

    /// Run a timed state.
    ///
    /// `start` is called on the first tick of the state and returns the completion time. `done` is
    /// called on the first tick at or after the completion time.
    pub(crate) fn timed<S, D>(
        &mut self,
        sim: &mut dyn Simulator,
        now_s: f64,
        start: S,
        done: D,
    ) -> Result<Transition, TaskMgrError>
    where
        S: FnOnce(&mut Self, &mut dyn Simulator, f64) -> Result<f64, TaskMgrError>,
        D: FnOnce(&mut Self, &mut dyn Simulator, f64) -> Result<Transition, TaskMgrError>,
    {
        if !self.executed {
            let deadline_s = start(self, sim, now_s)?;
            if !deadline_s.is_finite() {
                return Err(TaskMgrError::NonFiniteDeadline(self.state));
            }
            self.deadline_s = deadline_s;
            self.executed = true;
            trace!("{} completes at {:.3} s", self.state, self.deadline_s);
            Ok(Transition::Stay)
        } else if now_s >= self.deadline_s {
            done(self, sim, now_s)
        } else {
            Ok(Transition::Stay)
        }
    }

    /// Send a message to the recognition service.
    pub(crate) fn send(&self, sim: &mut dyn Simulator, reply: &Reply) -> Result<(), TaskMgrError> {
        match self.data.service.as_deref() {
            Some(s) => {
                sim.send_to_service(s, &reply.to_string());
                Ok(())
            }
            None => Err(TaskMgrError::NotConnected(self.params.service.clone())),
        }
    }

    /// Current pose of the robot.
    pub(crate) fn pose(&self, sim: &dyn Simulator) -> Pose {
        Pose::from_sim(sim)
    }

    /// Stop the wheels and every arm joint.
    pub(crate) fn stop_all(&self, sim: &mut dyn Simulator) {
        self.drive.stop(sim);
        for j in self.params.profile.stow_joints.iter() {
            sim.set_joint_velocity(j, 0.0);
        }
        sim.set_joint_velocity(&self.params.profile.grasp_joint, 0.0);
    }

    /// Start raising the grasp joint if it is lowered, returning when it will be raised.
    pub(crate) fn raise_arm(&mut self, sim: &mut dyn Simulator, now_s: f64) -> f64 {
        if !self.data.arm_lowered {
            return now_s;
        }

        sim.set_joint_velocity(
            &self.params.profile.grasp_joint,
            -self.drive.params().joint_vel_rads,
        );
        self.data.arm_lowered = false;
        now_s + self.drive.params().arm_swing_duration_s()
    }

    pub(crate) fn stop_arm(&self, sim: &mut dyn Simulator) {
        sim.set_joint_velocity(&self.params.profile.grasp_joint, 0.0);
    }

    /// The robot's position and heading as sent on the wire.
    pub(crate) fn wire_pose(&self, sim: &dyn Simulator) -> (f64, f64, f64) {
        let pose = self.pose(sim);
        (pose.position_cm.x, pose.position_cm.z, pose.heading_deg())
    }
}

impl Controller for TaskMgr {
    fn on_init(&mut self, sim: &mut dyn Simulator) {
        let p = self.drive.params();
        sim.set_wheel(p.wheel_radius_cm, p.axle_distance_cm);

        info!("TaskMgr initialised for {}", sim.my_name());
        self.set_state(TaskState::Init);
    }

    fn on_action(&mut self, sim: &mut dyn Simulator, now_s: f64) -> f64 {
        self.step(sim, now_s);
        self.params.tick_period_s
    }

    fn on_recv_msg(&mut self, sim: &mut dyn Simulator, sender: &str, text: &str) {
        let msg = match Msg::parse(text) {
            Ok(m) => m,
            Err(e) => {
                warn!("Dropping message from {}: {}", sender, e);
                return;
            }
        };

        if let Err(e) = msg_processor::exec(self, sim, sender, &msg) {
            error!("Error processing {:?} from {}: {}", msg, sender, e);
            self.stop_all(sim);
            self.set_state(TaskState::Idle);
        }
    }

    fn on_collision(&mut self, sim: &mut dyn Simulator, collisions: &[Collision]) {
        self.handle_collisions(sim, collisions);
    }
}

impl Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TaskState::{:?}", self)
    }
}


#[cfg(test)]
mod test {
    use super::test_util::*;
    use super::*;

    #[test]
    fn test_state_holds_until_deadline() {
        let (mut world, robot, mut mgr) = setup();

        recv(&mut world, robot, &mut mgr, "ObjDir 50.0 0.0 50.0 10.0");
        assert_eq!(mgr.state(), TaskState::RotateToTarget);

        // First tick issues the turn
        {
            let mut view = world.view(robot).unwrap();
            mgr.step(&mut view, 1.0);
        }
        let deadline = mgr.deadline_s();
        assert!(deadline > 1.0);

        // Ticks short of the deadline never advance
        let mut t = 1.0;
        while t < deadline - 1e-6 {
            let mut view = world.view(robot).unwrap();
            mgr.step(&mut view, t);
            assert_eq!(mgr.state(), TaskState::RotateToTarget);
            t += 0.01;
        }

        // Exactly at the deadline it does
        let mut view = world.view(robot).unwrap();
        mgr.step(&mut view, deadline);
        assert_eq!(mgr.state(), TaskState::Translate);
    }

    #[test]
    fn test_obj_dir_approach() {
        let (mut world, robot, mut mgr) = setup();

        recv(&mut world, robot, &mut mgr, "ObjDir 50.0 0.0 50.0 10.0");

        // Rotation is about 45 degrees towards +x
        {
            let mut view = world.view(robot).unwrap();
            mgr.step(&mut view, 0.0);
        }
        let rotate_s = mgr.deadline_s();
        let expected_rotate_s = 10.0 * std::f64::consts::FRAC_PI_4 / (2.0 * 10.0 * 1.0);
        assert!((rotate_s - expected_rotate_s).abs() < 1e-9);
        assert_eq!(world.wheel_velocity("robot_000"), Some((-1.0, 1.0)));

        // Complete the turn exactly, then the translation starts
        world.step(rotate_s);
        {
            let mut view = world.view(robot).unwrap();
            mgr.step(&mut view, rotate_s);
            assert_eq!(mgr.state(), TaskState::Translate);
            mgr.step(&mut view, rotate_s);
        }
        let drive_s = mgr.deadline_s() - rotate_s;
        let expected_drive_s = (50f64.hypot(50.0) - 10.0) / (10.0 * 4.0);
        assert!((drive_s - expected_drive_s).abs() < 1e-9);
        assert_eq!(world.wheel_velocity("robot_000"), Some((4.0, 4.0)));

        world.step(drive_s);
        let pos = world.position_of("robot_000").unwrap();
        let dist = (50.0 - pos.x).hypot(50.0 - pos.z);
        assert!((dist - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_errors_park_the_machine() {
        let (mut world, robot, mut mgr) = setup();
        mgr.data.service = None;

        mgr.set_state(TaskState::AskPos);
        {
            let mut view = world.view(robot).unwrap();
            mgr.step(&mut view, 0.0);
        }

        assert_eq!(mgr.state(), TaskState::Idle);
        assert_eq!(world.wheel_velocity("robot_000"), Some((0.0, 0.0)));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            TaskState::FollowRoute(RouteGoal::Box).to_string(),
            "TaskState::FollowRoute(Box)"
        );
        assert_eq!(TaskState::Idle.to_string(), "TaskState::Idle");
    }
}
