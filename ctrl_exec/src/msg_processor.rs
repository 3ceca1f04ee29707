//! # Message processor module
//!
//! The message processor handles messages from the recognition service and the viewer, setting
//! the task manager's targets and re-arming it in the directed state.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use nalgebra::Vector3;

// Internal
use comms_if::msg::Msg;
use crate::sim::Simulator;
use crate::task_mgr::{PickMode, TaskMgr, TaskMgrError, TaskState, RANDOM_ROUTE_HEADER};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a message.
///
/// `RESET` is accepted from anyone, viewer messages only from the viewer, and everything else
/// only from the recognition service. Messages from anyone else are dropped.
pub(crate) fn exec(
    mgr: &mut TaskMgr,
    sim: &mut dyn Simulator,
    sender: &str,
    msg: &Msg,
) -> Result<(), TaskMgrError> {
    let allowed = if msg.is_broadcast_msg() {
        true
    } else if msg.is_viewer_msg() {
        sender == mgr.params.viewer
    } else {
        sender == mgr.params.service
    };

    if !allowed {
        warn!("Dropping {:?} from unexpected sender {}", msg, sender);
        return Ok(());
    }

    debug!("Recieved {:?} from {}", msg, sender);

    match *msg {
        // ---- PICK AND PLACE ----
        Msg::AskRobotPos => mgr.set_state(TaskState::AskPos),
        Msg::ObjDir { x_cm, y_cm, z_cm, range_cm } => {
            mgr.data.mode = PickMode::Guided;
            mgr.data.next_pos = Vector3::new(x_cm, y_cm, z_cm);
            mgr.data.range_cm = range_cm;
            mgr.set_state(TaskState::RotateToTarget);
        }
        Msg::Grab => {
            mgr.drive.stop(sim);
            mgr.data.mode = PickMode::Guided;
            mgr.set_state(TaskState::FaceObject);
        }
        Msg::TrashBoxDir { x_cm, y_cm, z_cm, range_cm } => {
            mgr.data.next_pos = Vector3::new(x_cm, y_cm, z_cm);
            mgr.data.box_pos = mgr.data.next_pos;
            mgr.data.range_cm = range_cm;
            mgr.set_state(TaskState::RotateToBox);
        }
        Msg::ThrowTrash => mgr.set_state(TaskState::AlignForRelease),
        Msg::Finish => mgr.set_state(TaskState::Finish),
        Msg::FindObjPlease => {
            let next = mgr.find_object(sim)?;
            mgr.set_state(next);
        }

        // ---- RANDOM WALK ----
        Msg::RandomRouteStart | Msg::RandomRouteArrived => mgr.set_state(TaskState::SceneReport),
        Msg::RandomRoute { x_cm, z_cm, range_cm, look_x_cm, look_z_cm, look } => {
            mgr.data.next_pos = Vector3::new(x_cm, 0.0, z_cm);
            mgr.data.range_cm = range_cm;
            mgr.data.looking_pos = Vector3::new(look_x_cm, 0.0, look_z_cm);
            mgr.data.look = look;
            mgr.set_state(TaskState::ExploreTurn);
        }

        // ---- TELEOPERATION ----
        Msg::GoForwardVelocity(c) => {
            let vel = c * mgr.drive.params().rotate_vel_rads * 10.0;
            sim.set_wheel_velocity(vel, vel);
            mgr.set_state_latched(TaskState::AwaitDirection);
        }
        Msg::RotateVelocity(c) => {
            let vel = c * mgr.drive.params().rotate_vel_rads;
            sim.set_wheel_velocity(-vel, vel);
            mgr.set_state_latched(TaskState::AwaitDirection);
        }
        Msg::Stop => {
            mgr.send_scene_info(sim, RANDOM_ROUTE_HEADER)?;
            mgr.set_state_latched(TaskState::AwaitDirection);
        }
        Msg::CamId(id) => mgr.data.cam_id = id,
        Msg::CaptureData { x_cm, z_cm, heading_deg } => {
            mgr.teleport(sim, x_cm, z_cm);
            sim.set_my_heading(heading_deg.to_radians());
            mgr.send_scene_info(sim, RANDOM_ROUTE_HEADER)?;
            mgr.set_state_latched(TaskState::AwaitDirection);
        }
        Msg::SetRobotPosition { x_cm, z_cm, look_x_cm, look_z_cm } => {
            let (dx, dz) = (look_x_cm - x_cm, look_z_cm - z_cm);
            mgr.teleport(sim, x_cm, z_cm);
            if dx != 0.0 || dz != 0.0 {
                sim.set_my_heading(dx.atan2(dz));
            }
            mgr.send_scene_info(sim, RANDOM_ROUTE_HEADER)?;
            mgr.set_state_latched(TaskState::AwaitDirection);
        }
        Msg::Reset => mgr.reset(sim)?,

        // ---- VIEWER ----
        Msg::CameraAngle(angle_deg) => {
            mgr.point_camera(sim, mgr.params.profile.reset_cam_id, angle_deg);
            mgr.send_scene_info(sim, RANDOM_ROUTE_HEADER)?;
            mgr.set_state_latched(TaskState::AwaitDirection);
        }
        Msg::RobotAngle(angle_deg) => {
            sim.set_my_heading(angle_deg.to_radians());
            mgr.send_scene_info(sim, RANDOM_ROUTE_HEADER)?;
            mgr.set_state_latched(TaskState::AwaitDirection);
        }
        Msg::RotateDir { x_cm, z_cm } => {
            mgr.data.next_pos = Vector3::new(x_cm, 0.0, z_cm);
            mgr.set_state(TaskState::TurnToDir);
        }
        Msg::RobotPosition { x_cm, z_cm } => mgr.teleport(sim, x_cm, z_cm),
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use crate::sim::Controller;
    use crate::task_mgr::test_util::*;

    use super::*;

    #[test]
    fn test_sender_rules() {
        let (mut world, robot, mut mgr) = setup();
        let mut view = world.view(robot).unwrap();

        // Service messages from the viewer are dropped
        mgr.on_recv_msg(&mut view, "SIGViewer", "ObjDir 10 0 10 5");
        assert_eq!(mgr.state(), TaskState::AwaitDirection);

        // Viewer messages from the service are dropped
        mgr.on_recv_msg(&mut view, "RecogTrash", "RotateDir 10 10");
        assert_eq!(mgr.state(), TaskState::AwaitDirection);

        mgr.on_recv_msg(&mut view, "SIGViewer", "RotateDir 10 10");
        assert_eq!(mgr.state(), TaskState::TurnToDir);
        assert_eq!(mgr.data().next_pos, Vector3::new(10.0, 0.0, 10.0));
    }

    #[test]
    fn test_malformed_messages_dropped() {
        let (mut world, robot, mut mgr) = setup();
        let mut view = world.view(robot).unwrap();

        mgr.on_recv_msg(&mut view, "RecogTrash", "ObjDir 10 0 10");
        mgr.on_recv_msg(&mut view, "RecogTrash", "ObjDir 10 0 ten 5");
        mgr.on_recv_msg(&mut view, "RecogTrash", "Dance");
        mgr.on_recv_msg(&mut view, "RecogTrash", "");

        assert_eq!(mgr.state(), TaskState::AwaitDirection);
        assert_eq!(mgr.data().next_pos, Vector3::zeros());
    }

    #[test]
    fn test_teleop() {
        let (mut world, robot, mut mgr) = setup();

        {
            let mut view = world.view(robot).unwrap();
            mgr.on_recv_msg(&mut view, "RecogTrash", "GoForwardVelocity 0.5");
        }
        assert_eq!(world.wheel_velocity("robot_000"), Some((5.0, 5.0)));

        {
            let mut view = world.view(robot).unwrap();
            mgr.on_recv_msg(&mut view, "RecogTrash", "RotateVelocity 2");
        }
        assert_eq!(world.wheel_velocity("robot_000"), Some((-2.0, 2.0)));

        {
            let mut view = world.view(robot).unwrap();
            mgr.on_recv_msg(&mut view, "RecogTrash", "CamID 3");
            mgr.on_recv_msg(&mut view, "RecogTrash", "Stop");
        }
        assert_eq!(world.wheel_velocity("robot_000"), Some((0.0, 0.0)));
        assert_eq!(mgr.data().cam_id, 3);

        let out = sent(&mut world);
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("AskRandomRoute "));
    }

    #[test]
    fn test_set_robot_position_faces_look_point() {
        let (mut world, robot, mut mgr) = setup();

        {
            let mut view = world.view(robot).unwrap();
            mgr.on_recv_msg(&mut view, "RecogTrash", "SetRobotPosition 50 50 0 0");
        }

        let pos = world.position_of("robot_000").unwrap();
        assert_eq!((pos.x, pos.z), (50.0, 50.0));

        // Looking back towards the origin, down and to the left
        let heading = world.heading_of("robot_000").unwrap();
        assert!((heading + 0.75 * std::f64::consts::PI).abs() < 1e-9);
        assert_eq!(sent(&mut world).len(), 1);
    }

    #[test]
    fn test_viewer_camera_angle() {
        let (mut world, robot, mut mgr) = setup();

        let mut view = world.view(robot).unwrap();
        mgr.on_recv_msg(&mut view, "SIGViewer", "CameraAngle 90");

        let dir = view.camera_dir(3).unwrap();
        assert!((dir - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
    }
}
