//! Scene reports and teleoperation helpers
//!
//! A scene report tells the service where the robot is and where its camera is looking, so the
//! service can render or record what the robot sees.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Header of scene reports which ask for the next random walk waypoint.
pub const RANDOM_ROUTE_HEADER: &str = "AskRandomRoute";

/// Header of the scene report sent after a reset.
pub const RESET_HEADER: &str = "Start";

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TaskMgr {
    /// Stop the wheels and describe the current scene.
    pub(crate) fn scene_info(&self, sim: &mut dyn Simulator, header: &str) -> Result<Reply, TaskMgrError> {
        self.drive.stop(sim);

        let cam = self.data.cam_id;
        let missing = |what: &str| TaskMgrError::MissingEntity(format!("{} of camera {}", what, cam));

        // Head cameras have their own link, others are measured from the scene link
        let link = if cam < 3 {
            sim.camera_link(cam).ok_or_else(|| missing("link"))?
        } else {
            self.params.profile.scene_cam_link.clone()
        };
        let link_pos = sim
            .part_position(&link)
            .ok_or_else(|| TaskMgrError::MissingEntity(link.clone()))?;
        let cam_pos = sim.camera_pos(cam).ok_or_else(|| missing("position"))?;
        let cam_dir = sim.camera_dir(cam).ok_or_else(|| missing("direction"))?;

        let pose = self.pose(sim);
        let (s, c) = pose.heading_rad.sin_cos();

        Ok(Reply::SceneInfo {
            header: header.to_string(),
            x_cm: pose.position_cm.x,
            z_cm: pose.position_cm.z,
            heading_deg: pose.heading_deg(),
            cam_pos_cm: [
                link_pos.x + cam_pos.z * s,
                link_pos.y + cam_pos.y,
                link_pos.z + cam_pos.z * c,
            ],
            cam_dir: [cam_dir.x, cam_dir.y, cam_dir.z],
        })
    }

    pub(crate) fn send_scene_info(&self, sim: &mut dyn Simulator, header: &str) -> Result<(), TaskMgrError> {
        let reply = self.scene_info(sim, header)?;
        self.send(sim, &reply)
    }

    /// Send a scene report once per entry into the current state.
    pub(crate) fn report_scene_once(&mut self, sim: &mut dyn Simulator) -> Result<Transition, TaskMgrError> {
        if !self.executed {
            self.send_scene_info(sim, RANDOM_ROUTE_HEADER)?;
            self.executed = true;
        }

        Ok(Transition::Stay)
    }

    /// Move the robot to `(x, z)` keeping its height.
    pub(crate) fn teleport(&self, sim: &mut dyn Simulator, x_cm: f64, z_cm: f64) {
        let y_cm = sim.my_position().y;
        sim.set_my_position(Vector3::new(x_cm, y_cm, z_cm));
        debug!("Teleported to ({:.1}, {:.1})", x_cm, z_cm);
    }

    /// Point a camera horizontally at the given angle from +z.
    pub(crate) fn point_camera(&self, sim: &mut dyn Simulator, cam: u32, angle_deg: f64) {
        let (s, c) = angle_deg.to_radians().sin_cos();
        sim.set_camera_dir(cam, Vector3::new(s, 0.0, c));
    }

    /// Return the robot to the reset pose and report the scene.
    pub(crate) fn reset(&mut self, sim: &mut dyn Simulator) -> Result<(), TaskMgrError> {
        let [x_cm, z_cm] = self.params.profile.reset_pos_cm;

        self.stop_all(sim);
        self.teleport(sim, x_cm, z_cm);
        sim.set_my_heading(0.0);
        self.point_camera(sim, self.params.profile.reset_cam_id, 0.0);
        info!("Reset to ({:.1}, {:.1})", x_cm, z_cm);

        self.send_scene_info(sim, RESET_HEADER)?;
        self.set_state_latched(TaskState::AwaitDirection);

        Ok(())
    }
}
