//! # Capture rig
//!
//! Collects training images of whatever sits at the centre of an orbit. On each tick the robot is
//! placed at the next point of the orbit, facing the centre, and a frame is captured. Frames can
//! also be captured on request, with the robot turned and moved by hand in between.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::PI;

use comms_if::msg::Tokens;
use log::{debug, info, warn};
use nalgebra::Vector3;

use crate::{
    kinematics::Pose,
    sim::{Controller, Simulator},
};

pub use params::CaptureParams;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

pub struct CaptureRig {
    pub params: CaptureParams,

    /// Next step of the sweep
    step: i32,

    /// Frame counters for the sweep and for requested captures
    sweep_frame: u32,
    view_frame: u32,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl CaptureRig {
    pub fn new(params: CaptureParams) -> Self {
        Self {
            step: params.first_step,
            params,
            sweep_frame: 0,
            view_frame: 0,
        }
    }

    /// Load the parameters from the given file, relative to the params directory.
    pub fn init(params_path: &str) -> Result<Self, util::params::LoadError> {
        Ok(Self::new(util::params::load(params_path)?))
    }

    pub fn is_finished(&self) -> bool {
        self.step > self.params.last_step
    }

    /// Orbit angle of the given step.
    ///
    /// Units: radians
    pub fn orbit_angle_rad(&self, step: i32) -> f64 {
        (step as f64 * self.params.step_deg - 180.0).to_radians()
    }

    fn capture(sim: &mut dyn Simulator, cam_id: u32, file_name: &str) {
        if sim.capture_view(cam_id, file_name) {
            debug!("Captured {}", file_name);
        } else {
            warn!("Camera {} could not capture {}", cam_id, file_name);
        }
    }

    fn sweep_step(&mut self, sim: &mut dyn Simulator) {
        let theta = self.orbit_angle_rad(self.step);
        let [cx, cz] = self.params.centre_cm;
        let y = sim.my_position().y;
        let r = self.params.distance_cm;

        sim.set_my_position(Vector3::new(cx + r * theta.sin(), y, cz + r * theta.cos()));
        sim.set_my_heading(theta + PI);

        let file_name = format!("s{:03}.bmp", self.sweep_frame);
        Self::capture(sim, self.params.sweep_cam_id, &file_name);

        self.sweep_frame += 1;
        self.step += 1;
    }
}

impl Controller for CaptureRig {
    fn on_init(&mut self, sim: &mut dyn Simulator) {
        info!(
            "CaptureRig initialised for {}, {} frame(s) to capture",
            sim.my_name(),
            self.params.last_step - self.params.first_step + 1
        );
    }

    fn on_action(&mut self, sim: &mut dyn Simulator, _now_s: f64) -> f64 {
        if self.is_finished() {
            return self.params.idle_period_s;
        }

        self.sweep_step(sim);
        if self.is_finished() {
            info!("Sweep complete, {} frame(s) captured", self.sweep_frame);
        }

        self.params.tick_period_s
    }

    fn on_recv_msg(&mut self, sim: &mut dyn Simulator, sender: &str, text: &str) {
        let keyword = match Tokens::split(text).and_then(|t| t.expect_arity(0).map(|_| t.keyword)) {
            Ok(k) => k,
            Err(e) => {
                warn!("Dropping message from {}: {}", sender, e);
                return;
            }
        };

        match keyword {
            "capture" => {
                let file_name = format!("view{:03}.bmp", self.view_frame);
                Self::capture(sim, self.params.view_cam_id, &file_name);
                self.view_frame += 1;
            }
            "rotation" => {
                let heading = Pose::from_sim(sim).heading_rad;
                sim.set_my_heading(heading + self.params.rotate_step_deg.to_radians());
            }
            "move" => {
                let pose = Pose::from_sim(sim);
                sim.set_my_position(pose.position_cm + pose.forward() * self.params.move_step_cm);
            }
            k => warn!("Dropping unknown capture command \"{}\" from {}", k, sender),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::World;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_sweep() {
        let mut world = World::new();
        let rig_id = world.add_robot("robot_000", Vector3::new(0.0, 5.0, 0.0), 0.0);
        let mut rig = CaptureRig::new(CaptureParams::default());

        let mut view = world.view(rig_id).unwrap();
        rig.on_init(&mut view);

        assert_eq!(rig.on_action(&mut view, 0.0), 0.5);

        // First step is a full turn from +z, so the robot is on +z looking back at the centre
        let pos = view.my_position();
        assert!(pos.x.abs() < 1e-9);
        assert!((pos.y - 5.0).abs() < 1e-12);
        assert!((pos.z - 50.0).abs() < 1e-9);
        let pose = Pose::from_sim(&view);
        assert!((pose.forward() + Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);

        for i in 1..41 {
            assert_eq!(rig.on_action(&mut view, i as f64 * 0.5), 0.5);
        }
        assert!(rig.is_finished());
        assert_eq!(rig.on_action(&mut view, 20.5), 10.0);
        drop(view);

        let captures = world.captures();
        assert_eq!(captures.len(), 41);
        assert_eq!(captures[0], "s000.bmp");
        assert_eq!(captures[40], "s040.bmp");
    }

    #[test]
    fn test_manual_commands() {
        let mut world = World::new();
        let rig_id = world.add_robot("robot_000", Vector3::zeros(), 0.0);
        let mut rig = CaptureRig::new(CaptureParams::default());

        let mut view = world.view(rig_id).unwrap();
        rig.on_recv_msg(&mut view, "SIGViewer", "rotation");
        rig.on_recv_msg(&mut view, "SIGViewer", "move");
        rig.on_recv_msg(&mut view, "SIGViewer", "capture");
        rig.on_recv_msg(&mut view, "SIGViewer", "capture now");
        drop(view);

        assert!((world.heading_of("robot_000").unwrap() - FRAC_PI_4).abs() < 1e-9);
        let pos = world.position_of("robot_000").unwrap();
        assert!((pos.x - 10.0 * FRAC_PI_4.sin()).abs() < 1e-9);
        assert!((pos.z - 10.0 * FRAC_PI_4.cos()).abs() < 1e-9);
        assert_eq!(world.captures(), &[String::from("view000.bmp")]);
    }
}
