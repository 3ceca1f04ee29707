//! Connect phase: wait for the recognition service and stow the arms

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::*;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TaskMgr {
    /// Try to connect to the service, every tick until it appears.
    pub(super) fn step_init(&mut self, sim: &mut dyn Simulator) -> Result<Transition, TaskMgrError> {
        if !sim.connect_service(&self.params.service) {
            trace!("Waiting for the {} service", self.params.service);
            return Ok(Transition::Stay);
        }

        info!("Connected to the {} service", self.params.service);
        self.data.service = Some(self.params.service.clone());

        Ok(Transition::To(TaskState::AwaitService))
    }

    /// Swing both arms up out of the way, then tell the service we're ready.
    pub(super) fn step_await_service(
        &mut self,
        sim: &mut dyn Simulator,
        now_s: f64,
    ) -> Result<Transition, TaskMgrError> {
        self.timed(
            sim,
            now_s,
            |mgr, sim, now_s| {
                let vel = mgr.drive.params().joint_vel_rads;
                for j in mgr.params.profile.stow_joints.iter() {
                    sim.set_joint_velocity(j, -vel);
                }
                Ok(now_s + mgr.drive.params().arm_swing_duration_s())
            },
            |mgr, sim, _| {
                for j in mgr.params.profile.stow_joints.iter() {
                    sim.set_joint_velocity(j, 0.0);
                }
                mgr.send(sim, &Reply::Start)?;
                Ok(Transition::To(TaskState::AwaitDirection))
            },
        )
    }
}
