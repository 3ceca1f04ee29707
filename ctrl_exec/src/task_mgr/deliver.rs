//! Deliver phase: take the held object to its box, let go of it, and move on to the next one

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::*;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TaskMgr {
    pub(super) fn step_rotate_to_box(
        &mut self,
        sim: &mut dyn Simulator,
        now_s: f64,
    ) -> Result<Transition, TaskMgrError> {
        self.timed(
            sim,
            now_s,
            |mgr, sim, now_s| {
                let target = mgr.data.next_pos;
                mgr.turn_to(sim, &target, now_s)
            },
            |mgr, sim, _| {
                mgr.drive.stop(sim);
                Ok(Transition::To(TaskState::TranslateToBox))
            },
        )
    }

    pub(super) fn step_translate_to_box(
        &mut self,
        sim: &mut dyn Simulator,
        now_s: f64,
    ) -> Result<Transition, TaskMgrError> {
        self.timed(
            sim,
            now_s,
            |mgr, sim, now_s| {
                let target = mgr.data.next_pos;
                mgr.drive_to(sim, &target, mgr.data.range_cm, now_s)
            },
            |mgr, sim, _| {
                mgr.drive.stop(sim);
                Ok(Transition::To(TaskState::ArrivedAtBox))
            },
        )
    }

    /// Ask for a route to the nearest box, or for directions to any box if none are known.
    pub(super) fn step_arrived_at_box(
        &mut self,
        sim: &mut dyn Simulator,
    ) -> Result<Transition, TaskMgrError> {
        let here = sim.my_position();
        let (x_cm, z_cm, heading_deg) = self.wire_pose(sim);

        let reply = match candidates::nearest_of(sim, &self.params.profile.boxes, &here) {
            Some(b) => {
                debug!("Nearest box is {}", b.name);
                self.data.box_pos = b.pos_cm;
                Reply::AskTrashBoxRoute {
                    x_cm,
                    z_cm,
                    heading_deg,
                    box_cm: [b.pos_cm.x, b.pos_cm.y, b.pos_cm.z],
                }
            }
            None => Reply::AskTrashBoxPos { x_cm, z_cm, heading_deg },
        };
        self.send(sim, &reply)?;

        Ok(Transition::To(TaskState::AwaitDirection))
    }

    pub(super) fn step_face_box(
        &mut self,
        sim: &mut dyn Simulator,
        now_s: f64,
    ) -> Result<Transition, TaskMgrError> {
        self.timed(
            sim,
            now_s,
            |mgr, sim, now_s| {
                let target = mgr.data.box_pos;
                mgr.turn_to(sim, &target, now_s)
            },
            |mgr, sim, _| {
                mgr.drive.stop(sim);
                Ok(Transition::To(TaskState::AlignForRelease))
            },
        )
    }

    /// Line the arm up with the box.
    pub(super) fn step_align_for_release(
        &mut self,
        sim: &mut dyn Simulator,
        now_s: f64,
    ) -> Result<Transition, TaskMgrError> {
        self.timed(
            sim,
            now_s,
            |mgr, sim, now_s| {
                let target = mgr.data.box_pos;
                mgr.offset_turn(sim, &target, now_s)
            },
            |mgr, sim, _| {
                mgr.drive.stop(sim);
                Ok(Transition::To(TaskState::Release))
            },
        )
    }

    pub(super) fn step_release(&mut self, sim: &mut dyn Simulator) -> Result<Transition, TaskMgrError> {
        self.drive.stop(sim);
        sim.release(&self.params.profile.gripper_part);

        match self.data.held.take() {
            Some(h) => info!("Released {}", h),
            None => warn!("Release requested with nothing held"),
        }
        self.data.grasped = false;

        Ok(Transition::To(TaskState::SettleRelease))
    }

    pub(super) fn step_settle_release(
        &mut self,
        sim: &mut dyn Simulator,
        now_s: f64,
    ) -> Result<Transition, TaskMgrError> {
        self.timed(
            sim,
            now_s,
            |mgr, _, now_s| Ok(now_s + mgr.params.profile.release_settle_s),
            |_, _, _| Ok(Transition::To(TaskState::RaiseArm)),
        )
    }

    pub(super) fn step_raise_arm(
        &mut self,
        sim: &mut dyn Simulator,
        now_s: f64,
    ) -> Result<Transition, TaskMgrError> {
        self.timed(
            sim,
            now_s,
            |mgr, sim, now_s| Ok(mgr.raise_arm(sim, now_s)),
            |mgr, sim, _| {
                mgr.stop_arm(sim);
                Ok(Transition::To(TaskState::AskNext))
            },
        )
    }

    /// Choose the next object.
    pub(super) fn step_ask_next(&mut self, sim: &mut dyn Simulator) -> Result<Transition, TaskMgrError> {
        match self.data.mode {
            PickMode::Guided => {
                let here = sim.my_position();
                match self.data.candidates.pick_nearest(sim, &here) {
                    Some(t) => {
                        self.data.target = Some(t);
                        Ok(Transition::To(TaskState::AskRoute))
                    }
                    None => Ok(Transition::To(TaskState::AskPos)),
                }
            }
            PickMode::Routed => match self.pick_random(sim) {
                Some(t) => {
                    info!("Next object is {}", t.name);
                    self.send(sim, &Reply::Start)?;
                    self.plan_route_to_object(sim, &t)?;
                    self.data.target = Some(t);
                    Ok(Transition::To(TaskState::FollowRoute(RouteGoal::Object)))
                }
                None => {
                    sim.broadcast("cannot find object anymore");
                    Ok(Transition::To(TaskState::Idle))
                }
            },
        }
    }
}
