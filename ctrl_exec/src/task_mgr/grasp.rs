//! Grasp phase
//!
//! The arm is offset from the body centreline, so after facing the object the robot turns a little
//! further to put the object on the arm side before lowering it. The grasp itself happens in the
//! collision callback, this phase only polls the result.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::*;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TaskMgr {
    pub(super) fn step_face_object(
        &mut self,
        sim: &mut dyn Simulator,
        now_s: f64,
    ) -> Result<Transition, TaskMgrError> {
        self.timed(
            sim,
            now_s,
            |mgr, sim, now_s| {
                let target = mgr.grab_point(sim);
                mgr.turn_to(sim, &target, now_s)
            },
            |mgr, sim, _| {
                mgr.drive.stop(sim);
                Ok(Transition::To(TaskState::AdjustApproachAngle))
            },
        )
    }

    pub(super) fn step_adjust_approach_angle(
        &mut self,
        sim: &mut dyn Simulator,
        now_s: f64,
    ) -> Result<Transition, TaskMgrError> {
        self.timed(
            sim,
            now_s,
            |mgr, sim, now_s| {
                let target = mgr.grab_point(sim);
                mgr.offset_turn(sim, &target, now_s)
            },
            |mgr, sim, _| {
                mgr.drive.stop(sim);
                Ok(Transition::To(TaskState::LowerArm))
            },
        )
    }

    pub(super) fn step_lower_arm(
        &mut self,
        sim: &mut dyn Simulator,
        now_s: f64,
    ) -> Result<Transition, TaskMgrError> {
        self.timed(
            sim,
            now_s,
            |mgr, sim, now_s| {
                mgr.drive.stop(sim);
                mgr.data.grasp_polls = 0;
                mgr.data.arm_lowered = true;
                sim.set_joint_velocity(
                    &mgr.params.profile.grasp_joint,
                    mgr.drive.params().joint_vel_rads,
                );
                Ok(now_s + mgr.drive.params().arm_swing_duration_s())
            },
            |mgr, sim, _| {
                mgr.stop_arm(sim);
                Ok(Transition::To(if mgr.params.profile.retract_after_lower {
                    TaskState::RetractArm
                } else {
                    TaskState::CheckGrasp
                }))
            },
        )
    }

    pub(super) fn step_retract_arm(
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
                Ok(Transition::To(TaskState::CheckGrasp))
            },
        )
    }

    /// Poll the grasp flag, giving up after the configured number of ticks.
    pub(super) fn step_check_grasp(&mut self, sim: &mut dyn Simulator) -> Result<Transition, TaskMgrError> {
        if self.data.grasped {
            return self.on_grasp_success(sim).map(Transition::To);
        }

        self.data.grasp_polls += 1;
        if self.data.grasp_polls < self.params.profile.grasp_confirm_ticks.max(1) {
            return Ok(Transition::Stay);
        }

        warn!("Nothing grasped after {} tick(s)", self.data.grasp_polls);
        if let Some(t) = self.data.target.as_ref() {
            self.data.candidates.mark_failed(&t.name);
        }

        Ok(Transition::To(TaskState::RecoverArm))
    }

    pub(super) fn step_recover_arm(
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
                match mgr.data.mode {
                    PickMode::Guided => Ok(Transition::To(TaskState::AskPos)),
                    PickMode::Routed => {
                        mgr.send(sim, &Reply::Start)?;
                        Ok(Transition::To(TaskState::AwaitDirection))
                    }
                }
            },
        )
    }

    /// Grasp the first entity the gripper touches while reaching, if nothing is held yet.
    pub(super) fn handle_collisions(&mut self, sim: &mut dyn Simulator, collisions: &[Collision]) {
        let reaching = matches!(
            self.state,
            TaskState::LowerArm | TaskState::RetractArm | TaskState::CheckGrasp
        );
        if !reaching {
            trace!("Ignoring {} collision(s) in {}", collisions.len(), self.state);
            return;
        }

        for c in collisions.iter() {
            if self.data.grasped {
                return;
            }
            if c.my_part != self.params.profile.gripper_part {
                continue;
            }

            if sim.grasp(&c.my_part, &c.with) {
                info!("Grasped {}", c.with);
                if let Some(t) = self.data.target.as_ref().filter(|t| t.name != c.with) {
                    debug!("{} is not the target {}", c.with, t.name);
                }
                self.data.grasped = true;
                self.data.held = Some(c.with.clone());
            }
        }
    }

    /// Decide where to take the object just grasped.
    fn on_grasp_success(&mut self, sim: &mut dyn Simulator) -> Result<TaskState, TaskMgrError> {
        let held = self.data.held.clone().unwrap_or_default();
        self.data.candidates.remove(&held);
        let place = self.find_place(sim, &held);

        match self.data.mode {
            PickMode::Guided => {
                let (x_cm, z_cm, heading_deg) = self.wire_pose(sim);
                let reply = match place {
                    Some(b) => {
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
                Ok(TaskState::AwaitDirection)
            }
            PickMode::Routed => match place {
                Some(b) => {
                    info!("Taking {} to {}", held, b.name);
                    self.plan_route_to_box(sim, &b)?;
                    self.data.box_pos = b.pos_cm;
                    Ok(TaskState::FollowRoute(RouteGoal::Box))
                }
                None => {
                    warn!("No box known for {}", held);
                    self.send(sim, &Reply::Start)?;
                    Ok(TaskState::AwaitDirection)
                }
            },
        }
    }

    /// Find the box an object belongs in, if it is known and still exists.
    fn find_place(&self, sim: &dyn Simulator, object: &str) -> Option<Target> {
        let profile = &self.params.profile;

        profile
            .box_for
            .get(object)
            .filter(|b| profile.boxes.contains(b))
            .and_then(|b| candidates::resolve(sim, b))
    }

    /// The point being grasped, the live target position in the routed flow or the directed
    /// point otherwise.
    fn grab_point(&self, sim: &dyn Simulator) -> Vector3<f64> {
        match (self.data.mode, self.data.target.as_ref()) {
            (PickMode::Routed, Some(t)) => sim.entity_position(t.id).unwrap_or(t.pos_cm),
            _ => self.data.next_pos,
        }
    }

    /// Turn so the arm lines up with `target_cm`. If the robot is too close to the target for the
    /// arm to line up the turn is skipped.
    pub(crate) fn offset_turn(
        &self,
        sim: &mut dyn Simulator,
        target_cm: &Vector3<f64>,
        now_s: f64,
    ) -> Result<f64, TaskMgrError> {
        let pose = self.pose(sim);
        let half_width = self.drive.params().shoulder_half_width_cm;

        match self.drive.calc_grab_pos(&pose, target_cm, half_width) {
            Ok(p) => self.turn_to(sim, &p, now_s),
            Err(e) => {
                warn!("{}, skipping the offset turn", e);
                Ok(now_s)
            }
        }
    }
}
