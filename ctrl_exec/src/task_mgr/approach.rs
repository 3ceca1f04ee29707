//! Approach phase: turn to and drive towards a point given by the service

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::*;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TaskMgr {
    pub(super) fn step_rotate_to_target(
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
                Ok(Transition::To(TaskState::Translate))
            },
        )
    }

    pub(super) fn step_translate(
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
                Ok(Transition::To(TaskState::Arrived))
            },
        )
    }

    /// Choose the nearest remaining candidate and ask for a route to it, or ask for directions
    /// again if none are left.
    pub(super) fn step_arrived(&mut self, sim: &mut dyn Simulator) -> Result<Transition, TaskMgrError> {
        let here = sim.my_position();

        match self.data.candidates.pick_nearest(sim, &here) {
            Some(t) => {
                debug!("Nearest candidate is {} at {:?}", t.name, t.pos_cm);
                self.data.target = Some(t);
                Ok(Transition::To(TaskState::AskRoute))
            }
            None => Ok(Transition::To(TaskState::AskPos)),
        }
    }

    /// Start turning on the spot to face `target_cm`, returning the completion time.
    pub(crate) fn turn_to(
        &self,
        sim: &mut dyn Simulator,
        target_cm: &Vector3<f64>,
        now_s: f64,
    ) -> Result<f64, TaskMgrError> {
        let vel = self.drive.params().rotate_vel_rads;
        Ok(self.drive.rotate_toward(sim, target_cm, vel, now_s)?)
    }

    /// Start driving straight at `target_cm`, returning the time the robot is within `range_cm`.
    pub(crate) fn drive_to(
        &self,
        sim: &mut dyn Simulator,
        target_cm: &Vector3<f64>,
        range_cm: f64,
        now_s: f64,
    ) -> Result<f64, TaskMgrError> {
        let vel = self.drive.params().translate_vel_rads;
        Ok(self.drive.go_to(sim, target_cm, vel, range_cm, now_s)?)
    }
}

#[cfg(test)]
mod test {
    use super::super::test_util::*;
    use super::*;

    #[test]
    fn test_arrived_asks_route_to_nearest() {
        let (mut world, robot, mut mgr) = setup();
        world.add_entity("can_0", Vector3::new(40.0, 70.0, 60.0));
        world.add_entity("banana", Vector3::new(0.0, 70.0, 200.0));

        recv(&mut world, robot, &mut mgr, "ObjDir 0.0 0.0 40.0 10.0");
        let t = run(&mut world, robot, &mut mgr, 0.0, 2.0);
        assert_eq!(mgr.state(), TaskState::AwaitDirection);

        let out = sent(&mut world);
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("AskRoute "));
        assert!(out[0].ends_with("  40.0   70.0   60.0"));
        assert_eq!(mgr.data().target.as_ref().map(|t| t.name.as_str()), Some("can_0"));

        // With nothing left to pick the service is asked for directions instead
        world.remove_entity("can_0");
        world.remove_entity("banana");
        recv(&mut world, robot, &mut mgr, "ObjDir 0.0 0.0 60.0 10.0");
        run(&mut world, robot, &mut mgr, t, t + 2.0);

        let out = sent(&mut world);
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("AskObjPos "));
    }

    #[test]
    fn test_non_finite_direction_never_moves() {
        for text in ["ObjDir nan 0.0 50.0 10.0", "ObjDir inf 0.0 50.0 10.0"] {
            let (mut world, robot, mut mgr) = setup();

            recv(&mut world, robot, &mut mgr, text);
            run(&mut world, robot, &mut mgr, 0.0, 100.0);

            assert_eq!(mgr.state(), TaskState::AwaitDirection, "{}", text);
            assert_eq!(world.wheel_velocity("robot_000"), Some((0.0, 0.0)), "{}", text);
            assert_eq!(world.position_of("robot_000"), Some(Vector3::zeros()), "{}", text);
        }
    }

    #[test]
    fn test_non_finite_deadline_is_refused() {
        let (mut world, robot, mut mgr) = setup();
        mgr.set_state(TaskState::Translate);

        let mut view = world.view(robot).unwrap();
        let out = mgr.timed(&mut view, 0.0, |_, _, _| Ok(f64::NAN), |_, _, _| Ok(Transition::Stay));
        assert!(matches!(out, Err(TaskMgrError::NonFiniteDeadline(TaskState::Translate))));
    }

    #[test]
    fn test_non_finite_target_parks_the_machine() {
        let (mut world, robot, mut mgr) = setup();
        mgr.data.next_pos = Vector3::new(f64::INFINITY, 0.0, 50.0);
        mgr.set_state(TaskState::Translate);

        run(&mut world, robot, &mut mgr, 0.0, 1.0);

        assert_eq!(mgr.state(), TaskState::Idle);
        assert_eq!(world.wheel_velocity("robot_000"), Some((0.0, 0.0)));
    }
}
