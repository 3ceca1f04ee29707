//! Explore phase: random walk scene capture directed by the service

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::*;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TaskMgr {
    pub(super) fn step_scene_report(&mut self, sim: &mut dyn Simulator) -> Result<Transition, TaskMgrError> {
        self.report_scene_once(sim)
    }

    pub(super) fn step_explore_turn(
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
                Ok(Transition::To(TaskState::ExploreDrive))
            },
        )
    }

    pub(super) fn step_explore_drive(
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
                Ok(Transition::To(if mgr.data.look {
                    TaskState::ExploreLook
                } else {
                    TaskState::ExploreSettled
                }))
            },
        )
    }

    pub(super) fn step_explore_look(
        &mut self,
        sim: &mut dyn Simulator,
        now_s: f64,
    ) -> Result<Transition, TaskMgrError> {
        self.timed(
            sim,
            now_s,
            |mgr, sim, now_s| {
                let target = mgr.data.looking_pos;
                mgr.turn_to(sim, &target, now_s)
            },
            |mgr, sim, _| {
                mgr.drive.stop(sim);
                Ok(Transition::To(TaskState::ExploreSettled))
            },
        )
    }

    pub(super) fn step_explore_settled(&mut self, sim: &mut dyn Simulator) -> Result<Transition, TaskMgrError> {
        self.report_scene_once(sim)
    }

    /// Turn to face a point on the viewer's request.
    pub(super) fn step_turn_to_dir(
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
                Ok(Transition::To(TaskState::Idle))
            },
        )
    }
}

#[cfg(test)]
mod test {
    use super::super::test_util::*;
    use super::*;

    #[test]
    fn test_random_walk_step() {
        let (mut world, robot, mut mgr) = setup();

        recv(&mut world, robot, &mut mgr, "RandomRouteStart");
        let t = run(&mut world, robot, &mut mgr, 0.0, 0.5);
        assert_eq!(mgr.state(), TaskState::SceneReport);

        // Only one report per entry
        let out = sent(&mut world);
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("AskRandomRoute "));

        recv(&mut world, robot, &mut mgr, "RandomRoute 0.0 60.0 10.0 100.0 50.0 1");
        run(&mut world, robot, &mut mgr, t, t + 5.0);
        assert_eq!(mgr.state(), TaskState::ExploreSettled);

        let pos = world.position_of("robot_000").unwrap();
        assert!((pos.z - 50.0).abs() < 2.5, "z = {}", pos.z);

        // Facing the look point, which is straight along +x
        let heading = world.heading_of("robot_000").unwrap();
        assert!((heading - std::f64::consts::FRAC_PI_2).abs() < 0.15, "heading = {}", heading);

        let out = sent(&mut world);
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("AskRandomRoute "));
    }
}
