//! Locate phase: tell the service where we are and ask where to go

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::*;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TaskMgr {
    /// Ask the service for the direction to the next object.
    pub(super) fn step_ask_pos(&mut self, sim: &mut dyn Simulator) -> Result<Transition, TaskMgrError> {
        let (x_cm, z_cm, heading_deg) = self.wire_pose(sim);
        self.send(sim, &Reply::AskObjPos { x_cm, z_cm, heading_deg })?;

        Ok(Transition::To(TaskState::AwaitDirection))
    }

    /// Ask the service for a route to the chosen object.
    pub(super) fn step_ask_route(&mut self, sim: &mut dyn Simulator) -> Result<Transition, TaskMgrError> {
        let target = self
            .data
            .target
            .as_ref()
            .ok_or_else(|| TaskMgrError::MissingEntity(String::from("route target")))?;
        let target_cm = [target.pos_cm.x, target.pos_cm.y, target.pos_cm.z];

        let (x_cm, z_cm, heading_deg) = self.wire_pose(sim);
        self.send(sim, &Reply::AskRoute { x_cm, z_cm, heading_deg, target_cm })?;

        Ok(Transition::To(TaskState::AwaitDirection))
    }
}

#[cfg(test)]
mod test {
    use super::super::test_util::*;
    use super::*;

    #[test]
    fn test_ask_pos_reports_heading() {
        let (mut world, robot, mut mgr) = setup();
        {
            let mut view = world.view(robot).unwrap();
            view.set_my_position(Vector3::new(12.0, 0.0, -50.0));
            view.set_my_heading(std::f64::consts::FRAC_PI_2);
        }

        recv(&mut world, robot, &mut mgr, "AskRobotPos");
        run(&mut world, robot, &mut mgr, 0.0, 0.05);

        assert_eq!(mgr.state(), TaskState::AwaitDirection);
        assert_eq!(sent(&mut world), vec![String::from("AskObjPos   12.0  -50.0   90.0")]);
    }

    #[test]
    fn test_ask_route_without_target_parks() {
        let (mut world, robot, mut mgr) = setup();

        mgr.set_state(TaskState::AskRoute);
        run(&mut world, robot, &mut mgr, 0.0, 0.05);

        assert_eq!(mgr.state(), TaskState::Idle);
        assert!(sent(&mut world).is_empty());
    }
}
