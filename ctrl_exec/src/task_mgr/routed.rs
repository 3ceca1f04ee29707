//! Routed phase: plan routes on board and follow them node by node
//!
//! Between nodes the robot turns on the spot, then drives straight, stopping at every node.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::*;
use crate::router::{Node, Obstacle};

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TaskMgr {
    pub(super) fn step_follow_route(
        &mut self,
        sim: &mut dyn Simulator,
        now_s: f64,
        goal: RouteGoal,
    ) -> Result<Transition, TaskMgrError> {
        let node = match self.data.route.current() {
            Some(n) => n,
            None => {
                debug!("Route to {:?} complete", goal);
                return Ok(Transition::To(match goal {
                    RouteGoal::Object => TaskState::FaceObject,
                    RouteGoal::Box => TaskState::FaceBox,
                }));
            }
        };
        let target = node_point(&node);

        self.timed(
            sim,
            now_s,
            move |mgr, sim, now_s| mgr.turn_to(sim, &target, now_s),
            move |mgr, sim, _| {
                mgr.drive.stop(sim);
                Ok(Transition::To(TaskState::RouteTranslate(goal)))
            },
        )
    }

    pub(super) fn step_route_translate(
        &mut self,
        sim: &mut dyn Simulator,
        now_s: f64,
        goal: RouteGoal,
    ) -> Result<Transition, TaskMgrError> {
        let node = match self.data.route.current() {
            Some(n) => n,
            None => return Ok(Transition::To(TaskState::FollowRoute(goal))),
        };
        let target = node_point(&node);

        self.timed(
            sim,
            now_s,
            move |mgr, sim, now_s| mgr.drive_to(sim, &target, 0.0, now_s),
            move |mgr, sim, _| {
                mgr.drive.stop(sim);
                Ok(Transition::To(TaskState::RouteNodeReached(goal)))
            },
        )
    }

    pub(super) fn step_route_node_reached(
        &mut self,
        goal: RouteGoal,
    ) -> Result<Transition, TaskMgrError> {
        self.data.route.advance();
        trace!("Route node reached, {} node(s) in route", self.data.route.len());

        Ok(Transition::To(TaskState::FollowRoute(goal)))
    }

    /// Draw a random candidate and set off for it, broadcasting the outcome.
    ///
    /// Returns the state to move to, `FollowRoute` if a candidate was found or `AskPos` if not.
    pub(crate) fn find_object(&mut self, sim: &mut dyn Simulator) -> Result<TaskState, TaskMgrError> {
        self.data.mode = PickMode::Routed;

        match self.pick_random(sim) {
            Some(t) => {
                info!("Found {}, planning a route to it", t.name);
                sim.broadcast("I found trash");
                self.plan_route_to_object(sim, &t)?;
                self.data.target = Some(t);
                Ok(TaskState::FollowRoute(RouteGoal::Object))
            }
            None => {
                sim.broadcast("I cannot find trash");
                Ok(TaskState::AskPos)
            }
        }
    }

    /// Draw a random candidate, broadcasting when the pool is exhausted.
    pub(crate) fn pick_random(&mut self, sim: &mut dyn Simulator) -> Option<Target> {
        if self.data.candidates.is_empty() {
            info!("All known objects collected");
            sim.broadcast("Found all known trashes");
        }

        self.data.candidates.pick_random(sim)
    }

    /// Plan a route from the robot to the standoff point for an object on the pick obstacle.
    pub(crate) fn plan_route_to_object(
        &mut self,
        sim: &dyn Simulator,
        target: &Target,
    ) -> Result<(), TaskMgrError> {
        let obstacle = self.room_obstacle(sim, &self.params.profile.pick_obstacle)?;
        self.plan_route_to(sim, target, &obstacle)
    }

    /// Plan a route from the robot to the standoff point for a box.
    pub(crate) fn plan_route_to_box(
        &mut self,
        sim: &dyn Simulator,
        b: &Target,
    ) -> Result<(), TaskMgrError> {
        let obstacle = self.params.profile.box_obstacle(&b.name, b.pos_cm.x, b.pos_cm.z);
        self.plan_route_to(sim, b, &obstacle)
    }

    fn plan_route_to(
        &mut self,
        sim: &dyn Simulator,
        target: &Target,
        obstacle: &Obstacle,
    ) -> Result<(), TaskMgrError> {
        let here = sim.my_position();
        let start = Node::new(here.x, here.z);
        let grab = self
            .router
            .grab_position(&Node::new(target.pos_cm.x, target.pos_cm.z), obstacle);

        let nodes = self.router.calc_route(&start, &grab, obstacle)?;
        debug!("Route to {}: {:?}", target.name, nodes);
        self.data.route = Route::new(nodes);

        Ok(())
    }

    /// Get a room obstacle, centred on its entity's live position if the entity exists.
    fn room_obstacle(&self, sim: &dyn Simulator, name: &str) -> Result<Obstacle, TaskMgrError> {
        let obstacle = self
            .params
            .profile
            .room_obstacles
            .get(name)
            .ok_or_else(|| TaskMgrError::NoRoute(format!("{} is not a known room obstacle", name)))?;

        Ok(match candidates::resolve(sim, name) {
            Some(t) => obstacle.moved_to(t.pos_cm.x, t.pos_cm.z),
            None => *obstacle,
        })
    }
}

/// World point of a route node, at floor height.
fn node_point(node: &Node) -> Vector3<f64> {
    Vector3::new(node.x, 0.0, node.y)
}

#[cfg(test)]
mod test {
    use super::super::test_util::*;
    use super::*;

    #[test]
    fn test_route_following_visits_every_node() {
        let (mut world, robot, mut mgr) = setup();
        mgr.params.tick_period_s = 0.005;
        {
            let mut view = world.view(robot).unwrap();
            view.set_my_position(Vector3::new(0.0, 0.0, -100.0));
        }

        mgr.data.route = Route::new(vec![
            Node::new(0.0, -100.0),
            Node::new(-80.0, -100.0),
            Node::new(-80.0, 0.0),
        ]);
        mgr.set_state(TaskState::FollowRoute(RouteGoal::Box));

        run(&mut world, robot, &mut mgr, 0.0, 15.0);

        // Finished the route and moved on to facing the box
        assert!(mgr.data().route.is_finished());
        assert!(!matches!(
            mgr.state(),
            TaskState::FollowRoute(_) | TaskState::RouteTranslate(_)
        ));
        let pos = world.position_of("robot_000").unwrap();
        assert!((pos.x + 80.0).abs() < 3.0, "x = {}", pos.x);
        assert!(pos.z.abs() < 3.0, "z = {}", pos.z);
    }

    #[test]
    fn test_find_object_with_nothing_left() {
        let (mut world, robot, mut mgr) = setup();

        let next = {
            let mut view = world.view(robot).unwrap();
            mgr.find_object(&mut view).unwrap()
        };

        assert_eq!(next, TaskState::AskPos);
        assert_eq!(mgr.data().mode, PickMode::Routed);
        assert_eq!(sent(&mut world), vec![String::from("I cannot find trash")]);
    }

    #[test]
    fn test_find_object_routes_around_table() {
        let (mut world, robot, mut mgr) = setup();
        mgr.data.candidates = CandidatePool::new(vec![String::from("can_0")], Some(1));
        world.add_entity("table_0", Vector3::new(0.0, 0.0, 0.0));
        world.add_entity("can_0", Vector3::new(10.0, 70.0, 25.0));
        {
            let mut view = world.view(robot).unwrap();
            view.set_my_position(Vector3::new(0.0, 0.0, -100.0));
        }

        let next = {
            let mut view = world.view(robot).unwrap();
            mgr.find_object(&mut view).unwrap()
        };

        assert_eq!(next, TaskState::FollowRoute(RouteGoal::Object));
        assert_eq!(sent(&mut world), vec![String::from("I found trash")]);

        // From below the table to the standoff above it, round the bottom-left and top-left
        // corners
        let nodes = mgr.data().route.nodes().to_vec();
        assert_eq!(nodes.first(), Some(&Node::new(0.0, -100.0)));
        assert_eq!(nodes.last(), Some(&Node::new(10.0, 43.0)));
        assert!(nodes.len() > 2);
    }
}
