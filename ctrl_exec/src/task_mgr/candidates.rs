//! Candidate selection
//!
//! Candidates are held by name and resolved against the simulation every time they are considered,
//! since another robot (or a zone) may have removed them since the last look.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};
use nalgebra::Vector3;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::sim::{EntityId, Simulator};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A resolved target entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    pub id: EntityId,

    /// Position when the target was resolved.
    ///
    /// Units: centimeters
    pub pos_cm: Vector3<f64>,
}

/// The pool of objects still to be collected.
#[derive(Debug)]
pub struct CandidatePool {
    names: Vec<String>,
    last_failed: Option<String>,
    rng: StdRng,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Resolve a named entity into a target.
pub fn resolve(sim: &dyn Simulator, name: &str) -> Option<Target> {
    let id = sim.resolve(name)?;
    let pos_cm = sim.entity_position(id)?;

    Some(Target {
        name: name.to_string(),
        id,
        pos_cm,
    })
}

/// Find the live entity among `names` nearest to `from_cm` in the horizontal plane.
pub fn nearest_of(sim: &dyn Simulator, names: &[String], from_cm: &Vector3<f64>) -> Option<Target> {
    let mut best: Option<(f64, Target)> = None;

    for name in names.iter() {
        let t = match resolve(sim, name) {
            Some(t) => t,
            None => {
                trace!("{} no longer exists", name);
                continue;
            }
        };

        let dist_sq =
            util::maths::planar_dist_sq((from_cm.x, from_cm.z), (t.pos_cm.x, t.pos_cm.z));

        match best {
            Some((d, _)) if d <= dist_sq => (),
            _ => best = Some((dist_sq, t)),
        }
    }

    best.map(|(_, t)| t)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CandidatePool {
    /// Create a new pool, seeding the random selection from `seed` or the OS.
    pub fn new(names: Vec<String>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };

        Self {
            names,
            last_failed: None,
            rng,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Remove a collected candidate, returns false if it wasn't in the pool.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.names.iter().position(|n| n == name) {
            Some(i) => {
                self.names.remove(i);
                if self.last_failed.as_deref() == Some(name) {
                    self.last_failed = None;
                }
                true
            }
            None => false,
        }
    }

    /// Record a failed attempt on a candidate. The candidate stays in the pool.
    pub fn mark_failed(&mut self, name: &str) {
        debug!("Grasp of {} failed, leaving it in the pool", name);
        self.last_failed = Some(name.to_string());
    }

    pub fn last_failed(&self) -> Option<&str> {
        self.last_failed.as_deref()
    }

    /// Draw a candidate uniformly at random. If the drawn candidate no longer exists the first live
    /// candidate in the pool is used instead.
    pub fn pick_random(&mut self, sim: &dyn Simulator) -> Option<Target> {
        if self.names.is_empty() {
            return None;
        }

        let idx = self.rng.random_range(0..self.names.len());

        resolve(sim, &self.names[idx]).or_else(|| {
            trace!("Drawn candidate {} is gone, scanning the pool", self.names[idx]);
            self.names.iter().find_map(|n| resolve(sim, n))
        })
    }

    /// Find the live candidate nearest to `from_cm`.
    pub fn pick_nearest(&self, sim: &dyn Simulator, from_cm: &Vector3<f64>) -> Option<Target> {
        nearest_of(sim, &self.names, from_cm)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::World;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pick_nearest() {
        let mut world = World::new();
        let robot = world.add_robot("robot_000", Vector3::new(0.0, 0.0, 0.0), 0.0);
        world.add_entity("can_0", Vector3::new(100.0, 50.0, 0.0));
        world.add_entity("can_1", Vector3::new(-30.0, 0.0, 40.0));
        world.add_entity("banana", Vector3::new(0.0, 500.0, 45.0));

        let pool = CandidatePool::new(names(&["can_0", "can_1", "banana", "mugcup"]), Some(1));
        let view = world.view(robot).unwrap();

        // Height is ignored, and the missing mugcup is skipped
        let t = pool.pick_nearest(&view, &Vector3::zeros()).unwrap();
        assert_eq!(t.name, "banana");
    }

    #[test]
    fn test_pick_random_falls_back_to_live_candidate() {
        let mut world = World::new();
        let robot = world.add_robot("robot_000", Vector3::zeros(), 0.0);
        world.add_entity("can_1", Vector3::new(10.0, 0.0, 10.0));

        let mut pool = CandidatePool::new(names(&["can_0", "can_1", "banana"]), Some(7));
        let view = world.view(robot).unwrap();

        for _ in 0..20 {
            assert_eq!(pool.pick_random(&view).unwrap().name, "can_1");
        }
    }

    #[test]
    fn test_pick_random_none_live() {
        let mut world = World::new();
        let robot = world.add_robot("robot_000", Vector3::zeros(), 0.0);
        let view = world.view(robot).unwrap();

        let mut pool = CandidatePool::new(names(&["can_0"]), Some(3));
        assert_eq!(pool.pick_random(&view), None);

        let mut pool = CandidatePool::new(vec![], Some(3));
        assert_eq!(pool.pick_random(&view), None);
    }

    #[test]
    fn test_failed_candidates_stay() {
        let mut pool = CandidatePool::new(names(&["can_0", "can_1"]), Some(0));

        pool.mark_failed("can_0");
        assert_eq!(pool.last_failed(), Some("can_0"));
        assert_eq!(pool.names().len(), 2);

        assert!(pool.remove("can_0"));
        assert_eq!(pool.last_failed(), None);
        assert!(!pool.remove("can_0"));
        assert_eq!(pool.names(), &["can_1".to_string()][..]);
    }
}
