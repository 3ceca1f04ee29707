//! Parameters structure for the TaskMgr

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::router::Obstacle;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the TaskMgr.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskMgrParams {
    /// Interval between ticks requested from the host.
    ///
    /// Units: seconds
    pub tick_period_s: f64,

    /// Name of the recognition service
    pub service: String,

    /// Name of the viewer, the only sender teleoperation messages are accepted from
    pub viewer: String,

    /// The mission profile: what to pick up, where it goes, and how the robot is built
    pub profile: MissionProfile,
}

/// Everything that differs between cleanup scenarios.
#[derive(Debug, Clone, Deserialize)]
pub struct MissionProfile {
    // ---- OBJECTS ----

    /// Names of the objects to be collected
    pub candidates: Vec<String>,

    /// Names of the places objects can be put
    pub boxes: Vec<String>,

    /// Map from an object name to the box it belongs in
    pub box_for: BTreeMap<String, String>,

    /// Static obstacles in the room, keyed by entity name. If the entity exists its live
    /// position replaces the centre given here.
    pub room_obstacles: BTreeMap<String, Obstacle>,

    /// The room obstacle objects are picked up from in the self-routed flow
    pub pick_obstacle: String,

    /// Footprint used to route around a box
    pub box_footprint: BoxFootprint,

    /// Footprints for boxes which differ from the default
    #[serde(default)]
    pub box_footprint_overrides: BTreeMap<String, BoxFootprint>,

    /// Random seed used to pick candidates, taken from the OS if not given
    #[serde(default)]
    pub seed: Option<u64>,

    // ---- ROBOT ----

    /// Joints moved to stow the arms at startup
    pub stow_joints: Vec<String>,

    /// Joint moved to reach for an object
    pub grasp_joint: String,

    /// If true the arm is raised straight after lowering, before the grasp is checked
    pub retract_after_lower: bool,

    /// Link which grasps objects
    pub gripper_part: String,

    /// Link the scene camera position is measured from, for cameras without their own link
    pub scene_cam_link: String,

    /// Camera used for scene reports until a `CamID` message selects another
    pub scene_cam_id: u32,

    // ---- TIMING ----

    /// Time to wait after releasing an object before moving the arm.
    ///
    /// Units: seconds
    pub release_settle_s: f64,

    /// Number of ticks the grasp flag is polled after lowering the arm before the grasp is
    /// considered to have failed
    pub grasp_confirm_ticks: u32,

    // ---- RESET ----

    /// Position (x, z) the robot is returned to on reset.
    ///
    /// Units: centimeters
    pub reset_pos_cm: [f64; 2],

    /// Camera pointed straight ahead on reset
    pub reset_cam_id: u32,
}

/// Footprint of a box, relative to the box's position.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoxFootprint {
    /// Units: centimeters
    pub offset_x_cm: f64,

    /// Units: centimeters
    pub offset_z_cm: f64,

    /// Units: centimeters
    pub width_cm: f64,

    /// Units: centimeters
    pub height_cm: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MissionProfile {
    /// Build the routing obstacle for a box at `(x, z)`.
    pub fn box_obstacle(&self, name: &str, x: f64, z: f64) -> Obstacle {
        let fp = self
            .box_footprint_overrides
            .get(name)
            .unwrap_or(&self.box_footprint);

        Obstacle::new(x + fp.offset_x_cm, z + fp.offset_z_cm, fp.width_cm, fp.height_cm)
    }
}

impl Default for TaskMgrParams {
    fn default() -> Self {
        Self {
            tick_period_s: 0.05,
            service: String::from("RecogTrash"),
            viewer: String::from("SIGViewer"),
            profile: MissionProfile::default(),
        }
    }
}

impl Default for MissionProfile {
    fn default() -> Self {
        let strings = |s: &[&str]| s.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let mut box_for = BTreeMap::new();
        for (objects, b) in [
            (&["petbottle_0", "petbottle_3"][..], "wagon_0"),
            (&["petbottle_1", "petbottle_2", "petbottle_4"][..], "trashbox_0"),
            (
                &["banana", "chigarette", "chocolate", "mayonaise_0", "mugcup"][..],
                "wagon_0",
            ),
            (&["mayonaise_1"][..], "trashbox_0"),
            (&["can_0", "can_1", "can_2", "can_3"][..], "trashbox_2"),
        ]
        .iter()
        {
            for o in objects.iter() {
                box_for.insert(o.to_string(), b.to_string());
            }
        }

        let mut room_obstacles = BTreeMap::new();
        for (name, x, y, w, h) in [
            ("table_0", 0.0, 0.0, 105.0, 60.0),
            ("table_1", 100.0, -100.0, 130.0, 60.0),
            ("table_2", -50.0, -90.0, 70.0, 40.0),
            ("wagon_0", 100.0, 100.0, 60.0, 65.0),
            ("trashbox_0", -150.0, 0.0, 40.0, 20.0),
            ("trashbox_1", -150.0, -50.0, 40.0, 20.0),
            ("trashbox_2", -150.0, -100.0, 40.0, 20.0),
        ]
        .iter()
        {
            room_obstacles.insert(name.to_string(), Obstacle::new(*x, *y, *w, *h));
        }

        let mut box_footprint_overrides = BTreeMap::new();
        box_footprint_overrides.insert(
            String::from("wagon_0"),
            BoxFootprint {
                offset_x_cm: -10.0,
                offset_z_cm: -8.0,
                width_cm: 60.0,
                height_cm: 40.0,
            },
        );

        Self {
            candidates: strings(&["banana", "chocolate", "mayonaise_1", "can_0", "can_1"]),
            boxes: strings(&["trashbox_0", "trashbox_1", "trashbox_2", "wagon_0"]),
            box_for,
            room_obstacles,
            pick_obstacle: String::from("table_0"),
            box_footprint: BoxFootprint {
                offset_x_cm: 0.0,
                offset_z_cm: 0.0,
                width_cm: 20.0,
                height_cm: 40.0,
            },
            box_footprint_overrides,
            seed: None,
            stow_joints: strings(&["LARM_JOINT4", "RARM_JOINT4"]),
            grasp_joint: String::from("RARM_JOINT4"),
            retract_after_lower: true,
            gripper_part: String::from("RARM_LINK7"),
            scene_cam_link: String::from("WAIST_LINK0"),
            scene_cam_id: 1,
            release_settle_s: 1.0,
            grasp_confirm_ticks: 3,
            reset_pos_cm: [0.0, -50.0],
            reset_cam_id: 3,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_box_obstacle() {
        let p = MissionProfile::default();

        let o = p.box_obstacle("trashbox_2", -150.0, -100.0);
        assert_eq!(o, Obstacle::new(-150.0, -100.0, 20.0, 40.0));

        let o = p.box_obstacle("wagon_0", 100.0, 100.0);
        assert_eq!(o, Obstacle::new(90.0, 92.0, 60.0, 40.0));
    }

    #[test]
    fn test_default_profile_maps_every_candidate() {
        let p = MissionProfile::default();

        for c in p.candidates.iter() {
            let b = p.box_for.get(c).expect("Candidate has no box");
            assert!(p.boxes.contains(b));
        }
    }

    #[test]
    fn test_parse_profile() {
        let params: TaskMgrParams = util::params::parse(
            r#"
            tick_period_s = 0.05
            service = "RecogTrash"
            viewer = "SIGViewer"

            [profile]
            candidates = ["can_0"]
            boxes = ["trashbox_2"]
            pick_obstacle = "table_0"
            stow_joints = ["RARM_JOINT4"]
            grasp_joint = "RARM_JOINT4"
            retract_after_lower = false
            gripper_part = "RARM_LINK7"
            scene_cam_link = "WAIST_LINK0"
            scene_cam_id = 1
            release_settle_s = 0.5
            grasp_confirm_ticks = 2
            reset_pos_cm = [0.0, -50.0]
            reset_cam_id = 3

            [profile.box_for]
            can_0 = "trashbox_2"

            [profile.room_obstacles.table_0]
            x = 0.0
            y = 0.0
            width = 105.0
            height = 60.0

            [profile.box_footprint]
            offset_x_cm = 0.0
            offset_z_cm = 0.0
            width_cm = 20.0
            height_cm = 40.0
            "#,
        )
        .unwrap();

        assert_eq!(params.profile.room_obstacles["table_0"].x_max, 52.5);
        assert_eq!(params.profile.seed, None);
        assert!(params.profile.box_footprint_overrides.is_empty());
    }
}
