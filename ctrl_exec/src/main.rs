//! Main controller executable entry point.
//!
//! # Architecture
//!
//! The executable plays the part of the simulation host. It builds an in-memory [`World`] from the
//! world parameters, attaches controllers to entities, and then runs the main loop:
//!
//!     - Deliver the scripted messages due this cycle
//!     - Step the world
//!     - Deliver collisions to the controllers that had them
//!     - Tick every controller whose wake time has been reached
//!     - Record the messages the controllers sent
//!
//! The recorded transcript is saved into the session directory at the end of the run.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use structopt::StructOpt;

// Internal
use comms_if::msg::Envelope;
use ctrl_lib::{
    capture_rig::CaptureRig,
    layout::LayoutReporter,
    sim::{Collision, Controller, EntityId, World, WorldParams},
    task_mgr::TaskMgr,
    zone::TrashBoxZone,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    script_interpreter::{PendingMsgs, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Parameters of the executable itself.
#[derive(Debug, Clone, Deserialize)]
struct ExecParams {
    /// Period of the world integration.
    ///
    /// Units: seconds
    world_step_s: f64,

    /// Length of a run.
    ///
    /// Units: seconds
    max_duration_s: f64,

    /// Name of the robot the robot-side controllers are attached to
    robot: String,

    /// Boxes which get a zone controller in a cleanup run
    zones: Vec<String>,
}

/// A controller attached to an entity.
struct Slot {
    entity: EntityId,
    name: String,
    ctrl: Box<dyn Controller>,
    next_wake_s: f64,
}

/// A message sent by a controller during the run.
#[derive(Debug, Serialize)]
struct TranscriptEntry {
    time_s: f64,
    msg: Envelope,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "ctrl_exec", about = "Runs the cleanup controllers against an in-memory world")]
enum Cli {
    /// Run the cleanup task, with a zone on each configured box
    #[structopt(name = "cleanup")]
    Cleanup {
        /// Message script played into the world
        #[structopt(parse(from_os_str))]
        script: PathBuf,
    },

    /// Run the layout reporter
    #[structopt(name = "layout")]
    Layout {
        /// Message script played into the world
        #[structopt(parse(from_os_str))]
        script: PathBuf,
    },

    /// Run a capture sweep
    #[structopt(name = "capture")]
    Capture,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let cli = Cli::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("ctrl_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    info!("CleanUp Controller Executable\n");
    info!(
        "Software root: {:?}",
        host::get_sw_root().wrap_err("Failed to get the software root")?
    );
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", cli);

    // ---- LOAD PARAMETERS ----

    let exec_params: ExecParams =
        util::params::load("ctrl_exec.toml").wrap_err("Could not load exec params")?;
    let world_params: WorldParams =
        util::params::load("world.toml").wrap_err("Could not load world params")?;

    info!("Exec parameters loaded");

    let mut world = World::from_params(&world_params);

    // ---- ATTACH CONTROLLERS ----

    let mut slots: Vec<Slot> = vec![];
    let mut script: Option<ScriptInterpreter> = None;
    let mut end_s = exec_params.max_duration_s;

    match cli {
        Cli::Cleanup { script: path } => {
            let task_mgr = TaskMgr::init("task_mgr.toml", "kinematics.toml", "router.toml")
                .wrap_err("Failed to initialise the TaskMgr")?;
            attach(&world, &mut slots, &exec_params.robot, Box::new(task_mgr))?;

            for name in exec_params.zones.iter() {
                let zone =
                    TrashBoxZone::init("zone.toml").wrap_err("Failed to initialise a zone")?;
                attach(&world, &mut slots, name, Box::new(zone))?;
            }

            script = Some(load_script(&path)?);
        }
        Cli::Layout { script: path } => {
            let reporter = LayoutReporter::init("layout.toml")
                .wrap_err("Failed to initialise the LayoutReporter")?;
            attach(&world, &mut slots, &exec_params.robot, Box::new(reporter))?;

            script = Some(load_script(&path)?);
        }
        Cli::Capture => {
            let rig = CaptureRig::init("capture.toml")
                .wrap_err("Failed to initialise the CaptureRig")?;

            let frames = (rig.params.last_step - rig.params.first_step + 1).max(0) as f64;
            end_s = end_s.min((frames + 1.0) * rig.params.tick_period_s);

            attach(&world, &mut slots, &exec_params.robot, Box::new(rig))?;
        }
    }

    info!("{} controller(s) attached", slots.len());

    for slot in slots.iter_mut() {
        let mut view = world
            .view(slot.entity)
            .ok_or_else(|| eyre!("{} left the world before initialisation", slot.name))?;
        slot.ctrl.on_init(&mut view);
    }

    // ---- MAIN LOOP ----

    info!("Beginning main loop, running for {:.1} s\n", end_s);

    let mut transcript: Vec<TranscriptEntry> = vec![];
    let mut now_s = 0.0;

    while now_s < end_s {
        // Scripted messages
        if let Some(si) = script.as_mut() {
            match si.get_pending_msgs(now_s) {
                PendingMsgs::Some(msgs) => {
                    for env in msgs {
                        deliver(&mut world, &mut slots, &env)?;
                    }
                }
                PendingMsgs::None => (),
                PendingMsgs::EndOfScript => {
                    info!("End of script reached at {:.2} s", now_s);
                    script = None;
                }
            }
        }

        let collisions = world.step(exec_params.world_step_s);
        now_s += exec_params.world_step_s;

        // Collisions are delivered before the tick they are seen in
        for slot in slots.iter_mut() {
            let mine: Vec<Collision> = collisions
                .iter()
                .filter(|(id, _)| *id == slot.entity)
                .map(|(_, c)| c.clone())
                .collect();

            if !mine.is_empty() {
                let mut view = world
                    .view(slot.entity)
                    .ok_or_else(|| eyre!("{} left the world", slot.name))?;
                slot.ctrl.on_collision(&mut view, &mine);
            }
        }

        for slot in slots.iter_mut() {
            if now_s < slot.next_wake_s {
                continue;
            }

            let mut view = world
                .view(slot.entity)
                .ok_or_else(|| eyre!("{} left the world", slot.name))?;
            let interval_s = slot.ctrl.on_action(&mut view, now_s);
            slot.next_wake_s = now_s + interval_s;
        }

        transcript.extend(
            world
                .take_outbox()
                .into_iter()
                .map(|msg| TranscriptEntry { time_s: now_s, msg }),
        );
    }

    // ---- SHUTDOWN ----

    info!(
        "Run complete after {:.2} s, {} message(s) sent and {} frame(s) captured",
        now_s,
        transcript.len(),
        world.captures().len()
    );

    session
        .save("transcript.json", &transcript)
        .wrap_err("Failed to save the transcript")?;
    session
        .save("captures.json", &world.captures())
        .wrap_err("Failed to save the capture list")?;

    Ok(())
}

/// Attach a controller to the named entity.
fn attach(
    world: &World,
    slots: &mut Vec<Slot>,
    name: &str,
    ctrl: Box<dyn Controller>,
) -> Result<(), Report> {
    let entity = world
        .id_of(name)
        .ok_or_else(|| eyre!("Cannot attach a controller to {}, it is not in the world", name))?;

    slots.push(Slot {
        entity,
        name: name.to_string(),
        ctrl,
        next_wake_s: 0.0,
    });

    Ok(())
}

fn load_script(path: &Path) -> Result<ScriptInterpreter, Report> {
    info!("Loading script from {:?}", path);

    let si = ScriptInterpreter::new(path).wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} messages\n",
        si.get_duration(),
        si.get_num_msgs()
    );

    Ok(si)
}

/// Deliver a message to every controller attached to the target entity.
fn deliver(world: &mut World, slots: &mut [Slot], env: &Envelope) -> Result<(), Report> {
    let mut delivered = false;

    for slot in slots.iter_mut().filter(|s| s.name == env.target) {
        let mut view = world
            .view(slot.entity)
            .ok_or_else(|| eyre!("{} left the world", slot.name))?;
        slot.ctrl.on_recv_msg(&mut view, &env.sender, &env.text);
        delivered = true;
    }

    if !delivered {
        warn!(
            "No controller on {} to deliver \"{}\" from {}",
            env.target, env.text, env.sender
        );
    }

    Ok(())
}
