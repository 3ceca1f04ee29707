//! # Controller library.
//!
//! This library allows the executable, the benchmarks and other crates in the workspace to access
//! the controllers defined inside the ctrl_exec crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Simulator interface - the host object API as seen by a controller, plus an in-memory host
pub mod sim;

/// Kinematics module - differential drive wheel commands and grab geometry
pub mod kinematics;

/// Router module - obstacle aware waypoint routes across the room
pub mod router;

/// Task manager - the cleanup robot's task state machine
pub mod task_mgr;

/// Message processor - turns inbound directives into task state changes
mod msg_processor;

/// Trash box zone - drops released objects into the boxes
pub mod zone;

/// Layout reporter - answers the layout manager's position queries
pub mod layout;

/// Capture rig - orbits a point collecting training images
pub mod capture_rig;
