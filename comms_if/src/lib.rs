//! # Communications interface crate.
//!
//! Provides the text message protocol spoken between the controllers, the recognition service, the
//! layout manager and the viewer.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Inbound and outbound text messages
pub mod msg;
