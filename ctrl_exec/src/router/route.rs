//! A route being followed

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::Node;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An ordered list of waypoints with a cursor to the next one to visit.
///
/// The first node is the point the route was planned from, so the cursor starts at the second.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Route {
    nodes: Vec<Node>,
    cursor: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Route {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes, cursor: 1 }
    }

    /// The next node to visit, or `None` once the route has been completed.
    pub fn current(&self) -> Option<Node> {
        self.nodes.get(self.cursor).copied()
    }

    /// Move the cursor on to the next node.
    pub fn advance(&mut self) {
        if self.cursor < self.nodes.len() {
            self.cursor += 1;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.nodes.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
