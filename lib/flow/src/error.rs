//! Error types for the flow model crate.

use crate::node::NodeId;
use std::fmt;

/// Structural problems in a flow's graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two nodes share the same id.
    DuplicateNode { node_id: NodeId },
    /// An edge references a node that does not exist in the flow.
    DanglingEdge { edge_id: String, node_id: NodeId },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNode { node_id } => {
                write!(f, "duplicate node id: {node_id}")
            }
            Self::DanglingEdge { edge_id, node_id } => {
                write!(f, "edge {edge_id} references unknown node: {node_id}")
            }
        }
    }
}

impl std::error::Error for GraphError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_node_display() {
        let err = GraphError::DuplicateNode {
            node_id: NodeId::from("n1"),
        };
        assert_eq!(err.to_string(), "duplicate node id: n1");
    }

    #[test]
    fn dangling_edge_display() {
        let err = GraphError::DanglingEdge {
            edge_id: "e9".to_string(),
            node_id: NodeId::from("ghost"),
        };
        assert_eq!(err.to_string(), "edge e9 references unknown node: ghost");
    }
}
