//! Directed edges between flow nodes.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// A directed arc from one node to the next.
///
/// Traversal follows the *first* edge in a flow's edge list whose source is
/// the current node; any further edges out of the same node are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Identity assigned by the flow editor.
    pub id: String,
    /// The node this edge leaves.
    pub source: NodeId,
    /// The node this edge enters.
    pub target: NodeId,
}

impl Edge {
    /// Creates an edge.
    #[must_use]
    pub fn new(id: impl Into<String>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_serde_roundtrip() {
        let edge = Edge::new("e1", "n1", "n2");
        let json = serde_json::to_string(&edge).expect("serialize");
        let parsed: Edge = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, edge);
        assert_eq!(parsed.source, NodeId::from("n1"));
    }
}
