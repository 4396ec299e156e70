//! Structural view of a flow as a directed graph.
//!
//! Built on demand from a [`Flow`]'s node and edge lists, mainly so save-time
//! boundaries can validate structure. Traversal itself does not use this
//! view: the interpreter walks the authored edge list directly, because edge
//! order decides which branch runs.

use crate::definition::Flow;
use crate::error::GraphError;
use crate::node::NodeId;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// A flow's nodes and edges as a petgraph directed graph.
#[derive(Debug, Clone)]
pub struct FlowGraph {
    graph: DiGraph<NodeId, ()>,
    index: HashMap<NodeId, NodeIndex>,
}

impl FlowGraph {
    /// Builds the graph view of a flow.
    ///
    /// # Errors
    ///
    /// Returns an error if two nodes share an id or an edge references a node
    /// that does not exist.
    pub fn from_flow(flow: &Flow) -> Result<Self, GraphError> {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();

        for node in &flow.nodes {
            if index.contains_key(&node.id) {
                return Err(GraphError::DuplicateNode {
                    node_id: node.id.clone(),
                });
            }
            let idx = graph.add_node(node.id.clone());
            index.insert(node.id.clone(), idx);
        }

        for edge in &flow.edges {
            let source = *index
                .get(&edge.source)
                .ok_or_else(|| GraphError::DanglingEdge {
                    edge_id: edge.id.clone(),
                    node_id: edge.source.clone(),
                })?;
            let target = *index
                .get(&edge.target)
                .ok_or_else(|| GraphError::DanglingEdge {
                    edge_id: edge.id.clone(),
                    node_id: edge.target.clone(),
                })?;
            graph.add_edge(source, target, ());
        }

        Ok(Self { graph, index })
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph contains the given node.
    #[must_use]
    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.index.contains_key(node_id)
    }

    /// Whether the graph contains a directed cycle.
    ///
    /// Advisory: a cyclic flow is storable, and the interpreter's visited
    /// guard turns a cycle into a clean run failure. Boundaries that want to
    /// warn at save time can check here.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Edge;
    use crate::node::{Node, NodeKind};
    use crosswire_core::UserId;

    fn condition_node(id: &str) -> Node {
        Node::new(id, NodeKind::Condition)
    }

    #[test]
    fn builds_from_well_formed_flow() {
        let flow = Flow::new(UserId::new(), "test")
            .with_node(condition_node("a"))
            .with_node(condition_node("b"))
            .with_edge(Edge::new("e1", "a", "b"));

        let graph = FlowGraph::from_flow(&flow).expect("should build");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.contains(&NodeId::from("a")));
        assert!(!graph.has_cycle());
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let flow = Flow::new(UserId::new(), "test")
            .with_node(condition_node("a"))
            .with_node(condition_node("a"));

        let err = FlowGraph::from_flow(&flow).unwrap_err();
        assert_eq!(
            err,
            GraphError::DuplicateNode {
                node_id: NodeId::from("a"),
            }
        );
    }

    #[test]
    fn dangling_edge_is_rejected() {
        let flow = Flow::new(UserId::new(), "test")
            .with_node(condition_node("a"))
            .with_edge(Edge::new("e1", "a", "missing"));

        let err = FlowGraph::from_flow(&flow).unwrap_err();
        assert_eq!(
            err,
            GraphError::DanglingEdge {
                edge_id: "e1".to_string(),
                node_id: NodeId::from("missing"),
            }
        );
    }

    #[test]
    fn cycle_is_detected_but_not_an_error() {
        let flow = Flow::new(UserId::new(), "test")
            .with_node(condition_node("a"))
            .with_node(condition_node("b"))
            .with_edge(Edge::new("e1", "a", "b"))
            .with_edge(Edge::new("e2", "b", "a"));

        let graph = FlowGraph::from_flow(&flow).expect("cycles are storable");
        assert!(graph.has_cycle());
        assert!(flow.validate().is_ok());
    }
}
