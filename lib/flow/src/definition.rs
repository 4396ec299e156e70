//! Flow definition types.
//!
//! A flow is a user-authored automation consisting of:
//! - Identity and ownership
//! - An ordered list of nodes and a list of edges
//! - Settings (activation state, trigger bookkeeping)
//! - Aggregate run statistics

use crate::edge::Edge;
use crate::error::GraphError;
use crate::graph::FlowGraph;
use crate::node::{Node, NodeId};
use chrono::{DateTime, Utc};
use crosswire_core::{FlowId, UserId};
use serde::{Deserialize, Serialize};

/// Authored settings for a flow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    /// Whether the flow participates in trigger matching.
    pub is_active: bool,
    /// When the flow last ran, successfully or not.
    pub last_triggered: Option<DateTime<Utc>>,
    /// Authored cooldown between runs, in seconds. Not enforced by the
    /// engine; carried for the editor.
    pub cooldown_period: u64,
    /// Authored run limit. Zero means unlimited. Not enforced by the engine.
    pub max_executions: u64,
}

/// Aggregate statistics across a flow's runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowStats {
    /// Total runs started.
    pub triggered: u64,
    /// Runs that finished successfully.
    pub completed: u64,
    /// Runs that finished with an error.
    pub failed: u64,
    /// completed / triggered × 100; 0.0 when nothing has triggered.
    pub conversion_rate: f64,
}

impl FlowStats {
    /// Records a successful run.
    pub fn record_completed(&mut self) {
        self.triggered += 1;
        self.completed += 1;
        self.recompute_conversion_rate();
    }

    /// Records a failed run.
    pub fn record_failed(&mut self) {
        self.triggered += 1;
        self.failed += 1;
        self.recompute_conversion_rate();
    }

    fn recompute_conversion_rate(&mut self) {
        self.conversion_rate = if self.triggered == 0 {
            0.0
        } else {
            self.completed as f64 / self.triggered as f64 * 100.0
        };
    }
}

/// A complete flow definition.
///
/// This is the durable document the Flow Store persists; the engine mutates
/// it only through explicit saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    /// Unique identifier for this flow.
    pub id: FlowId,
    /// The owning user.
    pub user_id: UserId,
    /// Human-readable name.
    pub name: String,
    /// Description of what this flow does.
    pub description: Option<String>,
    /// The flow's nodes, in authored order.
    pub nodes: Vec<Node>,
    /// The flow's edges, in authored order. Edge order is significant:
    /// traversal follows the first matching edge.
    pub edges: Vec<Edge>,
    /// Activation settings and trigger bookkeeping.
    pub settings: FlowSettings,
    /// Aggregate run statistics.
    pub stats: FlowStats,
    /// When this flow was created.
    pub created_at: DateTime<Utc>,
    /// When this flow was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Flow {
    /// Creates an empty, inactive flow.
    #[must_use]
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: FlowId::new(),
            user_id,
            name: name.into(),
            description: None,
            nodes: Vec::new(),
            edges: Vec::new(),
            settings: FlowSettings::default(),
            stats: FlowStats::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a node.
    #[must_use]
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Appends an edge.
    #[must_use]
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Returns whether the flow participates in trigger matching.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.settings.is_active
    }

    /// Sets the activation state.
    pub fn set_active(&mut self, active: bool) {
        self.settings.is_active = active;
        self.touch();
    }

    /// Marks the flow as updated.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Returns the node with the given id, if any.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    /// Returns the flow's entry node: the first node whose kind is a trigger.
    ///
    /// A flow without one can never run.
    #[must_use]
    pub fn entry_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|node| node.kind.is_trigger())
    }

    /// Returns the first edge leaving the given node, in authored edge order.
    #[must_use]
    pub fn first_edge_from(&self, node_id: &NodeId) -> Option<&Edge> {
        self.edges.iter().find(|edge| &edge.source == node_id)
    }

    /// Records one run outcome: bumps the counters, recomputes the
    /// conversion rate, and stamps `last_triggered`.
    pub fn record_run(&mut self, completed: bool) {
        if completed {
            self.stats.record_completed();
        } else {
            self.stats.record_failed();
        }
        self.settings.last_triggered = Some(Utc::now());
        self.touch();
    }

    /// Validates the flow's graph structure (unique node ids, edges that
    /// reference existing nodes).
    ///
    /// Cycles are deliberately not rejected here; the interpreter guards
    /// against them at run time.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first structural problem found.
    pub fn validate(&self) -> Result<(), GraphError> {
        FlowGraph::from_flow(self).map(|_| ())
    }
}
