//! In-memory registry of flows eligible for trigger matching.
//!
//! The registry is the engine's working set: only flows present here are
//! considered when an event arrives. It is owned by the [`Engine`] and
//! handed to the matcher and interpreter, never reached through globals.
//!
//! [`Engine`]: crate::engine::Engine

use crosswire_core::FlowId;
use crosswire_flow::Flow;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared registry of active flows keyed by id.
///
/// Flows are stored behind `Arc` so matcher snapshots are cheap and never
/// block writers for long.
#[derive(Default)]
pub struct ActiveFlowRegistry {
    flows: RwLock<HashMap<FlowId, Arc<Flow>>>,
}

impl ActiveFlowRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a flow.
    pub fn insert(&self, flow: Flow) {
        if let Ok(mut flows) = self.flows.write() {
            flows.insert(flow.id, Arc::new(flow));
        }
    }

    /// Removes a flow. Returns whether it was present.
    pub fn remove(&self, flow_id: FlowId) -> bool {
        match self.flows.write() {
            Ok(mut flows) => flows.remove(&flow_id).is_some(),
            Err(_) => false,
        }
    }

    /// Re-registers the flow if it is active, removes it otherwise.
    ///
    /// Called after every run and every store update so the registry
    /// tracks the persisted activation state.
    pub fn refresh(&self, flow: &Flow) {
        if flow.is_active() {
            self.insert(flow.clone());
        } else {
            self.remove(flow.id);
        }
    }

    /// Returns the registered flow, if any.
    #[must_use]
    pub fn get(&self, flow_id: FlowId) -> Option<Arc<Flow>> {
        self.flows
            .read()
            .ok()
            .and_then(|flows| flows.get(&flow_id).cloned())
    }

    /// Returns a point-in-time copy of every registered flow.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Flow>> {
        self.flows
            .read()
            .map(|flows| flows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Replaces the whole working set, e.g. on startup.
    pub fn replace_all(&self, flows: Vec<Flow>) {
        if let Ok(mut map) = self.flows.write() {
            map.clear();
            for flow in flows {
                map.insert(flow.id, Arc::new(flow));
            }
        }
    }

    /// Number of registered flows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flows.read().map(|flows| flows.len()).unwrap_or(0)
    }

    /// Returns true when no flows are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosswire_core::UserId;

    fn active_flow(name: &str) -> Flow {
        let mut flow = Flow::new(UserId::new(), name);
        flow.set_active(true);
        flow
    }

    #[test]
    fn insert_get_remove() {
        let registry = ActiveFlowRegistry::new();
        let flow = active_flow("welcome");
        let flow_id = flow.id;

        registry.insert(flow);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(flow_id).unwrap().name, "welcome");

        assert!(registry.remove(flow_id));
        assert!(!registry.remove(flow_id));
        assert!(registry.is_empty());
    }

    #[test]
    fn refresh_follows_activation_state() {
        let registry = ActiveFlowRegistry::new();
        let mut flow = active_flow("toggled");

        registry.refresh(&flow);
        assert_eq!(registry.len(), 1);

        flow.set_active(false);
        registry.refresh(&flow);
        assert!(registry.is_empty());
    }

    #[test]
    fn replace_all_resets_working_set() {
        let registry = ActiveFlowRegistry::new();
        registry.insert(active_flow("old"));

        let replacement = vec![active_flow("a"), active_flow("b")];
        registry.replace_all(replacement);

        assert_eq!(registry.len(), 2);
        let names: Vec<String> = registry
            .snapshot()
            .iter()
            .map(|f| f.name.clone())
            .collect();
        assert!(names.contains(&"a".to_string()));
        assert!(names.contains(&"b".to_string()));
    }

    #[test]
    fn snapshot_is_point_in_time() {
        let registry = ActiveFlowRegistry::new();
        registry.insert(active_flow("first"));

        let snapshot = registry.snapshot();
        registry.insert(active_flow("second"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 2);
    }
}
