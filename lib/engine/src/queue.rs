//! Unbounded FIFO queue of pending trigger work.
//!
//! Matched events become [`Task`]s that wait here until the worker drains
//! them. Enqueueing wakes the worker through a [`Notify`] handle instead of
//! a polling timer, so tasks start as soon as they arrive. The `draining`
//! flag guarantees a single drainer at a time; anything enqueued while a
//! drain is in progress is picked up by the same pass.

use crosswire_core::{FlowId, UserId};
use crosswire_social::TriggerEvent;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// One unit of queued work: run a single flow against a single event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// The flow to interpret.
    pub flow_id: FlowId,
    /// Owner of the flow, kept for attribution even if the flow is
    /// deleted before the task is drained.
    pub user_id: UserId,
    /// The event that matched the flow's trigger.
    pub event: TriggerEvent,
}

impl Task {
    /// Creates a task for the given flow and event.
    #[must_use]
    pub fn new(flow_id: FlowId, user_id: UserId, event: TriggerEvent) -> Self {
        Self {
            flow_id,
            user_id,
            event,
        }
    }
}

/// FIFO task queue shared between producers and the single worker.
#[derive(Default)]
pub struct TaskQueue {
    pending: Mutex<VecDeque<Task>>,
    notify: Notify,
    draining: AtomicBool,
}

impl TaskQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a task and wakes the worker.
    pub fn enqueue(&self, task: Task) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push_back(task);
        }
        self.notify.notify_one();
    }

    /// Removes and returns the oldest task.
    pub(crate) fn pop(&self) -> Option<Task> {
        self.pending.lock().ok().and_then(|mut q| q.pop_front())
    }

    /// Waits until a task has been enqueued since the last wakeup.
    pub(crate) async fn notified(&self) {
        self.notify.notified().await;
    }

    /// Number of tasks waiting to be drained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.lock().map(|q| q.len()).unwrap_or(0)
    }

    /// Returns true when nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a drain pass is currently running.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::SeqCst)
    }

    /// Claims the drain flag. Returns false if another drain holds it.
    pub(crate) fn try_begin_drain(&self) -> bool {
        self.draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Releases the drain flag.
    pub(crate) fn end_drain(&self) {
        self.draining.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosswire_social::Platform;

    fn task() -> Task {
        Task::new(
            FlowId::new(),
            UserId::new(),
            TriggerEvent::manual(Platform::Instagram),
        )
    }

    #[test]
    fn pops_in_fifo_order() {
        let queue = TaskQueue::new();
        let first = task();
        let second = task();
        let third = task();
        let expected = vec![first.flow_id, second.flow_id, third.flow_id];

        queue.enqueue(first);
        queue.enqueue(second);
        queue.enqueue(third);
        assert_eq!(queue.len(), 3);

        let drained: Vec<FlowId> = std::iter::from_fn(|| queue.pop().map(|t| t.flow_id)).collect();
        assert_eq!(drained, expected);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_flag_is_exclusive() {
        let queue = TaskQueue::new();
        assert!(!queue.is_draining());

        assert!(queue.try_begin_drain());
        assert!(queue.is_draining());
        assert!(!queue.try_begin_drain());

        queue.end_drain();
        assert!(!queue.is_draining());
        assert!(queue.try_begin_drain());
    }

    #[tokio::test]
    async fn enqueue_stores_a_wakeup_permit() {
        let queue = TaskQueue::new();
        queue.enqueue(task());

        // The permit from enqueue resolves this wait immediately.
        queue.notified().await;
        assert_eq!(queue.len(), 1);
    }
}
