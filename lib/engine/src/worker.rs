//! Single worker that drains the task queue.
//!
//! The worker owns the only drain loop in the engine. It sleeps on the
//! queue's notifier, claims the drain flag, and runs tasks strictly in
//! FIFO order until the queue is observed empty. Tasks enqueued while a
//! pass is running are handled by that same pass.
//!
//! Run failures are finalized inside the runner; an `Err` escaping
//! [`TaskRunner::run_task`] means no execution log could be written at
//! all, so the worker logs it and moves on to the next task.

use crate::error::EngineError;
use crate::queue::{Task, TaskQueue};
use async_trait::async_trait;
use crosswire_flow::ExecutionLog;
use std::sync::Arc;
use tokio::sync::watch;

/// Trait for executing one queued task to completion.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// Runs the task and returns the finished execution log.
    async fn run_task(&self, task: Task) -> Result<ExecutionLog, EngineError>;
}

/// Drives the queue: waits for work, then drains it one task at a time.
pub struct Worker<R: TaskRunner> {
    queue: Arc<TaskQueue>,
    runner: Arc<R>,
}

impl<R: TaskRunner> Clone for Worker<R> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            runner: Arc::clone(&self.runner),
        }
    }
}

impl<R: TaskRunner> Worker<R> {
    /// Creates a worker over the given queue and runner.
    pub fn new(queue: Arc<TaskQueue>, runner: Arc<R>) -> Self {
        Self { queue, runner }
    }

    /// Drains every pending task, including ones enqueued mid-pass.
    ///
    /// Returns the number of tasks processed. Returns 0 without touching
    /// the queue if another drain pass already holds the flag.
    pub async fn drain(&self) -> usize {
        if !self.queue.try_begin_drain() {
            return 0;
        }

        let mut processed = 0;
        while let Some(task) = self.queue.pop() {
            processed += 1;
            let flow_id = task.flow_id;
            let user_id = task.user_id;
            match self.runner.run_task(task).await {
                Ok(log) => {
                    tracing::info!(
                        flow_id = %log.flow_id,
                        log_id = %log.id,
                        status = %log.status,
                        path_len = log.execution_path.len(),
                        elapsed_ms = log.execution_time_ms.unwrap_or_default(),
                        "flow run finished"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        flow_id = %flow_id,
                        user_id = %user_id,
                        error = %e,
                        "task could not start a run"
                    );
                }
            }
        }

        self.queue.end_drain();
        processed
    }

    /// Runs until the shutdown signal flips to true or its sender drops.
    ///
    /// Any tasks enqueued before the signal are drained on the way out.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                () = self.queue.notified() => {
                    self.drain().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        let remaining = self.drain().await;
        tracing::debug!(drained = remaining, "worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosswire_core::{FlowId, UserId};
    use crosswire_social::{Platform, TriggerEvent};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn task() -> Task {
        Task::new(
            FlowId::new(),
            UserId::new(),
            TriggerEvent::manual(Platform::Instagram),
        )
    }

    fn finished_log(task: &Task) -> ExecutionLog {
        let mut log = ExecutionLog::start(
            task.flow_id,
            task.user_id,
            task.event.kind.clone(),
            serde_json::Value::Null,
        );
        log.complete(serde_json::json!({}), 0);
        log
    }

    /// Records the order tasks were run in.
    struct RecordingRunner {
        seen: Mutex<Vec<FlowId>>,
        fail_for: Mutex<Option<FlowId>>,
    }

    impl RecordingRunner {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                fail_for: Mutex::new(None),
            }
        }

        fn seen(&self) -> Vec<FlowId> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TaskRunner for RecordingRunner {
        async fn run_task(&self, task: Task) -> Result<ExecutionLog, EngineError> {
            self.seen.lock().unwrap().push(task.flow_id);
            if *self.fail_for.lock().unwrap() == Some(task.flow_id) {
                return Err(EngineError::FlowNotFound {
                    flow_id: task.flow_id,
                });
            }
            Ok(finished_log(&task))
        }
    }

    /// Enqueues one extra task the first time it runs.
    struct EnqueuingRunner {
        queue: Arc<TaskQueue>,
        extra: Mutex<Option<Task>>,
        saw_drain_flag: AtomicBool,
        runs: Mutex<Vec<FlowId>>,
    }

    #[async_trait]
    impl TaskRunner for EnqueuingRunner {
        async fn run_task(&self, task: Task) -> Result<ExecutionLog, EngineError> {
            self.runs.lock().unwrap().push(task.flow_id);
            self.saw_drain_flag
                .store(self.queue.is_draining(), Ordering::SeqCst);
            if let Some(extra) = self.extra.lock().unwrap().take() {
                self.queue.enqueue(extra);
            }
            Ok(finished_log(&task))
        }
    }

    #[tokio::test]
    async fn drains_tasks_in_fifo_order() {
        let queue = Arc::new(TaskQueue::new());
        let runner = Arc::new(RecordingRunner::new());
        let worker = Worker::new(Arc::clone(&queue), Arc::clone(&runner));

        let tasks = vec![task(), task(), task()];
        let expected: Vec<FlowId> = tasks.iter().map(|t| t.flow_id).collect();
        for t in tasks {
            queue.enqueue(t);
        }

        let processed = worker.drain().await;

        assert_eq!(processed, 3);
        assert_eq!(runner.seen(), expected);
        assert!(queue.is_empty());
        assert!(!queue.is_draining());
    }

    #[tokio::test]
    async fn tasks_enqueued_mid_drain_run_in_the_same_pass() {
        let queue = Arc::new(TaskQueue::new());
        let first = task();
        let second = task();
        let first_id = first.flow_id;
        let second_id = second.flow_id;

        let runner = Arc::new(EnqueuingRunner {
            queue: Arc::clone(&queue),
            extra: Mutex::new(Some(second)),
            saw_drain_flag: AtomicBool::new(false),
            runs: Mutex::new(Vec::new()),
        });
        let worker = Worker::new(Arc::clone(&queue), Arc::clone(&runner));

        queue.enqueue(first);
        let processed = worker.drain().await;

        assert_eq!(processed, 2);
        assert_eq!(*runner.runs.lock().unwrap(), vec![first_id, second_id]);
        assert!(runner.saw_drain_flag.load(Ordering::SeqCst));
        assert!(!queue.is_draining());
    }

    #[tokio::test]
    async fn a_failing_task_does_not_stop_the_drain() {
        let queue = Arc::new(TaskQueue::new());
        let runner = Arc::new(RecordingRunner::new());
        let worker = Worker::new(Arc::clone(&queue), Arc::clone(&runner));

        let doomed = task();
        let healthy = task();
        let healthy_id = healthy.flow_id;
        *runner.fail_for.lock().unwrap() = Some(doomed.flow_id);

        queue.enqueue(doomed);
        queue.enqueue(healthy);
        let processed = worker.drain().await;

        assert_eq!(processed, 2);
        assert!(runner.seen().contains(&healthy_id));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn drain_yields_when_flag_is_held() {
        let queue = Arc::new(TaskQueue::new());
        let runner = Arc::new(RecordingRunner::new());
        let worker = Worker::new(Arc::clone(&queue), Arc::clone(&runner));

        queue.enqueue(task());
        assert!(queue.try_begin_drain());

        assert_eq!(worker.drain().await, 0);
        assert_eq!(queue.len(), 1);

        queue.end_drain();
        assert_eq!(worker.drain().await, 1);
    }

    #[tokio::test]
    async fn shutdown_drains_remaining_tasks() {
        let queue = Arc::new(TaskQueue::new());
        let runner = Arc::new(RecordingRunner::new());
        let worker = Worker::new(Arc::clone(&queue), Arc::clone(&runner));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(worker.run(rx));

        queue.enqueue(task());
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(runner.seen().len(), 1);
        assert!(queue.is_empty());
    }
}
