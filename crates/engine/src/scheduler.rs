//! Per-key operation scheduler
//!
//! A single task owns all scheduling state. Callers submit operations over a
//! channel and await a [`CompletionHandle`]; finished executions report back
//! on a second channel read by the same loop. Admission therefore never races:
//!
//! - at most `max_parallel` operations execute at once
//! - operations on the same key run one at a time, in submission order
//! - keys are admitted in the order they first became pending

use crate::operation::{Operation, Outcome, SkipReason};
use async_trait::async_trait;
use indexmap::IndexMap;
use remotesync_core::{Error, EventType, PathMatcher, Result};
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Executes an admitted operation
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// Run the operation to completion
    async fn handle(&self, op: &Operation) -> Result<Outcome>;
}

/// Point-in-time view of the scheduler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerSnapshot {
    /// Concurrency cap
    pub max_parallel: usize,
    /// Operations executing now
    pub running: usize,
    /// Keys with an operation executing
    pub in_progress: Vec<String>,
    /// Operations waiting behind the cap or their key
    pub queued: usize,
}

impl SchedulerSnapshot {
    /// Nothing running or queued
    pub fn is_idle(&self) -> bool {
        self.running == 0 && self.queued == 0
    }
}

type Settle = oneshot::Sender<Result<Outcome>>;

struct Pending {
    op: Operation,
    settle: Settle,
}

enum Command {
    Submit(Pending),
    Snapshot(oneshot::Sender<SchedulerSnapshot>),
}

/// Resolves once the submitted operation has settled
///
/// Dropping the handle does not cancel the operation.
pub struct CompletionHandle {
    state: HandleState,
}

enum HandleState {
    Ready(Option<Result<Outcome>>),
    Waiting(oneshot::Receiver<Result<Outcome>>),
}

impl CompletionHandle {
    fn ready(result: Result<Outcome>) -> Self {
        Self {
            state: HandleState::Ready(Some(result)),
        }
    }

    fn waiting(rx: oneshot::Receiver<Result<Outcome>>) -> Self {
        Self {
            state: HandleState::Waiting(rx),
        }
    }
}

impl Future for CompletionHandle {
    type Output = Result<Outcome>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            HandleState::Ready(result) => {
                Poll::Ready(result.take().unwrap_or(Err(Error::SchedulerClosed)))
            }
            HandleState::Waiting(rx) => Pin::new(rx)
                .poll(cx)
                .map(|settled| settled.unwrap_or(Err(Error::SchedulerClosed))),
        }
    }
}

/// Handle for submitting operations
///
/// Cheap to clone. The scheduling loop exits once every handle is dropped
/// and all accepted work has settled.
#[derive(Clone)]
pub struct Scheduler {
    commands: mpsc::UnboundedSender<Command>,
    matcher: Arc<dyn PathMatcher>,
}

impl Scheduler {
    /// Start the scheduling loop on the current tokio runtime
    ///
    /// `max_parallel` below 1 is treated as 1.
    pub fn spawn(
        max_parallel: usize,
        matcher: Arc<dyn PathMatcher>,
        handler: Arc<dyn OperationHandler>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = SchedulerState::new(max_parallel.max(1));
        let task = tokio::spawn(run_loop(state, rx, handler));
        (
            Self {
                commands: tx,
                matcher,
            },
            task,
        )
    }

    /// Queue an operation for `key`
    ///
    /// Excluded paths settle immediately as skipped and never reach the
    /// handler.
    pub fn submit(&self, key: impl Into<String>, event: EventType) -> CompletionHandle {
        let key = key.into();
        if self.matcher.is_excluded(Path::new(&key)) {
            tracing::debug!("Skipping ignored file: {key}");
            return CompletionHandle::ready(Ok(Outcome::Skipped(SkipReason::Excluded)));
        }

        let (settle, rx) = oneshot::channel();
        let pending = Pending {
            op: Operation::new(key, event),
            settle,
        };
        match self.commands.send(Command::Submit(pending)) {
            Ok(()) => CompletionHandle::waiting(rx),
            Err(_) => CompletionHandle::ready(Err(Error::SchedulerClosed)),
        }
    }

    /// Current counters and in-flight keys
    pub async fn snapshot(&self) -> Result<SchedulerSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Snapshot(tx))
            .map_err(|_| Error::SchedulerClosed)?;
        rx.await.map_err(|_| Error::SchedulerClosed)
    }
}

struct SchedulerState {
    max_parallel: usize,
    running: usize,
    in_progress: HashSet<String>,
    queues: IndexMap<String, VecDeque<Pending>>,
}

impl SchedulerState {
    fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel,
            running: 0,
            in_progress: HashSet::new(),
            queues: IndexMap::new(),
        }
    }

    fn enqueue(&mut self, pending: Pending) {
        tracing::trace!(key = %pending.op.key, event = %pending.op.event, "Queued operation");
        self.queues
            .entry(pending.op.key.clone())
            .or_default()
            .push_back(pending);
    }

    /// Take every operation that may start now
    fn admit(&mut self) -> Vec<Pending> {
        let mut admitted = Vec::new();
        for (key, queue) in &mut self.queues {
            if self.running >= self.max_parallel {
                break;
            }
            if self.in_progress.contains(key) {
                continue;
            }
            if let Some(pending) = queue.pop_front() {
                self.running += 1;
                self.in_progress.insert(key.clone());
                admitted.push(pending);
            }
        }
        admitted
    }

    fn complete(&mut self, key: &str) {
        self.running = self.running.saturating_sub(1);
        self.in_progress.remove(key);
        if self.queues.get(key).is_some_and(VecDeque::is_empty) {
            self.queues.shift_remove(key);
        }
    }

    fn is_idle(&self) -> bool {
        self.running == 0 && self.queues.is_empty()
    }

    fn snapshot(&self) -> SchedulerSnapshot {
        let mut in_progress: Vec<String> = self.in_progress.iter().cloned().collect();
        in_progress.sort();
        SchedulerSnapshot {
            max_parallel: self.max_parallel,
            running: self.running,
            in_progress,
            queued: self.queues.values().map(VecDeque::len).sum(),
        }
    }
}

/// Sends the finished key back to the loop even if the handler panics
struct DoneGuard {
    key: String,
    done: mpsc::UnboundedSender<String>,
}

impl Drop for DoneGuard {
    fn drop(&mut self) {
        let _ = self.done.send(std::mem::take(&mut self.key));
    }
}

async fn run_loop(
    mut state: SchedulerState,
    mut commands: mpsc::UnboundedReceiver<Command>,
    handler: Arc<dyn OperationHandler>,
) {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<String>();
    let mut accepting = true;

    loop {
        // Completions first, so a snapshot never counts settled work
        tokio::select! {
            biased;
            Some(key) = done_rx.recv() => state.complete(&key),
            command = commands.recv(), if accepting => match command {
                Some(Command::Submit(pending)) => state.enqueue(pending),
                Some(Command::Snapshot(reply)) => {
                    let _ = reply.send(state.snapshot());
                }
                None => accepting = false,
            },
        }

        for pending in state.admit() {
            let handler = Arc::clone(&handler);
            let guard = DoneGuard {
                key: pending.op.key.clone(),
                done: done_tx.clone(),
            };
            tokio::spawn(async move {
                let result = handler.handle(&pending.op).await;
                // Report completion before the caller can observe the result
                drop(guard);
                let _ = pending.settle.send(result);
            });
        }

        if !accepting && state.is_idle() {
            tracing::debug!("Scheduler drained, stopping");
            break;
        }
    }
}
