//! The handoff queue between the network thread and the tick context.
//!
//! RULE: This is the only path by which snapshots cross threads.
//! The lock is held for the push or drain itself, never while decoding or
//! reconciling.
//!
//! The queue is bounded. What happens when the consumer falls behind is
//! chosen explicitly through `OverflowPolicy`.

use crate::snapshot::SimulationSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// How long a blocked producer sleeps before re-checking for close.
const BLOCK_RECHECK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the oldest queued snapshot to admit the new one.
    /// Snapshots are full-state, so the newest one supersedes the rest.
    #[default]
    DropOldest,
    /// Block the producer until the consumer drains.
    BlockProducer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// Queued after evicting the oldest entry.
    DroppedOldest,
    /// The queue was closed; the snapshot was discarded.
    Closed,
}

#[derive(Debug)]
struct QueueState {
    items:   VecDeque<SimulationSnapshot>,
    closed:  bool,
    dropped: u64,
}

#[derive(Debug)]
struct Shared {
    state:    Mutex<QueueState>,
    not_full: Condvar,
    capacity: usize,
    policy:   OverflowPolicy,
}

impl Shared {
    // A panic while holding this lock cannot leave the deque half-written,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Create a bounded queue. `capacity` is clamped to at least 1.
pub fn handoff_queue(
    capacity: usize,
    policy: OverflowPolicy,
) -> (SnapshotSender, SnapshotReceiver) {
    let capacity = capacity.max(1);
    let shared = Arc::new(Shared {
        state: Mutex::new(QueueState {
            items:   VecDeque::with_capacity(capacity),
            closed:  false,
            dropped: 0,
        }),
        not_full: Condvar::new(),
        capacity,
        policy,
    });
    (
        SnapshotSender { shared: Arc::clone(&shared) },
        SnapshotReceiver { shared },
    )
}

/// Producer half. Cloneable and sendable to the network thread.
#[derive(Debug, Clone)]
pub struct SnapshotSender {
    shared: Arc<Shared>,
}

impl SnapshotSender {
    pub fn push(&self, snapshot: SimulationSnapshot) -> PushOutcome {
        let mut state = self.shared.lock();
        if state.closed {
            return PushOutcome::Closed;
        }

        if state.items.len() < self.shared.capacity {
            state.items.push_back(snapshot);
            return PushOutcome::Queued;
        }

        match self.shared.policy {
            OverflowPolicy::DropOldest => {
                state.items.pop_front();
                state.items.push_back(snapshot);
                state.dropped += 1;
                let dropped = state.dropped;
                drop(state);
                log::warn!("handoff queue full: dropped oldest snapshot ({dropped} total)");
                PushOutcome::DroppedOldest
            }
            OverflowPolicy::BlockProducer => {
                while state.items.len() >= self.shared.capacity && !state.closed {
                    state = self
                        .shared
                        .not_full
                        .wait_timeout(state, BLOCK_RECHECK)
                        .map(|(guard, _)| guard)
                        .unwrap_or_else(|poisoned| poisoned.into_inner().0);
                }
                if state.closed {
                    return PushOutcome::Closed;
                }
                state.items.push_back(snapshot);
                PushOutcome::Queued
            }
        }
    }

    /// Close the queue from the producer side (e.g. on shutdown).
    pub fn close(&self) {
        close(&self.shared);
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

/// Consumer half. Owned by the tick driver; not cloneable.
#[derive(Debug)]
pub struct SnapshotReceiver {
    shared: Arc<Shared>,
}

impl SnapshotReceiver {
    /// Take everything queued, oldest first.
    pub fn drain_all(&self) -> Vec<SimulationSnapshot> {
        let drained: Vec<_> = {
            let mut state = self.shared.lock();
            state.items.drain(..).collect()
        };
        if !drained.is_empty() {
            self.shared.not_full.notify_all();
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.shared.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Snapshots evicted by `DropOldest` since creation.
    pub fn dropped(&self) -> u64 {
        self.shared.lock().dropped
    }

    pub fn close(&self) {
        close(&self.shared);
    }
}

impl Drop for SnapshotReceiver {
    fn drop(&mut self) {
        close(&self.shared);
    }
}

fn close(shared: &Shared) {
    shared.lock().closed = true;
    shared.not_full.notify_all();
}
