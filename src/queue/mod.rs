//! Bounded FIFO queue for pending transfer jobs.
//!
//! The queue is the single piece of shared mutable state between the
//! gateway service (which appends) and the dispatch loop (which removes).
//! Capacity overflow is a normal, expected result surfaced to the caller,
//! not an error.

use std::collections::VecDeque;

use tokio::sync::Mutex;

/// One pick-then-place actuation request.
///
/// Immutable once enqueued; consumed and discarded after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferJob {
    /// Module to pick from.
    pub pick_id: i32,
    /// Approach direction for picking.
    pub pick_dir: i32,
    /// Module to place onto.
    pub place_id: i32,
    /// Approach direction for placing.
    pub place_dir: i32,
}

/// Bounded FIFO queue of transfer jobs.
///
/// Safe for concurrent access between the task handling inbound remote
/// calls and the dispatch task. Jobs leave in strict arrival order; there
/// is no reordering, priority, or cancellation.
pub struct JobQueue {
    jobs: Mutex<VecDeque<TransferJob>>,
    capacity: usize,
}

impl JobQueue {
    /// Create a queue holding at most `capacity` jobs.
    pub fn new(capacity: usize) -> Self {
        Self {
            jobs: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a job at the tail.
    ///
    /// Returns false without mutating the queue when it is at capacity.
    pub async fn try_enqueue(&self, job: TransferJob) -> bool {
        let mut jobs = self.jobs.lock().await;
        if jobs.len() >= self.capacity {
            return false;
        }
        jobs.push_back(job);
        true
    }

    /// Remove and return the head job, or None when the queue is empty.
    pub async fn try_dequeue(&self) -> Option<TransferJob> {
        self.jobs.lock().await.pop_front()
    }

    /// Current occupancy.
    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    /// True when no jobs are queued.
    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }

    /// Maximum occupancy.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
