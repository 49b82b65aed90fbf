//! Transfer coordinator: the dispatch loop.
//!
//! Polls the robot controller's busy flag on a fixed period and, when the
//! robot is idle and a job is queued, drives the pick-then-place actuation
//! sequence one job at a time.
//!
//! ## Architecture
//!
//! ```text
//! [GatewayService] --try_enqueue--> [JobQueue] --try_dequeue--> [TransferCoordinator]
//!                                                                      |
//!                                               position/start writes  v
//!                                                              [RobotPeer] --> robot
//! ```
//!
//! The coordinator owns the dequeue side of the queue and the published
//! busy mirror. Downstream failures abandon the in-flight job and are
//! never fatal to the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::config::RobotKeys;
use crate::downstream::{self, RobotPeer};
use crate::queue::{JobQueue, TransferJob};

/// Drives queued transfer jobs against the robot controller.
pub struct TransferCoordinator {
    queue: Arc<JobQueue>,
    peer: Arc<dyn RobotPeer>,
    keys: RobotKeys,
    poll_interval: Duration,
    busy_tx: watch::Sender<bool>,
}

impl TransferCoordinator {
    /// Create a new coordinator.
    pub fn new(
        queue: Arc<JobQueue>,
        peer: Arc<dyn RobotPeer>,
        keys: RobotKeys,
        poll_interval: Duration,
    ) -> Self {
        let (busy_tx, _) = watch::channel(false);
        Self {
            queue,
            peer,
            keys,
            poll_interval,
            busy_tx,
        }
    }

    /// Subscribe to the published busy flag.
    ///
    /// The value is refreshed after every successful busy poll.
    pub fn busy_flag(&self) -> watch::Receiver<bool> {
        self.busy_tx.subscribe()
    }

    /// Run the dispatch loop.
    ///
    /// This runs indefinitely, executing one dispatch cycle per poll
    /// period. There is no terminal state short of task cancellation.
    pub async fn run(&self) {
        info!(
            poll_interval = ?self.poll_interval,
            queue_capacity = self.queue.capacity(),
            "Starting transfer coordinator"
        );

        let mut ticker = interval(self.poll_interval);

        loop {
            ticker.tick().await;
            self.cycle().await;
        }
    }

    /// Execute one dispatch cycle: poll the busy flag, publish it, and
    /// when the robot is idle dispatch at most one queued job.
    pub async fn cycle(&self) {
        let busy = match self.peer.read_busy().await {
            Ok(busy) => busy,
            Err(e) => {
                warn!(error = %e, "Busy poll failed, skipping dispatch cycle");
                return;
            }
        };

        self.busy_tx.send_replace(busy);

        let queued = self.queue.len().await;
        debug!(robot_busy = busy, queued, "Dispatch cycle");

        if busy {
            return;
        }

        let job = match self.queue.try_dequeue().await {
            Some(job) => job,
            None => return,
        };

        // The job is consumed either way: a failed sequence leaves the
        // robot in an intermediate state and is not retried automatically.
        if let Err(e) = self.dispatch(&job).await {
            error!(
                error = %e,
                pick_id = job.pick_id,
                place_id = job.place_id,
                "Transfer dispatch failed, job abandoned"
            );
        }
    }

    /// Drive the actuation sequence for one job.
    ///
    /// Each step is awaited to completion before the next begins. The
    /// read-backs are acknowledgement telemetry; their values do not gate
    /// the sequence. The final start write is dispatch-only: motion
    /// completion is observed via the busy flag on later polls.
    async fn dispatch(&self, job: &TransferJob) -> downstream::Result<()> {
        let keys = &self.keys;

        self.peer
            .write_position(&keys.pick_id, &keys.pick_dir, job.pick_id, job.pick_dir)
            .await?;
        let (id, dir) = self
            .peer
            .read_position(&keys.pick_id, &keys.pick_dir)
            .await?;
        debug!(id, dir, "Pick position acknowledged");

        self.peer
            .write_position(&keys.place_id, &keys.place_dir, job.place_id, job.place_dir)
            .await?;
        let (id, dir) = self
            .peer
            .read_position(&keys.place_id, &keys.place_dir)
            .await?;
        debug!(id, dir, "Place position acknowledged");

        self.peer.write_start(true).await?;

        info!(
            pick_id = job.pick_id,
            pick_dir = job.pick_dir,
            place_id = job.place_id,
            place_dir = job.place_dir,
            "Transfer dispatched"
        );
        Ok(())
    }
}
