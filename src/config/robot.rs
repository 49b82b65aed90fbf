//! Robot controller and dispatch loop configuration types.

use serde::Deserialize;

/// Dispatch loop configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Busy-poll period in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum number of queued transfer jobs.
    pub queue_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            queue_capacity: 3,
        }
    }
}

/// Connection configuration for the robot controller peer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Address of the robot controller's variable-access endpoint.
    pub address: String,
    /// Deadline for a single downstream read or write, in milliseconds.
    pub call_timeout_ms: u64,
    /// Variable keys in the robot controller's address space.
    pub keys: RobotKeys,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:4841".to_string(),
            call_timeout_ms: 2000,
            keys: RobotKeys::default(),
        }
    }
}

/// Namespace-qualified variable keys on the robot controller.
///
/// The keys are configuration, not protocol: the robot program reads and
/// writes these slots by name, and a different cell layout only needs a
/// different key set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RobotKeys {
    /// Start trigger for the pick-then-place motion.
    pub start: String,
    /// Busy flag owned by the robot controller.
    pub is_busy: String,
    /// Service position selector.
    pub service: String,
    /// Pick target module id.
    pub pick_id: String,
    /// Pick approach direction.
    pub pick_dir: String,
    /// Place target module id.
    pub place_id: String,
    /// Place approach direction.
    pub place_dir: String,
}

impl Default for RobotKeys {
    fn default() -> Self {
        Self {
            start: "ns=2;s=start".to_string(),
            is_busy: "ns=2;s=isBusy".to_string(),
            service: "ns=2;s=service".to_string(),
            pick_id: "ns=2;s=pick_id".to_string(),
            pick_dir: "ns=2;s=pick_dir".to_string(),
            place_id: "ns=2;s=place_id".to_string(),
            place_dir: "ns=2;s=place_dir".to_string(),
        }
    }
}
