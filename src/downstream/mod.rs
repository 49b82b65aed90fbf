//! Robot controller peer.
//!
//! This module contains:
//! - `RobotPeer` trait: read/write primitives against the robot controller
//! - `DownstreamError`: failure taxonomy for downstream calls
//! - Implementations: gRPC variable-access client, in-memory mock

use std::time::Duration;

use async_trait::async_trait;
use tonic::Status;

pub mod grpc;
pub mod mock;

pub use grpc::GrpcRobotPeer;
pub use mock::MockRobotPeer;

/// Result type for downstream operations.
pub type Result<T> = std::result::Result<T, DownstreamError>;

/// Errors that can occur talking to the robot controller.
#[derive(Debug, thiserror::Error)]
pub enum DownstreamError {
    /// A read or write did not complete within the call deadline.
    #[error("downstream call on '{key}' did not complete within {timeout:?}")]
    Unresponsive { key: String, timeout: Duration },

    /// Transport-level error from tonic.
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// gRPC error from the robot controller.
    #[error("grpc error: {0}")]
    Grpc(Box<Status>),

    /// A variable read returned no value.
    #[error("variable '{key}' returned no value")]
    Empty { key: String },

    /// A variable holds a value of the wrong kind.
    #[error("variable '{key}' is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

impl From<Status> for DownstreamError {
    fn from(status: Status) -> Self {
        DownstreamError::Grpc(Box::new(status))
    }
}

impl DownstreamError {
    /// Returns true if the downstream call timed out.
    pub fn is_unresponsive(&self) -> bool {
        matches!(self, DownstreamError::Unresponsive { .. })
    }
}

/// Read/write primitives against the robot controller.
///
/// Every operation completes before returning; the start trigger is the
/// only write whose physical effect is not awaited. The busy flag and the
/// start trigger live in fixed slots the peer is constructed with, while
/// position and service slots are named by the caller.
#[async_trait]
pub trait RobotPeer: Send + Sync {
    /// Poll the busy flag owned by the robot controller.
    async fn read_busy(&self) -> Result<bool>;

    /// Write a target module id and approach direction pair.
    async fn write_position(&self, id_key: &str, dir_key: &str, id: i32, dir: i32) -> Result<()>;

    /// Read back a module id and direction pair.
    async fn read_position(&self, id_key: &str, dir_key: &str) -> Result<(i32, i32)>;

    /// Write the start trigger for the pick-then-place motion.
    async fn write_start(&self, run: bool) -> Result<()>;

    /// Write the service position selector.
    async fn write_service(&self, key: &str, service_id: i32) -> Result<()>;
}
