//! Cellgate - transfer-coordination gateway
//!
//! Bridges a cell controller and a single-arm transfer robot: remote
//! operations arrive over gRPC, accepted transfer jobs wait in a bounded
//! FIFO queue, and a dispatch loop relays them one at a time to the robot
//! controller, gated on its polled busy flag.

pub mod config;
pub mod coordinator;
pub mod downstream;
pub mod queue;
pub mod services;
pub mod transport;
pub mod utils;

pub mod proto {
    tonic::include_proto!("cellgate");
}
