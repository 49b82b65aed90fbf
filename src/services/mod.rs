//! gRPC service implementations.

pub mod gateway;

pub use gateway::GatewayService;
