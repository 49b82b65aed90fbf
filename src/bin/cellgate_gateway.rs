//! cellgate-gateway: Transfer-coordination gateway
//!
//! Exposes the transfer gateway service to the cell controller and relays
//! accepted jobs, one at a time, to the robot controller.
//!
//! ## Architecture
//! ```text
//! [Cell Controller] -> [cellgate-gateway] -> [Robot Controller]
//!                            |
//!        RequestTransfer --> [JobQueue] --> dispatch loop
//!        RequestService  ------------------ immediate forward
//! ```
//!
//! ## Configuration
//! - CELLGATE_CONFIG: Path to a YAML configuration file
//! - CELLGATE__SERVER__PORT etc.: Environment overrides for any setting
//! - CELLGATE_LOG: Tracing filter (default "info")

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use backon::Retryable;
use tonic::transport::Server;
use tonic_health::server::health_reporter;
use tracing::{info, warn};

use cellgate::config::Config;
use cellgate::coordinator::TransferCoordinator;
use cellgate::downstream::{GrpcRobotPeer, RobotPeer};
use cellgate::proto::transfer_gateway_server::TransferGatewayServer;
use cellgate::queue::JobQueue;
use cellgate::services::GatewayService;
use cellgate::transport::{connect_to_address, grpc_trace_layer};
use cellgate::utils::bootstrap::init_tracing;
use cellgate::utils::retry::connection_backoff;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting cellgate gateway");

    let config = Config::load(None)?;

    // Connect to the robot controller with exponential backoff
    let downstream_address = config.downstream.address.clone();
    let channel = (|| {
        let address = downstream_address.clone();
        async move { connect_to_address(&address).await.map_err(|e| e.to_string()) }
    })
    .retry(connection_backoff())
    .notify(|err: &String, dur: Duration| {
        warn!(service = "robot", error = %err, delay = ?dur, "Connection failed, retrying");
    })
    .await?;
    info!(address = %config.downstream.address, "Connected to robot controller");

    let peer: Arc<dyn RobotPeer> = Arc::new(GrpcRobotPeer::new(
        channel,
        config.downstream.keys.clone(),
        Duration::from_millis(config.downstream.call_timeout_ms),
    ));

    let queue = Arc::new(JobQueue::new(config.coordinator.queue_capacity));
    let coordinator = Arc::new(TransferCoordinator::new(
        queue.clone(),
        peer.clone(),
        config.downstream.keys.clone(),
        Duration::from_millis(config.coordinator.poll_interval_ms),
    ));

    let gateway = GatewayService::new(
        queue,
        peer,
        config.downstream.keys.service.clone(),
        coordinator.busy_flag(),
    );

    {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.run().await });
    }

    // Create health reporter
    let (mut health_reporter, health_service) = health_reporter();
    health_reporter
        .set_service_status("", tonic_health::ServingStatus::Serving)
        .await;

    let addr: SocketAddr = config.server.addr().parse()?;
    info!(address = %addr, "Gateway listening");

    Server::builder()
        .layer(grpc_trace_layer())
        .add_service(health_service)
        .add_service(TransferGatewayServer::new(gateway))
        .serve_with_shutdown(addr, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
