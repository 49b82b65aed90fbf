//! Transfer gateway service.
//!
//! The upstream-facing remote operations: queue a transfer, select a
//! service position, and report cell status. The service only appends to
//! the job queue; dispatch is the coordinator's job.

use std::sync::Arc;

use tokio::sync::watch;
use tonic::{Request, Response, Status};
use tracing::{debug, error, info};

use crate::downstream::RobotPeer;
use crate::proto::transfer_gateway_server::TransferGateway;
use crate::proto::{
    CellStatus, CellStatusRequest, ServiceReply, ServiceRequest, TransferReply, TransferRequest,
};
use crate::queue::{JobQueue, TransferJob};

/// Transfer gateway service.
///
/// Receives remote operations from the cell controller and either queues
/// a transfer job or forwards a service selection immediately.
pub struct GatewayService {
    queue: Arc<JobQueue>,
    peer: Arc<dyn RobotPeer>,
    service_key: String,
    busy: watch::Receiver<bool>,
}

impl GatewayService {
    /// Create a new gateway service.
    pub fn new(
        queue: Arc<JobQueue>,
        peer: Arc<dyn RobotPeer>,
        service_key: String,
        busy: watch::Receiver<bool>,
    ) -> Self {
        Self {
            queue,
            peer,
            service_key,
            busy,
        }
    }
}

#[tonic::async_trait]
impl TransferGateway for GatewayService {
    async fn request_transfer(
        &self,
        request: Request<TransferRequest>,
    ) -> Result<Response<TransferReply>, Status> {
        let req = request.into_inner();
        let job = TransferJob {
            pick_id: req.pick_id,
            pick_dir: req.pick_dir,
            place_id: req.place_id,
            place_dir: req.place_dir,
        };

        // A full queue is expected control flow: refused, caller retries.
        let accepted = self.queue.try_enqueue(job).await;
        if accepted {
            let queued = self.queue.len().await;
            debug!(
                pick_id = job.pick_id,
                place_id = job.place_id,
                queued,
                "Transfer queued"
            );
        } else {
            debug!(
                pick_id = job.pick_id,
                place_id = job.place_id,
                "Transfer refused, queue full"
            );
        }

        Ok(Response::new(TransferReply { accepted }))
    }

    async fn request_service(
        &self,
        request: Request<ServiceRequest>,
    ) -> Result<Response<ServiceReply>, Status> {
        let service_id = request.into_inner().service_id;

        // Bypasses the transfer queue and may interleave with an
        // in-flight dispatch.
        match self.peer.write_service(&self.service_key, service_id).await {
            Ok(()) => {
                info!(service_id, "Service position selected");
                Ok(Response::new(ServiceReply { accepted: true }))
            }
            Err(e) => {
                error!(service_id, error = %e, "Service selection failed");
                Ok(Response::new(ServiceReply { accepted: false }))
            }
        }
    }

    async fn get_cell_status(
        &self,
        _request: Request<CellStatusRequest>,
    ) -> Result<Response<CellStatus>, Status> {
        let robot_busy = *self.busy.borrow();
        let queued = self.queue.len().await as u32;

        Ok(Response::new(CellStatus { robot_busy, queued }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downstream::mock::{MockRobotPeer, PeerOp};

    fn make_service(capacity: usize) -> (GatewayService, Arc<JobQueue>, Arc<MockRobotPeer>) {
        let queue = Arc::new(JobQueue::new(capacity));
        let peer = Arc::new(MockRobotPeer::new());
        let (_busy_tx, busy_rx) = watch::channel(false);
        let service = GatewayService::new(
            queue.clone(),
            peer.clone() as Arc<dyn RobotPeer>,
            "ns=2;s=service".to_string(),
            busy_rx,
        );
        (service, queue, peer)
    }

    fn transfer(pick_id: i32) -> TransferRequest {
        TransferRequest {
            pick_id,
            pick_dir: 1,
            place_id: pick_id + 10,
            place_dir: 2,
        }
    }

    #[tokio::test]
    async fn test_request_transfer_accepts_until_full() {
        let (service, queue, _) = make_service(3);

        for pick_id in 1..=3 {
            let reply = service
                .request_transfer(Request::new(transfer(pick_id)))
                .await
                .unwrap();
            assert!(reply.into_inner().accepted);
        }

        let reply = service
            .request_transfer(Request::new(transfer(4)))
            .await
            .unwrap();
        assert!(!reply.into_inner().accepted);
        assert_eq!(queue.len().await, 3);
    }

    #[tokio::test]
    async fn test_request_service_forwards_immediately() {
        let (service, queue, peer) = make_service(3);

        // Queued work does not delay the service selection
        service
            .request_transfer(Request::new(transfer(1)))
            .await
            .unwrap();

        let reply = service
            .request_service(Request::new(ServiceRequest { service_id: 3 }))
            .await
            .unwrap();
        assert!(reply.into_inner().accepted);
        assert_eq!(
            peer.ops().await,
            vec![PeerOp::WriteService {
                key: "ns=2;s=service".to_string(),
                service_id: 3,
            }]
        );
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn test_request_service_reports_downstream_failure() {
        let (service, _, peer) = make_service(3);
        peer.set_fail_on_write_service(true).await;

        let reply = service
            .request_service(Request::new(ServiceRequest { service_id: 1 }))
            .await
            .unwrap();
        assert!(!reply.into_inner().accepted);
    }

    #[tokio::test]
    async fn test_get_cell_status_reports_queue_occupancy() {
        let (service, _, _) = make_service(3);

        service
            .request_transfer(Request::new(transfer(1)))
            .await
            .unwrap();
        service
            .request_transfer(Request::new(transfer(2)))
            .await
            .unwrap();

        let status = service
            .get_cell_status(Request::new(CellStatusRequest {}))
            .await
            .unwrap()
            .into_inner();
        assert!(!status.robot_busy);
        assert_eq!(status.queued, 2);
    }
}
