//! End-to-end transfer flow: gateway service, job queue, coordinator, and
//! a mock robot peer wired together the way the binary wires them.

use std::sync::Arc;
use std::time::Duration;

use tonic::Request;

use cellgate::config::RobotKeys;
use cellgate::coordinator::TransferCoordinator;
use cellgate::downstream::mock::{MockRobotPeer, PeerOp};
use cellgate::downstream::RobotPeer;
use cellgate::proto::transfer_gateway_server::TransferGateway;
use cellgate::proto::{CellStatusRequest, ServiceRequest, TransferRequest};
use cellgate::queue::JobQueue;
use cellgate::services::GatewayService;

struct Harness {
    gateway: GatewayService,
    coordinator: Arc<TransferCoordinator>,
    queue: Arc<JobQueue>,
    peer: Arc<MockRobotPeer>,
    keys: RobotKeys,
}

fn harness(capacity: usize) -> Harness {
    let keys = RobotKeys::default();
    let queue = Arc::new(JobQueue::new(capacity));
    let peer = Arc::new(MockRobotPeer::new());
    let coordinator = Arc::new(TransferCoordinator::new(
        queue.clone(),
        peer.clone() as Arc<dyn RobotPeer>,
        keys.clone(),
        Duration::from_millis(500),
    ));
    let gateway = GatewayService::new(
        queue.clone(),
        peer.clone() as Arc<dyn RobotPeer>,
        keys.service.clone(),
        coordinator.busy_flag(),
    );
    Harness {
        gateway,
        coordinator,
        queue,
        peer,
        keys,
    }
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
async fn test_accepted_transfers_dispatch_in_arrival_order() {
    let h = harness(3);

    for pick_id in 1..=3 {
        let reply = h
            .gateway
            .request_transfer(Request::new(transfer(pick_id)))
            .await
            .unwrap();
        assert!(reply.into_inner().accepted);
    }
    let reply = h
        .gateway
        .request_transfer(Request::new(transfer(4)))
        .await
        .unwrap();
    assert!(!reply.into_inner().accepted);

    let status = h
        .gateway
        .get_cell_status(Request::new(CellStatusRequest {}))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(status.queued, 3);

    h.coordinator.cycle().await;
    h.coordinator.cycle().await;
    h.coordinator.cycle().await;

    let dispatched: Vec<i32> = h
        .peer
        .ops()
        .await
        .into_iter()
        .filter_map(|op| match op {
            PeerOp::WritePosition { id_key, id, .. } if id_key == h.keys.pick_id => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(dispatched, vec![1, 2, 3]);
    assert!(h.queue.is_empty().await);
}

#[tokio::test]
async fn test_busy_robot_defers_dispatch_until_idle() {
    let h = harness(3);

    h.gateway
        .request_transfer(Request::new(transfer(1)))
        .await
        .unwrap();

    h.peer.set_busy(true).await;
    h.coordinator.cycle().await;
    assert!(h.peer.ops().await.is_empty());
    assert_eq!(h.queue.len().await, 1);

    let status = h
        .gateway
        .get_cell_status(Request::new(CellStatusRequest {}))
        .await
        .unwrap()
        .into_inner();
    assert!(status.robot_busy);
    assert_eq!(status.queued, 1);

    h.peer.set_busy(false).await;
    h.coordinator.cycle().await;
    assert!(h.queue.is_empty().await);
    assert_eq!(h.peer.ops().await.len(), 5);
}

#[tokio::test]
async fn test_service_selection_bypasses_queued_transfers() {
    let h = harness(3);

    h.gateway
        .request_transfer(Request::new(transfer(1)))
        .await
        .unwrap();
    h.gateway
        .request_transfer(Request::new(transfer(2)))
        .await
        .unwrap();

    // The selector write goes out immediately, ahead of every queued job
    let reply = h
        .gateway
        .request_service(Request::new(ServiceRequest { service_id: 5 }))
        .await
        .unwrap();
    assert!(reply.into_inner().accepted);

    let ops = h.peer.ops().await;
    assert_eq!(
        ops,
        vec![PeerOp::WriteService {
            key: h.keys.service.clone(),
            service_id: 5,
        }]
    );
    assert_eq!(h.queue.len().await, 2);
}
