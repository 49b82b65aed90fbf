//! Mock robot peer for testing.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tonic::Status;

use super::{DownstreamError, Result, RobotPeer};

/// Operation recorded by [`MockRobotPeer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerOp {
    WritePosition {
        id_key: String,
        dir_key: String,
        id: i32,
        dir: i32,
    },
    ReadPosition {
        id_key: String,
        dir_key: String,
    },
    WriteStart {
        run: bool,
    },
    WriteService {
        key: String,
        service_id: i32,
    },
}

/// Mock peer that records operations in memory.
#[derive(Default)]
pub struct MockRobotPeer {
    busy: RwLock<bool>,
    position: RwLock<(i32, i32)>,
    ops: RwLock<Vec<PeerOp>>,
    fail_on_read_busy: RwLock<bool>,
    fail_on_write_position: RwLock<bool>,
    fail_on_write_start: RwLock<bool>,
    fail_on_write_service: RwLock<bool>,
}

fn mock_failure(op: &str) -> DownstreamError {
    DownstreamError::from(Status::unavailable(format!("{op} failed")))
}

impl MockRobotPeer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_busy(&self, busy: bool) {
        *self.busy.write().await = busy;
    }

    pub async fn set_position(&self, id: i32, dir: i32) {
        *self.position.write().await = (id, dir);
    }

    pub async fn set_fail_on_read_busy(&self, fail: bool) {
        *self.fail_on_read_busy.write().await = fail;
    }

    pub async fn set_fail_on_write_position(&self, fail: bool) {
        *self.fail_on_write_position.write().await = fail;
    }

    pub async fn set_fail_on_write_start(&self, fail: bool) {
        *self.fail_on_write_start.write().await = fail;
    }

    pub async fn set_fail_on_write_service(&self, fail: bool) {
        *self.fail_on_write_service.write().await = fail;
    }

    /// Operations recorded so far, in call order.
    pub async fn ops(&self) -> Vec<PeerOp> {
        self.ops.read().await.clone()
    }
}

#[async_trait]
impl RobotPeer for MockRobotPeer {
    async fn read_busy(&self) -> Result<bool> {
        if *self.fail_on_read_busy.read().await {
            return Err(mock_failure("read_busy"));
        }
        Ok(*self.busy.read().await)
    }

    async fn write_position(&self, id_key: &str, dir_key: &str, id: i32, dir: i32) -> Result<()> {
        if *self.fail_on_write_position.read().await {
            return Err(mock_failure("write_position"));
        }
        self.ops.write().await.push(PeerOp::WritePosition {
            id_key: id_key.to_owned(),
            dir_key: dir_key.to_owned(),
            id,
            dir,
        });
        Ok(())
    }

    async fn read_position(&self, id_key: &str, dir_key: &str) -> Result<(i32, i32)> {
        self.ops.write().await.push(PeerOp::ReadPosition {
            id_key: id_key.to_owned(),
            dir_key: dir_key.to_owned(),
        });
        Ok(*self.position.read().await)
    }

    async fn write_start(&self, run: bool) -> Result<()> {
        if *self.fail_on_write_start.read().await {
            return Err(mock_failure("write_start"));
        }
        self.ops.write().await.push(PeerOp::WriteStart { run });
        Ok(())
    }

    async fn write_service(&self, key: &str, service_id: i32) -> Result<()> {
        if *self.fail_on_write_service.read().await {
            return Err(mock_failure("write_service"));
        }
        self.ops.write().await.push(PeerOp::WriteService {
            key: key.to_owned(),
            service_id,
        });
        Ok(())
    }
}
