//! gRPC implementation of the robot peer.
//!
//! Talks to the robot controller's variable-access service: scalar reads
//! and writes keyed by namespace-qualified strings. Every call carries a
//! bounded deadline; an expired deadline surfaces as
//! `DownstreamError::Unresponsive` instead of suspending the caller
//! indefinitely.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tonic::transport::Channel;

use super::{DownstreamError, Result, RobotPeer};
use crate::config::RobotKeys;
use crate::proto::robot_variables_client::RobotVariablesClient;
use crate::proto::{variable_value, VariableKey, VariableValue, WriteVariableRequest};

/// Robot peer backed by the `RobotVariables` gRPC service.
pub struct GrpcRobotPeer {
    client: RobotVariablesClient<Channel>,
    keys: RobotKeys,
    call_timeout: Duration,
}

impl GrpcRobotPeer {
    /// Create a peer over an established channel.
    pub fn new(channel: Channel, keys: RobotKeys, call_timeout: Duration) -> Self {
        Self {
            client: RobotVariablesClient::new(channel),
            keys,
            call_timeout,
        }
    }

    async fn read_value(&self, key: &str) -> Result<variable_value::Value> {
        let mut client = self.client.clone();
        let request = VariableKey {
            key: key.to_owned(),
        };
        let response = timeout(self.call_timeout, client.read_variable(request))
            .await
            .map_err(|_| DownstreamError::Unresponsive {
                key: key.to_owned(),
                timeout: self.call_timeout,
            })??;

        response
            .into_inner()
            .value
            .ok_or_else(|| DownstreamError::Empty {
                key: key.to_owned(),
            })
    }

    async fn write_value(&self, key: &str, value: variable_value::Value) -> Result<()> {
        let mut client = self.client.clone();
        let request = WriteVariableRequest {
            key: key.to_owned(),
            value: Some(VariableValue { value: Some(value) }),
        };
        timeout(self.call_timeout, client.write_variable(request))
            .await
            .map_err(|_| DownstreamError::Unresponsive {
                key: key.to_owned(),
                timeout: self.call_timeout,
            })??;
        Ok(())
    }

    async fn read_number(&self, key: &str) -> Result<i32> {
        match self.read_value(key).await? {
            variable_value::Value::Number(n) => Ok(n),
            _ => Err(DownstreamError::TypeMismatch {
                key: key.to_owned(),
                expected: "number",
            }),
        }
    }
}

#[async_trait]
impl RobotPeer for GrpcRobotPeer {
    async fn read_busy(&self) -> Result<bool> {
        match self.read_value(&self.keys.is_busy).await? {
            variable_value::Value::Flag(flag) => Ok(flag),
            _ => Err(DownstreamError::TypeMismatch {
                key: self.keys.is_busy.clone(),
                expected: "flag",
            }),
        }
    }

    async fn write_position(&self, id_key: &str, dir_key: &str, id: i32, dir: i32) -> Result<()> {
        self.write_value(id_key, variable_value::Value::Number(id))
            .await?;
        self.write_value(dir_key, variable_value::Value::Number(dir))
            .await?;
        Ok(())
    }

    async fn read_position(&self, id_key: &str, dir_key: &str) -> Result<(i32, i32)> {
        let id = self.read_number(id_key).await?;
        let dir = self.read_number(dir_key).await?;
        Ok((id, dir))
    }

    async fn write_start(&self, run: bool) -> Result<()> {
        self.write_value(&self.keys.start, variable_value::Value::Flag(run))
            .await
    }

    async fn write_service(&self, key: &str, service_id: i32) -> Result<()> {
        self.write_value(key, variable_value::Value::Number(service_id))
            .await
    }
}
