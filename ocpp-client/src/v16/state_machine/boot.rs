use cpsim_core::v16::types::RegistrationStatus;

use crate::v16::{
    cp::ChargePoint,
    interfaces::{ConfigSource, EngineEvent, Websocket},
};

use super::call::{CallAction, CallFailure};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BootState {
    Idle,
    WaitingForResponse,
    Accepted,
    Failed,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BootError {
    #[error("not connected")]
    NotConnected,
    #[error("boot sequence already ran on this connection")]
    AlreadyRan,
    #[error(transparent)]
    Call(#[from] CallFailure),
    #[error("invalid BootNotification response: {0}")]
    InvalidResponse(String),
    #[error("BootNotification not accepted: {0:?}")]
    NotAccepted(RegistrationStatus),
}

/// The parts of a BootNotification confirmation the sequence acts on.
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct BootReply {
    status: RegistrationStatus,
    #[serde(default)]
    interval: Option<u64>,
}

impl<W: Websocket, C: ConfigSource> ChargePoint<W, C> {
    /// Runs the boot handshake once for the current connection.
    pub async fn boot(&self) -> Result<RegistrationStatus, BootError> {
        let connection = {
            let mut state = self.inner.state.lock();
            if !state.ws_connected {
                return Err(BootError::NotConnected);
            }
            if state.boot_state != BootState::Idle {
                return Err(BootError::AlreadyRan);
            }
            state.boot_state = BootState::WaitingForResponse;
            state.connection
        };

        let res = self.boot_sequence(connection).await;

        let current = {
            let mut state = self.inner.state.lock();
            let current = state.connection == connection;
            if current {
                state.boot_state = match res {
                    Ok(_) => BootState::Accepted,
                    Err(_) => BootState::Failed,
                };
            }
            current
        };
        if !current {
            log::info!("connection replaced during boot, outcome not applied");
            return res;
        }
        match &res {
            Ok(status) => {
                log::info!("boot accepted");
                self.emit(EngineEvent::Booted(*status));
            }
            Err(e) => {
                log::warn!("boot failed: {}", e);
                self.emit(EngineEvent::BootFailed(e.to_string()));
            }
        }
        res
    }

    async fn boot_sequence(&self, connection: u64) -> Result<RegistrationStatus, BootError> {
        let payload = self
            .call(CallAction::BootNotification, &self.inner.boot_info)
            .await?;
        let reply: BootReply = serde_json::from_value(payload)
            .map_err(|e| BootError::InvalidResponse(e.to_string()))?;
        if reply.status != RegistrationStatus::Accepted {
            return Err(BootError::NotAccepted(reply.status));
        }
        if let Some(interval) = reply.interval.filter(|i| *i > 0) {
            self.inner
                .configs
                .lock()
                .set("HeartbeatInterval", interval.to_string());
        }

        match self.inner.source.fetch(&self.inner.charge_point_id).await {
            Ok(topology) => {
                if !self.init_connectors(connection, topology.connectors()) {
                    log::warn!("connection replaced during boot, topology discarded");
                }
            }
            Err(e) => {
                log::warn!(
                    "configuration source unavailable, keeping {} known connector(s): {}",
                    self.inner.state.lock().connectors.len(),
                    e
                );
            }
        }
        Ok(reply.status)
    }

    pub(crate) fn on_boot_connected(&self) {
        if !self.inner.auto_boot {
            return;
        }
        let cp = self.clone();
        tokio::spawn(async move {
            // outcome is already logged and published
            let _ = cp.boot().await;
        });
    }

    pub fn is_booted(&self) -> bool {
        let state = self.inner.state.lock();
        state.ws_connected && state.boot_state == BootState::Accepted
    }
}
