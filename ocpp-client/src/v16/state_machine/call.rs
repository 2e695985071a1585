use std::time::Duration;

use cpsim_core::{
    format::{frame::Call, message::EncodeDecode},
    v16::protocol_error::ProtocolError,
};
use serde::Serialize;
use serde_json::Value;

use crate::v16::{
    cp::ChargePoint,
    interfaces::{ConfigSource, EngineEvent, TransportError, Websocket},
};

use super::clock;

/// Every action this engine can put on the wire or receive.
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallAction {
    BootNotification,
    StatusNotification,
    Heartbeat,
    Authorize,
    StartTransaction,
    StopTransaction,
    MeterValues,
    RemoteStartTransaction,
    RemoteStopTransaction,
    GetConfiguration,
    ChangeConfiguration,
}

impl CallAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallAction::BootNotification => "BootNotification",
            CallAction::StatusNotification => "StatusNotification",
            CallAction::Heartbeat => "Heartbeat",
            CallAction::Authorize => "Authorize",
            CallAction::StartTransaction => "StartTransaction",
            CallAction::StopTransaction => "StopTransaction",
            CallAction::MeterValues => "MeterValues",
            CallAction::RemoteStartTransaction => "RemoteStartTransaction",
            CallAction::RemoteStopTransaction => "RemoteStopTransaction",
            CallAction::GetConfiguration => "GetConfiguration",
            CallAction::ChangeConfiguration => "ChangeConfiguration",
        }
    }
}

impl std::fmt::Display for CallAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

impl std::str::FromStr for CallAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s {
            "BootNotification" => CallAction::BootNotification,
            "StatusNotification" => CallAction::StatusNotification,
            "Heartbeat" => CallAction::Heartbeat,
            "Authorize" => CallAction::Authorize,
            "StartTransaction" => CallAction::StartTransaction,
            "StopTransaction" => CallAction::StopTransaction,
            "MeterValues" => CallAction::MeterValues,
            "RemoteStartTransaction" => CallAction::RemoteStartTransaction,
            "RemoteStopTransaction" => CallAction::RemoteStopTransaction,
            "GetConfiguration" => CallAction::GetConfiguration,
            "ChangeConfiguration" => CallAction::ChangeConfiguration,
            other => return Err(UnknownAction(other.to_string())),
        };
        Ok(action)
    }
}

/// Why an awaited charge-point-initiated call did not produce a reply payload.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CallFailure {
    #[error("Timeout waiting for {action} confirmation.")]
    Timeout { action: CallAction },
    #[error("{action} answered with {code}: {description}")]
    CallError {
        action: CallAction,
        code: ProtocolError,
        description: String,
    },
    #[error("connection lost while waiting for {action} confirmation")]
    Offline { action: CallAction },
    #[error("{action} cancelled, engine stopped")]
    Cancelled { action: CallAction },
    #[error("cannot send {action}, not connected")]
    NotConnected { action: CallAction },
    #[error("cannot send {action}: {reason}")]
    Transport { action: CallAction, reason: String },
    #[error("invalid {action} payload: {reason}")]
    Payload { action: CallAction, reason: String },
}

impl CallFailure {
    pub fn action(&self) -> CallAction {
        match self {
            CallFailure::Timeout { action }
            | CallFailure::CallError { action, .. }
            | CallFailure::Offline { action }
            | CallFailure::Cancelled { action }
            | CallFailure::NotConnected { action }
            | CallFailure::Transport { action, .. }
            | CallFailure::Payload { action, .. } => *action,
        }
    }
}

impl<W: Websocket, C: ConfigSource> ChargePoint<W, C> {
    /// Sends a call and waits for the CSMS reply or the configured call timeout.
    pub async fn call<T: Serialize>(&self, action: CallAction, payload: T) -> Result<Value, CallFailure> {
        self.call_with_timeout(action, payload, self.inner.call_timeout).await
    }

    pub async fn call_with_timeout<T: Serialize>(
        &self,
        action: CallAction,
        payload: T,
        timeout: Duration,
    ) -> Result<Value, CallFailure> {
        let payload = serde_json::to_value(payload).map_err(|e| CallFailure::Payload {
            action,
            reason: e.to_string(),
        })?;

        // registering under the state lock keeps this ordered against teardown
        let (unique_id, handle) = {
            let state = self.inner.state.lock();
            if state.stopped {
                return Err(CallFailure::Cancelled { action });
            }
            if !state.ws_connected {
                return Err(CallFailure::NotConnected { action });
            }
            self.inner
                .registry
                .lock()
                .register(action, clock::now() + timeout)
        };
        self.inner.registry_changed.notify_one();

        let call = Call::new(unique_id.clone(), action.as_str(), payload);
        if let Err(e) = self.send_ws_msg(call.encode()) {
            self.inner.registry.lock().reject(&unique_id, |action| CallFailure::Transport {
                action,
                reason: e.to_string(),
            });
        }
        handle.await
    }

    pub(crate) fn send_ws_msg(&self, msg: String) -> Result<(), TransportError> {
        log::info!("[MSG_OUT] {}", msg);
        self.emit(EngineEvent::MessageOut(msg.clone()));
        self.inner.ws.ws_send(msg)
    }
}
