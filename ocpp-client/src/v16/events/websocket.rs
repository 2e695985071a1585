use cpsim_core::{
    format::{
        frame::{Call, CallError, CallResult},
        message::{EncodeDecode, Envelope},
    },
    v16::protocol_error::ProtocolError,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::v16::{
    cp::ChargePoint,
    interfaces::{ConfigSource, EngineEvent, Websocket, WsEvent},
    state_machine::{
        boot::BootState,
        call::{CallAction, CallFailure},
    },
};

impl<W: Websocket, C: ConfigSource> ChargePoint<W, C> {
    pub(crate) fn handle_ws_event(&self, ev: WsEvent) {
        match ev {
            WsEvent::Connected => self.ws_connected_helper(),
            WsEvent::Disconnected => self.ws_disconnected_helper(),
            WsEvent::Msg(msg) => self.got_ws_msg_helper(msg),
        }
    }

    fn ws_connected_helper(&self) {
        {
            let mut state = self.inner.state.lock();
            state.ws_connected = true;
            state.connection += 1;
            state.boot_state = BootState::Idle;
        }
        log::info!("connected as {}", self.inner.charge_point_id);
        self.emit(EngineEvent::Connected);
        self.on_boot_connected();
    }

    fn ws_disconnected_helper(&self) {
        {
            let mut state = self.inner.state.lock();
            state.ws_connected = false;
            state.connection += 1;
            state.boot_state = BootState::Idle;
            state.pending_status_notifications.clear();
        }
        let failed = self
            .inner
            .registry
            .lock()
            .fail_all(|action| CallFailure::Offline { action });
        log::info!("disconnected, {} pending call(s) failed", failed);
        self.emit(EngineEvent::Disconnected);
    }

    fn got_ws_msg_helper(&self, msg: String) {
        log::info!("[MSG_IN] {}", msg);
        self.emit(EngineEvent::MessageIn(msg.clone()));

        match Envelope::decode(&msg) {
            Ok(Envelope::Call(call)) => {
                let reply = self.dispatch(call);
                if let Err(e) = self.send_ws_msg(reply.encode()) {
                    log::error!("could not reply to {}: {}", reply.unique_id(), e);
                }
                self.send_status_notifications();
            }
            Ok(Envelope::CallResult(res)) => {
                if self
                    .inner
                    .registry
                    .lock()
                    .resolve(&res.unique_id, res.payload)
                    .is_none()
                {
                    log::warn!("unmatched CallResult {}", res.unique_id);
                }
            }
            Ok(Envelope::CallError(err)) => {
                let CallError {
                    unique_id,
                    error_code,
                    error_description,
                    ..
                } = err;
                let matched = self.inner.registry.lock().reject(&unique_id, |action| {
                    CallFailure::CallError {
                        action,
                        code: error_code,
                        description: error_description,
                    }
                });
                if matched.is_none() {
                    log::warn!("unmatched CallError {}", unique_id);
                }
            }
            Err(e) => {
                log::warn!("dropping frame: {}", e);
                self.emit(EngineEvent::Dropped {
                    raw: msg,
                    reason: e.reason,
                });
            }
        }
    }

    /// Routes a CSMS call to its handler. Always yields exactly one reply.
    fn dispatch(&self, call: Call) -> Envelope {
        match call.action.parse::<CallAction>() {
            Ok(CallAction::RemoteStartTransaction) => {
                self.handle_call(call, Self::remote_start_transaction_ocpp)
            }
            Ok(CallAction::RemoteStopTransaction) => {
                self.handle_call(call, Self::remote_stop_transaction_ocpp)
            }
            Ok(CallAction::GetConfiguration) => self.handle_call(call, Self::get_configuration_ocpp),
            Ok(CallAction::ChangeConfiguration) => {
                self.handle_call(call, Self::change_configuration_ocpp)
            }
            Ok(
                CallAction::BootNotification
                | CallAction::StatusNotification
                | CallAction::Heartbeat
                | CallAction::Authorize
                | CallAction::StartTransaction
                | CallAction::StopTransaction
                | CallAction::MeterValues,
            )
            | Err(_) => Envelope::CallError(
                CallError::new(call.unique_id, ProtocolError::NotImplemented).with_description(
                    format!("Action '{}' is not supported by the simulator.", call.action),
                ),
            ),
        }
    }

    fn handle_call<T: DeserializeOwned, R: Serialize>(
        &self,
        call: Call,
        handler: impl FnOnce(&Self, T) -> Result<R, ProtocolError>,
    ) -> Envelope {
        let unique_id = call.unique_id;
        let req = match serde_json::from_value::<T>(call.payload) {
            Ok(req) => req,
            Err(e) => {
                return Envelope::CallError(
                    CallError::new(unique_id, ProtocolError::FormationViolation)
                        .with_description(e.to_string()),
                );
            }
        };
        match handler(self, req).map(|res| CallResult::new(unique_id.clone(), res)) {
            Ok(Ok(res)) => Envelope::CallResult(res),
            Ok(Err(e)) => {
                log::error!("cannot encode reply to {}: {}", call.action, e);
                Envelope::CallError(CallError::new(unique_id, ProtocolError::InternalError))
            }
            Err(code) => Envelope::CallError(CallError::new(unique_id, code)),
        }
    }

    /// Sends status notifications queued by command handlers, without
    /// waiting for their confirmations.
    fn send_status_notifications(&self) {
        let queued = std::mem::take(&mut self.inner.state.lock().pending_status_notifications);
        for notification in queued {
            let cp = self.clone();
            tokio::spawn(async move {
                if let Err(e) = cp.call(CallAction::StatusNotification, notification).await {
                    log::warn!("StatusNotification not confirmed: {}", e);
                }
            });
        }
    }
}
