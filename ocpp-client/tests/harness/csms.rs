use std::{sync::Mutex, time::Duration};

use cpsim_client::v16::WsEvent;
use cpsim_core::{
    format::{
        frame::{Call, CallError, CallResult},
        message::{EncodeDecode, Envelope},
    },
    v16::protocol_error::ProtocolError,
};
use flume::{Receiver, Sender};
use serde_json::Value;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Scripted central system on the far side of a [`super::ws::MockWs`].
pub struct MockCsms {
    events_tx: Sender<WsEvent>,
    out_rx: Receiver<String>,
    last_call_uid_from_cp: Mutex<Option<String>>,
    last_call_uid_to_cp: Mutex<Option<String>>,
}

impl MockCsms {
    pub fn new(events_tx: Sender<WsEvent>, out_rx: Receiver<String>) -> Self {
        Self {
            events_tx,
            out_rx,
            last_call_uid_from_cp: Mutex::new(None),
            last_call_uid_to_cp: Mutex::new(None),
        }
    }

    pub fn connect(&self) {
        self.events_tx.send(WsEvent::Connected).unwrap();
    }

    pub fn disconnect(&self) {
        self.events_tx.send(WsEvent::Disconnected).unwrap();
    }

    pub fn inject(&self, raw: impl Into<String>) {
        self.events_tx.send(WsEvent::Msg(raw.into())).unwrap();
    }

    pub async fn next_frame(&self) -> String {
        tokio::time::timeout(RECV_TIMEOUT, self.out_rx.recv_async())
            .await
            .expect("no frame from charge point")
            .unwrap()
    }

    pub fn no_frame_pending(&self) -> bool {
        self.out_rx.is_empty()
    }

    /// Waits for the next outbound frame, which must be a call to `action`.
    pub async fn expect_call(&self, action: &str) -> Call {
        let raw = self.next_frame().await;
        match Envelope::decode(&raw) {
            Ok(Envelope::Call(call)) => {
                assert_eq!(call.action, action, "unexpected call {}", raw);
                self.last_call_uid_from_cp
                    .lock()
                    .unwrap()
                    .replace(call.unique_id.clone());
                call
            }
            other => panic!("expected {} call, got {:?}", action, other),
        }
    }

    /// Confirms the last call received from the charge point.
    pub fn respond(&self, payload: Value) {
        let unique_id = self.last_call_uid_from_cp.lock().unwrap().take().unwrap();
        let res = CallResult::new(unique_id, payload).unwrap();
        self.inject(Envelope::CallResult(res).encode());
    }

    pub fn respond_to(&self, unique_id: &str, payload: Value) {
        let res = CallResult::new(unique_id.to_string(), payload).unwrap();
        self.inject(Envelope::CallResult(res).encode());
    }

    pub fn respond_error(&self, code: ProtocolError, description: &str) {
        let unique_id = self.last_call_uid_from_cp.lock().unwrap().take().unwrap();
        let err = CallError::new(unique_id, code).with_description(description);
        self.inject(Envelope::CallError(err).encode());
    }

    pub fn send_call(&self, action: &str, payload: Value) -> String {
        let unique_id = uuid::Uuid::new_v4().to_string();
        self.last_call_uid_to_cp
            .lock()
            .unwrap()
            .replace(unique_id.clone());
        self.inject(Envelope::Call(Call::new(unique_id.clone(), action, payload)).encode());
        unique_id
    }

    /// Waits for the reply to the last call sent to the charge point.
    pub async fn expect_reply(&self) -> Result<Value, CallError> {
        let unique_id = self.last_call_uid_to_cp.lock().unwrap().take().unwrap();
        let raw = self.next_frame().await;
        match Envelope::decode(&raw) {
            Ok(Envelope::CallResult(res)) => {
                assert_eq!(res.unique_id, unique_id);
                Ok(res.payload)
            }
            Ok(Envelope::CallError(err)) => {
                assert_eq!(err.unique_id, unique_id);
                Err(err)
            }
            other => panic!("expected reply to {}, got {:?}", unique_id, other),
        }
    }
}
