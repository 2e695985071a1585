use flume::{unbounded, Receiver, Sender};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        http::{header::SEC_WEBSOCKET_PROTOCOL, HeaderValue},
        Message,
    },
};
use tokio_util::sync::CancellationToken;

use crate::v16::interfaces::{TransportError, Websocket, WsEvent};

/// tokio-tungstenite connection negotiating the `ocpp1.6` subprotocol.
/// Does not reconnect; a dropped connection is reported once as
/// [`WsEvent::Disconnected`].
pub struct TokioWsClient {
    msg_tx: Sender<Option<String>>,
    // keeps the event channel open after the socket task ends
    _ev_tx: Sender<WsEvent>,
}

impl TokioWsClient {
    pub fn connect(url: String) -> (Self, Receiver<WsEvent>) {
        let (ev_tx, ev_rx) = unbounded();
        let (msg_tx, msg_rx) = unbounded();
        tokio::spawn(ws_task(url, ev_tx.clone(), msg_rx));
        (
            Self {
                msg_tx,
                _ev_tx: ev_tx,
            },
            ev_rx,
        )
    }

    pub fn close(&self) {
        let _ = self.msg_tx.send(None);
    }
}

impl Websocket for TokioWsClient {
    fn ws_send(&self, msg: String) -> Result<(), TransportError> {
        self.msg_tx
            .send(Some(msg))
            .map_err(|_| TransportError::Closed)
    }
}

async fn ws_task(url: String, ev_tx: Sender<WsEvent>, msg_rx: Receiver<Option<String>>) {
    log::debug!("connecting to url: {}", url);
    let mut req = match url.as_str().into_client_request() {
        Ok(req) => req,
        Err(e) => {
            log::error!("invalid websocket url {}: {}", url, e);
            let _ = ev_tx.send_async(WsEvent::Disconnected).await;
            return;
        }
    };
    req.headers_mut()
        .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static("ocpp1.6"));

    let stream = match connect_async(req).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            log::error!("ws error: {:?}", e);
            let _ = ev_tx.send_async(WsEvent::Disconnected).await;
            return;
        }
    };
    let _ = ev_tx.send_async(WsEvent::Connected).await;

    let (mut ws_tx, mut ws_rx) = stream.split();
    let token = CancellationToken::new();
    let stop_token = token.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop_token.cancelled() => {
                    break;
                }
                msg = msg_rx.recv_async() => {
                    let msg = match msg {
                        Ok(Some(t)) => Message::Text(t.into()),
                        Ok(None) | Err(_) => Message::Close(None),
                    };
                    let closing = matches!(msg, Message::Close(_));
                    if ws_tx.send(msg).await.is_err() || closing {
                        break;
                    }
                }
            }
        }
    });

    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(t)) => {
                let _ = ev_tx.send_async(WsEvent::Msg(t.as_str().to_string())).await;
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(_) | Err(_) => break,
        }
    }
    token.cancel();
    let _ = ev_tx.send_async(WsEvent::Disconnected).await;
}
