use std::{sync::Arc, time::Duration};

use cpsim_core::v16::messages::{
    boot_notification::BootNotificationRequest, status_notification::StatusNotificationRequest,
};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::v16::{
    interfaces::{ConfigSource, EngineEvent, Websocket, WsEvent},
    state_machine::{
        boot::BootState,
        call::CallFailure,
        clock,
        config::ConfigStore,
        connector::{fresh_connectors, Connector},
        registry::CallRegistry,
        rng::IdGenerator,
    },
};

use super::config::ChargePointConfig;

pub(crate) struct CpState {
    pub(crate) ws_connected: bool,
    /// Set once `run` has returned. No call can be registered afterwards.
    pub(crate) stopped: bool,
    /// Bumped whenever the websocket connects or drops.
    pub(crate) connection: u64,
    pub(crate) boot_state: BootState,
    pub(crate) connectors: Vec<Connector>,
    pub(crate) pending_status_notifications: Vec<StatusNotificationRequest>,
}

pub(crate) struct Shared<W, C> {
    pub(crate) ws: W,
    pub(crate) source: C,
    pub(crate) charge_point_id: String,
    pub(crate) boot_info: BootNotificationRequest,
    pub(crate) call_timeout: Duration,
    pub(crate) auto_boot: bool,
    pub(crate) state: Mutex<CpState>,
    pub(crate) registry: Mutex<CallRegistry>,
    pub(crate) registry_changed: Notify,
    pub(crate) configs: Mutex<ConfigStore>,
    pub(crate) observers: Mutex<Vec<flume::Sender<EngineEvent>>>,
}

/// One emulated charge point. Cloning yields another handle to the same engine.
pub struct ChargePoint<W: Websocket, C: ConfigSource> {
    pub(crate) inner: Arc<Shared<W, C>>,
}

impl<W: Websocket, C: ConfigSource> Clone for ChargePoint<W, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<W: Websocket, C: ConfigSource> ChargePoint<W, C> {
    pub fn new(ws: W, source: C, configs: ChargePointConfig) -> Self {
        let mut boot_info = configs.boot_info;
        if boot_info.charge_box_serial_number.is_none() {
            boot_info.charge_box_serial_number = Some(configs.charge_point_id.clone());
        }
        Self {
            inner: Arc::new(Shared {
                ws,
                source,
                charge_point_id: configs.charge_point_id,
                boot_info,
                call_timeout: Duration::from_secs(configs.call_timeout),
                auto_boot: configs.auto_boot,
                state: Mutex::new(CpState {
                    ws_connected: false,
                    stopped: false,
                    connection: 0,
                    boot_state: BootState::Idle,
                    connectors: fresh_connectors(configs.default_connectors),
                    pending_status_notifications: Vec::new(),
                }),
                registry: Mutex::new(CallRegistry::new(IdGenerator::new(configs.seed))),
                registry_changed: Notify::new(),
                configs: Mutex::new(ConfigStore::new()),
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn charge_point_id(&self) -> &str {
        &self.inner.charge_point_id
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state.lock().ws_connected
    }

    pub fn pending_calls(&self) -> usize {
        self.inner.registry.lock().len()
    }

    pub fn subscribe(&self) -> flume::Receiver<EngineEvent> {
        let (tx, rx) = flume::unbounded();
        self.inner.observers.lock().push(tx);
        rx
    }

    pub(crate) fn emit(&self, event: EngineEvent) {
        self.inner
            .observers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Drives the engine until `stop` fires or the event channel closes. Calls
    /// still pending at that point, and any call made later, complete with
    /// `Cancelled`.
    pub async fn run(&self, events: flume::Receiver<WsEvent>, stop: CancellationToken) {
        loop {
            let deadline = self.inner.registry.lock().next_deadline();
            tokio::select! {
                biased;
                _ = stop.cancelled() => {
                    log::info!("charge point {} stopping", self.inner.charge_point_id);
                    break;
                }
                _ = clock::sleep_until(deadline) => {
                    self.handle_timeout(clock::now());
                }
                ev = events.recv_async() => match ev {
                    Ok(ev) => self.handle_ws_event(ev),
                    Err(_) => {
                        log::info!("websocket event channel closed");
                        break;
                    }
                },
                _ = self.inner.registry_changed.notified() => {}
            }
        }
        let cancelled = {
            let mut state = self.inner.state.lock();
            state.stopped = true;
            state.ws_connected = false;
            state.boot_state = BootState::Idle;
            state.pending_status_notifications.clear();
            self.inner
                .registry
                .lock()
                .fail_all(|action| CallFailure::Cancelled { action })
        };
        if cancelled > 0 {
            log::warn!("cancelled {} pending call(s)", cancelled);
        }
    }
}
