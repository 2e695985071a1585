use cpsim_core::v16::types::ChargePointStatus;

use crate::v16::{
    cp::ChargePoint,
    interfaces::{ConfigSource, EngineEvent, Websocket},
};

#[derive(serde::Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub connector_id: usize,
    pub status: ChargePointStatus,
    pub current_transaction_id: Option<i32>,
    pub id_tag: Option<String>,
}

impl Connector {
    pub fn available(connector_id: usize) -> Self {
        Self {
            connector_id,
            status: ChargePointStatus::Available,
            current_transaction_id: None,
            id_tag: None,
        }
    }
}

/// Connectors numbered from 1, all `Available`.
pub(crate) fn fresh_connectors(count: usize) -> Vec<Connector> {
    (1..=count).map(Connector::available).collect()
}

impl<W: Websocket, C: ConfigSource> ChargePoint<W, C> {
    pub fn connectors(&self) -> Vec<Connector> {
        self.inner.state.lock().connectors.clone()
    }

    pub fn connector(&self, connector_id: usize) -> Option<Connector> {
        self.inner
            .state
            .lock()
            .connectors
            .iter()
            .find(|c| c.connector_id == connector_id)
            .cloned()
    }

    /// Replaces the connector set, unless the connection `connection` was
    /// replaced in the meantime.
    pub(crate) fn init_connectors(&self, connection: u64, count: usize) -> bool {
        let connectors = fresh_connectors(count);
        {
            let mut state = self.inner.state.lock();
            if state.connection != connection {
                return false;
            }
            state.connectors = connectors.clone();
        }
        log::info!("initialized {} connector(s)", connectors.len());
        for connector in connectors {
            self.emit(EngineEvent::ConnectorChanged(connector));
        }
        true
    }

    /// Applies `f` to the connector matching `select` and publishes the result.
    pub(crate) fn update_connector(
        &self,
        select: impl Fn(&Connector) -> bool,
        f: impl FnOnce(&mut Connector),
    ) -> Option<Connector> {
        let updated = {
            let mut state = self.inner.state.lock();
            let connector = state.connectors.iter_mut().find(|c| select(c))?;
            f(connector);
            connector.clone()
        };
        log::debug!(
            "connector {} -> {:?} (transaction {:?})",
            updated.connector_id,
            updated.status,
            updated.current_transaction_id
        );
        self.emit(EngineEvent::ConnectorChanged(updated.clone()));
        Some(updated)
    }
}
