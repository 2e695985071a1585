// websocket

#[derive(Debug, Clone, PartialEq)]
pub enum WsEvent {
    Connected,
    Disconnected,
    Msg(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("websocket closed")]
    Closed,
}

/// Outbound half of the CSMS connection. Inbound traffic and connectivity
/// changes reach the engine as [`WsEvent`]s.
pub trait Websocket: Send + Sync + 'static {
    fn ws_send(&self, msg: String) -> Result<(), TransportError>;
}

impl<T: Websocket> Websocket for std::sync::Arc<T> {
    fn ws_send(&self, msg: String) -> Result<(), TransportError> {
        (**self).ws_send(msg)
    }
}

// configuration source

#[derive(serde::Deserialize, serde::Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChargePointTopology {
    #[serde(default)]
    pub connector_count: Option<usize>,
}

impl ChargePointTopology {
    pub fn with_connectors(count: usize) -> Self {
        Self {
            connector_count: Some(count),
        }
    }

    /// A missing or zero count means a single connector.
    pub fn connectors(&self) -> usize {
        self.connector_count.filter(|n| *n > 0).unwrap_or(1)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigSourceError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("invalid body: {0}")]
    Decode(String),
}

/// Side channel queried during boot for the charge point's topology.
#[async_trait::async_trait]
pub trait ConfigSource: Send + Sync + 'static {
    async fn fetch(&self, charge_point_id: &str) -> Result<ChargePointTopology, ConfigSourceError>;
}
