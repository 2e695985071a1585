use crate::v16::interfaces::{ChargePointTopology, ConfigSource, ConfigSourceError};

/// Reads `GET {base}/adminApi/config/{chargePointId}`.
pub struct HttpConfigSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpConfigSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn config_url(&self, charge_point_id: &str) -> String {
        format!(
            "{}/adminApi/config/{}",
            self.base_url.trim_end_matches('/'),
            charge_point_id
        )
    }
}

#[async_trait::async_trait]
impl ConfigSource for HttpConfigSource {
    async fn fetch(&self, charge_point_id: &str) -> Result<ChargePointTopology, ConfigSourceError> {
        let url = self.config_url(charge_point_id);
        log::debug!("fetching charge point configuration from {}", url);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ConfigSourceError::Request(e.to_string()))?;
        if !res.status().is_success() {
            return Err(ConfigSourceError::Status(res.status().as_u16()));
        }
        res.json::<ChargePointTopology>()
            .await
            .map_err(|e| ConfigSourceError::Decode(e.to_string()))
    }
}

/// Fixed topology, for running without the admin API.
pub struct StaticConfigSource {
    topology: Option<ChargePointTopology>,
}

impl StaticConfigSource {
    pub fn new(connector_count: usize) -> Self {
        Self {
            topology: Some(ChargePointTopology::with_connectors(connector_count)),
        }
    }

    /// A source that always fails, leaving the configured connectors in place.
    pub fn unavailable() -> Self {
        Self { topology: None }
    }
}

#[async_trait::async_trait]
impl ConfigSource for StaticConfigSource {
    async fn fetch(&self, _charge_point_id: &str) -> Result<ChargePointTopology, ConfigSourceError> {
        self.topology
            .clone()
            .ok_or_else(|| ConfigSourceError::Request("no configuration source".into()))
    }
}
