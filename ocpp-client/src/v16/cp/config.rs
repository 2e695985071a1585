use std::path::{Path, PathBuf};

use cpsim_core::v16::messages::boot_notification::BootNotificationRequest;

#[derive(thiserror::Error, Debug)]
pub enum ConfigFileError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

fn default_call_timeout() -> u64 {
    15
}

fn default_connectors() -> usize {
    1
}

fn default_auto_boot() -> bool {
    true
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct ChargePointConfig {
    pub base_url: String,
    pub charge_point_id: String,
    /// Seconds to wait for a CSMS confirmation.
    #[serde(default = "default_call_timeout")]
    pub call_timeout: u64,
    #[serde(default)]
    pub boot_info: BootNotificationRequest,
    /// Connectors assumed before the configuration source answers.
    #[serde(default = "default_connectors")]
    pub default_connectors: usize,
    #[serde(default = "default_auto_boot")]
    pub auto_boot: bool,
    #[serde(default)]
    pub config_source_url: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ChargePointConfig {
    pub fn new(base_url: impl Into<String>, charge_point_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            charge_point_id: charge_point_id.into(),
            call_timeout: default_call_timeout(),
            boot_info: BootNotificationRequest::default(),
            default_connectors: default_connectors(),
            auto_boot: default_auto_boot(),
            config_source_url: None,
            seed: None,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `<base_url>/<charge_point_id>`
    pub fn ws_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.charge_point_id
        )
    }

    /// HTTP base of the configuration side channel.
    pub fn config_source_base(&self) -> String {
        match &self.config_source_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => http_base(&self.base_url),
        }
    }
}

fn http_base(ws_base: &str) -> String {
    let base = ws_base.trim_end_matches('/');
    if let Some(rest) = base.strip_prefix("wss://") {
        format!("https://{}", rest)
    } else if let Some(rest) = base.strip_prefix("ws://") {
        format!("http://{}", rest)
    } else {
        base.to_string()
    }
}
