use super::super::types::KeyValue;

/// The `key` field as CSMS implementations send it in practice.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum ConfigurationKeys {
    One(String),
    Many(Vec<String>),
    Nested { key: String },
}

impl ConfigurationKeys {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            ConfigurationKeys::One(key) | ConfigurationKeys::Nested { key } => vec![key],
            ConfigurationKeys::Many(keys) => keys,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GetConfigurationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<ConfigurationKeys>,
}

impl GetConfigurationRequest {
    /// Requested key names; empty means every key.
    pub fn keys(self) -> Vec<String> {
        self.key.map(ConfigurationKeys::into_vec).unwrap_or_default()
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GetConfigurationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_key: Option<Vec<KeyValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_key: Option<Vec<String>>,
}
