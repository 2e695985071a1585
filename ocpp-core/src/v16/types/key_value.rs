/// One configuration entry as reported by GetConfiguration.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, readonly: bool, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            readonly,
            value: Some(value.into()),
        }
    }
}
