use cpsim_core::v16::types::{ConfigurationStatus, KeyValue};

use crate::v16::{
    cp::ChargePoint,
    interfaces::{ConfigSource, Websocket},
};

pub(crate) struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub readonly: bool,
    pub reboot_required: bool,
    pub validator: Option<fn(&str) -> bool>,
}

impl ConfigEntry {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            readonly: false,
            reboot_required: false,
            validator: None,
        }
    }
    pub fn read_only(mut self) -> Self {
        self.readonly = true;
        self
    }
    pub fn with_validator(mut self, validator: fn(&str) -> bool) -> Self {
        self.validator = Some(validator);
        self
    }
    pub fn reboot_required(mut self) -> Self {
        self.reboot_required = true;
        self
    }
    fn key_value(&self) -> KeyValue {
        KeyValue::new(self.key.as_str(), self.readonly, self.value.as_str())
    }
}

fn integer_between(value: &str, min: i64, max: i64) -> bool {
    value
        .trim()
        .parse::<i64>()
        .map(|v| (min..=max).contains(&v))
        .unwrap_or(false)
}

fn heartbeat_interval(value: &str) -> bool {
    integer_between(value, 10, 3600)
}

fn meter_value_sample_interval(value: &str) -> bool {
    integer_between(value, 1, 3600)
}

/// Fixed set of configuration keys. Only values change after start.
pub(crate) struct ConfigStore {
    entries: Vec<ConfigEntry>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            entries: vec![
                ConfigEntry::new("AuthorizeRemoteTxRequests", "true"),
                ConfigEntry::new("HeartbeatInterval", "60").with_validator(heartbeat_interval),
                ConfigEntry::new("LocalPreAuthorize", "false").read_only(),
                ConfigEntry::new("GetConfigurationMaxKeys", "10").read_only(),
                ConfigEntry::new("MeterValueSampleInterval", "60")
                    .with_validator(meter_value_sample_interval)
                    .reboot_required(),
            ],
        }
    }

    fn entry(&self, key: &str) -> Option<&ConfigEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.entry(key).map(|e| e.value.as_str())
    }

    pub fn all(&self) -> Vec<KeyValue> {
        self.entries.iter().map(ConfigEntry::key_value).collect()
    }

    /// Splits requested names into known entries and unknown names.
    pub fn lookup(&self, keys: Vec<String>) -> (Vec<KeyValue>, Vec<String>) {
        let mut known = Vec::new();
        let mut unknown = Vec::new();
        for key in keys {
            match self.entry(&key) {
                Some(entry) => known.push(entry.key_value()),
                None => unknown.push(key),
            }
        }
        (known, unknown)
    }

    pub fn max_keys(&self) -> usize {
        self.value("GetConfigurationMaxKeys")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(usize::MAX)
    }

    pub fn change(&mut self, key: &str, value: String) -> ConfigurationStatus {
        let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) else {
            return ConfigurationStatus::NotSupported;
        };
        if entry.readonly {
            return ConfigurationStatus::Rejected;
        }
        match entry.validator {
            Some(validator) if validator(&value) => {}
            _ => return ConfigurationStatus::Rejected,
        }
        entry.value = value;
        if entry.reboot_required {
            ConfigurationStatus::RebootRequired
        } else {
            ConfigurationStatus::Accepted
        }
    }

    /// Writes a value without validation, for values the charge point learns itself.
    pub fn set(&mut self, key: &str, value: String) -> bool {
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => {
                entry.value = value;
                true
            }
            None => false,
        }
    }
}

impl<W: Websocket, C: ConfigSource> ChargePoint<W, C> {
    pub fn configuration(&self) -> Vec<KeyValue> {
        self.inner.configs.lock().all()
    }

    pub fn configuration_value(&self, key: &str) -> Option<String> {
        self.inner.configs.lock().value(key).map(str::to_string)
    }
}
