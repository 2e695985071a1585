use std::path::Path;

use chrono::Utc;
use cpsim_core::v16::{
    messages::{
        authorize::AuthorizeRequest, heart_beat::HeartbeatRequest, meter_values::MeterValuesRequest,
        start_transaction::StartTransactionRequest,
        status_notification::StatusNotificationRequest,
    },
    types::{ChargePointStatus, MeterValue, SampledValue},
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::v16::{
    cp::config::ConfigFileError,
    state_machine::{
        call::CallAction,
        scenario::{Scenario, Step},
    },
};

const ID_TAG: &str = "TEST1234";

fn payload<T: Serialize>(req: T) -> Value {
    serde_json::to_value(req).unwrap_or_default()
}

fn connector_available() -> Step {
    Step::new(
        CallAction::StatusNotification,
        payload(StatusNotificationRequest::new(1, ChargePointStatus::Available)),
        "Set Connector 1 Available",
    )
}

fn heartbeat() -> Step {
    Step::new(
        CallAction::Heartbeat,
        payload(HeartbeatRequest {}),
        "Sending manual Heartbeat to check for immediate CSMS acknowledgment.",
    )
}

fn start_transaction() -> Step {
    Step::new(
        CallAction::StartTransaction,
        payload(StartTransactionRequest {
            connector_id: 1,
            id_tag: ID_TAG.into(),
            meter_start: 100,
            reservation_id: None,
            timestamp: Utc::now(),
        }),
        "Start Transaction",
    )
}

fn meter_values() -> Step {
    Step::new(
        CallAction::MeterValues,
        payload(MeterValuesRequest {
            connector_id: 1,
            transaction_id: None,
            meter_value: vec![MeterValue {
                timestamp: Utc::now(),
                sampled_value: vec![SampledValue::energy_wh("125")],
            }],
        }),
        "MeterValues",
    )
}

fn stop_transaction(connector_id: Option<usize>) -> Step {
    let mut payload = json!({
        "meterStop": 200,
        "idTag": ID_TAG,
        "timestamp": Utc::now(),
    });
    if let (Some(id), Value::Object(map)) = (connector_id, &mut payload) {
        map.insert("connectorId".into(), id.into());
    }
    Step::new(CallAction::StopTransaction, payload, "Stop Transaction")
}

/// Named scenarios available to a [`crate::v16::ScenarioRunner`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScenarioCatalog {
    scenarios: Vec<Scenario>,
}

impl ScenarioCatalog {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        let mut catalog = Self::default();
        for scenario in scenarios {
            catalog.insert(scenario);
        }
        catalog
    }

    /// The stock scenarios. Timestamps are taken now.
    pub fn builtin() -> Self {
        Self::new(vec![
            Scenario {
                name: "Scenario 1: Standard Transaction".into(),
                steps: vec![
                    connector_available(),
                    heartbeat(),
                    Step::new(
                        CallAction::Authorize,
                        payload(AuthorizeRequest {
                            id_tag: ID_TAG.into(),
                        }),
                        "Authorize User",
                    ),
                    start_transaction(),
                    meter_values(),
                    stop_transaction(None),
                ],
            },
            Scenario {
                name: "Scenario 2: Remote Transaction".into(),
                steps: vec![
                    Step::new(
                        CallAction::RemoteStartTransaction,
                        json!({"connectorId": 1, "idTag": ID_TAG}),
                        "RemoteStartTransaction",
                    ),
                    start_transaction(),
                    meter_values(),
                    Step::new(
                        CallAction::RemoteStopTransaction,
                        json!({"connectorId": 1, "idTag": ID_TAG}),
                        "RemoteStopTransaction Transaction",
                    ),
                    stop_transaction(Some(1)),
                ],
            },
            Scenario {
                name: "Scenario 3: Configuration".into(),
                steps: vec![
                    connector_available(),
                    heartbeat(),
                    Step::new(
                        CallAction::GetConfiguration,
                        json!({"key": "HeartbeatInterval"}),
                        "GetConfiguration.",
                    ),
                    Step::new(
                        CallAction::ChangeConfiguration,
                        json!({"key": "HeartbeatInterval", "value": "10"}),
                        "ChangeConfiguration.",
                    ),
                ],
            },
        ])
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|source| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Adds a scenario, replacing one with the same name.
    pub fn insert(&mut self, scenario: Scenario) {
        match self.scenarios.iter_mut().find(|s| s.name == scenario.name) {
            Some(existing) => *existing = scenario,
            None => self.scenarios.push(scenario),
        }
    }

    pub fn merge(&mut self, other: ScenarioCatalog) {
        for scenario in other.scenarios {
            self.insert(scenario);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scenarios.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
