use cpsim_core::v16::types::RegistrationStatus;

use crate::v16::state_machine::{call::CallAction, connector::Connector, scenario::ScenarioOutcome};

/// State transitions published to subscribers of [`crate::v16::ChargePoint::subscribe`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Connected,
    Disconnected,
    MessageIn(String),
    MessageOut(String),
    Dropped { raw: String, reason: String },
    ConnectorChanged(Connector),
    Booted(RegistrationStatus),
    BootFailed(String),
    ScenarioStarted(String),
    ScenarioStep {
        scenario: String,
        index: usize,
        action: CallAction,
        description: String,
    },
    ScenarioFinished(ScenarioOutcome),
}
