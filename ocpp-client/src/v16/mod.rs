mod cp;
mod drivers;
mod events;
mod interfaces;
mod scenarios;
mod state_machine;

pub use cp::{
    config::{ChargePointConfig, ConfigFileError},
    core::ChargePoint,
};
pub use drivers::{
    config_source::{HttpConfigSource, StaticConfigSource},
    websocket::TokioWsClient,
};
pub use interfaces::*;
pub use scenarios::ScenarioCatalog;
pub use state_machine::{
    boot::BootError,
    call::{CallAction, CallFailure, UnknownAction},
    connector::Connector,
    registry::CallHandle,
    scenario::{
        Scenario, ScenarioFailure, ScenarioOutcome, ScenarioRunContext, ScenarioRunner, Step,
    },
};
