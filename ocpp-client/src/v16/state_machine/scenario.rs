use cpsim_core::v16::types::ChargePointStatus;
use serde_json::Value;

use crate::v16::{
    cp::ChargePoint,
    interfaces::{ConfigSource, EngineEvent, Websocket},
    scenarios::ScenarioCatalog,
};

use super::call::{CallAction, CallFailure};

fn empty_payload() -> Value {
    Value::Object(Default::default())
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct Step {
    pub action: CallAction,
    #[serde(default = "empty_payload")]
    pub payload: Value,
    #[serde(default, alias = "log")]
    pub description: String,
}

impl Step {
    pub fn new(action: CallAction, payload: Value, description: impl Into<String>) -> Self {
        Self {
            action,
            payload,
            description: description.into(),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScenarioFailure {
    #[error("Scenario failed: Not connected to CSMS.")]
    NotConnected,
    #[error("Scenario failed: boot has not been accepted on this connection.")]
    NotBooted,
    #[error("Scenario \"{0}\" not found.")]
    UnknownScenario(String),
    #[error("Scenario targets charge point '{requested}' but this engine is '{expected}'.")]
    UnknownChargePoint { expected: String, requested: String },
    #[error("Scenario failed at {action}: {action} REJECTED by CSMS.")]
    Rejected { step: usize, action: CallAction },
    #[error("Scenario failed at {action}: {source}")]
    CallFailed {
        step: usize,
        action: CallAction,
        source: CallFailure,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub scenario: String,
    pub charge_point_id: String,
    pub passed: bool,
    pub steps_completed: usize,
    pub failure: Option<ScenarioFailure>,
}

impl ScenarioOutcome {
    pub fn reason(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}

/// State threaded through one scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioRunContext {
    pub scenario_name: String,
    pub current_transaction_id: Option<i32>,
    pub step_index: usize,
    pub passed: bool,
}

fn rejected(reply: &Value) -> bool {
    reply
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| s.eq_ignore_ascii_case("rejected"))
}

fn connector_id_of(payload: &Value) -> Option<usize> {
    payload
        .get("connectorId")
        .and_then(Value::as_u64)
        .and_then(|id| usize::try_from(id).ok())
}

impl ScenarioRunContext {
    pub fn new(scenario_name: impl Into<String>) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            current_transaction_id: None,
            step_index: 0,
            passed: true,
        }
    }

    /// Copy of the step payload with the tracked transaction id injected.
    pub fn prepare(&self, step: &Step) -> Value {
        let mut payload = step.payload.clone();
        let injects = matches!(
            step.action,
            CallAction::StopTransaction | CallAction::MeterValues | CallAction::RemoteStopTransaction
        );
        if let (true, Some(transaction_id), Value::Object(map)) =
            (injects, self.current_transaction_id, &mut payload)
        {
            log::info!("  -> Injecting Transaction ID: {}", transaction_id);
            map.insert("transactionId".into(), transaction_id.into());
        }
        payload
    }

    /// Applies a non-rejected reply to the run and to connector state.
    fn confirmed<W: Websocket, C: ConfigSource>(
        &mut self,
        cp: &ChargePoint<W, C>,
        action: CallAction,
        payload: &Value,
        reply: &Value,
    ) {
        match action {
            CallAction::StartTransaction => {
                let Some(transaction_id) = reply
                    .get("transactionId")
                    .and_then(Value::as_i64)
                    .and_then(|id| i32::try_from(id).ok())
                else {
                    return;
                };
                log::info!("  -> Transaction Started. ID captured: {}", transaction_id);
                self.current_transaction_id = Some(transaction_id);
                let connector_id = connector_id_of(payload);
                let id_tag = payload.get("idTag").and_then(Value::as_str).map(str::to_string);
                let updated = cp.update_connector(
                    |c| connector_id.map_or(true, |id| c.connector_id == id),
                    |c| {
                        c.status = ChargePointStatus::Charging;
                        c.current_transaction_id = Some(transaction_id);
                        if id_tag.is_some() {
                            c.id_tag = id_tag;
                        }
                    },
                );
                if updated.is_none() {
                    log::warn!("StartTransaction for unknown connector {:?}", connector_id);
                }
            }
            CallAction::StopTransaction => {
                let transaction_id = payload
                    .get("transactionId")
                    .and_then(Value::as_i64)
                    .and_then(|id| i32::try_from(id).ok());
                self.current_transaction_id = None;
                let Some(transaction_id) = transaction_id else {
                    return;
                };
                cp.update_connector(
                    |c| c.current_transaction_id == Some(transaction_id),
                    |c| {
                        c.status = ChargePointStatus::Available;
                        c.current_transaction_id = None;
                        c.id_tag = None;
                    },
                );
            }
            _ => {}
        }
    }
}

/// Runs named scenarios from a catalog against one charge point.
pub struct ScenarioRunner {
    catalog: ScenarioCatalog,
}

impl ScenarioRunner {
    pub fn new(catalog: ScenarioCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    pub async fn run<W: Websocket, C: ConfigSource>(
        &self,
        cp: &ChargePoint<W, C>,
        scenario_name: &str,
        charge_point_id: &str,
    ) -> ScenarioOutcome {
        let mut ctx = ScenarioRunContext::new(scenario_name);
        let failure = self
            .execute(cp, charge_point_id, &mut ctx)
            .await
            .err();
        ctx.passed = failure.is_none();

        let outcome = ScenarioOutcome {
            scenario: ctx.scenario_name,
            charge_point_id: charge_point_id.to_string(),
            passed: ctx.passed,
            steps_completed: ctx.step_index,
            failure,
        };
        match &outcome.failure {
            None => log::info!("--- Scenario PASSED: {} ---", outcome.scenario),
            Some(e) => {
                log::error!("{}", e);
                log::info!("--- Scenario FAILED: {} ---", outcome.scenario);
            }
        }
        cp.emit(EngineEvent::ScenarioFinished(outcome.clone()));
        outcome
    }

    async fn execute<W: Websocket, C: ConfigSource>(
        &self,
        cp: &ChargePoint<W, C>,
        charge_point_id: &str,
        ctx: &mut ScenarioRunContext,
    ) -> Result<(), ScenarioFailure> {
        if charge_point_id != cp.charge_point_id() {
            return Err(ScenarioFailure::UnknownChargePoint {
                expected: cp.charge_point_id().to_string(),
                requested: charge_point_id.to_string(),
            });
        }
        if !cp.is_connected() {
            return Err(ScenarioFailure::NotConnected);
        }
        let scenario = self
            .catalog
            .get(&ctx.scenario_name)
            .ok_or_else(|| ScenarioFailure::UnknownScenario(ctx.scenario_name.clone()))?;
        if !cp.is_booted() {
            return Err(ScenarioFailure::NotBooted);
        }

        log::info!("--- Starting Scenario: {} ---", scenario.name);
        cp.emit(EngineEvent::ScenarioStarted(scenario.name.clone()));

        for (index, step) in scenario.steps.iter().enumerate() {
            ctx.step_index = index;
            log::info!("Step: {}", step.description);
            cp.emit(EngineEvent::ScenarioStep {
                scenario: scenario.name.clone(),
                index,
                action: step.action,
                description: step.description.clone(),
            });

            let payload = ctx.prepare(step);
            let reply = cp
                .call(step.action, &payload)
                .await
                .map_err(|source| ScenarioFailure::CallFailed {
                    step: index,
                    action: step.action,
                    source,
                })?;
            if rejected(&reply) {
                return Err(ScenarioFailure::Rejected {
                    step: index,
                    action: step.action,
                });
            }
            ctx.confirmed(cp, step.action, &payload, &reply);
        }
        ctx.step_index = scenario.steps.len();
        Ok(())
    }
}
