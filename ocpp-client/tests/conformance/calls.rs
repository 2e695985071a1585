use std::{collections::HashSet, time::Duration};

use cpsim_client::v16::{BootError, CallAction, CallFailure, EngineEvent};
use cpsim_core::v16::protocol_error::ProtocolError;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::harness::harness::{CpHarness, TestChargePoint};

fn spawn_call(
    cp: &TestChargePoint,
    action: CallAction,
    payload: Value,
) -> JoinHandle<Result<Value, CallFailure>> {
    let cp = cp.clone();
    tokio::spawn(async move { cp.call(action, payload).await })
}

pub async fn unanswered_call_times_out() {
    let h = CpHarness::new();
    h.connect_and_boot().await;

    let call = spawn_call(&h.cp, CallAction::Heartbeat, json!({}));
    h.csms.expect_call("Heartbeat").await;
    assert_eq!(h.cp.pending_calls(), 1);

    let failure = call.await.unwrap().unwrap_err();
    assert_eq!(
        failure,
        CallFailure::Timeout {
            action: CallAction::Heartbeat
        }
    );
    assert_eq!(failure.to_string(), "Timeout waiting for Heartbeat confirmation.");
    assert_eq!(h.cp.pending_calls(), 0);

    // late confirmation is ignored
    h.csms.respond(json!({"currentTime": "2024-01-01T00:00:00Z"}));

    let call = spawn_call(&h.cp, CallAction::Heartbeat, json!({}));
    h.csms.expect_call("Heartbeat").await;
    h.csms.respond(json!({"currentTime": "2024-01-01T00:00:01Z"}));
    assert_eq!(
        call.await.unwrap().unwrap(),
        json!({"currentTime": "2024-01-01T00:00:01Z"})
    );
}

pub async fn timeout_is_measured_per_call() {
    let h = CpHarness::new();
    h.connect_and_boot().await;

    let started = tokio::time::Instant::now();
    let short = {
        let cp = h.cp.clone();
        tokio::spawn(async move {
            cp.call_with_timeout(CallAction::Authorize, json!({"idTag": "A"}), Duration::from_secs(2))
                .await
        })
    };
    h.csms.expect_call("Authorize").await;
    let long = spawn_call(&h.cp, CallAction::Authorize, json!({"idTag": "B"}));
    h.csms.expect_call("Authorize").await;

    assert!(matches!(short.await.unwrap(), Err(CallFailure::Timeout { .. })));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(15));
    assert_eq!(h.cp.pending_calls(), 1);

    assert!(matches!(long.await.unwrap(), Err(CallFailure::Timeout { .. })));
    assert!(started.elapsed() >= Duration::from_secs(15));
}

pub async fn call_error_fails_the_call() {
    let h = CpHarness::new();
    h.connect_and_boot().await;

    let call = spawn_call(&h.cp, CallAction::Authorize, json!({"idTag": "TAG1"}));
    h.csms.expect_call("Authorize").await;
    h.csms.respond_error(ProtocolError::InternalError, "boom");

    assert_eq!(
        call.await.unwrap(),
        Err(CallFailure::CallError {
            action: CallAction::Authorize,
            code: ProtocolError::InternalError,
            description: "boom".into(),
        })
    );
    assert_eq!(h.cp.pending_calls(), 0);
}

pub async fn replies_are_matched_by_unique_id() {
    let h = CpHarness::new();
    h.connect_and_boot().await;

    let mut calls = Vec::new();
    let mut ids = Vec::new();
    for n in 0..3 {
        calls.push(spawn_call(&h.cp, CallAction::Authorize, json!({"idTag": format!("TAG{}", n)})));
        let call = h.csms.expect_call("Authorize").await;
        assert_eq!(call.payload["idTag"], format!("TAG{}", n));
        ids.push(call.unique_id);
    }
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 3);

    for (n, id) in ids.iter().enumerate().rev() {
        h.csms.respond_to(id, json!({"n": n}));
    }
    for (n, call) in calls.into_iter().enumerate() {
        assert_eq!(call.await.unwrap().unwrap(), json!({"n": n}));
    }
}

pub async fn disconnect_fails_pending_calls() {
    let h = CpHarness::new();
    h.connect_and_boot().await;

    let call = spawn_call(&h.cp, CallAction::MeterValues, json!({"connectorId": 1, "meterValue": []}));
    h.csms.expect_call("MeterValues").await;
    h.csms.disconnect();

    assert_eq!(
        call.await.unwrap(),
        Err(CallFailure::Offline {
            action: CallAction::MeterValues
        })
    );
    assert!(!h.cp.is_connected());
    assert!(!h.cp.is_booted());
    assert_eq!(h.cp.pending_calls(), 0);

    assert_eq!(
        h.cp.call(CallAction::Heartbeat, json!({})).await,
        Err(CallFailure::NotConnected {
            action: CallAction::Heartbeat
        })
    );
    assert!(h.csms.no_frame_pending());
}

pub async fn stopping_the_engine_cancels_pending_calls() {
    let h = CpHarness::new();
    h.connect_and_boot().await;

    let call = spawn_call(&h.cp, CallAction::Heartbeat, json!({}));
    h.csms.expect_call("Heartbeat").await;
    h.stop_token.cancel();

    assert_eq!(
        call.await.unwrap(),
        Err(CallFailure::Cancelled {
            action: CallAction::Heartbeat
        })
    );
}

pub async fn calls_after_stop_are_cancelled() {
    let h = CpHarness::new();
    h.connect_and_boot().await;

    let call = spawn_call(&h.cp, CallAction::Heartbeat, json!({}));
    h.csms.expect_call("Heartbeat").await;
    h.stop_token.cancel();
    assert!(matches!(call.await.unwrap(), Err(CallFailure::Cancelled { .. })));

    assert!(!h.cp.is_connected());
    assert!(!h.cp.is_booted());
    let late = tokio::time::timeout(
        Duration::from_secs(1),
        h.cp.call(CallAction::StatusNotification, json!({"connectorId": 1})),
    )
    .await
    .expect("call after stop must not hang");
    assert_eq!(
        late,
        Err(CallFailure::Cancelled {
            action: CallAction::StatusNotification
        })
    );
    assert_eq!(h.cp.pending_calls(), 0);
    assert_eq!(h.cp.boot().await, Err(BootError::NotConnected));
    assert!(h.csms.no_frame_pending());
}

pub async fn call_error_codes_are_accepted_leniently() {
    let h = CpHarness::new();
    h.connect_and_boot().await;

    // 1.6 spells this code with a single "r"
    let call = spawn_call(&h.cp, CallAction::Authorize, json!({"idTag": "TAG1"}));
    let sent = h.csms.expect_call("Authorize").await;
    h.csms.inject(format!(
        r#"[4,"{}","OccurenceConstraintViolation","too many",{{}}]"#,
        sent.unique_id
    ));
    assert_eq!(
        call.await.unwrap(),
        Err(CallFailure::CallError {
            action: CallAction::Authorize,
            code: ProtocolError::OccurrenceConstraintViolation,
            description: "too many".into(),
        })
    );

    // vendor codes and a missing description still settle the call
    let call = spawn_call(&h.cp, CallAction::Heartbeat, json!({}));
    let sent = h.csms.expect_call("Heartbeat").await;
    h.csms.inject(format!(r#"[4,"{}","AcmeQuotaExceeded",null,{{}}]"#, sent.unique_id));
    assert_eq!(
        call.await.unwrap(),
        Err(CallFailure::CallError {
            action: CallAction::Heartbeat,
            code: ProtocolError::GenericError,
            description: String::new(),
        })
    );
    assert_eq!(h.cp.pending_calls(), 0);
}

pub async fn malformed_frames_are_dropped() {
    let h = CpHarness::new();
    h.connect_and_boot().await;

    for raw in ["not json", "{}", "[2,\"abc\"]", "[9,\"abc\",{}]", "[2,\"abc\",\"Reset\",[]]"] {
        h.csms.inject(raw);
        let ev = h
            .wait_event(|ev| matches!(ev, EngineEvent::Dropped { .. }))
            .await;
        assert!(matches!(ev, EngineEvent::Dropped { raw: r, .. } if r == raw));
    }
    // unmatched replies are ignored quietly
    h.csms.inject("[3,\"unknown-id\",{}]");
    h.csms.inject("[4,\"unknown-id\",\"InternalError\",\"\",{}]");
    assert!(h.csms.no_frame_pending());

    h.csms.send_call("GetConfiguration", json!({"key": ["HeartbeatInterval"]}));
    assert!(h.csms.expect_reply().await.is_ok());
    assert!(h.cp.is_booted());
}
