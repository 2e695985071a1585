use std::collections::HashSet;

use cpsim_core::{
    format::message::Envelope,
    v16::protocol_error::ProtocolError,
};
use serde_json::json;

use crate::harness::harness::CpHarness;

pub async fn unsupported_actions_get_not_implemented() {
    let h = CpHarness::connected_without_boot().await;

    for action in ["Reset", "Heartbeat", "UnlockConnector", "DataTransfer"] {
        h.csms.send_call(action, json!({}));
        let err = h.csms.expect_reply().await.unwrap_err();
        assert_eq!(err.error_code, ProtocolError::NotImplemented);
        assert_eq!(
            err.error_description,
            format!("Action '{}' is not supported by the simulator.", action)
        );
    }
}

pub async fn unparseable_payloads_get_formation_violation() {
    let h = CpHarness::connected_without_boot().await;

    h.csms.send_call("ChangeConfiguration", json!({"key": "HeartbeatInterval"}));
    let err = h.csms.expect_reply().await.unwrap_err();
    assert_eq!(err.error_code, ProtocolError::FormationViolation);

    h.csms.send_call("RemoteStopTransaction", json!({"transactionId": "abc"}));
    let err = h.csms.expect_reply().await.unwrap_err();
    assert_eq!(err.error_code, ProtocolError::FormationViolation);

    assert_eq!(
        h.cp.configuration_value("HeartbeatInterval").as_deref(),
        Some("60")
    );
}

pub async fn every_call_gets_exactly_one_reply() {
    let h = CpHarness::connected_without_boot().await;

    let calls = [
        ("GetConfiguration", json!({})),
        ("ChangeConfiguration", json!({"key": "HeartbeatInterval", "value": "20"})),
        ("RemoteStopTransaction", json!({"transactionId": 1})),
        ("ClearCache", json!({})),
        ("ChangeConfiguration", json!({"value": "1"})),
    ];
    let mut sent = HashSet::new();
    for (action, payload) in calls {
        sent.insert(h.csms.send_call(action, payload));
    }

    let mut replied = HashSet::new();
    for _ in 0..sent.len() {
        let raw = h.csms.next_frame().await;
        let reply = Envelope::decode(&raw).unwrap();
        assert!(
            matches!(reply, Envelope::CallResult(_) | Envelope::CallError(_)),
            "not a reply: {}",
            raw
        );
        assert!(replied.insert(reply.unique_id().to_string()), "second reply: {}", raw);
    }
    assert_eq!(sent, replied);
    assert!(h.csms.no_frame_pending());
}
