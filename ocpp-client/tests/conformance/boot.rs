use chrono::Utc;
use cpsim_client::v16::{BootError, ChargePointTopology, EngineEvent, StaticConfigSource};
use cpsim_core::v16::{
    messages::boot_notification::BootNotificationResponse,
    types::{ChargePointStatus, RegistrationStatus},
};
use serde_json::json;

use crate::harness::harness::{test_config, CpHarness, GatedConfigSource, CHARGE_POINT_ID};

pub async fn accepted_boot_applies_topology_and_interval() {
    let h = CpHarness::new();
    h.csms.connect();
    let boot = h.csms.expect_call("BootNotification").await;
    assert_eq!(boot.payload["chargePointVendor"], "SimV");
    assert_eq!(boot.payload["chargePointModel"], "TestModel");
    assert_eq!(boot.payload["chargeBoxSerialNumber"], CHARGE_POINT_ID);
    assert!(!h.cp.is_booted());

    h.csms.respond(
        serde_json::to_value(BootNotificationResponse {
            current_time: Utc::now(),
            interval: 120,
            status: RegistrationStatus::Accepted,
        })
        .unwrap(),
    );
    let ev = h
        .wait_event(|ev| matches!(ev, EngineEvent::Booted(_) | EngineEvent::BootFailed(_)))
        .await;
    assert_eq!(ev, EngineEvent::Booted(RegistrationStatus::Accepted));

    assert!(h.cp.is_booted());
    let connectors = h.cp.connectors();
    assert_eq!(connectors.len(), 2);
    assert!(connectors
        .iter()
        .all(|c| c.status == ChargePointStatus::Available && c.current_transaction_id.is_none()));
    assert_eq!(
        h.cp.configuration_value("HeartbeatInterval").as_deref(),
        Some("120")
    );
}

pub async fn rejected_boot_is_not_retried() {
    let h = CpHarness::new();
    h.csms.connect();
    h.csms.expect_call("BootNotification").await;
    h.csms.respond(json!({
        "currentTime": Utc::now(),
        "interval": 30,
        "status": "Rejected"
    }));
    h.wait_event(|ev| matches!(ev, EngineEvent::BootFailed(_)))
        .await;

    assert!(!h.cp.is_booted());
    assert_eq!(
        h.cp.configuration_value("HeartbeatInterval").as_deref(),
        Some("60")
    );
    assert_eq!(h.cp.boot().await, Err(BootError::AlreadyRan));
    assert!(h.csms.no_frame_pending());
}

pub async fn unreachable_config_source_keeps_default_connectors() {
    let mut config = test_config();
    config.default_connectors = 3;
    let h = CpHarness::with(config, StaticConfigSource::unavailable());
    h.connect_and_boot().await;
    assert_eq!(h.cp.connectors().len(), 3);
}

pub async fn boot_reply_without_interval_is_accepted() {
    let h = CpHarness::new();
    h.csms.connect();
    h.csms.expect_call("BootNotification").await;
    h.csms.respond(json!({"status": "Accepted"}));
    h.wait_event(|ev| matches!(ev, EngineEvent::Booted(_)))
        .await;
    assert_eq!(
        h.cp.configuration_value("HeartbeatInterval").as_deref(),
        Some("60")
    );
}

pub async fn manual_boot_once_per_connection() {
    let mut config = test_config();
    config.auto_boot = false;
    let h = CpHarness::with(config, StaticConfigSource::new(1));

    assert_eq!(h.cp.boot().await, Err(BootError::NotConnected));

    for _ in 0..2 {
        h.csms.connect();
        h.wait_event(|ev| *ev == EngineEvent::Connected).await;
        assert!(h.csms.no_frame_pending());

        let boot = {
            let cp = h.cp.clone();
            tokio::spawn(async move { cp.boot().await })
        };
        h.csms.expect_call("BootNotification").await;
        h.csms.respond(json!({
            "currentTime": Utc::now(),
            "interval": 60,
            "status": "Accepted"
        }));
        assert_eq!(boot.await.unwrap(), Ok(RegistrationStatus::Accepted));
        assert_eq!(h.cp.boot().await, Err(BootError::AlreadyRan));

        h.csms.disconnect();
        h.wait_event(|ev| *ev == EngineEvent::Disconnected).await;
        assert!(!h.cp.is_booted());
    }
}

pub async fn topology_from_a_replaced_connection_is_discarded() {
    let mut config = test_config();
    config.auto_boot = false;
    config.default_connectors = 2;
    let (source, topology) = GatedConfigSource::new();
    let h = CpHarness::with(config, source);
    h.csms.connect();
    h.wait_event(|ev| *ev == EngineEvent::Connected).await;

    let stale = {
        let cp = h.cp.clone();
        tokio::spawn(async move { cp.boot().await })
    };
    h.csms.expect_call("BootNotification").await;
    h.csms.respond(json!({"currentTime": Utc::now(), "interval": 60, "status": "Accepted"}));

    // the configuration source answers only after the link was replaced
    h.csms.disconnect();
    h.wait_event(|ev| *ev == EngineEvent::Disconnected).await;
    h.csms.connect();
    h.wait_event(|ev| *ev == EngineEvent::Connected).await;
    topology.send(ChargePointTopology::with_connectors(5)).unwrap();
    stale.await.unwrap().unwrap();

    assert_eq!(h.cp.connectors().len(), 2);
    assert!(!h.cp.is_booted());

    let boot = {
        let cp = h.cp.clone();
        tokio::spawn(async move { cp.boot().await })
    };
    h.csms.expect_call("BootNotification").await;
    h.csms.respond(json!({"currentTime": Utc::now(), "interval": 60, "status": "Accepted"}));
    topology.send(ChargePointTopology::with_connectors(3)).unwrap();
    assert_eq!(boot.await.unwrap(), Ok(RegistrationStatus::Accepted));
    assert_eq!(h.cp.connectors().len(), 3);
    assert!(h.cp.is_booted());
}
