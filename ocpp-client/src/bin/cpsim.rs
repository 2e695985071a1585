//! Command line front end: connects one emulated charge point to a CSMS,
//! boots it and runs scenarios from the catalog.
//!
//! ```bash
//! cpsim --url ws://localhost:9000/ocpp --id CP001 --scenario "Scenario 1: Standard Transaction"
//! cpsim --config cp.json --scenarios extra.json
//! cpsim --list
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use clap::Parser;
use cpsim_client::v16::{
    ChargePoint, ChargePointConfig, EngineEvent, HttpConfigSource, ScenarioCatalog,
    ScenarioRunner, TokioWsClient,
};
use log::LevelFilter;
use tokio_util::sync::CancellationToken;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// OCPP 1.6 charge point emulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON charge point configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSMS websocket base url, the charge point id is appended
    #[arg(short, long)]
    url: Option<String>,

    /// Charge point identity
    #[arg(short, long)]
    id: Option<String>,

    /// Seconds to wait for each confirmation
    #[arg(long)]
    timeout: Option<u64>,

    /// Connectors assumed until the configuration source answers
    #[arg(long)]
    connectors: Option<usize>,

    /// Scenario to run (can be repeated). Runs the whole catalog when omitted
    #[arg(short, long)]
    scenario: Vec<String>,

    /// JSON file with extra scenarios, merged over the built-in ones
    #[arg(long)]
    scenarios: Option<PathBuf>,

    /// Print scenario names and exit
    #[arg(long)]
    list: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: LevelFilter,
}

fn load_config(args: &Args) -> anyhow::Result<ChargePointConfig> {
    let mut config = match (&args.config, &args.url, &args.id) {
        (Some(path), _, _) => ChargePointConfig::from_file(path)?,
        (None, Some(url), Some(id)) => ChargePointConfig::new(url.clone(), id.clone()),
        (None, _, _) => bail!("either --config or both --url and --id are required"),
    };
    if let Some(url) = &args.url {
        config.base_url = url.clone();
    }
    if let Some(id) = &args.id {
        config.charge_point_id = id.clone();
    }
    if let Some(timeout) = args.timeout {
        config.call_timeout = timeout;
    }
    if let Some(connectors) = args.connectors {
        config.default_connectors = connectors;
    }
    // booted explicitly below so a failure ends the process
    config.auto_boot = false;
    Ok(config)
}

/// Consumes the subscription so it stops buffering events once connected.
async fn wait_connected(events: flume::Receiver<EngineEvent>) -> anyhow::Result<()> {
    let connected = async {
        while let Ok(ev) = events.recv_async().await {
            match ev {
                EngineEvent::Connected => return true,
                EngineEvent::Disconnected => return false,
                _ => {}
            }
        }
        false
    };
    match tokio::time::timeout(CONNECT_TIMEOUT, connected).await {
        Ok(true) => Ok(()),
        Ok(false) => bail!("connection to CSMS failed"),
        Err(_) => bail!("timed out connecting to CSMS"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::builder()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    let mut catalog = ScenarioCatalog::builtin();
    if let Some(path) = &args.scenarios {
        catalog.merge(ScenarioCatalog::from_json_file(path)?);
    }
    if args.list {
        for name in catalog.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let config = load_config(&args)?;
    let names: Vec<String> = if args.scenario.is_empty() {
        catalog.names().map(str::to_string).collect()
    } else {
        args.scenario.clone()
    };

    let url = config.ws_url();
    let source = HttpConfigSource::new(config.config_source_base());
    log::info!("connecting {} to {}", config.charge_point_id, url);
    let (ws, ws_events) = TokioWsClient::connect(url);
    let ws = Arc::new(ws);
    let cp = ChargePoint::new(ws.clone(), source, config);
    let events = cp.subscribe();

    let stop = CancellationToken::new();
    let engine = {
        let cp = cp.clone();
        let stop = stop.clone();
        tokio::spawn(async move { cp.run(ws_events, stop).await })
    };

    let result = async {
        wait_connected(events).await?;
        let status = cp.boot().await.context("boot failed")?;
        log::info!("registration status {:?}", status);

        let runner = ScenarioRunner::new(catalog);
        let mut failed = 0;
        for name in &names {
            let outcome = runner.run(&cp, name, cp.charge_point_id()).await;
            match outcome.reason() {
                None => println!("PASSED  {}", outcome.scenario),
                Some(reason) => {
                    failed += 1;
                    println!("FAILED  {}: {}", outcome.scenario, reason);
                }
            }
        }
        anyhow::Ok(failed)
    }
    .await;

    ws.close();
    stop.cancel();
    let _ = engine.await;

    let failed = result?;
    if failed > 0 {
        bail!("{} of {} scenario(s) failed", failed, names.len());
    }
    Ok(())
}
