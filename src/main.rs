//! gatt-binder-sim: drives the binder against the simulated engine.
//!
//! ```text
//! ┌──────────────┐        ┌──────────────────┐        ┌─────────────┐
//! │ LogCallback  │◀───────│ GattServerBinder │───────▶│  SimEngine  │
//! │ (registrant) │        │                  │◀───────│ (run_pending│
//! └──────────────┘        └──────────────────┘        │  / emit)    │
//!                                                     └─────────────┘
//! ```
//!
//! Usage: `gatt-binder-sim [config.json]`.  Set `RUST_LOG=debug` for the
//! binder's per-command trace.
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use log::{info, warn};

use gatt_binder::GattServerBinder;
use gatt_binder::adapters::log_callback::LogCallback;
use gatt_binder::adapters::sim_engine::SimEngine;
use gatt_binder::app::events::ServerEvent;
use gatt_binder::config::BinderConfig;
use gatt_binder::gatt::{
    DeviceAddress, GattError, ReadRequest, Uuid, WriteRequest, permissions, properties,
};

const PEER: &str = "5C:F3:70:A1:0B:42";

fn load_config() -> Result<BinderConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            let config = BinderConfig::from_json(&text)?;
            info!("Config loaded from {}", path);
            Ok(config)
        }
        None => {
            info!("No config given, using defaults");
            Ok(BinderConfig::default())
        }
    }
}

fn main() -> Result<()> {
    // ── 1. Logging + config ───────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("gatt-binder-sim v{}", env!("CARGO_PKG_VERSION"));
    let config = load_config()?;

    // ── 2. Engine + binder ────────────────────────────────────
    let engine = SimEngine::new(config.sim.clone());
    let binder = GattServerBinder::new(engine.factory(), config);

    // ── 3. Register a server ──────────────────────────────────
    if !binder.register_server(Arc::new(LogCallback::new("battery-app"))) {
        bail!("registration was refused");
    }
    engine.run_pending();
    let Some(&server_id) = binder.registered_ids().first() else {
        bail!("registration did not complete");
    };

    // ── 4. Declare the Battery service ────────────────────────
    binder
        .begin_service_declaration(server_id, true, Uuid::from_u16(0x180f))
        .context("begin_service_declaration")?;
    let level = binder
        .add_characteristic(
            server_id,
            Uuid::from_u16(0x2a19),
            properties::READ | properties::NOTIFY,
            permissions::READ,
        )
        .context("add_characteristic")?;
    binder
        .add_descriptor(
            server_id,
            Uuid::from_u16(0x2902),
            permissions::READ | permissions::WRITE,
        )
        .context("add_descriptor")?;
    if !binder.end_service_declaration(server_id) {
        bail!("end_service_declaration refused");
    }
    engine.run_pending();

    // ── 5. Simulated peer traffic ─────────────────────────────
    let peer = DeviceAddress::parse(PEER)?;
    engine.emit(
        server_id,
        &ServerEvent::ConnectionStateChanged {
            device_address: peer.clone(),
            connected: true,
        },
    );
    engine.emit(
        server_id,
        &ServerEvent::CharacteristicReadRequest(ReadRequest {
            device_address: peer.clone(),
            request_id: 1,
            offset: 0,
            is_long: false,
            attribute: level,
        }),
    );
    if !binder.send_response(server_id, PEER, 1, GattError::Success, 0, &[87]) {
        warn!("read response was not accepted");
    }

    engine.emit(
        server_id,
        &ServerEvent::CharacteristicWriteRequest(WriteRequest {
            device_address: peer.clone(),
            request_id: 2,
            offset: 0,
            is_prepare_write: false,
            need_response: true,
            value: vec![0x01, 0x00],
            attribute: level,
        }),
    );
    if !binder.send_response(server_id, PEER, 2, GattError::WriteNotPermitted, 0, &[]) {
        warn!("write response was not accepted");
    }

    if !binder.send_notification(server_id, PEER, &level, false, &[86]) {
        warn!("notification was not queued");
    }
    engine.run_pending();

    // ── 6. Teardown ───────────────────────────────────────────
    engine.emit(
        server_id,
        &ServerEvent::ConnectionStateChanged {
            device_address: peer,
            connected: false,
        },
    );
    info!(
        "server_id {}: {} responses, {} notifications",
        server_id,
        engine.responses(server_id).len(),
        engine.notifications(server_id).len()
    );
    binder.unregister_server(server_id);
    info!("Done (engine holds {} servers)", engine.live_count());
    Ok(())
}
