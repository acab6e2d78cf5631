//! Integration test driver for `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one part of the binder
//! against the simulated engine (or the scripted one) and a recording
//! remote callback.  Everything runs on the host.

mod forwarding_tests;
mod lifetime_tests;
mod ordering_tests;
mod scenario_tests;

use std::sync::Arc;

use gatt_binder::GattServerBinder;
use gatt_binder::adapters::sim_engine::{SimEngine, SimGattServerFactory};
use gatt_binder::config::BinderConfig;
use gatt_binder::gatt::InstanceId;

use mock_callback::RecordingCallback;

pub const PEER: &str = "00:1A:7D:DA:71:13";

pub type SimBinder = Arc<GattServerBinder<SimGattServerFactory>>;

/// Binder over a fresh simulator with `config`.
pub fn sim_binder_with(config: BinderConfig) -> (SimBinder, SimEngine) {
    let engine = SimEngine::new(config.sim.clone());
    let binder = GattServerBinder::new(engine.factory(), config);
    (binder, engine)
}

pub fn sim_binder() -> (SimBinder, SimEngine) {
    sim_binder_with(BinderConfig::default())
}

/// Register one recording callback and run the engine until it completes.
pub fn registered(binder: &SimBinder, engine: &SimEngine) -> (Arc<RecordingCallback>, InstanceId) {
    let cb = RecordingCallback::new();
    assert!(binder.register_server(cb.clone()));
    engine.run_pending();
    let id = cb.registered_id().expect("registration should succeed");
    (cb, id)
}
