//! Fuzz target: arbitrary binder operation sequences
//!
//! Each input byte selects an operation (register, run the engine, emit an
//! event, dispatch a command, unregister) against a binder over the
//! simulated engine.  The binder must never panic, and afterwards its
//! registry must agree with the engine's view of live instances.
//!
//! cargo fuzz run fuzz_command_sequence

#![no_main]

use std::sync::Arc;

use gatt_binder::GattServerBinder;
use gatt_binder::adapters::log_callback::LogCallback;
use gatt_binder::adapters::sim_engine::SimEngine;
use gatt_binder::app::events::ServerEvent;
use gatt_binder::config::BinderConfig;
use gatt_binder::gatt::{DeviceAddress, GattError, GattIdentifier, ReadRequest, Uuid, properties};
use libfuzzer_sys::fuzz_target;

const PEER: &str = "00:11:22:33:44:55";

fuzz_target!(|data: &[u8]| {
    let config = BinderConfig {
        max_instances: 4,
        ..BinderConfig::default()
    };
    let engine = SimEngine::new(config.sim.clone());
    let binder = GattServerBinder::new(engine.factory(), config);
    let Ok(peer) = DeviceAddress::parse(PEER) else {
        return;
    };
    let mut last_attr = GattIdentifier {
        uuid: Uuid::from_u16(0x2a19),
        handle: 1,
    };

    for (n, byte) in data.iter().enumerate() {
        let id = i32::from(byte & 0x07);
        match byte >> 4 {
            0 => {
                let _ = binder.register_server(Arc::new(LogCallback::new("fuzz")));
            }
            1 => engine.fail_next_registration(),
            2 | 3 => {
                engine.run_pending();
            }
            4 => binder.unregister_server(id),
            5 => binder.unregister_all(),
            6 => {
                let _ = binder.begin_service_declaration(id, byte & 0x08 != 0, Uuid::from_u16(0x180f));
            }
            7 => {
                if let Some(attr) = binder.add_characteristic(
                    id,
                    Uuid::from_u16(0x2a19),
                    properties::READ | properties::NOTIFY,
                    0,
                ) {
                    last_attr = attr;
                }
            }
            8 => {
                let _ = binder.add_descriptor(id, Uuid::from_u16(0x2902), 0);
            }
            9 => {
                let _ = binder.end_service_declaration(id);
            }
            10 => {
                let _ = engine.emit(
                    id,
                    &ServerEvent::ConnectionStateChanged {
                        device_address: peer.clone(),
                        connected: byte & 0x08 != 0,
                    },
                );
            }
            11 => {
                let _ = engine.emit(
                    id,
                    &ServerEvent::CharacteristicReadRequest(ReadRequest {
                        device_address: peer.clone(),
                        request_id: n as i32,
                        offset: 0,
                        is_long: false,
                        attribute: last_attr,
                    }),
                );
            }
            12 => {
                let _ = binder.send_response(id, PEER, n as i32 - 1, GattError::Success, 0, data);
            }
            13 => {
                let _ = binder.send_notification(id, PEER, &last_attr, byte & 0x08 != 0, &[*byte]);
            }
            14 => binder.on_remote_died(id),
            _ => {
                let _ = binder.send_response(id, "zz", 0, GattError::Error, 0, &[]);
            }
        }
    }

    engine.run_pending();
    assert_eq!(binder.registered_ids().len(), engine.live_count());
    assert_eq!(binder.pending_registrations(), 0);
});
