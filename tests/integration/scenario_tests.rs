//! End-to-end scenarios: a heart-rate server serving one peer, with a
//! second (log-only) registrant alongside.

use std::sync::Arc;

use gatt_binder::adapters::log_callback::LogCallback;
use gatt_binder::app::events::ServerEvent;
use gatt_binder::gatt::{
    BleStatus, DeviceAddress, GattError, ReadRequest, Uuid, WriteRequest, permissions, properties,
};

use crate::mock_callback::CallbackCall;
use crate::{PEER, registered, sim_binder};

// ── QA-1: heart-rate server lifecycle ─────────────────────────

#[test]
fn heart_rate_server_lifecycle() {
    let (binder, engine) = sim_binder();
    let (cb, id) = registered(&binder, &engine);

    assert!(binder.register_server(Arc::new(LogCallback::new("bystander"))));
    engine.run_pending();
    assert_eq!(binder.registered_ids().len(), 2);

    // Declare Heart Rate service: measurement (notify) + control point (write).
    let svc = binder
        .begin_service_declaration(id, true, Uuid::from_u16(0x180d))
        .unwrap();
    let measurement = binder
        .add_characteristic(id, Uuid::from_u16(0x2a37), properties::NOTIFY, 0)
        .unwrap();
    binder
        .add_descriptor(id, Uuid::from_u16(0x2902), permissions::READ | permissions::WRITE)
        .unwrap();
    let control = binder
        .add_characteristic(id, Uuid::from_u16(0x2a39), properties::WRITE, permissions::WRITE)
        .unwrap();
    assert!(binder.end_service_declaration(id));
    engine.run_pending();
    assert_eq!(cb.services_added(), vec![(BleStatus::Success, svc)]);

    // Peer connects, reads the CCCD and writes the control point.
    let peer = DeviceAddress::parse(PEER).unwrap();
    engine.emit(
        id,
        &ServerEvent::ConnectionStateChanged {
            device_address: peer.clone(),
            connected: true,
        },
    );
    engine.emit(
        id,
        &ServerEvent::DescriptorReadRequest(ReadRequest {
            device_address: peer.clone(),
            request_id: 1,
            offset: 0,
            is_long: false,
            attribute: measurement,
        }),
    );
    assert!(binder.send_response(id, PEER, 1, GattError::Success, 0, &[0x01, 0x00]));

    let reset = WriteRequest {
        device_address: peer.clone(),
        request_id: 2,
        offset: 0,
        is_prepare_write: false,
        need_response: true,
        value: vec![0x01],
        attribute: control,
    };
    engine.emit(id, &ServerEvent::CharacteristicWriteRequest(reset.clone()));
    assert!(binder.send_response(id, PEER, 2, GattError::Success, 0, &[]));

    // Stream two measurements.
    assert!(binder.send_notification(id, PEER, &measurement, false, &[0x06, 72]));
    assert!(binder.send_notification(id, PEER, &measurement, false, &[0x06, 74]));
    assert_eq!(engine.run_pending(), 2);

    engine.emit(
        id,
        &ServerEvent::ConnectionStateChanged {
            device_address: peer.clone(),
            connected: false,
        },
    );

    let calls = cb.calls();
    assert!(calls.contains(&CallbackCall::CharacteristicWrite(reset)));
    assert_eq!(
        calls
            .iter()
            .filter(|c| matches!(
                c,
                CallbackCall::NotificationSent {
                    error: GattError::Success,
                    ..
                }
            ))
            .count(),
        2
    );
    assert_eq!(
        calls.last(),
        Some(&CallbackCall::ConnectionState {
            device_address: peer,
            connected: false,
        })
    );
    assert_eq!(engine.responses(id).len(), 2);
    assert_eq!(engine.notifications(id).len(), 2);

    binder.unregister_all();
    assert!(binder.registered_ids().is_empty());
    assert_eq!(engine.live_count(), 0);
}
