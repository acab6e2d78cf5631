//! Engine events forwarded to the registrant: every event kind, unknown
//! instances, and remote transport failures.

use gatt_binder::app::events::ServerEvent;
use gatt_binder::app::ports::GattServerDelegate;
use gatt_binder::error::RemoteError;
use gatt_binder::gatt::{DeviceAddress, GattIdentifier, ReadRequest, Uuid, WriteRequest};

use crate::mock_callback::CallbackCall;
use crate::{PEER, registered, sim_binder};

fn peer() -> DeviceAddress {
    DeviceAddress::parse(PEER).unwrap()
}

fn attr(handle: u16) -> GattIdentifier {
    GattIdentifier {
        uuid: Uuid::from_u16(0x2a19),
        handle,
    }
}

fn read(request_id: i32) -> ReadRequest {
    ReadRequest {
        device_address: peer(),
        request_id,
        offset: 0,
        is_long: false,
        attribute: attr(2),
    }
}

fn write(request_id: i32, need_response: bool) -> WriteRequest {
    WriteRequest {
        device_address: peer(),
        request_id,
        offset: 0,
        is_prepare_write: false,
        need_response,
        value: vec![1, 2, 3],
        attribute: attr(3),
    }
}

#[test]
fn every_event_kind_reaches_the_registrant() {
    let (binder, engine) = sim_binder();
    let (cb, id) = registered(&binder, &engine);

    let events = [
        ServerEvent::ConnectionStateChanged {
            device_address: peer(),
            connected: true,
        },
        ServerEvent::CharacteristicReadRequest(read(1)),
        ServerEvent::DescriptorReadRequest(read(2)),
        ServerEvent::CharacteristicWriteRequest(write(3, true)),
        ServerEvent::DescriptorWriteRequest(write(4, false)),
        ServerEvent::ExecuteWriteRequest {
            device_address: peer(),
            request_id: 5,
            is_execute: true,
        },
        ServerEvent::ConnectionStateChanged {
            device_address: peer(),
            connected: false,
        },
    ];
    for ev in &events {
        assert!(engine.emit(id, ev));
    }

    let calls = cb.calls();
    assert_eq!(
        &calls[1..],
        &[
            CallbackCall::ConnectionState {
                device_address: peer(),
                connected: true,
            },
            CallbackCall::CharacteristicRead(read(1)),
            CallbackCall::DescriptorRead(read(2)),
            CallbackCall::CharacteristicWrite(write(3, true)),
            CallbackCall::DescriptorWrite(write(4, false)),
            CallbackCall::ExecuteWrite {
                device_address: peer(),
                request_id: 5,
                is_execute: true,
            },
            CallbackCall::ConnectionState {
                device_address: peer(),
                connected: false,
            },
        ]
    );
}

#[test]
fn events_for_unregistered_instances_are_dropped() {
    let (binder, engine) = sim_binder();
    let (cb, id) = registered(&binder, &engine);

    binder.on_characteristic_read_request(id + 100, &read(1));
    binder.on_connection_state_changed(id + 100, &peer(), true);
    assert_eq!(cb.count(), 1);

    binder.unregister_server(id);
    binder.on_characteristic_read_request(id, &read(2));
    assert!(!engine.emit(id, &ServerEvent::CharacteristicReadRequest(read(3))));
    assert_eq!(cb.count(), 1);
}

#[test]
fn events_route_to_their_own_registrant() {
    let (binder, engine) = sim_binder();
    let (a, a_id) = registered(&binder, &engine);
    let (b, b_id) = registered(&binder, &engine);

    engine.emit(a_id, &ServerEvent::CharacteristicReadRequest(read(10)));
    engine.emit(b_id, &ServerEvent::CharacteristicReadRequest(read(20)));

    assert_eq!(a.read_request_ids(), vec![10]);
    assert_eq!(b.read_request_ids(), vec![20]);
}

#[test]
fn dead_remote_is_unregistered_on_delivery() {
    let (binder, engine) = sim_binder();
    let (cb, id) = registered(&binder, &engine);
    let (other, other_id) = registered(&binder, &engine);

    cb.kill();
    assert!(engine.emit(id, &ServerEvent::CharacteristicReadRequest(read(1))));

    assert!(!binder.is_registered(id));
    assert!(!engine.is_live(id), "engine instance released with the entry");
    assert!(binder.is_registered(other_id));

    engine.emit(other_id, &ServerEvent::CharacteristicReadRequest(read(2)));
    assert_eq!(other.read_request_ids(), vec![2]);
}

#[test]
fn dead_object_result_unregisters() {
    let (binder, engine) = sim_binder();
    let (cb, id) = registered(&binder, &engine);

    cb.fail_next(RemoteError::DeadObject);
    engine.emit(id, &ServerEvent::CharacteristicReadRequest(read(1)));

    assert!(!binder.is_registered(id));
    assert!(cb.read_request_ids().is_empty());
}

#[test]
fn transient_failure_keeps_registration() {
    let (binder, engine) = sim_binder();
    let (cb, id) = registered(&binder, &engine);

    cb.fail_next(RemoteError::TransactionFailed);
    engine.emit(id, &ServerEvent::CharacteristicReadRequest(read(1)));
    engine.emit(id, &ServerEvent::CharacteristicReadRequest(read(2)));

    assert!(binder.is_registered(id));
    assert_eq!(cb.read_request_ids(), vec![2]);
}
