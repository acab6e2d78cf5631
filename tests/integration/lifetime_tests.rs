//! Late completions: binder dropped, or instance unregistered, before the
//! engine gets round to firing a queued result.

use gatt_binder::app::events::ServerEvent;
use gatt_binder::gatt::{BleStatus, DeviceAddress, Uuid, properties};

use crate::mock_callback::{CallbackCall, RecordingCallback};
use crate::{PEER, registered, sim_binder};

fn connect(engine: &gatt_binder::adapters::sim_engine::SimEngine, id: i32) {
    engine.emit(
        id,
        &ServerEvent::ConnectionStateChanged {
            device_address: DeviceAddress::parse(PEER).unwrap(),
            connected: true,
        },
    );
}

#[test]
fn registration_completing_after_binder_drop_is_a_noop() {
    let (binder, engine) = sim_binder();
    let cb = RecordingCallback::new();
    assert!(binder.register_server(cb.clone()));

    drop(binder);
    assert_eq!(engine.run_pending(), 1);

    assert_eq!(cb.count(), 0);
    assert_eq!(engine.live_count(), 0, "orphaned instance is released");
}

#[test]
fn service_added_after_binder_drop_is_a_noop() {
    let (binder, engine) = sim_binder();
    let (cb, id) = registered(&binder, &engine);

    binder.begin_service_declaration(id, true, Uuid::from_u16(0x180f)).unwrap();
    assert!(binder.end_service_declaration(id));
    drop(binder);

    assert_eq!(engine.run_pending(), 1);
    assert!(cb.services_added().is_empty());
}

#[test]
fn service_added_after_unregister_is_a_noop() {
    let (binder, engine) = sim_binder();
    let (a, a_id) = registered(&binder, &engine);
    let (b, b_id) = registered(&binder, &engine);

    binder.begin_service_declaration(a_id, true, Uuid::from_u16(0x180f)).unwrap();
    assert!(binder.end_service_declaration(a_id));
    let b_svc = binder
        .begin_service_declaration(b_id, true, Uuid::from_u16(0x180a))
        .unwrap();
    assert!(binder.end_service_declaration(b_id));

    binder.unregister_server(a_id);
    engine.run_pending();

    assert!(a.services_added().is_empty());
    assert_eq!(b.services_added(), vec![(BleStatus::Success, b_svc)]);
}

#[test]
fn notification_sent_after_unregister_is_a_noop() {
    let (binder, engine) = sim_binder();
    let (cb, id) = registered(&binder, &engine);

    binder.begin_service_declaration(id, true, Uuid::from_u16(0x180f)).unwrap();
    let level = binder
        .add_characteristic(id, Uuid::from_u16(0x2a19), properties::NOTIFY, 0)
        .unwrap();
    assert!(binder.end_service_declaration(id));
    engine.run_pending();
    connect(&engine, id);

    assert!(binder.send_notification(id, PEER, &level, false, &[1]));
    binder.unregister_server(id);
    engine.run_pending();

    assert!(!cb.calls().iter().any(|c| matches!(c, CallbackCall::NotificationSent { .. })));
}

#[test]
fn stale_completion_skips_new_registrant() {
    let (binder, engine) = sim_binder();
    let (first, id) = registered(&binder, &engine);

    binder.begin_service_declaration(id, true, Uuid::from_u16(0x180f)).unwrap();
    assert!(binder.end_service_declaration(id));
    binder.unregister_server(id);

    // The stale service-added job runs before the new registration does.
    let second = RecordingCallback::new();
    assert!(binder.register_server(second.clone()));
    engine.run_pending();

    assert!(first.services_added().is_empty());
    assert!(second.services_added().is_empty());
    assert!(second.registered_id().is_some());
}

#[test]
fn dropping_binder_releases_every_engine_instance() {
    let (binder, engine) = sim_binder();
    let _a = registered(&binder, &engine);
    let _b = registered(&binder, &engine);
    assert_eq!(engine.live_count(), 2);

    drop(binder);
    assert_eq!(engine.live_count(), 0);
}
