//! Concurrency: per-thread event order, and commands racing events.

use std::sync::Arc;
use std::thread;

use gatt_binder::app::events::ServerEvent;
use gatt_binder::gatt::{DeviceAddress, GattIdentifier, ReadRequest, Uuid};

use crate::{PEER, registered, sim_binder};

const PER_THREAD: i32 = 100;

fn read(request_id: i32) -> ServerEvent {
    ServerEvent::CharacteristicReadRequest(ReadRequest {
        device_address: DeviceAddress::parse(PEER).unwrap(),
        request_id,
        offset: 0,
        is_long: false,
        attribute: GattIdentifier {
            uuid: Uuid::from_u16(0x2a19),
            handle: 2,
        },
    })
}

#[test]
fn per_thread_event_order_is_preserved() {
    let (binder, engine) = sim_binder();
    let (cb, id) = registered(&binder, &engine);

    let handles: Vec<_> = (1..=2)
        .map(|t| {
            let engine = engine.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    assert!(engine.emit(id, &read(t * 1000 + i)));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let seen = cb.read_request_ids();
    assert_eq!(seen.len(), 2 * PER_THREAD as usize);
    for t in 1..=2 {
        let mine: Vec<_> = seen.iter().copied().filter(|r| r / 1000 == t).collect();
        let expected: Vec<_> = (0..PER_THREAD).map(|i| t * 1000 + i).collect();
        assert_eq!(mine, expected, "thread {t} events reordered");
    }
    assert!(binder.is_registered(id));
}

#[test]
fn unregister_racing_events_never_delivers_afterwards() {
    let (binder, engine) = sim_binder();
    let (cb, id) = registered(&binder, &engine);

    let emitter = {
        let engine = engine.clone();
        thread::spawn(move || {
            let mut delivered = 0;
            for i in 0..500 {
                if engine.emit(id, &read(i)) {
                    delivered += 1;
                }
            }
            delivered
        })
    };
    let remover = {
        let binder = Arc::clone(&binder);
        thread::spawn(move || binder.unregister_server(id))
    };

    remover.join().unwrap();
    let delivered = emitter.join().unwrap();

    assert!(!binder.is_registered(id));
    let seen = cb.read_request_ids();
    assert!(seen.len() <= delivered);
    let count_before = seen.len();
    assert!(!engine.emit(id, &read(10_000)));
    assert_eq!(cb.read_request_ids().len(), count_before);
}

#[test]
fn commands_and_events_from_many_threads() {
    let (binder, engine) = sim_binder();
    let servers: Vec<_> = (0..4).map(|_| registered(&binder, &engine)).collect();

    let handles: Vec<_> = servers
        .iter()
        .map(|(_, id)| {
            let id = *id;
            let binder = Arc::clone(&binder);
            let engine = engine.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    engine.emit(id, &read(i));
                    binder.send_response(id, PEER, i, gatt_binder::gatt::GattError::Success, 0, &[]);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    for (cb, id) in &servers {
        assert_eq!(cb.read_request_ids(), (0..50).collect::<Vec<_>>());
        assert_eq!(engine.responses(*id).len(), 50);
        assert_eq!(engine.open_requests(*id), 0);
    }
}
