//! Simulated GATT engine.
//!
//! Implements [`GattServerFactory`] and [`GattServer`] in memory so the
//! binder can be driven on a host without a Bluetooth stack.
//!
//! Completions are never run inline.  Registration results, service-added
//! results and notification-sent results are queued as jobs and executed by
//! [`SimEngine::run_pending`], which plays the part of the engine's own
//! thread.  Remote-originated traffic (reads, writes, connections) is
//! injected with [`SimEngine::emit`] from whichever thread the caller likes.
//!
//! The simulator only holds its own lock for bookkeeping; jobs and delegate
//! calls always run with it released, so the lock order is binder → engine.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use log::{debug, info, warn};

use crate::app::events::ServerEvent;
use crate::app::ports::{
    GattServer, GattServerDelegate, GattServerFactory, NotificationSentCallback,
    RegistrationCallback, ServiceAddedCallback,
};
use crate::config::SimConfig;
use crate::gatt::{
    BleStatus, DeviceAddress, GattError, GattIdentifier, InstanceId, Uuid, properties,
};

type Job = Box<dyn FnOnce() + Send>;

// ───────────────────────────────────────────────────────────────
// Recorded traffic
// ───────────────────────────────────────────────────────────────

/// A response the binder pushed through `send_response`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimResponse {
    pub device_address: DeviceAddress,
    pub request_id: i32,
    pub status: GattError,
    pub offset: u16,
    pub value: Vec<u8>,
}

/// A notification or indication the binder queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimNotification {
    pub device_address: DeviceAddress,
    pub characteristic: GattIdentifier,
    pub confirm: bool,
    pub value: Vec<u8>,
}

// ───────────────────────────────────────────────────────────────
// Internal state
// ───────────────────────────────────────────────────────────────

struct Declaration {
    service: GattIdentifier,
    characteristics: Vec<(GattIdentifier, u8)>,
    descriptors: Vec<GattIdentifier>,
}

struct SimServerState {
    delegate: Option<Weak<dyn GattServerDelegate>>,
    next_handle: Option<u16>,
    open: Option<Declaration>,
    services: Vec<GattIdentifier>,
    /// Committed characteristics by handle, with their property bits.
    characteristics: HashMap<u16, (GattIdentifier, u8)>,
    descriptors: Vec<GattIdentifier>,
    connected: HashSet<DeviceAddress>,
    open_requests: HashSet<(DeviceAddress, i32)>,
    responses: Vec<SimResponse>,
    notifications: Vec<SimNotification>,
}

impl SimServerState {
    fn new(first_handle: u16) -> Self {
        Self {
            delegate: None,
            next_handle: Some(first_handle),
            open: None,
            services: Vec::new(),
            characteristics: HashMap::new(),
            descriptors: Vec::new(),
            connected: HashSet::new(),
            open_requests: HashSet::new(),
            responses: Vec::new(),
            notifications: Vec::new(),
        }
    }

    fn allocate(&mut self, uuid: Uuid) -> Option<GattIdentifier> {
        let handle = self.next_handle?;
        self.next_handle = handle.checked_add(1);
        Some(GattIdentifier { uuid, handle })
    }
}

struct SimState {
    next_instance_id: Option<InstanceId>,
    fail_next: bool,
    refuse: bool,
    jobs: VecDeque<Job>,
    servers: HashMap<InstanceId, SimServerState>,
}

struct SimShared {
    config: SimConfig,
    state: Mutex<SimState>,
}

impl SimShared {
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ───────────────────────────────────────────────────────────────
// Engine handle
// ───────────────────────────────────────────────────────────────

/// Test and demo handle onto the simulator.  Cheap to clone.
#[derive(Clone)]
pub struct SimEngine {
    shared: Arc<SimShared>,
}

impl SimEngine {
    pub fn new(config: SimConfig) -> Self {
        let state = SimState {
            next_instance_id: Some(config.first_instance_id),
            fail_next: false,
            refuse: false,
            jobs: VecDeque::new(),
            servers: HashMap::new(),
        };
        Self {
            shared: Arc::new(SimShared {
                config,
                state: Mutex::new(state),
            }),
        }
    }

    /// Factory to hand to the binder.
    pub fn factory(&self) -> SimGattServerFactory {
        SimGattServerFactory {
            shared: Arc::clone(&self.shared),
        }
    }

    /// The next accepted registration completes with `Failure`.
    pub fn fail_next_registration(&self) {
        self.shared.lock().fail_next = true;
    }

    /// While set, `register_instance` refuses synchronously.
    pub fn refuse_registrations(&self, refuse: bool) {
        self.shared.lock().refuse = refuse;
    }

    pub fn pending_jobs(&self) -> usize {
        self.shared.lock().jobs.len()
    }

    /// Run queued completions until the queue is empty, including any
    /// queued while running.  Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let job = self.shared.lock().jobs.pop_front();
            let Some(job) = job else { break };
            job();
            ran += 1;
        }
        if ran > 0 {
            debug!("sim: ran {} completions", ran);
        }
        ran
    }

    /// Raise `event` on instance `server_id`, delivering it to the
    /// instance's delegate on the caller's thread.
    ///
    /// Returns `false` if the engine has no such instance or its delegate
    /// is gone.
    pub fn emit(&self, server_id: InstanceId, event: &ServerEvent) -> bool {
        let delegate = {
            let mut state = self.shared.lock();
            let Some(server) = state.servers.get_mut(&server_id) else {
                debug!("sim: emit to unknown server_id {}", server_id);
                return false;
            };
            if let ServerEvent::ConnectionStateChanged {
                device_address,
                connected,
            } = event
            {
                if *connected {
                    server.connected.insert(device_address.clone());
                } else {
                    server.connected.remove(device_address);
                    server.open_requests.retain(|(addr, _)| addr != device_address);
                }
            }
            if let Some(request_id) = event.pending_request_id() {
                server
                    .open_requests
                    .insert((event.device_address().clone(), request_id));
            }
            server.delegate.clone()
        };

        match delegate.and_then(|d| d.upgrade()) {
            Some(delegate) => {
                event.deliver(server_id, delegate.as_ref());
                true
            }
            None => {
                debug!("sim: server_id {} has no live delegate", server_id);
                false
            }
        }
    }

    /// Whether the engine still holds state for `server_id`.
    pub fn is_live(&self, server_id: InstanceId) -> bool {
        self.shared.lock().servers.contains_key(&server_id)
    }

    pub fn live_count(&self) -> usize {
        self.shared.lock().servers.len()
    }

    pub fn services(&self, server_id: InstanceId) -> Vec<GattIdentifier> {
        self.with_state(server_id, |s| s.services.clone())
    }

    pub fn descriptors(&self, server_id: InstanceId) -> Vec<GattIdentifier> {
        self.with_state(server_id, |s| s.descriptors.clone())
    }

    pub fn responses(&self, server_id: InstanceId) -> Vec<SimResponse> {
        self.with_state(server_id, |s| s.responses.clone())
    }

    pub fn notifications(&self, server_id: InstanceId) -> Vec<SimNotification> {
        self.with_state(server_id, |s| s.notifications.clone())
    }

    pub fn open_requests(&self, server_id: InstanceId) -> usize {
        self.with_state(server_id, |s| s.open_requests.len())
    }

    fn with_state<T: Default>(&self, server_id: InstanceId, f: impl FnOnce(&SimServerState) -> T) -> T {
        self.shared.lock().servers.get(&server_id).map(f).unwrap_or_default()
    }
}

// ───────────────────────────────────────────────────────────────
// Factory
// ───────────────────────────────────────────────────────────────

pub struct SimGattServerFactory {
    shared: Arc<SimShared>,
}

impl GattServerFactory for SimGattServerFactory {
    type Server = SimGattServer;

    fn register_instance(&self, done: RegistrationCallback<SimGattServer>) -> bool {
        let mut state = self.shared.lock();
        if state.refuse {
            warn!("sim: registration refused");
            return false;
        }
        let Some(id) = state.next_instance_id else {
            warn!("sim: instance ids exhausted");
            return false;
        };
        state.next_instance_id = id.checked_add(1);
        let fail = std::mem::take(&mut state.fail_next);

        let shared = Arc::downgrade(&self.shared);
        state.jobs.push_back(Box::new(move || {
            let Some(shared) = shared.upgrade() else {
                done(BleStatus::Failure, None);
                return;
            };
            if fail {
                info!("sim: registration of server_id {} failed", id);
                done(BleStatus::Failure, None);
                return;
            }
            let first_handle = shared.config.first_handle;
            shared.lock().servers.insert(id, SimServerState::new(first_handle));
            info!("sim: registered server_id {}", id);
            done(BleStatus::Success, Some(SimGattServer { id, shared }));
        }));
        true
    }
}

// ───────────────────────────────────────────────────────────────
// Server instance
// ───────────────────────────────────────────────────────────────

/// One simulated server instance.  Dropping it releases its engine state.
pub struct SimGattServer {
    id: InstanceId,
    shared: Arc<SimShared>,
}

impl SimGattServer {
    fn update<T>(&self, f: impl FnOnce(&mut SimServerState, &mut VecDeque<Job>) -> T) -> Option<T> {
        let mut guard = self.shared.lock();
        let state = &mut *guard;
        state.servers.get_mut(&self.id).map(|s| f(s, &mut state.jobs))
    }
}

impl GattServer for SimGattServer {
    fn instance_id(&self) -> InstanceId {
        self.id
    }

    fn set_delegate(&mut self, delegate: Weak<dyn GattServerDelegate>) {
        self.update(|s, _| s.delegate = Some(delegate));
    }

    fn begin_service_declaration(&mut self, uuid: Uuid, _is_primary: bool) -> Option<GattIdentifier> {
        self.update(|s, _| {
            if s.open.is_some() {
                warn!("sim: service declaration already open");
                return None;
            }
            let service = s.allocate(uuid)?;
            s.open = Some(Declaration {
                service,
                characteristics: Vec::new(),
                descriptors: Vec::new(),
            });
            Some(service)
        })
        .flatten()
    }

    fn add_characteristic(
        &mut self,
        uuid: Uuid,
        properties: u8,
        _permissions: u16,
    ) -> Option<GattIdentifier> {
        self.update(|s, _| {
            s.open.as_ref()?;
            let id = s.allocate(uuid)?;
            s.open.as_mut()?.characteristics.push((id, properties));
            Some(id)
        })
        .flatten()
    }

    fn add_descriptor(&mut self, uuid: Uuid, _permissions: u16) -> Option<GattIdentifier> {
        self.update(|s, _| {
            if s.open.as_ref()?.characteristics.is_empty() {
                warn!("sim: descriptor without a characteristic");
                return None;
            }
            let id = s.allocate(uuid)?;
            s.open.as_mut()?.descriptors.push(id);
            Some(id)
        })
        .flatten()
    }

    fn end_service_declaration(&mut self, done: ServiceAddedCallback) -> bool {
        self.update(|s, jobs| {
            let Some(decl) = s.open.take() else {
                return false;
            };
            for (id, props) in decl.characteristics {
                s.characteristics.insert(id.handle, (id, props));
            }
            s.descriptors.extend(decl.descriptors);
            s.services.push(decl.service);
            let service = decl.service;
            jobs.push_back(Box::new(move || done(BleStatus::Success, service)));
            true
        })
        .unwrap_or(false)
    }

    fn send_response(
        &mut self,
        device_address: &DeviceAddress,
        request_id: i32,
        error: GattError,
        offset: u16,
        value: &[u8],
    ) -> bool {
        self.update(|s, _| {
            if !s.open_requests.remove(&(device_address.clone(), request_id)) {
                warn!("sim: no open request {} from {}", request_id, device_address);
                return false;
            }
            s.responses.push(SimResponse {
                device_address: device_address.clone(),
                request_id,
                status: error,
                offset,
                value: value.to_vec(),
            });
            true
        })
        .unwrap_or(false)
    }

    fn send_notification(
        &mut self,
        device_address: &DeviceAddress,
        characteristic_id: &GattIdentifier,
        confirm: bool,
        value: &[u8],
        done: NotificationSentCallback,
    ) -> bool {
        self.update(|s, jobs| {
            let Some((id, props)) = s.characteristics.get(&characteristic_id.handle) else {
                warn!("sim: unknown characteristic handle {}", characteristic_id.handle);
                return false;
            };
            let needed = if confirm {
                properties::INDICATE
            } else {
                properties::NOTIFY
            };
            if id != characteristic_id || props & needed == 0 {
                warn!("sim: characteristic {} cannot notify", characteristic_id.handle);
                return false;
            }
            if !s.connected.contains(device_address) {
                warn!("sim: {} is not connected", device_address);
                return false;
            }
            s.notifications.push(SimNotification {
                device_address: device_address.clone(),
                characteristic: *characteristic_id,
                confirm,
                value: value.to_vec(),
            });
            jobs.push_back(Box::new(move || done(GattError::Success)));
            true
        })
        .unwrap_or(false)
    }
}

impl Drop for SimGattServer {
    fn drop(&mut self) {
        if self.shared.lock().servers.remove(&self.id).is_some() {
            debug!("sim: released server_id {}", self.id);
        }
    }
}
