//! Port traits: the hexagonal boundary between the binder and the outside world.
//!
//! ```text
//!   Remote client ──▶ GattServerBinder ──▶ GattServerFactory / GattServer (engine)
//!         ▲                 │    ▲                        │
//!         └─ GattServerCallback  └──── GattServerDelegate ┘
//! ```
//!
//! The engine implements [`GattServerFactory`] and [`GattServer`]; the
//! binder implements [`GattServerDelegate`] to receive engine events; the
//! transport implements [`GattServerCallback`] to carry events back to the
//! registrant.
//!
//! ## Re-entrancy
//!
//! The binder holds its registry lock while calling into the engine and
//! while calling a remote callback.  Engine implementations MUST NOT invoke
//! a completion closure or a delegate method from inside one of those calls;
//! they defer to their own execution context.  Callback implementations MUST
//! NOT call back into the binder.

use std::sync::Weak;

use crate::error::RemoteError;
use crate::gatt::{
    BleStatus, DeviceAddress, GattError, GattIdentifier, InstanceId, ReadRequest, Uuid,
    WriteRequest,
};

// ───────────────────────────────────────────────────────────────
// Completion closures (engine → binder, one-shot)
// ───────────────────────────────────────────────────────────────

/// Fired once per registration attempt.  `Some(server)` only on success.
pub type RegistrationCallback<S> = Box<dyn FnOnce(BleStatus, Option<S>) + Send>;

/// Fired once when a service declaration has been committed.
pub type ServiceAddedCallback = Box<dyn FnOnce(BleStatus, GattIdentifier) + Send>;

/// Fired once when a notification or indication has gone out.
pub type NotificationSentCallback = Box<dyn FnOnce(GattError) + Send>;

// ───────────────────────────────────────────────────────────────
// Engine ports (driven adapter: binder → engine)
// ───────────────────────────────────────────────────────────────

/// Creates server instances on request.
pub trait GattServerFactory: Send + Sync + 'static {
    /// The concrete instance type this factory produces.
    type Server: GattServer + 'static;

    /// Start registering a new instance.  Returns whether the request was
    /// accepted; the outcome arrives later through `done`.
    fn register_instance(&self, done: RegistrationCallback<Self::Server>) -> bool;
}

/// One registered GATT server, owned by the binder's registry.
pub trait GattServer: Send {
    fn instance_id(&self) -> InstanceId;

    /// Route this instance's events to `delegate`.
    fn set_delegate(&mut self, delegate: Weak<dyn GattServerDelegate>);

    fn begin_service_declaration(&mut self, uuid: Uuid, is_primary: bool)
        -> Option<GattIdentifier>;

    fn add_characteristic(
        &mut self,
        uuid: Uuid,
        properties: u8,
        permissions: u16,
    ) -> Option<GattIdentifier>;

    fn add_descriptor(&mut self, uuid: Uuid, permissions: u16) -> Option<GattIdentifier>;

    /// Commit the pending declaration.  Returns whether the engine accepted.
    fn end_service_declaration(&mut self, done: ServiceAddedCallback) -> bool;

    fn send_response(
        &mut self,
        device_address: &DeviceAddress,
        request_id: i32,
        error: GattError,
        offset: u16,
        value: &[u8],
    ) -> bool;

    /// Queue a notification (or an indication when `confirm` is set).
    fn send_notification(
        &mut self,
        device_address: &DeviceAddress,
        characteristic_id: &GattIdentifier,
        confirm: bool,
        value: &[u8],
        done: NotificationSentCallback,
    ) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Delegate (engine → binder, any thread)
// ───────────────────────────────────────────────────────────────

/// Engine-originated events for a registered instance.
pub trait GattServerDelegate: Send + Sync {
    fn on_characteristic_read_request(&self, server_id: InstanceId, request: &ReadRequest);

    fn on_descriptor_read_request(&self, server_id: InstanceId, request: &ReadRequest);

    fn on_characteristic_write_request(&self, server_id: InstanceId, request: &WriteRequest);

    fn on_descriptor_write_request(&self, server_id: InstanceId, request: &WriteRequest);

    fn on_execute_write_request(
        &self,
        server_id: InstanceId,
        device_address: &DeviceAddress,
        request_id: i32,
        is_execute: bool,
    );

    fn on_connection_state_changed(
        &self,
        server_id: InstanceId,
        device_address: &DeviceAddress,
        connected: bool,
    );
}

// ───────────────────────────────────────────────────────────────
// Remote callback (binder → registrant, across the RPC boundary)
// ───────────────────────────────────────────────────────────────

/// Proxy to the remote registrant.
///
/// Every method may fail with [`RemoteError::DeadObject`] once the peer
/// process is gone; the binder treats that as a removal, never as a fault.
pub trait GattServerCallback: Send + Sync {
    /// Cheap liveness probe.  Proxies without one report alive and rely on
    /// `DeadObject` results instead.
    fn is_alive(&self) -> bool {
        true
    }

    fn on_server_registered(&self, status: BleStatus, server_id: InstanceId)
        -> Result<(), RemoteError>;

    fn on_service_added(
        &self,
        status: BleStatus,
        service_id: &GattIdentifier,
    ) -> Result<(), RemoteError>;

    fn on_characteristic_read_request(&self, request: &ReadRequest) -> Result<(), RemoteError>;

    fn on_descriptor_read_request(&self, request: &ReadRequest) -> Result<(), RemoteError>;

    fn on_characteristic_write_request(&self, request: &WriteRequest)
        -> Result<(), RemoteError>;

    fn on_descriptor_write_request(&self, request: &WriteRequest) -> Result<(), RemoteError>;

    fn on_execute_write_request(
        &self,
        device_address: &DeviceAddress,
        request_id: i32,
        is_execute: bool,
    ) -> Result<(), RemoteError>;

    fn on_connection_state_changed(
        &self,
        device_address: &DeviceAddress,
        connected: bool,
    ) -> Result<(), RemoteError>;

    fn on_notification_sent(
        &self,
        device_address: &DeviceAddress,
        error: GattError,
    ) -> Result<(), RemoteError>;
}
