//! Engine → remote event forwarding.
//!
//! The binder registers itself (weakly) as every instance's delegate.  Each
//! event re-resolves the instance id under the registry lock and is dropped
//! when the instance is no longer registered.

use crate::app::ports::{GattServerCallback, GattServerDelegate, GattServerFactory};
use crate::gatt::{DeviceAddress, InstanceId, ReadRequest, WriteRequest};

use super::GattServerBinder;
use super::completion::CallbackRouter;

impl<F: GattServerFactory> GattServerDelegate for GattServerBinder<F> {
    fn on_characteristic_read_request(&self, server_id: InstanceId, request: &ReadRequest) {
        self.route(server_id, "on_characteristic_read_request", &mut |cb: &dyn GattServerCallback| {
            cb.on_characteristic_read_request(request)
        });
    }

    fn on_descriptor_read_request(&self, server_id: InstanceId, request: &ReadRequest) {
        self.route(server_id, "on_descriptor_read_request", &mut |cb: &dyn GattServerCallback| {
            cb.on_descriptor_read_request(request)
        });
    }

    fn on_characteristic_write_request(&self, server_id: InstanceId, request: &WriteRequest) {
        self.route(server_id, "on_characteristic_write_request", &mut |cb: &dyn GattServerCallback| {
            cb.on_characteristic_write_request(request)
        });
    }

    fn on_descriptor_write_request(&self, server_id: InstanceId, request: &WriteRequest) {
        self.route(server_id, "on_descriptor_write_request", &mut |cb: &dyn GattServerCallback| {
            cb.on_descriptor_write_request(request)
        });
    }

    fn on_execute_write_request(
        &self,
        server_id: InstanceId,
        device_address: &DeviceAddress,
        request_id: i32,
        is_execute: bool,
    ) {
        self.route(server_id, "on_execute_write_request", &mut |cb: &dyn GattServerCallback| {
            cb.on_execute_write_request(device_address, request_id, is_execute)
        });
    }

    fn on_connection_state_changed(
        &self,
        server_id: InstanceId,
        device_address: &DeviceAddress,
        connected: bool,
    ) {
        self.route(server_id, "on_connection_state_changed", &mut |cb: &dyn GattServerCallback| {
            cb.on_connection_state_changed(device_address, connected)
        });
    }
}
