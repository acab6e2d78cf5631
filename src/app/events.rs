//! Engine-originated events as values.
//!
//! The [`GattServerDelegate`](super::ports::GattServerDelegate) port is a
//! method-per-event trait; this enum is the same set of events in data form,
//! so an engine can queue or replay them and hand each one to a delegate
//! with [`ServerEvent::deliver`].

use crate::gatt::{DeviceAddress, InstanceId, ReadRequest, WriteRequest};

use super::ports::GattServerDelegate;

/// Events an engine raises for one registered server instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    CharacteristicReadRequest(ReadRequest),

    DescriptorReadRequest(ReadRequest),

    CharacteristicWriteRequest(WriteRequest),

    DescriptorWriteRequest(WriteRequest),

    /// Commit (`is_execute`) or discard all queued prepared writes.
    ExecuteWriteRequest {
        device_address: DeviceAddress,
        request_id: i32,
        is_execute: bool,
    },

    ConnectionStateChanged {
        device_address: DeviceAddress,
        connected: bool,
    },
}

impl ServerEvent {
    /// Peer the event concerns.
    pub fn device_address(&self) -> &DeviceAddress {
        match self {
            Self::CharacteristicReadRequest(r) | Self::DescriptorReadRequest(r) => &r.device_address,
            Self::CharacteristicWriteRequest(w) | Self::DescriptorWriteRequest(w) => {
                &w.device_address
            }
            Self::ExecuteWriteRequest { device_address, .. }
            | Self::ConnectionStateChanged { device_address, .. } => device_address,
        }
    }

    /// Request id the remote must answer with `send_response`, if any.
    pub fn pending_request_id(&self) -> Option<i32> {
        match self {
            Self::CharacteristicReadRequest(r) | Self::DescriptorReadRequest(r) => {
                Some(r.request_id)
            }
            Self::CharacteristicWriteRequest(w) | Self::DescriptorWriteRequest(w) => {
                w.need_response.then_some(w.request_id)
            }
            Self::ExecuteWriteRequest { request_id, .. } => Some(*request_id),
            Self::ConnectionStateChanged { .. } => None,
        }
    }

    /// Invoke the matching delegate method.
    pub fn deliver(&self, server_id: InstanceId, delegate: &dyn GattServerDelegate) {
        match self {
            Self::CharacteristicReadRequest(r) => {
                delegate.on_characteristic_read_request(server_id, r);
            }
            Self::DescriptorReadRequest(r) => delegate.on_descriptor_read_request(server_id, r),
            Self::CharacteristicWriteRequest(w) => {
                delegate.on_characteristic_write_request(server_id, w);
            }
            Self::DescriptorWriteRequest(w) => delegate.on_descriptor_write_request(server_id, w),
            Self::ExecuteWriteRequest {
                device_address,
                request_id,
                is_execute,
            } => delegate.on_execute_write_request(server_id, device_address, *request_id, *is_execute),
            Self::ConnectionStateChanged {
                device_address,
                connected,
            } => delegate.on_connection_state_changed(server_id, device_address, *connected),
        }
    }
}
