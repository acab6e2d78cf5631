//! Inbound command dispatch.
//!
//! Every command resolves its instance id under the registry lock and calls
//! the engine while still holding it.  Unknown ids are logged and reported
//! as `false` / `None`; the remote side never sees an error type.

use log::debug;

use crate::app::ports::{GattServer, GattServerFactory};
use crate::error::Error;
use crate::gatt::{BleStatus, DeviceAddress, GattError, GattIdentifier, InstanceId, Uuid};

use super::GattServerBinder;

impl<F: GattServerFactory> GattServerBinder<F> {
    // ── Service declaration ───────────────────────────────────

    /// Open a service declaration on `server_id`.
    pub fn begin_service_declaration(
        &self,
        server_id: InstanceId,
        is_primary: bool,
        uuid: Uuid,
    ) -> Option<GattIdentifier> {
        debug!("begin_service_declaration: server_id={} uuid={}", server_id, uuid);
        self.with_server(server_id, "begin_service_declaration", |server| {
            server
                .begin_service_declaration(uuid, is_primary)
                .ok_or(Error::EngineRejected("service declaration not started"))
        })
    }

    pub fn add_characteristic(
        &self,
        server_id: InstanceId,
        uuid: Uuid,
        properties: u8,
        permissions: u16,
    ) -> Option<GattIdentifier> {
        debug!("add_characteristic: server_id={} uuid={}", server_id, uuid);
        self.with_server(server_id, "add_characteristic", |server| {
            server
                .add_characteristic(uuid, properties, permissions)
                .ok_or(Error::EngineRejected("characteristic not added"))
        })
    }

    pub fn add_descriptor(
        &self,
        server_id: InstanceId,
        uuid: Uuid,
        permissions: u16,
    ) -> Option<GattIdentifier> {
        debug!("add_descriptor: server_id={} uuid={}", server_id, uuid);
        self.with_server(server_id, "add_descriptor", |server| {
            server
                .add_descriptor(uuid, permissions)
                .ok_or(Error::EngineRejected("descriptor not added"))
        })
    }

    /// Commit the open declaration.  The outcome reaches the registrant
    /// through `on_service_added`, unless the binder or the instance is gone
    /// by then.
    pub fn end_service_declaration(&self, server_id: InstanceId) -> bool {
        debug!("end_service_declaration: server_id={}", server_id);
        let completion = self.completion(server_id, "on_service_added");
        self.with_server(server_id, "end_service_declaration", move |server| {
            let accepted = server.end_service_declaration(Box::new(
                move |status: BleStatus, service_id: GattIdentifier| {
                    completion.fire(|cb| cb.on_service_added(status, &service_id));
                },
            ));
            if accepted {
                Ok(())
            } else {
                Err(Error::EngineRejected("service declaration not committed"))
            }
        })
        .is_some()
    }

    // ── Responses and notifications ───────────────────────────

    pub fn send_response(
        &self,
        server_id: InstanceId,
        device_address: &str,
        request_id: i32,
        status: GattError,
        offset: u16,
        value: &[u8],
    ) -> bool {
        debug!(
            "send_response: server_id={} request_id={} status={:?}",
            server_id, request_id, status
        );
        let max_len = self.config.max_attribute_len;
        self.with_server(server_id, "send_response", |server| {
            let address = DeviceAddress::parse(device_address)?;
            if value.len() > max_len {
                return Err(Error::InvalidArgument("attribute value too long"));
            }
            if server.send_response(&address, request_id, status, offset, value) {
                Ok(())
            } else {
                Err(Error::EngineRejected("response not sent"))
            }
        })
        .is_some()
    }

    /// Queue a notification (or indication, with `confirm`).  Completion is
    /// reported through `on_notification_sent`.
    pub fn send_notification(
        &self,
        server_id: InstanceId,
        device_address: &str,
        characteristic_id: &GattIdentifier,
        confirm: bool,
        value: &[u8],
    ) -> bool {
        debug!(
            "send_notification: server_id={} handle={} confirm={}",
            server_id, characteristic_id.handle, confirm
        );
        let max_len = self.config.max_attribute_len;
        let completion = self.completion(server_id, "on_notification_sent");
        self.with_server(server_id, "send_notification", move |server| {
            let address = DeviceAddress::parse(device_address)?;
            if value.len() > max_len {
                return Err(Error::InvalidArgument("attribute value too long"));
            }
            let peer = address.clone();
            let sent = server.send_notification(
                &address,
                characteristic_id,
                confirm,
                value,
                Box::new(move |error: GattError| {
                    completion.fire(|cb| cb.on_notification_sent(&peer, error));
                }),
            );
            if sent {
                Ok(())
            } else {
                Err(Error::EngineRejected("notification not queued"))
            }
        })
        .is_some()
    }
}
