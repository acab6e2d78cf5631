//! Log-based remote callback adapter.
//!
//! Implements [`GattServerCallback`] by writing every delivered event to the
//! logger.  Used by the simulator binary as a stand-in registrant; a real
//! transport proxy implements the same trait.

use log::info;

use crate::app::ports::GattServerCallback;
use crate::error::RemoteError;
use crate::gatt::{
    BleStatus, DeviceAddress, GattError, GattIdentifier, InstanceId, ReadRequest, WriteRequest,
};

/// Registrant that logs every event it receives, tagged with `name`.
pub struct LogCallback {
    name: &'static str,
}

impl LogCallback {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl GattServerCallback for LogCallback {
    fn on_server_registered(&self, status: BleStatus, server_id: InstanceId) -> Result<(), RemoteError> {
        info!("{} | REGISTERED | status={} server_id={}", self.name, status, server_id);
        Ok(())
    }

    fn on_service_added(&self, status: BleStatus, service_id: &GattIdentifier) -> Result<(), RemoteError> {
        info!(
            "{} | SERVICE | status={} uuid={} handle={}",
            self.name, status, service_id.uuid, service_id.handle
        );
        Ok(())
    }

    fn on_characteristic_read_request(&self, request: &ReadRequest) -> Result<(), RemoteError> {
        info!(
            "{} | CHAR READ | {} req={} handle={} offset={}",
            self.name, request.device_address, request.request_id, request.attribute.handle, request.offset
        );
        Ok(())
    }

    fn on_descriptor_read_request(&self, request: &ReadRequest) -> Result<(), RemoteError> {
        info!(
            "{} | DESC READ | {} req={} handle={} offset={}",
            self.name, request.device_address, request.request_id, request.attribute.handle, request.offset
        );
        Ok(())
    }

    fn on_characteristic_write_request(&self, request: &WriteRequest) -> Result<(), RemoteError> {
        info!(
            "{} | CHAR WRITE | {} req={} handle={} len={} prepare={}",
            self.name,
            request.device_address,
            request.request_id,
            request.attribute.handle,
            request.value.len(),
            request.is_prepare_write
        );
        Ok(())
    }

    fn on_descriptor_write_request(&self, request: &WriteRequest) -> Result<(), RemoteError> {
        info!(
            "{} | DESC WRITE | {} req={} handle={} len={}",
            self.name,
            request.device_address,
            request.request_id,
            request.attribute.handle,
            request.value.len()
        );
        Ok(())
    }

    fn on_execute_write_request(
        &self,
        device_address: &DeviceAddress,
        request_id: i32,
        is_execute: bool,
    ) -> Result<(), RemoteError> {
        info!(
            "{} | EXEC WRITE | {} req={} execute={}",
            self.name, device_address, request_id, is_execute
        );
        Ok(())
    }

    fn on_connection_state_changed(
        &self,
        device_address: &DeviceAddress,
        connected: bool,
    ) -> Result<(), RemoteError> {
        info!(
            "{} | {} | {}",
            self.name,
            if connected { "CONNECTED" } else { "DISCONNECTED" },
            device_address
        );
        Ok(())
    }

    fn on_notification_sent(&self, device_address: &DeviceAddress, error: GattError) -> Result<(), RemoteError> {
        info!(
            "{} | NOTIFIED | {} status={:?} (0x{:02x})",
            self.name,
            device_address,
            error,
            error.code()
        );
        Ok(())
    }
}
