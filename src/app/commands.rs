//! Inbound commands from the transport.
//!
//! A transport stub decodes one of these per incoming transaction and hands
//! it to [`GattServerBinder::handle`](crate::binder::GattServerBinder::handle).
//! Registration is not a command: it carries a callback capability and goes
//! through `register_server` directly.

use crate::gatt::{GattError, GattIdentifier, InstanceId, Uuid};

/// Commands a remote client can issue against registered instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCommand {
    UnregisterServer(InstanceId),

    UnregisterAll,

    BeginServiceDeclaration {
        server_id: InstanceId,
        is_primary: bool,
        uuid: Uuid,
    },

    AddCharacteristic {
        server_id: InstanceId,
        uuid: Uuid,
        properties: u8,
        permissions: u16,
    },

    AddDescriptor {
        server_id: InstanceId,
        uuid: Uuid,
        permissions: u16,
    },

    EndServiceDeclaration(InstanceId),

    SendResponse {
        server_id: InstanceId,
        device_address: String,
        request_id: i32,
        status: GattError,
        offset: u16,
        value: Vec<u8>,
    },

    SendNotification {
        server_id: InstanceId,
        device_address: String,
        characteristic_id: GattIdentifier,
        confirm: bool,
        value: Vec<u8>,
    },
}

/// What the transport writes back for a [`ServerCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerReply {
    /// Command has no return value.
    Done,
    /// Whether the command (or the asynchronous operation it started) was accepted.
    Accepted(bool),
    /// Identifier of the attribute the command declared, if it succeeded.
    Attribute(Option<GattIdentifier>),
}

impl ServerReply {
    /// Collapse the reply to the boolean the wire protocol carries.
    pub fn succeeded(self) -> bool {
        match self {
            Self::Done => true,
            Self::Accepted(ok) => ok,
            Self::Attribute(id) => id.is_some(),
        }
    }
}
