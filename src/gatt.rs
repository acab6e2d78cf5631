//! GATT value types shared by the binder, the engine ports and the remote
//! callback surface.
//!
//! The attribute database itself belongs to the engine.  The binder only
//! needs identifiers it can pass through, status codes it can echo and a
//! validated peer address.

use core::fmt;

// ───────────────────────────────────────────────────────────────
// Instance identifiers
// ───────────────────────────────────────────────────────────────

/// Engine-assigned handle for one registered GATT server instance.
///
/// Unique among currently registered instances only; the engine may reuse
/// an id once the instance holding it has been unregistered.
pub type InstanceId = i32;

/// Reported to the remote side when a registration fails.
pub const INVALID_INSTANCE_ID: InstanceId = -1;

// ───────────────────────────────────────────────────────────────
// UUID
// ───────────────────────────────────────────────────────────────

/// Bluetooth SIG base UUID (`0000xxxx-0000-1000-8000-00805f9b34fb`).
const BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5f9b_34fb;

/// A 128-bit attribute UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uuid(pub u128);

impl Uuid {
    /// Expand a 16-bit SIG-assigned UUID onto the Bluetooth base UUID.
    pub const fn from_u16(short: u16) -> Self {
        Self(BASE_UUID | ((short as u128) << 96))
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xffff_ffff_ffff,
        )
    }
}

// ───────────────────────────────────────────────────────────────
// Attribute identifiers
// ───────────────────────────────────────────────────────────────

/// Identifies a service, characteristic or descriptor handed out by the
/// engine.  The binder never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GattIdentifier {
    pub uuid: Uuid,
    pub handle: u16,
}

/// Characteristic property bits (Bluetooth Core Vol 3, Part G, 3.3.1.1).
pub mod properties {
    pub const BROADCAST: u8 = 0x01;
    pub const READ: u8 = 0x02;
    pub const WRITE_NO_RESPONSE: u8 = 0x04;
    pub const WRITE: u8 = 0x08;
    pub const NOTIFY: u8 = 0x10;
    pub const INDICATE: u8 = 0x20;
}

/// Attribute permission bits, as carried over the binder interface.
pub mod permissions {
    pub const READ: u16 = 0x0001;
    pub const READ_ENCRYPTED: u16 = 0x0002;
    pub const WRITE: u16 = 0x0010;
    pub const WRITE_ENCRYPTED: u16 = 0x0020;
}

// ───────────────────────────────────────────────────────────────
// Status codes
// ───────────────────────────────────────────────────────────────

/// Outcome of an engine-side asynchronous operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleStatus {
    Success,
    Failure,
}

impl fmt::Display for BleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// ATT error codes used for responses and notification confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GattError {
    Success = 0x00,
    InvalidHandle = 0x01,
    ReadNotPermitted = 0x02,
    WriteNotPermitted = 0x03,
    InvalidPdu = 0x04,
    InsufficientAuthentication = 0x05,
    RequestNotSupported = 0x06,
    InvalidOffset = 0x07,
    InsufficientAuthorization = 0x08,
    PrepareQueueFull = 0x09,
    AttributeNotFound = 0x0a,
    AttributeNotLong = 0x0b,
    InsufficientEncryptionKeySize = 0x0c,
    InvalidAttributeValueLength = 0x0d,
    UnlikelyError = 0x0e,
    InsufficientEncryption = 0x0f,
    UnsupportedGroupType = 0x10,
    InsufficientResources = 0x11,
    /// Stack-internal catch-all (`GATT_ERROR`).
    Error = 0x85,
}

impl GattError {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for GattError {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, u8> {
        Ok(match code {
            0x00 => Self::Success,
            0x01 => Self::InvalidHandle,
            0x02 => Self::ReadNotPermitted,
            0x03 => Self::WriteNotPermitted,
            0x04 => Self::InvalidPdu,
            0x05 => Self::InsufficientAuthentication,
            0x06 => Self::RequestNotSupported,
            0x07 => Self::InvalidOffset,
            0x08 => Self::InsufficientAuthorization,
            0x09 => Self::PrepareQueueFull,
            0x0a => Self::AttributeNotFound,
            0x0b => Self::AttributeNotLong,
            0x0c => Self::InsufficientEncryptionKeySize,
            0x0d => Self::InvalidAttributeValueLength,
            0x0e => Self::UnlikelyError,
            0x0f => Self::InsufficientEncryption,
            0x10 => Self::UnsupportedGroupType,
            0x11 => Self::InsufficientResources,
            0x85 => GattError::Error,
            other => return Err(other),
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Device address
// ───────────────────────────────────────────────────────────────

const ADDRESS_LEN: usize = 17;

/// Rejection reason for [`DeviceAddress::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    /// Not exactly 17 bytes.
    BadLength,
    /// Separator or hex digit in the wrong place.
    BadFormat,
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadLength => write!(f, "device address must be 17 characters"),
            Self::BadFormat => write!(f, "device address must look like AA:BB:CC:DD:EE:FF"),
        }
    }
}

impl std::error::Error for AddressError {}

/// A peer address in canonical `AA:BB:CC:DD:EE:FF` form (upper-case hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceAddress(heapless::String<ADDRESS_LEN>);

impl DeviceAddress {
    /// Validate and canonicalise a textual address received from a client.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        if raw.len() != ADDRESS_LEN {
            return Err(AddressError::BadLength);
        }

        let mut out = heapless::String::<ADDRESS_LEN>::new();
        for (i, c) in raw.chars().enumerate() {
            let ok = if i % 3 == 2 { c == ':' } else { c.is_ascii_hexdigit() };
            if !ok {
                return Err(AddressError::BadFormat);
            }
            out.push(c.to_ascii_uppercase())
                .map_err(|()| AddressError::BadLength)?;
        }
        Ok(Self(out))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ───────────────────────────────────────────────────────────────
// Inbound requests
// ───────────────────────────────────────────────────────────────

/// A characteristic or descriptor read request raised by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub device_address: DeviceAddress,
    pub request_id: i32,
    pub offset: u16,
    pub is_long: bool,
    pub attribute: GattIdentifier,
}

/// A characteristic or descriptor write request raised by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub device_address: DeviceAddress,
    pub request_id: i32,
    pub offset: u16,
    pub is_prepare_write: bool,
    pub need_response: bool,
    pub value: Vec<u8>,
    pub attribute: GattIdentifier,
}
