//! Unified error types for the binder.
//!
//! A single `Error` enum that every failure path converts into.  Nothing in
//! here escapes the binder's public command surface: commands log the error
//! and hand the remote side a plain `false` / `None`.  All variants are
//! `Copy` so they can be logged and returned without allocation.
//!
//! `ConfigError` stays separate: configuration is loaded before any binder
//! exists, and the host binary reports it through `anyhow`.

use core::fmt;

use crate::gatt::{AddressError, InstanceId};

// ---------------------------------------------------------------------------
// Top-level binder error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No registry entry for this instance id (never registered, or gone).
    UnknownServer(InstanceId),
    /// The engine declined to start the operation.
    EngineRejected(&'static str),
    /// A remote-supplied argument failed validation.
    InvalidArgument(&'static str),
    /// Live plus pending registrations already at `max_instances`.
    RegistryFull,
    /// Delivering to the remote callback failed.
    Remote(RemoteError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownServer(id) => write!(f, "unknown server_id: {id}"),
            Self::EngineRejected(msg) => write!(f, "engine rejected: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::RegistryFull => write!(f, "instance registry full"),
            Self::Remote(e) => write!(f, "remote: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<AddressError> for Error {
    fn from(_: AddressError) -> Self {
        Self::InvalidArgument("malformed device address")
    }
}

// ---------------------------------------------------------------------------
// Remote delivery errors
// ---------------------------------------------------------------------------

/// Result of invoking a method on a remote callback proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteError {
    /// The process hosting the callback is gone.
    DeadObject,
    /// The transport failed this one call; the peer may still be alive.
    TransactionFailed,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadObject => write!(f, "remote callback is dead"),
            Self::TransactionFailed => write!(f, "transaction failed"),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<RemoteError> for Error {
    fn from(e: RemoteError) -> Self {
        Self::Remote(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The document could not be deserialised.
    Malformed,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "config malformed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Binder-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
