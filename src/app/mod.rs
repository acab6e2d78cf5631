//! Application boundary: the contracts the binder core is written against.
//!
//! The binder never talks to a concrete engine or transport.  It consumes
//! the engine through the **port traits** in [`ports`], accepts inbound
//! work as [`commands`], and engines may describe their outbound traffic
//! as [`events`].

pub mod commands;
pub mod events;
pub mod ports;
