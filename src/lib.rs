//! GATT server binder library.
//!
//! Exposes the binder core, its port traits and the simulated engine for
//! integration testing and for embedding behind a real transport.  The
//! `gatt-binder-sim` binary drives the same pieces end to end.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod binder;
pub mod config;
pub mod error;
pub mod gatt;

pub use binder::GattServerBinder;
