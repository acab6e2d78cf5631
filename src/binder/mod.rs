//! GATT server binder: the synchronization and lifetime-safety layer
//! between remote clients and the engine.
//!
//! ```text
//! ┌──────────────┐  commands   ┌────────────────────────────────┐  ports   ┌──────────┐
//! │  Transport   │────────────▶│        GattServerBinder        │─────────▶│  Engine  │
//! │  (remote)    │◀────────────│ registry · dispatch · forward  │◀─────────│ (thread) │
//! └──────────────┘  callbacks  └────────────────────────────────┘ delegate └──────────┘
//! ```
//!
//! One mutex (inside [`InstanceRegistry`]) serialises everything: registry
//! mutation and lookup, command dispatch, and delivery to remote callbacks.
//! Every closure handed to the engine captures a `Weak` to the binder (see
//! [`completion`]), so completions that fire after the binder or their
//! instance is gone are no-ops.

pub mod completion;
mod dispatch;
mod forwarder;
pub mod registry;

use std::sync::{Arc, Weak};

use log::{debug, error, info, warn};

use crate::app::commands::{ServerCommand, ServerReply};
use crate::app::ports::{GattServer, GattServerCallback, GattServerDelegate, GattServerFactory};
use crate::config::BinderConfig;
use crate::error::{Error, RemoteError};
use crate::gatt::{BleStatus, INVALID_INSTANCE_ID, InstanceId};

use completion::{CallbackRouter, Completion, Delivery};
use registry::{InstanceRegistry, Occupied, PendingToken};

/// Binder for one engine factory type.
///
/// Always lives in an `Arc`; construct with [`GattServerBinder::new`].
pub struct GattServerBinder<F: GattServerFactory> {
    factory: F,
    registry: InstanceRegistry<F::Server, dyn GattServerCallback>,
    config: BinderConfig,
    self_ref: Weak<Self>,
}

impl<F: GattServerFactory> GattServerBinder<F> {
    pub fn new(factory: F, config: BinderConfig) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            factory,
            registry: InstanceRegistry::new(),
            config,
            self_ref: self_ref.clone(),
        })
    }

    // ── Registration ──────────────────────────────────────────

    /// Ask the engine for a new server instance on behalf of `callback`.
    ///
    /// Returns whether the request was accepted.  The outcome is delivered
    /// later, exactly once, through `callback.on_server_registered`.
    pub fn register_server(&self, callback: Arc<dyn GattServerCallback>) -> bool {
        debug!("register_server");
        let mut instances = self.registry.lock();

        if instances.len() + instances.pending_len() >= self.config.max_instances {
            error!("register_server: {}", Error::RegistryFull);
            return false;
        }

        let token = instances.add_pending(callback);
        let binder = self.self_ref.clone();
        let accepted = self.factory.register_instance(Box::new(move |status, server| {
            let Some(binder) = binder.upgrade() else {
                debug!("on_server_registered: binder was dropped");
                return;
            };
            binder.on_register_instance(token, status, server);
        }));

        if !accepted {
            error!("register_server: factory refused the request");
            instances.take_pending(token);
        }
        accepted
    }

    /// Registration completion, on the engine's context.
    fn on_register_instance(&self, token: PendingToken, status: BleStatus, server: Option<F::Server>) {
        let mut instances = self.registry.lock();

        let Some(callback) = instances.take_pending(token) else {
            debug!("on_server_registered: pending callback was removed");
            return;
        };

        let (status, server_id) = match (status, server) {
            (BleStatus::Success, Some(mut server)) => {
                let id = server.instance_id();
                assert_ne!(
                    id, INVALID_INSTANCE_ID,
                    "engine reported a successful registration with an invalid instance id"
                );
                let delegate: Weak<dyn GattServerDelegate> = self.self_ref.clone();
                server.set_delegate(delegate);
                match instances.insert(id, server, Arc::clone(&callback)) {
                    Ok(()) => (BleStatus::Success, id),
                    Err(Occupied { .. }) => {
                        error!("on_server_registered: server_id {} is already registered", id);
                        (BleStatus::Failure, INVALID_INSTANCE_ID)
                    }
                }
            }
            (BleStatus::Success, None) => {
                error!("on_server_registered: engine reported success without an instance");
                (BleStatus::Failure, INVALID_INSTANCE_ID)
            }
            (status, _) => (status, INVALID_INSTANCE_ID),
        };

        info!("on_server_registered: server_id={} status={}", server_id, status);

        match callback.on_server_registered(status, server_id) {
            Ok(()) => {}
            Err(RemoteError::DeadObject) => {
                warn!("on_server_registered: registrant died, dropping server_id {}", server_id);
                instances.unregister(server_id);
            }
            Err(e) => warn!("on_server_registered: server_id {}: {}", server_id, Error::from(e)),
        }
    }

    /// Remove one instance.  Unknown ids are ignored.
    pub fn unregister_server(&self, server_id: InstanceId) {
        debug!("unregister_server: server_id={}", server_id);
        if self.registry.lock().unregister(server_id).is_none() {
            debug!("unregister_server: server_id {} was not registered", server_id);
        }
    }

    /// Remove every instance.  Registrations still waiting on the engine
    /// are left to complete.
    pub fn unregister_all(&self) {
        let n = self.registry.lock().unregister_all();
        debug!("unregister_all: removed {} servers", n);
    }

    /// Transport death notification for a registrant.
    pub fn on_remote_died(&self, server_id: InstanceId) {
        if self.registry.lock().unregister(server_id).is_some() {
            warn!("remote callback for server_id {} died, server removed", server_id);
        }
    }

    // ── Diagnostics ───────────────────────────────────────────

    pub fn is_registered(&self, server_id: InstanceId) -> bool {
        self.registry.lock().contains(server_id)
    }

    pub fn registered_ids(&self) -> Vec<InstanceId> {
        self.registry.lock().ids()
    }

    pub fn pending_registrations(&self) -> usize {
        self.registry.lock().pending_len()
    }

    // ── Transaction entry point ───────────────────────────────

    /// Execute one decoded transport command.
    pub fn handle(&self, command: ServerCommand) -> ServerReply {
        match command {
            ServerCommand::UnregisterServer(id) => {
                self.unregister_server(id);
                ServerReply::Done
            }
            ServerCommand::UnregisterAll => {
                self.unregister_all();
                ServerReply::Done
            }
            ServerCommand::BeginServiceDeclaration {
                server_id,
                is_primary,
                uuid,
            } => ServerReply::Attribute(self.begin_service_declaration(server_id, is_primary, uuid)),
            ServerCommand::AddCharacteristic {
                server_id,
                uuid,
                properties,
                permissions,
            } => ServerReply::Attribute(self.add_characteristic(server_id, uuid, properties, permissions)),
            ServerCommand::AddDescriptor {
                server_id,
                uuid,
                permissions,
            } => ServerReply::Attribute(self.add_descriptor(server_id, uuid, permissions)),
            ServerCommand::EndServiceDeclaration(id) => {
                ServerReply::Accepted(self.end_service_declaration(id))
            }
            ServerCommand::SendResponse {
                server_id,
                device_address,
                request_id,
                status,
                offset,
                value,
            } => ServerReply::Accepted(self.send_response(
                server_id,
                &device_address,
                request_id,
                status,
                offset,
                &value,
            )),
            ServerCommand::SendNotification {
                server_id,
                device_address,
                characteristic_id,
                confirm,
                value,
            } => ServerReply::Accepted(self.send_notification(
                server_id,
                &device_address,
                &characteristic_id,
                confirm,
                &value,
            )),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    /// Completion bound to this binder (weakly) and `server_id`.
    fn completion(&self, server_id: InstanceId, label: &'static str) -> Completion<Self> {
        Completion::new(self.self_ref.clone(), server_id, label)
    }

    /// Look up `server_id` under the lock and run `op` on its instance.
    /// Failures are logged and collapsed to `None`.
    fn with_server<T>(
        &self,
        server_id: InstanceId,
        label: &'static str,
        op: impl FnOnce(&mut F::Server) -> crate::error::Result<T>,
    ) -> Option<T> {
        let mut instances = self.registry.lock();
        let result = match instances.lookup_mut(server_id) {
            Some(server) => op(server),
            None => Err(Error::UnknownServer(server_id)),
        };
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                error!("{}: {} (server_id={})", label, e, server_id);
                None
            }
        }
    }
}

impl<F: GattServerFactory> CallbackRouter for GattServerBinder<F> {
    fn route(
        &self,
        server_id: InstanceId,
        label: &'static str,
        deliver: &mut dyn FnMut(&dyn GattServerCallback) -> Result<(), RemoteError>,
    ) -> Delivery {
        let mut instances = self.registry.lock();

        let Some(callback) = instances.lookup_callback(server_id) else {
            debug!("{}: no callback for server_id {}, event dropped", label, server_id);
            return Delivery::ServerGone;
        };

        let result = if callback.is_alive() {
            deliver(callback.as_ref())
        } else {
            Err(RemoteError::DeadObject)
        };

        match result {
            Ok(()) => Delivery::Delivered,
            Err(RemoteError::DeadObject) => {
                warn!("{}: remote for server_id {} is dead, server removed", label, server_id);
                instances.unregister(server_id);
                Delivery::RemoteDied
            }
            Err(e) => {
                warn!("{}: delivery to server_id {} failed: {}", label, server_id, Error::from(e));
                Delivery::Failed
            }
        }
    }
}

impl<F: GattServerFactory> Drop for GattServerBinder<F> {
    fn drop(&mut self) {
        let instances = self.registry.lock();
        debug!(
            "GattServerBinder dropped with {} servers, {} pending registrations",
            instances.len(),
            instances.pending_len()
        );
    }
}
