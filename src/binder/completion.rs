//! Completion-safety wrapper for closures handed to the engine.
//!
//! A closure the engine runs later may outlive the binder that created it,
//! and the instance it was created for may be unregistered in the meantime.
//! [`Completion`] turns both hazards into ordinary results:
//!
//! 1. it holds only a `Weak` to the binder and promotes it on fire;
//!    failure yields [`Delivery::BinderGone`].
//! 2. the binder then re-resolves the instance id to a callback under its
//!    lock; absence yields [`Delivery::ServerGone`].
//!
//! Only when both checks pass does the remote callback run.

use std::sync::Weak;

use log::debug;

use crate::app::ports::GattServerCallback;
use crate::error::RemoteError;
use crate::gatt::InstanceId;

/// Outcome of routing one event to a remote callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The callback ran and reported success.
    Delivered,
    /// The binder was dropped before the event fired.
    BinderGone,
    /// No live registry entry for the instance id.
    ServerGone,
    /// The callback's process is gone; its entry has been removed.
    RemoteDied,
    /// The callback ran but the transport reported a transient failure.
    Failed,
}

/// Anything that can resolve an instance id to its remote callback under a
/// lock and run a delivery against it.
pub trait CallbackRouter: Send + Sync {
    fn route(
        &self,
        server_id: InstanceId,
        label: &'static str,
        deliver: &mut dyn FnMut(&dyn GattServerCallback) -> Result<(), RemoteError>,
    ) -> Delivery;
}

/// A one-shot delivery bound to a router (weakly) and an instance id.
pub struct Completion<R: ?Sized> {
    router: Weak<R>,
    server_id: InstanceId,
    label: &'static str,
}

impl<R: CallbackRouter + ?Sized> Completion<R> {
    pub fn new(router: Weak<R>, server_id: InstanceId, label: &'static str) -> Self {
        Self {
            router,
            server_id,
            label,
        }
    }

    /// Run `deliver` against the instance's callback if both the router and
    /// the instance are still alive.
    pub fn fire<F>(self, deliver: F) -> Delivery
    where
        F: FnOnce(&dyn GattServerCallback) -> Result<(), RemoteError>,
    {
        let Some(router) = self.router.upgrade() else {
            debug!(
                "{}: binder was dropped, completion for server_id {} discarded",
                self.label, self.server_id
            );
            return Delivery::BinderGone;
        };

        let mut deliver = Some(deliver);
        router.route(self.server_id, self.label, &mut |cb: &dyn GattServerCallback| {
            match deliver.take() {
                Some(f) => f(cb),
                None => Ok(()),
            }
        })
    }
}
