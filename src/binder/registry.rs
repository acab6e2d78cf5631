//! Instance registry: the map from instance id to owned server handle and
//! shared remote callback.
//!
//! The map only exists behind the registry mutex.  [`InstanceRegistry::lock`]
//! hands out a guard, and every lookup borrows from that guard, so a looked-up
//! instance or callback cannot be used after the lock is released.
//!
//! Registration is two-phase: the callback is parked under a
//! [`PendingToken`] while the engine works, then moved into a
//! [`RegistryEntry`] once the engine reports the instance id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::gatt::InstanceId;

/// Key for a registration whose engine completion has not arrived yet.
pub type PendingToken = u64;

/// One live, dispatchable instance.
pub struct RegistryEntry<I, C: ?Sized> {
    pub instance: I,
    pub callback: Arc<C>,
}

/// [`Instances::insert`] found the id already live.  Hands the parts back.
pub struct Occupied<I, C: ?Sized> {
    pub instance: I,
    pub callback: Arc<C>,
}

/// The guarded registry contents.
pub struct Instances<I, C: ?Sized> {
    pending: HashMap<PendingToken, Arc<C>>,
    entries: HashMap<InstanceId, RegistryEntry<I, C>>,
    next_token: PendingToken,
}

/// Mutex-guarded registry shared by dispatch, forwarding and completions.
pub struct InstanceRegistry<I, C: ?Sized> {
    inner: Mutex<Instances<I, C>>,
}

impl<I, C: ?Sized> InstanceRegistry<I, C> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Instances {
                pending: HashMap::new(),
                entries: HashMap::new(),
                next_token: 1,
            }),
        }
    }

    /// Take the registry lock.
    ///
    /// A panic while the lock was held (typically inside a remote callback)
    /// leaves the map itself consistent, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, Instances<I, C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<I, C: ?Sized> Default for InstanceRegistry<I, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, C: ?Sized> Instances<I, C> {
    // ── Pending registrations ─────────────────────────────────

    pub fn add_pending(&mut self, callback: Arc<C>) -> PendingToken {
        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);
        self.pending.insert(token, callback);
        token
    }

    pub fn take_pending(&mut self, token: PendingToken) -> Option<Arc<C>> {
        self.pending.remove(&token)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    // ── Entries ───────────────────────────────────────────────

    /// Make `id` dispatchable.  Refuses ids that are already live; the
    /// caller rules out the invalid sentinel.
    pub fn insert(
        &mut self,
        id: InstanceId,
        instance: I,
        callback: Arc<C>,
    ) -> Result<(), Occupied<I, C>> {
        if self.entries.contains_key(&id) {
            return Err(Occupied { instance, callback });
        }
        self.entries.insert(id, RegistryEntry { instance, callback });
        Ok(())
    }

    /// Remove `id`.  Absent ids are not an error.
    pub fn unregister(&mut self, id: InstanceId) -> Option<RegistryEntry<I, C>> {
        self.entries.remove(&id)
    }

    /// Remove every entry; returns how many were live.  Pending
    /// registrations are untouched.
    pub fn unregister_all(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    pub fn lookup(&self, id: InstanceId) -> Option<&I> {
        self.entries.get(&id).map(|e| &e.instance)
    }

    pub fn lookup_mut(&mut self, id: InstanceId) -> Option<&mut I> {
        self.entries.get_mut(&id).map(|e| &mut e.instance)
    }

    pub fn lookup_callback(&self, id: InstanceId) -> Option<&Arc<C>> {
        self.entries.get(&id).map(|e| &e.callback)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live ids in ascending order.
    pub fn ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
