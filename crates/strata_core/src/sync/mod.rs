//! # Shared Registry Access
//!
//! The registry is single-threaded by construction: systems get
//! `&mut Registry` and the tick runs to completion. Threads that feed it
//! (network receive, render) go through one lock.
//!
//! ```text
//! net thread ──apply_batch──┐
//!                           ├──> Mutex<Registry> ──run_tick──> tick thread
//! render thread ──snapshot──┘
//!
//! notifications: lock-free, read through a cloned receiver
//! ```

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::ecs::{NotificationReceiver, Registry};

/// Cloneable handle to a registry behind a mutex.
#[derive(Clone, Debug)]
pub struct SharedRegistry {
    inner: Arc<Mutex<Registry>>,
    notifications: NotificationReceiver,
}

impl SharedRegistry {
    /// Wraps a registry.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        let notifications = registry.notifications();
        Self {
            inner: Arc::new(Mutex::new(registry)),
            notifications,
        }
    }

    /// Exclusive access, blocking until available.
    pub fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock()
    }

    /// Exclusive access if nobody holds the lock.
    #[must_use]
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Registry>> {
        self.inner.try_lock()
    }

    /// Runs `f` under the lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Notification receiver, usable without taking the lock.
    #[must_use]
    pub fn notifications(&self) -> &NotificationReceiver {
        &self.notifications
    }
}
