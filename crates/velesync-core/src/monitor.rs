//! Binary mutual exclusion expressed as a guarded boolean.
//!
//! Semantically a binary semaphore, but written in the predicate-wait style
//! (suspend while `locked`) that [`RwLock`](crate::RwLock) builds on.

use crate::sync::Guarded;

/// A binary monitor lock.
///
/// # Examples
///
/// ```
/// use velesync_core::Monitor;
///
/// let monitor = Monitor::new();
/// monitor.lock();
/// assert!(!monitor.try_lock());
/// monitor.unlock();
/// ```
#[derive(Debug)]
pub struct Monitor {
    locked: Guarded<bool>,
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Monitor {
    /// Creates an unlocked monitor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            locked: Guarded::new(false),
        }
    }

    /// Suspends until the monitor is free, then takes it.
    pub fn lock(&self) {
        let guard = self.locked.lock();
        if *guard {
            tracing::trace!("monitor held, suspending");
        }
        let mut locked = self.locked.wait_while(guard, |locked| *locked);
        *locked = true;
    }

    /// Takes the monitor if it is free, without blocking.
    #[must_use]
    pub fn try_lock(&self) -> bool {
        let mut locked = self.locked.lock();
        if *locked {
            return false;
        }
        *locked = true;
        true
    }

    /// Frees the monitor and wakes one waiter.
    ///
    /// # Panics
    ///
    /// Panics if the monitor is not held.
    pub fn unlock(&self) {
        let mut locked = self.locked.lock();
        assert!(*locked, "Monitor::unlock called without a holder");
        *locked = false;
        drop(locked);
        self.locked.notify_one();
    }

    /// Takes the monitor and returns a guard that frees it on drop.
    pub fn guard(&self) -> MonitorGuard<'_> {
        self.lock();
        MonitorGuard { monitor: self }
    }

    /// Point-in-time read of the held flag.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        *self.locked.lock()
    }
}

/// Scoped holder of a [`Monitor`].
#[derive(Debug)]
#[must_use = "if unused the Monitor will immediately unlock"]
pub struct MonitorGuard<'a> {
    monitor: &'a Monitor,
}

impl Drop for MonitorGuard<'_> {
    fn drop(&mut self) {
        self.monitor.unlock();
    }
}
