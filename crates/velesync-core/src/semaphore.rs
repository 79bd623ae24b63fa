//! Counting semaphore with blocking acquire.
//!
//! Permits carry no ownership: any thread may call
//! [`release`](Semaphore::release), including one that never acquired.
//! Waiters are not served in FIFO order.

use crate::sync::Guarded;

/// A counting semaphore.
///
/// # Examples
///
/// ```
/// use velesync_core::Semaphore;
///
/// let sem = Semaphore::new(2);
/// let _a = sem.permit();
/// let _b = sem.permit();
/// assert!(!sem.try_acquire());
/// ```
#[derive(Debug)]
pub struct Semaphore {
    available: Guarded<usize>,
}

impl Semaphore {
    /// Creates a semaphore holding `permits` permits.
    ///
    /// Zero is valid: every [`acquire`](Self::acquire) then blocks until some
    /// thread calls [`release`](Self::release).
    #[must_use]
    pub fn new(permits: usize) -> Self {
        Self {
            available: Guarded::new(permits),
        }
    }

    /// Blocks until a permit is available, then takes it.
    pub fn acquire(&self) {
        let guard = self.available.lock();
        if *guard == 0 {
            tracing::trace!("semaphore exhausted, suspending");
        }
        let mut available = self.available.wait_while(guard, |available| *available == 0);
        *available -= 1;
    }

    /// Takes a permit if one is available, without blocking.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        let mut available = self.available.lock();
        if *available == 0 {
            return false;
        }
        *available -= 1;
        true
    }

    /// Returns a permit and wakes one waiter.
    ///
    /// # Panics
    ///
    /// Panics if the permit count would overflow `usize`.
    pub fn release(&self) {
        let mut available = self.available.lock();
        assert!(*available < usize::MAX, "Semaphore permit count overflow");
        *available += 1;
        drop(available);
        self.available.notify_one();
    }

    /// Acquires a permit and returns a guard that releases it on drop.
    pub fn permit(&self) -> SemaphorePermit<'_> {
        self.acquire();
        SemaphorePermit { semaphore: self }
    }

    /// Point-in-time count of available permits.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        *self.available.lock()
    }
}

/// Scoped holder of one [`Semaphore`] permit.
#[derive(Debug)]
#[must_use = "if unused the permit will immediately be released"]
pub struct SemaphorePermit<'a> {
    semaphore: &'a Semaphore,
}

impl Drop for SemaphorePermit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}
