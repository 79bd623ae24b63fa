//! Busy-wait mutual exclusion over a single atomic flag.
//!
//! The spinlock never suspends: a contending caller retries a
//! compare-and-swap until it wins. There is no queue and no fairness, so it
//! should only guard short critical sections.
//!
//! Failed attempts back off exponentially (up to [`MAX_BACKOFF_SHIFT`]
//! doublings of `spin_loop` hints) before yielding the time slice, which
//! keeps a heavily contended flag from saturating the cache line.

use crate::sync::{spin_hint, yield_now, AtomicBool, Ordering};

/// Upper bound on back-off doublings: at most `1 << 6` spin hints per retry.
pub const MAX_BACKOFF_SHIFT: u32 = 6;

/// A spinlock built on an atomic boolean.
///
/// `locked == true` implies exactly one holder. The flag only transitions
/// through compare-and-swap (`false -> true`, acquire ordering) in
/// [`lock`](Self::lock) and a release store in [`unlock`](Self::unlock).
///
/// # Examples
///
/// ```
/// use velesync_core::Spinlock;
///
/// let lock = Spinlock::new();
/// {
///     let _guard = lock.guard();
///     assert!(lock.is_locked());
/// }
/// assert!(!lock.is_locked());
/// ```
#[derive(Debug)]
pub struct Spinlock {
    locked: AtomicBool,
}

impl Default for Spinlock {
    fn default() -> Self {
        Self::new()
    }
}

impl Spinlock {
    /// Creates an unlocked spinlock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Spins until the lock is acquired.
    pub fn lock(&self) {
        let mut shift = 0;
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            // Wait for the flag to look free before retrying the CAS.
            while self.locked.load(Ordering::Relaxed) {
                if shift < MAX_BACKOFF_SHIFT {
                    for _ in 0..(1u32 << shift) {
                        spin_hint();
                    }
                    shift += 1;
                } else {
                    yield_now();
                }
            }
        }
    }

    /// Attempts to acquire the lock without spinning.
    ///
    /// Returns `true` if the caller now holds the lock.
    #[must_use]
    pub fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Releases the lock.
    ///
    /// Calling this without holding the lock is a contract violation; debug
    /// builds assert on it.
    pub fn unlock(&self) {
        let was_locked = self.locked.swap(false, Ordering::Release);
        debug_assert!(was_locked, "Spinlock::unlock called on an unlocked spinlock");
    }

    /// Acquires the lock and returns a guard that releases it on drop.
    pub fn guard(&self) -> SpinlockGuard<'_> {
        self.lock();
        SpinlockGuard { lock: self }
    }

    /// Point-in-time read of the flag.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

/// Scoped holder of a [`Spinlock`].
#[derive(Debug)]
#[must_use = "if unused the Spinlock will immediately unlock"]
pub struct SpinlockGuard<'a> {
    lock: &'a Spinlock,
}

impl Drop for SpinlockGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}
