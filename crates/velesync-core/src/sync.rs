//! Synchronization building blocks with loom support for concurrency testing.
//!
//! The primitives in this crate are written against the aliases exported here
//! so that the same code runs on `parking_lot` in production and on loom's
//! mocked versions under `--cfg loom`.
//!
//! # Testing with Loom
//!
//! ```bash
//! RUSTFLAGS="--cfg loom" cargo test --features loom --test loom_tests
//! ```

// ============================================================================
// Atomics
// ============================================================================

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicBool, Ordering};

#[cfg(not(loom))]
pub(crate) use std::sync::atomic::{AtomicBool, Ordering};

// ============================================================================
// Spin hints
// ============================================================================

/// Hint issued on every failed spin attempt.
///
/// Loom cannot make progress through a busy loop unless the spinning thread
/// yields, so the model build maps the hint to a yield.
#[cfg(loom)]
#[inline]
pub(crate) fn spin_hint() {
    loom::thread::yield_now();
}

#[cfg(not(loom))]
#[inline]
pub(crate) fn spin_hint() {
    std::hint::spin_loop();
}

#[cfg(loom)]
#[inline]
pub(crate) fn yield_now() {
    loom::thread::yield_now();
}

#[cfg(not(loom))]
#[inline]
pub(crate) fn yield_now() {
    std::thread::yield_now();
}

// ============================================================================
// Guarded state (mutex + condition variable)
// ============================================================================

#[cfg(loom)]
pub(crate) type StateGuard<'a, T> = loom::sync::MutexGuard<'a, T>;

#[cfg(not(loom))]
pub(crate) type StateGuard<'a, T> = parking_lot::MutexGuard<'a, T>;

/// State protected by an exclusive lock, paired with a condition variable.
///
/// Every blocking primitive in the crate is a `Guarded<State>`: transitions
/// happen only while the guard is held, and [`Guarded::wait_while`] releases
/// the lock for the duration of the suspension.
#[derive(Debug)]
pub(crate) struct Guarded<T> {
    #[cfg(loom)]
    state: loom::sync::Mutex<T>,
    #[cfg(loom)]
    cond: loom::sync::Condvar,

    #[cfg(not(loom))]
    state: parking_lot::Mutex<T>,
    #[cfg(not(loom))]
    cond: parking_lot::Condvar,
}

impl<T> Guarded<T> {
    #[cfg(loom)]
    pub(crate) fn new(value: T) -> Self {
        Self {
            state: loom::sync::Mutex::new(value),
            cond: loom::sync::Condvar::new(),
        }
    }

    #[cfg(not(loom))]
    pub(crate) fn new(value: T) -> Self {
        Self {
            state: parking_lot::Mutex::new(value),
            cond: parking_lot::Condvar::new(),
        }
    }

    /// Acquires the internal lock.
    #[cfg(loom)]
    pub(crate) fn lock(&self) -> StateGuard<'_, T> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Acquires the internal lock.
    #[cfg(not(loom))]
    pub(crate) fn lock(&self) -> StateGuard<'_, T> {
        self.state.lock()
    }

    /// Suspends while `condition` holds, re-checking it on every wake-up.
    ///
    /// The lock is released while suspended and held again on return, so the
    /// caller observes `!condition` under the same guard it continues with.
    #[cfg(loom)]
    pub(crate) fn wait_while<'a, F>(
        &self,
        mut guard: StateGuard<'a, T>,
        mut condition: F,
    ) -> StateGuard<'a, T>
    where
        F: FnMut(&mut T) -> bool,
    {
        while condition(&mut *guard) {
            guard = self
                .cond
                .wait(guard)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
        guard
    }

    /// Suspends while `condition` holds, re-checking it on every wake-up.
    ///
    /// The lock is released while suspended and held again on return, so the
    /// caller observes `!condition` under the same guard it continues with.
    #[cfg(not(loom))]
    pub(crate) fn wait_while<'a, F>(
        &self,
        mut guard: StateGuard<'a, T>,
        mut condition: F,
    ) -> StateGuard<'a, T>
    where
        F: FnMut(&mut T) -> bool,
    {
        while condition(&mut *guard) {
            self.cond.wait(&mut guard);
        }
        guard
    }

    /// Wakes one suspended caller, if any.
    pub(crate) fn notify_one(&self) {
        self.cond.notify_one();
    }

    /// Wakes every suspended caller.
    pub(crate) fn notify_all(&self) {
        self.cond.notify_all();
    }
}
