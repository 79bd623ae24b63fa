//! Readers-writer lock with a configurable admission policy.
//!
//! The lock moves between `Idle`, `Reading(n)` and `Writing`. Any number of
//! readers may overlap; a writer excludes everyone. Which side is favored
//! when both are queued is decided by the [`Priority`] fixed at
//! construction:
//!
//! | Policy | New readers while a writer waits | Writer while readers queue |
//! |--------|----------------------------------|----------------------------|
//! | [`Priority::ReaderPriority`] | admitted | held back until no reader waits |
//! | [`Priority::WriterPriority`] | held back when no reader is active | admitted once readers drain |
//! | [`Priority::Fair`] | queued by arrival ticket | queued by arrival ticket |
//!
//! # Starvation
//!
//! Under `ReaderPriority` a waiting writer refuses to wake while any reader
//! is registered as waiting, and `waiting_readers` can grow after the writer
//! started waiting. A continuous stream of readers can therefore delay a
//! writer indefinitely. Exclusion still holds; only progress is lost.
//! `WriterPriority` mirrors this for fresh readers behind queued writers.
//! `Fair` admits requests strictly in arrival order (consecutive readers
//! share the lock) and bounds both kinds of starvation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::sync::{Guarded, StateGuard};

/// Admission policy of a [`RwLock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Readers are favored; writers may starve (default).
    #[default]
    ReaderPriority,
    /// Queued writers hold back new reader waves.
    WriterPriority,
    /// Ticket-based FIFO admission across both classes.
    Fair,
}

impl Priority {
    /// Returns the snake_case name used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReaderPriority => "reader_priority",
            Self::WriterPriority => "writer_priority",
            Self::Fair => "fair",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "reader_priority" | "reader" | "readers" => Ok(Self::ReaderPriority),
            "writer_priority" | "writer" | "writers" => Ok(Self::WriterPriority),
            "fair" | "fifo" => Ok(Self::Fair),
            _ => Err(Error::UnknownPriority(s.to_string())),
        }
    }
}

/// Shared counters, only touched while the internal lock is held.
///
/// `writing` implies `active_readers == 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RwState {
    pub(crate) active_readers: usize,
    pub(crate) waiting_readers: usize,
    pub(crate) waiting_writers: usize,
    pub(crate) writing: bool,
    /// Next arrival ticket (`Fair` only).
    next_ticket: u64,
    /// Ticket allowed to be admitted next (`Fair` only).
    now_serving: u64,
}

impl RwState {
    fn take_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.wrapping_add(1);
        ticket
    }

    fn has_waiters(&self) -> bool {
        self.waiting_readers != 0 || self.waiting_writers != 0
    }
}

/// A readers-writer lock that guards no data of its own.
///
/// Callers bracket their critical sections either with the raw
/// `acquire_*`/`release_*` pairs or with the scoped [`read`](Self::read) and
/// [`write`](Self::write) guards.
///
/// # Examples
///
/// ```
/// use velesync_core::{Priority, RwLock};
///
/// let lock = RwLock::new(Priority::WriterPriority);
/// {
///     let _r1 = lock.read();
///     let _r2 = lock.read();
/// }
/// let _w = lock.write();
/// ```
#[derive(Debug)]
pub struct RwLock {
    priority: Priority,
    state: Guarded<RwState>,
}

impl Default for RwLock {
    fn default() -> Self {
        Self::new(Priority::default())
    }
}

impl RwLock {
    /// Creates an idle lock with the given admission policy.
    #[must_use]
    pub fn new(priority: Priority) -> Self {
        Self {
            priority,
            state: Guarded::new(RwState::default()),
        }
    }

    /// The admission policy chosen at construction.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    // ------------------------------------------------------------------------
    // Readers
    // ------------------------------------------------------------------------

    /// Blocks until the caller may read, then registers it as active.
    pub fn acquire_read(&self) {
        let state = self.state.lock();
        let mut state = match self.priority {
            Priority::ReaderPriority | Priority::WriterPriority => self.admit_reader(state),
            Priority::Fair => self.admit_reader_fair(state),
        };
        debug_assert!(!state.writing);
        state.active_readers += 1;

        if self.priority == Priority::Fair {
            state.now_serving = state.now_serving.wrapping_add(1);
            let notify = state.has_waiters();
            drop(state);
            // The next ticket may belong to a reader that can join us.
            if notify {
                self.state.notify_all();
            }
        }
    }

    fn admit_reader<'a>(&self, mut state: StateGuard<'a, RwState>) -> StateGuard<'a, RwState> {
        if state.writing {
            tracing::trace!(priority = %self.priority, "reader waiting for writer");
            state.waiting_readers += 1;
            state = self.state.wait_while(state, |s| s.writing);
            state.waiting_readers -= 1;
        }

        // Fresh reader waves queue behind writers; running readers are not evicted.
        if self.priority == Priority::WriterPriority
            && state.active_readers == 0
            && state.waiting_writers != 0
        {
            tracing::trace!(
                waiting_writers = state.waiting_writers,
                "reader yielding to queued writers"
            );
            state.waiting_readers += 1;
            state = self
                .state
                .wait_while(state, |s| s.writing || s.waiting_writers != 0);
            state.waiting_readers -= 1;
        }
        state
    }

    fn admit_reader_fair<'a>(
        &self,
        mut state: StateGuard<'a, RwState>,
    ) -> StateGuard<'a, RwState> {
        let ticket = state.take_ticket();
        if state.now_serving != ticket || state.writing {
            tracing::trace!(ticket, now_serving = state.now_serving, "reader queued");
            state.waiting_readers += 1;
            state = self
                .state
                .wait_while(state, |s| s.now_serving != ticket || s.writing);
            state.waiting_readers -= 1;
        }
        state
    }

    /// Unregisters an active reader; the last one out wakes all waiters.
    ///
    /// # Panics
    ///
    /// Panics if no reader is active.
    pub fn release_read(&self) {
        let mut state = self.state.lock();
        assert!(
            state.active_readers > 0,
            "RwLock::release_read called with no active reader"
        );
        state.active_readers -= 1;
        let drained = state.active_readers == 0;
        drop(state);
        if drained {
            self.state.notify_all();
        }
    }

    /// Acquires shared access and returns a guard that releases it on drop.
    pub fn read(&self) -> ReadGuard<'_> {
        self.acquire_read();
        ReadGuard { lock: self }
    }

    // ------------------------------------------------------------------------
    // Writers
    // ------------------------------------------------------------------------

    /// Blocks until the caller may write, then marks the lock as writing.
    pub fn acquire_write(&self) {
        let mut state = self.state.lock();

        if self.priority == Priority::Fair {
            let ticket = state.take_ticket();
            if state.now_serving != ticket || state.writing || state.active_readers != 0 {
                tracing::trace!(ticket, now_serving = state.now_serving, "writer queued");
                state.waiting_writers += 1;
                state = self.state.wait_while(state, |s| {
                    s.now_serving != ticket || s.writing || s.active_readers != 0
                });
                state.waiting_writers -= 1;
            }
            state.now_serving = state.now_serving.wrapping_add(1);
        } else {
            let reader_priority = self.priority == Priority::ReaderPriority;
            let blocked = |s: &mut RwState| {
                (reader_priority && s.waiting_readers != 0) || s.writing || s.active_readers != 0
            };
            if blocked(&mut *state) {
                tracing::trace!(
                    priority = %self.priority,
                    active_readers = state.active_readers,
                    waiting_readers = state.waiting_readers,
                    "writer waiting"
                );
                state.waiting_writers += 1;
                state = self.state.wait_while(state, blocked);
                state.waiting_writers -= 1;
            }
        }

        debug_assert_eq!(state.active_readers, 0);
        state.writing = true;
    }

    /// Clears the writing flag and wakes all waiters.
    ///
    /// Readers and writers race to re-check their own predicates; no winner
    /// is picked here.
    ///
    /// # Panics
    ///
    /// Panics if the lock is not held for writing.
    pub fn release_write(&self) {
        let mut state = self.state.lock();
        assert!(
            state.writing,
            "RwLock::release_write called while not writing"
        );
        state.writing = false;
        drop(state);
        self.state.notify_all();
    }

    /// Acquires exclusive access and returns a guard that releases it on drop.
    pub fn write(&self) -> WriteGuard<'_> {
        self.acquire_write();
        WriteGuard { lock: self }
    }

    /// Copy of the internal counters, for tests.
    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> RwState {
        *self.state.lock()
    }
}

/// Scoped shared access to a [`RwLock`].
#[derive(Debug)]
#[must_use = "if unused the read lock will immediately be released"]
pub struct ReadGuard<'a> {
    lock: &'a RwLock,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

/// Scoped exclusive access to a [`RwLock`].
#[derive(Debug)]
#[must_use = "if unused the write lock will immediately be released"]
pub struct WriteGuard<'a> {
    lock: &'a RwLock,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_write();
    }
}
