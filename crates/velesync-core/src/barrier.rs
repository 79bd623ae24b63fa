//! Cyclic rendezvous barrier with a one-shot break.
//!
//! A barrier releases its waiters each time `party_size` callers have
//! arrived, then starts a new generation. [`Barrier::break_barrier`] opens
//! it permanently: current waiters are released and every later
//! [`Barrier::wait`] passes straight through.
//!
//! # Generations
//!
//! Waiters block on the generation number they arrived in rather than on the
//! arrival count, so a spurious wake-up cannot release a waiter early and a
//! caller arriving after the trip can never be admitted into the generation
//! that just completed.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sync::Guarded;

/// Outcome of a [`Barrier::wait`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[must_use = "a released wait may mean the barrier broke instead of completing"]
pub enum BarrierWaitResult {
    /// All parties of the caller's generation arrived.
    Completed,
    /// The barrier was broken before (or while) the caller waited.
    Broken,
}

impl BarrierWaitResult {
    /// Returns `true` if the rendezvous completed.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns `true` if the caller was released by a break.
    #[must_use]
    pub const fn is_broken(self) -> bool {
        matches!(self, Self::Broken)
    }
}

#[derive(Debug)]
struct BarrierState {
    waiting: usize,
    generation: u64,
    broken: bool,
}

/// A reusable barrier for a fixed number of parties.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use velesync_core::{Barrier, BarrierWaitResult};
///
/// let barrier = Arc::new(Barrier::new(3).unwrap());
/// let handles: Vec<_> = (0..3)
///     .map(|_| {
///         let barrier = Arc::clone(&barrier);
///         thread::spawn(move || barrier.wait())
///     })
///     .collect();
///
/// for handle in handles {
///     assert_eq!(handle.join().unwrap(), BarrierWaitResult::Completed);
/// }
/// ```
#[derive(Debug)]
pub struct Barrier {
    party_size: usize,
    state: Guarded<BarrierState>,
}

impl Barrier {
    /// Creates a barrier that trips once `party_size` callers are waiting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPartySize`] if `party_size` is zero.
    pub fn new(party_size: usize) -> Result<Self> {
        if party_size == 0 {
            return Err(Error::InvalidPartySize(party_size));
        }
        Ok(Self {
            party_size,
            state: Guarded::new(BarrierState {
                waiting: 0,
                generation: 0,
                broken: false,
            }),
        })
    }

    /// Number of parties required for each rendezvous.
    #[must_use]
    pub fn party_size(&self) -> usize {
        self.party_size
    }

    /// Waits until `party_size` callers have arrived or the barrier breaks.
    ///
    /// Returns immediately with [`BarrierWaitResult::Broken`] once the
    /// barrier is broken.
    pub fn wait(&self) -> BarrierWaitResult {
        let mut state = self.state.lock();
        if state.broken {
            return BarrierWaitResult::Broken;
        }

        state.waiting += 1;
        if state.waiting == self.party_size {
            state.waiting = 0;
            state.generation = state.generation.wrapping_add(1);
            tracing::debug!(
                generation = state.generation,
                parties = self.party_size,
                "barrier tripped"
            );
            drop(state);
            self.state.notify_all();
            return BarrierWaitResult::Completed;
        }

        let generation = state.generation;
        tracing::trace!(
            waiting = state.waiting,
            parties = self.party_size,
            "waiting at barrier"
        );
        let state = self.state.wait_while(state, |s| {
            s.generation == generation && !s.broken
        });

        if state.generation == generation {
            BarrierWaitResult::Broken
        } else {
            BarrierWaitResult::Completed
        }
    }

    /// Breaks the barrier permanently and releases all current waiters.
    ///
    /// Breaking an already broken barrier has no further effect.
    pub fn break_barrier(&self) {
        let mut state = self.state.lock();
        if state.broken {
            return;
        }
        state.broken = true;
        tracing::debug!(released = state.waiting, "barrier broken");
        state.waiting = 0;
        drop(state);
        self.state.notify_all();
    }

    /// Point-in-time read of the broken flag. Once `true`, stays `true`.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.state.lock().broken
    }
}
