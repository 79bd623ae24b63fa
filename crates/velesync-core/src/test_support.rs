//! Shared helpers for the primitive test modules.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Timeout for deadlock detection (if a scenario takes longer, likely deadlocked)
pub(crate) const DEADLOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs `scenario` on a helper thread and panics if it does not finish in time.
pub(crate) fn run_with_deadline<F>(name: &str, scenario: F)
where
    F: FnOnce() + Send + 'static,
{
    let completed = Arc::new(AtomicBool::new(false));
    let completed_clone = Arc::clone(&completed);

    let handle = thread::spawn(move || {
        scenario();
        completed_clone.store(true, Ordering::SeqCst);
    });

    let start = Instant::now();
    while !completed.load(Ordering::SeqCst) {
        if handle.is_finished() {
            break;
        }
        if start.elapsed() > DEADLOCK_TIMEOUT {
            panic!("DEADLOCK DETECTED: {name} did not complete within timeout");
        }
        thread::sleep(Duration::from_millis(5));
    }

    handle.join().expect("Scenario thread panicked");
}

/// Tracks how many threads are inside a critical section.
#[derive(Debug, Default)]
pub(crate) struct Occupancy {
    inside: AtomicUsize,
    peak: AtomicUsize,
}

impl Occupancy {
    pub(crate) fn enter(&self) -> usize {
        let now = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        now
    }

    pub(crate) fn leave(&self) {
        self.inside.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn current(&self) -> usize {
        self.inside.load(Ordering::SeqCst)
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Plain counter shared without synchronization of its own.
///
/// Only sound to touch while the primitive under test grants exclusive
/// access; lost updates show up as a wrong final total.
#[derive(Debug, Default)]
pub(crate) struct RacyCounter(std::cell::UnsafeCell<u64>);

// SAFETY: every access in the tests happens inside a critical section of the
// primitive under test, which is exactly the property being verified.
unsafe impl Sync for RacyCounter {}

impl RacyCounter {
    pub(crate) fn increment(&self) {
        // SAFETY: see the `Sync` impl above.
        unsafe {
            let value = self.0.get();
            let read = std::ptr::read_volatile(value);
            thread::yield_now();
            std::ptr::write_volatile(value, read + 1);
        }
    }

    pub(crate) fn get(&self) -> u64 {
        // SAFETY: see the `Sync` impl above.
        unsafe { std::ptr::read_volatile(self.0.get()) }
    }
}
