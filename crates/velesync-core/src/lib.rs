//! # `VelesSync` Core
//!
//! Thread-synchronization primitives for preemptible OS threads.
//!
//! ## Primitives
//!
//! - **[`Spinlock`]**: busy-wait mutual exclusion over one atomic flag
//! - **[`Semaphore`]**: counting gate with blocking acquire
//! - **[`Monitor`]**: binary lock in predicate-wait style
//! - **[`Barrier`]**: cyclic rendezvous with a one-shot break
//! - **[`RwLock`]**: readers-writer lock with reader, writer or fair priority
//!
//! Every blocking primitive keeps its state behind an internal exclusive lock
//! and suspends callers on a condition variable, never holding the internal
//! lock while blocked. Only the spinlock busy-waits.
//!
//! None of the primitives are `Clone`: share them by reference or `Arc`.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//! use velesync_core::{Priority, RwLock, Semaphore};
//!
//! let pool = Arc::new(Semaphore::new(2));
//! let lock = Arc::new(RwLock::new(Priority::WriterPriority));
//!
//! let workers: Vec<_> = (0..4)
//!     .map(|i| {
//!         let pool = Arc::clone(&pool);
//!         let lock = Arc::clone(&lock);
//!         thread::spawn(move || {
//!             let _permit = pool.permit();
//!             if i % 2 == 0 {
//!                 let _read = lock.read();
//!             } else {
//!                 let _write = lock.write();
//!             }
//!         })
//!     })
//!     .collect();
//!
//! for worker in workers {
//!     worker.join().unwrap();
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::manual_assert)]

pub mod barrier;
pub mod error;
pub mod monitor;
pub mod rwlock;
pub mod semaphore;
pub mod spinlock;
mod sync;
#[cfg(test)]
mod test_support;

pub use barrier::{Barrier, BarrierWaitResult};
pub use error::{Error, Result};
pub use monitor::{Monitor, MonitorGuard};
pub use rwlock::{Priority, ReadGuard, RwLock, WriteGuard};
pub use semaphore::{Semaphore, SemaphorePermit};
pub use spinlock::{Spinlock, SpinlockGuard};
