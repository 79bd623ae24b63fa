//! Scenario runner: spawns the workers and collects their timings.
//!
//! Each scenario hands every worker the same primitive instance and the same
//! [`OutputSink`]. A worker starts its clock, passes the primitive, writes
//! `thread {id}: {payload}` and stops its clock. `range_search` is the odd
//! one out: its workers share nothing but a read-only slice.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use velesync_core::{Barrier, BarrierWaitResult, Monitor, RwLock, Semaphore, Spinlock};

use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use crate::search::{chunk_bounds, find_in_range, random_dates, SearchSummary};
use crate::sink::OutputSink;
use crate::workload::{random_hold, random_string, Role};

/// Which primitive guards the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Busy-wait [`Spinlock`] around the write.
    Spinlock,
    /// [`Semaphore`] with `semaphore.permits` permits around the write.
    Semaphore,
    /// [`Monitor`] around the write: a busy flag waited on through a
    /// condition variable.
    Monitor,
    /// All workers meet at a [`Barrier`] before writing.
    Barrier,
    /// `parking_lot::Mutex` baseline around the write.
    Mutex,
    /// Readers and writers sharing a value under a [`RwLock`].
    Rwlock,
    /// Date-range search, single-threaded against fixed chunks.
    RangeSearch,
}

impl Scenario {
    /// Every scenario, in display order.
    pub const ALL: [Scenario; 7] = [
        Self::Spinlock,
        Self::Semaphore,
        Self::Monitor,
        Self::Barrier,
        Self::Mutex,
        Self::Rwlock,
        Self::RangeSearch,
    ];

    /// Returns the lowercase scenario name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spinlock => "spinlock",
            Self::Semaphore => "semaphore",
            Self::Monitor => "monitor",
            Self::Barrier => "barrier",
            Self::Mutex => "mutex",
            Self::Rwlock => "rwlock",
            Self::RangeSearch => "range_search",
        }
    }

    /// Whether the write section admits one worker at a time.
    #[must_use]
    pub const fn is_exclusive(self) -> bool {
        matches!(self, Self::Spinlock | Self::Monitor | Self::Barrier | Self::Mutex)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.as_str().eq_ignore_ascii_case(&name))
            .ok_or_else(|| Error::InvalidWorkload(format!("unknown scenario '{s}'")))
    }
}

/// What a worker did once admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum WorkerOutcome {
    /// Wrote its payload line.
    Wrote,
    /// Passed a completed barrier generation, then wrote.
    RendezvousCompleted,
    /// Was released by a broken barrier, then wrote.
    BarrierBroken,
    /// Broke the barrier instead of waiting, then wrote.
    BrokeBarrier,
    /// Read the shared value.
    Read {
        /// Value observed.
        value: u64,
    },
    /// Replaced the shared value.
    Updated {
        /// Value stored.
        value: u64,
    },
    /// Scanned one chunk of the date set.
    Searched {
        /// Dates in range within the chunk.
        matches: usize,
    },
}

impl fmt::Display for WorkerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wrote => f.write_str("wrote"),
            Self::RendezvousCompleted => f.write_str("rendezvous completed"),
            Self::BarrierBroken => f.write_str("barrier broken"),
            Self::BrokeBarrier => f.write_str("broke barrier"),
            Self::Read { value } => write!(f, "read {value}"),
            Self::Updated { value } => write!(f, "wrote {value}"),
            Self::Searched { matches } => write!(f, "found {matches}"),
        }
    }
}

/// Timing of one worker, from start to finished write.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkerTiming {
    /// Worker index.
    pub id: usize,
    /// Wall-clock duration in seconds.
    pub elapsed_secs: f64,
    /// What the worker did.
    pub outcome: WorkerOutcome,
}

/// Aggregated result of one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Scenario that ran.
    pub scenario: Scenario,
    /// Number of workers.
    pub threads: usize,
    /// Per-worker timings, ordered by worker id.
    pub timings: Vec<WorkerTiming>,
    /// Most workers seen inside the write section at once.
    pub peak_concurrency: usize,
    /// Lines written to the sink.
    pub lines_written: usize,
    /// Exclusion violations detected by the readers-writer scenario, or a
    /// match-count disagreement in the range search.
    pub violations: usize,
    /// Total wall-clock time in seconds.
    pub total_secs: f64,
    /// Both passes of the range search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchSummary>,
}

impl RunReport {
    /// Fastest worker, in seconds.
    #[must_use]
    pub fn min_secs(&self) -> f64 {
        self.timings
            .iter()
            .map(|t| t.elapsed_secs)
            .fold(f64::INFINITY, f64::min)
    }

    /// Slowest worker, in seconds.
    #[must_use]
    pub fn max_secs(&self) -> f64 {
        self.timings
            .iter()
            .map(|t| t.elapsed_secs)
            .fold(0.0, f64::max)
    }

    /// Mean worker time, in seconds.
    #[must_use]
    pub fn mean_secs(&self) -> f64 {
        if self.timings.is_empty() {
            return 0.0;
        }
        self.timings.iter().map(|t| t.elapsed_secs).sum::<f64>() / self.timings.len() as f64
    }
}

/// Runs `scenario` with the given configuration, writing to `sink`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, a primitive rejects its
/// parameters, the sink fails, or a worker panics.
pub fn run(config: &HarnessConfig, scenario: Scenario, sink: &OutputSink) -> Result<RunReport> {
    config.validate()?;
    let threads = if scenario == Scenario::Rwlock {
        config.effective_roles().len()
    } else {
        config.workload.threads
    };
    if threads == 0 {
        return Err(Error::InvalidWorkload(
            "at least one worker is required".to_string(),
        ));
    }

    info!(%scenario, threads, "starting scenario");
    let start = Instant::now();
    let mut search = None;

    let (timings, violations) = match scenario {
        Scenario::Spinlock => {
            let lock = Spinlock::new();
            let timings = spawn_workers(threads, |id| {
                timed(id, || {
                    let _guard = lock.guard();
                    write_payload(sink, id, config.workload.symbols)?;
                    Ok(WorkerOutcome::Wrote)
                })
            })?;
            (timings, 0)
        }
        Scenario::Semaphore => {
            let semaphore = Semaphore::new(config.semaphore.permits);
            let timings = spawn_workers(threads, |id| {
                timed(id, || {
                    let _permit = semaphore.permit();
                    write_payload(sink, id, config.workload.symbols)?;
                    Ok(WorkerOutcome::Wrote)
                })
            })?;
            (timings, 0)
        }
        Scenario::Monitor => {
            let monitor = Monitor::new();
            let timings = spawn_workers(threads, |id| {
                timed(id, || {
                    let _guard = monitor.guard();
                    write_payload(sink, id, config.workload.symbols)?;
                    Ok(WorkerOutcome::Wrote)
                })
            })?;
            (timings, 0)
        }
        Scenario::Barrier => {
            let barrier = Barrier::new(threads)?;
            let arrivals = AtomicUsize::new(0);
            let output = parking_lot::Mutex::new(());
            let timings = spawn_workers(threads, |id| {
                timed(id, || {
                    let arrival = arrivals.fetch_add(1, Ordering::SeqCst);
                    let outcome = if config.barrier.break_after == Some(arrival) {
                        debug!(worker = id, arrival, "breaking barrier");
                        barrier.break_barrier();
                        WorkerOutcome::BrokeBarrier
                    } else {
                        match barrier.wait() {
                            BarrierWaitResult::Completed => WorkerOutcome::RendezvousCompleted,
                            BarrierWaitResult::Broken => WorkerOutcome::BarrierBroken,
                        }
                    };
                    let _guard = output.lock();
                    write_payload(sink, id, config.workload.symbols)?;
                    Ok(outcome)
                })
            })?;
            (timings, 0)
        }
        Scenario::Mutex => {
            let lock = parking_lot::Mutex::new(());
            let timings = spawn_workers(threads, |id| {
                timed(id, || {
                    let _guard = lock.lock();
                    write_payload(sink, id, config.workload.symbols)?;
                    Ok(WorkerOutcome::Wrote)
                })
            })?;
            (timings, 0)
        }
        Scenario::Rwlock => run_readers_writers(config, sink)?,
        Scenario::RangeSearch => {
            let (timings, summary) = run_range_search(config, threads, sink)?;
            let violations = usize::from(!summary.counts_match());
            search = Some(summary);
            (timings, violations)
        }
    };

    sink.flush()?;
    let report = RunReport {
        scenario,
        threads,
        timings,
        peak_concurrency: sink.peak_concurrency(),
        lines_written: sink.lines_written(),
        violations,
        total_secs: start.elapsed().as_secs_f64(),
        search,
    };

    if scenario.is_exclusive() && report.peak_concurrency > 1 {
        warn!(
            %scenario,
            peak = report.peak_concurrency,
            "write section was entered concurrently"
        );
    }
    info!(
        %scenario,
        total_secs = report.total_secs,
        mean_secs = report.mean_secs(),
        "scenario finished"
    );
    Ok(report)
}

/// Shared state of the readers-writer scenario.
///
/// The flags mirror who is inside the lock so that any overlap the lock
/// should have prevented is counted as a violation.
#[derive(Debug, Default)]
pub(crate) struct SharedValue {
    value: AtomicU64,
    readers_inside: AtomicUsize,
    writer_inside: AtomicBool,
    violations: AtomicUsize,
}

impl SharedValue {
    pub(crate) fn new(initial: u64) -> Self {
        Self {
            value: AtomicU64::new(initial),
            ..Self::default()
        }
    }

    pub(crate) fn violations(&self) -> usize {
        self.violations.load(Ordering::SeqCst)
    }

    pub(crate) fn readers_inside(&self) -> usize {
        self.readers_inside.load(Ordering::SeqCst)
    }

    pub(crate) fn writer_inside(&self) -> bool {
        self.writer_inside.load(Ordering::SeqCst)
    }

    /// Reads the value under `lock.read()` and logs it.
    ///
    /// The bookkeeping is restored before a sink error is returned.
    pub(crate) fn read(
        &self,
        lock: &RwLock,
        sink: &OutputSink,
        id: usize,
        hold: Duration,
    ) -> Result<WorkerOutcome> {
        let _guard = lock.read();
        self.readers_inside.fetch_add(1, Ordering::SeqCst);
        if self.writer_inside.load(Ordering::SeqCst) {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
        thread::sleep(hold);
        let value = self.value.load(Ordering::SeqCst);
        let written = sink.write_line(&format!("reader {id} read: {value}"));
        self.readers_inside.fetch_sub(1, Ordering::SeqCst);
        written?;
        Ok(WorkerOutcome::Read { value })
    }

    /// Stores `value` under `lock.write()` and logs it.
    ///
    /// The bookkeeping is restored before a sink error is returned.
    pub(crate) fn write(
        &self,
        lock: &RwLock,
        sink: &OutputSink,
        id: usize,
        value: u64,
        hold: Duration,
    ) -> Result<WorkerOutcome> {
        let _guard = lock.write();
        if self.writer_inside.swap(true, Ordering::SeqCst)
            || self.readers_inside.load(Ordering::SeqCst) != 0
        {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
        self.value.store(value, Ordering::SeqCst);
        let written = sink.write_line(&format!("writer {id} wrote: {value}"));
        if written.is_ok() {
            thread::sleep(hold);
        }
        self.writer_inside.store(false, Ordering::SeqCst);
        written?;
        Ok(WorkerOutcome::Updated { value })
    }
}

fn run_readers_writers(
    config: &HarnessConfig,
    sink: &OutputSink,
) -> Result<(Vec<WorkerTiming>, usize)> {
    let roles = config.effective_roles();
    let lock = RwLock::new(config.rwlock.priority);
    let shared = SharedValue::new(10);
    let (min_ms, max_ms) = (config.rwlock.min_hold_ms, config.rwlock.max_hold_ms);
    debug!(priority = %lock.priority(), workers = roles.len(), "readers-writer scenario");

    let timings = spawn_workers(roles.len(), |id| {
        timed(id, || {
            let hold = random_hold(min_ms, max_ms);
            match roles[id] {
                Role::Reader => shared.read(&lock, sink, id, hold),
                Role::Writer => {
                    let value = u64::from(rand::thread_rng().gen::<u32>());
                    shared.write(&lock, sink, id, value, hold)
                }
            }
        })
    })?;

    let violations = shared.violations();
    if violations > 0 {
        warn!(violations, "readers-writer exclusion violated");
    }
    Ok((timings, violations))
}

/// Scans the same random dates on this thread, then in `chunks` workers.
fn run_range_search(
    config: &HarnessConfig,
    chunks: usize,
    sink: &OutputSink,
) -> Result<(Vec<WorkerTiming>, SearchSummary)> {
    let (from, to) = (config.search.from, config.search.to);
    let dates = random_dates(config.search.records);
    debug!(records = dates.len(), %from, %to, chunks, "generated dates");

    let start = Instant::now();
    let sequential_matches = find_in_range(&dates, from, to).len();
    let sequential_secs = start.elapsed().as_secs_f64();

    let start = Instant::now();
    let timings = spawn_workers(chunks, |id| {
        timed(id, || {
            let chunk = &dates[chunk_bounds(dates.len(), chunks, id)];
            let matches = find_in_range(chunk, from, to).len();
            Ok(WorkerOutcome::Searched { matches })
        })
    })?;
    let parallel_secs = start.elapsed().as_secs_f64();

    let mut parallel_matches = 0;
    for timing in &timings {
        if let WorkerOutcome::Searched { matches } = timing.outcome {
            sink.write_line(&format!("thread {}: {matches} dates in range", timing.id))?;
            parallel_matches += matches;
        }
    }

    let summary = SearchSummary {
        records: dates.len(),
        from,
        to,
        sequential_matches,
        parallel_matches,
        sequential_secs,
        parallel_secs,
    };
    info!(
        sequential_matches,
        parallel_matches,
        sequential_secs,
        parallel_secs,
        "range search finished"
    );
    if !summary.counts_match() {
        warn!(sequential_matches, parallel_matches, "range search passes disagree");
    }
    Ok((timings, summary))
}

fn write_payload(sink: &OutputSink, id: usize, symbols: usize) -> std::io::Result<()> {
    sink.write_line(&format!("thread {id}: {}", random_string(symbols)))
}

/// Runs `work` and measures it.
fn timed<F>(id: usize, work: F) -> Result<WorkerTiming>
where
    F: FnOnce() -> Result<WorkerOutcome>,
{
    let start = Instant::now();
    let outcome = work()?;
    let elapsed = start.elapsed();
    info!(worker = id, elapsed_secs = elapsed.as_secs_f64(), %outcome, "worker finished");
    Ok(WorkerTiming {
        id,
        elapsed_secs: elapsed.as_secs_f64(),
        outcome,
    })
}

/// Spawns `count` scoped workers and joins them in id order.
fn spawn_workers<F>(count: usize, worker: F) -> Result<Vec<WorkerTiming>>
where
    F: Fn(usize) -> Result<WorkerTiming> + Sync,
{
    thread::scope(|scope| {
        let worker = &worker;
        let handles: Vec<_> = (0..count)
            .map(|id| (id, scope.spawn(move || worker(id))))
            .collect();

        let mut timings = Vec::with_capacity(count);
        let mut first_error = None;
        for (id, handle) in handles {
            match handle.join() {
                Ok(Ok(timing)) => timings.push(timing),
                Ok(Err(err)) => {
                    first_error.get_or_insert(err);
                }
                Err(_) => {
                    first_error.get_or_insert(Error::WorkerPanicked(id));
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(timings),
        }
    })
}
