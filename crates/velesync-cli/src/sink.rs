//! Shared output sink the workers write their lines to.
//!
//! The sink is an explicitly passed handle, never process-wide state. The
//! primitive under test decides who may enter the write section; the sink
//! counts how many writers it actually saw at once so a run can report
//! whether that primitive held.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

/// Line-oriented, thread-safe output sink.
pub struct OutputSink {
    writer: Mutex<Box<dyn Write + Send>>,
    inside: AtomicUsize,
    peak: AtomicUsize,
    lines: AtomicUsize,
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink")
            .field("peak_concurrency", &self.peak_concurrency())
            .field("lines_written", &self.lines_written())
            .finish_non_exhaustive()
    }
}

impl OutputSink {
    /// Creates (or truncates) `path` and writes through a buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    /// Wraps an arbitrary writer.
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            inside: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            lines: AtomicUsize::new(0),
        }
    }

    /// Writes one line.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let now = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let result = writeln!(self.writer.lock(), "{line}");

        self.inside.fetch_sub(1, Ordering::SeqCst);
        if result.is_ok() {
            self.lines.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    /// Flushes buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn flush(&self) -> io::Result<()> {
        self.writer.lock().flush()
    }

    /// Largest number of callers seen inside [`write_line`](Self::write_line) at once.
    #[must_use]
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Number of lines written successfully.
    #[must_use]
    pub fn lines_written(&self) -> usize {
        self.lines.load(Ordering::Relaxed)
    }
}
