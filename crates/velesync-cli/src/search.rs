//! Date-range search over a random data set.
//!
//! The `range_search` scenario scans the same dates twice: once on the
//! calling thread and once split into fixed chunks, one per worker. Both
//! passes must agree on the number of matches.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Calendar date ordered by year, then month, then day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Date {
    year: u16,
    month: u8,
    day: u8,
}

/// Default lower bound of the search range.
pub const DEFAULT_FROM: Date = Date {
    year: 2000,
    month: 1,
    day: 1,
};

/// Default upper bound of the search range.
pub const DEFAULT_TO: Date = Date {
    year: 2020,
    month: 12,
    day: 31,
};

impl Date {
    /// Builds a date, rejecting months outside 1-12 and days outside 1-31.
    #[must_use]
    pub fn new(year: u16, month: u8, day: u8) -> Option<Self> {
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }
        Some(Self { year, month, day })
    }

    /// Random date between 1900 and 2100. Days stop at 28 in February and
    /// at 30 elsewhere.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let year = rng.gen_range(1900..=2100);
        let month = rng.gen_range(1..=12);
        let last_day = if month == 2 { 28 } else { 30 };
        let day = rng.gen_range(1..=31).min(last_day);
        Self { year, month, day }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for Date {
    type Err = String;

    /// Parses `YYYY-MM-DD`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid date '{s}', expected YYYY-MM-DD");
        let mut parts = s.trim().splitn(3, '-');
        let mut next = || parts.next().ok_or_else(invalid);
        let year = next()?.parse().map_err(|_| invalid())?;
        let month = next()?.parse().map_err(|_| invalid())?;
        let day = next()?.parse().map_err(|_| invalid())?;
        Self::new(year, month, day).ok_or_else(invalid)
    }
}

impl TryFrom<String> for Date {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Date> for String {
    fn from(date: Date) -> Self {
        date.to_string()
    }
}

/// Generates `count` random dates.
#[must_use]
pub fn random_dates(count: usize) -> Vec<Date> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| Date::random(&mut rng)).collect()
}

/// Dates within `from..=to`, in input order.
#[must_use]
pub fn find_in_range(dates: &[Date], from: Date, to: Date) -> Vec<Date> {
    dates
        .iter()
        .copied()
        .filter(|date| (from..=to).contains(date))
        .collect()
}

/// Index range of chunk `index` when `len` items are split into `chunks`.
///
/// Chunks cover `0..len` without gaps or overlap and differ in size by at
/// most one item.
#[must_use]
pub fn chunk_bounds(len: usize, chunks: usize, index: usize) -> Range<usize> {
    debug_assert!(index < chunks);
    let start = len * index / chunks;
    let end = len * (index + 1) / chunks;
    start..end
}

/// Outcome of the two passes of a `range_search` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSummary {
    /// Number of generated dates.
    pub records: usize,
    /// Inclusive lower bound.
    pub from: Date,
    /// Inclusive upper bound.
    pub to: Date,
    /// Matches found by the single-threaded pass.
    pub sequential_matches: usize,
    /// Matches found by the chunked pass.
    pub parallel_matches: usize,
    /// Single-threaded pass, in seconds.
    pub sequential_secs: f64,
    /// Chunked pass including spawn and join, in seconds.
    pub parallel_secs: f64,
}

impl SearchSummary {
    /// Whether both passes found the same number of dates.
    #[must_use]
    pub fn counts_match(&self) -> bool {
        self.sequential_matches == self.parallel_matches
    }

    /// Sequential time over parallel time.
    #[must_use]
    pub fn speedup(&self) -> f64 {
        if self.parallel_secs > 0.0 {
            self.sequential_secs / self.parallel_secs
        } else {
            0.0
        }
    }
}
