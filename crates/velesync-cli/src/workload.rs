//! Worker payloads: random strings, reader/writer roles, hold times.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Generates a random lowercase ASCII string of `len` characters.
#[must_use]
pub fn random_string(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect()
}

/// Picks a hold duration uniformly in `[min_ms, max_ms]`.
///
/// Bounds are swapped if given in the wrong order.
#[must_use]
pub fn random_hold(min_ms: u64, max_ms: u64) -> Duration {
    let (lo, hi) = if min_ms <= max_ms {
        (min_ms, max_ms)
    } else {
        (max_ms, min_ms)
    };
    Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
}

/// Role of a worker in the readers-writer scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Reads the shared value under a read lock.
    Reader,
    /// Replaces the shared value under a write lock.
    Writer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reader => f.write_str("reader"),
            Self::Writer => f.write_str("writer"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts `reader`/`r`/`0` and `writer`/`w`/`1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reader" | "r" | "0" => Ok(Self::Reader),
            "writer" | "w" | "1" => Ok(Self::Writer),
            other => Err(format!("unknown role '{other}', expected reader or writer")),
        }
    }
}

/// Alternating reader/writer roles, starting with a reader.
#[must_use]
pub fn alternating_roles(count: usize) -> Vec<Role> {
    (0..count)
        .map(|i| if i % 2 == 0 { Role::Reader } else { Role::Writer })
        .collect()
}
