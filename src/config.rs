//! Search configuration.
//!
//! Everything that tunes a search is passed in explicitly through a [`SearchConfig`] (usually
//! assembled with [`SearchBuilder`](crate::SearchBuilder)); there is no global state.

use std::{fmt, ops::RangeInclusive, str::FromStr, time::Duration};

use crate::error::{Error, Result};

/// The number of results to search for, validated to lie in `Limit::MIN..=Limit::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Limit(usize);

impl Limit {
    pub const MIN: usize = 1;
    pub const MAX: usize = 50;

    /// Validates `n`, returning [`Error::LimitOutOfRange`] if it is outside the accepted range.
    pub fn new(n: i64) -> Result<Self> {
        match usize::try_from(n) {
            Ok(n) if (Self::MIN..=Self::MAX).contains(&n) => Ok(Self(n)),
            _ => Err(Error::LimitOutOfRange { value: n }),
        }
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl FromStr for Limit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let n = s.parse::<i64>().map_err(|_| Error::InvalidNumber {
            input: s.to_owned(),
        })?;
        Self::new(n)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The inclusive range of candidates a search scans, in increasing order.
///
/// Candidates below 2 are never produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    start: u64,
    end: u64,
}

impl Domain {
    pub const FIRST_CANDIDATE: u64 = 2;

    /// Every candidate from 2 upwards. As far as a search is concerned this never runs out.
    pub fn unbounded() -> Self {
        Self::new(Self::FIRST_CANDIDATE, u64::MAX)
    }

    /// Candidates from 2 up to and including `max`.
    pub fn up_to(max: u64) -> Self {
        Self::new(Self::FIRST_CANDIDATE, max)
    }

    /// Candidates from `start` up to and including `end`. `start` is raised to 2 if lower.
    ///
    /// If `end < start`, the domain is empty.
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start: start.max(Self::FIRST_CANDIDATE),
            end,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub(crate) fn candidates(&self) -> RangeInclusive<u64> {
        self.start..=self.end
    }
}

impl Default for Domain {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// All tunables of a search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Number of worker threads evaluating the predicate. Must be at least 1.
    pub workers: usize,
    /// Capacity of the channel between the generator and the workers. 0 makes every handoff a
    /// rendezvous.
    pub task_capacity: usize,
    /// Capacity of the channel between the workers and the collector.
    pub result_capacity: usize,
    /// If set, the search is stopped once this much time has passed, as if enough results had been
    /// found.
    pub deadline: Option<Duration>,
    /// The candidates to scan.
    pub domain: Domain,
    /// Base name of the spawned threads.
    pub name: String,
}

impl SearchConfig {
    pub const DEFAULT_WORKERS: usize = 4;
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: Self::DEFAULT_WORKERS,
            task_capacity: 0,
            result_capacity: 0,
            deadline: None,
            domain: Domain::unbounded(),
            name: "primepal".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_bounds() {
        assert_eq!(Limit::new(1).unwrap().get(), 1);
        assert_eq!(Limit::new(50).unwrap().get(), 50);
        for n in [i64::MIN, -1, 0, 51, i64::MAX] {
            match Limit::new(n) {
                Err(Error::LimitOutOfRange { value }) => assert_eq!(value, n),
                other => panic!("{n} accepted: {other:?}"),
            }
        }
    }

    #[test]
    fn limit_from_str() {
        assert_eq!(" 7\n".parse::<Limit>().unwrap().get(), 7);
        assert!(matches!(
            "51".parse::<Limit>(),
            Err(Error::LimitOutOfRange { value: 51 })
        ));
        assert!(matches!(
            "seven".parse::<Limit>(),
            Err(Error::InvalidNumber { .. })
        ));
        assert!(matches!("".parse::<Limit>(), Err(Error::InvalidNumber { .. })));
    }

    #[test]
    fn out_of_range_message() {
        let msg = Limit::new(0).unwrap_err().to_string();
        assert_eq!(msg, "N must be between 1 and 50, got 0");
    }

    #[test]
    fn domain_clamps_start() {
        let domain = Domain::new(0, 5);
        assert_eq!(domain.candidates().collect::<Vec<_>>(), [2, 3, 4, 5]);
        assert!(Domain::up_to(1).is_empty());
        assert_eq!(Domain::up_to(1).candidates().count(), 0);
        assert!(!Domain::unbounded().is_empty());
    }
}
