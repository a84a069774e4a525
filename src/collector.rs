//! The result collector and the found set it accumulates into.

use std::time::Instant;

use crossbeam_channel::{select, Receiver};

use crate::{cancel::CancelToken, config::Limit};

/// Why a search stopped.
///
/// None of these are failures: a search that finds fewer results than requested is still a
/// successful search, it just reports fewer values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The requested number of results was found.
    Satisfied,
    /// The domain ran out before the requested number of results was found.
    Exhausted,
    /// The deadline elapsed before the requested number of results was found.
    DeadlineElapsed,
    /// The search was cancelled by its owner.
    Cancelled,
}

/// Counters describing how much work a search did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Candidates handed to the worker pool by the generator.
    pub generated: u64,
    /// Candidates the workers evaluated the predicate on.
    pub evaluated: u64,
    /// Qualifying candidates the collector received, including ones dropped by truncation.
    pub received: u64,
    /// Qualifying candidates received past the limit and dropped after sorting.
    pub discarded: u64,
}

/// The final result of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// The smallest qualifying candidates found, in ascending order. At most as many as requested.
    pub values: Vec<u64>,
    /// The sum of `values`.
    pub sum: u64,
    pub completion: Completion,
    pub stats: SearchStats,
}

/// The collector's accumulating set of qualifying candidates.
///
/// Candidates arrive in whatever order the workers finish, and more than `limit` may arrive before
/// cancellation takes effect. [`FoundSet::finish`] sorts before truncating, so the retained values
/// are always the smallest ones received.
#[derive(Debug)]
pub(crate) struct FoundSet {
    limit: usize,
    values: Vec<u64>,
}

impl FoundSet {
    pub(crate) fn new(limit: Limit) -> Self {
        Self {
            limit: limit.get(),
            values: Vec::with_capacity(limit.get()),
        }
    }

    /// Adds `value`. Returns `true` if this insertion made the set reach its limit.
    pub(crate) fn insert(&mut self, value: u64) -> bool {
        self.values.push(value);
        self.values.len() == self.limit
    }

    pub(crate) fn is_full(&self) -> bool {
        self.values.len() >= self.limit
    }

    /// Sorts, truncates to the limit and sums.
    ///
    /// Returns the retained values, their sum and the number of values discarded.
    pub(crate) fn finish(mut self) -> (Vec<u64>, u64, u64) {
        self.values.sort_unstable();
        let received = self.values.len();
        self.values.truncate(self.limit);
        let sum = self.values.iter().sum();
        let discarded = (received - self.values.len()) as u64;
        (self.values, sum, discarded)
    }
}

/// What the collector hands back once the result channel has closed.
#[derive(Debug)]
pub(crate) struct Collected {
    pub(crate) values: Vec<u64>,
    pub(crate) sum: u64,
    /// Set if the collector itself ended the search. `None` means the result channel closed on
    /// its own, and the other stages know why.
    pub(crate) completion: Option<Completion>,
    pub(crate) received: u64,
    pub(crate) discarded: u64,
}

/// Drains `results` into a [`FoundSet`] until the channel closes.
///
/// Fires `cancel` as soon as `limit` values have been received, or when `deadline` passes. Keeps
/// receiving afterwards so that no worker stays blocked on a send, and returns once every sender
/// has been dropped.
pub(crate) fn collect(
    results: Receiver<u64>,
    cancel: CancelToken,
    limit: Limit,
    deadline: Option<Instant>,
) -> Collected {
    let mut found = FoundSet::new(limit);
    let mut received = 0;
    // Delivers a single message at the deadline and is never ready again afterwards.
    let timeout = match deadline {
        Some(deadline) => crossbeam_channel::at(deadline),
        None => crossbeam_channel::never(),
    };
    let mut deadline_elapsed = false;

    loop {
        select! {
            recv(results) -> msg => {
                let Ok(value) = msg else {
                    // Every worker has exited.
                    break;
                };
                received += 1;
                log::trace!("received {value}");
                if found.insert(value) && cancel.fire() {
                    log::debug!("found {limit} results after {received} received, cancelling");
                }
            }
            recv(timeout) -> _ => {
                if !found.is_full() {
                    deadline_elapsed = true;
                    if cancel.fire() {
                        log::debug!("deadline elapsed with {received} results, cancelling");
                    }
                }
            }
        }
    }

    let completion = if found.is_full() {
        Some(Completion::Satisfied)
    } else if deadline_elapsed {
        Some(Completion::DeadlineElapsed)
    } else {
        None
    };

    let (values, sum, discarded) = found.finish();
    Collected {
        values,
        sum,
        completion,
        received,
        discarded,
    }
}
