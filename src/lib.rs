//! Finds the smallest integers that are both prime and palindromic, using a cancellable pipeline
//! of threads.
//!
//! # Overview
//!
//! A [`Search`] is made of three kinds of threads connected by channels:
//!
//! - a **generator** that feeds the candidates 2, 3, 4, … in order to the workers,
//! - a fixed pool of **workers** that test each candidate and forward the ones that are prime
//!   palindromes,
//! - a **collector** that gathers the forwarded candidates until it has as many as requested.
//!
//! Once the collector has enough results, it fires a shared cancellation token that every thread
//! races all of its blocking operations against. The generator stops producing, the workers stop taking
//! candidates, and the collector keeps receiving until the last worker has exited so that nothing
//! stays blocked. Because workers finish in no particular order, the collector may end up with more
//! results than requested; they are sorted before the excess is dropped, so the reported values are
//! always the smallest ones.
//!
//! [`Search`] enforces *structured concurrency*: it owns every thread it spawns. Joining it waits
//! for all of them, and dropping it cancels the search and then waits for all of them. Panics in
//! any of the threads are forwarded to the owner.
//!
//! # Usage
//!
//! ```
//! use primepal::{Limit, Search};
//!
//! let outcome = Search::builder()
//!     .workers(4)
//!     .run(Limit::new(5).unwrap())
//!     .unwrap();
//! assert_eq!(outcome.values, [2, 3, 5, 7, 11]);
//! assert_eq!(outcome.sum, 28);
//! ```
//!
//! A search can also be bounded in time or in the candidates it looks at. Getting fewer results
//! than requested is not an error; [`SearchOutcome::completion`] says why the search stopped.
//!
//! ```
//! use primepal::{Completion, Domain, Limit, Search};
//!
//! let outcome = Search::builder()
//!     .domain(Domain::up_to(100))
//!     .run(Limit::new(10).unwrap())
//!     .unwrap();
//! assert_eq!(outcome.values, [2, 3, 5, 7, 11]);
//! assert_eq!(outcome.completion, Completion::Exhausted);
//! ```

mod cancel;
mod collector;
mod config;
mod error;
mod generator;
mod pool;
pub mod predicate;
mod search;
mod stage;

pub use collector::{Completion, SearchOutcome, SearchStats};
pub use config::{Domain, Limit, SearchConfig};
pub use error::{Error, Result};
pub use search::{Search, SearchBuilder};

/// Finds the `n` smallest prime palindromes with the default configuration.
///
/// Returns [`Error::LimitOutOfRange`] without starting anything if `n` is not in
/// `Limit::MIN..=Limit::MAX`.
pub fn search(n: i64) -> Result<SearchOutcome> {
    SearchBuilder::new().run(Limit::new(n)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_is_rejected() {
        for n in [0, 51, -3] {
            assert!(matches!(
                search(n),
                Err(Error::LimitOutOfRange { value }) if value == n
            ));
        }
    }

    #[test]
    fn in_range_succeeds() {
        let outcome = search(3).unwrap();
        assert_eq!(outcome.values, [2, 3, 5]);
        assert_eq!(outcome.sum, 10);
    }
}
