use std::io;

use thiserror::Error;

use crate::config::Limit;

/// Errors that prevent a search from being started.
///
/// A search that finds fewer results than requested is not an error; see
/// [`Completion`](crate::Completion).
#[derive(Error, Debug)]
pub enum Error {
    #[error("N must be between {} and {}, got {value}", Limit::MIN, Limit::MAX)]
    LimitOutOfRange { value: i64 },

    #[error("N must be between {} and {}, got {input:?} which is not a number", Limit::MIN, Limit::MAX)]
    InvalidNumber { input: String },

    #[error("the worker pool needs at least one worker")]
    NoWorkers,

    #[error("failed to spawn search thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
