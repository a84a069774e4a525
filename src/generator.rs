//! The candidate generator: feeds the domain, in order, to the worker pool.

use crossbeam_channel::{select, Sender};

use crate::{cancel::CancelToken, config::Domain};

/// What the generator reports when it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Generated {
    /// Candidates handed to the workers.
    pub(crate) sent: u64,
    /// `true` if every candidate in the domain was handed out.
    pub(crate) exhausted: bool,
}

/// Sends every candidate in `domain` to `tasks`, in increasing order, until the domain runs out,
/// `cancel` fires, or no worker is left to receive.
///
/// `tasks` is dropped on return, which tells the workers that no more candidates are coming.
pub(crate) fn generate(domain: Domain, tasks: Sender<u64>, cancel: CancelToken) -> Generated {
    let mut sent = 0;
    let stopped = |sent| Generated {
        sent,
        exhausted: false,
    };
    for candidate in domain.candidates() {
        // `select!` picks randomly among ready operations, so check first to never emit after
        // cancellation has been observed.
        if cancel.is_cancelled() {
            log::trace!("generator cancelled after {sent} candidates");
            return stopped(sent);
        }

        select! {
            send(tasks, candidate) -> res => {
                if res.is_err() {
                    log::trace!("all workers gone, generator stopping at {candidate}");
                    return stopped(sent);
                }
                sent += 1;
            }
            recv(cancel.signal()) -> _ => {
                log::trace!("generator cancelled after {sent} candidates");
                return stopped(sent);
            }
        }
    }

    log::debug!("domain exhausted after {sent} candidates");
    Generated {
        sent,
        exhausted: true,
    }
}
