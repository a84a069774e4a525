//! Single-fire cancellation broadcast.
//!
//! A [`CancelToken`] is shared by every stage of a search. Firing it makes every current and
//! future [`CancelToken::is_cancelled`] check return `true`, and makes the receiver returned by
//! [`CancelToken::signal`] permanently ready, so that blocking channel operations can race against
//! it inside a [`crossbeam_channel::select!`].

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use crossbeam_channel::{Receiver, Sender};

struct Shared {
    fired: AtomicBool,
    /// Dropped when the token fires. Nothing is ever sent on it; disconnection is the signal.
    trigger: Mutex<Option<Sender<()>>>,
}

/// A cloneable, idempotent stop signal.
///
/// All clones refer to the same underlying signal.
#[derive(Clone)]
pub(crate) struct CancelToken {
    shared: Arc<Shared>,
    signal: Receiver<()>,
}

impl CancelToken {
    /// Creates a token that has not fired yet.
    pub(crate) fn new() -> Self {
        let (trigger, signal) = crossbeam_channel::bounded(0);
        Self {
            shared: Arc::new(Shared {
                fired: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
            }),
            signal,
        }
    }

    /// Fires the token, waking up everything blocked on [`CancelToken::signal`].
    ///
    /// Returns `true` if this call fired the token, and `false` if it had already been fired.
    /// Firing an already-fired token does nothing.
    pub(crate) fn fire(&self) -> bool {
        if self.shared.fired.swap(true, Ordering::AcqRel) {
            return false;
        }

        // A panic while holding this lock can't leave the `Option` half-written, so poisoning is
        // ignored.
        let trigger = self
            .shared
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(trigger);
        true
    }

    /// Returns whether the token has been fired. Never blocks.
    #[inline]
    pub(crate) fn is_cancelled(&self) -> bool {
        self.shared.fired.load(Ordering::Acquire)
    }

    /// Returns a receiver that becomes ready (disconnected) once the token fires.
    ///
    /// Use it as one arm of a [`crossbeam_channel::select!`]; the arm fires with `Err(_)`.
    #[inline]
    pub(crate) fn signal(&self) -> &Receiver<()> {
        &self.signal
    }

    /// Blocks until the token is fired.
    #[cfg(test)]
    pub(crate) fn wait(&self) {
        // Only ever returns `Err` since nothing is sent.
        self.signal.recv().ok();
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::AtomicUsize,
        thread,
        time::{Duration, Instant},
    };

    use crossbeam_channel::{select, TryRecvError};

    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn token_is_send_sync() {
        assert_send_sync::<CancelToken>();
    }

    #[test]
    fn fire_twice() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.fire());
        assert!(token.is_cancelled());
        assert!(!token.fire());
        assert!(token.is_cancelled());
    }

    #[test]
    fn clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.fire();
        assert!(token.is_cancelled());
        assert!(!token.fire());
    }

    #[test]
    fn signal_is_ready_after_fire() {
        let token = CancelToken::new();
        assert_eq!(token.signal().try_recv(), Err(TryRecvError::Empty));

        token.fire();
        assert_eq!(token.signal().try_recv(), Err(TryRecvError::Disconnected));
        // Stays ready no matter how often it's observed.
        for _ in 0..3 {
            let start = Instant::now();
            select! {
                recv(token.signal()) -> msg => assert!(msg.is_err()),
                default(Duration::from_secs(5)) => panic!("signal not ready after fire"),
            }
            assert!(start.elapsed() < Duration::from_secs(1));
        }
    }

    #[test]
    fn fire_wakes_blocked_waiters() {
        let token = CancelToken::new();
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let token = token.clone();
                thread::spawn(move || token.wait())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        token.fire();
        for waiter in waiters {
            waiter.join().unwrap();
        }
    }

    #[test]
    fn concurrent_fire_happens_once() {
        let token = CancelToken::new();
        let winners = Arc::new(AtomicUsize::new(0));
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let token = token.clone();
                let winners = winners.clone();
                thread::spawn(move || {
                    if token.fire() {
                        winners.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(winners.load(Ordering::Relaxed), 1);
        assert!(token.is_cancelled());
    }
}
