use std::{
    io,
    panic::resume_unwind,
    thread::{self, JoinHandle},
};

/// An owned, named thread running one stage of a search to completion.
///
/// Calling [`Stage::join`] or dropping a [`Stage`] joins the thread. If the thread panicked, the
/// panic is propagated to the owner (unless the owner is already panicking).
///
/// Dropping a [`Stage`] blocks until the thread exits, so whatever makes the thread exit (closing
/// its channels or firing its [`CancelToken`]) has to happen first.
///
/// [`CancelToken`]: crate::cancel::CancelToken
pub(crate) struct Stage<R> {
    handle: Option<JoinHandle<R>>,
}

impl<R> Drop for Stage<R> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(payload) = handle.join() {
                if !thread::panicking() {
                    resume_unwind(payload);
                }
            }
        }
    }
}

impl<R: Send + 'static> Stage<R> {
    /// Spawns `f` on a new thread called `name`.
    pub(crate) fn spawn<F>(name: String, f: F) -> io::Result<Self>
    where
        F: FnOnce() -> R + Send + 'static,
    {
        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            log::trace!("stage '{name}' starting");
            let _guard = ExitLog(name);
            f()
        })?;
        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Blocks until the thread exits and returns its result.
    ///
    /// If the thread panicked, the panic is propagated to the caller.
    pub(crate) fn join(self) -> R {
        match self.try_join() {
            Ok(r) => r,
            Err(payload) => resume_unwind(payload),
        }
    }

    /// Blocks until the thread exits and returns its result, or its panic payload.
    pub(crate) fn try_join(mut self) -> thread::Result<R> {
        match self.handle.take() {
            Some(handle) => handle.join(),
            None => unreachable!("stage joined twice"),
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

/// Logs the thread's exit when dropped, including exits by unwinding.
struct ExitLog(String);

impl Drop for ExitLog {
    fn drop(&mut self) {
        if thread::panicking() {
            log::debug!("stage '{}' exiting due to panic", self.0);
        } else {
            log::trace!("stage '{}' exiting", self.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use super::*;

    fn silent_panic(payload: String) {
        resume_unwind(Box::new(payload));
    }

    #[test]
    fn join_returns_result() {
        let stage = Stage::spawn("test-join".into(), || 6 * 7).unwrap();
        assert_eq!(stage.join(), 42);
    }

    #[test]
    fn thread_is_named() {
        let stage = Stage::spawn("test-named".into(), || {
            thread::current().name().map(str::to_owned)
        })
        .unwrap();
        assert_eq!(stage.join().as_deref(), Some("test-named"));
    }

    #[test]
    fn join_propagates_panic() {
        let stage = Stage::spawn("test-panic".into(), || silent_panic("stage panic".into())).unwrap();
        catch_unwind(AssertUnwindSafe(|| stage.join())).unwrap_err();
    }

    #[test]
    fn drop_propagates_panic() {
        let stage = Stage::spawn("test-panic".into(), || silent_panic("stage panic".into())).unwrap();
        catch_unwind(AssertUnwindSafe(|| drop(stage))).unwrap_err();
    }

    #[test]
    fn finished_after_exit() {
        let (tx, rx) = crossbeam_channel::bounded::<()>(0);
        let stage = Stage::spawn("test-finished".into(), move || rx.recv().ok()).unwrap();
        assert!(!stage.is_finished());
        drop(tx);
        while !stage.is_finished() {
            thread::yield_now();
        }
        assert_eq!(stage.join(), None);
    }
}
