use std::{panic::resume_unwind, thread};

use crossbeam_channel::{select, Receiver, Sender, TryRecvError};

use crate::{
    cancel::CancelToken,
    error::{Error, Result},
    predicate::qualifies,
    stage::Stage,
};

/// An owned set of worker threads that evaluate the predicate on candidates from a shared task
/// channel and forward the ones that qualify to a shared result channel.
///
/// Each worker exits when the task channel is closed and drained, when the result channel has no
/// receiver left, or when the [`CancelToken`] fires. Every blocking operation races the token, so
/// firing it makes all workers exit promptly.
///
/// Dropping the pool joins all workers. If a worker panicked, the panic is propagated to the owner.
pub(crate) struct WorkerPool {
    workers: Vec<Stage<Worked>>,
}

/// What a worker (or, summed up, the whole pool) reports when it returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Worked {
    /// Candidates the predicate was evaluated on.
    pub(crate) evaluated: u64,
    /// `true` if work was left undone: a candidate still waiting in the task channel, or a
    /// qualifying candidate that never reached the collector.
    pub(crate) abandoned: bool,
}

impl WorkerPool {
    /// Spawns `count` workers named `{name}-worker-{i}`.
    ///
    /// If a worker fails to spawn, `cancel` is fired so that the workers spawned before it (and
    /// every other stage sharing the token) exit, and those workers are joined before returning.
    pub(crate) fn spawn(
        name: &str,
        count: usize,
        tasks: Receiver<u64>,
        results: Sender<u64>,
        cancel: &CancelToken,
    ) -> Result<Self> {
        if count == 0 {
            return Err(Error::NoWorkers);
        }

        let mut workers = Vec::with_capacity(count);
        for i in 0..count {
            let tasks = tasks.clone();
            let results = results.clone();
            let cancel2 = cancel.clone();
            match Stage::spawn(format!("{name}-worker-{i}"), move || {
                work(tasks, results, cancel2)
            }) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    cancel.fire();
                    return Err(Error::Spawn(e));
                }
            }
        }

        // The original `tasks` and `results` handles are dropped here, so the channels only stay
        // open as long as the workers (and the generator) do.
        Ok(Self { workers })
    }

    /// Joins all workers and sums up what they report.
    ///
    /// If a worker panicked, the panic is propagated after all workers have been joined.
    pub(crate) fn join(self) -> Worked {
        match self.try_join() {
            Ok(worked) => worked,
            Err(payload) => resume_unwind(payload),
        }
    }

    /// Joins all workers, returning the panic payload of one of them if any panicked.
    pub(crate) fn try_join(self) -> thread::Result<Worked> {
        let mut total = Worked::default();
        let mut payload = None;
        for worker in self.workers {
            match worker.try_join() {
                Ok(worked) => {
                    total.evaluated += worked.evaluated;
                    total.abandoned |= worked.abandoned;
                }
                Err(pl) => payload = Some(pl),
            }
        }
        match payload {
            Some(payload) => Err(payload),
            None => Ok(total),
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.workers.iter().all(Stage::is_finished)
    }
}

/// The worker loop.
fn work(tasks: Receiver<u64>, results: Sender<u64>, cancel: CancelToken) -> Worked {
    let mut evaluated = 0;
    let abandoned = loop {
        let candidate = select! {
            recv(cancel.signal()) -> _ => {
                // Both arms may be ready at once; only count it as abandoned work if the
                // generator hadn't finished and been drained.
                break !matches!(tasks.try_recv(), Err(TryRecvError::Disconnected));
            }
            recv(tasks) -> msg => match msg {
                Ok(candidate) => candidate,
                // Generator is done and the channel is drained.
                Err(_) => break false,
            },
        };

        evaluated += 1;
        if !qualifies(candidate) {
            continue;
        }

        select! {
            send(results, candidate) -> res => {
                if res.is_err() {
                    // Collector is gone.
                    break true;
                }
            }
            recv(cancel.signal()) -> _ => break true,
        }
    };
    Worked {
        evaluated,
        abandoned,
    }
}
