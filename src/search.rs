use std::{
    panic::resume_unwind,
    time::{Duration, Instant},
};

use crate::{
    cancel::CancelToken,
    collector::{self, Collected, Completion, SearchOutcome, SearchStats},
    config::{Domain, Limit, SearchConfig},
    error::{Error, Result},
    generator::{self, Generated},
    pool::WorkerPool,
    stage::Stage,
};

/// A builder object that can be used to configure and spawn a [`Search`].
#[derive(Debug, Clone, Default)]
pub struct SearchBuilder {
    config: SearchConfig,
}

impl SearchBuilder {
    /// Creates a builder with the default [`SearchConfig`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder starting from an existing configuration.
    pub fn from_config(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Sets the base name of the search threads.
    ///
    /// Threads are named `{name}-generator`, `{name}-worker-{i}` and `{name}-collector`.
    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.config.name = name.into();
        self
    }

    /// Sets the number of worker threads evaluating the predicate.
    ///
    /// The reported results do not depend on this; only the speed of the search does.
    #[inline]
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Sets the capacity of the channel feeding candidates to the workers.
    ///
    /// By default, a capacity of 0 is used, which means the generator hands each candidate
    /// directly to an idle worker.
    #[inline]
    pub fn task_capacity(mut self, capacity: usize) -> Self {
        self.config.task_capacity = capacity;
        self
    }

    /// Sets the capacity of the channel carrying qualifying candidates to the collector.
    #[inline]
    pub fn result_capacity(mut self, capacity: usize) -> Self {
        self.config.result_capacity = capacity;
        self
    }

    /// Stops the search after `deadline` has passed, reporting whatever was found by then.
    #[inline]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.config.deadline = Some(deadline);
        self
    }

    /// Restricts the search to `domain` instead of every integer from 2 upwards.
    #[inline]
    pub fn domain(mut self, domain: Domain) -> Self {
        self.config.domain = domain;
        self
    }

    /// Spawns the threads of a [`Search`] for the `limit` smallest qualifying candidates.
    ///
    /// Returns an error if the configuration is invalid or a thread could not be spawned. In the
    /// latter case, any threads already spawned are stopped and joined first.
    pub fn spawn(self, limit: Limit) -> Result<Search> {
        let SearchConfig {
            workers,
            task_capacity,
            result_capacity,
            deadline,
            domain,
            name,
        } = self.config;
        if workers == 0 {
            return Err(Error::NoWorkers);
        }

        // A deadline too far out to represent is no deadline.
        let deadline = deadline.and_then(|d| Instant::now().checked_add(d));
        let cancel = CancelToken::new();
        let (task_tx, task_rx) = crossbeam_channel::bounded(task_capacity);
        let (result_tx, result_rx) = crossbeam_channel::bounded(result_capacity);

        log::debug!(
            "starting search '{name}' for {limit} results with {workers} workers over {domain:?}"
        );

        let generator = {
            let cancel = cancel.clone();
            Stage::spawn(format!("{name}-generator"), move || {
                generator::generate(domain, task_tx, cancel)
            })
            .map_err(Error::Spawn)?
        };

        // Fires `cancel` by itself if it fails, which stops the generator.
        let workers = WorkerPool::spawn(&name, workers, task_rx, result_tx, &cancel)?;

        let collector = {
            let cancel2 = cancel.clone();
            match Stage::spawn(format!("{name}-collector"), move || {
                collector::collect(result_rx, cancel2, limit, deadline)
            }) {
                Ok(collector) => collector,
                Err(e) => {
                    // `result_rx` is gone with the closure, so the workers can't block on it, but
                    // the generator and idle workers have to be told.
                    cancel.fire();
                    return Err(Error::Spawn(e));
                }
            }
        };

        Ok(Search {
            cancel,
            stages: Some(Stages {
                collector,
                generator,
                workers,
            }),
        })
    }

    /// Spawns a [`Search`] and waits for its outcome.
    pub fn run(self, limit: Limit) -> Result<SearchOutcome> {
        Ok(self.spawn(limit)?.join())
    }
}

struct Stages {
    collector: Stage<Collected>,
    generator: Stage<Generated>,
    workers: WorkerPool,
}

impl Stages {
    /// Joins every stage and assembles the outcome.
    ///
    /// If the collector panicked, the other stages are stopped and joined, and the collector's
    /// panic is the one propagated. Otherwise a panic of the generator or a worker is propagated
    /// once everything has been joined.
    fn join(self, cancel: &CancelToken) -> SearchOutcome {
        // The collector only returns once every worker has dropped its result sender, so by the
        // time it's done the rest of the pipeline is on its way out.
        let collected = match self.collector.try_join() {
            Ok(collected) => collected,
            Err(payload) => {
                cancel.fire();
                // Anything the other stages did after this is fallout.
                let _ = self.generator.try_join();
                let _ = self.workers.try_join();
                resume_unwind(payload);
            }
        };
        let generated = self.generator.join();
        let worked = self.workers.join();

        // The collector knows when it stopped the search itself. Otherwise the result channel
        // closed because the workers left, and only a domain that was fully handed out and fully
        // evaluated counts as exhausted, even if the token was fired afterwards.
        let completion = collected.completion.unwrap_or_else(|| {
            if generated.exhausted && !worked.abandoned {
                Completion::Exhausted
            } else {
                Completion::Cancelled
            }
        });

        SearchOutcome {
            values: collected.values,
            sum: collected.sum,
            completion,
            stats: SearchStats {
                generated: generated.sent,
                evaluated: worked.evaluated,
                received: collected.received,
                discarded: collected.discarded,
            },
        }
    }
}

/// A running search for the smallest integers that are both prime and palindromic.
///
/// This type enforces structured concurrency: it owns the generator, worker and collector threads.
/// [`Search::join`] waits for the search to finish on its own; dropping a [`Search`] cancels it
/// and then joins every thread. If any of the threads has panicked, the panic is forwarded to the
/// thread joining or dropping the [`Search`].
pub struct Search {
    cancel: CancelToken,
    stages: Option<Stages>,
}

impl Drop for Search {
    fn drop(&mut self) {
        if self.stages.is_some() {
            if self.cancel.fire() {
                log::debug!("search dropped while running, cancelling");
            }
            // Dropping the stages joins them.
            self.stages = None;
        }
    }
}

impl Search {
    /// Returns a builder that can be used to configure and spawn a [`Search`].
    #[inline]
    pub fn builder() -> SearchBuilder {
        SearchBuilder::new()
    }

    /// Stops the search early. [`Search::join`] will report whatever was found up to this point.
    ///
    /// Returns `false` if the search had already been cancelled (by an earlier call, by reaching
    /// its limit, or by its deadline), in which case nothing happens.
    pub fn cancel(&self) -> bool {
        self.cancel.fire()
    }

    /// Returns whether the search has been cancelled, for any reason.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns whether every thread of the search has exited.
    ///
    /// If this returns `true`, [`Search::join`] will not block.
    pub fn is_finished(&self) -> bool {
        match &self.stages {
            Some(stages) => {
                stages.collector.is_finished()
                    && stages.generator.is_finished()
                    && stages.workers.is_finished()
            }
            None => true,
        }
    }

    /// Waits for the search to finish and returns its outcome.
    ///
    /// If one of the search threads has panicked, the panic is propagated to the caller after
    /// the remaining threads have been stopped.
    pub fn join(mut self) -> SearchOutcome {
        let Some(stages) = self.stages.take() else {
            unreachable!("search joined twice");
        };

        let outcome = stages.join(&self.cancel);
        log::debug!(
            "search finished ({:?}): {} results, {:?}",
            outcome.completion,
            outcome.values.len(),
            outcome.stats,
        );
        outcome
    }
}
