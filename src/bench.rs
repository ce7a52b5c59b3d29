//! The benchmark runner: spawn a fixed set of workers, let them contend, time the whole thing.
//!
//! See the documentation of the [`Runner`] struct for more information.
//!
//! [`Runner`]: struct.Runner.html

use std::io;
use std::sync::{Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::util;
use crate::{Admit, BenchError};

/// Spawns a fixed number of worker threads per run and measures how long they take.
///
/// Every run follows the same shape: spawn `workers` scoped threads, hold them at a start line
/// until all of them exist, release them together, then join every one of them. The clock starts
/// before the first spawn and stops after the last join.
///
/// Worker threads are scoped to the run. Whatever happens (a failed spawn, a worker that panics,
/// a worker that reports an error) every thread that was started has been joined by the time
/// `run` returns.
///
/// # Example
///
/// ```
/// use syncbench::{Runner, SpinLock};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let lock = SpinLock::new();
/// let done = AtomicUsize::new(0);
///
/// let run = Runner::new(4)
///     .run_admitted("spin", &lock, |_ordinal| {
///         done.fetch_add(1, Ordering::SeqCst);
///         Ok(())
///     })
///     .unwrap();
///
/// assert_eq!(run.name(), "spin");
/// assert_eq!(done.load(Ordering::SeqCst), 4);
/// ```
#[derive(Debug, Copy, Clone)]
pub struct Runner {
    workers: usize,
}

/// The timing of one finished benchmark run.
#[derive(Debug, Copy, Clone)]
pub struct BenchmarkRun {
    name: &'static str,
    workers: usize,
    started: Instant,
    finished: Instant,
}

impl Runner {
    /// Creates a runner that spawns `workers` threads per run.
    ///
    /// # Panics
    ///
    /// Panics if `workers` is zero.
    pub fn new(workers: usize) -> Runner {
        assert!(workers > 0, "a benchmark needs at least one worker");
        Runner { workers }
    }

    /// Returns the number of threads spawned per run.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `body` once on each of the workers, passing it the worker's ordinal.
    ///
    /// # Errors
    ///
    /// * `BenchError::Spawn` if a worker thread couldn't be started. Workers that were already
    ///   started are let go without running `body`.
    /// * `BenchError::WorkerPanicked` if a worker panicked.
    /// * `BenchError::Output` if `body` returned an error on some worker.
    ///
    /// When several workers fail, the error for the lowest ordinal is returned; a spawn failure
    /// takes precedence over all of them.
    pub fn run<F>(&self, name: &'static str, body: F) -> Result<BenchmarkRun, BenchError>
    where
        F: Fn(usize) -> io::Result<()> + Sync,
    {
        let start_line = StartLine::new();
        let start_line = &start_line;
        let body = &body;

        log::debug!("starting {} with {} workers", name, self.workers);
        let started = Instant::now();

        let outcome = thread::scope(|s| {
            let mut handles = Vec::with_capacity(self.workers);
            let mut failure = None;

            for ordinal in 0..self.workers {
                let spawned = thread::Builder::new()
                    .name(format!("worker-{}", ordinal))
                    .spawn_scoped(s, move || {
                        if start_line.wait() {
                            body(ordinal)
                        } else {
                            Ok(())
                        }
                    });

                match spawned {
                    Ok(handle) => handles.push((ordinal, handle)),
                    Err(source) => {
                        log::error!("could not spawn worker {} for {}: {}", ordinal, name, source);
                        failure = Some(BenchError::Spawn { ordinal, source });
                        break;
                    }
                }
            }

            if failure.is_some() {
                start_line.abort();
            } else {
                start_line.open();
            }

            for (ordinal, handle) in handles {
                let err = match handle.join() {
                    Ok(Ok(())) => continue,
                    Ok(Err(err)) => BenchError::Output(err),
                    Err(_) => BenchError::WorkerPanicked { ordinal },
                };
                if failure.is_none() {
                    failure = Some(err);
                }
            }

            failure.map_or(Ok(()), Err)
        });

        let finished = Instant::now();
        outcome?;

        let run = BenchmarkRun {
            name,
            workers: self.workers,
            started,
            finished,
        };
        log::debug!("{} finished in {:?}", name, run.elapsed());

        Ok(run)
    }

    /// Runs `body` on each worker while it is admitted by `primitive`.
    ///
    /// Each worker acquires `primitive`, runs `body`, and releases it again, even if `body`
    /// returns an error or panics.
    pub fn run_admitted<P, F>(
        &self,
        name: &'static str,
        primitive: &P,
        body: F,
    ) -> Result<BenchmarkRun, BenchError>
    where
        P: Admit,
        F: Fn(usize) -> io::Result<()> + Sync,
    {
        self.run(name, |ordinal| {
            let _admission = primitive.admit();
            log::trace!("worker {} admitted", ordinal);
            body(ordinal)
        })
    }
}

impl BenchmarkRun {
    /// Returns the name the run was started under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the number of workers that took part.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Returns the wall-clock time from before the first spawn to after the last join.
    pub fn elapsed(&self) -> Duration {
        self.finished.duration_since(self.started)
    }
}

// Holds spawned workers until the runner knows whether every one of them could be started.
struct StartLine {
    state: Mutex<Start>,
    changed: Condvar,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Start {
    Waiting,
    Go,
    Abort,
}

impl StartLine {
    fn new() -> StartLine {
        StartLine {
            state: Mutex::new(Start::Waiting),
            changed: Condvar::new(),
        }
    }

    // Returns whether the worker should go on to run its body.
    fn wait(&self) -> bool {
        let mut state = util::guts(self.state.lock());

        while *state == Start::Waiting {
            state = util::guts(self.changed.wait(state));
        }

        *state == Start::Go
    }

    fn open(&self) {
        self.set(Start::Go);
    }

    fn abort(&self) {
        self.set(Start::Abort);
    }

    fn set(&self, next: Start) {
        *util::guts(self.state.lock()) = next;
        self.changed.notify_all();
    }
}
