//! The error type returned by benchmark runs.

use std::io;

use thiserror::Error;

/// The collection of errors that can end a benchmark run.
///
/// None of these are retried: a run that hits one of them is abandoned, its workers are joined,
/// and the error is handed back to the caller.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The operating system refused to start a worker thread.
    #[error("failed to spawn worker {ordinal}")]
    Spawn {
        /// The ordinal of the worker that could not be started.
        ordinal: usize,
        /// The error returned by the thread builder.
        #[source]
        source: io::Error,
    },
    /// A worker panicked before it could be joined.
    #[error("worker {ordinal} panicked")]
    WorkerPanicked {
        /// The ordinal of the worker that panicked.
        ordinal: usize,
    },
    /// Writing a line to the output sink failed.
    #[error("failed to write benchmark output")]
    Output(#[from] io::Error),
    /// The platform semaphore behind a `NativeGate` could not be created.
    #[error("failed to initialize the platform semaphore")]
    Semaphore(#[source] io::Error),
}
