//! The fixed sequence of benchmarks the `syncbench` binary runs.
//!
//! Each [`Benchmark`] builds a fresh primitive, puts `worker_count` workers through it with the
//! same critical section (pick a random printable character, write one line to the shared
//! [`Sink`]), and reports the elapsed time along with what its probe saw. Benchmarks run one after
//! another, so only the workers of the benchmark under test ever contend.
//!
//! [`Benchmark`]: enum.Benchmark.html
//! [`Sink`]: ../struct.Sink.html

use std::io::{self, Write};
use std::sync::Mutex;

use clap::ValueEnum;
use rand::Rng;

use crate::util;
use crate::{
    Admit, BenchError, BenchmarkRun, MonitorLock, NativeGate, Occupancy, Options, Rendezvous,
    Runner, Sink, SlimGate, SpinLock, Timeline, YieldingSpinLock,
};

/// One of the benchmarks in the suite.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Benchmark {
    /// The standard library's mutex.
    Mutex,
    /// The platform counting semaphore, with `permit_capacity` permits.
    NativeGate,
    /// The busy-wait lock.
    SpinLock,
    /// The rendezvous barrier, with one party per worker.
    Barrier,
    /// The busy-wait lock that yields between attempts.
    YieldingSpinLock,
    /// The flag-and-condvar monitor.
    Monitor,
    /// The hand-built counting gate, with `permit_capacity` permits.
    SlimGate,
}

/// What a benchmark's probe observed during the run.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The most workers seen inside the guarded section at once, and how many were allowed.
    Occupancy {
        /// The observed maximum.
        peak: usize,
        /// The primitive's limit: 1 for locks, the capacity for gates.
        limit: usize,
    },
    /// Whether every worker's "before" step finished ahead of every worker's "after" step.
    Phases {
        /// `true` if the rendezvous kept the two phases apart.
        ordered: bool,
    },
}

/// The outcome of one benchmark.
#[derive(Debug, Copy, Clone)]
pub struct Report {
    /// Which benchmark ran.
    pub bench: Benchmark,
    /// Its timing.
    pub run: BenchmarkRun,
    /// What its probe saw.
    pub observation: Observation,
}

impl Benchmark {
    /// Every benchmark, in the order the suite runs them.
    pub const ALL: [Benchmark; 7] = [
        Benchmark::Mutex,
        Benchmark::NativeGate,
        Benchmark::SpinLock,
        Benchmark::Barrier,
        Benchmark::YieldingSpinLock,
        Benchmark::Monitor,
        Benchmark::SlimGate,
    ];

    /// Returns the name this benchmark prints under.
    pub fn label(self) -> &'static str {
        match self {
            Benchmark::Mutex => "Mutex",
            Benchmark::NativeGate => "NativeGate",
            Benchmark::SpinLock => "SpinLock",
            Benchmark::Barrier => "Barrier",
            Benchmark::YieldingSpinLock => "YieldingSpinLock",
            Benchmark::Monitor => "Monitor",
            Benchmark::SlimGate => "SlimGate",
        }
    }

    /// Runs this benchmark, writing a heading, one line per worker step, and a summary to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if a worker couldn't be spawned or panicked, if the platform semaphore
    /// couldn't be created, or if writing to `sink` failed.
    pub fn run<W>(self, options: &Options, sink: &Sink<W>) -> Result<Report, BenchError>
    where
        W: Write + Send,
    {
        let runner = Runner::new(options.worker_count);
        let label = self.label();

        sink.line(format_args!("Testing {}:", label))?;

        let (run, observation) = match self {
            Benchmark::Mutex => {
                let mutex = Mutex::new(());
                let occupancy = Occupancy::new();
                let run = runner.run(label, |ordinal| {
                    let _held = util::guts(mutex.lock());
                    let _inside = occupancy.enter();
                    worker_line(sink, ordinal, label)
                })?;
                (run, occupied(&occupancy, 1))
            }
            Benchmark::NativeGate => {
                let gate = NativeGate::new(options.permit_capacity)?;
                admitted(&runner, label, &gate, sink, gate.capacity())?
            }
            Benchmark::SpinLock => admitted(&runner, label, &SpinLock::new(), sink, 1)?,
            Benchmark::Barrier => {
                let barrier = Rendezvous::new(runner.workers());
                let timeline = Timeline::new();
                let run = runner.run(label, |ordinal| {
                    let before = worker_line(sink, ordinal, "before Barrier");
                    timeline.before(ordinal);
                    // arrive even if the write failed, or the other parties would never leave
                    barrier.arrive_and_wait();
                    timeline.after(ordinal);
                    before?;
                    worker_line(sink, ordinal, "after Barrier")
                })?;
                let ordered = timeline.finish().is_ordered();
                (run, Observation::Phases { ordered })
            }
            Benchmark::YieldingSpinLock => {
                admitted(&runner, label, &YieldingSpinLock::new(), sink, 1)?
            }
            Benchmark::Monitor => admitted(&runner, label, &MonitorLock::new(), sink, 1)?,
            Benchmark::SlimGate => {
                let gate = SlimGate::new(options.permit_capacity);
                admitted(&runner, label, &gate, sink, gate.capacity())?
            }
        };

        let report = Report {
            bench: self,
            run,
            observation,
        };
        report.summarize(sink)?;

        Ok(report)
    }
}

/// Runs every benchmark `options` selects, in order, stopping at the first one that fails.
pub fn run_all<W>(options: &Options, sink: &Sink<W>) -> Result<Vec<Report>, BenchError>
where
    W: Write + Send,
{
    options
        .selected()
        .into_iter()
        .map(|bench| bench.run(options, sink))
        .collect()
}

impl Report {
    fn summarize<W: Write>(&self, sink: &Sink<W>) -> io::Result<()> {
        sink.line(format_args!(
            "{} elapsed: {:.6} s",
            self.bench.label(),
            self.run.elapsed().as_secs_f64()
        ))?;

        match self.observation {
            Observation::Occupancy { peak, limit } => {
                sink.line(format_args!("peak occupancy: {}/{}", peak, limit))?
            }
            Observation::Phases { ordered } => sink.line(format_args!(
                "phases ordered: {}",
                if ordered { "yes" } else { "no" }
            ))?,
        }

        sink.line(format_args!("---------------------------------"))
    }
}

fn admitted<P, W>(
    runner: &Runner,
    label: &'static str,
    primitive: &P,
    sink: &Sink<W>,
    limit: usize,
) -> Result<(BenchmarkRun, Observation), BenchError>
where
    P: Admit,
    W: Write + Send,
{
    let occupancy = Occupancy::new();
    let run = runner.run_admitted(label, primitive, |ordinal| {
        let _inside = occupancy.enter();
        worker_line(sink, ordinal, label)
    })?;

    Ok((run, occupied(&occupancy, limit)))
}

fn occupied(occupancy: &Occupancy, limit: usize) -> Observation {
    Observation::Occupancy {
        peak: occupancy.peak(),
        limit,
    }
}

fn worker_line<W: Write>(sink: &Sink<W>, ordinal: usize, label: &str) -> io::Result<()> {
    sink.line(format_args!("Worker {}: {} ({})", ordinal, random_char(), label))
}

// A random printable ASCII character, space through tilde.
fn random_char() -> char {
    char::from(rand::rng().random_range(32u8..=126))
}

#[cfg(test)]
mod tests {
    use super::{random_char, Benchmark, Observation};
    use crate::{Options, Sink};

    #[test]
    fn random_chars_are_printable() {
        for _ in 0..1000 {
            let c = random_char();
            assert!((' '..='~').contains(&c));
        }
    }

    #[test]
    fn labels_are_distinct() {
        let mut labels: Vec<_> = Benchmark::ALL.iter().map(|bench| bench.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), Benchmark::ALL.len());
    }

    #[test]
    fn spin_lock_report_is_exclusive() {
        let sink = Sink::new(Vec::new());
        let report = Benchmark::SpinLock.run(&Options::default(), &sink).unwrap();

        assert_eq!(report.run.workers(), 8);
        assert_eq!(report.observation, Observation::Occupancy { peak: 1, limit: 1 });

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text.lines().filter(|line| line.ends_with("(SpinLock)")).count(), 8);
        assert!(text.contains("SpinLock elapsed: "));
        assert!(text.contains("peak occupancy: 1/1"));
    }
}
