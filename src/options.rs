use clap::builder::RangedU64ValueParser;
use clap::Parser;

use crate::suite::Benchmark;

/// Command-line configuration for a benchmark session.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "syncbench",
    version,
    about = "Time hand-built synchronization primitives under contention"
)]
pub struct Options {
    /// Number of worker threads spawned for each benchmark.
    #[arg(
        short,
        long = "workers",
        default_value_t = 8,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub worker_count: usize,

    /// Most workers a gate-style primitive lets in at once.
    #[arg(
        short,
        long = "permits",
        default_value_t = 3,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub permit_capacity: usize,

    /// Only run these benchmarks. They still run in the usual order.
    #[arg(short, long = "bench", value_enum)]
    pub benches: Vec<Benchmark>,
}

impl Options {
    /// Returns the benchmarks to run, in the order they run in.
    pub fn selected(&self) -> Vec<Benchmark> {
        Benchmark::ALL
            .iter()
            .copied()
            .filter(|bench| self.benches.is_empty() || self.benches.contains(bench))
            .collect()
    }
}

impl Default for Options {
    fn default() -> Options {
        Options {
            worker_count: 8,
            permit_capacity: 3,
            benches: Vec::new(),
        }
    }
}
