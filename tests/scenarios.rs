use std::collections::BTreeSet;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use syncbench::suite::{self, Benchmark, Observation};
use syncbench::{
    Admit, MonitorLock, NativeGate, Occupancy, Options, Runner, Sink, SlimGate, SpinLock,
    YieldingSpinLock,
};

// Spin locks never give up, so a liveness bug would hang the test binary instead of failing it.
fn within<T, F>(limit: Duration, scenario: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(scenario());
    });

    match rx.recv_timeout(limit) {
        Ok(value) => value,
        Err(RecvTimeoutError::Timeout) => panic!("scenario still running after {:?}", limit),
        Err(RecvTimeoutError::Disconnected) => panic!("scenario panicked"),
    }
}

fn options(workers: usize, permits: usize) -> Options {
    Options {
        worker_count: workers,
        permit_capacity: permits,
        ..Options::default()
    }
}

fn run_to_text(bench: Benchmark, options: &Options) -> (suite::Report, String) {
    let sink = Sink::new(Vec::new());
    let report = bench.run(options, &sink).unwrap();
    let text = String::from_utf8(sink.into_inner()).unwrap();
    (report, text)
}

// Parses "Worker <i>: <c> (<label>)", returning the ordinal.
fn worker_ordinal(line: &str, label: &str) -> Option<usize> {
    let rest = line.strip_prefix("Worker ")?;
    let (ordinal, rest) = rest.split_once(": ")?;
    let mut chars = rest.chars();
    let c = chars.next()?;
    assert!((' '..='~').contains(&c), "unprintable character in {:?}", line);
    if chars.as_str() != format!(" ({})", label) {
        return None;
    }
    ordinal.parse().ok()
}

fn hammer<P: Admit>(primitive: &P, workers: usize, rounds: usize) -> Occupancy {
    let occupancy = Occupancy::new();
    thread::scope(|s| {
        for _ in 0..workers {
            s.spawn(|| {
                for _ in 0..rounds {
                    let _admission = primitive.admit();
                    let _inside = occupancy.enter();
                }
            });
        }
    });
    occupancy
}

#[test]
fn monitor_writes_one_whole_line_per_worker() {
    let (report, text) = run_to_text(Benchmark::Monitor, &options(8, 3));

    let ordinals: Vec<usize> = text
        .lines()
        .filter(|line| line.starts_with("Worker "))
        .map(|line| worker_ordinal(line, "Monitor").expect("garbled worker line"))
        .collect();

    assert_eq!(ordinals.len(), 8);
    let unique: BTreeSet<_> = ordinals.iter().copied().collect();
    assert_eq!(unique, (0..8).collect());
    assert_eq!(report.observation, Observation::Occupancy { peak: 1, limit: 1 });
}

#[test]
fn slim_gate_never_admits_more_than_its_capacity() {
    let (report, text) = run_to_text(Benchmark::SlimGate, &options(8, 3));

    match report.observation {
        Observation::Occupancy { peak, limit } => {
            assert_eq!(limit, 3);
            assert!(peak >= 1 && peak <= 3, "peak occupancy was {}", peak);
        }
        other => panic!("unexpected observation {:?}", other),
    }
    assert!(text.contains("peak occupancy: "));
}

#[test]
fn gates_fill_up_when_the_section_is_slow() {
    let runner = Runner::new(8);

    for capacity in [1, 3] {
        let slim = SlimGate::new(capacity);
        let native = NativeGate::new(capacity).unwrap();

        let slim_seen = Occupancy::new();
        runner
            .run_admitted("slim", &slim, |_| {
                let _inside = slim_seen.enter();
                thread::sleep(Duration::from_millis(30));
                Ok(())
            })
            .unwrap();

        let native_seen = Occupancy::new();
        runner
            .run_admitted("native", &native, |_| {
                let _inside = native_seen.enter();
                thread::sleep(Duration::from_millis(30));
                Ok(())
            })
            .unwrap();

        assert_eq!(slim_seen.peak(), capacity);
        assert_eq!(native_seen.peak(), capacity);
        assert_eq!(slim.available(), capacity);
        assert_eq!(native.available(), capacity);
    }
}

#[test]
fn barrier_prints_every_before_ahead_of_any_after() {
    let (report, text) = run_to_text(Benchmark::Barrier, &options(5, 3));

    let lines: Vec<&str> = text.lines().collect();
    let befores: Vec<usize> = (0..lines.len())
        .filter(|&i| worker_ordinal(lines[i], "before Barrier").is_some())
        .collect();
    let afters: Vec<usize> = (0..lines.len())
        .filter(|&i| worker_ordinal(lines[i], "after Barrier").is_some())
        .collect();

    assert_eq!(befores.len(), 5);
    assert_eq!(afters.len(), 5);
    assert!(befores.iter().max() < afters.iter().min());
    assert_eq!(report.observation, Observation::Phases { ordered: true });
}

#[test]
fn full_suite_runs_in_the_fixed_order() {
    let sink = Sink::new(Vec::new());
    let reports = suite::run_all(&Options::default(), &sink).unwrap();

    let order: Vec<Benchmark> = reports.iter().map(|report| report.bench).collect();
    assert_eq!(order, Benchmark::ALL);

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let headings: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("Testing "))
        .collect();
    assert_eq!(
        headings,
        [
            "Mutex:",
            "NativeGate:",
            "SpinLock:",
            "Barrier:",
            "YieldingSpinLock:",
            "Monitor:",
            "SlimGate:",
        ]
    );

    // one line per worker, two for the barrier
    let worker_lines = text.lines().filter(|line| line.starts_with("Worker ")).count();
    assert_eq!(worker_lines, 8 * 8);
    assert_eq!(text.matches(" elapsed: ").count(), 7);

    for report in reports {
        match report.observation {
            Observation::Occupancy { peak, limit } => assert!(peak <= limit),
            Observation::Phases { ordered } => assert!(ordered),
        }
    }
}

#[test]
fn locks_stay_exclusive_and_live_under_heavy_contention() {
    within(Duration::from_secs(60), || {
        let spin = SpinLock::new();
        let seen = hammer(&spin, 8, 500);
        assert_eq!(seen.peak(), 1);
        assert_eq!(seen.entries(), 4_000);
        assert!(!spin.is_locked());

        let yielding = YieldingSpinLock::new();
        let seen = hammer(&yielding, 16, 2_000);
        assert_eq!(seen.peak(), 1);
        assert_eq!(seen.exits(), 32_000);
        assert!(!yielding.is_locked());

        let monitor = MonitorLock::new();
        let seen = hammer(&monitor, 16, 2_000);
        assert_eq!(seen.peak(), 1);
        assert!(!monitor.is_held());

        let slim = SlimGate::new(1);
        let seen = hammer(&slim, 16, 2_000);
        assert_eq!(seen.peak(), 1);
        assert_eq!(slim.available(), 1);
    });
}

#[test]
fn gates_conserve_permits_under_heavy_contention() {
    within(Duration::from_secs(60), || {
        let slim = SlimGate::new(4);
        let seen = hammer(&slim, 16, 2_000);
        assert!(seen.peak() <= 4);
        assert_eq!(seen.entries(), seen.exits());
        assert_eq!(slim.available(), 4);

        let native = NativeGate::new(4).unwrap();
        let seen = hammer(&native, 16, 2_000);
        assert!(seen.peak() <= 4);
        assert_eq!(seen.entries(), seen.exits());
        assert_eq!(native.available(), 4);
    });
}
