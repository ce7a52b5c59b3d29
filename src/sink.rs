//! A line writer that many threads can share without garbling each other's lines.

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

use crate::util;

/// A `Write` handle behind a mutex, written to one whole line at a time.
///
/// Each call to `line` takes the sink's lock, writes the formatted text and a newline, flushes,
/// and lets go. The lock is never held for longer than that, so holding it can't get tangled up
/// with whatever primitive the calling worker is inside of.
///
/// # Example
///
/// ```
/// use syncbench::Sink;
///
/// let sink = Sink::new(Vec::new());
/// sink.line(format_args!("Worker {}: {}", 0, 'x')).unwrap();
/// assert_eq!(sink.into_inner(), b"Worker 0: x\n");
/// ```
#[derive(Debug)]
pub struct Sink<W> {
    out: Mutex<W>,
}

impl<W: Write> Sink<W> {
    /// Wraps the given writer.
    pub fn new(out: W) -> Sink<W> {
        Sink {
            out: Mutex::new(out),
        }
    }

    /// Writes one line, atomically with respect to every other caller of `line`.
    pub fn line(&self, args: fmt::Arguments<'_>) -> io::Result<()> {
        let mut out = util::guts(self.out.lock());
        out.write_fmt(args)?;
        out.write_all(b"\n")?;
        out.flush()
    }

    /// Unwraps the sink, returning the writer.
    pub fn into_inner(self) -> W {
        util::guts(self.out.into_inner())
    }
}

impl Sink<io::Stdout> {
    /// Creates a sink over the process's standard output.
    pub fn stdout() -> Sink<io::Stdout> {
        Sink::new(io::stdout())
    }
}
