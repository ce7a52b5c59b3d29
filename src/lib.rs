//! A collection of hand-built locks, gates and barriers, plus a harness that times them under
//! identical contention.
//!
//! This library contains the following synchronization primitives:
//!
//! * [`MonitorLock`], a lock made of a busy flag and a condition variable.
//! * [`SlimGate`], a counting semaphore made of a permit count and a condition variable.
//! * [`SpinLock`] and [`YieldingSpinLock`], busy-wait locks over an atomic test-and-set flag.
//! * [`Rendezvous`], a barrier that releases a fixed number of parties once all have arrived.
//! * [`NativeGate`], the platform's own counting semaphore, as a baseline for `SlimGate`.
//!
//! The lock and gate types all implement [`Admit`], which is what the benchmark [`Runner`] uses
//! to put workers through them. The [`suite`] module wires each primitive into the runner along
//! with an output [`Sink`] and a probe from the [`probe`] module, and is what the `syncbench`
//! binary runs.
//!
//! [`MonitorLock`]: struct.MonitorLock.html
//! [`SlimGate`]: struct.SlimGate.html
//! [`SpinLock`]: struct.SpinLock.html
//! [`YieldingSpinLock`]: struct.YieldingSpinLock.html
//! [`Rendezvous`]: struct.Rendezvous.html
//! [`NativeGate`]: struct.NativeGate.html
//! [`Admit`]: trait.Admit.html
//! [`Runner`]: struct.Runner.html
//! [`Sink`]: struct.Sink.html
//! [`suite`]: suite/index.html
//! [`probe`]: probe/index.html

#![deny(missing_docs)]

mod bench;
mod error;
mod gate;
mod monitor;
mod native;
mod options;
pub mod probe;
mod rendezvous;
mod sink;
mod spin;
pub mod suite;
mod util;

pub use bench::{BenchmarkRun, Runner};
pub use error::BenchError;
pub use gate::SlimGate;
pub use monitor::MonitorLock;
pub use native::NativeGate;
pub use options::Options;
pub use probe::{Occupancy, Timeline};
pub use rendezvous::Rendezvous;
pub use sink::Sink;
pub use spin::{SpinLock, YieldingSpinLock};

/// A primitive that admits threads into a guarded section and lets them out again.
///
/// Lock-style primitives admit one thread at a time; gate-style primitives admit up to their
/// capacity. Every `release` must follow an `acquire` on the same thread of work.
pub trait Admit: Sync {
    /// Blocks (or spins) until the current thread is admitted.
    fn acquire(&self);

    /// Lets the current thread out, making room for another.
    fn release(&self);

    /// Acquires the primitive, then returns a guard object that releases it upon drop.
    ///
    /// # Example
    ///
    /// ```
    /// use syncbench::{Admit, SlimGate};
    ///
    /// let gate = SlimGate::new(2);
    /// {
    ///     let _permit = gate.admit();
    ///     assert_eq!(gate.available(), 1);
    /// } // _permit drops, handing the permit back
    /// assert_eq!(gate.available(), 2);
    /// ```
    fn admit(&self) -> Admission<'_, Self>
    where
        Self: Sized,
    {
        self.acquire();
        Admission { primitive: self }
    }
}

/// An opaque guard struct that releases a borrowed [`Admit`] primitive on drop.
///
/// See [`Admit::admit`] for more information about this struct.
///
/// [`Admit`]: trait.Admit.html
/// [`Admit::admit`]: trait.Admit.html#method.admit
#[derive(Debug)]
pub struct Admission<'a, P: Admit> {
    primitive: &'a P,
}

impl<P: Admit> Drop for Admission<'_, P> {
    fn drop(&mut self) {
        self.primitive.release();
    }
}
