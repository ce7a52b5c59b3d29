//! A fixed-party barrier, letting a group of threads wait until all of them have arrived.
//!
//! See the documentation of the [`Rendezvous`] struct for more information.
//!
//! [`Rendezvous`]: struct.Rendezvous.html

use std::sync::{Condvar, Mutex};

use crate::util;

/// A synchronization point that holds every arriving thread until a fixed number have arrived.
///
/// A `Rendezvous` is created with a party count. Each party calls `arrive_and_wait` once; the call
/// blocks until the last of the parties arrives, at which point all of them return together. No
/// party can return from `arrive_and_wait` before every party has called it, so anything a party
/// does before arriving is finished before anything any party does afterwards begins.
///
/// Once a group has been released, the barrier resets itself and can be used again by the same
/// number of parties. Each use is tracked as a separate "generation", so a fast thread that
/// arrives for the next round can't be confused with a slow one still leaving the last.
///
/// `Rendezvous` fills the same role as `std::sync::Barrier`, built out of a counter and a
/// condition variable.
///
/// # Example
///
/// ```
/// use syncbench::Rendezvous;
/// use std::thread;
///
/// let barrier = Rendezvous::new(5);
///
/// thread::scope(|s| {
///     for i in 0..5 {
///         let barrier = &barrier;
///         s.spawn(move || {
///             println!("thread {} before", i);
///             barrier.arrive_and_wait();
///             println!("thread {} after", i);
///         });
///     }
/// });
/// ```
#[derive(Debug)]
pub struct Rendezvous {
    parties: usize,
    state: Mutex<Round>,
    released: Condvar,
}

#[derive(Debug)]
struct Round {
    arrived: usize,
    generation: usize,
}

impl Rendezvous {
    /// Creates a new `Rendezvous` for the given number of parties.
    ///
    /// # Panics
    ///
    /// Panics if `parties` is zero.
    pub fn new(parties: usize) -> Rendezvous {
        assert!(parties > 0, "a Rendezvous needs at least one party");
        log::debug!("new Rendezvous for {} parties", parties);

        Rendezvous {
            parties,
            state: Mutex::new(Round {
                arrived: 0,
                generation: 0,
            }),
            released: Condvar::new(),
        }
    }

    /// Returns the number of parties this barrier waits for.
    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Returns how many parties have arrived in the current round.
    pub fn arrived(&self) -> usize {
        util::guts(self.state.lock()).arrived
    }

    /// Blocks the current thread until all parties have called this function.
    ///
    /// Returns `true` to exactly one caller per round: the one whose arrival released the others.
    pub fn arrive_and_wait(&self) -> bool {
        let mut round = util::guts(self.state.lock());
        let generation = round.generation;

        round.arrived += 1;
        if round.arrived == self.parties {
            round.arrived = 0;
            round.generation = round.generation.wrapping_add(1);
            log::trace!("last of {} parties arrived, releasing", self.parties);
            self.released.notify_all();
            return true;
        }

        // only a change of generation means this round is over; anything else is spurious
        while round.generation == generation {
            round = util::guts(self.released.wait(round));
        }

        false
    }
}
