//! A counting gate built out of a permit count and a condition variable.
//!
//! See the documentation of the [`SlimGate`] struct for more information.
//!
//! [`SlimGate`]: struct.SlimGate.html

use std::sync::{Condvar, Mutex};

use crate::util;
use crate::Admit;

/// A counting semaphore that lets at most `capacity` threads through at once.
///
/// `SlimGate` has the same shape as [`MonitorLock`], with an integer in place of the flag: the
/// number of permits left is kept behind a `std::sync::Mutex`, threads that find it at zero park
/// on a `Condvar`, and each `release` hands back one permit and wakes at most one parked thread.
/// Only one permit becomes free per release, so there's nothing to gain from waking everyone.
///
/// The count never drops below zero, and as long as every `release` is paired with an earlier
/// `acquire` it never climbs above the capacity. An unpaired `release` is a bug in the caller and
/// is only caught by a debug assertion.
///
/// A `SlimGate` created with a capacity of 1 behaves like [`MonitorLock`].
///
/// [`MonitorLock`]: struct.MonitorLock.html
///
/// # Example
///
/// ```
/// use syncbench::SlimGate;
/// use std::sync::Arc;
/// use std::thread;
///
/// let gate = Arc::new(SlimGate::new(3));
/// let mut handles = Vec::new();
///
/// for i in 0..8 {
///     let gate = gate.clone();
///     handles.push(thread::spawn(move || {
///         gate.acquire();
///         println!("thread {} is one of at most three inside", i);
///         gate.release();
///     }));
/// }
///
/// for handle in handles {
///     handle.join().unwrap();
/// }
///
/// assert_eq!(gate.available(), 3);
/// ```
#[derive(Debug)]
pub struct SlimGate {
    capacity: usize,
    permits: Mutex<usize>,
    released: Condvar,
}

impl SlimGate {
    /// Creates a new `SlimGate` with all `capacity` permits available.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero, since such a gate could never let anyone in.
    pub fn new(capacity: usize) -> SlimGate {
        assert!(capacity > 0, "a SlimGate needs at least one permit");
        log::debug!("new SlimGate with {} permits", capacity);

        SlimGate {
            capacity,
            permits: Mutex::new(capacity),
            released: Condvar::new(),
        }
    }

    /// Returns the number of permits this gate was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of permits not currently handed out.
    pub fn available(&self) -> usize {
        *util::guts(self.permits.lock())
    }

    /// Blocks the current thread until a permit is available, then takes it.
    pub fn acquire(&self) {
        let mut permits = util::guts(self.permits.lock());

        while *permits == 0 {
            log::trace!("no permits left, parking");
            permits = util::guts(self.released.wait(permits));
        }

        *permits -= 1;
    }

    /// Takes a permit if one is available right now, without blocking. Returns whether a permit
    /// was taken.
    pub fn try_acquire(&self) -> bool {
        let mut permits = util::guts(self.permits.lock());

        if *permits == 0 {
            false
        } else {
            *permits -= 1;
            true
        }
    }

    /// Hands a permit back and wakes one thread waiting in `acquire`, if there is one.
    pub fn release(&self) {
        let mut permits = util::guts(self.permits.lock());
        debug_assert!(*permits < self.capacity, "SlimGate released more often than acquired");
        *permits += 1;
        self.released.notify_one();
    }
}

impl Admit for SlimGate {
    fn acquire(&self) {
        SlimGate::acquire(self);
    }

    fn release(&self) {
        SlimGate::release(self);
    }
}
