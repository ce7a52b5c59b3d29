//! A monitor-style lock built out of a busy flag and a condition variable.
//!
//! See the documentation of the [`MonitorLock`] struct for more information.
//!
//! [`MonitorLock`]: struct.MonitorLock.html

use std::sync::{Condvar, Mutex};

use crate::util;
use crate::Admit;

/// A mutual-exclusion lock that parks contending threads on a condition variable.
///
/// A `MonitorLock` keeps a single "busy" flag behind a `std::sync::Mutex`. A thread that calls
/// `enter` while the flag is set waits on a `Condvar` until some other thread calls `exit`, which
/// clears the flag and wakes one waiter. The flag is only ever tested or changed while holding the
/// inner mutex, so a notification can't slip in between a waiter's check and its wait.
///
/// Unlike `std::sync::Mutex`, the lock is not tied to a guard or to the data it protects: `enter`
/// and `exit` are separate calls, and it's the caller's job to pair them. [`Admit::admit`] gives a
/// scope-based alternative.
///
/// Waking is "wake one", with no ordering promise about which waiter gets the lock next.
///
/// [`Admit::admit`]: trait.Admit.html#method.admit
///
/// # Example
///
/// ```
/// use syncbench::MonitorLock;
/// use std::sync::Arc;
/// use std::thread;
///
/// let lock = Arc::new(MonitorLock::new());
/// let mut handles = Vec::new();
///
/// for i in 0..4 {
///     let lock = lock.clone();
///     handles.push(thread::spawn(move || {
///         lock.enter();
///         println!("thread {} holds the monitor", i);
///         lock.exit();
///     }));
/// }
///
/// for handle in handles {
///     handle.join().unwrap();
/// }
///
/// assert!(!lock.is_held());
/// ```
#[derive(Debug, Default)]
pub struct MonitorLock {
    busy: Mutex<bool>,
    freed: Condvar,
}

impl MonitorLock {
    /// Creates a new, unheld `MonitorLock`.
    pub fn new() -> MonitorLock {
        MonitorLock {
            busy: Mutex::new(false),
            freed: Condvar::new(),
        }
    }

    /// Blocks the current thread until the monitor is free, then takes it.
    ///
    /// There is no timeout: this waits for as long as it takes another thread to call `exit`.
    pub fn enter(&self) {
        let mut busy = util::guts(self.busy.lock());

        // a wakeup only means the flag *was* cleared at some point, so test it again
        while *busy {
            log::trace!("monitor busy, parking");
            busy = util::guts(self.freed.wait(busy));
        }

        *busy = true;
    }

    /// Releases the monitor and wakes one thread waiting in `enter`, if there is one.
    ///
    /// Calling `exit` without a matching `enter` breaks the lock for whoever holds it.
    pub fn exit(&self) {
        let mut busy = util::guts(self.busy.lock());
        debug_assert!(*busy, "MonitorLock::exit called on a free monitor");
        *busy = false;
        self.freed.notify_one();
    }

    /// Returns whether some thread currently holds the monitor.
    pub fn is_held(&self) -> bool {
        *util::guts(self.busy.lock())
    }
}

impl Admit for MonitorLock {
    fn acquire(&self) {
        self.enter();
    }

    fn release(&self) {
        self.exit();
    }
}
