//! Busy-wait locks, with and without yielding to the scheduler.
//!
//! The primary types in this module are the [`SpinLock`] and the [`YieldingSpinLock`] structs. See
//! the documentation on those types for further information.
//!
//! [`SpinLock`]: struct.SpinLock.html
//! [`YieldingSpinLock`]: struct.YieldingSpinLock.html

use std::hint;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::Admit;

/// A lock that busy-polls an atomic flag until it can claim it.
///
/// `acquire` repeatedly performs an atomic test-and-set on the flag. The swap that observes the
/// flag clear is the same operation that sets it, so two threads can never both see it free.
/// Waiting threads never suspend: they keep their processor the whole time, only issuing a spin
/// hint between attempts. Under heavy contention this burns CPU; see [`YieldingSpinLock`] for a
/// variant that gives the processor back between attempts.
///
/// Correctness rests entirely on the atomicity of the swap. There's no guard or condition
/// variable involved, and no fairness: whichever thread's swap lands first wins.
///
/// [`YieldingSpinLock`]: struct.YieldingSpinLock.html
///
/// # Example
///
/// ```
/// use syncbench::SpinLock;
/// use std::thread;
///
/// let lock = SpinLock::new();
///
/// thread::scope(|s| {
///     for i in 0..4 {
///         let lock = &lock;
///         s.spawn(move || {
///             lock.acquire();
///             println!("thread {} is spinning no more", i);
///             lock.release();
///         });
///     }
/// });
///
/// assert!(!lock.is_locked());
/// ```
#[derive(Debug, Default)]
pub struct SpinLock {
    flag: RawSpin,
}

impl SpinLock {
    /// Creates a new, unlocked `SpinLock`.
    pub const fn new() -> SpinLock {
        SpinLock {
            flag: RawSpin::new(),
        }
    }

    /// Spins until the lock is claimed by the current thread.
    pub fn acquire(&self) {
        self.flag.acquire_with(hint::spin_loop);
    }

    /// Makes a single attempt to claim the lock. Returns whether it was claimed.
    pub fn try_acquire(&self) -> bool {
        self.flag.try_acquire()
    }

    /// Unlocks the lock.
    pub fn release(&self) {
        self.flag.release();
    }

    /// Returns whether some thread currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.flag.is_locked()
    }
}

/// A busy-wait lock that yields the processor between attempts.
///
/// A `YieldingSpinLock` works exactly like [`SpinLock`], except that every failed test-and-set is
/// followed by `std::thread::yield_now`, letting the scheduler run something else (possibly the
/// thread that holds the lock) before the next attempt.
///
/// [`SpinLock`]: struct.SpinLock.html
#[derive(Debug, Default)]
pub struct YieldingSpinLock {
    flag: RawSpin,
}

impl YieldingSpinLock {
    /// Creates a new, unlocked `YieldingSpinLock`.
    pub const fn new() -> YieldingSpinLock {
        YieldingSpinLock {
            flag: RawSpin::new(),
        }
    }

    /// Polls the lock, yielding between attempts, until it is claimed by the current thread.
    pub fn acquire(&self) {
        self.flag.acquire_with(thread::yield_now);
    }

    /// Makes a single attempt to claim the lock. Returns whether it was claimed.
    pub fn try_acquire(&self) -> bool {
        self.flag.try_acquire()
    }

    /// Unlocks the lock.
    pub fn release(&self) {
        self.flag.release();
    }

    /// Returns whether some thread currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.flag.is_locked()
    }
}

impl Admit for SpinLock {
    fn acquire(&self) {
        SpinLock::acquire(self);
    }

    fn release(&self) {
        SpinLock::release(self);
    }
}

impl Admit for YieldingSpinLock {
    fn acquire(&self) {
        YieldingSpinLock::acquire(self);
    }

    fn release(&self) {
        YieldingSpinLock::release(self);
    }
}

// The test-and-set flag shared by both lock flavors. `true` means held.
#[derive(Debug, Default)]
struct RawSpin(AtomicBool);

impl RawSpin {
    const fn new() -> RawSpin {
        RawSpin(AtomicBool::new(false))
    }

    fn try_acquire(&self) -> bool {
        !self.0.swap(true, Ordering::Acquire)
    }

    fn acquire_with(&self, mut pause: impl FnMut()) {
        while self.0.swap(true, Ordering::Acquire) {
            pause();
        }
    }

    fn release(&self) {
        self.0.store(false, Ordering::Release);
    }

    fn is_locked(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::{SpinLock, YieldingSpinLock};
    use crate::probe::Occupancy;
    use crate::Admit;
    use std::thread;

    fn hammer<L: Admit>(lock: &L) -> Occupancy {
        let occupancy = Occupancy::new();

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..200 {
                        let _held = lock.admit();
                        let _inside = occupancy.enter();
                    }
                });
            }
        });

        occupancy
    }

    #[test]
    fn try_acquire_fails_while_held() {
        let lock = SpinLock::new();
        assert!(lock.try_acquire());
        assert!(!lock.try_acquire());
        lock.release();
        assert!(lock.try_acquire());
        lock.release();
        assert!(!lock.is_locked());
    }

    #[test]
    fn spin_lock_is_exclusive() {
        let lock = SpinLock::new();
        let occupancy = hammer(&lock);

        assert_eq!(occupancy.peak(), 1);
        assert_eq!(occupancy.entries(), 1600);
        assert!(!lock.is_locked());
    }

    #[test]
    fn yielding_spin_lock_is_exclusive() {
        let lock = YieldingSpinLock::new();
        let occupancy = hammer(&lock);

        assert_eq!(occupancy.peak(), 1);
        assert_eq!(occupancy.entries(), occupancy.exits());
        assert!(!lock.is_locked());
    }
}
