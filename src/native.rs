//! A thin wrapper over the platform's counting semaphore.

use std::cell::UnsafeCell;
use std::io;
use std::mem;

use crate::{Admit, BenchError};

/// A counting gate backed by a POSIX unnamed semaphore (`sem_t`).
///
/// `NativeGate` has the same `acquire`/`release` contract as [`SlimGate`], but all the waiting and
/// waking is done by the platform. It's here as a yardstick: whatever `SlimGate` is measured
/// against, `NativeGate` is measured against too.
///
/// The `sem_t` lives in its own heap allocation so that it stays put for its whole life, even when
/// the `NativeGate` itself is moved.
///
/// [`SlimGate`]: struct.SlimGate.html
///
/// # Example
///
/// ```
/// use syncbench::NativeGate;
///
/// let gate = NativeGate::new(2).unwrap();
/// gate.acquire();
/// assert_eq!(gate.available(), 1);
/// gate.release();
/// assert_eq!(gate.available(), 2);
/// ```
pub struct NativeGate {
    capacity: usize,
    sema: Box<UnsafeCell<libc::sem_t>>,
}

// `sem_t` is made to be shared between threads; every access goes through the sem_* functions.
unsafe impl Send for NativeGate {}
unsafe impl Sync for NativeGate {}

impl NativeGate {
    /// Creates a new `NativeGate` with all `capacity` permits available.
    ///
    /// # Errors
    ///
    /// Returns `BenchError::Semaphore` if the platform can't create a semaphore with that many
    /// permits.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<NativeGate, BenchError> {
        assert!(capacity > 0, "a NativeGate needs at least one permit");

        let value = libc::c_uint::try_from(capacity).map_err(|_| {
            BenchError::Semaphore(io::Error::new(
                io::ErrorKind::InvalidInput,
                "too many permits for a platform semaphore",
            ))
        })?;

        // SAFETY: sem_t is plain old data, and sem_init overwrites it before anything reads it
        let sema = Box::new(UnsafeCell::new(unsafe { mem::zeroed::<libc::sem_t>() }));
        if unsafe { libc::sem_init(sema.get(), 0, value) } != 0 {
            return Err(BenchError::Semaphore(io::Error::last_os_error()));
        }

        log::debug!("new NativeGate with {} permits", capacity);
        Ok(NativeGate { capacity, sema })
    }

    /// Returns the number of permits this gate was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of permits not currently handed out.
    pub fn available(&self) -> usize {
        let mut value: libc::c_int = 0;
        if unsafe { libc::sem_getvalue(self.sema.get(), &mut value) } != 0 {
            panic!("sem_getvalue failed: {}", errno::errno());
        }
        // some platforms report waiters as a negative count
        value.max(0) as usize
    }

    /// Blocks the current thread until a permit is available, then takes it.
    pub fn acquire(&self) {
        while unsafe { libc::sem_wait(self.sema.get()) } != 0 {
            let err = errno::errno();
            if err.0 != libc::EINTR {
                panic!("sem_wait failed: {}", err);
            }
        }
    }

    /// Hands a permit back, waking one thread waiting in `acquire` if there is one.
    pub fn release(&self) {
        if unsafe { libc::sem_post(self.sema.get()) } != 0 {
            panic!("sem_post failed: {}", errno::errno());
        }
    }
}

impl Admit for NativeGate {
    fn acquire(&self) {
        NativeGate::acquire(self);
    }

    fn release(&self) {
        NativeGate::release(self);
    }
}

impl Drop for NativeGate {
    fn drop(&mut self) {
        unsafe {
            libc::sem_destroy(self.sema.get());
        }
    }
}

impl std::fmt::Debug for NativeGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeGate")
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::NativeGate;
    use crate::probe::Occupancy;
    use crate::{Admit, SlimGate};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn moving_the_gate_keeps_the_semaphore() {
        let gate = NativeGate::new(1).unwrap();
        gate.acquire();
        let moved = Box::new(gate);
        assert_eq!(moved.available(), 0);
        moved.release();
        assert_eq!(moved.available(), 1);
    }

    #[test]
    fn capacity_one_is_exclusive() {
        let gate = NativeGate::new(1).unwrap();
        let occupancy = Occupancy::new();

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..100 {
                        let _permit = gate.admit();
                        let _inside = occupancy.enter();
                    }
                });
            }
        });

        assert_eq!(occupancy.peak(), 1);
        assert_eq!(gate.available(), 1);
    }

    // the hand-built gate should admit exactly what the platform one admits
    #[test]
    fn agrees_with_slim_gate() {
        fn peak_of<G: Admit>(gate: &G) -> usize {
            let occupancy = Occupancy::new();
            thread::scope(|s| {
                for _ in 0..8 {
                    s.spawn(|| {
                        let _permit = gate.admit();
                        let _inside = occupancy.enter();
                        thread::sleep(Duration::from_millis(50));
                    });
                }
            });
            assert_eq!(occupancy.entries(), occupancy.exits());
            occupancy.peak()
        }

        let native = NativeGate::new(3).unwrap();
        let slim = SlimGate::new(3);

        assert_eq!(peak_of(&native), 3);
        assert_eq!(peak_of(&slim), 3);
        assert_eq!(native.available(), slim.available());
    }
}
