//! Some utility functions that don't need to be part of the public release.

use std::sync::LockResult;

// Unwrap a LockResult to get the guard even when poisoned.
//
// Every guard in this crate protects a plain flag or counter that is never left half-updated, so
// a worker that panicked while holding one hasn't broken anything the next holder relies on.
pub fn guts<T>(res: LockResult<T>) -> T {
    match res {
        Ok(guard) => guard,
        Err(poison) => poison.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::guts;
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[test]
    fn poisoned_guard_is_recovered() {
        let flag = Arc::new(Mutex::new(false));

        let inner = flag.clone();
        let res = thread::spawn(move || {
            let mut held = inner.lock().unwrap();
            *held = true;
            panic!("poison the lock");
        })
        .join();

        assert!(res.is_err());
        assert!(flag.is_poisoned());
        assert!(*guts(flag.lock()));
    }
}
