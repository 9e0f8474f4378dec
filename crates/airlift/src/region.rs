//! Scoped critical section over the shared-state record.
//!
//! The record is never reachable except through [`SharedRegion::with`],
//! which acquires the lock, runs a closure, and releases on every exit
//! path. Role code cannot hold the lock across an await point because the
//! closure is synchronous.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::state::SharedState;

/// The shared region all roles attach to: the locked record plus the
/// write-once termination flag.
///
/// `finished` deliberately sits outside the lock. It is set exactly once
/// by the orchestrator and read best-effort by the pilot between cycles;
/// that read needs no cross-field consistency.
#[derive(Debug)]
pub struct SharedRegion {
    state: Mutex<SharedState>,
    finished: AtomicBool,
}

impl SharedRegion {
    /// Region for a simulation with `n_passengers` passengers.
    pub fn new(n_passengers: usize) -> Self {
        Self {
            state: Mutex::new(SharedState::new(n_passengers)),
            finished: AtomicBool::new(false),
        }
    }

    /// Run `f` inside the critical section.
    ///
    /// Every read-modify-write of the record and every multi-field read
    /// goes through here; the caller gets back whatever `f` returns
    /// (typically a [`StateSnapshot`](crate::state::StateSnapshot) for
    /// journaling outside the lock).
    pub fn with<R>(&self, f: impl FnOnce(&mut SharedState) -> R) -> R {
        let mut state = self.state.lock();
        f(&mut state)
    }

    /// Announce termination. Called once, by the orchestrator, after the
    /// last passenger has completed.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Release);
    }

    /// Best-effort read of the termination flag.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_releases_the_lock_on_early_return() {
        let region = SharedRegion::new(1);

        let queued: Result<u32, &str> = region.with(|state| {
            state.enqueue_passenger(0);
            if state.passengers_in_queue() > 0 {
                return Err("early");
            }
            Ok(state.passengers_in_queue())
        });
        assert!(queued.is_err());

        // A second entry would deadlock if the closure above leaked the lock.
        let n = region.with(|state| state.passengers_in_queue());
        assert_eq!(n, 1);
    }

    #[test]
    fn finished_flag_is_sticky() {
        let region = SharedRegion::new(0);
        assert!(!region.is_finished());
        region.finish();
        assert!(region.is_finished());
        region.finish();
        assert!(region.is_finished());
    }
}
