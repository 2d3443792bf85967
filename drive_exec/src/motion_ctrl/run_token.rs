//! Single-flight ownership of the drive

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Condvar, Mutex, PoisonError,
    },
    time::Duration,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Upper bound on a single wait for a cancelled command to release the drive.
const RELEASE_WAIT: Duration = Duration::from_millis(5);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Records whether a motion command owns the drive and whether it has been asked to stop.
#[derive(Debug, Default)]
pub(crate) struct CommandFlag {
    owned: AtomicBool,
    cancelled: AtomicBool,

    /// Signalled when the drive is released
    released: Condvar,
    release_lock: Mutex<()>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CommandFlag {
    /// Take ownership of the drive, returning false if a running command owns it.
    ///
    /// A cancelled command no longer counts as running, so if one still owns the drive this waits
    /// for it to finish its last tick and release the drive.
    pub(crate) fn try_acquire(&self) -> bool {
        loop {
            if self
                .owned
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.cancelled.store(false, Ordering::Release);
                return true;
            }

            if !self.is_cancelled() {
                return false;
            }

            let guard = self
                .release_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if self.is_owned() && self.is_cancelled() {
                self.released.wait_timeout(guard, RELEASE_WAIT).ok();
            }
        }
    }

    /// Ask the owning command to stop. Returns false if no command owns the drive.
    pub(crate) fn cancel(&self) -> bool {
        if self.owned.load(Ordering::Acquire) {
            self.cancelled.store(true, Ordering::Release);
            true
        } else {
            false
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn is_owned(&self) -> bool {
        self.owned.load(Ordering::Acquire)
    }

    /// A command is running if it owns the drive and has not been cancelled.
    pub(crate) fn is_running(&self) -> bool {
        self.is_owned() && !self.is_cancelled()
    }

    pub(crate) fn release(&self) {
        self.owned.store(false, Ordering::Release);

        let _guard = self
            .release_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.released.notify_all();
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;

    #[test]
    fn test_flag_lifecycle() {
        let flag = CommandFlag::default();

        // Cancelling with no owner changes nothing
        assert!(!flag.cancel());
        assert!(!flag.is_cancelled());
        assert!(!flag.is_running());

        assert!(flag.try_acquire());
        assert!(flag.is_running());
        assert!(!flag.try_acquire());

        assert!(flag.cancel());
        assert!(flag.cancel());
        assert!(!flag.is_running());
        assert!(flag.is_owned());

        flag.release();
        assert!(!flag.is_owned());

        // A new owner starts uncancelled
        assert!(flag.try_acquire());
        assert!(flag.is_running());
    }

    #[test]
    fn test_acquire_waits_for_cancelled_owner() {
        let flag = CommandFlag::default();
        assert!(flag.try_acquire());
        assert!(flag.cancel());

        thread::scope(|s| {
            s.spawn(|| {
                thread::sleep(Duration::from_millis(30));
                flag.release();
            });

            // The cancelled owner is not running, so the drive is taken once it lets go
            assert!(flag.try_acquire());
            assert!(flag.is_running());
        });

        // A running owner still blocks acquisition
        assert!(!flag.try_acquire());
    }
}
