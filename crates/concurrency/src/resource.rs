//! Per-resource reader/writer lock
//!
//! A `ResourceLock` admits many shared holders or one exclusive holder. It
//! records *which* transactions hold it, so release can verify that the
//! releasing transaction really is a holder with a hold count of exactly one.
//!
//! Holder identity is a [`TxnId`], never a thread: a lock taken on one thread
//! may be released from another.
//!
//! ## Fairness
//!
//! Writers are preferred: once a writer is waiting, new shared requests wait
//! behind it. Beyond that, the order in which blocked transactions obtain the
//! lock is whatever order the condvar wakes them in.

use crate::error::{LockError, LockResult};
use crate::status::ResourceHolders;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::BTreeMap;
use std::time::Instant;
use strata_core::{LockMode, TxnId};
use tracing::trace;

#[derive(Debug, Default)]
struct HoldState {
    writer: Option<TxnId>,
    readers: BTreeMap<TxnId, u32>,
    waiting_writers: usize,
}

impl HoldState {
    fn admits_reader(&self) -> bool {
        self.writer.is_none() && self.waiting_writers == 0
    }

    fn admits_writer(&self) -> bool {
        self.writer.is_none() && self.readers.is_empty()
    }
}

/// Reader/writer lock for one named resource
#[derive(Debug)]
pub struct ResourceLock {
    name: String,
    state: Mutex<HoldState>,
    changed: Condvar,
}

impl ResourceLock {
    /// Create an unheld lock for `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(HoldState::default()),
            changed: Condvar::new(),
        }
    }

    /// Name of the resource this lock guards
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until `txn` holds the lock in `mode`.
    pub fn acquire(&self, txn: TxnId, mode: LockMode) {
        // Without a deadline the wait cannot fail.
        let _ = self.acquire_until(txn, mode, None);
    }

    /// Acquire in `mode`, giving up at `deadline`.
    ///
    /// Returns `false` if the deadline passed first; in that case nothing is
    /// held and any readers queued behind this request are woken.
    pub fn acquire_until(&self, txn: TxnId, mode: LockMode, deadline: Option<Instant>) -> bool {
        let mut state = self.state.lock();
        match mode {
            LockMode::Shared => {
                while !state.admits_reader() {
                    if !self.wait(&mut state, deadline) && !state.admits_reader() {
                        return false;
                    }
                }
                *state.readers.entry(txn).or_insert(0) += 1;
            }
            LockMode::Exclusive => {
                state.waiting_writers += 1;
                while !state.admits_writer() {
                    if !self.wait(&mut state, deadline) && !state.admits_writer() {
                        state.waiting_writers -= 1;
                        drop(state);
                        self.changed.notify_all();
                        return false;
                    }
                }
                state.waiting_writers -= 1;
                state.writer = Some(txn);
            }
        }
        trace!(resource = %self.name, %txn, %mode, "resource lock granted");
        true
    }

    fn wait(&self, state: &mut MutexGuard<'_, HoldState>, deadline: Option<Instant>) -> bool {
        match deadline {
            None => {
                self.changed.wait(state);
                true
            }
            Some(deadline) => !self.changed.wait_until(state, deadline).timed_out(),
        }
    }

    /// Release a hold taken by `txn` in `mode`.
    ///
    /// Fails with [`LockError::HoldInvariant`] if `txn` is not a holder in
    /// that mode, or holds it more than once.
    pub fn release(&self, txn: TxnId, mode: LockMode) -> LockResult<()> {
        let mut state = self.state.lock();
        match mode {
            LockMode::Exclusive => match state.writer {
                Some(holder) if holder == txn => state.writer = None,
                Some(holder) => {
                    return Err(self.invariant(txn, format!("exclusive lock held by {}", holder)))
                }
                None => return Err(self.invariant(txn, "exclusive lock not held".to_string())),
            },
            LockMode::Shared => match state.readers.get(&txn).copied() {
                Some(1) => {
                    state.readers.remove(&txn);
                }
                Some(count) => {
                    return Err(self.invariant(txn, format!("unexpected shared hold count {}", count)))
                }
                None => return Err(self.invariant(txn, "shared lock not held".to_string())),
            },
        }
        drop(state);
        self.changed.notify_all();
        trace!(resource = %self.name, %txn, %mode, "resource lock released");
        Ok(())
    }

    fn invariant(&self, txn: TxnId, detail: String) -> LockError {
        LockError::HoldInvariant {
            txn,
            resource: self.name.clone(),
            detail,
        }
    }

    /// Snapshot of the current holders
    pub fn holders(&self) -> ResourceHolders {
        let state = self.state.lock();
        ResourceHolders {
            exclusive: state.writer,
            shared: state.readers.keys().copied().collect(),
            waiting_writers: state.waiting_writers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn t(n: u64) -> TxnId {
        TxnId::new(n)
    }

    #[test]
    fn test_shared_holders_coexist() {
        let lock = ResourceLock::new("db");
        lock.acquire(t(1), LockMode::Shared);
        lock.acquire(t(2), LockMode::Shared);

        let holders = lock.holders();
        assert_eq!(holders.shared, vec![t(1), t(2)]);
        assert_eq!(holders.exclusive, None);

        lock.release(t(1), LockMode::Shared).unwrap();
        lock.release(t(2), LockMode::Shared).unwrap();
        assert!(lock.holders().is_free());
    }

    #[test]
    fn test_exclusive_times_out_behind_shared() {
        let lock = ResourceLock::new("db");
        lock.acquire(t(1), LockMode::Shared);

        let deadline = Instant::now() + Duration::from_millis(20);
        assert!(!lock.acquire_until(t(2), LockMode::Exclusive, Some(deadline)));
        assert_eq!(lock.holders().waiting_writers, 0);
        assert_eq!(lock.holders().exclusive, None);
    }

    #[test]
    fn test_shared_times_out_behind_exclusive() {
        let lock = ResourceLock::new("db");
        lock.acquire(t(1), LockMode::Exclusive);

        let deadline = Instant::now() + Duration::from_millis(20);
        assert!(!lock.acquire_until(t(2), LockMode::Shared, Some(deadline)));
        assert!(lock.holders().shared.is_empty());
    }

    #[test]
    fn test_release_by_non_holder_is_invariant_error() {
        let lock = ResourceLock::new("db");
        lock.acquire(t(1), LockMode::Exclusive);

        let err = lock.release(t(2), LockMode::Exclusive).unwrap_err();
        assert!(matches!(err, LockError::HoldInvariant { ref resource, .. } if resource == "db"));

        let err = lock.release(t(1), LockMode::Shared).unwrap_err();
        assert!(err.to_string().contains("shared lock not held"));

        lock.release(t(1), LockMode::Exclusive).unwrap();
        assert!(lock.release(t(1), LockMode::Exclusive).is_err());
    }

    #[test]
    fn test_double_shared_hold_is_rejected_on_release() {
        let lock = ResourceLock::new("db");
        lock.acquire(t(1), LockMode::Shared);
        lock.acquire(t(1), LockMode::Shared);

        let err = lock.release(t(1), LockMode::Shared).unwrap_err();
        assert!(err.to_string().contains("unexpected shared hold count 2"));
    }

    #[test]
    fn test_release_from_other_thread_wakes_writer() {
        let lock = Arc::new(ResourceLock::new("db"));
        lock.acquire(t(1), LockMode::Shared);

        let granted = Arc::new(AtomicBool::new(false));
        let writer = {
            let lock = Arc::clone(&lock);
            let granted = Arc::clone(&granted);
            thread::spawn(move || {
                lock.acquire(t(2), LockMode::Exclusive);
                granted.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(30));
        assert!(!granted.load(Ordering::SeqCst));

        let releaser = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || lock.release(t(1), LockMode::Shared).unwrap())
        };
        releaser.join().unwrap();
        writer.join().unwrap();

        assert!(granted.load(Ordering::SeqCst));
        assert_eq!(lock.holders().exclusive, Some(t(2)));
    }

    #[test]
    fn test_waiting_writer_blocks_new_readers() {
        let lock = Arc::new(ResourceLock::new("db"));
        lock.acquire(t(1), LockMode::Shared);

        let writer = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || lock.acquire(t(2), LockMode::Exclusive))
        };
        while lock.holders().waiting_writers == 0 {
            thread::sleep(Duration::from_millis(1));
        }

        let deadline = Instant::now() + Duration::from_millis(20);
        assert!(!lock.acquire_until(t(3), LockMode::Shared, Some(deadline)));

        lock.release(t(1), LockMode::Shared).unwrap();
        writer.join().unwrap();
        assert_eq!(lock.holders().exclusive, Some(t(2)));
    }
}
