//! Transaction lock table
//!
//! One entry per transaction between `acquire` and `release`, recording the
//! sorted resource list and the single mode used for all of them. The entry
//! is reserved as soon as `acquire` is called, so a second acquire by the
//! same transaction is rejected even while the first is still queued.
//!
//! Phase transitions:
//! - (absent) → `Queued` (reserve)
//! - `Queued` → `Admitted` (record lock order)
//! - `Admitted` → `Locked` (all resource locks granted)
//! - `Locked` → `Releasing` (begin release)
//! - `Releasing` → (absent) (finish release)
//! - `Queued` / `Admitted` → (absent) (bounded acquire gave up)

use crate::error::{LockError, LockResult};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use strata_core::{LockMode, TxnId};

/// Where a transaction is in its acquire/release lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnPhase {
    /// Waiting in the admission queue
    Queued,
    /// Holds an admission slot, acquiring resource locks
    Admitted,
    /// Holds every resource lock in its set
    Locked,
    /// Release in progress
    Releasing,
}

impl fmt::Display for TxnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxnPhase::Queued => write!(f, "queued"),
            TxnPhase::Admitted => write!(f, "admitted"),
            TxnPhase::Locked => write!(f, "locked"),
            TxnPhase::Releasing => write!(f, "releasing"),
        }
    }
}

/// The resources one transaction holds, in acquisition order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSet {
    /// Sorted, deduplicated resource names
    pub resources: Vec<String>,
    /// Mode applied to every resource
    pub mode: LockMode,
    /// Lifecycle phase
    pub phase: TxnPhase,
}

/// Per-transaction lock set records
#[derive(Debug, Default)]
pub struct LockTable {
    sets: DashMap<TxnId, LockSet>,
}

impl LockTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the entry for `txn`; fails if it already has one.
    pub fn reserve(&self, txn: TxnId, mode: LockMode) -> LockResult<()> {
        match self.sets.entry(txn) {
            Entry::Occupied(_) => Err(LockError::AlreadyLocked { txn }),
            Entry::Vacant(slot) => {
                slot.insert(LockSet {
                    resources: Vec::new(),
                    mode,
                    phase: TxnPhase::Queued,
                });
                Ok(())
            }
        }
    }

    /// Store the acquisition order for an admitted transaction.
    ///
    /// Done before any resource lock is taken so a stuck acquire is visible.
    pub fn record_admitted(&self, txn: TxnId, resources: Vec<String>) {
        if let Some(mut set) = self.sets.get_mut(&txn) {
            set.resources = resources;
            set.phase = TxnPhase::Admitted;
        }
    }

    /// Mark every resource of `txn` as granted
    pub fn mark_locked(&self, txn: TxnId) {
        if let Some(mut set) = self.sets.get_mut(&txn) {
            set.phase = TxnPhase::Locked;
        }
    }

    /// Move a fully locked set to `Releasing` and return a copy of it.
    ///
    /// Fails with `NotLocked` if `txn` has no entry, or is still acquiring,
    /// or another release of it is already under way.
    pub fn begin_release(&self, txn: TxnId) -> LockResult<LockSet> {
        match self.sets.get_mut(&txn) {
            Some(mut set) if set.phase == TxnPhase::Locked => {
                set.phase = TxnPhase::Releasing;
                Ok(set.value().clone())
            }
            _ => Err(LockError::NotLocked { txn }),
        }
    }

    /// Drop the entry of `txn`, returning it if present
    pub fn remove(&self, txn: TxnId) -> Option<LockSet> {
        self.sets.remove(&txn).map(|(_, set)| set)
    }

    /// Copy of the entry for `txn`
    pub fn get(&self, txn: TxnId) -> Option<LockSet> {
        self.sets.get(&txn).map(|set| set.value().clone())
    }

    /// True if `txn` fully holds its lock set
    pub fn is_locked(&self, txn: TxnId) -> bool {
        self.sets
            .get(&txn)
            .map(|set| set.phase == TxnPhase::Locked)
            .unwrap_or(false)
    }

    /// Number of transactions with an entry
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// True if no transaction has an entry
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// All entries, sorted by transaction id
    pub fn entries(&self) -> Vec<(TxnId, LockSet)> {
        let mut out: Vec<_> = self
            .sets
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        out.sort_by_key(|(txn, _)| *txn);
        out
    }
}
