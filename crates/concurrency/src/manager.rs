//! Lock coordinator
//!
//! `LockManager` owns the resource registry, the admission queue and the
//! transaction lock table, and drives them through acquire and release.
//!
//! ## Acquire sequence
//!
//! ```text
//! 1. Resolve the scope to sorted, deduplicated names (global scope fails here)
//! 2. Reserve the lock table entry (reentrant acquire fails here)
//! 3. Wait for admission: free slot AND head of queue
//! 4. Record the lock order in the lock table
//! 5. Lock each resource in sorted order, in the transaction's single mode
//! 6. Mark the lock set Locked
//! ```
//!
//! Because every transaction locks in the same order, no cycle of waits can
//! form. Waits on resource locks happen with no queue or registry lock held.
//!
//! ## Release sequence
//!
//! ```text
//! 1. Move the entry to Releasing (no locked set fails here)
//! 2. Release each resource in the recorded mode, checking holder bookkeeping
//! 3. Remove the entry
//! 4. Return the admission slot, waking queued transactions
//! ```

use crate::admission::AdmissionQueue;
use crate::config::LockingConfig;
use crate::error::{LockError, LockResult, WaitPhase};
use crate::guard::LockSetGuard;
use crate::lock_table::{LockSet, LockTable};
use crate::registry::ResourceRegistry;
use crate::scope::LockScope;
use crate::status::LockStatus;
use std::time::{Duration, Instant};
use strata_core::{LockMode, TxnId};
use tracing::{debug, error, warn};

/// Acquire/release seam used by transaction runners
pub trait Locking: Send + Sync {
    /// Block until `txn` holds every resource in `scope`
    fn acquire(&self, txn: TxnId, scope: LockScope, updating: bool) -> LockResult<()>;

    /// Release everything `txn` holds
    fn release(&self, txn: TxnId) -> LockResult<()>;
}

/// Deadlock-free lock manager with bounded, FIFO admission
///
/// One instance per engine session; construct a fresh one per test.
#[derive(Debug)]
pub struct LockManager {
    registry: ResourceRegistry,
    admission: AdmissionQueue,
    table: LockTable,
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new(&LockingConfig::default())
    }
}

impl LockManager {
    /// Create a manager from configuration
    pub fn new(config: &LockingConfig) -> Self {
        Self::with_parallel(config.effective_parallel())
    }

    /// Create a manager admitting at most `parallel` transactions (floor of 1)
    pub fn with_parallel(parallel: usize) -> Self {
        Self {
            registry: ResourceRegistry::new(),
            admission: AdmissionQueue::new(parallel),
            table: LockTable::new(),
        }
    }

    /// Lock `scope` for `txn`, blocking until granted.
    ///
    /// `updating` selects exclusive mode for every resource, otherwise shared.
    ///
    /// # Errors
    ///
    /// - `UnsupportedGlobalLock` for [`LockScope::Global`]
    /// - `AlreadyLocked` if `txn` already has a lock set (or a pending acquire)
    pub fn acquire(
        &self,
        txn: TxnId,
        scope: impl Into<LockScope>,
        updating: bool,
    ) -> LockResult<()> {
        self.acquire_inner(txn, scope.into(), updating, None)
    }

    /// Like [`acquire`](Self::acquire), but gives up after `timeout`.
    ///
    /// On `Timeout` nothing remains: the ticket is withdrawn, any resource
    /// locks already taken are released and the admission slot is returned.
    pub fn acquire_timeout(
        &self,
        txn: TxnId,
        scope: impl Into<LockScope>,
        updating: bool,
        timeout: Duration,
    ) -> LockResult<()> {
        self.acquire_inner(txn, scope.into(), updating, Some(timeout))
    }

    /// Acquire and return a guard that releases on drop
    pub fn lock(
        &self,
        txn: TxnId,
        scope: impl Into<LockScope>,
        updating: bool,
    ) -> LockResult<LockSetGuard<'_>> {
        self.acquire(txn, scope, updating)?;
        Ok(LockSetGuard::new(self, txn))
    }

    fn acquire_inner(
        &self,
        txn: TxnId,
        scope: LockScope,
        updating: bool,
        timeout: Option<Duration>,
    ) -> LockResult<()> {
        let start = Instant::now();
        // An unrepresentable deadline waits without bound.
        let deadline = timeout.and_then(|t| start.checked_add(t));
        let mode = LockMode::from_updating(updating);

        if scope.is_global() {
            warn!(%txn, "global lock requested");
        }
        let resources = scope.into_lock_order()?;

        self.table
            .reserve(txn, mode)
            .map_err(|e| self.contract_violation(e))?;

        if !self.admission.enter_until(txn, deadline) {
            self.table.remove(txn);
            return Err(self.timed_out(txn, WaitPhase::Admission, start));
        }

        self.table.record_admitted(txn, resources.clone());

        for (idx, name) in resources.iter().enumerate() {
            let lock = self.registry.get_or_create(name);
            if !lock.acquire_until(txn, mode, deadline) {
                self.unwind(txn, mode, &resources[..idx]);
                return Err(self.timed_out(txn, WaitPhase::Resource(name.clone()), start));
            }
        }

        self.table.mark_locked(txn);
        debug!(%txn, %mode, ?resources, waited = ?start.elapsed(), "lock set granted");
        Ok(())
    }

    /// Back out a partially acquired lock set after a timeout.
    fn unwind(&self, txn: TxnId, mode: LockMode, granted: &[String]) {
        for name in granted {
            if let Some(lock) = self.registry.get(name) {
                if let Err(e) = lock.release(txn, mode) {
                    error!(%txn, error = %e, "failed to back out resource lock");
                }
            }
        }
        self.table.remove(txn);
        self.admission.leave();
    }

    fn timed_out(&self, txn: TxnId, phase: WaitPhase, start: Instant) -> LockError {
        let err = LockError::Timeout {
            txn,
            phase,
            waited: start.elapsed(),
        };
        warn!(%txn, error = %err, "acquire timed out");
        err
    }

    fn contract_violation(&self, err: LockError) -> LockError {
        error!(error = %err, "lock contract violated");
        err
    }

    /// Release every resource held by `txn` and free its admission slot.
    ///
    /// # Errors
    ///
    /// - `NotLocked` if `txn` does not hold a complete lock set
    /// - `HoldInvariant` if a resource's holder bookkeeping disagrees; all
    ///   other resources are still released and the slot is still freed
    pub fn release(&self, txn: TxnId) -> LockResult<()> {
        let set = self
            .table
            .begin_release(txn)
            .map_err(|e| self.contract_violation(e))?;

        let mut first_err = None;
        for name in &set.resources {
            let result = match self.registry.get(name) {
                Some(lock) => lock.release(txn, set.mode),
                None => Err(LockError::HoldInvariant {
                    txn,
                    resource: name.clone(),
                    detail: "resource missing from registry".to_string(),
                }),
            };
            if let Err(e) = result {
                first_err.get_or_insert(self.contract_violation(e));
            }
        }

        self.table.remove(txn);
        self.admission.leave();
        debug!(%txn, mode = %set.mode, resources = ?set.resources, "lock set released");

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Change the concurrency cap at runtime (floor of 1).
    ///
    /// Lowering the cap never revokes a slot. Transactions already admitted
    /// above the new cap keep running and drain as they release; nobody new
    /// is admitted until the active count is below the cap again. The excess
    /// shows up as [`LockStatus::draining`] meanwhile.
    pub fn set_parallel_limit(&self, parallel: usize) {
        self.admission.set_limit(parallel);
        debug!(limit = self.admission.limit(), "parallel limit changed");
    }

    /// Current concurrency cap
    pub fn parallel_limit(&self) -> usize {
        self.admission.limit()
    }

    /// Transactions currently past admission
    pub fn active_count(&self) -> usize {
        self.admission.active()
    }

    /// Transactions waiting for admission, head first
    pub fn queued(&self) -> Vec<TxnId> {
        self.admission.queued()
    }

    /// True if `txn` currently holds its complete lock set
    pub fn is_locked(&self, txn: TxnId) -> bool {
        self.table.is_locked(txn)
    }

    /// The lock set recorded for `txn`, in any phase
    pub fn holdings(&self, txn: TxnId) -> Option<LockSet> {
        self.table.get(txn)
    }

    /// Number of resources that have ever been locked
    pub fn resource_count(&self) -> usize {
        self.registry.len()
    }

    /// Diagnostic snapshot; see [`LockStatus`]
    pub fn status(&self) -> LockStatus {
        let (active, limit, queued) = self.admission.snapshot();
        LockStatus {
            active,
            limit,
            draining: active.saturating_sub(limit),
            queued,
            resources: self.registry.holders(),
            transactions: self.table.entries(),
        }
    }
}

impl Locking for LockManager {
    fn acquire(&self, txn: TxnId, scope: LockScope, updating: bool) -> LockResult<()> {
        LockManager::acquire(self, txn, scope, updating)
    }

    fn release(&self, txn: TxnId) -> LockResult<()> {
        LockManager::release(self, txn)
    }
}
