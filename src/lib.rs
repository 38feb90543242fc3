//! # Strata locking
//!
//! Deadlock-free locking of named resources for transactional engines.
//!
//! Transactions are admitted in arrival order up to a configured parallelism
//! limit, then lock their resources in one global sorted order, shared for
//! read-only work and exclusive for updates.
//!
//! # Quick Start
//!
//! ```text
//! use strata_lock::{LockManager, LockingConfig, TxnIdAllocator};
//!
//! let manager = LockManager::new(&LockingConfig::with_parallel(4));
//! let ids = TxnIdAllocator::new();
//!
//! let txn = ids.next_id();
//! let guard = manager.lock(txn, ["orders", "customers"], true)?;
//! // ... update both databases ...
//! guard.release()?;
//! ```
//!
//! # Crates
//!
//! - `strata-core`: transaction ids, lock modes, shared errors
//! - `strata-concurrency`: registry, admission queue, lock table, manager

pub use strata_concurrency::{
    LockError, LockManager, LockResult, LockScope, LockSet, LockSetGuard, LockStatus, Locking,
    LockingConfig, ResourceHolders, TxnPhase, WaitPhase, DEFAULT_PARALLEL,
};
pub use strata_core::{Error, LockMode, Result, TxnId, TxnIdAllocator};
