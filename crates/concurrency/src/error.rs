//! Error taxonomy for the locking core
//!
//! Waiting is never an error. Every variant here is either a caller-contract
//! violation, a request for an unsupported feature, an internal invariant
//! failure, or the expiry of a bounded wait the caller asked for.

use std::fmt;
use std::time::Duration;
use strata_core::TxnId;

/// Result alias for lock manager operations
pub type LockResult<T> = std::result::Result<T, LockError>;

/// Where a bounded wait was spent when it expired
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitPhase {
    /// Waiting for a concurrency slot and FIFO turn
    Admission,
    /// Waiting for the named resource lock
    Resource(String),
}

impl fmt::Display for WaitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitPhase::Admission => write!(f, "admission"),
            WaitPhase::Resource(name) => write!(f, "resource '{}'", name),
        }
    }
}

/// Errors raised by [`LockManager`](crate::LockManager)
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum LockError {
    /// The transaction already owns a lock set (reentrant acquire)
    #[error("transaction {txn} already holds one or more locks")]
    AlreadyLocked {
        /// Offending transaction
        txn: TxnId,
    },

    /// The transaction holds no lock set (release without acquire)
    #[error("no locks held by transaction {txn}")]
    NotLocked {
        /// Offending transaction
        txn: TxnId,
    },

    /// Whole-system locking was requested
    #[error("global locks are not implemented")]
    UnsupportedGlobalLock,

    /// The per-resource holder bookkeeping disagrees with the lock table
    #[error("lock invariant violated on resource '{resource}' by {txn}: {detail}")]
    HoldInvariant {
        /// Transaction being released
        txn: TxnId,
        /// Resource whose bookkeeping is inconsistent
        resource: String,
        /// What was found
        detail: String,
    },

    /// A bounded acquire gave up; nothing is left held or queued
    #[error("{txn} timed out after {waited:?} waiting for {phase}")]
    Timeout {
        /// Transaction that gave up
        txn: TxnId,
        /// Where the wait was spent
        phase: WaitPhase,
        /// Total time spent in acquire
        waited: Duration,
    },
}

impl LockError {
    /// True for errors that indicate a bug in the integrating code or in
    /// the lock manager itself, as opposed to an unsupported request or an
    /// expired wait.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            LockError::AlreadyLocked { .. }
                | LockError::NotLocked { .. }
                | LockError::HoldInvariant { .. }
        )
    }

    /// True for [`LockError::Timeout`]
    pub fn is_timeout(&self) -> bool {
        matches!(self, LockError::Timeout { .. })
    }
}
