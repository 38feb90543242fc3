//! Core types for Strata locking
//!
//! This module defines the foundational types:
//! - TxnId: Opaque handle identifying one transaction
//! - TxnIdAllocator: Monotonic source of fresh TxnIds
//! - LockMode: Shared (read) vs exclusive (write) access

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identifier for a transaction
///
/// A TxnId is supplied by the caller and is the key under which the lock
/// manager records what a transaction holds. It is not tied to thread
/// identity, so a transaction may acquire on one thread and release on
/// another, or be driven by a cooperative task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxnId(u64);

impl TxnId {
    /// Create a TxnId from a raw value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value of this TxnId
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TxnId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn-{}", self.0)
    }
}

/// Hands out unique, increasing TxnIds
///
/// Callers that already have their own transaction identity do not need this.
#[derive(Debug, Default)]
pub struct TxnIdAllocator {
    next: AtomicU64,
}

impl TxnIdAllocator {
    /// Create an allocator whose first id is `txn-1`
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next TxnId
    pub fn next_id(&self) -> TxnId {
        TxnId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Access mode for a locked resource
///
/// A transaction uses one mode for its whole lock set; there are no
/// mixed-mode sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockMode {
    /// Concurrent, non-conflicting read access
    Shared,
    /// Exclusive write access
    Exclusive,
}

impl LockMode {
    /// Map the transaction's `updating` flag to a mode
    pub fn from_updating(updating: bool) -> Self {
        if updating {
            LockMode::Exclusive
        } else {
            LockMode::Shared
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockMode::Shared => write!(f, "shared"),
            LockMode::Exclusive => write!(f, "exclusive"),
        }
    }
}
