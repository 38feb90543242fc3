//! Concurrency layer for Strata
//!
//! This crate implements the locking core used by transaction runners:
//! - ResourceRegistry: One reader/writer lock per resource name
//! - AdmissionQueue: Bounded, first-come-first-served admission
//! - LockTable: What each transaction holds, and in which mode
//! - LockManager: Deadlock-free acquire (sorted order) and release
//!
//! A caller acquires with a transaction id, a set of resource names and an
//! `updating` flag, does its work, then releases:
//!
//! ```text
//! let manager = LockManager::new(&LockingConfig::default());
//! manager.acquire(txn, ["db2", "db1"], true)?;   // locks db1 then db2
//! // ... work ...
//! manager.release(txn)?;
//! ```
//!
//! Not supported: multi-granularity locking, lock escalation, multi-process
//! locking, and global (whole-system) locks, which fail with
//! [`LockError::UnsupportedGlobalLock`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod admission;
pub mod config;
pub mod error;
pub mod guard;
pub mod lock_table;
pub mod manager;
pub mod registry;
pub mod resource;
pub mod scope;
pub mod status;

pub use admission::AdmissionQueue;
pub use config::{LockingConfig, DEFAULT_PARALLEL};
pub use error::{LockError, LockResult, WaitPhase};
pub use guard::LockSetGuard;
pub use lock_table::{LockSet, LockTable, TxnPhase};
pub use manager::{LockManager, Locking};
pub use registry::ResourceRegistry;
pub use resource::ResourceLock;
pub use scope::LockScope;
pub use status::{LockStatus, ResourceHolders};
