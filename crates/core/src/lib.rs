//! Core types for Strata
//!
//! This crate defines the foundational types used throughout the system:
//! - TxnId: Caller-supplied transaction handle
//! - LockMode: Shared / exclusive access mode
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{LockMode, TxnId, TxnIdAllocator};
