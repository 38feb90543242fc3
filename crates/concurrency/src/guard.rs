//! RAII release of a lock set

use crate::error::LockResult;
use crate::manager::LockManager;
use strata_core::TxnId;
use tracing::error;

/// Holds a transaction's lock set until dropped or released
///
/// Dropping the guard releases the locks and logs any error; call
/// [`release`](Self::release) to observe the error instead.
#[must_use = "dropping the guard releases the locks immediately"]
#[derive(Debug)]
pub struct LockSetGuard<'a> {
    manager: &'a LockManager,
    txn: TxnId,
    released: bool,
}

impl<'a> LockSetGuard<'a> {
    pub(crate) fn new(manager: &'a LockManager, txn: TxnId) -> Self {
        Self {
            manager,
            txn,
            released: false,
        }
    }

    /// Transaction owning the locks
    pub fn txn(&self) -> TxnId {
        self.txn
    }

    /// Release now and report the outcome
    pub fn release(mut self) -> LockResult<()> {
        self.released = true;
        self.manager.release(self.txn)
    }
}

impl Drop for LockSetGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.manager.release(self.txn) {
            error!(txn = %self.txn, error = %e, "release on guard drop failed");
        }
    }
}
