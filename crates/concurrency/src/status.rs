//! Diagnostic view of the lock manager
//!
//! Intended for operational debugging, not as a programming API. The pieces
//! of a [`LockStatus`] are read one after another, so under concurrent
//! activity they need not describe a single instant.

use crate::lock_table::LockSet;
use std::fmt;
use strata_core::TxnId;

/// Holders of one resource lock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceHolders {
    /// Exclusive holder, if any
    pub exclusive: Option<TxnId>,
    /// Shared holders, ascending
    pub shared: Vec<TxnId>,
    /// Exclusive requests currently blocked
    pub waiting_writers: usize,
}

impl ResourceHolders {
    /// True if nobody holds the lock
    pub fn is_free(&self) -> bool {
        self.exclusive.is_none() && self.shared.is_empty()
    }
}

impl fmt::Display for ResourceHolders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.exclusive, self.shared.is_empty()) {
            (Some(txn), _) => write!(f, "exclusive [{}]", txn)?,
            (None, false) => write!(f, "shared [{}]", join(&self.shared))?,
            (None, true) => write!(f, "free")?,
        }
        if self.waiting_writers > 0 {
            write!(f, ", {} writer(s) waiting", self.waiting_writers)?;
        }
        Ok(())
    }
}

/// Snapshot of queue, counters and holdings
///
/// `active` exceeds `limit` only right after the cap was lowered at runtime.
/// Admitted transactions are never evicted, so the excess is reported as
/// `draining` until enough of them release.
#[derive(Debug, Clone)]
pub struct LockStatus {
    /// Transactions past admission
    pub active: usize,
    /// Configured concurrency cap
    pub limit: usize,
    /// Admitted transactions above the current cap
    pub draining: usize,
    /// Waiting transactions, head first
    pub queued: Vec<TxnId>,
    /// Every known resource with its holders, sorted by name
    pub resources: Vec<(String, ResourceHolders)>,
    /// Every transaction with a lock set, sorted by id
    pub transactions: Vec<(TxnId, LockSet)>,
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const IND: &str = "| ";
        writeln!(f, "Locking")?;
        write!(
            f,
            "{}Transactions running: {} (limit {}",
            IND, self.active, self.limit
        )?;
        if self.draining > 0 {
            write!(f, ", {} draining", self.draining)?;
        }
        writeln!(f, ")")?;
        writeln!(f, "{}Transaction queue: [{}]", IND, join(&self.queued))?;
        writeln!(f, "{}Held locks by object:", IND)?;
        for (name, holders) in &self.resources {
            writeln!(f, "{}{}{} -> {}", IND, IND, name, holders)?;
        }
        writeln!(f, "{}Held locks by transaction:", IND)?;
        for (txn, set) in &self.transactions {
            writeln!(
                f,
                "{}{}{} -> {} {} [{}]",
                IND,
                IND,
                txn,
                set.phase,
                set.mode,
                set.resources.join(", ")
            )?;
        }
        Ok(())
    }
}

fn join(txns: &[TxnId]) -> String {
    txns.iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock_table::TxnPhase;
    use strata_core::LockMode;

    #[test]
    fn test_holders_display() {
        let free = ResourceHolders::default();
        assert!(free.is_free());
        assert_eq!(free.to_string(), "free");

        let shared = ResourceHolders {
            exclusive: None,
            shared: vec![TxnId::new(1), TxnId::new(2)],
            waiting_writers: 1,
        };
        assert_eq!(shared.to_string(), "shared [txn-1, txn-2], 1 writer(s) waiting");
    }

    #[test]
    fn test_status_dump_lists_everything() {
        let status = LockStatus {
            active: 1,
            limit: 4,
            draining: 0,
            queued: vec![TxnId::new(7)],
            resources: vec![(
                "db1".to_string(),
                ResourceHolders {
                    exclusive: Some(TxnId::new(5)),
                    shared: vec![],
                    waiting_writers: 0,
                },
            )],
            transactions: vec![(
                TxnId::new(5),
                LockSet {
                    resources: vec!["db1".to_string()],
                    mode: LockMode::Exclusive,
                    phase: TxnPhase::Locked,
                },
            )],
        };

        let dump = status.to_string();
        assert!(dump.contains("Transactions running: 1 (limit 4)"));
        assert!(dump.contains("Transaction queue: [txn-7]"));
        assert!(dump.contains("db1 -> exclusive [txn-5]"));
        assert!(dump.contains("txn-5 -> locked exclusive [db1]"));
    }
}
