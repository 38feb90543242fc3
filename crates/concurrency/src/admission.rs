//! Admission queue
//!
//! Bounds how many transactions may be past admission at once and admits
//! them in strict arrival order. A transaction leaves the queue only when it
//! is at the head *and* a slot is free, so a later arrival can never overtake
//! an earlier one even if capacity would allow it.
//!
//! The queue state is guarded by one short critical section; waiting happens
//! on a condvar paired with that mutex, re-checking the predicate on every
//! wake. Spurious wakeups are retried, never surfaced. There is no way to
//! abort an unbounded `enter` once it has started.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::Instant;
use strata_core::TxnId;
use tracing::debug;

/// Position of a transaction in the admission queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket {
    seq: u64,
    txn: TxnId,
}

#[derive(Debug)]
struct QueueState {
    queue: VecDeque<Ticket>,
    active: usize,
    limit: usize,
    next_seq: u64,
}

impl QueueState {
    fn may_enter(&self, ticket: Ticket) -> bool {
        self.active < self.limit && self.queue.front() == Some(&ticket)
    }

    fn should_wake_next(&self) -> bool {
        self.active < self.limit && !self.queue.is_empty()
    }
}

/// FIFO admission gate with a concurrency cap
#[derive(Debug)]
pub struct AdmissionQueue {
    state: Mutex<QueueState>,
    turn: Condvar,
}

impl AdmissionQueue {
    /// Create a queue admitting at most `limit` transactions (floor of 1)
    pub fn new(limit: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                queue: VecDeque::new(),
                active: 0,
                limit: limit.max(1),
                next_seq: 0,
            }),
            turn: Condvar::new(),
        }
    }

    /// Block until `txn` is admitted.
    pub fn enter(&self, txn: TxnId) {
        let _ = self.enter_until(txn, None);
    }

    /// Wait for admission until `deadline`.
    ///
    /// On `false` the ticket has been withdrawn from the queue and the
    /// remaining waiters re-check their position.
    pub fn enter_until(&self, txn: TxnId, deadline: Option<Instant>) -> bool {
        let mut state = self.state.lock();
        let ticket = Ticket {
            seq: state.next_seq,
            txn,
        };
        state.next_seq += 1;
        state.queue.push_back(ticket);
        debug!(%txn, ticket = ticket.seq, queued = state.queue.len(), active = state.active, limit = state.limit, "transaction queued");

        while !state.may_enter(ticket) {
            match deadline {
                None => self.turn.wait(&mut state),
                Some(deadline) => {
                    if self.turn.wait_until(&mut state, deadline).timed_out()
                        && !state.may_enter(ticket)
                    {
                        state.queue.retain(|t| *t != ticket);
                        drop(state);
                        self.turn.notify_all();
                        return false;
                    }
                }
            }
        }

        state.queue.pop_front();
        state.active += 1;
        debug_assert!(state.active <= state.limit);
        debug!(%txn, active = state.active, limit = state.limit, "transaction admitted");

        // Capacity may remain for the new head.
        let wake = state.should_wake_next();
        drop(state);
        if wake {
            self.turn.notify_all();
        }
        true
    }

    /// Return an admission slot and wake all waiters.
    pub fn leave(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.active > 0, "admission slot released twice");
        state.active = state.active.saturating_sub(1);
        drop(state);
        self.turn.notify_all();
    }

    /// Change the concurrency cap (floor of 1).
    ///
    /// Transactions already admitted keep their slots. A raised limit admits
    /// queued transactions immediately; after a lowered one, nobody is
    /// admitted until `active` drops below the new limit.
    pub fn set_limit(&self, limit: usize) {
        let mut state = self.state.lock();
        state.limit = limit.max(1);
        drop(state);
        self.turn.notify_all();
    }

    /// Current concurrency cap
    pub fn limit(&self) -> usize {
        self.state.lock().limit
    }

    /// Transactions currently past admission
    pub fn active(&self) -> usize {
        self.state.lock().active
    }

    /// Waiting transactions, head first
    pub fn queued(&self) -> Vec<TxnId> {
        self.state.lock().queue.iter().map(|t| t.txn).collect()
    }

    /// `(active, limit, queued)` read under one lock
    pub fn snapshot(&self) -> (usize, usize, Vec<TxnId>) {
        let state = self.state.lock();
        (
            state.active,
            state.limit,
            state.queue.iter().map(|t| t.txn).collect(),
        )
    }
}
