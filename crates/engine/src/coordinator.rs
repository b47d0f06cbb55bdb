//! Commit coordinator
//!
//! Serializes units of work under one commit lock and drives the commit
//! protocol:
//! - plan index changes from the staged post-state
//! - apply the store batch
//! - apply the index changes, reverting the store batch if they fail
//!
//! It also tracks unit-of-work metrics (started, committed, rolled back).

use crate::sync::{IndexSynchronizer, RebuildReport};
use crate::transaction::UnitOfWork;
use libris_core::{LibrisResult, RecordStore};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Unit-of-work counters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransactionMetrics {
    /// Units of work started
    pub total_started: u64,
    /// Units of work committed
    pub total_committed: u64,
    /// Units of work rolled back
    pub total_rolled_back: u64,
    /// committed / started, 0 when nothing started
    pub commit_rate: f64,
}

/// Owns the commit lock and the store/index pair it protects
///
/// # Memory Ordering
///
/// The metric counters use Relaxed ordering; they are observational only.
pub struct Coordinator {
    store: Arc<dyn RecordStore>,
    sync: IndexSynchronizer,
    commit_lock: Mutex<()>,
    next_uow_id: AtomicU64,
    total_started: AtomicU64,
    total_committed: AtomicU64,
    total_rolled_back: AtomicU64,
}

impl Coordinator {
    /// Create a coordinator over a store and its synchronizer
    pub fn new(store: Arc<dyn RecordStore>, sync: IndexSynchronizer) -> Self {
        Coordinator {
            store,
            sync,
            commit_lock: Mutex::new(()),
            next_uow_id: AtomicU64::new(1),
            total_started: AtomicU64::new(0),
            total_committed: AtomicU64::new(0),
            total_rolled_back: AtomicU64::new(0),
        }
    }

    /// The record store
    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// The index synchronizer
    pub fn synchronizer(&self) -> &IndexSynchronizer {
        &self.sync
    }

    /// Run `f` as one unit of work
    ///
    /// The commit lock is held from the first read to the end of commit. An
    /// `Err` from `f` discards everything it staged. The closure must not
    /// call back into the library; the lock is not reentrant.
    pub fn transaction<F, T>(&self, f: F) -> LibrisResult<T>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> LibrisResult<T>,
    {
        let _commit = self.commit_lock.lock();
        let id = self.next_uow_id.fetch_add(1, Ordering::Relaxed);
        self.total_started.fetch_add(1, Ordering::Relaxed);
        debug!(target: "libris::txn", uow = id, "Unit of work started");

        let mut uow = UnitOfWork::new(self.store.as_ref(), id);
        let result = f(&mut uow).and_then(|value| self.commit(&uow).map(|()| value));
        match &result {
            Ok(_) => {
                self.total_committed.fetch_add(1, Ordering::Relaxed);
                debug!(target: "libris::txn", uow = id, "Unit of work committed");
            }
            Err(e) => {
                self.total_rolled_back.fetch_add(1, Ordering::Relaxed);
                warn!(target: "libris::txn", uow = id, error = %e, "Unit of work rolled back");
            }
        }
        result
    }

    /// Commit staged changes to the store and the index
    ///
    /// Caller holds the commit lock.
    fn commit(&self, uow: &UnitOfWork<'_>) -> LibrisResult<()> {
        if uow.is_empty() {
            return Ok(());
        }
        // Derivation failures stop here with nothing applied
        let ops = self.sync.plan(uow)?;
        let batch = uow.write_batch();
        let op_count = batch.len();
        let undo = self.store.apply(batch)?;

        if let Err(e) = self.sync.index().apply(ops) {
            if let Err(revert) = self.store.apply(undo) {
                error!(
                    target: "libris::txn",
                    uow = uow.id(),
                    error = %revert,
                    "Store revert failed after index failure"
                );
            }
            return Err(e);
        }
        debug!(target: "libris::txn", uow = uow.id(), ops = op_count, "Store batch and index applied");
        Ok(())
    }

    /// Reindex everything from the store
    pub fn rebuild_all(&self) -> LibrisResult<RebuildReport> {
        self.sync.rebuild_all(self.store.as_ref(), &self.commit_lock)
    }

    /// Snapshot of unit-of-work counters
    pub fn metrics(&self) -> TransactionMetrics {
        let started = self.total_started.load(Ordering::Relaxed);
        let committed = self.total_committed.load(Ordering::Relaxed);
        TransactionMetrics {
            total_started: started,
            total_committed: committed,
            total_rolled_back: self.total_rolled_back.load(Ordering::Relaxed),
            commit_rate: if started > 0 {
                committed as f64 / started as f64
            } else {
                0.0
            },
        }
    }
}
