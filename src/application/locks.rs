use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per loan account, created on first use.
///
/// Holding the guard returned by [`AccountLocks::acquire`] gives exclusive
/// access to the account's read-allocate-write sequence. Different accounts
/// never contend. Entries nobody holds or waits on are pruned on the next
/// acquire, so the map stays bounded by the accounts in flight.
#[derive(Default)]
pub struct AccountLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts with a live lock entry.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn acquire(&self, loan_account_no: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(loan_account_no.to_string())
                .or_default()
                .clone()
        };
        lock.lock_owned().await
    }
}
