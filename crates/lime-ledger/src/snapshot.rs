//! Lazy, append-only balance history.
//!
//! Taking a snapshot only bumps a counter. History is recorded on write: right
//! before a tracked value (an account balance, or the total supply) changes, the
//! store appends `(current snapshot id, value about to be overwritten)` to that
//! value's checkpoint sequence, unless a checkpoint for the current id already
//! exists. A value that never changes after a snapshot never gets a checkpoint for
//! it, so each sequence grows with the number of *epochs in which that value
//! changed*, not with the global number of snapshots.
//!
//! Lookups use a lower-bound search: the first checkpoint with `id >= wanted`
//! holds the value as it was when `wanted` was taken, because nothing changed
//! between that snapshot and the write that recorded the checkpoint. If there is
//! no such checkpoint the value has not changed since, and the present value is
//! the answer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, LedgerError, SnapshotId};

/// Value a tracked quantity held when snapshot `id` was taken.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Checkpoint {
    pub id: SnapshotId,
    #[serde(with = "crate::amount::decimal")]
    pub value: Amount,
}

/// Checkpoints of one tracked quantity, strictly increasing by `id`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Checkpoints(Vec<Checkpoint>);

impl Checkpoints {
    pub fn as_slice(&self) -> &[Checkpoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn last_id(&self) -> Option<SnapshotId> {
        self.0.last().map(|c| c.id)
    }

    /// Appends `(current, value)` unless `current` is already recorded.
    /// Returns whether a checkpoint was written.
    fn record(&mut self, current: SnapshotId, value: Amount) -> bool {
        if current == 0 || self.last_id() == Some(current) {
            return false;
        }
        self.0.push(Checkpoint { id: current, value });
        true
    }

    /// Lower-bound search for the first checkpoint at or after `id`.
    fn lookup(&self, id: SnapshotId) -> Option<Amount> {
        let idx = self.0.partition_point(|c| c.id < id);
        self.0.get(idx).map(|c| c.value)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotStore {
    current: SnapshotId,
    accounts: BTreeMap<AccountId, Checkpoints>,
    total_supply: Checkpoints,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the most recent snapshot; 0 if none has been taken.
    pub fn current_id(&self) -> SnapshotId {
        self.current
    }

    /// Opens a new snapshot epoch and returns its id. Touches no sequence.
    pub fn snapshot(&mut self) -> SnapshotId {
        self.current += 1;
        self.current
    }

    /// Pre-write hook for an account balance; `current_value` is the balance
    /// about to be overwritten.
    pub fn update_account(&mut self, account: &AccountId, current_value: Amount) {
        if self.current == 0 {
            return;
        }
        let written = self
            .accounts
            .entry(account.clone())
            .or_default()
            .record(self.current, current_value);
        if written {
            tracing::debug!(
                account = %account,
                snapshot = self.current,
                value = %current_value,
                "recorded balance checkpoint"
            );
        }
    }

    /// Pre-write hook for the total supply.
    pub fn update_total_supply(&mut self, current_value: Amount) {
        if self.total_supply.record(self.current, current_value) {
            tracing::debug!(
                snapshot = self.current,
                value = %current_value,
                "recorded supply checkpoint"
            );
        }
    }

    pub fn account_checkpoints(&self, account: &str) -> Option<&Checkpoints> {
        self.accounts.get(account)
    }

    pub fn total_supply_checkpoints(&self) -> &Checkpoints {
        &self.total_supply
    }

    /// Every account that has at least one checkpoint.
    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &Checkpoints)> {
        self.accounts.iter()
    }

    /// Balance of `account` at snapshot `id`, given its present balance.
    pub fn balance_at(
        &self,
        account: &str,
        id: SnapshotId,
        current_value: Amount,
    ) -> Result<Amount, LedgerError> {
        self.validate(id)?;
        Ok(self
            .accounts
            .get(account)
            .and_then(|seq| seq.lookup(id))
            .unwrap_or(current_value))
    }

    /// Total supply at snapshot `id`, given the present total supply.
    pub fn total_supply_at(&self, id: SnapshotId, current_value: Amount) -> Result<Amount, LedgerError> {
        self.validate(id)?;
        Ok(self.total_supply.lookup(id).unwrap_or(current_value))
    }

    fn validate(&self, id: SnapshotId) -> Result<(), LedgerError> {
        if id == 0 || id > self.current {
            return Err(LedgerError::InvalidSnapshotId {
                id,
                current: self.current,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(name: &str) -> AccountId {
        name.to_string()
    }

    #[test]
    fn hooks_do_nothing_before_first_snapshot() {
        let mut store = SnapshotStore::new();
        store.update_account(&acct("alice"), 10);
        store.update_total_supply(10);
        assert!(store.account_checkpoints("alice").is_none());
        assert!(store.total_supply_checkpoints().is_empty());
    }

    #[test]
    fn snapshot_only_advances_the_counter() {
        let mut store = SnapshotStore::new();
        assert_eq!(store.snapshot(), 1);
        assert_eq!(store.snapshot(), 2);
        assert_eq!(store.current_id(), 2);
        assert!(store.total_supply_checkpoints().is_empty());
    }

    #[test]
    fn one_checkpoint_per_epoch_keeps_the_first_value() {
        let mut store = SnapshotStore::new();
        store.snapshot();
        store.update_account(&acct("alice"), 100);
        store.update_account(&acct("alice"), 70);
        store.update_account(&acct("alice"), 40);
        let seq = store.account_checkpoints("alice").unwrap();
        assert_eq!(seq.as_slice(), &[Checkpoint { id: 1, value: 100 }]);
    }

    #[test]
    fn lookup_uses_first_checkpoint_at_or_after_id() {
        let mut store = SnapshotStore::new();
        // balance 100 through snapshots 1 and 2, changed to 50 during epoch 2.
        store.snapshot();
        store.snapshot();
        store.update_account(&acct("alice"), 100);
        // 50 through snapshots 3..=5, changed to 20 during epoch 5.
        store.snapshot();
        store.snapshot();
        store.snapshot();
        store.update_account(&acct("alice"), 50);
        let now = 20;

        assert_eq!(store.balance_at("alice", 1, now).unwrap(), 100);
        assert_eq!(store.balance_at("alice", 2, now).unwrap(), 100);
        assert_eq!(store.balance_at("alice", 3, now).unwrap(), 50);
        assert_eq!(store.balance_at("alice", 5, now).unwrap(), 50);

        store.snapshot();
        assert_eq!(store.balance_at("alice", 6, now).unwrap(), 20);
    }

    #[test]
    fn untouched_account_reports_present_value() {
        let mut store = SnapshotStore::new();
        store.snapshot();
        store.snapshot();
        assert_eq!(store.balance_at("bob", 1, 77).unwrap(), 77);
        assert_eq!(store.total_supply_at(2, 500).unwrap(), 500);
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        let mut store = SnapshotStore::new();
        assert_eq!(
            store.balance_at("alice", 1, 0),
            Err(LedgerError::InvalidSnapshotId { id: 1, current: 0 })
        );
        store.snapshot();
        assert!(store.balance_at("alice", 0, 0).is_err());
        assert!(store.total_supply_at(2, 0).is_err());
        store.total_supply_at(1, 0).unwrap();
    }

    #[test]
    fn supply_history_is_tracked_separately() {
        let mut store = SnapshotStore::new();
        store.snapshot();
        store.update_total_supply(1_000);
        store.snapshot();
        store.update_total_supply(900);
        assert_eq!(store.total_supply_at(1, 850).unwrap(), 1_000);
        assert_eq!(store.total_supply_at(2, 850).unwrap(), 900);
        assert_eq!(store.total_supply_checkpoints().len(), 2);
    }
}
