//! Per-account balances and the total supply aggregate.
//!
//! This layer knows nothing about owners, pausing, caps or snapshots; callers are
//! expected to run those guards first. What it does guarantee is that every
//! primitive either applies completely or returns an error without touching state,
//! and that `total_supply` always equals the sum of all balances.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, LedgerError};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Balances {
    #[serde(with = "crate::amount::decimal_map")]
    accounts: BTreeMap<AccountId, Amount>,
    #[serde(with = "crate::amount::decimal")]
    total_supply: Amount,
}

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance; accounts never credited hold zero.
    pub fn balance_of(&self, account: &str) -> Amount {
        self.accounts.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Accounts that have ever been credited, including ones now at zero.
    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &Amount)> {
        self.accounts.iter()
    }

    /// Fails with `InsufficientBalance` unless `account` holds at least `amount`.
    pub fn ensure_available(&self, account: &str, amount: Amount) -> Result<(), LedgerError> {
        let balance = self.balance_of(account);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                account: account.to_string(),
                balance,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Mints `amount` into `account`. Cap and pause checks belong to the caller;
    /// the cap keeps both the balance and the supply far from `u128::MAX`.
    pub fn credit(&mut self, account: &AccountId, amount: Amount) {
        *self.accounts.entry(account.clone()).or_insert(0) += amount;
        self.total_supply += amount;
    }

    /// Burns `amount` from `account`.
    pub fn debit(&mut self, account: &AccountId, amount: Amount) -> Result<(), LedgerError> {
        self.ensure_available(account, amount)?;
        self.take(account, amount);
        self.total_supply -= amount;
        Ok(())
    }

    /// Moves `amount` between accounts, leaving the supply unchanged. Both sides
    /// apply or neither does; `from == to` is a successful no-op.
    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.ensure_available(from, amount)?;
        self.take(from, amount);
        *self.accounts.entry(to.clone()).or_insert(0) += amount;
        Ok(())
    }

    // Only called after `ensure_available`, so a missing entry implies `amount == 0`.
    fn take(&mut self, account: &str, amount: Amount) {
        if let Some(balance) = self.accounts.get_mut(account) {
            *balance -= amount;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(balances: &Balances) -> Amount {
        balances.accounts().map(|(_, v)| *v).sum()
    }

    #[test]
    fn credit_and_debit_track_supply() {
        let mut balances = Balances::new();
        balances.credit(&"alice".to_string(), 1_000);
        balances.credit(&"bob".to_string(), 500);
        balances.debit(&"alice".to_string(), 300).unwrap();
        assert_eq!(balances.balance_of("alice"), 700);
        assert_eq!(balances.total_supply(), 1_200);
        assert_eq!(sum(&balances), balances.total_supply());
    }

    #[test]
    fn debit_beyond_balance_changes_nothing() {
        let mut balances = Balances::new();
        balances.credit(&"alice".to_string(), 10);
        let before = balances.clone();
        let err = balances.debit(&"alice".to_string(), 11).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                account: "alice".into(),
                balance: 10,
                requested: 11,
            }
        );
        assert_eq!(balances, before);
    }

    #[test]
    fn transfer_moves_value_and_keeps_supply() {
        let mut balances = Balances::new();
        balances.credit(&"alice".to_string(), 1_000);
        balances
            .transfer(&"alice".to_string(), &"bob".to_string(), 250)
            .unwrap();
        assert_eq!(balances.balance_of("alice"), 750);
        assert_eq!(balances.balance_of("bob"), 250);
        assert_eq!(balances.total_supply(), 1_000);
    }

    #[test]
    fn self_transfer_is_a_noop() {
        let mut balances = Balances::new();
        balances.credit(&"alice".to_string(), 40);
        balances
            .transfer(&"alice".to_string(), &"alice".to_string(), 40)
            .unwrap();
        assert_eq!(balances.balance_of("alice"), 40);
        assert!(balances
            .transfer(&"alice".to_string(), &"alice".to_string(), 41)
            .is_err());
    }

    #[test]
    fn zero_amount_from_unknown_account_succeeds() {
        let mut balances = Balances::new();
        balances
            .transfer(&"ghost".to_string(), &"bob".to_string(), 0)
            .unwrap();
        assert_eq!(balances.total_supply(), 0);
        assert_eq!(balances.balance_of("bob"), 0);
    }
}
