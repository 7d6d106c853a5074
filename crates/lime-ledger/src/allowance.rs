use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, LedgerError};

/// Spending rights granted by holders to third parties.
///
/// Keyed by `(owner, spender)`; a missing entry is an allowance of zero.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Allowances {
    #[serde(with = "pair_keys")]
    grants: BTreeMap<(AccountId, AccountId), Amount>,
}

impl Allowances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allowance(&self, owner: &str, spender: &str) -> Amount {
        self.grants
            .get(&(owner.to_string(), spender.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn grants(&self) -> impl Iterator<Item = (&(AccountId, AccountId), &Amount)> {
        self.grants.iter()
    }

    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        let key = (owner.clone(), spender.clone());
        if amount == 0 {
            self.grants.remove(&key);
        } else {
            self.grants.insert(key, amount);
        }
    }

    pub fn ensure_allowance(
        &self,
        owner: &str,
        spender: &str,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let allowance = self.allowance(owner, spender);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: owner.to_string(),
                spender: spender.to_string(),
                allowance,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Reduces the allowance by `amount`, failing without change if it would
    /// drop below zero. An unlimited (`Amount::MAX`) allowance is never reduced.
    pub fn spend(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.ensure_allowance(owner, spender, amount)?;
        let current = self.allowance(owner, spender);
        if current != Amount::MAX {
            self.approve(owner, spender, current - amount);
        }
        Ok(())
    }
}

// JSON object keys must be strings, so grants are stored as a list of triples.
mod pair_keys {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::{AccountId, Amount};

    #[derive(Serialize, Deserialize)]
    struct Grant {
        owner: AccountId,
        spender: AccountId,
        #[serde(with = "crate::amount::decimal")]
        amount: Amount,
    }

    pub fn serialize<S>(
        value: &BTreeMap<(AccountId, AccountId), Amount>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let grants: Vec<Grant> = value
            .iter()
            .map(|((owner, spender), amount)| Grant {
                owner: owner.clone(),
                spender: spender.clone(),
                amount: *amount,
            })
            .collect();
        grants.serialize(serializer)
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<BTreeMap<(AccountId, AccountId), Amount>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let grants = Vec::<Grant>::deserialize(deserializer)?;
        Ok(grants
            .into_iter()
            .map(|g| ((g.owner, g.spender), g.amount))
            .collect())
    }
}
