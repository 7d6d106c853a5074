use serde::{Deserialize, Serialize};

use crate::{AccountId, LedgerError};

/// Single-owner capability gating mint, owner burns and the pause switch.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessControl {
    owner: AccountId,
}

impl AccessControl {
    pub fn new(owner: AccountId) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn require_owner(&self, caller: &str) -> Result<(), LedgerError> {
        if caller != self.owner {
            tracing::debug!(caller, owner = %self.owner, "owner check rejected");
            return Err(LedgerError::NotOwner {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    /// Replaces the owner and returns the previous one. No history is kept.
    pub fn transfer_ownership(
        &mut self,
        caller: &str,
        new_owner: AccountId,
    ) -> Result<AccountId, LedgerError> {
        self.require_owner(caller)?;
        Ok(std::mem::replace(&mut self.owner, new_owner))
    }
}
