use serde::{Deserialize, Serialize};

use crate::{Amount, LedgerError};

/// Immutable ceiling on total supply, fixed at construction.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapEnforcer {
    #[serde(with = "crate::amount::decimal")]
    cap: Amount,
}

impl CapEnforcer {
    pub fn new(cap: Amount) -> Self {
        Self { cap }
    }

    pub fn cap(&self) -> Amount {
        self.cap
    }

    /// Checks that minting `amount` on top of `total_supply` stays within the cap.
    /// An addition that overflows `u128` is over the cap as well.
    pub fn require_within_cap(&self, total_supply: Amount, amount: Amount) -> Result<(), LedgerError> {
        match total_supply.checked_add(amount) {
            Some(prospective) if prospective <= self.cap => Ok(()),
            _ => Err(LedgerError::CapExceeded {
                total_supply,
                amount,
                cap: self.cap,
            }),
        }
    }
}
