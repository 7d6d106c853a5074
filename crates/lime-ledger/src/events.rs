use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, SnapshotId};

/// Notification appended to the token's journal after each successful mutation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Mints have no `from`, burns have no `to`.
    Transfer {
        from: Option<AccountId>,
        to: Option<AccountId>,
        #[serde(with = "crate::amount::decimal")]
        amount: Amount,
    },
    Approval {
        owner: AccountId,
        spender: AccountId,
        #[serde(with = "crate::amount::decimal")]
        amount: Amount,
    },
    OwnershipTransferred {
        previous: AccountId,
        new_owner: AccountId,
    },
    Paused {
        by: AccountId,
    },
    Unpaused {
        by: AccountId,
    },
    Snapshot {
        id: SnapshotId,
    },
}
