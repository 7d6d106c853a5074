use thiserror::Error;

use crate::{AccountId, Amount, SnapshotId};

/// Every way a ledger operation can be rejected.
///
/// A returned error always means the operation had no effect: balances, supply,
/// owner, pause flag and checkpoint sequences are exactly as before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Privileged operation invoked by someone other than the current owner.
    #[error("caller {caller} is not the owner")]
    NotOwner { caller: AccountId },

    /// Balance-mutating operation while the pause switch is on.
    #[error("token transfer while paused")]
    ContractPaused,

    /// Supply increase would push total supply above the immutable cap.
    #[error("cap exceeded: total supply {total_supply} + {amount} > cap {cap}")]
    CapExceeded {
        total_supply: Amount,
        amount: Amount,
        cap: Amount,
    },

    #[error("insufficient balance in account {account}: have {balance}, need {requested}")]
    InsufficientBalance {
        account: AccountId,
        balance: Amount,
        requested: Amount,
    },

    /// Historical query for id 0 or an id that has not been created yet.
    #[error("invalid snapshot id {id} (current snapshot id is {current})")]
    InvalidSnapshotId { id: SnapshotId, current: SnapshotId },

    #[error("insufficient allowance of {spender} over {owner}: have {allowance}, need {requested}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        allowance: Amount,
        requested: Amount,
    },

    /// `pause()` under the strict policy while already paused.
    #[error("already paused")]
    AlreadyPaused,

    /// `unpause()` under the strict policy while not paused.
    #[error("not paused")]
    NotPaused,

    /// A mutation inside an atomic batch failed; the whole batch was rolled back.
    #[error("batch mutation #{index} failed: {source}")]
    BatchFailed {
        index: usize,
        #[source]
        source: Box<LedgerError>,
    },
}
