use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount};

/// A state-changing ledger call, as submitted by a caller.
///
/// The caller identity is supplied separately by whoever applies the mutation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerMutation {
    Transfer {
        to: AccountId,
        #[serde(with = "crate::amount::decimal")]
        amount: Amount,
    },
    TransferFrom {
        from: AccountId,
        to: AccountId,
        #[serde(with = "crate::amount::decimal")]
        amount: Amount,
    },
    Approve {
        spender: AccountId,
        #[serde(with = "crate::amount::decimal")]
        amount: Amount,
    },
    IncreaseAllowance {
        spender: AccountId,
        #[serde(with = "crate::amount::decimal")]
        amount: Amount,
    },
    DecreaseAllowance {
        spender: AccountId,
        #[serde(with = "crate::amount::decimal")]
        amount: Amount,
    },
    Burn {
        #[serde(with = "crate::amount::decimal")]
        amount: Amount,
    },
    BurnFrom {
        from: AccountId,
        #[serde(with = "crate::amount::decimal")]
        amount: Amount,
    },
    Mint {
        to: AccountId,
        #[serde(with = "crate::amount::decimal")]
        amount: Amount,
    },
    BurnByOwner {
        from: AccountId,
        #[serde(with = "crate::amount::decimal")]
        amount: Amount,
    },
    Pause,
    Unpause,
    Snapshot,
    TransferOwnership {
        new_owner: AccountId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_file_format() {
        let json = r#"[
            {"type": "mint", "to": "bob", "amount": "1000000000000000000000"},
            {"type": "burn_by_owner", "from": "bob", "amount": 5},
            {"type": "snapshot"},
            {"type": "transfer_ownership", "new_owner": "carol"}
        ]"#;
        let batch: Vec<LedgerMutation> = serde_json::from_str(json).unwrap();
        assert_eq!(
            batch,
            vec![
                LedgerMutation::Mint {
                    to: "bob".into(),
                    amount: 1_000 * 10u128.pow(18),
                },
                LedgerMutation::BurnByOwner {
                    from: "bob".into(),
                    amount: 5,
                },
                LedgerMutation::Snapshot,
                LedgerMutation::TransferOwnership {
                    new_owner: "carol".into(),
                },
            ]
        );
    }
}
