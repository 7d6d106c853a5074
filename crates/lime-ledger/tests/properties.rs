//! Property-based tests over random operation sequences.
//!
//! Invariants checked after every step:
//! - total supply equals the sum of all balances and never exceeds the cap
//! - a rejected operation leaves the state root (and the whole token) unchanged
//! - a snapshot taken now reports every present balance
//! - checkpoint ids are strictly increasing and never above the counter
//! - historical answers recorded at snapshot time never change afterwards

use std::collections::BTreeMap;

use lime_ledger::{
    AccountId, Amount, LedgerMutation, SnapshotId, SnapshotPolicy, Token, TokenConfig,
};
use proptest::prelude::*;

const CAP: Amount = 1_000_000;
const ACCOUNTS: [&str; 4] = ["owner", "alice", "bob", "carol"];

#[derive(Clone, Debug)]
struct Step {
    caller: usize,
    mutation: LedgerMutation,
}

fn account() -> impl Strategy<Value = AccountId> {
    (0..ACCOUNTS.len()).prop_map(|i| ACCOUNTS[i].to_string())
}

fn amount() -> impl Strategy<Value = Amount> {
    prop_oneof![0..1_000u128, 0..CAP + 10]
}

fn mutation() -> impl Strategy<Value = LedgerMutation> {
    prop_oneof![
        4 => (account(), amount()).prop_map(|(to, amount)| LedgerMutation::Transfer { to, amount }),
        2 => amount().prop_map(|amount| LedgerMutation::Burn { amount }),
        2 => (account(), amount()).prop_map(|(to, amount)| LedgerMutation::Mint { to, amount }),
        2 => (account(), amount())
            .prop_map(|(from, amount)| LedgerMutation::BurnByOwner { from, amount }),
        1 => (account(), amount())
            .prop_map(|(spender, amount)| LedgerMutation::Approve { spender, amount }),
        2 => (account(), account(), amount())
            .prop_map(|(from, to, amount)| LedgerMutation::TransferFrom { from, to, amount }),
        1 => Just(LedgerMutation::Pause),
        2 => Just(LedgerMutation::Unpause),
        3 => Just(LedgerMutation::Snapshot),
    ]
}

fn step_seq(max: usize) -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(
        (0..ACCOUNTS.len(), mutation()).prop_map(|(caller, mutation)| Step { caller, mutation }),
        1..max,
    )
}

fn deploy() -> Token {
    Token::new(
        TokenConfig::new("owner")
            .with_cap(CAP)
            .with_initial_supply(CAP / 2)
            .with_snapshot_policy(SnapshotPolicy::Open),
    )
    .unwrap()
}

fn check_bookkeeping(token: &Token) -> Result<(), TestCaseError> {
    let sum: Amount = token.balances().accounts().map(|(_, b)| *b).sum();
    prop_assert_eq!(sum, token.total_supply());
    prop_assert!(token.total_supply() <= token.cap());

    let current = token.current_snapshot_id();
    let sequences = token
        .snapshots()
        .accounts()
        .map(|(_, seq)| seq)
        .chain(std::iter::once(token.snapshots().total_supply_checkpoints()));
    for seq in sequences {
        let ids: Vec<SnapshotId> = seq.as_slice().iter().map(|c| c.id).collect();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(ids.iter().all(|id| *id >= 1 && *id <= current));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn invariants_hold_and_failures_change_nothing(steps in step_seq(60)) {
        let mut token = deploy();
        for step in &steps {
            let before = token.clone();
            let root_before = token.state_root();
            let caller = ACCOUNTS[step.caller];
            if token.apply(caller, &step.mutation).is_err() {
                prop_assert_eq!(token.state_root(), root_before);
                prop_assert_eq!(&token, &before);
            }
            check_bookkeeping(&token)?;
        }
    }

    #[test]
    fn recorded_history_never_changes(steps in step_seq(60)) {
        let mut token = deploy();
        // (snapshot id, account) -> balance at the moment the snapshot was taken
        let mut seen: BTreeMap<(SnapshotId, &str), Amount> = BTreeMap::new();
        let mut supply_seen: BTreeMap<SnapshotId, Amount> = BTreeMap::new();

        for step in &steps {
            let caller = ACCOUNTS[step.caller];
            if token.apply(caller, &step.mutation).is_err() {
                continue;
            }
            if step.mutation == LedgerMutation::Snapshot {
                let id = token.current_snapshot_id();
                for account in ACCOUNTS {
                    let now = token.balance_of(account);
                    prop_assert_eq!(token.balance_of_at(account, id).unwrap(), now);
                    seen.insert((id, account), now);
                }
                supply_seen.insert(id, token.total_supply());
            }
            for ((id, account), value) in &seen {
                prop_assert_eq!(token.balance_of_at(account, *id).unwrap(), *value);
            }
            for (id, value) in &supply_seen {
                prop_assert_eq!(token.total_supply_at(*id).unwrap(), *value);
            }
        }
    }

    #[test]
    fn failed_batches_are_atomic(steps in step_seq(20)) {
        let mut token = deploy();
        let mutations: Vec<LedgerMutation> = steps.into_iter().map(|s| s.mutation).collect();
        let before = token.clone();
        match token.apply_batch("owner", &mutations) {
            Ok(_) => check_bookkeeping(&token)?,
            Err(_) => prop_assert_eq!(&token, &before),
        }
    }

    #[test]
    fn unchanged_account_has_equal_history(gap in 1u64..20, amount in 1..1_000u128) {
        let mut token = deploy();
        token.transfer("owner", &"alice".to_string(), amount).unwrap();
        let first = token.snapshot("owner").unwrap();
        for _ in 0..gap {
            token.snapshot("owner").unwrap();
            token.transfer("owner", &"bob".to_string(), 1).unwrap();
        }
        let last = token.current_snapshot_id();
        prop_assert_eq!(
            token.balance_of_at("alice", first).unwrap(),
            token.balance_of_at("alice", last).unwrap()
        );
        prop_assert_eq!(token.balance_of_at("alice", last).unwrap(), amount);
    }
}
