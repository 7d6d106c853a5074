//! Deterministic digest over the ledger's bookkeeping.

use sha2::{Digest, Sha256};

use crate::Token;

/// SHA-256 Merkle root over balances, supply, owner, pause flag, allowances,
/// the snapshot counter and every checkpoint sequence.
///
/// Metadata, policies and the event journal are not part of the root.
pub fn state_root(token: &Token) -> [u8; 32] {
    let mut leaves: Vec<[u8; 32]> = Vec::new();

    let mut hasher = Sha256::new();
    hasher.update(b"globals");
    hash_str(&mut hasher, token.owner());
    hasher.update([token.paused() as u8]);
    hasher.update(token.cap().to_le_bytes());
    hasher.update(token.total_supply().to_le_bytes());
    hasher.update(token.current_snapshot_id().to_le_bytes());
    leaves.push(hasher.finalize().into());

    for (account, balance) in token.balances().accounts() {
        let mut hasher = Sha256::new();
        hasher.update(b"acct");
        hash_str(&mut hasher, account);
        hasher.update(balance.to_le_bytes());
        leaves.push(hasher.finalize().into());
    }

    for ((owner, spender), amount) in token.allowances().grants() {
        let mut hasher = Sha256::new();
        hasher.update(b"allowance");
        hash_str(&mut hasher, owner);
        hash_str(&mut hasher, spender);
        hasher.update(amount.to_le_bytes());
        leaves.push(hasher.finalize().into());
    }

    let snapshots = token.snapshots();
    let mut hasher = Sha256::new();
    hasher.update(b"supply-checkpoints");
    for checkpoint in snapshots.total_supply_checkpoints().as_slice() {
        hasher.update(checkpoint.id.to_le_bytes());
        hasher.update(checkpoint.value.to_le_bytes());
    }
    leaves.push(hasher.finalize().into());

    for (account, checkpoints) in snapshots.accounts() {
        let mut hasher = Sha256::new();
        hasher.update(b"acct-checkpoints");
        hash_str(&mut hasher, account);
        for checkpoint in checkpoints.as_slice() {
            hasher.update(checkpoint.id.to_le_bytes());
            hasher.update(checkpoint.value.to_le_bytes());
        }
        leaves.push(hasher.finalize().into());
    }

    build_merkle(leaves)
}

// Length-prefixed so adjacent strings cannot run into each other.
fn hash_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

fn build_merkle(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"lime-ledger-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity((leaves.len() + 1) / 2);
        for chunk in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(chunk[0]);
            if chunk.len() == 2 {
                hasher.update(chunk[1]);
            } else {
                hasher.update(chunk[0]);
            }
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}
