use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use ed25519_dalek::SigningKey;
use rand::{rngs::OsRng, RngCore};

use lime_ledger::AccountId;

/// Account id for an ed25519 identity: hex of the verifying key.
pub fn account_id(sk: &SigningKey) -> AccountId {
    hex::encode(sk.verifying_key().as_bytes())
}

pub fn parse_sk_hex(sk_hex: &str) -> Result<SigningKey> {
    let sk_bytes = hex::decode(sk_hex.trim()).context("invalid caller-sk hex")?;
    if sk_bytes.len() != 32 {
        bail!("caller-sk must be 32 bytes (64 hex chars)");
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&sk_bytes);
    Ok(SigningKey::from_bytes(&arr))
}

pub struct Keypair {
    pub sk_hex: String,
    pub account: AccountId,
}

pub fn generate() -> Keypair {
    // случайный секрет (32 байта) → ключ
    let mut sk_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut sk_bytes);
    let sk = SigningKey::from_bytes(&sk_bytes);
    Keypair {
        sk_hex: hex::encode(sk_bytes),
        account: account_id(&sk),
    }
}

/// Writes `sk.hex` and `account.hex` into `out_dir`.
pub fn write_keypair(out_dir: &Path, keypair: &Keypair) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("create {}", out_dir.display()))?;
    fs::write(out_dir.join("sk.hex"), &keypair.sk_hex).context("write sk.hex")?;
    fs::write(out_dir.join("account.hex"), &keypair.account).context("write account.hex")?;
    Ok(())
}
