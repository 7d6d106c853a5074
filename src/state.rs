//! Persistence of the ledger between invocations.
//!
//! The file is replaced only after a command succeeded, which gives the CLI the
//! host-level rollback the ledger relies on: a rejected call is never written.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};

use lime_ledger::Token;

pub fn load(path: &Path) -> Result<Token> {
    if !path.exists() {
        bail!(
            "no ledger state at {} (run `lime init` first)",
            path.display()
        );
    }
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))
}

/// Writes through a temporary file and renames, so a crash never leaves a
/// half-written state file behind.
pub fn save(path: &Path, token: &Token) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
    }
    let json = serde_json::to_vec_pretty(token).context("encode ledger state")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))?;
    tracing::debug!(path = %path.display(), "state saved");
    Ok(())
}
