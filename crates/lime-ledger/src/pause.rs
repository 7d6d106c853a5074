use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// How `pause()`/`unpause()` treat a request that matches the current state.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PausePolicy {
    /// Re-pausing or re-unpausing succeeds and changes nothing.
    #[default]
    Idempotent,
    /// Re-pausing fails with `AlreadyPaused`, re-unpausing with `NotPaused`.
    Strict,
}

/// Global switch that halts every balance-mutating operation while set.
///
/// Ownership is checked by the token before calling into the gate.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PauseGate {
    paused: bool,
    policy: PausePolicy,
}

impl PauseGate {
    pub fn new(policy: PausePolicy) -> Self {
        Self {
            paused: false,
            policy,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn policy(&self) -> PausePolicy {
        self.policy
    }

    pub fn require_not_paused(&self) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::ContractPaused);
        }
        Ok(())
    }

    /// Returns whether the flag actually flipped.
    pub fn pause(&mut self) -> Result<bool, LedgerError> {
        self.set(true)
    }

    /// Returns whether the flag actually flipped.
    pub fn unpause(&mut self) -> Result<bool, LedgerError> {
        self.set(false)
    }

    fn set(&mut self, paused: bool) -> Result<bool, LedgerError> {
        if self.paused == paused {
            return match (self.policy, paused) {
                (PausePolicy::Idempotent, _) => Ok(false),
                (PausePolicy::Strict, true) => Err(LedgerError::AlreadyPaused),
                (PausePolicy::Strict, false) => Err(LedgerError::NotPaused),
            };
        }
        self.paused = paused;
        Ok(true)
    }
}
