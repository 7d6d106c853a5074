//! The LIME token: every public ledger operation, composed from the guard
//! components and the snapshot store.
//!
//! Each mutating operation runs its guards in a fixed order (ownership, pause,
//! cap, allowance, balance) before anything is written. Only once every check has
//! passed do the snapshot pre-write hooks and the balance update run, so a
//! rejected call never leaves a staged checkpoint behind.

use serde::{Deserialize, Serialize};

use crate::{
    access::AccessControl,
    allowance::Allowances,
    balances::Balances,
    cap::CapEnforcer,
    config::{ConfigError, SnapshotPolicy, TokenConfig, TokenMetadata},
    events::LedgerEvent,
    mutation::LedgerMutation,
    pause::{PauseGate, PausePolicy},
    root,
    snapshot::SnapshotStore,
    AccountId, Amount, LedgerError, SnapshotId,
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    metadata: TokenMetadata,
    snapshot_policy: SnapshotPolicy,
    access: AccessControl,
    pause: PauseGate,
    cap: CapEnforcer,
    balances: Balances,
    allowances: Allowances,
    snapshots: SnapshotStore,
    #[serde(default)]
    events: Vec<LedgerEvent>,
}

fn log_rejected(op: &'static str, caller: &str, err: &LedgerError) {
    tracing::warn!(op, caller, %err, "operation rejected");
}

impl Token {
    /// Builds the ledger and mints the initial supply to the owner.
    pub fn new(config: TokenConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let initial_supply = config.initial_supply();
        let mut token = Self {
            metadata: config.metadata,
            snapshot_policy: config.snapshot_policy,
            access: AccessControl::new(config.owner.clone()),
            pause: PauseGate::new(config.pause_policy),
            cap: CapEnforcer::new(config.cap),
            balances: Balances::new(),
            allowances: Allowances::new(),
            snapshots: SnapshotStore::new(),
            events: Vec::new(),
        };
        token.update(None, Some(&config.owner), initial_supply).map_err(|e| {
            ConfigError::Invalid(format!("initial mint failed: {e}"))
        })?;
        tracing::info!(
            owner = %config.owner,
            cap = %config.cap,
            initial_supply = %initial_supply,
            symbol = %token.metadata.symbol,
            "token created"
        );
        Ok(token)
    }

    // ---- metadata and configuration ----

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn cap(&self) -> Amount {
        self.cap.cap()
    }

    pub fn owner(&self) -> &AccountId {
        self.access.owner()
    }

    pub fn paused(&self) -> bool {
        self.pause.is_paused()
    }

    pub fn snapshot_policy(&self) -> SnapshotPolicy {
        self.snapshot_policy
    }

    pub fn pause_policy(&self) -> PausePolicy {
        self.pause.policy()
    }

    // ---- reads ----

    pub fn balance_of(&self, account: &str) -> Amount {
        self.balances.balance_of(account)
    }

    pub fn total_supply(&self) -> Amount {
        self.balances.total_supply()
    }

    pub fn allowance(&self, owner: &str, spender: &str) -> Amount {
        self.allowances.allowance(owner, spender)
    }

    pub fn current_snapshot_id(&self) -> SnapshotId {
        self.snapshots.current_id()
    }

    /// Balance of `account` when snapshot `id` was taken.
    pub fn balance_of_at(&self, account: &str, id: SnapshotId) -> Result<Amount, LedgerError> {
        self.snapshots
            .balance_at(account, id, self.balances.balance_of(account))
    }

    /// Total supply when snapshot `id` was taken.
    pub fn total_supply_at(&self, id: SnapshotId) -> Result<Amount, LedgerError> {
        self.snapshots
            .total_supply_at(id, self.balances.total_supply())
    }

    pub fn balances(&self) -> &Balances {
        &self.balances
    }

    pub fn allowances(&self) -> &Allowances {
        &self.allowances
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Hands the event journal to an external sink, leaving it empty.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    /// See [`root::state_root`].
    pub fn state_root(&self) -> [u8; 32] {
        root::state_root(self)
    }

    // ---- holder operations ----

    pub fn transfer(&mut self, caller: &str, to: &AccountId, amount: Amount) -> Result<(), LedgerError> {
        let from = caller.to_string();
        self.pause
            .require_not_paused()
            .and_then(|_| self.update(Some(&from), Some(to), amount))
            .inspect_err(|err| log_rejected("transfer", caller, err))?;
        tracing::info!(%from, %to, %amount, "transfer");
        Ok(())
    }

    /// Burns from the caller's own balance.
    pub fn burn(&mut self, caller: &str, amount: Amount) -> Result<(), LedgerError> {
        let from = caller.to_string();
        self.pause
            .require_not_paused()
            .and_then(|_| self.update(Some(&from), None, amount))
            .inspect_err(|err| log_rejected("burn", caller, err))?;
        tracing::info!(%from, %amount, "burn");
        Ok(())
    }

    pub fn approve(&mut self, caller: &str, spender: &AccountId, amount: Amount) -> Result<(), LedgerError> {
        let owner = caller.to_string();
        self.allowances.approve(&owner, spender, amount);
        tracing::info!(%owner, %spender, %amount, "approve");
        self.events.push(LedgerEvent::Approval {
            owner,
            spender: spender.clone(),
            amount,
        });
        Ok(())
    }

    /// Adds to the current allowance, saturating at unlimited.
    pub fn increase_allowance(
        &mut self,
        caller: &str,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let current = self.allowances.allowance(caller, spender);
        self.approve(caller, spender, current.saturating_add(amount))
    }

    pub fn decrease_allowance(
        &mut self,
        caller: &str,
        spender: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.allowances
            .ensure_allowance(caller, spender, amount)
            .inspect_err(|err| log_rejected("decrease_allowance", caller, err))?;
        let current = self.allowances.allowance(caller, spender);
        self.approve(caller, spender, current - amount)
    }

    /// Moves `amount` out of `from` on the strength of an allowance granted to
    /// the caller.
    pub fn transfer_from(
        &mut self,
        caller: &str,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let spender = caller.to_string();
        self.pause
            .require_not_paused()
            .and_then(|_| self.allowances.ensure_allowance(from, &spender, amount))
            .and_then(|_| self.balances.ensure_available(from, amount))
            .and_then(|_| self.allowances.spend(from, &spender, amount))
            .and_then(|_| self.update(Some(from), Some(to), amount))
            .inspect_err(|err| log_rejected("transfer_from", caller, err))?;
        tracing::info!(%spender, %from, %to, %amount, "transfer_from");
        Ok(())
    }

    /// Burns from `from` on the strength of an allowance granted to the caller.
    pub fn burn_from(&mut self, caller: &str, from: &AccountId, amount: Amount) -> Result<(), LedgerError> {
        let spender = caller.to_string();
        self.pause
            .require_not_paused()
            .and_then(|_| self.allowances.ensure_allowance(from, &spender, amount))
            .and_then(|_| self.balances.ensure_available(from, amount))
            .and_then(|_| self.allowances.spend(from, &spender, amount))
            .and_then(|_| self.update(Some(from), None, amount))
            .inspect_err(|err| log_rejected("burn_from", caller, err))?;
        tracing::info!(%spender, %from, %amount, "burn_from");
        Ok(())
    }

    // ---- owner operations ----

    pub fn mint(&mut self, caller: &str, to: &AccountId, amount: Amount) -> Result<(), LedgerError> {
        self.access
            .require_owner(caller)
            .and_then(|_| self.pause.require_not_paused())
            .and_then(|_| self.cap.require_within_cap(self.balances.total_supply(), amount))
            .and_then(|_| self.update(None, Some(to), amount))
            .inspect_err(|err| log_rejected("mint", caller, err))?;
        tracing::info!(%to, %amount, total_supply = %self.total_supply(), "mint");
        Ok(())
    }

    /// Burns from an arbitrary account; owner only.
    pub fn burn_by_owner(&mut self, caller: &str, from: &AccountId, amount: Amount) -> Result<(), LedgerError> {
        self.access
            .require_owner(caller)
            .and_then(|_| self.pause.require_not_paused())
            .and_then(|_| self.update(Some(from), None, amount))
            .inspect_err(|err| log_rejected("burn_by_owner", caller, err))?;
        tracing::info!(%from, %amount, "burn_by_owner");
        Ok(())
    }

    pub fn pause(&mut self, caller: &str) -> Result<(), LedgerError> {
        let flipped = self
            .access
            .require_owner(caller)
            .and_then(|_| self.pause.pause())
            .inspect_err(|err| log_rejected("pause", caller, err))?;
        if flipped {
            tracing::info!(by = caller, "paused");
            self.events.push(LedgerEvent::Paused {
                by: caller.to_string(),
            });
        }
        Ok(())
    }

    pub fn unpause(&mut self, caller: &str) -> Result<(), LedgerError> {
        let flipped = self
            .access
            .require_owner(caller)
            .and_then(|_| self.pause.unpause())
            .inspect_err(|err| log_rejected("unpause", caller, err))?;
        if flipped {
            tracing::info!(by = caller, "unpaused");
            self.events.push(LedgerEvent::Unpaused {
                by: caller.to_string(),
            });
        }
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: &str, new_owner: AccountId) -> Result<(), LedgerError> {
        let previous = self
            .access
            .transfer_ownership(caller, new_owner.clone())
            .inspect_err(|err| log_rejected("transfer_ownership", caller, err))?;
        tracing::info!(%previous, %new_owner, "ownership transferred");
        self.events.push(LedgerEvent::OwnershipTransferred {
            previous,
            new_owner,
        });
        Ok(())
    }

    /// Opens a new snapshot and returns its id. Who may call this is decided by
    /// the token's [`SnapshotPolicy`]; pausing does not block it.
    pub fn snapshot(&mut self, caller: &str) -> Result<SnapshotId, LedgerError> {
        if self.snapshot_policy == SnapshotPolicy::OwnerOnly {
            self.access
                .require_owner(caller)
                .inspect_err(|err| log_rejected("snapshot", caller, err))?;
        }
        let id = self.snapshots.snapshot();
        tracing::info!(id, by = caller, "snapshot");
        self.events.push(LedgerEvent::Snapshot { id });
        Ok(id)
    }

    // ---- mutations ----

    /// Applies one mutation on behalf of `caller`; returns the events it emitted.
    pub fn apply(&mut self, caller: &str, mutation: &LedgerMutation) -> Result<Vec<LedgerEvent>, LedgerError> {
        let mark = self.events.len();
        match mutation {
            LedgerMutation::Transfer { to, amount } => self.transfer(caller, to, *amount)?,
            LedgerMutation::TransferFrom { from, to, amount } => {
                self.transfer_from(caller, from, to, *amount)?
            }
            LedgerMutation::Approve { spender, amount } => self.approve(caller, spender, *amount)?,
            LedgerMutation::IncreaseAllowance { spender, amount } => {
                self.increase_allowance(caller, spender, *amount)?
            }
            LedgerMutation::DecreaseAllowance { spender, amount } => {
                self.decrease_allowance(caller, spender, *amount)?
            }
            LedgerMutation::Burn { amount } => self.burn(caller, *amount)?,
            LedgerMutation::BurnFrom { from, amount } => self.burn_from(caller, from, *amount)?,
            LedgerMutation::Mint { to, amount } => self.mint(caller, to, *amount)?,
            LedgerMutation::BurnByOwner { from, amount } => {
                self.burn_by_owner(caller, from, *amount)?
            }
            LedgerMutation::Pause => self.pause(caller)?,
            LedgerMutation::Unpause => self.unpause(caller)?,
            LedgerMutation::Snapshot => {
                self.snapshot(caller)?;
            }
            LedgerMutation::TransferOwnership { new_owner } => {
                self.transfer_ownership(caller, new_owner.clone())?
            }
        }
        Ok(self.events[mark..].to_vec())
    }

    /// Applies `mutations` in order as one atomic unit: if any fails, nothing
    /// from the batch is kept.
    pub fn apply_batch(
        &mut self,
        caller: &str,
        mutations: &[LedgerMutation],
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let mut staged = self.clone();
        let mut emitted = Vec::new();
        for (index, mutation) in mutations.iter().enumerate() {
            let events = staged
                .apply(caller, mutation)
                .map_err(|source| LedgerError::BatchFailed {
                    index,
                    source: Box::new(source),
                })?;
            emitted.extend(events);
        }
        *self = staged;
        Ok(emitted)
    }

    /// Balance movement shared by every transfer, mint and burn. `None` on
    /// either side means supply is created or destroyed.
    ///
    /// The source balance is checked before anything is written; after that the
    /// snapshot hooks run for every value about to change, then the balances.
    fn update(
        &mut self,
        from: Option<&AccountId>,
        to: Option<&AccountId>,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if let Some(from) = from {
            self.balances.ensure_available(from, amount)?;
        }

        for account in [from, to].into_iter().flatten() {
            self.snapshots
                .update_account(account, self.balances.balance_of(account));
        }
        if from.is_none() || to.is_none() {
            self.snapshots
                .update_total_supply(self.balances.total_supply());
        }

        match (from, to) {
            (Some(from), Some(to)) => self.balances.transfer(from, to, amount)?,
            (Some(from), None) => self.balances.debit(from, amount)?,
            (None, Some(to)) => self.balances.credit(to, amount),
            (None, None) => {}
        }

        self.events.push(LedgerEvent::Transfer {
            from: from.cloned(),
            to: to.cloned(),
            amount,
        });
        Ok(())
    }
}
