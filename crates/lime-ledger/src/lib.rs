//! Ledger core for the LIME token.
//!
//! The crate tracks balances and total supply for a fungible token and wraps
//! them in the guards a governance token needs:
//!
//! * [`access`]: a single owner gating mint, owner burns and the pause switch.
//! * [`pause`]: a global switch that halts every balance movement.
//! * [`cap`]: an immutable ceiling on total supply.
//! * [`snapshot`]: lazy checkpoint-on-write history answering "what was this
//!   balance (or the supply) at snapshot N" in `O(log k)`.
//! * [`token`]: the composed [`Token`] exposing every operation, plus atomic
//!   batches of [`LedgerMutation`]s.
//!
//! Every operation returns `Result<_, LedgerError>` and a rejected operation
//! leaves no trace, checkpoints included.

pub mod access;
pub mod allowance;
pub mod amount;
pub mod balances;
pub mod cap;
pub mod config;
pub mod events;
pub mod mutation;
pub mod pause;
pub mod root;
pub mod snapshot;
pub mod token;

mod error;

pub use config::{ConfigError, SnapshotPolicy, TokenConfig, TokenMetadata};
pub use error::LedgerError;
pub use events::LedgerEvent;
pub use mutation::LedgerMutation;
pub use pause::PausePolicy;
pub use token::Token;

/// Opaque account key.
pub type AccountId = String;

/// Token amount in base units.
pub type Amount = u128;

/// Snapshot id; 0 means "no snapshot yet".
pub type SnapshotId = u64;
