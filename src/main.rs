use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use lime_ledger::{
    amount::parse_amount, AccountId, Amount, LedgerMutation, SnapshotId, Token, TokenConfig,
};

mod keys;
mod state;

//==================== CLI ====================//

#[derive(Parser)]
#[command(name = "lime", version, about = "LIME capped token ledger with balance snapshots")]
struct Cli {
    /// Ledger state file (JSON).
    #[arg(long, global = true, default_value = "lime-state.json")]
    state: PathBuf,

    /// -v info, -vv debug. RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Identity the call is made as.
#[derive(Args, Clone)]
#[group(required = true, multiple = false)]
struct Caller {
    /// Account id of the caller.
    #[arg(long)]
    caller: Option<AccountId>,

    /// 32-byte ed25519 secret key (hex); the caller is its public key.
    #[arg(long = "caller-sk", value_name = "HEX")]
    caller_sk: Option<String>,
}

impl Caller {
    fn resolve(&self) -> Result<AccountId> {
        match (&self.caller, &self.caller_sk) {
            (Some(caller), _) => Ok(caller.clone()),
            (None, Some(sk_hex)) => Ok(keys::account_id(&keys::parse_sk_hex(sk_hex)?)),
            (None, None) => bail!("either --caller or --caller-sk is required"),
        }
    }
}

fn amount_arg(s: &str) -> Result<Amount, String> {
    parse_amount(s)
}

#[derive(Subcommand)]
enum Command {
    /// Create a new ledger; the owner receives the initial supply.
    Init {
        /// TOML token config.
        #[arg(long, conflicts_with_all = ["owner", "cap"])]
        config: Option<PathBuf>,
        #[arg(long, required_unless_present = "config")]
        owner: Option<AccountId>,
        #[arg(long, value_parser = amount_arg)]
        cap: Option<Amount>,
        /// Overwrite an existing state file.
        #[arg(long)]
        force: bool,
    },
    /// Metadata, owner, pause flag, supply, snapshot counter and state root.
    Info,
    Balance {
        account: AccountId,
    },
    Supply,
    BalanceAt {
        account: AccountId,
        id: SnapshotId,
    },
    SupplyAt {
        id: SnapshotId,
    },
    Allowance {
        owner: AccountId,
        spender: AccountId,
    },
    /// Print the event journal as JSON lines.
    Events {
        /// Clear the journal after printing.
        #[arg(long)]
        drain: bool,
    },
    Transfer {
        #[command(flatten)]
        caller: Caller,
        to: AccountId,
        #[arg(value_parser = amount_arg)]
        amount: Amount,
    },
    TransferFrom {
        #[command(flatten)]
        caller: Caller,
        from: AccountId,
        to: AccountId,
        #[arg(value_parser = amount_arg)]
        amount: Amount,
    },
    Approve {
        #[command(flatten)]
        caller: Caller,
        spender: AccountId,
        #[arg(value_parser = amount_arg)]
        amount: Amount,
    },
    Burn {
        #[command(flatten)]
        caller: Caller,
        #[arg(value_parser = amount_arg)]
        amount: Amount,
    },
    BurnFrom {
        #[command(flatten)]
        caller: Caller,
        from: AccountId,
        #[arg(value_parser = amount_arg)]
        amount: Amount,
    },
    Mint {
        #[command(flatten)]
        caller: Caller,
        to: AccountId,
        #[arg(value_parser = amount_arg)]
        amount: Amount,
    },
    BurnByOwner {
        #[command(flatten)]
        caller: Caller,
        from: AccountId,
        #[arg(value_parser = amount_arg)]
        amount: Amount,
    },
    Pause {
        #[command(flatten)]
        caller: Caller,
    },
    Unpause {
        #[command(flatten)]
        caller: Caller,
    },
    Snapshot {
        #[command(flatten)]
        caller: Caller,
    },
    TransferOwnership {
        #[command(flatten)]
        caller: Caller,
        new_owner: AccountId,
    },
    /// Apply a JSON array of mutations atomically.
    Apply {
        #[command(flatten)]
        caller: Caller,
        batch: PathBuf,
    },
    /// Generate an ed25519 identity usable with --caller-sk.
    Keygen {
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

impl Command {
    /// Caller and mutation for the single-mutation commands.
    fn mutation(&self) -> Option<(&Caller, LedgerMutation)> {
        let m = match self {
            Command::Transfer { caller, to, amount } => (
                caller,
                LedgerMutation::Transfer {
                    to: to.clone(),
                    amount: *amount,
                },
            ),
            Command::TransferFrom {
                caller,
                from,
                to,
                amount,
            } => (
                caller,
                LedgerMutation::TransferFrom {
                    from: from.clone(),
                    to: to.clone(),
                    amount: *amount,
                },
            ),
            Command::Approve {
                caller,
                spender,
                amount,
            } => (
                caller,
                LedgerMutation::Approve {
                    spender: spender.clone(),
                    amount: *amount,
                },
            ),
            Command::Burn { caller, amount } => (caller, LedgerMutation::Burn { amount: *amount }),
            Command::BurnFrom {
                caller,
                from,
                amount,
            } => (
                caller,
                LedgerMutation::BurnFrom {
                    from: from.clone(),
                    amount: *amount,
                },
            ),
            Command::Mint { caller, to, amount } => (
                caller,
                LedgerMutation::Mint {
                    to: to.clone(),
                    amount: *amount,
                },
            ),
            Command::BurnByOwner {
                caller,
                from,
                amount,
            } => (
                caller,
                LedgerMutation::BurnByOwner {
                    from: from.clone(),
                    amount: *amount,
                },
            ),
            Command::Pause { caller } => (caller, LedgerMutation::Pause),
            Command::Unpause { caller } => (caller, LedgerMutation::Unpause),
            Command::Snapshot { caller } => (caller, LedgerMutation::Snapshot),
            Command::TransferOwnership { caller, new_owner } => (
                caller,
                LedgerMutation::TransferOwnership {
                    new_owner: new_owner.clone(),
                },
            ),
            _ => return None,
        };
        Some(m)
    }
}

//==================== команды ====================//

fn init_cmd(
    cli: &Cli,
    config: &Option<PathBuf>,
    owner: &Option<AccountId>,
    cap: &Option<Amount>,
    force: bool,
) -> Result<()> {
    if cli.state.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            cli.state.display()
        );
    }
    let config = match (config, owner) {
        (Some(path), _) => TokenConfig::load(path)?,
        (None, Some(owner)) => {
            let mut config = TokenConfig::new(owner.clone());
            if let Some(cap) = cap {
                config = config.with_cap(*cap);
            }
            config
        }
        (None, None) => bail!("either --config or --owner is required"),
    };
    let token = Token::new(config)?;
    state::save(&cli.state, &token)?;
    println!(
        "ledger initialised → {} (owner {}, supply {})",
        cli.state.display(),
        token.owner(),
        token.total_supply()
    );
    Ok(())
}

fn info_cmd(token: &Token) -> Result<()> {
    let info = json!({
        "name": token.name(),
        "symbol": token.symbol(),
        "decimals": token.decimals(),
        "owner": token.owner(),
        "paused": token.paused(),
        "cap": token.cap().to_string(),
        "total_supply": token.total_supply().to_string(),
        "snapshot_id": token.current_snapshot_id(),
        "snapshot_policy": token.snapshot_policy(),
        "pause_policy": token.pause_policy(),
        "state_root": hex::encode(token.state_root()),
    });
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn events_cmd(cli: &Cli, mut token: Token, drain: bool) -> Result<()> {
    for event in token.events() {
        println!("{}", serde_json::to_string(event)?);
    }
    if drain {
        token.drain_events();
        state::save(&cli.state, &token)?;
    }
    Ok(())
}

/// Runs one mutation (or an atomic batch) and persists the result only on success.
fn mutate_cmd(cli: &Cli, caller: &Caller, mutations: &[LedgerMutation]) -> Result<()> {
    let caller = caller.resolve()?;
    let mut token = state::load(&cli.state)?;
    let events = token
        .apply_batch(&caller, mutations)
        .with_context(|| format!("rejected call from {caller}"))?;
    state::save(&cli.state, &token)?;
    if let [LedgerMutation::Snapshot] = mutations {
        println!("{}", token.current_snapshot_id());
    }
    for event in &events {
        tracing::info!(event = %serde_json::to_string(event)?, "emitted");
    }
    Ok(())
}

fn keygen_cmd(out_dir: &Option<PathBuf>) -> Result<()> {
    let keypair = keys::generate();
    match out_dir {
        Some(dir) => {
            keys::write_keypair(dir, &keypair)?;
            println!("{}", keypair.account);
            eprintln!("keypair written → {}", dir.display());
        }
        None => {
            println!("account {}", keypair.account);
            println!("sk      {}", keypair.sk_hex);
        }
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    if let Some((caller, mutation)) = cli.command.mutation() {
        return mutate_cmd(cli, caller, &[mutation]);
    }
    match &cli.command {
        Command::Init {
            config,
            owner,
            cap,
            force,
        } => init_cmd(cli, config, owner, cap, *force),
        Command::Keygen { out_dir } => keygen_cmd(out_dir),
        Command::Apply { caller, batch } => {
            let raw = fs::read(batch).with_context(|| format!("read {}", batch.display()))?;
            let mutations: Vec<LedgerMutation> =
                serde_json::from_slice(&raw).with_context(|| format!("parse {}", batch.display()))?;
            if mutations.is_empty() {
                bail!("batch {} is empty", batch.display());
            }
            mutate_cmd(cli, caller, &mutations)
        }
        Command::Events { drain } => events_cmd(cli, state::load(&cli.state)?, *drain),
        read => {
            let token = state::load(&cli.state)?;
            match read {
                Command::Info => info_cmd(&token)?,
                Command::Balance { account } => println!("{}", token.balance_of(account)),
                Command::Supply => println!("{}", token.total_supply()),
                Command::BalanceAt { account, id } => {
                    println!("{}", token.balance_of_at(account, *id)?)
                }
                Command::SupplyAt { id } => println!("{}", token.total_supply_at(*id)?),
                Command::Allowance { owner, spender } => {
                    println!("{}", token.allowance(owner, spender))
                }
                _ => bail!("mutating commands are dispatched before reads"),
            }
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(&cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> Result<()> {
        let cli = Cli::try_parse_from(std::iter::once("lime").chain(args.iter().copied()))?;
        run(&cli)
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn rejected_call_leaves_state_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let state = path.to_str().unwrap();

        run_args(&["--state", state, "init", "--owner", "owner", "--cap", "1000"]).unwrap();
        run_args(&["--state", state, "transfer", "--caller", "owner", "bob", "400"]).unwrap();
        run_args(&["--state", state, "snapshot", "--caller", "owner"]).unwrap();
        let before = fs::read(&path).unwrap();

        assert!(run_args(&["--state", state, "mint", "--caller", "bob", "bob", "1"]).is_err());
        assert!(run_args(&["--state", state, "transfer", "--caller", "bob", "carol", "401"]).is_err());
        assert_eq!(fs::read(&path).unwrap(), before);

        let token = state::load(&path).unwrap();
        assert_eq!(token.balance_of("bob"), 400);
        assert_eq!(token.balance_of_at("bob", 1).unwrap(), 400);
    }

    #[test]
    fn batch_file_is_applied_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let state = path.to_str().unwrap();
        let batch = dir.path().join("batch.json");

        run_args(&["--state", state, "init", "--owner", "owner", "--cap", "1000"]).unwrap();
        fs::write(
            &batch,
            r#"[{"type": "burn", "amount": "10"}, {"type": "mint", "to": "bob", "amount": "11"}]"#,
        )
        .unwrap();
        assert!(run_args(&["--state", state, "apply", "--caller", "owner", batch.to_str().unwrap()]).is_err());
        assert_eq!(state::load(&path).unwrap().total_supply(), 1_000);

        fs::write(
            &batch,
            r#"[{"type": "burn", "amount": "10"}, {"type": "mint", "to": "bob", "amount": "10"}]"#,
        )
        .unwrap();
        run_args(&["--state", state, "apply", "--caller", "owner", batch.to_str().unwrap()]).unwrap();
        let token = state::load(&path).unwrap();
        assert_eq!(token.balance_of("bob"), 10);
        assert_eq!(token.total_supply(), 1_000);
    }

    #[test]
    fn secret_key_caller_acts_as_its_account() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let state = path.to_str().unwrap();
        let keypair = keys::generate();

        run_args(&["--state", state, "init", "--owner", &keypair.account, "--cap", "50"]).unwrap();
        run_args(&["--state", state, "pause", "--caller-sk", &keypair.sk_hex]).unwrap();
        assert!(state::load(&path).unwrap().paused());
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let state = path.to_str().unwrap();
        run_args(&["--state", state, "init", "--owner", "owner"]).unwrap();
        assert!(run_args(&["--state", state, "init", "--owner", "other"]).is_err());
        run_args(&["--state", state, "init", "--owner", "other", "--force"]).unwrap();
        assert_eq!(state::load(&path).unwrap().owner(), "other");
    }
}
