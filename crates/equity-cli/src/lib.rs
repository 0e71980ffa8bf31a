//! Driver for the `equity-registry` binary.
//!
//! Loads a genesis file, optionally replays an operation script through an
//! authorized [`SharedRegistry`], and renders the result.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use equity_ledger::{
    format_percent, resolve_member, Amount, GenesisConfig, MembersOnly, RegistrySnapshot,
    SharedRegistry,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Registry rejected setup or a query
    #[error("registry error: {0}")]
    Ledger(#[from] equity_ledger::Error),

    /// A scripted operation failed; earlier operations stay applied
    #[error("operation {index} ({op}) failed: {source}")]
    Operation {
        index: usize,
        op: String,
        source: equity_ledger::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid script: {0}")]
    Script(#[from] serde_json::Error),

    #[error("invalid environment: {0}")]
    Env(String),
}

/// Environment-driven settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Default genesis file when none is given on the command line
    pub genesis: PathBuf,

    /// Minimum member count applied to scripted removals without their own
    pub min_members: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            genesis: PathBuf::from("./genesis.json"),
            min_members: 1,
        }
    }
}

impl CliConfig {
    /// Read `EQUITY_GENESIS` and `EQUITY_MIN_MEMBERS`, falling back to defaults.
    pub fn from_env() -> Result<Self, CliError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CliError> {
        let defaults = Self::default();
        let genesis = lookup("EQUITY_GENESIS")
            .map(PathBuf::from)
            .unwrap_or(defaults.genesis);
        let min_members = match lookup("EQUITY_MIN_MEMBERS") {
            Some(raw) => raw
                .parse()
                .map_err(|_| CliError::Env(format!("EQUITY_MIN_MEMBERS={raw} is not a count")))?,
            None => defaults.min_members,
        };
        Ok(Self {
            genesis,
            min_members,
        })
    }
}

/// One scripted mutation. Identities are hex addresses or labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    AddWithDilution {
        caller: String,
        member: String,
        percent: Amount,
    },
    SellUnallotted {
        caller: String,
        member: String,
        amount: Amount,
    },
    Remove {
        caller: String,
        #[serde(default)]
        predecessor: Option<String>,
        member: String,
        #[serde(default)]
        minimum: Option<usize>,
    },
    Swap {
        caller: String,
        #[serde(default)]
        predecessor: Option<String>,
        old: String,
        new: String,
    },
}

impl Operation {
    fn name(&self) -> &'static str {
        match self {
            Self::AddWithDilution { .. } => "add_with_dilution",
            Self::SellUnallotted { .. } => "sell_unallotted",
            Self::Remove { .. } => "remove",
            Self::Swap { .. } => "swap",
        }
    }
}

/// Parse an operation script (a JSON array).
pub fn load_script(path: impl AsRef<Path>) -> Result<Vec<Operation>, CliError> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&raw)?)
}

/// Build the registry described by a genesis file.
pub fn load_registry(genesis: impl AsRef<Path>) -> Result<SharedRegistry, CliError> {
    let config = GenesisConfig::from_file(genesis)?;
    let registry = config.build()?;
    tracing::info!(registry = %registry.id(), owners = registry.owner_count(), "genesis loaded");
    Ok(SharedRegistry::new(registry, Arc::new(MembersOnly)))
}

/// Apply `ops` in order, stopping at the first failure.
///
/// Returns the number of operations applied.
pub async fn run_script(
    registry: &SharedRegistry,
    ops: &[Operation],
    default_minimum: usize,
) -> Result<usize, CliError> {
    for (index, op) in ops.iter().enumerate() {
        match execute(registry, op, default_minimum).await {
            Ok(()) => tracing::debug!(index, op = op.name(), "operation applied"),
            Err(source) => {
                tracing::warn!(index, op = op.name(), error = %source, "operation rejected");
                return Err(CliError::Operation {
                    index,
                    op: op.name().to_string(),
                    source,
                });
            }
        }
    }
    Ok(ops.len())
}

/// Outcome of [`apply_script`]: the state reached, and what stopped it.
#[derive(Debug)]
pub struct ScriptReport {
    pub applied: usize,
    pub snapshot: RegistrySnapshot,
    pub failure: Option<CliError>,
}

/// Run a script and snapshot the registry whether or not it finished.
///
/// A rejected operation lands in [`ScriptReport::failure`]; operations
/// before it stay applied and show in the snapshot.
pub async fn apply_script(
    registry: &SharedRegistry,
    ops: &[Operation],
    default_minimum: usize,
) -> Result<ScriptReport, CliError> {
    let (applied, failure) = match run_script(registry, ops, default_minimum).await {
        Ok(applied) => (applied, None),
        Err(err @ CliError::Operation { index, .. }) => (index, Some(err)),
        Err(err) => return Err(err),
    };
    let snapshot = registry.snapshot().await?;
    Ok(ScriptReport {
        applied,
        snapshot,
        failure,
    })
}

async fn execute(registry: &SharedRegistry, op: &Operation, default_minimum: usize) -> equity_ledger::Result<()> {
    match op {
        Operation::AddWithDilution {
            caller,
            member,
            percent,
        } => {
            registry
                .add_member_with_dilution(resolve_member(caller)?, resolve_member(member)?, *percent)
                .await?;
        }
        Operation::SellUnallotted {
            caller,
            member,
            amount,
        } => {
            registry
                .sell_unallotted(resolve_member(caller)?, resolve_member(member)?, *amount)
                .await?;
        }
        Operation::Remove {
            caller,
            predecessor,
            member,
            minimum,
        } => {
            registry
                .remove_member(
                    resolve_member(caller)?,
                    predecessor.as_deref().map(resolve_member).transpose()?,
                    resolve_member(member)?,
                    minimum.unwrap_or(default_minimum),
                )
                .await?;
        }
        Operation::Swap {
            caller,
            predecessor,
            old,
            new,
        } => {
            registry
                .swap_member(
                    resolve_member(caller)?,
                    predecessor.as_deref().map(resolve_member).transpose()?,
                    resolve_member(old)?,
                    resolve_member(new)?,
                )
                .await?;
        }
    }
    Ok(())
}

/// Render a snapshot as an aligned text table.
pub fn render_table(snapshot: &RegistrySnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "registry   {}", snapshot.registry);
    let _ = writeln!(out, "total      {}", snapshot.total_equity);
    let _ = writeln!(out, "allotted   {}", snapshot.allotted_equity);
    let _ = writeln!(out, "unallotted {}", snapshot.unallotted_equity);
    let _ = writeln!(out);
    let _ = writeln!(out, "{:<44} {:>12} {:>9}", "member", "stake", "share");
    for member in &snapshot.members {
        let _ = writeln!(
            out,
            "{:<44} {:>12} {:>9}",
            member.id.to_string(),
            member.stake,
            format_percent(member.percent)
        );
    }
    out
}
