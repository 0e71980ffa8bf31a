//! Genesis configuration: the one-time input to [`EquityRegistry::setup`].
//!
//! ```json
//! {
//!   "registry": "treasury",
//!   "total_equity": 10000,
//!   "members": [
//!     { "id": "alice", "stake": 3000 },
//!     { "id": "0x3f5a…", "stake": 2000 }
//!   ]
//! }
//! ```
//!
//! Identities are either 20-byte hex addresses or labels, which are turned
//! into identities with [`MemberId::derive`]. A `0x` prefix always means an
//! address, so a mistyped one is rejected rather than hashed as a label.

use std::path::Path;

use equity_ring::MemberId;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::{Amount, EquityRegistry};

/// Parsed genesis file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Identity of the registry itself.
    pub registry: String,
    /// The denominator: 100% of issued equity.
    pub total_equity: Amount,
    /// Initial members in setup order.
    pub members: Vec<GenesisMember>,
}

/// One `(identity, initial stake)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisMember {
    pub id: String,
    pub stake: Amount,
}

/// Resolve a hex address or a label to an identity.
pub fn resolve_member(s: &str) -> Result<MemberId> {
    if s.starts_with("0x") {
        return MemberId::from_hex(s).map_err(|e| Error::Config(format!("bad address {s:?}: {e}")));
    }
    Ok(MemberId::from_hex(s).unwrap_or_else(|_| MemberId::derive(s)))
}

impl GenesisConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn registry_id(&self) -> Result<MemberId> {
        resolve_member(&self.registry)
    }

    /// Run setup on `registry` with this configuration.
    pub fn apply(&self, registry: &mut EquityRegistry) -> Result<()> {
        let members = self
            .members
            .iter()
            .map(|m| resolve_member(&m.id))
            .collect::<Result<Vec<_>>>()?;
        let stakes: Vec<Amount> = self.members.iter().map(|m| m.stake).collect();
        registry.setup(&members, &stakes, self.total_equity)
    }

    /// Create a registry with this configuration's identity and set it up.
    pub fn build(&self) -> Result<EquityRegistry> {
        let mut registry = EquityRegistry::new(self.registry_id()?);
        self.apply(&mut registry)?;
        Ok(registry)
    }
}
