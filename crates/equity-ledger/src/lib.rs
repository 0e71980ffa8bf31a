//! Equity Ledger
//!
//! Stake accounting over the membership ring. Each member holds a stake in
//! fixed-point units where `10_000` is 100.00% of a mutable total.
//!
//! # Accounting
//!
//! - `total_equity` is the denominator, changed only by dilution
//! - `allotted_equity` is the sum of member stakes
//! - `allotted_equity <= total_equity` after every operation
//!
//! # Operations
//!
//! | operation | total | allotted | ring |
//! |---|---|---|---|
//! | `setup` | set | Σ stakes | seeded |
//! | `add_member_with_dilution` | grows | += new stake | insert at head |
//! | `sell_unallotted` | same | += amount | insert or top up |
//! | `remove_member` | same | −= member stake | unlink |
//! | `swap_member` | same | same | replace in place |
//!
//! Every operation validates first and mutates last. An error means no
//! state changed and no event was emitted.
//!
//! # Collaborators
//!
//! - [`Authorizer`] gates mutations on the [`SharedRegistry`] handle
//! - [`EventSink`] receives [`RegistryEvent`]s after each commit
//! - [`TokenIssuer`] is told about every new member

mod amount;
mod authority;
mod error;
mod events;
mod genesis;
mod issuer;
mod registry;
mod shared;

pub use amount::{
    compute_diluted_stake, format_percent, stake_percent, Amount, Dilution, FULL_STAKE,
};
pub use authority::{Action, AllowAll, AllowList, Authorizer, MembersOnly};
pub use error::{Error, Result};
pub use events::{EventSink, RegistryEvent, TracingSink};
pub use genesis::{resolve_member, GenesisConfig, GenesisMember};
pub use issuer::{NoopIssuer, TokenIssuer};
pub use registry::{EquityRegistry, MemberSnapshot, RegistrySnapshot};
pub use shared::SharedRegistry;

pub use equity_ring::MemberId;
