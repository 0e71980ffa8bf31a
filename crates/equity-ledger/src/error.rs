//! Error types for equity-ledger.

use equity_ring::{MemberId, RingError};
use thiserror::Error;

use crate::Amount;

/// Result type for equity-ledger operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while mutating or querying the registry.
///
/// Every error leaves the registry exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Identity is `NULL`, `SENTINEL`, or the registry itself.
    #[error("invalid member identity: {0}")]
    InvalidIdentity(MemberId),

    /// Identity is already a member.
    #[error("duplicate member: {0}")]
    DuplicateMember(MemberId),

    /// The supplied predecessor does not point at the member.
    #[error("{member} does not follow {predecessor}")]
    NotFound {
        predecessor: MemberId,
        member: MemberId,
    },

    /// Setup received a different number of members and stakes.
    #[error("{members} members but {stakes} stakes")]
    LengthMismatch { members: usize, stakes: usize },

    /// A stake outside the accepted range.
    #[error("invalid stake {stake} (total equity {total})")]
    InvalidStake { stake: Amount, total: Amount },

    /// Allotted equity would exceed total equity.
    #[error("allotted equity {allotted} exceeds total equity {total}")]
    OverAllotment { allotted: Amount, total: Amount },

    /// Dilution percent must be in `1..10000`.
    #[error("invalid dilution percent {0}")]
    InvalidDilutionPercent(Amount),

    /// All equity is already allotted.
    #[error("no unallotted equity left")]
    NoUnallottedEquity,

    /// More equity requested than is unallotted.
    #[error("requested {requested} but only {available} unallotted")]
    ExcessiveRequest { requested: Amount, available: Amount },

    /// Removal would drop membership below the required minimum.
    #[error("removal leaves {remaining} members, minimum is {minimum}")]
    BelowMinimum { remaining: usize, minimum: usize },

    /// Checked arithmetic overflowed or underflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// Setup already ran.
    #[error("registry already initialized")]
    AlreadyInitialized,

    /// Operation requires a registry that has been set up.
    #[error("registry not initialized")]
    NotInitialized,

    /// Setup received no members.
    #[error("setup requires at least one member")]
    EmptySetup,

    /// Setup received a zero total equity.
    #[error("total equity must be non-zero")]
    ZeroTotalEquity,

    /// The authorization collaborator rejected the caller.
    #[error("{0} is not authorized")]
    Unauthorized(MemberId),

    /// An audit found the ring and ledger out of step.
    #[error("registry corrupted: {0}")]
    Corrupted(String),

    /// Genesis configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl From<RingError> for Error {
    fn from(e: RingError) -> Self {
        match e {
            RingError::InvalidIdentity(id) => Error::InvalidIdentity(id),
            RingError::DuplicateMember(id) => Error::DuplicateMember(id),
            RingError::NotFound {
                predecessor,
                member,
            } => Error::NotFound {
                predecessor,
                member,
            },
            RingError::AlreadyInitialized => Error::AlreadyInitialized,
            RingError::NotInitialized => Error::NotInitialized,
            RingError::Corrupted(reason) => Error::Corrupted(reason),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Config(e.to_string())
    }
}
