//! Error types for the membership ring.

use thiserror::Error;

use crate::MemberId;

/// Result type for ring operations.
pub type Result<T> = std::result::Result<T, RingError>;

/// Errors that can occur while mutating or auditing the ring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingError {
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

    /// The ring has already been initialized.
    #[error("ring already initialized")]
    AlreadyInitialized,

    /// The ring has not been initialized yet.
    #[error("ring not initialized")]
    NotInitialized,

    /// The cycle through the sentinel is broken.
    #[error("ring corrupted: {0}")]
    Corrupted(String),
}
