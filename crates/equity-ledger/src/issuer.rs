//! Token issuance hook.
//!
//! A new member may be represented by a minted token elsewhere. The registry
//! calls the hook after a member is added and ignores whatever happens
//! there.

use equity_ring::MemberId;

use crate::Amount;

/// Called once per newly added member.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, member: &MemberId, stake: Amount);
}

/// Issues nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIssuer;

impl TokenIssuer for NoopIssuer {
    fn issue(&self, _member: &MemberId, _stake: Amount) {}
}
