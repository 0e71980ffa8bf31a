//! Authorization seam.
//!
//! The registry never decides who may mutate it. An [`Authorizer`] is
//! consulted before every mutating call on the shared handle; quorum,
//! signatures, and voting all live behind it.

use std::collections::HashSet;

use equity_ring::MemberId;

use crate::EquityRegistry;

/// A mutating operation a caller asks to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    AddMember,
    RemoveMember,
    SwapMember,
    SellUnallotted,
}

/// Decides whether a caller may perform an action on a registry.
pub trait Authorizer: Send + Sync {
    /// `registry` is the state the action would apply to.
    fn authorize(&self, caller: &MemberId, action: Action, registry: &EquityRegistry) -> bool;
}

/// Permits everything. For tests and trusted single-tenant use.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _caller: &MemberId, _action: Action, _registry: &EquityRegistry) -> bool {
        true
    }
}

/// Permits a fixed set of callers.
#[derive(Debug, Default, Clone)]
pub struct AllowList {
    callers: HashSet<MemberId>,
}

impl AllowList {
    pub fn new(callers: impl IntoIterator<Item = MemberId>) -> Self {
        Self {
            callers: callers.into_iter().collect(),
        }
    }
}

impl Authorizer for AllowList {
    fn authorize(&self, caller: &MemberId, _action: Action, _registry: &EquityRegistry) -> bool {
        self.callers.contains(caller)
    }
}

/// Permits current members, plus the registry's own identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct MembersOnly;

impl Authorizer for MembersOnly {
    fn authorize(&self, caller: &MemberId, _action: Action, registry: &EquityRegistry) -> bool {
        *caller == registry.id() || registry.is_member(*caller)
    }
}
