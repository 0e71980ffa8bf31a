//! Shared, authorized access to a registry.
//!
//! `EquityRegistry` assumes one writer. When several tasks need the same
//! registry, `SharedRegistry` puts it behind a `tokio::sync::RwLock`:
//! mutations hold the write lock across the ring and ledger update, and
//! queries hold the read lock, so no reader can observe a ring rewired
//! without its ledger update.
//!
//! Mutations also take the caller's identity and consult the injected
//! [`Authorizer`] under the same write lock before doing anything.

use std::sync::Arc;

use equity_ring::MemberId;
use tokio::sync::RwLock;

use crate::authority::{Action, Authorizer};
use crate::error::{Error, Result};
use crate::registry::{EquityRegistry, RegistrySnapshot};
use crate::{Amount, Dilution};

/// Cloneable handle to a locked registry.
#[derive(Clone)]
pub struct SharedRegistry {
    inner: Arc<RwLock<EquityRegistry>>,
    authorizer: Arc<dyn Authorizer>,
}

impl SharedRegistry {
    pub fn new(registry: EquityRegistry, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
            authorizer,
        }
    }

    fn authorize(&self, caller: &MemberId, action: Action, registry: &EquityRegistry) -> Result<()> {
        if self.authorizer.authorize(caller, action, registry) {
            Ok(())
        } else {
            tracing::warn!(%caller, ?action, "unauthorized registry mutation");
            Err(Error::Unauthorized(*caller))
        }
    }

    pub async fn add_member_with_dilution(
        &self,
        caller: MemberId,
        member: MemberId,
        percent: Amount,
    ) -> Result<Dilution> {
        let mut registry = self.inner.write().await;
        self.authorize(&caller, Action::AddMember, &registry)?;
        registry.add_member_with_dilution(member, percent)
    }

    pub async fn sell_unallotted(&self, caller: MemberId, member: MemberId, amount: Amount) -> Result<Amount> {
        let mut registry = self.inner.write().await;
        self.authorize(&caller, Action::SellUnallotted, &registry)?;
        registry.sell_unallotted(member, amount)
    }

    /// Remove a member. Without an explicit predecessor it is looked up
    /// under the same lock.
    pub async fn remove_member(
        &self,
        caller: MemberId,
        predecessor: Option<MemberId>,
        member: MemberId,
        minimum_required_count: usize,
    ) -> Result<Amount> {
        let mut registry = self.inner.write().await;
        self.authorize(&caller, Action::RemoveMember, &registry)?;
        let predecessor = resolve_predecessor(&registry, predecessor, member);
        registry.remove_member(predecessor, member, minimum_required_count)
    }

    /// Swap `old` for `new`. Without an explicit predecessor it is looked up
    /// under the same lock.
    pub async fn swap_member(
        &self,
        caller: MemberId,
        predecessor: Option<MemberId>,
        old: MemberId,
        new: MemberId,
    ) -> Result<()> {
        let mut registry = self.inner.write().await;
        self.authorize(&caller, Action::SwapMember, &registry)?;
        let predecessor = resolve_predecessor(&registry, predecessor, old);
        registry.swap_member(predecessor, old, new)
    }

    pub async fn members(&self) -> Vec<MemberId> {
        self.inner.read().await.members()
    }

    pub async fn is_member(&self, id: MemberId) -> bool {
        self.inner.read().await.is_member(id)
    }

    pub async fn stake_percent(&self, member: MemberId) -> Result<Amount> {
        self.inner.read().await.stake_percent(member)
    }

    pub async fn unallotted_equity(&self) -> Amount {
        self.inner.read().await.unallotted_equity()
    }

    pub async fn snapshot(&self) -> Result<RegistrySnapshot> {
        self.inner.read().await.snapshot()
    }

    /// Run a read-only closure against one consistent view.
    pub async fn read<T>(&self, f: impl FnOnce(&EquityRegistry) -> T) -> T {
        f(&*self.inner.read().await)
    }
}

/// An unknown member resolves to the sentinel, which then fails the
/// linkage check with `NotFound`.
fn resolve_predecessor(registry: &EquityRegistry, predecessor: Option<MemberId>, member: MemberId) -> MemberId {
    predecessor
        .or_else(|| registry.predecessor_of(member))
        .unwrap_or(MemberId::SENTINEL)
}
