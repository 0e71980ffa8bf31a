//! The equity engine: ring and stake ledger mutated together.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use equity_ring::{MemberId, MembershipRing};
use serde::{Deserialize, Serialize};

use crate::amount::{self, Amount, Dilution};
use crate::error::{Error, Result};
use crate::events::{EventSink, RegistryEvent, TracingSink};
use crate::issuer::{NoopIssuer, TokenIssuer};

/// Member registry with equity accounting.
///
/// Owns the membership ring and the stake ledger as one aggregate. Every
/// mutating method validates all of its preconditions and computes every new
/// value before touching state, so an `Err` always means nothing changed.
///
/// # Invariants
///
/// - `allotted_equity <= total_equity`
/// - `allotted_equity` is the sum of all member stakes
/// - a stake is recorded for exactly the live members
pub struct EquityRegistry {
    ring: MembershipRing,
    stakes: HashMap<MemberId, Amount>,
    total_equity: Amount,
    allotted_equity: Amount,
    sink: Arc<dyn EventSink>,
    issuer: Arc<dyn TokenIssuer>,
}

impl fmt::Debug for EquityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EquityRegistry")
            .field("registry", &self.ring.registry())
            .field("owner_count", &self.ring.len())
            .field("total_equity", &self.total_equity)
            .field("allotted_equity", &self.allotted_equity)
            .finish_non_exhaustive()
    }
}

impl EquityRegistry {
    /// Create an empty registry with the given identity.
    ///
    /// Events go to [`TracingSink`] until [`with_sink`](Self::with_sink)
    /// replaces it.
    pub fn new(id: MemberId) -> Self {
        Self {
            ring: MembershipRing::new(id),
            stakes: HashMap::new(),
            total_equity: 0,
            allotted_equity: 0,
            sink: Arc::new(TracingSink),
            issuer: Arc::new(NoopIssuer),
        }
    }

    /// Replace the event sink.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the token issuance hook.
    pub fn with_issuer(mut self, issuer: Arc<dyn TokenIssuer>) -> Self {
        self.issuer = issuer;
        self
    }

    /// Initialize membership and equity in one step. Runs once.
    ///
    /// `members[0]` seeds the ring; later members are inserted at the head,
    /// so [`members`](Self::members) lists them in reverse input order.
    /// The first stake only has to fit within `total_equity`; every later
    /// stake must satisfy `0 < stake < total_equity`.
    pub fn setup(&mut self, members: &[MemberId], stakes: &[Amount], total_equity: Amount) -> Result<()> {
        if self.ring.is_initialized() {
            return Err(Error::AlreadyInitialized);
        }
        if members.len() != stakes.len() {
            return Err(Error::LengthMismatch {
                members: members.len(),
                stakes: stakes.len(),
            });
        }
        let (Some(&first), Some(&first_stake)) = (members.first(), stakes.first()) else {
            return Err(Error::EmptySetup);
        };
        if total_equity == 0 {
            return Err(Error::ZeroTotalEquity);
        }

        // Stage on scratch state, commit only when every member passed
        let mut ring = MembershipRing::new(self.ring.registry());
        ring.initialize(first)?;
        if first_stake > total_equity {
            return Err(Error::OverAllotment {
                allotted: first_stake,
                total: total_equity,
            });
        }
        let mut ledger = HashMap::with_capacity(members.len());
        ledger.insert(first, first_stake);
        let mut allotted = first_stake;

        let mut previous = first;
        for (&member, &stake) in members.iter().zip(stakes).skip(1) {
            if member == previous {
                return Err(Error::DuplicateMember(member));
            }
            ring.check_insertable(member)?;
            if stake == 0 || stake >= total_equity {
                return Err(Error::InvalidStake {
                    stake,
                    total: total_equity,
                });
            }
            allotted = amount::add(allotted, stake)?;
            if allotted > total_equity {
                return Err(Error::OverAllotment {
                    allotted,
                    total: total_equity,
                });
            }
            ring.insert_at_head(member)?;
            ledger.insert(member, stake);
            previous = member;
        }

        self.ring = ring;
        self.stakes = ledger;
        self.total_equity = total_equity;
        self.allotted_equity = allotted;

        tracing::info!(
            registry = %self.id(),
            owners = members.len(),
            total_equity,
            allotted_equity = allotted,
            "registry set up"
        );
        for (&member, &stake) in members.iter().zip(stakes) {
            self.emit(RegistryEvent::MemberAdded { member });
            self.emit(RegistryEvent::StakeChanged { member, stake });
            self.issuer.issue(&member, stake);
        }
        Ok(())
    }

    /// Add `member` with a freshly issued stake worth `percent` of the
    /// enlarged total. Existing stakes keep their amounts and are diluted.
    pub fn add_member_with_dilution(&mut self, member: MemberId, percent: Amount) -> Result<Dilution> {
        self.ring.check_insertable(member)?;
        let dilution = amount::compute_diluted_stake(self.total_equity, percent)?;
        let allotted = amount::add(self.allotted_equity, dilution.new_stake)?;
        if allotted > dilution.new_total {
            return Err(Error::OverAllotment {
                allotted,
                total: dilution.new_total,
            });
        }

        self.ring.insert_at_head(member)?;
        self.stakes.insert(member, dilution.new_stake);
        self.total_equity = dilution.new_total;
        self.allotted_equity = allotted;

        tracing::info!(
            %member,
            percent,
            stake = dilution.new_stake,
            total_equity = dilution.new_total,
            "member added by dilution"
        );
        self.emit(RegistryEvent::MemberAdded { member });
        self.emit(RegistryEvent::StakeChanged {
            member,
            stake: dilution.new_stake,
        });
        self.issuer.issue(&member, dilution.new_stake);
        Ok(dilution)
    }

    /// Sell `amount` of unallotted equity to `member`, adding it if needed.
    ///
    /// Total equity is unchanged. Returns the member's new stake.
    pub fn sell_unallotted(&mut self, member: MemberId, amount: Amount) -> Result<Amount> {
        if !self.ring.is_initialized() {
            return Err(Error::NotInitialized);
        }
        let available = amount::sub(self.total_equity, self.allotted_equity)?;
        if available == 0 {
            return Err(Error::NoUnallottedEquity);
        }
        if amount == 0 {
            return Err(Error::InvalidStake {
                stake: amount,
                total: self.total_equity,
            });
        }
        if amount > available {
            return Err(Error::ExcessiveRequest {
                requested: amount,
                available,
            });
        }

        let existing = self.ring.contains(member);
        if !existing {
            self.ring.check_insertable(member)?;
        }
        let stake = amount::add(self.stake_of(member), amount)?;
        let allotted = amount::add(self.allotted_equity, amount)?;

        if !existing {
            self.ring.insert_at_head(member)?;
        }
        self.stakes.insert(member, stake);
        self.allotted_equity = allotted;

        tracing::info!(%member, amount, stake, allotted_equity = allotted, "unallotted equity sold");
        if !existing {
            self.emit(RegistryEvent::MemberAdded { member });
            self.issuer.issue(&member, stake);
        }
        self.emit(RegistryEvent::StakeChanged { member, stake });
        Ok(stake)
    }

    /// Remove `member`, given the member that points at it in the ring.
    ///
    /// `minimum_required_count` comes from the authorization collaborator;
    /// the removal is refused if fewer members would remain. The member's
    /// whole stake returns to the unallotted pool. Returns that stake.
    pub fn remove_member(
        &mut self,
        predecessor: MemberId,
        member: MemberId,
        minimum_required_count: usize,
    ) -> Result<Amount> {
        let remaining = self.ring.len().saturating_sub(1);
        if remaining < minimum_required_count {
            return Err(Error::BelowMinimum {
                remaining,
                minimum: minimum_required_count,
            });
        }
        self.ring.check_linkage(predecessor, member)?;
        let stake = self.stake_of(member);
        let allotted = amount::sub(self.allotted_equity, stake)?;

        self.ring.remove(predecessor, member)?;
        self.stakes.remove(&member);
        self.allotted_equity = allotted;

        tracing::info!(%member, stake, owners = self.ring.len(), "member removed");
        self.emit(RegistryEvent::MemberRemoved { member });
        if stake != 0 {
            self.emit(RegistryEvent::StakeChanged { member, stake: 0 });
        }
        Ok(stake)
    }

    /// Replace `old` with `new` at the same ring position, moving the stake.
    pub fn swap_member(&mut self, predecessor: MemberId, old: MemberId, new: MemberId) -> Result<()> {
        self.ring.check_swap(predecessor, old, new)?;

        self.ring.swap(predecessor, old, new)?;
        let stake = self.stakes.remove(&old).unwrap_or(0);
        self.stakes.insert(new, stake);

        tracing::info!(%old, %new, stake, "member swapped");
        self.emit(RegistryEvent::MemberRemoved { member: old });
        self.emit(RegistryEvent::MemberAdded { member: new });
        if stake != 0 {
            self.emit(RegistryEvent::StakeChanged { member: old, stake: 0 });
            self.emit(RegistryEvent::StakeChanged { member: new, stake });
        }
        self.issuer.issue(&new, stake);
        Ok(())
    }

    /// The registry's own identity.
    pub fn id(&self) -> MemberId {
        self.ring.registry()
    }

    /// True once setup has run.
    pub fn is_initialized(&self) -> bool {
        self.ring.is_initialized()
    }

    /// Equity not yet assigned to any member.
    pub fn unallotted_equity(&self) -> Amount {
        // Never saturates while the allotment invariant holds
        self.total_equity.saturating_sub(self.allotted_equity)
    }

    /// A member's stake as a share of total equity, in stake units.
    pub fn stake_percent(&self, member: MemberId) -> Result<Amount> {
        amount::stake_percent(self.stake_of(member), self.total_equity)
    }

    /// Recorded stake; zero for non-members.
    pub fn stake_of(&self, member: MemberId) -> Amount {
        self.stakes.get(&member).copied().unwrap_or(0)
    }

    pub fn is_member(&self, id: MemberId) -> bool {
        self.ring.contains(id)
    }

    /// Members in ring order (most recently added first).
    pub fn members(&self) -> Vec<MemberId> {
        self.ring.enumerate()
    }

    /// The member pointing at `member` in the ring. O(n).
    pub fn predecessor_of(&self, member: MemberId) -> Option<MemberId> {
        self.ring.predecessor_of(member)
    }

    pub fn owner_count(&self) -> usize {
        self.ring.len()
    }

    pub fn total_equity(&self) -> Amount {
        self.total_equity
    }

    pub fn allotted_equity(&self) -> Amount {
        self.allotted_equity
    }

    /// Audit the ring and the ledger against each other.
    pub fn verify(&self) -> Result<()> {
        self.ring.verify()?;

        let mut sum: Amount = 0;
        for (member, stake) in &self.stakes {
            if !self.ring.contains(*member) {
                return Err(Error::Corrupted(format!("stake recorded for non-member {member}")));
            }
            sum = amount::add(sum, *stake)?;
        }
        if self.stakes.len() != self.ring.len() {
            return Err(Error::Corrupted(format!(
                "{} stakes for {} members",
                self.stakes.len(),
                self.ring.len()
            )));
        }
        if sum != self.allotted_equity {
            return Err(Error::Corrupted(format!(
                "stakes sum to {sum}, allotted equity is {}",
                self.allotted_equity
            )));
        }
        if self.allotted_equity > self.total_equity {
            return Err(Error::OverAllotment {
                allotted: self.allotted_equity,
                total: self.total_equity,
            });
        }
        Ok(())
    }

    /// A serializable view of the whole registry, members in ring order.
    pub fn snapshot(&self) -> Result<RegistrySnapshot> {
        let members = self
            .ring
            .iter()
            .map(|id| {
                Ok(MemberSnapshot {
                    id,
                    stake: self.stake_of(id),
                    percent: self.stake_percent(id)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RegistrySnapshot {
            registry: self.id(),
            total_equity: self.total_equity,
            allotted_equity: self.allotted_equity,
            unallotted_equity: self.unallotted_equity(),
            members,
        })
    }

    fn emit(&self, event: RegistryEvent) {
        self.sink.emit(&event);
    }
}

/// Point-in-time view of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub registry: MemberId,
    pub total_equity: Amount,
    pub allotted_equity: Amount,
    pub unallotted_equity: Amount,
    pub members: Vec<MemberSnapshot>,
}

/// One member's row in a [`RegistrySnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub id: MemberId,
    pub stake: Amount,
    /// Share of total equity, in stake units.
    pub percent: Amount,
}
