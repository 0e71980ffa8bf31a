//! Registry notifications.
//!
//! Events are observational: emitted after a mutation commits, never
//! acknowledged, and a failing sink cannot affect the registry.

use equity_ring::MemberId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::Amount;

/// Something that changed in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RegistryEvent {
    /// A member joined the ring
    MemberAdded { member: MemberId },

    /// A member left the ring
    MemberRemoved { member: MemberId },

    /// A member's recorded stake changed
    StakeChanged { member: MemberId, stake: Amount },
}

impl RegistryEvent {
    /// The member the event is about.
    pub fn member(&self) -> MemberId {
        match self {
            Self::MemberAdded { member }
            | Self::MemberRemoved { member }
            | Self::StakeChanged { member, .. } => *member,
        }
    }
}

/// Consumer of registry events.
pub trait EventSink: Send + Sync {
    /// Deliver one event. Must not block.
    fn emit(&self, event: &RegistryEvent);
}

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &RegistryEvent) {
        match event {
            RegistryEvent::MemberAdded { member } => {
                tracing::info!(%member, "member added");
            }
            RegistryEvent::MemberRemoved { member } => {
                tracing::info!(%member, "member removed");
            }
            RegistryEvent::StakeChanged { member, stake } => {
                tracing::info!(%member, stake, "stake changed");
            }
        }
    }
}

/// Fan events out to any number of subscribers.
///
/// Sending with no live receivers is not an error worth reporting.
impl EventSink for broadcast::Sender<RegistryEvent> {
    fn emit(&self, event: &RegistryEvent) {
        let _ = self.send(event.clone());
    }
}
