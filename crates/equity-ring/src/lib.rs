//! Equity Membership Ring
//!
//! The membership list of an equity registry, kept as a circular
//! singly-linked list through a reserved sentinel identity.
//!
//! # Structure
//!
//! The list is a plain `HashMap<MemberId, MemberId>` from each member to the
//! member after it. No heap nodes, no shared ownership: the map owns every
//! link uniformly, so the cycle costs nothing to represent.
//!
//! ```text
//! SENTINEL → m3 → m2 → m1 → SENTINEL
//! ```
//!
//! # Invariants
//!
//! - Walking from `SENTINEL` returns to `SENTINEL` after exactly `len` steps
//! - Each member is visited exactly once
//! - `NULL`, `SENTINEL` and the registry's own identity are never members
//!
//! # Costs
//!
//! - insert at head: O(1)
//! - remove / swap: O(1) given the predecessor, O(n) to find it
//! - enumerate: O(n)

mod error;
mod identity;
mod ring;

pub use error::{Result, RingError};
pub use identity::{MemberId, ID_LEN};
pub use ring::{Iter, MembershipRing};
