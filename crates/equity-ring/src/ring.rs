//! The membership ring: a circular singly-linked list realized as a map.
//!
//! ```text
//! SENTINEL → head → … → tail → SENTINEL
//! ```
//!
//! Every live member maps to the member after it. The sentinel maps to the
//! head, the tail maps back to the sentinel. An empty but initialized ring is
//! the single entry `SENTINEL → SENTINEL`; an uninitialized ring has no
//! entries at all.
//!
//! Each mutation is split into a `check_*` half that only reads and an apply
//! half, so callers that keep other state in step with the ring can validate
//! everything before touching anything.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, RingError};
use crate::MemberId;

/// Sentinel-anchored membership cycle.
#[derive(Debug, Clone)]
pub struct MembershipRing {
    /// `member → next member`. The sentinel entry points at the head.
    next: HashMap<MemberId, MemberId>,
    /// Number of live members (the cycle length, sentinel excluded).
    len: usize,
    /// Identity of the registry owning this ring. Never a member.
    registry: MemberId,
}

impl MembershipRing {
    /// Create an uninitialized ring owned by `registry`.
    pub fn new(registry: MemberId) -> Self {
        Self {
            next: HashMap::new(),
            len: 0,
            registry,
        }
    }

    /// Identity of the owning registry.
    pub fn registry(&self) -> MemberId {
        self.registry
    }

    /// True once [`initialize`](Self::initialize) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.next.contains_key(&MemberId::SENTINEL)
    }

    /// Establish the cycle `SENTINEL → first → SENTINEL`.
    pub fn initialize(&mut self, first: MemberId) -> Result<()> {
        if self.is_initialized() {
            return Err(RingError::AlreadyInitialized);
        }
        self.check_identity(first)?;

        self.next.insert(MemberId::SENTINEL, first);
        self.next.insert(first, MemberId::SENTINEL);
        self.len = 1;
        Ok(())
    }

    /// Reject reserved identities: `NULL`, `SENTINEL` and the registry.
    pub fn check_identity(&self, member: MemberId) -> Result<()> {
        if member.is_reserved() || member == self.registry {
            return Err(RingError::InvalidIdentity(member));
        }
        Ok(())
    }

    /// Validate that `member` could be inserted right now.
    pub fn check_insertable(&self, member: MemberId) -> Result<()> {
        if !self.is_initialized() {
            return Err(RingError::NotInitialized);
        }
        self.check_identity(member)?;
        if self.next.contains_key(&member) {
            return Err(RingError::DuplicateMember(member));
        }
        Ok(())
    }

    /// Insert `member` at the head of the ring. O(1).
    pub fn insert_at_head(&mut self, member: MemberId) -> Result<()> {
        self.check_insertable(member)?;

        let old_head = self.head_or_sentinel();
        self.next.insert(member, old_head);
        self.next.insert(MemberId::SENTINEL, member);
        self.len += 1;
        Ok(())
    }

    /// Validate that `predecessor.next == member` and `member` is live.
    pub fn check_linkage(&self, predecessor: MemberId, member: MemberId) -> Result<()> {
        let linked = !member.is_reserved()
            && self.next.get(&predecessor) == Some(&member);
        if !linked {
            return Err(RingError::NotFound {
                predecessor,
                member,
            });
        }
        Ok(())
    }

    /// Unlink `member`, given the member that points at it. O(1).
    pub fn remove(&mut self, predecessor: MemberId, member: MemberId) -> Result<()> {
        self.check_linkage(predecessor, member)?;

        // Linkage check guarantees the entry exists
        let after = self.next.remove(&member).unwrap_or(MemberId::SENTINEL);
        self.next.insert(predecessor, after);
        self.len -= 1;
        Ok(())
    }

    /// Replace `old` by `new` in place, given the member that points at `old`.
    pub fn swap(&mut self, predecessor: MemberId, old: MemberId, new: MemberId) -> Result<()> {
        self.check_swap(predecessor, old, new)?;

        let after = self.next.remove(&old).unwrap_or(MemberId::SENTINEL);
        self.next.insert(new, after);
        self.next.insert(predecessor, new);
        Ok(())
    }

    /// Validation half of [`swap`](Self::swap).
    pub fn check_swap(&self, predecessor: MemberId, old: MemberId, new: MemberId) -> Result<()> {
        self.check_linkage(predecessor, old)?;
        self.check_insertable(new)
    }

    /// Find the member whose next-pointer is `member`. O(n).
    ///
    /// This is the lookup callers of [`remove`](Self::remove) and
    /// [`swap`](Self::swap) would otherwise have to do themselves.
    pub fn predecessor_of(&self, member: MemberId) -> Option<MemberId> {
        if !self.contains(member) {
            return None;
        }
        let mut current = MemberId::SENTINEL;
        for _ in 0..=self.len {
            let next = *self.next.get(&current)?;
            if next == member {
                return Some(current);
            }
            current = next;
        }
        None
    }

    /// True iff `member` is a live member.
    pub fn contains(&self, member: MemberId) -> bool {
        !member.is_reserved() && self.next.contains_key(&member)
    }

    /// The most recently inserted member, if any.
    pub fn head(&self) -> Option<MemberId> {
        match self.head_or_sentinel() {
            id if id == MemberId::SENTINEL => None,
            id => Some(id),
        }
    }

    fn head_or_sentinel(&self) -> MemberId {
        self.next
            .get(&MemberId::SENTINEL)
            .copied()
            .unwrap_or(MemberId::SENTINEL)
    }

    /// Number of live members.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when there are no live members.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate members in ring order, starting at the head.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            ring: self,
            current: MemberId::SENTINEL,
            remaining: self.len,
        }
    }

    /// Materialize the members in ring order.
    pub fn enumerate(&self) -> Vec<MemberId> {
        let mut members = Vec::with_capacity(self.len);
        members.extend(self.iter());
        members
    }

    /// Walk the whole cycle and check its structural invariants.
    ///
    /// - the walk returns to the sentinel after exactly `len` steps
    /// - no member is visited twice
    /// - every entry in the map is on the cycle
    pub fn verify(&self) -> Result<()> {
        if !self.is_initialized() {
            if self.next.is_empty() && self.len == 0 {
                return Ok(());
            }
            return Err(RingError::Corrupted("entries without sentinel".into()));
        }

        let mut visited = HashSet::with_capacity(self.len);
        let mut current = self.head_or_sentinel();
        while current != MemberId::SENTINEL {
            if current.is_reserved() || current == self.registry {
                return Err(RingError::Corrupted(format!("reserved identity {current} on cycle")));
            }
            if !visited.insert(current) {
                return Err(RingError::Corrupted(format!("{current} visited twice")));
            }
            if visited.len() > self.len {
                return Err(RingError::Corrupted(format!(
                    "cycle longer than member count {}",
                    self.len
                )));
            }
            current = match self.next.get(&current) {
                Some(next) => *next,
                None => return Err(RingError::Corrupted(format!("{current} has no successor"))),
            };
        }

        if visited.len() != self.len {
            return Err(RingError::Corrupted(format!(
                "cycle length {} != member count {}",
                visited.len(),
                self.len
            )));
        }
        if self.next.len() != self.len + 1 {
            return Err(RingError::Corrupted(format!(
                "{} map entries for {} members",
                self.next.len(),
                self.len
            )));
        }
        Ok(())
    }
}

/// Borrowing iterator over ring members, head first.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    ring: &'a MembershipRing,
    current: MemberId,
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = MemberId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let next = *self.ring.next.get(&self.current)?;
        if next == MemberId::SENTINEL {
            self.remaining = 0;
            return None;
        }
        self.current = next;
        self.remaining -= 1;
        Some(next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl<'a> IntoIterator for &'a MembershipRing {
    type Item = MemberId;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(label: &str) -> MemberId {
        MemberId::derive(label)
    }

    fn registry() -> MemberId {
        id("registry")
    }

    fn ring_of(labels: &[&str]) -> MembershipRing {
        let mut ring = MembershipRing::new(registry());
        ring.initialize(id(labels[0])).unwrap();
        for label in &labels[1..] {
            ring.insert_at_head(id(label)).unwrap();
        }
        ring
    }

    #[test]
    fn initialize_builds_single_cycle() {
        let ring = ring_of(&["a"]);
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.head(), Some(id("a")));
        assert_eq!(ring.enumerate(), vec![id("a")]);
        ring.verify().unwrap();
    }

    #[test]
    fn initialize_twice_fails() {
        let mut ring = ring_of(&["a"]);
        assert_eq!(ring.initialize(id("b")), Err(RingError::AlreadyInitialized));
        assert_eq!(ring.enumerate(), vec![id("a")]);
    }

    #[test]
    fn insert_before_initialize_fails() {
        let mut ring = MembershipRing::new(registry());
        assert_eq!(ring.insert_at_head(id("a")), Err(RingError::NotInitialized));
        assert!(ring.is_empty());
        ring.verify().unwrap();
    }

    #[test]
    fn head_insertion_reverses_input_order() {
        let ring = ring_of(&["a", "b", "c"]);
        assert_eq!(ring.enumerate(), vec![id("c"), id("b"), id("a")]);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn reserved_identities_rejected() {
        let mut ring = ring_of(&["a"]);
        for reserved in [MemberId::NULL, MemberId::SENTINEL, registry()] {
            assert_eq!(
                ring.insert_at_head(reserved),
                Err(RingError::InvalidIdentity(reserved))
            );
        }
        let mut fresh = MembershipRing::new(registry());
        assert_eq!(
            fresh.initialize(MemberId::SENTINEL),
            Err(RingError::InvalidIdentity(MemberId::SENTINEL))
        );
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn duplicate_insert_rejected_without_change() {
        let mut ring = ring_of(&["a", "b"]);
        let before = ring.enumerate();
        assert_eq!(ring.insert_at_head(id("a")), Err(RingError::DuplicateMember(id("a"))));
        assert_eq!(ring.insert_at_head(id("b")), Err(RingError::DuplicateMember(id("b"))));
        assert_eq!(ring.enumerate(), before);
        ring.verify().unwrap();
    }

    #[test]
    fn remove_requires_exact_predecessor() {
        let mut ring = ring_of(&["a", "b", "c"]); // c → b → a
        let err = ring.remove(MemberId::SENTINEL, id("a")).unwrap_err();
        assert_eq!(
            err,
            RingError::NotFound {
                predecessor: MemberId::SENTINEL,
                member: id("a")
            }
        );
        assert_eq!(ring.len(), 3);

        ring.remove(id("b"), id("a")).unwrap();
        assert_eq!(ring.enumerate(), vec![id("c"), id("b")]);
        assert!(!ring.contains(id("a")));
        ring.verify().unwrap();
    }

    #[test]
    fn remove_sentinel_is_not_found() {
        let mut ring = ring_of(&["a"]);
        assert!(matches!(
            ring.remove(id("a"), MemberId::SENTINEL),
            Err(RingError::NotFound { .. })
        ));
    }

    #[test]
    fn remove_last_member_leaves_empty_cycle() {
        let mut ring = ring_of(&["a"]);
        ring.remove(MemberId::SENTINEL, id("a")).unwrap();
        assert!(ring.is_empty());
        assert!(ring.is_initialized());
        assert_eq!(ring.head(), None);
        ring.verify().unwrap();

        ring.insert_at_head(id("b")).unwrap();
        assert_eq!(ring.enumerate(), vec![id("b")]);
    }

    #[test]
    fn removed_member_can_rejoin() {
        let mut ring = ring_of(&["a", "b"]);
        ring.remove(MemberId::SENTINEL, id("b")).unwrap();
        ring.insert_at_head(id("b")).unwrap();
        assert_eq!(ring.enumerate(), vec![id("b"), id("a")]);
    }

    #[test]
    fn swap_keeps_position() {
        let mut ring = ring_of(&["a", "b", "c"]); // c → b → a
        ring.swap(id("c"), id("b"), id("d")).unwrap();
        assert_eq!(ring.enumerate(), vec![id("c"), id("d"), id("a")]);
        assert_eq!(ring.len(), 3);
        assert!(!ring.contains(id("b")));
        ring.verify().unwrap();
    }

    #[test]
    fn swap_with_wrong_predecessor_fails() {
        let mut ring = ring_of(&["a", "b", "c"]);
        let before = ring.enumerate();
        assert!(matches!(
            ring.swap(MemberId::SENTINEL, id("b"), id("d")),
            Err(RingError::NotFound { .. })
        ));
        assert_eq!(ring.enumerate(), before);
    }

    #[test]
    fn swap_into_existing_member_fails() {
        let mut ring = ring_of(&["a", "b"]);
        assert_eq!(
            ring.swap(MemberId::SENTINEL, id("b"), id("a")),
            Err(RingError::DuplicateMember(id("a")))
        );
        assert_eq!(
            ring.swap(MemberId::SENTINEL, id("b"), registry()),
            Err(RingError::InvalidIdentity(registry()))
        );
        ring.verify().unwrap();
    }

    #[test]
    fn predecessor_lookup() {
        let ring = ring_of(&["a", "b", "c"]); // c → b → a
        assert_eq!(ring.predecessor_of(id("c")), Some(MemberId::SENTINEL));
        assert_eq!(ring.predecessor_of(id("b")), Some(id("c")));
        assert_eq!(ring.predecessor_of(id("a")), Some(id("b")));
        assert_eq!(ring.predecessor_of(id("z")), None);
        assert_eq!(ring.predecessor_of(MemberId::SENTINEL), None);
    }

    #[test]
    fn contains_excludes_reserved() {
        let ring = ring_of(&["a"]);
        assert!(ring.contains(id("a")));
        assert!(!ring.contains(MemberId::SENTINEL));
        assert!(!ring.contains(MemberId::NULL));
        assert!(!ring.contains(registry()));
    }

    #[test]
    fn iter_matches_enumerate() {
        let ring = ring_of(&["a", "b", "c", "d"]);
        let walked: Vec<_> = (&ring).into_iter().collect();
        assert_eq!(walked, ring.enumerate());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u8),
        Remove(u8),
        Swap(u8, u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..24).prop_map(Op::Insert),
            (0u8..24).prop_map(Op::Remove),
            (0u8..24, 0u8..24).prop_map(|(a, b)| Op::Swap(a, b)),
        ]
    }

    proptest! {
        #[test]
        fn cycle_length_tracks_len(ops in proptest::collection::vec(op_strategy(), 1..64)) {
            let mut ring = MembershipRing::new(registry());
            ring.initialize(id("seed")).unwrap();

            for op in ops {
                // Failures are expected for random input; the ring must stay sound either way
                let _ = match op {
                    Op::Insert(n) => ring.insert_at_head(id(&n.to_string())),
                    Op::Remove(n) => {
                        let member = id(&n.to_string());
                        match ring.predecessor_of(member) {
                            Some(pred) => ring.remove(pred, member),
                            None => Ok(()),
                        }
                    }
                    Op::Swap(a, b) => {
                        let old = id(&a.to_string());
                        match ring.predecessor_of(old) {
                            Some(pred) => ring.swap(pred, old, id(&b.to_string())),
                            None => Ok(()),
                        }
                    }
                };
                prop_assert!(ring.verify().is_ok());
                prop_assert_eq!(ring.enumerate().len(), ring.len());
            }
        }

        #[test]
        fn insert_then_remove_restores_sequence(
            count in 1usize..16,
            extra in 100u8..200,
        ) {
            let mut ring = MembershipRing::new(registry());
            ring.initialize(id("0")).unwrap();
            for n in 1..count {
                ring.insert_at_head(id(&n.to_string())).unwrap();
            }
            let before = ring.enumerate();

            let member = id(&extra.to_string());
            ring.insert_at_head(member).unwrap();
            let pred = ring.predecessor_of(member).unwrap();
            ring.remove(pred, member).unwrap();

            prop_assert_eq!(ring.enumerate(), before);
        }
    }
}
