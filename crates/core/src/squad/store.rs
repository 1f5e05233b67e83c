use tracing::{debug, warn};

use super::error::SquadError;
use crate::models::{PlayerId, SQUAD_SIZE};

/// Selected player ids in insertion order. Never more than [`SQUAD_SIZE`], never duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Squad {
    ids: Vec<PlayerId>,
}

impl Squad {
    /// Empty squad.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a squad by adding each id in turn, skipping ids that would be rejected.
    pub fn from_ids(ids: impl IntoIterator<Item = PlayerId>) -> Self {
        let mut squad = Squad::new();
        for id in ids {
            if let Err(err) = squad.add(id) {
                warn!(player = id, "Skipping squad member: {err}");
            }
        }
        squad
    }

    /// Append a player.
    pub fn add(&mut self, id: PlayerId) -> Result<&Squad, SquadError> {
        if self.ids.len() >= SQUAD_SIZE {
            return Err(SquadError::CapacityExceeded);
        }
        if self.contains(id) {
            return Err(SquadError::DuplicateMember(id));
        }
        self.ids.push(id);
        debug!(player = id, size = self.ids.len(), "Added squad member");
        Ok(self)
    }

    /// Remove a player. Returns whether the player was present.
    pub fn remove(&mut self, id: PlayerId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|member| *member != id);
        let removed = self.ids.len() != before;
        if removed {
            debug!(player = id, size = self.ids.len(), "Removed squad member");
        }
        removed
    }

    /// Whether the player is a member.
    pub fn contains(&self, id: PlayerId) -> bool {
        self.ids.contains(&id)
    }

    /// Members in insertion order.
    pub fn ids(&self) -> &[PlayerId] {
        &self.ids
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the squad has no members.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether the squad is at capacity.
    pub fn is_full(&self) -> bool {
        self.ids.len() >= SQUAD_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicates_and_overflow() {
        let mut squad = Squad::new();
        for id in 1..=15 {
            squad.add(id).unwrap();
        }
        assert!(squad.is_full());
        assert!(matches!(squad.add(16), Err(SquadError::CapacityExceeded)));

        squad.remove(15);
        assert!(matches!(squad.add(3), Err(SquadError::DuplicateMember(3))));
        assert_eq!(squad.add(16).unwrap().len(), 15);
    }

    #[test]
    fn building_from_ids_skips_rejected_members() {
        let squad = Squad::from_ids([3, 3].into_iter().chain(1..=20));
        assert_eq!(squad.len(), 15);
        assert_eq!(squad.ids()[..3], [3, 1, 2]);
        assert!(!squad.contains(17));
    }

    #[test]
    fn removing_absent_member_is_noop() {
        let mut squad = Squad::from_ids([4, 5]);
        assert!(!squad.remove(9));
        assert_eq!(squad.ids(), &[4, 5]);
        assert!(squad.remove(4));
        assert_eq!(squad.ids(), &[5]);
    }

    #[test]
    fn arbitrary_sequences_keep_invariants() {
        let mut squad = Squad::new();
        let mut seed: u32 = 7;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let id = (seed >> 16) % 24;
            if (seed >> 8) % 3 == 0 {
                squad.remove(id);
            } else {
                let _ = squad.add(id);
            }
            assert!(squad.len() <= SQUAD_SIZE);
            let mut sorted = squad.ids().to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), squad.len());
        }
    }
}
