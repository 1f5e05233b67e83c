//! Starter/bench placement of squad members.
//!
//! The pitch is split into one area per position plus the bench. Each area has
//! a slot capacity; a slot that loses its occupant stays open until something
//! is placed into it.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
};

use tracing::debug;

use super::{error::SquadError, formation::FormationCounts, store::Squad};
use crate::models::{PlayerId, Position, BENCH_SIZE, STARTER_COUNT};

/// A group of slots: one line of the pitch or the bench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Area {
    /// Starter slots of one position line.
    Pitch(Position),
    /// Substitute slots.
    Bench,
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Area::Pitch(position) => write!(f, "the {position} line"),
            Area::Bench => f.write_str("the bench"),
        }
    }
}

/// Where a squad member currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Starting, in the slots of the given line.
    Starter {
        /// Line the player occupies.
        line: Position,
    },
    /// On the bench.
    Bench,
}

/// Per-position starter limits used by the greedy default layout.
pub const DEFAULT_STARTER_LIMITS: [(Position, usize); 4] = [
    (Position::Goalkeeper, 1),
    (Position::Defender, 4),
    (Position::Midfielder, 4),
    (Position::Forward, 2),
];

/// Pitch slot capacities exposed while editing.
pub const EDIT_SLOT_CAPACITY: [(Position, usize); 4] = [
    (Position::Goalkeeper, 2),
    (Position::Defender, 5),
    (Position::Midfielder, 5),
    (Position::Forward, 3),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Slots {
    capacity: usize,
    occupants: Vec<PlayerId>,
}

impl Slots {
    fn open(&self) -> usize {
        self.capacity.saturating_sub(self.occupants.len())
    }

    fn take(&mut self, id: PlayerId) -> bool {
        let before = self.occupants.len();
        self.occupants.retain(|member| *member != id);
        self.occupants.len() != before
    }
}

/// Assignment of every squad member to a pitch line or the bench.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    pitch: BTreeMap<Position, Slots>,
    bench: Slots,
    positions: HashMap<PlayerId, Position>,
    active: Option<Area>,
}

impl Placement {
    /// Default layout for viewing, used when a squad is loaded.
    ///
    /// Members are ordered by position. A confirmed list of exactly eleven
    /// starters is honoured as is; otherwise starters are picked greedily up to
    /// [`DEFAULT_STARTER_LIMITS`]. Every other member goes to the bench.
    pub fn view_default(
        squad: &Squad,
        confirmed_starters: &[PlayerId],
        position_of: impl Fn(PlayerId) -> Option<Position>,
    ) -> Self {
        let confirmed: HashSet<PlayerId> = confirmed_starters.iter().copied().collect();
        let use_confirmed = confirmed.len() == STARTER_COUNT
            && confirmed_starters.len() == STARTER_COUNT
            && confirmed
                .iter()
                .all(|id| squad.contains(*id) && position_of(*id).is_some());
        if use_confirmed {
            return Self::view_confirmed(squad, confirmed_starters, position_of);
        }

        let mut remaining: BTreeMap<Position, usize> =
            DEFAULT_STARTER_LIMITS.into_iter().collect();
        Self::view_layout(squad, &position_of, |_, position| {
            match remaining.get_mut(&position) {
                Some(left) if *left > 0 => {
                    *left -= 1;
                    true
                }
                _ => false,
            }
        })
    }

    /// View layout with exactly the given starters, however many there are.
    pub fn view_confirmed(
        squad: &Squad,
        starters: &[PlayerId],
        position_of: impl Fn(PlayerId) -> Option<Position>,
    ) -> Self {
        let confirmed: HashSet<PlayerId> = starters.iter().copied().collect();
        Self::view_layout(squad, &position_of, |id, _| confirmed.contains(&id))
    }

    /// View capacities equal occupant counts, so no slot is open.
    fn view_layout(
        squad: &Squad,
        position_of: &impl Fn(PlayerId) -> Option<Position>,
        mut starts: impl FnMut(PlayerId, Position) -> bool,
    ) -> Self {
        let mut placement = Placement::empty();
        let members = placement.index_members(squad, position_of);
        for (id, position) in members {
            if starts(id, position) {
                placement.line_mut(position).occupants.push(id);
            } else {
                placement.bench.occupants.push(id);
            }
        }

        for slots in placement.pitch.values_mut() {
            slots.capacity = slots.occupants.len();
        }
        placement.bench.capacity = placement.bench.occupants.len();
        debug!(starters = placement.starter_count(), "Built view placement");
        placement
    }

    /// Layout for editing, with the expanded [`EDIT_SLOT_CAPACITY`].
    ///
    /// An arrangement already in effect is carried over starter by starter.
    /// Without one, the first eleven members in insertion order start.
    pub fn for_edit(
        squad: &Squad,
        current: Option<&Placement>,
        position_of: impl Fn(PlayerId) -> Option<Position>,
    ) -> Self {
        let mut placement = Placement::empty();
        for (position, capacity) in EDIT_SLOT_CAPACITY {
            placement.line_mut(position).capacity = capacity;
        }
        placement.bench.capacity = BENCH_SIZE;
        placement.index_members(squad, &position_of);

        let members: Vec<PlayerId> = squad
            .ids()
            .iter()
            .copied()
            .filter(|id| placement.positions.contains_key(id))
            .collect();
        let starters: Vec<PlayerId> = match current {
            Some(current) => current
                .starters()
                .into_iter()
                .filter(|id| placement.positions.contains_key(id))
                .collect(),
            None => members.iter().copied().take(STARTER_COUNT).collect(),
        };

        for id in &starters {
            match placement.find_pitch_slot(*id) {
                Some(line) => placement.line_mut(line).occupants.push(*id),
                None => placement.push_bench(*id),
            }
        }
        for id in members {
            if !starters.contains(&id) {
                placement.push_bench(id);
            }
        }
        debug!(starters = placement.starter_count(), "Built edit placement");
        placement
    }

    fn empty() -> Self {
        let mut placement = Placement::default();
        for position in Position::ALL {
            placement.pitch.insert(position, Slots::default());
        }
        placement
    }

    /// Records positions of known members and returns them sorted by position, stable on insertion order.
    fn index_members(
        &mut self,
        squad: &Squad,
        position_of: &impl Fn(PlayerId) -> Option<Position>,
    ) -> Vec<(PlayerId, Position)> {
        let mut members: Vec<(PlayerId, Position)> = squad
            .ids()
            .iter()
            .filter_map(|id| position_of(*id).map(|position| (*id, position)))
            .collect();
        members.sort_by_key(|(_, position)| *position);
        self.positions = members.iter().copied().collect();
        members
    }

    fn line_mut(&mut self, position: Position) -> &mut Slots {
        self.pitch.entry(position).or_default()
    }

    fn line(&self, position: Position) -> Option<&Slots> {
        self.pitch.get(&position)
    }

    fn slots(&self, area: Area) -> Option<&Slots> {
        match area {
            Area::Pitch(position) => self.line(position),
            Area::Bench => Some(&self.bench),
        }
    }

    fn push_bench(&mut self, id: PlayerId) {
        self.bench.occupants.push(id);
        if self.bench.occupants.len() > self.bench.capacity {
            self.bench.capacity = self.bench.occupants.len();
        }
    }

    /// Own line first, then any line with an open slot.
    fn find_pitch_slot(&self, id: PlayerId) -> Option<Position> {
        let own = self.positions.get(&id).copied();
        if let Some(own) = own {
            if self.line(own).map(Slots::open).unwrap_or(0) > 0 {
                return Some(own);
            }
        }
        Position::ALL
            .into_iter()
            .find(|position| self.line(*position).map(Slots::open).unwrap_or(0) > 0)
    }

    /// Current role of a member.
    pub fn role_of(&self, id: PlayerId) -> Option<Role> {
        for (line, slots) in &self.pitch {
            if slots.occupants.contains(&id) {
                return Some(Role::Starter { line: *line });
            }
        }
        if self.bench.occupants.contains(&id) {
            return Some(Role::Bench);
        }
        None
    }

    /// Whether the member currently starts.
    pub fn is_starter(&self, id: PlayerId) -> bool {
        matches!(self.role_of(id), Some(Role::Starter { .. }))
    }

    /// Starters in pitch order (goalkeepers first, forwards last).
    pub fn starters(&self) -> Vec<PlayerId> {
        self.pitch
            .values()
            .flat_map(|slots| slots.occupants.iter().copied())
            .collect()
    }

    /// Bench members in order.
    pub fn bench(&self) -> &[PlayerId] {
        &self.bench.occupants
    }

    /// Occupants of one area.
    pub fn occupants(&self, area: Area) -> &[PlayerId] {
        self.slots(area)
            .map(|slots| slots.occupants.as_slice())
            .unwrap_or(&[])
    }

    /// Open slots in one area.
    pub fn open_slots(&self, area: Area) -> usize {
        self.slots(area).map(Slots::open).unwrap_or(0)
    }

    /// Number of starters.
    pub fn starter_count(&self) -> usize {
        self.pitch.values().map(|slots| slots.occupants.len()).sum()
    }

    /// Starters counted by the players' own positions.
    pub fn formation(&self) -> FormationCounts {
        let mut counts = FormationCounts::default();
        for id in self.starters() {
            if let Some(position) = self.positions.get(&id) {
                counts.add(*position);
            }
        }
        counts
    }

    /// Currently selected destination slot for the next add.
    pub fn active_slot(&self) -> Option<Area> {
        self.active
    }

    /// Select an open slot as the destination for the next add, replacing any previous selection.
    pub fn activate_slot(&mut self, area: Area) -> Result<(), SquadError> {
        if self.open_slots(area) == 0 {
            return Err(SquadError::NoOpenSlotInArea(area));
        }
        self.active = Some(area);
        Ok(())
    }

    /// Clear the slot selection.
    pub fn deactivate_slot(&mut self) {
        self.active = None;
    }

    /// Move a starter to the bench. Its pitch slot stays open.
    pub fn move_to_bench(&mut self, id: PlayerId) -> Result<(), SquadError> {
        match self.role_of(id) {
            None => Err(SquadError::MemberNotFound(id)),
            Some(Role::Bench) => Ok(()),
            Some(Role::Starter { line }) => {
                self.line_mut(line).take(id);
                self.push_bench(id);
                debug!(player = id, from = %line, "Moved to bench");
                Ok(())
            }
        }
    }

    /// Move a substitute onto the pitch, preferring its own line.
    pub fn move_to_pitch(&mut self, id: PlayerId) -> Result<Position, SquadError> {
        match self.role_of(id) {
            None => Err(SquadError::MemberNotFound(id)),
            Some(Role::Starter { line }) => Ok(line),
            Some(Role::Bench) => {
                let line = self.find_pitch_slot(id).ok_or(SquadError::NoOpenSlot(id))?;
                self.bench.take(id);
                if self.bench.capacity > BENCH_SIZE {
                    self.bench.capacity = self.bench.occupants.len().max(BENCH_SIZE);
                }
                self.line_mut(line).occupants.push(id);
                debug!(player = id, to = %line, "Moved to pitch");
                Ok(line)
            }
        }
    }

    /// Place a newly added member on the bench or on the pitch.
    pub fn place_new(
        &mut self,
        id: PlayerId,
        position: Position,
        target_is_bench: bool,
    ) -> Result<Area, SquadError> {
        if self.role_of(id).is_some() {
            return Err(SquadError::DuplicateMember(id));
        }
        let area = if target_is_bench {
            if self.bench.open() == 0 {
                return Err(SquadError::NoOpenSlot(id));
            }
            Area::Bench
        } else {
            self.positions.insert(id, position);
            match self.find_pitch_slot(id) {
                Some(line) => Area::Pitch(line),
                None => {
                    self.positions.remove(&id);
                    return Err(SquadError::NoOpenSlot(id));
                }
            }
        };

        self.positions.insert(id, position);
        match area {
            Area::Pitch(line) => self.line_mut(line).occupants.push(id),
            Area::Bench => self.bench.occupants.push(id),
        }
        if self.active == Some(area) {
            self.active = None;
        }
        debug!(player = id, to = %area, "Placed new member");
        Ok(area)
    }

    /// Drop a member. Its slot stays open.
    pub fn remove(&mut self, id: PlayerId) -> bool {
        let mut removed = self.bench.take(id);
        for slots in self.pitch.values_mut() {
            removed |= slots.take(id);
        }
        self.positions.remove(&id);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::{full_squad_ids, sample_catalog};

    fn lookup() -> impl Fn(PlayerId) -> Option<Position> {
        let catalog = sample_catalog();
        move |id| catalog.position_of(id)
    }

    #[test]
    fn greedy_default_is_4_4_2() {
        let squad = Squad::from_ids(full_squad_ids());
        let placement = Placement::view_default(&squad, &[], lookup());
        let counts = placement.formation();
        assert_eq!(
            (counts.goalkeepers, counts.defenders, counts.midfielders, counts.forwards),
            (1, 4, 4, 2)
        );
        assert_eq!(placement.starters()[0], 1);
        assert_eq!(placement.bench(), &[2, 14, 24, 32]);
        assert_eq!(placement.open_slots(Area::Bench), 0);
    }

    #[test]
    fn greedy_default_sorts_by_position() {
        let squad = Squad::from_ids([30, 20, 10, 1, 11]);
        let placement = Placement::view_default(&squad, &[], lookup());
        assert_eq!(placement.starters(), vec![1, 10, 11, 20, 30]);
        assert!(placement.bench().is_empty());
    }

    #[test]
    fn confirmed_starters_override_default() {
        let squad = Squad::from_ids(full_squad_ids());
        let confirmed = vec![2, 10, 11, 12, 20, 21, 22, 23, 24, 30, 31];
        let placement = Placement::view_default(&squad, &confirmed, lookup());
        assert!(placement.is_starter(2));
        assert!(!placement.is_starter(1));
        let counts = placement.formation();
        assert_eq!(
            (counts.defenders, counts.midfielders, counts.forwards),
            (3, 5, 2)
        );
    }

    #[test]
    fn partial_confirmed_list_is_ignored() {
        let squad = Squad::from_ids(full_squad_ids());
        let placement = Placement::view_default(&squad, &[2, 10, 11], lookup());
        assert!(placement.is_starter(1));
        assert!(!placement.is_starter(2));
    }

    #[test]
    fn confirmed_layout_keeps_short_lineup() {
        let squad = Squad::from_ids(full_squad_ids());
        let starters = [1, 10, 11, 12, 13, 20, 21, 22, 23];
        let placement = Placement::view_confirmed(&squad, &starters, lookup());
        assert_eq!(placement.starter_count(), 9);
        assert_eq!(placement.formation().forwards, 0);
        assert_eq!(placement.bench().len(), 6);
        assert_eq!(placement.open_slots(Area::Bench), 0);
        assert_eq!(placement.open_slots(Area::Pitch(Position::Forward)), 0);
    }

    #[test]
    fn edit_layout_without_arrangement_uses_first_eleven() {
        let squad = Squad::from_ids(full_squad_ids());
        let placement = Placement::for_edit(&squad, None, lookup());
        let starters: HashSet<PlayerId> = placement.starters().into_iter().collect();
        let expected: HashSet<PlayerId> = full_squad_ids().into_iter().take(11).collect();
        assert_eq!(starters, expected);
        assert_eq!(placement.bench(), &[24, 30, 31, 32]);
    }

    #[test]
    fn edit_layout_carries_arrangement() {
        let squad = Squad::from_ids(full_squad_ids());
        let view = Placement::view_default(&squad, &[], lookup());
        let edit = Placement::for_edit(&squad, Some(&view), lookup());
        assert_eq!(edit.starters(), view.starters());
        assert_eq!(edit.open_slots(Area::Pitch(Position::Goalkeeper)), 1);
        assert_eq!(edit.open_slots(Area::Pitch(Position::Defender)), 1);
        assert_eq!(edit.open_slots(Area::Bench), 0);
    }

    #[test]
    fn bench_move_leaves_open_slot() -> Result<(), SquadError> {
        let squad = Squad::from_ids(full_squad_ids());
        let view = Placement::view_default(&squad, &[], lookup());
        let mut edit = Placement::for_edit(&squad, Some(&view), lookup());

        edit.move_to_bench(20)?;
        assert_eq!(edit.role_of(20), Some(Role::Bench));
        assert_eq!(edit.open_slots(Area::Pitch(Position::Midfielder)), 2);
        assert_eq!(edit.starter_count(), 10);

        assert_eq!(edit.move_to_pitch(24)?, Position::Midfielder);
        assert_eq!(edit.starter_count(), 11);
        Ok(())
    }

    #[test]
    fn pitch_move_falls_back_to_other_lines() -> Result<(), SquadError> {
        let squad = Squad::from_ids([1, 10, 30, 31, 32, 33]);
        let mut edit = Placement::for_edit(&squad, None, lookup());
        assert_eq!(
            edit.role_of(33),
            Some(Role::Starter {
                line: Position::Goalkeeper
            })
        );
        assert_eq!(edit.formation().forwards, 4);

        edit.move_to_bench(33)?;
        assert_eq!(edit.move_to_pitch(33)?, Position::Goalkeeper);
        Ok(())
    }

    #[test]
    fn pitch_move_without_open_slot_changes_nothing() {
        let squad = Squad::from_ids(full_squad_ids());
        let mut crowded = Placement::for_edit(&squad, None, lookup());
        for position in Position::ALL {
            let slots = crowded.line_mut(position);
            slots.capacity = slots.occupants.len();
        }
        let before = crowded.clone();
        assert!(matches!(
            crowded.move_to_pitch(30),
            Err(SquadError::NoOpenSlot(30))
        ));
        assert_eq!(crowded, before);
    }

    #[test]
    fn only_one_slot_is_active() -> Result<(), SquadError> {
        let squad = Squad::from_ids([1, 10, 20]);
        let mut edit = Placement::for_edit(&squad, None, lookup());
        edit.activate_slot(Area::Bench)?;
        edit.activate_slot(Area::Pitch(Position::Forward))?;
        assert_eq!(edit.active_slot(), Some(Area::Pitch(Position::Forward)));

        let mut view = Placement::view_default(&squad, &[], lookup());
        assert!(matches!(
            view.activate_slot(Area::Bench),
            Err(SquadError::NoOpenSlotInArea(Area::Bench))
        ));
        Ok(())
    }

    #[test]
    fn new_members_fill_target_area() -> Result<(), SquadError> {
        let squad = Squad::from_ids([1]);
        let mut edit = Placement::for_edit(&squad, None, lookup());
        assert_eq!(
            edit.place_new(30, Position::Forward, false)?,
            Area::Pitch(Position::Forward)
        );
        assert_eq!(edit.place_new(31, Position::Forward, true)?, Area::Bench);
        assert_eq!(edit.formation().forwards, 1);

        assert!(edit.remove(30));
        assert!(edit.role_of(30).is_none());
        assert_eq!(edit.open_slots(Area::Pitch(Position::Forward)), 3);
        Ok(())
    }
}
