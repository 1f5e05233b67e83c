//! Lineup rules.
//!
//! [`validate`] reports only the first failing rule, in a fixed priority order.

use std::{fmt, ops::RangeInclusive};

use thiserror::Error;

use super::mode::Mode;
use crate::models::{Captaincy, PlayerId, Position, SQUAD_SIZE, STARTER_COUNT};

/// Allowed number of starters per position.
pub const STARTER_RANGES: [(Position, RangeInclusive<usize>); 4] = [
    (Position::Goalkeeper, 1..=1),
    (Position::Defender, 3..=5),
    (Position::Midfielder, 2..=5),
    (Position::Forward, 1..=3),
];

/// Starters per position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormationCounts {
    pub goalkeepers: usize,
    pub defenders: usize,
    pub midfielders: usize,
    pub forwards: usize,
}

impl FormationCounts {
    /// Build counts from explicit numbers.
    pub fn new(goalkeepers: usize, defenders: usize, midfielders: usize, forwards: usize) -> Self {
        Self {
            goalkeepers,
            defenders,
            midfielders,
            forwards,
        }
    }

    pub fn add(&mut self, position: Position) {
        *self.slot(position) += 1;
    }

    pub fn get(&self, position: Position) -> usize {
        match position {
            Position::Goalkeeper => self.goalkeepers,
            Position::Defender => self.defenders,
            Position::Midfielder => self.midfielders,
            Position::Forward => self.forwards,
        }
    }

    pub fn total(&self) -> usize {
        self.goalkeepers + self.defenders + self.midfielders + self.forwards
    }

    fn slot(&mut self, position: Position) -> &mut usize {
        match position {
            Position::Goalkeeper => &mut self.goalkeepers,
            Position::Defender => &mut self.defenders,
            Position::Midfielder => &mut self.midfielders,
            Position::Forward => &mut self.forwards,
        }
    }
}

impl fmt::Display for FormationCounts {
    /// Outfield shape such as `4-4-2`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.defenders, self.midfielders, self.forwards)
    }
}

/// The highest-priority rule currently broken. The message is shown to the user as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("Select {missing} more {}", players(.missing))]
    NeedMorePlayers { missing: usize },

    #[error("Remove {excess} {}", players(.excess))]
    TooManyPlayers { excess: usize },

    #[error("Pick exactly 11 starters ({found} selected)")]
    StarterCount { found: usize },

    #[error("Pick exactly 1 goalkeeper ({found} selected)")]
    Goalkeepers { found: usize },

    #[error("Pick between 3 and 5 defenders ({found} selected)")]
    Defenders { found: usize },

    #[error("Pick between 2 and 5 midfielders ({found} selected)")]
    Midfielders { found: usize },

    #[error("Pick between 1 and 3 forwards ({found} selected)")]
    Forwards { found: usize },

    #[error("Choose a captain and a vice-captain")]
    CaptaincyUnassigned,

    #[error("Captain and vice-captain cannot be the same player")]
    SameCaptainAndVice,

    #[error("Captain and vice-captain must both be starters")]
    CaptaincyNotStarting,
}

fn players(count: &usize) -> &'static str {
    if *count == 1 {
        "player"
    } else {
        "players"
    }
}

impl Violation {
    fn position(position: Position, found: usize) -> Self {
        match position {
            Position::Goalkeeper => Violation::Goalkeepers { found },
            Position::Defender => Violation::Defenders { found },
            Position::Midfielder => Violation::Midfielders { found },
            Position::Forward => Violation::Forwards { found },
        }
    }
}

/// Outcome of [`validate`].
pub type Validity = Result<(), Violation>;

/// Everything the rules look at.
#[derive(Debug, Clone, Copy)]
pub struct LineupCheck<'a> {
    pub mode: Mode,
    pub squad_size: usize,
    pub starters: &'a [PlayerId],
    pub formation: FormationCounts,
    pub captaincy: Captaincy,
}

/// Check the lineup. While editing only the squad size is checked.
pub fn validate(check: &LineupCheck<'_>) -> Validity {
    check_size(check.squad_size)?;
    if check.mode == Mode::Edit {
        return Ok(());
    }

    if check.starters.len() != STARTER_COUNT {
        return Err(Violation::StarterCount {
            found: check.starters.len(),
        });
    }
    for (position, range) in STARTER_RANGES {
        let found = check.formation.get(position);
        if !range.contains(&found) {
            return Err(Violation::position(position, found));
        }
    }

    let (Some(captain), Some(vice)) = (check.captaincy.captain, check.captaincy.vice_captain)
    else {
        return Err(Violation::CaptaincyUnassigned);
    };
    if captain == vice {
        return Err(Violation::SameCaptainAndVice);
    }
    if !check.starters.contains(&captain) || !check.starters.contains(&vice) {
        return Err(Violation::CaptaincyNotStarting);
    }
    Ok(())
}

fn check_size(size: usize) -> Validity {
    match size.cmp(&SQUAD_SIZE) {
        std::cmp::Ordering::Less => Err(Violation::NeedMorePlayers {
            missing: SQUAD_SIZE - size,
        }),
        std::cmp::Ordering::Greater => Err(Violation::TooManyPlayers {
            excess: size - SQUAD_SIZE,
        }),
        std::cmp::Ordering::Equal => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STARTERS: [PlayerId; 11] = [1, 10, 11, 12, 13, 20, 21, 22, 23, 30, 31];

    fn check(formation: FormationCounts, captaincy: Captaincy) -> LineupCheck<'static> {
        LineupCheck {
            mode: Mode::View,
            squad_size: 15,
            starters: &STARTERS,
            formation,
            captaincy,
        }
    }

    #[test]
    fn balanced_lineup_is_valid() {
        let lineup = check(
            FormationCounts::new(1, 4, 4, 2),
            Captaincy::new(Some(20), Some(30)),
        );
        assert_eq!(validate(&lineup), Ok(()));
    }

    #[test]
    fn short_squad_is_reported_in_both_modes() {
        let mut lineup = check(FormationCounts::new(1, 4, 4, 2), Captaincy::default());
        lineup.squad_size = 14;
        let expected = Err(Violation::NeedMorePlayers { missing: 1 });
        assert_eq!(validate(&lineup), expected);
        assert_eq!(
            validate(&lineup).unwrap_err().to_string(),
            "Select 1 more player"
        );
        lineup.mode = Mode::Edit;
        assert_eq!(validate(&lineup), expected);
    }

    #[test]
    fn oversized_squad_asks_for_removal() {
        let mut lineup = check(FormationCounts::new(1, 4, 4, 2), Captaincy::default());
        lineup.squad_size = 17;
        assert_eq!(
            validate(&lineup).unwrap_err().to_string(),
            "Remove 2 players"
        );
    }

    #[test]
    fn defender_shortage_wins_over_captaincy() {
        let lineup = check(FormationCounts::new(1, 2, 5, 3), Captaincy::default());
        assert_eq!(validate(&lineup), Err(Violation::Defenders { found: 2 }));
    }

    #[test]
    fn starter_count_is_checked_before_positions() {
        let starters = [1, 10, 11, 20, 21, 22, 23, 30, 31];
        let lineup = LineupCheck {
            starters: &starters,
            ..check(FormationCounts::new(1, 2, 4, 2), Captaincy::default())
        };
        assert_eq!(validate(&lineup), Err(Violation::StarterCount { found: 9 }));
    }

    #[test]
    fn position_rules_in_priority_order() {
        let cases = [
            (FormationCounts::new(2, 4, 3, 2), Violation::Goalkeepers { found: 2 }),
            (FormationCounts::new(1, 6, 2, 2), Violation::Defenders { found: 6 }),
            (FormationCounts::new(1, 5, 1, 4), Violation::Midfielders { found: 1 }),
            (FormationCounts::new(1, 5, 5, 0), Violation::Forwards { found: 0 }),
        ];
        for (formation, expected) in cases {
            assert_eq!(formation.total(), 11);
            let lineup = check(formation, Captaincy::new(Some(1), Some(10)));
            assert_eq!(validate(&lineup), Err(expected));
        }
    }

    #[test]
    fn captaincy_rules() {
        let formation = FormationCounts::new(1, 4, 4, 2);
        assert_eq!(
            validate(&check(formation, Captaincy::new(Some(20), None))),
            Err(Violation::CaptaincyUnassigned)
        );
        let same = validate(&check(formation, Captaincy::new(Some(20), Some(20))));
        assert_eq!(same, Err(Violation::SameCaptainAndVice));
        assert_eq!(
            same.unwrap_err().to_string(),
            "Captain and vice-captain cannot be the same player"
        );
        assert_eq!(
            validate(&check(formation, Captaincy::new(Some(20), Some(99)))),
            Err(Violation::CaptaincyNotStarting)
        );
    }

    #[test]
    fn edit_mode_skips_lineup_rules() {
        let mut lineup = check(FormationCounts::new(0, 0, 0, 0), Captaincy::default());
        lineup.mode = Mode::Edit;
        lineup.starters = &[];
        assert_eq!(validate(&lineup), Ok(()));
    }

    #[test]
    fn formation_label() {
        assert_eq!(FormationCounts::new(1, 3, 5, 2).to_string(), "3-5-2");
    }
}
