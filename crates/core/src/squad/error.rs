use thiserror::Error;

use super::placement::Area;
use crate::models::PlayerId;

/// Faults raised by squad and placement operations.
#[derive(Error, Debug)]
pub enum SquadError {
    #[error("Squad already has 15 players")]
    CapacityExceeded,

    #[error("Player {0} is already in the squad")]
    DuplicateMember(PlayerId),

    #[error("Player {0} is not in the squad")]
    MemberNotFound(PlayerId),

    #[error("Player {0} is not in the player list")]
    UnknownPlayer(PlayerId),

    #[error("Squad is full, remove a player first")]
    SquadFull,

    #[error("No open slot for player {0}")]
    NoOpenSlot(PlayerId),

    #[error("No open slot in {0}")]
    NoOpenSlotInArea(Area),

    #[error("Switch to edit mode to change the lineup")]
    NotEditing,

    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

impl SquadError {
    /// Advisory faults leave the session usable and only need user action.
    pub fn is_advisory(&self) -> bool {
        !matches!(self, SquadError::Persistence(_))
    }
}
