use super::store::Squad;
use crate::models::{Captaincy, PlayerId};

/// Fill in captaincy defaults for a freshly built starter list.
///
/// A stored choice survives as long as the player is still in the squad, even
/// when it breaks a lineup rule; those cases are left for the validator. Only a
/// missing or stale choice is replaced: the captain by the first starter, the
/// vice-captain by the second starter, or the third when the second is already
/// captain.
pub fn resolve_captaincy(starters: &[PlayerId], squad: &Squad, persisted: Captaincy) -> Captaincy {
    let captain = persisted
        .captain
        .filter(|id| squad.contains(*id))
        .or_else(|| starters.first().copied());

    let vice_captain = persisted
        .vice_captain
        .filter(|id| squad.contains(*id))
        .or_else(|| match starters.get(1).copied() {
            Some(second) if Some(second) == captain => starters.get(2).copied(),
            second => second,
        });

    Captaincy::new(captain, vice_captain)
}
