use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use super::{
    captaincy::resolve_captaincy,
    error::SquadError,
    formation::{validate, LineupCheck, Validity, Violation},
    mode::Mode,
    placement::{Area, Placement},
    store::Squad,
};
use crate::{
    analysis::AnalysisRequest,
    catalog::PlayerCatalog,
    models::{Captaincy, Chip, ChipState, PlayerId, Position},
    persist::{PersistenceAdapter, SquadRecord},
};

/// Money spent against the nominal budget. Informational only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Budget {
    pub limit: f64,
    pub spent: f64,
    pub remaining: f64,
}

/// Owns the squad state of one user session and keeps storage in step with it.
///
/// Every mutation is written through to the [`PersistenceAdapter`] before the
/// call returns.
pub struct SquadSession {
    catalog: Arc<PlayerCatalog>,
    persistence: PersistenceAdapter,
    squad: Squad,
    placement: Placement,
    captaincy: Captaincy,
    chips: ChipState,
    mode: Mode,
    budget_limit: f64,
}

impl SquadSession {
    /// Restore the session from storage, starting in [`Mode::View`].
    pub fn load(catalog: Arc<PlayerCatalog>, persistence: PersistenceAdapter) -> Result<Self> {
        let stored = persistence.load()?;

        let known: Vec<PlayerId> = stored
            .squad
            .all_ids
            .iter()
            .copied()
            .filter(|id| {
                let known = catalog.contains(*id);
                if !known {
                    warn!(player = id, "Dropping stored player missing from catalog");
                }
                known
            })
            .collect();
        let dropped = known.len() != stored.squad.all_ids.len();

        let mut session = Self {
            catalog,
            persistence,
            squad: Squad::from_ids(known),
            placement: Placement::default(),
            captaincy: stored.captaincy,
            chips: stored.chips,
            mode: Mode::View,
            budget_limit: 100.0,
        };
        let placement = Placement::view_default(
            &session.squad,
            &stored.squad.starter_ids,
            session.position_lookup(),
        );
        session.install(placement)?;
        if dropped {
            session.persist_squad()?;
        }
        info!(
            members = session.squad.len(),
            starters = session.placement.starter_count(),
            "Squad session loaded"
        );
        Ok(session)
    }

    /// Use a different nominal budget.
    pub fn with_budget(mut self, limit: f64) -> Self {
        self.budget_limit = limit;
        self
    }

    pub fn catalog(&self) -> &PlayerCatalog {
        &self.catalog
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn squad(&self) -> &Squad {
        &self.squad
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn captaincy(&self) -> Captaincy {
        self.captaincy
    }

    pub fn chips(&self) -> ChipState {
        self.chips
    }

    /// Switch modes. Leaving edit mode confirms the current arrangement.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), SquadError> {
        if mode == self.mode {
            return Ok(());
        }
        match mode {
            Mode::Edit => {
                let placement =
                    Placement::for_edit(&self.squad, Some(&self.placement), self.position_lookup());
                self.persist_record(SquadRecord::new(self.squad.ids().to_vec(), Vec::new()))?;
                self.mode = Mode::Edit;
                self.install(placement)?;
            }
            Mode::View => {
                let confirmed = self.placement.starters();
                self.persist_record(SquadRecord::new(
                    self.squad.ids().to_vec(),
                    confirmed.clone(),
                ))?;
                self.mode = Mode::View;
                let placement =
                    Placement::view_confirmed(&self.squad, &confirmed, self.position_lookup());
                self.install(placement)?;
            }
        }
        info!(mode = %self.mode, "Mode changed");
        Ok(())
    }

    /// Switch to the other mode.
    pub fn toggle_mode(&mut self) -> Result<Mode, SquadError> {
        self.set_mode(self.mode.toggled())?;
        Ok(self.mode)
    }

    /// Select the destination slot for the next [`SquadSession::add_to_active_slot`].
    pub fn activate_slot(&mut self, area: Area) -> Result<(), SquadError> {
        self.require_edit()?;
        self.placement.activate_slot(area)
    }

    /// Clear the slot selection.
    pub fn deactivate_slot(&mut self) {
        self.placement.deactivate_slot();
    }

    /// Add a player to the squad and place them on the bench or their own line.
    pub fn add_player(&mut self, id: PlayerId, target_is_bench: bool) -> Result<Area, SquadError> {
        self.require_edit()?;
        if self.squad.is_full() {
            return Err(SquadError::SquadFull);
        }
        if self.squad.contains(id) {
            return Err(SquadError::DuplicateMember(id));
        }
        let position = self
            .catalog
            .position_of(id)
            .ok_or(SquadError::UnknownPlayer(id))?;

        let area = self.placement.place_new(id, position, target_is_bench)?;
        self.squad.add(id)?;
        self.persist_squad()?;
        Ok(area)
    }

    /// Add a player into the active slot, or onto the pitch when none is active.
    pub fn add_to_active_slot(&mut self, id: PlayerId) -> Result<Area, SquadError> {
        let target_is_bench = self.placement.active_slot() == Some(Area::Bench);
        self.add_player(id, target_is_bench)
    }

    /// Remove a player and everything tied to them. Removing a non-member succeeds.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<(), SquadError> {
        self.require_edit()?;
        if !self.squad.remove(id) {
            return Ok(());
        }
        self.placement.remove(id);
        self.persist_squad()?;

        let before = self.captaincy;
        self.captaincy.forget(id);
        if self.captaincy != before {
            self.persistence.save_captaincy(&self.captaincy)?;
        }
        Ok(())
    }

    /// Send a starter to the bench.
    pub fn move_to_bench(&mut self, id: PlayerId) -> Result<(), SquadError> {
        self.require_edit()?;
        self.placement.move_to_bench(id)
    }

    /// Bring a substitute onto the pitch.
    pub fn move_to_pitch(&mut self, id: PlayerId) -> Result<(), SquadError> {
        self.require_edit()?;
        self.placement.move_to_pitch(id).map(|_| ())
    }

    /// Choose the captain. The choice is stored even if it breaks a lineup rule.
    pub fn set_captain(&mut self, id: PlayerId) -> Result<(), SquadError> {
        self.require_member(id)?;
        self.captaincy.captain = Some(id);
        self.persistence.save_captain(Some(id))?;
        debug!(player = id, "Captain set");
        Ok(())
    }

    /// Choose the vice-captain. The choice is stored even if it breaks a lineup rule.
    pub fn set_vice_captain(&mut self, id: PlayerId) -> Result<(), SquadError> {
        self.require_member(id)?;
        self.captaincy.vice_captain = Some(id);
        self.persistence.save_vice_captain(Some(id))?;
        debug!(player = id, "Vice-captain set");
        Ok(())
    }

    /// Record whether a chip has been used.
    pub fn set_chip(&mut self, chip: Chip, used: bool) -> Result<(), SquadError> {
        self.chips.set(chip, used);
        self.persistence.save_chips(&self.chips)?;
        Ok(())
    }

    /// Current rule check.
    pub fn validity(&self) -> Validity {
        self.check_as(self.mode)
    }

    /// Whether the lineup may be submitted for analysis.
    pub fn can_submit(&self) -> bool {
        self.mode == Mode::View && self.validity().is_ok()
    }

    /// Build the submission payload. The full rule set applies whatever the mode.
    pub fn analysis_request(&self) -> Result<AnalysisRequest, Violation> {
        self.check_as(Mode::View)?;
        let (Some(captain_id), Some(vice_captain_id)) =
            (self.captaincy.captain, self.captaincy.vice_captain)
        else {
            return Err(Violation::CaptaincyUnassigned);
        };
        Ok(AnalysisRequest {
            starting_ids: self.placement.starters(),
            bench_ids: self.placement.bench().to_vec(),
            captain_id,
            vice_captain_id,
            used_chips: self.chips,
        })
    }

    /// Spend against the nominal budget.
    pub fn budget(&self) -> Budget {
        let spent: f64 = self
            .squad
            .ids()
            .iter()
            .filter_map(|id| self.catalog.price_of(*id))
            .sum();
        Budget {
            limit: self.budget_limit,
            spent,
            remaining: self.budget_limit - spent,
        }
    }

    fn check_as(&self, mode: Mode) -> Validity {
        let starters = self.placement.starters();
        validate(&LineupCheck {
            mode,
            squad_size: self.squad.len(),
            starters: &starters,
            formation: self.placement.formation(),
            captaincy: self.captaincy,
        })
    }

    fn require_edit(&self) -> Result<(), SquadError> {
        if self.mode.is_editing() {
            Ok(())
        } else {
            Err(SquadError::NotEditing)
        }
    }

    fn require_member(&self, id: PlayerId) -> Result<(), SquadError> {
        if self.squad.contains(id) {
            Ok(())
        } else {
            Err(SquadError::MemberNotFound(id))
        }
    }

    fn position_lookup(&self) -> impl Fn(PlayerId) -> Option<Position> {
        let catalog = self.catalog.clone();
        move |id| catalog.position_of(id)
    }

    /// Swap in a rebuilt placement and fill in captaincy defaults.
    fn install(&mut self, placement: Placement) -> Result<(), SquadError> {
        self.placement = placement;

        let resolved = resolve_captaincy(&self.placement.starters(), &self.squad, self.captaincy);
        if resolved != self.captaincy {
            debug!(?resolved, "Applied captaincy defaults");
            self.captaincy = resolved;
            self.persistence.save_captaincy(&self.captaincy)?;
        }
        Ok(())
    }

    fn persist_squad(&mut self) -> Result<(), SquadError> {
        let starters = match self.mode {
            Mode::View => self.placement.starters(),
            Mode::Edit => Vec::new(),
        };
        self.persist_record(SquadRecord::new(self.squad.ids().to_vec(), starters))
    }

    fn persist_record(&mut self, record: SquadRecord) -> Result<(), SquadError> {
        self.persistence.save_squad(&record)?;
        Ok(())
    }
}
