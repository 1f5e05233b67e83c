use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{
    schema::{migrate_squad, parse_id, SquadRecord},
    store::KeyValueStore,
};
use crate::models::{Captaincy, ChipState, PlayerId};

/// Key of the squad membership record.
pub const SQUAD_KEY: &str = "squad_state";
/// Key of the chip usage record.
pub const CHIPS_KEY: &str = "chip_usage";
/// Key of the captain id.
pub const CAPTAIN_KEY: &str = "captain_id";
/// Key of the vice-captain id.
pub const VICE_CAPTAIN_KEY: &str = "vice_captain_id";

/// Everything read back at session start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    /// Squad membership and canonical starters, already migrated.
    pub squad: SquadRecord,
    /// Chip usage flags.
    pub chips: ChipState,
    /// Stored captain choices.
    pub captaincy: Captaincy,
}

/// Typed, write-through access to the squad keys of a [`KeyValueStore`].
pub struct PersistenceAdapter {
    store: Box<dyn KeyValueStore>,
}

impl PersistenceAdapter {
    /// Wrap a store.
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Read every key. Values that fail to parse are logged and treated as absent.
    pub fn load(&self) -> Result<PersistedState> {
        let squad = self
            .read_json::<SquadRecord>(SQUAD_KEY)?
            .map(migrate_squad)
            .unwrap_or_default();
        let chips = self.read_json::<ChipState>(CHIPS_KEY)?.unwrap_or_default();
        let captaincy = Captaincy::new(self.read_id(CAPTAIN_KEY)?, self.read_id(VICE_CAPTAIN_KEY)?);
        debug!(
            members = squad.all_ids.len(),
            starters = squad.starter_ids.len(),
            "Loaded persisted squad"
        );
        Ok(PersistedState {
            squad,
            chips,
            captaincy,
        })
    }

    /// Persist squad membership and starters.
    pub fn save_squad(&mut self, record: &SquadRecord) -> Result<()> {
        let value = serde_json::to_string(record).context("failed to serialize squad")?;
        self.store.set(SQUAD_KEY, value)
    }

    /// Persist chip usage.
    pub fn save_chips(&mut self, chips: &ChipState) -> Result<()> {
        let value = serde_json::to_string(chips).context("failed to serialize chips")?;
        self.store.set(CHIPS_KEY, value)
    }

    /// Persist the captain, removing the key when unset.
    pub fn save_captain(&mut self, id: Option<PlayerId>) -> Result<()> {
        self.write_id(CAPTAIN_KEY, id)
    }

    /// Persist the vice-captain, removing the key when unset.
    pub fn save_vice_captain(&mut self, id: Option<PlayerId>) -> Result<()> {
        self.write_id(VICE_CAPTAIN_KEY, id)
    }

    /// Persist both captaincy choices.
    pub fn save_captaincy(&mut self, captaincy: &Captaincy) -> Result<()> {
        self.save_captain(captaincy.captain)?;
        self.save_vice_captain(captaincy.vice_captain)
    }

    fn write_id(&mut self, key: &str, id: Option<PlayerId>) -> Result<()> {
        match id {
            Some(id) => self.store.set(key, id.to_string()),
            None => self.store.remove(key),
        }
    }

    fn read_id(&self, key: &str) -> Result<Option<PlayerId>> {
        let raw = self.store.get(key)?;
        Ok(raw.and_then(|value| {
            let parsed = parse_id(&value);
            if parsed.is_none() {
                warn!(key, value = %value, "Ignoring unparseable stored id");
            }
            parsed
        }))
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, "Ignoring malformed stored value: {err}");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::store::MemoryStore;

    #[test]
    fn round_trips_every_key() -> Result<()> {
        let store = MemoryStore::new();
        let mut adapter = PersistenceAdapter::new(store.clone());
        let record = SquadRecord::new(vec![1, 2, 3], vec![1, 2]);
        let chips = ChipState {
            bench_boost: false,
            triple_captain: true,
            wildcard: false,
        };
        adapter.save_squad(&record)?;
        adapter.save_chips(&chips)?;
        adapter.save_captaincy(&Captaincy::new(Some(2), Some(1)))?;

        let reloaded = PersistenceAdapter::new(store).load()?;
        assert_eq!(reloaded.squad, record);
        assert_eq!(reloaded.chips, chips);
        assert_eq!(reloaded.captaincy, Captaincy::new(Some(2), Some(1)));
        Ok(())
    }

    #[test]
    fn empty_store_loads_defaults() -> Result<()> {
        let state = PersistenceAdapter::new(MemoryStore::new()).load()?;
        assert_eq!(state, PersistedState::default());
        Ok(())
    }

    #[test]
    fn malformed_values_are_ignored() -> Result<()> {
        let mut store = MemoryStore::new();
        store.set(SQUAD_KEY, "[1,2".to_string())?;
        store.set(CHIPS_KEY, r#"{"benchBoost": true}"#.to_string())?;
        store.set(CAPTAIN_KEY, "abc".to_string())?;
        store.set(VICE_CAPTAIN_KEY, "7".to_string())?;

        let state = PersistenceAdapter::new(store).load()?;
        assert!(state.squad.all_ids.is_empty());
        assert!(state.chips.bench_boost);
        assert!(!state.chips.wildcard);
        assert_eq!(state.captaincy, Captaincy::new(None, Some(7)));
        Ok(())
    }

    #[test]
    fn clearing_captain_removes_key() -> Result<()> {
        let store = MemoryStore::new();
        let mut adapter = PersistenceAdapter::new(store.clone());
        adapter.save_captain(Some(3))?;
        assert_eq!(store.get(CAPTAIN_KEY)?.as_deref(), Some("3"));
        adapter.save_captain(None)?;
        assert!(store.get(CAPTAIN_KEY)?.is_none());
        Ok(())
    }
}
