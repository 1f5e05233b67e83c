//! Read-only player reference data.

/// Snapshot cache persisted next to the fetched catalog.
pub mod cache;
/// Remote fetching of the reference payload.
pub mod loader;
/// Free-text and filtered player search.
pub mod query;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::{Player, PlayerId, Position, Team};

pub use cache::{snapshot_path, CatalogSnapshot};
pub use loader::CatalogLoader;
pub use query::PlayerQuery;

/// Flat, serializable form of the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    /// Every known player.
    pub players: Vec<Player>,
    /// Every known club.
    pub teams: Vec<Team>,
}

/// Indexed player catalog supplied once per session load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "CatalogData", into = "CatalogData")]
pub struct PlayerCatalog {
    players: HashMap<PlayerId, Player>,
    by_position: BTreeMap<Position, Vec<PlayerId>>,
    teams: Vec<Team>,
}

impl PlayerCatalog {
    /// Build and index a catalog. Players within a position are ordered by name.
    pub fn new(data: CatalogData) -> Self {
        let mut players = HashMap::with_capacity(data.players.len());
        for player in data.players {
            players.insert(player.id, player);
        }

        let mut by_position: BTreeMap<Position, Vec<PlayerId>> = BTreeMap::new();
        let mut ordered: Vec<&Player> = players.values().collect();
        ordered.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        for player in ordered {
            by_position
                .entry(player.position)
                .or_default()
                .push(player.id);
        }

        Self {
            players,
            by_position,
            teams: data.teams,
        }
    }

    /// Look up a player by identifier.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Whether the catalog knows the given identifier.
    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    /// Position of the given player.
    pub fn position_of(&self, id: PlayerId) -> Option<Position> {
        self.players.get(&id).map(|player| player.position)
    }

    /// Price of the given player.
    pub fn price_of(&self, id: PlayerId) -> Option<f64> {
        self.players.get(&id).map(|player| player.price)
    }

    /// Players of a position, ordered by name.
    pub fn players_in(&self, position: Position) -> impl Iterator<Item = &Player> {
        self.by_position
            .get(&position)
            .into_iter()
            .flatten()
            .filter_map(|id| self.players.get(id))
    }

    /// Every player, grouped by position and ordered by name within each group.
    pub fn all_players(&self) -> impl Iterator<Item = &Player> {
        Position::ALL
            .into_iter()
            .flat_map(move |position| self.players_in(position))
    }

    /// All clubs.
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Look up a club by identifier.
    pub fn team(&self, id: u32) -> Option<&Team> {
        self.teams.iter().find(|team| team.id == id)
    }

    /// Number of players in the catalog.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl From<CatalogData> for PlayerCatalog {
    fn from(data: CatalogData) -> Self {
        PlayerCatalog::new(data)
    }
}

impl From<PlayerCatalog> for CatalogData {
    fn from(catalog: PlayerCatalog) -> Self {
        let players = catalog
            .all_players()
            .cloned()
            .collect::<Vec<_>>();
        CatalogData {
            players,
            teams: catalog.teams,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::sample_catalog;
    use super::*;

    #[test]
    fn indexes_players_by_position() {
        let catalog = sample_catalog();
        assert_eq!(catalog.len(), 24);
        assert_eq!(catalog.position_of(12), Some(Position::Defender));
        assert_eq!(catalog.price_of(30), Some(8.0));
        assert_eq!(catalog.players_in(Position::Goalkeeper).count(), 3);
        assert_eq!(catalog.team(12).map(|team| team.code), Some(14));
        assert!(catalog.position_of(999).is_none());
    }

    #[test]
    fn catalog_serializes_through_flat_form() {
        let catalog = sample_catalog();
        let json = serde_json::to_string(&catalog).unwrap();
        let restored: PlayerCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.len(), catalog.len());
        assert_eq!(restored.position_of(21), Some(Position::Midfielder));
    }
}
