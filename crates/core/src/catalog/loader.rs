use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{info, warn};

use super::{cache, CatalogData, CatalogSnapshot, PlayerCatalog};
use crate::{
    config::AppConfig,
    models::{Player, PlayerId, Position, Team},
};

/// Fetches the player reference data and keeps the latest copy in memory.
#[derive(Clone)]
pub struct CatalogLoader {
    client: reqwest::Client,
    endpoint: String,
    snapshot_path: PathBuf,
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    catalog: Option<Arc<PlayerCatalog>>,
    fetched_at: Option<DateTime<Utc>>,
}

impl CatalogLoader {
    /// Build a loader from configuration.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/players", config.api_base_url.trim_end_matches('/')),
            snapshot_path: cache::snapshot_path(&config.cache_root),
            inner: Arc::new(RwLock::new(Inner::default())),
        })
    }

    /// URL the reference data is fetched from.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Currently loaded catalog, if any.
    pub fn catalog(&self) -> Option<Arc<PlayerCatalog>> {
        self.inner.read().catalog.clone()
    }

    /// Timestamp of the loaded catalog's fetch.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().fetched_at
    }

    /// Fetch the catalog, falling back to the last snapshot when the request fails.
    pub async fn load(&self) -> Result<Arc<PlayerCatalog>> {
        match self.fetch().await {
            Ok(catalog) => Ok(catalog),
            Err(err) => {
                let snapshot = CatalogSnapshot::load(&self.snapshot_path).with_context(|| {
                    format!("player data unavailable ({err:#}) and the cached copy is unreadable")
                })?;
                match snapshot {
                    Some(snapshot) => {
                        warn!(
                            fetched_at = %snapshot.fetched_at,
                            "Catalog fetch failed, using cached snapshot: {err:#}"
                        );
                        Ok(self.install(snapshot.catalog, snapshot.fetched_at))
                    }
                    None => Err(err.context("player data unavailable and no cached copy exists")),
                }
            }
        }
    }

    /// Fetch the catalog from the remote service and refresh the snapshot.
    pub async fn fetch(&self) -> Result<Arc<PlayerCatalog>> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .with_context(|| format!("failed to request {}", self.endpoint))?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "player data request failed with status {}",
                response.status()
            ));
        }
        let raw: RawCatalog = response
            .json()
            .await
            .context("failed to parse player data")?;
        let catalog = build_catalog(raw);
        info!(players = catalog.len(), "Player catalog fetched");

        let snapshot = CatalogSnapshot::new(catalog);
        if let Err(err) = snapshot.persist(&self.snapshot_path) {
            warn!("Failed to cache player catalog: {err:#}");
        }
        Ok(self.install(snapshot.catalog, snapshot.fetched_at))
    }

    fn install(&self, catalog: PlayerCatalog, fetched_at: DateTime<Utc>) -> Arc<PlayerCatalog> {
        let catalog = Arc::new(catalog);
        let mut inner = self.inner.write();
        inner.catalog = Some(catalog.clone());
        inner.fetched_at = Some(fetched_at);
        catalog
    }
}

/// Parse the reference payload `{ players: { "<pos>": [...] }, teams: [...] }`.
pub fn parse_payload(bytes: &[u8]) -> Result<PlayerCatalog> {
    let raw: RawCatalog = serde_json::from_slice(bytes).context("failed to parse player data")?;
    Ok(build_catalog(raw))
}

fn build_catalog(raw: RawCatalog) -> PlayerCatalog {
    let mut players = Vec::new();
    for (key, records) in raw.players {
        let position = match key
            .parse::<u8>()
            .ok()
            .and_then(|id| Position::try_from(id).ok())
        {
            Some(position) => position,
            None => {
                warn!("Skipping {} players under unknown position '{key}'", records.len());
                continue;
            }
        };
        players.extend(records.into_iter().map(|record| Player {
            id: record.id,
            name: record.name,
            position,
            price: record.price,
            team: record.team,
            team_id: record.team_id,
            status: record.status.unwrap_or_else(|| "a".to_string()),
            chance_of_playing: record.chance_of_playing,
            selected_by: record.selected_by,
        }));
    }
    PlayerCatalog::new(CatalogData {
        players,
        teams: raw.teams,
    })
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    players: HashMap<String, Vec<RawPlayer>>,
    #[serde(default)]
    teams: Vec<Team>,
}

#[derive(Debug, Deserialize)]
struct RawPlayer {
    id: PlayerId,
    name: String,
    price: f64,
    #[serde(default)]
    team: String,
    #[serde(default)]
    team_id: u32,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    chance_of_playing: Option<u8>,
    #[serde(default)]
    selected_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::sample_catalog;
    use serde_json::json;
    use tempfile::tempdir;

    fn offline_config(cache_root: PathBuf) -> AppConfig {
        AppConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            cache_root,
            ..AppConfig::default()
        }
    }

    #[test]
    fn parses_reference_payload() -> Result<()> {
        let payload = json!({
            "players": {
                "1": [{"id": 1, "name": "Raya", "price": 5.5, "team": "ARS", "team_id": 1,
                        "face_url": "ignored", "club_logo_url": "ignored"}],
                "4": [{"id": 9, "name": "Haaland", "price": 14.0, "team": "MCI", "team_id": 13,
                        "status": "d", "chance_of_playing": 75, "selected_by": "61.2"}],
                "9": [{"id": 99, "name": "Ghost", "price": 1.0}]
            },
            "teams": [{"id": 1, "code": 3, "name": "Arsenal", "short_name": "ARS", "strength": 4}]
        });
        let catalog = parse_payload(&serde_json::to_vec(&payload)?)?;
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.position_of(9), Some(Position::Forward));
        let haaland = catalog.player(9).expect("player 9");
        assert!(!haaland.is_available());
        assert_eq!(haaland.chance_of_playing, Some(75));
        assert_eq!(catalog.teams().len(), 1);
        assert!(!catalog.contains(99));
        Ok(())
    }

    #[tokio::test]
    async fn falls_back_to_snapshot_when_offline() -> Result<()> {
        let dir = tempdir()?;
        let config = offline_config(dir.path().to_path_buf());
        CatalogSnapshot::new(sample_catalog()).persist(cache::snapshot_path(dir.path()))?;

        let loader = CatalogLoader::new(&config)?;
        let catalog = loader.load().await?;
        assert_eq!(catalog.len(), sample_catalog().len());
        assert!(loader.catalog().is_some());
        assert!(loader.fetched_at().is_some());
        Ok(())
    }

    #[tokio::test]
    async fn offline_without_snapshot_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let loader = CatalogLoader::new(&offline_config(dir.path().to_path_buf()))?;
        assert!(loader.load().await.is_err());
        assert!(loader.catalog().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_snapshot_reports_both_failures() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(cache::snapshot_path(dir.path()), b"{not json")?;
        let loader = CatalogLoader::new(&offline_config(dir.path().to_path_buf()))?;

        let err = loader.load().await.unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("failed to request http://127.0.0.1:9/api/players"));
        assert!(message.contains("cached copy is unreadable"));
        Ok(())
    }
}
