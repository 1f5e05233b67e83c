mod app;

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    path::Path,
};

use tracing_subscriber::{prelude::*, EnvFilter};
use squadtui_core::{
    analysis::AnalysisClient,
    catalog::CatalogLoader,
    config::{self, AppConfig},
    persist::{FileStore, MemoryStore, PersistenceAdapter},
    squad::SquadSession,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let loader = CatalogLoader::new(&config)?;
    let catalog = loader.load().await.map_err(|err| {
        tracing::error!(?err, endpoint = loader.endpoint(), "Player catalog unavailable");
        err.context("Could not load players. Check the service and try again")
    })?;

    let (persistence, notice) = open_persistence(&config.state_root);
    let session = SquadSession::load(catalog, persistence)?.with_budget(config.budget);
    let client = AnalysisClient::new(&config)?;

    let mut app = app::SquadApp::new(session, client, loader.fetched_at());
    if let Some(notice) = notice {
        app = app.with_notice(notice);
    }
    app.run().await
}

/// Open the squad store, falling back to memory with a notice for the user.
fn open_persistence(state_root: &Path) -> (PersistenceAdapter, Option<String>) {
    match FileStore::open(state_root) {
        Ok(store) => (PersistenceAdapter::new(store), None),
        Err(err) => {
            tracing::warn!(?err, "Squad store unavailable, changes will not be kept");
            let notice = format!("Saved squad unreadable, changes will not be kept: {err:#}");
            (PersistenceAdapter::new(MemoryStore::new()), Some(notice))
        }
    }
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("squadtui.log");

    let env_filter = EnvFilter::from_default_env();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use squadtui_core::persist::store::STORE_FILE;
    use tempfile::tempdir;

    #[test]
    fn unreadable_store_falls_back_with_notice() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join(STORE_FILE), b"{broken")?;
        let (persistence, notice) = open_persistence(dir.path());
        let notice = notice.expect("fallback should be announced");
        assert!(notice.contains("changes will not be kept"));
        assert!(persistence.load()?.squad.all_ids.is_empty());
        Ok(())
    }

    #[test]
    fn missing_store_opens_quietly() -> Result<()> {
        let dir = tempdir()?;
        let (_, notice) = open_persistence(dir.path());
        assert!(notice.is_none());
        Ok(())
    }
}
