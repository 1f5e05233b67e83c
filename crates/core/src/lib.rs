#![warn(clippy::all, missing_docs)]

//! Core domain logic for squadtui.
//!
//! This crate hosts the player catalog, squad and lineup rules,
//! configuration handling, persistence and the analysis client
//! used by the terminal UI and any future frontends.

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod models;
pub mod persist;
pub mod squad;

pub use analysis::{AnalysisClient, AnalysisReport, AnalysisRequest};
pub use catalog::{CatalogLoader, PlayerCatalog, PlayerQuery};
pub use config::AppConfig;
pub use models::{Captaincy, Chip, ChipState, Player, PlayerId, Position, Team};
pub use persist::{FileStore, KeyValueStore, MemoryStore, PersistenceAdapter};
pub use squad::{Area, Mode, SquadError, SquadSession, Violation};
