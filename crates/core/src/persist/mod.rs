//! Durable storage of squad state.

pub mod adapter;
pub mod schema;
pub mod store;

pub use adapter::{PersistedState, PersistenceAdapter};
pub use schema::{SquadRecord, SQUAD_SCHEMA_VERSION};
pub use store::{FileStore, KeyValueStore, MemoryStore};
