#![allow(missing_docs)]
//! Squad membership, lineup placement, rule checking and the session that ties them together.

pub mod captaincy;
pub mod error;
pub mod formation;
pub mod mode;
pub mod placement;
pub mod session;
pub mod store;

pub use captaincy::resolve_captaincy;
pub use error::SquadError;
pub use formation::{validate, FormationCounts, LineupCheck, Validity, Violation};
pub use mode::Mode;
pub use placement::{Area, Placement, Role};
pub use session::{Budget, SquadSession};
pub use store::Squad;
