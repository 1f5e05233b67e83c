use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{PlayerId, SQUAD_SIZE};

/// Current version of the persisted squad record.
pub const SQUAD_SCHEMA_VERSION: u32 = 1;

/// Persisted squad membership and canonical starters.
///
/// `starterIds` is left empty while the squad is being edited so that an
/// unconfirmed arrangement never becomes canonical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SquadRecord {
    /// Schema version. Records written before versioning carry none and read as `0`.
    #[serde(default)]
    pub version: u32,
    /// All squad members in insertion order.
    #[serde(default)]
    pub all_ids: Vec<PlayerId>,
    /// Confirmed starters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub starter_ids: Vec<PlayerId>,
}

impl SquadRecord {
    /// Build a current-version record.
    pub fn new(all_ids: Vec<PlayerId>, starter_ids: Vec<PlayerId>) -> Self {
        Self {
            version: SQUAD_SCHEMA_VERSION,
            all_ids,
            starter_ids,
        }
    }
}

/// Bring a record to the current schema version.
pub fn migrate_squad(mut record: SquadRecord) -> SquadRecord {
    let original = record.version;
    record = match record.version {
        0 => migrate_v0_to_v1(record),
        SQUAD_SCHEMA_VERSION => record,
        future => {
            warn!(
                version = future,
                current = SQUAD_SCHEMA_VERSION,
                "Loading squad written by a newer version"
            );
            record
        }
    };
    record.version = SQUAD_SCHEMA_VERSION;
    if original < SQUAD_SCHEMA_VERSION {
        warn!(from = original, to = SQUAD_SCHEMA_VERSION, "Upgraded persisted squad");
    }
    record
}

/// Unversioned records were written without any checks.
fn migrate_v0_to_v1(mut record: SquadRecord) -> SquadRecord {
    let mut seen = HashSet::new();
    let before = record.all_ids.len();
    record.all_ids.retain(|id| seen.insert(*id));
    record.all_ids.truncate(SQUAD_SIZE);
    if record.all_ids.len() != before {
        warn!(
            before,
            after = record.all_ids.len(),
            "Dropped duplicate or excess squad ids"
        );
    }

    let members: HashSet<PlayerId> = record.all_ids.iter().copied().collect();
    let mut seen_starters = HashSet::new();
    record
        .starter_ids
        .retain(|id| members.contains(id) && seen_starters.insert(*id));
    record
}

/// Parse an id stored as decimal text.
pub fn parse_id(raw: &str) -> Option<PlayerId> {
    raw.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_record_is_cleaned() {
        let legacy: SquadRecord =
            serde_json::from_str(r#"{"allIds":[1,2,2,3],"starterIds":[3,9,3]}"#).unwrap();
        assert_eq!(legacy.version, 0);
        let record = migrate_squad(legacy);
        assert_eq!(record.version, SQUAD_SCHEMA_VERSION);
        assert_eq!(record.all_ids, vec![1, 2, 3]);
        assert_eq!(record.starter_ids, vec![3]);
    }

    #[test]
    fn legacy_record_is_truncated_to_squad_size() {
        let legacy = SquadRecord {
            version: 0,
            all_ids: (1..=20).collect(),
            starter_ids: vec![18],
        };
        let record = migrate_squad(legacy);
        assert_eq!(record.all_ids.len(), SQUAD_SIZE);
        assert!(record.starter_ids.is_empty());
    }

    #[test]
    fn empty_starters_are_omitted() {
        let json = serde_json::to_string(&SquadRecord::new(vec![4, 5], Vec::new())).unwrap();
        assert_eq!(json, r#"{"version":1,"allIds":[4,5]}"#);
    }

    #[test]
    fn ids_parse_from_text() {
        assert_eq!(parse_id(" 42 "), Some(42));
        assert_eq!(parse_id("null"), None);
    }
}
