#![allow(missing_docs)]

use std::collections::BTreeMap;

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::models::{ChipState, PlayerId};

/// Lineup submitted for analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub starting_ids: Vec<PlayerId>,
    pub bench_ids: Vec<PlayerId>,
    pub captain_id: PlayerId,
    pub vice_captain_id: PlayerId,
    #[serde(rename = "usedChips")]
    pub used_chips: ChipState,
}

/// Suggested swap of one squad member for another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferSuggestion {
    #[serde(rename = "out")]
    pub outgoing: String,
    #[serde(rename = "in")]
    pub incoming: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub score_gain: Option<f64>,
}

/// Suggested chip to play this gameweek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipSuggestion {
    pub chip: String,
    #[serde(default)]
    pub reason: String,
}

/// One row of a lineup returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupEntry {
    pub role: String,
    pub name: String,
    #[serde(default, deserialize_with = "number_or_text")]
    pub form: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub points: i64,
}

impl LineupEntry {
    pub fn is_substitute(&self) -> bool {
        self.role.eq_ignore_ascii_case("sub")
    }
}

/// Upcoming match between two clubs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub home_team_id: Option<u32>,
    #[serde(default)]
    pub home_team_name: String,
    #[serde(default)]
    pub away_team_id: Option<u32>,
    #[serde(default)]
    pub away_team_name: String,
}

/// Analysis returned by the service. Its content is displayed, never validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub team_rating: f64,
    #[serde(default)]
    pub free_transfers: Vec<TransferSuggestion>,
    #[serde(default)]
    pub other_suggestions: Vec<TransferSuggestion>,
    #[serde(default)]
    pub chip_suggestions: Vec<ChipSuggestion>,
    #[serde(default)]
    pub identified_team: Vec<LineupEntry>,
    #[serde(default)]
    pub suggested_lineup_ft: Vec<LineupEntry>,
    #[serde(default)]
    pub suggested_lineup_wc: Vec<LineupEntry>,
    #[serde(default)]
    pub gameweek_fixtures: Vec<Fixture>,
}

impl AnalysisReport {
    /// Every transfer suggestion, the free ones first.
    pub fn transfers(&self) -> impl Iterator<Item = &TransferSuggestion> {
        self.free_transfers.iter().chain(self.other_suggestions.iter())
    }

    /// Non-empty suggested lineups with a label (at most two).
    pub fn suggested_lineups(&self) -> Vec<(&'static str, &[LineupEntry])> {
        [
            ("After free transfer", self.suggested_lineup_ft.as_slice()),
            ("Wildcard squad", self.suggested_lineup_wc.as_slice()),
        ]
        .into_iter()
        .filter(|(_, entries)| !entries.is_empty())
        .collect()
    }

    /// Fixtures grouped by home and away club name.
    pub fn fixtures_by_team(&self) -> BTreeMap<&str, &Fixture> {
        let mut map = BTreeMap::new();
        for fixture in &self.gameweek_fixtures {
            map.insert(fixture.home_team_name.as_str(), fixture);
            map.insert(fixture.away_team_name.as_str(), fixture);
        }
        map
    }
}

/// Error body returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

fn number_or_text<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Null,
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid number '{text}'"))),
        Raw::Null => Ok(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_uses_wire_names() {
        let request = AnalysisRequest {
            starting_ids: vec![1, 2],
            bench_ids: vec![3],
            captain_id: 1,
            vice_captain_id: 2,
            used_chips: ChipState {
                bench_boost: true,
                ..ChipState::default()
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["usedChips"]["benchBoost"], json!(true));
        assert_eq!(value["vice_captain_id"], json!(2));
    }

    #[test]
    fn parses_service_response() {
        let body = json!({
            "team_rating": 67,
            "free_transfers": [{
                "out": "Gabriel", "in": "Saliba", "reason": "Better fixture",
                "score_gain": 1.4, "out_face_url": "x", "in_player_object": {"id": 5}
            }],
            "other_suggestions": [],
            "chip_suggestions": [{"chip": "Bench Boost", "reason": "Strong bench"}],
            "identified_team": [{"name": "Raya", "form": "4.5", "price": 5.5, "points": 80, "role": "Starter"}],
            "gameweek_fixtures": [{"home_team_id": 1, "home_team_name": "Arsenal",
                                   "away_team_id": 12, "away_team_name": "Liverpool"}],
            "suggested_lineup_ft": [{"name": "Saliba", "form": 6.0, "price": 6.0, "points": 90, "role": "Captain"},
                                    {"name": "Raya", "form": null, "price": 5.5, "points": 80, "role": "Sub"}],
            "suggested_lineup_wc": []
        });
        let report: AnalysisReport = serde_json::from_value(body).unwrap();
        assert_eq!(report.team_rating, 67.0);
        assert_eq!(report.transfers().count(), 1);
        assert_eq!(report.free_transfers[0].incoming, "Saliba");
        assert_eq!(report.identified_team[0].form, 4.5);

        let lineups = report.suggested_lineups();
        assert_eq!(lineups.len(), 1);
        assert_eq!(lineups[0].0, "After free transfer");
        assert!(lineups[0].1[1].is_substitute());
        assert_eq!(lineups[0].1[1].form, 0.0);

        let fixtures = report.fixtures_by_team();
        assert_eq!(fixtures["Liverpool"].home_team_name, "Arsenal");
    }

    #[test]
    fn rejects_malformed_form() {
        let body = json!({"identified_team": [{"name": "X", "form": "hot", "role": "Starter"}]});
        assert!(serde_json::from_value::<AnalysisReport>(body).is_err());
    }
}
