use once_cell::sync::Lazy;
use regex::Regex;

use super::PlayerCatalog;
use crate::models::{Player, Position};

static FILTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(pos|team):(\S+)").expect("invalid filter regex"));

/// Parsed player search such as `pos:mid team:ars sa`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerQuery {
    /// Restrict to a position.
    pub position: Option<Position>,
    /// Restrict to a club short code (lowercase).
    pub team: Option<String>,
    /// Case-insensitive substring of the player name (lowercase).
    pub text: String,
}

impl PlayerQuery {
    /// Parse a raw query string. Unknown `pos:` values are ignored.
    pub fn parse(input: &str) -> Self {
        let mut query = PlayerQuery::default();
        for caps in FILTER_RE.captures_iter(input) {
            let value = &caps[2];
            match caps[1].to_ascii_lowercase().as_str() {
                "pos" => query.position = Position::from_label(value),
                _ => query.team = Some(value.to_lowercase()),
            }
        }
        query.text = FILTER_RE
            .replace_all(input, " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        query
    }

    /// Restrict the query to a position, overriding any parsed `pos:` filter.
    pub fn with_position(mut self, position: Option<Position>) -> Self {
        if position.is_some() {
            self.position = position;
        }
        self
    }

    /// Whether the player satisfies every filter.
    pub fn matches(&self, player: &Player) -> bool {
        if let Some(position) = self.position {
            if player.position != position {
                return false;
            }
        }
        if let Some(team) = &self.team {
            if player.team.to_lowercase() != *team {
                return false;
            }
        }
        self.text.is_empty() || player.name.to_lowercase().contains(&self.text)
    }

    /// Matching players in catalog order.
    pub fn apply<'a>(&self, catalog: &'a PlayerCatalog) -> Vec<&'a Player> {
        catalog
            .all_players()
            .filter(|player| self.matches(player))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::sample_catalog;

    #[test]
    fn parses_filters_and_text() {
        let query = PlayerQuery::parse("pos:Mid  team:ARS  mid 2");
        assert_eq!(query.position, Some(Position::Midfielder));
        assert_eq!(query.team.as_deref(), Some("ars"));
        assert_eq!(query.text, "mid 2");
    }

    #[test]
    fn filters_catalog() {
        let catalog = sample_catalog();
        let defenders = PlayerQuery::parse("pos:def").apply(&catalog);
        assert_eq!(defenders.len(), 8);

        let arsenal_forwards = PlayerQuery::parse("team:ars pos:fwd").apply(&catalog);
        assert!(arsenal_forwards
            .iter()
            .all(|player| player.team == "ARS" && player.position == Position::Forward));
        assert_eq!(arsenal_forwards.len(), 3);

        let by_name = PlayerQuery::parse("gkp 02").apply(&catalog);
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, 2);
    }

    #[test]
    fn explicit_position_overrides_parsed_one() {
        let query = PlayerQuery::parse("pos:gk").with_position(Some(Position::Forward));
        assert_eq!(query.position, Some(Position::Forward));
        let untouched = PlayerQuery::parse("pos:gk").with_position(None);
        assert_eq!(untouched.position, Some(Position::Goalkeeper));
    }
}
