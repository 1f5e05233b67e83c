//! Shared domain models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a player in the reference catalog.
pub type PlayerId = u32;

/// Number of players in a complete squad.
pub const SQUAD_SIZE: usize = 15;
/// Number of starters in a complete lineup.
pub const STARTER_COUNT: usize = 11;
/// Number of substitutes in a complete lineup.
pub const BENCH_SIZE: usize = SQUAD_SIZE - STARTER_COUNT;

/// Playing position, serialized as its numeric identifier (1..=4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Position {
    /// Goalkeeper (`1`).
    Goalkeeper,
    /// Defender (`2`).
    Defender,
    /// Midfielder (`3`).
    Midfielder,
    /// Forward (`4`).
    Forward,
}

impl Position {
    /// All positions in pitch order.
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Numeric identifier used by the reference data and the wire format.
    pub fn id(self) -> u8 {
        match self {
            Position::Goalkeeper => 1,
            Position::Defender => 2,
            Position::Midfielder => 3,
            Position::Forward => 4,
        }
    }

    /// Three-letter label (e.g. `DEF`).
    pub fn short_label(self) -> &'static str {
        match self {
            Position::Goalkeeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    /// Parse a short label, case-insensitively. `GK` is accepted as well as `GKP`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "GK" | "GKP" => Some(Position::Goalkeeper),
            "DEF" => Some(Position::Defender),
            "MID" => Some(Position::Midfielder),
            "FWD" => Some(Position::Forward),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Position {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Position::Goalkeeper),
            2 => Ok(Position::Defender),
            3 => Ok(Position::Midfielder),
            4 => Ok(Position::Forward),
            other => Err(format!("unknown position identifier {other}")),
        }
    }
}

impl From<Position> for u8 {
    fn from(value: Position) -> Self {
        value.id()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_label())
    }
}

/// A player record from the reference catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Unique player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Playing position.
    pub position: Position,
    /// Price in currency units (e.g. `7.5`).
    pub price: f64,
    /// Short code of the player's club.
    pub team: String,
    /// Identifier of the player's club.
    pub team_id: u32,
    /// Availability flag (`a` for available).
    #[serde(default = "default_status")]
    pub status: String,
    /// Percent chance of playing this round, when reported.
    #[serde(default)]
    pub chance_of_playing: Option<u8>,
    /// Ownership percentage as reported upstream.
    #[serde(default)]
    pub selected_by: Option<String>,
}

fn default_status() -> String {
    "a".to_string()
}

impl Player {
    /// Whether the player is flagged as available.
    pub fn is_available(&self) -> bool {
        self.status == "a"
    }

    /// Returns a compact label such as `Saka (ARS) 10.0`.
    pub fn display_name(&self) -> String {
        format!("{} ({}) {:.1}", self.name, self.team, self.price)
    }
}

/// A club from the reference catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Club identifier.
    pub id: u32,
    /// Badge code.
    pub code: u32,
    /// Full club name.
    #[serde(default)]
    pub name: String,
    /// Three-letter club code.
    #[serde(default)]
    pub short_name: String,
}

/// One-time chip usage flags. The flags are independent of each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChipState {
    /// Bench Boost has been played.
    #[serde(default)]
    pub bench_boost: bool,
    /// Triple Captain has been played.
    #[serde(default)]
    pub triple_captain: bool,
    /// Wildcard has been played.
    #[serde(default)]
    pub wildcard: bool,
}

/// Chips tracked by [`ChipState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip {
    /// Bench players score this gameweek.
    BenchBoost,
    /// Captain scores triple.
    TripleCaptain,
    /// Unlimited free transfers.
    Wildcard,
}

impl Chip {
    /// Human-readable chip name.
    pub fn label(self) -> &'static str {
        match self {
            Chip::BenchBoost => "Bench Boost",
            Chip::TripleCaptain => "Triple Captain",
            Chip::Wildcard => "Wildcard",
        }
    }
}

impl ChipState {
    /// Whether the given chip has been used.
    pub fn is_used(&self, chip: Chip) -> bool {
        match chip {
            Chip::BenchBoost => self.bench_boost,
            Chip::TripleCaptain => self.triple_captain,
            Chip::Wildcard => self.wildcard,
        }
    }

    /// Set the usage flag of a single chip.
    pub fn set(&mut self, chip: Chip, used: bool) {
        match chip {
            Chip::BenchBoost => self.bench_boost = used,
            Chip::TripleCaptain => self.triple_captain = used,
            Chip::Wildcard => self.wildcard = used,
        }
    }
}

/// Captain and vice-captain choice. Either may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Captaincy {
    /// Selected captain.
    pub captain: Option<PlayerId>,
    /// Selected vice-captain.
    pub vice_captain: Option<PlayerId>,
}

impl Captaincy {
    /// Build a captaincy from both choices.
    pub fn new(captain: Option<PlayerId>, vice_captain: Option<PlayerId>) -> Self {
        Self {
            captain,
            vice_captain,
        }
    }

    /// Clear any reference to the given player.
    pub fn forget(&mut self, id: PlayerId) {
        if self.captain == Some(id) {
            self.captain = None;
        }
        if self.vice_captain == Some(id) {
            self.vice_captain = None;
        }
    }
}
