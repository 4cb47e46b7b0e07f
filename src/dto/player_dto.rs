use serde::{Deserialize, Serialize};

/// Position codes used by the league's registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    GK,
    CB,
    RB,
    LB,
    DM,
    CM,
    AM,
    RW,
    LW,
    ST,
}

impl Position {
    /// Parse a directory position string. Unknown codes return `None` and
    /// are skipped by the loader rather than failing the whole player.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GK" => Some(Position::GK),
            "CB" => Some(Position::CB),
            "RB" => Some(Position::RB),
            "LB" => Some(Position::LB),
            "DM" => Some(Position::DM),
            "CM" => Some(Position::CM),
            "AM" => Some(Position::AM),
            "RW" => Some(Position::RW),
            "LW" => Some(Position::LW),
            "ST" => Some(Position::ST),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FootPreference {
    Left,
    Right,
    Both,
}

impl FootPreference {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "left" => Some(FootPreference::Left),
            "right" => Some(FootPreference::Right),
            "both" => Some(FootPreference::Both),
            _ => None,
        }
    }
}

/// A draftable league member. Immutable once loaded into the session pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub nickname: Option<String>,
    pub positions: Vec<Position>,
    pub foot_pref: Option<FootPreference>,
    pub club_team: Option<String>,
    /// Display tiering only, never draft logic.
    pub graduation_year: Option<i32>,
}

impl Player {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Nickname when the player has one, first name otherwise.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.first_name)
    }
}
