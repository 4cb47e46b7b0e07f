use serde::{Deserialize, Serialize};

use crate::dto::player_dto::Player;

/// A captain slot holder. Created when a user claims one of the bounded
/// slots; never destroyed within a session. `active` tracks connection
/// liveness across reconnects without touching the slot or roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Captain {
    pub user_id: String,
    pub display_name: String,
    pub team_name: String,
    pub active: bool,
    pub autodraft: bool,
    /// Insertion order is pick order.
    pub roster: Vec<Player>,
}

impl Captain {
    pub fn new(user_id: String, display_name: String, team_name: Option<String>) -> Self {
        let team_name = team_name.unwrap_or_else(|| default_team_name(&display_name));
        Self {
            user_id,
            display_name,
            team_name,
            active: true,
            autodraft: false,
            roster: Vec::new(),
        }
    }
}

/// "<first name>'s Team", matching what the league has always shown for
/// captains who never bother naming their side.
pub fn default_team_name(display_name: &str) -> String {
    let first = display_name.split_whitespace().next().unwrap_or(display_name);
    format!("{}'s Team", first)
}

/// Slot-ordered captain row for the captain board broadcast.
#[derive(Debug, Clone, Serialize)]
pub struct CaptainSummary {
    pub user_id: String,
    pub display_name: String,
    pub team_name: String,
    pub active: bool,
    pub autodraft: bool,
}

impl From<&Captain> for CaptainSummary {
    fn from(captain: &Captain) -> Self {
        Self {
            user_id: captain.user_id.clone(),
            display_name: captain.display_name.clone(),
            team_name: captain.team_name.clone(),
            active: captain.active,
            autodraft: captain.autodraft,
        }
    }
}
