use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::dto::captain_dto::CaptainSummary;
use crate::dto::player_dto::Player;
use crate::services::session::DraftSession;

/// The last committed pick, kept for display on every client.
#[derive(Debug, Clone, Serialize)]
pub struct LastPick {
    pub captain_id: String,
    pub captain_name: String,
    pub player: Player,
    /// True when the pick came from autodraft rather than the captain.
    pub auto: bool,
}

/// Complete point-in-time draft state as broadcast to every participant.
/// Clients replace their local cache wholesale with each one of these.
#[derive(Debug, Clone, Serialize)]
pub struct DraftSnapshot {
    pub draft_started: bool,
    pub completed: bool,
    pub current_captain_id: Option<String>,
    pub next_captain_id: Option<String>,
    pub current_captain: Option<String>,
    pub next_captain: Option<String>,
    pub pick_expires_at: Option<DateTime<Utc>>,
    pub last_pick: Option<LastPick>,
    pub available_pool: Vec<Player>,
    /// Rosters keyed by captain user id.
    pub teams: BTreeMap<String, Vec<Player>>,
    pub autodraft_preferences: BTreeMap<String, bool>,
    pub captains: Vec<CaptainSummary>,
}

pub type SharedDraftSession = Arc<RwLock<DraftSession>>;
