use thiserror::Error;

/// Everything a draft command can be rejected with. All of these are
/// recoverable at the originating client; the session itself is never left
/// in a partial state by a rejected command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("command not valid in the current session phase")]
    InvalidState,
    #[error("all captain slots are taken")]
    CapacityExceeded,
    #[error("you already hold a captain slot")]
    AlreadyCaptain,
    #[error("unknown captain, player, or connection")]
    NotFound,
    #[error("not your turn to pick")]
    NotYourTurn,
    #[error("the draft has not started yet")]
    DraftNotStarted,
    #[error("player is no longer available")]
    PlayerUnavailable,
}

impl DraftError {
    /// Stable machine-readable code sent in `error` replies. Clients match
    /// on this rather than the display string.
    pub fn code(&self) -> &'static str {
        match self {
            DraftError::InvalidState => "invalid_state",
            DraftError::CapacityExceeded => "capacity_exceeded",
            DraftError::AlreadyCaptain => "already_captain",
            DraftError::NotFound => "not_found",
            DraftError::NotYourTurn => "not_your_turn",
            DraftError::DraftNotStarted => "draft_not_started",
            DraftError::PlayerUnavailable => "player_unavailable",
        }
    }
}
