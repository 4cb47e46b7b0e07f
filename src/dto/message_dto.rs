use serde::{Deserialize, Serialize};

use crate::dto::captain_dto::CaptainSummary;
use crate::dto::draft_dto::DraftSnapshot;
use crate::error::DraftError;

/// Inbound commands demultiplexed off a session socket. Unknown fields on
/// any variant are ignored so older servers keep accepting newer clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Associates this connection with an identity. The caller is already
    /// authenticated upstream; the id is trusted as asserted.
    Auth { user_id: String },
    /// Request the current snapshot for this connection only.
    Heartbeat,
    BecomeCaptain {
        #[serde(default)]
        team_name: Option<String>,
    },
    SetAutodraft { enabled: bool },
    MakePick { player_id: String },
    /// Request a captain-board refresh.
    CaptainStatus,
}

/* Outbound payloads. Each carries its own `type` discriminant string. */

#[derive(Serialize)]
pub struct DraftUpdate {
    pub r#type: String,
    pub draft_state: DraftSnapshot,
}

impl DraftUpdate {
    pub fn new(draft_state: DraftSnapshot) -> Self {
        Self {
            r#type: "draft_update".to_string(),
            draft_state,
        }
    }
}

#[derive(Serialize)]
pub struct CaptainsUpdate {
    pub r#type: String,
    pub count: usize,
    pub capacity: usize,
    pub can_become_captain: bool,
    pub captains: Vec<CaptainSummary>,
}

impl CaptainsUpdate {
    pub fn from_session(session: &crate::services::session::DraftSession) -> Self {
        let captains = session.captains();
        Self {
            r#type: "captains_update".to_string(),
            count: captains.len(),
            capacity: captains.capacity(),
            can_become_captain: !captains.is_full(),
            captains: captains.summaries(),
        }
    }
}

#[derive(Serialize)]
pub struct ConnectedUsersUpdate {
    pub r#type: String,
    pub count: usize,
    pub users: Vec<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub r#type: String,
    pub success: bool,
    pub display_name: String,
}

#[derive(Serialize)]
pub struct CaptainResponse {
    pub r#type: String,
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorReply {
    pub r#type: String,
    pub code: String,
    pub message: String,
}

impl ErrorReply {
    pub fn from_error(err: DraftError) -> Self {
        Self {
            r#type: "error".to_string(),
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct ExportComplete {
    pub r#type: String,
    pub status: String,
    pub message: String,
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_commands_parse_from_tagged_json() {
        let cmd: ClientCommand =
            serde_json::from_str(r#"{"type":"make_pick","player_id":"p7"}"#).unwrap();
        match cmd {
            ClientCommand::MakePick { player_id } => assert_eq!(player_id, "p7"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let cmd: ClientCommand = serde_json::from_str(
            r#"{"type":"auth","user_id":"u1","client_build":"2.4.0","locale":"en"}"#,
        )
        .unwrap();
        assert!(matches!(cmd, ClientCommand::Auth { .. }));
    }

    #[test]
    fn become_captain_team_name_is_optional() {
        let cmd: ClientCommand = serde_json::from_str(r#"{"type":"become_captain"}"#).unwrap();
        match cmd {
            ClientCommand::BecomeCaptain { team_name } => assert!(team_name.is_none()),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
