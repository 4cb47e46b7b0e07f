use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{error, info};
use yup_oauth2::{ServiceAccountAuthenticator, read_service_account_key};

use crate::config::DraftConfig;
use crate::dto::captain_dto::Captain;
use crate::dto::draft_dto::SharedDraftSession;
use crate::dto::message_dto::ExportComplete;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not read Google credentials: {0}")]
    Credentials(#[from] std::io::Error),
    #[error("Google auth error: {0}")]
    Auth(#[from] yup_oauth2::Error),
    #[error("missing token string")]
    MissingToken,
    #[error("Sheets request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Sheets API returned status {0}")]
    Api(reqwest::StatusCode),
}

/// If the draft just completed, ship the rosters to the configured
/// spreadsheet in a background task. Runs at most once per session and
/// never touches draft state; a failed export is only a broadcast away
/// from being visible, not a draft problem.
pub async fn maybe_export(
    tx: &broadcast::Sender<String>,
    session: &SharedDraftSession,
    config: &DraftConfig,
) {
    let Some(rosters) = session.write().await.take_export_once() else {
        return;
    };
    let Some(spreadsheet_id) = config.export_spreadsheet_id.clone() else {
        info!("Draft complete; no export spreadsheet configured");
        return;
    };

    info!("Draft complete; exporting rosters to spreadsheet {}", spreadsheet_id);
    let tx = tx.clone();
    tokio::spawn(async move {
        let outcome = match export_rosters(&spreadsheet_id, &rosters).await {
            Ok(url) => ExportComplete {
                r#type: "export_complete".to_string(),
                status: "success".to_string(),
                message: "Draft complete! Rosters have been exported.".to_string(),
                url: Some(url),
            },
            Err(e) => {
                error!("Roster export failed: {}", e);
                ExportComplete {
                    r#type: "export_complete".to_string(),
                    status: "error".to_string(),
                    message: format!("Roster export failed: {}", e),
                    url: None,
                }
            }
        };
        if let Ok(payload) = serde_json::to_string(&outcome) {
            let _ = tx.send(payload);
        }
    });
}

/// Append one block per team to the spreadsheet and return its URL.
async fn export_rosters(
    spreadsheet_id: &str,
    captains: &[Captain],
) -> Result<String, ExportError> {
    let service_account_key = read_service_account_key("credentials.json").await?;
    let auth = ServiceAccountAuthenticator::builder(service_account_key)
        .build()
        .await?;
    let token = auth
        .token(&["https://www.googleapis.com/auth/spreadsheets"])
        .await?;

    let url = format!(
        "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}:append?valueInputOption=RAW",
        spreadsheet_id, "Sheet1!A1"
    );

    let client = Client::new();
    let response = client
        .post(&url)
        .bearer_auth(token.token().ok_or(ExportError::MissingToken)?)
        .json(&json!({ "values": roster_rows(captains) }))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ExportError::Api(response.status()));
    }
    Ok(format!(
        "https://docs.google.com/spreadsheets/d/{}",
        spreadsheet_id
    ))
}

fn roster_rows(captains: &[Captain]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for captain in captains {
        rows.push(vec![
            captain.team_name.clone(),
            format!("Captain: {}", captain.display_name),
        ]);
        for player in &captain.roster {
            let positions = player
                .positions
                .iter()
                .map(|p| format!("{:?}", p))
                .collect::<Vec<_>>()
                .join("/");
            rows.push(vec![String::new(), player.full_name(), positions]);
        }
        rows.push(Vec::new());
    }
    rows
}
