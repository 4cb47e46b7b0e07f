use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::dto::draft_dto::SharedDraftSession;
use crate::dto::message_dto::CaptainsUpdate;

/// REST resync for clients that missed broadcasts (or for anything that
/// just wants to look without holding a socket open).
pub async fn get_state(Extension(session): Extension<SharedDraftSession>) -> impl IntoResponse {
    let snapshot = session.read().await.snapshot();
    (StatusCode::OK, Json(snapshot))
}

pub async fn get_captains(Extension(session): Extension<SharedDraftSession>) -> impl IntoResponse {
    let board = {
        let guard = session.read().await;
        CaptainsUpdate::from_session(&guard)
    };
    (StatusCode::OK, Json(board))
}
