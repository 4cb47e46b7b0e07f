use axum::{
    extract::{
        Extension,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

use crate::config::DraftConfig;
use crate::dto::draft_dto::SharedDraftSession;
use crate::dto::message_dto::{
    AuthResponse, CaptainResponse, CaptainsUpdate, ClientCommand, ConnectedUsersUpdate,
    DraftUpdate, ErrorReply,
};
use crate::error::DraftError;
use crate::services::connections::SharedConnections;
use crate::services::{directory, export};

/* Fan-out helpers. Send failures mean nobody is listening, which is fine. */

pub async fn send_draft_update(tx: &broadcast::Sender<String>, session: &SharedDraftSession) {
    let snapshot = session.read().await.snapshot();
    match serde_json::to_string(&DraftUpdate::new(snapshot)) {
        Ok(json) => {
            let _ = tx.send(json);
        }
        Err(e) => {
            error!("Failed to serialize draft update: {}", e);
        }
    }
}

pub async fn send_captains_update(tx: &broadcast::Sender<String>, session: &SharedDraftSession) {
    let update = {
        let guard = session.read().await;
        CaptainsUpdate::from_session(&guard)
    };
    match serde_json::to_string(&update) {
        Ok(json) => {
            let _ = tx.send(json);
        }
        Err(e) => {
            error!("Failed to serialize captain update: {}", e);
        }
    }
}

pub async fn send_connected_users(tx: &broadcast::Sender<String>, connections: &SharedConnections) {
    let users = connections.read().await.display_names();
    let update = ConnectedUsersUpdate {
        r#type: "connected_users".to_string(),
        count: users.len(),
        users,
    };
    match serde_json::to_string(&update) {
        Ok(json) => {
            let _ = tx.send(json);
        }
        Err(e) => {
            error!("Failed to serialize connected users update: {}", e);
        }
    }
}

/// Reply to a single connection, never broadcast.
async fn reply<T: Serialize>(connections: &SharedConnections, conn_id: u64, payload: &T) {
    match serde_json::to_string(payload) {
        Ok(json) => connections.read().await.send_to(conn_id, json),
        Err(e) => error!("Failed to serialize reply for connection {}: {}", conn_id, e),
    }
}

/* The session socket itself */

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Extension(tx): Extension<broadcast::Sender<String>>,
    Extension(session): Extension<SharedDraftSession>,
    Extension(connections): Extension<SharedConnections>,
    Extension(db): Extension<SqlitePool>,
    Extension(config): Extension<DraftConfig>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, tx, session, connections, db, config))
}

async fn handle_socket(
    socket: WebSocket,
    tx: broadcast::Sender<String>,
    session: SharedDraftSession,
    connections: SharedConnections,
    db: SqlitePool,
    config: DraftConfig,
) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = tx.subscribe();
    let (direct_tx, mut direct_rx) = mpsc::unbounded_channel::<String>();
    let conn_id = connections.write().await.register(direct_tx);
    info!("Connection {} opened", conn_id);

    // One writer task per socket, merging the session-wide broadcast with
    // this connection's direct replies. A slow client lags and drops
    // broadcast frames; it never holds up a pick.
    let send_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                broadcasted = rx.recv() => match broadcasted {
                    Ok(msg) => msg,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Connection send task lagged, skipped {} updates", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                direct = direct_rx.recv() => match direct {
                    Some(msg) => msg,
                    None => break,
                },
            };
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        if let Message::Text(text) = message {
            match serde_json::from_str::<ClientCommand>(&text) {
                Ok(command) => {
                    dispatch(conn_id, command, &tx, &session, &connections, &db, &config).await;
                }
                Err(e) => {
                    warn!("Connection {} sent an unreadable command: {}", conn_id, e);
                    let bad_request = ErrorReply {
                        r#type: "error".to_string(),
                        code: "bad_request".to_string(),
                        message: "could not parse command".to_string(),
                    };
                    reply(&connections, conn_id, &bad_request).await;
                }
            }
        }
    }

    // Disconnect keeps the captain slot; only liveness flips.
    send_task.abort();
    let removed = connections.write().await.remove(conn_id);
    if let Some(conn) = removed {
        if let Some(user_id) = conn.user_id {
            let was_captain = session.write().await.set_captain_active(&user_id, false);
            if was_captain {
                send_captains_update(&tx, &session).await;
            }
        }
    }
    send_connected_users(&tx, &connections).await;
    info!("Connection {} closed", conn_id);
}

async fn dispatch(
    conn_id: u64,
    command: ClientCommand,
    tx: &broadcast::Sender<String>,
    session: &SharedDraftSession,
    connections: &SharedConnections,
    db: &SqlitePool,
    config: &DraftConfig,
) {
    match command {
        ClientCommand::Auth { user_id } => {
            handle_auth(conn_id, user_id, tx, session, connections, db).await;
        }
        ClientCommand::Heartbeat => {
            // Resync for the requester only; nobody else re-renders.
            let snapshot = session.read().await.snapshot();
            reply(connections, conn_id, &DraftUpdate::new(snapshot)).await;
        }
        ClientCommand::BecomeCaptain { team_name } => {
            handle_become_captain(conn_id, team_name, tx, session, connections).await;
        }
        ClientCommand::SetAutodraft { enabled } => {
            handle_set_autodraft(conn_id, enabled, tx, session, connections, config).await;
        }
        ClientCommand::MakePick { player_id } => {
            handle_make_pick(conn_id, player_id, tx, session, connections, config).await;
        }
        ClientCommand::CaptainStatus => {
            let board = {
                let guard = session.read().await;
                CaptainsUpdate::from_session(&guard)
            };
            reply(connections, conn_id, &board).await;
            send_captains_update(tx, session).await;
        }
    }
}

async fn handle_auth(
    conn_id: u64,
    user_id: String,
    tx: &broadcast::Sender<String>,
    session: &SharedDraftSession,
    connections: &SharedConnections,
    db: &SqlitePool,
) {
    // Identity is trusted as asserted; the directory only supplies the
    // display name, and only at this moment.
    let display_name = match directory::resolve_profile(db, &user_id).await {
        Ok(Some(profile)) => profile.full_name(),
        Ok(None) => {
            warn!("No directory entry for {}; falling back to the id", user_id);
            user_id.clone()
        }
        Err(e) => {
            error!("Directory lookup failed for {}: {}", user_id, e);
            user_id.clone()
        }
    };

    connections
        .write()
        .await
        .authenticate(conn_id, user_id.clone(), display_name.clone());
    info!("Connection {} authenticated as {}", conn_id, display_name);

    // A returning captain comes back alive with slot and roster intact.
    let reconnected = session.write().await.set_captain_active(&user_id, true);

    let response = AuthResponse {
        r#type: "auth_response".to_string(),
        success: true,
        display_name,
    };
    reply(connections, conn_id, &response).await;
    let snapshot = session.read().await.snapshot();
    reply(connections, conn_id, &DraftUpdate::new(snapshot)).await;

    send_connected_users(tx, connections).await;
    if reconnected {
        send_captains_update(tx, session).await;
    }
}

async fn handle_become_captain(
    conn_id: u64,
    team_name: Option<String>,
    tx: &broadcast::Sender<String>,
    session: &SharedDraftSession,
    connections: &SharedConnections,
) {
    let identity = {
        let guard = connections.read().await;
        guard
            .user_id(conn_id)
            .map(str::to_string)
            .zip(guard.display_name(conn_id).map(str::to_string))
    };
    let Some((user_id, display_name)) = identity else {
        let response = CaptainResponse {
            r#type: "captain_response".to_string(),
            success: false,
            message: "authenticate before requesting a captain slot".to_string(),
        };
        reply(connections, conn_id, &response).await;
        return;
    };

    let result = session
        .write()
        .await
        .request_captaincy(&user_id, &display_name, team_name, Utc::now());
    match result {
        Ok(outcome) => {
            let response = CaptainResponse {
                r#type: "captain_response".to_string(),
                success: true,
                message: "You are now a captain".to_string(),
            };
            reply(connections, conn_id, &response).await;
            send_captains_update(tx, session).await;
            if outcome.started {
                send_draft_update(tx, session).await;
            }
        }
        Err(err) => {
            warn!("Captaincy request from {} rejected: {}", user_id, err);
            let response = CaptainResponse {
                r#type: "captain_response".to_string(),
                success: false,
                message: err.to_string(),
            };
            reply(connections, conn_id, &response).await;
        }
    }
}

async fn handle_set_autodraft(
    conn_id: u64,
    enabled: bool,
    tx: &broadcast::Sender<String>,
    session: &SharedDraftSession,
    connections: &SharedConnections,
    config: &DraftConfig,
) {
    let Some(user_id) = connections.read().await.user_id(conn_id).map(str::to_string) else {
        reply(connections, conn_id, &ErrorReply::from_error(DraftError::NotFound)).await;
        return;
    };

    let result = session.write().await.set_autodraft(&user_id, enabled, Utc::now());
    match result {
        Ok(()) => {
            // Everyone sees the toggle, and any immediate autodraft pick.
            send_draft_update(tx, session).await;
            send_captains_update(tx, session).await;
            // Enabling mid-turn can cascade straight to the end.
            export::maybe_export(tx, session, config).await;
        }
        Err(err) => {
            warn!("Autodraft toggle from {} rejected: {}", user_id, err);
            reply(connections, conn_id, &ErrorReply::from_error(err)).await;
        }
    }
}

async fn handle_make_pick(
    conn_id: u64,
    player_id: String,
    tx: &broadcast::Sender<String>,
    session: &SharedDraftSession,
    connections: &SharedConnections,
    config: &DraftConfig,
) {
    let Some(user_id) = connections.read().await.user_id(conn_id).map(str::to_string) else {
        reply(connections, conn_id, &ErrorReply::from_error(DraftError::NotFound)).await;
        return;
    };

    let result = session.write().await.make_pick(&user_id, &player_id, Utc::now());
    match result {
        Ok(()) => {
            send_draft_update(tx, session).await;
            export::maybe_export(tx, session, config).await;
        }
        Err(err) => {
            // The loser of a pick race lands here; their client re-renders
            // from the next snapshot.
            warn!("Pick of {} by {} rejected: {}", player_id, user_id, err);
            reply(connections, conn_id, &ErrorReply::from_error(err)).await;
        }
    }
}
