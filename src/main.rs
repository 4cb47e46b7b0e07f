use std::sync::Arc;
use std::time::Duration;

use axum::{Extension, Router, routing::get};
use chrono::Utc;
use dotenv::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::{RwLock, broadcast};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cupdraft::config::DraftConfig;
use cupdraft::dto::draft_dto::SharedDraftSession;
use cupdraft::routes::state;
use cupdraft::services::connections::{ConnectionRegistry, SharedConnections};
use cupdraft::services::session::DraftSession;
use cupdraft::services::{directory, export, websocket};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = DraftConfig::from_env();

    let db = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Could not connect to the league directory database");
    info!("Connected to the league directory.");

    // The pool is loaded once, before any captain can claim a slot.
    let mut session = DraftSession::new(&config);
    match directory::load_eligible_players(&db).await {
        Ok(players) => {
            if players.is_empty() {
                warn!("No registered players in the directory; the pool is empty");
            }
            session
                .load_players(players)
                .expect("session has not started yet");
        }
        Err(e) => error!("Failed to load players from the directory: {}", e),
    }
    let session: SharedDraftSession = Arc::new(RwLock::new(session));

    let (tx, _) = broadcast::channel::<String>(256);
    let connections: SharedConnections = Arc::new(RwLock::new(ConnectionRegistry::new()));

    // Deadline checks are ordinary commands: the tick takes the same
    // session lock as every client pick, so expiry can never interleave
    // with one.
    {
        let session = session.clone();
        let tx = tx.clone();
        let config = config.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(config.tick_seconds.max(1)));
            let mut ticks: u64 = 0;
            loop {
                tick.tick().await;
                let expired = session.write().await.expire_turn_if_due(Utc::now());
                if expired {
                    websocket::send_draft_update(&tx, &session).await;
                    export::maybe_export(&tx, &session, &config).await;
                }
                ticks += 1;
                if config.captain_refresh_ticks > 0 && ticks % config.captain_refresh_ticks == 0 {
                    websocket::send_captains_update(&tx, &session).await;
                }
            }
        });
    }

    let app = Router::new()
        .route("/ws", get(websocket::websocket_handler))
        .route("/state", get(state::get_state))
        .route("/captains", get(state::get_captains))
        .layer(Extension(session))
        .layer(Extension(tx))
        .layer(Extension(connections))
        .layer(Extension(db))
        .layer(Extension(config.clone()))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Could not bind the draft listener");
    info!("Draft coordinator listening on {}", config.bind_addr);
    axum::serve(listener, app).await.unwrap();
}
