use std::env;

use tracing::warn;

/// Runtime configuration, read once at startup from the environment
/// (`.env` is loaded in main before this runs).
#[derive(Debug, Clone)]
pub struct DraftConfig {
    /// Address the HTTP/WebSocket listener binds to.
    pub bind_addr: String,
    /// SQLite database holding the league's user directory.
    pub database_url: String,
    /// Number of captain slots. The draft starts the moment they are all
    /// claimed.
    pub captain_capacity: usize,
    /// Seconds a captain has to pick before autodraft takes over.
    pub pick_seconds: i64,
    /// Optional per-captain roster cap. `None` drafts until the pool is
    /// empty.
    pub roster_cap: Option<usize>,
    /// Interval of the deadline-check timer.
    pub tick_seconds: u64,
    /// Re-broadcast the captain board every this many ticks.
    pub captain_refresh_ticks: u64,
    /// Shuffle the seat order once at draft start instead of using
    /// slot-claim order.
    pub shuffle_order: bool,
    /// Spreadsheet to export completed rosters to. `None` disables export.
    pub export_spreadsheet_id: Option<String>,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            database_url: "sqlite://./data/league.db".to_string(),
            captain_capacity: 6,
            pick_seconds: 180,
            roster_cap: None,
            tick_seconds: 1,
            captain_refresh_ticks: 10,
            shuffle_order: false,
            export_spreadsheet_id: None,
        }
    }
}

impl DraftConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env_or("DRAFT_BIND_ADDR", defaults.bind_addr),
            database_url: env_or("DATABASE_URL", defaults.database_url),
            captain_capacity: parse_or("DRAFT_CAPTAIN_CAPACITY", defaults.captain_capacity),
            pick_seconds: parse_or("DRAFT_PICK_SECONDS", defaults.pick_seconds),
            roster_cap: env::var("DRAFT_ROSTER_CAP").ok().and_then(|v| match v.parse() {
                Ok(n) => Some(n),
                Err(_) => {
                    warn!("Ignoring unparseable DRAFT_ROSTER_CAP value: {}", v);
                    None
                }
            }),
            tick_seconds: parse_or("DRAFT_TICK_SECONDS", defaults.tick_seconds),
            captain_refresh_ticks: parse_or(
                "DRAFT_CAPTAIN_REFRESH_TICKS",
                defaults.captain_refresh_ticks,
            ),
            shuffle_order: env::var("DRAFT_SHUFFLE_ORDER")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.shuffle_order),
            export_spreadsheet_id: env::var("DRAFT_EXPORT_SPREADSHEET_ID")
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                warn!("Ignoring unparseable {} value: {}", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}
