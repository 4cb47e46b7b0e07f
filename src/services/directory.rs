use sqlx::{FromRow, SqlitePool};
use tracing::warn;

use crate::dto::player_dto::{FootPreference, Player, Position};

/// Row shape of the league's user directory. The directory is owned by the
/// registration system; this process only ever reads it: once at session
/// start for the pool, once per authentication for the display name.
#[derive(Debug, FromRow)]
struct MemberRow {
    id: String,
    first_name: String,
    last_name: String,
    nickname: Option<String>,
    positions: Option<String>,
    foot_pref: Option<String>,
    club_team: Option<String>,
    graduation_year: Option<i64>,
}

#[derive(Debug, FromRow)]
pub struct MemberProfile {
    pub first_name: String,
    pub last_name: String,
}

impl MemberProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// All registered entrants, in a stable order, ready for the session pool.
pub async fn load_eligible_players(db: &SqlitePool) -> Result<Vec<Player>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MemberRow>(
        r#"
        SELECT id, first_name, last_name, nickname, positions, foot_pref,
               club_team, graduation_year
        FROM users
        WHERE registered = 1
        ORDER BY last_name, first_name
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(member_to_player).collect())
}

/// Display fields for one user, looked up at authentication time.
pub async fn resolve_profile(
    db: &SqlitePool,
    user_id: &str,
) -> Result<Option<MemberProfile>, sqlx::Error> {
    sqlx::query_as::<_, MemberProfile>("SELECT first_name, last_name FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(db)
        .await
}

fn member_to_player(row: MemberRow) -> Player {
    let positions = parse_positions(row.positions.as_deref(), &row.id);
    Player {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        nickname: row.nickname.filter(|n| !n.trim().is_empty()),
        positions,
        foot_pref: row.foot_pref.as_deref().and_then(FootPreference::parse),
        club_team: row.club_team.filter(|c| !c.trim().is_empty()),
        graduation_year: row.graduation_year.map(|y| y as i32),
    }
}

/// The registration form stores positions as a JSON array of codes; some
/// legacy rows carry a comma-separated string instead. Unknown codes are
/// skipped rather than failing the player, and at most three survive.
fn parse_positions(raw: Option<&str>, member_id: &str) -> Vec<Position> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let codes: Vec<String> = match serde_json::from_str(raw) {
        Ok(codes) => codes,
        Err(_) => raw.split(',').map(str::to_string).collect(),
    };

    let mut positions = Vec::new();
    for code in &codes {
        match Position::parse(code) {
            Some(position) if !positions.contains(&position) => positions.push(position),
            Some(_) => {}
            None => warn!("Skipping unknown position {:?} for member {}", code, member_id),
        }
    }
    positions.truncate(3);
    positions
}
