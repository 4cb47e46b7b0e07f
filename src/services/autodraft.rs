use crate::dto::player_dto::Player;
use crate::services::pool::PlayerPool;

/// Deterministic fallback selection: the first player in the pool's stable
/// iteration order, i.e. the one who has been waiting longest. Identical
/// pool state always yields the identical pick.
///
/// Returns `None` only when the pool is empty, which the scheduler's
/// pool-derived round cap makes unreachable during a live turn.
pub fn resolve(pool: &PlayerPool) -> Option<&Player> {
    pool.snapshot().first()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::player_dto::Player;

    fn player(id: &str) -> Player {
        Player {
            id: id.to_string(),
            first_name: id.to_string(),
            last_name: "Test".to_string(),
            nickname: None,
            positions: vec![],
            foot_pref: None,
            club_team: None,
            graduation_year: None,
        }
    }

    #[test]
    fn resolves_the_longest_waiting_player() {
        let mut pool = PlayerPool::new();
        pool.load(vec![player("p1"), player("p2"), player("p3")]).unwrap();

        assert_eq!(resolve(&pool).unwrap().id, "p1");
        // Same state, same answer.
        assert_eq!(resolve(&pool).unwrap().id, "p1");

        pool.take("p1").unwrap();
        assert_eq!(resolve(&pool).unwrap().id, "p2");
    }

    #[test]
    fn empty_pool_yields_nothing() {
        let pool = PlayerPool::new();
        assert!(resolve(&pool).is_none());
    }
}
