use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::rng;
use rand::seq::SliceRandom;
use tracing::{error, info};

use crate::config::DraftConfig;
use crate::dto::captain_dto::Captain;
use crate::dto::draft_dto::{DraftSnapshot, LastPick};
use crate::dto::player_dto::Player;
use crate::error::DraftError;
use crate::services::autodraft;
use crate::services::captains::CaptainRegistry;
use crate::services::pool::PlayerPool;
use crate::services::scheduler::{DraftPhase, TurnScheduler, snake_order};

/// What a successful captaincy claim did to the session.
#[derive(Debug, Clone, Copy)]
pub struct ClaimOutcome {
    /// True when this claim filled the last slot and started the draft.
    pub started: bool,
}

/// The aggregate root. Exclusively owns the pool, the captain registry and
/// the scheduler; every command validates before it mutates, so a rejected
/// command leaves no trace. All mutation happens under the session's write
/// lock (`SharedDraftSession`), which is the serialization point that keeps
/// "take a player", "advance the turn" and "whose turn is it" from ever
/// interleaving across two pickers.
pub struct DraftSession {
    pool: PlayerPool,
    captains: CaptainRegistry,
    scheduler: TurnScheduler,
    last_pick: Option<LastPick>,
    roster_cap: Option<usize>,
    shuffle_order: bool,
    export_dispatched: bool,
}

impl DraftSession {
    pub fn new(config: &DraftConfig) -> Self {
        Self {
            pool: PlayerPool::new(),
            captains: CaptainRegistry::new(config.captain_capacity),
            scheduler: TurnScheduler::new(config.pick_seconds),
            last_pick: None,
            roster_cap: config.roster_cap,
            shuffle_order: config.shuffle_order,
            export_dispatched: false,
        }
    }

    /// Load the draftable pool from the external directory. Only valid
    /// before the session starts.
    pub fn load_players(&mut self, players: Vec<Player>) -> Result<(), DraftError> {
        let count = players.len();
        self.pool.load(players)?;
        info!("Loaded {} draftable players into the pool", count);
        Ok(())
    }

    /// Claim a captain slot. Filling the final slot freezes the captain
    /// count, computes the pick order, and starts the clock.
    pub fn request_captaincy(
        &mut self,
        user_id: &str,
        display_name: &str,
        team_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, DraftError> {
        self.captains.claim(user_id, display_name, team_name)?;
        info!(
            "{} claimed captain slot {} of {}",
            display_name,
            self.captains.len(),
            self.captains.capacity()
        );

        if self.captains.is_full() && self.scheduler.phase() == DraftPhase::NotStarted {
            self.start_draft(now);
            return Ok(ClaimOutcome { started: true });
        }
        Ok(ClaimOutcome { started: false })
    }

    fn start_draft(&mut self, now: DateTime<Utc>) {
        let captain_count = self.captains.len();
        let mut seats: Vec<usize> = (0..captain_count).collect();
        if self.shuffle_order {
            seats.shuffle(&mut rng());
        }

        let total_picks = match self.roster_cap {
            Some(cap) => self.pool.len().min(cap * captain_count),
            None => self.pool.len(),
        };
        let pick_order: Vec<usize> = snake_order(captain_count, total_picks)
            .into_iter()
            .map(|seat| seats[seat])
            .collect();

        self.pool.seal();
        self.scheduler.start(pick_order);
        info!(
            "Draft started with {} captains and {} total picks",
            captain_count, total_picks
        );
        self.begin_turn(now);
    }

    /// Open the current turn: chain through consecutive autodrafting
    /// captains within this same serialized call, then arm the deadline for
    /// the first captain who actually has to think. An autodrafted turn
    /// never gets a deadline.
    fn begin_turn(&mut self, now: DateTime<Utc>) {
        while let Some(slot) = self.scheduler.current_slot() {
            let captain = self
                .captains
                .by_slot(slot)
                .expect("pick order references a claimed slot");
            if !captain.autodraft {
                self.scheduler.open_deadline(now);
                break;
            }
            let captain_name = captain.display_name.clone();

            let Some(pick_id) = autodraft::resolve(&self.pool).map(|p| p.id.clone()) else {
                // Unreachable: the order length is derived from the pool.
                debug_assert!(false, "autodraft ran against an empty pool");
                error!("Autodraft found an empty pool mid-draft; halting turn");
                break;
            };
            let player = self
                .pool
                .take(&pick_id)
                .expect("resolved player is in the pool");
            info!("Autodraft pick for {}: {}", captain_name, player.full_name());
            self.commit_pick(slot, player, true);
        }
    }

    /// Append the player, record the last pick, and advance the cursor.
    /// Exactly one increment per committed pick.
    fn commit_pick(&mut self, slot: usize, player: Player, auto: bool) {
        let captain = self
            .captains
            .by_slot_mut(slot)
            .expect("pick order references a claimed slot");
        self.last_pick = Some(LastPick {
            captain_id: captain.user_id.clone(),
            captain_name: captain.display_name.clone(),
            player: player.clone(),
            auto,
        });
        captain.roster.push(player);
        self.scheduler.advance();
    }

    /// A captain's own pick. May cascade through autodrafting captains
    /// before returning.
    pub fn make_pick(
        &mut self,
        user_id: &str,
        player_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DraftError> {
        let Some(slot) = self.scheduler.current_slot() else {
            return Err(DraftError::DraftNotStarted);
        };
        let on_the_clock = self
            .captains
            .by_slot(slot)
            .expect("pick order references a claimed slot");
        if on_the_clock.user_id != user_id {
            return Err(DraftError::NotYourTurn);
        }

        // The single race-sensitive step: whoever reaches it second finds
        // the player gone and nothing else changed.
        let player = self
            .pool
            .take(player_id)
            .map_err(|_| DraftError::PlayerUnavailable)?;
        info!(
            "{} picked {}",
            on_the_clock.display_name,
            player.full_name()
        );
        self.commit_pick(slot, player, false);
        self.begin_turn(now);
        Ok(())
    }

    /// Toggle a captain's autodraft preference. Enabling it during their
    /// own turn fires the automatic pick immediately.
    pub fn set_autodraft(
        &mut self,
        user_id: &str,
        enabled: bool,
        now: DateTime<Utc>,
    ) -> Result<(), DraftError> {
        self.captains.set_autodraft(user_id, enabled)?;
        info!("Autodraft {} for {}", if enabled { "enabled" } else { "disabled" }, user_id);

        if enabled {
            if let Some(slot) = self.scheduler.current_slot() {
                if self.captains.by_slot(slot).is_some_and(|c| c.user_id == user_id) {
                    self.begin_turn(now);
                }
            }
        }
        Ok(())
    }

    /// Connection liveness for a captain. Unknown users are fine; most
    /// participants never hold a slot.
    pub fn set_captain_active(&mut self, user_id: &str, active: bool) -> bool {
        self.captains.set_active(user_id, active).is_ok()
    }

    /// Deadline lapse: one autodraft pick on the current captain's behalf,
    /// one cursor increment, then any cascade. Returns whether state
    /// changed (i.e. a broadcast is due).
    pub fn expire_turn_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if !self.scheduler.is_expired(now) {
            return false;
        }
        let slot = self
            .scheduler
            .current_slot()
            .expect("expired scheduler has a current slot");
        let captain_name = self
            .captains
            .by_slot(slot)
            .expect("pick order references a claimed slot")
            .display_name
            .clone();
        let Some(pick_id) = autodraft::resolve(&self.pool).map(|p| p.id.clone()) else {
            debug_assert!(false, "deadline expired against an empty pool");
            error!("Pick deadline expired but the pool is empty");
            return false;
        };
        let player = self
            .pool
            .take(&pick_id)
            .expect("resolved player is in the pool");
        info!(
            "Pick deadline lapsed; autodrafting {} for {}",
            player.full_name(),
            captain_name
        );
        self.commit_pick(slot, player, true);
        self.begin_turn(now);
        true
    }

    pub fn is_captain(&self, user_id: &str) -> bool {
        self.captains.find(user_id).is_some()
    }

    pub fn captains(&self) -> &CaptainRegistry {
        &self.captains
    }

    pub fn phase(&self) -> DraftPhase {
        self.scheduler.phase()
    }

    /// Hand out the completed rosters exactly once, for the export task.
    pub fn take_export_once(&mut self) -> Option<Vec<Captain>> {
        if self.scheduler.phase() == DraftPhase::Completed && !self.export_dispatched {
            self.export_dispatched = true;
            return Some(self.captains.list().to_vec());
        }
        None
    }

    /// Assemble the full broadcast payload from current state.
    pub fn snapshot(&self) -> DraftSnapshot {
        let current = self
            .scheduler
            .current_slot()
            .and_then(|slot| self.captains.by_slot(slot));
        let next = self
            .scheduler
            .next_slot()
            .and_then(|slot| self.captains.by_slot(slot));

        let mut teams = BTreeMap::new();
        let mut autodraft_preferences = BTreeMap::new();
        for captain in self.captains.list() {
            teams.insert(captain.user_id.clone(), captain.roster.clone());
            autodraft_preferences.insert(captain.user_id.clone(), captain.autodraft);
        }

        DraftSnapshot {
            draft_started: self.scheduler.phase() != DraftPhase::NotStarted,
            completed: self.scheduler.phase() == DraftPhase::Completed,
            current_captain_id: current.map(|c| c.user_id.clone()),
            next_captain_id: next.map(|c| c.user_id.clone()),
            current_captain: current.map(|c| c.display_name.clone()),
            next_captain: next.map(|c| c.display_name.clone()),
            pick_expires_at: self.scheduler.deadline(),
            last_pick: self.last_pick.clone(),
            available_pool: self.pool.snapshot().to_vec(),
            teams,
            autodraft_preferences,
            captains: self.captains.summaries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn config(capacity: usize, pick_seconds: i64, roster_cap: Option<usize>) -> DraftConfig {
        DraftConfig {
            captain_capacity: capacity,
            pick_seconds,
            roster_cap,
            shuffle_order: false,
            ..DraftConfig::default()
        }
    }

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

    fn pool_of(n: usize) -> Vec<Player> {
        (1..=n).map(|i| player(&format!("p{}", i))).collect()
    }

    #[test]
    fn two_captain_snake_draft_runs_to_completion() {
        let now = Utc::now();
        let mut session = DraftSession::new(&config(2, 60, None));
        session.load_players(pool_of(4)).unwrap();

        let outcome = session
            .request_captaincy("a", "Ana Reyes", None, now)
            .unwrap();
        assert!(!outcome.started);
        assert_eq!(session.phase(), DraftPhase::NotStarted);

        let outcome = session
            .request_captaincy("b", "Ben Cho", None, now)
            .unwrap();
        assert!(outcome.started);
        assert_eq!(session.phase(), DraftPhase::InProgress);

        // Order for 2 captains over 4 picks is A, B, B, A.
        let snap = session.snapshot();
        assert_eq!(snap.current_captain_id.as_deref(), Some("a"));
        assert_eq!(snap.next_captain_id.as_deref(), Some("b"));
        assert!(snap.pick_expires_at.is_some());

        session.make_pick("a", "p1", now).unwrap();
        let snap = session.snapshot();
        assert_eq!(snap.teams["a"].len(), 1);
        assert_eq!(snap.current_captain_id.as_deref(), Some("b"));
        assert_eq!(snap.next_captain_id.as_deref(), Some("b"));

        session.make_pick("b", "p2", now).unwrap();
        // Snake: B picks twice in a row.
        assert_eq!(
            session.snapshot().current_captain_id.as_deref(),
            Some("b")
        );

        session.make_pick("b", "p3", now).unwrap();
        assert_eq!(
            session.snapshot().current_captain_id.as_deref(),
            Some("a")
        );

        session.make_pick("a", "p4", now).unwrap();
        let snap = session.snapshot();
        assert_eq!(session.phase(), DraftPhase::Completed);
        assert!(snap.completed);
        assert!(snap.available_pool.is_empty());
        let roster_a: Vec<&str> = snap.teams["a"].iter().map(|p| p.id.as_str()).collect();
        let roster_b: Vec<&str> = snap.teams["b"].iter().map(|p| p.id.as_str()).collect();
        assert_eq!(roster_a, vec!["p1", "p4"]);
        assert_eq!(roster_b, vec!["p2", "p3"]);
    }

    #[test]
    fn picks_are_rejected_before_start_and_out_of_turn() {
        let now = Utc::now();
        let mut session = DraftSession::new(&config(2, 60, None));
        session.load_players(pool_of(4)).unwrap();
        session.request_captaincy("a", "Ana Reyes", None, now).unwrap();

        assert_eq!(
            session.make_pick("a", "p1", now),
            Err(DraftError::DraftNotStarted)
        );

        session.request_captaincy("b", "Ben Cho", None, now).unwrap();
        assert_eq!(
            session.make_pick("b", "p1", now),
            Err(DraftError::NotYourTurn)
        );
        // Nothing was mutated by the rejected pick.
        assert_eq!(session.snapshot().available_pool.len(), 4);
    }

    #[test]
    fn a_taken_player_is_unavailable_to_the_next_picker() {
        let now = Utc::now();
        let mut session = DraftSession::new(&config(2, 60, None));
        session.load_players(pool_of(4)).unwrap();
        session.request_captaincy("a", "Ana Reyes", None, now).unwrap();
        session.request_captaincy("b", "Ben Cho", None, now).unwrap();

        session.make_pick("a", "p2", now).unwrap();
        assert_eq!(
            session.make_pick("b", "p2", now),
            Err(DraftError::PlayerUnavailable)
        );
        // The loser's roster is untouched and it is still their turn.
        let snap = session.snapshot();
        assert!(snap.teams["b"].is_empty());
        assert_eq!(snap.current_captain_id.as_deref(), Some("b"));
    }

    #[test]
    fn roster_cap_bounds_the_pick_order() {
        let now = Utc::now();
        let mut session = DraftSession::new(&config(2, 60, Some(1)));
        session.load_players(pool_of(4)).unwrap();
        session.request_captaincy("a", "Ana Reyes", None, now).unwrap();
        session.request_captaincy("b", "Ben Cho", None, now).unwrap();

        session.make_pick("a", "p1", now).unwrap();
        session.make_pick("b", "p2", now).unwrap();
        // Two players remain but every roster is full.
        assert_eq!(session.phase(), DraftPhase::Completed);
        assert_eq!(session.snapshot().available_pool.len(), 2);
    }

    #[test]
    fn enabling_autodraft_mid_turn_picks_immediately() {
        let now = Utc::now();
        let mut session = DraftSession::new(&config(2, 60, None));
        session.load_players(pool_of(4)).unwrap();
        session.request_captaincy("a", "Ana Reyes", None, now).unwrap();
        session.request_captaincy("b", "Ben Cho", None, now).unwrap();

        session.set_autodraft("a", true, now).unwrap();
        let snap = session.snapshot();
        // The longest-waiting player went to A without a client pick.
        assert_eq!(snap.teams["a"][0].id, "p1");
        assert_eq!(snap.current_captain_id.as_deref(), Some("b"));
        let last = snap.last_pick.unwrap();
        assert!(last.auto);
        assert_eq!(last.captain_id, "a");
    }

    #[test]
    fn autodraft_chain_cascades_through_consecutive_turns() {
        let now = Utc::now();
        let mut session = DraftSession::new(&config(2, 60, None));
        session.load_players(pool_of(4)).unwrap();
        session.request_captaincy("a", "Ana Reyes", None, now).unwrap();
        // Flag set before the draft starts; no pick can fire yet.
        session.set_autodraft("a", true, now).unwrap();
        assert_eq!(session.snapshot().available_pool.len(), 4);

        session.request_captaincy("b", "Ben Cho", None, now).unwrap();
        // Start chained straight through A's first pick to B's turn.
        let snap = session.snapshot();
        assert_eq!(snap.teams["a"].len(), 1);
        assert_eq!(snap.current_captain_id.as_deref(), Some("b"));
        assert!(snap.pick_expires_at.is_some());

        // B flips autodraft too: B, B, then A all resolve in one turn.
        session.set_autodraft("b", true, now).unwrap();
        assert_eq!(session.phase(), DraftPhase::Completed);
        let snap = session.snapshot();
        assert_eq!(snap.teams["a"].len(), 2);
        assert_eq!(snap.teams["b"].len(), 2);
        assert!(snap.available_pool.is_empty());
        assert_eq!(snap.pick_expires_at, None);
    }

    #[test]
    fn deadline_expiry_autodrafts_exactly_one_pick() {
        let start = Utc::now();
        let mut session = DraftSession::new(&config(2, 60, None));
        session.load_players(pool_of(4)).unwrap();
        session.request_captaincy("a", "Ana Reyes", None, start).unwrap();
        session.request_captaincy("b", "Ben Cho", None, start).unwrap();

        // Not due yet: the tick is a no-op.
        assert!(!session.expire_turn_if_due(start + Duration::seconds(59)));
        assert_eq!(session.snapshot().teams["a"].len(), 0);

        let after = start + Duration::seconds(61);
        assert!(session.expire_turn_if_due(after));
        let snap = session.snapshot();
        assert_eq!(snap.teams["a"].len(), 1);
        assert_eq!(snap.teams["a"][0].id, "p1");
        assert_eq!(snap.current_captain_id.as_deref(), Some("b"));
        // The fresh deadline belongs to B, measured from the expiry tick.
        assert_eq!(snap.pick_expires_at, Some(after + Duration::seconds(60)));

        // Second tick at the same instant: nothing is due.
        assert!(!session.expire_turn_if_due(after));
    }

    #[test]
    fn export_rosters_are_handed_out_once() {
        let now = Utc::now();
        let mut session = DraftSession::new(&config(2, 60, None));
        session.load_players(pool_of(2)).unwrap();
        session.request_captaincy("a", "Ana Reyes", None, now).unwrap();

        assert!(session.take_export_once().is_none());

        session.request_captaincy("b", "Ben Cho", None, now).unwrap();
        session.make_pick("a", "p1", now).unwrap();
        session.make_pick("b", "p2", now).unwrap();
        assert_eq!(session.phase(), DraftPhase::Completed);

        let exported = session.take_export_once().unwrap();
        assert_eq!(exported.len(), 2);
        assert!(session.take_export_once().is_none());
    }

    #[test]
    fn captain_liveness_survives_disconnects() {
        let now = Utc::now();
        let mut session = DraftSession::new(&config(2, 60, None));
        session.load_players(pool_of(2)).unwrap();
        session.request_captaincy("a", "Ana Reyes", None, now).unwrap();

        assert!(session.set_captain_active("a", false));
        assert!(!session.captains().find("a").unwrap().active);
        // Slot and identity survive; a non-captain is simply not tracked.
        assert!(session.is_captain("a"));
        assert!(!session.set_captain_active("stranger", false));

        assert!(session.set_captain_active("a", true));
        assert!(session.captains().find("a").unwrap().active);
    }
}
