use chrono::{DateTime, Duration, Utc};

/// Lifecycle of the pick sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftPhase {
    NotStarted,
    InProgress,
    Completed,
}

/// Computes and walks the snake pick order: round 1 in seat order, round 2
/// reversed, alternating until `total_picks` is reached. A trailing partial
/// round keeps the parity of the untruncated pattern.
pub fn snake_order(seats: usize, total_picks: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(total_picks);
    if seats == 0 {
        return order;
    }
    let mut round = 0;
    while order.len() < total_picks {
        for i in 0..seats {
            if order.len() == total_picks {
                break;
            }
            if round % 2 == 0 {
                order.push(i);
            } else {
                order.push(seats - 1 - i);
            }
        }
        round += 1;
    }
    order
}

/// Tracks whose turn it is and the running per-pick deadline. The order is
/// frozen at `start`; the cursor only ever moves forward.
#[derive(Debug)]
pub struct TurnScheduler {
    phase: DraftPhase,
    pick_order: Vec<usize>,
    cursor: usize,
    deadline: Option<DateTime<Utc>>,
    pick_duration: Duration,
}

impl TurnScheduler {
    pub fn new(pick_seconds: i64) -> Self {
        Self {
            phase: DraftPhase::NotStarted,
            pick_order: Vec::new(),
            cursor: 0,
            deadline: None,
            pick_duration: Duration::seconds(pick_seconds),
        }
    }

    pub fn phase(&self) -> DraftPhase {
        self.phase
    }

    /// Freeze the pick order and move to `InProgress`. An empty order (no
    /// draftable players) completes immediately. The caller decides whether
    /// the first turn gets a deadline, so none is opened here.
    pub fn start(&mut self, pick_order: Vec<usize>) {
        debug_assert_eq!(self.phase, DraftPhase::NotStarted);
        self.pick_order = pick_order;
        self.cursor = 0;
        self.phase = if self.pick_order.is_empty() {
            DraftPhase::Completed
        } else {
            DraftPhase::InProgress
        };
    }

    /// One committed pick, one cursor increment. Clears the pending
    /// deadline; the caller reopens one unless the next turn autodrafts.
    pub fn advance(&mut self) {
        debug_assert_eq!(self.phase, DraftPhase::InProgress);
        self.deadline = None;
        self.cursor += 1;
        if self.cursor >= self.pick_order.len() {
            self.phase = DraftPhase::Completed;
        }
    }

    pub fn open_deadline(&mut self, now: DateTime<Utc>) {
        debug_assert_eq!(self.phase, DraftPhase::InProgress);
        self.deadline = Some(now + self.pick_duration);
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Whether the current turn's deadline has lapsed. Always evaluated
    /// against current cursor state, so a committed pick implicitly cancels
    /// the old deadline.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.phase == DraftPhase::InProgress
            && self.deadline.is_some_and(|deadline| now > deadline)
    }

    /// Seat on the clock, while in progress.
    pub fn current_slot(&self) -> Option<usize> {
        if self.phase != DraftPhase::InProgress {
            return None;
        }
        self.pick_order.get(self.cursor).copied()
    }

    /// Seat picking after the current one, for display.
    pub fn next_slot(&self) -> Option<usize> {
        if self.phase != DraftPhase::InProgress {
            return None;
        }
        self.pick_order.get(self.cursor + 1).copied()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn pick_order(&self) -> &[usize] {
        &self.pick_order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_order_alternates_each_round() {
        // N=3 over 3 rounds: 1..N, N..1, 1..N.
        assert_eq!(
            snake_order(3, 9),
            vec![0, 1, 2, 2, 1, 0, 0, 1, 2]
        );
    }

    #[test]
    fn snake_order_truncates_final_partial_round() {
        assert_eq!(snake_order(3, 4), vec![0, 1, 2, 2]);
        assert_eq!(snake_order(2, 4), vec![0, 1, 1, 0]);
    }

    #[test]
    fn advance_walks_the_order_and_completes() {
        let mut scheduler = TurnScheduler::new(60);
        scheduler.start(snake_order(2, 4));
        assert_eq!(scheduler.phase(), DraftPhase::InProgress);

        let mut seats = Vec::new();
        while let Some(slot) = scheduler.current_slot() {
            seats.push(slot);
            scheduler.advance();
        }
        assert_eq!(seats, vec![0, 1, 1, 0]);
        assert_eq!(scheduler.phase(), DraftPhase::Completed);
        assert_eq!(scheduler.current_slot(), None);
        assert_eq!(scheduler.cursor(), 4);
    }

    #[test]
    fn empty_order_completes_immediately() {
        let mut scheduler = TurnScheduler::new(60);
        scheduler.start(Vec::new());
        assert_eq!(scheduler.phase(), DraftPhase::Completed);
    }

    #[test]
    fn deadline_expires_only_after_the_duration() {
        let mut scheduler = TurnScheduler::new(60);
        scheduler.start(snake_order(2, 2));
        let now = Utc::now();
        scheduler.open_deadline(now);

        assert!(!scheduler.is_expired(now));
        assert!(!scheduler.is_expired(now + Duration::seconds(60)));
        assert!(scheduler.is_expired(now + Duration::seconds(61)));
    }

    #[test]
    fn advance_clears_the_pending_deadline() {
        let mut scheduler = TurnScheduler::new(60);
        scheduler.start(snake_order(2, 4));
        let now = Utc::now();
        scheduler.open_deadline(now);
        scheduler.advance();
        // No deadline carried over; the next turn opens its own.
        assert_eq!(scheduler.deadline(), None);
        assert!(!scheduler.is_expired(now + Duration::seconds(120)));
    }
}
