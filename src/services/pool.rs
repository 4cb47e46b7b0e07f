use crate::dto::player_dto::Player;
use crate::error::DraftError;

/// The session's available-player set. Insertion order is the stable
/// iteration order every snapshot and the autodraft fallback rely on.
/// Owned exclusively by the draft session; the session lock makes `take`
/// atomic with respect to concurrent pick attempts.
#[derive(Debug, Default)]
pub struct PlayerPool {
    players: Vec<Player>,
    sealed: bool,
}

impl PlayerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize the available set. Rejected once the session has started.
    pub fn load(&mut self, players: Vec<Player>) -> Result<(), DraftError> {
        if self.sealed {
            return Err(DraftError::InvalidState);
        }
        self.players = players;
        Ok(())
    }

    /// Freeze the pool against further loads. Called at draft start.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Remove and return a player. A second take of the same id always
    /// fails: removal is one-shot, there is no undo.
    pub fn take(&mut self, player_id: &str) -> Result<Player, DraftError> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(DraftError::NotFound)?;
        Ok(self.players.remove(index))
    }

    /// Read-only view of the remaining players, in stable insertion order.
    pub fn snapshot(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
