use crate::dto::captain_dto::{Captain, CaptainSummary};
use crate::error::DraftError;

/// The bounded set of captain slots. Slots are assigned in claim order and
/// never released within a session; disconnects only flip `active`.
#[derive(Debug)]
pub struct CaptainRegistry {
    capacity: usize,
    captains: Vec<Captain>,
}

impl CaptainRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            captains: Vec::with_capacity(capacity),
        }
    }

    /// Claim the next open slot for `user_id`.
    pub fn claim(
        &mut self,
        user_id: &str,
        display_name: &str,
        team_name: Option<String>,
    ) -> Result<&Captain, DraftError> {
        if self.find(user_id).is_some() {
            return Err(DraftError::AlreadyCaptain);
        }
        if self.captains.len() >= self.capacity {
            return Err(DraftError::CapacityExceeded);
        }
        self.captains.push(Captain::new(
            user_id.to_string(),
            display_name.to_string(),
            team_name,
        ));
        Ok(self.captains.last().unwrap())
    }

    /// Connection liveness. Keeps the slot and roster either way.
    pub fn set_active(&mut self, user_id: &str, active: bool) -> Result<(), DraftError> {
        let captain = self.find_mut(user_id).ok_or(DraftError::NotFound)?;
        captain.active = active;
        Ok(())
    }

    /// A captain may flip their own flag at any time, including mid-turn.
    pub fn set_autodraft(&mut self, user_id: &str, enabled: bool) -> Result<(), DraftError> {
        let captain = self.find_mut(user_id).ok_or(DraftError::NotFound)?;
        captain.autodraft = enabled;
        Ok(())
    }

    pub fn find(&self, user_id: &str) -> Option<&Captain> {
        self.captains.iter().find(|c| c.user_id == user_id)
    }

    pub fn find_mut(&mut self, user_id: &str) -> Option<&mut Captain> {
        self.captains.iter_mut().find(|c| c.user_id == user_id)
    }

    pub fn by_slot(&self, slot: usize) -> Option<&Captain> {
        self.captains.get(slot)
    }

    pub fn by_slot_mut(&mut self, slot: usize) -> Option<&mut Captain> {
        self.captains.get_mut(slot)
    }

    /// Captains in slot order.
    pub fn list(&self) -> &[Captain] {
        &self.captains
    }

    pub fn summaries(&self) -> Vec<CaptainSummary> {
        self.captains.iter().map(CaptainSummary::from).collect()
    }

    pub fn len(&self) -> usize {
        self.captains.len()
    }

    pub fn is_full(&self) -> bool {
        self.captains.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_assigns_slots_in_order_up_to_capacity() {
        let mut registry = CaptainRegistry::new(2);
        registry.claim("u1", "Ana Reyes", None).unwrap();
        registry.claim("u2", "Ben Cho", Some("Thunder".into())).unwrap();

        assert!(registry.is_full());
        assert_eq!(registry.by_slot(0).unwrap().user_id, "u1");
        assert_eq!(registry.by_slot(1).unwrap().team_name, "Thunder");
        assert_eq!(registry.by_slot(0).unwrap().team_name, "Ana's Team");

        assert_eq!(
            registry.claim("u3", "Cal Dunn", None),
            Err(DraftError::CapacityExceeded)
        );
    }

    #[test]
    fn duplicate_claim_is_rejected_before_capacity_check() {
        let mut registry = CaptainRegistry::new(1);
        registry.claim("u1", "Ana Reyes", None).unwrap();
        assert_eq!(
            registry.claim("u1", "Ana Reyes", None),
            Err(DraftError::AlreadyCaptain)
        );
    }

    #[test]
    fn liveness_and_autodraft_flags_require_a_slot() {
        let mut registry = CaptainRegistry::new(2);
        registry.claim("u1", "Ana Reyes", None).unwrap();

        registry.set_active("u1", false).unwrap();
        assert!(!registry.find("u1").unwrap().active);
        registry.set_active("u1", true).unwrap();
        assert!(registry.find("u1").unwrap().active);

        registry.set_autodraft("u1", true).unwrap();
        assert!(registry.find("u1").unwrap().autodraft);

        assert_eq!(registry.set_active("ghost", true), Err(DraftError::NotFound));
        assert_eq!(
            registry.set_autodraft("ghost", true),
            Err(DraftError::NotFound)
        );
    }
}
