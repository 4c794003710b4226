//! # In-memory Store
//!
//! Volatile [`DojoStore`]. Fast, and the target of snapshot restores.

use super::{DojoStore, validate_names};
use crate::formats::Snapshot;
use crate::ledger::Ledger;
use crate::{DojoError, Member, MemberId, NewMember};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Members and ledger held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    members: BTreeMap<MemberId, Member>,
    ledger: Ledger,
    next_member_id: u64,
}

impl MemoryStore {
    /// Create an empty store. The first member gets id 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            members: BTreeMap::new(),
            ledger: Ledger::new(),
            next_member_id: 1,
        }
    }

    /// Restore a store from a snapshot.
    ///
    /// Id assignment continues after the highest restored id.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, DojoError> {
        let ledger = snapshot.ledger()?;
        let mut members = BTreeMap::new();
        for member in snapshot.members {
            let id = member.id;
            if members.insert(id, member).is_some() {
                return Err(DojoError::DataIntegrity(format!(
                    "duplicate member id {}",
                    id
                )));
            }
        }
        let next_member_id = members
            .keys()
            .next_back()
            .map(|id| id.0.saturating_add(1))
            .unwrap_or(1);
        Ok(Self {
            members,
            ledger,
            next_member_id,
        })
    }
}

impl DojoStore for MemoryStore {
    fn insert_member(&mut self, new: NewMember) -> Result<Member, DojoError> {
        validate_names(&new.given_name, &new.family_name)?;
        let id = MemberId(self.next_member_id);
        self.next_member_id = self.next_member_id.saturating_add(1);
        let member = new.into_member(id);
        self.members.insert(id, member.clone());
        Ok(member)
    }

    fn update_member(&mut self, member: &Member) -> Result<(), DojoError> {
        validate_names(&member.given_name, &member.family_name)?;
        match self.members.get_mut(&member.id) {
            Some(slot) => {
                *slot = member.clone();
                Ok(())
            }
            None => Err(DojoError::MemberNotFound(member.id)),
        }
    }

    fn get_member(&self, id: MemberId) -> Result<Option<Member>, DojoError> {
        Ok(self.members.get(&id).cloned())
    }

    fn members(&self) -> Result<Vec<Member>, DojoError> {
        Ok(self.members.values().cloned().collect())
    }

    fn record_attendance(
        &mut self,
        ids: &[MemberId],
        date: NaiveDate,
        is_exam: bool,
    ) -> Result<Vec<MemberId>, DojoError> {
        Ok(self.ledger.record_attendance(ids, date, is_exam))
    }

    fn ledger(&self) -> Result<Ledger, DojoError> {
        Ok(self.ledger.clone())
    }

    fn member_count(&self) -> Result<usize, DojoError> {
        Ok(self.members.len())
    }

    fn record_count(&self) -> Result<usize, DojoError> {
        Ok(self.ledger.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================
