//! # Storage
//!
//! The [`DojoStore`] trait and its two implementations:
//! - [`MemoryStore`]: volatile, used for tests and for restoring snapshots
//! - [`RedbStore`]: disk-backed, ACID, one write transaction per mutation
//!
//! Stores persist what they are given. Rule checks (grade keys, sticker
//! tiers, member existence for attendance) happen in [`crate::Dojo`].

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::formats::Snapshot;
use crate::ledger::Ledger;
use crate::primitives::MAX_NAME_LENGTH;
use crate::{DojoError, Member, MemberId, NewMember};
use chrono::NaiveDate;

/// Persistence operations shared by every backend.
pub trait DojoStore {
    /// Store a new member under the next free id.
    fn insert_member(&mut self, new: NewMember) -> Result<Member, DojoError>;

    /// Overwrite an existing member. Fails with `MemberNotFound` otherwise.
    fn update_member(&mut self, member: &Member) -> Result<(), DojoError>;

    /// Look up a member by id.
    fn get_member(&self, id: MemberId) -> Result<Option<Member>, DojoError>;

    /// All members in id order, active or not.
    fn members(&self) -> Result<Vec<Member>, DojoError>;

    /// Append attendance to the record for `date`, creating it if needed.
    ///
    /// Returns ids that were already present in the target list.
    fn record_attendance(
        &mut self,
        ids: &[MemberId],
        date: NaiveDate,
        is_exam: bool,
    ) -> Result<Vec<MemberId>, DojoError>;

    /// Snapshot of every participation record.
    fn ledger(&self) -> Result<Ledger, DojoError>;

    /// Number of members.
    fn member_count(&self) -> Result<usize, DojoError>;

    /// Number of dated participation records.
    fn record_count(&self) -> Result<usize, DojoError>;

    /// Clear the active flag. Members are never deleted.
    fn deactivate_member(&mut self, id: MemberId) -> Result<Member, DojoError> {
        let mut member = self
            .get_member(id)?
            .ok_or(DojoError::MemberNotFound(id))?;
        member.active = false;
        self.update_member(&member)?;
        Ok(member)
    }

    /// Everything in the store.
    fn snapshot(&self) -> Result<Snapshot, DojoError> {
        Ok(Snapshot {
            members: self.members()?,
            records: self.ledger()?.into_records(),
        })
    }
}

/// Reject empty or oversized names before they reach storage.
pub(crate) fn validate_names(given: &str, family: &str) -> Result<(), DojoError> {
    for name in [given, family] {
        if name.trim().is_empty() {
            return Err(DojoError::InvalidMember("name is empty".to_string()));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(DojoError::InvalidMember(format!(
                "name longer than {} bytes",
                MAX_NAME_LENGTH
            )));
        }
    }
    Ok(())
}
