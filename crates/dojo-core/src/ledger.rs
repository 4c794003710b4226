//! # Participation Ledger
//!
//! Day-indexed record of who trained and who sat an exam.
//!
//! The ledger holds at most one [`ParticipationRecord`] per date. Submitting
//! attendance for a date that already has a record appends to it; nothing is
//! ever removed. Ids are not deduplicated, so a member submitted twice for
//! the same day is counted twice by [`Ledger::count_units`].
//!
//! All queries iterate in ascending date order (`BTreeMap`).

use crate::{DojoError, Member, MemberId, ParticipationRecord};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Snapshot of every participation record, keyed by date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    records: BTreeMap<NaiveDate, ParticipationRecord>,
}

impl Ledger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from stored records.
    ///
    /// Two records for the same date mean the store is corrupt and are
    /// rejected rather than merged.
    pub fn from_records(
        records: impl IntoIterator<Item = ParticipationRecord>,
    ) -> Result<Self, DojoError> {
        let mut map = BTreeMap::new();
        for record in records {
            let date = record.date;
            if map.insert(date, record).is_some() {
                return Err(DojoError::DataIntegrity(format!(
                    "duplicate participation record for {}",
                    date
                )));
            }
        }
        Ok(Self { records: map })
    }

    /// Number of dated records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get the record for a date.
    #[must_use]
    pub fn get(&self, date: NaiveDate) -> Option<&ParticipationRecord> {
        self.records.get(&date)
    }

    /// Iterate records in ascending date order.
    pub fn records(&self) -> impl Iterator<Item = &ParticipationRecord> {
        self.records.values()
    }

    /// Consume the ledger, yielding records in ascending date order.
    #[must_use]
    pub fn into_records(self) -> Vec<ParticipationRecord> {
        self.records.into_values().collect()
    }

    fn after(&self, since: Option<NaiveDate>) -> impl Iterator<Item = &ParticipationRecord> {
        let lower = match since {
            Some(date) => Bound::Excluded(date),
            None => Bound::Unbounded,
        };
        self.records
            .range((lower, Bound::Unbounded))
            .map(|(_, record)| record)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Training units of `member` on dates strictly after `since`.
    ///
    /// `None` counts the whole history. Exam days are not units.
    #[must_use]
    pub fn count_units(&self, member: MemberId, since: Option<NaiveDate>) -> usize {
        self.after(since)
            .map(|record| record.training_count(member))
            .sum()
    }

    /// Exam appearances of `member` on dates strictly after `since`.
    #[must_use]
    pub fn count_exam_days(&self, member: MemberId, since: Option<NaiveDate>) -> usize {
        self.after(since)
            .map(|record| record.exam_count(member))
            .sum()
    }

    /// Earliest date on which `member` attended regular training.
    #[must_use]
    pub fn first_attendance_date(&self, member: MemberId) -> Option<NaiveDate> {
        self.records
            .values()
            .find(|record| record.training.contains(&member))
            .map(|record| record.date)
    }

    /// Latest date on which `member` appears in an exam list.
    #[must_use]
    pub fn last_exam_date(&self, member: MemberId) -> Option<NaiveDate> {
        self.records
            .values()
            .rev()
            .find(|record| record.exam.contains(&member))
            .map(|record| record.date)
    }

    /// Lifetime units: the legacy total plus every ledger unit.
    ///
    /// Exams do not reset this number.
    #[must_use]
    pub fn total_units(&self, member: &Member) -> u64 {
        u64::from(member.legacy_total)
            .saturating_add(self.count_units(member.id, None) as u64)
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Record attendance for `date`.
    ///
    /// Creates the day's record on first submission and appends to the
    /// training or exam list afterwards. Returns the ids that were already
    /// present in the target list before this call. An empty `ids` leaves
    /// the ledger untouched.
    pub fn record_attendance(
        &mut self,
        ids: &[MemberId],
        date: NaiveDate,
        is_exam: bool,
    ) -> Vec<MemberId> {
        if ids.is_empty() {
            return Vec::new();
        }
        let record = self
            .records
            .entry(date)
            .or_insert_with(|| ParticipationRecord::new(date));

        let existing = if is_exam {
            &record.exam
        } else {
            &record.training
        };
        let repeated = ids
            .iter()
            .copied()
            .filter(|id| existing.contains(id))
            .collect();

        record.merge(ids, is_exam);
        repeated
    }
}

// =============================================================================
// TESTS
// =============================================================================
