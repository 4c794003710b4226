//! # Core Type Definitions
//!
//! This module contains the data model shared by every other module:
//! - Identifiers (`MemberId`, `TrainerId`)
//! - Roster entries (`Member`, `NewMember`, `StickerAward`)
//! - Attendance entries (`ParticipationRecord`)
//! - Error types (`DojoError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where they are used as `BTreeMap`/`BTreeSet` keys
//! - Are plain values; mutation happens by returning updated copies

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier of a roster member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberId(pub u64);

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the trainer who handed out a sticker.
///
/// Trainers are members too, but award history keeps the raw id so that
/// deactivated trainers stay resolvable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrainerId(pub u64);

impl From<MemberId> for TrainerId {
    fn from(id: MemberId) -> Self {
        Self(id.0)
    }
}

// =============================================================================
// MEMBER
// =============================================================================

/// One entry of a member's sticker history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickerAward {
    /// Threshold of the tier that was awarded.
    pub tier: u32,
    /// Trainer who handed it out.
    pub awarded_by: TrainerId,
    /// Day of the award.
    pub date: NaiveDate,
}

/// A roster member and their progression state.
///
/// Members are never removed; `active` is cleared instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub given_name: String,
    pub family_name: String,
    pub birth_date: NaiveDate,
    /// Key into the grade table.
    pub grade: String,
    pub last_exam_date: Option<NaiveDate>,
    /// Sessions accrued before ledger history began.
    pub legacy_total: u32,
    /// Added to the ledger count when counting units since the baseline.
    pub reset_offset: i32,
    pub active: bool,
    /// Training group from the legacy roster ("Kinder", "Erwachsene", ...).
    pub group: Option<String>,
    /// Threshold of the sticker tier reached so far.
    pub sticker_tier: u32,
    pub sticker_awards: Vec<StickerAward>,
}

impl Member {
    /// Create an active member with no history.
    #[must_use]
    pub fn new(
        id: MemberId,
        given_name: impl Into<String>,
        family_name: impl Into<String>,
        birth_date: NaiveDate,
        grade: impl Into<String>,
    ) -> Self {
        Self {
            id,
            given_name: given_name.into(),
            family_name: family_name.into(),
            birth_date,
            grade: grade.into(),
            last_exam_date: None,
            legacy_total: 0,
            reset_offset: 0,
            active: true,
            group: None,
            sticker_tier: 0,
            sticker_awards: Vec::new(),
        }
    }

    /// "Given Family", the form used for name matching on import.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

/// A member before the store has assigned an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub given_name: String,
    pub family_name: String,
    pub birth_date: NaiveDate,
    pub grade: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub legacy_total: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl NewMember {
    /// Attach the id the store assigned.
    #[must_use]
    pub fn into_member(self, id: MemberId) -> Member {
        let mut member = Member::new(
            id,
            self.given_name,
            self.family_name,
            self.birth_date,
            self.grade,
        );
        member.group = self.group;
        member.legacy_total = self.legacy_total;
        member.active = self.active;
        member
    }
}

// =============================================================================
// PARTICIPATION RECORD
// =============================================================================

/// Everything logged for one calendar day.
///
/// Ids are kept as sequences, not sets: a member submitted twice for the
/// same day is counted twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationRecord {
    pub date: NaiveDate,
    /// Members present for regular training.
    pub training: Vec<MemberId>,
    /// Members present for an exam.
    pub exam: Vec<MemberId>,
}

impl ParticipationRecord {
    /// Create an empty record for `date`.
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            training: Vec::new(),
            exam: Vec::new(),
        }
    }

    /// Number of times `member` appears in the training list.
    #[must_use]
    pub fn training_count(&self, member: MemberId) -> usize {
        self.training.iter().filter(|&&id| id == member).count()
    }

    /// Number of times `member` appears in the exam list.
    #[must_use]
    pub fn exam_count(&self, member: MemberId) -> usize {
        self.exam.iter().filter(|&&id| id == member).count()
    }

    /// Append ids to the training or exam list.
    pub fn merge(&mut self, ids: &[MemberId], is_exam: bool) {
        let target = if is_exam {
            &mut self.exam
        } else {
            &mut self.training
        };
        target.extend_from_slice(ids);
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the dojo core.
///
/// - No silent failures
/// - Use `Result<T, DojoError>` for fallible operations
/// - The core never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum DojoError {
    /// The grade is not a key of the grade table.
    #[error("Unknown grade: {0}")]
    UnknownGrade(String),

    /// The grade is the last entry of the grade table.
    #[error("Grade has no successor: {0}")]
    NoSuccessorGrade(String),

    /// The sticker tier is not a threshold of the sticker table.
    #[error("Unknown sticker tier: {0}")]
    UnknownStickerTier(u32),

    /// The sticker tier is the last entry of the sticker table.
    #[error("Sticker tier has no successor: {0}")]
    NoSuccessorTier(u32),

    /// No member with this id exists.
    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    /// Member fields failed validation.
    #[error("Invalid member: {0}")]
    InvalidMember(String),

    /// A date violates an ordering constraint.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// A roster import row could not be parsed.
    #[error("Invalid row at line {line}: {reason}")]
    InvalidRow { line: usize, reason: String },

    /// A persisted string (id list, award history) is malformed.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// A rule table failed validation.
    #[error("Invalid rule table: {0}")]
    InvalidRules(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn new_member_has_no_history() {
        let member = Member::new(MemberId(1), "Anna", "Schmidt", day(2015, 3, 1), "10. Kyu weiss");
        assert!(member.active);
        assert_eq!(member.sticker_tier, 0);
        assert!(member.sticker_awards.is_empty());
        assert_eq!(member.last_exam_date, None);
        assert_eq!(member.full_name(), "Anna Schmidt");
    }

    #[test]
    fn merge_keeps_repeated_ids() {
        let mut record = ParticipationRecord::new(day(2024, 5, 2));
        record.merge(&[MemberId(1), MemberId(2)], false);
        record.merge(&[MemberId(1)], false);
        record.merge(&[MemberId(3)], true);

        assert_eq!(record.training_count(MemberId(1)), 2);
        assert_eq!(record.training_count(MemberId(3)), 0);
        assert_eq!(record.exam_count(MemberId(3)), 1);
    }

    #[test]
    fn error_messages_name_the_subject() {
        let err = DojoError::NoSuccessorGrade("1. Dan schwarz".to_string());
        assert_eq!(err.to_string(), "Grade has no successor: 1. Dan schwarz");

        let err = DojoError::InvalidRow {
            line: 4,
            reason: "missing birthdate".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid row at line 4: missing birthdate");
    }
}
