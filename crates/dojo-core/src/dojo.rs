//! # Dojo
//!
//! The facade the app talks to: a storage backend plus the grade and
//! sticker tables.
//!
//! Every rule decision is taken against a snapshot loaded from the
//! backend and its result is written back in one store call. The facade
//! also holds the checks stores do not make: grade keys exist, sticker
//! tiers exist, attendance ids name real members.
//!
//! ## Storage Backends
//!
//! - `InMemory`: [`MemoryStore`] (fast, volatile unless exported)
//! - `Persistent`: [`RedbStore`] (disk-backed, ACID)

use crate::evaluator::{EligibilityReport, GradeEvaluator};
use crate::formats::Snapshot;
use crate::import::{ImportPlan, RosterRow, plan_import};
use crate::ledger::Ledger;
use crate::primitives::MAX_ATTENDANCE_IDS;
use crate::progression::StickerProgression;
use crate::rules::{GradeTable, StickerTable};
use crate::storage::{DojoStore, MemoryStore, RedbStore};
use crate::{DojoError, Member, MemberId, NewMember, TrainerId};
use chrono::NaiveDate;
use std::path::Path;

/// Storage backend for a [`Dojo`].
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory store (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    fn store(&self) -> &dyn DojoStore {
        match self {
            Self::InMemory(s) => s,
            Self::Persistent(s) => s,
        }
    }

    fn store_mut(&mut self) -> &mut dyn DojoStore {
        match self {
            Self::InMemory(s) => s,
            Self::Persistent(s) => s,
        }
    }
}

/// Outcome of [`Dojo::record_attendance`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceOutcome {
    /// Ids appended.
    pub recorded: usize,
    /// Ids that were already listed for the day and are now counted twice.
    pub repeated: Vec<MemberId>,
}

/// Outcome of [`Dojo::apply_import`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub updated: usize,
    pub created: usize,
    pub matched_by_name: usize,
    pub matched_by_old_name: usize,
}

/// A member's sticker position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickerStatus {
    pub member: MemberId,
    pub total_units: u64,
    pub current_tier: u32,
    /// Tier awardable now, one step above `current_tier`.
    pub due: Option<u32>,
    /// Every tier a multi-tier jump would award, lowest first.
    pub pending: Vec<u32>,
}

/// Roster, ledger and rule tables behind one handle.
#[derive(Debug, Default)]
pub struct Dojo {
    backend: StorageBackend,
    grades: GradeTable,
    stickers: StickerTable,
}

impl Dojo {
    /// In-memory dojo with the built-in tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open or create a redb database at `path`.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, DojoError> {
        Ok(Self {
            backend: StorageBackend::Persistent(RedbStore::open(path)?),
            ..Self::default()
        })
    }

    /// In-memory dojo restored from a snapshot, checked against the
    /// built-in tables.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, DojoError> {
        let dojo = Self::default();
        dojo.check_members(&snapshot.members)?;
        Ok(Self {
            backend: StorageBackend::InMemory(MemoryStore::from_snapshot(snapshot)?),
            ..dojo
        })
    }

    /// Replace the rule tables.
    ///
    /// Fails if a stored member's grade or sticker tier is missing from
    /// the new tables. Nothing is written either way.
    pub fn with_rules(
        mut self,
        grades: GradeTable,
        stickers: StickerTable,
    ) -> Result<Self, DojoError> {
        let members = self.members()?;
        self.grades = grades;
        self.stickers = stickers;
        self.check_members(&members)?;
        Ok(self)
    }

    /// Every member's grade and sticker tier must be keys of the tables.
    fn check_members(&self, members: &[Member]) -> Result<(), DojoError> {
        for member in members {
            self.grades.get(&member.grade)?;
            self.stickers.get(member.sticker_tier)?;
        }
        Ok(())
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    #[must_use]
    pub fn grades(&self) -> &GradeTable {
        &self.grades
    }

    #[must_use]
    pub fn stickers(&self) -> &StickerTable {
        &self.stickers
    }

    // =========================================================================
    // ROSTER
    // =========================================================================

    /// Add a member. The grade must be a key of the grade table.
    pub fn add_member(&mut self, new: NewMember) -> Result<Member, DojoError> {
        self.grades.get(&new.grade)?;
        self.backend.store_mut().insert_member(new)
    }

    /// Look up a member, failing with `MemberNotFound`.
    pub fn member(&self, id: MemberId) -> Result<Member, DojoError> {
        self.backend
            .store()
            .get_member(id)?
            .ok_or(DojoError::MemberNotFound(id))
    }

    /// All members in id order.
    pub fn members(&self) -> Result<Vec<Member>, DojoError> {
        self.backend.store().members()
    }

    /// Active members in id order.
    pub fn active_members(&self) -> Result<Vec<Member>, DojoError> {
        Ok(self
            .members()?
            .into_iter()
            .filter(|m| m.active)
            .collect())
    }

    /// Clear a member's active flag.
    pub fn deactivate(&mut self, id: MemberId) -> Result<Member, DojoError> {
        self.backend.store_mut().deactivate_member(id)
    }

    pub fn member_count(&self) -> Result<usize, DojoError> {
        self.backend.store().member_count()
    }

    pub fn record_count(&self) -> Result<usize, DojoError> {
        self.backend.store().record_count()
    }

    // =========================================================================
    // ATTENDANCE
    // =========================================================================

    /// Append attendance for `date`.
    ///
    /// Every id must name an existing member. Repeated ids are stored and
    /// reported back in the outcome.
    pub fn record_attendance(
        &mut self,
        ids: &[MemberId],
        date: NaiveDate,
        is_exam: bool,
    ) -> Result<AttendanceOutcome, DojoError> {
        if ids.is_empty() {
            return Ok(AttendanceOutcome::default());
        }
        if ids.len() > MAX_ATTENDANCE_IDS {
            return Err(DojoError::InvalidMember(format!(
                "more than {} ids in one submission",
                MAX_ATTENDANCE_IDS
            )));
        }
        for &id in ids {
            if self.backend.store().get_member(id)?.is_none() {
                return Err(DojoError::MemberNotFound(id));
            }
        }
        let repeated = self
            .backend
            .store_mut()
            .record_attendance(ids, date, is_exam)?;
        Ok(AttendanceOutcome {
            recorded: ids.len(),
            repeated,
        })
    }

    /// Snapshot of the whole ledger.
    pub fn ledger(&self) -> Result<Ledger, DojoError> {
        self.backend.store().ledger()
    }

    /// Lifetime units of a member.
    pub fn total_units(&self, id: MemberId) -> Result<u64, DojoError> {
        let member = self.member(id)?;
        Ok(self.ledger()?.total_units(&member))
    }

    // =========================================================================
    // GRADES
    // =========================================================================

    /// Evaluate one member for their next grade.
    ///
    /// A member at the top grade fails with `NoSuccessorGrade`, even if
    /// they never trained.
    pub fn evaluate(&self, id: MemberId, today: NaiveDate) -> Result<EligibilityReport, DojoError> {
        let member = self.member(id)?;
        self.grades.successor(&member.grade)?;
        let ledger = self.ledger()?;
        GradeEvaluator::new(&self.grades).evaluate(&member, &ledger, today)
    }

    /// Evaluate every active member that still has a next grade.
    ///
    /// Members at the top grade are skipped.
    pub fn evaluate_all(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<(Member, EligibilityReport)>, DojoError> {
        let ledger = self.ledger()?;
        let evaluator = GradeEvaluator::new(&self.grades);
        let mut reports = Vec::new();
        for member in self.active_members()? {
            if self.grades.is_terminal(&member.grade)? {
                continue;
            }
            let report = evaluator.evaluate(&member, &ledger, today)?;
            reports.push((member, report));
        }
        Ok(reports)
    }

    /// Promote a member after an exam on `exam_date`.
    ///
    /// Fails with `InvalidDate` if the exam lies after `today`.
    pub fn promote(
        &mut self,
        id: MemberId,
        exam_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Member, DojoError> {
        if exam_date > today {
            return Err(DojoError::InvalidDate(format!(
                "exam {} is after {}",
                exam_date, today
            )));
        }
        let member = self.member(id)?;
        let promoted = GradeEvaluator::new(&self.grades).promote(&member, exam_date)?;
        self.backend.store_mut().update_member(&promoted)?;
        Ok(promoted)
    }

    // =========================================================================
    // STICKERS
    // =========================================================================

    /// Where a member stands on the sticker ladder.
    pub fn sticker_status(&self, id: MemberId) -> Result<StickerStatus, DojoError> {
        let member = self.member(id)?;
        let total_units = self.ledger()?.total_units(&member);
        self.status_for(&member, total_units)
    }

    /// Sticker status of every active member with an award due.
    pub fn due_stickers(&self) -> Result<Vec<StickerStatus>, DojoError> {
        let ledger = self.ledger()?;
        let mut due = Vec::new();
        for member in self.active_members()? {
            let status = self.status_for(&member, ledger.total_units(&member))?;
            if status.due.is_some() {
                due.push(status);
            }
        }
        Ok(due)
    }

    fn status_for(&self, member: &Member, total_units: u64) -> Result<StickerStatus, DojoError> {
        let progression = StickerProgression::new(&self.stickers);
        Ok(StickerStatus {
            member: member.id,
            total_units,
            current_tier: member.sticker_tier,
            due: progression.check_award(member, total_units)?,
            pending: progression.pending_awards(member, total_units)?,
        })
    }

    /// Award the next due sticker, if any.
    ///
    /// Advances one tier per call. The trainer must be a member.
    pub fn award(
        &mut self,
        id: MemberId,
        trainer: TrainerId,
        date: NaiveDate,
    ) -> Result<Option<Member>, DojoError> {
        let trainer_member = MemberId(trainer.0);
        if self.backend.store().get_member(trainer_member)?.is_none() {
            return Err(DojoError::MemberNotFound(trainer_member));
        }
        let member = self.member(id)?;
        let total_units = self.ledger()?.total_units(&member);
        let progression = StickerProgression::new(&self.stickers);

        let Some(tier) = progression.check_award(&member, total_units)? else {
            return Ok(None);
        };
        let updated = progression.apply_award(&member, tier, trainer, date)?;
        self.backend.store_mut().update_member(&updated)?;
        Ok(Some(updated))
    }

    // =========================================================================
    // IMPORT / EXPORT
    // =========================================================================

    /// Plan a roster import against the current members.
    pub fn plan_import(&self, rows: &[RosterRow]) -> Result<ImportPlan, DojoError> {
        plan_import(rows, &self.members()?, &self.grades)
    }

    /// Write a planned import.
    pub fn apply_import(&mut self, plan: ImportPlan) -> Result<ImportSummary, DojoError> {
        let summary = ImportSummary {
            updated: plan.updated.len(),
            created: plan.created.len(),
            matched_by_name: plan.matched_by_name,
            matched_by_old_name: plan.matched_by_old_name,
        };
        let store = self.backend.store_mut();
        for member in &plan.updated {
            store.update_member(member)?;
        }
        for new in plan.created {
            store.insert_member(new)?;
        }
        Ok(summary)
    }

    /// Everything in the store.
    pub fn snapshot(&self) -> Result<Snapshot, DojoError> {
        self.backend.store().snapshot()
    }

    /// Replace all content with `snapshot`.
    ///
    /// Nothing is written unless every member's grade and sticker tier
    /// are in the current tables.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<(), DojoError> {
        self.check_members(&snapshot.members)?;
        match &mut self.backend {
            StorageBackend::InMemory(store) => {
                *store = MemoryStore::from_snapshot(snapshot)?;
                Ok(())
            }
            StorageBackend::Persistent(store) => store.restore(&snapshot),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
