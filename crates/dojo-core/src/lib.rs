//! # dojo-core
//!
//! The deterministic rule engine of the dojo roster - THE LOGIC.
//!
//! This crate owns everything that decides something:
//! - the participation ledger (who trained when)
//! - the grade evaluator (who may sit the next exam, and why not)
//! - the sticker progression (reward ladder over lifetime units)
//!
//! plus the formats and storage those decisions are persisted with.
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: NO async, NO network dependencies
//! - Deterministic: ordered maps only, integer arithmetic only
//! - Snapshot-driven: evaluation takes immutable snapshots and returns
//!   new values; only [`storage`] writes anything
//! - No logging: every failure is a [`DojoError`]

// =============================================================================
// MODULES
// =============================================================================

pub mod calendar;
pub mod dojo;
pub mod evaluator;
pub mod formats;
pub mod import;
pub mod ledger;
pub mod primitives;
pub mod progression;
pub mod rules;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    DojoError, Member, MemberId, NewMember, ParticipationRecord, StickerAward, TrainerId,
};

// =============================================================================
// RE-EXPORTS: Rule Engine
// =============================================================================

pub use dojo::{AttendanceOutcome, Dojo, ImportSummary, StickerStatus, StorageBackend};
pub use evaluator::{EligibilityReport, GradeEvaluator, Shortfall};
pub use import::{ImportPlan, RosterRow, parse_roster, plan_import};
pub use ledger::Ledger;
pub use progression::StickerProgression;
pub use rules::{GradeRequirement, GradeTable, StickerTable, StickerTier};
pub use storage::{DojoStore, MemoryStore, RedbStore};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{Snapshot, SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};
