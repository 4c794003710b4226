//! # Rule Tables
//!
//! Static grade and sticker tables. Built once at startup (either the
//! built-in defaults or tables loaded from configuration) and passed by
//! reference into the evaluator and the sticker progression.

mod grades;
mod stickers;

pub use grades::{GradeRequirement, GradeTable};
pub use stickers::{StickerTable, StickerTier};
