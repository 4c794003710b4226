//! # Sticker Progression
//!
//! Decides when a member has earned the next sticker and records the
//! award.
//!
//! Each call advances at most one tier. A member who crossed several
//! thresholds since the last award gets them one by one: the caller
//! re-runs [`StickerProgression::check_award`] against the member returned
//! by [`StickerProgression::apply_award`].

use crate::rules::{StickerTable, StickerTier};
use crate::{DojoError, Member, StickerAward, TrainerId};
use chrono::NaiveDate;

/// Sticker ladder logic over a [`StickerTable`].
#[derive(Debug, Clone, Copy)]
pub struct StickerProgression<'a> {
    tiers: &'a StickerTable,
}

impl<'a> StickerProgression<'a> {
    /// Create a progression over `tiers`.
    #[must_use]
    pub fn new(tiers: &'a StickerTable) -> Self {
        Self { tiers }
    }

    /// The tier after `current`.
    ///
    /// Fails with `NoSuccessorTier` at the top; guard with
    /// [`StickerTable::is_last`].
    pub fn next_tier(&self, current: u32) -> Result<&'a StickerTier, DojoError> {
        self.tiers.next_tier(current)
    }

    /// Threshold of the tier `member` should be awarded now, if any.
    pub fn check_award(&self, member: &Member, total_units: u64) -> Result<Option<u32>, DojoError> {
        if self.tiers.is_last(member.sticker_tier)? {
            return Ok(None);
        }
        let next = self.next_tier(member.sticker_tier)?;
        if total_units >= u64::from(next.threshold) {
            Ok(Some(next.threshold))
        } else {
            Ok(None)
        }
    }

    /// Record an award: set the tier and append to the history.
    pub fn apply_award(
        &self,
        member: &Member,
        tier: u32,
        awarded_by: TrainerId,
        date: NaiveDate,
    ) -> Result<Member, DojoError> {
        self.tiers.get(tier)?;

        let mut updated = member.clone();
        updated.sticker_tier = tier;
        updated.sticker_awards.push(StickerAward {
            tier,
            awarded_by,
            date,
        });
        Ok(updated)
    }

    /// Every tier a multi-tier jump would award, lowest first.
    pub fn pending_awards(&self, member: &Member, total_units: u64) -> Result<Vec<u32>, DojoError> {
        let mut pending = Vec::new();
        let mut current = member.sticker_tier;
        while !self.tiers.is_last(current)? {
            let next = self.next_tier(current)?;
            if total_units < u64::from(next.threshold) {
                break;
            }
            pending.push(next.threshold);
            current = next.threshold;
        }
        Ok(pending)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemberId;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn member() -> Member {
        Member::new(MemberId(1), "Ida", "Brandt", day(2014, 4, 4), "8. Kyu gelb")
    }

    #[test]
    fn award_at_threshold() {
        let table = StickerTable::standard();
        let progression = StickerProgression::new(&table);
        let member = member();

        assert_eq!(progression.check_award(&member, 24).expect("check"), None);
        assert_eq!(progression.check_award(&member, 25).expect("check"), Some(25));
    }

    #[test]
    fn apply_award_appends_history() {
        let table = StickerTable::standard();
        let progression = StickerProgression::new(&table);

        let updated = progression
            .apply_award(&member(), 25, TrainerId(9), day(2024, 5, 5))
            .expect("award");
        assert_eq!(updated.sticker_tier, 25);
        assert_eq!(
            updated.sticker_awards,
            vec![StickerAward {
                tier: 25,
                awarded_by: TrainerId(9),
                date: day(2024, 5, 5)
            }]
        );
    }

    #[test]
    fn multi_tier_jump_is_one_step_per_call() {
        let table = StickerTable::standard();
        let progression = StickerProgression::new(&table);
        let mut current = member();
        let mut awarded = Vec::new();

        while let Some(tier) = progression.check_award(&current, 80).expect("check") {
            current = progression
                .apply_award(&current, tier, TrainerId(2), day(2024, 6, 1))
                .expect("award");
            awarded.push(tier);
        }

        assert_eq!(awarded, vec![25, 50, 75]);
        assert_eq!(progression.pending_awards(&member(), 80).expect("pending"), awarded);
    }

    #[test]
    fn top_tier_never_awards() {
        let table = StickerTable::standard();
        let progression = StickerProgression::new(&table);
        let mut member = member();
        member.sticker_tier = 800;

        assert_eq!(progression.check_award(&member, 5_000).expect("check"), None);
        assert!(progression.pending_awards(&member, 5_000).expect("pending").is_empty());
    }

    #[test]
    fn unknown_tier_is_rejected() {
        let table = StickerTable::standard();
        let progression = StickerProgression::new(&table);
        assert!(matches!(
            progression.apply_award(&member(), 33, TrainerId(1), day(2024, 1, 1)),
            Err(DojoError::UnknownStickerTier(33))
        ));
    }
}
