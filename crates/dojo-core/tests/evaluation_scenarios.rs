//! # Evaluation Scenarios
//!
//! End-to-end checks of the grade evaluator and the sticker ladder on
//! concrete member histories.
//!
//! ## Groups
//! - Grades: exam readiness against the standard grade table
//! - Stickers: award decisions against the standard sticker table
//! - Roundtrip: the same history through the legacy CSV backup

use chrono::{Duration, NaiveDate};
use dojo_core::{
    GradeEvaluator, GradeTable, Ledger, Member, MemberId, Shortfall, StickerProgression,
    StickerTable,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn today() -> NaiveDate {
    day(2024, 9, 1)
}

/// Ledger with one unit per day on the `count` days after `from`.
fn units_after(member: MemberId, from: NaiveDate, count: i64) -> Ledger {
    let mut ledger = Ledger::new();
    for i in 1..=count {
        ledger.record_attendance(&[member], from + Duration::days(i), false);
    }
    ledger
}

// =============================================================================
// GRADES
// =============================================================================

mod grades {
    use super::*;

    #[test]
    fn half_step_passes_on_units_alone() {
        let table = GradeTable::standard();
        let baseline = today() - Duration::days(30);
        let mut member = Member::new(MemberId(1), "Mia", "Wolf", day(2017, 4, 2), "9. Kyu weiss-gelb");
        member.last_exam_date = Some(baseline);
        let ledger = units_after(member.id, baseline, 12);

        let report = GradeEvaluator::new(&table)
            .evaluate(&member, &ledger, today())
            .expect("evaluate");

        assert_eq!(report.target_grade.as_deref(), Some("9. Kyu weiss-gelb mit Streifen"));
        assert!(report.passed);
        assert!(report.reasons().is_empty());
        assert_eq!(report.summary(), None);
        assert_eq!(report.detail_key(), None);
    }

    #[test]
    fn all_three_gates_fail_in_order() {
        let table = GradeTable::standard();
        let baseline = today() - Duration::days(40);
        // Six years old even with the grace months applied.
        let mut member = Member::new(MemberId(1), "Leo", "Hahn", day(2018, 1, 15), "8. Kyu gelb");
        member.last_exam_date = Some(baseline);
        let ledger = units_after(member.id, baseline, 4);

        let report = GradeEvaluator::new(&table)
            .evaluate(&member, &ledger, today())
            .expect("evaluate");

        assert!(!report.passed);
        assert_eq!(
            report.shortfalls,
            vec![
                Shortfall::Units { needed: 6 },
                Shortfall::Time { months: 2 },
                Shortfall::Age { age: 6, short: 1 },
            ]
        );
        assert_eq!(
            report.reasons(),
            vec![
                "6 more units needed".to_string(),
                "2 more months needed".to_string(),
                "age 6, 1 year short".to_string(),
            ]
        );
        assert_eq!(report.summary().as_deref(), Some("6 more units needed"));
        assert_eq!(report.detail_key(), Some("units"));
    }

    #[test]
    fn exact_thresholds_pass() {
        let table = GradeTable::standard();
        let baseline = day(2024, 6, 1);
        // Turns seven within the grace window.
        let mut member = Member::new(MemberId(1), "Ada", "Beck", day(2017, 11, 1), "8. Kyu gelb");
        member.last_exam_date = Some(baseline);
        let ledger = units_after(member.id, baseline, 10);

        let report = GradeEvaluator::new(&table)
            .evaluate(&member, &ledger, today())
            .expect("evaluate");

        assert_eq!(report.units_since_baseline, 10);
        assert_eq!(report.months_since_baseline, 3);
        assert_eq!(report.age, 7);
        assert!(report.passed);
    }

    #[test]
    fn exam_day_attendance_is_not_a_unit() {
        let table = GradeTable::standard();
        let baseline = day(2024, 6, 1);
        let mut member = Member::new(MemberId(1), "Ada", "Beck", day(2010, 1, 1), "8. Kyu gelb");
        member.last_exam_date = Some(baseline);

        let mut ledger = units_after(member.id, baseline, 9);
        ledger.record_attendance(&[member.id], day(2024, 8, 20), true);

        let report = GradeEvaluator::new(&table)
            .evaluate(&member, &ledger, today())
            .expect("evaluate");
        assert_eq!(report.shortfalls, vec![Shortfall::Units { needed: 1 }]);
    }

    #[test]
    fn first_attendance_is_baseline_without_exam() {
        let table = GradeTable::standard();
        let member = Member::new(MemberId(3), "Tim", "Ott", day(2016, 2, 2), "10. Kyu weiss");
        let first = day(2024, 7, 1);
        let mut ledger = units_after(member.id, first, 10);
        ledger.record_attendance(&[member.id], first, false);

        let report = GradeEvaluator::new(&table)
            .evaluate(&member, &ledger, today())
            .expect("evaluate");
        assert_eq!(report.baseline, Some(first));
        // The baseline day itself is not counted.
        assert_eq!(report.units_since_baseline, 10);
        assert!(report.passed);
    }
}

// =============================================================================
// STICKERS
// =============================================================================

mod stickers {
    use super::*;

    fn member_at(tier: u32) -> Member {
        let mut member = Member::new(MemberId(5), "Ole", "Fink", day(2012, 5, 5), "7. Kyu orange");
        member.sticker_tier = tier;
        member
    }

    #[test]
    fn first_award_at_twenty_five() {
        let table = StickerTable::standard();
        let progression = StickerProgression::new(&table);
        let member = member_at(0);

        assert_eq!(progression.check_award(&member, 24).expect("check"), None);
        assert_eq!(progression.check_award(&member, 25).expect("check"), Some(25));
    }

    #[test]
    fn top_tier_never_awards() {
        let table = StickerTable::standard();
        let progression = StickerProgression::new(&table);
        let member = member_at(800);

        for units in [0, 799, 800, 5_000, u64::MAX] {
            assert_eq!(progression.check_award(&member, units).expect("check"), None);
        }
    }

    #[test]
    fn caller_loop_reaches_same_tiers_as_pending() {
        let table = StickerTable::standard();
        let progression = StickerProgression::new(&table);
        let mut member = member_at(0);
        let trainer = MemberId(1).into();

        let pending = progression.pending_awards(&member, 160).expect("pending");
        let mut awarded = Vec::new();
        while let Some(tier) = progression.check_award(&member, 160).expect("check") {
            member = progression
                .apply_award(&member, tier, trainer, today())
                .expect("apply");
            awarded.push(tier);
        }

        assert_eq!(awarded, vec![25, 50, 75, 100, 150]);
        assert_eq!(awarded, pending);
        assert_eq!(member.sticker_awards.len(), 5);
    }
}

// =============================================================================
// ROUNDTRIP
// =============================================================================

mod roundtrip {
    use super::*;
    use dojo_core::formats::legacy::{export_attendance_csv, parse_attendance_csv};

    #[test]
    fn csv_backup_preserves_evaluation() {
        let table = GradeTable::standard();
        let baseline = today() - Duration::days(40);
        let mut member = Member::new(MemberId(1), "Leo", "Hahn", day(2018, 1, 15), "8. Kyu gelb");
        member.last_exam_date = Some(baseline);
        let mut ledger = units_after(member.id, baseline, 4);
        // Repeated id survives the backup and is still counted twice.
        ledger.record_attendance(&[member.id], baseline + Duration::days(1), false);

        let restored = parse_attendance_csv(&export_attendance_csv(&ledger)).expect("parse");
        let evaluator = GradeEvaluator::new(&table);
        assert_eq!(
            evaluator.evaluate(&member, &ledger, today()).expect("evaluate"),
            evaluator.evaluate(&member, &restored, today()).expect("evaluate"),
        );
    }
}
