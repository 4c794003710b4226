//! # Grade Evaluator
//!
//! Decides whether a member may be examined for the next grade and, if
//! not, why.
//!
//! Evaluation is a pure function of a member snapshot, a ledger snapshot,
//! the grade table and the current date:
//!
//! 1. Baseline = last exam date, else first attendance date. A member with
//!    neither (and no legacy units) has never trained; evaluation stops.
//! 2. Units since baseline = ledger units strictly after the baseline plus
//!    the member's reset offset.
//! 3. Three gates against the next grade's requirement, each evaluated
//!    independently in the order units, time, age. Zero months or zero age
//!    in the requirement disables that gate.
//!
//! The age gate looks [`AGE_GRACE_MONTHS`] ahead of today.

use crate::calendar::{add_months, whole_months_between, years_between};
use crate::ledger::Ledger;
use crate::primitives::AGE_GRACE_MONTHS;
use crate::rules::GradeTable;
use crate::{DojoError, Member};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// SHORTFALL
// =============================================================================

/// One reason a member is not ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum Shortfall {
    /// No exam and no attendance on record. Terminal: no gate was checked.
    NeverTrained,
    /// Units still missing.
    Units { needed: u64 },
    /// Whole months still missing.
    Time { months: u32 },
    /// Current age and years missing.
    Age { age: u32, short: u32 },
}

impl Shortfall {
    /// Short label for tabular display.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Shortfall::NeverTrained => "never trained",
            Shortfall::Units { .. } => "units",
            Shortfall::Time { .. } => "time",
            Shortfall::Age { .. } => "age",
        }
    }
}

fn plural(count: u64, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

impl std::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Shortfall::NeverTrained => write!(f, "never trained"),
            Shortfall::Units { needed } => write!(
                f,
                "{} more {} needed",
                needed,
                plural(needed, "unit", "units")
            ),
            Shortfall::Time { months } => write!(
                f,
                "{} more {} needed",
                months,
                plural(u64::from(months), "month", "months")
            ),
            Shortfall::Age { age, short } => write!(
                f,
                "age {}, {} {} short",
                age,
                short,
                plural(u64::from(short), "year", "years")
            ),
        }
    }
}

// =============================================================================
// ELIGIBILITY REPORT
// =============================================================================

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityReport {
    /// Grade the member would be examined for. `None` if never trained.
    pub target_grade: Option<String>,
    /// True iff no gate failed.
    pub passed: bool,
    /// Failed gates in units, time, age order.
    pub shortfalls: Vec<Shortfall>,
    /// Date the counts start from.
    pub baseline: Option<NaiveDate>,
    /// Units since the baseline, including the reset offset.
    pub units_since_baseline: i64,
    /// Whole months since the baseline.
    pub months_since_baseline: u32,
    /// Age used for the age gate.
    pub age: u32,
}

impl EligibilityReport {
    fn never_trained() -> Self {
        Self {
            target_grade: None,
            passed: false,
            shortfalls: vec![Shortfall::NeverTrained],
            baseline: None,
            units_since_baseline: 0,
            months_since_baseline: 0,
            age: 0,
        }
    }

    /// Human-readable reasons, one per failed gate.
    #[must_use]
    pub fn reasons(&self) -> Vec<String> {
        self.shortfalls.iter().map(ToString::to_string).collect()
    }

    /// First reason, for single-line display.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        self.shortfalls.first().map(ToString::to_string)
    }

    /// Label of the first failed gate.
    #[must_use]
    pub fn detail_key(&self) -> Option<&'static str> {
        self.shortfalls.first().map(Shortfall::label)
    }

    /// Check for the terminal never-trained outcome.
    #[must_use]
    pub fn is_never_trained(&self) -> bool {
        self.shortfalls == [Shortfall::NeverTrained]
    }
}

// =============================================================================
// GRADE EVALUATOR
// =============================================================================

/// Evaluates exam readiness against a grade table.
#[derive(Debug, Clone, Copy)]
pub struct GradeEvaluator<'a> {
    grades: &'a GradeTable,
}

impl<'a> GradeEvaluator<'a> {
    /// Create an evaluator over `grades`.
    #[must_use]
    pub fn new(grades: &'a GradeTable) -> Self {
        Self { grades }
    }

    /// Evaluate `member` for their next grade.
    ///
    /// # Errors
    ///
    /// - `UnknownGrade` if the member's grade is not in the table
    /// - `NoSuccessorGrade` if the member already holds the top grade
    /// - `InvalidDate` if the last exam lies after `today`
    pub fn evaluate(
        &self,
        member: &Member,
        ledger: &Ledger,
        today: NaiveDate,
    ) -> Result<EligibilityReport, DojoError> {
        let baseline = match member.last_exam_date {
            Some(date) if date > today => {
                return Err(DojoError::InvalidDate(format!(
                    "last exam {} of member {} is after {}",
                    date, member.id, today
                )));
            }
            Some(date) => date,
            None => {
                if ledger.total_units(member) == 0 {
                    return Ok(EligibilityReport::never_trained());
                }
                match ledger.first_attendance_date(member.id) {
                    Some(date) => date,
                    None => return Ok(EligibilityReport::never_trained()),
                }
            }
        };

        let units = ledger.count_units(member.id, Some(baseline)) as i64
            + i64::from(member.reset_offset);
        let months = whole_months_between(baseline, today);
        let age = years_between(
            member.birth_date,
            add_months(today, AGE_GRACE_MONTHS)?,
        );

        let next = self.grades.successor(&member.grade)?;

        let mut shortfalls = Vec::new();
        if units < i64::from(next.units) {
            shortfalls.push(Shortfall::Units {
                needed: (i64::from(next.units) - units) as u64,
            });
        }
        if next.months > 0 && months < next.months {
            shortfalls.push(Shortfall::Time {
                months: next.months - months,
            });
        }
        if next.age > 0 && age < next.age {
            shortfalls.push(Shortfall::Age {
                age,
                short: next.age - age,
            });
        }

        Ok(EligibilityReport {
            target_grade: Some(next.name.clone()),
            passed: shortfalls.is_empty(),
            shortfalls,
            baseline: Some(baseline),
            units_since_baseline: units,
            months_since_baseline: months,
            age,
        })
    }

    /// Move `member` to the next grade after an exam on `exam_date`.
    ///
    /// The exam date becomes the new baseline and the reset offset is
    /// cleared. The legacy total is untouched.
    pub fn promote(&self, member: &Member, exam_date: NaiveDate) -> Result<Member, DojoError> {
        if let Some(previous) = member.last_exam_date {
            if exam_date < previous {
                return Err(DojoError::InvalidDate(format!(
                    "exam {} precedes previous exam {}",
                    exam_date, previous
                )));
            }
        }
        let next = self.grades.successor(&member.grade)?;

        let mut promoted = member.clone();
        promoted.grade = next.name.clone();
        promoted.last_exam_date = Some(exam_date);
        promoted.reset_offset = 0;
        Ok(promoted)
    }
}

// =============================================================================
// TESTS
// =============================================================================
