//! # Grade Table
//!
//! Ordered belt ranks and what it takes to reach each one.
//!
//! The order of the table is the promotion order: the grade after a
//! member's current grade is the one they are examined for. Each entry's
//! requirement applies to reaching *that* entry.
//!
//! | Grade | Months | Units | Age |
//! |-------|--------|-------|-----|
//! | 10. Kyu weiss | - | - | - |
//! | 10. Kyu weiss mit Streifen | - | 10 | - |
//! | 9. Kyu weiss-gelb | 3 | 10 | 6 |
//! | 9. Kyu weiss-gelb mit Streifen | - | 10 | - |
//! | 8. Kyu gelb | 3 | 10 | 6 |
//! | 7. Kyu orange | 3 | 10 | 7 |
//! | 6. Kyu grün | 4 | 20 | 8 |
//! | 5. Kyu blau | 6 | 30 | 10 |
//! | 4. Kyu violett | 6 | 30 | 12 |
//! | 3. Kyu braun | 9 | 40 | 14 |
//! | 2. Kyu braun | 9 | 40 | 15 |
//! | 1. Kyu braun | 12 | 50 | 16 |
//! | 1. Dan schwarz | 12 | 60 | 18 |
//!
//! Striped half-steps only exist for the children's belts and carry a
//! unit requirement alone.

use crate::DojoError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Built-in table: (name, months, units, age).
const STANDARD_GRADES: &[(&str, u32, u32, u32)] = &[
    ("10. Kyu weiss", 0, 0, 0),
    ("10. Kyu weiss mit Streifen", 0, 10, 0),
    ("9. Kyu weiss-gelb", 3, 10, 6),
    ("9. Kyu weiss-gelb mit Streifen", 0, 10, 0),
    ("8. Kyu gelb", 3, 10, 6),
    ("7. Kyu orange", 3, 10, 7),
    ("6. Kyu grün", 4, 20, 8),
    ("5. Kyu blau", 6, 30, 10),
    ("4. Kyu violett", 6, 30, 12),
    ("3. Kyu braun", 9, 40, 14),
    ("2. Kyu braun", 9, 40, 15),
    ("1. Kyu braun", 12, 50, 16),
    ("1. Dan schwarz", 12, 60, 18),
];

/// What a member needs to be examined for a grade.
///
/// A zero in `months` or `age` means the gate does not apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeRequirement {
    pub name: String,
    /// Minimum whole months since the previous exam.
    #[serde(default)]
    pub months: u32,
    /// Minimum training units since the previous exam.
    #[serde(default)]
    pub units: u32,
    /// Minimum age in years.
    #[serde(default)]
    pub age: u32,
}

impl GradeRequirement {
    /// Create a requirement.
    #[must_use]
    pub fn new(name: impl Into<String>, months: u32, units: u32, age: u32) -> Self {
        Self {
            name: name.into(),
            months,
            units,
            age,
        }
    }

    /// Half-steps only ask for units.
    #[must_use]
    pub fn is_transitional(&self) -> bool {
        self.months == 0 && self.age == 0
    }
}

/// Immutable, ordered grade table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeTable {
    grades: Vec<GradeRequirement>,
}

impl GradeTable {
    /// Build a table, checking that it is non-empty and names are unique.
    pub fn new(grades: Vec<GradeRequirement>) -> Result<Self, DojoError> {
        if grades.is_empty() {
            return Err(DojoError::InvalidRules(
                "grade table is empty".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for grade in &grades {
            if grade.name.trim().is_empty() {
                return Err(DojoError::InvalidRules(
                    "grade name is empty".to_string(),
                ));
            }
            if !seen.insert(grade.name.as_str()) {
                return Err(DojoError::InvalidRules(format!(
                    "duplicate grade: {}",
                    grade.name
                )));
            }
        }
        Ok(Self { grades })
    }

    /// The school's standard table.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            grades: STANDARD_GRADES
                .iter()
                .map(|&(name, months, units, age)| GradeRequirement::new(name, months, units, age))
                .collect(),
        }
    }

    /// Number of grades.
    #[must_use]
    pub fn len(&self) -> usize {
        self.grades.len()
    }

    /// Always false for a constructed table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }

    /// Iterate grades in promotion order.
    pub fn iter(&self) -> impl Iterator<Item = &GradeRequirement> {
        self.grades.iter()
    }

    /// The entry grade given to new members.
    #[must_use]
    pub fn first(&self) -> Option<&GradeRequirement> {
        self.grades.first()
    }

    /// Index of a grade in promotion order.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.grades.iter().position(|g| g.name == name)
    }

    /// Check if `name` is a key of this table.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Look up a grade by name.
    pub fn get(&self, name: &str) -> Result<&GradeRequirement, DojoError> {
        self.grades
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| DojoError::UnknownGrade(name.to_string()))
    }

    /// The grade a member holding `name` is examined for next.
    pub fn successor(&self, name: &str) -> Result<&GradeRequirement, DojoError> {
        let index = self
            .position(name)
            .ok_or_else(|| DojoError::UnknownGrade(name.to_string()))?;
        self.grades
            .get(index + 1)
            .ok_or_else(|| DojoError::NoSuccessorGrade(name.to_string()))
    }

    /// Check if `name` is the highest grade.
    pub fn is_terminal(&self, name: &str) -> Result<bool, DojoError> {
        let index = self
            .position(name)
            .ok_or_else(|| DojoError::UnknownGrade(name.to_string()))?;
        Ok(index + 1 == self.grades.len())
    }
}

impl Default for GradeTable {
    fn default() -> Self {
        Self::standard()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_is_valid() {
        let grades: Vec<_> = GradeTable::standard().iter().cloned().collect();
        assert!(GradeTable::new(grades).is_ok());
    }

    #[test]
    fn successor_is_next_entry() {
        let table = GradeTable::standard();
        let next = table.successor("8. Kyu gelb").expect("successor");
        assert_eq!(next.name, "7. Kyu orange");
        assert_eq!((next.months, next.units, next.age), (3, 10, 7));
    }

    #[test]
    fn striped_steps_are_transitional() {
        let table = GradeTable::standard();
        let next = table.successor("9. Kyu weiss-gelb").expect("successor");
        assert!(next.is_transitional());
        assert_eq!(next.units, 10);
        assert!(!table.get("8. Kyu gelb").expect("grade").is_transitional());
    }

    #[test]
    fn top_grade_has_no_successor() {
        let table = GradeTable::standard();
        assert!(matches!(
            table.successor("1. Dan schwarz"),
            Err(DojoError::NoSuccessorGrade(_))
        ));
        assert!(table.is_terminal("1. Dan schwarz").expect("known"));
        assert!(!table.is_terminal("10. Kyu weiss").expect("known"));
    }

    #[test]
    fn unknown_grade_rejected() {
        let table = GradeTable::standard();
        assert!(matches!(
            table.successor("Gürtel"),
            Err(DojoError::UnknownGrade(_))
        ));
    }

    #[test]
    fn duplicate_names_rejected() {
        let grades = vec![
            GradeRequirement::new("A", 0, 0, 0),
            GradeRequirement::new("A", 1, 1, 1),
        ];
        assert!(matches!(
            GradeTable::new(grades),
            Err(DojoError::InvalidRules(_))
        ));
        assert!(GradeTable::new(Vec::new()).is_err());
    }
}
