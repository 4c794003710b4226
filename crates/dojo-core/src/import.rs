//! # Legacy Roster Import
//!
//! Reads the roster export of the previous system and plans how it maps
//! onto the current members.
//!
//! The file is semicolon-delimited:
//!
//! ```text
//! name;group;grade;birthdate;(unused);old-name;ex-member-marker
//! ```
//!
//! Names are either "Family, Given" or "Given Family". Birthdates are
//! `DD.MM.YYYY` or `YYYY-MM-DD`. A non-empty ex-member marker imports the
//! row as inactive.
//!
//! Planning is three linear passes over the rows:
//! 1. match the row name against current full names
//! 2. match the old name of still-unmatched rows
//! 3. everything left becomes a new member
//!
//! Each current member is claimed by at most one row.

use crate::primitives::{MAX_IMPORT_ROWS, MAX_NAME_LENGTH};
use crate::rules::GradeTable;
use crate::{DojoError, Member, NewMember};
use chrono::NaiveDate;

const BIRTHDATE_FORMATS: [&str; 2] = ["%d.%m.%Y", "%Y-%m-%d"];

/// One parsed roster line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    /// 1-based line number in the source file.
    pub line: usize,
    pub given_name: String,
    pub family_name: String,
    pub group: Option<String>,
    /// Empty if the legacy system had no grade for this person.
    pub grade: String,
    pub birth_date: NaiveDate,
    pub old_name: Option<String>,
    pub former_member: bool,
}

impl RosterRow {
    /// "Given Family".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

/// Result of matching a roster against the current members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPlan {
    /// Existing members with imported fields applied.
    pub updated: Vec<Member>,
    /// Rows that matched nobody.
    pub created: Vec<NewMember>,
    pub matched_by_name: usize,
    pub matched_by_old_name: usize,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_birthdate(text: &str) -> Option<NaiveDate> {
    BIRTHDATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text.trim(), fmt).ok())
}

fn split_name(name: &str) -> Option<(String, String)> {
    if let Some((family, given)) = name.split_once(',') {
        let (given, family) = (given.trim(), family.trim());
        if given.is_empty() || family.is_empty() {
            return None;
        }
        return Some((given.to_string(), family.to_string()));
    }
    let tokens: Vec<&str> = name.split_whitespace().collect();
    let (family, given) = tokens.split_last()?;
    if given.is_empty() {
        return None;
    }
    Some((given.join(" "), (*family).to_string()))
}

fn non_empty(field: Option<&&str>) -> Option<String> {
    field
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse the legacy roster file.
///
/// A first line whose birthdate column is not a date is treated as a
/// header and skipped.
pub fn parse_roster(text: &str) -> Result<Vec<RosterRow>, DojoError> {
    let mut rows = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let raw = raw.trim_end_matches('\r');
        if raw.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = raw.split(';').collect();
        let invalid = |reason: &str| DojoError::InvalidRow {
            line,
            reason: reason.to_string(),
        };

        if fields.len() < 4 {
            return Err(invalid("expected at least 4 fields"));
        }
        let Some(birth_date) = parse_birthdate(fields[3]) else {
            if index == 0 {
                continue;
            }
            return Err(invalid("unparsable birthdate"));
        };

        let name = fields[0].trim();
        if name.len() > MAX_NAME_LENGTH {
            return Err(invalid("name too long"));
        }
        let (given_name, family_name) = split_name(name).ok_or_else(|| invalid("incomplete name"))?;

        if rows.len() >= MAX_IMPORT_ROWS {
            return Err(invalid("too many rows"));
        }
        rows.push(RosterRow {
            line,
            given_name,
            family_name,
            group: non_empty(fields.get(1)),
            grade: fields[2].trim().to_string(),
            birth_date,
            old_name: non_empty(fields.get(5)),
            former_member: non_empty(fields.get(6)).is_some(),
        });
    }

    Ok(rows)
}

// =============================================================================
// PLANNING
// =============================================================================

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn find_unclaimed(members: &[Member], claimed: &[bool], name: &str) -> Option<usize> {
    let wanted = normalize(name);
    members
        .iter()
        .enumerate()
        .find(|(i, m)| !claimed[*i] && normalize(&m.full_name()) == wanted)
        .map(|(i, _)| i)
}

fn apply_row(member: &Member, row: &RosterRow) -> Member {
    let mut updated = member.clone();
    updated.given_name = row.given_name.clone();
    updated.family_name = row.family_name.clone();
    updated.birth_date = row.birth_date;
    updated.group = row.group.clone();
    if !row.grade.is_empty() {
        updated.grade = row.grade.clone();
    }
    updated.active = !row.former_member;
    updated
}

/// Match roster rows against `existing` members.
///
/// Every non-empty grade must be a key of `grades`; new members without a
/// grade start at the table's first grade.
pub fn plan_import(
    rows: &[RosterRow],
    existing: &[Member],
    grades: &GradeTable,
) -> Result<ImportPlan, DojoError> {
    for row in rows {
        if !row.grade.is_empty() && !grades.contains(&row.grade) {
            return Err(DojoError::UnknownGrade(row.grade.clone()));
        }
    }

    let mut claimed = vec![false; existing.len()];
    let mut assignment: Vec<Option<usize>> = vec![None; rows.len()];
    let mut plan = ImportPlan::default();

    // Pass 1: current name.
    for (r, row) in rows.iter().enumerate() {
        if let Some(m) = find_unclaimed(existing, &claimed, &row.full_name()) {
            claimed[m] = true;
            assignment[r] = Some(m);
            plan.matched_by_name += 1;
        }
    }

    // Pass 2: old name.
    for (r, row) in rows.iter().enumerate() {
        if assignment[r].is_some() {
            continue;
        }
        let Some(old_name) = &row.old_name else {
            continue;
        };
        if let Some(m) = find_unclaimed(existing, &claimed, old_name) {
            claimed[m] = true;
            assignment[r] = Some(m);
            plan.matched_by_old_name += 1;
        }
    }

    // Pass 3: apply matches, create the rest.
    let first_grade = grades
        .first()
        .map(|g| g.name.clone())
        .ok_or_else(|| DojoError::InvalidRules("grade table is empty".to_string()))?;

    for (row, slot) in rows.iter().zip(&assignment) {
        match slot {
            Some(m) => plan.updated.push(apply_row(&existing[*m], row)),
            None => plan.created.push(NewMember {
                given_name: row.given_name.clone(),
                family_name: row.family_name.clone(),
                birth_date: row.birth_date,
                grade: if row.grade.is_empty() {
                    first_grade.clone()
                } else {
                    row.grade.clone()
                },
                group: row.group.clone(),
                legacy_total: 0,
                active: !row.former_member,
            }),
        }
    }

    Ok(plan)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemberId;

    const ROSTER: &str = "\
Name;Gruppe;Grad;Geburtsdatum;Telefon;Alter Name;Ehemalig
Schmidt, Anna;Kinder;8. Kyu gelb;01.03.2015;;;
Lukas Meyer;Erwachsene;3. Kyu braun;1990-07-21;;Lukas Maier;
Weber, Tom;Kinder;;12.12.2016;;;x
";

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parses_both_name_styles() {
        let rows = parse_roster(ROSTER).expect("parse");
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].given_name, "Anna");
        assert_eq!(rows[0].family_name, "Schmidt");
        assert_eq!(rows[0].birth_date, day(2015, 3, 1));
        assert_eq!(rows[0].group.as_deref(), Some("Kinder"));

        assert_eq!(rows[1].full_name(), "Lukas Meyer");
        assert_eq!(rows[1].old_name.as_deref(), Some("Lukas Maier"));
        assert_eq!(rows[1].line, 3);

        assert!(rows[2].former_member);
        assert!(rows[2].grade.is_empty());
    }

    #[test]
    fn bad_birthdate_reports_line() {
        let text = "Anna Schmidt;Kinder;8. Kyu gelb;2015-03-01\nTom Weber;Kinder;;soon\n";
        assert!(matches!(
            parse_roster(text),
            Err(DojoError::InvalidRow { line: 2, .. })
        ));
    }

    #[test]
    fn three_pass_matching() {
        let rows = parse_roster(ROSTER).expect("parse");
        let existing = vec![
            Member::new(MemberId(1), "Lukas", "Maier", day(1990, 7, 21), "4. Kyu violett"),
            Member::new(MemberId(2), "anna", "schmidt", day(2015, 3, 1), "9. Kyu weiss-gelb"),
        ];

        let plan = plan_import(&rows, &existing, &GradeTable::standard()).expect("plan");
        assert_eq!(plan.matched_by_name, 1);
        assert_eq!(plan.matched_by_old_name, 1);

        let anna = plan.updated.iter().find(|m| m.id == MemberId(2)).expect("anna");
        assert_eq!(anna.grade, "8. Kyu gelb");
        let lukas = plan.updated.iter().find(|m| m.id == MemberId(1)).expect("lukas");
        assert_eq!(lukas.family_name, "Meyer");
        assert_eq!(lukas.grade, "3. Kyu braun");

        assert_eq!(plan.created.len(), 1);
        assert_eq!(plan.created[0].grade, "10. Kyu weiss");
        assert!(!plan.created[0].active);
    }

    #[test]
    fn unknown_grade_aborts_plan() {
        let rows = parse_roster("Anna Schmidt;Kinder;Gelbgurt;2015-03-01\n").expect("parse");
        assert!(matches!(
            plan_import(&rows, &[], &GradeTable::standard()),
            Err(DojoError::UnknownGrade(_))
        ));
    }
}
