//! # Legacy Text Codecs
//!
//! String encodings shared with the old roster database and the CSV
//! backups:
//!
//! - id list: `"3,17,17,42"` (repeats preserved, empty string = no ids)
//! - award history: `"25/4/2023-05-02,50/4/2023-11-20"` (tier/trainer/date)
//! - attendance backup: one line per date, `date;training ids;exam ids`
//!
//! Anything that does not parse is a data-integrity failure; these strings
//! come from storage, not from a user, and are never repaired.

use crate::ledger::Ledger;
use crate::{DojoError, MemberId, ParticipationRecord, StickerAward, TrainerId};
use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(text: &str) -> Result<NaiveDate, DojoError> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|e| DojoError::DataIntegrity(format!("bad date '{}': {}", text, e)))
}

// =============================================================================
// ID LIST
// =============================================================================

/// Join ids with commas.
#[must_use]
pub fn encode_id_list(ids: &[MemberId]) -> String {
    ids.iter()
        .map(|id| id.0.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Split a comma-joined id list.
pub fn parse_id_list(text: &str) -> Result<Vec<MemberId>, DojoError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(|token| {
            token
                .trim()
                .parse::<u64>()
                .map(MemberId)
                .map_err(|_| DojoError::DataIntegrity(format!("bad member id '{}'", token)))
        })
        .collect()
}

// =============================================================================
// AWARD HISTORY
// =============================================================================

/// Encode an award history.
#[must_use]
pub fn encode_award_history(awards: &[StickerAward]) -> String {
    awards
        .iter()
        .map(|a| {
            format!(
                "{}/{}/{}",
                a.tier,
                a.awarded_by.0,
                a.date.format(DATE_FORMAT)
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode an award history.
pub fn parse_award_history(text: &str) -> Result<Vec<StickerAward>, DojoError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(|entry| {
            let parts: Vec<&str> = entry.split('/').collect();
            let [tier, trainer, date] = parts.as_slice() else {
                return Err(DojoError::DataIntegrity(format!(
                    "award entry '{}' is not tier/trainer/date",
                    entry
                )));
            };
            let tier = tier.trim().parse::<u32>().map_err(|_| {
                DojoError::DataIntegrity(format!("bad sticker tier '{}'", tier))
            })?;
            let trainer = trainer.trim().parse::<u64>().map_err(|_| {
                DojoError::DataIntegrity(format!("bad trainer id '{}'", trainer))
            })?;
            Ok(StickerAward {
                tier,
                awarded_by: TrainerId(trainer),
                date: parse_date(date)?,
            })
        })
        .collect()
}

// =============================================================================
// ATTENDANCE BACKUP
// =============================================================================

/// Write the ledger as `date;training ids;exam ids` lines, oldest first.
#[must_use]
pub fn export_attendance_csv(ledger: &Ledger) -> String {
    let mut out = String::from("date;training;exam\n");
    for record in ledger.records() {
        out.push_str(&format!(
            "{};{};{}\n",
            record.date.format(DATE_FORMAT),
            encode_id_list(&record.training),
            encode_id_list(&record.exam)
        ));
    }
    out
}

/// Read an attendance backup back into a ledger.
///
/// The header line and blank lines are skipped. A repeated date is a
/// data-integrity failure.
pub fn parse_attendance_csv(text: &str) -> Result<Ledger, DojoError> {
    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || (index == 0 && line.starts_with("date;")) {
            continue;
        }
        let fields: Vec<&str> = line.split(';').collect();
        let [date, training, exam] = fields.as_slice() else {
            return Err(DojoError::DataIntegrity(format!(
                "line {}: expected 3 fields, got {}",
                index + 1,
                fields.len()
            )));
        };
        records.push(ParticipationRecord {
            date: parse_date(date)?,
            training: parse_id_list(training)?,
            exam: parse_id_list(exam)?,
        });
    }
    Ledger::from_records(records)
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
    fn id_list_keeps_repeats() {
        let ids = parse_id_list("3, 17,17,42").expect("parse");
        assert_eq!(ids, vec![MemberId(3), MemberId(17), MemberId(17), MemberId(42)]);
        assert_eq!(encode_id_list(&ids), "3,17,17,42");
        assert!(parse_id_list("").expect("empty").is_empty());
    }

    #[test]
    fn malformed_id_list_is_integrity_error() {
        assert!(matches!(
            parse_id_list("3,x,5"),
            Err(DojoError::DataIntegrity(_))
        ));
        assert!(matches!(parse_id_list("3,,5"), Err(DojoError::DataIntegrity(_))));
    }

    #[test]
    fn award_history_parses() {
        let awards = parse_award_history("25/4/2023-05-02,50/4/2023-11-20").expect("parse");
        assert_eq!(awards.len(), 2);
        assert_eq!(awards[1].tier, 50);
        assert_eq!(awards[1].awarded_by, TrainerId(4));
        assert_eq!(awards[1].date, day(2023, 11, 20));
        assert_eq!(encode_award_history(&awards), "25/4/2023-05-02,50/4/2023-11-20");
    }

    #[test]
    fn malformed_award_history_is_integrity_error() {
        for bad in ["x/4/2023-05-02", "25/4/02.05.2023", "25/4", "25/y/2023-05-02"] {
            assert!(
                matches!(parse_award_history(bad), Err(DojoError::DataIntegrity(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn attendance_backup_reads_back() {
        let mut ledger = Ledger::new();
        ledger.record_attendance(&[MemberId(1), MemberId(2)], day(2024, 1, 8), false);
        ledger.record_attendance(&[MemberId(2)], day(2024, 1, 8), true);
        ledger.record_attendance(&[MemberId(1)], day(2024, 1, 15), false);

        let text = export_attendance_csv(&ledger);
        assert!(text.contains("2024-01-08;1,2;2\n"));
        assert!(text.contains("2024-01-15;1;\n"));
        assert_eq!(parse_attendance_csv(&text).expect("parse"), ledger);
    }

    #[test]
    fn attendance_backup_rejects_repeated_dates() {
        let text = "2024-01-08;1;\n2024-01-08;2;\n";
        assert!(matches!(
            parse_attendance_csv(text),
            Err(DojoError::DataIntegrity(_))
        ));
    }
}
