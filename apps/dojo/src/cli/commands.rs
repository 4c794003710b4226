//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Every command opens the redb database named by the configuration,
//! does its work through [`Dojo`] and prints either text or JSON.

use crate::api::{self, AppState};
use crate::config::Config;
use chrono::NaiveDate;
use dojo_core::{
    Dojo, DojoError, EligibilityReport, Member, MemberId, NewMember, TrainerId,
    formats::{
        legacy::export_attendance_csv,
        persistence::MAX_SNAPSHOT_SIZE,
        snapshot_digest, snapshot_from_bytes, snapshot_to_bytes,
    },
    parse_roster,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum roster file size (10 MB).
const MAX_ROSTER_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), DojoError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| DojoError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(DojoError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path and make sure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, DojoError> {
    let canonical = path.canonicalize().map_err(|e| {
        DojoError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(DojoError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path; its directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, DojoError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        DojoError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(DojoError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| DojoError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// CONTEXT
// =============================================================================

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub database: PathBuf,
    pub json_mode: bool,
}

impl Context {
    /// `database` overrides the configured path.
    pub fn new(config: Config, database: Option<PathBuf>, json_mode: bool) -> Self {
        let database = database.unwrap_or_else(|| config.database.path.clone());
        Self {
            config,
            database,
            json_mode,
        }
    }

    /// Open the database with the configured rule tables.
    pub fn open(&self) -> Result<Dojo, DojoError> {
        let grades = self.config.grade_table()?;
        let stickers = self.config.sticker_table()?;
        Dojo::with_redb(&self.database)?.with_rules(grades, stickers)
    }
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    ctx: &Context,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), DojoError> {
    let dojo = ctx.open()?;
    let host = host.unwrap_or_else(|| ctx.config.server.host.clone());
    let port = port.unwrap_or(ctx.config.server.port);

    println!("Dojo Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", host);
    println!("  Port:       {}", port);
    println!("  Database:   {}", ctx.database.display());
    println!("  Rate limit: {}/s", ctx.config.server.rate_limit);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = AppState::new(dojo)
        .with_admin_password(ctx.config.admin_password())
        .with_rate_limit(ctx.config.server.rate_limit);
    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state).await
}

// =============================================================================
// STATUS / INIT
// =============================================================================

/// Show roster and ledger counts.
pub fn cmd_status(ctx: &Context) -> Result<(), DojoError> {
    let dojo = ctx.open()?;
    let members = dojo.member_count()?;
    let active = dojo.active_members()?.len();
    let records = dojo.record_count()?;

    if ctx.json_mode {
        print_json(&serde_json::json!({
            "database": ctx.database.to_string_lossy(),
            "member_count": members,
            "active_members": active,
            "record_count": records,
            "grades": dojo.grades().len(),
            "top_sticker": dojo.stickers().max_threshold(),
        }));
        return Ok(());
    }

    println!("Dojo Status");
    println!("===========");
    println!("Database: {}", ctx.database.display());
    println!();
    println!("Members:        {} ({} active)", members, active);
    println!("Training days:  {}", records);
    println!("Grades:         {}", dojo.grades().len());
    println!("Top sticker:    {}", dojo.stickers().max_threshold());

    Ok(())
}

/// Initialize a new database.
pub fn cmd_init(ctx: &Context, force: bool) -> Result<(), DojoError> {
    if ctx.database.exists() {
        if !force {
            return Err(DojoError::IoError(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(&ctx.database)
            .map_err(|e| DojoError::IoError(format!("Remove database: {}", e)))?;
    }
    ctx.open()?;
    println!("Initialized new database at {}", ctx.database.display());
    Ok(())
}

// =============================================================================
// ROSTER COMMANDS
// =============================================================================

fn member_line(member: &Member) -> String {
    format!(
        "{:>5}  {:<28} {:<32} {}",
        member.id.0,
        member.full_name(),
        member.grade,
        if member.active { "" } else { "(inactive)" }
    )
}

/// List members.
pub fn cmd_members(ctx: &Context, all: bool) -> Result<(), DojoError> {
    let dojo = ctx.open()?;
    let members = if all {
        dojo.members()?
    } else {
        dojo.active_members()?
    };

    if ctx.json_mode {
        print_json(&serde_json::to_value(&members).unwrap_or_default());
        return Ok(());
    }

    for member in &members {
        println!("{}", member_line(member));
    }
    println!("{} member(s)", members.len());
    Ok(())
}

/// Add a member.
pub fn cmd_add_member(
    ctx: &Context,
    given_name: String,
    family_name: String,
    birth_date: NaiveDate,
    grade: Option<String>,
    group: Option<String>,
    legacy_total: u32,
) -> Result<(), DojoError> {
    let mut dojo = ctx.open()?;
    let grade = match grade {
        Some(g) => g,
        None => dojo
            .grades()
            .first()
            .map(|g| g.name.clone())
            .ok_or_else(|| DojoError::InvalidRules("grade table is empty".to_string()))?,
    };

    let member = dojo.add_member(NewMember {
        given_name,
        family_name,
        birth_date,
        grade,
        group,
        legacy_total,
        active: true,
    })?;
    tracing::info!(member = member.id.0, "Member added");
    println!("Added {}", member_line(&member));
    Ok(())
}

/// Deactivate a member.
pub fn cmd_deactivate(ctx: &Context, id: u64) -> Result<(), DojoError> {
    let mut dojo = ctx.open()?;
    let member = dojo.deactivate(MemberId(id))?;
    tracing::info!(member = id, "Member deactivated");
    println!("Deactivated {}", member.full_name());
    Ok(())
}

// =============================================================================
// ATTENDANCE COMMAND
// =============================================================================

/// Record attendance for a day.
pub fn cmd_attend(
    ctx: &Context,
    date: Option<NaiveDate>,
    exam: bool,
    ids: &[u64],
) -> Result<(), DojoError> {
    let mut dojo = ctx.open()?;
    let date = date.unwrap_or_else(crate::today);
    let ids: Vec<MemberId> = ids.iter().copied().map(MemberId).collect();

    let outcome = dojo.record_attendance(&ids, date, exam)?;
    if !outcome.repeated.is_empty() {
        tracing::warn!(
            date = %date,
            repeated = ?outcome.repeated,
            "Attendance resubmitted; repeated ids are counted twice"
        );
    }

    println!(
        "Recorded {} {} for {}",
        outcome.recorded,
        if exam { "exam attendee(s)" } else { "unit(s)" },
        date
    );
    Ok(())
}

// =============================================================================
// EVALUATE COMMAND
// =============================================================================

fn report_json(member: &Member, report: &EligibilityReport) -> serde_json::Value {
    serde_json::json!({
        "member_id": member.id.0,
        "name": member.full_name(),
        "grade": member.grade,
        "target_grade": report.target_grade,
        "passed": report.passed,
        "reasons": report.reasons(),
        "baseline": report.baseline,
        "units_since_baseline": report.units_since_baseline,
        "months_since_baseline": report.months_since_baseline,
        "age": report.age,
    })
}

/// Exam readiness for one or all members.
pub fn cmd_evaluate(
    ctx: &Context,
    member: Option<u64>,
    today: Option<NaiveDate>,
) -> Result<(), DojoError> {
    let dojo = ctx.open()?;
    let today = today.unwrap_or_else(crate::today);

    if let Some(id) = member {
        let member = dojo.member(MemberId(id))?;
        if dojo.grades().is_terminal(&member.grade)? {
            println!("{} holds the top grade", member.full_name());
            return Ok(());
        }
        let report = dojo.evaluate(member.id, today)?;

        if ctx.json_mode {
            print_json(&report_json(&member, &report));
            return Ok(());
        }

        println!("{} ({})", member.full_name(), member.grade);
        match &report.target_grade {
            Some(target) => println!("Next grade: {}", target),
            None => println!("Next grade: -"),
        }
        if let Some(baseline) = report.baseline {
            println!("Since:      {}", baseline);
            println!("Units:      {}", report.units_since_baseline);
            println!("Months:     {}", report.months_since_baseline);
        }
        if report.passed {
            println!("Ready for exam");
        } else {
            for reason in report.reasons() {
                println!("  - {}", reason);
            }
        }
        return Ok(());
    }

    let reports = dojo.evaluate_all(today)?;
    if ctx.json_mode {
        let all: Vec<_> = reports.iter().map(|(m, r)| report_json(m, r)).collect();
        print_json(&serde_json::Value::Array(all));
        return Ok(());
    }

    for (member, report) in &reports {
        let status = if report.passed {
            "ready".to_string()
        } else {
            report.summary().unwrap_or_default()
        };
        println!(
            "{:>5}  {:<28} {:<32} {}",
            member.id.0,
            member.full_name(),
            report.target_grade.as_deref().unwrap_or("-"),
            status
        );
    }
    let ready = reports.iter().filter(|(_, r)| r.passed).count();
    println!("{} of {} ready for exam", ready, reports.len());
    Ok(())
}

// =============================================================================
// STICKER COMMANDS
// =============================================================================

/// Sticker position for one member, or every award due.
pub fn cmd_stickers(ctx: &Context, member: Option<u64>) -> Result<(), DojoError> {
    let dojo = ctx.open()?;

    let statuses = match member {
        Some(id) => vec![dojo.sticker_status(MemberId(id))?],
        None => dojo.due_stickers()?,
    };

    if ctx.json_mode {
        let all: Vec<_> = statuses
            .iter()
            .map(|s| {
                serde_json::json!({
                    "member_id": s.member.0,
                    "total_units": s.total_units,
                    "current_tier": s.current_tier,
                    "due": s.due,
                    "pending": s.pending,
                })
            })
            .collect();
        print_json(&serde_json::Value::Array(all));
        return Ok(());
    }

    for status in &statuses {
        let tier_name = dojo.stickers().get(status.current_tier)?.name.clone();
        let due = match status.due {
            Some(tier) => format!("due: {}", tier),
            None => "nothing due".to_string(),
        };
        println!(
            "{:>5}  {:>5} units  {:<16} {}",
            status.member.0, status.total_units, tier_name, due
        );
    }
    Ok(())
}

/// Award the next due sticker.
pub fn cmd_award(
    ctx: &Context,
    member: u64,
    trainer: u64,
    date: Option<NaiveDate>,
) -> Result<(), DojoError> {
    let mut dojo = ctx.open()?;
    let date = date.unwrap_or_else(crate::today);

    match dojo.award(MemberId(member), TrainerId(trainer), date)? {
        Some(updated) => {
            tracing::info!(member, trainer, tier = updated.sticker_tier, "Sticker awarded");
            let name = &dojo.stickers().get(updated.sticker_tier)?.name;
            println!(
                "{} earned the {} sticker ({})",
                updated.full_name(),
                name,
                updated.sticker_tier
            );
            let still_due = dojo.sticker_status(updated.id)?.pending;
            if !still_due.is_empty() {
                println!("Still due: {:?}", still_due);
            }
        }
        None => println!("No sticker due"),
    }
    Ok(())
}

// =============================================================================
// PROMOTE COMMAND
// =============================================================================

/// Move a member to the next grade.
pub fn cmd_promote(ctx: &Context, member: u64, date: Option<NaiveDate>) -> Result<(), DojoError> {
    let mut dojo = ctx.open()?;
    let today = crate::today();
    let exam_date = date.unwrap_or(today);

    let before = dojo.member(MemberId(member))?;
    let promoted = dojo.promote(before.id, exam_date, today)?;
    tracing::info!(
        member,
        from = %before.grade,
        to = %promoted.grade,
        exam = %exam_date,
        "Member promoted"
    );
    println!(
        "{}: {} -> {}",
        promoted.full_name(),
        before.grade,
        promoted.grade
    );
    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Import the legacy roster.
pub fn cmd_import(ctx: &Context, file: &Path, dry_run: bool) -> Result<(), DojoError> {
    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_ROSTER_FILE_SIZE)?;

    let bytes = std::fs::read(&validated_path)
        .map_err(|e| DojoError::IoError(format!("Read file: {}", e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| DojoError::DeserializationError(format!("Roster is not UTF-8: {}", e)))?;
    let rows = parse_roster(&text)?;

    let mut dojo = ctx.open()?;
    let plan = dojo.plan_import(&rows)?;

    println!("Rows:             {}", rows.len());
    println!("Matched by name:  {}", plan.matched_by_name);
    println!("Matched by old:   {}", plan.matched_by_old_name);
    println!("New members:      {}", plan.created.len());

    if dry_run {
        println!("Dry run, nothing written");
        return Ok(());
    }

    let summary = dojo.apply_import(plan)?;
    tracing::info!(
        updated = summary.updated,
        created = summary.created,
        "Roster imported from {}",
        validated_path.display()
    );
    println!("Imported {} row(s)", summary.updated + summary.created);
    Ok(())
}

// =============================================================================
// EXPORT / RESTORE
// =============================================================================

/// Write a backup.
pub fn cmd_export(ctx: &Context, output: Option<PathBuf>, format: &str) -> Result<(), DojoError> {
    let extension = match format {
        "snapshot" => "dojo",
        "attendance-csv" => "csv",
        _ => {
            return Err(DojoError::SerializationError(format!(
                "Unknown format: {}. Use: snapshot, attendance-csv",
                format
            )));
        }
    };
    let output = output.unwrap_or_else(|| {
        ctx.config
            .export
            .path
            .join(format!("dojo-{}.{}", crate::today(), extension))
    });
    let validated_output = validate_output_path(&output)?;

    let dojo = ctx.open()?;
    let data = if format == "snapshot" {
        let data = snapshot_to_bytes(&dojo.snapshot()?)?;
        println!("Digest: {}", snapshot_digest(&data));
        data
    } else {
        export_attendance_csv(&dojo.ledger()?).into_bytes()
    };

    std::fs::write(&validated_output, &data)
        .map_err(|e| DojoError::IoError(format!("Write file: {}", e)))?;

    tracing::info!(bytes = data.len(), format, "Backup written");
    println!("Exported {} bytes to {}", data.len(), validated_output.display());
    Ok(())
}

/// Replace all data with a snapshot backup.
pub fn cmd_restore(ctx: &Context, input: &Path) -> Result<(), DojoError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_SNAPSHOT_SIZE as u64)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| DojoError::IoError(format!("Read file: {}", e)))?;
    let snapshot = snapshot_from_bytes(&data)?;
    let (members, records) = (snapshot.members.len(), snapshot.records.len());

    let mut dojo = ctx.open()?;
    dojo.restore(snapshot)?;

    tracing::info!(members, records, "Snapshot restored");
    println!("Restored {} members and {} training days", members, records);
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn context(dir: &Path) -> Context {
        Context::new(Config::default(), Some(dir.join("dojo.redb")), false)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn init_refuses_existing_database() {
        let temp = tempdir().expect("temp dir");
        let ctx = context(temp.path());
        cmd_init(&ctx, false).expect("first init");
        assert!(cmd_init(&ctx, false).is_err());
        cmd_init(&ctx, true).expect("forced init");
    }

    #[test]
    fn add_member_defaults_to_first_grade() {
        let temp = tempdir().expect("temp dir");
        let ctx = context(temp.path());
        cmd_add_member(
            &ctx,
            "Lena".to_string(),
            "Koch".to_string(),
            day(2015, 5, 1),
            None,
            Some("Kinder".to_string()),
            0,
        )
        .expect("add");

        let dojo = ctx.open().expect("open");
        let member = dojo.member(MemberId(1)).expect("member");
        assert_eq!(member.grade, "10. Kyu weiss");
        assert_eq!(member.group.as_deref(), Some("Kinder"));
    }

    #[test]
    fn import_then_export_csv() {
        let temp = tempdir().expect("temp dir");
        let ctx = context(temp.path());
        let roster = temp.path().join("roster.csv");
        std::fs::write(
            &roster,
            "Name;Gruppe;Grad;Geburtsdatum\nKoch, Lena;Kinder;8. Kyu gelb;01.05.2015\n",
        )
        .expect("write roster");

        cmd_import(&ctx, &roster, true).expect("dry run");
        assert_eq!(ctx.open().expect("open").member_count().expect("count"), 0);

        cmd_import(&ctx, &roster, false).expect("import");
        cmd_attend(&ctx, Some(day(2024, 2, 1)), false, &[1]).expect("attend");

        let out = temp.path().join("attendance.csv");
        cmd_export(&ctx, Some(out.clone()), "attendance-csv").expect("export");
        let written = std::fs::read_to_string(out).expect("read");
        assert!(written.contains("2024-02-01;1;"));
    }

    #[test]
    fn snapshot_export_restores() {
        let temp = tempdir().expect("temp dir");
        let ctx = context(temp.path());
        cmd_add_member(
            &ctx,
            "Lena".to_string(),
            "Koch".to_string(),
            day(2015, 5, 1),
            None,
            None,
            30,
        )
        .expect("add");

        let out = temp.path().join("backup.dojo");
        cmd_export(&ctx, Some(out.clone()), "snapshot").expect("export");

        let other = Context::new(Config::default(), Some(temp.path().join("other.redb")), false);
        cmd_restore(&other, &out).expect("restore");
        let member = other.open().expect("open").member(MemberId(1)).expect("member");
        assert_eq!(member.legacy_total, 30);
    }

    #[test]
    fn restore_rejects_snapshot_with_unknown_grade() {
        let temp = tempdir().expect("temp dir");
        let ctx = context(temp.path());
        cmd_add_member(
            &ctx,
            "Lena".to_string(),
            "Koch".to_string(),
            day(2015, 5, 1),
            None,
            None,
            0,
        )
        .expect("add");

        let bad = Member::new(MemberId(1), "Lia", "Roth", day(2012, 1, 1), "Gelbgurt");
        let snapshot = dojo_core::Snapshot {
            members: vec![bad],
            records: Vec::new(),
        };
        let file = temp.path().join("bad.dojo");
        std::fs::write(&file, snapshot_to_bytes(&snapshot).expect("encode")).expect("write");

        assert!(matches!(
            cmd_restore(&ctx, &file),
            Err(DojoError::UnknownGrade(_))
        ));
        let member = ctx.open().expect("open").member(MemberId(1)).expect("member");
        assert_eq!(member.given_name, "Lena");
    }

    #[test]
    fn open_rejects_grade_table_missing_stored_grade() {
        let temp = tempdir().expect("temp dir");
        let ctx = context(temp.path());
        cmd_add_member(
            &ctx,
            "Lena".to_string(),
            "Koch".to_string(),
            day(2015, 5, 1),
            Some("8. Kyu gelb".to_string()),
            None,
            0,
        )
        .expect("add");

        let config = Config::from_toml(
            r#"
            [[grades]]
            name = "10. Kyu weiss"

            [[grades]]
            name = "9. Kyu weiss-gelb"
            months = 3
            units = 10
            age = 6
            "#,
        )
        .expect("config");
        let narrowed = Context::new(config, Some(ctx.database.clone()), false);
        assert!(matches!(narrowed.open(), Err(DojoError::UnknownGrade(_))));
    }

    #[test]
    fn unknown_export_format_rejected() {
        let temp = tempdir().expect("temp dir");
        let ctx = context(temp.path());
        assert!(cmd_export(&ctx, Some(temp.path().join("x")), "xml").is_err());
    }
}
