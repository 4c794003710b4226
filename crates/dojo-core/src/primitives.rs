//! # Primitives
//!
//! Hardcoded runtime constants for the dojo core.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! Rule tables (grades, sticker tiers) are data, not primitives, and live in
//! [`crate::rules`].

/// Months added to "today" before computing a member's age for the age gate.
///
/// Exams are scheduled a few weeks after the readiness check; a child who
/// turns the required age before the exam is let through.
pub const AGE_GRACE_MONTHS: u32 = 2;

/// Magic bytes for the binary snapshot header.
///
/// - File Header = Magic Bytes ("DOJO") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"DOJO";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of a given or family name.
pub const MAX_NAME_LENGTH: usize = 128;

/// Maximum number of rows in a single roster import.
pub const MAX_IMPORT_ROWS: usize = 10_000;

/// Maximum number of ids in a single attendance submission.
pub const MAX_ATTENDANCE_IDS: usize = 1_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_grace_is_two_months() {
        assert_eq!(AGE_GRACE_MONTHS, 2);
    }

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"DOJO");
    }
}
