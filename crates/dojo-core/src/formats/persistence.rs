//! # Snapshot Format
//!
//! Binary backup of the whole roster and ledger.
//!
//! Format: Header (5 bytes) + postcard-serialized [`Snapshot`].
//! - 4 bytes: Magic ("DOJO")
//! - 1 byte: Version
//!
//! File I/O happens in the app layer; this module only converts bytes.
//! Size and header are validated before the payload is decoded.

use crate::ledger::Ledger;
use crate::{DojoError, Member, ParticipationRecord, primitives};
use serde::{Deserialize, Serialize};

/// Maximum accepted snapshot size (64 MB).
pub const MAX_SNAPSHOT_SIZE: usize = 64 * 1024 * 1024;

/// Header length in bytes.
const HEADER_LEN: usize = 5;

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Everything a store holds, in id / date order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub members: Vec<Member>,
    pub records: Vec<ParticipationRecord>,
}

impl Snapshot {
    /// Rebuild the ledger held by this snapshot.
    pub fn ledger(&self) -> Result<Ledger, DojoError> {
        Ledger::from_records(self.records.iter().cloned())
    }
}

// =============================================================================
// FILE HEADER
// =============================================================================

/// The header that precedes every snapshot.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Create a header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate magic and version.
    pub fn validate(&self) -> Result<(), DojoError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(DojoError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(DojoError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DojoError> {
        if bytes.len() < HEADER_LEN {
            return Err(DojoError::DeserializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a snapshot to bytes (header + payload).
pub fn snapshot_to_bytes(snapshot: &Snapshot) -> Result<Vec<u8>, DojoError> {
    let payload = postcard::to_stdvec(snapshot)
        .map_err(|e| DojoError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&SnapshotHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize a snapshot from bytes.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<Snapshot, DojoError> {
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(DojoError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| {
        DojoError::DeserializationError(format!("Failed to decode snapshot: {}", e))
    })
}

/// BLAKE3 digest of a serialized snapshot, hex encoded.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn snapshot_digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemberId;
    use chrono::NaiveDate;

    fn sample() -> Snapshot {
        let birth = NaiveDate::from_ymd_opt(2012, 2, 2).expect("date");
        let date = NaiveDate::from_ymd_opt(2024, 4, 8).expect("date");
        let mut record = ParticipationRecord::new(date);
        record.merge(&[MemberId(1), MemberId(1)], false);
        Snapshot {
            members: vec![Member::new(MemberId(1), "Jana", "Kühn", birth, "8. Kyu gelb")],
            records: vec![record],
        }
    }

    #[test]
    fn reserialization_is_bit_exact() {
        let bytes1 = snapshot_to_bytes(&sample()).expect("serialize");
        let restored = snapshot_from_bytes(&bytes1).expect("deserialize");
        let bytes2 = snapshot_to_bytes(&restored).expect("serialize again");

        assert_eq!(bytes1, bytes2);
        assert_eq!(restored, sample());
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = vec![0u8; 10];
        bytes[0..4].copy_from_slice(b"XXXX");
        assert!(snapshot_from_bytes(&bytes).is_err());
    }

    #[test]
    fn short_input_rejected() {
        assert!(matches!(
            snapshot_from_bytes(b"DOJ"),
            Err(DojoError::DeserializationError(_))
        ));
    }
}
