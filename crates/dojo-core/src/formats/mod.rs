//! # Formats
//!
//! Byte and text encodings. Pure conversions; file I/O lives in the app.

pub mod legacy;
pub mod persistence;

#[cfg(feature = "crypto-hash")]
pub use persistence::snapshot_digest;
pub use persistence::{Snapshot, SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};
