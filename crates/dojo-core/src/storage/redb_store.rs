//! # redb-backed Store
//!
//! A disk-backed [`DojoStore`] using the redb embedded database.
//!
//! Every mutation runs in a single write transaction, so a crash leaves
//! either the old state or the new state on disk:
//! - members are postcard blobs keyed by id
//! - participation records are postcard blobs keyed by day number
//! - the next free member id lives in the metadata table
//!
//! Attendance for an existing day is read, merged and written back inside
//! the same transaction.

use super::{DojoStore, validate_names};
use crate::ledger::Ledger;
use crate::{DojoError, Member, MemberId, NewMember, ParticipationRecord};
use chrono::{Datelike, NaiveDate};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;

/// Table for members: MemberId(u64) -> serialized Member bytes
const MEMBERS: TableDefinition<u64, &[u8]> = TableDefinition::new("members");

/// Table for attendance: days since 0001-01-01 -> serialized ParticipationRecord
const PARTICIPATION: TableDefinition<i32, &[u8]> = TableDefinition::new("participation");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_MEMBER_ID: &str = "next_member_id";

fn io(e: impl std::fmt::Display) -> DojoError {
    DojoError::IoError(e.to_string())
}

fn day_key(date: NaiveDate) -> i32 {
    date.num_days_from_ce()
}

/// A disk-backed roster and ledger.
pub struct RedbStore {
    db: Database,
    next_member_id: u64,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("next_member_id", &self.next_member_id)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DojoError> {
        let db = Database::create(path.as_ref()).map_err(io)?;

        {
            let write_txn = db.begin_write().map_err(io)?;
            let _ = write_txn.open_table(MEMBERS).map_err(io)?;
            let _ = write_txn.open_table(PARTICIPATION).map_err(io)?;
            let _ = write_txn.open_table(METADATA).map_err(io)?;
            write_txn.commit().map_err(io)?;
        }

        let read_txn = db.begin_read().map_err(io)?;
        let next_member_id = {
            let table = read_txn.open_table(METADATA).map_err(io)?;
            table
                .get(NEXT_MEMBER_ID)
                .map_err(io)?
                .map(|v| v.value())
                .unwrap_or(1)
        };

        Ok(Self { db, next_member_id })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), DojoError> {
        self.db.compact().map_err(io)?;
        Ok(())
    }

    /// Replace the whole content with a snapshot.
    ///
    /// Runs in one transaction; on error the previous content is kept.
    pub fn restore(&mut self, snapshot: &crate::formats::Snapshot) -> Result<(), DojoError> {
        // Validates dates before anything is written.
        let ledger = snapshot.ledger()?;
        let next_member_id = snapshot
            .members
            .iter()
            .map(|m| m.id.0)
            .max()
            .map_or(1, |max| max.saturating_add(1));

        let write_txn = self.db.begin_write().map_err(io)?;
        {
            write_txn.delete_table(MEMBERS).map_err(io)?;
            write_txn.delete_table(PARTICIPATION).map_err(io)?;

            let mut members = write_txn.open_table(MEMBERS).map_err(io)?;
            for member in &snapshot.members {
                validate_names(&member.given_name, &member.family_name)?;
                let bytes = postcard::to_allocvec(member)
                    .map_err(|e| DojoError::SerializationError(e.to_string()))?;
                if members.insert(member.id.0, bytes.as_slice()).map_err(io)?.is_some() {
                    return Err(DojoError::DataIntegrity(format!(
                        "duplicate member id {}",
                        member.id
                    )));
                }
            }

            let mut participation = write_txn.open_table(PARTICIPATION).map_err(io)?;
            for record in ledger.records() {
                let bytes = postcard::to_allocvec(record)
                    .map_err(|e| DojoError::SerializationError(e.to_string()))?;
                participation
                    .insert(day_key(record.date), bytes.as_slice())
                    .map_err(io)?;
            }

            let mut meta = write_txn.open_table(METADATA).map_err(io)?;
            meta.insert(NEXT_MEMBER_ID, next_member_id).map_err(io)?;
        }
        write_txn.commit().map_err(io)?;

        self.next_member_id = next_member_id;
        Ok(())
    }

    fn write_member(&self, member: &Member, must_exist: bool) -> Result<(), DojoError> {
        let bytes = postcard::to_allocvec(member)
            .map_err(|e| DojoError::SerializationError(e.to_string()))?;

        let write_txn = self.db.begin_write().map_err(io)?;
        {
            let mut table = write_txn.open_table(MEMBERS).map_err(io)?;
            if must_exist && table.get(member.id.0).map_err(io)?.is_none() {
                return Err(DojoError::MemberNotFound(member.id));
            }
            table.insert(member.id.0, bytes.as_slice()).map_err(io)?;
        }
        write_txn.commit().map_err(io)?;
        Ok(())
    }
}

impl DojoStore for RedbStore {
    fn insert_member(&mut self, new: NewMember) -> Result<Member, DojoError> {
        validate_names(&new.given_name, &new.family_name)?;
        let id = MemberId(self.next_member_id);
        let next = self.next_member_id.saturating_add(1);
        let member = new.into_member(id);
        let bytes = postcard::to_allocvec(&member)
            .map_err(|e| DojoError::SerializationError(e.to_string()))?;

        let write_txn = self.db.begin_write().map_err(io)?;
        {
            let mut table = write_txn.open_table(MEMBERS).map_err(io)?;
            table.insert(id.0, bytes.as_slice()).map_err(io)?;
            let mut meta = write_txn.open_table(METADATA).map_err(io)?;
            meta.insert(NEXT_MEMBER_ID, next).map_err(io)?;
        }
        write_txn.commit().map_err(io)?;

        // In-memory counter moves only after a successful commit.
        self.next_member_id = next;
        Ok(member)
    }

    fn update_member(&mut self, member: &Member) -> Result<(), DojoError> {
        validate_names(&member.given_name, &member.family_name)?;
        self.write_member(member, true)
    }

    fn get_member(&self, id: MemberId) -> Result<Option<Member>, DojoError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(MEMBERS).map_err(io)?;
        match table.get(id.0).map_err(io)? {
            Some(data) => {
                let member: Member = postcard::from_bytes(data.value())
                    .map_err(|e| DojoError::DeserializationError(e.to_string()))?;
                Ok(Some(member))
            }
            None => Ok(None),
        }
    }

    fn members(&self) -> Result<Vec<Member>, DojoError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(MEMBERS).map_err(io)?;
        let mut members = Vec::new();
        for entry in table.iter().map_err(io)? {
            let (_, value) = entry.map_err(io)?;
            let member: Member = postcard::from_bytes(value.value())
                .map_err(|e| DojoError::DeserializationError(e.to_string()))?;
            members.push(member);
        }
        Ok(members)
    }

    fn record_attendance(
        &mut self,
        ids: &[MemberId],
        date: NaiveDate,
        is_exam: bool,
    ) -> Result<Vec<MemberId>, DojoError> {
        let key = day_key(date);
        let write_txn = self.db.begin_write().map_err(io)?;
        let repeated = {
            let mut table = write_txn.open_table(PARTICIPATION).map_err(io)?;
            let stored = table.get(key).map_err(io)?.map(|v| v.value().to_vec());
            let mut record = match stored {
                Some(bytes) => postcard::from_bytes::<ParticipationRecord>(&bytes)
                    .map_err(|e| DojoError::DeserializationError(e.to_string()))?,
                None => ParticipationRecord::new(date),
            };

            let existing = if is_exam {
                &record.exam
            } else {
                &record.training
            };
            let repeated: Vec<MemberId> = ids
                .iter()
                .copied()
                .filter(|id| existing.contains(id))
                .collect();
            record.merge(ids, is_exam);

            let bytes = postcard::to_allocvec(&record)
                .map_err(|e| DojoError::SerializationError(e.to_string()))?;
            table.insert(key, bytes.as_slice()).map_err(io)?;
            repeated
        };
        write_txn.commit().map_err(io)?;
        Ok(repeated)
    }

    fn ledger(&self) -> Result<Ledger, DojoError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(PARTICIPATION).map_err(io)?;
        let mut records = Vec::new();
        for entry in table.iter().map_err(io)? {
            let (_, value) = entry.map_err(io)?;
            let record: ParticipationRecord = postcard::from_bytes(value.value())
                .map_err(|e| DojoError::DeserializationError(e.to_string()))?;
            records.push(record);
        }
        Ledger::from_records(records)
    }

    fn member_count(&self) -> Result<usize, DojoError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(MEMBERS).map_err(io)?;
        let len = table.len().map_err(io)?;
        usize::try_from(len).map_err(io)
    }

    fn record_count(&self) -> Result<usize, DojoError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(PARTICIPATION).map_err(io)?;
        let len = table.len().map_err(io)?;
        usize::try_from(len).map_err(io)
    }
}

// =============================================================================
// TESTS
// =============================================================================
