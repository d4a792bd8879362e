//! # redb-backed Progress Storage
//!
//! A disk-backed [`ProgressStore`] using the redb embedded database.
//!
//! Progress is keyed by `(user id, course id)`; schedules and profiles by
//! user id. Each record is postcard-encoded and rewritten in a single write
//! transaction per mutation. redb gives crash safety and MVCC, so readers
//! never see a half-applied write.

use crate::primitives::STORE_FORMAT_VERSION;
use crate::profile::Profile;
use crate::progress::Progress;
use crate::schedule::{ScheduleKey, WeeklySchedule};
use crate::store::ProgressStore;
use crate::{CourseId, PlannerError, ProgressStatus, StatusChange, SubjectId, UserId};
use redb::{
    Database, Key, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::path::Path;

/// Table for progress: (user id, course id) -> serialized `Progress`
const PROGRESS: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("progress");

/// Table for schedules: user id -> serialized `WeeklySchedule`
const SCHEDULES: TableDefinition<&str, &[u8]> = TableDefinition::new("schedules");

/// Table for profiles: user id -> serialized `Profile`
const PROFILES: TableDefinition<&str, &[u8]> = TableDefinition::new("profiles");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const FORMAT_VERSION_KEY: &str = "format_version";

fn io_err(e: impl std::fmt::Display) -> PlannerError {
    PlannerError::IoError(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, PlannerError> {
    postcard::to_allocvec(value).map_err(|e| PlannerError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PlannerError> {
    postcard::from_bytes(bytes).map_err(|e| PlannerError::SerializationError(e.to_string()))
}

/// A disk-backed progress store.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a store at the given path.
    ///
    /// Fails if the file was written by a newer, incompatible format.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PlannerError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        let write_txn = db.begin_write().map_err(io_err)?;
        {
            let _ = write_txn.open_table(PROGRESS).map_err(io_err)?;
            let _ = write_txn.open_table(SCHEDULES).map_err(io_err)?;
            let _ = write_txn.open_table(PROFILES).map_err(io_err)?;
            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;

            let stored = meta
                .get(FORMAT_VERSION_KEY)
                .map_err(io_err)?
                .map(|v| v.value());
            match stored {
                None => {
                    meta.insert(FORMAT_VERSION_KEY, STORE_FORMAT_VERSION)
                        .map_err(io_err)?;
                }
                Some(v) if v > STORE_FORMAT_VERSION => {
                    return Err(PlannerError::IoError(format!(
                        "store format version {v} is newer than supported version {STORE_FORMAT_VERSION}"
                    )));
                }
                Some(_) => {}
            }
        }
        write_txn.commit().map_err(io_err)?;

        Ok(Self { db })
    }

    /// Number of (user, course) pairs with recorded progress.
    pub fn record_count(&self) -> Result<u64, PlannerError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(PROGRESS).map_err(io_err)?;
        table.len().map_err(io_err)
    }

    /// Every user with recorded progress, in id order.
    pub fn users(&self) -> Result<Vec<UserId>, PlannerError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(PROGRESS).map_err(io_err)?;
        let mut users = BTreeSet::new();
        for entry in table.iter().map_err(io_err)? {
            let (key, _) = entry.map_err(io_err)?;
            let (user, _course) = key.value();
            users.insert(UserId::new(user));
        }
        Ok(users.into_iter().collect())
    }

    fn read_record<'k, K, T>(
        &self,
        definition: TableDefinition<'static, K, &'static [u8]>,
        key: &K::SelfType<'k>,
    ) -> Result<Option<T>, PlannerError>
    where
        K: Key + 'static,
        T: DeserializeOwned,
    {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(definition).map_err(io_err)?;
        match table.get(key).map_err(io_err)? {
            Some(bytes) => decode(bytes.value()).map(Some),
            None => Ok(None),
        }
    }

    /// Read-modify-write one record inside a single transaction.
    /// An empty result deletes the record.
    fn update_record<'k, K, T, F>(
        &self,
        definition: TableDefinition<'static, K, &'static [u8]>,
        key: &K::SelfType<'k>,
        is_empty: fn(&T) -> bool,
        mutate: F,
    ) -> Result<(), PlannerError>
    where
        K: Key + 'static,
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> Result<(), PlannerError>,
    {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(definition).map_err(io_err)?;
            let mut record: T = match table.get(key).map_err(io_err)? {
                Some(bytes) => decode(bytes.value())?,
                None => T::default(),
            };

            mutate(&mut record)?;

            if is_empty(&record) {
                table.remove(key).map_err(io_err)?;
            } else {
                let bytes = encode(&record)?;
                table.insert(key, bytes.as_slice()).map_err(io_err)?;
            }
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }
}

impl ProgressStore for RedbStore {
    fn progress(&self, user: &UserId, course: CourseId) -> Result<Progress, PlannerError> {
        Ok(self
            .read_record(PROGRESS, &(user.as_str(), course.0))?
            .unwrap_or_default())
    }

    fn set_status(
        &mut self,
        user: &UserId,
        course: CourseId,
        subject: &SubjectId,
        status: ProgressStatus,
    ) -> Result<(), PlannerError> {
        self.update_record(
            PROGRESS,
            &(user.as_str(), course.0),
            Progress::is_empty,
            |p: &mut Progress| {
                p.apply(subject, StatusChange::Set(status));
                Ok(())
            },
        )
    }

    fn remove_status(
        &mut self,
        user: &UserId,
        course: CourseId,
        subject: &SubjectId,
    ) -> Result<(), PlannerError> {
        self.update_record(
            PROGRESS,
            &(user.as_str(), course.0),
            Progress::is_empty,
            |p: &mut Progress| {
                p.apply(subject, StatusChange::Remove);
                Ok(())
            },
        )
    }

    fn schedule(&self, user: &UserId) -> Result<WeeklySchedule, PlannerError> {
        Ok(self
            .read_record(SCHEDULES, &user.as_str())?
            .unwrap_or_default())
    }

    fn set_schedule_entry(
        &mut self,
        user: &UserId,
        key: ScheduleKey,
        label: &str,
    ) -> Result<(), PlannerError> {
        self.update_record(
            SCHEDULES,
            &user.as_str(),
            WeeklySchedule::is_empty,
            |s: &mut WeeklySchedule| s.set_entry(key, label),
        )
    }

    fn profile(&self, user: &UserId) -> Result<Option<Profile>, PlannerError> {
        self.read_record(PROFILES, &user.as_str())
    }

    fn set_profile(&mut self, user: &UserId, profile: &Profile) -> Result<(), PlannerError> {
        let bytes = encode(profile)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(PROFILES).map_err(io_err)?;
            table
                .insert(user.as_str(), bytes.as_slice())
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)
    }
}

// =============================================================================
// TESTS
// =============================================================================
