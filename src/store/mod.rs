//! Flat-file record store.
//!
//! Each collection is one JSON file under the data dir (`students.json`,
//! `teachers.json`, ...) holding a JSON array of records. A save rewrites the
//! whole file; there is no merge and no partial write. Missing or unparseable
//! files read back as empty collections: corruption is logged and swallowed,
//! never surfaced to a handler.
//!
//! One mutex per collection serializes read-modify-write cycles, so writers
//! inside this process cannot lose updates to each other.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use strum_macros::Display;

use crate::events::EventBus;

pub mod repos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RecordKind {
    Admin,
    Teachers,
    Students,
    Classes,
    Attendance,
}

impl RecordKind {
    const COUNT: usize = 5;
}

pub struct RecordStore {
    root: PathBuf,
    locks: [Mutex<()>; RecordKind::COUNT],
    events: EventBus,
}

impl RecordStore {
    pub fn open(root: impl Into<PathBuf>, events: EventBus) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("creating data dir {}", root.display()))?;

        Ok(Self {
            root,
            locks: std::array::from_fn(|_| Mutex::new(())),
            events,
        })
    }

    fn path(&self, kind: RecordKind) -> PathBuf {
        self.root.join(format!("{kind}.json"))
    }

    fn guard(&self, kind: RecordKind) -> MutexGuard<'_, ()> {
        self.locks[kind as usize]
            .lock()
            .expect("record store lock poisoned")
    }

    /// Loads a whole collection. Absent or corrupt files come back empty.
    pub fn load<T: DeserializeOwned>(&self, kind: RecordKind) -> Vec<T> {
        let _guard = self.guard(kind);
        self.read(kind)
    }

    /// Overwrites a whole collection.
    pub fn save<T: Serialize>(&self, kind: RecordKind, records: &[T]) -> Result<()> {
        let _guard = self.guard(kind);
        self.write(kind, records)
    }

    /// Serialized read-modify-write over one collection.
    pub fn update<T, R>(&self, kind: RecordKind, apply: impl FnOnce(&mut Vec<T>) -> R) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
    {
        let _guard = self.guard(kind);
        let mut records: Vec<T> = self.read(kind);
        let outcome = apply(&mut records);
        self.write(kind, &records)?;
        Ok(outcome)
    }

    /// Like [`RecordStore::update`], but a rejecting closure aborts the cycle
    /// and leaves the file untouched.
    pub fn try_update<T, R, E>(
        &self,
        kind: RecordKind,
        apply: impl FnOnce(&mut Vec<T>) -> Result<R, E>,
    ) -> Result<Result<R, E>>
    where
        T: Serialize + DeserializeOwned,
    {
        let _guard = self.guard(kind);
        let mut records: Vec<T> = self.read(kind);
        match apply(&mut records) {
            Ok(outcome) => {
                self.write(kind, &records)?;
                Ok(Ok(outcome))
            }
            Err(rejection) => Ok(Err(rejection)),
        }
    }

    fn read<T: DeserializeOwned>(&self, kind: RecordKind) -> Vec<T> {
        let raw = match fs::read_to_string(self.path(kind)) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };

        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(kind = %kind, error = %err, "unreadable collection, treating as empty");
                Vec::new()
            }
        }
    }

    fn write<T: Serialize>(&self, kind: RecordKind, records: &[T]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        fs::write(self.path(kind), json)
            .with_context(|| format!("writing {kind} collection"))?;

        self.events.publish(kind);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Rec {
        id: u32,
        name: String,
    }

    fn rec(id: u32, name: &str) -> Rec {
        Rec {
            id,
            name: name.to_string(),
        }
    }

    fn open_store(dir: &tempfile::TempDir) -> RecordStore {
        RecordStore::open(dir.path(), EventBus::new()).unwrap()
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let records: Vec<Rec> = store.load(RecordKind::Students);
        assert!(records.is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        std::fs::write(dir.path().join("students.json"), "{not json").unwrap();

        let records: Vec<Rec> = store.load(RecordKind::Students);
        assert!(records.is_empty());
    }

    #[test]
    fn save_overwrites_whole_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        store
            .save(RecordKind::Students, &[rec(1, "a"), rec(2, "b")])
            .unwrap();
        store.save(RecordKind::Students, &[rec(3, "c")]).unwrap();

        let records: Vec<Rec> = store.load(RecordKind::Students);
        assert_eq!(records, vec![rec(3, "c")]);
    }

    #[test]
    fn update_persists_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        store.save(RecordKind::Classes, &[rec(1, "a")]).unwrap();
        store
            .update(RecordKind::Classes, |records: &mut Vec<Rec>| {
                records.push(rec(2, "b"));
            })
            .unwrap();

        let records: Vec<Rec> = store.load(RecordKind::Classes);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn rejected_try_update_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        store.save(RecordKind::Teachers, &[rec(1, "a")]).unwrap();

        let outcome = store
            .try_update(RecordKind::Teachers, |records: &mut Vec<Rec>| -> Result<(), &str> {
                records.clear();
                Err("rejected")
            })
            .unwrap();

        assert_eq!(outcome, Err("rejected"));
        let records: Vec<Rec> = store.load(RecordKind::Teachers);
        assert_eq!(records, vec![rec(1, "a")]);
    }

    #[test]
    fn save_publishes_change_event() {
        let dir = tempfile::tempdir().unwrap();
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let store = RecordStore::open(dir.path(), bus).unwrap();

        store.save(RecordKind::Attendance, &[rec(1, "a")]).unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, RecordKind::Attendance);
    }
}
