use super::{Backend, BackendKind, KeyValueStore, PersistError, SaveOutcome, STORAGE_KEY};
use crate::snapshot::Snapshot;
use std::fmt;

/// Keeps the snapshot as JSON under [`STORAGE_KEY`] in a [`KeyValueStore`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct LocalBackend<S> {
    store: S,
}

impl<S: KeyValueStore> LocalBackend<S> {
    pub(crate) fn new(store: S) -> LocalBackend<S> {
        LocalBackend { store }
    }

    pub(crate) fn write(&mut self, snapshot: &Snapshot) -> Result<(), PersistError> {
        let json = snapshot.to_json()?;
        self.store.set(STORAGE_KEY, json)
    }

    pub(crate) fn read(&self) -> Snapshot {
        let raw = match self.store.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Snapshot::default(),
            Err(e) => {
                tracing::warn!("Failed to read local store; starting empty: {e}");
                return Snapshot::default();
            }
        };
        Snapshot::from_json(&raw).unwrap_or_else(|e| {
            tracing::warn!("Local snapshot is malformed; starting empty: {e}");
            Snapshot::default()
        })
    }
}

impl<S: KeyValueStore + fmt::Debug> Backend for LocalBackend<S> {
    fn kind(&self) -> BackendKind {
        BackendKind::LocalOnly
    }

    fn load(&mut self) -> Snapshot {
        self.read()
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<SaveOutcome, PersistError> {
        self.write(snapshot)?;
        tracing::debug!(members = snapshot.members.len(), "Saved snapshot locally");
        Ok(SaveOutcome::Local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::kv::MemoryStore;
    use crate::status::{Status, StatusKey, Workday};
    use time::macros::datetime;

    fn snapshot_with(members: &[&str]) -> Snapshot {
        let mut snapshot = Snapshot {
            members: members.iter().map(|&m| m.to_owned()).collect(),
            last_updated: Some(datetime!(2024-03-08 17:45:12.5 +01:00)),
            ..Snapshot::default()
        };
        for (i, &m) in members.iter().enumerate() {
            let statuses = Status::CYCLE.into_iter().cycle().skip(i);
            for (day, status) in std::iter::zip(Workday::ALL, statuses) {
                snapshot
                    .entries
                    .insert(StatusKey::new(m, 2024, 10, day), status);
            }
            snapshot
                .entries
                .insert(StatusKey::new(m, 2023, 52, Workday::Friday), Status::Leave);
        }
        snapshot
    }

    #[test]
    fn test_round_trip() {
        for members in [
            &[][..],
            &["Alice"][..],
            &["Alice", "Bob", "Carol_2024", "dave the intern"][..],
        ] {
            let mut backend = LocalBackend::new(MemoryStore::new());
            let snapshot = snapshot_with(members);
            assert_eq!(backend.save(&snapshot).ok(), Some(SaveOutcome::Local));
            assert_eq!(backend.load(), snapshot);
        }
    }

    #[test]
    fn test_load_nothing_saved() {
        let mut backend = LocalBackend::new(MemoryStore::new());
        assert_eq!(backend.load(), Snapshot::default());
        assert_eq!(backend.kind(), BackendKind::LocalOnly);
    }

    #[test]
    fn test_load_malformed() {
        let mut store = MemoryStore::new();
        store
            .set(STORAGE_KEY, String::from("{\"teamMembers\": 42}"))
            .expect("set should succeed");
        let mut backend = LocalBackend::new(store);
        assert_eq!(backend.load(), Snapshot::default());
    }

    #[test]
    fn test_save_failure() {
        let mut store = MemoryStore::new();
        store.fail_writes = true;
        let mut backend = LocalBackend::new(store);
        assert!(matches!(
            backend.save(&snapshot_with(&["Alice"])),
            Err(PersistError::Io(_))
        ));
    }
}
