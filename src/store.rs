use crate::snapshot::Snapshot;
use crate::status::{Status, StatusKey};
use std::collections::BTreeMap;

/// In-memory team list and per-day statuses
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct StatusStore {
    members: Vec<String>,
    entries: BTreeMap<StatusKey, Status>,
}

impl StatusStore {
    pub(crate) fn new() -> StatusStore {
        StatusStore::default()
    }

    pub(crate) fn from_snapshot(snapshot: Snapshot) -> StatusStore {
        let mut store = StatusStore::new();
        store.replace(snapshot);
        store
    }

    pub(crate) fn members(&self) -> &[String] {
        &self.members
    }

    pub(crate) fn has_member(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }

    /// Appends `name` to the team.  Returns `false` if a member with exactly
    /// that name already exists.
    pub(crate) fn add_member(&mut self, name: &str) -> bool {
        if self.has_member(name) {
            false
        } else {
            self.members.push(name.to_owned());
            true
        }
    }

    /// Removes `name` from the team along with all of their statuses.
    /// Returns `false` if there was no such member.
    pub(crate) fn remove_member(&mut self, name: &str) -> bool {
        let Some(i) = self.members.iter().position(|m| m == name) else {
            return false;
        };
        self.members.remove(i);
        self.entries.retain(|key, _| key.member != name);
        true
    }

    pub(crate) fn status(&self, key: &StatusKey) -> Status {
        self.entries.get(key).copied().unwrap_or_default()
    }

    pub(crate) fn set_status(&mut self, key: StatusKey, status: Status) {
        self.entries.insert(key, status);
    }

    /// Advances the status at `key` (office, then WFH, then leave, then back
    /// to office) and returns it
    pub(crate) fn cycle_status(&mut self, key: StatusKey) -> Status {
        let status = self.status(&key).next();
        self.set_status(key, status);
        status
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            members: self.members.clone(),
            entries: self.entries.clone(),
            last_updated: None,
        }
    }

    /// Returns `true` if `snapshot` has exactly this team and these statuses
    pub(crate) fn holds(&self, snapshot: &Snapshot) -> bool {
        self.members == snapshot.members && self.entries == snapshot.entries
    }

    /// Discards the current state in favor of `snapshot`.  Entries for
    /// names that are not on the team are dropped.
    pub(crate) fn replace(&mut self, snapshot: Snapshot) {
        self.members = snapshot.members;
        let mut entries = snapshot.entries;
        entries.retain(|key, _| {
            let known = self.members.contains(&key.member);
            if !known {
                tracing::warn!(member = %key.member, "Dropping status entry for unknown member");
            }
            known
        });
        self.entries = entries;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Workday;

    fn key(member: &str, day: Workday) -> StatusKey {
        StatusKey::new(member, 2024, 10, day)
    }

    #[test]
    fn test_add_member() {
        let mut store = StatusStore::new();
        assert!(store.add_member("Alice"));
        assert!(store.add_member("Bob"));
        assert!(!store.add_member("Alice"));
        assert!(store.add_member("alice"));
        assert_eq!(store.members(), ["Alice", "Bob", "alice"]);
    }

    #[test]
    fn test_remove_missing_member() {
        let mut store = StatusStore::new();
        store.add_member("Alice");
        assert!(!store.remove_member("Bob"));
        assert_eq!(store.members(), ["Alice"]);
    }

    #[test]
    fn test_default_status() {
        let store = StatusStore::new();
        assert_eq!(store.status(&key("Nobody", Workday::Monday)), Status::Office);
    }

    #[test]
    fn test_set_status() {
        let mut store = StatusStore::new();
        store.add_member("Alice");
        store.set_status(key("Alice", Workday::Tuesday), Status::Leave);
        assert_eq!(store.status(&key("Alice", Workday::Tuesday)), Status::Leave);
        assert_eq!(store.status(&key("Alice", Workday::Monday)), Status::Office);
        store.set_status(key("Alice", Workday::Tuesday), Status::WorkFromHome);
        assert_eq!(
            store.status(&key("Alice", Workday::Tuesday)),
            Status::WorkFromHome
        );
    }

    #[test]
    fn test_cycle_returns_to_start() {
        let mut store = StatusStore::new();
        store.add_member("Alice");
        let k = key("Alice", Workday::Thursday);
        store.set_status(k.clone(), Status::Leave);
        store.cycle_status(k.clone());
        store.cycle_status(k.clone());
        assert_eq!(store.cycle_status(k.clone()), Status::Leave);
        assert_eq!(store.status(&k), Status::Leave);
    }

    #[test]
    fn test_remove_then_readd_resets_statuses() {
        let mut store = StatusStore::new();
        store.add_member("Alice");
        store.add_member("Bob");
        for day in Workday::ALL {
            store.cycle_status(StatusKey::new("Alice", 2024, 10, day));
            store.cycle_status(StatusKey::new("Alice", 2025, 3, day));
        }
        store.cycle_status(key("Bob", Workday::Monday));
        assert!(store.remove_member("Alice"));
        assert!(store.add_member("Alice"));
        for day in Workday::ALL {
            assert_eq!(
                store.status(&StatusKey::new("Alice", 2024, 10, day)),
                Status::Office
            );
            assert_eq!(
                store.status(&StatusKey::new("Alice", 2025, 3, day)),
                Status::Office
            );
        }
        assert_eq!(
            store.status(&key("Bob", Workday::Monday)),
            Status::WorkFromHome
        );
        assert_eq!(store.members(), ["Bob", "Alice"]);
    }

    #[test]
    fn test_remove_does_not_touch_prefixed_names() {
        let mut store = StatusStore::new();
        store.add_member("Al");
        store.add_member("Al_2024");
        store.set_status(StatusKey::new("Al_2024", 2024, 1, Workday::Monday), Status::Leave);
        store.remove_member("Al");
        assert_eq!(
            store.status(&StatusKey::new("Al_2024", 2024, 1, Workday::Monday)),
            Status::Leave
        );
    }

    #[test]
    fn test_alice_scenario() {
        let mut store = StatusStore::new();
        store.add_member("Alice");
        let monday = key("Alice", Workday::Monday);
        assert_eq!(store.cycle_status(monday.clone()), Status::WorkFromHome);
        assert_eq!(store.cycle_status(monday.clone()), Status::Leave);
        assert_eq!(store.status(&key("Alice", Workday::Tuesday)), Status::Office);
        store.remove_member("Alice");
        assert_eq!(store.status(&monday), Status::Office);
    }

    #[test]
    fn test_replace_discards_everything() {
        let mut store = StatusStore::new();
        store.add_member("Alice");
        store.cycle_status(key("Alice", Workday::Monday));
        let mut snapshot = Snapshot::default();
        snapshot.members.push(String::from("Carol"));
        snapshot
            .entries
            .insert(key("Carol", Workday::Friday), Status::Leave);
        store.replace(snapshot.clone());
        assert_eq!(store.members(), ["Carol"]);
        assert_eq!(store.status(&key("Alice", Workday::Monday)), Status::Office);
        assert_eq!(store.snapshot(), snapshot);
        assert_eq!(StatusStore::from_snapshot(snapshot), store);
    }

    #[test]
    fn test_replace_drops_entries_of_non_members() {
        let mut store = StatusStore::new();
        let mut snapshot = Snapshot::default();
        snapshot.members.push(String::from("Alice"));
        snapshot
            .entries
            .insert(key("Alice", Workday::Monday), Status::WorkFromHome);
        snapshot
            .entries
            .insert(key("Ghost", Workday::Monday), Status::Leave);
        store.replace(snapshot);
        assert_eq!(store.snapshot().entries.len(), 1);
        assert!(store.add_member("Ghost"));
        assert_eq!(store.status(&key("Ghost", Workday::Monday)), Status::Office);
        assert_eq!(
            store.status(&key("Alice", Workday::Monday)),
            Status::WorkFromHome
        );
    }
}
