use crate::persist::{Backend, BackendKind, PersistError, SaveOutcome};
use crate::snapshot::Snapshot;
use crate::status::{Status, StatusKey, Workday};
use crate::store::StatusStore;
use time::OffsetDateTime;

/// The team board as seen by the user interface: a [`StatusStore`] whose
/// every change is saved through the session's [`Backend`]
#[derive(Debug)]
pub(crate) struct Board {
    store: StatusStore,
    backend: Box<dyn Backend>,
    last_updated: Option<OffsetDateTime>,
    save_error: Option<String>,
}

impl Board {
    pub(crate) fn open(mut backend: Box<dyn Backend>) -> Board {
        let snapshot = backend.load();
        tracing::info!(
            backend = backend.kind().label(),
            members = snapshot.members.len(),
            entries = snapshot.entries.len(),
            "Loaded board"
        );
        let last_updated = snapshot.last_updated;
        Board {
            store: StatusStore::from_snapshot(snapshot),
            backend,
            last_updated,
            save_error: None,
        }
    }

    pub(crate) fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub(crate) fn members(&self) -> &[String] {
        self.store.members()
    }

    pub(crate) fn last_updated(&self) -> Option<OffsetDateTime> {
        self.last_updated
    }

    /// Returns the message from the most recent save if it failed
    pub(crate) fn save_error(&self) -> Option<&str> {
        self.save_error.as_deref()
    }

    pub(crate) fn status(&self, member: &str, year: i32, week: i32, day: Workday) -> Status {
        self.store.status(&StatusKey::new(member, year, week, day))
    }

    /// Adds a member and saves.  Returns `false` without saving if the member
    /// already exists.
    pub(crate) fn add_member(&mut self, name: &str) -> bool {
        let added = self.store.add_member(name);
        if added {
            tracing::info!(member = name, "Added team member");
            self.autosave();
        }
        added
    }

    /// Removes a member and their statuses and saves.  Returns `false`
    /// without saving if there is no such member.
    pub(crate) fn remove_member(&mut self, name: &str) -> bool {
        let removed = self.store.remove_member(name);
        if removed {
            tracing::info!(member = name, "Removed team member");
            self.autosave();
        }
        removed
    }

    /// Advances a member's status for a day and saves.  Returns `None`
    /// without changing anything if `member` is not on the team.
    pub(crate) fn cycle_status(
        &mut self,
        member: &str,
        year: i32,
        week: i32,
        day: Workday,
    ) -> Option<Status> {
        if !self.store.has_member(member) {
            return None;
        }
        let status = self
            .store
            .cycle_status(StatusKey::new(member, year, week, day));
        self.autosave();
        Some(status)
    }

    /// Saves the current state through the active backend
    pub(crate) fn save(&mut self) -> Result<SaveOutcome, PersistError> {
        let mut snapshot = self.store.snapshot();
        snapshot.last_updated = Some(OffsetDateTime::now_utc());
        let r = self.backend.save(&snapshot);
        match &r {
            Ok(_) => {
                self.last_updated = snapshot.last_updated;
                self.save_error = None;
            }
            Err(e) => {
                tracing::error!("Failed to save board: {e}");
                self.save_error = Some(e.to_string());
            }
        }
        r
    }

    /// Replaces the current state with whatever the backend has persisted
    pub(crate) fn reload(&mut self) {
        let snapshot = self.backend.load();
        self.apply(snapshot);
    }

    /// Applies the latest snapshot pushed by the backend, if any.  Returns
    /// `true` if the board changed hands and needs to be redrawn; the echo
    /// of one of our own saves does not count.
    pub(crate) fn poll_remote(&mut self) -> bool {
        let Some(snapshot) = self.backend.poll_update() else {
            return false;
        };
        if self.store.holds(&snapshot) {
            tracing::trace!("Remote snapshot matches the board; nothing to apply");
            if snapshot.last_updated.is_some() {
                self.last_updated = snapshot.last_updated;
            }
            return false;
        }
        tracing::debug!(
            members = snapshot.members.len(),
            entries = snapshot.entries.len(),
            "Received remote snapshot"
        );
        self.apply(snapshot);
        true
    }

    /// Picks up the results of saves that the backend finished in the
    /// background
    pub(crate) fn poll_saves(&mut self) {
        while let Some(r) = self.backend.poll_write() {
            match r {
                Ok(outcome) => {
                    tracing::debug!(?outcome, "Background save finished");
                    self.save_error = None;
                }
                Err(e) => {
                    tracing::error!("Failed to save board: {e}");
                    self.save_error = Some(e.to_string());
                }
            }
        }
    }

    fn apply(&mut self, snapshot: Snapshot) {
        self.last_updated = snapshot.last_updated;
        self.store.replace(snapshot);
    }

    fn autosave(&mut self) {
        // Errors are logged & recorded by save()
        let _ = self.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Recorder {
        stored: Snapshot,
        saves: usize,
        fail: bool,
        pushed: Vec<Snapshot>,
        written: Vec<Result<SaveOutcome, PersistError>>,
    }

    #[derive(Clone, Debug, Default)]
    struct RecordingBackend(Rc<RefCell<Recorder>>);

    impl Backend for RecordingBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::LocalOnly
        }

        fn load(&mut self) -> Snapshot {
            self.0.borrow().stored.clone()
        }

        fn save(&mut self, snapshot: &Snapshot) -> Result<SaveOutcome, PersistError> {
            let mut rec = self.0.borrow_mut();
            rec.saves += 1;
            if rec.fail {
                return Err(std::io::Error::other("disk full").into());
            }
            rec.stored = snapshot.clone();
            Ok(SaveOutcome::Local)
        }

        fn poll_update(&mut self) -> Option<Snapshot> {
            self.0.borrow_mut().pushed.drain(..).last()
        }

        fn poll_write(&mut self) -> Option<Result<SaveOutcome, PersistError>> {
            let mut rec = self.0.borrow_mut();
            (!rec.written.is_empty()).then(|| rec.written.remove(0))
        }
    }

    fn board() -> (Board, Rc<RefCell<Recorder>>) {
        let backend = RecordingBackend::default();
        let rec = Rc::clone(&backend.0);
        (Board::open(Box::new(backend)), rec)
    }

    #[test]
    fn test_alice_scenario() {
        let (mut board, rec) = board();
        assert!(board.members().is_empty());
        assert!(board.add_member("Alice"));
        assert_eq!(
            board.cycle_status("Alice", 2024, 10, Workday::Monday),
            Some(Status::WorkFromHome)
        );
        assert_eq!(
            board.cycle_status("Alice", 2024, 10, Workday::Monday),
            Some(Status::Leave)
        );
        assert_eq!(
            board.status("Alice", 2024, 10, Workday::Tuesday),
            Status::Office
        );
        assert!(board.remove_member("Alice"));
        assert_eq!(
            board.status("Alice", 2024, 10, Workday::Monday),
            Status::Office
        );
        assert_eq!(rec.borrow().saves, 4);
        assert_eq!(rec.borrow().stored.members.len(), 0);
        assert_eq!(rec.borrow().stored.entries.len(), 0);
    }

    #[test]
    fn test_every_mutation_saves() {
        let (mut board, rec) = board();
        board.add_member("Alice");
        assert_eq!(rec.borrow().saves, 1);
        assert_eq!(rec.borrow().stored.members, ["Alice"]);
        assert!(rec.borrow().stored.last_updated.is_some());
        board.cycle_status("Alice", 2024, 10, Workday::Friday);
        assert_eq!(rec.borrow().saves, 2);
        assert_eq!(
            rec.borrow()
                .stored
                .entries
                .get(&StatusKey::new("Alice", 2024, 10, Workday::Friday)),
            Some(&Status::WorkFromHome)
        );
        assert_eq!(board.last_updated(), rec.borrow().stored.last_updated);
    }

    #[test]
    fn test_noops_do_not_save() {
        let (mut board, rec) = board();
        board.add_member("Alice");
        assert!(!board.add_member("Alice"));
        assert!(!board.remove_member("Bob"));
        assert_eq!(board.cycle_status("Bob", 2024, 10, Workday::Monday), None);
        assert_eq!(board.status("Bob", 2024, 10, Workday::Monday), Status::Office);
        assert_eq!(rec.borrow().saves, 1);
    }

    #[test]
    fn test_open_loads_backend() {
        let backend = RecordingBackend::default();
        let mut snapshot = Snapshot::default();
        snapshot.members.push(String::from("Carol"));
        snapshot.entries.insert(
            StatusKey::new("Carol", 2025, 1, Workday::Wednesday),
            Status::Leave,
        );
        backend.0.borrow_mut().stored = snapshot;
        let board = Board::open(Box::new(backend));
        assert_eq!(board.members(), ["Carol"]);
        assert_eq!(
            board.status("Carol", 2025, 1, Workday::Wednesday),
            Status::Leave
        );
        assert_eq!(board.backend_kind(), BackendKind::LocalOnly);
    }

    #[test]
    fn test_failed_save_keeps_state() {
        let (mut board, rec) = board();
        rec.borrow_mut().fail = true;
        assert!(board.add_member("Alice"));
        assert_eq!(board.members(), ["Alice"]);
        assert_eq!(board.save_error(), Some("I/O error: disk full"));
        rec.borrow_mut().fail = false;
        assert_eq!(board.save().ok(), Some(SaveOutcome::Local));
        assert_eq!(board.save_error(), None);
        assert_eq!(rec.borrow().stored.members, ["Alice"]);
    }

    #[test]
    fn test_poll_remote_replaces_state() {
        let (mut board, rec) = board();
        board.add_member("Alice");
        board.cycle_status("Alice", 2024, 10, Workday::Monday);
        assert!(!board.poll_remote());
        let mut pushed = Snapshot::default();
        pushed.members.push(String::from("Bob"));
        rec.borrow_mut().pushed.push(pushed);
        assert!(board.poll_remote());
        assert_eq!(board.members(), ["Bob"]);
        assert_eq!(
            board.status("Alice", 2024, 10, Workday::Monday),
            Status::Office
        );
        assert!(!board.poll_remote());
    }

    #[test]
    fn test_poll_remote_ignores_own_echo() {
        let (mut board, rec) = board();
        board.add_member("Alice");
        board.cycle_status("Alice", 2024, 10, Workday::Monday);
        let echo = rec.borrow().stored.clone();
        rec.borrow_mut().pushed.push(echo);
        assert!(!board.poll_remote());
        assert_eq!(board.members(), ["Alice"]);
        assert_eq!(
            board.status("Alice", 2024, 10, Workday::Monday),
            Status::WorkFromHome
        );
        assert_eq!(board.last_updated(), rec.borrow().stored.last_updated);
    }

    #[test]
    fn test_poll_saves_tracks_background_errors() {
        let (mut board, rec) = board();
        board.poll_saves();
        assert_eq!(board.save_error(), None);
        rec.borrow_mut()
            .written
            .push(Err(std::io::Error::other("disk full").into()));
        board.poll_saves();
        assert_eq!(board.save_error(), Some("I/O error: disk full"));
        rec.borrow_mut().written.push(Ok(SaveOutcome::LocalFallback));
        board.poll_saves();
        assert_eq!(board.save_error(), None);
    }

    #[test]
    fn test_reload() {
        let (mut board, rec) = board();
        board.add_member("Alice");
        let mut other = Snapshot::default();
        other.members.push(String::from("Zed"));
        rec.borrow_mut().stored = other;
        board.reload();
        assert_eq!(board.members(), ["Zed"]);
    }
}
