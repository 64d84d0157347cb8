mod kv;
mod local;
mod remote;
mod sse;
#[cfg(test)]
pub(crate) use self::kv::MemoryStore;
pub(crate) use self::kv::{FileStore, KeyValueStore};
pub(crate) use self::local::LocalBackend;
pub(crate) use self::remote::{FirebaseTransport, RemoteBackend, RemoteTransport};
use crate::snapshot::Snapshot;
use std::fmt;
use thiserror::Error;

/// Key under which the snapshot is kept in the local store and the path
/// under which it is kept in the remote database
pub(crate) const STORAGE_KEY: &str = "teamStatusData";

/// A place the board's [`Snapshot`] can be loaded from and saved to
pub(crate) trait Backend: fmt::Debug {
    fn kind(&self) -> BackendKind;

    /// Returns the currently persisted snapshot, or an empty snapshot if
    /// nothing usable has been persisted
    fn load(&mut self) -> Snapshot;

    fn save(&mut self, snapshot: &Snapshot) -> Result<SaveOutcome, PersistError>;

    /// Returns the most recent snapshot pushed by another writer since the
    /// last call, if any
    fn poll_update(&mut self) -> Option<Snapshot> {
        None
    }

    /// Returns the result of the next save that finished in the background
    /// since the last call, if any
    fn poll_write(&mut self) -> Option<Result<SaveOutcome, PersistError>> {
        None
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum BackendKind {
    LocalOnly,
    RemoteActive,
}

impl BackendKind {
    pub(crate) fn label(self) -> &'static str {
        match self {
            BackendKind::LocalOnly => "local",
            BackendKind::RemoteActive => "remote",
        }
    }
}

/// Where a successful save ended up
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum SaveOutcome {
    Local,
    Remote,
    /// The remote write failed and the snapshot was saved locally instead
    LocalFallback,
    /// Handed off to be written in the background
    Queued,
}

#[derive(Debug, Error)]
pub(crate) enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[source] Box<ureq::Error>),
}

impl From<ureq::Error> for PersistError {
    fn from(e: ureq::Error) -> PersistError {
        PersistError::Http(Box::new(e))
    }
}

/// Selects the backend for the session.
///
/// The remote backend is only used if `remote` is given and can be reached
/// right now; otherwise, the session stays local-only for good.
pub(crate) fn open<T, S>(remote: Option<T>, local: LocalBackend<S>) -> Box<dyn Backend>
where
    T: RemoteTransport + Send + Sync + 'static,
    S: KeyValueStore + fmt::Debug + Send + 'static,
{
    let Some(transport) = remote else {
        tracing::info!("No remote database configured; using local storage only");
        return Box::new(local);
    };
    match RemoteBackend::connect(transport, local) {
        Ok(backend) => {
            tracing::info!("Connected to remote database");
            Box::new(backend)
        }
        Err((e, local)) => {
            tracing::warn!("Could not connect to remote database; using local storage only: {e}");
            Box::new(local)
        }
    }
}
