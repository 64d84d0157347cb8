use super::sse::{decode_push, EventParser, Push};
use super::{
    Backend, BackendKind, KeyValueStore, LocalBackend, PersistError, SaveOutcome, STORAGE_KEY,
};
use crate::snapshot::Snapshot;
use std::fmt;
use std::io::{BufRead, BufReader};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use ureq::Agent;

/// Limit on how long a single fetch or store may take
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait before reopening a subscription that ended
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Access to the shared copy of the snapshot in a remote database
pub(crate) trait RemoteTransport: fmt::Debug {
    fn fetch(&self) -> Result<Snapshot, PersistError>;

    /// Replaces the shared snapshot with `snapshot`
    fn store(&self, snapshot: &Snapshot) -> Result<(), PersistError>;

    /// Starts delivering the full shared snapshot to `tx` every time it
    /// changes, including once right after subscribing
    fn subscribe(&self, tx: Sender<Snapshot>) -> Result<(), PersistError>;
}

/// Shares the snapshot through a remote database, saving locally whenever the
/// remote write fails.
///
/// Saves are handed to a background writer thread and return at once.  When
/// several saves pile up while a write is in flight, only the newest one is
/// written next.  Dropping the backend waits for queued saves to finish.
///
/// A failed write does not demote the backend: the next save goes to the
/// remote database again.  Nothing reconciles the local copy written during
/// a failure with the remote one afterwards.
#[derive(Debug)]
pub(crate) struct RemoteBackend<T, S> {
    transport: Arc<T>,
    local: Arc<Mutex<LocalBackend<S>>>,
    initial: Option<Snapshot>,
    updates: Receiver<Snapshot>,
    writes: Option<Sender<Snapshot>>,
    written: Receiver<Result<SaveOutcome, PersistError>>,
    writer: Option<JoinHandle<()>>,
}

impl<T, S> RemoteBackend<T, S>
where
    T: RemoteTransport + Send + Sync + 'static,
    S: KeyValueStore + Send + 'static,
{
    /// Fetches the current shared snapshot, subscribes to changes, and starts
    /// the writer thread.  On failure, the local backend is handed back so
    /// that the caller can fall back to it.
    pub(crate) fn connect(
        transport: T,
        local: LocalBackend<S>,
    ) -> Result<RemoteBackend<T, S>, (PersistError, LocalBackend<S>)> {
        let initial = match transport.fetch() {
            Ok(snapshot) => snapshot,
            Err(e) => return Err((e, local)),
        };
        let (tx, updates) = channel();
        if let Err(e) = transport.subscribe(tx) {
            return Err((e, local));
        }
        let transport = Arc::new(transport);
        let local = Arc::new(Mutex::new(local));
        let (writes, queue) = channel();
        let (report, written) = channel();
        let spawned = {
            let transport = Arc::clone(&transport);
            let local = Arc::clone(&local);
            thread::Builder::new()
                .name(String::from("remote-sync"))
                .spawn(move || write_loop(&*transport, &*local, &queue, &report))
        };
        let (writes, writer) = match spawned {
            Ok(handle) => (Some(writes), Some(handle)),
            Err(e) => {
                tracing::warn!("Could not start remote writer; saving inline instead: {e}");
                (None, None)
            }
        };
        Ok(RemoteBackend {
            transport,
            local,
            initial: Some(initial),
            updates,
            writes,
            written,
            writer,
        })
    }
}

impl<T, S> Backend for RemoteBackend<T, S>
where
    T: RemoteTransport + Send + Sync + 'static,
    S: KeyValueStore + fmt::Debug + Send + 'static,
{
    fn kind(&self) -> BackendKind {
        BackendKind::RemoteActive
    }

    fn load(&mut self) -> Snapshot {
        if let Some(snapshot) = self.initial.take() {
            return snapshot;
        }
        match self.transport.fetch() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Failed to fetch remote snapshot; loading local copy: {e}");
                lock(&*self.local).read()
            }
        }
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<SaveOutcome, PersistError> {
        if let Some(writes) = &self.writes {
            if writes.send(snapshot.clone()).is_ok() {
                return Ok(SaveOutcome::Queued);
            }
            tracing::warn!("Remote writer has stopped; saving inline instead");
            self.writes = None;
        }
        write_through(&*self.transport, &*self.local, snapshot)
    }

    fn poll_update(&mut self) -> Option<Snapshot> {
        let latest = self.updates.try_iter().last();
        if latest.is_some() {
            // A pushed snapshot supersedes whatever was fetched at startup
            self.initial = None;
        }
        latest
    }

    fn poll_write(&mut self) -> Option<Result<SaveOutcome, PersistError>> {
        self.written.try_recv().ok()
    }
}

impl<T, S> Drop for RemoteBackend<T, S> {
    fn drop(&mut self) {
        // Closing the queue lets the writer finish what is left and exit
        self.writes = None;
        if let Some(writer) = self.writer.take() {
            tracing::debug!("Waiting for queued remote saves to finish");
            if writer.join().is_err() {
                tracing::error!("Remote writer thread panicked");
            }
        }
    }
}

fn lock<S>(local: &Mutex<LocalBackend<S>>) -> MutexGuard<'_, LocalBackend<S>> {
    local.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writes `snapshot` to the remote database, or to the local store if that
/// fails
fn write_through<T: RemoteTransport, S: KeyValueStore>(
    transport: &T,
    local: &Mutex<LocalBackend<S>>,
    snapshot: &Snapshot,
) -> Result<SaveOutcome, PersistError> {
    match transport.store(snapshot) {
        Ok(()) => {
            tracing::debug!(members = snapshot.members.len(), "Saved snapshot remotely");
            Ok(SaveOutcome::Remote)
        }
        Err(e) => {
            tracing::warn!("Remote save failed; saving locally instead: {e}");
            lock(local).write(snapshot)?;
            Ok(SaveOutcome::LocalFallback)
        }
    }
}

/// Waits for the next queued snapshot, skipping ahead to the newest one if
/// more have been queued.  Returns `None` once the queue is closed and empty.
fn next_write(queue: &Receiver<Snapshot>) -> Option<Snapshot> {
    let first = queue.recv().ok()?;
    Some(queue.try_iter().last().unwrap_or(first))
}

fn write_loop<T: RemoteTransport, S: KeyValueStore>(
    transport: &T,
    local: &Mutex<LocalBackend<S>>,
    queue: &Receiver<Snapshot>,
    report: &Sender<Result<SaveOutcome, PersistError>>,
) {
    while let Some(snapshot) = next_write(queue) {
        let r = write_through(transport, local, &snapshot);
        // The receiver is gone while the backend is being dropped
        let _ = report.send(r);
    }
    tracing::debug!("Save queue closed; remote writer exiting");
}

/// Talks to a Firebase Realtime Database over its REST interface
#[derive(Clone, Debug)]
pub(crate) struct FirebaseTransport {
    agent: Agent,
    url: String,
}

impl FirebaseTransport {
    /// `database_url` is the root of the database, e.g.
    /// `https://example-default-rtdb.firebaseio.com`
    pub(crate) fn new(database_url: &str) -> FirebaseTransport {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .build();
        let url = format!("{}/{STORAGE_KEY}.json", database_url.trim_end_matches('/'));
        FirebaseTransport { agent, url }
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }
}

impl RemoteTransport for FirebaseTransport {
    fn fetch(&self) -> Result<Snapshot, PersistError> {
        fetch(&self.agent, &self.url)
    }

    fn store(&self, snapshot: &Snapshot) -> Result<(), PersistError> {
        let json = snapshot.to_json()?;
        self.agent
            .put(&self.url)
            .timeout(REQUEST_TIMEOUT)
            .set("Content-Type", "application/json")
            .send_string(&json)?;
        Ok(())
    }

    fn subscribe(&self, tx: Sender<Snapshot>) -> Result<(), PersistError> {
        let agent = self.agent.clone();
        let url = self.url.clone();
        thread::Builder::new()
            .name(String::from("remote-events"))
            .spawn(move || listen(&agent, &url, &tx))?;
        Ok(())
    }
}

fn fetch(agent: &Agent, url: &str) -> Result<Snapshot, PersistError> {
    let value = agent
        .get(url)
        .timeout(REQUEST_TIMEOUT)
        .call()?
        .into_json::<serde_json::Value>()?;
    Ok(Snapshot::from_value(value).unwrap_or_else(|e| {
        tracing::warn!("Remote snapshot is malformed; treating as empty: {e}");
        Snapshot::default()
    }))
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum StreamEnd {
    /// The server closed or cancelled the stream
    Closed,
    /// Nobody is listening for updates any more
    ReceiverGone,
}

fn listen(agent: &Agent, url: &str, tx: &Sender<Snapshot>) {
    loop {
        match follow_stream(agent, url, tx) {
            Ok(StreamEnd::ReceiverGone) => {
                tracing::debug!("Update receiver dropped; ending remote subscription");
                return;
            }
            Ok(StreamEnd::Closed) => tracing::info!("Remote event stream closed; reconnecting"),
            Err(e) => tracing::warn!("Remote event stream failed; reconnecting: {e}"),
        }
        thread::sleep(RECONNECT_DELAY);
    }
}

fn follow_stream(
    agent: &Agent,
    url: &str,
    tx: &Sender<Snapshot>,
) -> Result<StreamEnd, PersistError> {
    let response = agent.get(url).set("Accept", "text/event-stream").call()?;
    let reader = BufReader::new(response.into_reader());
    let mut parser = EventParser::new();
    for line in reader.lines() {
        let line = line?;
        let Some(event) = parser.feed(line.trim_end_matches('\r')) else {
            continue;
        };
        let snapshot = match event.name.as_str() {
            "put" | "patch" => match decode_push(&event) {
                Ok(Push::Full(snapshot)) => snapshot,
                Ok(Push::Partial) => fetch(agent, url)?,
                Err(e) => {
                    tracing::warn!(event = %event.name, "Ignoring malformed remote event: {e}");
                    continue;
                }
            },
            "keep-alive" => continue,
            "cancel" | "auth_revoked" => {
                tracing::warn!(event = %event.name, "Remote database ended the subscription");
                return Ok(StreamEnd::Closed);
            }
            other => {
                tracing::debug!(event = %other, "Ignoring unknown remote event");
                continue;
            }
        };
        if tx.send(snapshot).is_err() {
            return Ok(StreamEnd::ReceiverGone);
        }
    }
    Ok(StreamEnd::Closed)
}
