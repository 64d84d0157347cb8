//! Just enough of the `text/event-stream` format to follow a realtime
//! database subscription
use crate::snapshot::Snapshot;
use serde::Deserialize;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(super) struct Event {
    pub(super) name: String,
    pub(super) data: String,
}

/// Assembles events from the lines of an event stream
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(super) struct EventParser {
    pending: Event,
    has_data: bool,
}

impl EventParser {
    pub(super) fn new() -> EventParser {
        EventParser::default()
    }

    /// Feeds the parser one line (without its terminator).  Returns the
    /// completed event when `line` is the blank line ending one.
    pub(super) fn feed(&mut self, line: &str) -> Option<Event> {
        if line.is_empty() {
            let has_data = std::mem::replace(&mut self.has_data, false);
            let event = std::mem::take(&mut self.pending);
            return (has_data || !event.name.is_empty()).then_some(event);
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.pending.name = value.to_owned(),
            "data" => {
                if self.has_data {
                    self.pending.data.push('\n');
                }
                self.pending.data.push_str(value);
                self.has_data = true;
            }
            _ => (),
        }
        None
    }
}

/// What a `put` or `patch` event means for the local copy of the snapshot
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) enum Push {
    /// The event carries the complete new snapshot
    Full(Snapshot),
    /// Only part of the snapshot changed; the whole thing must be re-fetched
    Partial,
}

#[derive(Debug, Deserialize)]
struct PushPayload {
    path: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Decodes the payload of a `put` or `patch` event.  A full `put` whose
/// snapshot is malformed empties the board, the same as a malformed fetch.
pub(super) fn decode_push(event: &Event) -> Result<Push, serde_json::Error> {
    let payload = serde_json::from_str::<PushPayload>(&event.data)?;
    if event.name == "put" && payload.path == "/" {
        let snapshot = Snapshot::from_value(payload.data).unwrap_or_else(|e| {
            tracing::warn!("Pushed snapshot is malformed; treating as empty: {e}");
            Snapshot::default()
        });
        Ok(Push::Full(snapshot))
    } else {
        Ok(Push::Partial)
    }
}
