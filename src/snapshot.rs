use crate::status::{Status, StatusKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// The complete persisted state of the board
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Snapshot {
    pub(crate) members: Vec<String>,
    pub(crate) entries: BTreeMap<StatusKey, Status>,
    pub(crate) last_updated: Option<OffsetDateTime>,
}

impl Snapshot {
    pub(crate) fn to_json(&self) -> Result<String, serde_json::Error> {
        let wire = WireSnapshot {
            team_members: Some(self.members.clone()),
            status_data: Some(
                self.entries
                    .iter()
                    .map(|(k, v)| (k.to_wire(), v.as_str().to_owned()))
                    .collect(),
            ),
            last_updated: self
                .last_updated
                .and_then(|ts| ts.format(&Rfc3339).ok()),
        };
        serde_json::to_string(&wire)
    }

    /// Parses a snapshot from JSON.
    ///
    /// Only a document that is not a JSON object (or whose fields have the
    /// wrong JSON types) is an error.  Missing or `null` fields are treated as
    /// empty, and individual entries with unparseable keys or statuses are
    /// dropped with a warning, as are repeated member names.  A JSON `null`
    /// document (what the realtime database returns for a path that was
    /// never written) is an empty snapshot.
    pub(crate) fn from_json(s: &str) -> Result<Snapshot, serde_json::Error> {
        let Some(wire) = serde_json::from_str::<Option<WireSnapshot>>(s)? else {
            return Ok(Snapshot::default());
        };
        Ok(Snapshot::from(wire))
    }

    /// Like [`Snapshot::from_json`], but starting from an already-parsed
    /// JSON value
    pub(crate) fn from_value(value: serde_json::Value) -> Result<Snapshot, serde_json::Error> {
        let Some(wire) = serde_json::from_value::<Option<WireSnapshot>>(value)? else {
            return Ok(Snapshot::default());
        };
        Ok(Snapshot::from(wire))
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireSnapshot {
    #[serde(default)]
    team_members: Option<Vec<String>>,
    #[serde(default)]
    status_data: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated: Option<String>,
}

impl From<WireSnapshot> for Snapshot {
    fn from(wire: WireSnapshot) -> Snapshot {
        let mut members = Vec::new();
        for name in wire.team_members.unwrap_or_default() {
            if members.contains(&name) {
                tracing::warn!(member = %name, "Dropping duplicate team member from snapshot");
            } else {
                members.push(name);
            }
        }
        let mut entries = BTreeMap::new();
        for (raw_key, raw_status) in wire.status_data.unwrap_or_default() {
            let Some(key) = StatusKey::from_wire(&raw_key) else {
                tracing::warn!(key = %raw_key, "Dropping status entry with malformed key");
                continue;
            };
            match raw_status.parse::<Status>() {
                Ok(status) => {
                    entries.insert(key, status);
                }
                Err(e) => tracing::warn!(key = %raw_key, "Dropping status entry: {e}"),
            }
        }
        let last_updated = wire.last_updated.and_then(|s| {
            OffsetDateTime::parse(&s, &Rfc3339)
                .inspect_err(|e| tracing::warn!(value = %s, "Ignoring malformed lastUpdated: {e}"))
                .ok()
        });
        Snapshot {
            members,
            entries,
            last_updated,
        }
    }
}
