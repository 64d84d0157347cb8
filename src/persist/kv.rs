use super::PersistError;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A string-keyed store of string values, the local counterpart of a
/// browser's `localStorage`
pub(crate) trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), PersistError>;
}

/// A [`KeyValueStore`] kept as a JSON object in a single file.
///
/// Every `set()` rewrites the whole file by writing a sibling temporary file
/// and renaming it over the original.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub(crate) fn new<P: Into<PathBuf>>(path: P) -> FileStore {
        FileStore { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(s) if s.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(s) => Ok(serde_json::from_str(&s)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        let mut contents = serde_json::to_string_pretty(items)?;
        contents.push('\n');
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path).inspect_err(|_| {
            let _ = fs::remove_file(&tmp);
        })?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), PersistError> {
        let mut items = match self.read_all() {
            Ok(items) => items,
            Err(PersistError::Json(e)) => {
                tracing::warn!(path = %self.path.display(), "Overwriting unreadable store: {e}");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        items.insert(key.to_owned(), value);
        self.write_all(&items)
    }
}

/// A [`KeyValueStore`] that only lives in memory
#[cfg(test)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct MemoryStore {
    items: BTreeMap<String, String>,
    pub(crate) fail_writes: bool,
}

#[cfg(test)]
impl MemoryStore {
    pub(crate) fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), PersistError> {
        if self.fail_writes {
            return Err(std::io::Error::from(ErrorKind::PermissionDenied).into());
        }
        self.items.insert(key.to_owned(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file() {
        let dir = tempdir().expect("should create temporary directory");
        let store = FileStore::new(dir.path().join("store.json"));
        assert_eq!(store.get("teamStatusData").ok(), Some(None));
    }

    #[test]
    fn test_set_then_get() {
        let dir = tempdir().expect("should create temporary directory");
        let path = dir.path().join("nested").join("store.json");
        let mut store = FileStore::new(&path);
        store
            .set("teamStatusData", String::from("{\"teamMembers\":[]}"))
            .expect("set should succeed");
        store
            .set("other", String::from("value"))
            .expect("set should succeed");
        let store = FileStore::new(&path);
        assert_eq!(
            store.get("teamStatusData").ok(),
            Some(Some(String::from("{\"teamMembers\":[]}")))
        );
        assert_eq!(store.get("other").ok(), Some(Some(String::from("value"))));
        assert!(!dir.path().join("nested").join("store.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempdir().expect("should create temporary directory");
        let path = dir.path().join("store.json");
        fs::write(&path, "not json at all").expect("should write file");
        let mut store = FileStore::new(&path);
        assert!(matches!(store.get("key"), Err(PersistError::Json(_))));
        store
            .set("key", String::from("value"))
            .expect("set should replace corrupt file");
        assert_eq!(store.get("key").ok(), Some(Some(String::from("value"))));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("key").ok(), Some(None));
        store
            .set("key", String::from("value"))
            .expect("set should succeed");
        assert_eq!(store.get("key").ok(), Some(Some(String::from("value"))));
        store.fail_writes = true;
        assert!(matches!(
            store.set("key", String::from("other")),
            Err(PersistError::Io(_))
        ));
        assert_eq!(store.get("key").ok(), Some(Some(String::from("value"))));
    }
}
