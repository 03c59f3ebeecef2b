use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::domain::LeadRecord;
use super::repository::{LeadStore, StoreError};

/// Lead list persisted as a single pretty-printed JSON array.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// reader never observes a half-written list.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "leads.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_atomically(&self, payload: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }

        let temp = self.temp_path();
        let mut file = fs::File::create(&temp).map_err(|err| self.io_error(err))?;
        file.write_all(payload).map_err(|err| self.io_error(err))?;
        file.sync_all().map_err(|err| self.io_error(err))?;
        drop(file);

        fs::rename(&temp, &self.path).map_err(|err| self.io_error(err))
    }
}

impl LeadStore for JsonFileStore {
    fn load(&self) -> Result<Vec<LeadRecord>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(err)),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, records: &[LeadRecord]) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(records).map_err(StoreError::Encode)?;

        match self.write_atomically(&payload) {
            Err(err) if err.is_transient() => {
                tracing::debug!(path = %self.path.display(), "retrying lead store write");
                self.write_atomically(&payload)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::domain::LeadId;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn scratch_path(label: &str) -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir()
            .join(format!(
                "opportunity-insights-{}-{label}-{unique}",
                std::process::id()
            ))
            .join("leads.json");
        let _ = std::fs::remove_file(&path);
        path
    }

    fn record(id: &str) -> LeadRecord {
        LeadRecord {
            id: LeadId(id.to_string()),
            submitted_at: Utc::now(),
            name: "Jane Doe".to_string(),
            email: "jane@co.com".to_string(),
            phone: "+91 9876543210".to_string(),
            product: "Yoga Mat".to_string(),
            country_of_interest: "usa".to_string(),
        }
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let store = JsonFileStore::new(scratch_path("missing"));
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn save_creates_parent_directory_and_round_trips() {
        let path = scratch_path("save");
        let store = JsonFileStore::new(&path);
        let records = vec![record("1"), record("2")];

        store.save(&records).expect("save");

        assert!(path.exists());
        assert!(!store.temp_path().exists());
        assert_eq!(store.load().expect("load"), records);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let path = scratch_path("corrupt");
        fs::create_dir_all(path.parent().expect("parent")).expect("dir");
        fs::write(&path, "{not json").expect("write");

        let err = JsonFileStore::new(&path).load().expect_err("corrupt");
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}
