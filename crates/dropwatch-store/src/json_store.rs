use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use dropwatch_core::{Alert, AlertBook};

use crate::error::StoreError;

/// File-backed alert store: one JSON document for the whole collection.
///
/// Saves are atomic from a reader's perspective: the new document is written
/// to a sibling temp file and renamed over the target, so a concurrent
/// `load_all` sees either the old document or the new one, never a partial
/// write. Write serialization is the caller's concern (the engine runs one
/// cycle at a time).
#[derive(Debug, Clone)]
pub struct JsonAlertStore {
    path: PathBuf,
}

impl JsonAlertStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the full alert collection.
    ///
    /// A missing document is an empty collection, not an error. Individual
    /// alert records that no longer match the expected shape are logged and
    /// skipped so one corrupt entry cannot take the whole collection down.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] on I/O failure other than a missing file,
    /// or [`StoreError::Parse`] if the document itself is not valid JSON.
    pub async fn load_all(&self) -> Result<AlertBook, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(AlertBook::new()),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.display().to_string(),
                    source: e,
                })
            }
        };

        let doc: BTreeMap<String, Vec<serde_json::Value>> =
            serde_json::from_str(&raw).map_err(|e| StoreError::Parse {
                path: self.path.display().to_string(),
                source: e,
            })?;

        let mut book = AlertBook::new();
        for (user_id, entries) in doc {
            let mut alerts = Vec::with_capacity(entries.len());
            for entry in entries {
                match serde_json::from_value::<Alert>(entry) {
                    Ok(alert) => alerts.push(alert),
                    Err(e) => {
                        tracing::warn!(
                            user_id = %user_id,
                            error = %e,
                            "skipping malformed alert record"
                        );
                    }
                }
            }
            book.insert(user_id, alerts);
        }

        Ok(book)
    }

    /// Replaces the persisted collection with `book`, atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialize`] if the book cannot be serialized, or
    /// [`StoreError::Write`] if the temp file cannot be written or renamed
    /// over the target.
    pub async fn save_all(&self, book: &AlertBook) -> Result<(), StoreError> {
        let mut body = serde_json::to_string_pretty(book).map_err(StoreError::Serialize)?;
        body.push('\n');

        let tmp_path = self.tmp_path();
        let write_err = |source| StoreError::Write {
            path: self.path.display().to_string(),
            source,
        };

        tokio::fs::write(&tmp_path, body).await.map_err(write_err)?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(write_err)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map_or_else(
            || std::ffi::OsString::from("alerts.json"),
            std::ffi::OsStr::to_os_string,
        );
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
