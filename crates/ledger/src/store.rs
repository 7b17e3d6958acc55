//! On-disk JSON document for the usage ledger.
//!
//! The current shape is a flat object mapping player id to record. An
//! older shape wrapped that object as `{ "_players": { ... } }`; it is
//! still read, but writes always use the flat shape. A document that
//! cannot be parsed is renamed to `<file>.corrupted.<timestamp>` and the
//! ledger starts empty.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use kitforge_core::types::{PlayerId, Timestamp};
use kitforge_core::wipe::WipeState;
use serde::Serialize;
use serde_json::Value;

use crate::record::PlayerUsageRecord;

/// File name of the ledger document inside the data directory.
pub const LEDGER_FILE: &str = "player_usage.json";

/// File name of the persisted wipe baseline.
pub const WIPE_STATE_FILE: &str = "wipe_state.json";

/// Root key of the legacy wrapped document shape.
const LEGACY_ROOT_KEY: &str = "_players";

#[derive(Debug, thiserror::Error)]
pub enum LedgerStoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize ledger: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// How the persisted document was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// No document on disk.
    Missing,
    /// The document exists but could not be read.
    Unreadable,
    /// The document is empty or whitespace.
    Empty,
    /// Flat player-id mapping.
    Current,
    /// `{ "_players": { ... } }` wrapper.
    Legacy,
    /// Unparsable; moved aside to `backup` when the rename succeeded.
    Corrupted { backup: Option<PathBuf> },
}

/// Raw entries of a persisted document, not yet validated.
#[derive(Debug)]
pub struct LoadedDocument {
    pub source: DocumentSource,
    pub entries: Vec<(String, Value)>,
}

impl LoadedDocument {
    fn empty(source: DocumentSource) -> Self {
        Self {
            source,
            entries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default file name inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(LEDGER_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and shape-check the document.
    ///
    /// Never fails: every problem degrades to an empty entry list, and a
    /// corrupt document is backed up first.
    pub fn read_document(&self, now: Timestamp) -> LoadedDocument {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "No ledger document, starting empty");
            return LoadedDocument::empty(DocumentSource::Missing);
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read ledger document, starting empty");
                return LoadedDocument::empty(DocumentSource::Unreadable);
            }
        };

        if content.trim().is_empty() {
            tracing::warn!(path = %self.path.display(), "Ledger document is empty");
            return LoadedDocument::empty(DocumentSource::Empty);
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(mut root)) => match root.remove(LEGACY_ROOT_KEY) {
                Some(Value::Object(players)) => {
                    tracing::info!(players = players.len(), "Migrating legacy ledger document");
                    LoadedDocument {
                        source: DocumentSource::Legacy,
                        entries: players.into_iter().collect(),
                    }
                }
                Some(other) => {
                    // Put it back so the flat shape keeps every key.
                    root.insert(LEGACY_ROOT_KEY.to_string(), other);
                    LoadedDocument {
                        source: DocumentSource::Current,
                        entries: root.into_iter().collect(),
                    }
                }
                None => LoadedDocument {
                    source: DocumentSource::Current,
                    entries: root.into_iter().collect(),
                },
            },
            Ok(_) => self.recover_corrupted(now, "top-level value is not an object"),
            Err(e) => self.recover_corrupted(now, &e.to_string()),
        }
    }

    /// Move a corrupt document aside and continue empty.
    fn recover_corrupted(&self, now: Timestamp, reason: &str) -> LoadedDocument {
        let backup = self.backup_path(now);
        let backup = match fs::rename(&self.path, &backup) {
            Ok(()) => {
                tracing::warn!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    reason,
                    "Ledger document is corrupted, backed up and starting empty",
                );
                Some(backup)
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    reason,
                    "Ledger document is corrupted and could not be backed up, starting empty",
                );
                None
            }
        };
        LoadedDocument::empty(DocumentSource::Corrupted { backup })
    }

    /// `<path>.corrupted.<timestamp>`, with `.1`, `.2`, ... appended when
    /// an earlier backup from the same second exists.
    fn backup_path(&self, now: Timestamp) -> PathBuf {
        let mut base: OsString = self.path.clone().into_os_string();
        base.push(format!(".corrupted.{}", now.format("%Y%m%d%H%M%S")));

        let first = PathBuf::from(&base);
        if !first.exists() {
            return first;
        }
        (1u32..)
            .map(|n| {
                let mut name = base.clone();
                name.push(format!(".{n}"));
                PathBuf::from(name)
            })
            .find(|candidate| !candidate.exists())
            .unwrap_or(first)
    }

    /// Write the full ledger in the flat shape, atomically.
    pub fn write(
        &self,
        records: &HashMap<PlayerId, PlayerUsageRecord>,
    ) -> Result<(), LedgerStoreError> {
        write_json_atomic(&self.path, records)
    }
}

/// Serialize `value` to a sibling temp file, then rename it over `path`.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), LedgerStoreError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| LedgerStoreError::Io { path, source }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    let bytes = serde_json::to_vec_pretty(value)?;
    let mut tmp: OsString = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).map_err(io_err(&tmp))?;
    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        LedgerStoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Read the wipe baseline; missing or unreadable files yield the default.
pub fn load_wipe_state(path: &Path) -> WipeState {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Invalid wipe state, ignoring");
            WipeState::default()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => WipeState::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read wipe state, ignoring");
            WipeState::default()
        }
    }
}

pub fn save_wipe_state(path: &Path, state: &WipeState) -> Result<(), LedgerStoreError> {
    write_json_atomic(path, state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
