//! Flat-file preference store
//!
//! The whole list lives in one JSON array. It is read once when the store is
//! opened and rewritten in full after every mutation. Array elements that do
//! not look like a preference are kept aside and written back unchanged.

use super::record::{Preference, PreferenceSource};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default location, relative to the working directory
pub const DEFAULT_PREFERENCES_FILE: &str = "data/preferences.json";

/// Shortest accepted preference text, after trimming
const MIN_PREFERENCE_CHARS: usize = 3;

const EMPTY_PROMPT_LIST: &str = "No preferences known yet.";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize preferences: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Insertion-ordered preference list backed by a JSON file
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    preferences: Vec<Preference>,
    /// Elements of the file that failed to parse as a record
    unrecognized: Vec<Value>,
}

/// One array element as written back to disk
#[derive(Serialize)]
#[serde(untagged)]
enum Entry<'a> {
    Known(&'a Preference),
    Raw(&'a Value),
}

#[derive(Debug, Default)]
struct Contents {
    preferences: Vec<Preference>,
    unrecognized: Vec<Value>,
}

impl PreferenceStore {
    /// Opens (or lazily creates) the store at `path`.
    ///
    /// Missing, empty, `{}` and unparseable files all start an empty list.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        ensure_parent(&path)?;
        let Contents {
            preferences,
            unrecognized,
        } = load(&path)?;

        debug!(
            "Loaded {} preferences from {}",
            preferences.len(),
            path.display()
        );

        Ok(Self {
            path,
            preferences,
            unrecognized,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.preferences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
    }

    pub fn list(&self) -> &[Preference] {
        &self.preferences
    }

    pub fn get(&self, id: &str) -> Option<&Preference> {
        self.preferences.iter().find(|p| p.id == id)
    }

    /// Appends a preference and rewrites the file. The in-memory list only
    /// changes once the write succeeded.
    ///
    /// Returns `Ok(None)` without touching the file when the text is too short.
    pub fn add(
        &mut self,
        text: &str,
        source: PreferenceSource,
    ) -> Result<Option<Preference>, StoreError> {
        if text.trim().chars().count() < MIN_PREFERENCE_CHARS {
            debug!("Ignoring preference too short to keep: {:?}", text);
            return Ok(None);
        }

        let preference = Preference::new(text, source);
        let mut updated = self.preferences.clone();
        updated.push(preference.clone());
        self.save(&updated)?;
        self.preferences = updated;

        info!(
            id = %preference.id,
            source = %preference.source,
            "Saved preference: {}",
            preference.text
        );
        Ok(Some(preference))
    }

    /// Removes every record with `id`. Returns whether anything was removed.
    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let updated: Vec<Preference> = self
            .preferences
            .iter()
            .filter(|p| p.id != id)
            .cloned()
            .collect();

        if updated.len() == self.preferences.len() {
            return Ok(false);
        }

        self.save(&updated)?;
        self.preferences = updated;
        info!("Deleted preference {}", id);
        Ok(true)
    }

    /// Bullet list for inclusion in a system prompt
    pub fn format_for_prompt(&self) -> String {
        if self.preferences.is_empty() {
            return EMPTY_PROMPT_LIST.to_string();
        }

        self.preferences
            .iter()
            .map(|p| format!("- {}", p.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of file entries kept verbatim because they are not records
    pub fn unrecognized_count(&self) -> usize {
        self.unrecognized.len()
    }

    fn save(&self, preferences: &[Preference]) -> Result<(), StoreError> {
        ensure_parent(&self.path)?;
        let entries: Vec<Entry<'_>> = preferences
            .iter()
            .map(Entry::Known)
            .chain(self.unrecognized.iter().map(Entry::Raw))
            .collect();
        let body = serde_json::to_string_pretty(&entries)?;

        let mut file = File::create(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        file.write_all(body.as_bytes())
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_all())
            .map_err(|e| StoreError::io(&self.path, e))
    }
}

/// Read-only health report for a preferences file
#[derive(Debug, Clone, Serialize)]
pub struct StoreReport {
    pub path: PathBuf,
    pub exists: bool,
    pub bytes: u64,
    /// Number of records, when the file parsed
    pub record_count: Option<usize>,
    /// Array elements that are not valid records
    pub unrecognized_count: usize,
    pub parse_error: Option<String>,
}

impl StoreReport {
    pub fn is_healthy(&self) -> bool {
        self.parse_error.is_none()
    }
}

/// Inspects a preferences file without modifying it
pub fn check(path: &Path) -> Result<StoreReport, StoreError> {
    if !path.exists() {
        return Ok(StoreReport {
            path: path.to_path_buf(),
            exists: false,
            bytes: 0,
            record_count: None,
            unrecognized_count: 0,
            parse_error: None,
        });
    }

    let raw = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let (record_count, unrecognized_count, parse_error) = match parse(&raw) {
        Ok(contents) => (
            Some(contents.preferences.len()),
            contents.unrecognized.len(),
            None,
        ),
        Err(e) => (None, 0, Some(e.to_string())),
    };

    Ok(StoreReport {
        path: path.to_path_buf(),
        exists: true,
        bytes: raw.len() as u64,
        record_count,
        unrecognized_count,
        parse_error,
    })
}

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))
        }
        _ => Ok(()),
    }
}

fn load(path: &Path) -> Result<Contents, StoreError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Contents::default()),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    match parse(&raw) {
        Ok(contents) => {
            if !contents.unrecognized.is_empty() {
                warn!(
                    "Preferences file {} has {} entries that are not preferences; keeping them as-is",
                    path.display(),
                    contents.unrecognized.len()
                );
            }
            Ok(contents)
        }
        Err(e) => {
            warn!(
                "Preferences file {} is not valid JSON ({}); starting empty",
                path.display(),
                e
            );
            Ok(Contents::default())
        }
    }
}

fn parse(raw: &str) -> Result<Contents, serde_json::Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "{}" {
        return Ok(Contents::default());
    }

    let elements = match serde_json::from_str::<Value>(trimmed)? {
        Value::Array(elements) => elements,
        _ => {
            return Err(serde::de::Error::custom(
                "expected a JSON array of preferences",
            ))
        }
    };

    let mut contents = Contents::default();
    for element in elements {
        match serde_json::from_value::<Preference>(element.clone()) {
            Ok(preference) => contents.preferences.push(preference),
            Err(e) => {
                debug!("Skipping unrecognized preference entry: {}", e);
                contents.unrecognized.push(element);
            }
        }
    }
    Ok(contents)
}
