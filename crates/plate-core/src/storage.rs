use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::core::{DEFAULT_STORAGE_KEY, Document};
use crate::error::StorageError;
use crate::schema::ValidationMode;
use crate::serde_value;

pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut store = Self::default();
        store.values.insert(key.into(), value.into());
        store
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stores every key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::Unavailable(format!(
                "key {key:?} cannot be used as a file name"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(|err| {
            if let Err(cleanup) = std::fs::remove_file(&tmp) {
                tracing::warn!(path = %tmp.display(), %cleanup, "failed to remove temp file");
            }
            io_err(err)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Stored,
    Missing,
    Fallback,
    /// Handed in by the host; nothing was read from the store.
    Provided,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub doc: Document,
    pub source: LoadSource,
}

#[derive(Debug, Clone)]
pub struct Persistence {
    key: String,
    mode: ValidationMode,
}

impl Default for Persistence {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_KEY, ValidationMode::default())
    }
}

impl Persistence {
    pub fn new(key: impl Into<String>, mode: ValidationMode) -> Self {
        Self {
            key: key.into(),
            mode,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Never fails: unreadable or invalid state is replaced by the default document.
    pub fn load(&self, store: &dyn KeyValueStore) -> LoadedDocument {
        let raw = match store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::info!(key = %self.key, "no stored document, starting empty");
                return LoadedDocument {
                    doc: Document::default(),
                    source: LoadSource::Missing,
                };
            }
            Err(err) => {
                tracing::warn!(key = %self.key, %err, "failed to read stored document");
                return LoadedDocument {
                    doc: Document::default(),
                    source: LoadSource::Fallback,
                };
            }
        };

        match serde_value::from_json_str(&raw, self.mode) {
            Ok(doc) => {
                tracing::info!(key = %self.key, blocks = doc.children.len(), "loaded stored document");
                LoadedDocument {
                    doc,
                    source: LoadSource::Stored,
                }
            }
            Err(err) => {
                tracing::warn!(key = %self.key, %err, "stored document is unreadable, using default");
                LoadedDocument {
                    doc: Document::default(),
                    source: LoadSource::Fallback,
                }
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore, doc: &Document) -> Result<(), StorageError> {
        let value = serde_value::to_json(doc)?;
        store.set(&self.key, &value)
    }
}
