//! Key/value state handed from the fork phase to the teardown phase

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StateError;
use crate::kv_file::{format_entry, parse_entries};

/// Storage for cross-invocation state
pub trait StateStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StateError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StateError>;

    /// Discard everything once the teardown phase has read it
    fn clear(&mut self) -> Result<(), StateError>;
}

/// State persisted as `name=value` lines in a file
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // Later entries win
        Ok(parse_entries(&text)?
            .into_iter()
            .rev()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StateError> {
        let entry = format_entry(key, value)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StateError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process state, used when both phases share a process and in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    entries: HashMap<String, String>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StateError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StateError> {
        self.entries.clear();
        Ok(())
    }
}
