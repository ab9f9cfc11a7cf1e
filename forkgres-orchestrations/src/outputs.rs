//! Destinations for the values a successful fork emits

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::error::StateError;
use crate::kv_file::format_entry;

pub trait OutputSink: Send {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), StateError>;
}

/// Appends `name=value` entries to an output file
#[derive(Debug, Clone)]
pub struct FileOutputSink {
    path: PathBuf,
}

impl FileOutputSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputSink for FileOutputSink {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), StateError> {
        let entry = format_entry(name, value)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())?;
        Ok(())
    }
}

/// Prints `name=value` entries on stdout
#[derive(Debug, Clone, Default)]
pub struct StdoutOutputSink;

impl OutputSink for StdoutOutputSink {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), StateError> {
        let entry = format_entry(name, value)?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(entry.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

/// Collects outputs in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryOutputSink {
    pub outputs: Vec<(String, String)>,
}

impl MemoryOutputSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.outputs
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl OutputSink for MemoryOutputSink {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), StateError> {
        self.outputs.push((name.to_string(), value.to_string()));
        Ok(())
    }
}
