// src/store.rs
//! Named-file storage for the run's persisted state (processed list, legacy cache).
//! A run is assumed to have exclusive access; nothing here locks across processes.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait StateFiles: Send + Sync {
    fn read(&self, name: &str) -> io::Result<String>;
    fn write(&self, name: &str, content: &str) -> io::Result<()>;
}

/// Files under a base directory. Writes go through a temp file + rename.
#[derive(Debug, Clone)]
pub struct DirFiles {
    base: PathBuf,
}

impl DirFiles {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }
}

impl StateFiles for DirFiles {
    fn read(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.path_for(name))
    }

    fn write(&self, name: &str, content: &str) -> io::Result<()> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        let mut f = fs::File::create(&tmp)?;
        f.write_all(content.as_bytes())?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}

/// In-memory files for the demo run and tests.
#[derive(Debug, Default)]
pub struct MemoryFiles {
    files: Mutex<HashMap<String, String>>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, name: &str, content: &str) -> Self {
        self.files
            .lock()
            .expect("memory files poisoned")
            .insert(name.to_string(), content.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.files
            .lock()
            .expect("memory files poisoned")
            .get(name)
            .cloned()
    }
}

impl StateFiles for MemoryFiles {
    fn read(&self, name: &str) -> io::Result<String> {
        self.get(name).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{name} not found"))
        })
    }

    fn write(&self, name: &str, content: &str) -> io::Result<()> {
        self.files
            .lock()
            .expect("memory files poisoned")
            .insert(name.to_string(), content.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_files_round_trip_and_leave_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let files = DirFiles::new(dir.path());
        files.write("state.json", "[1,2]").unwrap();
        assert_eq!(files.read("state.json").unwrap(), "[1,2]");
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[test]
    fn memory_files_report_not_found() {
        let files = MemoryFiles::new();
        let err = files.read("missing.json").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
