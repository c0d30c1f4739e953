//! Persistence for the set of filenames already transferred.
//!
//! One JSON blob per run name. A missing file loads as the empty set; a file
//! that exists but does not parse is surfaced as [`SyncError::StateCorrupt`]
//! rather than silently treated as empty, since an empty set would re-transfer
//! everything. Saves go through a temp file plus atomic rename so a failed
//! write never leaves a partially-written state file behind.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

/// Store for one run's transferred-filename set
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store keyed by run name, in the current working directory.
    ///
    /// The file name derives deterministically from the run name, so two
    /// differently-named runs never collide and the same run reuses its
    /// file across invocations.
    pub fn for_run(name: &str) -> Self {
        Self::in_dir(".", name)
    }

    /// Store keyed by run name, rooted at `dir`
    pub fn in_dir(dir: impl AsRef<Path>, name: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!(".{name}.state.json")),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted set. A missing file is an empty set, not an error.
    pub fn load(&self) -> Result<HashSet<String>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(e.into()),
        };

        let names: Vec<String> = serde_json::from_slice(&bytes)
            .map_err(|e| SyncError::state_corrupt(&self.path, e))?;
        Ok(names.into_iter().collect())
    }

    /// Write the full set, replacing any prior state for this run name
    pub fn save(&self, transferred: &HashSet<String>) -> Result<()> {
        // Sorted so the file diffs cleanly between runs
        let mut names: Vec<&String> = transferred.iter().collect();
        names.sort();
        let json = serde_json::to_vec_pretty(&names)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| SyncError::Io(e.error))?;
        Ok(())
    }
}
