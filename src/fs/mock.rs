// src/fs/mock.rs

//! In-memory [`FileSystem`] for tests.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};

use super::FileSystem;

#[derive(Debug, Clone)]
enum MockEntry {
    File(Vec<u8>),
    Dir,
}

#[derive(Debug, Default)]
struct MockState {
    entries: BTreeMap<PathBuf, MockEntry>,
    /// Directories whose removal fails with `PermissionDenied`.
    locked: BTreeSet<PathBuf>,
}

/// Cloneable handle to a shared in-memory tree.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut state = self.lock();
        if let Some(parent) = path.parent() {
            insert_dirs(&mut state.entries, parent);
        }
        state
            .entries
            .insert(path.to_path_buf(), MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        insert_dirs(&mut self.lock().entries, path.as_ref());
    }

    /// Make `remove_dir_all` on `path` fail with `PermissionDenied`.
    pub fn deny_removal(&self, path: impl AsRef<Path>) {
        self.lock().locked.insert(path.as_ref().to_path_buf());
    }

    /// All file paths currently stored, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        self.lock()
            .entries
            .iter()
            .filter(|(_, e)| matches!(e, MockEntry::File(_)))
            .map(|(p, _)| p.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned mock only happens after a test already panicked.
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

fn insert_dirs(entries: &mut BTreeMap<PathBuf, MockEntry>, dir: &Path) {
    for ancestor in dir.ancestors() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        entries
            .entry(ancestor.to_path_buf())
            .or_insert(MockEntry::Dir);
    }
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        match self.lock().entries.get(path) {
            Some(MockEntry::File(content)) => Ok(content.clone()),
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.add_dir(path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        if state.locked.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {:?}", path),
            ));
        }
        if !matches!(state.entries.get(path), Some(MockEntry::Dir)) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("not found: {:?}", path),
            ));
        }
        state.entries.retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().entries.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().entries.get(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().entries.get(path), Some(MockEntry::Dir))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.lock();
        match state.entries.get(path) {
            Some(MockEntry::Dir) => Ok(state
                .entries
                .keys()
                .filter(|p| p.parent() == Some(path))
                .cloned()
                .collect()),
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
