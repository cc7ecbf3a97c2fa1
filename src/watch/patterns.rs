// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};

use crate::dag::Task;
use crate::fs::FileSystem;
use crate::types::TaskName;
use crate::watch::path_utils::relative_str;

/// A glob anchored at a base directory.
///
/// Paths are matched relative to `base` with forward slashes, and `*` never
/// crosses a `/` (only `**` does), e.g. `assets/style/*.scss` matches
/// `assets/style/main.scss` but not `assets/style/vendor/x.scss`.
#[derive(Clone)]
pub struct GlobPattern {
    base: PathBuf,
    glob: String,
    matcher: GlobMatcher,
}

impl fmt::Debug for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobPattern")
            .field("base", &self.base)
            .field("glob", &self.glob)
            .finish()
    }
}

impl GlobPattern {
    pub fn new(base: impl Into<PathBuf>, glob: impl Into<String>) -> Result<Self> {
        let glob = glob.into();
        let matcher = GlobBuilder::new(&glob)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {glob}"))?
            .compile_matcher();
        Ok(Self {
            base: base.into(),
            glob,
            matcher,
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn glob(&self) -> &str {
        &self.glob
    }

    /// Match a path already relative to `base`, e.g. `"assets/a.js"`.
    pub fn matches_relative(&self, rel_path: &str) -> bool {
        !rel_path.is_empty() && self.matcher.is_match(rel_path)
    }

    /// Match an arbitrary path; paths outside `base` never match.
    pub fn matches_path(&self, path: &Path) -> bool {
        relative_str(&self.base, path)
            .map(|rel| self.matches_relative(&rel))
            .unwrap_or(false)
    }
}

/// Association of a glob with the task re-run when a matching file changes.
#[derive(Debug, Clone)]
pub struct WatchBinding {
    name: TaskName,
    pattern: GlobPattern,
    task: Task,
}

impl WatchBinding {
    pub fn new(name: impl Into<TaskName>, pattern: GlobPattern, task: Task) -> Self {
        Self {
            name: name.into(),
            pattern,
            task,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &GlobPattern {
        &self.pattern
    }

    pub fn task(&self) -> &Task {
        &self.task
    }
}

/// Collect all files under `pattern.base()` matching the pattern.
///
/// A missing base directory yields an empty list: "no files matched" is a
/// valid, empty result. The list is sorted for deterministic output.
pub fn collect_matching_files(fs: &dyn FileSystem, pattern: &GlobPattern) -> Result<Vec<PathBuf>> {
    let root = pattern.base();
    let mut files = Vec::new();
    if !fs.is_dir(root) {
        return Ok(files);
    }

    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if pattern.matches_relative(&rel_str) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}
