// src/exec/transform.rs

//! The contract between the orchestration core and the file transforms.
//!
//! A transform turns the files matched by `input_glob` under `base_dir` into
//! files under `dest_dir`. The core never looks inside one; it only decides
//! which to invoke and when.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;

/// Free-form options passed through to a transform.
pub type TransformOptions = BTreeMap<String, toml::Value>;

/// Everything a transform needs for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    /// Glob relative to `base_dir`.
    pub input_glob: String,
    pub base_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub options: TransformOptions,
}

impl TransformRequest {
    pub fn new(
        input_glob: impl Into<String>,
        base_dir: impl Into<PathBuf>,
        dest_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_glob: input_glob.into(),
            base_dir: base_dir.into(),
            dest_dir: dest_dir.into(),
            options: TransformOptions::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Store a list of paths under `key`.
    pub fn with_paths<'a>(self, key: &str, paths: impl IntoIterator<Item = &'a Path>) -> Self {
        let list: Vec<toml::Value> = paths
            .into_iter()
            .map(|p| toml::Value::String(p.to_string_lossy().into_owned()))
            .collect();
        self.with_option(key, toml::Value::Array(list))
    }

    /// Read back a list of paths stored with [`with_paths`](Self::with_paths).
    /// Missing keys and non-string items are skipped.
    pub fn paths_option(&self, key: &str) -> Vec<PathBuf> {
        match self.options.get(key) {
            Some(toml::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(PathBuf::from)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn table_option(&self, key: &str) -> Option<&toml::Table> {
        self.options.get(key).and_then(|v| v.as_table())
    }
}

/// Files written by one transform invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSet {
    pub files: Vec<PathBuf>,
}

impl OutputSet {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Boxed future returned by [`Transform::run`].
pub type TransformFuture<'a> = Pin<Box<dyn Future<Output = Result<OutputSet>> + Send + 'a>>;

/// A unit converting matched input files into output files.
///
/// Implementations must:
/// - resolve exactly once (success or error),
/// - treat "no files matched" as an empty success,
/// - tolerate repeated invocations writing to the same output paths.
pub trait Transform: Send + Sync {
    fn run<'a>(&'a self, request: &'a TransformRequest) -> TransformFuture<'a>;
}

/// Transforms available to a runner, keyed by primitive task name.
#[derive(Clone, Default)]
pub struct TransformSet {
    transforms: HashMap<String, Arc<dyn Transform>>,
}

impl fmt::Debug for TransformSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.transforms.keys().collect();
        names.sort();
        f.debug_struct("TransformSet")
            .field("transforms", &names)
            .finish()
    }
}

impl TransformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the transform behind `name`.
    pub fn insert(&mut self, name: impl Into<String>, transform: Arc<dyn Transform>) {
        self.transforms.insert(name.into(), transform);
    }

    pub fn with(mut self, name: impl Into<String>, transform: Arc<dyn Transform>) -> Self {
        self.insert(name, transform);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Transform>> {
        self.transforms.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }
}
