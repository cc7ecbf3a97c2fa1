// src/errors.rs

//! Crate-wide error type.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::TaskName;

#[derive(Error, Debug)]
pub enum SitepipeError {
    /// The override configuration exists but could not be turned into a
    /// valid configuration. Raised before any task runs.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A primitive task's transform failed.
    #[error("task '{task}' failed: {message}")]
    TransformError { task: TaskName, message: String },

    /// Removing an output directory failed for a reason other than it
    /// not existing.
    #[error("failed to remove {path:?}: {source}")]
    CleanError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A rebuild triggered by the watcher failed.
    #[error("rebuild of '{binding}' failed: {message}")]
    WatchRunError { binding: TaskName, message: String },

    /// A member of a series/parallel composite failed.
    #[error("{composite} member #{index} ({member}) failed: {source}")]
    MemberFailed {
        composite: String,
        index: usize,
        member: String,
        source: Box<SitepipeError>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SitepipeError {
    /// Name of the primitive task this failure is attributed to, if any.
    pub fn failing_leaf(&self) -> Option<&str> {
        match self {
            SitepipeError::TransformError { task, .. } => Some(task),
            SitepipeError::CleanError { .. } => Some("clean"),
            SitepipeError::MemberFailed { source, .. } => source.failing_leaf(),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SitepipeError>;
