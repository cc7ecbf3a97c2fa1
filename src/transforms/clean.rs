// src/transforms/clean.rs

//! Removes generated output directories.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use crate::dag::graph::options;
use crate::errors::SitepipeError;
use crate::exec::transform::{OutputSet, Transform, TransformFuture, TransformRequest};
use crate::fs::FileSystem;

/// Deletes every directory listed under the `targets` option.
///
/// A target that does not exist counts as already clean.
#[derive(Debug, Clone)]
pub struct CleanTransform {
    fs: Arc<dyn FileSystem>,
}

impl CleanTransform {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl Transform for CleanTransform {
    fn run<'a>(&'a self, request: &'a TransformRequest) -> TransformFuture<'a> {
        let fs = Arc::clone(&self.fs);
        let targets = request.paths_option(options::TARGETS);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || remove_targets(fs.as_ref(), &targets))
                .await
                .context("clean worker did not complete")?
                .map_err(anyhow::Error::from)?;
            Ok(OutputSet::empty())
        })
    }
}

pub fn remove_targets(fs: &dyn FileSystem, targets: &[PathBuf]) -> Result<(), SitepipeError> {
    for target in targets {
        match fs.remove_dir_all(target) {
            Ok(()) => info!(path = ?target, "removed"),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = ?target, "nothing to remove");
            }
            Err(source) => {
                return Err(SitepipeError::CleanError {
                    path: target.clone(),
                    source,
                });
            }
        }
    }
    Ok(())
}
