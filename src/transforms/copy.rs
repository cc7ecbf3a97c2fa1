// src/transforms/copy.rs

//! Passthrough transform: copy matched files, keeping their path relative
//! to the base directory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::exec::transform::{OutputSet, Transform, TransformFuture, TransformRequest};
use crate::fs::FileSystem;
use crate::watch::patterns::{GlobPattern, collect_matching_files};

#[derive(Debug, Clone)]
pub struct CopyTransform {
    fs: Arc<dyn FileSystem>,
}

impl CopyTransform {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl Transform for CopyTransform {
    fn run<'a>(&'a self, request: &'a TransformRequest) -> TransformFuture<'a> {
        let fs = Arc::clone(&self.fs);
        let request = request.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || copy_matching(fs.as_ref(), &request))
                .await
                .context("copy worker did not complete")?
        })
    }
}

/// Copy every file matched by the request into `dest_dir`.
///
/// Files whose destination already holds identical bytes are left alone.
pub fn copy_matching(fs: &dyn FileSystem, request: &TransformRequest) -> Result<OutputSet> {
    let pattern = GlobPattern::new(&request.base_dir, &request.input_glob)?;
    let mut outputs = Vec::new();

    for input in collect_matching_files(fs, &pattern)? {
        let output = destination_for(request, &input)?;
        let bytes = fs.read(&input)?;
        if fs.is_file(&output) && fs.read(&output)? == bytes {
            debug!(?output, "unchanged; skipping write");
        } else {
            fs.write(&output, &bytes)?;
        }
        outputs.push(output);
    }

    Ok(OutputSet::new(outputs))
}

/// Mirror `input` (under `base_dir`) into `dest_dir`.
pub(crate) fn destination_for(request: &TransformRequest, input: &std::path::Path) -> Result<PathBuf> {
    let rel = input
        .strip_prefix(&request.base_dir)
        .with_context(|| format!("{:?} is not below {:?}", input, request.base_dir))?;
    Ok(request.dest_dir.join(rel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn copies_matches_preserving_relative_paths() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/src/assets/scripts/a.js", "a");
        fs.add_file("/site/src/assets/scripts/nested/b.js", "b");
        fs.add_file("/site/src/assets/scripts/c.ts", "c");

        let request = TransformRequest::new("assets/scripts/*.js", "/site/src", "/site/temp");
        let outputs = copy_matching(&fs, &request).unwrap();

        assert_eq!(outputs.files, vec![PathBuf::from("/site/temp/assets/scripts/a.js")]);
        assert_eq!(fs.read_to_string(&outputs.files[0]).unwrap(), "a");
    }

    #[test]
    fn missing_base_dir_is_empty_success() {
        let fs = MockFileSystem::new();
        let request = TransformRequest::new("**", "/site/public", "/site/dist");
        assert!(copy_matching(&fs, &request).unwrap().is_empty());
    }
}
