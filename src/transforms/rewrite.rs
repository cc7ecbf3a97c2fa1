// src/transforms/rewrite.rs

//! Reference rewriting for compiled pages.
//!
//! A page may group asset references into build blocks:
//!
//! ```html
//! <!-- build:css assets/style/site.css -->
//! <link rel="stylesheet" href="assets/style/a.css">
//! <link rel="stylesheet" href="/node_modules/lib/lib.css">
//! <!-- endbuild -->
//! ```
//!
//! Each block is replaced by a single tag pointing at the block target, and
//! the referenced files are concatenated into `dest_dir/<target>`. References
//! are looked up in the `search_path` directories, first hit wins.
//!
//! The page inputs live in the temp tree and the outputs in dist, so running
//! the rewrite again produces the same bytes.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::dag::graph::options;
use crate::exec::transform::{OutputSet, Transform, TransformFuture, TransformRequest};
use crate::fs::FileSystem;
use crate::transforms::copy::destination_for;
use crate::watch::patterns::{GlobPattern, collect_matching_files};

const BLOCK_PATTERN: &str =
    r"(?s)<!--\s*build:(css|js)\s+(\S+?)\s*-->(.*?)<!--\s*endbuild\s*-->";
const REFERENCE_PATTERN: &str = r#"(?:href|src)\s*=\s*["']([^"']+)["']"#;

#[derive(Debug, Clone)]
pub struct RewriteTransform {
    fs: Arc<dyn FileSystem>,
}

impl RewriteTransform {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl Transform for RewriteTransform {
    fn run<'a>(&'a self, request: &'a TransformRequest) -> TransformFuture<'a> {
        let fs = Arc::clone(&self.fs);
        let request = request.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || rewrite_pages(fs.as_ref(), &request))
                .await
                .context("rewrite worker did not complete")?
        })
    }
}

struct Rules {
    block: Regex,
    reference: Regex,
}

/// Rewrite every matched page into `dest_dir`.
///
/// `dest_dir` is created even when no page matched.
pub fn rewrite_pages(fs: &dyn FileSystem, request: &TransformRequest) -> Result<OutputSet> {
    let rules = Rules {
        block: Regex::new(BLOCK_PATTERN)?,
        reference: Regex::new(REFERENCE_PATTERN)?,
    };
    let search_path = request.paths_option(options::SEARCH_PATH);
    let pattern = GlobPattern::new(&request.base_dir, &request.input_glob)?;

    fs.create_dir_all(&request.dest_dir)?;

    let mut outputs = Vec::new();
    for page in collect_matching_files(fs, &pattern)? {
        let html = fs.read_to_string(&page)?;
        let (rewritten, bundles) = rewrite_html(&rules, &html);

        for bundle in bundles {
            let target = bundle_path(&request.dest_dir, &bundle.target)
                .with_context(|| format!("rewriting {}", page.display()))?;
            let contents = concat_references(fs, &search_path, &bundle.references, &page);
            fs.write(&target, &contents)?;
            outputs.push(target);
        }

        let output = destination_for(request, &page)?;
        fs.write(&output, rewritten.as_bytes())?;
        debug!(page = ?page, output = ?output, "rewrote page");
        outputs.push(output);
    }

    Ok(OutputSet::new(outputs))
}

/// Bundle targets are relative to `dest_dir` and may not climb out of it.
fn bundle_path(dest_dir: &Path, target: &str) -> Result<PathBuf> {
    let rel = Path::new(target.trim_start_matches('/'));
    let escapes = rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        bail!("build block target `{target}` leaves the output directory");
    }
    Ok(dest_dir.join(rel))
}

#[derive(Debug, PartialEq, Eq)]
struct Bundle {
    target: String,
    references: Vec<String>,
}

fn rewrite_html(rules: &Rules, html: &str) -> (String, Vec<Bundle>) {
    let mut bundles = Vec::new();
    let rewritten = rules.block.replace_all(html, |caps: &Captures<'_>| {
        let kind = &caps[1];
        let target = caps[2].to_string();
        let references = rules
            .reference
            .captures_iter(&caps[3])
            .map(|r| r[1].to_string())
            .collect();

        let tag = if kind == "css" {
            format!(r#"<link rel="stylesheet" href="{target}">"#)
        } else {
            format!(r#"<script src="{target}"></script>"#)
        };
        bundles.push(Bundle { target, references });
        tag
    });
    (rewritten.into_owned(), bundles)
}

fn concat_references(
    fs: &dyn FileSystem,
    search_path: &[PathBuf],
    references: &[String],
    page: &Path,
) -> Vec<u8> {
    let mut out = Vec::new();
    for reference in references {
        let rel = reference.trim_start_matches('/');
        let found = search_path
            .iter()
            .map(|dir| dir.join(rel))
            .find(|candidate| fs.is_file(candidate));

        match found.map(|path| fs.read(&path)) {
            Some(Ok(bytes)) => {
                out.extend_from_slice(&bytes);
                if !bytes.ends_with(b"\n") {
                    out.push(b'\n');
                }
            }
            Some(Err(err)) => {
                warn!(page = ?page, reference = %reference, error = %err, "failed to read reference");
            }
            None => {
                warn!(page = ?page, reference = %reference, "reference not found in search path");
            }
        }
    }
    out
}
