// src/serve/mod.rs

//! Development server.
//!
//! `develop` hands a [`DevServer`] the directories to serve, the extra routes,
//! the port and the reload pattern, then forwards reload notifications from
//! the watch dispatcher. [`StaticDevServer`] serves them over HTTP.

pub mod dev_loop;
pub mod static_server;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::dag::graph::options;
use crate::exec::transform::TransformRequest;
use crate::fs::FileSystem;
use crate::watch::patterns::GlobPattern;

pub use dev_loop::DevLoop;
pub use static_server::StaticDevServer;

/// Everything a dev server needs to start.
#[derive(Debug, Clone)]
pub struct ServeSpec {
    /// Served in priority order; the first directory holding a file wins.
    pub base_dirs: Vec<PathBuf>,
    /// URL prefix to directory, checked before `base_dirs`.
    pub routes: Vec<(String, PathBuf)>,
    pub port: u16,
    /// Changes to files matching this pattern reload connected browsers.
    pub reload: GlobPattern,
}

impl ServeSpec {
    /// Build the serve settings from a `serve` task request.
    pub fn from_request(request: &TransformRequest) -> Result<Self> {
        let port = match request.options.get(options::PORT) {
            Some(value) => {
                let raw = value
                    .as_integer()
                    .with_context(|| format!("serve option `port` must be an integer, got {value}"))?;
                u16::try_from(raw).with_context(|| format!("port {raw} out of range"))?
            }
            None => bail!("serve task has no `port` option"),
        };

        let mut routes: Vec<(String, PathBuf)> = request
            .table_option(options::ROUTES)
            .into_iter()
            .flatten()
            .filter_map(|(prefix, dir)| {
                dir.as_str()
                    .map(|d| (prefix.trim_end_matches('/').to_string(), PathBuf::from(d)))
            })
            .collect();
        // Longest prefix first so nested routes shadow their parents.
        routes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Ok(Self {
            base_dirs: request.paths_option(options::BASE_DIRS),
            routes,
            port,
            reload: GlobPattern::new(&request.base_dir, &request.input_glob)?,
        })
    }

    /// Map a request path (e.g. `/assets/style/main.css`) to a file.
    ///
    /// Routes are tried first, then each base directory in order. A
    /// directory hit resolves to its `index.html`.
    pub fn resolve(&self, url_path: &str, fs: &dyn FileSystem) -> Option<PathBuf> {
        let url_path = url_path.split(['?', '#']).next().unwrap_or_default();
        if url_path.split('/').any(|seg| seg == "..") {
            return None;
        }

        for (prefix, dir) in &self.routes {
            if let Some(rest) = url_path.strip_prefix(prefix.as_str()) {
                if rest.is_empty() || rest.starts_with('/') {
                    return lookup(fs, dir, rest);
                }
            }
        }

        self.base_dirs
            .iter()
            .find_map(|dir| lookup(fs, dir, url_path))
    }
}

fn lookup(fs: &dyn FileSystem, dir: &Path, rel: &str) -> Option<PathBuf> {
    let rel = rel.trim_start_matches('/');
    let candidate = if rel.is_empty() {
        dir.to_path_buf()
    } else {
        dir.join(rel)
    };

    if fs.is_file(&candidate) {
        return Some(candidate);
    }
    let index = candidate.join("index.html");
    fs.is_file(&index).then_some(index)
}

/// A server the develop loop hands its spec to.
pub trait DevServer: Send + Sync {
    fn start(&self, spec: &ServeSpec) -> Result<()>;

    /// A file matching the reload pattern changed.
    fn reload(&self, path: &Path);
}
