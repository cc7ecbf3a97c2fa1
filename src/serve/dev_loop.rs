// src/serve/dev_loop.rs

//! The `serve` step of `develop`: start the dev server, watch the source and
//! temp trees, and rebuild bound tasks until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::engine::{DispatchEvent, WatchRuntime};
use crate::exec::Runner;
use crate::exec::transform::{OutputSet, Transform, TransformFuture, TransformRequest};
use crate::serve::{DevServer, ServeSpec};
use crate::watch::patterns::WatchBinding;
use crate::watch::watcher::spawn_watcher;

/// Transform registered under `serve`.
///
/// Holds its own [`Runner`] for rebuilds; that runner's transform set does
/// not include `serve`.
pub struct DevLoop {
    runner: Runner,
    bindings: Vec<WatchBinding>,
    server: Arc<dyn DevServer>,
}

impl std::fmt::Debug for DevLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevLoop")
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

impl DevLoop {
    pub fn new(runner: Runner, bindings: Vec<WatchBinding>, server: Arc<dyn DevServer>) -> Self {
        Self {
            runner,
            bindings,
            server,
        }
    }

    /// Binding bases plus the reload base, without duplicates.
    fn watch_roots(&self, spec: &ServeSpec) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = Vec::new();
        let bases = self
            .bindings
            .iter()
            .map(|b| b.pattern().base())
            .chain(std::iter::once(spec.reload.base()));
        for base in bases {
            if !roots.iter().any(|r| r == base) {
                roots.push(base.to_path_buf());
            }
        }
        roots
    }

    async fn serve(&self, request: &TransformRequest) -> anyhow::Result<OutputSet> {
        let spec = ServeSpec::from_request(request)?;
        self.server.start(&spec).context("starting dev server")?;

        let runtime = WatchRuntime::new(
            self.bindings.clone(),
            Some(spec.reload.clone()),
            self.runner.clone(),
            Arc::clone(&self.server),
        );
        let tx = runtime.sender();

        let watcher = spawn_watcher(self.watch_roots(&spec), tx.clone())?;
        info!(roots = ?watcher.roots(), "watching for changes");

        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {err}");
                return;
            }
            info!("interrupt received");
            let _ = tx.send(DispatchEvent::ShutdownRequested).await;
        });

        runtime.run().await?;
        Ok(OutputSet::empty())
    }
}

impl Transform for DevLoop {
    fn run<'a>(&'a self, request: &'a TransformRequest) -> TransformFuture<'a> {
        Box::pin(self.serve(request))
    }
}
