// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::DispatchEvent;

/// Keeps the underlying `RecommendedWatcher` alive. Dropping the handle stops
/// file watching.
pub struct WatcherHandle {
    _inner: Arc<Mutex<RecommendedWatcher>>,
    roots: Vec<PathBuf>,
}

impl WatcherHandle {
    /// Directories actually being watched.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

/// Watch `roots` recursively and forward every created, modified or removed
/// path as [`DispatchEvent::PathChanged`].
///
/// Missing roots are created first, so output trees that only appear after
/// the first rebuild are still watched. A root deleted while watching is
/// recreated and watched again. Glob matching is left to the dispatcher.
pub fn spawn_watcher(
    roots: impl IntoIterator<Item = PathBuf>,
    dispatch_tx: mpsc::Sender<DispatchEvent>,
) -> Result<WatcherHandle> {
    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("sitepipe: failed to forward notify event: {err}");
                }
            }
            Err(err) => eprintln!("sitepipe: file watch error: {err}"),
        },
        Config::default(),
    )?;

    let mut watched = Vec::new();
    for root in roots {
        if watched.contains(&root) {
            continue;
        }
        if !root.is_dir() {
            std::fs::create_dir_all(&root)
                .with_context(|| format!("creating watch root {}", root.display()))?;
            debug!(path = ?root, "created missing watch root");
        }
        watcher.watch(&root, RecursiveMode::Recursive)?;
        info!(path = ?root, "watching");
        watched.push(root);
    }

    let watcher = Arc::new(Mutex::new(watcher));
    // Weak, so dropping the handle still stops the watcher and ends this loop.
    let rewatch = Arc::downgrade(&watcher);
    let roots = watched.clone();

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if !is_content_change(&event.kind) {
                continue;
            }
            debug!(kind = ?event.kind, paths = ?event.paths, "notify event");

            if matches!(event.kind, EventKind::Remove(_)) {
                for root in event.paths.iter().filter(|p| roots.contains(*p)) {
                    restore_root(&rewatch, root).await;
                }
            }

            for path in event.paths {
                if dispatch_tx
                    .send(DispatchEvent::PathChanged { path })
                    .await
                    .is_err()
                {
                    debug!("dispatcher gone; watcher loop ending");
                    return;
                }
            }
        }
        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        roots: watched,
    })
}

/// Recreate a deleted root and register it again; the old watch died with
/// the directory.
async fn restore_root(watcher: &Weak<Mutex<RecommendedWatcher>>, root: &Path) {
    let Some(watcher) = watcher.upgrade() else {
        return;
    };
    if let Err(err) = tokio::fs::create_dir_all(root).await {
        warn!(path = ?root, error = %err, "failed to recreate watch root");
        return;
    }
    let mut guard = watcher.lock().unwrap_or_else(|p| p.into_inner());
    let _ = guard.unwatch(root);
    match guard.watch(root, RecursiveMode::Recursive) {
        Ok(()) => info!(path = ?root, "watch root recreated"),
        Err(err) => warn!(path = ?root, error = %err, "failed to re-watch root"),
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
