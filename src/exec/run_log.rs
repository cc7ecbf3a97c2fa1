// src/exec/run_log.rs

//! Per-run bookkeeping: when each node of a task tree started and finished.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::dag::Task;

/// One task-tree node within a run.
///
/// `path` identifies the node structurally: the root is `"0"` and member `i`
/// of node `p` is `"{p}.{i}"`.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub path: String,
    pub label: String,
    pub kind: &'static str,
    pub started: Instant,
    pub finished: Option<Instant>,
    /// `None` while the node is still running.
    pub success: Option<bool>,
}

impl NodeRecord {
    pub fn is_terminal(&self) -> bool {
        self.success.is_some()
    }
}

/// Shared, append-only log of a single run.
///
/// Cloning shares the log; members of a `parallel` that outlive a failed
/// composite keep recording into it.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    nodes: Arc<Mutex<Vec<NodeRecord>>>,
}

pub const ROOT_PATH: &str = "0";

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start(&self, path: &str, task: &Task) -> usize {
        let mut nodes = self.lock();
        nodes.push(NodeRecord {
            path: path.to_string(),
            label: task.label().to_string(),
            kind: task.kind(),
            started: Instant::now(),
            finished: None,
            success: None,
        });
        nodes.len() - 1
    }

    pub(crate) fn finish(&self, index: usize, success: bool) {
        if let Some(node) = self.lock().get_mut(index) {
            node.finished = Some(Instant::now());
            node.success = Some(success);
        }
    }

    /// Copy of the records as they are right now.
    pub fn snapshot(&self) -> RunReport {
        RunReport {
            nodes: self.lock().clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<NodeRecord>> {
        self.nodes.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Immutable view of a run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub nodes: Vec<NodeRecord>,
}

impl RunReport {
    pub fn node(&self, path: &str) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| n.path == path)
    }

    /// Primitive nodes in start order.
    pub fn leaves(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.iter().filter(|n| n.kind == "primitive")
    }

    /// Labels of primitives that failed.
    pub fn failed_leaves(&self) -> Vec<&str> {
        self.leaves()
            .filter(|n| n.success == Some(false))
            .map(|n| n.label.as_str())
            .collect()
    }
}
