// src/exec/runner.rs

//! Executes task trees.
//!
//! The runner is the only place that touches concurrency primitives: a
//! `series` awaits its members one by one, a `parallel` spawns each member
//! on the Tokio runtime and collects results over a channel.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::{Composite, PrimitiveTask, Task};
use crate::errors::{Result, SitepipeError};
use crate::exec::run_log::{ROOT_PATH, RunLog, RunReport};
use crate::exec::transform::TransformSet;

type NodeFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// Runs tasks against a fixed set of transforms.
///
/// Cheap to clone; every run is a fresh invocation with its own [`RunLog`].
#[derive(Debug, Clone)]
pub struct Runner {
    transforms: Arc<TransformSet>,
}

impl Runner {
    pub fn new(transforms: TransformSet) -> Self {
        Self {
            transforms: Arc::new(transforms),
        }
    }

    pub fn transforms(&self) -> &TransformSet {
        &self.transforms
    }

    /// Run `task` to completion and return the per-node record.
    ///
    /// On failure the error carries the path of composites down to the
    /// failing leaf (see [`SitepipeError::failing_leaf`]).
    pub async fn run(&self, task: &Task) -> Result<RunReport> {
        let log = RunLog::new();
        self.run_with_log(task, &log).await?;
        Ok(log.snapshot())
    }

    /// Like [`run`](Self::run) but records into a caller-provided log, which
    /// stays readable after a failure.
    pub async fn run_with_log(&self, task: &Task, log: &RunLog) -> Result<()> {
        self.run_node(task.clone(), ROOT_PATH.to_string(), log.clone())
            .await
    }

    fn run_node(&self, task: Task, path: String, log: RunLog) -> NodeFuture {
        let runner = self.clone();
        Box::pin(async move {
            let index = log.start(&path, &task);
            let result = match &task {
                Task::Primitive(primitive) => runner.run_primitive(primitive).await,
                Task::Series(composite) => {
                    runner.run_series(&task, composite, &path, &log).await
                }
                Task::Parallel(composite) => {
                    runner.run_parallel(&task, composite, &path, &log).await
                }
            };
            log.finish(index, result.is_ok());
            result
        })
    }

    async fn run_primitive(&self, primitive: &PrimitiveTask) -> Result<()> {
        let name = primitive.name.as_str();
        let transform = self.transforms.get(name).cloned().ok_or_else(|| {
            SitepipeError::TransformError {
                task: name.to_string(),
                message: "no transform registered under this name".to_string(),
            }
        })?;

        info!(
            task = %name,
            glob = %primitive.request.input_glob,
            base = ?primitive.request.base_dir,
            "starting task"
        );

        match transform.run(&primitive.request).await {
            Ok(outputs) => {
                info!(task = %name, outputs = outputs.len(), "finished task");
                Ok(())
            }
            Err(err) => {
                let message = format!("{err:#}");
                warn!(task = %name, error = %message, "task failed");
                Err(match err.downcast::<SitepipeError>() {
                    Ok(typed) => typed,
                    Err(_) => SitepipeError::TransformError {
                        task: name.to_string(),
                        message,
                    },
                })
            }
        }
    }

    async fn run_series(
        &self,
        task: &Task,
        composite: &Composite,
        path: &str,
        log: &RunLog,
    ) -> Result<()> {
        debug!(task = %task.label(), members = composite.members().len(), "starting series");

        for (index, member) in composite.members().iter().enumerate() {
            let member_path = format!("{path}.{index}");
            self.run_node(member.clone(), member_path, log.clone())
                .await
                .map_err(|err| annotate(task, index, member, err))?;
        }
        Ok(())
    }

    /// Start every member, then wait until all succeeded or one failed.
    ///
    /// Members are spawned detached: returning early on the first failure
    /// does not stop siblings that are still running.
    async fn run_parallel(
        &self,
        task: &Task,
        composite: &Composite,
        path: &str,
        log: &RunLog,
    ) -> Result<()> {
        let members = composite.members();
        debug!(task = %task.label(), members = members.len(), "starting parallel");
        if members.is_empty() {
            return Ok(());
        }

        let (tx, mut rx) = mpsc::channel::<(usize, Result<()>)>(members.len());
        for (index, member) in members.iter().enumerate() {
            let node = self.run_node(member.clone(), format!("{path}.{index}"), log.clone());
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = node.await;
                // The receiver is gone once a sibling failed; the result is discarded.
                let _ = tx.send((index, result)).await;
            });
        }
        drop(tx);

        let mut remaining = members.len();
        while let Some((index, result)) = rx.recv().await {
            if let Err(err) = result {
                return Err(annotate(task, index, &members[index], err));
            }
            remaining -= 1;
            if remaining == 0 {
                break;
            }
        }

        if remaining > 0 {
            return Err(SitepipeError::TransformError {
                task: task.label().to_string(),
                message: format!("{remaining} member(s) ended without reporting a result"),
            });
        }
        Ok(())
    }
}

fn annotate(task: &Task, index: usize, member: &Task, err: SitepipeError) -> SitepipeError {
    SitepipeError::MemberFailed {
        composite: task.label().to_string(),
        index,
        member: member.label().to_string(),
        source: Box::new(err),
    }
}
