// src/engine/runtime.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::Task;
use crate::errors::{Result, SitepipeError};
use crate::exec::Runner;
use crate::serve::DevServer;
use crate::types::{RunOutcome, TaskName};
use crate::watch::patterns::{GlobPattern, WatchBinding};

use super::core::{DispatchCommand, DispatchEvent, DispatcherCore};

const EVENT_BUFFER: usize = 256;

/// Async shell around [`DispatcherCore`].
///
/// Reads [`DispatchEvent`]s from its channel, feeds them to the core and
/// carries out the resulting commands: spawning binding runs on the
/// [`Runner`], logging failures and forwarding reloads to the dev server.
pub struct WatchRuntime {
    core: DispatcherCore,
    tasks: HashMap<TaskName, Task>,
    runner: Runner,
    server: Arc<dyn DevServer>,
    event_tx: mpsc::Sender<DispatchEvent>,
    event_rx: mpsc::Receiver<DispatchEvent>,
}

impl fmt::Debug for WatchRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRuntime")
            .field("core", &self.core)
            .field("runner", &self.runner)
            .finish_non_exhaustive()
    }
}

impl WatchRuntime {
    pub fn new(
        bindings: Vec<WatchBinding>,
        reload: Option<GlobPattern>,
        runner: Runner,
        server: Arc<dyn DevServer>,
    ) -> Self {
        let mut core = DispatcherCore::new();
        let mut tasks = HashMap::new();
        for binding in bindings {
            core = core.with_binding(binding.name(), binding.pattern().clone());
            tasks.insert(binding.name().to_string(), binding.task().clone());
        }
        if let Some(reload) = reload {
            core = core.with_reload(reload);
        }

        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        Self {
            core,
            tasks,
            runner,
            server,
            event_tx,
            event_rx,
        }
    }

    /// Sender for watchers, signal handlers and tests.
    pub fn sender(&self) -> mpsc::Sender<DispatchEvent> {
        self.event_tx.clone()
    }

    pub fn core(&self) -> &DispatcherCore {
        &self.core
    }

    /// Event loop. Returns once a `ShutdownRequested` event is handled.
    ///
    /// Runs still in flight at that point are left to finish on their own.
    pub async fn run(mut self) -> Result<()> {
        let names: Vec<_> = self.core.binding_names().map(str::to_string).collect();
        info!(bindings = ?names, "watch dispatcher started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "dispatcher received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute(command);
            }

            if !step.keep_running {
                info!("shutdown requested; stopping watch dispatcher");
                break;
            }
        }

        Ok(())
    }

    fn execute(&mut self, command: DispatchCommand) {
        match command {
            DispatchCommand::StartRun { binding } => self.start_run(binding),
            DispatchCommand::ReportFailure { binding, message } => {
                let err = SitepipeError::WatchRunError {
                    binding: binding.clone(),
                    message,
                };
                error!(binding = %binding, "{err}");
            }
            DispatchCommand::NotifyReload { path } => self.server.reload(&path),
        }
    }

    fn start_run(&mut self, binding: TaskName) {
        let Some(task) = self.tasks.get(&binding).cloned() else {
            warn!(binding = %binding, "no task bound; ignoring trigger");
            return;
        };

        let runner = self.runner.clone();
        let tx = self.event_tx.clone();
        let name = binding.clone();
        tokio::spawn(async move {
            info!(binding = %name, task = %task.label(), "rebuilding");
            let outcome = match runner.run(&task).await {
                Ok(_) => RunOutcome::Success,
                Err(err) => RunOutcome::Failed(err.to_string()),
            };
            if tx
                .send(DispatchEvent::RunCompleted {
                    binding: name,
                    outcome,
                })
                .await
                .is_err()
            {
                debug!("dispatcher gone before run completed");
            }
        });

        // The run is spawned; later changes must queue a re-run.
        self.core.step(DispatchEvent::RunStarted { binding });
    }
}
