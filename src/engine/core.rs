// src/engine/core.rs

//! Pure watch-dispatch state machine.
//!
//! [`DispatcherCore`] consumes [`DispatchEvent`]s and returns the
//! [`DispatchCommand`]s the IO shell (`engine::runtime::WatchRuntime`) should
//! carry out. It owns no channels, no Tokio types, and performs no IO, so the
//! coalescing rules can be unit tested event by event.
//!
//! Per binding:
//!
//! ```text
//! Idle --change--> Triggered --started--> Running --done--> Idle
//!                      ^                     |
//!                      +---done, pending-----+
//! ```
//!
//! A change while `Triggered` is already covered by the run about to start.
//! Any number of changes while `Running` set a single pending flag, which
//! turns into exactly one re-run once the current run completes.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::types::{RunOutcome, TaskName};
use crate::watch::patterns::GlobPattern;

/// Lifecycle of one watch binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Idle,
    /// A run was requested but has not started yet.
    Triggered,
    Running {
        /// A change arrived during this run; re-run once it completes.
        pending: bool,
    },
}

/// Events flowing into the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    /// A file was created, modified or removed.
    PathChanged { path: PathBuf },
    /// The shell started the run requested by `StartRun`.
    RunStarted { binding: TaskName },
    /// A binding's run finished.
    RunCompleted {
        binding: TaskName,
        outcome: RunOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// What the shell should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchCommand {
    StartRun { binding: TaskName },
    ReportFailure { binding: TaskName, message: String },
    NotifyReload { path: PathBuf },
}

/// Result of handling a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchStep {
    pub commands: Vec<DispatchCommand>,
    pub keep_running: bool,
}

impl DispatchStep {
    fn running(commands: Vec<DispatchCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    name: TaskName,
    pattern: GlobPattern,
    state: BindingState,
}

#[derive(Debug, Clone, Default)]
pub struct DispatcherCore {
    slots: Vec<Slot>,
    reload: Option<GlobPattern>,
}

impl DispatcherCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding. Bindings are registered once, before the first
    /// event, and stay for the lifetime of the dispatcher.
    pub fn with_binding(mut self, name: impl Into<TaskName>, pattern: GlobPattern) -> Self {
        self.slots.push(Slot {
            name: name.into(),
            pattern,
            state: BindingState::Idle,
        });
        self
    }

    /// Changes matching `pattern` produce a `NotifyReload` command.
    pub fn with_reload(mut self, pattern: GlobPattern) -> Self {
        self.reload = Some(pattern);
        self
    }

    pub fn state_of(&self, binding: &str) -> Option<BindingState> {
        self.slot(binding).map(|s| s.state)
    }

    pub fn binding_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.name.as_str())
    }

    /// True when no binding is triggered or running.
    pub fn is_idle(&self) -> bool {
        self.slots.iter().all(|s| s.state == BindingState::Idle)
    }

    pub fn step(&mut self, event: DispatchEvent) -> DispatchStep {
        match event {
            DispatchEvent::PathChanged { path } => DispatchStep::running(self.path_changed(&path)),
            DispatchEvent::RunStarted { binding } => {
                self.run_started(&binding);
                DispatchStep::running(Vec::new())
            }
            DispatchEvent::RunCompleted { binding, outcome } => {
                DispatchStep::running(self.run_completed(&binding, outcome))
            }
            DispatchEvent::ShutdownRequested => DispatchStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    fn path_changed(&mut self, path: &Path) -> Vec<DispatchCommand> {
        let mut commands = Vec::new();

        for slot in self.slots.iter_mut() {
            if !slot.pattern.matches_path(path) {
                continue;
            }
            if let Some(command) = record_change(slot, path) {
                commands.push(command);
            }
        }

        if let Some(reload) = &self.reload {
            if reload.matches_path(path) {
                debug!(path = ?path, "reload pattern matched");
                commands.push(DispatchCommand::NotifyReload {
                    path: path.to_path_buf(),
                });
            }
        }

        commands
    }

    fn run_started(&mut self, binding: &str) {
        if let Some(slot) = self.slot_mut(binding) {
            if slot.state == BindingState::Triggered {
                slot.state = BindingState::Running { pending: false };
            } else {
                debug!(binding = %binding, state = ?slot.state, "unexpected run start; ignoring");
            }
        }
    }

    fn run_completed(&mut self, binding: &str, outcome: RunOutcome) -> Vec<DispatchCommand> {
        let Some(slot) = self.slot_mut(binding) else {
            debug!(binding = %binding, "completion for unknown binding; ignoring");
            return Vec::new();
        };

        let mut commands = Vec::new();
        if let RunOutcome::Failed(message) = outcome {
            commands.push(DispatchCommand::ReportFailure {
                binding: slot.name.clone(),
                message,
            });
        }

        match slot.state {
            BindingState::Running { pending: true } => {
                info!(binding = %slot.name, "changes arrived during run; re-running");
                slot.state = BindingState::Triggered;
                commands.push(DispatchCommand::StartRun {
                    binding: slot.name.clone(),
                });
            }
            BindingState::Running { pending: false } => {
                slot.state = BindingState::Idle;
            }
            other => {
                debug!(binding = %slot.name, state = ?other, "completion while not running; ignoring");
            }
        }

        commands
    }

    fn slot(&self, binding: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name == binding)
    }

    fn slot_mut(&mut self, binding: &str) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.name == binding)
    }
}

/// Apply one matching change to a binding.
fn record_change(slot: &mut Slot, path: &Path) -> Option<DispatchCommand> {
    match slot.state {
        BindingState::Idle => {
            info!(binding = %slot.name, path = ?path, "change detected; triggering");
            slot.state = BindingState::Triggered;
            Some(DispatchCommand::StartRun {
                binding: slot.name.clone(),
            })
        }
        BindingState::Triggered => {
            debug!(binding = %slot.name, path = ?path, "change folded into pending start");
            None
        }
        BindingState::Running { pending } => {
            if !pending {
                info!(binding = %slot.name, path = ?path, "change during run; queued one re-run");
            } else {
                debug!(binding = %slot.name, path = ?path, "change coalesced");
            }
            slot.state = BindingState::Running { pending: true };
            None
        }
    }
}
