// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod serve;
pub mod transforms;
pub mod types;
pub mod watch;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::{debug, error, info};

use crate::cli::{CliArgs, Command};
use crate::config::{Configuration, project_root_for, resolve};
use crate::dag::graph::{SERVE, watch_bindings};
use crate::dag::{ExecutionPlan, Task, TaskGraph};
use crate::exec::{RunReport, Runner};
use crate::fs::{FileSystem, RealFileSystem};
use crate::serve::{DevLoop, StaticDevServer};
use crate::transforms::standard_transforms;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config resolution and rooting at the project directory
/// - the standard task graph
/// - the built-in transforms (plus the dev loop for `develop`)
/// - the runner
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_configuration(&config_path)?;
    let graph = TaskGraph::standard(&cfg);

    let name = args.command.task_name();
    let task = graph
        .get(name)
        .ok_or_else(|| anyhow!("no task named '{name}' in the task graph"))?;

    if args.dry_run {
        print!("{}", render_plan(name, task)?);
        debug!("dry-run complete (no execution)");
        return Ok(());
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let runner = runner_for(&cfg, args.command, fs)?;

    match runner.run(task).await {
        Ok(report) => {
            log_summary(name, &report);
            Ok(())
        }
        Err(err) => {
            error!(
                task = %name,
                leaf = err.failing_leaf().unwrap_or("-"),
                "{err}"
            );
            Err(err.into())
        }
    }
}

/// Resolve the configuration for `config_path` and root every directory at
/// the project root (the config file's directory).
pub fn load_configuration(config_path: &Path) -> Result<Configuration> {
    let root = project_root_for(config_path);
    let root = std::path::absolute(&root).unwrap_or(root);
    let cfg = resolve(&Configuration::default(), config_path)?.rooted_at(&root);
    info!(root = ?cfg.project_root(), "resolved configuration");
    Ok(cfg)
}

/// Runner with the transforms `command` needs.
///
/// `develop` additionally registers the dev loop under `serve`; rebuilds
/// inside the loop use a runner without it.
pub fn runner_for(cfg: &Configuration, command: Command, fs: Arc<dyn FileSystem>) -> Result<Runner> {
    let transforms = standard_transforms(cfg, Arc::clone(&fs));
    if command != Command::Develop {
        return Ok(Runner::new(transforms));
    }

    let dev_loop = DevLoop::new(
        Runner::new(transforms.clone()),
        watch_bindings(cfg)?,
        Arc::new(StaticDevServer::new(fs)),
    );
    Ok(Runner::new(transforms.with(SERVE, Arc::new(dev_loop))))
}

/// Dry-run output: the task tree, then the plan in stages. Steps within a
/// stage have no ordering between them.
pub fn render_plan(name: &str, task: &Task) -> Result<String> {
    let plan = ExecutionPlan::of(task);
    let stages = plan.stages()?;

    let mut out = String::new();
    writeln!(out, "sitepipe dry-run: {name}")?;
    writeln!(out, "  tree: {task}")?;
    writeln!(out, "  steps: {}", plan.len())?;
    for (i, stage) in stages.iter().enumerate() {
        let names: Vec<_> = stage.iter().map(|s| s.name.as_str()).collect();
        writeln!(out, "  stage {}: {}", i + 1, names.join(", "))?;
    }
    Ok(out)
}

fn log_summary(name: &str, report: &RunReport) {
    let leaves = report.leaves().count();
    let elapsed = report
        .node(crate::exec::run_log::ROOT_PATH)
        .and_then(|root| root.finished.map(|f| f.duration_since(root.started)));
    info!(task = %name, leaves, ?elapsed, "done");
}
