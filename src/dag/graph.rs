// src/dag/graph.rs

//! The named task graph built from a resolved [`Configuration`].

use std::collections::BTreeMap;

use anyhow::Result;

use crate::config::Configuration;
use crate::dag::task::{Task, parallel, series};
use crate::exec::transform::TransformRequest;
use crate::types::{AssetClass, TaskName};
use crate::watch::patterns::{GlobPattern, WatchBinding};

pub const CLEAN: &str = "clean";
pub const REWRITE: &str = "rewrite";
pub const SERVE: &str = "serve";
pub const COMPILE: &str = "compile";
pub const BUILD: &str = "build";
pub const DEVELOP: &str = "develop";

/// Option keys understood by the built-in transforms.
pub mod options {
    pub const DATA: &str = "data";
    pub const SEARCH_PATH: &str = "search_path";
    pub const TARGETS: &str = "targets";
    pub const BASE_DIRS: &str = "base_dirs";
    pub const PORT: &str = "port";
    pub const ROUTES: &str = "routes";
}

/// URL prefix served from the project's `node_modules`.
pub const NODE_MODULES_ROUTE: &str = "/node_modules";

/// Named top-level compositions.
///
/// Built once from the configuration; every glob and directory a task needs
/// is passed into its descriptor here rather than looked up later.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    tasks: BTreeMap<TaskName, Task>,
}

impl TaskGraph {
    /// The standard pipeline:
    ///
    /// - `compile = parallel(style, scripts, page)`
    /// - `build = series(clean, parallel(series(compile, rewrite), image, font, extra), rewrite)`
    /// - `develop = series(compile, serve)`
    /// - `clean`
    ///
    /// `rewrite` appears twice in `build`: the first pass post-processes the
    /// compiled temp tree, the second runs after `extra` has merged the public
    /// files into dist. Both passes are required.
    pub fn standard(cfg: &Configuration) -> Self {
        let clean = clean_task(cfg);
        let rewrite = rewrite_task(cfg);

        let compile = parallel([
            asset_task(cfg, AssetClass::Style),
            asset_task(cfg, AssetClass::Scripts),
            asset_task(cfg, AssetClass::Page),
        ])
        .named(COMPILE);

        let build = series([
            clean.clone(),
            parallel([
                series([compile.clone(), rewrite.clone()]),
                asset_task(cfg, AssetClass::Image),
                asset_task(cfg, AssetClass::Font),
                asset_task(cfg, AssetClass::Extra),
            ]),
            rewrite,
        ])
        .named(BUILD);

        let develop = series([compile.clone(), serve_task(cfg)]).named(DEVELOP);

        let mut tasks = BTreeMap::new();
        tasks.insert(CLEAN.to_string(), clean);
        tasks.insert(COMPILE.to_string(), compile);
        tasks.insert(BUILD.to_string(), build);
        tasks.insert(DEVELOP.to_string(), develop);
        Self { tasks }
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }
}

/// Primitive task for one asset class.
///
/// Stylesheets, scripts and pages are compiled into the temp tree; images,
/// fonts and public files go straight to dist.
pub fn asset_task(cfg: &Configuration, class: AssetClass) -> Task {
    let (base, dest) = match class {
        AssetClass::Style | AssetClass::Scripts | AssetClass::Page => {
            (cfg.source_dir(), cfg.temp_dir())
        }
        AssetClass::Image | AssetClass::Font => (cfg.source_dir(), cfg.dist_dir()),
        AssetClass::Extra => (cfg.public_dir(), cfg.dist_dir()),
    };

    let mut request = TransformRequest::new(cfg.glob_for(class), base, dest);
    if class == AssetClass::Page {
        if let Some(data) = cfg.template_data() {
            request = request.with_option(options::DATA, toml::Value::Table(data.clone()));
        }
    }
    Task::primitive(class.task_name(), request)
}

/// Removes the temp and dist directories.
pub fn clean_task(cfg: &Configuration) -> Task {
    let request = TransformRequest::new("", cfg.project_root(), cfg.dist_dir())
        .with_paths(options::TARGETS, [cfg.temp_dir(), cfg.dist_dir()]);
    Task::primitive(CLEAN, request)
}

/// Rewrites asset references in the compiled pages and writes them to dist.
pub fn rewrite_task(cfg: &Configuration) -> Task {
    let request = TransformRequest::new(&cfg.paths().pages, cfg.temp_dir(), cfg.dist_dir())
        .with_paths(options::SEARCH_PATH, [cfg.temp_dir(), cfg.project_root()]);
    Task::primitive(REWRITE, request)
}

/// Long-running serve-and-watch step of `develop`.
///
/// The glob names the files whose change triggers a browser reload; the
/// base directories are served in priority order.
pub fn serve_task(cfg: &Configuration) -> Task {
    let mut routes = toml::Table::new();
    routes.insert(
        NODE_MODULES_ROUTE.to_string(),
        toml::Value::String(cfg.project_root().join("node_modules").to_string_lossy().into_owned()),
    );

    let request = TransformRequest::new("**", cfg.temp_dir(), cfg.temp_dir())
        .with_paths(
            options::BASE_DIRS,
            [cfg.temp_dir(), cfg.source_dir(), cfg.public_dir()],
        )
        .with_option(options::PORT, toml::Value::Integer(i64::from(cfg.port())))
        .with_option(options::ROUTES, toml::Value::Table(routes));
    Task::primitive(SERVE, request)
}

/// Bindings re-run during `develop`: stylesheets, scripts and pages.
///
/// Images, fonts and public files are not watched; rebuilding them on every
/// edit slows the loop down and the dev server serves them from source.
pub fn watch_bindings(cfg: &Configuration) -> Result<Vec<WatchBinding>> {
    [AssetClass::Style, AssetClass::Scripts, AssetClass::Page]
        .into_iter()
        .map(|class| {
            let pattern = GlobPattern::new(cfg.source_dir(), cfg.glob_for(class))?;
            Ok(WatchBinding::new(
                class.task_name(),
                pattern,
                asset_task(cfg, class),
            ))
        })
        .collect()
}
