// tests/build_pipeline.rs

mod common;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use sitepipe::cli::{CliArgs, Command};
use sitepipe::dag::TaskGraph;
use sitepipe::errors::SitepipeError;
use sitepipe::fs::mock::MockFileSystem;
use sitepipe::{load_configuration, render_plan, run, runner_for};
use sitepipe_test_utils::builders::ConfigurationBuilder;

use crate::common::{init_tracing, list_tree, with_timeout, write_file};

fn args(command: &str, config: &std::path::Path) -> CliArgs {
    CliArgs::parse_from(["sitepipe", command, "--config", config.to_str().unwrap()])
}

#[tokio::test]
async fn empty_source_tree_builds_an_empty_dist() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let config = tmp.path().join("sitepipe.toml");

    with_timeout(run(args("build", &config))).await.unwrap();

    let dist = tmp.path().join("dist");
    assert!(dist.is_dir());
    assert!(list_tree(&dist).is_empty());
}

#[tokio::test]
async fn build_assembles_dist_from_source_and_public() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write_file(
        root,
        "src/index.html",
        "<!-- build:css assets/style/site.css -->\n\
         <link rel=\"stylesheet\" href=\"assets/style/main.scss\">\n\
         <!-- endbuild -->\n<h1>Home</h1>\n",
    );
    write_file(root, "src/assets/style/main.scss", "body { color: red; }\n");
    write_file(root, "src/assets/scripts/app.js", "console.log(1);\n");
    write_file(root, "src/assets/images/logo.svg", "<svg/>");
    write_file(root, "src/assets/fonts/a.woff2", "font");
    write_file(root, "public/robots.txt", "User-agent: *\n");
    // Left over from a previous build; clean must remove it.
    write_file(root, "dist/stale.txt", "old");

    let config = root.join("sitepipe.toml");
    with_timeout(run(args("build", &config))).await.unwrap();

    let dist = root.join("dist");
    assert_eq!(
        list_tree(&dist),
        vec![
            "assets/fonts/a.woff2",
            "assets/images/logo.svg",
            "assets/style/site.css",
            "index.html",
            "robots.txt",
        ]
    );
    assert_eq!(
        fs::read_to_string(dist.join("assets/style/site.css")).unwrap(),
        "body { color: red; }\n"
    );
    let page = fs::read_to_string(dist.join("index.html")).unwrap();
    assert!(page.contains(r#"<link rel="stylesheet" href="assets/style/site.css">"#));
    assert!(page.contains("<h1>Home</h1>"));

    // Compiled intermediates stay in temp.
    assert!(root.join("temp/assets/scripts/app.js").is_file());
}

#[tokio::test]
async fn clean_succeeds_with_nothing_to_remove() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let config = tmp.path().join("sitepipe.toml");

    with_timeout(run(args("clean", &config))).await.unwrap();
    assert!(!tmp.path().join("dist").exists());
}

#[tokio::test]
async fn clean_removes_temp_and_dist() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(tmp.path(), "temp/a.css", "");
    write_file(tmp.path(), "dist/index.html", "");
    write_file(tmp.path(), "src/index.html", "");

    with_timeout(run(args("clean", &tmp.path().join("sitepipe.toml"))))
        .await
        .unwrap();

    assert!(!tmp.path().join("temp").exists());
    assert!(!tmp.path().join("dist").exists());
    assert!(tmp.path().join("src/index.html").is_file());
}

#[tokio::test]
async fn clean_failure_stops_the_build() {
    init_tracing();
    let cfg = ConfigurationBuilder::new().build_at("/site");
    let fs = MockFileSystem::new();
    fs.add_file("/site/src/index.html", "<h1>Home</h1>");
    fs.add_file("/site/src/assets/style/main.scss", "body {}");
    fs.add_dir("/site/dist");
    fs.deny_removal("/site/dist");

    let runner = runner_for(&cfg, Command::Build, Arc::new(fs.clone())).unwrap();
    let graph = TaskGraph::standard(&cfg);
    let err = with_timeout(runner.run(graph.get("build").unwrap()))
        .await
        .unwrap_err();

    assert_eq!(err.failing_leaf(), Some("clean"));
    let SitepipeError::MemberFailed { index, source, .. } = &err else {
        panic!("expected a series member failure, got {err:?}");
    };
    assert_eq!(*index, 0);
    assert!(
        matches!(source.as_ref(), SitepipeError::CleanError { path, .. } if path == &PathBuf::from("/site/dist")),
        "{source:?}"
    );
    // Nothing after clean ran.
    assert_eq!(
        fs.files(),
        vec![
            PathBuf::from("/site/src/assets/style/main.scss"),
            PathBuf::from("/site/src/index.html"),
        ]
    );
}

#[tokio::test]
async fn malformed_config_fails_before_any_task() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(tmp.path(), "dist/keep.txt", "");
    let config = write_file(tmp.path(), "sitepipe.toml", "[build]\nsrc = [");

    let err = run(args("build", &config)).await.unwrap_err();
    assert!(format!("{err:#}").contains("Configuration error"), "{err:#}");
    // clean never ran.
    assert!(tmp.path().join("dist/keep.txt").is_file());
}

#[cfg(unix)]
#[tokio::test]
async fn failing_command_fails_the_build() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    write_file(tmp.path(), "src/assets/style/main.scss", "");
    let config = write_file(tmp.path(), "sitepipe.toml", "[commands.style]\ncmd = \"exit 7\"\n");

    let err = with_timeout(run(args("build", &config))).await.unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("style"), "{message}");
    assert!(message.contains("code 7"), "{message}");
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    write_file(tmp.path(), "src/index.html", "");
    let config = tmp.path().join("sitepipe.toml");

    let args = CliArgs::parse_from(["sitepipe", "build", "--dry-run", "--config", config.to_str().unwrap()]);
    run(args).await.unwrap();
    assert!(!tmp.path().join("dist").exists());
    assert!(!tmp.path().join("temp").exists());
}

#[test]
fn plan_lists_stages_in_order() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = load_configuration(&tmp.path().join("sitepipe.toml")).unwrap();
    let graph = TaskGraph::standard(&cfg);

    let plan = render_plan("build", graph.get("build").unwrap()).unwrap();
    let stages: Vec<_> = plan.lines().filter(|l| l.trim_start().starts_with("stage")).collect();
    assert_eq!(
        stages,
        vec![
            "  stage 1: clean",
            "  stage 2: style, scripts, page, image, font, extra",
            "  stage 3: rewrite",
            "  stage 4: rewrite",
        ]
    );
    assert!(plan.contains("steps: 9"));
}
