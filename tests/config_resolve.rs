// tests/config_resolve.rs

mod common;

use std::path::{Path, PathBuf};

use sitepipe::config::{Configuration, resolve};
use sitepipe::errors::SitepipeError;
use sitepipe::load_configuration;
use sitepipe::types::AssetClass;

use crate::common::write_file;

#[test]
fn missing_override_yields_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = resolve(&Configuration::default(), tmp.path().join("sitepipe.toml")).unwrap();

    assert_eq!(cfg, Configuration::default());
    assert_eq!(cfg.source_dir(), Path::new("src"));
    assert_eq!(cfg.paths().pages, "*.html");
    assert_eq!(cfg.port(), 3000);
}

#[test]
fn partial_paths_override_keeps_other_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_file(
        tmp.path(),
        "sitepipe.toml",
        r#"
[build.paths]
style = "custom/*.scss"
"#,
    );

    let cfg = resolve(&Configuration::default(), &path).unwrap();
    let defaults = Configuration::default();

    assert_eq!(cfg.paths().style, "custom/*.scss");
    assert_eq!(cfg.paths().scripts, defaults.paths().scripts);
    assert_eq!(cfg.paths().pages, defaults.paths().pages);
    assert_eq!(cfg.paths().images, defaults.paths().images);
    assert_eq!(cfg.paths().fonts, defaults.paths().fonts);
    assert_eq!(cfg.dist_dir(), defaults.dist_dir());
}

#[test]
fn top_level_fields_replace_individually() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_file(
        tmp.path(),
        "sitepipe.toml",
        r#"
[build]
dist = "out"

[data]
title = "Home"

[commands.style]
cmd = "sass {input} {output}"
ext = "css"

[server]
port = 8080
"#,
    );

    let cfg = resolve(&Configuration::default(), &path).unwrap();
    assert_eq!(cfg.dist_dir(), Path::new("out"));
    assert_eq!(cfg.source_dir(), Path::new("src"));
    assert_eq!(
        cfg.template_data().and_then(|d| d.get("title")).and_then(|v| v.as_str()),
        Some("Home")
    );
    assert_eq!(cfg.command_for(AssetClass::Style).map(|c| c.cmd.as_str()), Some("sass {input} {output}"));
    assert!(cfg.command_for(AssetClass::Page).is_none());
    assert_eq!(cfg.port(), 8080);
}

#[test]
fn malformed_override_is_config_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_file(tmp.path(), "sitepipe.toml", "[build\nsrc = ");

    let err = resolve(&Configuration::default(), &path).unwrap_err();
    assert!(matches!(err, SitepipeError::ConfigError(_)), "got {err:?}");
}

#[test]
fn wrong_shape_is_config_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_file(tmp.path(), "sitepipe.toml", "[build]\nsrc = 5\n");

    let err = resolve(&Configuration::default(), &path).unwrap_err();
    assert!(matches!(err, SitepipeError::ConfigError(_)), "got {err:?}");
}

#[test]
fn empty_path_fields_are_rejected_together() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_file(
        tmp.path(),
        "sitepipe.toml",
        "[build]\ndist = \"\"\n\n[build.paths]\nfonts = \"\"\n",
    );

    match resolve(&Configuration::default(), &path) {
        Err(SitepipeError::ConfigError(message)) => {
            assert!(message.contains("dist"), "{message}");
            assert!(message.contains("fonts"), "{message}");
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn unknown_command_target_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_file(tmp.path(), "sitepipe.toml", "[commands.bogus]\ncmd = \"true\"\n");

    let err = resolve(&Configuration::default(), &path).unwrap_err();
    assert!(err.to_string().contains("bogus"), "{err}");
}

#[test]
fn directories_are_rooted_at_the_config_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_file(tmp.path(), "site/sitepipe.toml", "[build]\nsrc = \"source\"\n");

    let cfg = load_configuration(&path).unwrap();
    let root: PathBuf = tmp.path().join("site");
    assert_eq!(cfg.project_root(), root.as_path());
    assert_eq!(cfg.source_dir(), root.join("source").as_path());
    assert_eq!(cfg.temp_dir(), root.join("temp").as_path());
}
