// src/config/validate.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::model::{CommandConfig, Configuration, RawConfigFile};
use crate::errors::{Result, SitepipeError};
use crate::types::AssetClass;

impl Configuration {
    /// Merge an override on top of `self`, returning the effective configuration.
    ///
    /// - `src`, `dist`, `temp`, `public`, `data` and `server.port` replace the
    ///   current value when present.
    /// - `paths` is merged key by key, so a partial override keeps the other
    ///   patterns.
    /// - `commands` entries replace same-named entries.
    pub fn merge(&self, raw: RawConfigFile) -> Result<Configuration> {
        let mut problems = Vec::new();

        let build = raw.build;
        let source_dir = merge_dir(build.src, &self.source_dir, "src", &mut problems);
        let dist_dir = merge_dir(build.dist, &self.dist_dir, "dist", &mut problems);
        let temp_dir = merge_dir(build.temp, &self.temp_dir, "temp", &mut problems);
        let public_dir = merge_dir(build.public, &self.public_dir, "public", &mut problems);

        let mut paths = self.paths.clone();
        paths.style = merge_glob(build.paths.style, &self.paths.style, "style", &mut problems);
        paths.scripts = merge_glob(build.paths.scripts, &self.paths.scripts, "scripts", &mut problems);
        paths.pages = merge_glob(build.paths.pages, &self.paths.pages, "pages", &mut problems);
        paths.images = merge_glob(build.paths.images, &self.paths.images, "images", &mut problems);
        paths.fonts = merge_glob(build.paths.fonts, &self.paths.fonts, "fonts", &mut problems);

        let mut commands = self.commands.clone();
        merge_commands(&mut commands, raw.commands, &mut problems);

        let port = match raw.server.port {
            Some(0) => {
                problems.push("[server].port must be >= 1 (got 0)".to_string());
                self.port
            }
            Some(p) => p,
            None => self.port,
        };

        if !problems.is_empty() {
            return Err(SitepipeError::ConfigError(problems.join("; ")));
        }

        Ok(Configuration {
            source_dir,
            dist_dir,
            temp_dir,
            public_dir,
            project_root: self.project_root.clone(),
            paths,
            template_data: raw.data.or_else(|| self.template_data.clone()),
            commands,
            port,
        })
    }
}

fn merge_dir(
    value: Option<String>,
    current: &PathBuf,
    key: &str,
    problems: &mut Vec<String>,
) -> PathBuf {
    match value {
        Some(v) if v.trim().is_empty() => {
            problems.push(format!("[build].{key} must not be empty"));
            current.clone()
        }
        Some(v) => PathBuf::from(v),
        None => current.clone(),
    }
}

fn merge_glob(
    value: Option<String>,
    current: &str,
    key: &str,
    problems: &mut Vec<String>,
) -> String {
    match value {
        Some(v) if v.trim().is_empty() => {
            problems.push(format!("[build.paths].{key} must not be empty"));
            current.to_string()
        }
        Some(v) => v,
        None => current.to_string(),
    }
}

fn merge_commands(
    commands: &mut BTreeMap<AssetClass, CommandConfig>,
    raw: BTreeMap<String, CommandConfig>,
    problems: &mut Vec<String>,
) {
    for (name, command) in raw {
        let class = match name.parse::<AssetClass>() {
            Ok(class) => class,
            Err(msg) => {
                problems.push(format!("[commands.{name}]: {msg}"));
                continue;
            }
        };
        if command.cmd.trim().is_empty() {
            problems.push(format!("[commands.{name}].cmd must not be empty"));
            continue;
        }
        commands.insert(class, command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(toml_src: &str) -> RawConfigFile {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn empty_override_changes_nothing() {
        let defaults = Configuration::default();
        assert_eq!(defaults.merge(RawConfigFile::default()).unwrap(), defaults);
    }

    #[test]
    fn data_replaces_instead_of_merging() {
        let base = Configuration::default()
            .merge(raw("[data]\ntitle = \"Home\"\nlang = \"en\"\n"))
            .unwrap();
        let merged = base.merge(raw("[data]\ntitle = \"About\"\n")).unwrap();
        let data = merged.template_data().unwrap();
        assert_eq!(data.get("title").and_then(|v| v.as_str()), Some("About"));
        assert!(data.get("lang").is_none());
    }

    #[test]
    fn port_zero_is_rejected() {
        let err = Configuration::default()
            .merge(raw("[server]\nport = 0\n"))
            .unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn command_names_are_case_insensitive() {
        let cfg = Configuration::default()
            .merge(raw("[commands.Style]\ncmd = \"sass {input} {output}\"\n"))
            .unwrap();
        assert!(cfg.command_for(AssetClass::Style).is_some());
    }
}
