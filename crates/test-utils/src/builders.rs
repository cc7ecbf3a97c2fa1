#![allow(dead_code)]

use std::path::Path;

use sitepipe::config::{CommandConfig, Configuration, RawConfigFile};
use sitepipe::dag::Task;
use sitepipe::exec::TransformRequest;

/// Builder for `Configuration`, going through the same merge path as an
/// override file.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationBuilder {
    raw: RawConfigFile,
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn src(mut self, dir: &str) -> Self {
        self.raw.build.src = Some(dir.to_string());
        self
    }

    pub fn dist(mut self, dir: &str) -> Self {
        self.raw.build.dist = Some(dir.to_string());
        self
    }

    pub fn temp(mut self, dir: &str) -> Self {
        self.raw.build.temp = Some(dir.to_string());
        self
    }

    pub fn public(mut self, dir: &str) -> Self {
        self.raw.build.public = Some(dir.to_string());
        self
    }

    pub fn style_glob(mut self, glob: &str) -> Self {
        self.raw.build.paths.style = Some(glob.to_string());
        self
    }

    pub fn pages_glob(mut self, glob: &str) -> Self {
        self.raw.build.paths.pages = Some(glob.to_string());
        self
    }

    pub fn data(mut self, key: &str, value: &str) -> Self {
        self.raw
            .data
            .get_or_insert_with(toml::Table::new)
            .insert(key.to_string(), toml::Value::String(value.to_string()));
        self
    }

    pub fn command(mut self, transform: &str, cmd: &str, ext: Option<&str>) -> Self {
        self.raw.commands.insert(
            transform.to_string(),
            CommandConfig {
                cmd: cmd.to_string(),
                ext: ext.map(str::to_string),
            },
        );
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.raw.server.port = Some(port);
        self
    }

    /// Merge over the defaults and root every directory at `root`.
    pub fn build_at(self, root: impl AsRef<Path>) -> Configuration {
        Configuration::default()
            .merge(self.raw)
            .expect("Failed to build valid configuration from builder")
            .rooted_at(root)
    }
}

/// A primitive whose request is irrelevant to the test (fake transforms
/// ignore it).
pub fn leaf(name: &str) -> Task {
    Task::primitive(name, TransformRequest::new("**", "/in", "/out"))
}
