// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::AssetClass;

/// Override file as read from TOML.
///
/// Every field is optional; anything left out falls back to the defaults
/// during [`Configuration::merge`](crate::config::Configuration::merge).
///
/// ```toml
/// [build]
/// src = "src"
/// dist = "dist"
///
/// [build.paths]
/// style = "custom/*.scss"
///
/// [data]
/// title = "Home"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub build: RawBuildSection,

    /// Opaque payload handed to the page transform.
    #[serde(default)]
    pub data: Option<toml::Table>,

    /// External commands replacing built-in transforms, keyed by transform name.
    #[serde(default)]
    pub commands: BTreeMap<String, CommandConfig>,

    #[serde(default)]
    pub server: RawServerSection,
}

/// `[build]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBuildSection {
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub dist: Option<String>,
    #[serde(default)]
    pub temp: Option<String>,
    #[serde(default)]
    pub public: Option<String>,
    #[serde(default)]
    pub paths: RawAssetPaths,
}

/// `[build.paths]` section; merged key by key over the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAssetPaths {
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub scripts: Option<String>,
    #[serde(default)]
    pub pages: Option<String>,
    #[serde(default)]
    pub images: Option<String>,
    #[serde(default)]
    pub fonts: Option<String>,
}

/// `[server]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawServerSection {
    #[serde(default)]
    pub port: Option<u16>,
}

/// `[commands.<transform>]` entry.
///
/// `cmd` is run once per matched file through the platform shell, with
/// `{input}` and `{output}` replaced by the file paths. `ext` replaces the
/// extension of the output path (e.g. `scss` -> `css`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandConfig {
    pub cmd: String,
    #[serde(default)]
    pub ext: Option<String>,
}

/// Glob patterns per asset class, relative to the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub style: String,
    pub scripts: String,
    pub pages: String,
    pub images: String,
    pub fonts: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            style: "assets/style/*.scss".to_string(),
            scripts: "assets/scripts/*.js".to_string(),
            pages: "*.html".to_string(),
            images: "assets/images/**".to_string(),
            fonts: "assets/fonts/**".to_string(),
        }
    }
}

/// Effective, immutable configuration.
///
/// Built once per process from the defaults and an optional override file.
/// Fields are only reachable through accessors; [`Configuration::rooted_at`]
/// returns a new value instead of changing this one.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub(crate) source_dir: PathBuf,
    pub(crate) dist_dir: PathBuf,
    pub(crate) temp_dir: PathBuf,
    pub(crate) public_dir: PathBuf,
    pub(crate) project_root: PathBuf,
    pub(crate) paths: AssetPaths,
    pub(crate) template_data: Option<toml::Table>,
    pub(crate) commands: BTreeMap<AssetClass, CommandConfig>,
    pub(crate) port: u16,
}

pub const DEFAULT_PORT: u16 = 3000;

impl Default for Configuration {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src"),
            dist_dir: PathBuf::from("dist"),
            temp_dir: PathBuf::from("temp"),
            public_dir: PathBuf::from("public"),
            project_root: PathBuf::from("."),
            paths: AssetPaths::default(),
            template_data: None,
            commands: BTreeMap::new(),
            port: DEFAULT_PORT,
        }
    }
}

impl Configuration {
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Directory the relative directories above are resolved against.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn paths(&self) -> &AssetPaths {
        &self.paths
    }

    pub fn template_data(&self) -> Option<&toml::Table> {
        self.template_data.as_ref()
    }

    /// External command configured for the given asset class, if any.
    pub fn command_for(&self, class: AssetClass) -> Option<&CommandConfig> {
        self.commands.get(&class)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Glob for the given asset class (relative to its base directory).
    pub fn glob_for(&self, class: AssetClass) -> &str {
        match class {
            AssetClass::Style => &self.paths.style,
            AssetClass::Scripts => &self.paths.scripts,
            AssetClass::Page => &self.paths.pages,
            AssetClass::Image => &self.paths.images,
            AssetClass::Font => &self.paths.fonts,
            AssetClass::Extra => "**",
        }
    }

    /// Return a copy whose directories are resolved against `root`.
    ///
    /// Absolute directories are left untouched.
    pub fn rooted_at(&self, root: impl AsRef<Path>) -> Configuration {
        let root = root.as_ref();
        Configuration {
            source_dir: root.join(&self.source_dir),
            dist_dir: root.join(&self.dist_dir),
            temp_dir: root.join(&self.temp_dir),
            public_dir: root.join(&self.public_dir),
            project_root: root.to_path_buf(),
            ..self.clone()
        }
    }
}
