// src/config/mod.rs

//! Configuration resolution for sitepipe.
//!
//! - [`model`] holds the TOML override model and the immutable
//!   [`Configuration`].
//! - [`loader`] reads the optional override file.
//! - [`validate`] merges an override over the defaults and checks invariants.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, load_override, project_root_for, resolve};
pub use model::{
    AssetPaths, CommandConfig, Configuration, RawAssetPaths, RawBuildSection, RawConfigFile,
    RawServerSection,
};
