// src/watch/mod.rs

//! File watching and glob matching.
//!
//! This module compiles anchored glob patterns, pairs them with tasks as
//! [`WatchBinding`]s, and turns filesystem notifications into
//! `DispatchEvent::PathChanged`. It does not decide what to run; that is
//! the dispatcher's job (see `engine`).

pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use patterns::{GlobPattern, WatchBinding, collect_matching_files};
pub use watcher::{WatcherHandle, spawn_watcher};
