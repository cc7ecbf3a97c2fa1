// src/engine/mod.rs

//! Watch dispatch engine for `develop`.
//!
//! The pure state machine lives in [`core`]; the async/IO shell that spawns
//! rebuilds and forwards reloads is implemented in [`runtime`].

pub mod core;
pub mod runtime;

pub use self::core::{BindingState, DispatchCommand, DispatchEvent, DispatchStep, DispatcherCore};
pub use self::runtime::WatchRuntime;
