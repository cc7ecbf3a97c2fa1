// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`transform`] defines the `Transform` contract and the `TransformSet`
//!   a runner dispatches into.
//! - [`runner`] executes `series` / `parallel` trees of primitive tasks.
//! - [`run_log`] records per-node start/finish instants of one run.

pub mod run_log;
pub mod runner;
pub mod transform;

pub use run_log::{NodeRecord, RunLog, RunReport};
pub use runner::Runner;
pub use transform::{
    OutputSet, Transform, TransformFuture, TransformOptions, TransformRequest, TransformSet,
};
