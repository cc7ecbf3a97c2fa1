// src/dag/mod.rs

//! Task graph composition.
//!
//! - [`task`] holds the `Task` descriptor and the `series` / `parallel`
//!   combinators.
//! - [`graph`] builds the named compositions (`build`, `compile`, ...) from
//!   a configuration.
//! - [`plan`] lowers a task tree into a petgraph DAG for dry runs.

pub mod graph;
pub mod plan;
pub mod task;

pub use graph::TaskGraph;
pub use plan::{ExecutionPlan, PlanStep};
pub use task::{Composite, PrimitiveTask, Task, parallel, series};
