// src/transforms/mod.rs

//! Built-in transforms.
//!
//! Every asset class defaults to a plain copy; `[commands.<class>]` in the
//! configuration swaps in an external program instead.

pub mod clean;
pub mod command;
pub mod copy;
pub mod rewrite;

use std::sync::Arc;

use crate::config::Configuration;
use crate::dag::graph::{CLEAN, REWRITE};
use crate::exec::transform::{Transform, TransformSet};
use crate::fs::FileSystem;
use crate::types::AssetClass;

pub use clean::CleanTransform;
pub use command::CommandTransform;
pub use copy::CopyTransform;
pub use rewrite::RewriteTransform;

/// Transforms for every primitive in the standard graph except `serve`.
pub fn standard_transforms(cfg: &Configuration, fs: Arc<dyn FileSystem>) -> TransformSet {
    let mut set = TransformSet::new();
    for class in AssetClass::ALL {
        let transform: Arc<dyn Transform> = match cfg.command_for(class) {
            Some(command) => Arc::new(CommandTransform::new(Arc::clone(&fs), command.clone())),
            None => Arc::new(CopyTransform::new(Arc::clone(&fs))),
        };
        set.insert(class.task_name(), transform);
    }
    set.insert(REWRITE, Arc::new(RewriteTransform::new(Arc::clone(&fs))));
    set.insert(CLEAN, Arc::new(CleanTransform::new(fs)));
    set
}
