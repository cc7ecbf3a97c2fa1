// src/dag/task.rs

//! Task descriptors and the `series` / `parallel` combinators.
//!
//! Tasks are plain values: building or cloning one never performs IO, and
//! they hold no state between runs. A composite owns its members, so a task
//! can never (directly or transitively) contain itself.

use std::fmt;
use std::sync::Arc;

use crate::exec::transform::TransformRequest;
use crate::types::TaskName;

/// A unit of build work.
#[derive(Clone)]
pub enum Task {
    /// Exactly one transform invocation.
    Primitive(Arc<PrimitiveTask>),
    /// Members run one after another; each starts after the previous succeeded.
    Series(Composite),
    /// Members start together; resolves once every member resolved.
    Parallel(Composite),
}

/// Descriptor of a single transform invocation.
///
/// `name` is also the key under which the runner looks up the transform.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveTask {
    pub name: TaskName,
    pub request: TransformRequest,
}

#[derive(Clone)]
pub struct Composite {
    name: Option<TaskName>,
    members: Arc<[Task]>,
}

impl Composite {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn members(&self) -> &[Task] {
        &self.members
    }
}

/// Ordered composition: `T(i+1)` starts only after `Ti` resolved successfully.
pub fn series(members: impl IntoIterator<Item = Task>) -> Task {
    Task::Series(Composite {
        name: None,
        members: members.into_iter().collect(),
    })
}

/// Concurrent composition: all members start together, no ordering among them.
pub fn parallel(members: impl IntoIterator<Item = Task>) -> Task {
    Task::Parallel(Composite {
        name: None,
        members: members.into_iter().collect(),
    })
}

impl Task {
    pub fn primitive(name: impl Into<TaskName>, request: TransformRequest) -> Task {
        Task::Primitive(Arc::new(PrimitiveTask {
            name: name.into(),
            request,
        }))
    }

    /// Give the task a name used in logs, plans and error annotations.
    pub fn named(self, name: impl Into<TaskName>) -> Task {
        let name = name.into();
        match self {
            Task::Primitive(p) => Task::Primitive(Arc::new(PrimitiveTask {
                name,
                request: p.request.clone(),
            })),
            Task::Series(c) => Task::Series(Composite {
                name: Some(name),
                members: c.members,
            }),
            Task::Parallel(c) => Task::Parallel(Composite {
                name: Some(name),
                members: c.members,
            }),
        }
    }

    /// Explicit name, if any. Primitives are always named.
    pub fn name(&self) -> Option<&str> {
        match self {
            Task::Primitive(p) => Some(&p.name),
            Task::Series(c) | Task::Parallel(c) => c.name(),
        }
    }

    /// Name, or the combinator kind for anonymous composites.
    pub fn label(&self) -> &str {
        self.name().unwrap_or_else(|| self.kind())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Task::Primitive(_) => "primitive",
            Task::Series(_) => "series",
            Task::Parallel(_) => "parallel",
        }
    }

    /// Direct members of a composite; empty for primitives.
    pub fn members(&self) -> &[Task] {
        match self {
            Task::Primitive(_) => &[],
            Task::Series(c) | Task::Parallel(c) => c.members(),
        }
    }

    /// Names of all primitive tasks, depth first, in declaration order.
    ///
    /// A primitive used twice appears twice.
    pub fn leaf_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Task::Primitive(p) => out.push(&p.name),
            Task::Series(c) | Task::Parallel(c) => {
                for member in c.members() {
                    member.collect_leaves(out);
                }
            }
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Primitive(p) => write!(f, "{}", p.name),
            Task::Series(c) | Task::Parallel(c) => {
                if let Some(name) = c.name() {
                    write!(f, "{name}:")?;
                }
                f.write_str(self.kind())?;
                f.debug_list().entries(c.members().iter()).finish()
            }
        }
    }
}

/// Renders the tree compactly, e.g. `series[clean, parallel[style, page]]`.
impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Primitive(p) => f.write_str(&p.name),
            Task::Series(c) | Task::Parallel(c) => {
                write!(f, "{}[", self.kind())?;
                for (i, member) in c.members().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> Task {
        Task::primitive(name, TransformRequest::new("**", "src", "out"))
    }

    #[test]
    fn combinators_keep_member_order() {
        let t = series([leaf("a"), parallel([leaf("b"), leaf("c")]), leaf("a")]);
        assert_eq!(t.leaf_names(), vec!["a", "b", "c", "a"]);
        assert_eq!(t.to_string(), "series[a, parallel[b, c], a]");
    }

    #[test]
    fn named_composite_keeps_members() {
        let t = parallel([leaf("x"), leaf("y")]).named("compile");
        assert_eq!(t.label(), "compile");
        assert_eq!(t.kind(), "parallel");
        assert_eq!(t.members().len(), 2);
    }

    #[test]
    fn anonymous_composite_is_labelled_by_kind() {
        assert_eq!(series([]).label(), "series");
        assert!(series([]).name().is_none());
    }
}
