// src/dag/plan.rs

//! Lowering a task tree into a DAG of primitive invocations.
//!
//! The plan is never executed; it exists for `--dry-run` output and for
//! reasoning about ordering without side effects. Edge direction is
//! `before -> after`: for `series(A, B)` every exit leaf of `A` gets an edge
//! to every entry leaf of `B`.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::dag::task::Task;
use crate::errors::{Result, SitepipeError};

/// One primitive invocation in the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub name: String,
    /// Structural path of the node in the task tree (see `RunLog`).
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    graph: DiGraph<PlanStep, ()>,
}

impl ExecutionPlan {
    pub fn of(task: &Task) -> Self {
        let mut graph = DiGraph::new();
        lower(task, "0".to_string(), &mut graph);
        Self { graph }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Whether `before` must finish before `after` may start (transitively).
    pub fn must_precede(&self, before: &str, after: &str) -> bool {
        let (Some(from), Some(to)) = (self.index_of(before), self.index_of(after)) else {
            return false;
        };
        petgraph::algo::has_path_connecting(&self.graph, from, to, None) && from != to
    }

    /// Steps grouped into stages: a step's stage is the length of the longest
    /// chain of predecessors. Steps within a stage may run concurrently.
    pub fn stages(&self) -> Result<Vec<Vec<PlanStep>>> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            SitepipeError::ConfigError(format!(
                "cycle detected in execution plan at '{}'",
                self.graph[cycle.node_id()].name
            ))
        })?;

        let mut level = vec![0usize; self.graph.node_count()];
        for &node in &order {
            for succ in self.graph.neighbors(node) {
                level[succ.index()] = level[succ.index()].max(level[node.index()] + 1);
            }
        }

        let depth = level.iter().copied().max().map_or(0, |d| d + 1);
        let mut stages = vec![Vec::new(); depth];
        for node in order {
            stages[level[node.index()]].push(self.graph[node].clone());
        }
        for stage in &mut stages {
            stage.sort_by(|a, b| a.path.cmp(&b.path));
        }
        Ok(stages)
    }

    fn index_of(&self, path: &str) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&i| self.graph[i].path == path)
    }
}

/// Returns the (entry, exit) leaves of `task`.
fn lower(
    task: &Task,
    path: String,
    graph: &mut DiGraph<PlanStep, ()>,
) -> (Vec<NodeIndex>, Vec<NodeIndex>) {
    match task {
        Task::Primitive(p) => {
            let node = graph.add_node(PlanStep {
                name: p.name.clone(),
                path,
            });
            (vec![node], vec![node])
        }
        Task::Series(c) => {
            let mut entries: Option<Vec<NodeIndex>> = None;
            let mut exits: Vec<NodeIndex> = Vec::new();
            for (i, member) in c.members().iter().enumerate() {
                let (m_entries, m_exits) = lower(member, format!("{path}.{i}"), graph);
                if m_entries.is_empty() {
                    continue;
                }
                for &from in &exits {
                    for &to in &m_entries {
                        graph.add_edge(from, to, ());
                    }
                }
                entries.get_or_insert(m_entries);
                exits = m_exits;
            }
            (entries.unwrap_or_default(), exits)
        }
        Task::Parallel(c) => {
            let mut entries = Vec::new();
            let mut exits = Vec::new();
            for (i, member) in c.members().iter().enumerate() {
                let (m_entries, m_exits) = lower(member, format!("{path}.{i}"), graph);
                entries.extend(m_entries);
                exits.extend(m_exits);
            }
            (entries, exits)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::dag::graph::{BUILD, TaskGraph};

    fn names(stage: &[PlanStep]) -> Vec<&str> {
        stage.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn build_plan_has_four_stages() {
        let graph = TaskGraph::standard(&Configuration::default());
        let plan = ExecutionPlan::of(graph.get(BUILD).unwrap());
        let stages = plan.stages().unwrap();

        assert_eq!(plan.len(), 9);
        assert_eq!(stages.len(), 4);
        assert_eq!(names(&stages[0]), vec!["clean"]);
        assert_eq!(
            names(&stages[1]),
            vec!["style", "scripts", "page", "image", "font", "extra"]
        );
        assert_eq!(names(&stages[2]), vec!["rewrite"]);
        assert_eq!(names(&stages[3]), vec!["rewrite"]);
    }

    #[test]
    fn second_rewrite_waits_for_extra() {
        let graph = TaskGraph::standard(&Configuration::default());
        let plan = ExecutionPlan::of(graph.get(BUILD).unwrap());
        // 0.1.3 is `extra`, 0.2 the final rewrite, 0.1.0.1 the inner rewrite.
        assert!(plan.must_precede("0.1.3", "0.2"));
        assert!(plan.must_precede("0.1.0.1", "0.2"));
        assert!(!plan.must_precede("0.1.3", "0.1.0.1"));
    }
}
