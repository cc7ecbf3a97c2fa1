// tests/property_combinators.rs

use std::time::Duration;

use proptest::prelude::*;
use sitepipe::dag::{Task, parallel, series};
use sitepipe::exec::{RunReport, Runner, TransformSet};
use sitepipe_test_utils::builders::leaf;
use sitepipe_test_utils::fake_transform::{Journal, RecordingTransform};

const LEAVES: [&str; 4] = ["t0", "t1", "t2", "t3"];

#[derive(Debug, Clone)]
enum Shape {
    Leaf(usize),
    Series(Vec<Shape>),
    Parallel(Vec<Shape>),
}

// Trees are acyclic by construction: every node owns its members.
fn shape_strategy() -> impl Strategy<Value = Shape> {
    let leaf = (0..LEAVES.len()).prop_map(Shape::Leaf);
    leaf.prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Shape::Series),
            proptest::collection::vec(inner, 0..4).prop_map(Shape::Parallel),
        ]
    })
}

fn to_task(shape: &Shape) -> Task {
    match shape {
        Shape::Leaf(i) => leaf(LEAVES[*i]),
        Shape::Series(members) => series(members.iter().map(to_task)),
        Shape::Parallel(members) => parallel(members.iter().map(to_task)),
    }
}

fn leaf_count(shape: &Shape) -> usize {
    match shape {
        Shape::Leaf(_) => 1,
        Shape::Series(m) | Shape::Parallel(m) => m.iter().map(leaf_count).sum(),
    }
}

fn runner() -> Runner {
    let journal = Journal::new();
    let mut set = TransformSet::new();
    for (i, name) in LEAVES.iter().enumerate() {
        let delay = Duration::from_millis(i as u64);
        set.insert(*name, RecordingTransform::new(name, &journal).with_delay(delay).shared());
    }
    Runner::new(set)
}

fn run(task: &Task) -> RunReport {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
        .block_on(runner().run(task))
        .unwrap()
}

fn members_of<'a>(report: &'a RunReport, path: &str) -> Vec<&'a sitepipe::exec::NodeRecord> {
    let mut members = Vec::new();
    while let Some(node) = report.node(&format!("{path}.{}", members.len())) {
        members.push(node);
    }
    members
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn series_members_never_overlap(shape in shape_strategy()) {
        let report = run(&to_task(&shape));

        for node in report.nodes.iter().filter(|n| n.kind == "series") {
            let members = members_of(&report, &node.path);
            for pair in members.windows(2) {
                let prev_finish = pair[0].finished.expect("member finished");
                prop_assert!(pair[1].started >= prev_finish, "{} started before {} finished", pair[1].path, pair[0].path);
            }
        }
    }

    #[test]
    fn members_run_within_their_parent(shape in shape_strategy()) {
        let report = run(&to_task(&shape));

        for node in report.nodes.iter().filter(|n| n.kind != "primitive") {
            for member in members_of(&report, &node.path) {
                prop_assert!(member.started >= node.started);
                let (Some(member_end), Some(node_end)) = (member.finished, node.finished) else {
                    return Err(TestCaseError::fail(format!("{} never finished", member.path)));
                };
                prop_assert!(member_end <= node_end);
            }
        }
    }

    #[test]
    fn every_leaf_runs_exactly_once(shape in shape_strategy()) {
        let report = run(&to_task(&shape));

        prop_assert_eq!(report.leaves().count(), leaf_count(&shape));
        prop_assert!(report.nodes.iter().all(|n| n.success == Some(true)));
    }
}
