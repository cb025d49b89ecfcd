mod common;

use rstest::rstest;
use vasctree::domain::{TopologyError, TreeBuilder};
use vasctree::util::testing;

fn raw_order(edges: &[(u32, u32)], point_count: usize) -> Vec<(usize, u32, u32, usize)> {
    let tree = TreeBuilder::new().build(point_count, edges).unwrap();
    tree.order()
        .iter()
        .map(|s| (s.edge, s.parent.raw(), s.child.raw(), s.depth))
        .collect()
}

#[test]
fn given_bifurcating_tree_when_building_then_bfs_order_and_depths() {
    testing::init_test_setup();
    // Arrange
    let edges = [(0, 1), (0, 2), (1, 3), (1, 4)];

    // Act
    let order = raw_order(&edges, 5);

    // Assert
    assert_eq!(
        order,
        vec![(0, 0, 1, 0), (1, 0, 2, 0), (2, 1, 3, 1), (3, 1, 4, 1)]
    );
}

#[test]
fn given_edges_listed_leaves_first_when_building_then_order_is_breadth_first() {
    testing::init_test_setup();
    // Arrange
    let edges = [(1, 4), (1, 3), (0, 2), (0, 1)];

    // Act
    let order = raw_order(&edges, 5);

    // Assert: root's branches first, siblings keep input order
    assert_eq!(
        order,
        vec![(2, 0, 2, 0), (3, 0, 1, 0), (0, 1, 4, 1), (1, 1, 3, 1)]
    );
}

#[rstest]
#[case::second_parent(&[(0, 2), (1, 2)], "multiple parents")]
#[case::cycle_below_root(&[(0, 1), (1, 2), (2, 1)], "cycle")]
#[case::self_loop(&[(0, 1), (1, 1)], "cycle")]
#[case::no_root(&[(0, 1), (1, 0)], "no root")]
#[case::two_components(&[(0, 1), (2, 3)], "disconnected")]
#[case::detached_cycle(&[(0, 1), (2, 3), (3, 2)], "disconnected")]
fn given_invalid_edges_when_building_then_matching_error(
    #[case] edges: &[(u32, u32)],
    #[case] expected: &str,
) {
    testing::init_test_setup();

    let err = TreeBuilder::new().build(4, edges).unwrap_err();

    let kind = match err {
        TopologyError::MultipleParents { .. } => "multiple parents",
        TopologyError::Cycle { .. } => "cycle",
        TopologyError::NoOrMultipleRoots { .. } => "no root",
        TopologyError::Disconnected { .. } => "disconnected",
        TopologyError::PointOutOfRange { .. } => "out of range",
    };
    assert_eq!(kind, expected, "{err}");
}

#[test]
fn given_conflicting_parents_when_building_then_error_names_both() {
    testing::init_test_setup();

    let err = TreeBuilder::new().build(3, &[(0, 2), (1, 2)]).unwrap_err();

    match err {
        TopologyError::MultipleParents {
            point,
            first,
            second,
        } => {
            assert_eq!((point.raw(), first.raw(), second.raw()), (2, 0, 1));
        }
        other => panic!("unexpected {other:?}"),
    }
}

/// Deterministic pseudo-random trees: point i hangs below some earlier point.
fn generated_edges(n: u32, seed: u32) -> Vec<(u32, u32)> {
    let mut edges: Vec<(u32, u32)> = (1..n).map(|i| ((i * seed + 3) % i, i)).collect();
    // Scramble the input order
    edges.sort_by_key(|&(_, c)| (c * 7919) % n);
    edges
}

#[rstest]
#[case(2, 1)]
#[case(9, 5)]
#[case(40, 13)]
#[case(200, 31)]
fn given_generated_tree_when_building_then_invariants_hold(#[case] n: u32, #[case] seed: u32) {
    testing::init_test_setup();
    // Arrange
    let edges = generated_edges(n, seed);

    // Act
    let tree = TreeBuilder::new().build(n as usize, &edges).unwrap();

    // Assert: every point reached once, edges a permutation
    assert_eq!(tree.point_count(), n as usize);
    assert_eq!(tree.order().len(), edges.len());
    let mut seen: Vec<usize> = tree.order().iter().map(|s| s.edge).collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..edges.len()).collect::<Vec<_>>());

    // Depth of a branch is one more than the branch leading into its parent
    for step in tree.order() {
        match tree.parent(step.parent) {
            None => assert_eq!(step.depth, 0),
            Some(_) => {
                let incoming = tree
                    .order()
                    .iter()
                    .find(|s| s.child == step.parent)
                    .unwrap();
                assert_eq!(step.depth, incoming.depth + 1);
            }
        }
    }

    // Parents are listed before their children
    let position = |p| tree.order().iter().position(|s| s.child == p);
    for (i, step) in tree.order().iter().enumerate() {
        if let Some(j) = position(step.parent) {
            assert!(j < i);
        }
    }
}

#[test]
fn given_tree_when_counting_leaves_then_children_free_points() {
    testing::init_test_setup();

    let tree = TreeBuilder::new()
        .build(5, &[(0, 1), (0, 2), (1, 3), (1, 4)])
        .unwrap();

    let leaves: Vec<u32> = tree.leaf_points().iter().map(|p| p.raw()).collect();
    assert_eq!(leaves, vec![2, 3, 4]);
    assert_eq!(tree.max_depth(), 1);
    assert!(tree.is_leaf(tree.point(2).unwrap()));
    assert!(!tree.is_leaf(tree.root()));
}
