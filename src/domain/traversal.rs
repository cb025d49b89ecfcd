//! Breadth-first branch order.
//!
//! One walk from the root does three jobs at once: it proves every child is
//! reached exactly once, it records the depth of each branch, and it emits the
//! canonical order used both for branch ids and for progressive reveal.

use std::collections::VecDeque;

use tracing::trace;

use crate::domain::error::{TopologyError, TopologyResult};
use crate::domain::geometry::PointId;

/// Directed child link recorded by the builder, in input edge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Child {
    pub point: PointId,
    /// Index of the source edge in the raw edge list.
    pub edge: usize,
}

/// One branch in breadth-first order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalStep {
    /// Index of the source edge in the raw edge list.
    pub edge: usize,
    pub parent: PointId,
    pub child: PointId,
    /// BFS distance of `parent` from the root.
    pub depth: usize,
}

/// Output of [`walk`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Walk {
    pub steps: Vec<TraversalStep>,
    /// Number of distinct points reached, root included.
    pub visited: usize,
    pub max_depth: usize,
}

/// Walks `children_of` breadth-first from `root`.
///
/// Siblings keep the order of their parent's child list. Reaching a point a
/// second time fails with [`TopologyError::Cycle`].
pub fn walk(root: PointId, children_of: &[Vec<Child>]) -> TopologyResult<Walk> {
    let mut seen = vec![false; children_of.len()];
    seen[root.index()] = true;

    let mut walk = Walk {
        steps: Vec::with_capacity(children_of.iter().map(Vec::len).sum()),
        visited: 1,
        max_depth: 0,
    };

    let mut queue = VecDeque::new();
    queue.push_back((root, 0usize));

    while let Some((point, depth)) = queue.pop_front() {
        for child in &children_of[point.index()] {
            if seen[child.point.index()] {
                return Err(TopologyError::Cycle { point: child.point });
            }
            seen[child.point.index()] = true;
            walk.visited += 1;
            walk.max_depth = walk.max_depth.max(depth);
            trace!(edge = child.edge, parent = %point, child = %child.point, depth, "visit");

            walk.steps.push(TraversalStep {
                edge: child.edge,
                parent: point,
                child: child.point,
                depth,
            });
            queue.push_back((child.point, depth + 1));
        }
    }

    Ok(walk)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn children(links: &[(u32, u32)], n: usize) -> Vec<Vec<Child>> {
        let mut out = vec![Vec::new(); n];
        for (edge, &(a, b)) in links.iter().enumerate() {
            out[a as usize].push(Child {
                point: PointId::new(b),
                edge,
            });
        }
        out
    }

    #[test]
    fn given_two_level_tree_when_walking_then_parents_come_before_children() {
        let children_of = children(&[(0, 1), (0, 2), (1, 3), (1, 4)], 5);

        let walk = walk(PointId::new(0), &children_of).unwrap();

        let edges: Vec<_> = walk.steps.iter().map(|s| s.edge).collect();
        let depths: Vec<_> = walk.steps.iter().map(|s| s.depth).collect();
        assert_eq!(edges, vec![0, 1, 2, 3]);
        assert_eq!(depths, vec![0, 0, 1, 1]);
        assert_eq!(walk.visited, 5);
        assert_eq!(walk.max_depth, 1);
    }

    #[test]
    fn given_siblings_out_of_edge_order_when_walking_then_keeps_child_list_order() {
        // point 2 is listed before point 1 under the root
        let children_of = children(&[(0, 2), (2, 3), (0, 1)], 4);

        let walk = walk(PointId::new(0), &children_of).unwrap();

        let pairs: Vec<_> = walk
            .steps
            .iter()
            .map(|s| (s.parent.raw(), s.child.raw()))
            .collect();
        assert_eq!(pairs, vec![(0, 2), (0, 1), (2, 3)]);
    }

    #[test]
    fn given_duplicate_link_when_walking_then_cycle() {
        let children_of = children(&[(0, 1), (0, 1)], 2);

        let err = walk(PointId::new(0), &children_of).unwrap_err();

        assert_eq!(
            err,
            TopologyError::Cycle {
                point: PointId::new(1)
            }
        );
    }
}
