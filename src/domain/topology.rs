//! Tree builder: turns undirected connectivity records into a validated rooted tree.

use tracing::{debug, instrument};

use crate::domain::error::{TopologyError, TopologyResult};
use crate::domain::geometry::PointId;
use crate::domain::traversal::{walk, Child, TraversalStep};

/// Validated rooted tree over a dense point arena.
#[derive(Debug, Clone)]
pub struct Tree {
    root: PointId,
    parent_of: Vec<Option<PointId>>,
    children_of: Vec<Vec<Child>>,
    order: Vec<TraversalStep>,
    max_depth: usize,
}

impl Tree {
    pub fn root(&self) -> PointId {
        self.root
    }

    pub fn point_count(&self) -> usize {
        self.parent_of.len()
    }

    /// Number of branches, equal to the number of input edges.
    pub fn edge_count(&self) -> usize {
        self.order.len()
    }

    /// Checks a raw file index against the arena.
    pub fn point(&self, raw: u32) -> Option<PointId> {
        ((raw as usize) < self.parent_of.len()).then(|| PointId::new(raw))
    }

    /// Unique parent of `point`, `None` for the root and isolated points.
    pub fn parent(&self, point: PointId) -> Option<PointId> {
        self.parent_of[point.index()]
    }

    /// Direct children in input edge order.
    pub fn children(&self, point: PointId) -> impl Iterator<Item = PointId> + '_ {
        self.children_of[point.index()].iter().map(|c| c.point)
    }

    pub fn child_count(&self, point: PointId) -> usize {
        self.children_of[point.index()].len()
    }

    /// A point that never acts as a parent.
    pub fn is_leaf(&self, point: PointId) -> bool {
        self.children_of[point.index()].is_empty()
    }

    /// Branch endpoints without children, in BFS order.
    pub fn leaf_points(&self) -> Vec<PointId> {
        self.order
            .iter()
            .map(|step| step.child)
            .filter(|&p| self.is_leaf(p))
            .collect()
    }

    /// Points with two or more children.
    pub fn bifurcation_count(&self) -> usize {
        self.children_of.iter().filter(|c| c.len() >= 2).count()
    }

    /// Canonical breadth-first branch order.
    pub fn order(&self) -> &[TraversalStep] {
        &self.order
    }

    /// Deepest branch depth, 0 when only root branches exist.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

/// Constructs [`Tree`]s from raw edge lists.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    allow_isolated_points: bool,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept points that no edge touches instead of failing with `Disconnected`.
    pub fn allow_isolated_points(mut self, allow: bool) -> Self {
        self.allow_isolated_points = allow;
        self
    }

    /// Build and validate a tree over `point_count` points.
    ///
    /// Edges are oriented by their stored order `(parent, child)`.
    #[instrument(level = "debug", skip(self, edges), fields(edges = edges.len()))]
    pub fn build(&self, point_count: usize, edges: &[(u32, u32)]) -> TopologyResult<Tree> {
        let mut parent_of: Vec<Option<PointId>> = vec![None; point_count];
        let mut children_of: Vec<Vec<Child>> = vec![Vec::new(); point_count];
        let mut touched = vec![false; point_count];
        let mut conflict: Option<(PointId, PointId, PointId)> = None;

        for (edge, &(a, b)) in edges.iter().enumerate() {
            let parent = checked(edge, a, point_count)?;
            let child = checked(edge, b, point_count)?;
            if parent == child {
                return Err(TopologyError::Cycle { point: child });
            }

            touched[parent.index()] = true;
            touched[child.index()] = true;
            children_of[parent.index()].push(Child { point: child, edge });

            match parent_of[child.index()] {
                None => parent_of[child.index()] = Some(parent),
                Some(first) if first != parent && conflict.is_none() => {
                    conflict = Some((child, first, parent));
                }
                Some(_) => {}
            }
        }

        if let Some((point, first, second)) = conflict {
            if on_cycle(point, &children_of) {
                return Err(TopologyError::Cycle { point });
            }
            return Err(TopologyError::MultipleParents {
                point,
                first,
                second,
            });
        }

        let roots: Vec<PointId> = (0..point_count)
            .filter(|&i| touched[i] && parent_of[i].is_none())
            .map(|i| PointId::new(i as u32))
            .collect();
        let root = match roots.as_slice() {
            [root] => *root,
            [] => return Err(TopologyError::NoOrMultipleRoots { count: 0 }),
            [first, ..] => {
                // Single parents everywhere: several roots means a forest.
                debug!(roots = roots.len(), "forest of separate trees");
                let reached = walk(*first, &children_of)?.visited;
                return Err(TopologyError::Disconnected {
                    reached,
                    expected: touched.iter().filter(|t| **t).count(),
                });
            }
        };
        debug!(%root, "root identified");

        let walk = walk(root, &children_of)?;

        let expected = parent_of.iter().filter(|p| p.is_some()).count() + 1;
        if walk.visited != expected {
            return Err(TopologyError::Disconnected {
                reached: walk.visited,
                expected,
            });
        }
        if !self.allow_isolated_points && walk.visited != point_count {
            return Err(TopologyError::Disconnected {
                reached: walk.visited,
                expected: point_count,
            });
        }

        debug!(
            branches = walk.steps.len(),
            max_depth = walk.max_depth,
            "tree validated"
        );
        Ok(Tree {
            root,
            parent_of,
            children_of,
            order: walk.steps,
            max_depth: walk.max_depth,
        })
    }
}

fn checked(edge: usize, raw: u32, count: usize) -> TopologyResult<PointId> {
    if (raw as usize) < count {
        Ok(PointId::new(raw))
    } else {
        Err(TopologyError::PointOutOfRange {
            edge,
            point: raw,
            count,
        })
    }
}

/// Whether `start` can reach itself by following child links.
fn on_cycle(start: PointId, children_of: &[Vec<Child>]) -> bool {
    let mut seen = vec![false; children_of.len()];
    let mut stack: Vec<PointId> = children_of[start.index()].iter().map(|c| c.point).collect();

    while let Some(point) = stack.pop() {
        if point == start {
            return true;
        }
        if std::mem::replace(&mut seen[point.index()], true) {
            continue;
        }
        stack.extend(children_of[point.index()].iter().map(|c| c.point));
    }
    false
}
