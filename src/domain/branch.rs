//! Per-branch geometric attributes derived from a validated tree.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::geometry::{PointId, RawGeometry};
use crate::domain::picking::Capsule;
use crate::domain::topology::Tree;

/// Radius used when no edge supplies one.
pub const DEFAULT_FALLBACK_RADIUS: f64 = 0.01;
/// Lower bound applied to every radius.
pub const DEFAULT_RADIUS_FLOOR: f64 = 0.001;
/// Branches shorter than this are treated as degenerate.
pub const LENGTH_EPSILON: f64 = 1e-10;
/// Direction reported for degenerate branches.
pub const FALLBACK_DIRECTION: DVec3 = DVec3::X;

/// How endpoint radii are assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RadiusMode {
    /// Mean radius of all edges touching the point (3D datasets).
    #[default]
    PointAverage,
    /// Both ends take the edge's own radius (2D datasets).
    PerEdge,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusPolicy {
    pub mode: RadiusMode,
    pub fallback: f64,
    pub floor: f64,
}

impl Default for RadiusPolicy {
    fn default() -> Self {
        Self {
            mode: RadiusMode::default(),
            fallback: DEFAULT_FALLBACK_RADIUS,
            floor: DEFAULT_RADIUS_FLOOR,
        }
    }
}

impl RadiusPolicy {
    pub fn with_mode(mode: RadiusMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    fn clamp(&self, radius: f64) -> f64 {
        radius.max(self.floor)
    }
}

/// A directed parent → child edge with everything rendering and picking need.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// Position in BFS order.
    pub id: usize,
    /// Index of the source edge in file order.
    pub edge: usize,
    pub parent_point: PointId,
    pub child_point: PointId,
    pub start_pos: DVec3,
    pub end_pos: DVec3,
    pub start_radius: f64,
    pub end_radius: f64,
    pub length: f64,
    /// Unit vector from start to end, [`FALLBACK_DIRECTION`] when degenerate.
    pub direction: DVec3,
    pub depth: usize,
    pub is_root_branch: bool,
    pub is_leaf_branch: bool,
}

impl Branch {
    pub fn max_radius(&self) -> f64 {
        self.start_radius.max(self.end_radius)
    }

    pub fn mean_radius(&self) -> f64 {
        (self.start_radius + self.end_radius) * 0.5
    }

    pub fn midpoint(&self) -> DVec3 {
        (self.start_pos + self.end_pos) * 0.5
    }

    pub fn is_degenerate(&self) -> bool {
        self.length < LENGTH_EPSILON
    }

    /// Hit-test shape, never thinner than `min_radius`.
    pub fn capsule(&self, min_radius: f64) -> Capsule {
        Capsule {
            start: self.start_pos,
            end: self.end_pos,
            radius: self.max_radius().max(min_radius),
        }
    }
}

/// Per-point radius: mean of every touching edge's radius.
///
/// Points that no edge with a radius touches get the fallback. Every value is
/// floored, so the result is strictly positive.
pub fn point_radii(geometry: &RawGeometry, policy: &RadiusPolicy) -> Vec<f64> {
    let n = geometry.point_count();
    let mut sum = vec![0.0; n];
    let mut count = vec![0usize; n];

    for (edge, &(a, b)) in geometry.edges.iter().enumerate() {
        let Some(radius) = geometry.edge_radius(edge) else {
            continue;
        };
        for p in [a as usize, b as usize] {
            if p < n {
                sum[p] += radius;
                count[p] += 1;
            }
        }
    }

    sum.iter()
        .zip(&count)
        .map(|(&s, &c)| {
            let r = if c > 0 { s / c as f64 } else { policy.fallback };
            policy.clamp(r)
        })
        .collect()
}

/// Attaches positions, radii and flags to the BFS-ordered branches of a tree.
#[derive(Debug)]
pub struct BranchAttributeBuilder<'a> {
    geometry: &'a RawGeometry,
    policy: RadiusPolicy,
}

impl<'a> BranchAttributeBuilder<'a> {
    pub fn new(geometry: &'a RawGeometry, policy: RadiusPolicy) -> Self {
        Self { geometry, policy }
    }

    #[instrument(level = "debug", skip_all, fields(mode = ?self.policy.mode))]
    pub fn build(&self, tree: &Tree) -> Vec<Branch> {
        let radii = match self.policy.mode {
            RadiusMode::PointAverage => Some(point_radii(self.geometry, &self.policy)),
            RadiusMode::PerEdge => None,
        };
        let root = tree.root();

        let branches: Vec<Branch> = tree
            .order()
            .iter()
            .enumerate()
            .map(|(id, step)| {
                let start_pos = self.geometry.points[step.parent.index()];
                let end_pos = self.geometry.points[step.child.index()];
                let (start_radius, end_radius) = match &radii {
                    Some(r) => (r[step.parent.index()], r[step.child.index()]),
                    None => {
                        let r = self.policy.clamp(
                            self.geometry
                                .edge_radius(step.edge)
                                .unwrap_or(self.policy.fallback),
                        );
                        (r, r)
                    }
                };
                let delta = end_pos - start_pos;
                let length = delta.length();
                let direction = if length < LENGTH_EPSILON {
                    FALLBACK_DIRECTION
                } else {
                    delta / length
                };

                Branch {
                    id,
                    edge: step.edge,
                    parent_point: step.parent,
                    child_point: step.child,
                    start_pos,
                    end_pos,
                    start_radius,
                    end_radius,
                    length,
                    direction,
                    depth: step.depth,
                    is_root_branch: step.parent == root,
                    is_leaf_branch: tree.is_leaf(step.child),
                }
            })
            .collect();

        debug!(count = branches.len(), "branch attributes built");
        branches
    }
}
