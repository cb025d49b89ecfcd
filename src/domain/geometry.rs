//! Raw parsed geometry: points, undirected edges and per-edge radius.

use std::fmt;

use glam::DVec3;

/// Dense index of a point in [`RawGeometry::points`].
///
/// Only the tree builder hands these out, after checking the raw index against
/// the point count, so per-point arrays can be indexed without bounds surprises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(u32);

impl PointId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Position in per-point arrays.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Id as written in the source file.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Axis-aligned bounding box of a point cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner (inclusive).
    pub min: DVec3,
    /// Maximum corner (inclusive).
    pub max: DVec3,
}

impl Bounds {
    /// Smallest box containing all points, `None` for an empty slice.
    pub fn from_points(points: &[DVec3]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(min, max), &p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Length of the box diagonal.
    #[inline]
    pub fn diagonal(&self) -> f64 {
        self.size().length()
    }
}

/// Immutable result of parsing one step file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGeometry {
    /// Point positions; 2D datasets carry `z = 0`.
    pub points: Vec<DVec3>,
    /// Unordered point pairs in file cell order.
    pub edges: Vec<(u32, u32)>,
    /// One radius per edge when the scalar block was present.
    pub edge_radius: Vec<f64>,
}

impl RawGeometry {
    pub fn new(points: Vec<DVec3>, edges: Vec<(u32, u32)>, edge_radius: Vec<f64>) -> Self {
        Self {
            points,
            edges,
            edge_radius,
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Radius recorded against `edge`, if the file provided one.
    pub fn edge_radius(&self, edge: usize) -> Option<f64> {
        self.edge_radius.get(edge).copied()
    }

    /// True when every edge has a radius value.
    pub fn has_radius(&self) -> bool {
        !self.edges.is_empty() && self.edge_radius.len() == self.edges.len()
    }

    /// A parse result worth building a tree from.
    pub fn is_plausible(&self) -> bool {
        !self.points.is_empty() && !self.edges.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.points)
    }

    /// Mean of all point positions.
    pub fn centroid(&self) -> Option<DVec3> {
        if self.points.is_empty() {
            return None;
        }
        let sum: DVec3 = self.points.iter().copied().sum();
        Some(sum / self.points.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_points_when_computing_bounds_then_covers_all() {
        let points = vec![
            DVec3::new(1.0, -2.0, 0.0),
            DVec3::new(-1.0, 4.0, 3.0),
            DVec3::new(0.5, 0.0, -1.0),
        ];
        let bounds = Bounds::from_points(&points).unwrap();

        assert_eq!(bounds.min, DVec3::new(-1.0, -2.0, -1.0));
        assert_eq!(bounds.max, DVec3::new(1.0, 4.0, 3.0));
        assert_eq!(bounds.center(), DVec3::new(0.0, 1.0, 1.0));
    }

    #[test]
    fn given_empty_points_when_computing_bounds_then_none() {
        assert!(Bounds::from_points(&[]).is_none());
        assert!(RawGeometry::default().centroid().is_none());
    }

    #[test]
    fn given_short_radius_block_when_querying_then_missing_edges_have_none() {
        let geometry = RawGeometry::new(
            vec![DVec3::ZERO, DVec3::X, DVec3::Y],
            vec![(0, 1), (0, 2)],
            vec![0.5],
        );

        assert!(!geometry.has_radius());
        assert_eq!(geometry.edge_radius(0), Some(0.5));
        assert_eq!(geometry.edge_radius(1), None);
        assert!(geometry.is_plausible());
    }
}
