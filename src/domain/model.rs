//! Displayable tree model for one growth step.

use glam::DVec3;
use tracing::{info, instrument};

use crate::domain::branch::{Branch, BranchAttributeBuilder, RadiusPolicy};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::geometry::{Bounds, PointId, RawGeometry};
use crate::domain::picking::{Hit, Picker, Ray};
use crate::domain::topology::{Tree, TreeBuilder};

/// How much of the ordered branch list is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    All,
    /// Only the first `n` branches in BFS order.
    UpTo(usize),
}

/// Tree, branches and framing data for one step.
///
/// Built in one go from a [`RawGeometry`]; a new step produces a new model
/// instead of mutating this one. The only mutable state is [`Visibility`].
#[derive(Debug, Clone)]
pub struct TreeModel {
    tree: Tree,
    branches: Vec<Branch>,
    leaf_points: Vec<PointId>,
    bounds: Bounds,
    centroid: DVec3,
    visibility: Visibility,
}

impl TreeModel {
    /// Full pipeline: topology, BFS order, branch attributes.
    #[instrument(level = "debug", skip_all, fields(points = geometry.point_count(), edges = geometry.edge_count()))]
    pub fn from_geometry(
        geometry: &RawGeometry,
        builder: &TreeBuilder,
        policy: RadiusPolicy,
    ) -> DomainResult<Self> {
        let (Some(bounds), Some(centroid)) = (geometry.bounds(), geometry.centroid()) else {
            return Err(DomainError::EmptyGeometry);
        };
        let tree = builder.build(geometry.point_count(), &geometry.edges)?;
        let branches = BranchAttributeBuilder::new(geometry, policy).build(&tree);
        let leaf_points = tree.leaf_points();

        info!(
            root = %tree.root(),
            branches = branches.len(),
            bifurcations = tree.bifurcation_count(),
            max_depth = tree.max_depth(),
            "tree model built"
        );
        Ok(Self {
            tree,
            branches,
            leaf_points,
            bounds,
            centroid,
            visibility: Visibility::All,
        })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> PointId {
        self.tree.root()
    }

    pub fn max_depth(&self) -> usize {
        self.tree.max_depth()
    }

    /// All branches in BFS order; `branches()[i].id == i`.
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn branch(&self, id: usize) -> Option<&Branch> {
        self.branches.get(id)
    }

    pub fn leaf_points(&self) -> &[PointId] {
        &self.leaf_points
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn centroid(&self) -> DVec3 {
        self.centroid
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = match visibility {
            Visibility::UpTo(n) => Visibility::UpTo(n.min(self.branches.len())),
            Visibility::All => Visibility::All,
        };
    }

    pub fn visible_count(&self) -> usize {
        match self.visibility {
            Visibility::All => self.branches.len(),
            Visibility::UpTo(n) => n.min(self.branches.len()),
        }
    }

    /// Prefix of the branch list the renderer should draw.
    pub fn visible_branches(&self) -> &[Branch] {
        &self.branches[..self.visible_count()]
    }

    /// In progressive reveal mode, complete or not.
    pub fn is_revealing(&self) -> bool {
        matches!(self.visibility, Visibility::UpTo(_))
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.visible_count() == self.branches.len()
    }

    /// Start progressive reveal from the first branch.
    pub fn restart_reveal(&mut self) {
        self.set_visibility(Visibility::UpTo(1));
    }

    /// Show `n` more branches. Returns false when nothing changed.
    pub fn reveal(&mut self, n: usize) -> bool {
        match self.visibility {
            Visibility::All => false,
            Visibility::UpTo(current) => {
                let next = current.saturating_add(n).min(self.branches.len());
                self.visibility = Visibility::UpTo(next);
                next != current
            }
        }
    }

    /// Hide `n` branches, keeping at least the first one visible.
    pub fn conceal(&mut self, n: usize) {
        if let Visibility::UpTo(current) = self.visibility {
            self.visibility = Visibility::UpTo(current.saturating_sub(n).max(1));
        }
    }

    /// Nearest branch hit by `ray`, over every branch.
    pub fn pick(&self, ray: &Ray, picker: &Picker) -> Option<Hit> {
        picker.pick(&self.branches, ray)
    }

    /// Nearest branch hit by `ray`, over visible branches only.
    pub fn pick_visible(&self, ray: &Ray, picker: &Picker) -> Option<Hit> {
        picker.pick(self.visible_branches(), ray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: u32) -> RawGeometry {
        RawGeometry::new(
            (0..=n).map(|i| DVec3::new(0.0, i as f64, 0.0)).collect(),
            (0..n).map(|i| (i, i + 1)).collect(),
            vec![0.1; n as usize],
        )
    }

    #[test]
    fn given_model_when_revealing_then_count_grows_to_total_and_stops() {
        let mut model =
            TreeModel::from_geometry(&chain(3), &TreeBuilder::new(), RadiusPolicy::default())
                .unwrap();
        model.restart_reveal();

        assert_eq!(model.visible_count(), 1);
        assert!(model.reveal(1));
        assert!(model.reveal(5));
        assert_eq!(model.visible_count(), 3);
        assert!(!model.reveal(1));
        assert!(model.is_fully_revealed());
    }

    #[test]
    fn given_partial_reveal_when_concealing_then_keeps_first_branch() {
        let mut model =
            TreeModel::from_geometry(&chain(4), &TreeBuilder::new(), RadiusPolicy::default())
                .unwrap();
        model.set_visibility(Visibility::UpTo(3));

        model.conceal(10);

        assert_eq!(model.visibility(), Visibility::UpTo(1));
        assert_eq!(model.visible_branches().len(), 1);
    }

    #[test]
    fn given_all_visible_when_revealing_then_noop() {
        let mut model =
            TreeModel::from_geometry(&chain(2), &TreeBuilder::new(), RadiusPolicy::default())
                .unwrap();

        assert!(!model.reveal(1));
        model.conceal(1);
        assert_eq!(model.visibility(), Visibility::All);
        assert_eq!(model.visible_count(), 2);
    }

    #[test]
    fn given_empty_geometry_when_building_then_empty_error() {
        let err = TreeModel::from_geometry(
            &RawGeometry::default(),
            &TreeBuilder::new(),
            RadiusPolicy::default(),
        )
        .unwrap_err();

        assert_eq!(err, DomainError::EmptyGeometry);
    }
}
