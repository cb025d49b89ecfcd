//! Domain layer: tree topology, branch geometry, picking and camera math
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod branch;
pub mod error;
pub mod geometry;
pub mod model;
pub mod picking;
pub mod topology;
pub mod traversal;
pub mod view;
pub mod vtk;

pub use branch::{Branch, BranchAttributeBuilder, RadiusMode, RadiusPolicy};
pub use error::{DomainError, DomainResult, TopologyError, TopologyResult};
pub use geometry::{Bounds, PointId, RawGeometry};
pub use model::{TreeModel, Visibility};
pub use picking::{Capsule, Hit, Picker, Ray};
pub use topology::{Tree, TreeBuilder};
pub use traversal::TraversalStep;
pub use view::{CameraLimits, Projection, ViewState, Viewport};
pub use vtk::{ParseIncomplete, ParseOutcome};
