//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::geometry::PointId;

/// Violations of the single-rooted-tree invariant found while building a tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("edge {edge} references point {point}, but only {count} points exist")]
    PointOutOfRange { edge: usize, point: u32, count: usize },

    #[error("point {point} has two parents: {first} and {second}")]
    MultipleParents {
        point: PointId,
        first: PointId,
        second: PointId,
    },

    #[error("expected exactly one root, found {count}")]
    NoOrMultipleRoots { count: usize },

    #[error("cycle detected at point {point}")]
    Cycle { point: PointId },

    #[error("tree is disconnected: reached {reached} of {expected} points from the root")]
    Disconnected { reached: usize, expected: usize },
}

/// Result type for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;

/// Domain errors represent violations of the tree model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("invalid tree topology: {0}")]
    Topology(#[from] TopologyError),

    #[error("geometry has no points")]
    EmptyGeometry,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
