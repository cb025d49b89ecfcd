//! Step loader service
//!
//! Reads one step file, parses it and runs the tree pipeline.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{vtk, RadiusPolicy, RawGeometry, TreeBuilder, TreeModel};
use crate::infrastructure::traits::FileSystem;

/// Service turning step files into [`TreeModel`]s.
pub struct StepLoader {
    fs: Arc<dyn FileSystem>,
    builder: TreeBuilder,
    policy: RadiusPolicy,
}

impl StepLoader {
    pub fn new(fs: Arc<dyn FileSystem>, builder: TreeBuilder, policy: RadiusPolicy) -> Self {
        Self {
            fs,
            builder,
            policy,
        }
    }

    /// Parse a step file without building the tree.
    ///
    /// Parse problems are logged; only geometry with no points or no edges is rejected.
    pub fn read_geometry(&self, path: &Path) -> ApplicationResult<RawGeometry> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::FileMissing(path.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read step file", path)?;

        let outcome = vtk::parse(&content);
        if let Some(issue) = &outcome.issue {
            warn!(path = %path.display(), line = issue.line, reason = %issue.reason, "step file parsed partially");
        }

        let geometry = outcome.geometry;
        if !geometry.is_plausible() {
            let reason = match (geometry.point_count(), geometry.edge_count()) {
                (0, _) => "no points".to_string(),
                (_, 0) => "no two-point line cells".to_string(),
                _ => "incomplete".to_string(),
            };
            let reason = match outcome.issue {
                Some(issue) => format!("{reason} ({issue})"),
                None => reason,
            };
            return Err(ApplicationError::Unusable {
                path: path.to_path_buf(),
                reason,
            });
        }
        if !geometry.has_radius() {
            debug!(path = %path.display(), "radius block missing or short, using fallback");
        }
        Ok(geometry)
    }

    /// Parse and build the model of one step.
    #[instrument(level = "debug", skip(self), fields(path = %path.display()))]
    pub fn load(&self, path: &Path) -> ApplicationResult<TreeModel> {
        let geometry = self.read_geometry(path)?;
        TreeModel::from_geometry(&geometry, &self.builder, self.policy).map_err(|e| {
            warn!(path = %path.display(), error = %e, "tree rejected");
            ApplicationError::Domain(e)
        })
    }
}
