//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::Path;
use std::sync::Arc;

use crate::application::dataset::{self, Dataset, Dimension};
use crate::application::services::{Session, StepLoader};
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding settings, I/O boundaries and service factories.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);

        Self { settings, fs }
    }

    /// Loader configured for a dataset of the given dimension.
    pub fn loader(&self, dimension: Dimension) -> StepLoader {
        StepLoader::new(
            Arc::clone(&self.fs),
            self.settings.tree_builder(),
            self.settings.radius_policy(dimension),
        )
    }

    pub fn dataset(&self, dir: &Path) -> ApplicationResult<Dataset> {
        dataset::discover(dir)
    }

    /// Session over the dataset in `dir`, nothing loaded yet.
    pub fn session(&self, dir: &Path) -> ApplicationResult<Session> {
        let dataset = self.dataset(dir)?;
        let loader = self.loader(dataset.dimension);
        Ok(Session::new(
            dataset,
            loader,
            self.settings.session_settings(),
        ))
    }
}
