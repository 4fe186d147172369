//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{BulkService, CheckService, RollService};
use crate::config::Settings;
use crate::infrastructure::http::HttpPreloadSource;
use crate::infrastructure::traits::{FileSystem, PreloadSource, RealFileSystem};
use crate::infrastructure::InfraResult;

/// Container holding shared dependencies; services are built on demand.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Remote list and removal queues
    pub source: Arc<dyn PreloadSource>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let source = HttpPreloadSource::new(&settings)?;
        Ok(Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(source),
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        source: Arc<dyn PreloadSource>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            source,
        }
    }

    pub fn roll_service(&self) -> RollService {
        RollService::new(
            Arc::clone(&self.fs),
            Arc::clone(&self.source),
            Arc::clone(&self.settings),
        )
    }

    pub fn bulk_service(&self) -> BulkService {
        BulkService::new(
            Arc::clone(&self.fs),
            Arc::clone(&self.source),
            Arc::clone(&self.settings),
        )
    }

    pub fn check_service(&self) -> CheckService {
        CheckService::new(Arc::clone(&self.fs), Arc::clone(&self.settings))
    }
}
