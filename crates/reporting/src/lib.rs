//! Harvest reporting: persistence and orchestration around `harvest-core`.
//!
//! This crate owns everything with side effects. The host embeds a
//! [`HarvestReporter`], opens one [`UnitCycle`] per management unit, feeds it
//! harvested stands and summary requests, and calls
//! [`HarvestReporter::write_maps`] once the timestep's units are done.
//!
//! Modules are organized by responsibility:
//! - [`reporter`] hosts the orchestrator and builder
//! - [`repository`] persists log rows and rasters (file and in-memory)
//! - [`config`] resolves output locations from defaults and the environment
pub mod config;
pub mod error;
pub mod reporter;
pub mod repository;
pub mod template;

pub use config::ReportingConfig;
pub use error::{ReportError, Result};
pub use reporter::{HarvestReporter, HarvestReporterBuilder, UnitCycle, UnitReport};
pub use repository::{
    FileEventLog, FileRasterRepository, FileRepository, FileSummaryLog, InMemoryLog,
    InMemoryRasterRepository, LogRepository, RasterRepository, RepositoryError,
};
pub use template::MapNameTemplate;
