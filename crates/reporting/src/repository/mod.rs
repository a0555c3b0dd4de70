//! Repository layer for reporting output.
//!
//! Two kinds of output leave the accounting core:
//! - Log tables (event and summary rows), append-only
//! - Per-timestep rasters (prescription map, biomass-removed map)
//!
//! File-backed implementations are used in production; in-memory ones serve
//! tests and embedding hosts that inspect rows directly.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::{FileEventLog, FileRasterRepository, FileRepository, FileSummaryLog};
pub use memory::{InMemoryLog, InMemoryRasterRepository};
pub use traits::{LogRepository, RasterRepository};
