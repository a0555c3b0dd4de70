//! File-based repository implementations.

mod log;
mod raster;

pub use log::FileRepository;
pub use raster::FileRasterRepository;

use harvest_core::{EventLogRow, SummaryLogRow};

/// File-based event log (one row per stand-harvest occurrence)
pub type FileEventLog = FileRepository<EventLogRow>;

/// File-based summary log (one row per prescription per unit cycle)
pub type FileSummaryLog = FileRepository<SummaryLogRow>;
