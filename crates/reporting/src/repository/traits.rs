//! Repository contracts for reporting output.

use harvest_core::{RasterGrid, Time};

use super::Result;

/// Append-only table of log rows.
///
/// Rows must reach storage in the order they are appended; implementations
/// flush after every row so a failed timestep leaves a complete prefix.
pub trait LogRepository<T>: Send {
    /// Append a row and flush it.
    ///
    /// Returns the byte offset (or index) where the row was written.
    fn append(&mut self, row: &T) -> Result<u64>;

    /// Read every row back in append order.
    fn read_all(&self) -> Result<Vec<T>>;

    /// Flush buffered writes to storage
    fn flush(&mut self) -> Result<()>;

    /// Number of rows appended through this handle
    fn row_count(&self) -> u64;

    /// Name of the table (file name for file-backed logs)
    fn name(&self) -> &str;
}

/// Store of one raster per timestep.
pub trait RasterRepository: Send {
    /// Write the raster for `timestep`, replacing any earlier one.
    ///
    /// Returns the location the raster was written to.
    fn write(&mut self, timestep: Time, grid: &RasterGrid) -> Result<String>;

    /// Load the raster written for `timestep`
    fn read(&self, timestep: Time) -> Result<Option<RasterGrid>>;
}
