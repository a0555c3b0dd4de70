//! In-memory repository implementations for testing and embedding hosts.

mod log;
mod raster;

pub use log::InMemoryLog;
pub use raster::InMemoryRasterRepository;
