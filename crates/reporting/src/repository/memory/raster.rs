//! In-memory raster store.

use std::collections::BTreeMap;

use harvest_core::{RasterGrid, Time};

use crate::repository::Result;
use crate::repository::traits::RasterRepository;

#[derive(Default)]
pub struct InMemoryRasterRepository {
    rasters: BTreeMap<Time, RasterGrid>,
}

impl InMemoryRasterRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RasterRepository for InMemoryRasterRepository {
    fn write(&mut self, timestep: Time, grid: &RasterGrid) -> Result<String> {
        self.rasters.insert(timestep, grid.clone());
        Ok(format!("memory:{timestep}"))
    }

    fn read(&self, timestep: Time) -> Result<Option<RasterGrid>> {
        Ok(self.rasters.get(&timestep).cloned())
    }
}
