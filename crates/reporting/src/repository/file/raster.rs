//! File-based RasterRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use harvest_core::{RasterGrid, Time};

use crate::repository::traits::RasterRepository;
use crate::repository::{RepositoryError, Result};
use crate::template::MapNameTemplate;

/// Writes one raster file per timestep, named from a [`MapNameTemplate`].
///
/// # File Format
///
/// Rasters are stored as bincode-encoded [`RasterGrid`]s: the grid
/// dimensions followed by the tagged cell buffer (`u8` or `u16` cells in
/// row-major order). Files are written to a temporary sibling and renamed
/// into place so a failed write never leaves a truncated map behind.
pub struct FileRasterRepository {
    base_dir: PathBuf,
    template: MapNameTemplate,
}

impl FileRasterRepository {
    pub fn new(base_dir: impl AsRef<Path>, template: MapNameTemplate) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self { base_dir, template })
    }

    /// Get the path of the raster for a timestep.
    pub fn raster_path(&self, timestep: Time) -> PathBuf {
        self.base_dir.join(self.template.render(timestep))
    }
}

impl RasterRepository for FileRasterRepository {
    fn write(&mut self, timestep: Time, grid: &RasterGrid) -> Result<String> {
        let path = self.raster_path(timestep);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(RepositoryError::Io)?;
        }
        let mut temp_path = path.clone().into_os_string();
        temp_path.push(".tmp");

        let bytes =
            bincode::serialize(grid).map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        fs::write(&temp_path, bytes).map_err(RepositoryError::Io)?;

        // Atomic rename
        fs::rename(&temp_path, &path).map_err(RepositoryError::Io)?;

        tracing::debug!("Wrote raster[{}] to {}", timestep, path.display());

        Ok(path.display().to_string())
    }

    fn read(&self, timestep: Time) -> Result<Option<RasterGrid>> {
        let path = self.raster_path(timestep);

        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path).map_err(RepositoryError::Io)?;
        let grid: RasterGrid = bincode::deserialize(&bytes)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        if grid.cells.len() != grid.dimensions.cell_count() {
            return Err(RepositoryError::CorruptedData(format!(
                "{} holds {} cells for a {}x{} grid",
                path.display(),
                grid.cells.len(),
                grid.dimensions.rows,
                grid.dimensions.columns
            )));
        }

        Ok(Some(grid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::{CellBuffer, MapDimensions};
    use tempfile::TempDir;

    fn grid() -> RasterGrid {
        RasterGrid {
            dimensions: MapDimensions::new(2, 2),
            cells: CellBuffer::U8(vec![0, 1, 2, 4]),
        }
    }

    #[test]
    fn writes_one_file_per_timestep() {
        let temp_dir = TempDir::new().unwrap();
        let template = MapNameTemplate::parse("harvest/prescripts-{timestep}.bin").unwrap();
        let mut repo = FileRasterRepository::new(temp_dir.path(), template).unwrap();

        let location = repo.write(10, &grid()).unwrap();
        assert!(location.ends_with("prescripts-10.bin"));
        assert!(temp_dir.path().join("harvest/prescripts-10.bin").exists());
        assert!(!temp_dir.path().join("harvest/prescripts-10.bin.tmp").exists());

        assert_eq!(repo.read(10).unwrap(), Some(grid()));
        assert_eq!(repo.read(20).unwrap(), None);
    }

    #[test]
    fn rejects_grid_with_wrong_cell_count() {
        let temp_dir = TempDir::new().unwrap();
        let template = MapNameTemplate::parse("map-{timestep}.bin").unwrap();
        let mut repo = FileRasterRepository::new(temp_dir.path(), template).unwrap();

        let broken = RasterGrid {
            dimensions: MapDimensions::new(3, 3),
            cells: CellBuffer::U8(vec![1]),
        };
        repo.write(5, &broken).unwrap();
        assert!(matches!(repo.read(5), Err(RepositoryError::CorruptedData(_))));
    }

    #[test]
    fn write_failure_is_surfaced() {
        let temp_dir = TempDir::new().unwrap();
        let template = MapNameTemplate::parse("blocked/map-{timestep}.bin").unwrap();
        let mut repo = FileRasterRepository::new(temp_dir.path(), template).unwrap();
        // a plain file where the output directory should be
        std::fs::write(temp_dir.path().join("blocked"), b"").unwrap();

        assert!(matches!(repo.write(1, &grid()), Err(RepositoryError::Io(_))));
    }
}
