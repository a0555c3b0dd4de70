//! Landscape grid shape and site activity mask.
use crate::error::{AccountingError, Result};
use crate::types::SiteId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapDimensions {
    pub rows: u32,
    pub columns: u32,
}

impl MapDimensions {
    pub const fn new(rows: u32, columns: u32) -> Self {
        Self { rows, columns }
    }

    pub const fn cell_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }
}

/// Grid of sites in row-major traversal order; only active sites carry
/// vegetation and can be harvested.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Landscape {
    dimensions: MapDimensions,
    active: Vec<bool>,
}

impl Landscape {
    pub fn new(dimensions: MapDimensions, active: Vec<bool>) -> Result<Self> {
        if active.len() != dimensions.cell_count() {
            return Err(AccountingError::LandscapeSizeMismatch {
                expected: dimensions.cell_count(),
                actual: active.len(),
            });
        }
        Ok(Self { dimensions, active })
    }

    /// Landscape where every site is active.
    pub fn all_active(dimensions: MapDimensions) -> Self {
        Self {
            dimensions,
            active: vec![true; dimensions.cell_count()],
        }
    }

    pub fn dimensions(&self) -> MapDimensions {
        self.dimensions
    }

    pub fn site_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, site: SiteId) -> bool {
        self.active.get(site.index()).copied().unwrap_or(false)
    }

    /// All sites with their activity flag, in traversal order.
    pub fn sites(&self) -> impl Iterator<Item = (SiteId, bool)> + '_ {
        self.active
            .iter()
            .enumerate()
            .map(|(index, &active)| (SiteId(index as u32), active))
    }

    pub fn check(&self, site: SiteId) -> Result<()> {
        if site.index() < self.site_count() {
            Ok(())
        } else {
            Err(AccountingError::SiteOutOfRange {
                site,
                count: self.site_count(),
            })
        }
    }
}
