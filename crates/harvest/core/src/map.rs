//! Per-timestep rasters derived from the site delta collector.
//!
//! Prescription map codes:
//! - `0`: inactive site
//! - `1`: active site not harvested this timestep
//! - `n + 2`: harvested by prescription `n`
use crate::collector::SiteDeltaCollector;
use crate::config::AccountingConfig;
use crate::error::{AccountingError, Result};
use crate::landscape::{Landscape, MapDimensions};
use crate::types::PrescriptionId;

pub const INACTIVE_CODE: u16 = 0;
pub const UNHARVESTED_CODE: u16 = 1;
const FIRST_PRESCRIPTION_CODE: u16 = 2;

/// Cell storage, narrowed to the smallest type that holds every code.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellBuffer {
    U8(Vec<u8>),
    U16(Vec<u16>),
}

impl CellBuffer {
    pub fn len(&self) -> usize {
        match self {
            Self::U8(cells) => cells.len(),
            Self::U16(cells) => cells.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell values widened to `u16`, in traversal order.
    pub fn to_u16(&self) -> Vec<u16> {
        match self {
            Self::U8(cells) => cells.iter().map(|&c| u16::from(c)).collect(),
            Self::U16(cells) => cells.clone(),
        }
    }
}

/// A landscape-shaped grid of cell values.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RasterGrid {
    pub dimensions: MapDimensions,
    pub cells: CellBuffer,
}

pub fn prescription_code(prescription: Option<PrescriptionId>) -> u16 {
    match prescription {
        Some(rx) => rx.0 + FIRST_PRESCRIPTION_CODE,
        None => UNHARVESTED_CODE,
    }
}

/// Renders which prescription harvested each site this timestep.
pub fn render_prescription_map(
    landscape: &Landscape,
    collector: &SiteDeltaCollector,
    prescription_count: usize,
) -> Result<RasterGrid> {
    check_collector(landscape, collector)?;
    let codes = prescription_count + usize::from(FIRST_PRESCRIPTION_CODE);
    if codes > usize::from(u16::MAX) + 1 {
        return Err(AccountingError::TooManyPrescriptions {
            count: prescription_count,
            max: usize::from(u16::MAX) + 1 - usize::from(FIRST_PRESCRIPTION_CODE),
        });
    }

    let values = landscape
        .sites()
        .map(|(site, active)| {
            if !active {
                return Ok(INACTIVE_CODE);
            }
            match collector.last_prescription(site) {
                Some(prescription) if prescription.index() >= prescription_count => {
                    Err(AccountingError::PrescriptionOutOfRange {
                        prescription,
                        count: prescription_count,
                    })
                }
                last => Ok(prescription_code(last)),
            }
        })
        .collect::<Result<Vec<u16>>>()?;
    let cells = if codes <= usize::from(u8::MAX) + 1 {
        CellBuffer::U8(values.into_iter().map(|code| code as u8).collect())
    } else {
        CellBuffer::U16(values)
    };

    Ok(RasterGrid {
        dimensions: landscape.dimensions(),
        cells,
    })
}

/// Renders the biomass removed from each site this timestep, in whole Mg/ha.
pub fn render_biomass_map(
    landscape: &Landscape,
    collector: &SiteDeltaCollector,
) -> Result<RasterGrid> {
    check_collector(landscape, collector)?;
    let cells = landscape
        .sites()
        .map(|(site, active)| {
            if active {
                // saturating float-to-int cast
                (collector.density_removed(site) * AccountingConfig::DENSITY_TO_MG_PER_HA).round()
                    as u16
            } else {
                0
            }
        })
        .collect();

    Ok(RasterGrid {
        dimensions: landscape.dimensions(),
        cells: CellBuffer::U16(cells),
    })
}

fn check_collector(landscape: &Landscape, collector: &SiteDeltaCollector) -> Result<()> {
    if collector.site_count() == landscape.site_count() {
        Ok(())
    } else {
        Err(AccountingError::IndexSpaceMismatch {
            component: "site delta collector",
            expected: landscape.site_count(),
            actual: collector.site_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::SiteDelta;
    use crate::types::SiteId;

    fn harvested(collector: &mut SiteDeltaCollector, site: u32, rx: u16, density: f64) {
        collector
            .record(
                SiteId(site),
                PrescriptionId(rx),
                SiteDelta {
                    biomass_removed: vec![density],
                    cohorts_partially_damaged: 1,
                    cohorts_damaged: 1,
                },
            )
            .unwrap();
    }

    #[test]
    fn encodes_sentinels_and_prescriptions() {
        let landscape =
            Landscape::new(MapDimensions::new(2, 2), vec![false, true, true, true]).unwrap();
        let mut collector = SiteDeltaCollector::new(&landscape, 1);
        harvested(&mut collector, 2, 0, 10.0);
        harvested(&mut collector, 3, 2, 10.0);

        let grid = render_prescription_map(&landscape, &collector, 3).unwrap();
        assert_eq!(grid.cells, CellBuffer::U8(vec![0, 1, 2, 4]));
        assert_eq!(grid.dimensions, MapDimensions::new(2, 2));
    }

    #[test]
    fn widens_cells_when_codes_exceed_u8() {
        let landscape = Landscape::all_active(MapDimensions::new(1, 2));
        let mut collector = SiteDeltaCollector::new(&landscape, 1);
        harvested(&mut collector, 1, 299, 1.0);

        let grid = render_prescription_map(&landscape, &collector, 300).unwrap();
        assert_eq!(grid.cells, CellBuffer::U16(vec![1, 301]));
        assert!(render_prescription_map(&landscape, &collector, 70_000).is_err());
        // site 1 carries a prescription the run does not define
        assert!(render_prescription_map(&landscape, &collector, 10).is_err());
    }

    #[test]
    fn biomass_map_in_mg_per_ha() {
        let landscape = Landscape::new(MapDimensions::new(1, 3), vec![true, true, false]).unwrap();
        let mut collector = SiteDeltaCollector::new(&landscape, 1);
        harvested(&mut collector, 0, 0, 1250.0);

        let grid = render_biomass_map(&landscape, &collector).unwrap();
        assert_eq!(grid.cells.to_u16(), vec![13, 0, 0]);
    }

    #[test]
    fn rejects_collector_for_other_landscape() {
        let landscape = Landscape::all_active(MapDimensions::new(2, 2));
        let other = Landscape::all_active(MapDimensions::new(1, 2));
        let collector = SiteDeltaCollector::new(&other, 1);
        assert!(render_prescription_map(&landscape, &collector, 1).is_err());
    }
}
