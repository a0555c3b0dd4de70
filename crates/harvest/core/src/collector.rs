//! Per-site harvest deltas for the current timestep.
//!
//! The selection model records what it removed from each site; the stand
//! aggregator consumes each delta exactly once. The collector also remembers
//! which prescription last harvested a site and the biomass density removed
//! there, which is all the map writer needs.
use crate::error::{AccountingError, Result, check_species_len};
use crate::landscape::Landscape;
use crate::types::{PrescriptionId, SiteId};

/// Damage recorded at one active site during one harvest pass.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SiteDelta {
    /// Biomass removed per species, as an areal density (g/m²).
    pub biomass_removed: Vec<f64>,
    /// Cohorts that lost part of their biomass.
    pub cohorts_partially_damaged: u32,
    /// Cohorts damaged in any way, partially damaged ones included.
    pub cohorts_damaged: u32,
}

impl SiteDelta {
    pub fn empty(species_count: usize) -> Self {
        Self {
            biomass_removed: vec![0.0; species_count],
            cohorts_partially_damaged: 0,
            cohorts_damaged: 0,
        }
    }

    /// Cohorts removed outright.
    ///
    /// The damage model reports killed cohorts inside `cohorts_damaged`, so
    /// the killed count is the difference between the two tallies.
    pub fn cohorts_fully_killed(&self) -> u32 {
        if self.cohorts_damaged < self.cohorts_partially_damaged {
            tracing::warn!(
                damaged = self.cohorts_damaged,
                partial = self.cohorts_partially_damaged,
                "damaged cohort count is below partial count; treating killed as 0"
            );
        }
        self.cohorts_damaged
            .saturating_sub(self.cohorts_partially_damaged)
    }

    pub fn is_damaged(&self) -> bool {
        self.cohorts_partially_damaged != 0 || self.cohorts_fully_killed() != 0
    }

    /// Summed density over all species (g/m²).
    pub fn total_density(&self) -> f64 {
        self.biomass_removed.iter().sum()
    }

    fn merge(&mut self, other: &SiteDelta) {
        for (total, removed) in self.biomass_removed.iter_mut().zip(&other.biomass_removed) {
            *total += removed;
        }
        self.cohorts_partially_damaged = self
            .cohorts_partially_damaged
            .saturating_add(other.cohorts_partially_damaged);
        self.cohorts_damaged = self.cohorts_damaged.saturating_add(other.cohorts_damaged);
    }
}

/// Site-indexed store of pending deltas and timestep harvest markers.
#[derive(Clone, Debug)]
pub struct SiteDeltaCollector {
    species_count: usize,
    pending: Vec<Option<SiteDelta>>,
    prescriptions: Vec<Option<PrescriptionId>>,
    density_removed: Vec<f64>,
}

impl SiteDeltaCollector {
    pub fn new(landscape: &Landscape, species_count: usize) -> Self {
        let sites = landscape.site_count();
        Self {
            species_count,
            pending: vec![None; sites],
            prescriptions: vec![None; sites],
            density_removed: vec![0.0; sites],
        }
    }

    pub fn species_count(&self) -> usize {
        self.species_count
    }

    pub fn site_count(&self) -> usize {
        self.pending.len()
    }

    /// Clears every per-timestep marker. Called by the host before the first
    /// management unit of a timestep is harvested.
    pub fn begin_timestep(&mut self) {
        self.pending.iter_mut().for_each(|delta| *delta = None);
        self.prescriptions.iter_mut().for_each(|rx| *rx = None);
        self.density_removed.iter_mut().for_each(|d| *d = 0.0);
    }

    /// Records damage done to `site` by `prescription`.
    ///
    /// A second record for the same site before it is consumed is added to
    /// the pending delta.
    pub fn record(
        &mut self,
        site: SiteId,
        prescription: PrescriptionId,
        delta: SiteDelta,
    ) -> Result<()> {
        check_species_len(self.species_count, delta.biomass_removed.len())?;
        let index = self.check(site)?;

        self.prescriptions[index] = Some(prescription);
        self.density_removed[index] += delta.total_density();
        if let Some(existing) = self.pending[index].as_mut() {
            existing.merge(&delta);
        } else {
            self.pending[index] = Some(delta);
        }
        Ok(())
    }

    /// Removes and returns the pending delta of `site`, if any.
    pub fn take(&mut self, site: SiteId) -> Result<Option<SiteDelta>> {
        let index = self.check(site)?;
        Ok(self.pending[index].take())
    }

    pub fn pending(&self, site: SiteId) -> Option<&SiteDelta> {
        self.pending.get(site.index()).and_then(Option::as_ref)
    }

    /// Prescription that most recently harvested `site` this timestep.
    pub fn last_prescription(&self, site: SiteId) -> Option<PrescriptionId> {
        self.prescriptions.get(site.index()).copied().flatten()
    }

    /// Total biomass density removed from `site` this timestep (g/m²).
    pub fn density_removed(&self, site: SiteId) -> f64 {
        self.density_removed
            .get(site.index())
            .copied()
            .unwrap_or_default()
    }

    fn check(&self, site: SiteId) -> Result<usize> {
        let index = site.index();
        if index < self.pending.len() {
            Ok(index)
        } else {
            Err(AccountingError::SiteOutOfRange {
                site,
                count: self.pending.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landscape::MapDimensions;

    fn collector(sites: u32, species: usize) -> SiteDeltaCollector {
        let landscape = Landscape::all_active(MapDimensions::new(1, sites));
        SiteDeltaCollector::new(&landscape, species)
    }

    fn delta(biomass: &[f64], partial: u32, damaged: u32) -> SiteDelta {
        SiteDelta {
            biomass_removed: biomass.to_vec(),
            cohorts_partially_damaged: partial,
            cohorts_damaged: damaged,
        }
    }

    #[test]
    fn killed_is_damaged_minus_partial() {
        let d = delta(&[0.0], 2, 5);
        assert_eq!(d.cohorts_fully_killed(), 3);
        assert!(d.is_damaged());
        assert!(!SiteDelta::empty(1).is_damaged());
    }

    #[test]
    fn delta_is_consumed_once() {
        let mut collector = collector(2, 2);
        collector
            .record(SiteId(1), PrescriptionId(0), delta(&[10.0, 5.0], 1, 1))
            .unwrap();

        assert!(collector.take(SiteId(1)).unwrap().is_some());
        assert!(collector.take(SiteId(1)).unwrap().is_none());
        // map markers survive consumption
        assert_eq!(collector.last_prescription(SiteId(1)), Some(PrescriptionId(0)));
        assert_eq!(collector.density_removed(SiteId(1)), 15.0);
    }

    #[test]
    fn repeated_records_merge() {
        let mut collector = collector(1, 2);
        collector
            .record(SiteId(0), PrescriptionId(0), delta(&[10.0, 0.0], 1, 2))
            .unwrap();
        collector
            .record(SiteId(0), PrescriptionId(1), delta(&[5.0, 1.0], 0, 1))
            .unwrap();

        let merged = collector.pending(SiteId(0)).unwrap();
        assert_eq!(merged.biomass_removed, vec![15.0, 1.0]);
        assert_eq!(merged.cohorts_partially_damaged, 1);
        assert_eq!(merged.cohorts_damaged, 3);
        assert_eq!(collector.last_prescription(SiteId(0)), Some(PrescriptionId(1)));
    }

    #[test]
    fn merged_counts_saturate() {
        let mut collector = collector(1, 1);
        collector
            .record(SiteId(0), PrescriptionId(0), delta(&[1.0], 1, u32::MAX))
            .unwrap();
        collector
            .record(SiteId(0), PrescriptionId(0), delta(&[1.0], 1, 4))
            .unwrap();

        let merged = collector.pending(SiteId(0)).unwrap();
        assert_eq!(merged.cohorts_damaged, u32::MAX);
        assert_eq!(merged.cohorts_partially_damaged, 2);
    }

    #[test]
    fn rejects_inconsistent_species_vector() {
        let mut collector = collector(1, 3);
        let err = collector
            .record(SiteId(0), PrescriptionId(0), delta(&[1.0], 0, 1))
            .unwrap_err();
        assert_eq!(
            err,
            AccountingError::SpeciesLengthMismatch {
                expected: 3,
                actual: 1
            }
        );
        assert!(collector.record(SiteId(4), PrescriptionId(0), delta(&[0.0; 3], 0, 1)).is_err());
    }

    #[test]
    fn begin_timestep_clears_markers() {
        let mut collector = collector(1, 1);
        collector
            .record(SiteId(0), PrescriptionId(0), delta(&[3.0], 1, 1))
            .unwrap();
        collector.begin_timestep();
        assert_eq!(collector.last_prescription(SiteId(0)), None);
        assert_eq!(collector.density_removed(SiteId(0)), 0.0);
        assert!(collector.pending(SiteId(0)).is_none());
    }
}
