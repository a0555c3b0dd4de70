//! Stand and management-unit views handed over by the harvest-management host.
use crate::error::{AccountingError, Result};
use crate::types::{PrescriptionId, SiteId, SpeciesId, Time};

/// Cohorts damaged per species in one stand since the last clear.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageTable {
    cohorts: Vec<u32>,
}

impl DamageTable {
    pub fn new(species_count: usize) -> Self {
        Self {
            cohorts: vec![0; species_count],
        }
    }

    /// Adds `count` damaged cohorts of `species`.
    pub fn record(&mut self, species: SpeciesId, count: u32) -> Result<()> {
        let len = self.cohorts.len();
        let slot = self
            .cohorts
            .get_mut(species.index())
            .ok_or(AccountingError::SpeciesOutOfRange {
                species,
                count: len,
            })?;
        *slot = slot.saturating_add(count);
        Ok(())
    }

    pub fn get(&self, species: SpeciesId) -> u32 {
        self.cohorts.get(species.index()).copied().unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.cohorts
    }

    pub fn species_count(&self) -> usize {
        self.cohorts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cohorts.iter().all(|&count| count == 0)
    }

    /// Zeroes every entry, keeping the species dimension.
    pub fn clear(&mut self) {
        self.cohorts.iter_mut().for_each(|count| *count = 0);
    }
}

/// A stand as seen by the accounting layer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stand {
    pub map_code: u32,
    pub event_id: u32,
    pub age: u32,
    pub harvested_rank: u32,
    /// Active sites in the stand, in traversal order.
    pub sites: Vec<SiteId>,
    /// Prescription most recently applied to the stand.
    pub last_prescription: Option<PrescriptionId>,
    pub damage_table: DamageTable,
}

impl Stand {
    pub fn new(map_code: u32, sites: Vec<SiteId>, species_count: usize) -> Self {
        Self {
            map_code,
            event_id: 0,
            age: 0,
            harvested_rank: 0,
            sites,
            last_prescription: None,
            damage_table: DamageTable::new(species_count),
        }
    }

    pub fn site_count(&self) -> Result<u32> {
        u32::try_from(self.sites.len()).map_err(|_| AccountingError::StandTooLarge {
            stand: self.map_code,
            count: self.sites.len(),
        })
    }
}

/// A prescription applied to a management unit over a time window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AppliedPrescription {
    pub prescription: PrescriptionId,
    pub begin_time: Time,
    pub end_time: Time,
}

impl AppliedPrescription {
    pub const fn new(prescription: PrescriptionId, begin_time: Time, end_time: Time) -> Self {
        Self {
            prescription,
            begin_time,
            end_time,
        }
    }

    pub const fn has_begun(&self, time: Time) -> bool {
        self.begin_time <= time
    }

    pub const fn has_ended(&self, time: Time) -> bool {
        time > self.end_time
    }

    /// Begun and not yet past its end time.
    pub const fn is_active(&self, time: Time) -> bool {
        self.has_begun(time) && !self.has_ended(time)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ManagementUnit {
    pub map_code: u32,
    /// Applied prescriptions in the unit's iteration order.
    pub applied: Vec<AppliedPrescription>,
}

impl ManagementUnit {
    pub fn new(map_code: u32, applied: Vec<AppliedPrescription>) -> Self {
        Self { map_code, applied }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_table_clear_keeps_dimension() {
        let mut table = DamageTable::new(3);
        table.record(SpeciesId(2), 4).unwrap();
        table.record(SpeciesId(2), 1).unwrap();
        assert_eq!(table.get(SpeciesId(2)), 5);
        assert!(!table.is_empty());

        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.species_count(), 3);
        assert!(table.record(SpeciesId(3), 1).is_err());
    }

    #[test]
    fn prescription_window() {
        let applied = AppliedPrescription::new(PrescriptionId(0), 10, 20);
        assert!(!applied.has_begun(5));
        assert!(applied.has_begun(10));
        assert!(!applied.has_ended(20));
        assert!(applied.has_ended(21));
        assert!(!applied.is_active(5));
        assert!(applied.is_active(20));
        assert!(!applied.is_active(21));
    }

    #[test]
    fn damage_counts_saturate() {
        let mut table = DamageTable::new(1);
        table.record(SpeciesId(0), u32::MAX).unwrap();
        table.record(SpeciesId(0), 2).unwrap();
        assert_eq!(table.get(SpeciesId(0)), u32::MAX);
    }
}
