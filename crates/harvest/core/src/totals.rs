//! Per-prescription running totals for one management-unit cycle.
//!
//! A fresh [`PrescriptionTotals`] is built for every unit cycle. Within the
//! cycle it only grows: the stand aggregator adds stand contributions and the
//! summary emitter clears a slot after the terminal pass of a repeat
//! sequence. The `reported` flags guard against flushing the same
//! prescription twice in one cycle.
use crate::error::{AccountingError, Result, check_species_len};
use crate::registry::IndexSpace;
use crate::types::PrescriptionId;

/// Quantities one stand adds to its prescription slot.
#[derive(Clone, Debug, PartialEq)]
pub struct StandContribution<'a> {
    pub sites: u32,
    pub damaged_sites: u32,
    pub cohorts_damaged: u32,
    pub cohorts_killed: u32,
    /// Mg.
    pub biomass_removed: f64,
    pub species_cohorts: &'a [u32],
    /// Mg per species.
    pub species_biomass: &'a [f64],
}

/// Read-only view of one prescription slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotTotals<'a> {
    pub sites: u32,
    pub damaged_sites: u32,
    pub cohorts_damaged: u32,
    pub cohorts_killed: u32,
    pub biomass_removed: f64,
    pub species_cohorts: &'a [u32],
    pub species_biomass: &'a [f64],
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrescriptionTotals {
    space: IndexSpace,
    sites: Vec<u32>,
    damaged_sites: Vec<u32>,
    cohorts_killed: Vec<u32>,
    cohorts_damaged: Vec<u32>,
    biomass_removed: Vec<f64>,
    species_cohorts: Vec<Vec<u32>>,
    species_biomass: Vec<Vec<f64>>,
    reported: Vec<bool>,
}

impl PrescriptionTotals {
    pub fn new(space: IndexSpace) -> Self {
        let p = space.prescriptions;
        let s = space.species;
        Self {
            space,
            sites: vec![0; p],
            damaged_sites: vec![0; p],
            cohorts_killed: vec![0; p],
            cohorts_damaged: vec![0; p],
            biomass_removed: vec![0.0; p],
            species_cohorts: vec![vec![0; s]; p],
            species_biomass: vec![vec![0.0; s]; p],
            reported: vec![false; p],
        }
    }

    /// Zeroes every array and `reported` flag, resizing to `space`.
    pub fn reset(&mut self, space: IndexSpace) {
        *self = Self::new(space);
    }

    pub fn index_space(&self) -> IndexSpace {
        self.space
    }

    pub(crate) fn accumulate(
        &mut self,
        prescription: PrescriptionId,
        contribution: &StandContribution<'_>,
    ) -> Result<()> {
        let p = self.check(prescription)?;
        check_species_len(self.space.species, contribution.species_cohorts.len())?;
        check_species_len(self.space.species, contribution.species_biomass.len())?;

        self.sites[p] = self.sites[p].saturating_add(contribution.sites);
        self.damaged_sites[p] = self.damaged_sites[p].saturating_add(contribution.damaged_sites);
        self.cohorts_damaged[p] =
            self.cohorts_damaged[p].saturating_add(contribution.cohorts_damaged);
        self.cohorts_killed[p] = self.cohorts_killed[p].saturating_add(contribution.cohorts_killed);
        self.biomass_removed[p] += contribution.biomass_removed;
        for (total, &count) in self.species_cohorts[p]
            .iter_mut()
            .zip(contribution.species_cohorts)
        {
            *total = total.saturating_add(count);
        }
        for (total, &mass) in self.species_biomass[p]
            .iter_mut()
            .zip(contribution.species_biomass)
        {
            *total += mass;
        }
        Ok(())
    }

    pub fn is_reported(&self, prescription: PrescriptionId) -> Result<bool> {
        let p = self.check(prescription)?;
        Ok(self.reported[p])
    }

    /// Flags the prescription as flushed for this cycle. The flag never
    /// returns to false before the next reset.
    pub fn mark_reported(&mut self, prescription: PrescriptionId) -> Result<()> {
        let p = self.check(prescription)?;
        self.reported[p] = true;
        Ok(())
    }

    pub fn slot(&self, prescription: PrescriptionId) -> Result<SlotTotals<'_>> {
        let p = self.check(prescription)?;
        Ok(SlotTotals {
            sites: self.sites[p],
            damaged_sites: self.damaged_sites[p],
            cohorts_damaged: self.cohorts_damaged[p],
            cohorts_killed: self.cohorts_killed[p],
            biomass_removed: self.biomass_removed[p],
            species_cohorts: &self.species_cohorts[p],
            species_biomass: &self.species_biomass[p],
        })
    }

    /// Zeroes the harvest quantities of a slot; `sites` stays until the next
    /// reset.
    pub(crate) fn clear_harvest(&mut self, prescription: PrescriptionId) -> Result<()> {
        let p = self.check(prescription)?;
        self.damaged_sites[p] = 0;
        self.biomass_removed[p] = 0.0;
        self.cohorts_damaged[p] = 0;
        self.cohorts_killed[p] = 0;
        self.species_cohorts[p].iter_mut().for_each(|c| *c = 0);
        self.species_biomass[p].iter_mut().for_each(|b| *b = 0.0);
        Ok(())
    }

    fn check(&self, prescription: PrescriptionId) -> Result<usize> {
        let index = prescription.index();
        if index < self.space.prescriptions {
            Ok(index)
        } else {
            Err(AccountingError::PrescriptionOutOfRange {
                prescription,
                count: self.space.prescriptions,
            })
        }
    }
}
