//! Summary log emission from the per-unit accumulator.
use crate::config::HarvestContext;
use crate::error::{AccountingError, Result};
use crate::registry::PrescriptionRegistry;
use crate::rows::{SummaryLogRow, pass_label};
use crate::stand::{AppliedPrescription, ManagementUnit};
use crate::totals::PrescriptionTotals;
use crate::types::{PrescriptionId, Time};

/// Describes the harvest pass a summary request follows.
///
/// An initial pass reports every active prescription of the unit. A repeat
/// pass belongs to one prescription's sequence, so it names that
/// prescription and only its slot is reported or cleared. `last_harvest`
/// comes from the harvest-management host: it marks the terminal pass of a
/// repeat sequence and is taken as given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SummaryRequest {
    pub prescription: Option<PrescriptionId>,
    pub repeat_number: u32,
    pub last_harvest: bool,
}

impl SummaryRequest {
    pub const INITIAL: Self = Self {
        prescription: None,
        repeat_number: 0,
        last_harvest: false,
    };

    pub const fn repeat(
        prescription: PrescriptionId,
        repeat_number: u32,
        last_harvest: bool,
    ) -> Self {
        Self {
            prescription: Some(prescription),
            repeat_number,
            last_harvest,
        }
    }

    /// Whether `applied` takes part in this request at `time`.
    fn selects(&self, applied: &AppliedPrescription, time: Time) -> bool {
        match self.prescription {
            Some(rx) if rx != applied.prescription => false,
            _ if self.repeat_number == 0 => applied.is_active(time),
            _ => applied.has_begun(time),
        }
    }
}

pub struct SummaryEmitter<'a> {
    context: &'a HarvestContext,
    prescriptions: &'a PrescriptionRegistry,
}

impl<'a> SummaryEmitter<'a> {
    pub fn new(context: &'a HarvestContext, prescriptions: &'a PrescriptionRegistry) -> Self {
        Self {
            context,
            prescriptions,
        }
    }

    /// Flushes the selected prescriptions of `unit` that have harvested sites
    /// and have not been reported in this cycle.
    ///
    /// An initial pass selects every prescription still active at `time`; a
    /// repeat pass selects only its own prescription, even past its end
    /// time. Rows come out in the unit's applied-prescription order. A
    /// prescription is marked reported after an initial pass, or after the
    /// last pass of a repeat sequence once its end time has gone by; earlier
    /// repeat passes leave the flag open so the initial pass of the same
    /// cycle still gets its own row. On a last-harvest request the emitted
    /// slot's harvest quantities are cleared.
    pub fn emit(
        &self,
        unit: &ManagementUnit,
        totals: &mut PrescriptionTotals,
        request: SummaryRequest,
    ) -> Result<Vec<SummaryLogRow>> {
        if request.repeat_number > 0 && request.prescription.is_none() {
            return Err(AccountingError::RepeatWithoutPrescription {
                repeat: request.repeat_number,
            });
        }
        let time = self.context.time;
        let mut rows = Vec::new();

        for applied in unit.applied.iter().filter(|a| request.selects(a, time)) {
            let prescription = applied.prescription;
            let slot = totals.slot(prescription)?;
            if slot.sites == 0 || totals.is_reported(prescription)? {
                continue;
            }

            let name = self.prescriptions.name(prescription)?;
            rows.push(SummaryLogRow {
                time,
                management_area: unit.map_code,
                prescription: pass_label(name, request.repeat_number),
                harvested_sites: slot.damaged_sites,
                total_biomass_harvested_mg: slot.biomass_removed,
                cohorts_partial_harvest: slot.cohorts_damaged,
                cohorts_complete_harvest: slot.cohorts_killed,
                species_cohorts_harvested: slot.species_cohorts.to_vec(),
                species_biomass_harvested_mg: slot.species_biomass.to_vec(),
            });

            if request.repeat_number == 0 || (applied.has_ended(time) && request.last_harvest) {
                totals.mark_reported(prescription)?;
            }
            if request.last_harvest {
                totals.clear_harvest(prescription)?;
            }
        }

        tracing::debug!(
            unit = unit.map_code,
            repeat = request.repeat_number,
            rows = rows.len(),
            "emitted summaries"
        );
        Ok(rows)
    }
}
