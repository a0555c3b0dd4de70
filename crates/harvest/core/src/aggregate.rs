//! Stand-level roll-up of site deltas into event log rows.
use crate::collector::SiteDeltaCollector;
use crate::config::HarvestContext;
use crate::error::{AccountingError, Result, check_species_len};
use crate::registry::PrescriptionRegistry;
use crate::rows::{EventLogRow, pass_label};
use crate::stand::{ManagementUnit, Stand};
use crate::totals::{PrescriptionTotals, StandContribution};

/// Converts one harvested stand into an [`EventLogRow`] and adds its
/// quantities to the unit's [`PrescriptionTotals`].
pub struct StandAggregator<'a> {
    context: &'a HarvestContext,
    prescriptions: &'a PrescriptionRegistry,
}

impl<'a> StandAggregator<'a> {
    pub fn new(context: &'a HarvestContext, prescriptions: &'a PrescriptionRegistry) -> Self {
        Self {
            context,
            prescriptions,
        }
    }

    /// Sweeps the stand's active sites once, consuming their pending deltas.
    ///
    /// `repeat_number` is 0 for the initial harvest and `n` for the n-th
    /// repeat pass. The stand's damage table is cleared whatever the outcome
    /// of the sweep; input that does not fit the index space is rejected
    /// before anything is consumed.
    pub fn aggregate(
        &self,
        unit: &ManagementUnit,
        stand: &mut Stand,
        collector: &mut SiteDeltaCollector,
        totals: &mut PrescriptionTotals,
        repeat_number: u32,
    ) -> Result<EventLogRow> {
        let prescription = stand
            .last_prescription
            .ok_or(AccountingError::StandNotHarvested {
                stand: stand.map_code,
            })?;
        let name = self.prescriptions.name(prescription)?;
        let species_count = totals.index_space().species;
        check_species_len(species_count, stand.damage_table.species_count())?;
        check_species_len(species_count, collector.species_count())?;
        let site_count = stand.site_count()?;
        for &site in &stand.sites {
            if site.index() >= collector.site_count() {
                return Err(AccountingError::SiteOutOfRange {
                    site,
                    count: collector.site_count(),
                });
            }
        }

        let config = &self.context.config;
        let mut damaged_sites = 0u32;
        let mut cohorts_partial = 0u32;
        let mut cohorts_killed = 0u32;
        let mut biomass_removed = 0.0;
        let mut species_biomass = vec![0.0; species_count];

        for &site in &stand.sites {
            let Some(delta) = collector.take(site)? else {
                continue;
            };
            if !delta.is_damaged() {
                continue;
            }
            damaged_sites += 1;
            cohorts_partial = cohorts_partial.saturating_add(delta.cohorts_partially_damaged);
            cohorts_killed = cohorts_killed.saturating_add(delta.cohorts_fully_killed());
            for (total, &density) in species_biomass.iter_mut().zip(&delta.biomass_removed) {
                let mass = config.density_to_mass(density);
                *total += mass;
                biomass_removed += mass;
            }
        }

        let species_cohorts = stand.damage_table.as_slice().to_vec();
        totals.accumulate(
            prescription,
            &StandContribution {
                sites: site_count,
                damaged_sites,
                cohorts_damaged: cohorts_partial,
                cohorts_killed,
                biomass_removed,
                species_cohorts: &species_cohorts,
                species_biomass: &species_biomass,
            },
        )?;

        let biomass_removed_per_damaged_ha = if biomass_removed > 0.0 && damaged_sites > 0 {
            biomass_removed / damaged_sites as f64 / self.context.cell_area()
        } else {
            0.0
        };

        let row = EventLogRow {
            time: self.context.time,
            management_area: unit.map_code,
            prescription: pass_label(name, repeat_number),
            stand: stand.map_code,
            event_id: stand.event_id,
            stand_age: stand.age,
            stand_rank: stand.harvested_rank,
            number_of_sites: site_count,
            harvested_sites: damaged_sites,
            biomass_removed_mg: biomass_removed,
            biomass_removed_per_damaged_ha,
            cohorts_partial_harvest: cohorts_partial,
            cohorts_complete_harvest: cohorts_killed,
            species_cohorts_harvested: species_cohorts,
            species_biomass_harvested_mg: species_biomass,
        };

        stand.damage_table.clear();

        tracing::debug!(
            stand = stand.map_code,
            prescription = %row.prescription,
            damaged_sites,
            biomass_removed,
            "aggregated stand"
        );

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::SiteDelta;
    use crate::config::AccountingConfig;
    use crate::landscape::{Landscape, MapDimensions};
    use crate::registry::IndexSpace;
    use crate::stand::AppliedPrescription;
    use crate::types::{PrescriptionId, SiteId, SpeciesId};

    const SPACE: IndexSpace = IndexSpace {
        species: 3,
        prescriptions: 2,
    };

    struct Fixture {
        context: HarvestContext,
        prescriptions: PrescriptionRegistry,
        unit: ManagementUnit,
        collector: SiteDeltaCollector,
        totals: PrescriptionTotals,
    }

    fn fixture(sites: u32) -> Fixture {
        let landscape = Landscape::all_active(MapDimensions::new(1, sites));
        Fixture {
            context: HarvestContext::new(10, AccountingConfig::new(0.09).unwrap()),
            prescriptions: PrescriptionRegistry::new(["Clearcut", "Shelterwood"]),
            unit: ManagementUnit::new(
                7,
                vec![AppliedPrescription::new(PrescriptionId(0), 0, 100)],
            ),
            collector: SiteDeltaCollector::new(&landscape, SPACE.species),
            totals: PrescriptionTotals::new(SPACE),
        }
    }

    fn harvested_stand(sites: Vec<SiteId>) -> Stand {
        let mut stand = Stand::new(3, sites, SPACE.species);
        stand.last_prescription = Some(PrescriptionId(0));
        stand.event_id = 11;
        stand.age = 80;
        stand.harvested_rank = 1;
        stand
    }

    #[test]
    fn single_damaged_site() {
        let mut f = fixture(1);
        f.collector
            .record(
                SiteId(0),
                PrescriptionId(0),
                SiteDelta {
                    biomass_removed: vec![100.0, 0.0, 50.0],
                    cohorts_partially_damaged: 2,
                    cohorts_damaged: 5,
                },
            )
            .unwrap();
        let mut stand = harvested_stand(vec![SiteId(0)]);
        stand.damage_table.record(SpeciesId(0), 4).unwrap();
        stand.damage_table.record(SpeciesId(2), 1).unwrap();

        let aggregator = StandAggregator::new(&f.context, &f.prescriptions);
        let row = aggregator
            .aggregate(&f.unit, &mut stand, &mut f.collector, &mut f.totals, 0)
            .unwrap();

        assert_eq!(row.prescription, "Clearcut");
        assert_eq!(row.management_area, 7);
        assert_eq!(row.harvested_sites, 1);
        assert_eq!(row.cohorts_partial_harvest, 2);
        assert_eq!(row.cohorts_complete_harvest, 3);
        assert!((row.biomass_removed_mg - 0.135).abs() < 1e-12);
        assert!((row.biomass_removed_per_damaged_ha - 1.5).abs() < 1e-9);
        assert_eq!(row.species_cohorts_harvested, vec![4, 0, 1]);
        assert!((row.species_biomass_harvested_mg[0] - 0.09).abs() < 1e-12);
        assert!(stand.damage_table.is_empty());

        let slot = f.totals.slot(PrescriptionId(0)).unwrap();
        assert_eq!(slot.sites, 1);
        assert_eq!(slot.damaged_sites, 1);
        assert_eq!(slot.cohorts_damaged, 2);
        assert_eq!(slot.cohorts_killed, 3);
        assert_eq!(slot.species_cohorts, &[4, 0, 1]);
    }

    #[test]
    fn stand_without_damage_yields_zero_row() {
        let mut f = fixture(2);
        let mut stand = harvested_stand(vec![SiteId(0), SiteId(1)]);
        stand.damage_table.record(SpeciesId(1), 2).unwrap();

        let aggregator = StandAggregator::new(&f.context, &f.prescriptions);
        let row = aggregator
            .aggregate(&f.unit, &mut stand, &mut f.collector, &mut f.totals, 3)
            .unwrap();

        assert_eq!(row.prescription, "Clearcut(3)");
        assert_eq!(row.number_of_sites, 2);
        assert_eq!(row.harvested_sites, 0);
        assert_eq!(row.biomass_removed_mg, 0.0);
        assert_eq!(row.biomass_removed_per_damaged_ha, 0.0);
        assert!(stand.damage_table.is_empty());

        // a second sweep over the cleared stand changes nothing derived
        let again = aggregator
            .aggregate(&f.unit, &mut stand, &mut f.collector, &mut f.totals, 3)
            .unwrap();
        assert_eq!(again.species_cohorts_harvested, vec![0, 0, 0]);
        assert_eq!(again.cohorts_partial_harvest + again.cohorts_complete_harvest, 0);
        assert!(stand.damage_table.is_empty());
    }

    #[test]
    fn undamaged_site_biomass_is_ignored() {
        let mut f = fixture(1);
        f.collector
            .record(
                SiteId(0),
                PrescriptionId(0),
                SiteDelta {
                    biomass_removed: vec![40.0, 0.0, 0.0],
                    cohorts_partially_damaged: 0,
                    cohorts_damaged: 0,
                },
            )
            .unwrap();
        let mut stand = harvested_stand(vec![SiteId(0)]);

        let row = StandAggregator::new(&f.context, &f.prescriptions)
            .aggregate(&f.unit, &mut stand, &mut f.collector, &mut f.totals, 0)
            .unwrap();
        assert_eq!(row.harvested_sites, 0);
        assert_eq!(row.biomass_removed_mg, 0.0);
        assert_eq!(row.biomass_removed_per_damaged_ha, 0.0);
    }

    #[test]
    fn rejects_stand_without_prescription() {
        let mut f = fixture(1);
        let mut stand = Stand::new(9, vec![SiteId(0)], SPACE.species);
        stand.damage_table.record(SpeciesId(0), 1).unwrap();

        let err = StandAggregator::new(&f.context, &f.prescriptions)
            .aggregate(&f.unit, &mut stand, &mut f.collector, &mut f.totals, 0)
            .unwrap_err();
        assert_eq!(err, AccountingError::StandNotHarvested { stand: 9 });
        assert!(!stand.damage_table.is_empty());
    }

    #[test]
    fn rejects_mismatched_damage_table() {
        let mut f = fixture(1);
        let mut stand = harvested_stand(vec![SiteId(0)]);
        stand.damage_table = crate::stand::DamageTable::new(2);

        let err = StandAggregator::new(&f.context, &f.prescriptions)
            .aggregate(&f.unit, &mut stand, &mut f.collector, &mut f.totals, 0)
            .unwrap_err();
        assert_eq!(
            err,
            AccountingError::SpeciesLengthMismatch {
                expected: 3,
                actual: 2
            }
        );
    }
}
