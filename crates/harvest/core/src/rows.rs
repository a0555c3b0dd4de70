//! Immutable rows written to the event and summary log tables.
use crate::registry::SpeciesRegistry;
use crate::types::Time;

/// Prescription label shown in the logs: the display name, suffixed with
/// `(n)` for repeat pass `n`.
pub fn pass_label(name: &str, repeat_number: u32) -> String {
    if repeat_number == 0 {
        name.to_string()
    } else {
        format!("{name}({repeat_number})")
    }
}

/// One stand-harvest occurrence.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventLogRow {
    pub time: Time,
    pub management_area: u32,
    pub prescription: String,
    pub stand: u32,
    pub event_id: u32,
    pub stand_age: u32,
    pub stand_rank: u32,
    pub number_of_sites: u32,
    pub harvested_sites: u32,
    pub biomass_removed_mg: f64,
    pub biomass_removed_per_damaged_ha: f64,
    pub cohorts_partial_harvest: u32,
    pub cohorts_complete_harvest: u32,
    pub species_cohorts_harvested: Vec<u32>,
    pub species_biomass_harvested_mg: Vec<f64>,
}

/// One prescription's activity in a management unit for the current cycle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummaryLogRow {
    pub time: Time,
    pub management_area: u32,
    pub prescription: String,
    pub harvested_sites: u32,
    pub total_biomass_harvested_mg: f64,
    pub cohorts_partial_harvest: u32,
    pub cohorts_complete_harvest: u32,
    pub species_cohorts_harvested: Vec<u32>,
    pub species_biomass_harvested_mg: Vec<f64>,
}

impl EventLogRow {
    const SCALAR_COLUMNS: [&'static str; 13] = [
        "Time",
        "ManagementArea",
        "Prescription",
        "Stand",
        "EventId",
        "StandAge",
        "StandRank",
        "NumberOfSites",
        "HarvestedSites",
        "MgBiomassRemoved",
        "MgBioRemovedPerDamagedHa",
        "TotalCohortsPartialHarvest",
        "TotalCohortsCompleteHarvest",
    ];

    /// Tabular column headers, species vectors expanded per species name.
    pub fn column_names(species: &SpeciesRegistry) -> Vec<String> {
        with_species_columns(&Self::SCALAR_COLUMNS, species)
    }
}

impl SummaryLogRow {
    const SCALAR_COLUMNS: [&'static str; 7] = [
        "Time",
        "ManagementArea",
        "Prescription",
        "HarvestedSites",
        "TotalBiomassHarvested",
        "TotalCohortsPartialHarvest",
        "TotalCohortsCompleteHarvest",
    ];

    pub fn column_names(species: &SpeciesRegistry) -> Vec<String> {
        with_species_columns(&Self::SCALAR_COLUMNS, species)
    }
}

fn with_species_columns(scalars: &[&str], species: &SpeciesRegistry) -> Vec<String> {
    let mut columns: Vec<String> = scalars.iter().map(|c| c.to_string()).collect();
    columns.extend(species.names().map(|n| format!("CohortsHarvested_{n}")));
    columns.extend(species.names().map(|n| format!("BiomassHarvestedMg_{n}")));
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_passes_are_suffixed() {
        assert_eq!(pass_label("Clearcut", 0), "Clearcut");
        assert_eq!(pass_label("Clearcut", 2), "Clearcut(2)");
    }

    #[test]
    fn species_columns_follow_scalars() {
        let species = SpeciesRegistry::new(["abiebals", "tiliamer"]);
        let columns = SummaryLogRow::column_names(&species);
        assert_eq!(columns.len(), 7 + 4);
        assert_eq!(columns[7], "CohortsHarvested_abiebals");
        assert_eq!(columns[10], "BiomassHarvestedMg_tiliamer");
        assert_eq!(EventLogRow::column_names(&species).len(), 13 + 4);
    }
}
