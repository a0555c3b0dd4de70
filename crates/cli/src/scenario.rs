//! JSON description of one timestep of harvest damage.
use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use harvest_core::{
    AccountingConfig, AppliedPrescription, Landscape, ManagementUnit, MapDimensions,
    PrescriptionId, PrescriptionRegistry, SiteDelta, SiteDeltaCollector, SiteId, SpeciesId,
    SpeciesRegistry, Stand, SummaryRequest, Time,
};
use reporting::{HarvestReporter, ReportingConfig};

#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub time: Time,
    /// Hectares per cell.
    pub cell_area: f64,
    pub species: Vec<String>,
    pub prescriptions: Vec<String>,
    pub landscape: LandscapeSpec,
    pub units: Vec<UnitSpec>,
}

#[derive(Debug, Deserialize)]
pub struct LandscapeSpec {
    pub rows: u32,
    pub columns: u32,
    #[serde(default)]
    pub inactive: Vec<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UnitSpec {
    pub map_code: u32,
    pub prescriptions: Vec<AppliedSpec>,
    /// Harvest passes in processing order: repeat passes first, then the
    /// initial pass.
    pub passes: Vec<PassSpec>,
}

#[derive(Debug, Deserialize)]
pub struct AppliedSpec {
    pub name: String,
    pub begin_time: Time,
    pub end_time: Time,
}

#[derive(Debug, Deserialize)]
pub struct PassSpec {
    #[serde(default)]
    pub repeat_number: u32,
    #[serde(default)]
    pub last_harvest: bool,
    /// Prescription whose sequence a repeat pass continues.
    #[serde(default)]
    pub prescription: Option<String>,
    pub stands: Vec<StandSpec>,
}

#[derive(Debug, Deserialize)]
pub struct StandSpec {
    pub map_code: u32,
    pub prescription: String,
    #[serde(default)]
    pub event_id: u32,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub rank: u32,
    pub sites: Vec<SiteSpec>,
}

#[derive(Debug, Deserialize)]
pub struct SiteSpec {
    pub site: u32,
    /// g/m² per species; omitted means nothing removed.
    #[serde(default)]
    pub biomass_removed: Vec<f64>,
    #[serde(default)]
    pub partial: u32,
    #[serde(default)]
    pub damaged: u32,
    /// Damaged cohorts per species, added to the stand's damage table.
    #[serde(default)]
    pub cohorts: Vec<u32>,
}

/// Row counts written by one replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub time: Time,
    pub units: usize,
    pub stands: usize,
    pub summaries: usize,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn run(&self, config: ReportingConfig) -> Result<RunSummary> {
        let species = SpeciesRegistry::new(self.species.iter().cloned());
        let prescriptions = PrescriptionRegistry::new(self.prescriptions.iter().cloned());
        let mut reporter = HarvestReporter::builder()
            .config(config)
            .accounting(AccountingConfig::new(self.cell_area)?)
            .species(species)
            .prescriptions(prescriptions)
            .build()?;

        let landscape = self.landscape()?;
        let mut collector = reporter.collector(&landscape);
        collector.begin_timestep();

        let mut summary = RunSummary {
            time: self.time,
            units: 0,
            stands: 0,
            summaries: 0,
        };

        for unit_spec in &self.units {
            let unit = ManagementUnit::new(
                unit_spec.map_code,
                unit_spec
                    .prescriptions
                    .iter()
                    .map(|applied| {
                        Ok(AppliedPrescription::new(
                            lookup(reporter.prescriptions(), &applied.name)?,
                            applied.begin_time,
                            applied.end_time,
                        ))
                    })
                    .collect::<Result<Vec<_>>>()?,
            );
            let species_count = reporter.species().len();
            let stand_prescriptions = unit_spec
                .passes
                .iter()
                .map(|pass| {
                    pass.stands
                        .iter()
                        .map(|stand| lookup(reporter.prescriptions(), &stand.prescription))
                        .collect::<Result<Vec<_>>>()
                })
                .collect::<Result<Vec<_>>>()?;
            let requests = unit_spec
                .passes
                .iter()
                .map(|pass| pass.summary_request(reporter.prescriptions()))
                .collect::<Result<Vec<_>>>()?;

            let mut cycle = reporter.begin_unit(self.time, &unit);
            let passes = unit_spec.passes.iter().zip(stand_prescriptions).zip(requests);
            for ((pass, rxs), request) in passes {
                for (spec, rx) in pass.stands.iter().zip(rxs) {
                    let mut stand = spec.record(rx, species_count, &mut collector)?;
                    cycle
                        .report_stand(&mut stand, &mut collector, pass.repeat_number)
                        .with_context(|| format!("stand {}", spec.map_code))?;
                }
                cycle.report_summary(request)?;
            }
            let report = cycle.finish();
            summary.units += 1;
            summary.stands += report.stands;
            summary.summaries += report.summaries;
        }

        reporter.write_maps(self.time, &landscape, &collector)?;
        reporter.flush()?;
        Ok(summary)
    }

    fn landscape(&self) -> Result<Landscape> {
        let dimensions = MapDimensions::new(self.landscape.rows, self.landscape.columns);
        let inactive: HashSet<u32> = self.landscape.inactive.iter().copied().collect();
        let active = (0..dimensions.cell_count() as u32)
            .map(|site| !inactive.contains(&site))
            .collect();
        let landscape = Landscape::new(dimensions, active)?;
        for &site in &self.landscape.inactive {
            landscape
                .check(SiteId(site))
                .context("inactive site list")?;
        }
        Ok(landscape)
    }
}

impl PassSpec {
    fn summary_request(&self, prescriptions: &PrescriptionRegistry) -> Result<SummaryRequest> {
        if self.repeat_number == 0 {
            return Ok(SummaryRequest::INITIAL);
        }
        let name = self.prescription.as_deref().ok_or_else(|| {
            anyhow!("repeat pass {} does not name its prescription", self.repeat_number)
        })?;
        Ok(SummaryRequest::repeat(
            lookup(prescriptions, name)?,
            self.repeat_number,
            self.last_harvest,
        ))
    }
}

impl StandSpec {
    /// Hands the stand's site damage to the collector, as the selection
    /// model would, and returns the stand ready for aggregation.
    fn record(
        &self,
        prescription: PrescriptionId,
        species_count: usize,
        collector: &mut SiteDeltaCollector,
    ) -> Result<Stand> {
        let sites = self.sites.iter().map(|s| SiteId(s.site)).collect();
        let mut stand = Stand::new(self.map_code, sites, species_count);
        stand.event_id = self.event_id;
        stand.age = self.age;
        stand.harvested_rank = self.rank;
        stand.last_prescription = Some(prescription);

        for site in &self.sites {
            let biomass_removed = if site.biomass_removed.is_empty() {
                vec![0.0; species_count]
            } else {
                site.biomass_removed.clone()
            };
            collector.record(
                SiteId(site.site),
                prescription,
                SiteDelta {
                    biomass_removed,
                    cohorts_partially_damaged: site.partial,
                    cohorts_damaged: site.damaged,
                },
            )?;
            for (index, &count) in site.cohorts.iter().enumerate() {
                stand.damage_table.record(SpeciesId(index as u16), count)?;
            }
        }
        Ok(stand)
    }
}

fn lookup(prescriptions: &PrescriptionRegistry, name: &str) -> Result<PrescriptionId> {
    prescriptions
        .find(name)
        .ok_or_else(|| anyhow!("unknown prescription '{name}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCENARIO: &str = r#"{
        "time": 10,
        "cell_area": 0.09,
        "species": ["abiebals", "acerrubr", "pinubank"],
        "prescriptions": ["Clearcut", "Thinning"],
        "landscape": { "rows": 2, "columns": 2, "inactive": [0] },
        "units": [
            {
                "map_code": 1,
                "prescriptions": [
                    { "name": "Clearcut", "begin_time": 0, "end_time": 50 },
                    { "name": "Thinning", "begin_time": 0, "end_time": 50 }
                ],
                "passes": [
                    {
                        "stands": [
                            {
                                "map_code": 7,
                                "prescription": "Thinning",
                                "sites": [
                                    {
                                        "site": 3,
                                        "biomass_removed": [100.0, 0.0, 50.0],
                                        "partial": 2,
                                        "damaged": 5,
                                        "cohorts": [2, 0, 3]
                                    }
                                ]
                            }
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn replays_scenario_into_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let scenario: Scenario = serde_json::from_str(SCENARIO).unwrap();

        let summary = scenario
            .run(ReportingConfig::new(temp_dir.path()))
            .unwrap();
        assert_eq!(
            summary,
            RunSummary {
                time: 10,
                units: 1,
                stands: 1,
                summaries: 1
            }
        );

        let events = std::fs::read_to_string(
            temp_dir.path().join(ReportingConfig::DEFAULT_EVENT_LOG),
        )
        .unwrap();
        assert!(events.contains("\"prescription\":\"Thinning\""));
        assert!(
            temp_dir
                .path()
                .join("harvest/biomass-harvest-prescripts-10.bin")
                .exists()
        );
    }

    #[test]
    fn unknown_prescription_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let text = SCENARIO.replace("\"prescription\": \"Thinning\"", "\"prescription\": \"Burn\"");
        let scenario: Scenario = serde_json::from_str(&text).unwrap();

        let err = scenario
            .run(ReportingConfig::new(temp_dir.path()))
            .unwrap_err();
        assert!(err.to_string().contains("Burn"));
    }

    #[test]
    fn repeat_pass_must_name_its_prescription() {
        let temp_dir = TempDir::new().unwrap();
        let text = SCENARIO.replace(
            "\"stands\": [",
            "\"repeat_number\": 1, \"last_harvest\": true, \"stands\": [",
        );
        let scenario: Scenario = serde_json::from_str(&text).unwrap();
        let err = scenario
            .run(ReportingConfig::new(temp_dir.path()))
            .unwrap_err();
        assert!(err.to_string().contains("repeat pass 1"));

        let named = text.replace(
            "\"repeat_number\": 1,",
            "\"repeat_number\": 1, \"prescription\": \"Thinning\",",
        );
        let scenario: Scenario = serde_json::from_str(&named).unwrap();
        let summary = scenario
            .run(ReportingConfig::new(temp_dir.path()))
            .unwrap();
        assert_eq!(summary.summaries, 1);
    }

    #[test]
    fn inactive_site_outside_grid_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let text = SCENARIO.replace("\"inactive\": [0]", "\"inactive\": [9]");
        let scenario: Scenario = serde_json::from_str(&text).unwrap();
        assert!(scenario.run(ReportingConfig::new(temp_dir.path())).is_err());
    }

    #[test]
    fn demo_scenario_replays() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/single-timestep.json");
        let scenario = Scenario::load(&path).unwrap();
        let temp_dir = TempDir::new().unwrap();

        let summary = scenario
            .run(ReportingConfig::new(temp_dir.path()))
            .unwrap();
        assert_eq!(summary.units, 2);
        assert_eq!(summary.stands, 3);
        assert_eq!(summary.summaries, 3);
    }
}
