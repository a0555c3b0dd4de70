//! Harvest reporting orchestrator.
//!
//! The reporter owns the log tables and raster stores. Accounting state is
//! never kept on the reporter itself: each management unit gets a
//! [`UnitCycle`] with its own freshly built [`PrescriptionTotals`], which is
//! dropped when the cycle finishes.

use harvest_core::{
    AccountingConfig, AccountingError, EventLogRow, HarvestContext, IndexSpace, Landscape,
    ManagementUnit, PrescriptionRegistry, PrescriptionTotals, SiteDeltaCollector,
    SpeciesRegistry, Stand, StandAggregator, SummaryEmitter, SummaryLogRow, SummaryRequest, Time,
    render_biomass_map, render_prescription_map,
};

use crate::config::ReportingConfig;
use crate::error::{ReportError, Result};
use crate::repository::{
    FileEventLog, FileRasterRepository, FileSummaryLog, LogRepository, RasterRepository,
};
use crate::template::MapNameTemplate;

/// Writes harvest event rows, summary rows and per-timestep maps.
pub struct HarvestReporter {
    accounting: AccountingConfig,
    species: SpeciesRegistry,
    prescriptions: PrescriptionRegistry,
    event_log: Box<dyn LogRepository<EventLogRow>>,
    summary_log: Box<dyn LogRepository<SummaryLogRow>>,
    prescription_maps: Box<dyn RasterRepository>,
    biomass_maps: Option<Box<dyn RasterRepository>>,
}

/// Counts of rows written during one management-unit cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnitReport {
    pub management_area: u32,
    pub stands: usize,
    pub summaries: usize,
}

impl HarvestReporter {
    pub fn builder() -> HarvestReporterBuilder {
        HarvestReporterBuilder::new()
    }

    pub fn index_space(&self) -> IndexSpace {
        IndexSpace::new(&self.species, &self.prescriptions)
    }

    pub fn species(&self) -> &SpeciesRegistry {
        &self.species
    }

    pub fn prescriptions(&self) -> &PrescriptionRegistry {
        &self.prescriptions
    }

    pub fn accounting(&self) -> &AccountingConfig {
        &self.accounting
    }

    /// Collector sized for `landscape` and this run's species.
    pub fn collector(&self, landscape: &Landscape) -> SiteDeltaCollector {
        SiteDeltaCollector::new(landscape, self.species.len())
    }

    /// Start processing one management unit at `time`.
    ///
    /// The returned cycle holds zeroed totals; nothing carries over from a
    /// previous unit or timestep.
    pub fn begin_unit<'r>(&'r mut self, time: Time, unit: &'r ManagementUnit) -> UnitCycle<'r> {
        let totals = PrescriptionTotals::new(self.index_space());
        tracing::debug!(unit = unit.map_code, time, "begin unit cycle");
        UnitCycle {
            context: HarvestContext::new(time, self.accounting.clone()),
            reporter: self,
            unit,
            totals,
            report: UnitReport {
                management_area: unit.map_code,
                ..UnitReport::default()
            },
        }
    }

    /// Render and write the timestep's maps. Call once after every unit of
    /// the timestep has been processed.
    pub fn write_maps(
        &mut self,
        time: Time,
        landscape: &Landscape,
        collector: &SiteDeltaCollector,
    ) -> Result<()> {
        let grid = render_prescription_map(landscape, collector, self.prescriptions.len())?;
        let location = self.prescription_maps.write(time, &grid)?;
        tracing::info!(time, %location, "wrote prescription map");

        if let Some(biomass_maps) = self.biomass_maps.as_mut() {
            let grid = render_biomass_map(landscape, collector)?;
            let location = biomass_maps.write(time, &grid)?;
            tracing::info!(time, %location, "wrote biomass removed map");
        }
        Ok(())
    }

    pub fn event_log(&self) -> &dyn LogRepository<EventLogRow> {
        self.event_log.as_ref()
    }

    pub fn summary_log(&self) -> &dyn LogRepository<SummaryLogRow> {
        self.summary_log.as_ref()
    }

    pub fn prescription_maps(&self) -> &dyn RasterRepository {
        self.prescription_maps.as_ref()
    }

    pub fn biomass_maps(&self) -> Option<&dyn RasterRepository> {
        self.biomass_maps.as_deref()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.event_log.flush()?;
        self.summary_log.flush()?;
        Ok(())
    }
}

/// One management unit's processing pass.
///
/// Stands and summary requests must arrive in the order the harvest host
/// processes them; rows are appended in call order.
pub struct UnitCycle<'r> {
    reporter: &'r mut HarvestReporter,
    unit: &'r ManagementUnit,
    context: HarvestContext,
    totals: PrescriptionTotals,
    report: UnitReport,
}

impl UnitCycle<'_> {
    /// Aggregate a harvested stand, append its event row and return it.
    pub fn report_stand(
        &mut self,
        stand: &mut Stand,
        collector: &mut SiteDeltaCollector,
        repeat_number: u32,
    ) -> Result<EventLogRow> {
        let aggregator = StandAggregator::new(&self.context, &self.reporter.prescriptions);
        let row = aggregator.aggregate(
            self.unit,
            stand,
            collector,
            &mut self.totals,
            repeat_number,
        )?;

        self.reporter.event_log.append(&row)?;
        self.report.stands += 1;
        Ok(row)
    }

    /// Emit summary rows for the unit's prescriptions after a harvest pass.
    pub fn report_summary(&mut self, request: SummaryRequest) -> Result<Vec<SummaryLogRow>> {
        let emitter = SummaryEmitter::new(&self.context, &self.reporter.prescriptions);
        let rows = emitter.emit(self.unit, &mut self.totals, request)?;

        for row in &rows {
            self.reporter.summary_log.append(row)?;
        }
        self.report.summaries += rows.len();
        Ok(rows)
    }

    pub fn totals(&self) -> &PrescriptionTotals {
        &self.totals
    }

    pub fn time(&self) -> Time {
        self.context.time
    }

    /// Close the cycle; its totals are discarded.
    pub fn finish(self) -> UnitReport {
        tracing::info!(
            unit = self.report.management_area,
            time = self.context.time,
            stands = self.report.stands,
            summaries = self.report.summaries,
            "finished unit cycle"
        );
        self.report
    }
}

/// Builder for [`HarvestReporter`].
///
/// Repositories not supplied explicitly are opened from the
/// [`ReportingConfig`] under its output directory.
pub struct HarvestReporterBuilder {
    config: ReportingConfig,
    accounting: Option<AccountingConfig>,
    species: Option<SpeciesRegistry>,
    prescriptions: Option<PrescriptionRegistry>,
    event_log: Option<Box<dyn LogRepository<EventLogRow>>>,
    summary_log: Option<Box<dyn LogRepository<SummaryLogRow>>>,
    prescription_maps: Option<Box<dyn RasterRepository>>,
    biomass_maps: Option<Box<dyn RasterRepository>>,
}

impl HarvestReporterBuilder {
    fn new() -> Self {
        Self {
            config: ReportingConfig::default(),
            accounting: None,
            species: None,
            prescriptions: None,
            event_log: None,
            summary_log: None,
            prescription_maps: None,
            biomass_maps: None,
        }
    }

    /// Override output configuration
    pub fn config(mut self, config: ReportingConfig) -> Self {
        self.config = config;
        self
    }

    /// Set cell area and unit conversion (required)
    pub fn accounting(mut self, accounting: AccountingConfig) -> Self {
        self.accounting = Some(accounting);
        self
    }

    /// Set the run's species registry (required)
    pub fn species(mut self, species: SpeciesRegistry) -> Self {
        self.species = Some(species);
        self
    }

    /// Set the run's prescription registry (required)
    pub fn prescriptions(mut self, prescriptions: PrescriptionRegistry) -> Self {
        self.prescriptions = Some(prescriptions);
        self
    }

    pub fn event_log(mut self, log: impl LogRepository<EventLogRow> + 'static) -> Self {
        self.event_log = Some(Box::new(log));
        self
    }

    pub fn summary_log(mut self, log: impl LogRepository<SummaryLogRow> + 'static) -> Self {
        self.summary_log = Some(Box::new(log));
        self
    }

    pub fn prescription_maps(mut self, maps: impl RasterRepository + 'static) -> Self {
        self.prescription_maps = Some(Box::new(maps));
        self
    }

    pub fn biomass_maps(mut self, maps: impl RasterRepository + 'static) -> Self {
        self.biomass_maps = Some(Box::new(maps));
        self
    }

    /// Build the reporter.
    ///
    /// Fails before any file is touched if a registry is missing or the
    /// prescription count cannot be encoded in a prescription map.
    pub fn build(self) -> Result<HarvestReporter> {
        let accounting = self
            .accounting
            .ok_or(ReportError::MissingComponent("an accounting config"))?;
        let species = self
            .species
            .ok_or(ReportError::MissingComponent("a species registry"))?;
        let prescriptions = self
            .prescriptions
            .ok_or(ReportError::MissingComponent("a prescription registry"))?;

        let max_prescriptions = usize::from(u16::MAX) - 1;
        if prescriptions.len() > max_prescriptions {
            return Err(AccountingError::TooManyPrescriptions {
                count: prescriptions.len(),
                max: max_prescriptions,
            }
            .into());
        }

        let config = self.config;
        let prescription_template = MapNameTemplate::parse(config.prescription_maps.as_str())?;
        let biomass_template = config
            .biomass_maps
            .as_deref()
            .map(|template| MapNameTemplate::parse(template))
            .transpose()?;

        let event_log: Box<dyn LogRepository<EventLogRow>> = match self.event_log {
            Some(log) => log,
            None => Box::new(FileEventLog::open_or_create(
                &config.output_dir,
                &config.event_log,
            )?),
        };
        let summary_log: Box<dyn LogRepository<SummaryLogRow>> = match self.summary_log {
            Some(log) => log,
            None => Box::new(FileSummaryLog::open_or_create(
                &config.output_dir,
                &config.summary_log,
            )?),
        };
        let prescription_maps: Box<dyn RasterRepository> = match self.prescription_maps {
            Some(maps) => maps,
            None => Box::new(FileRasterRepository::new(
                &config.output_dir,
                prescription_template,
            )?),
        };
        let biomass_maps: Option<Box<dyn RasterRepository>> =
            match (self.biomass_maps, biomass_template) {
                (Some(maps), _) => Some(maps),
                (None, Some(template)) => Some(Box::new(FileRasterRepository::new(
                    &config.output_dir,
                    template,
                )?)),
                (None, None) => None,
            };

        tracing::info!(
            species = species.len(),
            prescriptions = prescriptions.len(),
            cell_area = accounting.cell_area,
            event_log = event_log.name(),
            summary_log = summary_log.name(),
            "harvest reporter ready"
        );

        Ok(HarvestReporter {
            accounting,
            species,
            prescriptions,
            event_log,
            summary_log,
            prescription_maps,
            biomass_maps,
        })
    }
}
