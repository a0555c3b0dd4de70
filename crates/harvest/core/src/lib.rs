//! Harvest accounting rules and data types shared by the reporting layer.
//!
//! `harvest-core` turns per-site harvest damage handed over by the selection
//! model into stand-level event rows, per-prescription running totals and
//! summary rows, and per-site map codes. It performs no I/O: persistence of
//! the rows and rasters lives in the `reporting` crate.
//!
//! Modules are organized by the order data flows through them:
//! - [`collector`] captures per-site deltas for the current timestep
//! - [`aggregate`] rolls a stand's sites into an [`EventLogRow`]
//! - [`totals`] holds the per-unit [`PrescriptionTotals`] accumulator
//! - [`summary`] flushes accumulator slots into [`SummaryLogRow`]s
//! - [`map`] renders the per-timestep prescription and biomass rasters
pub mod aggregate;
pub mod collector;
pub mod config;
pub mod error;
pub mod landscape;
pub mod map;
pub mod registry;
pub mod rows;
pub mod stand;
pub mod summary;
pub mod totals;
pub mod types;

pub use aggregate::StandAggregator;
pub use collector::{SiteDelta, SiteDeltaCollector};
pub use config::{AccountingConfig, HarvestContext};
pub use error::{AccountingError, ErrorSeverity, Result};
pub use landscape::{Landscape, MapDimensions};
pub use map::{CellBuffer, RasterGrid, render_biomass_map, render_prescription_map};
pub use registry::{IndexSpace, PrescriptionRegistry, SpeciesRegistry};
pub use rows::{EventLogRow, SummaryLogRow};
pub use stand::{AppliedPrescription, DamageTable, ManagementUnit, Stand};
pub use summary::{SummaryEmitter, SummaryRequest};
pub use totals::{PrescriptionTotals, SlotTotals, StandContribution};
pub use types::{PrescriptionId, SiteId, SpeciesId, Time};
