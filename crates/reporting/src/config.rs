//! Reporting output configuration and loaders.
use std::env;
use std::path::PathBuf;

/// Where and under which names the reporter writes its output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportingConfig {
    pub output_dir: PathBuf,
    pub event_log: String,
    pub summary_log: String,
    /// Prescription map name template; must contain `{timestep}`.
    pub prescription_maps: String,
    /// Biomass-removed map name template; no biomass maps when unset.
    pub biomass_maps: Option<String>,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            event_log: Self::DEFAULT_EVENT_LOG.to_string(),
            summary_log: Self::DEFAULT_SUMMARY_LOG.to_string(),
            prescription_maps: Self::DEFAULT_PRESCRIPTION_MAPS.to_string(),
            biomass_maps: None,
        }
    }
}

impl ReportingConfig {
    pub const DEFAULT_EVENT_LOG: &'static str = "biomass-harvest-event-log.jsonl";
    pub const DEFAULT_SUMMARY_LOG: &'static str = "biomass-harvest-summary-log.jsonl";
    pub const DEFAULT_PRESCRIPTION_MAPS: &'static str =
        "harvest/biomass-harvest-prescripts-{timestep}.bin";

    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `HARVEST_OUTPUT_DIR` - Directory receiving logs and maps (default: `.`)
    /// - `HARVEST_EVENT_LOG` - Event log file name
    /// - `HARVEST_SUMMARY_LOG` - Summary log file name
    /// - `HARVEST_PRESCRIPTION_MAPS` - Prescription map name template
    /// - `HARVEST_BIOMASS_MAPS` - Biomass map name template (optional)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = read_env::<PathBuf>("HARVEST_OUTPUT_DIR") {
            config.output_dir = dir;
        }
        if let Some(name) = read_env::<String>("HARVEST_EVENT_LOG") {
            config.event_log = name;
        }
        if let Some(name) = read_env::<String>("HARVEST_SUMMARY_LOG") {
            config.summary_log = name;
        }
        if let Some(template) = read_env::<String>("HARVEST_PRESCRIPTION_MAPS") {
            config.prescription_maps = template;
        }
        config.biomass_maps = read_env::<String>("HARVEST_BIOMASS_MAPS");

        config
    }

    pub fn with_biomass_maps(mut self, template: impl Into<String>) -> Self {
        self.biomass_maps = Some(template.into());
        self
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())?
        .parse()
        .ok()
}
