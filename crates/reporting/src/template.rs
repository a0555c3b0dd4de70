//! Output file naming for per-timestep rasters.
use std::fmt;

use harvest_core::Time;

use crate::repository::{RepositoryError, Result};

/// File name template with a `{timestep}` placeholder, e.g.
/// `harvest/prescripts-{timestep}.bin`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapNameTemplate {
    template: String,
}

impl MapNameTemplate {
    pub const PLACEHOLDER: &'static str = "{timestep}";

    pub fn parse(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains(Self::PLACEHOLDER) {
            return Err(RepositoryError::InvalidTemplate(format!(
                "'{template}' has no {} placeholder",
                Self::PLACEHOLDER
            )));
        }
        if template.trim().is_empty() || template.ends_with('/') {
            return Err(RepositoryError::InvalidTemplate(format!(
                "'{template}' does not name a file"
            )));
        }
        Ok(Self { template })
    }

    pub fn render(&self, timestep: Time) -> String {
        self.template.replace(Self::PLACEHOLDER, &timestep.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

impl fmt::Display for MapNameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
