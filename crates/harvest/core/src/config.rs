use crate::error::{AccountingError, Result};
use crate::types::Time;

/// Accounting constants and per-run parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccountingConfig {
    /// Area of one landscape cell in hectares.
    pub cell_area: f64,
}

impl AccountingConfig {
    /// Converts an areal biomass density in g/m² to Mg/ha.
    pub const DENSITY_TO_MG_PER_HA: f64 = 0.01;

    pub fn new(cell_area: f64) -> Result<Self> {
        if cell_area.is_finite() && cell_area > 0.0 {
            Ok(Self { cell_area })
        } else {
            Err(AccountingError::InvalidCellArea(cell_area))
        }
    }

    /// Absolute mass in Mg removed from one cell given a density in g/m².
    #[inline]
    pub fn density_to_mass(&self, density: f64) -> f64 {
        density * Self::DENSITY_TO_MG_PER_HA * self.cell_area
    }
}

/// Per-call inputs every accounting component needs from the host.
#[derive(Clone, Debug, PartialEq)]
pub struct HarvestContext {
    pub time: Time,
    pub config: AccountingConfig,
}

impl HarvestContext {
    pub fn new(time: Time, config: AccountingConfig) -> Self {
        Self { time, config }
    }

    #[inline]
    pub fn cell_area(&self) -> f64 {
        self.config.cell_area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_cell_area() {
        assert_eq!(
            AccountingConfig::new(0.0),
            Err(AccountingError::InvalidCellArea(0.0))
        );
        assert!(AccountingConfig::new(f64::NAN).is_err());
    }

    #[test]
    fn density_to_mass_uses_cell_area() {
        let config = AccountingConfig::new(0.09).unwrap();
        let mass = config.density_to_mass(150.0);
        assert!((mass - 0.135).abs() < 1e-12);
    }
}
