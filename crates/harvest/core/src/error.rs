//! Error infrastructure for harvest accounting.
//!
//! The accounting rules themselves never fail: every error here signals that
//! the collaborators handed over an inconsistent index space (vector lengths,
//! out-of-range identifiers) or an unusable configuration. Such input is
//! rejected before any total is touched rather than truncated.

use crate::types::{PrescriptionId, SiteId, SpeciesId};

/// Severity level of an error, used by the host to decide whether to abort.
///
/// - **Validation**: the caller handed over malformed input for one call
/// - **Fatal**: the run's configuration is unusable and no output can be trusted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Validation,
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Fatal => "fatal",
        }
    }
}

/// Errors raised while validating accounting input.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum AccountingError {
    /// A species-indexed vector does not match the registry size.
    #[error("species vector has length {actual}, expected {expected}")]
    SpeciesLengthMismatch { expected: usize, actual: usize },

    /// A species identifier lies outside `0..S`.
    #[error("{species} outside index space of {count} species")]
    SpeciesOutOfRange { species: SpeciesId, count: usize },

    /// A prescription identifier lies outside `0..P`.
    #[error("{prescription} outside index space of {count} prescriptions")]
    PrescriptionOutOfRange {
        prescription: PrescriptionId,
        count: usize,
    },

    /// A site identifier lies outside the landscape.
    #[error("{site} outside landscape of {count} sites")]
    SiteOutOfRange { site: SiteId, count: usize },

    /// The landscape activity mask does not cover the grid.
    #[error("landscape grid has {expected} cells but {actual} activity flags were supplied")]
    LandscapeSizeMismatch { expected: usize, actual: usize },

    /// An accounting component was built for a different landscape or registry.
    #[error("{component} sized for {actual} entries, expected {expected}")]
    IndexSpaceMismatch {
        component: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A stand was handed to the aggregator without an applied prescription.
    #[error("stand {stand} has no applied prescription")]
    StandNotHarvested { stand: u32 },

    /// A stand lists more sites than the row counters can hold.
    #[error("stand {stand} has {count} sites, more than a site counter can hold")]
    StandTooLarge { stand: u32, count: usize },

    /// A repeat-pass summary must name the prescription being repeated.
    #[error("repeat pass {repeat} requested without a prescription")]
    RepeatWithoutPrescription { repeat: u32 },

    /// Cell area must be a positive, finite number of hectares.
    #[error("cell area must be positive and finite, got {0}")]
    InvalidCellArea(f64),

    /// More prescriptions than the map cell type can encode.
    #[error("{count} prescriptions exceed the {max} codes a prescription map can hold")]
    TooManyPrescriptions { count: usize, max: usize },
}

impl AccountingError {
    pub fn severity(&self) -> ErrorSeverity {
        use AccountingError::*;
        match self {
            SpeciesLengthMismatch { .. }
            | SpeciesOutOfRange { .. }
            | PrescriptionOutOfRange { .. }
            | SiteOutOfRange { .. }
            | StandNotHarvested { .. }
            | StandTooLarge { .. }
            | RepeatWithoutPrescription { .. } => ErrorSeverity::Validation,
            LandscapeSizeMismatch { .. }
            | IndexSpaceMismatch { .. }
            | InvalidCellArea(_)
            | TooManyPrescriptions { .. } => ErrorSeverity::Fatal,
        }
    }
}

pub type Result<T> = core::result::Result<T, AccountingError>;

/// Rejects a species-indexed slice whose length differs from the registry.
pub(crate) fn check_species_len(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(AccountingError::SpeciesLengthMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_space_errors_are_fatal() {
        let err = AccountingError::IndexSpaceMismatch {
            component: "collector",
            expected: 4,
            actual: 3,
        };
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
        assert_eq!(err.to_string(), "collector sized for 3 entries, expected 4");
    }

    #[test]
    fn species_length_check() {
        assert!(check_species_len(3, 3).is_ok());
        assert_eq!(
            check_species_len(3, 2),
            Err(AccountingError::SpeciesLengthMismatch {
                expected: 3,
                actual: 2
            })
        );
    }
}
