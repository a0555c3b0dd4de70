//! Unified error type surfaced by the reporting API.
//!
//! Wraps accounting validation failures and repository I/O so the host can
//! bubble them up with consistent context. Nothing is retried here.
use thiserror::Error;

use harvest_core::{AccountingError, ErrorSeverity};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Accounting(#[from] AccountingError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("reporter requires {0} to be configured before building")]
    MissingComponent(&'static str),
}

impl ReportError {
    /// Accounting failures keep their own classification; storage and wiring
    /// failures leave no trustworthy output.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Accounting(err) => err.severity(),
            Self::Repository(_) | Self::MissingComponent(_) => ErrorSeverity::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_follows_the_failing_layer() {
        let validation = ReportError::from(AccountingError::StandNotHarvested { stand: 3 });
        assert_eq!(validation.severity(), ErrorSeverity::Validation);

        let io = ReportError::from(RepositoryError::Io(std::io::Error::other("disk full")));
        assert_eq!(io.severity(), ErrorSeverity::Fatal);
        assert_eq!(
            ReportError::MissingComponent("a summary log").severity(),
            ErrorSeverity::Fatal
        );
    }
}
