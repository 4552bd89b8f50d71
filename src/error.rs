//! Error taxonomy for loading and analysing survey data

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, cleaning or aggregating a survey.
#[derive(Debug, Error)]
pub enum SurveyError {
    /// The input table could not be found.
    #[error("survey data not found at '{}'", path.display())]
    DataSourceNotFound { path: PathBuf },
    /// A required field failed type coercion; the whole load is rejected.
    #[error("malformed survey data: {0}")]
    DataFormat(String),
    /// An analysis needed a column the table does not have.
    #[error("required column '{0}' is missing")]
    MissingColumn(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("chart rendering failed: {0}")]
    Chart(String),
    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SurveyError {
    /// Whether the caller can carry on (show a message, omit a section)
    /// instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SurveyError::DataSourceNotFound { .. } | SurveyError::MissingColumn(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let not_found = SurveyError::DataSourceNotFound {
            path: PathBuf::from("missing.csv"),
        };
        assert!(not_found.is_recoverable());
        assert!(SurveyError::MissingColumn("factor_warranty".into()).is_recoverable());
        assert!(!SurveyError::DataFormat("age".into()).is_recoverable());
    }

    #[test]
    fn test_messages_name_the_problem() {
        let err = SurveyError::MissingColumn("promo_discount".into());
        assert_eq!(err.to_string(), "required column 'promo_discount' is missing");

        let err = SurveyError::DataSourceNotFound {
            path: PathBuf::from("data/survey.csv"),
        };
        assert!(err.to_string().contains("data/survey.csv"));
    }
}
