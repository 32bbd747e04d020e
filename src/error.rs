use std::{error::Error, fmt};

use thiserror::Error as ThisError;

/// Problems with the submitted form. Messages are shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ValidationError {
    #[error("Please select a standard.")]
    MissingStandard,
    #[error("Please upload a bank ESG report (PDF).")]
    MissingFile,
    #[error("The uploaded file should be a PDF.")]
    InvalidFileType,
}

#[derive(Debug, ThisError)]
pub enum ExtractionError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{strategy} could not parse the document: {message}")]
    Parse {
        strategy: &'static str,
        message: String,
    },
    #[error("{strategy} panicked on a malformed document")]
    Panicked { strategy: &'static str },
    #[error("no extraction strategy could read the document")]
    AllStrategiesFailed(#[source] Box<ExtractionError>),
}

#[derive(Debug, ThisError)]
pub enum TableError {
    #[error("failed to open reference table {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse reference table: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug)]
pub enum AnalysisError {
    Validation(ValidationError),
    Extraction(ExtractionError),
    Storage(std::io::Error),
    Timeout(u64),
    Task(String),
}

impl AnalysisError {
    pub fn is_validation(&self) -> bool {
        matches!(self, AnalysisError::Validation(_))
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AnalysisError::*;
        match self {
            Validation(e) => write!(f, "{}", e),
            Extraction(e) => write!(f, "ExtractionError: {}", e),
            Storage(e) => write!(f, "StorageError: {}", e),
            Timeout(secs) => write!(f, "Timeout: analysis exceeded {}s", secs),
            Task(s) => write!(f, "TaskError: {}", s),
        }
    }
}

impl Error for AnalysisError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use AnalysisError::*;
        match self {
            Extraction(e) => e.source(),
            _ => None,
        }
    }
}

impl From<ValidationError> for AnalysisError {
    fn from(error: ValidationError) -> Self {
        AnalysisError::Validation(error)
    }
}

impl From<ExtractionError> for AnalysisError {
    fn from(error: ExtractionError) -> Self {
        AnalysisError::Extraction(error)
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(error: std::io::Error) -> Self {
        AnalysisError::Storage(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unpack_error;

    #[test]
    fn test_validation_messages_are_verbatim() {
        let err: AnalysisError = ValidationError::InvalidFileType.into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "The uploaded file should be a PDF.");
    }

    #[test]
    fn test_unpack_extraction_chain() {
        let inner = ExtractionError::Parse {
            strategy: "pdf-extract",
            message: "bad xref".to_string(),
        };
        let err: AnalysisError = ExtractionError::AllStrategiesFailed(Box::new(inner)).into();
        let unpacked = unpack_error(&err);
        assert!(unpacked.starts_with("ExtractionError: no extraction strategy"));
        assert!(unpacked.ends_with("pdf-extract could not parse the document: bad xref"));
    }

    #[test]
    fn test_unpack_storage_error_once() {
        let err: AnalysisError = std::io::Error::other("disk full").into();
        assert_eq!(unpack_error(&err), "StorageError: disk full");
    }
}
