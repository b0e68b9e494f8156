use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced to the caller of a conversion or validation run.
///
/// Each variant maps to a distinct process exit code so scripts can tell a
/// missing input apart from a crashed pipeline.
#[derive(Debug, Error)]
pub enum DevoError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Unsupported file type for {}. Provide a .csv or .icsv", .0.display())]
    UnsupportedExtension(PathBuf),
    #[error("Enrichment failed: {0:#}")]
    Enrichment(anyhow::Error),
    #[error("Validation failed: {0:#}")]
    Validation(anyhow::Error),
}

impl DevoError {
    pub fn exit_code(&self) -> i32 {
        match self {
            DevoError::NotFound(_) => 2,
            DevoError::Enrichment(_) => 3,
            DevoError::UnsupportedExtension(_) => 4,
            DevoError::Validation(_) => 5,
        }
    }
}

/// Resolves the exit code for any error bubbled up from [`crate::run`].
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<DevoError>()
        .map(DevoError::exit_code)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn exit_codes_follow_error_kind() {
        let missing: anyhow::Error = DevoError::NotFound(PathBuf::from("a.csv")).into();
        assert_eq!(exit_code_for(&missing), 2);
        let unsupported: anyhow::Error =
            DevoError::UnsupportedExtension(PathBuf::from("a.txt")).into();
        assert_eq!(exit_code_for(&unsupported), 4);
        let enrich: anyhow::Error = DevoError::Enrichment(anyhow!("boom")).into();
        assert_eq!(exit_code_for(&enrich), 3);
        assert_eq!(exit_code_for(&anyhow!("other")), 1);
    }

    #[test]
    fn messages_name_the_path() {
        let err = DevoError::NotFound(PathBuf::from("missing.csv"));
        assert!(err.to_string().contains("missing.csv"));
    }
}
