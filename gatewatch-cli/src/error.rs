//! CLI-specific error types and exit code mapping

use gatewatch_core::error::GatewatchError;
use gatewatch_pipeline::PipelineError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration or argument validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error (file read, output write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from the pipeline.
    #[error("{0}")]
    Core(#[from] GatewatchError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning               |
    /// |------|-----------------------|
    /// | 0    | Success               |
    /// | 1    | General / run error   |
    /// | 2    | Configuration error   |
    /// | 10   | IO error              |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Io(_) => 10,
            Self::Core(GatewatchError::Config(_)) => 2,
            Self::Core(GatewatchError::Io(_)) => 10,
            Self::Core(_) => 1,
        }
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Config { .. } => Self::Config(e.to_string()),
            other => Self::Core(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_exit_code() {
        let err = CliError::Config("bad attempts".to_owned());
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn io_error_exit_code() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(CliError::Io(io).exit_code(), 10);
    }

    #[test]
    fn pipeline_config_error_maps_to_config_code() {
        let err: CliError = PipelineError::Config {
            field: "attempts".to_owned(),
            reason: "must be 1-1000".to_owned(),
        }
        .into();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("attempts"));
    }

    #[test]
    fn pipeline_source_error_maps_to_general_code() {
        let err: CliError = PipelineError::Source {
            path: "input.gz".to_owned(),
            reason: "corrupt".to_owned(),
        }
        .into();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn pipeline_io_error_maps_to_io_code() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CliError = PipelineError::Io(io).into();
        assert_eq!(err.exit_code(), 10);
    }
}
