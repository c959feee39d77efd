//! CLI error types.

use spacegrid_lib::EngineError;
use spacegrid_shared::ConfigError;
use thiserror::Error;

/// Errors that can occur during CLI execution.
#[derive(Debug, Error)]
pub enum CliError {
    /// The configuration could not be loaded.
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    /// The engine could not be started or stopped responding.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// A script could not be parsed.
    #[error("Invalid script: {0}")]
    Script(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use spacegrid_lib::ActorError;

    use super::*;

    #[test]
    fn test_config_error_display() {
        let err: CliError = ConfigError::Invalid("rows must be at least 1".to_string()).into();
        let msg = err.to_string();
        assert!(msg.contains("configuration"));
        assert!(msg.contains("rows must be at least 1"));
    }

    #[test]
    fn test_engine_error_display() {
        let err: CliError = EngineError::from(ActorError::SendFailed).into();
        assert!(err.to_string().contains("channel closed"));
    }

    #[test]
    fn test_script_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("[").unwrap_err();
        let err: CliError = json_err.into();
        assert!(matches!(err, CliError::Script(_)));
        assert!(err.to_string().starts_with("Invalid script"));
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CliError = io_err.into();
        assert!(matches!(err, CliError::Io(_)));
    }
}
