//! Spacegrid - a multi-display space (virtual desktop) engine.
//!
//! The engine tracks, per display, a grid of spaces and the windows assigned
//! to them, applies mutations one at a time on a dedicated engine thread and
//! notifies a single subscriber per event kind. It is exposed to Rust through
//! [`EngineHandle`] and to C through the `tsapi_*` functions in [`abi`].

pub mod abi;
pub mod actor;
pub mod constants;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod state;

use std::path::Path;
use std::sync::OnceLock;

pub use actor::{ActorError, Command, EngineActor, EngineHandle, Outcome};
pub use dispatch::{Dispatcher, EventKind};
pub use engine::{SpaceEngine, SpaceReader};
pub use error::{EngineError, SpaceError, SpaceResult};
use spacegrid_shared::{ConfigError, EngineConfig, load_config, load_config_from_path};
pub use state::{
    AppBinding, Display, Rect, Space, SpaceChange, SpaceKind, SpaceState, WindowEntry, WindowInfo,
};

/// Process-wide engine, started once.
static ENGINE: OnceLock<EngineHandle> = OnceLock::new();

/// Starts the process-wide engine with `config`.
///
/// Idempotent: once an engine is running, later calls return it and ignore
/// their configuration.
///
/// # Errors
///
/// Returns an error if the configuration is inconsistent or the engine thread
/// cannot be started.
pub fn init(config: EngineConfig) -> Result<&'static EngineHandle, EngineError> {
    if let Some(handle) = ENGINE.get() {
        return Ok(handle);
    }

    let handle = EngineActor::spawn(config)?;
    if let Err(extra) = ENGINE.set(handle) {
        tracing::debug!("spacegrid: engine already started, stopping duplicate");
        if extra.shutdown().is_err() {
            tracing::trace!("spacegrid: duplicate engine already stopped");
        }
    }
    ENGINE.get().ok_or_else(|| ActorError::SendFailed.into())
}

/// Starts the process-wide engine from a configuration file.
///
/// With `None` the default locations are searched. A missing file means
/// default configuration.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or is invalid, or
/// any error from [`init`].
pub fn init_from_path(path: Option<&Path>) -> Result<&'static EngineHandle, EngineError> {
    if let Some(handle) = ENGINE.get() {
        return Ok(handle);
    }
    init(load_engine_config(path)?)
}

/// Returns the process-wide engine, starting it from the default
/// configuration locations if needed.
///
/// Returns `None` if the engine cannot be started.
pub fn get_handle() -> Option<&'static EngineHandle> {
    if let Some(handle) = ENGINE.get() {
        return Some(handle);
    }
    match init_from_path(None) {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::error!(error = %err, "spacegrid: failed to start engine");
            None
        }
    }
}

/// Loads engine configuration from `path`, or from the default locations
/// when `path` is `None`. A missing file yields the default configuration.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, parsed or
/// validated.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    let result = match path {
        Some(path) => load_config_from_path(path),
        None => load_config().map(|(config, path)| {
            tracing::debug!(path = %path.display(), "spacegrid: loaded configuration");
            config
        }),
    };

    match result {
        Err(ConfigError::NotFound) => {
            tracing::debug!("spacegrid: no configuration file, using defaults");
            Ok(EngineConfig::default())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_engine_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_engine_config(Some(&dir.path().join("absent.jsonc"))).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_engine_config_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\n  // comment\n  \"dashboardIsASpace\": true\n}}").unwrap();

        let config = load_engine_config(Some(file.path())).unwrap();
        assert!(config.dashboard_is_a_space);
    }

    #[test]
    fn test_load_engine_config_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "grid": {{ "rows": 0, "columns": 4, "desktops": 1 }} }}"#).unwrap();

        assert!(matches!(
            load_engine_config(Some(file.path())),
            Err(ConfigError::Invalid(_))
        ));
    }
}
