//! Command scripts.
//!
//! A script is a JSON (or JSONC) array of engine commands, for example:
//!
//! ```jsonc
//! [
//!   { "command": "addDesktops", "count": 2 },
//!   // Jump to the new space
//!   { "command": "switchTo", "space": 5 }
//! ]
//! ```
//!
//! Every step runs against a private engine. Rejected steps are reported and
//! the script carries on, since the engine leaves its state untouched.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use spacegrid_lib::{Command, EngineHandle, Outcome, SpaceChange};

use crate::error::CliError;

/// A notification observed while a step ran.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Event {
    SpaceWillChange(SpaceChange),
    LayoutChanged,
}

/// The result of one script step.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub step: usize,
    pub command: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub events: Vec<Event>,
}

impl StepReport {
    #[must_use]
    pub const fn is_ok(&self) -> bool { self.error.is_none() }
}

/// Reads a script from a file, or from stdin when the path is `-`.
///
/// # Errors
///
/// Returns an error if the script cannot be read or is not a command array.
pub fn load(path: &Path) -> Result<Vec<Command>, CliError> {
    let mut raw = String::new();
    if path.as_os_str() == "-" {
        std::io::stdin().read_to_string(&mut raw)?;
    } else {
        raw = std::fs::read_to_string(path)?;
    }
    parse(&raw)
}

/// Parses a script, allowing comments.
///
/// # Errors
///
/// Returns an error if the text is not a JSON array of commands.
pub fn parse(raw: &str) -> Result<Vec<Command>, CliError> {
    let stripped = json_comments::StripComments::new(raw.as_bytes());
    Ok(serde_json::from_reader(stripped)?)
}

/// Runs every command in order and collects the per-step results.
pub fn run(handle: &EngineHandle, commands: Vec<Command>) -> Vec<StepReport> {
    let events = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&events);
    handle.dispatcher().subscribe_space_will_change(move |change| {
        sink.lock().push(Event::SpaceWillChange(change));
    });
    let sink = Arc::clone(&events);
    handle.dispatcher().subscribe_layout_changed(move || {
        sink.lock().push(Event::LayoutChanged);
    });

    let reports = commands
        .into_iter()
        .enumerate()
        .map(|(index, command)| {
            let name = command.name();
            let result = handle.call(command);
            let step_events = std::mem::take(&mut *events.lock());

            match result {
                Ok(outcome) => {
                    tracing::debug!(step = index + 1, command = name, "spacegrid: step applied");
                    StepReport {
                        step: index + 1,
                        command: name,
                        outcome: Some(outcome),
                        error: None,
                        events: step_events,
                    }
                }
                Err(err) => {
                    tracing::info!(step = index + 1, command = name, %err, "spacegrid: step rejected");
                    StepReport {
                        step: index + 1,
                        command: name,
                        outcome: None,
                        error: Some(err.to_string()),
                        events: step_events,
                    }
                }
            }
        })
        .collect();

    handle.dispatcher().unsubscribe(spacegrid_lib::EventKind::SpaceWillChange);
    handle.dispatcher().unsubscribe(spacegrid_lib::EventKind::LayoutChanged);
    reports
}

#[cfg(test)]
mod tests {
    use spacegrid_lib::EngineActor;
    use spacegrid_shared::{EngineConfig, GridConfig};

    use super::*;

    fn spawn() -> EngineHandle {
        EngineActor::spawn(EngineConfig {
            grid: GridConfig { rows: 2, columns: 2, desktops: 3 },
            ..EngineConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_parse_allows_comments() {
        let commands = parse(
            r#"[
                // grow the grid
                { "command": "addDesktops", "count": 1 },
                { "command": "switchTo", "space": 4 }
            ]"#,
        )
        .unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].name(), "AddDesktops");
    }

    #[test]
    fn test_parse_rejects_unknown_command() {
        let err = parse(r#"[{ "command": "teleport" }]"#).unwrap_err();
        assert!(matches!(err, CliError::Script(_)));
    }

    #[test]
    fn test_run_reports_each_step() {
        let handle = spawn();
        let commands = parse(
            r#"[
                { "command": "addDesktops", "count": 3 },
                { "command": "switchTo", "space": 9 },
                { "command": "switchTo", "space": 2 }
            ]"#,
        )
        .unwrap();

        let reports = run(&handle, commands);
        assert_eq!(reports.len(), 3);

        assert!(reports[0].is_ok());
        assert_eq!(reports[0].outcome, Some(Outcome::Added { count: 1 }));
        assert_eq!(reports[0].events, vec![Event::LayoutChanged]);

        assert!(!reports[1].is_ok());
        assert!(reports[1].events.is_empty());

        assert!(reports[2].is_ok());
        assert_eq!(
            reports[2].events.first(),
            Some(&Event::SpaceWillChange(SpaceChange { from: 1, to: 2, display_id: 1 }))
        );
        handle.shutdown().unwrap();
    }

    #[test]
    fn test_run_releases_subscriptions() {
        let handle = spawn();
        run(&handle, Vec::new());
        assert!(!handle.dispatcher().is_subscribed(spacegrid_lib::EventKind::LayoutChanged));
        handle.shutdown().unwrap();
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steps.jsonc");
        std::fs::write(&path, r#"[{ "command": "setOverview", "visible": true }]"#).unwrap();
        assert_eq!(load(&path).unwrap().len(), 1);
    }
}
