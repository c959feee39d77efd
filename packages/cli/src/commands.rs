//! CLI command definitions using Clap.

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};
use colored::Colorize;
use serde::Serialize;
use spacegrid_lib::{EngineActor, EngineHandle, SpaceKind, SpaceState};
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::error::CliError;
use crate::output;
use crate::script;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Spacegrid CLI - inspect the space engine and run command scripts.
#[derive(Parser, Debug)]
#[command(name = "spacegrid")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH", env = "SPACEGRID_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// List displays in registry order.
    ///
    /// The main display comes first; the rest follow by their origin.
    Displays {
        /// Output in JSON format instead of table format.
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// List the spaces of every grid, or of one display.
    Spaces {
        /// Only show the grid used by this display.
        #[arg(long, short = 'd', value_name = "ID")]
        display: Option<u32>,

        /// Output in JSON format instead of table format.
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// List tracked windows.
    Windows {
        /// Output in JSON format instead of table format.
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// Run a command script against a fresh engine.
    ///
    /// The script is a JSON array of commands. Comments are allowed.
    /// Pass `-` to read it from stdin.
    Script {
        /// Path to the script file.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Output in JSON format instead of table format.
        #[arg(long, short = 'j')]
        json: bool,

        /// Print the spaces after the last step.
        #[arg(long, short = 's')]
        spaces: bool,
    },

    /// Output the configuration JSON schema.
    Schema,

    /// Generate shell completions.
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the engine
    /// cannot be started.
    pub fn execute(&self) -> Result<(), CliError> {
        match &self.command {
            Commands::Displays { json } => self.with_engine(|handle| print_displays(handle, *json)),
            Commands::Spaces { display, json } => {
                self.with_engine(|handle| print_spaces(handle, *display, *json))
            }
            Commands::Windows { json } => self.with_engine(|handle| print_windows(handle, *json)),
            Commands::Script { path, json, spaces } => {
                let commands = script::load(path)?;
                self.with_engine(|handle| {
                    let reports = script::run(handle, commands);
                    print_reports(&reports, *json);
                    if *spaces {
                        print_spaces(handle, None, *json)?;
                    }
                    Ok(())
                })
            }
            Commands::Schema => {
                spacegrid_shared::print_schema();
                Ok(())
            }
            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }
        }
    }

    /// Starts a private engine, runs `body`, and stops the engine.
    fn with_engine(
        &self,
        body: impl FnOnce(&EngineHandle) -> Result<(), CliError>,
    ) -> Result<(), CliError> {
        let config = spacegrid_lib::load_engine_config(self.config.as_deref())?;
        let handle = EngineActor::spawn(config)?;
        let result = body(&handle);
        if let Err(err) = handle.shutdown() {
            tracing::debug!(%err, "spacegrid: engine already stopped");
        }
        result
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, "spacegrid", &mut io::stdout());
    }
}

// ============================================================================
// Displays
// ============================================================================

fn print_displays(handle: &EngineHandle, json: bool) -> Result<(), CliError> {
    #[derive(Tabled)]
    struct DisplayRow {
        #[tabled(rename = "ID")]
        id: u32,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Resolution")]
        resolution: String,
        #[tabled(rename = "Position")]
        position: String,
        #[tabled(rename = "Main")]
        main: String,
    }

    let displays = handle.displays().map_err(spacegrid_lib::EngineError::from)?;
    if json {
        output::print_json(&displays);
        return Ok(());
    }

    let rows: Vec<DisplayRow> = displays
        .iter()
        .enumerate()
        .map(|(index, d)| DisplayRow {
            id: d.id,
            name: output::truncate(&d.name, 32),
            resolution: format!("{}x{}", d.width, d.height),
            position: format!("{}, {}", d.x, d.y),
            main: output::format_bool(index == 0),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::right()))
        .with(Modify::new(Columns::new(2..4)).with(Alignment::right()))
        .with(Modify::new(Columns::new(4..5)).with(Alignment::center()))
        .to_string();

    println!("{}", format!("Displays ({})", displays.len()).bold());
    println!("{table}");
    Ok(())
}

// ============================================================================
// Spaces
// ============================================================================

/// A space as listed by the CLI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpaceInfo {
    display_id: u32,
    number: u32,
    name: String,
    kind: SpaceKind,
    uuid: String,
    windows: usize,
    current: bool,
}

/// Collects every space of every grid, or of the grid serving `display`.
fn collect_spaces(state: &SpaceState, display: Option<u32>) -> Vec<SpaceInfo> {
    let owner = match display.map(|id| state.grid_owner(id)) {
        Some(Ok(owner)) => Some(owner),
        Some(Err(_)) => return Vec::new(),
        None => None,
    };

    state
        .grids
        .iter()
        .filter(|grid| owner.is_none_or(|id| id == grid.display_id))
        .flat_map(|grid| {
            let dashboard = grid.dashboard.map(|uuid| (0, uuid));
            let slots = (1..).zip(grid.slots.iter().copied());
            dashboard.into_iter().chain(slots).filter_map(move |(number, uuid)| {
                let space = state.spaces.get(&uuid)?;
                Some(SpaceInfo {
                    display_id: grid.display_id,
                    number,
                    name: state.space_name(number, grid.display_id).unwrap_or_default(),
                    kind: space.kind,
                    uuid: uuid.to_string(),
                    windows: space.window_ids.len(),
                    current: grid.active == uuid,
                })
            })
        })
        .collect()
}

fn format_kind(kind: SpaceKind) -> String {
    match kind {
        SpaceKind::Desktop => "desktop".to_string(),
        SpaceKind::FullScreen => "fullscreen".cyan().to_string(),
        SpaceKind::Dashboard => "dashboard".magenta().to_string(),
    }
}

fn print_spaces(handle: &EngineHandle, display: Option<u32>, json: bool) -> Result<(), CliError> {
    #[derive(Tabled)]
    struct SpaceRow {
        #[tabled(rename = "Display")]
        display_id: u32,
        #[tabled(rename = "#")]
        number: u32,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Kind")]
        kind: String,
        #[tabled(rename = "UUID")]
        uuid: String,
        #[tabled(rename = "Windows")]
        windows: usize,
        #[tabled(rename = "Current")]
        current: String,
    }

    if let Some(id) = display {
        handle
            .query(|s| s.grid_owner(id).map(|_| ()))
            .map_err(spacegrid_lib::EngineError::from)?
            .map_err(spacegrid_lib::EngineError::from)?;
    }

    let spaces = handle
        .query(|s| collect_spaces(s, display))
        .map_err(spacegrid_lib::EngineError::from)?;
    if json {
        output::print_json(&spaces);
        return Ok(());
    }

    let rows: Vec<SpaceRow> = spaces
        .iter()
        .map(|s| SpaceRow {
            display_id: s.display_id,
            number: s.number,
            name: output::truncate(&s.name, 24),
            kind: format_kind(s.kind),
            uuid: s.uuid.clone(),
            windows: s.windows,
            current: output::format_bool(s.current),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(0..2)).with(Alignment::right()))
        .with(Modify::new(Columns::new(5..6)).with(Alignment::right()))
        .with(Modify::new(Columns::new(6..7)).with(Alignment::center()))
        .to_string();

    println!("{}", format!("Spaces ({})", spaces.len()).bold());
    println!("{table}");
    Ok(())
}

// ============================================================================
// Windows
// ============================================================================

fn print_windows(handle: &EngineHandle, json: bool) -> Result<(), CliError> {
    #[derive(Tabled)]
    struct WindowRow {
        #[tabled(rename = "ID")]
        id: u32,
        #[tabled(rename = "App")]
        app: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Display")]
        display_id: u32,
        #[tabled(rename = "Space")]
        space: String,
        #[tabled(rename = "Frame")]
        frame: String,
    }

    let windows = handle.windows().map_err(spacegrid_lib::EngineError::from)?;
    if json {
        output::print_json(&windows);
        return Ok(());
    }

    if windows.is_empty() {
        println!("{}", "No windows tracked.".dimmed());
        return Ok(());
    }

    let rows: Vec<WindowRow> = windows
        .iter()
        .map(|w| WindowRow {
            id: w.window_id,
            app: output::truncate(&w.app_name, 20),
            title: output::truncate(&w.title, 40),
            display_id: w.display_id,
            space: output::format_space(w.space_number),
            frame: w.frame.clone(),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::right()))
        .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
        .to_string();

    println!("{}", format!("Windows ({})", windows.len()).bold());
    println!("{table}");
    Ok(())
}

// ============================================================================
// Script Reports
// ============================================================================

fn format_events(events: &[script::Event]) -> String {
    if events.is_empty() {
        return "-".dimmed().to_string();
    }
    events
        .iter()
        .map(|event| match event {
            script::Event::SpaceWillChange(change) => {
                format!("will change {} → {} on {}", change.from, change.to, change.display_id)
            }
            script::Event::LayoutChanged => "layout changed".to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_reports(reports: &[script::StepReport], json: bool) {
    #[derive(Tabled)]
    struct StepRow {
        #[tabled(rename = "Step")]
        step: usize,
        #[tabled(rename = "Command")]
        command: &'static str,
        #[tabled(rename = "Ok")]
        ok: String,
        #[tabled(rename = "Result")]
        result: String,
        #[tabled(rename = "Events")]
        events: String,
    }

    if json {
        output::print_json(&reports);
        return;
    }

    let rows: Vec<StepRow> = reports
        .iter()
        .map(|r| StepRow {
            step: r.step,
            command: r.command,
            ok: output::format_bool(r.is_ok()),
            result: match (&r.outcome, &r.error) {
                (_, Some(error)) => error.red().to_string(),
                (Some(spacegrid_lib::Outcome::Added { count }), None) => format!("added {count}"),
                _ => "done".to_string(),
            },
            events: format_events(&r.events),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::right()))
        .with(Modify::new(Columns::new(2..3)).with(Alignment::center()))
        .to_string();

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    println!("{}", format!("Script ({} steps, {failed} rejected)", reports.len()).bold());
    println!("{table}");
}
