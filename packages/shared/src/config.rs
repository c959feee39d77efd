//! Configuration types for the spacegrid engine.
//!
//! The configuration seeds the engine once at startup: display topology,
//! grid shape per display, dashboard and fullscreen preferences, and the
//! window placement policy. Nothing is written back; later changes made
//! through the API live only in memory.
//!
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.

use std::fs;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Maximum number of spaces per display when displays share one space sequence.
pub const MAX_SPACES: u32 = 16;

/// Maximum number of spaces per display when each display has its own spaces.
pub const MAX_SPACES_SEPARATE_DISPLAYS: u32 = 32;

/// Where a window lands in the front-to-back order of its new space after a
/// cross-space move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum WindowPlacement {
    /// Behind every window already on the target space. This is the default.
    #[default]
    Back,
    /// In front of every window already on the target space.
    Front,
}

/// Grid shape and initial desktop count for a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    /// Number of rows in the grid.
    pub rows: u32,

    /// Number of columns in the grid.
    pub columns: u32,

    /// Desktops created on the display at startup. Clamped to `1..=rows*columns`.
    pub desktops: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 1,
            columns: 4,
            desktops: 4,
        }
    }
}

impl GridConfig {
    /// Number of slots in the grid.
    #[must_use]
    pub const fn slots(&self) -> u32 { self.rows.saturating_mul(self.columns) }

    /// Desktop count actually seeded for this grid.
    #[must_use]
    pub fn seeded_desktops(&self) -> u32 { self.desktops.clamp(1, self.slots().max(1)) }
}

/// Grid override for a single display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisplayGridOverride {
    /// Display identifier the override applies to.
    pub display_id: u32,

    /// Grid used for that display instead of the default one.
    #[serde(flatten)]
    pub grid: GridConfig,
}

/// A display present at startup.
///
/// Hardware enumeration is owned by the host; the engine only needs the
/// identifier, a human name, and the metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayConfig {
    /// Display identifier (`CGDirectDisplayID` on macOS). Must not be zero.
    pub id: u32,

    /// Human-readable display name.
    pub name: String,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// Horizontal origin in the global coordinate space.
    pub x: i32,

    /// Vertical origin in the global coordinate space.
    pub y: i32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            id: 1,
            name: "Main Display".to_string(),
            width: 1920,
            height: 1080,
            x: 0,
            y: 0,
        }
    }
}

/// Root engine configuration.
///
/// Example:
/// ```json
/// {
///   "displaysHaveSeparateSpaces": true,
///   "dashboardIsASpace": false,
///   "grid": { "rows": 2, "columns": 3, "desktops": 6 },
///   "overrides": [{ "displayId": 2, "rows": 1, "columns": 2, "desktops": 2 }],
///   "windowPlacement": "back",
///   "displays": [
///     { "id": 1, "name": "Built-in", "width": 2560, "height": 1600 },
///     { "id": 2, "name": "DELL U2719D", "width": 2560, "height": 1440, "x": 2560 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Each display has its own independent space sequence.
    /// When false, every display shows the main display's spaces.
    pub displays_have_separate_spaces: bool,

    /// The dashboard is available as space number 0.
    pub dashboard_is_a_space: bool,

    /// Number of fullscreen apps that take a slot in the grid.
    pub full_screens_in_grid: u32,

    /// Default grid for every display.
    pub grid: GridConfig,

    /// Per-display grid overrides.
    pub overrides: Vec<DisplayGridOverride>,

    /// Placement of a window moved to another space.
    pub window_placement: WindowPlacement,

    /// Version reported for the host application.
    pub host_version: String,

    /// Displays known at startup. Defaults to a single 1920x1080 main display.
    pub displays: Vec<DisplayConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            displays_have_separate_spaces: true,
            dashboard_is_a_space: false,
            full_screens_in_grid: 0,
            grid: GridConfig::default(),
            overrides: Vec::new(),
            window_placement: WindowPlacement::default(),
            host_version: env!("CARGO_PKG_VERSION").to_string(),
            displays: vec![DisplayConfig::default()],
        }
    }
}

impl EngineConfig {
    /// Maximum number of spaces a single display may hold.
    #[must_use]
    pub const fn max_spaces(&self) -> u32 {
        if self.displays_have_separate_spaces {
            MAX_SPACES_SEPARATE_DISPLAYS
        } else {
            MAX_SPACES
        }
    }

    /// Grid configuration for a display, honoring overrides.
    #[must_use]
    pub fn grid_for(&self, display_id: u32) -> GridConfig {
        self.overrides
            .iter()
            .find(|o| o.display_id == display_id)
            .map_or(self.grid, |o| o.grid)
    }

    /// Checks the configuration for values the engine cannot be seeded with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a grid has a zero dimension or more
    /// slots than [`Self::max_spaces`], if a display uses the reserved id 0,
    /// or if display ids repeat.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max = self.max_spaces();
        let grids = std::iter::once(self.grid).chain(self.overrides.iter().map(|o| o.grid));
        for grid in grids {
            if grid.rows == 0 || grid.columns == 0 {
                return Err(ConfigError::Invalid(format!(
                    "grid {}x{} has a zero dimension",
                    grid.rows, grid.columns
                )));
            }
            if grid.slots() > max {
                return Err(ConfigError::Invalid(format!(
                    "grid {}x{} exceeds the maximum of {max} spaces",
                    grid.rows, grid.columns
                )));
            }
        }

        let mut seen = Vec::with_capacity(self.displays.len());
        for display in &self.displays {
            if display.id == 0 {
                return Err(ConfigError::Invalid(
                    "display id 0 is reserved for the main display alias".to_string(),
                ));
            }
            if seen.contains(&display.id) {
                return Err(ConfigError::Invalid(format!(
                    "display id {} is listed twice",
                    display.id
                )));
            }
            seen.push(display.id);
        }

        Ok(())
    }
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    #[error(
        "No configuration file found. Expected at ~/.spacegrid.jsonc or $XDG_CONFIG_HOME/spacegrid/config.jsonc"
    )]
    NotFound,
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] serde_json::Error),
    /// The configuration parsed but describes an impossible layout.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Returns the possible configuration file paths in priority order.
///
/// The function checks the following locations:
/// 1. `$XDG_CONFIG_HOME/spacegrid/config.jsonc` (if `XDG_CONFIG_HOME` is set)
/// 2. `~/.config/spacegrid/config.jsonc`
/// 3. The platform config directory (`~/Library/Application Support/spacegrid/config.jsonc` on macOS)
/// 4. `~/.spacegrid.jsonc`
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        paths.push(PathBuf::from(xdg_config).join("spacegrid").join("config.jsonc"));
    }

    if let Some(home) = dirs::home_dir() {
        let path = home.join(".config").join("spacegrid").join("config.jsonc");
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("spacegrid").join("config.jsonc");
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".spacegrid.jsonc"));
    }

    paths
}

/// Parses a JSONC configuration string and validates it.
///
/// # Errors
///
/// Returns `ConfigError::ParseError` for malformed JSON and
/// `ConfigError::Invalid` if validation fails.
pub fn parse_config(contents: &str) -> Result<EngineConfig, ConfigError> {
    let reader = json_comments::StripComments::new(contents.as_bytes());
    let config: EngineConfig = serde_json::from_reader(reader)?;
    config.validate()?;
    Ok(config)
}

/// Loads the configuration from an explicit path.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the path does not exist, or any error
/// from [`parse_config`].
pub fn load_config_from_path(path: &Path) -> Result<EngineConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound);
    }
    let file = fs::File::open(path)?;
    let reader = json_comments::StripComments::new(file);
    let config: EngineConfig = serde_json::from_reader(reader)?;
    config.validate()?;
    Ok(config)
}

/// Loads the configuration from the first existing default location.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no configuration file exists in any of
/// the expected locations, or any error from [`load_config_from_path`].
pub fn load_config() -> Result<(EngineConfig, PathBuf), ConfigError> {
    for path in config_paths() {
        if path.exists() {
            let config = load_config_from_path(&path)?;
            return Ok((config, path));
        }
    }

    Err(ConfigError::NotFound)
}
