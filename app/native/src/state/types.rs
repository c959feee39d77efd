//! Core state types for the space engine.
//!
//! These types form a relational structure:
//! - `Display` represents a physical display (ID from the host)
//! - `Grid` holds the ordered space slots of a display
//! - `Space` represents a desktop, fullscreen app, or dashboard (ID is UUID v7)
//! - `Window` represents a tracked window (ID from the host)
//!
//! Relations:
//! - `Grid.display_id` → `Display.id`
//! - `Grid.slots` / `Grid.dashboard` → `Space.uuid`
//! - `Space.window_ids` → list of `Window.id`, front to back
//! - `Window.space` → `Space.uuid` (absent when on all spaces)

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use spacegrid_shared::DisplayConfig;
use uuid::Uuid;

use crate::constants::naming;

// ============================================================================
// Geometry Types
// ============================================================================

/// A rectangle with position and size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Create a zero-sized rectangle at origin.
    #[must_use]
    pub const fn zero() -> Self { Self::new(0.0, 0.0, 0.0, 0.0) }

    /// Same size, new origin.
    #[must_use]
    pub const fn with_origin(self, x: f64, y: f64) -> Self {
        Self::new(x, y, self.width, self.height)
    }

    /// Serializes the frame as `{{x, y}, {w, h}}`.
    #[must_use]
    pub fn to_frame_string(&self) -> String {
        format!("{{{{{}, {}}}, {{{}, {}}}}}", self.x, self.y, self.width, self.height)
    }
}

// ============================================================================
// Display Type
// ============================================================================

/// A physical display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Display {
    /// Host display id (`CGDirectDisplayID`). Never zero.
    pub id: u32,

    /// Display name (e.g., "Built-in Retina Display").
    pub name: String,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// Origin in the global coordinate space.
    #[serde(default)]
    pub x: i32,

    /// Origin in the global coordinate space.
    #[serde(default)]
    pub y: i32,
}

impl Display {
    /// Is this display positioned at the global origin?
    #[must_use]
    pub const fn is_at_origin(&self) -> bool { self.x == 0 && self.y == 0 }
}

impl From<&DisplayConfig> for Display {
    fn from(config: &DisplayConfig) -> Self {
        Self {
            id: config.id,
            name: config.name.clone(),
            width: config.width,
            height: config.height,
            x: config.x,
            y: config.y,
        }
    }
}

// ============================================================================
// Space Types
// ============================================================================

/// The kind of a space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpaceKind {
    /// A regular desktop.
    #[default]
    Desktop,
    /// A space created for a single fullscreen app window.
    FullScreen,
    /// The dashboard, number 0 when enabled.
    Dashboard,
}

/// A space (virtual desktop).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Space {
    /// Stable identity. Never changes for the lifetime of the space.
    pub uuid: Uuid,

    /// Desktop, fullscreen app, or dashboard.
    pub kind: SpaceKind,

    /// User-assigned name.
    pub custom_name: Option<String>,

    /// Name of the app owning a fullscreen space.
    pub app_name: Option<String>,

    /// Windows on this space, front to back.
    pub window_ids: SmallVec<[u32; 8]>,

    /// For fullscreen spaces: the space the window came from.
    pub origin: Option<Uuid>,
}

impl Space {
    /// Create a new space of the given kind with a fresh UUID v7.
    #[must_use]
    pub fn new(kind: SpaceKind) -> Self {
        Self {
            uuid: Uuid::now_v7(),
            kind,
            custom_name: None,
            app_name: None,
            window_ids: SmallVec::new(),
            origin: None,
        }
    }

    /// Create a new desktop.
    #[must_use]
    pub fn desktop() -> Self { Self::new(SpaceKind::Desktop) }

    /// Create a new dashboard.
    #[must_use]
    pub fn dashboard() -> Self { Self::new(SpaceKind::Dashboard) }

    /// Create a fullscreen space for the given app window.
    #[must_use]
    pub fn full_screen(app_name: &str, window_id: u32, origin: Option<Uuid>) -> Self {
        let mut space = Self::new(SpaceKind::FullScreen);
        space.app_name = Some(app_name.to_string());
        space.window_ids.push(window_id);
        space.origin = origin;
        space
    }

    #[must_use]
    pub fn is_desktop(&self) -> bool { self.kind == SpaceKind::Desktop }

    /// Name shown for this space, given its index among the desktops of its grid.
    #[must_use]
    pub fn display_name(&self, desktop_index: Option<usize>) -> String {
        if let Some(name) = &self.custom_name {
            return name.clone();
        }
        match self.kind {
            SpaceKind::Desktop => {
                format!("{} {}", naming::DESKTOP_PREFIX, desktop_index.map_or(0, |i| i + 1))
            }
            SpaceKind::FullScreen => self.app_name.clone().unwrap_or_default(),
            SpaceKind::Dashboard => naming::DASHBOARD.to_string(),
        }
    }
}

// ============================================================================
// Grid Type
// ============================================================================

/// The spaces of one display, in slot order.
///
/// Space numbers are derived: slot index + 1, or 0 for the dashboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    /// Display owning this grid.
    pub display_id: u32,

    /// Defined grid rows.
    pub rows: u32,

    /// Defined grid columns.
    pub columns: u32,

    /// Space uuids in number order. Slot 1 is always a desktop.
    pub slots: Vec<Uuid>,

    /// Dashboard space, when the dashboard is a space.
    pub dashboard: Option<Uuid>,

    /// The space currently shown on this display.
    pub active: Uuid,
}

impl Grid {
    /// Number of the given space in this grid.
    #[must_use]
    pub fn number_of(&self, uuid: Uuid) -> Option<u32> {
        if self.dashboard == Some(uuid) {
            return Some(0);
        }
        self.slots.iter().position(|&id| id == uuid).and_then(|i| u32::try_from(i + 1).ok())
    }

    /// Space shown as the given number.
    #[must_use]
    pub fn uuid_at(&self, number: u32) -> Option<Uuid> {
        if number == 0 {
            return self.dashboard;
        }
        self.slots.get(number as usize - 1).copied()
    }

    /// Does this grid hold the given space?
    #[must_use]
    pub fn contains(&self, uuid: Uuid) -> bool { self.number_of(uuid).is_some() }

    /// Total spaces held, dashboard included.
    #[must_use]
    pub fn total(&self) -> u32 {
        u32::try_from(self.slots.len()).unwrap_or(u32::MAX) + u32::from(self.dashboard.is_some())
    }

    /// Number of spaces in slots (dashboard excluded).
    #[must_use]
    pub fn len(&self) -> u32 { u32::try_from(self.slots.len()).unwrap_or(u32::MAX) }

    #[must_use]
    pub const fn is_empty(&self) -> bool { self.slots.is_empty() }

    #[must_use]
    pub const fn capacity(&self) -> u32 { self.rows.saturating_mul(self.columns) }

    /// Number of the active space.
    #[must_use]
    pub fn active_number(&self) -> u32 { self.number_of(self.active).unwrap_or(0) }
}

// ============================================================================
// Window Types
// ============================================================================

/// A tracked window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Window {
    /// Host window id.
    pub id: u32,

    /// Owning application name.
    pub app_name: String,

    /// Owning application bundle identifier.
    pub bundle_id: String,

    /// Window title.
    pub title: String,

    /// Window frame.
    pub frame: Rect,

    /// Display the window is on.
    pub display_id: u32,

    /// Space the window belongs to. `None` when on all spaces.
    pub space: Option<Uuid>,
}

impl Window {
    #[must_use]
    pub const fn is_on_all_spaces(&self) -> bool { self.space.is_none() }
}

/// A window reported by the compositor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowInfo {
    pub id: u32,
    pub app_name: String,
    pub bundle_id: String,
    pub title: String,
    pub frame: Rect,

    /// Display the window appeared on. 0 means the main display.
    pub display_id: u32,

    /// Space number the window appeared on. Defaults to the current space.
    pub space_number: Option<u32>,

    pub is_on_all_spaces: bool,
}

/// A window as listed to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowEntry {
    pub window_id: u32,
    pub app_name: String,
    pub title: String,
    pub frame: String,
    pub is_on_all_spaces: bool,
    pub display_id: u32,

    /// Space number. `None` when on all spaces.
    pub space_number: Option<u32>,
}

// ============================================================================
// App Bindings
// ============================================================================

/// Where windows of a bound app are placed when they appear.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppBinding {
    /// On every space.
    AllSpaces,
    /// On the given space.
    Space(Uuid),
}

impl AppBinding {
    /// Parses a binding target: `"AllSpaces"` or a space uuid.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SpaceError::InvalidUuid`] for any other string.
    pub fn parse(target: &str) -> crate::SpaceResult<Self> {
        if target == naming::ALL_SPACES {
            return Ok(Self::AllSpaces);
        }
        Uuid::parse_str(target)
            .map(Self::Space)
            .map_err(|_| crate::SpaceError::InvalidUuid(target.to_string()))
    }
}

// ============================================================================
// Events
// ============================================================================

/// A space change about to become visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceChange {
    pub from: u32,
    pub to: u32,
    pub display_id: u32,
}
