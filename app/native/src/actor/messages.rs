//! Message types for the engine actor.
//!
//! - `Command` - a mutation, also the unit of CLI scripts
//! - `Outcome` - the value a successful command returns
//! - `EngineMessage` - what travels over the actor channel

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::SpaceResult;
use crate::state::{Display, Rect, WindowInfo};

// ============================================================================
// Commands
// ============================================================================

/// A mutation of engine state.
///
/// Display ids of 0 address the main display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    // ════════════════════════════════════════════════════════════════════════
    // Topology (from the host)
    // ════════════════════════════════════════════════════════════════════════
    /// Replace the display topology.
    SetDisplays { displays: Vec<Display> },

    // ════════════════════════════════════════════════════════════════════════
    // Identity
    // ════════════════════════════════════════════════════════════════════════
    /// Set a custom space name. Empty clears it.
    SetName {
        space: u32,
        name: String,
        #[serde(default)]
        display_id: u32,
    },

    /// Bind an app to a space uuid or `"AllSpaces"`; `None` or an empty
    /// target removes the binding.
    BindApp {
        bundle_id: String,
        #[serde(default)]
        target: Option<String>,
    },

    // ════════════════════════════════════════════════════════════════════════
    // Grid
    // ════════════════════════════════════════════════════════════════════════
    /// Set both grid dimensions.
    SetGridShape {
        rows: u32,
        columns: u32,
        #[serde(default)]
        display_id: u32,
    },

    /// Set the grid row count.
    SetRows {
        rows: u32,
        #[serde(default)]
        display_id: u32,
    },

    /// Set the grid column count.
    SetColumns {
        columns: u32,
        #[serde(default)]
        display_id: u32,
    },

    /// Append desktops. Replies with [`Outcome::Added`].
    AddDesktops {
        count: u32,
        #[serde(default)]
        display_id: u32,
    },

    /// Remove the highest-numbered desktops.
    RemoveDesktops {
        count: u32,
        #[serde(default)]
        display_id: u32,
    },

    /// Reorder a desktop on its display.
    MoveSpaceToPosition {
        space: u32,
        position: u32,
        #[serde(default)]
        display_id: u32,
    },

    /// Move a desktop to another display.
    MoveSpaceToDisplay {
        space: u32,
        from_display: u32,
        position: u32,
        to_display: u32,
    },

    /// Switch a display to a space.
    SwitchTo {
        space: u32,
        #[serde(default)]
        display_id: u32,
    },

    // ════════════════════════════════════════════════════════════════════════
    // Windows
    // ════════════════════════════════════════════════════════════════════════
    /// Move a window to a desktop.
    MoveWindowToSpace {
        window_id: u32,
        space: u32,
        #[serde(default)]
        display_id: u32,
    },

    /// Make a window frontmost in its space.
    SetFrontWindow { window_id: u32 },

    /// Move a window's frame origin.
    MoveWindow { window_id: u32, x: f64, y: f64 },

    // ════════════════════════════════════════════════════════════════════════
    // Compositor Events
    // ════════════════════════════════════════════════════════════════════════
    /// A window appeared or changed metadata.
    TrackWindow { window: WindowInfo },

    /// A window closed.
    UntrackWindow { window_id: u32 },

    /// A window's title or frame changed.
    UpdateWindow {
        window_id: u32,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        frame: Option<Rect>,
    },

    /// A window entered fullscreen.
    EnterFullScreen { window_id: u32 },

    /// A window left fullscreen.
    ExitFullScreen { window_id: u32 },

    /// The overview grid was shown or hidden.
    SetOverview { visible: bool },
}

impl Command {
    /// Returns a human-readable name for this command.
    ///
    /// Used for logging and debugging, especially in panic recovery.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetDisplays { .. } => "SetDisplays",
            Self::SetName { .. } => "SetName",
            Self::BindApp { .. } => "BindApp",
            Self::SetGridShape { .. } => "SetGridShape",
            Self::SetRows { .. } => "SetRows",
            Self::SetColumns { .. } => "SetColumns",
            Self::AddDesktops { .. } => "AddDesktops",
            Self::RemoveDesktops { .. } => "RemoveDesktops",
            Self::MoveSpaceToPosition { .. } => "MoveSpaceToPosition",
            Self::MoveSpaceToDisplay { .. } => "MoveSpaceToDisplay",
            Self::SwitchTo { .. } => "SwitchTo",
            Self::MoveWindowToSpace { .. } => "MoveWindowToSpace",
            Self::SetFrontWindow { .. } => "SetFrontWindow",
            Self::MoveWindow { .. } => "MoveWindow",
            Self::TrackWindow { .. } => "TrackWindow",
            Self::UntrackWindow { .. } => "UntrackWindow",
            Self::UpdateWindow { .. } => "UpdateWindow",
            Self::EnterFullScreen { .. } => "EnterFullScreen",
            Self::ExitFullScreen { .. } => "ExitFullScreen",
            Self::SetOverview { .. } => "SetOverview",
        }
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result of a successfully applied command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Outcome {
    /// The command was applied (or was a no-op).
    Done,
    /// Desktops were added; `count` may be lower than requested.
    Added { count: u32 },
}

impl Outcome {
    /// Number of desktops added, 0 for other outcomes.
    #[must_use]
    pub const fn added(self) -> u32 {
        match self {
            Self::Added { count } => count,
            Self::Done => 0,
        }
    }
}

// ============================================================================
// Channel Messages
// ============================================================================

/// Messages sent to the engine actor.
#[derive(Debug)]
pub enum EngineMessage {
    /// Apply a command. The reply is dropped when `respond_to` is `None`.
    Execute {
        command: Command,
        respond_to: Option<oneshot::Sender<SpaceResult<Outcome>>>,
    },

    /// Shutdown the actor gracefully.
    Shutdown,
}
