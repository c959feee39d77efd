//! Mutation handlers.
//!
//! Each handler applies one operation to a scratch [`SpaceState`] and records
//! the notifications it causes in [`Effects`]. Handlers never dispatch
//! anything themselves; the engine does that once the result validates.
//!
//! - `display` - Display topology changes
//! - `identity` - Space names and app bindings
//! - `grid` - Grid shape, desktop count, space order, switching
//! - `window` - Window tracking, ordering, fullscreen
//!
//! [`SpaceState`]: crate::state::SpaceState

pub mod display;
pub mod grid;
pub mod identity;
pub mod window;

pub use display::on_set_displays;
pub use grid::{
    on_add_desktops, on_move_space_to_display, on_move_space_to_position, on_remove_desktops,
    on_set_columns, on_set_grid_shape, on_set_overview, on_set_rows, on_switch_to,
};
pub use identity::{on_bind_app, on_set_name};
use smallvec::SmallVec;
pub use window::{
    on_enter_full_screen, on_exit_full_screen, on_move_window, on_move_window_to_space,
    on_set_front_window, on_track_window, on_untrack_window, on_update_window,
};

use crate::state::SpaceChange;

/// Notifications caused by a mutation, in the order they must fire.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Effects {
    /// Space switches, fired before the new state is committed.
    pub space_changes: SmallVec<[SpaceChange; 2]>,

    /// Structural change, fired after commit.
    pub layout_changed: bool,
}

impl Effects {
    /// Record a space switch on a display.
    pub fn space_will_change(&mut self, from: u32, to: u32, display_id: u32) {
        self.space_changes.push(SpaceChange { from, to, display_id });
    }

    /// Record a structural change.
    pub const fn mark_layout_changed(&mut self) { self.layout_changed = true; }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.space_changes.is_empty() && !self.layout_changed }
}
