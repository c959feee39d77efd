//! Window handlers.
//!
//! These handlers track the windows reported by the compositor, keep the
//! front-to-back order of each space, move windows between spaces, and
//! create or destroy fullscreen app spaces.

use spacegrid_shared::WindowPlacement;
use uuid::Uuid;

use super::Effects;
use crate::error::{SpaceError, SpaceResult};
use crate::state::{AppBinding, Rect, Space, SpaceKind, SpaceState, Window, WindowInfo};

// ============================================================================
// Tracking
// ============================================================================

/// Start tracking a window, or refresh an already tracked one.
///
/// A new window is placed by its app binding if one exists, otherwise on the
/// space it was reported on (the display's current space by default). It
/// starts frontmost.
///
/// # Errors
///
/// Returns a lookup error for an unknown display or space, or
/// [`SpaceError::NotADesktop`] when reported on the dashboard.
pub fn on_track_window(state: &mut SpaceState, info: WindowInfo) -> SpaceResult<()> {
    if let Some(window) = state.windows.get_mut(&info.id) {
        tracing::trace!(window_id = info.id, "spacegrid: refreshing tracked window");
        window.app_name = info.app_name;
        window.bundle_id = info.bundle_id;
        window.title = info.title;
        window.frame = info.frame;
        return Ok(());
    }

    let display_id = state.resolve_display(info.display_id)?;
    let binding = state.app_bindings.get(&info.bundle_id).copied();
    let space = match binding {
        Some(AppBinding::AllSpaces) => None,
        Some(AppBinding::Space(uuid)) if state.kind_of(uuid) == Some(SpaceKind::Desktop) => {
            Some(uuid)
        }
        _ if info.is_on_all_spaces => None,
        _ => Some(reported_space(state, &info, display_id)?),
    };

    let display_id = match space {
        Some(uuid) if state.separate_spaces() => {
            state.grid_of_space(uuid).map_or(display_id, |g| g.display_id)
        }
        _ => display_id,
    };

    tracing::debug!(
        window_id = info.id,
        display_id,
        on_all_spaces = space.is_none(),
        "spacegrid: tracking window"
    );

    match space {
        Some(uuid) => {
            if let Some(space) = state.spaces.get_mut(&uuid) {
                space.window_ids.insert(0, info.id);
            }
        }
        None => state.sticky_window_ids.insert(0, info.id),
    }
    state.windows.insert(
        info.id,
        Window {
            id: info.id,
            app_name: info.app_name,
            bundle_id: info.bundle_id,
            title: info.title,
            frame: info.frame,
            display_id,
            space,
        },
    );
    Ok(())
}

fn reported_space(state: &SpaceState, info: &WindowInfo, display_id: u32) -> SpaceResult<Uuid> {
    let Some(number) = info.space_number else {
        let grid = state.grid(display_id)?;
        return Ok(if state.kind_of(grid.active) == Some(SpaceKind::Dashboard) {
            grid.slots[0]
        } else {
            grid.active
        });
    };

    let space = state.space_at(number, display_id)?;
    if space.kind == SpaceKind::Dashboard {
        return Err(SpaceError::NotADesktop { number, display_id });
    }
    Ok(space.uuid)
}

/// Stop tracking a window. A fullscreen space left empty is closed.
///
/// # Errors
///
/// Returns [`SpaceError::WindowNotFound`] for unknown windows.
pub fn on_untrack_window(
    state: &mut SpaceState,
    effects: &mut Effects,
    window_id: u32,
) -> SpaceResult<()> {
    let space = state.windows.get(&window_id).ok_or(SpaceError::WindowNotFound(window_id))?.space;

    tracing::debug!(window_id, "spacegrid: untracking window");
    state.detach_window(window_id);
    state.windows.remove(&window_id);

    if let Some(uuid) = space
        && let Some(space) = state.spaces.get(&uuid)
        && space.kind == SpaceKind::FullScreen
        && space.window_ids.is_empty()
    {
        close_full_screen_space(state, effects, uuid)?;
    }
    Ok(())
}

/// Update the title and/or frame of a tracked window.
///
/// # Errors
///
/// Returns [`SpaceError::WindowNotFound`] for unknown windows.
pub fn on_update_window(
    state: &mut SpaceState,
    window_id: u32,
    title: Option<String>,
    frame: Option<Rect>,
) -> SpaceResult<()> {
    let window = state.windows.get_mut(&window_id).ok_or(SpaceError::WindowNotFound(window_id))?;
    if let Some(title) = title {
        window.title = title;
    }
    if let Some(frame) = frame {
        window.frame = frame;
    }
    Ok(())
}

// ============================================================================
// Ordering & Moves
// ============================================================================

/// Move a window to a desktop.
///
/// The window is placed behind or in front of the target's windows per the
/// configured placement. A window on all spaces becomes pinned to the target.
///
/// # Errors
///
/// Returns [`SpaceError::WindowNotFound`] for unknown windows, a lookup error
/// for a missing target, or [`SpaceError::NotADesktop`] for a target that is
/// not a desktop.
pub fn on_move_window_to_space(
    state: &mut SpaceState,
    window_id: u32,
    number: u32,
    display_id: u32,
) -> SpaceResult<()> {
    let display_id = state.resolve_display(display_id)?;
    let target = state.space_at(number, display_id)?;
    let owner = state.grid_owner(display_id)?;
    if !target.is_desktop() {
        return Err(SpaceError::NotADesktop { number, display_id: owner });
    }
    let target = target.uuid;

    let window = state.windows.get(&window_id).ok_or(SpaceError::WindowNotFound(window_id))?;
    if let Some(current) = window.space {
        if current == target {
            return Ok(());
        }
        if state.kind_of(current) == Some(SpaceKind::FullScreen) {
            return Err(SpaceError::WindowInFullScreen(window_id));
        }
    }

    tracing::debug!(window_id, number, display_id, "spacegrid: moving window to space");
    state.detach_window(window_id);

    let placement = state.config.window_placement;
    if let Some(space) = state.spaces.get_mut(&target) {
        match placement {
            WindowPlacement::Back => space.window_ids.push(window_id),
            WindowPlacement::Front => space.window_ids.insert(0, window_id),
        }
    }
    if let Some(window) = state.windows.get_mut(&window_id) {
        window.space = Some(target);
        window.display_id = display_id;
    }
    Ok(())
}

/// Make a window frontmost within its space. Unknown windows are ignored.
pub fn on_set_front_window(state: &mut SpaceState, window_id: u32) {
    let Some(window) = state.windows.get(&window_id) else {
        tracing::trace!(window_id, "spacegrid: set front window ignored for unknown window");
        return;
    };

    match window.space {
        Some(uuid) => {
            if let Some(space) = state.spaces.get_mut(&uuid) {
                space.window_ids.retain(|id| *id != window_id);
                space.window_ids.insert(0, window_id);
            }
        }
        None => {
            state.sticky_window_ids.retain(|id| *id != window_id);
            state.sticky_window_ids.insert(0, window_id);
        }
    }
}

/// Move a window's frame origin. No bounds are enforced; unknown windows are
/// ignored.
pub fn on_move_window(state: &mut SpaceState, window_id: u32, x: f64, y: f64) {
    match state.windows.get_mut(&window_id) {
        Some(window) => window.frame = window.frame.with_origin(x, y),
        None => tracing::trace!(window_id, "spacegrid: move ignored for unknown window"),
    }
}

// ============================================================================
// Fullscreen
// ============================================================================

/// Put a window into its own fullscreen space and switch to it.
///
/// The space is appended to the window's display and remembers where the
/// window came from.
///
/// # Errors
///
/// Returns [`SpaceError::WindowInFullScreen`] if it already is, or
/// [`SpaceError::CapacityExceeded`] if the display is full.
pub fn on_enter_full_screen(
    state: &mut SpaceState,
    effects: &mut Effects,
    window_id: u32,
) -> SpaceResult<()> {
    let window = state.windows.get(&window_id).ok_or(SpaceError::WindowNotFound(window_id))?;
    if window.space.and_then(|uuid| state.kind_of(uuid)) == Some(SpaceKind::FullScreen) {
        return Err(SpaceError::WindowInFullScreen(window_id));
    }

    let grid = state.grid(window.display_id)?;
    let owner = grid.display_id;
    let max = state.max_spaces();
    if grid.total() >= max {
        return Err(SpaceError::CapacityExceeded { display_id: owner, max });
    }

    let origin = window
        .space
        .or(Some(grid.active))
        .filter(|uuid| state.kind_of(*uuid) == Some(SpaceKind::Desktop));
    let from = grid.active_number();
    let space = Space::full_screen(&window.app_name, window_id, origin);
    let uuid = space.uuid;

    tracing::debug!(window_id, display_id = owner, "spacegrid: entering fullscreen");
    state.detach_window(window_id);
    state.spaces.insert(uuid, space);
    if let Some(window) = state.windows.get_mut(&window_id) {
        window.space = Some(uuid);
    }

    let grid = state.grid_mut(owner)?;
    grid.slots.push(uuid);
    grid.active = uuid;
    let to = grid.len();

    effects.space_will_change(from, to, owner);
    effects.mark_layout_changed();
    Ok(())
}

/// Take a window out of fullscreen, closing its fullscreen space.
///
/// # Errors
///
/// Returns [`SpaceError::WindowNotInFullScreen`] if the window is not in a
/// fullscreen space.
pub fn on_exit_full_screen(
    state: &mut SpaceState,
    effects: &mut Effects,
    window_id: u32,
) -> SpaceResult<()> {
    let window = state.windows.get(&window_id).ok_or(SpaceError::WindowNotFound(window_id))?;
    let uuid = window
        .space
        .filter(|uuid| state.kind_of(*uuid) == Some(SpaceKind::FullScreen))
        .ok_or(SpaceError::WindowNotInFullScreen(window_id))?;

    tracing::debug!(window_id, "spacegrid: exiting fullscreen");
    close_full_screen_space(state, effects, uuid)
}

/// Remove a fullscreen space. Its windows return to the front of the origin
/// desktop, or the highest desktop if the origin is gone. If the space was
/// shown, the display switches to that desktop.
fn close_full_screen_space(
    state: &mut SpaceState,
    effects: &mut Effects,
    uuid: Uuid,
) -> SpaceResult<()> {
    let grid = state.grid_of_space(uuid).ok_or(SpaceError::UuidNotFound(uuid))?;
    let owner = grid.display_id;
    let was_active = grid.active == uuid;
    let from = grid.number_of(uuid).unwrap_or(0);
    let destination = state
        .spaces
        .get(&uuid)
        .and_then(|s| s.origin)
        .filter(|origin| {
            grid.contains(*origin) && state.kind_of(*origin) == Some(SpaceKind::Desktop)
        })
        .or_else(|| state.highest_desktop(grid))
        .ok_or(SpaceError::LastDesktop(owner))?;

    let space = state.spaces.remove(&uuid).ok_or(SpaceError::UuidNotFound(uuid))?;
    let grid = state.grid_mut(owner)?;
    grid.slots.retain(|id| *id != uuid);
    if was_active {
        grid.active = destination;
    }
    let to = grid.number_of(destination).unwrap_or(0);

    for window_id in &space.window_ids {
        if let Some(window) = state.windows.get_mut(window_id) {
            window.space = Some(destination);
        }
    }
    if let Some(destination) = state.spaces.get_mut(&destination) {
        destination.window_ids.insert_many(0, space.window_ids);
    }

    if was_active {
        effects.space_will_change(from, to, owner);
    }
    effects.mark_layout_changed();
    Ok(())
}
