//! Grid handlers.
//!
//! These handlers manage grid shape, desktop count, space order within and
//! across displays, and switching between spaces.

use uuid::Uuid;

use super::Effects;
use crate::error::{SpaceError, SpaceResult};
use crate::state::{AppBinding, Space, SpaceKind, SpaceState};

// ============================================================================
// Grid Shape
// ============================================================================

/// Set the rows and columns of a display's grid.
///
/// Spaces are neither created nor destroyed. An unchanged shape succeeds
/// without notification.
///
/// # Errors
///
/// Returns [`SpaceError::InvalidGridShape`] if a dimension is zero or the
/// grid would hold more than the space limit.
pub fn on_set_grid_shape(
    state: &mut SpaceState,
    effects: &mut Effects,
    rows: u32,
    columns: u32,
    display_id: u32,
) -> SpaceResult<()> {
    let max = state.max_spaces();
    if rows == 0 || columns == 0 || rows.saturating_mul(columns) > max {
        return Err(SpaceError::InvalidGridShape { rows, columns, max });
    }

    let grid = state.grid_mut(display_id)?;
    if grid.rows == rows && grid.columns == columns {
        return Ok(());
    }

    tracing::debug!(
        display_id = grid.display_id,
        rows,
        columns,
        "spacegrid: changing grid shape"
    );
    grid.rows = rows;
    grid.columns = columns;
    effects.mark_layout_changed();
    Ok(())
}

/// Change the row count, keeping columns.
///
/// # Errors
///
/// See [`on_set_grid_shape`].
pub fn on_set_rows(
    state: &mut SpaceState,
    effects: &mut Effects,
    rows: u32,
    display_id: u32,
) -> SpaceResult<()> {
    let columns = state.grid(display_id)?.columns;
    on_set_grid_shape(state, effects, rows, columns, display_id)
}

/// Change the column count, keeping rows.
///
/// # Errors
///
/// See [`on_set_grid_shape`].
pub fn on_set_columns(
    state: &mut SpaceState,
    effects: &mut Effects,
    columns: u32,
    display_id: u32,
) -> SpaceResult<()> {
    let rows = state.grid(display_id)?.rows;
    on_set_grid_shape(state, effects, rows, columns, display_id)
}

// ============================================================================
// Desktop Count
// ============================================================================

/// Append up to `count` desktops, returning how many were added.
///
/// The count is clamped so the desktops fit the grid shape (minus the
/// fullscreen apps shown in the grid) and the display stays within the space
/// limit.
///
/// # Errors
///
/// Returns [`SpaceError::DisplayNotFound`] for unknown displays.
pub fn on_add_desktops(
    state: &mut SpaceState,
    effects: &mut Effects,
    count: u32,
    display_id: u32,
) -> SpaceResult<u32> {
    let grid = state.grid(display_id)?;
    let owner = grid.display_id;
    let room_in_shape = state.desktop_capacity(grid).saturating_sub(state.desktop_count(grid));
    let room_in_display = state.max_spaces().saturating_sub(grid.total());
    let added = count.min(room_in_shape).min(room_in_display);

    if added < count {
        tracing::debug!(
            display_id = owner,
            requested = count,
            added,
            "spacegrid: desktop count clamped"
        );
    }
    if added == 0 {
        return Ok(0);
    }

    let new_spaces: Vec<Space> = (0..added).map(|_| Space::desktop()).collect();
    let grid = state.grid_mut(owner)?;
    grid.slots.extend(new_spaces.iter().map(|s| s.uuid));
    state.spaces.extend(new_spaces.into_iter().map(|s| (s.uuid, s)));

    effects.mark_layout_changed();
    Ok(added)
}

/// Remove the `count` highest-numbered desktops.
///
/// Windows on removed desktops move to the back of the current space if it is
/// a retained desktop, otherwise to the new highest desktop. If the active
/// space is removed, the highest remaining desktop becomes active.
///
/// # Errors
///
/// Returns [`SpaceError::InvalidCount`] for a zero count and
/// [`SpaceError::LastDesktop`] if no desktop would remain.
pub fn on_remove_desktops(
    state: &mut SpaceState,
    effects: &mut Effects,
    count: u32,
    display_id: u32,
) -> SpaceResult<()> {
    if count == 0 {
        return Err(SpaceError::InvalidCount(0));
    }

    let grid = state.grid(display_id)?;
    let owner = grid.display_id;
    let desktops = state.desktops_of(grid);
    let count = count as usize;
    if count >= desktops.len() {
        return Err(SpaceError::LastDesktop(owner));
    }

    let keep = desktops.len() - count;
    let removed: Vec<Uuid> = desktops[keep..].to_vec();
    let new_highest = desktops[keep - 1];
    let active = grid.active;
    let active_removed = removed.contains(&active);
    let from_number = grid.active_number();
    let target = if !active_removed && state.kind_of(active) == Some(SpaceKind::Desktop) {
        active
    } else {
        new_highest
    };

    tracing::debug!(
        display_id = owner,
        count,
        active_removed,
        "spacegrid: removing desktops"
    );

    let mut displaced = Vec::new();
    for uuid in &removed {
        if let Some(space) = state.spaces.remove(uuid) {
            displaced.extend(space.window_ids);
        }
    }

    let grid = state.grid_mut(owner)?;
    grid.slots.retain(|id| !removed.contains(id));
    if active_removed {
        grid.active = new_highest;
    }
    let to_number = grid.active_number();

    for window_id in &displaced {
        if let Some(window) = state.windows.get_mut(window_id) {
            window.space = Some(target);
        }
    }
    if let Some(space) = state.spaces.get_mut(&target) {
        space.window_ids.extend(displaced);
    }

    state
        .app_bindings
        .retain(|_, binding| !matches!(binding, AppBinding::Space(id) if removed.contains(id)));

    if active_removed {
        effects.space_will_change(from_number, to_number, owner);
    }
    effects.mark_layout_changed();
    Ok(())
}

// ============================================================================
// Space Order
// ============================================================================

/// Move a desktop to another position on the same display.
///
/// Space 1 is fixed: it cannot be moved and nothing can be moved into it.
///
/// # Errors
///
/// Returns [`SpaceError::FixedSpace`] if either number is 1,
/// [`SpaceError::NotADesktop`] for non-desktops, or a range error.
pub fn on_move_space_to_position(
    state: &mut SpaceState,
    effects: &mut Effects,
    number: u32,
    position: u32,
    display_id: u32,
) -> SpaceResult<()> {
    if number == 1 || position == 1 {
        return Err(SpaceError::FixedSpace);
    }

    let space = state.space_at(number, display_id)?;
    let grid = state.grid(display_id)?;
    let owner = grid.display_id;
    if !space.is_desktop() {
        return Err(SpaceError::NotADesktop { number, display_id: owner });
    }
    if position == 0 || position > grid.len() {
        return Err(SpaceError::InvalidPosition { position, max: grid.len() });
    }
    if number == position {
        return Ok(());
    }

    tracing::debug!(display_id = owner, number, position, "spacegrid: moving space");
    let grid = state.grid_mut(owner)?;
    let uuid = grid.slots.remove(number as usize - 1);
    grid.slots.insert(position as usize - 1, uuid);

    effects.mark_layout_changed();
    Ok(())
}

/// Move a desktop from one display to a position on another.
///
/// The space keeps its uuid and its windows travel with it.
///
/// # Errors
///
/// Fails if displays share their spaces, if the space is slot 1, visible, or
/// not a desktop, if the position is 1 or past the end of the target plus
/// one, or if the target display is full.
pub fn on_move_space_to_display(
    state: &mut SpaceState,
    effects: &mut Effects,
    number: u32,
    from_display: u32,
    position: u32,
    to_display: u32,
) -> SpaceResult<()> {
    if !state.separate_spaces() {
        return Err(SpaceError::SeparationDisabled);
    }

    let from = state.grid_owner(from_display)?;
    let to = state.grid_owner(to_display)?;
    if from == to {
        return on_move_space_to_position(state, effects, number, position, from);
    }
    if number == 1 || position == 1 {
        return Err(SpaceError::FixedSpace);
    }

    let space = state.space_at(number, from)?;
    if !space.is_desktop() {
        return Err(SpaceError::NotADesktop { number, display_id: from });
    }
    let uuid = space.uuid;
    let window_ids = space.window_ids.clone();

    let source = state.grid(from)?;
    if source.active == uuid {
        return Err(SpaceError::SpaceVisible { number, display_id: from });
    }
    if state.desktop_count(source) <= 1 {
        return Err(SpaceError::LastDesktop(from));
    }

    let target = state.grid(to)?;
    let max = state.max_spaces();
    if position == 0 || position > target.len() + 1 {
        return Err(SpaceError::InvalidPosition { position, max: target.len() + 1 });
    }
    if target.total() >= max {
        return Err(SpaceError::CapacityExceeded { display_id: to, max });
    }

    tracing::debug!(from, to, number, position, "spacegrid: moving space across displays");
    state.grid_mut(from)?.slots.retain(|id| *id != uuid);
    state.grid_mut(to)?.slots.insert(position as usize - 1, uuid);
    for window_id in &window_ids {
        if let Some(window) = state.windows.get_mut(window_id) {
            window.display_id = to;
        }
    }

    effects.mark_layout_changed();
    Ok(())
}

// ============================================================================
// Switching
// ============================================================================

/// Switch the display to the given space.
///
/// Space-will-change fires before the switch becomes visible and names the
/// requested display, even when that display shares the main display's grid.
/// Switching to the current space succeeds silently.
///
/// # Errors
///
/// Returns [`SpaceError::SpaceNotFound`] if the number is not in use. Number 0
/// exists only when the dashboard is a space.
pub fn on_switch_to(
    state: &mut SpaceState,
    effects: &mut Effects,
    number: u32,
    display_id: u32,
) -> SpaceResult<()> {
    let requested = state.resolve_display(display_id)?;
    let uuid = state.uuid_at(number, display_id)?;
    let grid = state.grid_mut(display_id)?;
    if grid.active == uuid {
        return Ok(());
    }

    let from = grid.active_number();
    grid.active = uuid;
    tracing::debug!(display_id = requested, from, to = number, "spacegrid: switching space");
    effects.space_will_change(from, number, requested);
    Ok(())
}

/// Record whether the host is showing the overview grid.
///
/// The flag is cleared by the engine on every structural change.
pub const fn on_set_overview(state: &mut SpaceState, visible: bool) {
    state.overview_visible = visible;
}

#[cfg(test)]
mod tests {
    use spacegrid_shared::{DisplayConfig, EngineConfig, GridConfig};

    use super::*;
    use crate::state::{Rect, Window};

    fn config(rows: u32, columns: u32, desktops: u32) -> EngineConfig {
        EngineConfig {
            grid: GridConfig { rows, columns, desktops },
            displays: vec![
                DisplayConfig { id: 1, ..DisplayConfig::default() },
                DisplayConfig { id: 2, x: 1920, ..DisplayConfig::default() },
            ],
            ..EngineConfig::default()
        }
    }

    fn pin_window(state: &mut SpaceState, id: u32, number: u32, display_id: u32) {
        let space = state.uuid_at(number, display_id).unwrap();
        state.windows.insert(
            id,
            Window {
                id,
                app_name: "Notes".to_string(),
                bundle_id: "com.apple.Notes".to_string(),
                title: String::new(),
                frame: Rect::zero(),
                display_id,
                space: Some(space),
            },
        );
        state.spaces.get_mut(&space).unwrap().window_ids.push(id);
    }

    fn window_space(state: &SpaceState, id: u32) -> Option<u32> {
        state.windows[&id].space.and_then(|uuid| state.number_of(uuid))
    }

    #[test]
    fn test_set_grid_shape() {
        let mut state = SpaceState::new(config(1, 4, 4)).unwrap();
        let mut effects = Effects::default();

        on_set_grid_shape(&mut state, &mut effects, 2, 3, 1).unwrap();

        assert!(effects.layout_changed);
        assert_eq!(state.defined_rows(1).unwrap(), 2);
        assert_eq!(state.defined_columns(1).unwrap(), 3);
        assert_eq!(state.number_of_desktops(1).unwrap(), 4);
    }

    #[test]
    fn test_set_grid_shape_rejects_zero_and_oversize() {
        let mut state = SpaceState::new(config(1, 4, 4)).unwrap();
        let mut effects = Effects::default();

        assert!(on_set_grid_shape(&mut state, &mut effects, 0, 3, 1).is_err());
        assert!(on_set_grid_shape(&mut state, &mut effects, 5, 7, 1).is_err());
        assert!(effects.is_empty());
        assert_eq!(state.defined_rows(1).unwrap(), 1);
    }

    #[test]
    fn test_unchanged_shape_is_silent() {
        let mut state = SpaceState::new(config(1, 4, 4)).unwrap();
        let mut effects = Effects::default();

        on_set_rows(&mut state, &mut effects, 1, 1).unwrap();
        on_set_columns(&mut state, &mut effects, 4, 1).unwrap();
        assert!(effects.is_empty());
    }

    #[test]
    fn test_add_desktops_clamps_to_grid() {
        let mut state = SpaceState::new(config(2, 2, 3)).unwrap();
        let mut effects = Effects::default();

        let added = on_add_desktops(&mut state, &mut effects, 5, 1).unwrap();

        assert_eq!(added, 1);
        assert_eq!(state.number_of_desktops(1).unwrap(), 4);
        assert!(effects.layout_changed);
    }

    #[test]
    fn test_add_desktops_full_grid_adds_none() {
        let mut state = SpaceState::new(config(2, 2, 4)).unwrap();
        let mut effects = Effects::default();

        assert_eq!(on_add_desktops(&mut state, &mut effects, 2, 1).unwrap(), 0);
        assert_eq!(on_add_desktops(&mut state, &mut effects, 0, 1).unwrap(), 0);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_add_desktops_respects_fullscreens_in_grid() {
        let mut config = config(2, 2, 2);
        config.full_screens_in_grid = 1;
        let mut state = SpaceState::new(config).unwrap();
        let fullscreen = Space::full_screen("Safari", 1, None);
        state.grids[0].slots.push(fullscreen.uuid);
        state.spaces.insert(fullscreen.uuid, fullscreen);

        let added = on_add_desktops(&mut state, &mut Effects::default(), 4, 1).unwrap();
        assert_eq!(added, 1);
        assert_eq!(state.number_of_desktops(1).unwrap(), 3);
    }

    #[test]
    fn test_add_then_remove_restores_desktops() {
        let mut state = SpaceState::new(config(2, 4, 3)).unwrap();
        pin_window(&mut state, 10, 2, 1);
        pin_window(&mut state, 11, 3, 1);

        let added = on_add_desktops(&mut state, &mut Effects::default(), 3, 1).unwrap();
        on_remove_desktops(&mut state, &mut Effects::default(), added, 1).unwrap();

        assert_eq!(state.number_of_desktops(1).unwrap(), 3);
        assert_eq!(window_space(&state, 10), Some(2));
        assert_eq!(window_space(&state, 11), Some(3));
        state.validate().unwrap();
    }

    #[test]
    fn test_remove_desktops_rejects_zero_and_last() {
        let mut state = SpaceState::new(config(1, 4, 3)).unwrap();
        let mut effects = Effects::default();

        assert_eq!(
            on_remove_desktops(&mut state, &mut effects, 0, 1),
            Err(SpaceError::InvalidCount(0))
        );
        assert_eq!(
            on_remove_desktops(&mut state, &mut effects, 3, 1),
            Err(SpaceError::LastDesktop(1))
        );
    }

    #[test]
    fn test_remove_desktops_moves_windows_to_current_space() {
        let mut state = SpaceState::new(config(1, 4, 4)).unwrap();
        pin_window(&mut state, 20, 2, 1);
        pin_window(&mut state, 30, 3, 1);
        pin_window(&mut state, 31, 3, 1);
        pin_window(&mut state, 40, 4, 1);
        on_switch_to(&mut state, &mut Effects::default(), 1, 1).unwrap();

        on_remove_desktops(&mut state, &mut Effects::default(), 2, 1).unwrap();

        let space_one = state.uuid_at(1, 1).unwrap();
        let order: Vec<u32> = state.spaces[&space_one].window_ids.to_vec();
        assert_eq!(order, vec![30, 31, 40]);
        assert_eq!(window_space(&state, 20), Some(2));
    }

    #[test]
    fn test_remove_active_desktop_switches_once() {
        let mut state = SpaceState::new(config(1, 4, 4)).unwrap();
        on_switch_to(&mut state, &mut Effects::default(), 4, 1).unwrap();
        pin_window(&mut state, 40, 4, 1);
        let mut effects = Effects::default();

        on_remove_desktops(&mut state, &mut effects, 2, 1).unwrap();

        assert_eq!(effects.space_changes.len(), 1);
        assert_eq!(effects.space_changes[0].from, 4);
        assert_eq!(effects.space_changes[0].to, 2);
        assert_eq!(state.current_space_number(1).unwrap(), 2);
        assert_eq!(window_space(&state, 40), Some(2));
        state.validate().unwrap();
    }

    #[test]
    fn test_move_space_to_position() {
        let mut state = SpaceState::new(config(1, 4, 4)).unwrap();
        let uuid = state.uuid_at(4, 1).unwrap();
        let mut effects = Effects::default();

        on_move_space_to_position(&mut state, &mut effects, 4, 2, 1).unwrap();

        assert_eq!(state.uuid_at(2, 1).unwrap(), uuid);
        assert!(effects.layout_changed);
        assert_eq!(state.space_name(2, 1).unwrap(), "Desktop 2");
    }

    #[test]
    fn test_move_space_to_position_one_always_fails() {
        let mut state = SpaceState::new(config(1, 4, 4)).unwrap();
        for number in 1..=5 {
            assert!(
                on_move_space_to_position(&mut state, &mut Effects::default(), number, 1, 1)
                    .is_err()
            );
        }
        assert_eq!(
            on_move_space_to_position(&mut state, &mut Effects::default(), 1, 3, 1),
            Err(SpaceError::FixedSpace)
        );
    }

    #[test]
    fn test_move_space_to_position_out_of_range() {
        let mut state = SpaceState::new(config(1, 4, 4)).unwrap();
        assert!(on_move_space_to_position(&mut state, &mut Effects::default(), 3, 5, 1).is_err());
        assert!(on_move_space_to_position(&mut state, &mut Effects::default(), 7, 2, 1).is_err());
    }

    #[test]
    fn test_move_space_across_displays_keeps_uuid_and_windows() {
        let mut state = SpaceState::new(config(2, 4, 3)).unwrap();
        pin_window(&mut state, 50, 3, 1);
        let uuid = state.uuid_at(3, 1).unwrap();
        let mut effects = Effects::default();

        on_move_space_to_display(&mut state, &mut effects, 3, 1, 4, 2).unwrap();

        assert_eq!(state.uuid_at(4, 2).unwrap(), uuid);
        assert_eq!(state.number_of_desktops(1).unwrap(), 2);
        assert_eq!(state.windows[&50].display_id, 2);
        assert!(effects.layout_changed);
        state.validate().unwrap();
    }

    #[test]
    fn test_move_visible_space_across_displays_fails() {
        let mut state = SpaceState::new(config(2, 4, 3)).unwrap();
        on_switch_to(&mut state, &mut Effects::default(), 2, 1).unwrap();

        assert_eq!(
            on_move_space_to_display(&mut state, &mut Effects::default(), 2, 1, 2, 2),
            Err(SpaceError::SpaceVisible { number: 2, display_id: 1 })
        );
    }

    #[test]
    fn test_move_space_across_displays_position_rules() {
        let mut state = SpaceState::new(config(2, 4, 3)).unwrap();
        let mut effects = Effects::default();

        assert_eq!(
            on_move_space_to_display(&mut state, &mut effects, 3, 1, 1, 2),
            Err(SpaceError::FixedSpace)
        );
        assert!(on_move_space_to_display(&mut state, &mut effects, 3, 1, 5, 2).is_err());
        assert_eq!(
            on_move_space_to_display(&mut state, &mut effects, 1, 1, 2, 2),
            Err(SpaceError::FixedSpace)
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn test_move_space_across_displays_requires_separation() {
        let mut config = config(2, 4, 3);
        config.displays_have_separate_spaces = false;
        let mut state = SpaceState::new(config).unwrap();

        assert_eq!(
            on_move_space_to_display(&mut state, &mut Effects::default(), 3, 1, 2, 2),
            Err(SpaceError::SeparationDisabled)
        );
    }

    #[test]
    fn test_move_space_across_displays_full_target() {
        let mut state = SpaceState::new(config(4, 8, 3)).unwrap();
        let added = on_add_desktops(&mut state, &mut Effects::default(), 40, 2).unwrap();
        assert_eq!(added, 29);

        assert!(
            on_move_space_to_display(&mut state, &mut Effects::default(), 3, 1, 2, 2)
                .unwrap_err()
                .is_capacity()
        );
    }

    #[test]
    fn test_switch_to() {
        let mut state = SpaceState::new(config(1, 4, 4)).unwrap();
        let mut effects = Effects::default();

        on_switch_to(&mut state, &mut effects, 3, 1).unwrap();

        assert_eq!(state.current_space_number(1).unwrap(), 3);
        assert_eq!(effects.space_changes.len(), 1);
        assert_eq!(effects.space_changes[0].from, 1);
        assert_eq!(effects.space_changes[0].to, 3);
        assert_eq!(effects.space_changes[0].display_id, 1);
    }

    #[test]
    fn test_switch_to_reports_requested_display_on_shared_grid() {
        let mut config = config(1, 4, 4);
        config.displays_have_separate_spaces = false;
        let mut state = SpaceState::new(config).unwrap();
        let mut effects = Effects::default();

        on_switch_to(&mut state, &mut effects, 2, 2).unwrap();
        on_switch_to(&mut state, &mut effects, 3, 0).unwrap();

        assert_eq!(state.current_space_number(1).unwrap(), 3);
        assert_eq!(effects.space_changes[0].display_id, 2);
        assert_eq!(effects.space_changes[1].display_id, 1);
    }

    #[test]
    fn test_switch_to_current_space_is_silent() {
        let mut state = SpaceState::new(config(1, 4, 4)).unwrap();
        let mut effects = Effects::default();

        on_switch_to(&mut state, &mut effects, 1, 1).unwrap();
        assert!(effects.is_empty());
    }

    #[test]
    fn test_switch_to_dashboard() {
        let mut state = SpaceState::new(config(1, 4, 4)).unwrap();
        assert!(on_switch_to(&mut state, &mut Effects::default(), 0, 1).is_err());

        let mut config = config(1, 4, 4);
        config.dashboard_is_a_space = true;
        let mut state = SpaceState::new(config).unwrap();
        on_switch_to(&mut state, &mut Effects::default(), 0, 1).unwrap();
        assert_eq!(state.current_space_number(1).unwrap(), 0);
    }

    #[test]
    fn test_switch_to_missing_space() {
        let mut state = SpaceState::new(config(1, 4, 4)).unwrap();
        assert!(on_switch_to(&mut state, &mut Effects::default(), 5, 1).unwrap_err().is_not_found());
        assert!(on_switch_to(&mut state, &mut Effects::default(), 1, 42).unwrap_err().is_not_found());
    }
}
