//! Display topology handlers.
//!
//! A topology update never fails on its own account: new displays receive a
//! freshly seeded grid, and spaces of displays that went away migrate to the
//! main display.

use std::collections::HashSet;

use uuid::Uuid;

use super::Effects;
use crate::error::{SpaceError, SpaceResult};
use crate::state::{Display, Grid, SpaceState, order_displays};

/// Replace the display topology.
///
/// # Errors
///
/// Returns [`SpaceError::NoDisplays`] for an empty list and
/// [`SpaceError::DisplayNotFound`] if a display uses the reserved id 0.
pub fn on_set_displays(
    state: &mut SpaceState,
    effects: &mut Effects,
    displays: Vec<Display>,
) -> SpaceResult<()> {
    if displays.is_empty() {
        return Err(SpaceError::NoDisplays);
    }
    if displays.iter().any(|d| d.id == 0) {
        return Err(SpaceError::DisplayNotFound(0));
    }

    let mut seen = HashSet::with_capacity(displays.len());
    let displays: Vec<Display> = displays.into_iter().filter(|d| seen.insert(d.id)).collect();
    let displays = order_displays(displays);
    let main_id = displays[0].id;

    tracing::debug!(
        count = displays.len(),
        main = main_id,
        "spacegrid: applying display topology"
    );

    state.displays = displays;

    if state.separate_spaces() {
        let (kept, orphaned): (Vec<Grid>, Vec<Grid>) =
            std::mem::take(&mut state.grids).into_iter().partition(|g| seen.contains(&g.display_id));
        state.grids = kept;

        let missing: Vec<u32> = state
            .displays
            .iter()
            .map(|d| d.id)
            .filter(|id| !state.grids.iter().any(|g| g.display_id == *id))
            .collect();
        for display_id in missing {
            tracing::debug!(display_id, "spacegrid: seeding grid for new display");
            state.seed_grid(display_id);
        }

        for grid in orphaned {
            migrate_grid(state, grid, main_id)?;
        }
    } else if let Some(grid) = state.grids.first_mut() {
        grid.display_id = main_id;
    }

    for window in state.windows.values_mut() {
        if !seen.contains(&window.display_id) {
            window.display_id = main_id;
        }
    }

    effects.mark_layout_changed();
    Ok(())
}

/// Move the spaces of a removed display onto `target`. Spaces that do not fit
/// are merged into the target's highest desktop.
fn migrate_grid(state: &mut SpaceState, grid: Grid, target: u32) -> SpaceResult<()> {
    if let Some(dashboard) = grid.dashboard {
        state.spaces.remove(&dashboard);
    }

    let max = state.max_spaces();
    for uuid in grid.slots {
        if state.grid(target)?.total() < max {
            state.grid_mut(target)?.slots.push(uuid);
            continue;
        }

        tracing::warn!(
            from = grid.display_id,
            to = target,
            "spacegrid: display is full, merging migrated space into its highest desktop"
        );
        merge_into_highest_desktop(state, uuid, target)?;
    }

    Ok(())
}

fn merge_into_highest_desktop(state: &mut SpaceState, uuid: Uuid, target: u32) -> SpaceResult<()> {
    let destination = {
        let grid = state.grid(target)?;
        state.highest_desktop(grid).ok_or(SpaceError::LastDesktop(target))?
    };
    let Some(space) = state.spaces.remove(&uuid) else {
        return Ok(());
    };

    for window_id in &space.window_ids {
        if let Some(window) = state.windows.get_mut(window_id) {
            window.space = Some(destination);
        }
    }
    if let Some(destination) = state.spaces.get_mut(&destination) {
        destination.window_ids.extend(space.window_ids);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use spacegrid_shared::{DisplayConfig, EngineConfig, GridConfig};

    use super::*;
    use crate::state::{Rect, Window};

    fn display(id: u32, x: i32) -> Display {
        Display {
            id,
            name: format!("Display {id}"),
            width: 2560,
            height: 1440,
            x,
            y: 0,
        }
    }

    fn config(separate: bool, desktops: u32) -> EngineConfig {
        EngineConfig {
            displays_have_separate_spaces: separate,
            grid: GridConfig { rows: 2, columns: 4, desktops },
            displays: vec![
                DisplayConfig { id: 1, ..DisplayConfig::default() },
                DisplayConfig { id: 2, x: 1920, ..DisplayConfig::default() },
            ],
            ..EngineConfig::default()
        }
    }

    fn pin_window(state: &mut SpaceState, id: u32, space: Uuid, display_id: u32) {
        state.windows.insert(
            id,
            Window {
                id,
                app_name: "Terminal".to_string(),
                bundle_id: "com.apple.Terminal".to_string(),
                title: String::new(),
                frame: Rect::zero(),
                display_id,
                space: Some(space),
            },
        );
        state.spaces.get_mut(&space).unwrap().window_ids.push(id);
    }

    #[test]
    fn test_new_display_gets_seeded_grid() {
        let mut state = SpaceState::new(config(true, 2)).unwrap();
        let mut effects = Effects::default();

        on_set_displays(
            &mut state,
            &mut effects,
            vec![display(1, 0), display(2, 1920), display(3, -1920)],
        )
        .unwrap();

        assert!(effects.layout_changed);
        assert_eq!(state.grids.len(), 3);
        assert_eq!(state.number_of_desktops(3).unwrap(), 2);
        state.validate().unwrap();
    }

    #[test]
    fn test_removed_display_spaces_migrate_to_main() {
        let mut state = SpaceState::new(config(true, 3)).unwrap();
        let moved = state.uuid_at(2, 2).unwrap();
        pin_window(&mut state, 50, moved, 2);
        let mut effects = Effects::default();

        on_set_displays(&mut state, &mut effects, vec![display(1, 0)]).unwrap();

        assert_eq!(state.grids.len(), 1);
        assert_eq!(state.number_of_desktops(1).unwrap(), 6);
        assert_eq!(state.number_of(moved), Some(5));
        assert_eq!(state.windows[&50].display_id, 1);
        state.validate().unwrap();
    }

    #[test]
    fn test_overflowing_spaces_merge_into_highest_desktop() {
        let mut state = SpaceState::new(EngineConfig {
            grid: GridConfig { rows: 4, columns: 8, desktops: 30 },
            ..config(true, 30)
        })
        .unwrap();
        let mut effects = Effects::default();
        let overflow = state.uuid_at(30, 2).unwrap();
        pin_window(&mut state, 77, overflow, 2);

        on_set_displays(&mut state, &mut effects, vec![display(1, 0)]).unwrap();

        let grid = state.grid(1).unwrap();
        assert_eq!(grid.total(), state.max_spaces());
        let highest = state.highest_desktop(grid).unwrap();
        assert_eq!(state.windows[&77].space, Some(highest));
        assert!(!state.spaces.contains_key(&overflow));
        state.validate().unwrap();
    }

    #[test]
    fn test_shared_grid_follows_new_main_display() {
        let mut state = SpaceState::new(config(false, 3)).unwrap();
        let mut effects = Effects::default();

        on_set_displays(&mut state, &mut effects, vec![display(2, 0)]).unwrap();

        assert_eq!(state.main_display_id(), 2);
        assert_eq!(state.grids[0].display_id, 2);
        assert_eq!(state.number_of_desktops(0).unwrap(), 3);
        state.validate().unwrap();
    }

    #[test]
    fn test_empty_topology_is_rejected() {
        let mut state = SpaceState::new(config(true, 3)).unwrap();
        let mut effects = Effects::default();
        assert_eq!(
            on_set_displays(&mut state, &mut effects, Vec::new()),
            Err(SpaceError::NoDisplays)
        );
    }

    #[test]
    fn test_duplicate_displays_are_collapsed() {
        let mut state = SpaceState::new(config(true, 3)).unwrap();
        let mut effects = Effects::default();

        on_set_displays(&mut state, &mut effects, vec![display(1, 0), display(1, 0)]).unwrap();
        assert_eq!(state.displays.len(), 1);
        state.validate().unwrap();
    }
}
