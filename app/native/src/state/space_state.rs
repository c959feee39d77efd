//! The engine's complete state.
//!
//! `SpaceState` is plain data. Mutations are applied to a clone and only
//! committed once [`SpaceState::validate`] accepts the result, so readers
//! never observe a partially applied change.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use spacegrid_shared::EngineConfig;
use uuid::Uuid;

use super::types::{AppBinding, Display, Grid, Space, SpaceKind, Window, WindowEntry};
use crate::error::{SpaceError, SpaceResult};

/// All engine state: displays, grids, spaces, windows, and app bindings.
#[derive(Clone, Debug)]
pub struct SpaceState {
    /// Configuration the engine was seeded with.
    pub config: Arc<EngineConfig>,

    /// Known displays, main display first.
    pub displays: Vec<Display>,

    /// One grid per display, or a single grid for the main display when
    /// displays share their spaces.
    pub grids: Vec<Grid>,

    /// All spaces, keyed by uuid.
    pub spaces: HashMap<Uuid, Space>,

    /// All tracked windows, keyed by window id.
    pub windows: HashMap<u32, Window>,

    /// Windows shown on all spaces, front to back.
    pub sticky_window_ids: Vec<u32>,

    /// Placement rules keyed by bundle id.
    pub app_bindings: HashMap<String, AppBinding>,

    /// Whether the host is showing the overview grid.
    pub overview_visible: bool,
}

impl SpaceState {
    /// Create the initial state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the seeded state violates an invariant.
    pub fn new(config: EngineConfig) -> SpaceResult<Self> {
        let mut displays: Vec<Display> = config.displays.iter().map(Display::from).collect();
        if displays.is_empty() {
            displays.push(Display::from(&spacegrid_shared::DisplayConfig::default()));
        }

        let mut state = Self {
            config: Arc::new(config),
            displays: order_displays(displays),
            grids: Vec::new(),
            spaces: HashMap::new(),
            windows: HashMap::new(),
            sticky_window_ids: Vec::new(),
            app_bindings: HashMap::new(),
            overview_visible: false,
        };

        let owners: Vec<u32> = if state.config.displays_have_separate_spaces {
            state.displays.iter().map(|d| d.id).collect()
        } else {
            vec![state.main_display_id()]
        };
        for display_id in owners {
            state.seed_grid(display_id);
        }

        state.validate()?;
        Ok(state)
    }

    /// Create a fresh grid for a display from its configured shape.
    pub fn seed_grid(&mut self, display_id: u32) {
        let shape = self.config.grid_for(display_id);
        let dashboard = self.config.dashboard_is_a_space.then(Space::dashboard);
        let limit = self.max_spaces() - u32::from(dashboard.is_some());
        let desktops = shape.seeded_desktops().min(limit).max(1);

        let mut slots = Vec::with_capacity(desktops as usize);
        for _ in 0..desktops {
            let space = Space::desktop();
            slots.push(space.uuid);
            self.spaces.insert(space.uuid, space);
        }

        let dashboard = dashboard.map(|space| {
            let uuid = space.uuid;
            self.spaces.insert(uuid, space);
            uuid
        });

        let active = slots[0];
        self.grids.push(Grid {
            display_id,
            rows: shape.rows,
            columns: shape.columns,
            slots,
            dashboard,
            active,
        });
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    #[must_use]
    pub fn separate_spaces(&self) -> bool { self.config.displays_have_separate_spaces }

    #[must_use]
    pub fn max_spaces(&self) -> u32 { self.config.max_spaces() }

    #[must_use]
    pub fn dashboard_is_a_space(&self) -> bool { self.config.dashboard_is_a_space }

    // ========================================================================
    // Display Lookups
    // ========================================================================

    /// The main display. Displays are kept main-first.
    #[must_use]
    pub fn main_display_id(&self) -> u32 { self.displays.first().map_or(0, |d| d.id) }

    /// Resolve a display id, treating 0 as the main display.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::DisplayNotFound`] for unknown displays.
    pub fn resolve_display(&self, display_id: u32) -> SpaceResult<u32> {
        if display_id == 0 {
            return Ok(self.main_display_id());
        }
        if self.displays.iter().any(|d| d.id == display_id) {
            Ok(display_id)
        } else {
            Err(SpaceError::DisplayNotFound(display_id))
        }
    }

    /// The display owning the grid used by `display_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::DisplayNotFound`] for unknown displays.
    pub fn grid_owner(&self, display_id: u32) -> SpaceResult<u32> {
        let resolved = self.resolve_display(display_id)?;
        Ok(if self.separate_spaces() { resolved } else { self.main_display_id() })
    }

    #[must_use]
    pub fn display(&self, display_id: u32) -> Option<&Display> {
        let id = self.resolve_display(display_id).ok()?;
        self.displays.iter().find(|d| d.id == id)
    }

    // ========================================================================
    // Grid & Space Lookups
    // ========================================================================

    /// Grid used by a display.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::DisplayNotFound`] for unknown displays.
    pub fn grid(&self, display_id: u32) -> SpaceResult<&Grid> {
        let owner = self.grid_owner(display_id)?;
        self.grids
            .iter()
            .find(|g| g.display_id == owner)
            .ok_or(SpaceError::DisplayNotFound(owner))
    }

    /// Mutable grid used by a display.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::DisplayNotFound`] for unknown displays.
    pub fn grid_mut(&mut self, display_id: u32) -> SpaceResult<&mut Grid> {
        let owner = self.grid_owner(display_id)?;
        self.grids
            .iter_mut()
            .find(|g| g.display_id == owner)
            .ok_or(SpaceError::DisplayNotFound(owner))
    }

    /// Grid holding the given space.
    #[must_use]
    pub fn grid_of_space(&self, uuid: Uuid) -> Option<&Grid> {
        self.grids.iter().find(|g| g.contains(uuid))
    }

    /// Space shown as `number` on a display.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::SpaceNotFound`] if the number is not in use.
    pub fn uuid_at(&self, number: u32, display_id: u32) -> SpaceResult<Uuid> {
        let grid = self.grid(display_id)?;
        grid.uuid_at(number).ok_or(SpaceError::SpaceNotFound {
            number,
            display_id: grid.display_id,
        })
    }

    /// Space shown as `number` on a display.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::SpaceNotFound`] if the number is not in use.
    pub fn space_at(&self, number: u32, display_id: u32) -> SpaceResult<&Space> {
        let uuid = self.uuid_at(number, display_id)?;
        self.spaces.get(&uuid).ok_or(SpaceError::UuidNotFound(uuid))
    }

    /// Number of a space within its grid.
    #[must_use]
    pub fn number_of(&self, uuid: Uuid) -> Option<u32> {
        self.grid_of_space(uuid).and_then(|g| g.number_of(uuid))
    }

    #[must_use]
    pub fn kind_of(&self, uuid: Uuid) -> Option<SpaceKind> { self.spaces.get(&uuid).map(|s| s.kind) }

    /// Desktops of a grid, in number order.
    #[must_use]
    pub fn desktops_of(&self, grid: &Grid) -> Vec<Uuid> {
        grid.slots
            .iter()
            .copied()
            .filter(|id| self.kind_of(*id) == Some(SpaceKind::Desktop))
            .collect()
    }

    /// Fullscreen app spaces of a grid.
    #[must_use]
    pub fn full_screen_count(&self, grid: &Grid) -> u32 {
        let count = grid
            .slots
            .iter()
            .filter(|id| self.kind_of(**id) == Some(SpaceKind::FullScreen))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn desktop_count(&self, grid: &Grid) -> u32 {
        u32::try_from(self.desktops_of(grid).len()).unwrap_or(u32::MAX)
    }

    /// Fullscreen spaces that take a slot in the grid.
    #[must_use]
    pub fn full_screens_in_grid(&self, grid: &Grid) -> u32 {
        self.full_screen_count(grid).min(self.config.full_screens_in_grid)
    }

    /// How many desktops fit the grid shape.
    #[must_use]
    pub fn desktop_capacity(&self, grid: &Grid) -> u32 {
        grid.capacity().saturating_sub(self.full_screens_in_grid(grid))
    }

    /// Index of a desktop among the desktops of its grid.
    #[must_use]
    pub fn desktop_index(&self, grid: &Grid, uuid: Uuid) -> Option<usize> {
        self.desktops_of(grid).iter().position(|id| *id == uuid)
    }

    /// Highest-numbered desktop of a grid.
    #[must_use]
    pub fn highest_desktop(&self, grid: &Grid) -> Option<Uuid> {
        self.desktops_of(grid).last().copied()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Number of the space shown on a display.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::DisplayNotFound`] for unknown displays.
    pub fn current_space_number(&self, display_id: u32) -> SpaceResult<u32> {
        Ok(self.grid(display_id)?.active_number())
    }

    /// Custom name of a space, or its default name.
    ///
    /// # Errors
    ///
    /// Returns an error if the space does not exist.
    pub fn space_name(&self, number: u32, display_id: u32) -> SpaceResult<String> {
        let grid = self.grid(display_id)?;
        let space = self.space_at(number, display_id)?;
        Ok(space.display_name(self.desktop_index(grid, space.uuid)))
    }

    /// Custom name of a space, empty if none was set.
    ///
    /// # Errors
    ///
    /// Returns an error if the space does not exist.
    pub fn custom_name(&self, number: u32, display_id: u32) -> SpaceResult<String> {
        Ok(self.space_at(number, display_id)?.custom_name.clone().unwrap_or_default())
    }

    /// Kind of a space.
    ///
    /// # Errors
    ///
    /// Returns an error if the space does not exist.
    pub fn space_kind(&self, number: u32, display_id: u32) -> SpaceResult<SpaceKind> {
        Ok(self.space_at(number, display_id)?.kind)
    }

    /// Total spaces on a display, dashboard included.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::DisplayNotFound`] for unknown displays.
    pub fn number_of_spaces(&self, display_id: u32) -> SpaceResult<u32> {
        Ok(self.grid(display_id)?.total())
    }

    /// # Errors
    ///
    /// Returns [`SpaceError::DisplayNotFound`] for unknown displays.
    pub fn number_of_desktops(&self, display_id: u32) -> SpaceResult<u32> {
        Ok(self.desktop_count(self.grid(display_id)?))
    }

    /// # Errors
    ///
    /// Returns [`SpaceError::DisplayNotFound`] for unknown displays.
    pub fn number_of_full_screens(&self, display_id: u32) -> SpaceResult<u32> {
        Ok(self.full_screen_count(self.grid(display_id)?))
    }

    /// # Errors
    ///
    /// Returns [`SpaceError::DisplayNotFound`] for unknown displays.
    pub fn number_of_full_screens_in_grid(&self, display_id: u32) -> SpaceResult<u32> {
        Ok(self.full_screens_in_grid(self.grid(display_id)?))
    }

    /// # Errors
    ///
    /// Returns [`SpaceError::DisplayNotFound`] for unknown displays.
    pub fn defined_rows(&self, display_id: u32) -> SpaceResult<u32> { Ok(self.grid(display_id)?.rows) }

    /// # Errors
    ///
    /// Returns [`SpaceError::DisplayNotFound`] for unknown displays.
    pub fn defined_columns(&self, display_id: u32) -> SpaceResult<u32> {
        Ok(self.grid(display_id)?.columns)
    }

    /// Width and height of a display.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::DisplayNotFound`] for unknown displays.
    pub fn metrics(&self, display_id: u32) -> SpaceResult<(u32, u32)> {
        self.display(display_id)
            .map(|d| (d.width, d.height))
            .ok_or(SpaceError::DisplayNotFound(display_id))
    }

    /// All windows, grouped by display (main first), then by space number,
    /// front to back within a space. Windows on all spaces follow the windows
    /// of their display's current space.
    #[must_use]
    pub fn list_windows(&self) -> Vec<WindowEntry> {
        let mut entries = Vec::with_capacity(self.windows.len());

        for display in &self.displays {
            let Ok(grid) = self.grid(display.id) else {
                continue;
            };
            let numbered = grid
                .dashboard
                .iter()
                .map(|id| (0, *id))
                .chain(grid.slots.iter().zip(1..).map(|(id, n)| (n, *id)));

            for (number, uuid) in numbered {
                let Some(space) = self.spaces.get(&uuid) else {
                    continue;
                };
                for window_id in &space.window_ids {
                    if let Some(window) = self.windows.get(window_id)
                        && window.display_id == display.id
                    {
                        entries.push(window_entry(window, Some(number)));
                    }
                }

                if uuid == grid.active {
                    entries.extend(
                        self.sticky_window_ids
                            .iter()
                            .filter_map(|id| self.windows.get(id))
                            .filter(|w| w.display_id == display.id)
                            .map(|w| window_entry(w, None)),
                    );
                }
            }
        }

        entries
    }

    /// Remove a window from whatever ordering list holds it.
    pub fn detach_window(&mut self, window_id: u32) {
        let space = self.windows.get(&window_id).and_then(|w| w.space);
        match space {
            Some(uuid) => {
                if let Some(space) = self.spaces.get_mut(&uuid) {
                    space.window_ids.retain(|id| *id != window_id);
                }
            }
            None => self.sticky_window_ids.retain(|id| *id != window_id),
        }
    }

    // ========================================================================
    // Invariants
    // ========================================================================

    /// Check every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::Invariant`] describing the first violation found.
    #[allow(clippy::too_many_lines)]
    pub fn validate(&self) -> SpaceResult<()> {
        if self.displays.is_empty() {
            return Err(SpaceError::invariant("no displays"));
        }

        let expected_owners: Vec<u32> = if self.separate_spaces() {
            self.displays.iter().map(|d| d.id).collect()
        } else {
            vec![self.main_display_id()]
        };
        if self.grids.len() != expected_owners.len()
            || !expected_owners.iter().all(|id| self.grids.iter().any(|g| g.display_id == *id))
        {
            return Err(SpaceError::invariant("grids do not match display topology"));
        }

        let max = self.max_spaces();
        let mut seen_spaces = HashSet::with_capacity(self.spaces.len());

        for grid in &self.grids {
            let display_id = grid.display_id;
            if grid.rows == 0 || grid.columns == 0 || grid.capacity() > max {
                return Err(SpaceError::invariant(format!(
                    "display {display_id} has an invalid {}x{} grid",
                    grid.rows, grid.columns
                )));
            }
            if grid.total() > max {
                return Err(SpaceError::invariant(format!(
                    "display {display_id} holds {} spaces, more than {max}",
                    grid.total()
                )));
            }

            for uuid in grid.slots.iter().chain(grid.dashboard.iter()) {
                if !seen_spaces.insert(*uuid) {
                    return Err(SpaceError::invariant(format!("space {uuid} appears twice")));
                }
                if !self.spaces.contains_key(uuid) {
                    return Err(SpaceError::invariant(format!("space {uuid} does not exist")));
                }
            }

            match grid.slots.first().and_then(|id| self.kind_of(*id)) {
                Some(SpaceKind::Desktop) => {}
                _ => {
                    return Err(SpaceError::invariant(format!(
                        "space 1 on display {display_id} is not a desktop"
                    )));
                }
            }
            if grid.slots.iter().any(|id| self.kind_of(*id) == Some(SpaceKind::Dashboard)) {
                return Err(SpaceError::invariant(format!(
                    "dashboard numbered as a slot on display {display_id}"
                )));
            }
            if let Some(dashboard) = grid.dashboard
                && self.kind_of(dashboard) != Some(SpaceKind::Dashboard)
            {
                return Err(SpaceError::invariant(format!(
                    "space 0 on display {display_id} is not the dashboard"
                )));
            }
            if !grid.contains(grid.active) {
                return Err(SpaceError::invariant(format!(
                    "active space of display {display_id} is not in its grid"
                )));
            }
        }

        if seen_spaces.len() != self.spaces.len() {
            return Err(SpaceError::invariant("a space is not placed in any grid"));
        }

        let mut ordered_windows = HashSet::with_capacity(self.windows.len());
        for space in self.spaces.values() {
            for window_id in &space.window_ids {
                if !ordered_windows.insert(*window_id) {
                    return Err(SpaceError::invariant(format!("window {window_id} listed twice")));
                }
                match self.windows.get(window_id) {
                    Some(window) if window.space == Some(space.uuid) => {}
                    _ => {
                        return Err(SpaceError::invariant(format!(
                            "window {window_id} is ordered in a space it does not belong to"
                        )));
                    }
                }
            }
        }
        for window_id in &self.sticky_window_ids {
            if !ordered_windows.insert(*window_id) {
                return Err(SpaceError::invariant(format!("window {window_id} listed twice")));
            }
            match self.windows.get(window_id) {
                Some(window) if window.space.is_none() => {}
                _ => {
                    return Err(SpaceError::invariant(format!(
                        "window {window_id} is ordered on all spaces but pinned to one"
                    )));
                }
            }
        }
        if ordered_windows.len() != self.windows.len() {
            return Err(SpaceError::invariant("a window is missing from the z-order"));
        }

        for window in self.windows.values() {
            if !self.displays.iter().any(|d| d.id == window.display_id) {
                return Err(SpaceError::invariant(format!(
                    "window {} is on unknown display {}",
                    window.id, window.display_id
                )));
            }
            if let Some(uuid) = window.space {
                if self.kind_of(uuid) == Some(SpaceKind::Dashboard) {
                    return Err(SpaceError::invariant(format!(
                        "window {} is on the dashboard",
                        window.id
                    )));
                }
                if self.separate_spaces()
                    && self.grid_of_space(uuid).map(|g| g.display_id) != Some(window.display_id)
                {
                    return Err(SpaceError::invariant(format!(
                        "window {} is on a space of another display",
                        window.id
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Order displays main-first. Main is the display at the global origin, or
/// the first listed display if none is.
#[must_use]
pub fn order_displays(mut displays: Vec<Display>) -> Vec<Display> {
    if let Some(index) = displays.iter().position(Display::is_at_origin)
        && index > 0
    {
        let main = displays.remove(index);
        displays.insert(0, main);
    }
    displays
}

fn window_entry(window: &Window, space_number: Option<u32>) -> WindowEntry {
    WindowEntry {
        window_id: window.id,
        app_name: window.app_name.clone(),
        title: window.title.clone(),
        frame: window.frame.to_frame_string(),
        is_on_all_spaces: window.is_on_all_spaces(),
        display_id: window.display_id,
        space_number,
    }
}
