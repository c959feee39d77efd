//! The space engine.
//!
//! `SpaceEngine` owns the authoritative [`SpaceState`] behind a read/write
//! lock. Each command runs against a scratch copy of the state:
//!
//! 1. the handler mutates the copy and records its [`Effects`]
//! 2. structural changes clear the overview flag
//! 3. the copy must pass [`SpaceState::validate`], otherwise it is discarded
//! 4. space-will-change handlers run while readers still see the old state
//! 5. the copy is committed
//! 6. layout-changed handlers run
//!
//! No lock is held while handlers run, so they may query through a
//! [`SpaceReader`].

use std::sync::Arc;

use parking_lot::RwLock;
use spacegrid_shared::EngineConfig;

use crate::actor::{Command, Outcome};
use crate::dispatch::Dispatcher;
use crate::error::SpaceResult;
use crate::handlers::{self, Effects};
use crate::state::{AppBinding, SpaceState};

/// Shared read access to the committed engine state.
#[derive(Clone, Debug)]
pub struct SpaceReader {
    state: Arc<RwLock<SpaceState>>,
}

impl SpaceReader {
    /// Run a query against the committed state.
    pub fn read<R>(&self, query: impl FnOnce(&SpaceState) -> R) -> R { query(&self.state.read()) }

    /// Copy of the committed state.
    #[must_use]
    pub fn snapshot(&self) -> SpaceState { self.state.read().clone() }
}

/// Applies commands to the engine state one at a time.
#[derive(Debug)]
pub struct SpaceEngine {
    state: Arc<RwLock<SpaceState>>,
    dispatcher: Arc<Dispatcher>,
}

impl SpaceEngine {
    /// Create an engine seeded from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the seeded state violates an invariant.
    pub fn new(config: EngineConfig) -> SpaceResult<Self> {
        Self::with_dispatcher(config, Arc::new(Dispatcher::new()))
    }

    /// Create an engine delivering notifications through `dispatcher`.
    ///
    /// # Errors
    ///
    /// Returns an error if the seeded state violates an invariant.
    pub fn with_dispatcher(config: EngineConfig, dispatcher: Arc<Dispatcher>) -> SpaceResult<Self> {
        let state = SpaceState::new(config)?;
        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            dispatcher,
        })
    }

    #[must_use]
    pub fn reader(&self) -> SpaceReader { SpaceReader { state: Arc::clone(&self.state) } }

    #[must_use]
    pub const fn dispatcher(&self) -> &Arc<Dispatcher> { &self.dispatcher }

    /// Apply a command.
    ///
    /// # Errors
    ///
    /// Returns the validation error of the command, or
    /// [`crate::SpaceError::Invariant`] if the result was inconsistent. State
    /// is unchanged on error.
    pub fn execute(&mut self, command: Command) -> SpaceResult<Outcome> {
        let name = command.name();
        match command {
            Command::SetDisplays { displays } => {
                self.apply(name, |s, e| handlers::on_set_displays(s, e, displays))?;
            }
            Command::SetName { space, name: new_name, display_id } => {
                self.apply(name, |s, e| handlers::on_set_name(s, e, space, display_id, &new_name))?;
            }
            Command::BindApp { bundle_id, target } => {
                let target = target
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .map(AppBinding::parse)
                    .transpose()?;
                self.apply(name, |s, _| handlers::on_bind_app(s, &bundle_id, target))?;
            }
            Command::SetGridShape { rows, columns, display_id } => {
                self.apply(name, |s, e| {
                    handlers::on_set_grid_shape(s, e, rows, columns, display_id)
                })?;
            }
            Command::SetRows { rows, display_id } => {
                self.apply(name, |s, e| handlers::on_set_rows(s, e, rows, display_id))?;
            }
            Command::SetColumns { columns, display_id } => {
                self.apply(name, |s, e| handlers::on_set_columns(s, e, columns, display_id))?;
            }
            Command::AddDesktops { count, display_id } => {
                let count =
                    self.apply(name, |s, e| handlers::on_add_desktops(s, e, count, display_id))?;
                return Ok(Outcome::Added { count });
            }
            Command::RemoveDesktops { count, display_id } => {
                self.apply(name, |s, e| handlers::on_remove_desktops(s, e, count, display_id))?;
            }
            Command::MoveSpaceToPosition { space, position, display_id } => {
                self.apply(name, |s, e| {
                    handlers::on_move_space_to_position(s, e, space, position, display_id)
                })?;
            }
            Command::MoveSpaceToDisplay { space, from_display, position, to_display } => {
                self.apply(name, |s, e| {
                    handlers::on_move_space_to_display(s, e, space, from_display, position, to_display)
                })?;
            }
            Command::SwitchTo { space, display_id } => {
                self.apply(name, |s, e| handlers::on_switch_to(s, e, space, display_id))?;
            }
            Command::MoveWindowToSpace { window_id, space, display_id } => {
                self.apply(name, |s, _| {
                    handlers::on_move_window_to_space(s, window_id, space, display_id)
                })?;
            }
            Command::SetFrontWindow { window_id } => {
                self.apply(name, |s, _| {
                    handlers::on_set_front_window(s, window_id);
                    Ok(())
                })?;
            }
            Command::MoveWindow { window_id, x, y } => {
                self.apply(name, |s, _| {
                    handlers::on_move_window(s, window_id, x, y);
                    Ok(())
                })?;
            }
            Command::TrackWindow { window } => {
                self.apply(name, |s, _| handlers::on_track_window(s, window))?;
            }
            Command::UntrackWindow { window_id } => {
                self.apply(name, |s, e| handlers::on_untrack_window(s, e, window_id))?;
            }
            Command::UpdateWindow { window_id, title, frame } => {
                self.apply(name, |s, _| handlers::on_update_window(s, window_id, title, frame))?;
            }
            Command::EnterFullScreen { window_id } => {
                self.apply(name, |s, e| handlers::on_enter_full_screen(s, e, window_id))?;
            }
            Command::ExitFullScreen { window_id } => {
                self.apply(name, |s, e| handlers::on_exit_full_screen(s, e, window_id))?;
            }
            Command::SetOverview { visible } => {
                self.apply(name, |s, _| {
                    handlers::on_set_overview(s, visible);
                    Ok(())
                })?;
            }
        }
        Ok(Outcome::Done)
    }

    fn apply<T>(
        &mut self,
        name: &'static str,
        operation: impl FnOnce(&mut SpaceState, &mut Effects) -> SpaceResult<T>,
    ) -> SpaceResult<T> {
        let mut scratch = self.state.read().clone();
        let mut effects = Effects::default();

        let value = operation(&mut scratch, &mut effects).inspect_err(|err| {
            tracing::warn!(command = name, error = %err, "spacegrid: command rejected");
        })?;

        if effects.layout_changed {
            scratch.overview_visible = false;
        }
        scratch.validate().inspect_err(|err| {
            tracing::error!(command = name, error = %err, "spacegrid: mutation discarded");
        })?;

        for change in &effects.space_changes {
            self.dispatcher.dispatch_space_will_change(*change);
        }
        *self.state.write() = scratch;
        if effects.layout_changed {
            self.dispatcher.dispatch_layout_changed();
        }

        tracing::debug!(command = name, "spacegrid: command applied");
        Ok(value)
    }
}
