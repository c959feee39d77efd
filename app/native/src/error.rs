//! Error types for the space engine.
//!
//! # Error Categories
//!
//! - **Lookup errors**: display, space, or window not found
//! - **Validation errors**: disallowed structural moves, bad counts, bad names
//! - **Capacity errors**: a display would exceed its space limit
//! - **Invariant violations**: a mutation produced inconsistent state and was discarded
//!
//! At the C boundary all of these collapse into the same sentinel values.

use spacegrid_shared::ConfigError;

use crate::actor::ActorError;

/// Result type alias for engine operations.
pub type SpaceResult<T> = Result<T, SpaceError>;

/// Errors produced while validating or applying an engine operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpaceError {
    /// No display with the given id is known.
    #[error("Display not found: {0}")]
    DisplayNotFound(u32),

    /// A topology update listed no displays.
    #[error("At least one display is required")]
    NoDisplays,

    /// No space with the given number exists on the display.
    #[error("Space {number} not found on display {display_id}")]
    SpaceNotFound { number: u32, display_id: u32 },

    /// No space carries the given uuid.
    #[error("Space not found: {0}")]
    UuidNotFound(uuid::Uuid),

    /// The window is not tracked by the engine.
    #[error("Window not found: {0}")]
    WindowNotFound(u32),

    /// The operation only applies to desktops.
    #[error("Space {number} on display {display_id} is not a desktop")]
    NotADesktop { number: u32, display_id: u32 },

    /// Space 1 of every grid cannot be moved, and nothing can be moved into it.
    #[error("Space 1 is fixed and cannot be moved")]
    FixedSpace,

    /// Target position is outside the allowed range.
    #[error("Position {position} is out of range 2..={max}")]
    InvalidPosition { position: u32, max: u32 },

    /// A count argument was rejected.
    #[error("Invalid count: {0}")]
    InvalidCount(u32),

    /// Grid dimensions are zero or exceed the space limit.
    #[error("Grid {rows}x{columns} is invalid (maximum {max} spaces)")]
    InvalidGridShape { rows: u32, columns: u32, max: u32 },

    /// The display would hold more spaces than allowed.
    #[error("Display {display_id} cannot hold more than {max} spaces")]
    CapacityExceeded { display_id: u32, max: u32 },

    /// The operation would leave the display without a desktop.
    #[error("Display {0} must keep at least one desktop")]
    LastDesktop(u32),

    /// A custom space name exceeds the byte limit.
    #[error("Space name is {0} bytes long, the limit is 255")]
    NameTooLong(usize),

    /// A space reference could not be parsed.
    #[error("Invalid space uuid: {0}")]
    InvalidUuid(String),

    /// Cross-display moves need displays to have separate spaces.
    #[error("Displays do not have separate spaces")]
    SeparationDisabled,

    /// The space is currently shown on its display.
    #[error("Space {number} is visible on display {display_id}")]
    SpaceVisible { number: u32, display_id: u32 },

    /// The window is the sole window of a fullscreen space.
    #[error("Window {0} is in fullscreen")]
    WindowInFullScreen(u32),

    /// The window is not in fullscreen.
    #[error("Window {0} is not in fullscreen")]
    WindowNotInFullScreen(u32),

    /// A mutation produced an inconsistent state; it was discarded.
    #[error("Invariant violated: {0}")]
    Invariant(String),
}

impl SpaceError {
    /// Creates an invariant violation with the given description.
    #[must_use]
    pub fn invariant(message: impl Into<String>) -> Self { Self::Invariant(message.into()) }

    /// Returns `true` if this error indicates a lookup miss.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DisplayNotFound(_)
                | Self::SpaceNotFound { .. }
                | Self::UuidNotFound(_)
                | Self::WindowNotFound(_)
        )
    }

    /// Returns `true` if this error is a capacity limit.
    #[must_use]
    pub const fn is_capacity(&self) -> bool {
        matches!(
            self,
            Self::CapacityExceeded { .. } | Self::InvalidGridShape { .. } | Self::LastDesktop(_)
        )
    }

    /// Returns `true` if the mutation was aborted by the invariant check.
    #[must_use]
    pub const fn is_invariant(&self) -> bool { matches!(self, Self::Invariant(_)) }
}

/// Top-level error for engine setup and calls through the engine handle.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The operation was rejected by the engine.
    #[error(transparent)]
    Space(#[from] SpaceError),

    /// The engine could not be reached.
    #[error(transparent)]
    Actor(#[from] ActorError),

    /// The configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The engine thread could not be started.
    #[error("Failed to start engine thread: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Returns `true` if the engine could not be reached at all.
    #[must_use]
    pub const fn is_transport(&self) -> bool { matches!(self, Self::Actor(_)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_error_display() {
        let err = SpaceError::SpaceNotFound { number: 5, display_id: 1 };
        assert_eq!(err.to_string(), "Space 5 not found on display 1");

        let err = SpaceError::NameTooLong(256);
        assert!(err.to_string().contains("256 bytes"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(SpaceError::DisplayNotFound(3).is_not_found());
        assert!(SpaceError::WindowNotFound(10).is_not_found());
        assert!(!SpaceError::FixedSpace.is_not_found());
    }

    #[test]
    fn test_is_capacity() {
        assert!(SpaceError::CapacityExceeded { display_id: 1, max: 16 }.is_capacity());
        assert!(SpaceError::LastDesktop(1).is_capacity());
        assert!(!SpaceError::InvalidCount(0).is_capacity());
    }

    #[test]
    fn test_invariant_helper() {
        let err = SpaceError::invariant("window 4 listed twice");
        assert!(err.is_invariant());
        assert!(err.to_string().contains("window 4 listed twice"));
    }

    #[test]
    fn test_engine_error_from_space_error() {
        let err: EngineError = SpaceError::FixedSpace.into();
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "Space 1 is fixed and cannot be moved");
    }

    #[test]
    fn test_engine_error_from_actor_error() {
        let err: EngineError = ActorError::SendFailed.into();
        assert!(err.is_transport());
    }
}
