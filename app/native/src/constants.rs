//! Engine constants.
//!
//! Constants are grouped by functionality:
//! - `naming` - Space name limits and default names
//! - `actor` - Engine thread and channel parameters

pub use spacegrid_shared::{MAX_SPACES, MAX_SPACES_SEPARATE_DISPLAYS};

/// Space naming.
pub mod naming {
    /// Maximum length of a custom space name, in UTF-8 bytes.
    pub const MAX_NAME_BYTES: usize = 255;

    /// Prefix of the default desktop name ("Desktop 3").
    pub const DESKTOP_PREFIX: &str = "Desktop";

    /// Default name of the dashboard space.
    pub const DASHBOARD: &str = "Dashboard";

    /// App binding target that places an app on every space.
    pub const ALL_SPACES: &str = "AllSpaces";
}

/// Engine thread parameters.
pub mod actor {
    /// Channel buffer size for the engine actor.
    pub const CHANNEL_BUFFER_SIZE: usize = 256;

    /// Name given to the engine thread.
    pub const THREAD_NAME: &str = "spacegrid-engine";
}
