//! Engine state.
//!
//! - [`types`]: displays, grids, spaces, windows, and event payloads
//! - [`space_state`]: the aggregate state, its lookups, queries, and invariants

mod space_state;
mod types;

pub use space_state::{SpaceState, order_displays};
pub use types::{
    AppBinding, Display, Grid, Rect, Space, SpaceChange, SpaceKind, Window, WindowEntry,
    WindowInfo,
};
