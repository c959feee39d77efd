//! Notification dispatcher.
//!
//! Each event kind has a single subscriber slot. Subscribing replaces the
//! previous handler; the slot is read at dispatch time, so a replacement
//! takes effect for every later event but never for one already being
//! delivered.
//!
//! ```text
//!  SpaceEngine ──(pre-commit)──▶ space-will-change(from, to, display)
//!       │
//!       └────────(post-commit)─▶ layout-changed()
//! ```
//!
//! Handlers run synchronously on the engine thread. The slot lock is released
//! before a handler is invoked, so a handler may re-register or unregister.
//! A panicking handler is logged and does not affect the command that
//! triggered it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::state::SpaceChange;

/// Handler for space-will-change events.
pub type SpaceWillChangeFn = Arc<dyn Fn(SpaceChange) + Send + Sync>;

/// Handler for layout-changed events.
pub type LayoutChangedFn = Arc<dyn Fn() + Send + Sync>;

/// Event kinds with a subscriber slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    SpaceWillChange,
    LayoutChanged,
}

/// Single-subscriber-per-kind callback slots.
#[derive(Default)]
pub struct Dispatcher {
    space_will_change: Mutex<Option<SpaceWillChangeFn>>,
    layout_changed: Mutex<Option<LayoutChangedFn>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("space_will_change", &self.is_subscribed(EventKind::SpaceWillChange))
            .field("layout_changed", &self.is_subscribed(EventKind::LayoutChanged))
            .finish()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register the space-will-change handler, replacing any previous one.
    pub fn subscribe_space_will_change<F>(&self, handler: F)
    where
        F: Fn(SpaceChange) + Send + Sync + 'static,
    {
        *self.space_will_change.lock() = Some(Arc::new(handler));
    }

    /// Register the layout-changed handler, replacing any previous one.
    pub fn subscribe_layout_changed<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.layout_changed.lock() = Some(Arc::new(handler));
    }

    /// Clear the handler for an event kind.
    pub fn unsubscribe(&self, kind: EventKind) {
        match kind {
            EventKind::SpaceWillChange => *self.space_will_change.lock() = None,
            EventKind::LayoutChanged => *self.layout_changed.lock() = None,
        }
    }

    #[must_use]
    pub fn is_subscribed(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::SpaceWillChange => self.space_will_change.lock().is_some(),
            EventKind::LayoutChanged => self.layout_changed.lock().is_some(),
        }
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Deliver a space-will-change event to the current subscriber.
    pub fn dispatch_space_will_change(&self, change: SpaceChange) {
        let handler = self.space_will_change.lock().clone();
        if let Some(handler) = handler {
            tracing::trace!(
                from = change.from,
                to = change.to,
                display_id = change.display_id,
                "spacegrid: dispatching space-will-change"
            );
            if catch_unwind(AssertUnwindSafe(|| handler(change))).is_err() {
                tracing::error!(
                    display_id = change.display_id,
                    "spacegrid: PANIC in space-will-change handler"
                );
            }
        }
    }

    /// Deliver a layout-changed event to the current subscriber.
    pub fn dispatch_layout_changed(&self) {
        let handler = self.layout_changed.lock().clone();
        if let Some(handler) = handler {
            tracing::trace!("spacegrid: dispatching layout-changed");
            if catch_unwind(AssertUnwindSafe(handler.as_ref())).is_err() {
                tracing::error!("spacegrid: PANIC in layout-changed handler");
            }
        }
    }
}
