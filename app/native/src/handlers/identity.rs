//! Space naming and app binding handlers.

use super::Effects;
use crate::constants::naming::MAX_NAME_BYTES;
use crate::error::{SpaceError, SpaceResult};
use crate::state::{AppBinding, SpaceState};

/// Set or clear the custom name of a space.
///
/// An empty name clears the custom name. Layout-changed fires only when the
/// stored name actually changes.
///
/// # Errors
///
/// Returns [`SpaceError::NameTooLong`] for names over 255 bytes, or a lookup
/// error if the space does not exist.
pub fn on_set_name(
    state: &mut SpaceState,
    effects: &mut Effects,
    number: u32,
    display_id: u32,
    name: &str,
) -> SpaceResult<()> {
    if name.len() > MAX_NAME_BYTES {
        return Err(SpaceError::NameTooLong(name.len()));
    }

    let uuid = state.uuid_at(number, display_id)?;
    let space = state.spaces.get_mut(&uuid).ok_or(SpaceError::UuidNotFound(uuid))?;
    let name = (!name.is_empty()).then(|| name.to_string());

    if space.custom_name == name {
        tracing::trace!(number, display_id, "spacegrid: space name unchanged");
        return Ok(());
    }

    tracing::debug!(number, display_id, name = ?name, "spacegrid: renaming space");
    space.custom_name = name;
    effects.mark_layout_changed();
    Ok(())
}

/// Bind an app to a space, to all spaces, or remove its binding (`None`).
///
/// Bindings apply to windows tracked afterwards.
///
/// # Errors
///
/// Returns [`SpaceError::UuidNotFound`] when binding to a space that does not exist.
pub fn on_bind_app(
    state: &mut SpaceState,
    bundle_id: &str,
    target: Option<AppBinding>,
) -> SpaceResult<()> {
    match target {
        None => {
            tracing::debug!(bundle_id, "spacegrid: removing app binding");
            state.app_bindings.remove(bundle_id);
        }
        Some(binding) => {
            if let AppBinding::Space(uuid) = binding
                && !state.spaces.contains_key(&uuid)
            {
                return Err(SpaceError::UuidNotFound(uuid));
            }
            tracing::debug!(bundle_id, binding = ?binding, "spacegrid: binding app");
            state.app_bindings.insert(bundle_id.to_string(), binding);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use spacegrid_shared::EngineConfig;
    use uuid::Uuid;

    use super::*;

    fn state() -> SpaceState { SpaceState::new(EngineConfig::default()).unwrap() }

    #[test]
    fn test_set_name_fires_layout_changed() {
        let mut state = state();
        let mut effects = Effects::default();

        on_set_name(&mut state, &mut effects, 2, 0, "Mail").unwrap();

        assert!(effects.layout_changed);
        assert_eq!(state.space_name(2, 0).unwrap(), "Mail");
        assert_eq!(state.custom_name(2, 0).unwrap(), "Mail");
    }

    #[test]
    fn test_same_name_is_silent() {
        let mut state = state();
        on_set_name(&mut state, &mut Effects::default(), 2, 0, "Mail").unwrap();

        let mut effects = Effects::default();
        on_set_name(&mut state, &mut effects, 2, 0, "Mail").unwrap();
        assert!(effects.is_empty());
    }

    #[test]
    fn test_empty_name_clears_custom_name() {
        let mut state = state();
        on_set_name(&mut state, &mut Effects::default(), 3, 0, "Code").unwrap();

        let mut effects = Effects::default();
        on_set_name(&mut state, &mut effects, 3, 0, "").unwrap();

        assert!(effects.layout_changed);
        assert_eq!(state.custom_name(3, 0).unwrap(), "");
        assert_eq!(state.space_name(3, 0).unwrap(), "Desktop 3");
    }

    #[test]
    fn test_name_over_limit_keeps_previous_name() {
        let mut state = state();
        on_set_name(&mut state, &mut Effects::default(), 3, 0, "Code").unwrap();

        let long = "a".repeat(256);
        let result = on_set_name(&mut state, &mut Effects::default(), 3, 0, &long);

        assert_eq!(result, Err(SpaceError::NameTooLong(256)));
        assert_eq!(state.custom_name(3, 0).unwrap(), "Code");
    }

    #[test]
    fn test_name_limit_counts_bytes() {
        let mut state = state();
        let name = "é".repeat(128);
        assert!(on_set_name(&mut state, &mut Effects::default(), 1, 0, &name).is_err());

        let name = "a".repeat(255);
        assert!(on_set_name(&mut state, &mut Effects::default(), 1, 0, &name).is_ok());
    }

    #[test]
    fn test_set_name_on_missing_space() {
        let mut state = state();
        let result = on_set_name(&mut state, &mut Effects::default(), 9, 0, "x");
        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn test_bind_and_unbind_app() {
        let mut state = state();
        let uuid = state.uuid_at(2, 0).unwrap();

        on_bind_app(&mut state, "com.apple.mail", Some(AppBinding::Space(uuid))).unwrap();
        assert_eq!(state.app_bindings["com.apple.mail"], AppBinding::Space(uuid));

        on_bind_app(&mut state, "com.apple.mail", None).unwrap();
        assert!(state.app_bindings.is_empty());
    }

    #[test]
    fn test_bind_to_unknown_space_fails() {
        let mut state = state();
        let result = on_bind_app(&mut state, "com.apple.mail", Some(AppBinding::Space(Uuid::now_v7())));
        assert!(result.unwrap_err().is_not_found());
    }
}
