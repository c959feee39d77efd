//! C ABI.
//!
//! Every `tsapi_*` function talks to the process-wide engine, starting it on
//! first use. Failures never cross the boundary: a stopped engine, a rejected
//! command or a panic all produce the function's sentinel (empty string, 0,
//! `false` or an empty list). Strings and lists returned here are owned by the
//! caller and must be released with the matching `tsapi_free*` function.
//!
//! The declarations live in `include/spacegrid.h`.

#![allow(non_snake_case)]

use std::ffi::{CStr, CString, c_char, c_float, c_uint};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::ptr;

use crate::actor::{Command, EngineHandle};
use crate::dispatch::EventKind;
use crate::error::EngineError;
use crate::state::{Display, SpaceKind, WindowEntry};

/// Display identifier, as used by the host's display services.
pub type CGDirectDisplayID = u32;

/// Called before a display switches space: `(from, to, display)`.
pub type SpaceChangeCallback = extern "C" fn(c_uint, c_uint, CGDirectDisplayID);

/// Called after any structural change to the layout.
pub type LayoutChangedCallback = extern "C" fn();

/// Kind of a space, as reported to C.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpaceType {
    Desktop = 0,
    FullScreen = 1,
    Dashboard = 2,
}

impl From<SpaceKind> for SpaceType {
    fn from(kind: SpaceKind) -> Self {
        match kind {
            SpaceKind::Desktop => Self::Desktop,
            SpaceKind::FullScreen => Self::FullScreen,
            SpaceKind::Dashboard => Self::Dashboard,
        }
    }
}

/// `struct tsapi_window`.
#[repr(C)]
#[derive(Debug)]
pub struct FfiWindow {
    pub app_name: *mut c_char,
    pub window_id: c_uint,
    pub is_on_all_spaces: bool,
    pub title: *mut c_char,
    pub frame: *mut c_char,
    pub display_id: CGDirectDisplayID,
    /// 0 when the window is on all spaces.
    pub space_number: c_uint,
}

/// `struct tsapi_windows`.
#[repr(C)]
#[derive(Debug)]
pub struct FfiWindows {
    pub window_count: c_uint,
    pub windows: *mut FfiWindow,
}

/// `struct tsapi_display`.
#[repr(C)]
#[derive(Debug)]
pub struct FfiDisplay {
    pub display_id: CGDirectDisplayID,
    pub display_name: *mut c_char,
    pub width: usize,
    pub height: usize,
}

/// `struct tsapi_displays`.
#[repr(C)]
#[derive(Debug)]
pub struct FfiDisplays {
    pub displays_count: c_uint,
    pub displays: *mut FfiDisplay,
}

// ============================================================================
// Boundary helpers
// ============================================================================

/// Runs `body` against the engine, mapping every failure to `sentinel`.
fn with_engine<T>(
    function: &'static str,
    sentinel: T,
    body: impl FnOnce(&EngineHandle) -> Result<T, EngineError>,
) -> T {
    let result = catch_unwind(AssertUnwindSafe(|| crate::get_handle().map(body)));
    match result {
        Ok(Some(Ok(value))) => value,
        Ok(Some(Err(err))) => {
            tracing::trace!(function, error = %err, "spacegrid: abi call failed");
            sentinel
        }
        Ok(None) => sentinel,
        Err(_) => {
            tracing::error!(function, "spacegrid: PANIC at abi boundary");
            sentinel
        }
    }
}

/// Applies a command, reporting whether it succeeded.
fn call(function: &'static str, command: Command) -> bool {
    with_engine(function, false, |handle| handle.call(command).map(|_| true))
}

/// Copies `value` into a caller-owned C string. Interior NULs are dropped.
fn into_c_string(value: &str) -> *mut c_char {
    let bytes: Vec<u8> = value.bytes().filter(|b| *b != 0).collect();
    CString::new(bytes).unwrap_or_default().into_raw()
}

/// Borrows a C string as UTF-8.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn read_c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Moves `items` to the heap as a length-tagged array.
fn into_raw_array<T>(items: Vec<T>) -> (c_uint, *mut T) {
    let Ok(count) = c_uint::try_from(items.len()) else {
        return (0, ptr::null_mut());
    };
    (count, Box::into_raw(items.into_boxed_slice()).cast::<T>())
}

/// Reclaims an array produced by [`into_raw_array`].
///
/// # Safety
///
/// `ptr` and `count` must come from the same [`into_raw_array`] call and the
/// array must not have been reclaimed before.
unsafe fn from_raw_array<T>(ptr: *mut T, count: c_uint) -> Box<[T]> {
    let slice = ptr::slice_from_raw_parts_mut(ptr, count as usize);
    // SAFETY: the slice was produced by `Box::into_raw` with this length.
    unsafe { Box::from_raw(slice) }
}

/// Releases a string produced by [`into_c_string`].
///
/// # Safety
///
/// `ptr` must be null or come from [`into_c_string`] and not be freed yet.
unsafe fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        // SAFETY: produced by `CString::into_raw`.
        drop(unsafe { CString::from_raw(ptr) });
    }
}

// ============================================================================
// Lifecycle and versions
// ============================================================================

/// Starts the engine from a configuration file. `NULL` searches the default
/// locations; a missing file means defaults.
///
/// Returns `false` if an explicit path is not valid UTF-8 or the file cannot
/// be loaded. Has no effect once the engine is running.
///
/// # Safety
///
/// `path` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tsapi_initWithConfigPath(path: *const c_char) -> bool {
    let config_path = if path.is_null() {
        None
    } else {
        // SAFETY: forwarded from the caller's contract.
        match unsafe { read_c_str(path) } {
            Some(path) => Some(Path::new(path)),
            None => return false,
        }
    };

    match catch_unwind(AssertUnwindSafe(|| crate::init_from_path(config_path))) {
        Ok(Ok(_)) => true,
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "spacegrid: failed to start engine");
            false
        }
        Err(_) => {
            tracing::error!("spacegrid: PANIC while starting engine");
            false
        }
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_apiVersion() -> *mut c_char {
    into_c_string(with_engine("apiVersion", "", |handle| Ok(handle.api_version()?)))
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_totalSpacesVersion() -> *mut c_char {
    let version = with_engine("totalSpacesVersion", String::new(), |handle| {
        if !handle.is_alive() {
            return Err(crate::ActorError::SendFailed.into());
        }
        Ok(handle.host_version().to_string())
    });
    into_c_string(&version)
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_libTotalSpacesVersion() -> *mut c_char {
    into_c_string(env!("CARGO_PKG_VERSION"))
}

/// Frees a string returned by this library.
///
/// # Safety
///
/// `str` must be null or a string returned by a `tsapi_*` function that has
/// not been freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tsapi_freeString(str: *mut c_char) {
    // SAFETY: forwarded from the caller's contract.
    unsafe { free_c_string(str) };
}

// ============================================================================
// Displays
// ============================================================================

fn ffi_display(display: &Display) -> FfiDisplay {
    FfiDisplay {
        display_id: display.id,
        display_name: into_c_string(&display.name),
        width: display.width as usize,
        height: display.height as usize,
    }
}

/// Lists displays, main display first.
#[unsafe(no_mangle)]
pub extern "C" fn tsapi_displayList() -> *mut FfiDisplays {
    let displays = with_engine("displayList", Vec::new(), |handle| Ok(handle.displays()?));
    let (displays_count, displays) = into_raw_array(displays.iter().map(ffi_display).collect());
    Box::into_raw(Box::new(FfiDisplays { displays_count, displays }))
}

/// Frees a list returned by [`tsapi_displayList`].
///
/// # Safety
///
/// `displayList` must be null or come from [`tsapi_displayList`] and not be
/// freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tsapi_freeDisplayList(displayList: *mut FfiDisplays) {
    if displayList.is_null() {
        return;
    }
    // SAFETY: produced by `Box::into_raw` in `tsapi_displayList`.
    let list = unsafe { Box::from_raw(displayList) };
    if list.displays.is_null() {
        return;
    }
    // SAFETY: array and count were produced together by `into_raw_array`.
    let displays = unsafe { from_raw_array(list.displays, list.displays_count) };
    for display in &displays {
        // SAFETY: produced by `into_c_string`.
        unsafe { free_c_string(display.display_name) };
    }
}

// ============================================================================
// Spaces
// ============================================================================

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_currentSpaceNumberOnDisplay(displayID: CGDirectDisplayID) -> c_uint {
    with_engine("currentSpaceNumberOnDisplay", 0, |handle| {
        Ok(handle.query(|s| s.current_space_number(displayID))??)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_spaceNameForSpaceNumberOnDisplay(
    spaceNumber: c_uint,
    displayID: CGDirectDisplayID,
) -> *mut c_char {
    let name = with_engine("spaceNameForSpaceNumberOnDisplay", String::new(), |handle| {
        Ok(handle.query(|s| s.space_name(spaceNumber, displayID))??)
    });
    into_c_string(&name)
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_customNameForSpaceNumberOnDisplay(
    spaceNumber: c_uint,
    displayID: CGDirectDisplayID,
) -> *mut c_char {
    let name = with_engine("customNameForSpaceNumberOnDisplay", String::new(), |handle| {
        Ok(handle.query(|s| s.custom_name(spaceNumber, displayID))??)
    });
    into_c_string(&name)
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_spaceTypeForSpaceNumberOnDisplay(
    spaceNumber: c_uint,
    displayID: CGDirectDisplayID,
) -> SpaceType {
    with_engine("spaceTypeForSpaceNumberOnDisplay", SpaceType::Desktop, |handle| {
        Ok(handle.query(|s| s.space_kind(spaceNumber, displayID))??.into())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_uuidForSpaceNumberOnDisplay(
    spaceNumber: c_uint,
    displayID: CGDirectDisplayID,
) -> *mut c_char {
    let uuid = with_engine("uuidForSpaceNumberOnDisplay", String::new(), |handle| {
        Ok(handle.query(|s| s.uuid_at(spaceNumber, displayID))??.to_string())
    });
    into_c_string(&uuid)
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_numberOfSpacesOnDisplay(displayID: CGDirectDisplayID) -> c_uint {
    with_engine("numberOfSpacesOnDisplay", 0, |handle| {
        Ok(handle.query(|s| s.number_of_spaces(displayID))??)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_numberOfFullScreensOnDisplay(displayID: CGDirectDisplayID) -> c_uint {
    with_engine("numberOfFullScreensOnDisplay", 0, |handle| {
        Ok(handle.query(|s| s.number_of_full_screens(displayID))??)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_numberOfDesktopsOnDisplay(displayID: CGDirectDisplayID) -> c_uint {
    with_engine("numberOfDesktopsOnDisplay", 0, |handle| {
        Ok(handle.query(|s| s.number_of_desktops(displayID))??)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_numberOfFullScreensInGridOnDisplay(displayID: CGDirectDisplayID) -> c_uint {
    with_engine("numberOfFullScreensInGridOnDisplay", 0, |handle| {
        Ok(handle.query(|s| s.number_of_full_screens_in_grid(displayID))??)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_dashboardIsASpace() -> bool {
    with_engine("dashboardIsASpace", false, |handle| Ok(handle.query(|s| s.dashboard_is_a_space())?))
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_definedRowsOnDisplay(displayID: CGDirectDisplayID) -> c_uint {
    with_engine("definedRowsOnDisplay", 0, |handle| {
        Ok(handle.query(|s| s.defined_rows(displayID))??)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_definedColumnsOnDisplay(displayID: CGDirectDisplayID) -> c_uint {
    with_engine("definedColumnsOnDisplay", 0, |handle| {
        Ok(handle.query(|s| s.defined_columns(displayID))??)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_setDefinedRowsOnDisplay(rows: c_uint, displayID: CGDirectDisplayID) -> bool {
    call("setDefinedRowsOnDisplay", Command::SetRows { rows, display_id: displayID })
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_setDefinedColumnsOnDisplay(
    columns: c_uint,
    displayID: CGDirectDisplayID,
) -> bool {
    call("setDefinedColumnsOnDisplay", Command::SetColumns { columns, display_id: displayID })
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_moveToSpaceOnDisplay(
    spaceNumber: c_uint,
    displayID: CGDirectDisplayID,
) -> bool {
    call("moveToSpaceOnDisplay", Command::SwitchTo { space: spaceNumber, display_id: displayID })
}

/// Sets a custom name for a space. An empty name restores the default.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tsapi_setNameForSpaceOnDisplay(
    spaceNumber: c_uint,
    name: *const c_char,
    displayID: CGDirectDisplayID,
) -> bool {
    // SAFETY: forwarded from the caller's contract.
    let Some(name) = (unsafe { read_c_str(name) }) else {
        return false;
    };
    call(
        "setNameForSpaceOnDisplay",
        Command::SetName { space: spaceNumber, name: name.to_string(), display_id: displayID },
    )
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_moveSpaceToPositionOnDisplay(
    spaceNumber: c_uint,
    positionNumber: c_uint,
    displayID: CGDirectDisplayID,
) -> bool {
    call(
        "moveSpaceToPositionOnDisplay",
        Command::MoveSpaceToPosition {
            space: spaceNumber,
            position: positionNumber,
            display_id: displayID,
        },
    )
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_moveSpaceOnDisplayToPositionOnDisplay(
    spaceNumber: c_uint,
    fromDisplayID: CGDirectDisplayID,
    positionNumber: c_uint,
    toDisplayID: CGDirectDisplayID,
) -> bool {
    call(
        "moveSpaceOnDisplayToPositionOnDisplay",
        Command::MoveSpaceToDisplay {
            space: spaceNumber,
            from_display: fromDisplayID,
            position: positionNumber,
            to_display: toDisplayID,
        },
    )
}

/// Adds desktops, returning how many were actually added.
#[unsafe(no_mangle)]
pub extern "C" fn tsapi_addDesktopsOnDisplay(
    numberToAdd: c_uint,
    displayID: CGDirectDisplayID,
) -> c_uint {
    with_engine("addDesktopsOnDisplay", 0, |handle| {
        let outcome = handle.call(Command::AddDesktops { count: numberToAdd, display_id: displayID })?;
        Ok(outcome.added())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_removeDesktopsOnDisplay(
    numberToRemove: c_uint,
    displayID: CGDirectDisplayID,
) -> bool {
    call(
        "removeDesktopsOnDisplay",
        Command::RemoveDesktops { count: numberToRemove, display_id: displayID },
    )
}

// ============================================================================
// Notifications
// ============================================================================

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_setSpaceWillChangeCallback(callback: Option<SpaceChangeCallback>) {
    with_engine("setSpaceWillChangeCallback", (), |handle| {
        match callback {
            Some(callback) => handle.dispatcher().subscribe_space_will_change(move |change| {
                callback(change.from, change.to, change.display_id);
            }),
            None => handle.dispatcher().unsubscribe(EventKind::SpaceWillChange),
        }
        Ok(())
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_unsetSpaceWillChangeCallback() {
    with_engine("unsetSpaceWillChangeCallback", (), |handle| {
        handle.dispatcher().unsubscribe(EventKind::SpaceWillChange);
        Ok(())
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_setLayoutChangedCallback(callback: Option<LayoutChangedCallback>) {
    with_engine("setLayoutChangedCallback", (), |handle| {
        match callback {
            Some(callback) => handle.dispatcher().subscribe_layout_changed(move || callback()),
            None => handle.dispatcher().unsubscribe(EventKind::LayoutChanged),
        }
        Ok(())
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_unsetLayoutChangedCallback() {
    with_engine("unsetLayoutChangedCallback", (), |handle| {
        handle.dispatcher().unsubscribe(EventKind::LayoutChanged);
        Ok(())
    });
}

// ============================================================================
// Windows
// ============================================================================

fn ffi_window(entry: &WindowEntry) -> FfiWindow {
    FfiWindow {
        app_name: into_c_string(&entry.app_name),
        window_id: entry.window_id,
        is_on_all_spaces: entry.is_on_all_spaces,
        title: into_c_string(&entry.title),
        frame: into_c_string(&entry.frame),
        display_id: entry.display_id,
        space_number: entry.space_number.unwrap_or(0),
    }
}

/// Lists tracked windows, grouped by display and space, front to back.
#[unsafe(no_mangle)]
pub extern "C" fn tsapi_windowList() -> *mut FfiWindows {
    let entries = with_engine("windowList", Vec::new(), |handle| Ok(handle.windows()?));
    let (window_count, windows) = into_raw_array(entries.iter().map(ffi_window).collect());
    Box::into_raw(Box::new(FfiWindows { window_count, windows }))
}

/// Frees a list returned by [`tsapi_windowList`].
///
/// # Safety
///
/// `windowList` must be null or come from [`tsapi_windowList`] and not be
/// freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tsapi_freeWindowList(windowList: *mut FfiWindows) {
    if windowList.is_null() {
        return;
    }
    // SAFETY: produced by `Box::into_raw` in `tsapi_windowList`.
    let list = unsafe { Box::from_raw(windowList) };
    if list.windows.is_null() {
        return;
    }
    // SAFETY: array and count were produced together by `into_raw_array`.
    let windows = unsafe { from_raw_array(list.windows, list.window_count) };
    for window in &windows {
        // SAFETY: each string was produced by `into_c_string`.
        unsafe {
            free_c_string(window.app_name);
            free_c_string(window.title);
            free_c_string(window.frame);
        }
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_moveWindowToSpaceOnDisplay(
    windowID: c_uint,
    spaceNumber: c_uint,
    displayID: CGDirectDisplayID,
) -> bool {
    call(
        "moveWindowToSpaceOnDisplay",
        Command::MoveWindowToSpace { window_id: windowID, space: spaceNumber, display_id: displayID },
    )
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_setFrontWindow(windowID: c_uint) {
    call("setFrontWindow", Command::SetFrontWindow { window_id: windowID });
}

#[unsafe(no_mangle)]
pub extern "C" fn tsapi_moveWindow(windowID: c_uint, x: c_float, y: c_float) {
    call(
        "moveWindow",
        Command::MoveWindow { window_id: windowID, x: f64::from(x), y: f64::from(y) },
    );
}

/// Binds an app to a space uuid or `"AllSpaces"`. A null or empty
/// `spaceUUID` removes the binding.
///
/// # Safety
///
/// Both arguments must be null or valid NUL-terminated strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tsapi_bindAppToSpace(bundleId: *const c_char, spaceUUID: *const c_char) {
    // SAFETY: forwarded from the caller's contract.
    let Some(bundle_id) = (unsafe { read_c_str(bundleId) }) else {
        return;
    };
    let target = if spaceUUID.is_null() {
        None
    } else {
        // SAFETY: forwarded from the caller's contract.
        match unsafe { read_c_str(spaceUUID) } {
            Some(target) => Some(target.to_string()),
            None => return,
        }
    };
    call(
        "bindAppToSpace",
        Command::BindApp {
            bundle_id: bundle_id.to_string(),
            target,
        },
    );
}
