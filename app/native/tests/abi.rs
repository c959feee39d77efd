//! C ABI integration test.
//!
//! The ABI drives a single process-wide engine, so the whole surface is
//! exercised by one sequential test.

use std::ffi::{CStr, CString, c_char, c_uint};
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use spacegrid_lib::abi::*;
use spacegrid_lib::{Command, WindowInfo, get_handle};

static WILL_CHANGE_COUNT: AtomicU32 = AtomicU32::new(0);
static LAST_FROM: AtomicU32 = AtomicU32::new(0);
static LAST_TO: AtomicU32 = AtomicU32::new(0);
static CURRENT_DURING_CALLBACK: AtomicU32 = AtomicU32::new(0);
static LAYOUT_COUNT: AtomicU32 = AtomicU32::new(0);
static NESTED_MUTATION_REJECTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_space_will_change(from: c_uint, to: c_uint, display: CGDirectDisplayID) {
    WILL_CHANGE_COUNT.fetch_add(1, Ordering::SeqCst);
    LAST_FROM.store(from, Ordering::SeqCst);
    LAST_TO.store(to, Ordering::SeqCst);
    CURRENT_DURING_CALLBACK.store(tsapi_currentSpaceNumberOnDisplay(display), Ordering::SeqCst);
}

extern "C" fn on_layout_changed() {
    LAYOUT_COUNT.fetch_add(1, Ordering::SeqCst);
    NESTED_MUTATION_REJECTED.store(!tsapi_moveToSpaceOnDisplay(1, 0), Ordering::SeqCst);
}

fn take_string(ptr: *mut c_char) -> String {
    assert!(!ptr.is_null());
    let value = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
    unsafe { tsapi_freeString(ptr) };
    value
}

fn window_numbers() -> Vec<(u32, u32, u32)> {
    let list = tsapi_windowList();
    let windows = unsafe {
        let list = &*list;
        if list.window_count == 0 {
            Vec::new()
        } else {
            std::slice::from_raw_parts(list.windows, list.window_count as usize)
                .iter()
                .map(|w| (w.window_id, w.display_id, w.space_number))
                .collect()
        }
    };
    unsafe { tsapi_freeWindowList(list) };
    windows
}

const CONFIG: &str = r#"{
  // two displays, each with its own spaces
  "displaysHaveSeparateSpaces": true,
  "grid": { "rows": 2, "columns": 2, "desktops": 3 },
  "hostVersion": "2.9.0",
  "displays": [
    { "id": 7, "name": "External", "width": 2560, "height": 1440, "x": 1440, "y": 0 },
    { "id": 1, "name": "Built-in", "width": 1440, "height": 900, "x": 0, "y": 0 }
  ]
}"#;

#[test]
fn test_c_abi_surface() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{CONFIG}").unwrap();
    let path = CString::new(file.path().to_str().unwrap()).unwrap();
    assert!(unsafe { tsapi_initWithConfigPath(path.as_ptr()) });

    // Versions
    let lib_version = take_string(tsapi_libTotalSpacesVersion());
    assert_eq!(lib_version, env!("CARGO_PKG_VERSION"));
    assert_eq!(take_string(tsapi_apiVersion()), lib_version);
    assert_eq!(take_string(tsapi_totalSpacesVersion()), "2.9.0");

    // Displays, main first
    let list = tsapi_displayList();
    unsafe {
        let displays = std::slice::from_raw_parts((*list).displays, (*list).displays_count as usize);
        assert_eq!(displays.len(), 2);
        assert_eq!(displays[0].display_id, 1);
        assert_eq!(CStr::from_ptr(displays[0].display_name).to_str().unwrap(), "Built-in");
        assert_eq!((displays[0].width, displays[0].height), (1440, 900));
        assert_eq!(displays[1].display_id, 7);
        tsapi_freeDisplayList(list);
    }

    // Grid queries
    assert_eq!(tsapi_numberOfDesktopsOnDisplay(1), 3);
    assert_eq!(tsapi_numberOfDesktopsOnDisplay(7), 3);
    assert_eq!(tsapi_numberOfDesktopsOnDisplay(99), 0);
    assert_eq!(tsapi_numberOfSpacesOnDisplay(0), 3);
    assert_eq!(tsapi_numberOfFullScreensOnDisplay(1), 0);
    assert_eq!(tsapi_numberOfFullScreensInGridOnDisplay(1), 0);
    assert_eq!(tsapi_definedRowsOnDisplay(1), 2);
    assert_eq!(tsapi_definedColumnsOnDisplay(1), 2);
    assert!(!tsapi_dashboardIsASpace());
    assert_eq!(tsapi_currentSpaceNumberOnDisplay(1), 1);
    assert_eq!(tsapi_spaceTypeForSpaceNumberOnDisplay(2, 1), SpaceType::Desktop);

    tsapi_setSpaceWillChangeCallback(Some(on_space_will_change));
    tsapi_setLayoutChangedCallback(Some(on_layout_changed));

    // Clamped add
    assert_eq!(tsapi_addDesktopsOnDisplay(5, 1), 1);
    assert_eq!(tsapi_numberOfDesktopsOnDisplay(1), 4);
    assert_eq!(LAYOUT_COUNT.load(Ordering::SeqCst), 1);
    assert!(NESTED_MUTATION_REJECTED.load(Ordering::SeqCst));

    // Shape validation
    assert!(!tsapi_setDefinedRowsOnDisplay(0, 1));
    assert!(!tsapi_setDefinedColumnsOnDisplay(17, 1));
    assert!(tsapi_setDefinedColumnsOnDisplay(3, 1));
    assert_eq!(tsapi_definedColumnsOnDisplay(1), 3);

    // Naming
    let long = CString::new("a".repeat(256)).unwrap();
    let mail = CString::new("Mail").unwrap();
    assert!(unsafe { tsapi_setNameForSpaceOnDisplay(3, mail.as_ptr(), 1) });
    assert!(!unsafe { tsapi_setNameForSpaceOnDisplay(3, long.as_ptr(), 1) });
    assert!(!unsafe { tsapi_setNameForSpaceOnDisplay(3, std::ptr::null(), 1) });
    assert_eq!(take_string(tsapi_spaceNameForSpaceNumberOnDisplay(3, 1)), "Mail");
    assert_eq!(take_string(tsapi_customNameForSpaceNumberOnDisplay(3, 1)), "Mail");
    assert_eq!(take_string(tsapi_customNameForSpaceNumberOnDisplay(2, 1)), "");
    assert_eq!(take_string(tsapi_spaceNameForSpaceNumberOnDisplay(2, 1)), "Desktop 2");
    assert_eq!(take_string(tsapi_spaceNameForSpaceNumberOnDisplay(42, 1)), "");

    // Reordering keeps identity
    let uuid = take_string(tsapi_uuidForSpaceNumberOnDisplay(2, 1));
    assert_eq!(uuid.len(), 36);
    assert!(!tsapi_moveSpaceToPositionOnDisplay(2, 1, 1));
    assert!(tsapi_moveSpaceToPositionOnDisplay(2, 4, 1));
    assert_eq!(take_string(tsapi_uuidForSpaceNumberOnDisplay(4, 1)), uuid);
    assert_eq!(take_string(tsapi_uuidForSpaceNumberOnDisplay(99, 1)), "");

    // Switching
    let before = WILL_CHANGE_COUNT.load(Ordering::SeqCst);
    assert!(tsapi_moveToSpaceOnDisplay(3, 1));
    assert_eq!(WILL_CHANGE_COUNT.load(Ordering::SeqCst), before + 1);
    assert_eq!((LAST_FROM.load(Ordering::SeqCst), LAST_TO.load(Ordering::SeqCst)), (1, 3));
    assert_eq!(CURRENT_DURING_CALLBACK.load(Ordering::SeqCst), 1);
    assert_eq!(tsapi_currentSpaceNumberOnDisplay(1), 3);
    assert!(!tsapi_moveToSpaceOnDisplay(9, 1));
    assert!(tsapi_moveToSpaceOnDisplay(3, 1));
    assert_eq!(WILL_CHANGE_COUNT.load(Ordering::SeqCst), before + 1);

    // Cross-display moves
    assert!(!tsapi_moveSpaceOnDisplayToPositionOnDisplay(3, 1, 2, 7));
    let moving = take_string(tsapi_uuidForSpaceNumberOnDisplay(2, 1));
    assert!(tsapi_moveSpaceOnDisplayToPositionOnDisplay(2, 1, 2, 7));
    assert_eq!(take_string(tsapi_uuidForSpaceNumberOnDisplay(2, 7)), moving);
    assert_eq!(tsapi_numberOfDesktopsOnDisplay(7), 4);

    // Windows
    let handle = get_handle().unwrap();
    handle
        .call(Command::TrackWindow {
            window: WindowInfo {
                id: 100,
                app_name: "Mail".to_string(),
                title: "Inbox".to_string(),
                display_id: 1,
                ..WindowInfo::default()
            },
        })
        .unwrap();
    assert_eq!(window_numbers(), vec![(100, 1, 2)]);

    assert!(!tsapi_moveWindowToSpaceOnDisplay(100, 5, 1));
    assert_eq!(window_numbers(), vec![(100, 1, 2)]);
    assert!(tsapi_moveWindowToSpaceOnDisplay(100, 1, 1));
    assert_eq!(window_numbers(), vec![(100, 1, 1)]);
    assert!(!tsapi_moveWindowToSpaceOnDisplay(404, 1, 1));

    tsapi_moveWindow(100, 10.0, 20.0);
    tsapi_setFrontWindow(100);
    tsapi_setFrontWindow(404);
    let list = tsapi_windowList();
    unsafe {
        let window = &*(*list).windows;
        assert_eq!(CStr::from_ptr(window.frame).to_str().unwrap(), "{{10, 20}, {0, 0}}");
        assert_eq!(CStr::from_ptr(window.title).to_str().unwrap(), "Inbox");
        assert!(!window.is_on_all_spaces);
        tsapi_freeWindowList(list);
    }

    // App bindings
    let bundle = CString::new("com.example.notes").unwrap();
    let all_spaces = CString::new("AllSpaces").unwrap();
    unsafe { tsapi_bindAppToSpace(bundle.as_ptr(), all_spaces.as_ptr()) };
    handle
        .call(Command::TrackWindow {
            window: WindowInfo {
                id: 200,
                bundle_id: "com.example.notes".to_string(),
                display_id: 1,
                ..WindowInfo::default()
            },
        })
        .unwrap();
    assert!(window_numbers().contains(&(200, 1, 0)));
    let unbind = CString::new("").unwrap();
    unsafe { tsapi_bindAppToSpace(bundle.as_ptr(), unbind.as_ptr()) };
    assert!(handle.query(|s| s.app_bindings.is_empty()).unwrap());
    unsafe { tsapi_bindAppToSpace(bundle.as_ptr(), all_spaces.as_ptr()) };
    unsafe { tsapi_bindAppToSpace(bundle.as_ptr(), std::ptr::null()) };
    assert!(handle.query(|s| s.app_bindings.is_empty()).unwrap());

    // Removal
    assert!(!tsapi_removeDesktopsOnDisplay(0, 1));
    assert!(!tsapi_removeDesktopsOnDisplay(3, 1));
    assert!(tsapi_moveToSpaceOnDisplay(3, 1));
    let before = WILL_CHANGE_COUNT.load(Ordering::SeqCst);
    assert!(tsapi_removeDesktopsOnDisplay(1, 1));
    assert_eq!(tsapi_numberOfDesktopsOnDisplay(1), 2);
    assert_eq!(WILL_CHANGE_COUNT.load(Ordering::SeqCst), before + 1);
    assert_eq!(tsapi_currentSpaceNumberOnDisplay(1), 2);

    // Unsubscribed handlers stay silent
    tsapi_unsetSpaceWillChangeCallback();
    tsapi_unsetLayoutChangedCallback();
    let (changes, layouts) =
        (WILL_CHANGE_COUNT.load(Ordering::SeqCst), LAYOUT_COUNT.load(Ordering::SeqCst));
    assert!(tsapi_moveToSpaceOnDisplay(1, 1));
    assert_eq!(tsapi_addDesktopsOnDisplay(1, 1), 1);
    assert_eq!(WILL_CHANGE_COUNT.load(Ordering::SeqCst), changes);
    assert_eq!(LAYOUT_COUNT.load(Ordering::SeqCst), layouts);

    // Null frees are no-ops
    unsafe {
        tsapi_freeString(std::ptr::null_mut());
        tsapi_freeWindowList(std::ptr::null_mut());
        tsapi_freeDisplayList(std::ptr::null_mut());
    }

    // Transport failure yields sentinels
    handle.shutdown().unwrap();
    for _ in 0..100 {
        if !handle.is_alive() {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    assert_eq!(take_string(tsapi_apiVersion()), "");
    assert_eq!(take_string(tsapi_totalSpacesVersion()), "");
    assert_eq!(take_string(tsapi_libTotalSpacesVersion()), lib_version);
    assert_eq!(tsapi_numberOfDesktopsOnDisplay(1), 0);
    assert!(!tsapi_moveToSpaceOnDisplay(2, 1));
    let list = tsapi_windowList();
    assert_eq!(unsafe { (*list).window_count }, 0);
    unsafe { tsapi_freeWindowList(list) };
}
