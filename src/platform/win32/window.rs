// ── Main window ───────────────────────────────────────────────────────────────
//
// Responsibilities in this file (unsafe confined here):
//   • Register the main window class and create the window at the persisted
//     geometry, with the File / Settings menu bar and its accelerators.
//   • Own the `WindowState` (session + EDIT control) through GWLP_USERDATA.
//   • Run the Win32 message loop.
//   • Dispatch WM_COMMAND, WM_MOUSEWHEEL, WM_CTLCOLOREDIT, WM_SIZE,
//     WM_SETFOCUS, WM_CLOSE, WM_DESTROY, WM_NCDESTROY.
//
// Every session command goes through `WindowState::command`; document I/O
// failures become an "Error" message box, other failures are logged, and the
// window carries on.

#![allow(unsafe_code)]

use std::{
    cell::{Cell, RefCell},
    ffi::c_void,
    path::PathBuf,
};

use tracing::{debug, error, warn};
use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM},
        Graphics::Gdi::{GetStockObject, UpdateWindow, HBRUSH, HDC, WHITE_BRUSH},
        System::LibraryLoader::GetModuleHandleW,
        UI::WindowsAndMessaging::{
            AppendMenuW, CheckMenuItem, CreateAcceleratorTableW, CreateMenu, CreateWindowExW,
            DefWindowProcW, DestroyAcceleratorTable, DestroyWindow, DispatchMessageW,
            GetClientRect, GetMenu, GetMessageW, GetWindowLongPtrW, GetWindowPlacement,
            GetWindowRect, IsIconic,
            LoadCursorW, LoadIconW, PostQuitMessage, RegisterClassExW, SendMessageW,
            SetWindowLongPtrW, SetWindowTextW, ShowWindow, SystemParametersInfoW,
            TranslateAcceleratorW, SPI_GETWHEELSCROLLLINES, SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS,
            TranslateMessage, ACCEL, CS_HREDRAW, CS_VREDRAW, FCONTROL, FSHIFT, FVIRTKEY,
            GWLP_USERDATA, HACCEL, HMENU, IDC_ARROW, IDI_APPLICATION, MF_BYCOMMAND, MF_CHECKED,
            MF_POPUP, MF_STRING, MF_UNCHECKED, MSG, SW_SHOW, WINDOWPLACEMENT, WINDOW_EX_STYLE,
            WM_CLOSE, WM_COMMAND, WM_CTLCOLOREDIT, WM_DESTROY, WM_MOUSEWHEEL, WM_NCDESTROY,
            WM_SETFOCUS, WM_SIZE, WNDCLASSEXW, WS_OVERLAPPEDWINDOW,
        },
    },
};

use super::{
    dialogs::{self, wide, DialogPrompter},
    last_error,
};
use crate::{
    app::EditorSession,
    editor::{edit_control::EditControl, from_display, to_display},
    error::{Result, SlateError},
    font::{WheelEffect, WheelInput},
    prefs::{PreferenceStore, WindowGeometry},
};

// ── Window identity ───────────────────────────────────────────────────────────

/// Atom name used to register (and later find) the main window class.
const CLASS_NAME: PCWSTR = w!("SlateMainWindow");

// ── Menu command IDs ──────────────────────────────────────────────────────────

const IDM_FILE_OPEN: usize = 1001;
const IDM_FILE_SAVE: usize = 1002;
const IDM_FILE_SAVE_AS: usize = 1003;
const IDM_SETTINGS_DARK_MODE: usize = 2001;
const IDM_SETTINGS_FONT: usize = 2002;

// ── Wheel input ───────────────────────────────────────────────────────────────

/// WM_MOUSEWHEEL delta for one notch.
const WHEEL_DELTA: i32 = 120;
/// `MK_CONTROL` bit in the WM_MOUSEWHEEL key state.
const MK_CONTROL: usize = 0x0008;
/// System default for SPI_GETWHEELSCROLLLINES.
const DEFAULT_LINES_PER_NOTCH: i32 = 3;
/// SPI_GETWHEELSCROLLLINES value meaning "one screen per notch".
const WHEEL_PAGESCROLL: u32 = u32::MAX;
/// The text surface's unit scroll increment, in pixels.
const UNIT_INCREMENT: i32 = 1;

type Session = EditorSession<Box<dyn PreferenceStore>>;

// ── Window state ──────────────────────────────────────────────────────────────

/// Everything the WndProc needs, reachable from GWLP_USERDATA.
///
/// Modal dialogs pump messages while a command is running, so the session
/// sits behind a `RefCell` and re-entrant handlers that find it borrowed back
/// off.  Painting only touches `edit`, which never needs the session.
struct WindowState {
    session: RefCell<Session>,
    edit: EditControl,
    /// Sub-notch wheel delta left over from high-resolution wheels.
    wheel_carry: Cell<i32>,
}

impl WindowState {
    fn command(&self, hwnd: HWND, id: usize) {
        let Ok(mut session) = self.session.try_borrow_mut() else {
            debug!(id, "command ignored while another is running");
            return;
        };
        let mut prompter = DialogPrompter { owner: hwnd };

        match id {
            IDM_FILE_OPEN => {
                if let Some(true) = report(hwnd, session.open_interactive(&mut prompter)) {
                    self.show_document(hwnd, &session);
                }
            }
            IDM_FILE_SAVE => {
                session.set_text(from_display(&self.edit.text()));
                report(hwnd, session.save(&mut prompter));
                set_title(hwnd, &session);
            }
            IDM_FILE_SAVE_AS => {
                session.set_text(from_display(&self.edit.text()));
                report(hwnd, session.save_as(&mut prompter));
                set_title(hwnd, &session);
            }
            IDM_SETTINGS_DARK_MODE => {
                let dark = !session.is_dark();
                let palette = session.toggle_dark_mode(dark);
                report(hwnd, self.edit.apply_palette(palette));
                check_dark_mode_item(hwnd, dark);
            }
            IDM_SETTINGS_FONT => {
                if session.change_font(&mut prompter) {
                    report(hwnd, self.edit.apply_font(session.font()));
                }
            }
            _ => {}
        }
    }

    /// Open the file named on the command line, if it is one.
    fn open_startup(&self, hwnd: HWND, path: PathBuf) {
        let Ok(mut session) = self.session.try_borrow_mut() else {
            return;
        };
        if let Some(true) = report(hwnd, session.open_startup_arg(path)) {
            self.show_document(hwnd, &session);
        }
    }

    fn show_document(&self, hwnd: HWND, session: &Session) {
        report(hwnd, self.edit.set_text(&to_display(session.text())));
        set_title(hwnd, session);
    }

    fn wheel(&self, hwnd: HWND, wparam: WPARAM) {
        let key_state = wparam.0 & 0xFFFF;
        let delta = ((wparam.0 >> 16) & 0xFFFF) as u16 as i16 as i32;

        let total = self.wheel_carry.get() + delta;
        let notches = total / WHEEL_DELTA;
        self.wheel_carry.set(total % WHEEL_DELTA);
        if notches == 0 {
            return;
        }

        let Ok(mut session) = self.session.try_borrow_mut() else {
            return;
        };
        let per_notch = lines_per_notch(
            wheel_scroll_setting(),
            client_height(hwnd) / self.edit.line_height().max(1),
        );
        let input = WheelInput {
            notches,
            // Rolling away from the user scrolls toward the top.
            units_to_scroll: notches.saturating_mul(per_notch).saturating_neg(),
            fine: key_state & MK_CONTROL != 0,
        };
        match session.wheel(input, UNIT_INCREMENT) {
            WheelEffect::FontResized(_) => {
                report(hwnd, self.edit.apply_font(session.font()));
            }
            WheelEffect::ScrollBy(pixels) => {
                self.edit.scroll_lines(pixels_to_lines(pixels, self.edit.line_height()));
            }
        }
    }

    fn close(&self, hwnd: HWND) {
        let Ok(mut session) = self.session.try_borrow_mut() else {
            return;
        };
        match window_geometry(hwnd) {
            Some(g) => session.on_close(g),
            None => warn!("could not read window geometry; not persisted"),
        }
    }
}

/// Log a failed command; document I/O failures also get an "Error" box.
fn report<T>(hwnd: HWND, result: Result<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) if e.is_document_io() => {
            warn!(error = %e, "command failed");
            dialogs::show_error(hwnd, &e.to_string());
            None
        }
        Err(e) => {
            error!(error = %e, "could not update the window");
            None
        }
    }
}

/// Lines per wheel notch from the user's SPI_GETWHEELSCROLLLINES setting.
/// Page scrolling moves one screen of `page_lines`; no setting means the
/// system default.
fn lines_per_notch(setting: Option<u32>, page_lines: i32) -> i32 {
    match setting {
        None => DEFAULT_LINES_PER_NOTCH,
        Some(WHEEL_PAGESCROLL) => page_lines.max(1),
        Some(n) => i32::try_from(n).unwrap_or(i32::MAX),
    }
}

fn wheel_scroll_setting() -> Option<u32> {
    let mut lines: u32 = 0;
    // SAFETY: SPI_GETWHEELSCROLLLINES writes one UINT through pvParam, which
    // points at `lines` for the duration of the call.
    unsafe {
        SystemParametersInfoW(
            SPI_GETWHEELSCROLLLINES,
            0,
            Some(&mut lines as *mut u32 as *mut c_void),
            SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
        )
    }
    .ok()
    .map(|()| lines)
}

fn client_height(hwnd: HWND) -> i32 {
    let mut rc = RECT::default();
    // SAFETY: hwnd valid; rc is a writable RECT.
    match unsafe { GetClientRect(hwnd, &mut rc) } {
        Ok(()) => rc.bottom - rc.top,
        Err(_) => 0,
    }
}

/// Whole lines for a pixel distance; any non-zero distance moves at least one.
fn pixels_to_lines(pixels: i32, line_height: i32) -> i32 {
    let lines = pixels / line_height.max(1);
    if lines == 0 {
        pixels.signum()
    } else {
        lines
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Create the main window around a fresh session, optionally open `file`,
/// and drive the message loop until the user closes the application.
pub fn run(store: Box<dyn PreferenceStore>, file: Option<PathBuf>) -> Result<()> {
    #[cfg(debug_assertions)]
    let t0 = std::time::Instant::now();

    super::dpi::enable_per_monitor_awareness();

    // SAFETY: GetModuleHandleW(None) returns the .exe's own HMODULE, which is
    // always valid for the process lifetime and never fails in practice.
    let hmodule = unsafe { GetModuleHandleW(None) }.map_err(SlateError::from)?;
    let hinstance = HINSTANCE(hmodule.0);

    register_class(hinstance)?;

    let session: Session = EditorSession::new(store);
    let hwnd = create_window(hinstance, &session)?;

    let edit = EditControl::create(hwnd, hinstance, session.palette())?;
    edit.apply_font(session.font())?;

    let boxed = Box::new(WindowState {
        session: RefCell::new(session),
        edit,
        wheel_carry: Cell::new(0),
    });
    // SAFETY: hwnd is our top-level window.  Ownership of the box moves into
    // GWLP_USERDATA and is reclaimed exactly once, in WM_NCDESTROY.
    unsafe {
        let _ = SetWindowLongPtrW(hwnd, GWLP_USERDATA, Box::into_raw(boxed) as isize);
    }

    let accel = build_accelerators()?;

    // SAFETY: hwnd was just returned by CreateWindowExW and is valid.
    // ShowWindow returns the previous visibility state; UpdateWindow returns
    // a success BOOL; both are ignored.
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = UpdateWindow(hwnd);
    }

    #[cfg(debug_assertions)]
    debug!(
        elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0,
        "window visible"
    );

    // SAFETY: state was stored above and lives until WM_NCDESTROY.
    if let Some(state) = unsafe { state(hwnd) } {
        layout(hwnd, state);
        state.edit.focus();
        if let Some(path) = file {
            state.open_startup(hwnd, path);
        }
    }

    let result = message_loop(hwnd, accel);

    // SAFETY: accel came from CreateAcceleratorTableW and is no longer used.
    unsafe {
        let _ = DestroyAcceleratorTable(accel);
    }
    result
}

// ── Window class registration ─────────────────────────────────────────────────

fn register_class(hinstance: HINSTANCE) -> Result<()> {
    // SAFETY: LoadIconW with IDI_APPLICATION always succeeds; it loads the
    // built-in application icon resource, which exists on all Windows versions.
    let icon = unsafe { LoadIconW(None, IDI_APPLICATION) }.map_err(SlateError::from)?;

    // SAFETY: LoadCursorW with IDC_ARROW always succeeds.
    let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }.map_err(SlateError::from)?;

    // SAFETY: GetStockObject with WHITE_BRUSH always returns a valid HGDIOBJ.
    // Casting to HBRUSH is correct: stock brush objects are compatible types.
    let bg_brush = unsafe { HBRUSH(GetStockObject(WHITE_BRUSH).0) };

    let wndclass = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wnd_proc),
        cbClsExtra: 0,
        cbWndExtra: 0,
        hInstance: hinstance,
        hIcon: icon,
        hCursor: cursor,
        hbrBackground: bg_brush,
        lpszMenuName: PCWSTR::null(),
        lpszClassName: CLASS_NAME,
        hIconSm: icon,
    };

    // SAFETY: wndclass is fully initialised with valid handles;
    // CLASS_NAME is a valid null-terminated UTF-16 string literal.
    let atom = unsafe { RegisterClassExW(&wndclass) };
    if atom == 0 {
        return Err(last_error("RegisterClassExW"));
    }

    Ok(())
}

// ── Window creation ───────────────────────────────────────────────────────────

fn create_window(hinstance: HINSTANCE, session: &Session) -> Result<HWND> {
    let g = session.geometry();
    let title = wide(&session.window_title());
    let menu = build_menu(session.is_dark())?;

    // SAFETY: CLASS_NAME was just registered; hinstance is the exe's module;
    // title outlives the call.  HWND::default() (null parent) creates a
    // top-level window.  No creation data is passed.
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            CLASS_NAME,
            PCWSTR(title.as_ptr()),
            WS_OVERLAPPEDWINDOW,
            g.x,
            g.y,
            g.width,
            g.height,
            HWND::default(),
            menu,
            hinstance,
            None,
        )
    }
    .map_err(SlateError::from)?;

    Ok(hwnd)
}

// ── Menu construction ─────────────────────────────────────────────────────────

fn build_menu(dark: bool) -> Result<HMENU> {
    let dark_check = if dark { MF_CHECKED } else { MF_UNCHECKED };

    // SAFETY: CreateMenu has no preconditions; it always succeeds unless the
    // system is critically low on resources, in which case ? propagates the error.
    unsafe {
        let bar = CreateMenu().map_err(SlateError::from)?;

        // ── File ──────────────────────────────────────────────────────────────
        let file = CreateMenu().map_err(SlateError::from)?;
        AppendMenuW(file, MF_STRING, IDM_FILE_OPEN, w!("&Open...\tCtrl+O"))
            .map_err(SlateError::from)?;
        AppendMenuW(file, MF_STRING, IDM_FILE_SAVE, w!("&Save\tCtrl+S"))
            .map_err(SlateError::from)?;
        AppendMenuW(file, MF_STRING, IDM_FILE_SAVE_AS, w!("Save &As...\tCtrl+Shift+S"))
            .map_err(SlateError::from)?;

        // ── Settings ──────────────────────────────────────────────────────────
        let settings = CreateMenu().map_err(SlateError::from)?;
        AppendMenuW(
            settings,
            MF_STRING | dark_check,
            IDM_SETTINGS_DARK_MODE,
            w!("&Dark Mode\tCtrl+D"),
        )
        .map_err(SlateError::from)?;
        AppendMenuW(settings, MF_STRING, IDM_SETTINGS_FONT, w!("Change &Font...\tCtrl+F"))
            .map_err(SlateError::from)?;

        // The uIDNewItem parameter for MF_POPUP is the child HMENU cast to usize.
        AppendMenuW(bar, MF_POPUP, file.0 as usize, w!("&File")).map_err(SlateError::from)?;
        AppendMenuW(bar, MF_POPUP, settings.0 as usize, w!("&Settings"))
            .map_err(SlateError::from)?;

        Ok(bar)
    }
}

fn build_accelerators() -> Result<HACCEL> {
    let ctrl = FVIRTKEY | FCONTROL;
    let table = [
        ACCEL { fVirt: ctrl, key: u16::from(b'O'), cmd: IDM_FILE_OPEN as u16 },
        ACCEL { fVirt: ctrl, key: u16::from(b'S'), cmd: IDM_FILE_SAVE as u16 },
        ACCEL { fVirt: ctrl | FSHIFT, key: u16::from(b'S'), cmd: IDM_FILE_SAVE_AS as u16 },
        ACCEL { fVirt: ctrl, key: u16::from(b'D'), cmd: IDM_SETTINGS_DARK_MODE as u16 },
        ACCEL { fVirt: ctrl, key: u16::from(b'F'), cmd: IDM_SETTINGS_FONT as u16 },
    ];
    // SAFETY: table is a valid ACCEL slice; the system copies it.
    unsafe { CreateAcceleratorTableW(&table) }.map_err(SlateError::from)
}

fn check_dark_mode_item(hwnd: HWND, dark: bool) {
    let flag = if dark { MF_CHECKED } else { MF_UNCHECKED };
    // SAFETY: hwnd is our top-level window and owns the menu bar; the item
    // is addressed by command ID so its submenu position does not matter.
    unsafe {
        let _ = CheckMenuItem(
            GetMenu(hwnd),
            IDM_SETTINGS_DARK_MODE as u32,
            (MF_BYCOMMAND | flag).0,
        );
    }
}

fn set_title(hwnd: HWND, session: &Session) {
    let title = wide(&session.window_title());
    // SAFETY: hwnd valid; title is null-terminated UTF-16 that outlives the call.
    unsafe {
        let _ = SetWindowTextW(hwnd, PCWSTR(title.as_ptr()));
    }
}

/// Size the EDIT control to the whole client area.
fn layout(hwnd: HWND, state: &WindowState) {
    let mut rc = RECT::default();
    // SAFETY: hwnd valid; rc is a writable RECT.
    if unsafe { GetClientRect(hwnd, &mut rc) }.is_ok() {
        state.edit.resize(rc.right - rc.left, rc.bottom - rc.top);
    }
}

/// Outer window rectangle, or the restored rectangle while minimised.
fn window_geometry(hwnd: HWND) -> Option<WindowGeometry> {
    let mut rc = RECT::default();
    // SAFETY: hwnd valid; rc and wp are writable, wp.length is set as required.
    unsafe {
        if IsIconic(hwnd).as_bool() {
            let mut wp = WINDOWPLACEMENT {
                length: std::mem::size_of::<WINDOWPLACEMENT>() as u32,
                ..Default::default()
            };
            GetWindowPlacement(hwnd, &mut wp).ok()?;
            rc = wp.rcNormalPosition;
        } else {
            GetWindowRect(hwnd, &mut rc).ok()?;
        }
    }
    Some(WindowGeometry {
        x: rc.left,
        y: rc.top,
        width: rc.right - rc.left,
        height: rc.bottom - rc.top,
    })
}

// ── Message loop ──────────────────────────────────────────────────────────────

fn message_loop(hwnd: HWND, accel: HACCEL) -> Result<()> {
    let mut msg = MSG::default();

    loop {
        // SAFETY: &mut msg is a valid MSG pointer; HWND::default() retrieves
        // messages for all windows on this thread; 0,0 filter accepts all.
        let ret = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };

        match ret.0 {
            // GetMessageW returns -1 on error.
            -1 => return Err(last_error("GetMessageW")),
            // Returns 0 when WM_QUIT is retrieved; exit the loop cleanly.
            0 => break,
            // SAFETY: msg was populated by a successful GetMessageW call.
            _ => unsafe {
                // The wheel goes to the focused EDIT control; hand it to the
                // main window so Ctrl+wheel zooms instead of scrolling.
                if msg.message == WM_MOUSEWHEEL {
                    let _ = SendMessageW(hwnd, WM_MOUSEWHEEL, msg.wParam, msg.lParam);
                    continue;
                }
                if TranslateAcceleratorW(hwnd, accel, &msg) != 0 {
                    continue;
                }
                let _ = TranslateMessage(&msg);
                let _ = DispatchMessageW(&msg);
            },
        }
    }

    Ok(())
}

// ── Window procedure ──────────────────────────────────────────────────────────

/// Borrow the state stored in GWLP_USERDATA.
///
/// # Safety
/// `hwnd` must be the main window, and the reference must not be held past
/// the message being handled (WM_NCDESTROY frees the state).
unsafe fn state<'a>(hwnd: HWND) -> Option<&'a WindowState> {
    let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const WindowState;
    ptr.as_ref()
}

// SAFETY: wnd_proc is registered as lpfnWndProc in WNDCLASSEXW.
// Windows guarantees that hwnd, msg, wparam, and lparam are valid for the
// lifetime of this call; we must not store hwnd beyond the message handler.
unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    // Messages sent during CreateWindowExW arrive before the state exists.
    let Some(st) = state(hwnd) else {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    };

    match msg {
        // ── Commands ──────────────────────────────────────────────────────────
        WM_COMMAND => {
            // Low word of WPARAM is the command identifier (menu or accelerator).
            st.command(hwnd, wparam.0 & 0xFFFF);
            LRESULT(0)
        }

        WM_MOUSEWHEEL => {
            st.wheel(hwnd, wparam);
            LRESULT(0)
        }

        // ── Painting & layout ─────────────────────────────────────────────────
        WM_CTLCOLOREDIT if HWND(lparam.0 as *mut c_void) == st.edit.hwnd() => {
            st.edit.paint(HDC(wparam.0 as *mut c_void))
        }

        WM_SIZE => {
            // lparam low word = new client width, high word = new client height.
            let width = (lparam.0 & 0xFFFF) as i32;
            let height = ((lparam.0 >> 16) & 0xFFFF) as i32;
            st.edit.resize(width, height);
            LRESULT(0)
        }

        WM_SETFOCUS => {
            st.edit.focus();
            LRESULT(0)
        }

        // ── Lifecycle ─────────────────────────────────────────────────────────
        WM_CLOSE => {
            st.close(hwnd);
            // SAFETY: DestroyWindow triggers WM_DESTROY then WM_NCDESTROY;
            // `st` is not touched after this point.
            let _ = DestroyWindow(hwnd);
            LRESULT(0)
        }

        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }

        WM_NCDESTROY => {
            // Children are gone by now, so the EDIT control's font and brush
            // can be released with the rest of the state.
            let ptr = SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) as *mut WindowState;
            if !ptr.is_null() {
                // SAFETY: ptr came from Box::into_raw in run() and is cleared
                // above, so it is reclaimed exactly once.
                drop(Box::from_raw(ptr));
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }

        // Default processing for all unhandled messages.
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}
