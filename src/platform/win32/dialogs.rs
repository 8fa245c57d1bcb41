// ── Common dialogs ─────────────────────────────────────────────────────────────
//
// Thin wrappers around the Win32 common-dialog APIs.  Each chooser returns
// `Some(..)` on user confirmation and `None` on cancel or error.
// `DialogPrompter` exposes them to the session as a `Prompter`.
//
// This is inside `platform::win32` so `unsafe` is permitted per crate policy.

#![allow(unsafe_code)]

use std::path::PathBuf;

use windows::{
    core::{w, PCWSTR, PWSTR},
    Win32::{
        Foundation::HWND,
        UI::{
            Controls::Dialogs::{
                ChooseFontW, GetOpenFileNameW, GetSaveFileNameW, CF_INITTOLOGFONTSTRUCT,
                CF_NOVERTFONTS, CF_SCREENFONTS, CHOOSEFONTW, OFN_FILEMUSTEXIST,
                OFN_HIDEREADONLY, OFN_OVERWRITEPROMPT, OFN_PATHMUSTEXIST, OPENFILENAMEW,
            },
            WindowsAndMessaging::{MessageBoxW, MB_ICONERROR, MB_OK},
        },
    },
};

use super::{dpi, fonts};
use crate::{font::FontSpec, prompt::Prompter};

// ── Buffers ───────────────────────────────────────────────────────────────────

/// Path buffer length in UTF-16 units, terminator included.  Large enough
/// for extended-length (`\\?\`) paths.
const PATH_BUF_LEN: usize = 32_768;

/// Null-separated display/pattern pairs ending with a double null.
/// Text files first so the dialog opens filtered to them.
const FILTER: &str = "Text Files (*.txt)\0*.txt\0All Files (*.*)\0*.*\0\0";

// ── Prompter ──────────────────────────────────────────────────────────────────

/// Answers session prompts with modal dialogs owned by the main window.
pub(crate) struct DialogPrompter {
    pub(crate) owner: HWND,
}

impl Prompter for DialogPrompter {
    fn choose_open_path(&mut self) -> Option<PathBuf> {
        run_file_dialog(self.owner, FileDialog::Open, "")
    }

    fn choose_save_path(&mut self, suggested: &str) -> Option<PathBuf> {
        run_file_dialog(self.owner, FileDialog::Save, suggested)
    }

    fn choose_font(&mut self, current: &FontSpec) -> Option<FontSpec> {
        show_font_dialog(self.owner, current)
    }
}

// ── File dialogs ──────────────────────────────────────────────────────────────

/// Which common file dialog to run.
#[derive(Clone, Copy)]
enum FileDialog {
    Open,
    Save,
}

/// Run the "Open" or "Save As" dialog with `initial` in the name field.
///
/// Returns the chosen path, or `None` if the user cancelled.  The `.txt`
/// extension is the session's job, not the dialog's.
fn run_file_dialog(owner: HWND, kind: FileDialog, initial: &str) -> Option<PathBuf> {
    // Name field in, chosen path out; always null-terminated.
    let mut path: Vec<u16> = initial.encode_utf16().take(PATH_BUF_LEN - 1).collect();
    path.resize(PATH_BUF_LEN, 0);
    let filter: Vec<u16> = FILTER.encode_utf16().collect();

    let mut ofn = OPENFILENAMEW {
        lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
        hwndOwner: owner,
        lpstrFilter: PCWSTR(filter.as_ptr()),
        lpstrFile: PWSTR(path.as_mut_ptr()),
        nMaxFile: PATH_BUF_LEN as u32,
        Flags: match kind {
            FileDialog::Open => OFN_FILEMUSTEXIST | OFN_PATHMUSTEXIST | OFN_HIDEREADONLY,
            FileDialog::Save => OFN_OVERWRITEPROMPT | OFN_PATHMUSTEXIST,
        },
        ..Default::default()
    };

    // SAFETY: ofn is fully initialised and points into `path` and `filter`,
    // both of which outlive the call.  The dialog writes at most nMaxFile
    // units into `path`.  Called on the UI thread, as modal dialogs require.
    let chosen = unsafe {
        match kind {
            FileDialog::Open => GetOpenFileNameW(&mut ofn),
            FileDialog::Save => GetSaveFileNameW(&mut ofn),
        }
    };

    chosen.as_bool().then(|| path_from_buf(&path))
}

// ── Font dialog ───────────────────────────────────────────────────────────────

/// Show the standard "Font" dialog seeded with `current`.
pub(crate) fn show_font_dialog(hwnd_owner: HWND, current: &FontSpec) -> Option<FontSpec> {
    // ChooseFontW measures the seed LOGFONT against the screen DC, which
    // reports the system DPI rather than the window's.
    let mut lf = fonts::logfont(current, dpi::system_dpi());

    let mut cf = CHOOSEFONTW {
        lStructSize: std::mem::size_of::<CHOOSEFONTW>() as u32,
        hwndOwner: hwnd_owner,
        lpLogFont: &mut lf,
        Flags: CF_SCREENFONTS | CF_INITTOLOGFONTSTRUCT | CF_NOVERTFONTS,
        ..Default::default()
    };

    // SAFETY: `cf` is fully initialised and `lf` outlives the call;
    // ChooseFontW writes the selection back into `lf` and `cf.iPointSize`.
    let ok = unsafe { ChooseFontW(&mut cf) };

    ok.as_bool()
        .then(|| fonts::spec_from_logfont(&lf, cf.iPointSize))
}

// ── Message boxes ─────────────────────────────────────────────────────────────

/// Modal "Error" box owned by the main window.  Used for document I/O
/// failures; the window stays usable afterwards.
pub(crate) fn show_error(hwnd_owner: HWND, message: &str) {
    let msg_wide = wide(message);
    // SAFETY: msg_wide is a valid null-terminated UTF-16 string that remains
    // allocated for the duration of the MessageBoxW call.
    // Return value (button pressed) is intentionally unused for an error dialog.
    unsafe {
        let _ = MessageBoxW(
            hwnd_owner,
            PCWSTR(msg_wide.as_ptr()),
            w!("Error"),
            MB_OK | MB_ICONERROR,
        );
    }
}

/// Ownerless error box for failures before or outside the message loop.
pub fn show_fatal_error(message: &str) {
    let msg_wide = wide(message);
    let title_wide = wide("Slate \u{2014} Fatal Error");
    // SAFETY: as in show_error; HWND::default() (null) means no owner window.
    unsafe {
        let _ = MessageBoxW(
            HWND::default(),
            PCWSTR(msg_wide.as_ptr()),
            PCWSTR(title_wide.as_ptr()),
            MB_OK | MB_ICONERROR,
        );
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Null-terminated UTF-16 copy of `s`.
pub(crate) fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Convert a null-terminated UTF-16 buffer to a `PathBuf`.
fn path_from_buf(buf: &[u16]) -> PathBuf {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    PathBuf::from(String::from_utf16_lossy(&buf[..len]))
}
