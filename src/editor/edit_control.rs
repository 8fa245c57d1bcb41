// ── EDIT child-window hosting ─────────────────────────────────────────────────
//
// This is one of exactly two modules where `unsafe` is permitted.
// Every `unsafe` block MUST carry a `// SAFETY:` comment.
//
// ── GDI ownership model ───────────────────────────────────────────────────────
//
// `EditControl` owns the HFONT it hands to the control via WM_SETFONT and the
// HBRUSH it returns from WM_CTLCOLOREDIT.  Both are replaced through `Cell`s
// so that handlers can run from a shared `&EditControl`, including re-entrant
// paint messages while a modal dialog is up.  They are deleted on `Drop`,
// which `WindowState` arranges to happen in WM_NCDESTROY, after Windows has
// destroyed the child window.

#![allow(unsafe_code)]

use std::cell::Cell;

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, TRUE, WPARAM},
        Graphics::Gdi::{
            CreateFontIndirectW, CreateSolidBrush, DeleteObject, InvalidateRect, SetBkColor,
            SetTextColor, HBRUSH, HDC, HFONT, HGDIOBJ,
        },
        UI::{
            Input::KeyboardAndMouse::SetFocus,
            WindowsAndMessaging::{
                CreateWindowExW, GetWindowTextLengthW, GetWindowTextW, MoveWindow,
                SendMessageW, SetWindowTextW, HMENU, WINDOW_STYLE, WM_SETFONT, WS_CHILD,
                WS_EX_CLIENTEDGE, WS_HSCROLL, WS_VISIBLE, WS_VSCROLL,
            },
        },
    },
};

use crate::{
    error::{Result, SlateError},
    font::FontSpec,
    platform::win32::{dialogs::wide, dpi, fonts},
    theme::Palette,
};

// ── Edit-control messages & styles ────────────────────────────────────────────

const EM_LINESCROLL: u32 = 0x00B6;
const EM_SETLIMITTEXT: u32 = 0x00C5;

const ES_MULTILINE: u32 = 0x0004;
const ES_AUTOVSCROLL: u32 = 0x0040;
const ES_AUTOHSCROLL: u32 = 0x0080;
const ES_NOHIDESEL: u32 = 0x0100;
const ES_WANTRETURN: u32 = 0x1000;

// ── EditControl ───────────────────────────────────────────────────────────────

/// The multi-line EDIT child that fills the main window's client area.
pub(crate) struct EditControl {
    hwnd: HWND,
    font: Cell<HFONT>,
    /// Pixel height of the current font; one scroll line.
    line_height: Cell<i32>,
    brush: Cell<HBRUSH>,
    palette: Cell<Palette>,
}

impl EditControl {
    /// Create the EDIT child inside `hwnd_parent`, initially zero-sized; the
    /// parent's WM_SIZE handler lays it out.
    pub(crate) fn create(hwnd_parent: HWND, hinstance: HINSTANCE, palette: Palette) -> Result<Self> {
        let style = WS_CHILD
            | WS_VISIBLE
            | WS_VSCROLL
            | WS_HSCROLL
            | WINDOW_STYLE(ES_MULTILINE | ES_AUTOVSCROLL | ES_AUTOHSCROLL | ES_NOHIDESEL | ES_WANTRETURN);

        // SAFETY: "EDIT" is a system window class; hwnd_parent and hinstance
        // are valid handles owned by the caller.
        let hwnd = unsafe {
            CreateWindowExW(
                WS_EX_CLIENTEDGE,
                w!("EDIT"),
                PCWSTR::null(),
                style,
                0,
                0,
                0,
                0,
                hwnd_parent,
                HMENU::default(),
                hinstance,
                None,
            )
        }
        .map_err(SlateError::from)?;

        // SAFETY: hwnd is the EDIT control just created.  A limit of 0 lifts
        // the default 32 767-character cap to the maximum.
        unsafe {
            let _ = SendMessageW(hwnd, EM_SETLIMITTEXT, WPARAM(0), LPARAM(0));
        }

        Ok(Self {
            hwnd,
            font: Cell::new(HFONT::default()),
            line_height: Cell::new(1),
            brush: Cell::new(new_brush(palette)?),
            palette: Cell::new(palette),
        })
    }

    pub(crate) fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// Fill the given client rectangle.
    pub(crate) fn resize(&self, width: i32, height: i32) {
        // SAFETY: hwnd valid; MoveWindow on a child is always permitted.
        unsafe {
            let _ = MoveWindow(self.hwnd, 0, 0, width, height, TRUE);
        }
    }

    pub(crate) fn focus(&self) {
        // SAFETY: hwnd valid and owned by this thread.
        unsafe {
            let _ = SetFocus(self.hwnd);
        }
    }

    // ── Text ──────────────────────────────────────────────────────────────────

    /// Replace the whole control text.  Expects `\r\n` line breaks.
    pub(crate) fn set_text(&self, text: &str) -> Result<()> {
        let buf = wide(text);
        // SAFETY: hwnd valid; buf is null-terminated UTF-16 that outlives the call.
        unsafe { SetWindowTextW(self.hwnd, PCWSTR(buf.as_ptr())) }.map_err(SlateError::from)
    }

    /// The full control text, `\r\n` line breaks.
    pub(crate) fn text(&self) -> String {
        // SAFETY: hwnd valid; read-only length query.
        let len = unsafe { GetWindowTextLengthW(self.hwnd) }.max(0) as usize;
        let mut buf = vec![0u16; len + 1];
        // SAFETY: buf holds len + 1 units, enough for the text plus terminator.
        let copied = unsafe { GetWindowTextW(self.hwnd, &mut buf) }.max(0) as usize;
        String::from_utf16_lossy(&buf[..copied.min(len)])
    }

    // ── Presentation ──────────────────────────────────────────────────────────

    /// Create an HFONT for `spec` at the control's DPI and switch to it.
    pub(crate) fn apply_font(&self, spec: &FontSpec) -> Result<()> {
        let dpi = dpi::window_dpi(self.hwnd);
        let lf = fonts::logfont(spec, dpi);
        // SAFETY: lf is a fully initialised LOGFONTW on the stack.
        let font = unsafe { CreateFontIndirectW(&lf) };
        if font.is_invalid() {
            return Err(SlateError::Win32 {
                function: "CreateFontIndirectW",
                code: 0,
            });
        }

        // SAFETY: hwnd valid; lparam TRUE asks the control to redraw.  The
        // control does not take ownership of the font.
        unsafe {
            let _ = SendMessageW(self.hwnd, WM_SETFONT, WPARAM(font.0 as usize), LPARAM(1));
        }

        let old = self.font.replace(font);
        self.line_height.set(lf.lfHeight.abs().max(1));
        delete(HGDIOBJ(old.0));
        Ok(())
    }

    pub(crate) fn line_height(&self) -> i32 {
        self.line_height.get()
    }

    /// Switch background / foreground colours and repaint.
    pub(crate) fn apply_palette(&self, palette: Palette) -> Result<()> {
        let old = self.brush.replace(new_brush(palette)?);
        self.palette.set(palette);
        delete(HGDIOBJ(old.0));
        // SAFETY: hwnd valid; a None rect invalidates the whole client area.
        unsafe {
            let _ = InvalidateRect(self.hwnd, None, TRUE);
        }
        Ok(())
    }

    /// Answer the parent's WM_CTLCOLOREDIT for this control.
    pub(crate) fn paint(&self, hdc: HDC) -> LRESULT {
        let p = self.palette.get();
        // SAFETY: hdc is the device context Windows passed with
        // WM_CTLCOLOREDIT, valid for the duration of the message.
        unsafe {
            let _ = SetTextColor(hdc, COLORREF(p.foreground.colorref()));
            let _ = SetBkColor(hdc, COLORREF(p.background.colorref()));
        }
        LRESULT(self.brush.get().0 as isize)
    }

    /// Scroll the view by whole lines; positive moves toward the end.
    pub(crate) fn scroll_lines(&self, lines: i32) {
        // SAFETY: hwnd valid; EM_LINESCROLL takes (columns, lines).
        unsafe {
            let _ = SendMessageW(self.hwnd, EM_LINESCROLL, WPARAM(0), LPARAM(lines as isize));
        }
    }
}

impl Drop for EditControl {
    fn drop(&mut self) {
        delete(HGDIOBJ(self.font.get().0));
        delete(HGDIOBJ(self.brush.get().0));
    }
}

fn new_brush(palette: Palette) -> Result<HBRUSH> {
    // SAFETY: CreateSolidBrush has no preconditions.
    let brush = unsafe { CreateSolidBrush(COLORREF(palette.background.colorref())) };
    if brush.is_invalid() {
        return Err(SlateError::Win32 {
            function: "CreateSolidBrush",
            code: 0,
        });
    }
    Ok(brush)
}

fn delete(obj: HGDIOBJ) {
    if obj.is_invalid() {
        return;
    }
    // SAFETY: obj was created by this module and is no longer selected into
    // the control (it has been replaced or the control is gone).
    unsafe {
        let _ = DeleteObject(obj);
    }
}
