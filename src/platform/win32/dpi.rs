// ── DPI awareness & point-size scaling ────────────────────────────────────────
//
// Font sizes are kept in points everywhere above this layer; the conversion
// to device pixels happens here, at the DPI of the window that draws them.

#![allow(unsafe_code)]

use windows::Win32::{
    Foundation::HWND,
    UI::HiDpi::{
        GetDpiForSystem, GetDpiForWindow, SetProcessDpiAwarenessContext,
        DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
    },
};

/// Logical pixels per inch at 100 % scaling.
pub(crate) const BASE_DPI: u32 = 96;

const POINTS_PER_INCH: i32 = 72;

/// Device pixels for `points` at `dpi`, rounded to nearest.  Saturates for
/// sizes too large to represent.
pub(crate) fn points_to_pixels(points: i32, dpi: u32) -> i32 {
    let dpi = i32::try_from(dpi).unwrap_or(i32::MAX);
    points
        .saturating_mul(dpi)
        .saturating_add(POINTS_PER_INCH / 2)
        / POINTS_PER_INCH
}

/// Switch the process to Per-Monitor v2 awareness.  Call once, before the
/// first window exists.
pub(crate) fn enable_per_monitor_awareness() {
    // SAFETY: no windows exist yet; a failure (already set by a manifest)
    // leaves the previous awareness in place, which is harmless.
    unsafe {
        let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
    }
}

/// DPI of the monitor `hwnd` is on.
pub(crate) fn window_dpi(hwnd: HWND) -> u32 {
    // SAFETY: hwnd is a live window owned by this thread.
    or_base(unsafe { GetDpiForWindow(hwnd) })
}

/// System DPI, which is what the common font dialog measures against.
pub(crate) fn system_dpi() -> u32 {
    // SAFETY: no parameters; returns 0 only on pre-Windows 10 systems.
    or_base(unsafe { GetDpiForSystem() })
}

fn or_base(dpi: u32) -> u32 {
    if dpi == 0 {
        BASE_DPI
    } else {
        dpi
    }
}
