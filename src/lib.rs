// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except:
//   • `platform::win32`            – Win32 / WinAPI FFI
//   • `editor::edit_control`       – EDIT child-window hosting
// Each unsafe block in those modules MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

//! Slate: a minimal text editor.
//!
//! The editor logic lives in [`app::EditorSession`] and is toolkit-free; the
//! Win32 front end in `platform::win32` binds menu commands, dialogs and the
//! EDIT control to it.

pub mod app;
pub mod editor;
pub mod error;
pub mod font;
pub mod platform;
pub mod prefs;
pub mod prompt;
pub mod theme;
