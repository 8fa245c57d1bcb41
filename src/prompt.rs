// ── Interactive prompts ───────────────────────────────────────────────────────
//
// The session never opens a dialog itself.  Commands that need the user to
// pick something receive a `Prompter`; the Win32 layer implements it with
// common dialogs, tests with scripted answers.

use std::path::PathBuf;

use crate::font::FontSpec;

/// Modal questions a command may ask.  `None` always means "cancelled".
pub trait Prompter {
    /// Ask for a file to open.
    fn choose_open_path(&mut self) -> Option<PathBuf>;

    /// Ask for a destination.  `suggested` pre-fills the file-name field.
    fn choose_save_path(&mut self, suggested: &str) -> Option<PathBuf>;

    /// Ask for a font, starting from `current`.
    fn choose_font(&mut self, current: &FontSpec) -> Option<FontSpec>;
}
