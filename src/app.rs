// ── Editor session & top-level state ──────────────────────────────────────────
//
// A single `EditorSession` is created on startup and owned by `WindowState`
// for the lifetime of the main window.  All mutations happen on the UI
// thread. There is no global mutable state; preferences go through the
// injected `PreferenceStore`.

use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::{
    editor::normalize_lines,
    error::{Result, SlateError},
    font::{scroll_delta, zoomed_size, FontSpec, WheelEffect, WheelInput},
    prefs::{Preference, PreferenceStore, WindowGeometry},
    prompt::Prompter,
    theme::{ColorScheme, Palette},
};

/// Extension forced onto Save As targets.
pub const TEXT_EXTENSION: &str = "txt";

/// Name shown in the title bar.
pub const APP_NAME: &str = "Slate";

// ── DocumentState ─────────────────────────────────────────────────────────────

/// The buffer and the file it was last opened from or saved to.
#[derive(Debug, Default)]
pub(crate) struct DocumentState {
    /// Path of the file on disk, or `None` for an untitled buffer.
    pub path: Option<PathBuf>,
    /// Full text, `\n` line endings.
    pub text: String,
}

impl DocumentState {
    /// The bare filename component, or `"Untitled"` if no path is set.
    pub(crate) fn display_name(&self) -> String {
        self.path
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_owned())
    }
}

// ── Presentation ──────────────────────────────────────────────────────────────

/// Font and colours currently applied to the text surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Presentation {
    pub font: FontSpec,
    pub scheme: ColorScheme,
}

// ── EditorSession ─────────────────────────────────────────────────────────────

/// Top-level editor state.
///
/// Every user command is a method here.  Commands that touch the disk return
/// `Result`; the caller turns an `Err` into a modal report and carries on.
/// Commands that may be cancelled return `Ok(false)` when they were.
pub struct EditorSession<P: PreferenceStore> {
    doc: DocumentState,
    presentation: Presentation,
    geometry: WindowGeometry,
    prefs: P,
}

impl<P: PreferenceStore> EditorSession<P> {
    /// Create a session with an empty untitled buffer, restoring geometry and
    /// colour scheme from `prefs`.  The font always starts at the default.
    pub fn new(prefs: P) -> Self {
        let loaded = prefs.load();
        debug!(?loaded, "restored preferences");
        Self {
            doc: DocumentState::default(),
            presentation: Presentation {
                font: FontSpec::default(),
                scheme: ColorScheme::from_dark_flag(loaded.dark_mode),
            },
            geometry: loaded.window,
            prefs,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn text(&self) -> &str {
        &self.doc.text
    }

    pub fn path(&self) -> Option<&Path> {
        self.doc.path.as_deref()
    }

    pub fn font(&self) -> &FontSpec {
        &self.presentation.font
    }

    pub fn palette(&self) -> Palette {
        self.presentation.scheme.palette()
    }

    pub fn is_dark(&self) -> bool {
        self.presentation.scheme.is_dark()
    }

    pub fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    /// Replace the buffer with whatever the user has typed.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.doc.text = text.into();
    }

    /// Compute the title string for the main window.
    ///
    /// | State | Title |
    /// |---|---|
    /// | No path | `"Slate"` |
    /// | Path set | `"filename — Slate"` |
    pub fn window_title(&self) -> String {
        if self.doc.path.is_none() {
            return APP_NAME.to_owned();
        }
        format!("{} \u{2014} {APP_NAME}", self.doc.display_name())
    }

    // ── File open ─────────────────────────────────────────────────────────────

    /// Ask for a file and open it.  Returns `Ok(false)` if the prompt was
    /// cancelled.
    pub fn open_interactive(&mut self, prompter: &mut dyn Prompter) -> Result<bool> {
        let Some(path) = prompter.choose_open_path() else {
            debug!("open cancelled");
            return Ok(false);
        };
        self.open_path(path)?;
        Ok(true)
    }

    /// Open a path given on the command line.  Anything that is not an
    /// existing regular file is ignored without error.
    pub fn open_startup_arg(&mut self, path: impl Into<PathBuf>) -> Result<bool> {
        let path = path.into();
        if !path.is_file() {
            debug!(path = %path.display(), "startup argument is not a file; ignoring");
            return Ok(false);
        }
        self.open_path(path)?;
        Ok(true)
    }

    /// Read `path` into the buffer and make it the file reference.
    ///
    /// Lines are re-terminated with `\n` (see `normalize_lines`).  The read
    /// goes into a temporary string, so on failure the previous buffer and
    /// file reference are left untouched.
    pub fn open_path(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let text = read_text(&path).map_err(|source| SlateError::Open {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), bytes = text.len(), "opened file");
        self.doc.text = normalize_lines(&text);
        self.doc.path = Some(path);
        Ok(())
    }

    // ── File save ─────────────────────────────────────────────────────────────

    /// Write the buffer to the current file, or fall through to Save As when
    /// the buffer is untitled.  Returns `Ok(false)` only if Save As was
    /// cancelled.
    pub fn save(&mut self, prompter: &mut dyn Prompter) -> Result<bool> {
        let Some(path) = self.doc.path.clone() else {
            return self.save_as(prompter);
        };
        self.write_to(&path)?;
        Ok(true)
    }

    /// Ask for a destination, force the `.txt` extension, adopt it as the
    /// file reference and save.
    ///
    /// The reference is updated before the write, so a failed write still
    /// leaves the buffer associated with the chosen path.
    pub fn save_as(&mut self, prompter: &mut dyn Prompter) -> Result<bool> {
        let suggested = match self.doc.path {
            Some(_) => self.doc.display_name(),
            None => String::new(),
        };
        let Some(chosen) = prompter.choose_save_path(&suggested) else {
            debug!("save as cancelled");
            return Ok(false);
        };
        let path = with_text_extension(chosen);
        self.doc.path = Some(path.clone());
        self.write_to(&path)?;
        Ok(true)
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.doc.text.as_bytes()).map_err(|source| SlateError::Save {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), bytes = self.doc.text.len(), "saved file");
        Ok(())
    }

    // ── Presentation ──────────────────────────────────────────────────────────

    /// Switch the colour scheme and persist the flag right away.
    ///
    /// Returns the palette to paint with.  A failing preference write is
    /// logged; the scheme still changes.
    pub fn toggle_dark_mode(&mut self, enabled: bool) -> Palette {
        self.presentation.scheme = ColorScheme::from_dark_flag(enabled);
        self.persist(Preference::DarkMode(enabled));
        self.palette()
    }

    /// Ask for a new font.  Returns `true` if one was chosen.
    pub fn change_font(&mut self, prompter: &mut dyn Prompter) -> bool {
        match prompter.choose_font(&self.presentation.font) {
            Some(font) => {
                debug!(?font, "font changed");
                self.presentation.font = font;
                true
            }
            None => false,
        }
    }

    /// React to a wheel event over the text surface.
    ///
    /// With the fine-control modifier the font grows or shrinks by
    /// `ZOOM_STEP` per notch (never below `MIN_FONT_SIZE`); otherwise the
    /// view scrolls by `unit_increment × SCROLL_MULTIPLIER` per unit.
    pub fn wheel(&mut self, input: WheelInput, unit_increment: i32) -> WheelEffect {
        if input.fine {
            let size = zoomed_size(self.presentation.font.size, input.notches);
            self.presentation.font.size = size;
            WheelEffect::FontResized(size)
        } else {
            WheelEffect::ScrollBy(scroll_delta(input.units_to_scroll, unit_increment))
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Record and persist the window geometry as the window closes.
    ///
    /// The buffer is not saved; unsaved edits are discarded.
    pub fn on_close(&mut self, geometry: WindowGeometry) {
        self.geometry = geometry;
        if let Err(e) = self.prefs.save_all(&Preference::geometry(geometry)) {
            warn!(error = %e, "failed to persist window geometry");
        }
    }

    fn persist(&mut self, pref: Preference) {
        if let Err(e) = self.prefs.save(pref) {
            warn!(key = pref.key(), error = %e, "failed to persist preference");
        }
    }
}

/// Read a whole file as text.  Invalid UTF-8 is replaced, not rejected.
fn read_text(path: &Path) -> std::io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Append `.txt` unless the file name already ends with it (any case).
pub fn with_text_extension(path: PathBuf) -> PathBuf {
    // A bare `.txt` counts too, so match on the name rather than
    // `Path::extension`, which sees no extension in a leading-dot name.
    let suffix = format!(".{TEXT_EXTENSION}");
    let has_ext = path.file_name().is_some_and(|name| {
        let name = name.to_string_lossy();
        name.len() >= suffix.len()
            && name.is_char_boundary(name.len() - suffix.len())
            && name[name.len() - suffix.len()..].eq_ignore_ascii_case(&suffix)
    });
    if has_ext {
        return path;
    }
    let mut s = path.into_os_string();
    s.push(".");
    s.push(TEXT_EXTENSION);
    PathBuf::from(s)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        font::{FontStyle, MIN_FONT_SIZE},
        prefs::{MemoryPreferenceStore, Preferences},
        theme::{DARK, LIGHT},
    };

    /// Answers every prompt from a fixed script.
    #[derive(Default)]
    struct Scripted {
        open: Option<PathBuf>,
        save: Option<PathBuf>,
        font: Option<FontSpec>,
        save_prompts: Vec<String>,
        font_seeds: Vec<FontSpec>,
    }

    impl Prompter for Scripted {
        fn choose_open_path(&mut self) -> Option<PathBuf> {
            self.open.take()
        }
        fn choose_save_path(&mut self, suggested: &str) -> Option<PathBuf> {
            self.save_prompts.push(suggested.to_owned());
            self.save.take()
        }
        fn choose_font(&mut self, current: &FontSpec) -> Option<FontSpec> {
            self.font_seeds.push(current.clone());
            self.font.take()
        }
    }

    fn session() -> EditorSession<MemoryPreferenceStore> {
        EditorSession::new(MemoryPreferenceStore::default())
    }

    #[test]
    fn fresh_session_is_empty_and_untitled() {
        let s = session();
        assert_eq!(s.text(), "");
        assert!(s.path().is_none());
        assert_eq!(s.window_title(), "Slate");
        assert_eq!(*s.font(), FontSpec::default());
        assert_eq!(s.geometry(), WindowGeometry::default());
    }

    #[test]
    fn startup_restores_dark_mode_and_geometry() {
        let g = WindowGeometry { x: 1, y: 2, width: 3, height: 4 };
        let s = EditorSession::new(MemoryPreferenceStore::new(Preferences {
            window: g,
            dark_mode: true,
        }));
        assert!(s.is_dark());
        assert_eq!(s.palette(), DARK);
        assert_eq!(s.geometry(), g);
    }

    #[test]
    fn title_shows_file_name() {
        let mut s = session();
        s.doc.path = Some(PathBuf::from("notes").join("todo.txt"));
        assert_eq!(s.window_title(), "todo.txt \u{2014} Slate");
    }

    #[test]
    fn open_normalizes_lines_and_sets_reference() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        fs::write(&path, "hello\r\nworld").expect("write");

        let mut s = session();
        s.open_path(&path).expect("open");
        assert_eq!(s.text(), "hello\nworld\n");
        assert_eq!(s.path(), Some(path.as_path()));
    }

    #[test]
    fn open_replaces_invalid_utf8() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("latin1.txt");
        fs::write(&path, b"caf\xE9").expect("write");

        let mut s = session();
        s.open_path(&path).expect("open");
        assert_eq!(s.text(), "caf\u{FFFD}\n");
    }

    #[test]
    fn failed_open_keeps_previous_buffer_and_reference() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("good.txt");
        fs::write(&good, "keep me").expect("write");

        let mut s = session();
        s.open_path(&good).expect("open");
        let err = s
            .open_path(dir.path().join("missing.txt"))
            .expect_err("missing file must fail");

        assert!(matches!(err, SlateError::Open { .. }));
        assert!(err.to_string().starts_with("Error opening file: "));
        assert_eq!(s.text(), "keep me\n");
        assert_eq!(s.path(), Some(good.as_path()));
    }

    #[test]
    fn cancelled_open_is_a_no_op() {
        let mut s = session();
        s.set_text("draft");
        let opened = s.open_interactive(&mut Scripted::default()).expect("no error");
        assert!(!opened);
        assert_eq!(s.text(), "draft");
        assert!(s.path().is_none());
    }

    #[test]
    fn startup_arg_ignores_non_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut s = session();
        assert!(!s.open_startup_arg(dir.path()).expect("directory ignored"));
        assert!(!s
            .open_startup_arg(dir.path().join("absent.txt"))
            .expect("missing ignored"));
        assert!(s.path().is_none());
    }

    #[test]
    fn save_writes_buffer_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.txt");
        fs::write(&path, "old content that is longer").expect("write");

        let mut s = session();
        s.open_path(&path).expect("open");
        s.set_text("a\r\nb");
        assert!(s.save(&mut Scripted::default()).expect("save"));
        assert_eq!(fs::read_to_string(&path).expect("read back"), "a\r\nb");
    }

    #[test]
    fn untitled_save_goes_through_save_as() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut prompter = Scripted {
            save: Some(dir.path().join("draft")),
            ..Default::default()
        };

        let mut s = session();
        assert!(s.save(&mut prompter).expect("save"));

        let expected = dir.path().join("draft.txt");
        assert_eq!(prompter.save_prompts, vec![String::new()]);
        assert_eq!(s.path(), Some(expected.as_path()));
        assert_eq!(fs::read_to_string(&expected).expect("created"), "");
    }

    #[test]
    fn cancelled_save_as_changes_nothing() {
        let mut s = session();
        s.set_text("unsaved");
        assert!(!s.save(&mut Scripted::default()).expect("no error"));
        assert!(s.path().is_none());
        assert_eq!(s.text(), "unsaved");
    }

    #[test]
    fn save_as_suggests_current_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        fs::write(&path, "").expect("write");
        let mut s = session();
        s.open_path(&path).expect("open");

        let mut prompter = Scripted::default();
        s.save_as(&mut prompter).expect("cancel is fine");
        assert_eq!(prompter.save_prompts, vec!["notes.txt".to_owned()]);
    }

    #[test]
    fn failed_save_keeps_buffer_and_new_reference() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("no-such-dir").join("x");
        let mut prompter = Scripted {
            save: Some(target.clone()),
            ..Default::default()
        };

        let mut s = session();
        s.set_text("precious");
        let err = s.save_as(&mut prompter).expect_err("parent dir missing");
        assert!(matches!(err, SlateError::Save { .. }));
        assert!(err.to_string().starts_with("Error saving file: "));
        assert_eq!(s.text(), "precious");
        assert_eq!(s.path(), Some(with_text_extension(target).as_path()));
    }

    #[test]
    fn extension_appended_exactly_once() {
        assert_eq!(with_text_extension("draft".into()), PathBuf::from("draft.txt"));
        assert_eq!(with_text_extension("notes.txt".into()), PathBuf::from("notes.txt"));
        assert_eq!(with_text_extension("NOTES.TXT".into()), PathBuf::from("NOTES.TXT"));
        assert_eq!(with_text_extension("report.md".into()), PathBuf::from("report.md.txt"));
        assert_eq!(with_text_extension("v1.2".into()), PathBuf::from("v1.2.txt"));
        assert_eq!(with_text_extension(".txt".into()), PathBuf::from(".txt"));
        assert_eq!(with_text_extension("dir/.TXT".into()), PathBuf::from("dir/.TXT"));
        assert_eq!(with_text_extension("foo.".into()), PathBuf::from("foo..txt"));
        assert_eq!(with_text_extension("txt".into()), PathBuf::from("txt.txt"));
    }

    #[test]
    fn dark_mode_toggle_round_trips_colours_and_persists() {
        let mut s = session();
        let original = s.palette();
        assert_eq!(original, LIGHT);

        assert_eq!(s.toggle_dark_mode(true), DARK);
        assert_eq!(s.toggle_dark_mode(false), original);
        assert_eq!(
            s.prefs().writes(),
            &[Preference::DarkMode(true), Preference::DarkMode(false)]
        );
    }

    #[test]
    fn change_font_replaces_whole_font() {
        let chosen = FontSpec {
            family: "Consolas".to_owned(),
            size: 11,
            style: FontStyle { bold: true, italic: true },
        };
        let mut prompter = Scripted {
            font: Some(chosen.clone()),
            ..Default::default()
        };

        let mut s = session();
        assert!(s.change_font(&mut prompter));
        assert_eq!(prompter.font_seeds, vec![FontSpec::default()]);
        assert_eq!(*s.font(), chosen);
    }

    #[test]
    fn cancelled_font_change_keeps_font() {
        let mut s = session();
        assert!(!s.change_font(&mut Scripted::default()));
        assert_eq!(*s.font(), FontSpec::default());
    }

    #[test]
    fn font_is_never_persisted() {
        let mut prompter = Scripted {
            font: Some(FontSpec::default().with_size(30)),
            ..Default::default()
        };
        let mut s = session();
        s.change_font(&mut prompter);
        s.wheel(WheelInput { notches: 1, units_to_scroll: -3, fine: true }, 1);
        assert!(s.prefs().writes().is_empty());
    }

    #[test]
    fn ctrl_wheel_zooms_with_floor() {
        let mut s = session();
        let up = WheelInput { notches: 2, units_to_scroll: -6, fine: true };
        assert_eq!(s.wheel(up, 1), WheelEffect::FontResized(18));

        let down = WheelInput { notches: -100, units_to_scroll: 300, fine: true };
        assert_eq!(s.wheel(down, 1), WheelEffect::FontResized(MIN_FONT_SIZE));
        assert_eq!(s.font().size, MIN_FONT_SIZE);
    }

    #[test]
    fn plain_wheel_scrolls_and_keeps_font() {
        let mut s = session();
        let input = WheelInput { notches: -1, units_to_scroll: 3, fine: false };
        assert_eq!(s.wheel(input, 2), WheelEffect::ScrollBy(90));
        assert_eq!(s.font().size, 14);
    }

    #[test]
    fn close_persists_geometry_only() {
        let mut s = session();
        s.set_text("lost on close");
        let g = WindowGeometry { x: 10, y: 20, width: 640, height: 480 };
        s.on_close(g);

        assert_eq!(s.geometry(), g);
        assert_eq!(s.prefs().writes(), &Preference::geometry(g));
        assert!(!s.prefs().load().dark_mode);
    }

    /// Counts how values reach the store.
    #[derive(Default)]
    struct Counting {
        inner: MemoryPreferenceStore,
        single: usize,
        batches: usize,
    }

    impl PreferenceStore for Counting {
        fn load(&self) -> Preferences {
            self.inner.load()
        }
        fn save(&mut self, pref: Preference) -> Result<()> {
            self.single += 1;
            self.inner.save(pref)
        }
        fn save_all(&mut self, prefs: &[Preference]) -> Result<()> {
            self.batches += 1;
            prefs.iter().try_for_each(|&p| self.inner.save(p))
        }
    }

    #[test]
    fn close_writes_geometry_as_one_batch() {
        let mut s = EditorSession::new(Counting::default());
        let g = WindowGeometry { x: 1, y: 2, width: 300, height: 200 };
        s.on_close(g);

        assert_eq!(s.prefs().batches, 1);
        assert_eq!(s.prefs().single, 0);
        assert_eq!(s.prefs().load().window, g);
    }
}
