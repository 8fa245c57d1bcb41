// ── Preference persistence ────────────────────────────────────────────────────
//
// Window geometry and the dark-mode flag survive restarts.  The session only
// sees the `PreferenceStore` trait; `JsonPreferenceStore` backs it with
// `<config dir>\Slate\preferences.json`, `MemoryPreferenceStore` with a
// plain struct.  No `unsafe`; pure safe Rust + serde_json.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SlateError};

// ── Values ────────────────────────────────────────────────────────────────────

/// Position and outer size of the main window, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self {
            x: 100,
            y: 100,
            width: 800,
            height: 600,
        }
    }
}

/// Everything the session reads from the store at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub window: WindowGeometry,
    pub dark_mode: bool,
}

/// A single key together with the value to store under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    WindowX(i32),
    WindowY(i32),
    WindowWidth(i32),
    WindowHeight(i32),
    DarkMode(bool),
}

impl Preference {
    /// The persisted key name.
    pub fn key(self) -> &'static str {
        match self {
            Self::WindowX(_) => "windowX",
            Self::WindowY(_) => "windowY",
            Self::WindowWidth(_) => "windowWidth",
            Self::WindowHeight(_) => "windowHeight",
            Self::DarkMode(_) => "darkMode",
        }
    }

    /// The four entries that make up a window geometry.
    pub fn geometry(g: WindowGeometry) -> [Preference; 4] {
        [
            Self::WindowX(g.x),
            Self::WindowY(g.y),
            Self::WindowWidth(g.width),
            Self::WindowHeight(g.height),
        ]
    }

    fn apply_to(self, prefs: &mut Preferences) {
        match self {
            Self::WindowX(v) => prefs.window.x = v,
            Self::WindowY(v) => prefs.window.y = v,
            Self::WindowWidth(v) => prefs.window.width = v,
            Self::WindowHeight(v) => prefs.window.height = v,
            Self::DarkMode(v) => prefs.dark_mode = v,
        }
    }
}

// ── Store interface ───────────────────────────────────────────────────────────

/// Keyed preference storage injected into the editor session.
pub trait PreferenceStore {
    /// Current values, with defaults for anything never saved.
    fn load(&self) -> Preferences;

    /// Persist one value immediately.
    fn save(&mut self, pref: Preference) -> Result<()>;

    /// Persist several values together.  Stops at the first failure.
    fn save_all(&mut self, prefs: &[Preference]) -> Result<()> {
        prefs.iter().try_for_each(|&pref| self.save(pref))
    }
}

impl<S: PreferenceStore + ?Sized> PreferenceStore for Box<S> {
    fn load(&self) -> Preferences {
        (**self).load()
    }

    fn save(&mut self, pref: Preference) -> Result<()> {
        (**self).save(pref)
    }

    fn save_all(&mut self, prefs: &[Preference]) -> Result<()> {
        (**self).save_all(prefs)
    }
}

/// The store the binary uses: the JSON file at `path` (or the default
/// location), falling back to memory when there is no config directory.
pub fn open_store(path: Option<PathBuf>) -> Box<dyn PreferenceStore> {
    match path.or_else(default_path) {
        Some(path) => {
            debug!(path = %path.display(), "using preferences file");
            Box::new(JsonPreferenceStore::open(path))
        }
        None => {
            warn!("no config directory; preferences will not persist");
            Box::new(MemoryPreferenceStore::default())
        }
    }
}

// ── In-memory store ───────────────────────────────────────────────────────────

/// Process-lifetime store.  Also records every write, in order.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    prefs: Preferences,
    writes: Vec<Preference>,
}

impl MemoryPreferenceStore {
    pub fn new(prefs: Preferences) -> Self {
        Self {
            prefs,
            writes: Vec::new(),
        }
    }

    /// Every `save` call seen so far.
    pub fn writes(&self) -> &[Preference] {
        &self.writes
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Preferences {
        self.prefs
    }

    fn save(&mut self, pref: Preference) -> Result<()> {
        pref.apply_to(&mut self.prefs);
        self.writes.push(pref);
        Ok(())
    }
}

// ── On-disk format ────────────────────────────────────────────────────────────

const PREFS_VERSION: u32 = 1;

/// Root of the JSON preferences file.  Field names are the persisted keys.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PrefsFile {
    #[serde(default = "current_version")]
    pub(crate) version: u32,
    #[serde(default = "default_x")]
    pub(crate) window_x: i32,
    #[serde(default = "default_y")]
    pub(crate) window_y: i32,
    #[serde(default = "default_width")]
    pub(crate) window_width: i32,
    #[serde(default = "default_height")]
    pub(crate) window_height: i32,
    #[serde(default)]
    pub(crate) dark_mode: bool,
}

fn current_version() -> u32 {
    PREFS_VERSION
}
fn default_x() -> i32 {
    WindowGeometry::default().x
}
fn default_y() -> i32 {
    WindowGeometry::default().y
}
fn default_width() -> i32 {
    WindowGeometry::default().width
}
fn default_height() -> i32 {
    WindowGeometry::default().height
}

impl From<&Preferences> for PrefsFile {
    fn from(p: &Preferences) -> Self {
        Self {
            version: PREFS_VERSION,
            window_x: p.window.x,
            window_y: p.window.y,
            window_width: p.window.width,
            window_height: p.window.height,
            dark_mode: p.dark_mode,
        }
    }
}

impl From<PrefsFile> for Preferences {
    fn from(f: PrefsFile) -> Self {
        Self {
            window: WindowGeometry {
                x: f.window_x,
                y: f.window_y,
                width: f.window_width,
                height: f.window_height,
            },
            dark_mode: f.dark_mode,
        }
    }
}

// ── JSON file store ───────────────────────────────────────────────────────────

/// Return the default preferences path: `<config dir>/Slate/preferences.json`.
///
/// Returns `None` if the platform has no per-user config directory.
pub fn default_path() -> Option<PathBuf> {
    let mut p = dirs::config_dir()?;
    p.push("Slate");
    p.push("preferences.json");
    Some(p)
}

/// Store backed by a JSON file.  Every `save` rewrites the whole file.
#[derive(Debug)]
pub struct JsonPreferenceStore {
    path: PathBuf,
    prefs: Preferences,
}

impl JsonPreferenceStore {
    /// Open the store at `path`.  A missing, unreadable or foreign-version
    /// file yields defaults; the file is only created on the first `save`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let prefs = read_file(&path).unwrap_or_default();
        Self { path, prefs }
    }

    fn write(&self) -> Result<()> {
        let io_err = |source: io::Error| SlateError::PrefsIo {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }

        let file = fs::File::create(&self.path).map_err(io_err)?;
        serde_json::to_writer_pretty(file, &PrefsFile::from(&self.prefs))?;
        Ok(())
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn load(&self) -> Preferences {
        self.prefs
    }

    fn save(&mut self, pref: Preference) -> Result<()> {
        pref.apply_to(&mut self.prefs);
        debug!(key = pref.key(), path = %self.path.display(), "saving preference");
        self.write()
    }

    fn save_all(&mut self, prefs: &[Preference]) -> Result<()> {
        for pref in prefs {
            pref.apply_to(&mut self.prefs);
        }
        debug!(count = prefs.len(), path = %self.path.display(), "saving preferences");
        self.write()
    }
}

/// Read and parse the preferences file.
///
/// Returns `None` on any error: file missing, JSON parse failure, or an
/// unrecognised version number.
fn read_file(path: &Path) -> Option<Preferences> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read preferences");
            return None;
        }
    };
    let file: PrefsFile = match serde_json::from_slice(&data) {
        Ok(file) => file,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed preferences");
            return None;
        }
    };
    if file.version != PREFS_VERSION {
        warn!(version = file.version, "ignoring preferences with unknown version");
        return None;
    }
    Some(file.into())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_run_layout() {
        let p = Preferences::default();
        assert_eq!(p.window, WindowGeometry { x: 100, y: 100, width: 800, height: 600 });
        assert!(!p.dark_mode);
    }

    #[test]
    fn keys_use_persisted_names() {
        assert_eq!(Preference::WindowX(0).key(), "windowX");
        assert_eq!(Preference::WindowY(0).key(), "windowY");
        assert_eq!(Preference::WindowWidth(0).key(), "windowWidth");
        assert_eq!(Preference::WindowHeight(0).key(), "windowHeight");
        assert_eq!(Preference::DarkMode(true).key(), "darkMode");
    }

    #[test]
    fn json_field_names_are_the_keys() {
        let json = serde_json::to_string(&PrefsFile::from(&Preferences::default()))
            .expect("serialize");
        for key in ["windowX", "windowY", "windowWidth", "windowHeight", "darkMode"] {
            assert!(json.contains(key), "{key} missing from {json}");
        }
    }

    /// Files missing some keys fall back per field.
    #[test]
    fn missing_fields_take_defaults() {
        let json = r#"{"version":1,"windowX":7}"#;
        let f: PrefsFile = serde_json::from_str(json).expect("deserialize partial file");
        let p = Preferences::from(f);
        assert_eq!(p.window.x, 7);
        assert_eq!(p.window.y, 100);
        assert_eq!(p.window.width, 800);
        assert_eq!(p.window.height, 600);
        assert!(!p.dark_mode);
    }

    #[test]
    fn memory_store_applies_and_records_writes() {
        let mut store = MemoryPreferenceStore::default();
        store.save(Preference::DarkMode(true)).expect("save");
        store.save(Preference::WindowWidth(1024)).expect("save");
        let p = store.load();
        assert!(p.dark_mode);
        assert_eq!(p.window.width, 1024);
        assert_eq!(
            store.writes(),
            &[Preference::DarkMode(true), Preference::WindowWidth(1024)]
        );
    }

    #[test]
    fn json_store_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonPreferenceStore::open(dir.path().join("nope.json"));
        assert_eq!(store.load(), Preferences::default());
    }

    #[test]
    fn json_store_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Slate").join("preferences.json");

        let mut store = JsonPreferenceStore::open(&path);
        for pref in Preference::geometry(WindowGeometry { x: 5, y: 6, width: 700, height: 500 }) {
            store.save(pref).expect("save geometry");
        }
        store.save(Preference::DarkMode(true)).expect("save dark mode");

        let reopened = JsonPreferenceStore::open(&path);
        let p = reopened.load();
        assert_eq!(p.window, WindowGeometry { x: 5, y: 6, width: 700, height: 500 });
        assert!(p.dark_mode);
    }

    #[test]
    fn json_store_saves_a_batch_in_one_write() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("preferences.json");
        let g = WindowGeometry { x: -8, y: 0, width: 1920, height: 1040 };

        let mut store = JsonPreferenceStore::open(&path);
        store.save_all(&Preference::geometry(g)).expect("save batch");

        let written: PrefsFile =
            serde_json::from_slice(&fs::read(&path).expect("read")).expect("parse");
        assert_eq!(Preferences::from(written).window, g);
        assert_eq!(JsonPreferenceStore::open(&path).load().window, g);
    }

    #[test]
    fn json_store_ignores_garbage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("preferences.json");
        fs::write(&path, b"{ not json").expect("write");
        assert_eq!(JsonPreferenceStore::open(&path).load(), Preferences::default());
    }

    #[test]
    fn json_store_rejects_wrong_version() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("preferences.json");
        fs::write(&path, br#"{"version":99,"darkMode":true}"#).expect("write");
        assert!(!JsonPreferenceStore::open(&path).load().dark_mode);
    }

    #[test]
    fn json_store_reports_unwritable_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A regular file where the parent directory should be.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").expect("write");
        let mut store = JsonPreferenceStore::open(blocker.join("preferences.json"));
        let err = store.save(Preference::DarkMode(true)).expect_err("write must fail");
        assert!(matches!(err, SlateError::PrefsIo { .. }));
    }
}
