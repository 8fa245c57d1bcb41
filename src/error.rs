// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in Slate return `error::Result<T>`.  No panics in
// production paths; document I/O errors surface as user-facing dialogs (see
// `platform::win32::dialogs::show_error`), preference errors are logged.

use std::path::PathBuf;

/// Every error that Slate can produce.
#[derive(Debug, thiserror::Error)]
pub enum SlateError {
    /// Reading a document failed.  The message mirrors the dialog text.
    #[error("Error opening file: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing a document failed.
    #[error("Error saving file: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The preferences file could not be read or written.
    #[error("preferences I/O error at {}: {source}", path.display())]
    PrefsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The preferences could not be serialised.
    #[error("preferences format error: {0}")]
    PrefsFormat(#[from] serde_json::Error),

    /// A Win32 API call returned a failure code.
    #[cfg(windows)]
    #[error("{function} failed (error {code:#010x})")]
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },
}

impl SlateError {
    /// True for the document read/write failures that get a modal report.
    /// Everything else is logged only.
    pub fn is_document_io(&self) -> bool {
        matches!(self, Self::Open { .. } | Self::Save { .. })
    }
}

// Convert a windows-crate error (HRESULT) directly into a SlateError so that
// `?` can be used on `windows::core::Result<T>` throughout the platform module.
#[cfg(windows)]
impl From<windows::core::Error> for SlateError {
    fn from(e: windows::core::Error) -> Self {
        // HRESULT.0 is i32; reinterpret bits as u32 for display purposes.
        Self::Win32 {
            function: "windows",
            code: e.code().0 as u32,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SlateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn open_error_embeds_io_reason() {
        let e = SlateError::Open {
            path: PathBuf::from("missing.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(e.to_string(), "Error opening file: no such file");
        assert!(e.is_document_io());
    }

    #[test]
    fn save_error_embeds_io_reason() {
        let e = SlateError::Save {
            path: PathBuf::from("locked.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        };
        assert_eq!(e.to_string(), "Error saving file: access denied");
    }

    #[test]
    fn prefs_errors_are_not_document_io() {
        let e = SlateError::PrefsIo {
            path: PathBuf::from("prefs.json"),
            source: io::Error::other("disk full"),
        };
        assert!(!e.is_document_io());
        assert!(e.to_string().contains("disk full"));
    }

    #[cfg(windows)]
    #[test]
    fn win32_errors_are_not_document_io() {
        let e = SlateError::Win32 {
            function: "CreateFontIndirectW",
            code: 0,
        };
        assert!(!e.is_document_io());
    }
}
