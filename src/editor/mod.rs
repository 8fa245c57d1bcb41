// ── Text surface conversions ──────────────────────────────────────────────────
//
// The session buffer always uses `\n`.  Files on disk may use any of `\n`,
// `\r\n` or `\r`; the Win32 EDIT control needs `\r\n` to break lines.  These
// helpers convert between the three views of the same text.

#[cfg(windows)]
pub(crate) mod edit_control;

/// Rebuild `text` line by line, terminating every line with a single `\n`.
///
/// `\n`, `\r\n` and a lone `\r` all end a line.  A final line without a
/// terminator still gets one, so `"a\nb"` becomes `"a\nb\n"`; empty input
/// stays empty.
pub fn normalize_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 1);
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find(['\r', '\n']) {
            Some(i) => {
                out.push_str(&rest[..i]);
                out.push('\n');
                let skip = if rest[i..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[i + skip..];
            }
            None => {
                out.push_str(rest);
                out.push('\n');
                rest = "";
            }
        }
    }
    out
}

/// `\n` → `\r\n` for display in the EDIT control.
pub fn to_display(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 16);
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("\r\n");
        }
        out.push_str(line.strip_suffix('\r').unwrap_or(line));
    }
    out
}

/// `\r\n` → `\n` when pulling edited text back into the buffer.
pub fn from_display(text: &str) -> String {
    text.replace("\r\n", "\n")
}
