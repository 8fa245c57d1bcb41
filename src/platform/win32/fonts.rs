// ── FontSpec ⇄ LOGFONTW ───────────────────────────────────────────────────────

use windows::Win32::Graphics::Gdi::{DEFAULT_CHARSET, LOGFONTW};

use super::dpi;
use crate::font::{FontSpec, FontStyle};

const FW_NORMAL: i32 = 400;
const FW_BOLD: i32 = 700;

/// Build a `LOGFONTW` for `spec` with its height measured at `dpi`.
///
/// Face names longer than 31 UTF-16 units are truncated (LF_FACESIZE − 1).
pub(crate) fn logfont(spec: &FontSpec, dpi: u32) -> LOGFONTW {
    let mut lf = LOGFONTW {
        // Negative height selects by character height, i.e. the point size.
        lfHeight: -dpi::points_to_pixels(spec.size, dpi),
        lfWeight: if spec.style.bold { FW_BOLD } else { FW_NORMAL },
        lfItalic: u8::from(spec.style.italic),
        lfCharSet: DEFAULT_CHARSET,
        ..Default::default()
    };
    let max = lf.lfFaceName.len() - 1;
    for (dst, src) in lf.lfFaceName.iter_mut().zip(spec.family.encode_utf16().take(max)) {
        *dst = src;
    }
    lf
}

/// Read back the dialog's choice.  `point_size_tenths` is
/// `CHOOSEFONTW::iPointSize`.
pub(crate) fn spec_from_logfont(lf: &LOGFONTW, point_size_tenths: i32) -> FontSpec {
    let len = lf
        .lfFaceName
        .iter()
        .position(|&c| c == 0)
        .unwrap_or(lf.lfFaceName.len());
    FontSpec {
        family: String::from_utf16_lossy(&lf.lfFaceName[..len]),
        size: ((point_size_tenths + 5) / 10).max(1),
        style: FontStyle {
            bold: lf.lfWeight >= FW_BOLD,
            italic: lf.lfItalic != 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_logfont() {
        let spec = FontSpec {
            family: "Consolas".to_owned(),
            size: 12,
            style: FontStyle { bold: true, italic: true },
        };
        let lf = logfont(&spec, dpi::BASE_DPI);
        assert_eq!(lf.lfHeight, -16);
        assert_eq!(spec_from_logfont(&lf, 120), spec);
    }

    #[test]
    fn long_face_name_is_truncated_and_terminated() {
        let spec = FontSpec {
            family: "X".repeat(64),
            ..FontSpec::default()
        };
        let lf = logfont(&spec, dpi::BASE_DPI);
        assert_eq!(lf.lfFaceName[31], 0);
        assert_eq!(spec_from_logfont(&lf, 140).family.len(), 31);
    }

    #[test]
    fn unbounded_zoom_yields_a_finite_height() {
        let lf = logfont(&FontSpec::default().with_size(i32::MAX), 144);
        assert!(lf.lfHeight < 0);
    }
}
