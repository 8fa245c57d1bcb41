// ── Font selection & wheel zoom ───────────────────────────────────────────────
//
// Pure Rust; the platform layer turns a `FontSpec` into an HFONT.

/// Points added per wheel notch while the fine-control modifier is held.
pub const ZOOM_STEP: i32 = 2;

/// Smallest size the wheel gesture will shrink the font to.
pub const MIN_FONT_SIZE: i32 = 1;

/// Lines-per-increment multiplier for plain (unmodified) wheel scrolling.
pub const SCROLL_MULTIPLIER: i32 = 15;

/// Bold / italic flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
}

/// A complete font choice: family, point size and style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSpec {
    pub family: String,
    /// Size in points.
    pub size: i32,
    pub style: FontStyle,
}

impl Default for FontSpec {
    /// Arial 14, plain.
    fn default() -> Self {
        Self {
            family: "Arial".to_owned(),
            size: 14,
            style: FontStyle::default(),
        }
    }
}

#[cfg(test)]
impl FontSpec {
    /// Same family and style at a different size.
    pub fn with_size(&self, size: i32) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }
}

/// One pointer-wheel event as seen by the text surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelInput {
    /// Whole notches rotated; positive when rolled away from the user.
    pub notches: i32,
    /// Units the platform would scroll for this event (notches × lines per
    /// notch), positive when scrolling toward the end of the document.
    pub units_to_scroll: i32,
    /// Fine-control modifier (Ctrl) held.
    pub fine: bool,
}

/// What the surface should do in response to a `WheelInput`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelEffect {
    /// The font was resized; re-apply it.
    FontResized(i32),
    /// Scroll the view vertically by this many unit increments.
    ScrollBy(i32),
}

/// New font size after `notches` of zoom, never below `MIN_FONT_SIZE`.
pub fn zoomed_size(size: i32, notches: i32) -> i32 {
    size.saturating_add(notches.saturating_mul(ZOOM_STEP))
        .max(MIN_FONT_SIZE)
}

/// Vertical scroll distance for an unmodified wheel event.
pub fn scroll_delta(units_to_scroll: i32, unit_increment: i32) -> i32 {
    units_to_scroll
        .saturating_mul(unit_increment)
        .saturating_mul(SCROLL_MULTIPLIER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_arial_14_plain() {
        let f = FontSpec::default();
        assert_eq!(f.family, "Arial");
        assert_eq!(f.size, 14);
        assert_eq!(f.style, FontStyle::default());
    }

    #[test]
    fn zoom_moves_two_points_per_notch() {
        assert_eq!(zoomed_size(14, 1), 16);
        assert_eq!(zoomed_size(14, 3), 20);
        assert_eq!(zoomed_size(14, -1), 12);
    }

    #[test]
    fn zoom_never_goes_below_minimum() {
        assert_eq!(zoomed_size(3, -1), MIN_FONT_SIZE);
        assert_eq!(zoomed_size(2, -50), MIN_FONT_SIZE);
        assert_eq!(zoomed_size(MIN_FONT_SIZE, -1), MIN_FONT_SIZE);
    }

    #[test]
    fn zoom_saturates_instead_of_overflowing() {
        assert_eq!(zoomed_size(i32::MAX, 1), i32::MAX);
    }

    #[test]
    fn scroll_delta_applies_multiplier() {
        assert_eq!(scroll_delta(3, 1), 45);
        assert_eq!(scroll_delta(-3, 2), -90);
        assert_eq!(scroll_delta(0, 16), 0);
    }

    #[test]
    fn with_size_keeps_family_and_style() {
        let f = FontSpec {
            family: "Consolas".to_owned(),
            size: 10,
            style: FontStyle { bold: true, italic: false },
        };
        let g = f.with_size(22);
        assert_eq!(g.family, "Consolas");
        assert_eq!(g.size, 22);
        assert!(g.style.bold);
    }
}
