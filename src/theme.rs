// ── Dual light/dark colour scheme ─────────────────────────────────────────────
//
// The text surface has exactly two looks: white-on-dark-grey and
// black-on-white.  The platform layer asks the session for the active
// `Palette` and paints the edit control with it.
//
// Colour conventions:
//   • All palette entries are in 0xRRGGBB form.
//   • `Rgb::colorref` converts to Win32's BGR COLORREF before passing to GDI.

/// A 24-bit colour stored as 0xRRGGBB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xFF_FF_FF);
    pub const BLACK: Rgb = Rgb(0x00_00_00);
    pub const DARK_GRAY: Rgb = Rgb(0x40_40_40);

    /// Convert 0xRRGGBB → BGR COLORREF (0x00BBGGRR).
    pub const fn colorref(self) -> u32 {
        let r = (self.0 >> 16) & 0xFF;
        let g = (self.0 >> 8) & 0xFF;
        let b = self.0 & 0xFF;
        (b << 16) | (g << 8) | r
    }
}

/// The two colours applied to the text surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Rgb,
    pub foreground: Rgb,
}

/// Black on white.
pub const LIGHT: Palette = Palette {
    background: Rgb::WHITE,
    foreground: Rgb::BLACK,
};

/// White on dark grey.
pub const DARK: Palette = Palette {
    background: Rgb::DARK_GRAY,
    foreground: Rgb::WHITE,
};

/// Which of the two palettes is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl ColorScheme {
    pub fn from_dark_flag(dark: bool) -> Self {
        if dark {
            Self::Dark
        } else {
            Self::Light
        }
    }

    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }

    pub fn palette(self) -> Palette {
        match self {
            Self::Light => LIGHT,
            Self::Dark => DARK,
        }
    }
}
