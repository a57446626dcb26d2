use core::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::Error;

/// A terminal color.
///
/// Colors are either true RGB values or indexes into the xterm 256-color
/// palette. Equality and hashing compare the resolved RGB value, so
/// `Xterm(196)` equals `Rgb(255, 0, 0)`.
#[derive(Debug, Clone, Copy)]
pub enum Color {
    Rgb(u8, u8, u8),
    Xterm(u8),
}

/// Standard and high-intensity system colors, xterm indexes 0..16.
const SYSTEM_COLORS: [(u8, u8, u8); 16] = [
    (0x00, 0x00, 0x00),
    (0x80, 0x00, 0x00),
    (0x00, 0x80, 0x00),
    (0x80, 0x80, 0x00),
    (0x00, 0x00, 0x80),
    (0x80, 0x00, 0x80),
    (0x00, 0x80, 0x80),
    (0xc0, 0xc0, 0xc0),
    (0x4e, 0x4e, 0x4e),
    (0xff, 0x00, 0x00),
    (0x00, 0xff, 0x00),
    (0xff, 0xff, 0x00),
    (0x00, 0x00, 0xff),
    (0xff, 0x00, 0xff),
    (0x00, 0xff, 0xff),
    (0xff, 0xff, 0xff),
];

const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

impl Color {
    /// Resolves the color to its RGB channels.
    pub fn rgb(&self) -> (u8, u8, u8) {
        match *self {
            Color::Rgb(r, g, b) => (r, g, b),
            Color::Xterm(c) => {
                let c = c as usize;
                if c < 16 {
                    SYSTEM_COLORS[c]
                } else if c < 232 {
                    // 6x6x6 color cube
                    let idx = c - 16;
                    (
                        CUBE_LEVELS[idx / 36],
                        CUBE_LEVELS[(idx % 36) / 6],
                        CUBE_LEVELS[idx % 6],
                    )
                } else {
                    // grayscale ramp: 232..255 -> 24 shades
                    let gray = (8 + (c - 232) * 10) as u8;
                    (gray, gray, gray)
                }
            }
        }
    }

    /// Nearest xterm-256 palette index by squared RGB distance.
    pub fn to_xterm(&self) -> u8 {
        if let Color::Xterm(c) = *self {
            return c;
        }
        let (r, g, b) = self.rgb();
        let mut best = 0u8;
        let mut best_distance = u32::MAX;
        for idx in 0..=255u8 {
            let (cr, cg, cb) = Color::Xterm(idx).rgb();
            let distance = (r as i32 - cr as i32).pow(2) as u32
                + (g as i32 - cg as i32).pow(2) as u32
                + (b as i32 - cb as i32).pow(2) as u32;
            if distance < best_distance {
                best = idx;
                best_distance = distance;
                if distance == 0 {
                    break;
                }
            }
        }
        best
    }

    /// Scales every channel by `factor`, clamped to the valid channel range.
    ///
    /// Factors below 1.0 darken towards black, 1.0 is the identity.
    pub fn adjust_brightness(&self, factor: f64) -> Color {
        let (r, g, b) = self.rgb();
        let scale = |c: u8| (c as f64 * factor).round().clamp(0.0, 255.0) as u8;
        Color::Rgb(scale(r), scale(g), scale(b))
    }

    /// Return an ANSI SGR escape sequence for this color.
    ///
    /// If `is_fg` is true, returns a foreground color sequence (`38`),
    /// otherwise a background one (`48`).
    pub fn to_ansi(&self, is_fg: bool) -> String {
        let prefix = if is_fg { "38" } else { "48" };
        match self {
            // 256-color: 38;5;<n> (fg) or 48;5;<n> (bg)
            Color::Xterm(n) => format!("\x1b[{};5;{}m", prefix, n),
            // Truecolor: 38;2;R;G;B (fg) or 48;2;R;G;B (bg)
            Color::Rgb(r, g, b) => format!("\x1b[{};2;{};{};{}m", prefix, r, g, b),
        }
    }
}

/// Free-function form of [`Color::adjust_brightness`].
pub fn adjust_color_brightness(color: Color, factor: f64) -> Color {
    color.adjust_brightness(factor)
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        self.rgb() == other.rgb()
    }
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rgb().hash(state);
    }
}

/// Parses a color from a 256-color index ("0"-"255") or hex RGB
/// ("rrggbb", optionally prefixed with '#').
impl FromStr for Color {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let s = s.strip_prefix('#').unwrap_or(&s);
        match s.parse::<u8>() {
            Ok(c) if s.len() <= 3 => Ok(Self::Xterm(c)),
            _ => {
                let err = Error::ColorParsing(String::from(s));
                if s.len() != 6 || !s.is_ascii() {
                    return Err(err);
                }
                let r = u8::from_str_radix(&s[0..2], 16).map_err(|_| err.clone())?;
                let g = u8::from_str_radix(&s[2..4], 16).map_err(|_| err.clone())?;
                let b = u8::from_str_radix(&s[4..6], 16).map_err(|_| err.clone())?;
                Ok(Self::Rgb(r, g, b))
            }
        }
    }
}

/// Formats the color as a palette index or hex RGB.
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::Xterm(c) => write!(f, "{}", c),
            Color::Rgb(r, g, b) => write!(f, "{:02x}{:02x}{:02x}", r, g, b),
        }
    }
}

/// Resets all SGR attributes.
pub const ANSI_RESET: &str = "\x1b[0m";

/// Returns the foreground sequence for `color` only if it differs from
/// `prev`; otherwise returns an empty string.
pub(crate) fn to_ansi_rel(color: Option<Color>, prev: &Option<Option<Color>>) -> String {
    if Some(color) == *prev {
        return "".into();
    }
    match color {
        Some(color) => color.to_ansi(true),
        None => "\x1b[39m".into(),
    }
}
