//! Named colours shared by the style sheet, the tables and the page decorator.

use genpdf::style::Color;

/// The handbook's colour scheme: an obsidian background with violet and crimson accents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub violet: Color,
    pub crimson: Color,
    pub obsidian: Color,
    pub paper: Color,
    pub text_light: Color,
    pub grid: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            violet: Color::Rgb(0x8A, 0x2B, 0xE2),
            crimson: Color::Rgb(0xD7, 0x26, 0x3D),
            obsidian: Color::Rgb(0x0B, 0x0B, 0x0D),
            paper: Color::Rgb(0x0F, 0x11, 0x13),
            text_light: Color::Rgb(0xED, 0xED, 0xED),
            grid: Color::Rgb(0x80, 0x80, 0x80),
        }
    }
}

/// Parses a `#RRGGBB` (or `RRGGBB`) string.
pub fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_palette_notation() {
        assert_eq!(parse_hex_color("#8A2BE2"), Some(Palette::default().violet));
        assert_eq!(parse_hex_color("d7263d"), Some(Palette::default().crimson));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#GG0000"), None);
        assert_eq!(parse_hex_color("#ééé"), None);
    }
}
