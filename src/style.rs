//! Named paragraph styles and the read-only registry that resolves them.
//!
//! Blocks refer to styles by [`StyleId`].  The [`StyleSheet`] is built once from a [`Palette`]
//! and shared by reference with the driver, which resolves every id before rendering starts so a
//! dangling reference is reported as a configuration error rather than a mid-render failure.

use std::collections::BTreeMap;
use std::fmt;

use genpdf::style::{Color, Style};

use crate::palette::Palette;

/// Identifier of a registered paragraph style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleId {
    H1,
    H2,
    Normal,
    Em,
    Toc,
    TocSub,
    CoverTitle,
    Subtitle,
}

impl StyleId {
    /// Style used for headings of the given level.
    pub fn for_heading(level: u8) -> Self {
        if level <= 1 {
            StyleId::H1
        } else {
            StyleId::H2
        }
    }

    /// Registry name of the style.
    pub fn name(self) -> &'static str {
        match self {
            StyleId::H1 => "h1",
            StyleId::H2 => "h2",
            StyleId::Normal => "normal",
            StyleId::Em => "em",
            StyleId::Toc => "toc",
            StyleId::TocSub => "toc_sub",
            StyleId::CoverTitle => "cover_title",
            StyleId::Subtitle => "subtitle",
        }
    }
}

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Face weight selected from the document font family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// Horizontal placement of text lines, tables and boxes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl HorizontalAlignment {
    /// Offset that places content of `used` width inside `available` width.
    pub(crate) fn offset(self, available: f64, used: f64) -> f64 {
        let slack = (available - used).max(0.0);
        match self {
            HorizontalAlignment::Left => 0.0,
            HorizontalAlignment::Center => slack / 2.0,
            HorizontalAlignment::Right => slack,
        }
    }
}

/// Typographic settings of a named style.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleSpec {
    pub weight: FontWeight,
    /// Font size in points.
    pub size: u8,
    /// Baseline-to-baseline distance in points.
    pub leading: f64,
    pub alignment: HorizontalAlignment,
    pub color: Color,
    /// Vertical space inserted before the first line, in points.
    pub space_before: f64,
    /// Vertical space inserted after the last line, in points.
    pub space_after: f64,
    /// Indentation of every line from the left edge, in points.
    pub left_indent: f64,
}

impl StyleSpec {
    /// Regular weight, left aligned, no extra spacing.
    pub fn new(size: u8, leading: f64, color: Color) -> Self {
        Self {
            weight: FontWeight::Regular,
            size,
            leading,
            alignment: HorizontalAlignment::Left,
            color,
            space_before: 0.0,
            space_after: 0.0,
            left_indent: 0.0,
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = FontWeight::Bold;
        self
    }

    pub fn aligned(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_space_before(mut self, points: f64) -> Self {
        self.space_before = points;
        self
    }

    pub fn with_space_after(mut self, points: f64) -> Self {
        self.space_after = points;
        self
    }

    pub fn with_left_indent(mut self, points: f64) -> Self {
        self.left_indent = points;
        self
    }

    /// Base `genpdf` style for text set in this style.
    pub(crate) fn text_style(&self) -> Style {
        let mut style = Style::new().with_font_size(self.size).with_color(self.color);
        if self.weight == FontWeight::Bold {
            style.set_bold();
        }
        style
    }
}

/// Read-only registry of the styles available to content blocks.
#[derive(Clone, Debug, Default)]
pub struct StyleSheet {
    styles: BTreeMap<StyleId, StyleSpec>,
}

impl StyleSheet {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The handbook's style sheet.
    pub fn handbook(palette: &Palette) -> Self {
        use HorizontalAlignment::{Center, Left};

        let light = palette.text_light;
        Self::new()
            .with_style(
                StyleId::H1,
                StyleSpec::new(28, 34.0, light)
                    .bold()
                    .aligned(Center)
                    .with_space_after(6.0),
            )
            .with_style(
                StyleId::H2,
                StyleSpec::new(18, 22.0, light)
                    .bold()
                    .aligned(Left)
                    .with_space_before(8.0),
            )
            .with_style(StyleId::Normal, StyleSpec::new(11, 15.0, light))
            .with_style(StyleId::Em, StyleSpec::new(11, 15.0, palette.violet))
            .with_style(StyleId::Toc, StyleSpec::new(12, 16.0, light))
            .with_style(
                StyleId::TocSub,
                StyleSpec::new(12, 16.0, light).with_left_indent(14.0),
            )
            .with_style(
                StyleId::CoverTitle,
                StyleSpec::new(36, 42.0, light).bold().aligned(Center),
            )
            .with_style(
                StyleId::Subtitle,
                StyleSpec::new(14, 18.0, palette.violet).aligned(Center),
            )
    }

    /// Registers (or replaces) a style and returns the updated registry.
    pub fn with_style(mut self, id: StyleId, spec: StyleSpec) -> Self {
        self.styles.insert(id, spec);
        self
    }

    /// Looks up a style by id.
    pub fn get(&self, id: StyleId) -> Option<&StyleSpec> {
        self.styles.get(&id)
    }

    pub fn contains(&self, id: StyleId) -> bool {
        self.styles.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handbook_sheet_registers_every_style() {
        let sheet = StyleSheet::handbook(&Palette::default());
        for id in [
            StyleId::H1,
            StyleId::H2,
            StyleId::Normal,
            StyleId::Em,
            StyleId::Toc,
            StyleId::TocSub,
            StyleId::CoverTitle,
            StyleId::Subtitle,
        ] {
            assert!(sheet.contains(id), "missing style {id}");
        }
    }

    #[test]
    fn heading_levels_map_to_h1_and_h2() {
        assert_eq!(StyleId::for_heading(1), StyleId::H1);
        assert_eq!(StyleId::for_heading(2), StyleId::H2);
        assert_eq!(StyleId::for_heading(4), StyleId::H2);
    }

    #[test]
    fn alignment_offsets_distribute_slack() {
        assert_eq!(HorizontalAlignment::Left.offset(100.0, 40.0), 0.0);
        assert_eq!(HorizontalAlignment::Center.offset(100.0, 40.0), 30.0);
        assert_eq!(HorizontalAlignment::Right.offset(100.0, 40.0), 60.0);
        assert_eq!(HorizontalAlignment::Right.offset(30.0, 40.0), 0.0);
    }
}
