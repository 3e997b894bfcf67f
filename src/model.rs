//! Data structures describing the logical content of the handbook.
//!
//! A document is an ordered `Vec<ContentBlock>`.  Order is the only relationship between blocks:
//! none of them reference each other, and none of them carry layout geometry beyond the absolute
//! sizes the author declares (column widths, spacer heights, box sizes).  Text is stored as inline
//! markup (see [`crate::richtext`]) and styles are referenced by [`StyleId`].

use genpdf::style::Color;

use crate::style::{HorizontalAlignment, StyleId};

/// Vertical placement of text inside a table cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VerticalAlignment {
    Top,
    Middle,
    #[default]
    Bottom,
}

/// A single table cell.
///
/// Plain cells are set in the table's default cell font and honour the colour and size rules of
/// the table.  Cells that carry a paragraph style are set in that style instead, and ignore the
/// text rules.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    text: String,
    style: Option<StyleId>,
}

impl Cell {
    /// Creates a plain cell.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }

    /// Creates a cell set in a named paragraph style.
    pub fn styled(text: impl Into<String>, style: StyleId) -> Self {
        Self {
            text: text.into(),
            style: Some(style),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> Option<StyleId> {
        self.style
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::new(text)
    }
}

/// Rectangular selection of cells.
///
/// Coordinates are `(column, row)` pairs; negative values count from the end, so `(-1, -1)` is the
/// last cell of the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    start: (i32, i32),
    end: (i32, i32),
}

impl CellRange {
    pub fn new(start: (i32, i32), end: (i32, i32)) -> Self {
        Self { start, end }
    }

    /// Every cell of the table.
    pub fn all() -> Self {
        Self::new((0, 0), (-1, -1))
    }

    /// Every cell of a single row.
    pub fn row(row: i32) -> Self {
        Self::new((0, row), (-1, row))
    }

    /// Returns whether the cell at `column`/`row` lies inside the range for a table of the given
    /// dimensions.
    pub fn contains(&self, column: usize, row: usize, columns: usize, rows: usize) -> bool {
        fn resolve(index: i32, len: usize) -> i64 {
            if index < 0 {
                len as i64 + i64::from(index)
            } else {
                i64::from(index)
            }
        }

        let (column, row) = (column as i64, row as i64);
        let (c0, c1) = (resolve(self.start.0, columns), resolve(self.end.0, columns));
        let (r0, r1) = (resolve(self.start.1, rows), resolve(self.end.1, rows));
        (c0..=c1).contains(&column) && (r0..=r1).contains(&row)
    }
}

/// A styling rule applied to a range of table cells.  Later rules override earlier ones.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TableRule {
    Background { range: CellRange, color: Color },
    TextColor { range: CellRange, color: Color },
    FontSize { range: CellRange, size: u8 },
    LeftPadding { range: CellRange, points: f64 },
    VerticalAlign { range: CellRange, align: VerticalAlignment },
    /// Outlines every cell in the range.
    Grid {
        range: CellRange,
        width_pt: f64,
        color: Color,
    },
}

/// A table with absolute column widths.
#[derive(Clone, Debug, PartialEq)]
pub struct TableBlock {
    rows: Vec<Vec<Cell>>,
    column_widths: Vec<f64>,
    rules: Vec<TableRule>,
    alignment: HorizontalAlignment,
}

impl TableBlock {
    /// Creates a centred table from its rows and column widths in millimetres.
    pub fn new<R, C>(rows: R, column_widths: impl Into<Vec<f64>>) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
            column_widths: column_widths.into(),
            rules: Vec::new(),
            alignment: HorizontalAlignment::Center,
        }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column_widths(&self) -> &[f64] {
        &self.column_widths
    }

    pub fn rules(&self) -> &[TableRule] {
        &self.rules
    }

    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    /// Total declared width in millimetres.
    pub fn width(&self) -> f64 {
        self.column_widths.iter().sum()
    }

    /// Appends a rule and returns the updated table.
    pub fn with_rule(mut self, rule: TableRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Appends several rules and returns the updated table.
    pub fn with_rules<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = TableRule>,
    {
        self.rules.extend(rules);
        self
    }

    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }
}

/// A filled, bordered rectangle placed in the flow, centred horizontally.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecorativeBox {
    pub width: f64,
    pub height: f64,
    pub fill: Color,
    pub border_color: Color,
    /// Border stroke width in points.
    pub border_width: f64,
}

/// One semantic unit of document content.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentBlock {
    Heading { text: String, level: u8 },
    Paragraph { text: String, style: StyleId },
    Table(TableBlock),
    /// Vertical gap in millimetres.
    Spacer { height: f64 },
    PageBreak,
    DecorativeBox(DecorativeBox),
}

impl ContentBlock {
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Self::Heading {
            text: text.into(),
            level,
        }
    }

    pub fn paragraph(text: impl Into<String>, style: StyleId) -> Self {
        Self::Paragraph {
            text: text.into(),
            style,
        }
    }

    pub fn spacer(height: f64) -> Self {
        Self::Spacer { height }
    }
}

/// Chained builder for a block sequence.
#[derive(Clone, Debug, Default)]
pub struct ContentBuilder {
    blocks: Vec<ContentBlock>,
}

impl ContentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heading(self, text: impl Into<String>, level: u8) -> Self {
        self.block(ContentBlock::heading(text, level))
    }

    pub fn paragraph(self, text: impl Into<String>, style: StyleId) -> Self {
        self.block(ContentBlock::paragraph(text, style))
    }

    pub fn table(self, table: TableBlock) -> Self {
        self.block(ContentBlock::Table(table))
    }

    pub fn spacer(self, height: f64) -> Self {
        self.block(ContentBlock::spacer(height))
    }

    pub fn page_break(self) -> Self {
        self.block(ContentBlock::PageBreak)
    }

    pub fn decorative_box(self, decorative_box: DecorativeBox) -> Self {
        self.block(ContentBlock::DecorativeBox(decorative_box))
    }

    /// Appends an arbitrary block.
    pub fn block(mut self, block: ContentBlock) -> Self {
        self.blocks.push(block);
        self
    }

    /// Appends the blocks produced by another builder.
    pub fn extend(mut self, other: ContentBuilder) -> Self {
        self.blocks.extend(other.blocks);
        self
    }

    /// Number of explicit page breaks declared so far.
    pub fn page_breaks(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| matches!(block, ContentBlock::PageBreak))
            .count()
    }

    pub fn finish(self) -> Vec<ContentBlock> {
        self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_preserves_declaration_order() {
        let blocks = ContentBuilder::new()
            .heading("Bestiary", 1)
            .paragraph("Grade 4: Hollowchild", StyleId::Normal)
            .page_break()
            .spacer(6.0)
            .finish();

        assert!(matches!(&blocks[0], ContentBlock::Heading { level: 1, .. }));
        assert!(matches!(
            &blocks[1],
            ContentBlock::Paragraph {
                style: StyleId::Normal,
                ..
            }
        ));
        assert_eq!(blocks[2], ContentBlock::PageBreak);
        assert_eq!(blocks[3], ContentBlock::Spacer { height: 6.0 });
    }

    #[test]
    fn builder_counts_page_breaks() {
        let builder = ContentBuilder::new()
            .page_break()
            .extend(ContentBuilder::new().paragraph("x", StyleId::Normal).page_break());
        assert_eq!(builder.page_breaks(), 2);
    }

    #[test]
    fn negative_range_indices_count_from_the_end() {
        let header = CellRange::row(0);
        assert!(header.contains(2, 0, 3, 6));
        assert!(!header.contains(2, 1, 3, 6));

        let all = CellRange::all();
        assert!(all.contains(0, 0, 3, 6));
        assert!(all.contains(2, 5, 3, 6));
        assert!(!all.contains(3, 5, 3, 6));

        let last_row = CellRange::row(-1);
        assert!(last_row.contains(1, 5, 3, 6));
        assert!(!last_row.contains(1, 4, 3, 6));
    }

    #[test]
    fn table_width_sums_columns() {
        let table = TableBlock::new(
            vec![vec!["Level", "Feature", "CEP Cost"]],
            vec![25.0, 100.0, 30.0],
        );
        assert_eq!(table.width(), 155.0);
        assert_eq!(table.rows()[0][1].text(), "Feature");
        assert_eq!(table.alignment(), HorizontalAlignment::Center);
    }
}
