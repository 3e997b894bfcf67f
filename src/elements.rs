//! `genpdf` elements that render content blocks.
//!
//! Each [`ContentBlock`] is turned into one [`BlockElement`] before rendering starts.  The
//! elements keep their progress between calls so the engine can resume them on the next page:
//! paragraphs split between lines, tables between rows, and boxes move as a whole.

use std::cell::{Cell as StdCell, RefCell};
use std::rc::Rc;

use genpdf::elements::PageBreak;
use genpdf::error::Error;
use genpdf::fonts::FontCache;
use genpdf::style::{Color, LineStyle, Style, StyledString};
use genpdf::{render, Context, Element, Position, RenderResult, Size};

use crate::driver::HeadingPage;
use crate::error::BuildError;
use crate::geometry::{mm_from_f64, mm_to_f64, pt_to_mm};
use crate::model::{
    Cell, CellRange, ContentBlock, DecorativeBox, TableBlock, TableRule, VerticalAlignment,
};
use crate::richtext::{parse_markup, Span};
use crate::style::{HorizontalAlignment, StyleId, StyleSheet, StyleSpec};
use crate::wrap::{wrap, Line, Run};

/// Slack allowed when checking whether content fits the remaining height.
const FIT_EPSILON_MM: f64 = 1e-6;

const CELL_FONT_SIZE: u8 = 10;
const CELL_LEADING_FACTOR: f64 = 1.2;
const CELL_PADDING_X_PT: f64 = 6.0;
const CELL_PADDING_Y_PT: f64 = 3.0;

/// Page counter shared by the page decorator and the elements.
#[derive(Clone, Debug, Default)]
pub(crate) struct PageTracker {
    state: Rc<TrackerState>,
}

#[derive(Debug, Default)]
struct TrackerState {
    current: StdCell<usize>,
    headings: RefCell<Vec<HeadingPage>>,
}

impl PageTracker {
    /// Advances to the next page and returns its 1-based number.
    pub fn start_page(&self) -> usize {
        let page = self.state.current.get() + 1;
        self.state.current.set(page);
        page
    }

    /// Number of pages started so far.
    pub fn pages(&self) -> usize {
        self.state.current.get()
    }

    fn record_heading(&self, title: &str, level: u8) {
        self.state.headings.borrow_mut().push(HeadingPage {
            title: title.to_owned(),
            level,
            page: self.pages(),
        });
    }

    pub fn headings(&self) -> Vec<HeadingPage> {
        self.state.headings.borrow().clone()
    }
}

fn measure(font_cache: &FontCache, text: &str, style: Style) -> f64 {
    mm_to_f64(StyledString::new(text.to_owned(), style).width(font_cache))
}

fn line_style(width: f64, color: Color) -> LineStyle {
    LineStyle::new()
        .with_thickness(mm_from_f64(width))
        .with_color(color)
}

/// Fills a rectangle given in millimetres relative to the area's origin.
///
/// `genpdf` only strokes paths, so the fill is a single stroke as thick as the rectangle is tall.
pub(crate) fn fill_rect(
    area: &render::Area<'_>,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    color: Color,
) {
    if width <= 0.0 || height <= 0.0 {
        return;
    }
    let middle = y + height / 2.0;
    area.draw_line(
        vec![
            Position::new(mm_from_f64(x), mm_from_f64(middle)),
            Position::new(mm_from_f64(x + width), mm_from_f64(middle)),
        ],
        line_style(height, color),
    );
}

/// Strokes a straight line between two points in millimetres.
pub(crate) fn stroke_line(
    area: &render::Area<'_>,
    from: (f64, f64),
    to: (f64, f64),
    width_pt: f64,
    color: Color,
) {
    area.draw_line(
        vec![
            Position::new(mm_from_f64(from.0), mm_from_f64(from.1)),
            Position::new(mm_from_f64(to.0), mm_from_f64(to.1)),
        ],
        line_style(pt_to_mm(width_pt), color),
    );
}

fn stroke_rect(
    area: &render::Area<'_>,
    (x, y, width, height): (f64, f64, f64, f64),
    width_pt: f64,
    color: Color,
) {
    let corners = [
        (x, y),
        (x + width, y),
        (x + width, y + height),
        (x, y + height),
        (x, y),
    ];
    area.draw_line(
        corners
            .iter()
            .map(|(cx, cy)| Position::new(mm_from_f64(*cx), mm_from_f64(*cy)))
            .collect::<Vec<_>>(),
        line_style(pt_to_mm(width_pt), color),
    );
}

fn glyph_height(font_cache: &FontCache, line: &Line<Style>) -> f64 {
    line.words
        .iter()
        .flat_map(|(_, word)| word.fragments.iter())
        .map(|fragment| {
            let style = fragment.style;
            mm_to_f64(style.font(font_cache).glyph_height(style.font_size()))
        })
        .fold(0.0, f64::max)
}

/// Vertical space a line occupies: its leading, or its tallest glyph when the face is taller.
fn line_height(font_cache: &FontCache, line: &Line<Style>, leading: f64) -> f64 {
    leading.max(glyph_height(font_cache, line))
}

/// Prints one wrapped line whose box starts at `top` and is `height` tall.
fn print_line(
    area: &render::Area<'_>,
    font_cache: &FontCache,
    line: &Line<Style>,
    x: f64,
    top: f64,
    height: f64,
) -> Result<(), Error> {
    let text_top = top + ((height - glyph_height(font_cache, line)) / 2.0).max(0.0);

    for (word_offset, word) in &line.words {
        for fragment in &word.fragments {
            let position = Position::new(
                mm_from_f64(x + word_offset + fragment.offset),
                mm_from_f64(text_top),
            );
            if !area.print_str(font_cache, position, fragment.style, &fragment.text)? {
                log::warn!("Fragment {:?} did not fit its line box", fragment.text);
            }
        }
    }
    Ok(())
}

fn runs_from_spans(spans: &[Span], base: Style) -> Vec<Run<Style>> {
    spans
        .iter()
        .map(|span| Run::new(span.text(), span.apply_to(base)))
        .collect()
}

struct HeadingMark {
    title: String,
    level: u8,
    tracker: PageTracker,
}

/// Flowing paragraph with per-style leading, alignment, indentation and spacing.
pub(crate) struct TextBlock {
    runs: Vec<Run<Style>>,
    leading: f64,
    alignment: HorizontalAlignment,
    indent: f64,
    space_before: f64,
    space_after: f64,
    mark: Option<HeadingMark>,
    lines: Option<Vec<Line<Style>>>,
    next_line: usize,
    started: bool,
}

impl TextBlock {
    pub fn new(spans: &[Span], spec: &StyleSpec) -> Self {
        Self {
            runs: runs_from_spans(spans, spec.text_style()),
            leading: pt_to_mm(spec.leading),
            alignment: spec.alignment,
            indent: pt_to_mm(spec.left_indent),
            space_before: pt_to_mm(spec.space_before),
            space_after: pt_to_mm(spec.space_after),
            mark: None,
            lines: None,
            next_line: 0,
            started: false,
        }
    }

    /// Records the page on which the block places its first line.
    fn marked(mut self, title: &str, level: u8, tracker: &PageTracker) -> Self {
        self.mark = Some(HeadingMark {
            title: title.to_owned(),
            level,
            tracker: tracker.clone(),
        });
        self
    }
}

impl Element for TextBlock {
    fn render(
        &mut self,
        context: &Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let font_cache = &context.font_cache;
        let width = (mm_to_f64(area.size().width) - self.indent).max(0.0);
        let available = mm_to_f64(area.size().height);

        let runs = &self.runs;
        let lines = self.lines.get_or_insert_with(|| {
            wrap(runs, width, |text, style| measure(font_cache, text, style))
        });

        let mut y = if self.started {
            0.0
        } else {
            self.space_before.min(available)
        };
        let mut placed = 0;
        while let Some(line) = lines.get(self.next_line) {
            let height = line_height(font_cache, line, self.leading);
            if y + height > available + FIT_EPSILON_MM {
                break;
            }
            let x = self.indent + self.alignment.offset(width, line.width);
            print_line(&area, font_cache, line, x, y, height)?;
            y += height;
            self.next_line += 1;
            placed += 1;
        }

        let mut result = RenderResult::default();
        if self.next_line < lines.len() && placed == 0 {
            result.has_more = true;
            return Ok(result);
        }

        if !self.started {
            if let Some(mark) = &self.mark {
                mark.tracker.record_heading(&mark.title, mark.level);
            }
            self.started = true;
        }

        if self.next_line < lines.len() {
            result.has_more = true;
        } else {
            y = (y + self.space_after).min(available).max(y);
        }
        result.size = Size::new(area.size().width, mm_from_f64(y));
        Ok(result)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Padding {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

struct TableCell {
    runs: Vec<Run<Style>>,
    leading: f64,
    alignment: HorizontalAlignment,
    valign: VerticalAlignment,
    padding: Padding,
    background: Option<Color>,
    grid: Option<(f64, Color)>,
    lines: Vec<Line<Style>>,
    line_heights: Vec<f64>,
}

impl TableCell {
    fn height(&self) -> f64 {
        self.padding.top + self.line_heights.iter().sum::<f64>() + self.padding.bottom
    }
}

/// Table with absolute column widths; splits between rows.
pub(crate) struct GridTable {
    columns: Vec<f64>,
    rows: Vec<Vec<TableCell>>,
    alignment: HorizontalAlignment,
    laid_out: bool,
    next_row: usize,
}

fn resolve_cell(
    cell: &Cell,
    spans: &[Span],
    (column, row): (usize, usize),
    table: &TableBlock,
    spec: Option<&StyleSpec>,
) -> TableCell {
    let (columns, rows) = (table.column_widths().len(), table.rows().len());
    let mut size = CELL_FONT_SIZE;
    let mut color = Color::Rgb(0, 0, 0);
    let mut padding = Padding {
        left: pt_to_mm(CELL_PADDING_X_PT),
        right: pt_to_mm(CELL_PADDING_X_PT),
        top: pt_to_mm(CELL_PADDING_Y_PT),
        bottom: pt_to_mm(CELL_PADDING_Y_PT),
    };
    let mut valign = VerticalAlignment::default();
    let mut background = None;
    let mut grid = None;

    let applies = |range: CellRange| range.contains(column, row, columns, rows);
    for rule in table.rules() {
        match *rule {
            TableRule::Background { range, color: fill } if applies(range) => {
                background = Some(fill)
            }
            TableRule::TextColor { range, color: text } if applies(range) => color = text,
            TableRule::FontSize { range, size: points } if applies(range) => size = points,
            TableRule::LeftPadding { range, points } if applies(range) => {
                padding.left = pt_to_mm(points)
            }
            TableRule::VerticalAlign { range, align } if applies(range) => valign = align,
            TableRule::Grid {
                range,
                width_pt,
                color: stroke,
            } if applies(range) => grid = Some((width_pt, stroke)),
            _ => {}
        }
    }

    let (base, leading, alignment) = match (cell.style(), spec) {
        (Some(_), Some(spec)) => (spec.text_style(), pt_to_mm(spec.leading), spec.alignment),
        _ => (
            Style::new().with_font_size(size).with_color(color),
            pt_to_mm(f64::from(size) * CELL_LEADING_FACTOR),
            HorizontalAlignment::Left,
        ),
    };

    TableCell {
        runs: runs_from_spans(spans, base),
        leading,
        alignment,
        valign,
        padding,
        background,
        grid,
        lines: Vec::new(),
        line_heights: Vec::new(),
    }
}

impl GridTable {
    fn layout(&mut self, font_cache: &FontCache) {
        for row in &mut self.rows {
            for (cell, width) in row.iter_mut().zip(&self.columns) {
                let inner = (width - cell.padding.left - cell.padding.right).max(0.0);
                cell.lines = wrap(&cell.runs, inner, |text, style| {
                    measure(font_cache, text, style)
                });
                cell.line_heights = cell
                    .lines
                    .iter()
                    .map(|line| line_height(font_cache, line, cell.leading))
                    .collect();
            }
        }
        self.laid_out = true;
    }

    fn paint_row(
        &self,
        area: &render::Area<'_>,
        font_cache: &FontCache,
        row: &[TableCell],
        x0: f64,
        y: f64,
        height: f64,
    ) -> Result<(), Error> {
        let mut x = x0;
        for (cell, width) in row.iter().zip(&self.columns) {
            if let Some(fill) = cell.background {
                fill_rect(area, x, y, *width, height, fill);
            }
            x += width;
        }

        let mut x = x0;
        for (cell, width) in row.iter().zip(&self.columns) {
            let inner = width - cell.padding.left - cell.padding.right;
            let free = height - cell.height();
            let offset = match cell.valign {
                VerticalAlignment::Top => 0.0,
                VerticalAlignment::Middle => free / 2.0,
                VerticalAlignment::Bottom => free,
            };
            let mut top = y + cell.padding.top + offset;
            for (line, line_height) in cell.lines.iter().zip(&cell.line_heights) {
                let line_x = x + cell.padding.left + cell.alignment.offset(inner, line.width);
                print_line(area, font_cache, line, line_x, top, *line_height)?;
                top += line_height;
            }
            x += width;
        }

        let mut x = x0;
        for (cell, width) in row.iter().zip(&self.columns) {
            if let Some((stroke, color)) = cell.grid {
                stroke_rect(area, (x, y, *width, height), stroke, color);
            }
            x += width;
        }
        Ok(())
    }
}

impl Element for GridTable {
    fn render(
        &mut self,
        context: &Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let font_cache = &context.font_cache;
        if !self.laid_out {
            self.layout(font_cache);
        }

        let available = mm_to_f64(area.size().height);
        let total_width: f64 = self.columns.iter().sum();
        let x0 = self
            .alignment
            .offset(mm_to_f64(area.size().width), total_width);

        let mut y = 0.0;
        let mut result = RenderResult::default();
        while self.next_row < self.rows.len() {
            let row = &self.rows[self.next_row];
            let height = row.iter().map(TableCell::height).fold(0.0, f64::max);
            if y + height > available + FIT_EPSILON_MM {
                result.has_more = true;
                break;
            }
            self.paint_row(&area, font_cache, row, x0, y, height)?;
            y += height;
            self.next_row += 1;
        }

        if y > 0.0 {
            result.size = Size::new(mm_from_f64(total_width), mm_from_f64(y));
        }
        Ok(result)
    }
}

/// Filled and bordered rectangle, centred in the content area.
pub(crate) struct ShapeBox {
    shape: DecorativeBox,
}

impl Element for ShapeBox {
    fn render(
        &mut self,
        _context: &Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let shape = self.shape;
        if shape.height > mm_to_f64(area.size().height) + FIT_EPSILON_MM {
            result.has_more = true;
            return Ok(result);
        }

        let x = HorizontalAlignment::Center.offset(mm_to_f64(area.size().width), shape.width);
        fill_rect(&area, x, 0.0, shape.width, shape.height, shape.fill);
        if shape.border_width > 0.0 {
            stroke_rect(
                &area,
                (x, 0.0, shape.width, shape.height),
                shape.border_width,
                shape.border_color,
            );
        }
        result.size = Size::new(mm_from_f64(shape.width), mm_from_f64(shape.height));
        Ok(result)
    }
}

/// Vertical gap; truncated at the bottom of a page.
pub(crate) struct Gap {
    height: f64,
}

impl Element for Gap {
    fn render(
        &mut self,
        _context: &Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let height = self.height.min(mm_to_f64(area.size().height)).max(0.0);
        let mut result = RenderResult::default();
        result.size = Size::new(mm_from_f64(0.0), mm_from_f64(height));
        Ok(result)
    }
}

/// The rendering counterpart of a [`ContentBlock`].
pub(crate) enum BlockElement {
    Text(TextBlock),
    Table(GridTable),
    Shape(ShapeBox),
    Gap(Gap),
    Break(PageBreak),
}

impl Element for BlockElement {
    fn render(
        &mut self,
        context: &Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        match self {
            BlockElement::Text(element) => element.render(context, area, style),
            BlockElement::Table(element) => element.render(context, area, style),
            BlockElement::Shape(element) => element.render(context, area, style),
            BlockElement::Gap(element) => element.render(context, area, style),
            BlockElement::Break(element) => element.render(context, area, style),
        }
    }
}

fn style_for(sheet: &StyleSheet, block: usize, style: StyleId) -> Result<&StyleSpec, BuildError> {
    sheet
        .get(style)
        .ok_or(BuildError::UnknownStyle { block, style })
}

fn spans_for(block: usize, text: &str) -> Result<Vec<Span>, BuildError> {
    parse_markup(text).map_err(|source| BuildError::Markup { block, source })
}

/// Converts the block at position `index` into its element, resolving styles and markup.
pub(crate) fn build_element(
    index: usize,
    block: ContentBlock,
    sheet: &StyleSheet,
    tracker: &PageTracker,
) -> Result<BlockElement, BuildError> {
    let element = match block {
        ContentBlock::Heading { text, level } => {
            if level == 0 {
                return Err(BuildError::InvalidHeadingLevel {
                    block: index,
                    level,
                });
            }
            let spec = style_for(sheet, index, StyleId::for_heading(level))?;
            let spans = spans_for(index, &text)?;
            let title: String = spans.iter().map(Span::text).collect();
            BlockElement::Text(TextBlock::new(&spans, spec).marked(&title, level, tracker))
        }
        ContentBlock::Paragraph { text, style } => {
            let spec = style_for(sheet, index, style)?;
            BlockElement::Text(TextBlock::new(&spans_for(index, &text)?, spec))
        }
        ContentBlock::Table(table) => {
            let mut rows = Vec::with_capacity(table.rows().len());
            for (row_index, row) in table.rows().iter().enumerate() {
                let mut cells = Vec::with_capacity(row.len());
                for (column_index, cell) in row.iter().enumerate() {
                    let spec = cell
                        .style()
                        .map(|style| style_for(sheet, index, style))
                        .transpose()?;
                    let spans = spans_for(index, cell.text())?;
                    cells.push(resolve_cell(
                        cell,
                        &spans,
                        (column_index, row_index),
                        &table,
                        spec,
                    ));
                }
                rows.push(cells);
            }
            BlockElement::Table(GridTable {
                columns: table.column_widths().to_vec(),
                rows,
                alignment: table.alignment(),
                laid_out: false,
                next_row: 0,
            })
        }
        ContentBlock::Spacer { height } => BlockElement::Gap(Gap { height }),
        ContentBlock::PageBreak => BlockElement::Break(PageBreak::new()),
        ContentBlock::DecorativeBox(shape) => BlockElement::Shape(ShapeBox { shape }),
    };
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;

    fn sheet() -> StyleSheet {
        StyleSheet::handbook(&Palette::default())
    }

    #[test]
    fn tracker_counts_pages_and_records_headings() {
        let tracker = PageTracker::default();
        assert_eq!(tracker.start_page(), 1);
        assert_eq!(tracker.start_page(), 2);
        tracker.record_heading("Bestiary", 1);
        assert_eq!(tracker.pages(), 2);
        assert_eq!(
            tracker.headings(),
            vec![HeadingPage {
                title: "Bestiary".to_owned(),
                level: 1,
                page: 2
            }]
        );
    }

    #[test]
    fn unknown_style_is_reported_with_block_index() {
        let sheet = StyleSheet::new();
        let err = build_element(
            3,
            ContentBlock::paragraph("text", StyleId::Em),
            &sheet,
            &PageTracker::default(),
        )
        .err()
        .expect("missing style must fail");
        assert!(matches!(
            err,
            BuildError::UnknownStyle {
                block: 3,
                style: StyleId::Em
            }
        ));
    }

    #[test]
    fn malformed_markup_is_reported() {
        let err = build_element(
            0,
            ContentBlock::paragraph("**Sukuna", StyleId::Normal),
            &sheet(),
            &PageTracker::default(),
        )
        .err()
        .expect("markup must fail");
        assert!(matches!(err, BuildError::Markup { block: 0, .. }));
    }

    #[test]
    fn heading_level_zero_is_rejected() {
        let err = build_element(
            1,
            ContentBlock::heading("Index", 0),
            &sheet(),
            &PageTracker::default(),
        )
        .err()
        .expect("level zero must fail");
        assert!(matches!(
            err,
            BuildError::InvalidHeadingLevel { block: 1, level: 0 }
        ));
    }

    #[test]
    fn table_rules_apply_in_order_over_ranges() {
        let palette = Palette::default();
        let table = TableBlock::new(
            vec![vec!["Level", "Feature"], vec!["1", "Signature Technique"]],
            vec![25.0, 100.0],
        )
        .with_rules([
            TableRule::Background {
                range: CellRange::row(0),
                color: palette.violet,
            },
            TableRule::LeftPadding {
                range: CellRange::all(),
                points: 72.0,
            },
            TableRule::VerticalAlign {
                range: CellRange::all(),
                align: VerticalAlignment::Top,
            },
        ]);

        let header = resolve_cell(&table.rows()[0][0], &[], (0, 0), &table, None);
        let body = resolve_cell(&table.rows()[1][1], &[], (1, 1), &table, None);
        assert_eq!(header.background, Some(palette.violet));
        assert_eq!(body.background, None);
        assert!((body.padding.left - 25.4).abs() < 1e-9);
        assert_eq!(body.valign, VerticalAlignment::Top);
        assert!((body.leading - pt_to_mm(12.0)).abs() < 1e-9);
    }

    #[test]
    fn styled_cells_use_paragraph_leading() {
        let sheet = sheet();
        let table = TableBlock::new(
            vec![vec![Cell::styled("Curses", StyleId::Normal)]],
            vec![85.0],
        );
        let cell = resolve_cell(
            &table.rows()[0][0],
            &[],
            (0, 0),
            &table,
            sheet.get(StyleId::Normal),
        );
        assert!((cell.leading - pt_to_mm(15.0)).abs() < 1e-9);
    }
}
