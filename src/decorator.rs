//! Per-page painting: background fill and header/footer furniture.
//!
//! [`PageDecorator`] is the strategy the driver invokes once per physical page.  The driver owns
//! the page numbering and wraps the strategy in a `genpdf::PageDecorator`, which the engine calls
//! before it flows the page's content.  Anything painted on the base surface therefore ends up
//! underneath the content; marks that must stay visible go on [`PageSurface::overlay`], the next
//! layer of the page, which the PDF draws after the content layer.

use genpdf::error::Error;
use genpdf::style::{Color, Style, StyledString};
use genpdf::{render, Context, Position};

use crate::elements::{fill_rect, stroke_line, PageTracker};
use crate::geometry::{mm_from_f64, mm_to_f64, PageGeometry};
use crate::palette::Palette;

/// Drawing surface of a single page, in millimetres from the top-left corner.
pub struct PageSurface<'c, 'p> {
    context: &'c Context,
    area: render::Area<'p>,
}

impl<'c, 'p> PageSurface<'c, 'p> {
    pub(crate) fn new(context: &'c Context, area: render::Area<'p>) -> Self {
        Self { context, area }
    }

    /// The same page on the layer above the flowed content.
    pub fn overlay(&self) -> PageSurface<'c, 'p> {
        PageSurface::new(self.context, self.area.next_layer())
    }

    /// Width and height of the page.
    pub fn size(&self) -> (f64, f64) {
        let size = self.area.size();
        (mm_to_f64(size.width), mm_to_f64(size.height))
    }

    pub fn fill_rect(&self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        fill_rect(&self.area, x, y, width, height, color);
    }

    pub fn stroke_line(&self, from: (f64, f64), to: (f64, f64), width_pt: f64, color: Color) {
        stroke_line(&self.area, from, to, width_pt, color);
    }

    /// Prints `text` so that it ends at `right` with its baseline at `baseline`.
    pub fn text_right(
        &self,
        right: f64,
        baseline: f64,
        text: &str,
        font_size: u8,
        color: Color,
    ) -> Result<(), Error> {
        let font_cache = &self.context.font_cache;
        let style = Style::new().with_font_size(font_size).with_color(color);
        let width = mm_to_f64(StyledString::new(text.to_owned(), style).width(font_cache));
        let ascent = mm_to_f64(style.font(font_cache).glyph_height(font_size));
        let position = Position::new(
            mm_from_f64(right - width),
            mm_from_f64(baseline - ascent),
        );
        self.area.print_str(font_cache, position, style, text)?;
        Ok(())
    }
}

/// Paints page furniture.  Invoked once per physical page with its 1-based number.
pub trait PageDecorator {
    fn decorate_page(
        &mut self,
        surface: &mut PageSurface<'_, '_>,
        geometry: &PageGeometry,
        page_number: usize,
    ) -> Result<(), Error>;
}

impl<D: PageDecorator + ?Sized> PageDecorator for Box<D> {
    fn decorate_page(
        &mut self,
        surface: &mut PageSurface<'_, '_>,
        geometry: &PageGeometry,
        page_number: usize,
    ) -> Result<(), Error> {
        (**self).decorate_page(surface, geometry, page_number)
    }
}

/// Distance of the accent lines from the top and bottom edges.
const ACCENT_LINE_OFFSET_MM: f64 = 18.0;
/// Horizontal inset of the accent lines and the page number.
const FURNITURE_INSET_MM: f64 = 20.0;
/// Distance of the page number baseline from the bottom edge.
const PAGE_NUMBER_BASELINE_MM: f64 = 12.0;
const ACCENT_LINE_WIDTH_PT: f64 = 0.8;
const PAGE_NUMBER_FONT_SIZE: u8 = 9;

/// Obsidian background under the content; violet accent lines and a right-aligned page number
/// over it.
#[derive(Clone, Debug)]
pub struct HandbookDecorator {
    background: Color,
    accent: Color,
    text: Color,
}

impl HandbookDecorator {
    pub fn new(palette: &Palette) -> Self {
        Self {
            background: palette.obsidian,
            accent: palette.violet,
            text: palette.text_light,
        }
    }
}

impl PageDecorator for HandbookDecorator {
    fn decorate_page(
        &mut self,
        surface: &mut PageSurface<'_, '_>,
        geometry: &PageGeometry,
        page_number: usize,
    ) -> Result<(), Error> {
        let (width, height) = (geometry.width(), geometry.height());
        surface.fill_rect(0.0, 0.0, width, height, self.background);

        let overlay = surface.overlay();
        let (left, right) = (FURNITURE_INSET_MM, width - FURNITURE_INSET_MM);
        let top = ACCENT_LINE_OFFSET_MM;
        let bottom = height - ACCENT_LINE_OFFSET_MM;
        overlay.stroke_line((left, top), (right, top), ACCENT_LINE_WIDTH_PT, self.accent);
        overlay.stroke_line(
            (left, bottom),
            (right, bottom),
            ACCENT_LINE_WIDTH_PT,
            self.accent,
        );

        overlay.text_right(
            right,
            height - PAGE_NUMBER_BASELINE_MM,
            &format!("Page {}", page_number),
            PAGE_NUMBER_FONT_SIZE,
            self.text,
        )
    }
}

/// Adapts a [`PageDecorator`] to the engine's decorator hook.
pub(crate) struct EngineDecorator<D> {
    inner: D,
    geometry: PageGeometry,
    tracker: PageTracker,
}

impl<D: PageDecorator> EngineDecorator<D> {
    pub fn new(inner: D, geometry: PageGeometry, tracker: PageTracker) -> Self {
        Self {
            inner,
            geometry,
            tracker,
        }
    }
}

impl<D: PageDecorator> genpdf::PageDecorator for EngineDecorator<D> {
    fn decorate_page<'a>(
        &mut self,
        context: &Context,
        mut area: render::Area<'a>,
        _style: Style,
    ) -> Result<render::Area<'a>, Error> {
        let page = self.tracker.start_page();
        log::debug!("Decorating page {}", page);

        let mut surface = PageSurface::new(context, area.clone());
        self.inner
            .decorate_page(&mut surface, &self.geometry, page)?;

        area.add_margins(self.geometry.margins());
        Ok(area)
    }
}
