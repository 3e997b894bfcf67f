//! Page geometry and unit helpers.
//!
//! All lengths in the public model are plain `f64` millimetres (or points where the field name
//! says so).  They are converted to [`genpdf::Mm`] only at the rendering boundary.

use genpdf::{Margins, Mm, Size};

const MM_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;

/// Width of an ISO A4 sheet in millimetres.
pub const A4_WIDTH_MM: f64 = 210.0;
/// Height of an ISO A4 sheet in millimetres.
pub const A4_HEIGHT_MM: f64 = 297.0;

/// Tolerance used when comparing declared widths against the usable area.
pub(crate) const WIDTH_TOLERANCE_MM: f64 = 0.01;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Converts typographic points to millimetres.
pub fn pt_to_mm(points: f64) -> f64 {
    points * MM_PER_INCH / POINTS_PER_INCH
}

/// Page size and margins shared by every page of the document.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    width: f64,
    height: f64,
    top: f64,
    right: f64,
    bottom: f64,
    left: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4().with_margins(25.0, 20.0, 25.0, 20.0)
    }
}

impl PageGeometry {
    /// Creates a geometry of the given page size without margins.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            top: 0.0,
            right: 0.0,
            bottom: 0.0,
            left: 0.0,
        }
    }

    /// A4 portrait without margins.
    pub fn a4() -> Self {
        Self::new(A4_WIDTH_MM, A4_HEIGHT_MM)
    }

    /// Sets the margins in top, right, bottom, left order and returns the updated geometry.
    pub fn with_margins(mut self, top: f64, right: f64, bottom: f64, left: f64) -> Self {
        self.top = top;
        self.right = right;
        self.bottom = bottom;
        self.left = left;
        self
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn top_margin(&self) -> f64 {
        self.top
    }

    pub fn right_margin(&self) -> f64 {
        self.right
    }

    pub fn bottom_margin(&self) -> f64 {
        self.bottom
    }

    pub fn left_margin(&self) -> f64 {
        self.left
    }

    /// Width available to flowed content once the side margins are removed.
    pub fn usable_width(&self) -> f64 {
        self.width - self.left - self.right
    }

    /// Height available to flowed content once the top and bottom margins are removed.
    pub fn usable_height(&self) -> f64 {
        self.height - self.top - self.bottom
    }

    /// Returns a description of the first problem that makes the geometry unusable.
    pub fn check(&self) -> Option<String> {
        let margins = [self.top, self.right, self.bottom, self.left];
        if !(self.width > 0.0 && self.height > 0.0) {
            Some(format!(
                "page size {}x{} mm is not positive",
                self.width, self.height
            ))
        } else if margins.iter().any(|margin| *margin < 0.0 || !margin.is_finite()) {
            Some("margins must be finite and non-negative".to_owned())
        } else if self.usable_width() <= 0.0 || self.usable_height() <= 0.0 {
            Some(format!(
                "margins leave no usable area ({:.1}x{:.1} mm)",
                self.usable_width(),
                self.usable_height()
            ))
        } else {
            None
        }
    }

    pub(crate) fn paper_size(&self) -> Size {
        Size::new(mm_from_f64(self.width), mm_from_f64(self.height))
    }

    pub(crate) fn margins(&self) -> Margins {
        Margins::trbl(
            mm_from_f64(self.top),
            mm_from_f64(self.right),
            mm_from_f64(self.bottom),
            mm_from_f64(self.left),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry_matches_handbook_layout() {
        let geometry = PageGeometry::default();
        assert_eq!(geometry.width(), 210.0);
        assert_eq!(geometry.usable_width(), 170.0);
        assert_eq!(geometry.usable_height(), 247.0);
        assert!(geometry.check().is_none());
    }

    #[test]
    fn margins_larger_than_page_are_rejected() {
        let geometry = PageGeometry::a4().with_margins(10.0, 120.0, 10.0, 100.0);
        let reason = geometry.check().expect("geometry should be rejected");
        assert!(reason.contains("no usable area"), "{reason}");
    }

    #[test]
    fn negative_margin_is_rejected() {
        let geometry = PageGeometry::a4().with_margins(-1.0, 0.0, 0.0, 0.0);
        assert!(geometry.check().is_some());
    }

    #[test]
    fn points_convert_to_millimetres() {
        assert!((pt_to_mm(72.0) - 25.4).abs() < 1e-9);
    }
}
