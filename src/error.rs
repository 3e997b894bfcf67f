//! Errors that abort a document build.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::driver::DriverState;
use crate::richtext::ParseError;
use crate::style::StyleId;

/// Layout-fatal failures.  Missing font assets are recovered by the font loader and only
/// surface here when no usable face exists at all.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid page geometry: {0}")]
    InvalidGeometry(String),

    #[error("table in block {block} has {found} cells in row {row}, expected {expected}")]
    RaggedTable {
        block: usize,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("table in block {block} declares no columns")]
    EmptyTable { block: usize },

    #[error("block {block} has an invalid {dimension}: {value} mm")]
    InvalidDimension {
        block: usize,
        dimension: &'static str,
        value: f64,
    },

    #[error(
        "table in block {block} is {required:.2} mm wide but only {available:.2} mm are usable"
    )]
    TableTooWide {
        block: usize,
        required: f64,
        available: f64,
    },

    #[error(
        "decorative box in block {block} ({width:.1}x{height:.1} mm) does not fit the usable area"
    )]
    BoxTooLarge {
        block: usize,
        width: f64,
        height: f64,
    },

    #[error("block {block} refers to unregistered style `{style}`")]
    UnknownStyle { block: usize, style: StyleId },

    #[error("heading in block {block} has invalid level {level}")]
    InvalidHeadingLevel { block: usize, level: u8 },

    #[error("invalid markup in block {block}")]
    Markup {
        block: usize,
        #[source]
        source: ParseError,
    },

    #[error("no usable font: {0}")]
    Fonts(#[source] genpdf::error::Error),

    #[error("layout engine failed")]
    Layout(#[from] genpdf::error::Error),

    #[error("failed to write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[cfg(feature = "bookmarks")]
    #[error("failed to add bookmarks")]
    Outline(#[from] crate::bookmarks::OutlineError),

    #[error("driver already ran (state: {0:?})")]
    AlreadyRan(DriverState),
}
