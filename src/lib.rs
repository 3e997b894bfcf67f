//! Assembles the Cursed Energy Handbook, a tabletop role-playing supplement, into a paginated A4
//! PDF.
//!
//! The crate follows a declarative model: [`handbook::handbook_content`] produces an ordered
//! sequence of [`model::ContentBlock`]s, a [`decorator::PageDecorator`] paints the per-page
//! furniture, and [`driver::DocumentDriver`] hands both to the `genpdf` layout engine and writes
//! the result.

pub mod decorator;
pub mod driver;
mod elements;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod handbook;
pub mod model;
pub mod palette;
pub mod richtext;
pub mod style;
mod wrap;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use decorator::{HandbookDecorator, PageDecorator, PageSurface};
pub use driver::{BuiltDocument, DocumentDriver, DriverConfig, DriverState, HeadingPage};
pub use error::BuildError;
pub use model::{ContentBlock, ContentBuilder};
pub use style::{StyleId, StyleSheet};
