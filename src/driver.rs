//! Document driver: validation, engine invocation and output.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::decorator::{EngineDecorator, PageDecorator};
use crate::elements::{build_element, BlockElement, PageTracker};
use crate::error::BuildError;
use crate::fonts::{self, FontConfig};
use crate::geometry::{PageGeometry, WIDTH_TOLERANCE_MM};
use crate::model::ContentBlock;
use crate::style::StyleSheet;

/// Default output file, relative to the working directory.
pub const DEFAULT_OUTPUT_PATH: &str = "Jujutsu_Kaisen_The_Cursed_Energy_Handbook.pdf";
/// Default document title stored in the PDF metadata.
pub const DEFAULT_TITLE: &str = "Jujutsu Kaisen: The Cursed Energy Handbook";

/// Driver settings.
#[derive(Clone, Debug, PartialEq)]
pub struct DriverConfig {
    pub output_path: PathBuf,
    pub title: String,
    pub geometry: PageGeometry,
    pub fonts: FontConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            title: DEFAULT_TITLE.to_owned(),
            geometry: PageGeometry::default(),
            fonts: FontConfig::default(),
        }
    }
}

impl DriverConfig {
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_fonts(mut self, fonts: FontConfig) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Lifecycle of a driver.  `Built` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Unbuilt,
    Building,
    Built,
    Failed,
}

/// The page on which a heading's first line was placed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadingPage {
    pub title: String,
    pub level: u8,
    pub page: usize,
}

/// Result of a successful build.
#[derive(Clone, Debug)]
pub struct BuiltDocument {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub headings: Vec<HeadingPage>,
}

/// Runs the layout engine once over a block sequence.
pub struct DocumentDriver<D> {
    config: DriverConfig,
    decorator: Option<D>,
    state: DriverState,
}

impl<D: PageDecorator + 'static> DocumentDriver<D> {
    pub fn new(config: DriverConfig, decorator: D) -> Self {
        Self {
            config,
            decorator: Some(decorator),
            state: DriverState::Unbuilt,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Validates, renders and writes the document.
    ///
    /// Rendering happens in memory; the output file is only touched once the engine has
    /// produced the complete document, so a failed build leaves no file behind.
    pub fn build(
        &mut self,
        blocks: Vec<ContentBlock>,
        sheet: &StyleSheet,
    ) -> Result<BuiltDocument, BuildError> {
        let decorator = match (self.state, self.decorator.take()) {
            (DriverState::Unbuilt, Some(decorator)) => decorator,
            (state, _) => return Err(BuildError::AlreadyRan(state)),
        };

        self.state = DriverState::Building;
        let result = self.run(blocks, sheet, decorator);
        self.state = if result.is_ok() {
            DriverState::Built
        } else {
            DriverState::Failed
        };
        result
    }

    fn run(
        &self,
        blocks: Vec<ContentBlock>,
        sheet: &StyleSheet,
        decorator: D,
    ) -> Result<BuiltDocument, BuildError> {
        let geometry = self.config.geometry;
        validate(&blocks, &geometry)?;

        let tracker = PageTracker::default();
        let elements = blocks
            .into_iter()
            .enumerate()
            .map(|(index, block)| build_element(index, block, sheet, &tracker))
            .collect::<Result<Vec<BlockElement>, _>>()?;
        debug!("Prepared {} elements", elements.len());

        let loaded = fonts::load_font_family(&self.config.fonts).map_err(BuildError::Fonts)?;
        debug!("Loaded fonts from {:?}", loaded.source);

        let mut document = genpdf::Document::new(loaded.family);
        document.set_title(self.config.title.clone());
        document.set_paper_size(geometry.paper_size());
        document.set_minimal_conformance();
        document.set_page_decorator(EngineDecorator::new(decorator, geometry, tracker.clone()));
        for element in elements {
            document.push(element);
        }

        let mut bytes = Vec::new();
        document.render(&mut bytes)?;
        let headings = tracker.headings();

        #[cfg(feature = "bookmarks")]
        let bytes = crate::bookmarks::apply_heading_bookmarks(&bytes, &headings)?;

        write_output(&self.config.output_path, &bytes)?;
        info!(
            "Wrote {} ({} pages, {} bytes)",
            self.config.output_path.display(),
            tracker.pages(),
            bytes.len()
        );

        Ok(BuiltDocument {
            path: self.config.output_path.clone(),
            bytes,
            page_count: tracker.pages(),
            headings,
        })
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), BuildError> {
    fs::write(path, bytes).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn positive(block: usize, dimension: &'static str, value: f64) -> Result<(), BuildError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(BuildError::InvalidDimension {
            block,
            dimension,
            value,
        })
    }
}

fn non_negative(block: usize, dimension: &'static str, value: f64) -> Result<(), BuildError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(BuildError::InvalidDimension {
            block,
            dimension,
            value,
        })
    }
}

/// Checks every size-related constraint that would make layout impossible.
pub fn validate(blocks: &[ContentBlock], geometry: &PageGeometry) -> Result<(), BuildError> {
    if let Some(reason) = geometry.check() {
        return Err(BuildError::InvalidGeometry(reason));
    }
    let available = geometry.usable_width();

    for (index, block) in blocks.iter().enumerate() {
        match block {
            ContentBlock::Table(table) => {
                let expected = table.column_widths().len();
                if expected == 0 {
                    return Err(BuildError::EmptyTable { block: index });
                }
                for width in table.column_widths() {
                    positive(index, "column width", *width)?;
                }
                for (row, cells) in table.rows().iter().enumerate() {
                    if cells.len() != expected {
                        return Err(BuildError::RaggedTable {
                            block: index,
                            row,
                            expected,
                            found: cells.len(),
                        });
                    }
                }
                let required = table.width();
                if required > available + WIDTH_TOLERANCE_MM {
                    return Err(BuildError::TableTooWide {
                        block: index,
                        required,
                        available,
                    });
                }
            }
            ContentBlock::DecorativeBox(shape) => {
                positive(index, "box width", shape.width)?;
                positive(index, "box height", shape.height)?;
                non_negative(index, "border width", shape.border_width)?;
                if shape.width > available + WIDTH_TOLERANCE_MM
                    || shape.height > geometry.usable_height() + WIDTH_TOLERANCE_MM
                {
                    return Err(BuildError::BoxTooLarge {
                        block: index,
                        width: shape.width,
                        height: shape.height,
                    });
                }
            }
            ContentBlock::Spacer { height } => non_negative(index, "spacer height", *height)?,
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorator::HandbookDecorator;
    use crate::model::{ContentBuilder, DecorativeBox, TableBlock};
    use crate::palette::Palette;
    use crate::style::StyleId;

    fn crest(width: f64, height: f64) -> DecorativeBox {
        let palette = Palette::default();
        DecorativeBox {
            width,
            height,
            fill: palette.violet,
            border_color: palette.crimson,
            border_width: 2.0,
        }
    }

    #[test]
    fn table_exactly_as_wide_as_usable_area_is_accepted() {
        let blocks = ContentBuilder::new()
            .table(TableBlock::new(vec![vec!["a", "b"]], vec![85.0, 85.0]))
            .finish();
        assert!(validate(&blocks, &PageGeometry::default()).is_ok());
    }

    #[test]
    fn table_wider_than_usable_area_is_rejected() {
        let blocks = ContentBuilder::new()
            .paragraph("intro", StyleId::Normal)
            .table(TableBlock::new(vec![vec!["a", "b"]], vec![100.0, 80.0]))
            .finish();
        let err = validate(&blocks, &PageGeometry::default()).unwrap_err();
        assert!(matches!(
            err,
            BuildError::TableTooWide { block: 1, required, available }
                if required == 180.0 && available == 170.0
        ));
    }

    #[test]
    fn non_finite_or_negative_column_widths_are_rejected() {
        for widths in [vec![f64::NAN, 10.0], vec![-20.0, 60.0], vec![0.0, 85.0]] {
            let blocks = ContentBuilder::new()
                .table(TableBlock::new(vec![vec!["a", "b"]], widths.clone()))
                .finish();
            let err = validate(&blocks, &PageGeometry::default()).unwrap_err();
            assert!(
                matches!(
                    err,
                    BuildError::InvalidDimension {
                        block: 0,
                        dimension: "column width",
                        ..
                    }
                ),
                "{widths:?} was accepted: {err}"
            );
        }
    }

    #[test]
    fn degenerate_boxes_and_spacers_are_rejected() {
        let cases = [
            (crest(f64::NAN, 40.0), "box width"),
            (crest(160.0, -1.0), "box height"),
            (crest(160.0, f64::INFINITY), "box height"),
            (
                DecorativeBox {
                    border_width: f64::NAN,
                    ..crest(160.0, 40.0)
                },
                "border width",
            ),
        ];
        for (shape, expected) in cases {
            let blocks = ContentBuilder::new().decorative_box(shape).finish();
            match validate(&blocks, &PageGeometry::default()) {
                Err(BuildError::InvalidDimension { dimension, .. }) => {
                    assert_eq!(dimension, expected)
                }
                other => panic!("expected {expected} to be rejected, got {other:?}"),
            }
        }

        let blocks = ContentBuilder::new().spacer(-6.0).finish();
        assert!(matches!(
            validate(&blocks, &PageGeometry::default()),
            Err(BuildError::InvalidDimension {
                dimension: "spacer height",
                ..
            })
        ));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let blocks = ContentBuilder::new()
            .table(TableBlock::new(
                vec![vec!["Level", "Feature"], vec!["1"]],
                vec![25.0, 100.0],
            ))
            .finish();
        let err = validate(&blocks, &PageGeometry::default()).unwrap_err();
        assert!(matches!(
            err,
            BuildError::RaggedTable {
                block: 0,
                row: 1,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn oversized_box_is_rejected() {
        let blocks = ContentBuilder::new()
            .decorative_box(crest(160.0, 300.0))
            .finish();
        assert!(matches!(
            validate(&blocks, &PageGeometry::default()),
            Err(BuildError::BoxTooLarge { block: 0, .. })
        ));
        let blocks = ContentBuilder::new()
            .decorative_box(crest(160.0, 40.0))
            .finish();
        assert!(validate(&blocks, &PageGeometry::default()).is_ok());
    }

    #[test]
    fn invalid_geometry_fails_before_blocks_are_checked() {
        let geometry = PageGeometry::a4().with_margins(200.0, 0.0, 200.0, 0.0);
        assert!(matches!(
            validate(&[], &geometry),
            Err(BuildError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn failed_build_is_terminal_and_writes_nothing() {
        let directory = tempfile::tempdir().expect("tempdir");
        let output = directory.path().join("too_wide.pdf");
        let config = DriverConfig::default().with_output_path(&output);
        let mut driver = DocumentDriver::new(config, HandbookDecorator::new(&Palette::default()));
        assert_eq!(driver.state(), DriverState::Unbuilt);

        let blocks = ContentBuilder::new()
            .table(TableBlock::new(vec![vec!["wide"]], vec![171.0]))
            .finish();
        let sheet = StyleSheet::handbook(&Palette::default());
        assert!(matches!(
            driver.build(blocks, &sheet),
            Err(BuildError::TableTooWide { .. })
        ));
        assert_eq!(driver.state(), DriverState::Failed);
        assert!(!output.exists());

        let again = driver.build(Vec::new(), &sheet);
        assert!(matches!(
            again,
            Err(BuildError::AlreadyRan(DriverState::Failed))
        ));
    }
}
