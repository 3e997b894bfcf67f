//! Font loading with a degrade-not-fail policy.
//!
//! The handbook declares DejaVu Sans (regular, bold and their obliques) at fixed system paths.
//! When the upright files are missing the loader tries, in order:
//!
//! 1. bundled Roboto files under `assets/fonts` next to the executable or the crate manifest;
//! 2. a sans-serif system face discovered through `fontdb` (feature `system-fonts`).
//!
//! A missing bold face degrades to the regular face, and a missing oblique to the upright face of
//! the same weight.  Only when every source fails does loading return an error.
//! [`FontPolicy::Strict`] turns any problem with the declared files into an error instead.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::Error;
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Declared regular face.
pub const DEFAULT_REGULAR_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";
/// Declared bold face.
pub const DEFAULT_BOLD_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf";
/// Declared italic face.
pub const DEFAULT_ITALIC_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Oblique.ttf";
/// Declared bold italic face.
pub const DEFAULT_BOLD_ITALIC_FONT: &str =
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-BoldOblique.ttf";

/// Name of the bundled fallback family.
pub const BUNDLED_FONT_FAMILY_NAME: &str = "Roboto";

const BUNDLED_FONT_FILES: &[&str] = &[
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

/// What to do when the declared font files cannot be loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontPolicy {
    /// Substitute a fallback face and keep going.
    #[default]
    Fallback,
    /// Fail the build.
    Strict,
}

/// Declared font assets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontConfig {
    pub regular: PathBuf,
    pub bold: PathBuf,
    pub italic: PathBuf,
    pub bold_italic: PathBuf,
    pub policy: FontPolicy,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            regular: PathBuf::from(DEFAULT_REGULAR_FONT),
            bold: PathBuf::from(DEFAULT_BOLD_FONT),
            italic: PathBuf::from(DEFAULT_ITALIC_FONT),
            bold_italic: PathBuf::from(DEFAULT_BOLD_ITALIC_FONT),
            policy: FontPolicy::Fallback,
        }
    }
}

impl FontConfig {
    /// Declares a different pair of upright font files.
    pub fn with_files(mut self, regular: impl Into<PathBuf>, bold: impl Into<PathBuf>) -> Self {
        self.regular = regular.into();
        self.bold = bold.into();
        self
    }

    /// Declares a different pair of italic font files.
    pub fn with_italic_files(
        mut self,
        italic: impl Into<PathBuf>,
        bold_italic: impl Into<PathBuf>,
    ) -> Self {
        self.italic = italic.into();
        self.bold_italic = bold_italic.into();
        self
    }

    pub fn with_policy(mut self, policy: FontPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Where the loaded family came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontSource {
    Declared,
    Bundled(PathBuf),
    System(String),
}

/// A font family ready to hand to `genpdf::Document::new`.
pub struct LoadedFonts {
    pub family: FontFamily<FontData>,
    pub source: FontSource,
}

fn not_found(message: String) -> Error {
    Error::new(
        message,
        io::Error::new(io::ErrorKind::NotFound, "font assets not found"),
    )
}

fn family_from_faces(
    regular: FontData,
    bold: FontData,
    italic: Option<FontData>,
    bold_italic: Option<FontData>,
) -> FontFamily<FontData> {
    FontFamily {
        italic: italic.unwrap_or_else(|| regular.clone()),
        bold_italic: bold_italic.unwrap_or_else(|| bold.clone()),
        regular,
        bold,
    }
}

/// Loads a declared face, substituting `substitute` under the fallback policy.
fn load_or_substitute(
    path: &Path,
    policy: FontPolicy,
    substitute: &FontData,
    substitute_name: &str,
) -> Result<FontData, Error> {
    match FontData::load(path, None) {
        Ok(face) => Ok(face),
        Err(err) if policy == FontPolicy::Fallback => {
            warn!(
                "Declared font {} unavailable ({}); using the {} face",
                path.display(),
                err,
                substitute_name
            );
            Ok(substitute.clone())
        }
        Err(err) => Err(not_found(format!(
            "failed to load declared font {}: {}",
            path.display(),
            err
        ))),
    }
}

fn load_declared(config: &FontConfig) -> Result<FontFamily<FontData>, Error> {
    let regular = FontData::load(&config.regular, None).map_err(|err| {
        not_found(format!(
            "failed to load declared font {}: {}",
            config.regular.display(),
            err
        ))
    })?;
    let bold = load_or_substitute(&config.bold, config.policy, &regular, "regular")?;
    let italic = load_or_substitute(&config.italic, config.policy, &regular, "regular")?;
    let bold_italic = load_or_substitute(&config.bold_italic, config.policy, &bold, "bold")?;

    Ok(family_from_faces(regular, bold, Some(italic), Some(bold_italic)))
}

fn bundled_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            candidates.push(bin_dir.join("assets/fonts"));
        }
    }

    let manifest_candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts");
    if !candidates.contains(&manifest_candidate) {
        candidates.push(manifest_candidate);
    }

    candidates
}

fn bundled_fonts_complete(directory: &Path) -> bool {
    directory.is_dir()
        && BUNDLED_FONT_FILES
            .iter()
            .all(|name| directory.join(name).is_file())
}

fn load_bundled() -> Result<(FontFamily<FontData>, PathBuf), Error> {
    let mut checked = Vec::new();
    for directory in bundled_directory_candidates() {
        if bundled_fonts_complete(&directory) {
            let family = fonts::from_files(&directory, BUNDLED_FONT_FAMILY_NAME, None)?;
            return Ok((family, directory));
        }
        checked.push(directory.display().to_string());
    }
    Err(not_found(format!(
        "bundled fonts missing (checked {})",
        checked.join(", ")
    )))
}

#[cfg(feature = "system-fonts")]
mod system {
    use fontdb::{Database, Family, Query, Source, Style, Weight, ID};
    use genpdf::fonts::FontData;

    const PREFERRED_FAMILIES: &[Family<'static>] = &[
        Family::Name("DejaVu Sans"),
        Family::Name("Liberation Sans"),
        Family::Name("Noto Sans"),
        Family::Name("Arial"),
        Family::SansSerif,
    ];

    fn load_face(database: &Database, id: ID) -> Option<(String, FontData)> {
        let name = database.face(id)?.post_script_name.clone();
        let data = database
            .with_face_data(id, |bytes, index| {
                if index == 0 {
                    FontData::new(bytes.to_vec(), None).ok()
                } else {
                    None
                }
            })
            .flatten()?;
        Some((name, data))
    }

    fn query(database: &Database, weight: Weight, style: Style) -> Option<(String, FontData)> {
        let id = database.query(&Query {
            families: PREFERRED_FAMILIES,
            weight,
            style,
            ..Query::default()
        })?;
        load_face(database, id)
    }

    /// A discovered family; missing italic faces are left to the caller to substitute.
    pub(super) struct SystemFaces {
        pub name: String,
        pub regular: FontData,
        pub bold: FontData,
        pub italic: Option<FontData>,
        pub bold_italic: Option<FontData>,
    }

    fn any_truetype_face(database: &Database) -> Option<(String, FontData)> {
        database
            .faces()
            .filter(|face| face.index == 0)
            .filter(|face| match &face.source {
                Source::File(path) => path
                    .extension()
                    .map_or(false, |ext| ext.eq_ignore_ascii_case("ttf")),
                _ => false,
            })
            .find_map(|face| load_face(database, face.id))
    }

    /// Finds upright and italic system faces, named after the regular face.
    pub(super) fn discover() -> Option<SystemFaces> {
        let mut database = Database::new();
        database.load_system_fonts();

        let (name, regular) = query(&database, Weight::NORMAL, Style::Normal)
            .or_else(|| any_truetype_face(&database))?;
        let bold = query(&database, Weight::BOLD, Style::Normal)
            .map(|(_, bold)| bold)
            .unwrap_or_else(|| regular.clone());
        let italic = query(&database, Weight::NORMAL, Style::Italic).map(|(_, face)| face);
        let bold_italic = query(&database, Weight::BOLD, Style::Italic).map(|(_, face)| face);
        Some(SystemFaces {
            name,
            regular,
            bold,
            italic,
            bold_italic,
        })
    }
}

#[cfg(feature = "system-fonts")]
fn load_system() -> Result<(FontFamily<FontData>, String), Error> {
    system::discover()
        .map(|faces| {
            let family =
                family_from_faces(faces.regular, faces.bold, faces.italic, faces.bold_italic);
            (family, faces.name)
        })
        .ok_or_else(|| not_found("no usable system font found".to_owned()))
}

#[cfg(not(feature = "system-fonts"))]
fn load_system() -> Result<(FontFamily<FontData>, String), Error> {
    Err(not_found(
        "system font discovery disabled (enable the `system-fonts` feature)".to_owned(),
    ))
}

fn load_fallback(declared_error: Error) -> Result<LoadedFonts, Error> {
    let bundled_error = match load_bundled() {
        Ok((family, directory)) => {
            debug!("Using bundled fonts from {}", directory.display());
            return Ok(LoadedFonts {
                family,
                source: FontSource::Bundled(directory),
            });
        }
        Err(err) => err,
    };

    match load_system() {
        Ok((family, name)) => {
            debug!("Using system font {}", name);
            Ok(LoadedFonts {
                family,
                source: FontSource::System(name),
            })
        }
        Err(system_error) => Err(not_found(format!(
            "{}; {}; {}",
            declared_error, bundled_error, system_error
        ))),
    }
}

/// Loads the document font family according to the configured policy.
pub fn load_font_family(config: &FontConfig) -> Result<LoadedFonts, Error> {
    match load_declared(config) {
        Ok(family) => Ok(LoadedFonts {
            family,
            source: FontSource::Declared,
        }),
        Err(err) if config.policy == FontPolicy::Strict => Err(err),
        Err(err) => {
            warn!("Declared fonts unavailable ({}); falling back", err);
            load_fallback(err)
        }
    }
}

/// Indicates whether [`load_font_family`] would succeed for the given configuration.
pub fn fonts_available(config: &FontConfig) -> bool {
    load_font_family(config).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_policy_rejects_missing_declared_fonts() {
        let config = FontConfig::default()
            .with_files("/__handbook_missing__/a.ttf", "/__handbook_missing__/b.ttf")
            .with_policy(FontPolicy::Strict);
        let err = load_font_family(&config)
            .err()
            .expect("strict policy must fail");
        assert!(err.to_string().contains("a.ttf"), "{err}");
    }

    #[test]
    fn fallback_policy_never_reports_declared_source_for_missing_files() {
        let config = FontConfig::default()
            .with_files("/__handbook_missing__/a.ttf", "/__handbook_missing__/b.ttf");
        match load_font_family(&config) {
            Ok(fonts) => assert_ne!(fonts.source, FontSource::Declared),
            Err(err) => assert!(err.to_string().contains("a.ttf"), "{err}"),
        }
    }

    fn declared_upright_faces_present() -> bool {
        let present =
            Path::new(DEFAULT_REGULAR_FONT).is_file() && Path::new(DEFAULT_BOLD_FONT).is_file();
        if !present {
            eprintln!("Skipping: DejaVu Sans is not installed at the declared path.");
        }
        present
    }

    #[test]
    fn default_config_declares_oblique_faces() {
        let config = FontConfig::default();
        assert!(config.italic.ends_with("DejaVuSans-Oblique.ttf"));
        assert!(config.bold_italic.ends_with("DejaVuSans-BoldOblique.ttf"));
    }

    #[test]
    fn missing_oblique_faces_degrade_to_upright_declared_faces() {
        if !declared_upright_faces_present() {
            return;
        }
        let config = FontConfig::default()
            .with_italic_files("/__handbook_missing__/i.ttf", "/__handbook_missing__/bi.ttf");
        let fonts = load_font_family(&config).expect("upright faces are enough");
        assert_eq!(fonts.source, FontSource::Declared);
    }

    #[test]
    fn strict_policy_requires_oblique_faces() {
        if !declared_upright_faces_present() {
            return;
        }
        let config = FontConfig::default()
            .with_italic_files("/__handbook_missing__/i.ttf", DEFAULT_BOLD_ITALIC_FONT)
            .with_policy(FontPolicy::Strict);
        let err = load_font_family(&config)
            .err()
            .expect("strict policy must fail");
        assert!(err.to_string().contains("i.ttf"), "{err}");
    }

    #[test]
    fn bundled_directory_requires_every_face() {
        let directory = tempfile::tempdir().expect("tempdir");
        std::fs::write(directory.path().join("Roboto-Regular.ttf"), b"").expect("write");
        assert!(!bundled_fonts_complete(directory.path()));
    }
}
