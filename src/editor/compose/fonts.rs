// SPDX-License-Identifier: MPL-2.0
//! Font registry used to rasterize text overlays.

use ab_glyph::FontArc;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Well-known locations of a sans-serif font, tried in order by
/// [`FontBook::with_system_default`].
pub const SYSTEM_FONT_CANDIDATES: &[(&str, &str)] = &[
    ("DejaVu Sans", "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
    ("DejaVu Sans", "/usr/share/fonts/TTF/DejaVuSans.ttf"),
    ("DejaVu Sans", "/usr/share/fonts/dejavu/DejaVuSans.ttf"),
    (
        "Liberation Sans",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    ),
    ("Noto Sans", "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf"),
    ("Helvetica", "/System/Library/Fonts/Helvetica.ttc"),
    ("Arial", "/Library/Fonts/Arial.ttf"),
    ("Arial", "C:\\Windows\\Fonts\\arial.ttf"),
];

/// Why a font could not be registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FontError {
    #[error("failed to read font file: {0}")]
    Io(String),
    #[error("invalid font data for '{0}'")]
    Invalid(String),
}

/// Named fonts plus an optional default family.
///
/// Families are kept sorted so that fallback resolution doesn't depend on
/// registration order.
#[derive(Clone, Default)]
pub struct FontBook {
    fonts: BTreeMap<String, FontArc>,
    default_family: Option<String>,
}

impl FontBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a TrueType/OpenType font from memory.
    ///
    /// The first registered family becomes the default.
    ///
    /// # Errors
    ///
    /// Returns [`FontError::Invalid`] if the bytes are not a usable font.
    pub fn register(&mut self, family: impl Into<String>, data: Vec<u8>) -> Result<(), FontError> {
        let family = family.into();
        let font = FontArc::try_from_vec(data).map_err(|_| FontError::Invalid(family.clone()))?;
        if self.default_family.is_none() {
            self.default_family = Some(family.clone());
        }
        self.fonts.insert(family, font);
        Ok(())
    }

    /// Registers a font file.
    ///
    /// # Errors
    ///
    /// Returns [`FontError::Io`] if the file can't be read and
    /// [`FontError::Invalid`] if it isn't a font.
    pub fn register_file(&mut self, family: impl Into<String>, path: &Path) -> Result<(), FontError> {
        let data = fs::read(path).map_err(|e| FontError::Io(format!("{}: {e}", path.display())))?;
        self.register(family, data)
    }

    /// Makes `family` the fallback for text without a usable family.
    /// Returns `false` if the family isn't registered.
    pub fn set_default(&mut self, family: &str) -> bool {
        if self.fonts.contains_key(family) {
            self.default_family = Some(family.to_string());
            true
        } else {
            false
        }
    }

    /// Registers the first font found in [`SYSTEM_FONT_CANDIDATES`].
    /// Returns the registered family, if any.
    pub fn with_system_default(&mut self) -> Option<String> {
        for (family, path) in SYSTEM_FONT_CANDIDATES {
            let path = Path::new(path);
            if !path.is_file() {
                continue;
            }
            match self.register_file(*family, path) {
                Ok(()) => return Some((*family).to_string()),
                Err(err) => log::debug!("Skipping system font: {err}"),
            }
        }
        None
    }

    /// Looks up `family`, falling back to the default family, then to the
    /// alphabetically first registered font.
    #[must_use]
    pub fn resolve(&self, family: Option<&str>) -> Option<&FontArc> {
        family
            .and_then(|name| self.fonts.get(name))
            .or_else(|| {
                self.default_family
                    .as_deref()
                    .and_then(|name| self.fonts.get(name))
            })
            .or_else(|| self.fonts.values().next())
    }

    #[must_use]
    pub fn contains(&self, family: &str) -> bool {
        self.fonts.contains_key(family)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.fonts.keys().map(String::as_str)
    }
}

impl fmt::Debug for FontBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontBook")
            .field("families", &self.fonts.keys().collect::<Vec<_>>())
            .field("default_family", &self.default_family)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::system_font;

    #[test]
    fn empty_book_resolves_nothing() {
        let book = FontBook::new();
        assert!(book.resolve(None).is_none());
        assert!(book.resolve(Some("Anything")).is_none());
    }

    #[test]
    fn invalid_bytes_are_rejected() {
        let mut book = FontBook::new();
        let err = book.register("Broken", b"not a font".to_vec()).unwrap_err();
        assert_eq!(err, FontError::Invalid("Broken".to_string()));
        assert!(book.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let mut book = FontBook::new();
        let err = book
            .register_file("Missing", Path::new("/definitely/not/here.ttf"))
            .unwrap_err();
        assert!(matches!(err, FontError::Io(_)));
    }

    #[test]
    fn unknown_family_falls_back_to_default() {
        let Some(data) = system_font() else {
            return;
        };
        let mut book = FontBook::new();
        book.register("Sans", data.clone()).expect("valid font");
        book.register("Other", data).expect("valid font");

        assert!(book.resolve(Some("Nope")).is_some());
        assert!(book.set_default("Other"));
        assert!(!book.set_default("Nope"));
        assert_eq!(book.families().collect::<Vec<_>>(), vec!["Other", "Sans"]);
    }
}
