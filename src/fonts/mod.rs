//! Font families used for measuring and drawing text.
//!
//! Two families exist. The embedded family wraps TrueType files (resolved
//! from remote URLs or a local directory) and is measured through `genpdf`'s
//! font cache, so it renders the full Turkish alphabet. The built-in family
//! maps onto the PDF base-14 Helvetica faces; those cannot display characters
//! such as `ş` or `ğ`, so every string drawn with it is transliterated to
//! ASCII first.

mod metrics;

use std::borrow::Cow;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use genpdf::fonts::{Font, FontCache, FontData, FontFamily};
use log::warn;

use crate::{Error, Result};

/// Points to millimetres.
pub const PT_TO_MM: f64 = 25.4 / 72.0;

/// Line pitch as a multiple of the font size.
pub const LINE_SPACING: f64 = 1.45;

/// Environment variable naming a directory with `Regular.ttf` / `Bold.ttf` style files.
pub const FONTS_DIR_ENV: &str = "REPORT_FORGE_FONTS_DIR";

const REGULAR_CANDIDATES: &[&str] = &["DejaVuSans.ttf", "Roboto-Regular.ttf", "Regular.ttf"];
const BOLD_CANDIDATES: &[&str] = &["DejaVuSans-Bold.ttf", "Roboto-Bold.ttf", "Bold.ttf"];

fn mm_to_f64(value: genpdf::Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Height of one text line in millimetres.
pub fn line_height(size: u8) -> f64 {
    f64::from(size) * PT_TO_MM * LINE_SPACING
}

/// Offset from the top of a line box to its baseline.
pub fn baseline_offset(size: u8) -> f64 {
    line_height(size) * 0.72
}

/// Replaces Turkish letters and typographic dashes with ASCII equivalents.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            'ş' => out.push('s'),
            'Ş' => out.push('S'),
            'ı' => out.push('i'),
            'İ' => out.push('I'),
            'ç' => out.push('c'),
            'Ç' => out.push('C'),
            'ğ' => out.push('g'),
            'Ğ' => out.push('G'),
            'ö' => out.push('o'),
            'Ö' => out.push('O'),
            'ü' => out.push('u'),
            'Ü' => out.push('U'),
            'â' | 'à' | 'á' => out.push('a'),
            'î' => out.push('i'),
            'û' => out.push('u'),
            'é' | 'è' | 'ê' => out.push('e'),
            '—' => out.push_str("--"),
            '–' => out.push('-'),
            '°' => out.push_str(" derece "),
            '‘' | '’' => out.push('\''),
            '“' | '”' => out.push('"'),
            '…' => out.push_str("..."),
            '•' => out.push('*'),
            '₺' => out.push_str("TL"),
            '\u{00a0}' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}

/// Transliterates and then replaces whatever is still outside printable ASCII.
pub fn ascii_fold(text: &str) -> String {
    transliterate(text)
        .chars()
        .filter(|ch| *ch != '\r')
        .map(|ch| match ch {
            ' '..='~' | '\n' => ch,
            '\t' => ' ',
            _ => '?',
        })
        .collect()
}

/// The font family a document is measured and drawn with.
pub enum FontSet {
    /// PDF base-14 Helvetica and Helvetica-Bold, ASCII only.
    Builtin,
    /// TrueType regular and bold faces.
    Embedded(Box<EmbeddedFonts>),
}

impl Default for FontSet {
    fn default() -> Self {
        FontSet::Builtin
    }
}

impl fmt::Debug for FontSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontSet::Builtin => f.write_str("FontSet::Builtin"),
            FontSet::Embedded(fonts) => f
                .debug_struct("FontSet::Embedded")
                .field("regular_bytes", &fonts.regular.len())
                .field("bold_bytes", &fonts.bold.len())
                .finish(),
        }
    }
}

/// TrueType font data together with the `genpdf` cache used for metrics.
pub struct EmbeddedFonts {
    regular: Vec<u8>,
    bold: Vec<u8>,
    cache: FontCache,
    family: FontFamily<Font>,
}

impl FontSet {
    pub fn builtin() -> Self {
        FontSet::Builtin
    }

    /// Parses the given TrueType files. Italic faces reuse the upright ones.
    pub fn embedded(regular: Vec<u8>, bold: Vec<u8>) -> Result<Self> {
        let load = |bytes: &[u8], style: &str| {
            FontData::new(bytes.to_vec(), None)
                .map_err(|err| Error::Font(format!("invalid {} font data: {}", style, err)))
        };
        let family = FontFamily {
            regular: load(&regular, "regular")?,
            bold: load(&bold, "bold")?,
            italic: load(&regular, "italic")?,
            bold_italic: load(&bold, "bold italic")?,
        };
        let cache = FontCache::new(family);
        let family = cache.default_font_family();
        Ok(FontSet::Embedded(Box::new(EmbeddedFonts {
            regular,
            bold,
            cache,
            family,
        })))
    }

    /// Loads the first matching regular/bold pair from `directory`.
    pub fn from_directory(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref();
        let pick = |candidates: &[&str]| {
            candidates
                .iter()
                .map(|name| directory.join(name))
                .find(|path| path.is_file())
        };
        let (regular, bold) = match (pick(REGULAR_CANDIDATES), pick(BOLD_CANDIDATES)) {
            (Some(regular), Some(bold)) => (regular, bold),
            _ => {
                return Err(Error::Font(format!(
                    "no regular/bold font pair found in {} (looked for {} and {})",
                    directory.display(),
                    REGULAR_CANDIDATES.join(", "),
                    BOLD_CANDIDATES.join(", ")
                )))
            }
        };
        Self::embedded(fs::read(regular)?, fs::read(bold)?)
    }

    /// Embedded fonts from `REPORT_FORGE_FONTS_DIR` when set, otherwise the built-in family.
    pub fn from_env_or_builtin() -> Self {
        let Some(directory) = local_font_directory() else {
            return FontSet::Builtin;
        };
        match Self::from_directory(&directory) {
            Ok(fonts) => fonts,
            Err(err) => {
                warn!(
                    "Fonts in {} unavailable ({}); falling back to built-in Helvetica.",
                    directory.display(),
                    err
                );
                FontSet::Builtin
            }
        }
    }

    /// Whether the family can draw arbitrary Unicode text.
    pub fn is_unicode(&self) -> bool {
        matches!(self, FontSet::Embedded(_))
    }

    /// Text as it will be drawn: unchanged for embedded fonts, ASCII-folded otherwise.
    pub fn prepare<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            FontSet::Embedded(_) => Cow::Borrowed(text),
            FontSet::Builtin if text.bytes().all(|b| (b' '..=b'~').contains(&b)) => {
                Cow::Borrowed(text)
            }
            FontSet::Builtin => Cow::Owned(ascii_fold(text)),
        }
    }

    /// Advance width of already prepared `text` in millimetres.
    pub fn text_width(&self, text: &str, size: u8, bold: bool) -> f64 {
        match self {
            FontSet::Builtin => {
                f64::from(metrics::string_width(text, bold)) / 1000.0 * f64::from(size) * PT_TO_MM
            }
            FontSet::Embedded(fonts) => {
                let font = if bold {
                    fonts.family.bold
                } else {
                    fonts.family.regular
                };
                mm_to_f64(font.str_width(&fonts.cache, text, size))
            }
        }
    }

    /// Raw TrueType bytes for embedding, `(regular, bold)`.
    pub(crate) fn embedded_data(&self) -> Option<(&[u8], &[u8])> {
        match self {
            FontSet::Builtin => None,
            FontSet::Embedded(fonts) => Some((&fonts.regular, &fonts.bold)),
        }
    }
}

fn local_font_directory() -> Option<PathBuf> {
    env::var_os(FONTS_DIR_ENV).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transliterates_turkish_letters() {
        assert_eq!(transliterate("Işık Çağrı Şöför Ünlü"), "Isik Cagri Sofor Unlu");
        assert_eq!(transliterate("ArslanOps — Operasyon"), "ArslanOps -- Operasyon");
        assert_eq!(transliterate("4°C"), "4 derece C");
    }

    #[test]
    fn ascii_fold_leaves_only_printable_ascii() {
        let folded = ascii_fold("Kahve ☕ dükkanı\tİzmir");
        assert_eq!(folded, "Kahve ? dukkani Izmir");
        assert!(folded.chars().all(|ch| ch.is_ascii()));
    }

    #[test]
    fn builtin_prepare_borrows_plain_ascii() {
        let fonts = FontSet::builtin();
        assert!(matches!(fonts.prepare("Cafe Noir"), Cow::Borrowed(_)));
        assert_eq!(fonts.prepare("Güneş"), "Gunes");
        assert!(!fonts.is_unicode());
    }

    #[test]
    fn builtin_widths_scale_with_size() {
        let fonts = FontSet::builtin();
        let small = fonts.text_width("Sayfa 1 / 1", 7, false);
        let large = fonts.text_width("Sayfa 1 / 1", 14, false);
        assert!((large - 2.0 * small).abs() < 1e-9);
        assert!(fonts.text_width("Hello", 10, true) > fonts.text_width("Hello", 10, false));
    }

    #[test]
    fn missing_directory_is_reported() {
        let err = FontSet::from_directory("/definitely/not/here").unwrap_err();
        assert!(err.to_string().contains("no regular/bold font pair"));
    }
}
