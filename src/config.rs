//! Engine configuration: brand identity, palette, asset access and page geometry.
//!
//! Every field carries a serde default so a partial JSON document (or none at
//! all) yields a working configuration reproducing the stock ArslanOps brand.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::Result;

/// Environment variable overriding [`AssetConfig::base_url`].
pub const ASSET_BASE_ENV: &str = "REPORT_FORGE_ASSET_BASE";

/// Top-level configuration consumed by every generator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub brand: BrandConfig,
    pub palette: Palette,
    pub assets: AssetConfig,
    pub page: PageConfig,
}

impl EngineConfig {
    /// Parses a configuration from a JSON string.
    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Applies environment overrides on top of the parsed values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base) = env::var(ASSET_BASE_ENV) {
            if !base.trim().is_empty() {
                self.assets.base_url = Some(base.trim().to_owned());
            }
        }
        self
    }
}

/// Brand texts stamped into headers and footers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandConfig {
    pub name: String,
    pub tagline: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    /// Footer notice centred under every page.
    pub confidentiality_notice: String,
    /// Word preceding the "i / total" page counter.
    pub page_label: String,
    /// Caption drawn inside image placeholders.
    pub unavailable_label: String,
    /// Suffix appended by the currency number format.
    pub currency_suffix: String,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            name: "ArslanOps".to_owned(),
            tagline: "Operasyon Danışmanlık".to_owned(),
            email: "info@arslanops.com".to_owned(),
            phone: "+90 539 233 11 474".to_owned(),
            website: "arslanops.com".to_owned(),
            confidentiality_notice:
                "Bu rapor gizlidir ve yalnızca ilgili işletme yönetimi ile paylaşılmalıdır."
                    .to_owned(),
            page_label: "Sayfa".to_owned(),
            unavailable_label: "Foto yüklenemedi".to_owned(),
            currency_suffix: "₺".to_owned(),
        }
    }
}

impl BrandConfig {
    /// `Name | email | phone`, the left half of every footer.
    pub fn contact_line(&self) -> String {
        [&self.name, &self.email, &self.phone]
            .iter()
            .filter(|part| !part.trim().is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Brand name followed by the tagline, used for the workbook brand bar.
    pub fn banner(&self) -> String {
        if self.tagline.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{} — {}", self.name, self.tagline)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub primary: Rgb,
    pub accent: Rgb,
    pub cream: Rgb,
    pub light_bg: Rgb,
    pub zebra: Rgb,
    pub text_dark: Rgb,
    pub text_gray: Rgb,
    pub rule: Rgb,
    pub placeholder: Rgb,
    pub success: Rgb,
    pub warning: Rgb,
    pub danger: Rgb,
    pub info: Rgb,
    pub highlight: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: Rgb::from_hex(0x0B1F3B),
            accent: Rgb::from_hex(0xC4803D),
            cream: Rgb::from_hex(0xFFF8F0),
            light_bg: Rgb::from_hex(0xF5F7FA),
            zebra: Rgb::from_hex(0xF5F5F5),
            text_dark: Rgb::from_hex(0x1E1E1E),
            text_gray: Rgb::from_hex(0x6B7280),
            rule: Rgb::from_hex(0xD1D5DB),
            placeholder: Rgb::from_hex(0xE6E6E6),
            success: Rgb::from_hex(0x22C55E),
            warning: Rgb::from_hex(0xF59E0B),
            danger: Rgb::from_hex(0xEF4444),
            info: Rgb::from_hex(0x3B82F6),
            highlight: Rgb::from_hex(0x8B5CF6),
        }
    }
}

/// Remote asset access.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Prefix joined onto relative URLs such as `/uploads/team/a.png`.
    pub base_url: Option<String>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Responses larger than this are rejected.
    pub max_bytes: u64,
    pub font_regular_url: Option<String>,
    pub font_bold_url: Option<String>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: 10_000,
            max_bytes: 16 * 1024 * 1024,
            font_regular_url: None,
            font_bold_url: None,
        }
    }
}

impl AssetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// A4 page geometry in millimetres. Coordinates grow downwards from the top edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub width_mm: f64,
    pub height_mm: f64,
    pub side_margin_mm: f64,
    pub top_margin_mm: f64,
    /// Distance from the bottom edge where the content area ends and the footer band starts.
    pub bottom_margin_mm: f64,
    pub block_spacing_mm: f64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            side_margin_mm: 15.0,
            top_margin_mm: 15.0,
            bottom_margin_mm: 22.0,
            block_spacing_mm: 4.0,
        }
    }
}

impl PageConfig {
    pub fn content_width(&self) -> f64 {
        self.width_mm - 2.0 * self.side_margin_mm
    }

    pub fn content_bottom(&self) -> f64 {
        self.height_mm - self.bottom_margin_mm
    }

    pub fn content_height(&self) -> f64 {
        self.content_bottom() - self.top_margin_mm
    }
}
