//! Branded QR codes: a high error-correction symbol with a circular brand mark
//! painted over its centre, exported as PNG.

use std::io::Cursor;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::{EmbeddedImage, ImageAsset};
use crate::color::Rgb;

/// Largest share of the symbol area the brand mark may hide. Level H recovers
/// from roughly 30 % damage; the rest is margin for print and camera noise.
pub const MAX_MARK_COVERAGE: f64 = 0.20;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodeError {
    #[error("payload cannot be encoded as a QR code: {0}")]
    Encode(String),
    #[error("brand mark covers {coverage:.1}% of the symbol, at most {limit:.1}% is scannable")]
    MarkTooLarge { coverage: f64, limit: f64 },
    #[error("failed to encode PNG: {0}")]
    Png(String),
}

/// Artwork inside the brand mark's disk.
#[derive(Clone, Debug)]
pub enum Emblem {
    None,
    /// Stroked capital "A" monogram.
    Monogram(Rgb),
    /// Raster logo scaled to the disk and clipped to it.
    Logo(Arc<EmbeddedImage>),
}

/// Ring and disk composited at the symbol's centre.
#[derive(Clone, Debug)]
pub struct BrandMark {
    /// Disk radius as a fraction of the image side.
    pub radius: f64,
    /// Ring width as a fraction of the image side.
    pub ring: f64,
    pub ring_color: Rgb,
    pub fill: Rgb,
    pub emblem: Emblem,
}

impl Default for BrandMark {
    fn default() -> Self {
        Self {
            radius: 55.0 / 600.0,
            ring: 6.0 / 600.0,
            ring_color: Rgb::from_hex(0xC4803D),
            fill: Rgb::from_hex(0x0B1F3B),
            emblem: Emblem::Monogram(Rgb::from_hex(0xD4AF37)),
        }
    }
}

impl BrandMark {
    pub fn with_emblem(mut self, emblem: Emblem) -> Self {
        self.emblem = emblem;
        self
    }
}

#[derive(Clone, Debug)]
pub struct CodeStyle {
    /// Target image side in pixels; rounded down to a whole number of modules.
    pub size_px: u32,
    /// Quiet zone width in modules.
    pub quiet_zone: u32,
    pub dark: Rgb,
    pub light: Rgb,
    pub mark: Option<BrandMark>,
}

impl Default for CodeStyle {
    /// Gold modules on navy with the default brand mark.
    fn default() -> Self {
        Self {
            size_px: 600,
            quiet_zone: 1,
            dark: Rgb::from_hex(0xC4803D),
            light: Rgb::from_hex(0x0B1F3B),
            mark: Some(BrandMark::default()),
        }
    }
}

impl CodeStyle {
    /// Black on white without a mark.
    pub fn plain() -> Self {
        Self {
            dark: Rgb::BLACK,
            light: Rgb::WHITE,
            quiet_zone: 4,
            mark: None,
            ..Self::default()
        }
    }

    pub fn with_mark(mut self, mark: BrandMark) -> Self {
        self.mark = Some(mark);
        self
    }
}

/// A rendered code: the raster plus its PNG encoding.
#[derive(Clone, Debug)]
pub struct BrandedCode {
    png: Vec<u8>,
    image: RgbaImage,
    modules: usize,
}

impl BrandedCode {
    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Modules per side of the symbol, quiet zone excluded.
    pub fn modules(&self) -> usize {
        self.modules
    }

    pub fn side_px(&self) -> u32 {
        self.image.width()
    }

    /// Image asset ready to be placed in a PDF image grid.
    pub fn to_asset(&self) -> ImageAsset {
        let image = DynamicImage::ImageRgba8(self.image.clone());
        ImageAsset::Ready(Arc::new(EmbeddedImage::from_dynamic(&image)))
    }
}

fn rgba(color: Rgb) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 255])
}

/// Encodes `payload` at error-correction level H and paints it with `style`.
pub fn render_code(payload: &str, style: &CodeStyle) -> Result<BrandedCode, CodeError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)
        .map_err(|err| CodeError::Encode(err.to_string()))?;
    let modules = code.width();
    let span = modules as u32 + 2 * style.quiet_zone;
    let module_px = (style.size_px / span).max(1);
    let side = module_px * span;

    let mut image = RgbaImage::from_pixel(side, side, rgba(style.light));
    let dark = rgba(style.dark);
    for (index, color) in code.to_colors().into_iter().enumerate() {
        if color != qrcode::Color::Dark {
            continue;
        }
        let column = (index % modules) as u32 + style.quiet_zone;
        let row = (index / modules) as u32 + style.quiet_zone;
        for y in row * module_px..(row + 1) * module_px {
            for x in column * module_px..(column + 1) * module_px {
                image.put_pixel(x, y, dark);
            }
        }
    }

    if let Some(mark) = &style.mark {
        let symbol_side = f64::from(modules as u32 * module_px);
        let outer = (mark.radius + mark.ring) * f64::from(side);
        let coverage = std::f64::consts::PI * outer * outer / (symbol_side * symbol_side);
        if coverage > MAX_MARK_COVERAGE {
            return Err(CodeError::MarkTooLarge {
                coverage: coverage * 100.0,
                limit: MAX_MARK_COVERAGE * 100.0,
            });
        }
        paint_mark(&mut image, mark);
    }

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
        .map_err(|err| CodeError::Png(err.to_string()))?;

    Ok(BrandedCode {
        png,
        image,
        modules,
    })
}

fn paint_mark(image: &mut RgbaImage, mark: &BrandMark) {
    let side = f64::from(image.width());
    let center = side / 2.0;
    let inner = mark.radius * side;
    let outer = inner + mark.ring * side;

    let logo = match &mark.emblem {
        Emblem::Logo(logo) => {
            let diameter = (2.0 * inner).round().max(1.0) as u32;
            Some(imageops::resize(&logo.dynamic().to_rgba8(), diameter, diameter, FilterType::Triangle))
        }
        _ => None,
    };
    let logo_origin = center - inner;

    let low = (center - outer).floor().max(0.0) as u32;
    let high = ((center + outer).ceil() as u32).min(image.width());
    for y in low..high {
        for x in low..high {
            let px = f64::from(x) + 0.5;
            let py = f64::from(y) + 0.5;
            let distance = ((px - center).powi(2) + (py - center).powi(2)).sqrt();
            if distance > outer {
                continue;
            }
            if distance > inner {
                image.put_pixel(x, y, rgba(mark.ring_color));
                continue;
            }
            let mut pixel = rgba(mark.fill);
            match &mark.emblem {
                Emblem::None => {}
                Emblem::Monogram(color) => {
                    if on_monogram(px - center, py - center, inner) {
                        pixel = rgba(*color);
                    }
                }
                Emblem::Logo(_) => {
                    if let Some(logo) = &logo {
                        let lx = (px - logo_origin).floor();
                        let ly = (py - logo_origin).floor();
                        if lx >= 0.0 && ly >= 0.0 && (lx as u32) < logo.width() && (ly as u32) < logo.height() {
                            pixel = blend(pixel, *logo.get_pixel(lx as u32, ly as u32));
                        }
                    }
                }
            }
            image.put_pixel(x, y, pixel);
        }
    }
}

/// Whether the offset `(dx, dy)` from the disk centre lies on the "A" strokes.
fn on_monogram(dx: f64, dy: f64, radius: f64) -> bool {
    let apex = (0.0, -0.55 * radius);
    let left = (-0.42 * radius, 0.5 * radius);
    let right = (0.42 * radius, 0.5 * radius);
    let bar_y = 0.15 * radius;
    let bar_half = 0.42 * (bar_y - apex.1) / (left.1 - apex.1) * radius;
    let half_width = 0.09 * radius;
    let point = (dx, dy);
    segment_distance(point, apex, left) <= half_width
        || segment_distance(point, apex, right) <= half_width
        || segment_distance(point, (-bar_half, bar_y), (bar_half, bar_y)) <= half_width * 0.8
}

fn segment_distance(point: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (abx, aby) = (b.0 - a.0, b.1 - a.1);
    let length = abx * abx + aby * aby;
    let t = if length == 0.0 {
        0.0
    } else {
        (((point.0 - a.0) * abx + (point.1 - a.1) * aby) / length).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.0 + t * abx, a.1 + t * aby);
    ((point.0 - cx).powi(2) + (point.1 - cy).powi(2)).sqrt()
}

fn blend(base: Rgba<u8>, over: Rgba<u8>) -> Rgba<u8> {
    let alpha = f64::from(over[3]) / 255.0;
    let mix = |b: u8, o: u8| (f64::from(o) * alpha + f64::from(b) * (1.0 - alpha)).round() as u8;
    Rgba([mix(base[0], over[0]), mix(base[1], over[1]), mix(base[2], over[2]), 255])
}

/// Contact details printed on a business card and encoded in its vCard.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactCard {
    pub name: String,
    pub title: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub instagram: String,
    pub location: String,
    pub tagline: String,
    pub photo_url: String,
}

/// Escapes a vCard text value: backslash, `;`, `,` and line breaks.
fn escape_text(value: &str) -> String {
    let value = value.trim();
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                escaped.push_str("\\n");
            }
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn without_whitespace(value: &str) -> String {
    value.chars().filter(|ch| !ch.is_whitespace()).collect()
}

/// vCard 3.0 payload for `contact`.
pub fn vcard(contact: &ContactCard) -> String {
    let website = without_whitespace(&contact.website);
    let url = if website.is_empty() || website.starts_with("http://") || website.starts_with("https://") {
        website
    } else {
        format!("https://{}", website)
    };
    [
        "BEGIN:VCARD".to_owned(),
        "VERSION:3.0".to_owned(),
        format!("FN:{}", escape_text(&contact.name)),
        format!("TITLE:{}", escape_text(&contact.title)),
        format!("TEL;TYPE=CELL:{}", without_whitespace(&contact.phone)),
        format!("EMAIL:{}", escape_text(&contact.email)),
        format!("URL:{}", url),
        format!("NOTE:{}", escape_text(&contact.tagline)),
        "END:VCARD".to_owned(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> ContactCard {
        ContactCard {
            name: "İlhan Arslan".into(),
            title: "Kurucu & Baş Danışman".into(),
            phone: "+90 539 233 11 474".into(),
            email: "info@arslanops.com".into(),
            website: "arslanops.com".into(),
            tagline: "Coffee & Restoran Operasyon Danışmanlığı".into(),
            ..ContactCard::default()
        }
    }

    #[test]
    fn vcard_fields() {
        let card = vcard(&contact());
        let lines: Vec<&str> = card.lines().collect();
        assert_eq!(lines.first(), Some(&"BEGIN:VCARD"));
        assert_eq!(lines.last(), Some(&"END:VCARD"));
        assert!(lines.contains(&"TEL;TYPE=CELL:+9053923311474"));
        assert!(lines.contains(&"URL:https://arslanops.com"));
        assert!(lines.contains(&"FN:İlhan Arslan"));
    }

    #[test]
    fn text_values_are_escaped() {
        let mut card = contact();
        card.tagline = "Kahve;\nRestoran, Danismanlik".into();
        card.title = "Kurucu\\Danisman\r\nOrtak".into();
        let payload = vcard(&card);
        let lines: Vec<&str> = payload.lines().collect();
        assert!(lines.contains(&r"NOTE:Kahve\;\nRestoran\, Danismanlik"));
        assert!(lines.contains(&r"TITLE:Kurucu\\Danisman\nOrtak"));
        assert_eq!(lines.len(), 9);
        assert!(lines[1..8].iter().all(|line| line.contains(':')));
    }

    #[test]
    fn existing_scheme_is_kept() {
        let mut card = contact();
        card.website = "http://example.com".into();
        assert!(vcard(&card).contains("URL:http://example.com\n"));
    }

    #[test]
    fn rendering_is_pure() {
        let payload = vcard(&contact());
        let first = render_code(&payload, &CodeStyle::default()).unwrap();
        let second = render_code(&payload, &CodeStyle::default()).unwrap();
        assert_eq!(first.png(), second.png());
        assert!(first.png().starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn mark_sits_at_the_centre_and_quiet_zone_is_light() {
        let style = CodeStyle::default().with_mark(BrandMark::default().with_emblem(Emblem::None));
        let code = render_code("https://arslanops.com", &style).unwrap();
        let side = code.side_px();
        assert!(side <= 600);
        assert_eq!(side % (code.modules() as u32 + 2), 0);
        assert_eq!(*code.image().get_pixel(side / 2, side / 2), rgba(Rgb::from_hex(0x0B1F3B)));
        assert_eq!(*code.image().get_pixel(0, 0), rgba(style.light));
        // Top-left finder pattern starts right after the quiet zone.
        let module = side / (code.modules() as u32 + 2);
        assert_eq!(*code.image().get_pixel(module, module), rgba(style.dark));
    }

    #[test]
    fn oversized_mark_is_rejected() {
        let mark = BrandMark {
            radius: 0.3,
            ..BrandMark::default()
        };
        let err = render_code("payload", &CodeStyle::default().with_mark(mark)).unwrap_err();
        assert!(matches!(err, CodeError::MarkTooLarge { .. }));
    }

    #[test]
    fn monogram_covers_the_apex_but_not_the_corners() {
        assert!(on_monogram(0.0, -0.5, 1.0));
        assert!(!on_monogram(0.8, -0.8, 1.0));
    }

    #[test]
    fn code_converts_to_an_image_asset() {
        let code = render_code("x", &CodeStyle::plain()).unwrap();
        assert!(code.to_asset().is_ready());
    }
}
