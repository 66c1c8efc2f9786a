//! Serialises laid out pages with `printpdf`.
//!
//! Every [`DrawOp`] maps onto one or a few layer operations. Layout works in
//! millimetres from the top-left corner; PDF user space starts bottom-left, so
//! every y coordinate is flipped against the page height here and nowhere else.

use std::f64::consts::PI;
use std::io::{BufWriter, Cursor};

use log::debug;
use printpdf::{
    BuiltinFont, Color, Image, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};

use crate::canvas::{DrawOp, Page};
use crate::color::Rgb;
use crate::fonts::FontSet;
use crate::layout::LaidOutDocument;
use crate::{Error, Result};

/// Resolution images are placed at before scaling to their target box.
const IMAGE_DPI: f64 = 300.0;
const CIRCLE_SEGMENTS: usize = 64;

struct PdfFonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl PdfFonts {
    fn load(doc: &PdfDocumentReference, fonts: &FontSet) -> Result<Self> {
        let pdf_err = |err: printpdf::Error| Error::Pdf(err.to_string());
        match fonts.embedded_data() {
            Some((regular, bold)) => Ok(Self {
                regular: doc.add_external_font(Cursor::new(regular)).map_err(pdf_err)?,
                bold: doc.add_external_font(Cursor::new(bold)).map_err(pdf_err)?,
            }),
            None => Ok(Self {
                regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?,
                bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?,
            }),
        }
    }

    fn get(&self, bold: bool) -> &IndirectFontRef {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }
}

fn pdf_color(color: Rgb) -> Color {
    let (r, g, b) = color.to_unit();
    Color::Rgb(printpdf::Rgb::new(r, g, b, None))
}

/// Writes `document` as PDF bytes titled `title`.
pub fn write_pdf(document: &LaidOutDocument, fonts: &FontSet, title: &str) -> Result<Vec<u8>> {
    let geometry = document.geometry();
    let width = Mm(geometry.width_mm);
    let height = Mm(geometry.height_mm);
    let (doc, first_page, first_layer) = PdfDocument::new(title, width, height, "Layer 1");
    let pdf_fonts = PdfFonts::load(&doc, fonts)?;

    for (index, page) in document.pages().iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(width, height, "Layer 1")
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);
        let painter = Painter {
            layer,
            fonts: &pdf_fonts,
            page_height: geometry.height_mm,
        };
        painter.paint(page);
    }

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer)
        .map_err(|err| Error::Pdf(err.to_string()))?;
    let bytes = writer
        .into_inner()
        .map_err(|err| Error::Pdf(err.to_string()))?;
    debug!(
        "wrote {} page(s), {} bytes",
        document.page_count(),
        bytes.len()
    );
    Ok(bytes)
}

struct Painter<'a> {
    layer: PdfLayerReference,
    fonts: &'a PdfFonts,
    page_height: f64,
}

impl Painter<'_> {
    fn point(&self, x: f64, y: f64) -> (Point, bool) {
        (Point::new(Mm(x), Mm(self.page_height - y)), false)
    }

    fn paint(&self, page: &Page) {
        for op in page.ops() {
            self.paint_op(op);
        }
    }

    fn paint_op(&self, op: &DrawOp) {
        match op {
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                fill,
                stroke,
            } => {
                if let Some(fill) = fill {
                    self.layer.set_fill_color(pdf_color(*fill));
                }
                if let Some(stroke) = stroke {
                    self.layer.set_outline_color(pdf_color(stroke.color));
                    self.layer.set_outline_thickness(stroke.width);
                }
                self.layer.add_shape(Line {
                    points: vec![
                        self.point(*x, *y),
                        self.point(x + width, *y),
                        self.point(x + width, y + height),
                        self.point(*x, y + height),
                    ],
                    is_closed: true,
                    has_fill: fill.is_some(),
                    has_stroke: stroke.is_some(),
                    is_clipping_path: false,
                });
            }
            DrawOp::Line { from, to, stroke } => {
                self.layer.set_outline_color(pdf_color(stroke.color));
                self.layer.set_outline_thickness(stroke.width);
                self.layer.add_shape(Line {
                    points: vec![self.point(from.0, from.1), self.point(to.0, to.1)],
                    is_closed: false,
                    has_fill: false,
                    has_stroke: true,
                    is_clipping_path: false,
                });
            }
            DrawOp::Circle {
                cx,
                cy,
                radius,
                fill,
            } => {
                self.layer.set_fill_color(pdf_color(*fill));
                let points = (0..CIRCLE_SEGMENTS)
                    .map(|step| {
                        let angle = 2.0 * PI * step as f64 / CIRCLE_SEGMENTS as f64;
                        self.point(cx + radius * angle.cos(), cy + radius * angle.sin())
                    })
                    .collect();
                self.layer.add_shape(Line {
                    points,
                    is_closed: true,
                    has_fill: true,
                    has_stroke: false,
                    is_clipping_path: false,
                });
            }
            DrawOp::Text {
                x,
                baseline,
                text,
                size,
                bold,
                color,
            } => {
                if text.is_empty() {
                    return;
                }
                self.layer.set_fill_color(pdf_color(*color));
                self.layer.use_text(
                    text.as_str(),
                    f64::from(*size),
                    Mm(*x),
                    Mm(self.page_height - baseline),
                    self.fonts.get(*bold),
                );
            }
            DrawOp::Image {
                x,
                y,
                width,
                height,
                image,
            } => {
                let (px_width, px_height) = image.dimensions();
                if px_width == 0 || px_height == 0 {
                    return;
                }
                let natural_width = f64::from(px_width) * 25.4 / IMAGE_DPI;
                let natural_height = f64::from(px_height) * 25.4 / IMAGE_DPI;
                Image::from_dynamic_image(image.dynamic()).add_to_layer(
                    self.layer.clone(),
                    Some(Mm(*x)),
                    Some(Mm(self.page_height - y - height)),
                    None,
                    Some(width / natural_width),
                    Some(height / natural_height),
                    Some(IMAGE_DPI),
                );
            }
        }
    }
}
