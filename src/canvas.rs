//! Page display lists.
//!
//! Layout never talks to the PDF writer directly: blocks append [`DrawOp`]s to
//! the current [`Page`], and [`crate::pdf`] replays them once the document is
//! complete. Coordinates are millimetres from the top-left page corner.

use std::sync::Arc;

use crate::assets::EmbeddedImage;
use crate::color::Rgb;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width: f64,
}

impl Stroke {
    pub fn new(color: Rgb, width: f64) -> Self {
        Self { color, width }
    }
}

#[derive(Clone, Debug)]
pub enum DrawOp {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Rgb>,
        stroke: Option<Stroke>,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
        stroke: Stroke,
    },
    Circle {
        cx: f64,
        cy: f64,
        radius: f64,
        fill: Rgb,
    },
    /// Single line of already prepared text; `x` is the left edge.
    Text {
        x: f64,
        baseline: f64,
        text: String,
        size: u8,
        bold: bool,
        color: Rgb,
    },
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        image: Arc<EmbeddedImage>,
    },
}

impl DrawOp {
    /// Vertical extent `(top, bottom)` of the operation.
    pub fn vertical_span(&self) -> (f64, f64) {
        match self {
            DrawOp::Rect { y, height, .. } | DrawOp::Image { y, height, .. } => (*y, y + height),
            DrawOp::Line { from, to, .. } => (from.1.min(to.1), from.1.max(to.1)),
            DrawOp::Circle { cy, radius, .. } => (cy - radius, cy + radius),
            DrawOp::Text { baseline, size, .. } => {
                (baseline - f64::from(*size) * crate::fonts::PT_TO_MM * 0.8, *baseline)
            }
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            DrawOp::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// One finalized or in-progress page.
#[derive(Clone, Debug, Default)]
pub struct Page {
    number: usize,
    content: Vec<DrawOp>,
    footer: Vec<DrawOp>,
    footer_bands: usize,
}

impl Page {
    pub(crate) fn new(number: usize) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    /// 1-based page number.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn content(&self) -> &[DrawOp] {
        &self.content
    }

    pub fn footer(&self) -> &[DrawOp] {
        &self.footer
    }

    /// Number of footer bands stamped onto this page.
    pub fn footer_bands(&self) -> usize {
        self.footer_bands
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Content and footer operations in paint order.
    pub fn ops(&self) -> impl Iterator<Item = &DrawOp> {
        self.content.iter().chain(self.footer.iter())
    }

    /// Every text run on the page, footer included.
    pub fn texts(&self) -> Vec<&str> {
        self.ops().filter_map(DrawOp::text).collect()
    }

    pub fn image_count(&self) -> usize {
        self.content
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count()
    }

    pub(crate) fn push(&mut self, op: DrawOp) {
        self.content.push(op);
    }

    pub(crate) fn stamp_footer(&mut self, ops: Vec<DrawOp>) {
        self.footer.extend(ops);
        self.footer_bands += 1;
    }
}
