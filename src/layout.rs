//! Pagination of a block stream onto fixed-size pages.
//!
//! The [`LayoutEngine`] runs in two phases. While building, each pushed
//! [`Block`] is measured, moved to a fresh page when it would cross the bottom
//! of the content area, and drawn into the current page's display list.
//! [`LayoutEngine::finalize`] then stamps one footer band per page, which is
//! the only point where the total page count is known.

use log::debug;
use thiserror::Error;

use crate::canvas::{DrawOp, Page, Stroke};
use crate::color::Rgb;
use crate::config::{BrandConfig, PageConfig, Palette};
use crate::elements::RenderContext;
use crate::fonts::FontSet;
use crate::model::Block;
use crate::text::single_line;

/// Space below the content area reserved for the footer band.
pub const FOOTER_BAND_MM: f64 = 16.0;

const EPSILON: f64 = 0.01;

/// Lifecycle of a [`LayoutEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Building,
    Finalizing,
    Done,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("{kind} is {height:.1} mm tall but a page holds only {available:.1} mm")]
    BlockTooTall {
        kind: &'static str,
        height: f64,
        available: f64,
    },
    #[error("{kind} measured {measured:.2} mm but drew {drawn:.2} mm")]
    MeasureDrift {
        kind: &'static str,
        measured: f64,
        drawn: f64,
    },
    #[error("cannot {operation} while the layout engine is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: EngineState,
    },
    #[error("footer band needs {required:.1} mm below the content area, only {available:.1} mm reserved")]
    FooterOverlap { required: f64, available: f64 },
    #[error("page geometry leaves no room for content")]
    NoContentArea,
}

/// Where one fragment of a block landed.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// Index of the block in push order.
    pub block: usize,
    pub kind: &'static str,
    /// 1-based page number.
    pub page: usize,
    pub top: f64,
    pub bottom: f64,
}

struct OpenFragment {
    block: usize,
    kind: &'static str,
    top: f64,
}

/// Cursor over the pages being filled.
pub(crate) struct Flow {
    geometry: PageConfig,
    pages: Vec<Page>,
    cursor: f64,
    placements: Vec<Placement>,
    open: Option<OpenFragment>,
}

impl Flow {
    fn new(geometry: PageConfig) -> Self {
        Self {
            geometry,
            pages: Vec::new(),
            cursor: geometry.top_margin_mm,
            placements: Vec::new(),
            open: None,
        }
    }

    pub(crate) fn left(&self) -> f64 {
        self.geometry.side_margin_mm
    }

    pub(crate) fn width(&self) -> f64 {
        self.geometry.content_width()
    }

    pub(crate) fn cursor(&self) -> f64 {
        self.cursor
    }

    /// Space left on the current page.
    pub(crate) fn remaining(&self) -> f64 {
        self.geometry.content_bottom() - self.cursor
    }

    /// Height of an empty page's content area.
    pub(crate) fn capacity(&self) -> f64 {
        self.geometry.content_height()
    }

    pub(crate) fn at_page_top(&self) -> bool {
        (self.cursor - self.geometry.top_margin_mm).abs() < EPSILON
    }

    /// True while nothing has been drawn on the current page.
    pub(crate) fn page_is_blank(&self) -> bool {
        self.at_page_top() && self.pages.last().map_or(true, Page::is_empty)
    }

    pub(crate) fn draw(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.push(op);
        }
    }

    pub(crate) fn advance(&mut self, height: f64) {
        self.cursor += height.max(0.0);
    }

    pub(crate) fn new_page(&mut self) {
        let reopen = self.close_fragment();
        let number = self.pages.len() + 1;
        self.pages.push(Page::new(number));
        self.cursor = self.geometry.top_margin_mm;
        debug!("opened page {}", number);
        if let Some((block, kind)) = reopen {
            self.open_fragment(block, kind);
        }
    }

    fn open_fragment(&mut self, block: usize, kind: &'static str) {
        self.open = Some(OpenFragment {
            block,
            kind,
            top: self.cursor,
        });
    }

    fn close_fragment(&mut self) -> Option<(usize, &'static str)> {
        let open = self.open.take()?;
        self.placements.push(Placement {
            block: open.block,
            kind: open.kind,
            page: self.pages.len(),
            top: open.top,
            bottom: self.cursor,
        });
        Some((open.block, open.kind))
    }
}

/// Texts of the footer band stamped on every page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FooterSpec {
    pub contact: String,
    pub notice: String,
    /// Word before the `i / total` counter, e.g. `Sayfa`.
    pub page_label: String,
}

impl FooterSpec {
    pub fn new(contact: impl Into<String>, notice: impl Into<String>) -> Self {
        Self {
            contact: contact.into(),
            notice: notice.into(),
            page_label: String::new(),
        }
    }

    pub fn with_page_label(mut self, label: impl Into<String>) -> Self {
        self.page_label = label.into();
        self
    }

    pub fn from_brand(brand: &BrandConfig) -> Self {
        Self::new(brand.contact_line(), brand.confidentiality_notice.clone())
            .with_page_label(brand.page_label.clone())
    }

    /// Counter text for page `index` of `total`.
    pub fn counter(&self, index: usize, total: usize) -> String {
        if self.page_label.trim().is_empty() {
            format!("{} / {}", index, total)
        } else {
            format!("{} {} / {}", self.page_label.trim(), index, total)
        }
    }
}

/// Finished pages plus the position of every block fragment.
#[derive(Clone, Debug)]
pub struct LaidOutDocument {
    pages: Vec<Page>,
    placements: Vec<Placement>,
    geometry: PageConfig,
}

impl LaidOutDocument {
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Placements of the block pushed at `index`, one per page it touches.
    pub fn placements_of(&self, index: usize) -> Vec<&Placement> {
        self.placements.iter().filter(|p| p.block == index).collect()
    }

    pub fn geometry(&self) -> &PageConfig {
        &self.geometry
    }

    pub fn image_count(&self) -> usize {
        self.pages.iter().map(Page::image_count).sum()
    }

    /// Number of text runs equal to `text` across all pages.
    pub fn count_text(&self, text: &str) -> usize {
        self.pages
            .iter()
            .flat_map(|page| page.texts())
            .filter(|run| *run == text)
            .count()
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.pages
            .iter()
            .flat_map(|page| page.texts())
            .any(|run| run.contains(needle))
    }
}

pub struct LayoutEngine<'a> {
    fonts: &'a FontSet,
    palette: Palette,
    geometry: PageConfig,
    state: EngineState,
    flow: Flow,
    pushed: usize,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(fonts: &'a FontSet, palette: Palette, geometry: PageConfig) -> Result<Self, LayoutError> {
        if geometry.content_height() <= 0.0 || geometry.content_width() <= 0.0 {
            return Err(LayoutError::NoContentArea);
        }
        if geometry.bottom_margin_mm < FOOTER_BAND_MM {
            return Err(LayoutError::FooterOverlap {
                required: FOOTER_BAND_MM,
                available: geometry.bottom_margin_mm,
            });
        }
        Ok(Self {
            fonts,
            palette,
            geometry,
            state: EngineState::Idle,
            flow: Flow::new(geometry),
            pushed: 0,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Opens the first page.
    pub fn begin(&mut self) -> Result<(), LayoutError> {
        self.expect_state("begin", EngineState::Idle)?;
        self.flow.new_page();
        self.state = EngineState::Building;
        Ok(())
    }

    /// Lays out one block, moving to a new page first when it does not fit.
    pub fn push(&mut self, block: &Block) -> Result<(), LayoutError> {
        self.expect_state("push", EngineState::Building)?;
        let index = self.pushed;
        self.pushed += 1;

        let ctx = RenderContext {
            fonts: self.fonts,
            palette: &self.palette,
            page: &self.geometry,
        };
        let flow = &mut self.flow;

        match block {
            Block::PageBreak => {
                if !flow.page_is_blank() {
                    flow.new_page();
                }
                return Ok(());
            }
            Block::Spacer(_) => {
                flow.open_fragment(index, block.kind());
                block.render(&ctx, flow)?;
                flow.close_fragment();
                return Ok(());
            }
            _ => {}
        }

        if block.is_splittable() {
            flow.open_fragment(index, block.kind());
            block.render(&ctx, flow)?;
            flow.close_fragment();
        } else {
            let height = block.measure(&ctx, flow.width());
            let capacity = flow.capacity();
            if height > capacity + EPSILON {
                return Err(LayoutError::BlockTooTall {
                    kind: block.kind(),
                    height,
                    available: capacity,
                });
            }
            let keep = block.keep_with_next().min(capacity - height);
            if height + keep > flow.remaining() + EPSILON && !flow.page_is_blank() {
                flow.new_page();
            }
            let top = flow.cursor();
            flow.open_fragment(index, block.kind());
            block.render(&ctx, flow)?;
            flow.close_fragment();
            let drawn = flow.cursor() - top;
            if (drawn - height).abs() > EPSILON {
                return Err(LayoutError::MeasureDrift {
                    kind: block.kind(),
                    measured: height,
                    drawn,
                });
            }
        }

        if flow.remaining() > 0.0 {
            let gap = self.geometry.block_spacing_mm.min(flow.remaining());
            flow.advance(gap);
        }
        Ok(())
    }

    /// Stamps the footer band on every page; callable once.
    pub fn finalize(&mut self, footer: &FooterSpec) -> Result<(), LayoutError> {
        self.expect_state("finalize", EngineState::Building)?;
        self.state = EngineState::Finalizing;

        let total = self.flow.pages.len();
        for index in 0..total {
            let ops = self.footer_ops(footer, index + 1, total);
            let page = &mut self.flow.pages[index];
            if page.footer_bands() > 0 {
                return Err(LayoutError::InvalidState {
                    operation: "stamp a second footer",
                    state: self.state,
                });
            }
            page.stamp_footer(ops);
        }
        debug!("finalized {} page(s)", total);
        self.state = EngineState::Done;
        Ok(())
    }

    /// Hands out the finished document.
    pub fn into_document(self) -> Result<LaidOutDocument, LayoutError> {
        if self.state != EngineState::Done {
            return Err(LayoutError::InvalidState {
                operation: "take the document",
                state: self.state,
            });
        }
        Ok(LaidOutDocument {
            pages: self.flow.pages,
            placements: self.flow.placements,
            geometry: self.geometry,
        })
    }

    fn expect_state(&self, operation: &'static str, expected: EngineState) -> Result<(), LayoutError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(LayoutError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn footer_ops(&self, footer: &FooterSpec, index: usize, total: usize) -> Vec<DrawOp> {
        let page = &self.geometry;
        let left = page.side_margin_mm;
        let right = page.width_mm - page.side_margin_mm;
        let width = page.content_width();
        let rule_y = page.height_mm - 15.0;
        let line_baseline = page.height_mm - 10.0;
        let notice_baseline = page.height_mm - 6.0;
        let gray = self.palette.text_gray;

        let counter = self.fonts.prepare(&footer.counter(index, total)).into_owned();
        let counter_width = self.fonts.text_width(&counter, 7, false);
        let contact = single_line(self.fonts, &footer.contact, 7, false, (width - counter_width - 4.0).max(0.0));
        let notice = single_line(self.fonts, &footer.notice, 6, false, width);

        let mut ops = vec![DrawOp::Line {
            from: (left, rule_y),
            to: (right, rule_y),
            stroke: Stroke::new(self.palette.accent, 0.5),
        }];
        if !contact.is_empty() {
            ops.push(text_op(left, line_baseline, contact, 7, gray));
        }
        ops.push(text_op(right - counter_width, line_baseline, counter, 7, gray));
        if !notice.is_empty() {
            let x = left + (width - self.fonts.text_width(&notice, 6, false)) / 2.0;
            ops.push(text_op(x, notice_baseline, notice, 6, gray));
        }
        ops
    }
}

fn text_op(x: f64, baseline: f64, text: String, size: u8, color: Rgb) -> DrawOp {
    DrawOp::Text {
        x,
        baseline,
        text,
        size,
        bold: false,
        color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FreeTextBox, SectionHeader};

    fn engine(fonts: &FontSet) -> LayoutEngine<'_> {
        LayoutEngine::new(fonts, Palette::default(), PageConfig::default()).unwrap()
    }

    #[test]
    fn push_before_begin_is_rejected() {
        let fonts = FontSet::builtin();
        let mut engine = engine(&fonts);
        let err = engine.push(&Block::PageBreak).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidState { operation: "push", .. }));
    }

    #[test]
    fn finalize_twice_is_rejected() {
        let fonts = FontSet::builtin();
        let mut engine = engine(&fonts);
        engine.begin().unwrap();
        engine.finalize(&FooterSpec::default()).unwrap();
        assert!(engine.finalize(&FooterSpec::default()).is_err());
        assert_eq!(engine.state(), EngineState::Done);
    }

    #[test]
    fn document_is_only_available_when_done() {
        let fonts = FontSet::builtin();
        let mut engine = engine(&fonts);
        engine.begin().unwrap();
        assert!(LayoutEngine::into_document(engine).is_err());
    }

    #[test]
    fn empty_document_still_has_one_footed_page() {
        let fonts = FontSet::builtin();
        let mut engine = engine(&fonts);
        engine.begin().unwrap();
        engine.finalize(&FooterSpec::new("ArslanOps", "Gizli").with_page_label("Sayfa")).unwrap();
        let document = engine.into_document().unwrap();
        assert_eq!(document.page_count(), 1);
        assert_eq!(document.pages()[0].footer_bands(), 1);
        assert!(document.contains_text("Sayfa 1 / 1"));
    }

    #[test]
    fn leading_page_break_does_not_add_a_page() {
        let fonts = FontSet::builtin();
        let mut engine = engine(&fonts);
        engine.begin().unwrap();
        engine.push(&Block::PageBreak).unwrap();
        engine.push(&FreeTextBox::new("metin").into()).unwrap();
        engine.push(&Block::PageBreak).unwrap();
        engine.push(&FreeTextBox::new("metin").into()).unwrap();
        engine.finalize(&FooterSpec::default()).unwrap();
        assert_eq!(engine.into_document().unwrap().page_count(), 2);
    }

    #[test]
    fn section_header_moves_with_following_content() {
        let fonts = FontSet::builtin();
        let mut engine = engine(&fonts);
        engine.begin().unwrap();
        // Leave less than header plus keep-with-next space on page one.
        let filler = PageConfig::default().content_height() - 4.0 - 20.0;
        engine.push(&Block::Spacer(filler)).unwrap();
        engine.push(&SectionHeader::new("Bulgular").into()).unwrap();
        engine.finalize(&FooterSpec::default()).unwrap();
        let document = engine.into_document().unwrap();
        assert_eq!(document.page_count(), 2);
        assert_eq!(document.placements_of(1)[0].page, 2);
    }

    #[test]
    fn tight_bottom_margin_is_rejected() {
        let fonts = FontSet::builtin();
        let geometry = PageConfig {
            bottom_margin_mm: 10.0,
            ..PageConfig::default()
        };
        let err = LayoutEngine::new(&fonts, Palette::default(), geometry).err();
        assert!(matches!(err, Some(LayoutError::FooterOverlap { .. })));
    }

    #[test]
    fn counter_without_label() {
        assert_eq!(FooterSpec::default().counter(2, 5), "2 / 5");
        assert_eq!(FooterSpec::default().with_page_label("Sayfa").counter(1, 1), "Sayfa 1 / 1");
    }
}
