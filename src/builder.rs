//! Document construction on top of the layout engine and the PDF writer.

use log::debug;

use crate::config::{EngineConfig, PageConfig, Palette};
use crate::fonts::FontSet;
use crate::layout::{FooterSpec, LaidOutDocument, LayoutEngine};
use crate::model::Block;
use crate::pdf;
use crate::Result;

/// Collects blocks for one PDF document and renders them in a single pass.
pub struct DocumentBuilder {
    title: String,
    palette: Palette,
    page: PageConfig,
    footer: FooterSpec,
    fonts: FontSet,
    blocks: Vec<Block>,
}

/// Output of [`DocumentBuilder::render`].
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub layout: LaidOutDocument,
}

impl DocumentBuilder {
    /// Creates a builder using the configured palette, geometry and brand footer.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            title: config.brand.name.clone(),
            palette: config.palette,
            page: config.page,
            footer: FooterSpec::from_brand(&config.brand),
            fonts: FontSet::builtin(),
            blocks: Vec::new(),
        }
    }

    pub fn with_fonts(mut self, fonts: FontSet) -> Self {
        self.fonts = fonts;
        self
    }

    /// Sets the PDF document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_footer(mut self, footer: FooterSpec) -> Self {
        self.footer = footer;
        self
    }

    /// Appends a block.
    pub fn push(mut self, block: impl Into<Block>) -> Self {
        self.add(block);
        self
    }

    pub fn add(&mut self, block: impl Into<Block>) {
        self.blocks.push(block.into());
    }

    pub fn extend(&mut self, blocks: impl IntoIterator<Item = Block>) {
        self.blocks.extend(blocks);
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    /// Paginates the collected blocks without producing PDF bytes.
    pub fn layout(&self) -> Result<LaidOutDocument> {
        let mut engine = LayoutEngine::new(&self.fonts, self.palette, self.page)?;
        engine.begin()?;
        for block in &self.blocks {
            engine.push(block)?;
        }
        engine.finalize(&self.footer)?;
        let document = engine.into_document()?;
        debug!(
            "laid out {} block(s) onto {} page(s)",
            self.blocks.len(),
            document.page_count()
        );
        Ok(document)
    }

    /// Lays out and serialises the document.
    pub fn render(self) -> Result<RenderedDocument> {
        let layout = self.layout()?;
        let bytes = pdf::write_pdf(&layout, &self.fonts, &self.title)?;
        Ok(RenderedDocument { bytes, layout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BulletList, SectionHeader, TitleBar};

    #[test]
    fn renders_a_pdf_header() {
        let rendered = DocumentBuilder::new(&EngineConfig::default())
            .with_title("Deneme")
            .push(TitleBar::new("Durum Özeti"))
            .push(SectionHeader::new("Bulgular"))
            .push(BulletList::new(["Soğuk oda etiketleri eksik"]))
            .render()
            .unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert_eq!(rendered.layout.page_count(), 1);
    }

    #[test]
    fn layout_is_repeatable() {
        let builder = DocumentBuilder::new(&EngineConfig::default())
            .push(TitleBar::new("A"))
            .push(Block::PageBreak)
            .push(SectionHeader::new("B"));
        let first = builder.layout().unwrap();
        let second = builder.layout().unwrap();
        assert_eq!(first.page_count(), 2);
        assert_eq!(first.placements(), second.placements());
    }
}
