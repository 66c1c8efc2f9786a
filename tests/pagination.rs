use report_forge::builder::DocumentBuilder;
use report_forge::config::EngineConfig;
use report_forge::layout::LayoutError;
use report_forge::model::{Block, BulletList, Column, FreeTextBox, ScoreSummary, SectionHeader, Table, TitleBar};
use report_forge::Error;

fn long_table(rows: usize) -> Table {
    let mut table = Table::new(vec![Column::flex("Kalem", 2.0), Column::fixed("Tutar", 30.0)]);
    for index in 0..rows {
        table.push_row([format!("Satir {}", index + 1), format!("{}", (index + 1) * 100)]);
    }
    table
}

fn multi_page_builder() -> DocumentBuilder {
    DocumentBuilder::new(&EngineConfig::default())
        .push(TitleBar::new("Uzun Rapor").with_subtitle("Cafe Noir"))
        .push(SectionHeader::new("Kalemler"))
        .push(long_table(120))
        .push(SectionHeader::new("Notlar"))
        .push(BulletList::new(["Son madde"]))
}

#[test]
fn every_page_gets_exactly_one_footer_with_the_final_total() {
    let document = multi_page_builder().layout().unwrap();
    let total = document.page_count();
    assert!(total >= 3, "120 rows should span several pages, got {}", total);
    for page in document.pages() {
        assert_eq!(page.footer_bands(), 1);
        let counter = format!("Sayfa {} / {}", page.number(), total);
        assert_eq!(document.count_text(&counter), 1, "missing {:?}", counter);
    }
}

#[test]
fn nothing_crosses_the_content_bottom() {
    let document = multi_page_builder().layout().unwrap();
    let bottom = document.geometry().content_bottom();
    let top = document.geometry().top_margin_mm;
    for placement in document.placements() {
        assert!(placement.top >= top - 0.01, "{:?}", placement);
        assert!(placement.bottom <= bottom + 0.01, "{:?}", placement);
    }
}

#[test]
fn split_tables_repeat_their_header() {
    let document = multi_page_builder().layout().unwrap();
    let fragments = document.placements_of(2);
    assert!(fragments.len() >= 2);
    assert_eq!(document.count_text("Kalem"), fragments.len());
    assert_eq!(document.count_text("Satir 120"), 1);
}

#[test]
fn short_document_is_page_one_of_one() {
    let document = DocumentBuilder::new(&EngineConfig::default())
        .push(TitleBar::new("Kisa"))
        .layout()
        .unwrap();
    assert_eq!(document.page_count(), 1);
    assert_eq!(document.count_text("Sayfa 1 / 1"), 1);
}

#[test]
fn explicit_page_breaks_start_new_pages() {
    let document = DocumentBuilder::new(&EngineConfig::default())
        .push(TitleBar::new("Bir"))
        .push(Block::PageBreak)
        .push(Block::PageBreak)
        .push(TitleBar::new("Iki"))
        .layout()
        .unwrap();
    assert_eq!(document.page_count(), 2);
    assert_eq!(document.count_text("Sayfa 2 / 2"), 1);
}

#[test]
fn long_lists_continue_on_the_next_page() {
    let items: Vec<String> = (0..120).map(|index| format!("Madde {}", index + 1)).collect();
    let document = DocumentBuilder::new(&EngineConfig::default())
        .push(BulletList::new(items))
        .layout()
        .unwrap();
    assert!(document.page_count() >= 2);
    assert!(document.placements_of(0).len() >= 2);
    assert_eq!(document.count_text("Madde 1"), 1);
    assert_eq!(document.count_text("Madde 120"), 1);
    let bottom = document.geometry().content_bottom();
    assert!(document.placements().iter().all(|placement| placement.bottom <= bottom + 0.01));
}

#[test]
fn long_free_text_splits_into_boxed_segments() {
    let body = "Uzun bir degerlendirme paragrafi. ".repeat(600);
    let document = DocumentBuilder::new(&EngineConfig::default())
        .push(TitleBar::new("Rapor"))
        .push(FreeTextBox::new(body).with_title("Genel Degerlendirme"))
        .layout()
        .unwrap();
    let fragments = document.placements_of(1);
    assert!(fragments.len() >= 2, "got {} fragment(s)", fragments.len());
    assert_eq!(document.count_text("Genel Degerlendirme"), 1);
    let bottom = document.geometry().content_bottom();
    assert!(fragments.iter().all(|placement| placement.bottom <= bottom + 0.01));
}

#[test]
fn short_free_text_moves_whole_instead_of_splitting() {
    let filler = EngineConfig::default().page.content_height() - 10.0;
    let document = DocumentBuilder::new(&EngineConfig::default())
        .push(Block::Spacer(filler))
        .push(FreeTextBox::new("Kisa not. ".repeat(20)))
        .layout()
        .unwrap();
    let fragments = document.placements_of(1);
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].page, 2);
}

#[test]
fn oversized_unsplittable_block_fails() {
    let summary = (0..50).fold(ScoreSummary::new(70, "Iyi"), |summary, index| {
        summary.entry(format!("Kategori {}", index), 7.0)
    });
    let result = DocumentBuilder::new(&EngineConfig::default()).push(summary).layout();
    assert!(
        matches!(
            result,
            Err(Error::Layout(LayoutError::BlockTooTall { kind: "score summary", .. }))
        ),
        "expected BlockTooTall, got {:?}",
        result.map(|document| document.page_count())
    );
}
