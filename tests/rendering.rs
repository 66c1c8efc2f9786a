use report_forge::builder::DocumentBuilder;
use report_forge::config::EngineConfig;
use report_forge::model::{Block, BulletList, Column, InfoGrid, ScoreSummary, SectionHeader, Table, TitleBar};
use sha2::{Digest, Sha256};

fn sample_builder() -> DocumentBuilder {
    let mut table = Table::new(vec![Column::flex("Hafta", 1.0), Column::fixed("Ciro", 40.0)]);
    for week in 1..=4 {
        table.push_row([format!("{}. Hafta", week), format!("{}", week * 10_000)]);
    }
    DocumentBuilder::new(&EngineConfig::default())
        .with_title("Deterministic sample")
        .push(TitleBar::new("Durum Ozeti").with_subtitle("Cafe Noir"))
        .push(
            InfoGrid::new()
                .with_heading("Isletme")
                .entry("Konum", "Kadikoy")
                .entry("Kapasite", "60"),
        )
        .push(ScoreSummary::new(70, "Genel Skor").entry("Hijyen", 8.0).entry("Servis", 6.0))
        .push(SectionHeader::new("Bulgular"))
        .push(BulletList::new(["Etiketler eksik", "Soguk oda duzenli"]))
        .push(table)
        .push(Block::PageBreak)
        .push(SectionHeader::new("Ek"))
}

fn render_sample_pdf() -> Vec<u8> {
    sample_builder().render().expect("render sample pdf").bytes
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            if let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            {
                let start_index = offset + start_pos + start.len();
                if let Some(end_pos) = data[start_index..]
                    .windows(end.len())
                    .position(|window| window == end)
                {
                    for byte in &mut data[start_index..start_index + end_pos] {
                        if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                            *byte = b'0';
                        }
                    }
                    offset = start_index + end_pos + end.len();
                } else {
                    break;
                }
            } else {
                break;
            }
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    scrub_segment(&mut normalized, b"/Producer(", b')');
    scrub_xml(&mut normalized, b"<xmp:CreateDate>", b"</xmp:CreateDate>");
    scrub_xml(&mut normalized, b"<xmp:ModifyDate>", b"</xmp:ModifyDate>");
    scrub_xml(
        &mut normalized,
        b"<xmp:MetadataDate>",
        b"</xmp:MetadataDate>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:DocumentID>",
        b"</xmpMM:DocumentID>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:InstanceID>",
        b"</xmpMM:InstanceID>",
    );
    scrub_xml(&mut normalized, b"<xmpMM:VersionID>", b"</xmpMM:VersionID>");
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let normalized = scrub_pdf(bytes);
    let digest = Sha256::digest(&normalized);
    digest.into()
}

#[test]
fn renders_non_empty_output() {
    let bytes = render_sample_pdf();
    assert!(bytes.starts_with(b"%PDF"), "rendered PDF should start with a header");
}

#[test]
fn rendering_is_deterministic() {
    let bytes_a = render_sample_pdf();
    let bytes_b = render_sample_pdf();

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn serialized_page_count_matches_the_layout() {
    let rendered = sample_builder().render().unwrap();
    let parsed = lopdf::Document::load_mem(&rendered.bytes).expect("output parses as PDF");
    assert_eq!(rendered.layout.page_count(), 2);
    assert_eq!(parsed.get_pages().len(), rendered.layout.page_count());
}
