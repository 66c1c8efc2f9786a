//! Business status summary ("Durum Özeti") PDF.

use serde::{Deserialize, Serialize};

use crate::assets::ImageAsset;
use crate::model::{Block, GridImage, ImageGrid, InfoGrid, ScoreBand, ScoreSummary, SectionHeader, TitleBar};

use super::{bullet_section, display_date, numbered_section, or_dash, text_section, ReportContext};

pub const REPORT_TYPE: &str = "DurumOzeti";
pub const TITLE: &str = "İşletme Durum Özeti";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoRef {
    pub url: String,
    pub caption: String,
}

/// Category scores on a 0–10 scale.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryScores {
    #[serde(alias = "skor_maliyet")]
    pub cost: f64,
    #[serde(alias = "skor_stok")]
    pub stock: f64,
    #[serde(alias = "skor_operasyon")]
    pub operations: f64,
    #[serde(alias = "skor_personel")]
    pub staff: f64,
    #[serde(alias = "skor_hijyen")]
    pub hygiene: f64,
    #[serde(alias = "skor_musteri")]
    pub customer: f64,
}

impl CategoryScores {
    pub fn uniform(score: f64) -> Self {
        Self {
            cost: score,
            stock: score,
            operations: score,
            staff: score,
            hygiene: score,
            customer: score,
        }
    }

    pub fn labelled(&self) -> [(&'static str, f64); 6] {
        [
            ("Maliyet Kontrolü", self.cost),
            ("Stok Yönetimi", self.stock),
            ("Operasyon", self.operations),
            ("Personel", self.staff),
            ("Hijyen & Kalite", self.hygiene),
            ("Müşteri Deneyimi", self.customer),
        ]
    }

    /// `round(average * 10)` on a 0–100 scale.
    pub fn overall(&self) -> u32 {
        let scores = self.labelled();
        let average = scores.iter().map(|(_, score)| score.clamp(0.0, 10.0)).sum::<f64>() / scores.len() as f64;
        (average * 10.0).round() as u32
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusReport {
    #[serde(alias = "isletme_adi")]
    pub business_name: String,
    #[serde(alias = "isletme_turu")]
    pub business_type: String,
    #[serde(alias = "konum")]
    pub location: String,
    #[serde(alias = "kapasite")]
    pub capacity: String,
    #[serde(alias = "personel_sayisi")]
    pub staff_count: String,
    #[serde(alias = "isletme_sahibi")]
    pub owner: String,
    #[serde(alias = "ziyaret_tarihi")]
    pub visit_date: String,
    #[serde(alias = "gozlem_suresi")]
    pub observation_time: String,
    #[serde(alias = "danisman_adi")]
    pub consultant: String,
    #[serde(flatten)]
    pub scores: CategoryScores,
    #[serde(alias = "mevcut_cogs")]
    pub current_cogs: String,
    #[serde(alias = "hedef_cogs")]
    pub target_cogs: String,
    #[serde(alias = "fire_orani")]
    pub waste_rate: String,
    #[serde(alias = "personel_maliyet")]
    pub staff_cost: String,
    #[serde(alias = "guclu_yanlar")]
    pub strengths: Vec<String>,
    #[serde(alias = "kritik_tespitler")]
    pub findings: Vec<String>,
    #[serde(alias = "oneriler")]
    pub recommendations: Vec<String>,
    #[serde(alias = "sonraki_adimlar")]
    pub next_steps: Vec<String>,
    #[serde(alias = "genel_degerlendirme")]
    pub assessment: String,
    pub photos: Vec<PhotoRef>,
}

fn verdict(overall: u32) -> &'static str {
    match ScoreBand::of(f64::from(overall) / 10.0) {
        ScoreBand::Strong => "Güçlü performans",
        ScoreBand::Good => "İyi, geliştirilebilir alanlar var",
        ScoreBand::Fair => "Orta, iyileştirme gerekli",
        ScoreBand::Weak => "Kritik, acil müdahale gerekli",
    }
}

/// Blocks of the report. `photos` holds the resolved images of
/// [`StatusReport::photos`] in the same order.
pub fn blocks(data: &StatusReport, context: &ReportContext<'_>, photos: Vec<ImageAsset>) -> Vec<Block> {
    let palette = context.palette;
    let visit_date = display_date(&data.visit_date);
    let overall = data.scores.overall();

    let mut blocks: Vec<Block> = vec![
        TitleBar::new(TITLE)
            .with_subtitle(or_dash(&data.business_name))
            .with_meta(format!("Ziyaret: {}  |  Rapor: {}", or_dash(&visit_date), context.date_label()))
            .into(),
        InfoGrid::new()
            .with_heading("İşletme Bilgileri")
            .with_columns(4)
            .entry("İşletme Türü", or_dash(&data.business_type))
            .entry("Konum", or_dash(&data.location))
            .entry("Kapasite", or_dash(&data.capacity))
            .entry("Personel", or_dash(&data.staff_count))
            .entry("İşletme Sahibi", or_dash(&data.owner))
            .entry("Gözlem Süresi", or_dash(&data.observation_time))
            .entry("Danışman", or_dash(&data.consultant))
            .entry("Mevcut COGS", or_dash(&data.current_cogs))
            .entry("Hedef COGS", or_dash(&data.target_cogs))
            .entry("Fire Oranı", or_dash(&data.waste_rate))
            .entry("Personel Maliyeti", or_dash(&data.staff_cost))
            .entry("Genel Skor", format!("{} / 100", overall))
            .into(),
    ];

    let summary = data
        .scores
        .labelled()
        .into_iter()
        .fold(ScoreSummary::new(overall, verdict(overall)), |summary, (label, score)| {
            summary.entry(label, score)
        });
    blocks.push(summary.into());

    blocks.extend(bullet_section("Güçlü Yanlar", &data.strengths, palette.success));
    blocks.extend(bullet_section("Kritik Tespitler", &data.findings, palette.danger));
    blocks.extend(numbered_section("Öneriler", &data.recommendations, palette.accent));
    blocks.extend(numbered_section("Sonraki Adımlar", &data.next_steps, palette.info));
    blocks.extend(text_section("Genel Değerlendirme", &data.assessment, palette.primary));

    if !data.photos.is_empty() {
        let images = data
            .photos
            .iter()
            .zip(photos)
            .map(|(photo, image)| GridImage::new(image, photo.caption.trim()))
            .collect();
        blocks.push(Block::PageBreak);
        blocks.push(SectionHeader::new("Fotoğraf Eki").with_accent(palette.accent).into());
        blocks.push(
            ImageGrid::new(images)
                .with_placeholder_label(context.brand.unavailable_label.clone())
                .into(),
        );
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use chrono::NaiveDate;

    #[test]
    fn overall_score_is_rounded_average_times_ten() {
        assert_eq!(CategoryScores::uniform(7.0).overall(), 70);
        let mixed = CategoryScores {
            cost: 6.0,
            stock: 7.0,
            operations: 8.0,
            staff: 5.0,
            hygiene: 9.0,
            customer: 7.5,
        };
        assert_eq!(mixed.overall(), 71);
    }

    #[test]
    fn reads_the_form_field_names() {
        let data: StatusReport = serde_json::from_str(
            r#"{"isletme_adi": "Cafe Noir", "skor_maliyet": 4, "guclu_yanlar": ["Temiz mutfak"]}"#,
        )
        .unwrap();
        assert_eq!(data.business_name, "Cafe Noir");
        assert_eq!(data.scores.cost, 4.0);
        assert_eq!(data.strengths.len(), 1);
        assert!(data.photos.is_empty());
    }

    #[test]
    fn photo_appendix_only_with_photos() {
        let config = EngineConfig::default();
        let context = ReportContext::new(&config, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        let mut data = StatusReport::default();
        let without = blocks(&data, &context, Vec::new());
        assert!(!without.iter().any(|block| matches!(block, Block::PageBreak)));

        data.photos.push(PhotoRef {
            url: "/uploads/a.jpg".into(),
            caption: "Mutfak".into(),
        });
        let unavailable = ImageAsset::Unavailable {
            url: "/uploads/a.jpg".into(),
            reason: "404".into(),
        };
        let with = blocks(&data, &context, vec![unavailable]);
        assert!(with.iter().any(|block| matches!(block, Block::PageBreak)));
        assert!(matches!(with.last(), Some(Block::ImageGrid(grid)) if grid.images().len() == 1));
    }
}
