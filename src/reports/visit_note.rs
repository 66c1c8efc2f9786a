//! Visit note ("Ziyaret Notu") PDF.

use serde::{Deserialize, Serialize};

use crate::model::{Block, CellRule, CellStyle, Column, InfoGrid, RowSelector, SectionHeader, Table, TitleBar, ValuePredicate};

use super::{bullet_section, display_date, or_dash, text_section, ReportContext};

pub const REPORT_TYPE: &str = "ZiyaretNotu";
pub const TITLE: &str = "Ziyaret Notu";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitKind {
    #[serde(alias = "ilk")]
    First,
    #[serde(alias = "takip")]
    FollowUp,
    #[serde(alias = "acil")]
    Urgent,
    #[default]
    #[serde(alias = "rutin")]
    Routine,
}

impl VisitKind {
    pub fn label(self) -> &'static str {
        match self {
            VisitKind::First => "İlk Ziyaret",
            VisitKind::FollowUp => "Takip Ziyareti",
            VisitKind::Urgent => "Acil Ziyaret",
            VisitKind::Routine => "Rutin Kontrol",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NextStep {
    #[serde(alias = "gorev")]
    pub task: String,
    #[serde(alias = "sorumlu")]
    pub owner: String,
    #[serde(alias = "tarih")]
    pub due: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitNote {
    #[serde(alias = "isletme_adi")]
    pub business_name: String,
    #[serde(alias = "isletme_turu")]
    pub business_type: String,
    #[serde(alias = "konum")]
    pub location: String,
    #[serde(alias = "ziyaret_tarihi")]
    pub visit_date: String,
    #[serde(alias = "ziyaret_saati")]
    pub visit_time: String,
    #[serde(alias = "ziyaret_suresi")]
    pub duration: String,
    #[serde(alias = "danisman_adi")]
    pub consultant: String,
    #[serde(alias = "ziyaret_turu")]
    pub kind: VisitKind,
    #[serde(alias = "olumlu_bulgular")]
    pub positives: Vec<String>,
    #[serde(alias = "olumsuz_bulgular")]
    pub negatives: Vec<String>,
    #[serde(alias = "yapilan_isler")]
    pub work_done: Vec<String>,
    #[serde(alias = "sonraki_adimlar")]
    pub next_steps: Vec<NextStep>,
    #[serde(alias = "genel_not")]
    pub note: String,
    #[serde(alias = "sonraki_ziyaret")]
    pub next_visit: String,
}

fn steps_table(steps: &[&NextStep], context: &ReportContext<'_>) -> Table {
    let mut table = Table::new(vec![
        Column::flex("Görev", 2.2),
        Column::flex("Sorumlu", 1.0),
        Column::fixed("Tarih", 26.0),
    ]);
    for step in steps {
        table.push_row([or_dash(&step.task), or_dash(&step.owner), or_dash(&display_date(&step.due))]);
    }
    table.with_rule(CellRule {
        column: Some(2),
        row: RowSelector::Any,
        predicate: ValuePredicate::Equals("-".to_owned()),
        style: CellStyle::text(context.palette.text_gray),
    })
}

pub fn blocks(data: &VisitNote, context: &ReportContext<'_>) -> Vec<Block> {
    let palette = context.palette;
    let mut blocks: Vec<Block> = vec![
        TitleBar::new(TITLE)
            .with_subtitle(or_dash(&data.business_name))
            .with_meta(format!("{}  |  {}", data.kind.label(), context.date_label()))
            .into(),
        InfoGrid::new()
            .with_heading("Ziyaret Bilgileri")
            .with_columns(4)
            .entry("İşletme Türü", or_dash(&data.business_type))
            .entry("Konum", or_dash(&data.location))
            .entry("Tarih", or_dash(&display_date(&data.visit_date)))
            .entry("Saat", or_dash(&data.visit_time))
            .entry("Süre", or_dash(&data.duration))
            .entry("Danışman", or_dash(&data.consultant))
            .entry("Ziyaret Türü", data.kind.label())
            .entry("Sonraki Ziyaret", or_dash(&display_date(&data.next_visit)))
            .into(),
    ];
    blocks.extend(bullet_section("Olumlu Bulgular", &data.positives, palette.success));
    blocks.extend(bullet_section("Olumsuz Bulgular", &data.negatives, palette.danger));
    blocks.extend(bullet_section("Yapılan İşler", &data.work_done, palette.info));

    let steps: Vec<&NextStep> = data
        .next_steps
        .iter()
        .filter(|step| !step.task.trim().is_empty())
        .collect();
    if !steps.is_empty() {
        blocks.push(SectionHeader::new("Sonraki Adımlar").with_accent(palette.accent).into());
        blocks.push(steps_table(&steps, context).into());
    }
    blocks.extend(text_section("Genel Not", &data.note, palette.primary));
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use chrono::NaiveDate;

    #[test]
    fn reads_visit_kinds() {
        let note: VisitNote = serde_json::from_str(r#"{"ziyaret_turu": "takip"}"#).unwrap();
        assert_eq!(note.kind, VisitKind::FollowUp);
        let note: VisitNote = serde_json::from_str("{}").unwrap();
        assert_eq!(note.kind, VisitKind::Routine);
    }

    #[test]
    fn blank_steps_are_skipped() {
        let config = EngineConfig::default();
        let context = ReportContext::new(&config, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        let mut note = VisitNote::default();
        note.next_steps.push(NextStep::default());
        assert!(!blocks(&note, &context).iter().any(|block| matches!(block, Block::Table(_))));

        note.next_steps.push(NextStep {
            task: "Stok sayım formu".into(),
            ..NextStep::default()
        });
        let blocks = blocks(&note, &context);
        let Some(Block::Table(table)) = blocks.iter().find(|block| matches!(block, Block::Table(_))) else {
            panic!("expected the steps table");
        };
        assert_eq!(table.rows().len(), 1);
        assert!(table.cell_style(0, 2).is_some());
    }
}
