//! Service proposal ("Teklif") PDF.

use serde::{Deserialize, Serialize};

use crate::model::{
    parse_number, Block, CellRule, CellStyle, Column, HorizontalAlignment, InfoGrid, RowSelector, SectionHeader,
    SignatureBlock, Table, TitleBar,
};

use super::monthly::grouped;
use super::{display_date, or_dash, text_section, ReportContext};

pub const REPORT_TYPE: &str = "Teklif";
pub const TITLE: &str = "Hizmet Teklifi";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceLine {
    #[serde(alias = "hizmet")]
    pub service: String,
    #[serde(alias = "aciklama")]
    pub description: String,
    #[serde(alias = "fiyat")]
    pub price: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Proposal {
    #[serde(alias = "danisman_adi")]
    pub consultant_name: String,
    #[serde(alias = "danisman_unvan")]
    pub consultant_title: String,
    #[serde(alias = "danisman_telefon")]
    pub consultant_phone: String,
    #[serde(alias = "danisman_email")]
    pub consultant_email: String,
    #[serde(alias = "musteri_adi")]
    pub client_name: String,
    #[serde(alias = "musteri_isletme")]
    pub client_business: String,
    #[serde(alias = "musteri_telefon")]
    pub client_phone: String,
    #[serde(alias = "musteri_email")]
    pub client_email: String,
    #[serde(alias = "musteri_adres")]
    pub client_address: String,
    #[serde(alias = "teklif_no")]
    pub proposal_number: String,
    #[serde(alias = "teklif_tarihi")]
    pub proposal_date: String,
    #[serde(alias = "gecerlilik_suresi")]
    pub validity: String,
    #[serde(alias = "hizmetler")]
    pub services: Vec<ServiceLine>,
    #[serde(alias = "baslangic_tarihi")]
    pub start_date: String,
    #[serde(alias = "sure")]
    pub duration: String,
    #[serde(alias = "odeme_kosullari")]
    pub payment_terms: String,
    #[serde(alias = "ozel_notlar")]
    pub notes: String,
}

impl Proposal {
    /// Sum of the parsable service prices.
    pub fn total(&self) -> f64 {
        self.services
            .iter()
            .filter_map(|line| parse_number(&line.price))
            .sum()
    }
}

fn services_table(data: &Proposal, context: &ReportContext<'_>) -> Table {
    let suffix = &context.brand.currency_suffix;
    let mut table = Table::new(vec![
        Column::fixed("#", 10.0).aligned(HorizontalAlignment::Center),
        Column::flex("Hizmet", 1.2),
        Column::flex("Açıklama", 2.0),
        Column::fixed("Fiyat", 32.0).aligned(HorizontalAlignment::Right),
    ]);
    let lines = data
        .services
        .iter()
        .filter(|line| !(line.service.trim().is_empty() && line.price.trim().is_empty()));
    for (index, line) in lines.enumerate() {
        let price = match parse_number(&line.price) {
            Some(price) => format!("{} {}", grouped(price), suffix),
            None => or_dash(&line.price),
        };
        table.push_row([
            (index + 1).to_string(),
            or_dash(&line.service),
            or_dash(&line.description),
            price,
        ]);
    }
    table.push_row([
        String::new(),
        "TOPLAM".to_owned(),
        "KDV hariç".to_owned(),
        format!("{} {}", grouped(data.total()), suffix),
    ]);
    table.with_rule(CellRule::row(
        RowSelector::Last,
        CellStyle::text(context.palette.primary).bold().with_fill(context.palette.cream),
    ))
}

pub fn blocks(data: &Proposal, context: &ReportContext<'_>) -> Vec<Block> {
    let palette = context.palette;
    let proposal_date = if data.proposal_date.trim().is_empty() {
        context.date_label()
    } else {
        display_date(&data.proposal_date)
    };
    let mut blocks: Vec<Block> = vec![
        TitleBar::new(TITLE)
            .with_subtitle(or_dash(if data.client_business.trim().is_empty() {
                &data.client_name
            } else {
                &data.client_business
            }))
            .with_meta(format!(
                "Teklif No: {}  |  Tarih: {}  |  Geçerlilik: {}",
                or_dash(&data.proposal_number),
                proposal_date,
                or_dash(&data.validity)
            ))
            .into(),
        InfoGrid::new()
            .with_heading("Danışman")
            .with_columns(4)
            .entry("Ad Soyad", or_dash(&data.consultant_name))
            .entry("Unvan", or_dash(&data.consultant_title))
            .entry("Telefon", or_dash(&data.consultant_phone))
            .entry("E-posta", or_dash(&data.consultant_email))
            .into(),
        InfoGrid::new()
            .with_heading("Müşteri")
            .with_columns(3)
            .with_fill(palette.cream)
            .entry("Yetkili", or_dash(&data.client_name))
            .entry("İşletme", or_dash(&data.client_business))
            .entry("Telefon", or_dash(&data.client_phone))
            .entry("E-posta", or_dash(&data.client_email))
            .entry("Adres", or_dash(&data.client_address))
            .into(),
        SectionHeader::new("Hizmetler").into(),
        services_table(data, context).into(),
        InfoGrid::new()
            .with_heading("Süre ve Koşullar")
            .with_columns(3)
            .entry("Başlangıç", or_dash(&display_date(&data.start_date)))
            .entry("Süre", or_dash(&data.duration))
            .entry("Ödeme Koşulları", or_dash(&data.payment_terms))
            .into(),
    ];
    blocks.extend(text_section("Özel Notlar", &data.notes, palette.accent));
    blocks.push(
        SignatureBlock::new()
            .party("Hizmet Veren", or_dash(&data.consultant_name))
            .party("Hizmet Alan", or_dash(&data.client_name))
            .into(),
    );
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use chrono::NaiveDate;

    #[test]
    fn total_row_sums_prices() {
        let data = Proposal {
            services: vec![
                ServiceLine {
                    service: "Maliyet analizi".into(),
                    price: "15.000".into(),
                    ..ServiceLine::default()
                },
                ServiceLine {
                    service: "Menü mühendisliği".into(),
                    price: "7500".into(),
                    ..ServiceLine::default()
                },
                ServiceLine::default(),
            ],
            ..Proposal::default()
        };
        assert_eq!(data.total(), 22500.0);
        let config = EngineConfig::default();
        let context = ReportContext::new(&config, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        let table = services_table(&data, &context);
        assert_eq!(table.rows().len(), 3);
        assert_eq!(table.rows()[2][3], "22.500 ₺");
        assert!(table.cell_style(2, 1).is_some());
        assert!(table.cell_style(0, 1).is_none());
    }

    #[test]
    fn ends_with_signatures() {
        let config = EngineConfig::default();
        let context = ReportContext::new(&config, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        let blocks = blocks(&Proposal::default(), &context);
        assert!(matches!(blocks.last(), Some(Block::SignatureBlock(signatures)) if signatures.parties().len() == 2));
    }
}
