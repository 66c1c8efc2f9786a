//! Weekly stock count form ("Stok Sayım Formu").
//!
//! One table lists every product grouped under category rows. The variance
//! and its share of the system stock are formulas, so a printed blank form
//! and a prefilled count behave the same once opened.

use serde::{Deserialize, Serialize};

use crate::workbook::formula::{self, cell_ref};
use crate::workbook::{
    CellFormat, CellRange, Condition, ConditionalRule, Formula, NumberFormat, Sheet, TableCell, TableRange,
    TableSpec, Workbook, WorkbookError,
};

use super::{or_dash, ReportContext};

pub const REPORT_TYPE: &str = "StokSayim";
pub const SHEET_NAME: &str = "Stok Sayım";

/// Variance share, in percent, above which a count needs investigating.
pub const VARIANCE_LIMIT: f64 = 3.0;

const WIDTH: u16 = 9;
const UNCHECKED: &str = "☐ OK  ☐ Dikkat";
const EXPIRY_WARNING: &str = "DİKKAT";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockItem {
    #[serde(alias = "urun")]
    pub name: String,
    #[serde(alias = "birim")]
    pub unit: String,
    #[serde(alias = "sistem")]
    pub system: Option<f64>,
    #[serde(alias = "sayim")]
    pub counted: Option<f64>,
    /// Expiry check result; unset prints tick boxes.
    #[serde(alias = "skt_uygun")]
    pub expiry_ok: Option<bool>,
    #[serde(alias = "not")]
    pub note: String,
}

impl StockItem {
    fn new(name: &str, unit: &str) -> Self {
        Self {
            name: name.to_owned(),
            unit: unit.to_owned(),
            ..Self::default()
        }
    }

    fn expiry_label(&self) -> &'static str {
        match self.expiry_ok {
            Some(true) => "OK",
            Some(false) => EXPIRY_WARNING,
            None => UNCHECKED,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockCategory {
    #[serde(alias = "ad")]
    pub name: String,
    #[serde(alias = "urunler")]
    pub items: Vec<StockItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockCount {
    #[serde(alias = "isletme_adi")]
    pub business_name: String,
    #[serde(alias = "sayan")]
    pub counted_by: String,
    #[serde(alias = "kategoriler")]
    pub categories: Vec<StockCategory>,
}

/// The product list of a coffee shop, used when no categories are supplied.
pub fn default_categories() -> Vec<StockCategory> {
    let category = |name: &str, items: &[(&str, &str)]| StockCategory {
        name: name.to_owned(),
        items: items.iter().map(|(item, unit)| StockItem::new(item, unit)).collect(),
    };
    vec![
        category(
            "İÇECEK HAMMADDELERİ",
            &[
                ("Espresso Çekirdeği", "kg"),
                ("Filtre Kahve", "kg"),
                ("Süt", "lt"),
                ("Bitkisel Süt", "lt"),
                ("Çay", "kg"),
                ("Şurup", "lt"),
                ("Krema", "lt"),
            ],
        ),
        category(
            "GIDA HAMMADDELERİ",
            &[
                ("Ekmek", "adet"),
                ("Peynir", "kg"),
                ("Tereyağı", "kg"),
                ("Avokado", "kg"),
                ("Domates", "kg"),
                ("Yeşillik", "kg"),
                ("Tavuk", "kg"),
                ("Yumurta", "adet"),
            ],
        ),
        category(
            "AMBALAJ & SARF",
            &[
                ("Paket Bardak S", "adet"),
                ("Paket Bardak L", "adet"),
                ("Kapak", "adet"),
                ("Peçete", "paket"),
                ("Poşet", "adet"),
                ("Temizlik Malzemesi", "adet"),
            ],
        ),
    ]
}

#[derive(Clone, Copy, Debug)]
pub struct StockLayout {
    pub items: TableRange,
    pub summary: TableRange,
}

/// Counted minus system stock, blank until both are filled.
fn variance(row: u32) -> Formula {
    Formula::new(format!(
        "IF(OR({s}=\"\",{c}=\"\"),\"\",{c}-{s})",
        s = cell_ref(row, 3),
        c = cell_ref(row, 4)
    ))
}

fn variance_share(row: u32) -> Formula {
    Formula::new(format!(
        "IF(OR({v}=\"\",{s}=\"\",{s}=0),\"\",{v}/{s}*100)",
        v = cell_ref(row, 5),
        s = cell_ref(row, 3)
    ))
}

pub fn write_count_sheet(sheet: &mut Sheet, data: &StockCount, context: &ReportContext<'_>) -> StockLayout {
    let palette = context.palette;
    sheet.set_tab_color(palette.accent);
    sheet.set_column_widths(&[6.0, 24.0, 10.0, 14.0, 14.0, 12.0, 10.0, 16.0, 22.0]);
    sheet.add_brand_header(
        context.brand,
        palette,
        "HAFTALIK STOK SAYIM FORMU",
        &format!("{}  |  {}", or_dash(&data.business_name), context.date_label()),
    );
    sheet.add_instruction_row(
        "FIFO: ilk giren ilk çıkar. Sistem stoku ve fiili sayımı girin; fark ve fark oranı otomatik hesaplanır.",
        palette.cream,
    );

    let categories = if data.categories.is_empty() {
        default_categories()
    } else {
        data.categories.clone()
    };
    let mut spec = TableSpec::new([
        "#",
        "Ürün Adı",
        "Birim",
        "Sistem Stoku",
        "Fiili Sayım",
        "Fark",
        "Fark %",
        "SKT Kontrol",
        "Fark Nedeni / Not",
    ]);
    for category in &categories {
        let mut heading = vec![
            TableCell::blank().with_fill(palette.cream),
            TableCell::text(or_dash(&category.name))
                .bold()
                .with_color(palette.accent)
                .with_fill(palette.cream),
        ];
        heading.extend((2..WIDTH).map(|_| TableCell::blank().with_fill(palette.cream)));
        spec.push_row(heading);
        for (index, item) in category.items.iter().enumerate() {
            spec.push_row(vec![
                TableCell::number((index + 1) as f64, NumberFormat::Integer).centered(),
                TableCell::text(or_dash(&item.name)),
                TableCell::text(item.unit.trim()).centered(),
                TableCell::optional(item.system, NumberFormat::Decimal),
                TableCell::optional(item.counted, NumberFormat::Decimal),
                TableCell::formula(variance, NumberFormat::Decimal).bold(),
                TableCell::formula(variance_share, NumberFormat::Percent).centered(),
                TableCell::text(item.expiry_label()).centered(),
                TableCell::text(item.note.trim()),
            ]);
        }
    }
    let table = sheet.add_table(spec);
    sheet.freeze_rows(table.header_row);

    let flagged = |color, fill| CellFormat::new().bold().color(color).fill(fill);
    sheet.add_conditional_format(
        table.column(6),
        vec![
            ConditionalRule::new(
                Condition::Between(-VARIANCE_LIMIT, VARIANCE_LIMIT),
                CellFormat::new().color(palette.success),
            ),
            ConditionalRule::new(Condition::AtLeast(VARIANCE_LIMIT), flagged(palette.danger, palette.light_bg)),
            ConditionalRule::new(Condition::Below(-VARIANCE_LIMIT), flagged(palette.danger, palette.light_bg)),
        ],
    );
    sheet.add_conditional_format(
        table.column(7),
        vec![ConditionalRule::new(
            Condition::ContainsText(EXPIRY_WARNING.to_owned()),
            CellFormat::new().bold().color(palette.warning),
        )],
    );

    sheet.add_spacer(8.0);
    sheet.add_section_header("SAYIM ÖZETİ", palette.primary, palette.light_bg);
    let items = table.rows();
    let over = format!(">{}", VARIANCE_LIMIT);
    let under = format!("<-{}", VARIANCE_LIMIT);
    let summary = TableSpec::new(["Gösterge", "Değer"])
        .starting_at(1)
        .row(vec![
            TableCell::text("Sayılan Kalem").bold(),
            TableCell::formula(move |_| formula::count_numbers(items, 4), NumberFormat::Integer).centered(),
        ])
        .row(vec![
            TableCell::text(format!("Fark Oranı %{} Üzeri", VARIANCE_LIMIT)).bold(),
            TableCell::formula(
                move |_| match items.span(6) {
                    Some(span) => Formula::new(format!(
                        "COUNTIF({s},\"{o}\")+COUNTIF({s},\"{u}\")",
                        s = span,
                        o = over,
                        u = under
                    )),
                    None => Formula::blank(),
                },
                NumberFormat::Integer,
            )
            .centered(),
        ])
        .row(vec![
            TableCell::text("Toplam Fark").bold(),
            TableCell::formula(move |_| formula::sum(items, 5), NumberFormat::Decimal).centered(),
        ]);
    let summary = sheet.add_table(summary);
    let flagged_row = summary.first_row + 1;
    sheet.add_conditional_format(
        CellRange::new(flagged_row, 2, flagged_row, 2),
        vec![ConditionalRule::new(
            Condition::AtLeast(1.0),
            flagged(palette.danger, palette.light_bg),
        )],
    );

    sheet.add_instruction_row(
        "Yüksek maliyetli ürünler günlük sayılmalı. Fark %3 üzeri ise inceleme başlatılmalı.",
        palette.light_bg,
    );
    sheet.add_key_values(
        &[("Sayımı Yapan", or_dash(&data.counted_by)), ("Onaylayan", String::new())],
        palette,
    );
    sheet.add_footer(&context.brand.contact_line(), palette.cream);
    StockLayout { items: table, summary }
}

pub fn workbook(data: &StockCount, context: &ReportContext<'_>) -> Result<Workbook, WorkbookError> {
    let mut workbook = Workbook::new();
    let mut sheet = Sheet::new(SHEET_NAME, WIDTH);
    write_count_sheet(&mut sheet, data, context);
    workbook.add_sheet(sheet)?;
    Ok(workbook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::workbook::Value;
    use chrono::NaiveDate;

    fn context(config: &EngineConfig) -> ReportContext<'_> {
        ReportContext::new(config, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
    }

    #[test]
    fn blank_form_lists_the_default_products() {
        let config = EngineConfig::default();
        let mut sheet = Sheet::new(SHEET_NAME, WIDTH);
        let layout = write_count_sheet(&mut sheet, &StockCount::default(), &context(&config));
        let products: usize = default_categories().iter().map(|category| category.items.len()).sum();
        assert_eq!(layout.items.rows().len() as usize, products + 3);
        assert_eq!(
            sheet.value(layout.items.first_row, 1),
            Value::Text("İÇECEK HAMMADDELERİ".into())
        );
        assert_eq!(sheet.value(layout.items.first_row + 1, 7), Value::Text(UNCHECKED.into()));
        assert!(sheet.conditional_rule(layout.items.first_row + 1, 7).is_none());
        assert_eq!(sheet.value(layout.summary.first_row, 2), Value::Number(0.0));
        assert_eq!(sheet.value(layout.summary.first_row + 1, 2), Value::Number(0.0));
    }

    #[test]
    fn variance_beyond_the_limit_is_flagged() {
        let config = EngineConfig::default();
        let data: StockCount = serde_json::from_str(
            r#"{"kategoriler": [{"ad": "Kahve", "urunler": [
                {"urun": "Espresso", "birim": "kg", "sistem": 20, "sayim": 18, "skt_uygun": true},
                {"urun": "Süt", "birim": "lt", "sistem": 50, "sayim": 49.5},
                {"urun": "Şurup", "birim": "lt", "sistem": 10}
            ]}]}"#,
        )
        .unwrap();
        let mut sheet = Sheet::new(SHEET_NAME, WIDTH);
        let layout = write_count_sheet(&mut sheet, &data, &context(&config));
        let espresso = layout.items.first_row + 1;
        assert_eq!(sheet.value(espresso, 5), Value::Number(-2.0));
        assert_eq!(sheet.value(espresso, 6), Value::Number(-10.0));
        assert_eq!(sheet.value(espresso, 7), Value::Text("OK".into()));
        assert_eq!(
            sheet.conditional_rule(espresso, 6).map(|rule| rule.format.font_color),
            Some(Some(config.palette.danger))
        );
        let milk = sheet.value(espresso + 1, 6).as_number().unwrap();
        assert!((milk + 1.0).abs() < 1e-9);
        assert_eq!(
            sheet.conditional_rule(espresso + 1, 6).map(|rule| rule.format.font_color),
            Some(Some(config.palette.success))
        );
        assert_eq!(sheet.value(espresso + 2, 5), Value::Text(String::new()));

        let summary = layout.summary.first_row;
        assert_eq!(sheet.value(summary, 2), Value::Number(2.0));
        assert_eq!(sheet.value(summary + 1, 2), Value::Number(1.0));
        assert_eq!(sheet.value(summary + 2, 2), Value::Number(-2.5));
        assert!(sheet.conditional_rule(summary + 1, 2).is_some());
    }
}
