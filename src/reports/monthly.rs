//! Monthly performance ("Aylık Performans") PDF.

use serde::{Deserialize, Serialize};

use crate::model::{
    parse_number, Block, CellRule, CellStyle, Column, HorizontalAlignment, InfoGrid, RowSelector, SectionHeader,
    Table, TitleBar, ValuePredicate,
};

use super::{bullet_section, numbered_section, or_dash, text_section, ReportContext};

pub const REPORT_TYPE: &str = "AylikPerformans";
pub const TITLE: &str = "Aylık Performans Raporu";

const ON_TARGET: &str = "Hedefte";
const OFF_TARGET: &str = "Hedef Altı";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyFigures {
    #[serde(alias = "hafta")]
    pub week: String,
    #[serde(alias = "ciro")]
    pub revenue: String,
    #[serde(alias = "cogs_oran")]
    pub cogs_rate: String,
    #[serde(alias = "musteri_sayisi")]
    pub customers: String,
    #[serde(alias = "ortalama_hesap")]
    pub average_check: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthlyReport {
    #[serde(alias = "isletme_adi")]
    pub business_name: String,
    #[serde(alias = "donem")]
    pub period: String,
    #[serde(alias = "danisman_adi")]
    pub consultant: String,
    #[serde(alias = "haftalik")]
    pub weeks: Vec<WeeklyFigures>,
    #[serde(alias = "personel_devir")]
    pub staff_turnover: String,
    #[serde(alias = "memnuniyet_skoru")]
    pub satisfaction: String,
    #[serde(alias = "hedef_ciro")]
    pub target_revenue: String,
    #[serde(alias = "hedef_cogs")]
    pub target_cogs: String,
    #[serde(alias = "basarilar")]
    pub achievements: Vec<String>,
    #[serde(alias = "sorunlar")]
    pub problems: Vec<String>,
    #[serde(alias = "oneri_ve_hedefler")]
    pub goals: Vec<String>,
    #[serde(alias = "genel_yorum")]
    pub comment: String,
}

/// Sum and average of the parsable values of one weekly column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnStats {
    pub total: f64,
    pub average: Option<f64>,
}

impl ColumnStats {
    pub fn of<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let numbers: Vec<f64> = values.into_iter().filter_map(parse_number).collect();
        let total = numbers.iter().sum();
        let average = if numbers.is_empty() {
            None
        } else {
            Some(total / numbers.len() as f64)
        };
        Self { total, average }
    }
}

impl MonthlyReport {
    pub fn revenue(&self) -> ColumnStats {
        ColumnStats::of(self.weeks.iter().map(|week| week.revenue.as_str()))
    }

    pub fn cogs(&self) -> ColumnStats {
        ColumnStats::of(self.weeks.iter().map(|week| week.cogs_rate.as_str()))
    }

    pub fn customers(&self) -> ColumnStats {
        ColumnStats::of(self.weeks.iter().map(|week| week.customers.as_str()))
    }

    pub fn average_check(&self) -> ColumnStats {
        ColumnStats::of(self.weeks.iter().map(|week| week.average_check.as_str()))
    }
}

/// `12.500` style grouping with dots, as Turkish readers expect.
pub(crate) fn grouped(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::new();
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    if rounded < 0 {
        out.insert(0, '-');
    }
    out
}

fn money(value: Option<f64>, suffix: &str) -> String {
    value.map_or_else(|| "-".to_owned(), |value| format!("{} {}", grouped(value), suffix))
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_owned(), |value| format!("%{:.1}", value))
}

fn weekly_table(data: &MonthlyReport, suffix: &str, context: &ReportContext<'_>) -> Table {
    let mut table = Table::new(vec![
        Column::flex("Hafta", 1.2),
        Column::flex("Ciro", 1.0).aligned(HorizontalAlignment::Right),
        Column::flex("COGS %", 0.8).aligned(HorizontalAlignment::Right),
        Column::flex("Müşteri", 0.8).aligned(HorizontalAlignment::Right),
        Column::flex("Ort. Hesap", 1.0).aligned(HorizontalAlignment::Right),
    ]);
    for week in &data.weeks {
        table.push_row([
            or_dash(&week.week),
            or_dash(&week.revenue),
            or_dash(&week.cogs_rate),
            or_dash(&week.customers),
            or_dash(&week.average_check),
        ]);
    }
    let (revenue, cogs, customers, check) =
        (data.revenue(), data.cogs(), data.customers(), data.average_check());
    table.push_row([
        "TOPLAM".to_owned(),
        money(Some(revenue.total), suffix),
        "-".to_owned(),
        grouped(customers.total),
        "-".to_owned(),
    ]);
    table.push_row([
        "ORTALAMA".to_owned(),
        money(revenue.average, suffix),
        percent(cogs.average),
        customers.average.map_or_else(|| "-".to_owned(), grouped),
        money(check.average, suffix),
    ]);
    let totals = data.weeks.len();
    let summary = CellStyle::fill(context.palette.cream).bold();
    table
        .with_rule(CellRule::row(RowSelector::Index(totals), summary))
        .with_rule(CellRule::row(RowSelector::Last, summary))
}

/// Target row status: revenue must reach its target, COGS must stay at or under it.
fn target_status(actual: Option<f64>, target: Option<f64>, higher_is_better: bool) -> &'static str {
    match (actual, target) {
        (Some(actual), Some(target)) if higher_is_better == (actual >= target) || actual == target => ON_TARGET,
        (Some(_), Some(_)) => OFF_TARGET,
        _ => "-",
    }
}

fn target_table(data: &MonthlyReport, suffix: &str, context: &ReportContext<'_>) -> Table {
    let revenue = data.revenue();
    let cogs = data.cogs();
    let target_revenue = parse_number(&data.target_revenue);
    let target_cogs = parse_number(&data.target_cogs);
    let actual_revenue = if data.weeks.is_empty() { None } else { Some(revenue.total) };
    Table::new(vec![
        Column::flex("Metrik", 1.4),
        Column::flex("Hedef", 1.0).aligned(HorizontalAlignment::Right),
        Column::flex("Gerçekleşen", 1.0).aligned(HorizontalAlignment::Right),
        Column::flex("Durum", 0.9).aligned(HorizontalAlignment::Center),
    ])
    .row([
        "Aylık Ciro".to_owned(),
        money(target_revenue, suffix),
        money(actual_revenue, suffix),
        target_status(actual_revenue, target_revenue, true).to_owned(),
    ])
    .row([
        "COGS Oranı".to_owned(),
        percent(target_cogs),
        percent(cogs.average),
        target_status(cogs.average, target_cogs, false).to_owned(),
    ])
    .with_rule(CellRule::column(
        3,
        ValuePredicate::Equals(ON_TARGET.to_owned()),
        CellStyle::text(context.palette.success).bold(),
    ))
    .with_rule(CellRule::column(
        3,
        ValuePredicate::Equals(OFF_TARGET.to_owned()),
        CellStyle::text(context.palette.danger).bold(),
    ))
}

pub fn blocks(data: &MonthlyReport, context: &ReportContext<'_>) -> Vec<Block> {
    let palette = context.palette;
    let suffix = context.brand.currency_suffix.as_str();
    let mut blocks: Vec<Block> = vec![
        TitleBar::new(TITLE)
            .with_subtitle(or_dash(&data.business_name))
            .with_meta(format!("Dönem: {}  |  Rapor: {}", or_dash(&data.period), context.date_label()))
            .into(),
        InfoGrid::new()
            .with_columns(3)
            .entry("Danışman", or_dash(&data.consultant))
            .entry("Personel Devir", or_dash(&data.staff_turnover))
            .entry("Memnuniyet Skoru", or_dash(&data.satisfaction))
            .into(),
        SectionHeader::new("Haftalık KPI Tablosu").into(),
        weekly_table(data, suffix, context).into(),
        SectionHeader::new("Hedef Karşılaştırması").into(),
        target_table(data, suffix, context).into(),
    ];
    blocks.extend(bullet_section("Başarılar", &data.achievements, palette.success));
    blocks.extend(bullet_section("Sorunlar", &data.problems, palette.danger));
    blocks.extend(numbered_section("Öneri ve Hedefler", &data.goals, palette.accent));
    blocks.extend(text_section("Genel Yorum", &data.comment, palette.primary));
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> MonthlyReport {
        let weeks = [("1. Hafta", "10.000", "%31"), ("2. Hafta", "12.000", "%29"), ("3. Hafta", "11000", "30"), ("4. Hafta", "13.000 ₺", "")];
        MonthlyReport {
            business_name: "Cafe Noir".into(),
            target_revenue: "45.000".into(),
            target_cogs: "30".into(),
            weeks: weeks
                .iter()
                .map(|(week, revenue, cogs)| WeeklyFigures {
                    week: (*week).into(),
                    revenue: (*revenue).into(),
                    cogs_rate: (*cogs).into(),
                    ..WeeklyFigures::default()
                })
                .collect(),
            ..MonthlyReport::default()
        }
    }

    #[test]
    fn weekly_statistics_skip_blank_cells() {
        let data = report();
        assert_eq!(data.revenue().total, 46000.0);
        assert_eq!(data.revenue().average, Some(11500.0));
        assert_eq!(data.cogs().average, Some(30.0));
        assert_eq!(data.customers().average, None);
    }

    #[test]
    fn groups_thousands_with_dots() {
        assert_eq!(grouped(46000.0), "46.000");
        assert_eq!(grouped(1234567.4), "1.234.567");
        assert_eq!(grouped(-950.0), "-950");
    }

    #[test]
    fn target_statuses() {
        assert_eq!(target_status(Some(46000.0), Some(45000.0), true), ON_TARGET);
        assert_eq!(target_status(Some(31.0), Some(30.0), false), OFF_TARGET);
        assert_eq!(target_status(Some(30.0), Some(30.0), false), ON_TARGET);
        assert_eq!(target_status(None, Some(30.0), false), "-");
    }

    #[test]
    fn weekly_table_ends_with_total_and_average() {
        let config = crate::config::EngineConfig::default();
        let context = ReportContext::new(&config, chrono::NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        let table = weekly_table(&report(), "₺", &context);
        let rows = table.rows();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[4][1], "46.000 ₺");
        assert_eq!(rows[5][1], "11.500 ₺");
        assert!(table.cell_style(4, 0).is_some());
    }
}
