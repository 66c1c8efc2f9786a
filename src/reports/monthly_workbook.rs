//! Monthly revenue workbook: weekly figures, TOTAL and guarded average rows,
//! and a target ratio with threshold colours.

use crate::model::parse_number;
use crate::workbook::formula::{self, cell_ref};
use crate::workbook::{
    CellFormat, Condition, ConditionalRule, Formula, FormulaCell, NumberFormat, Sheet, TableCell, TableRange,
    TableSpec, Workbook, WorkbookError,
};

use super::monthly::MonthlyReport;
use super::{or_dash, ReportContext};

pub const REPORT_TYPE: &str = "AylikCiro";
pub const SHEET_NAME: &str = "Haftalık Ciro";

const WIDTH: u16 = 6;
const REVENUE: u16 = 1;
const COGS: u16 = 2;
const CUSTOMERS: u16 = 3;
const CHECK: u16 = 4;
const SHARE: u16 = 5;

/// Rows of the aggregate formulas, for callers that read results back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonthlyLayout {
    pub weeks: TableRange,
    pub total_row: u32,
    pub average_row: u32,
    pub achievement: TableRange,
}

fn currency(context: &ReportContext<'_>) -> NumberFormat {
    NumberFormat::Currency(context.brand.currency_suffix.clone())
}

/// Writes the revenue sheet and returns where its aggregates landed.
pub fn write_sheet(sheet: &mut Sheet, data: &MonthlyReport, context: &ReportContext<'_>) -> MonthlyLayout {
    let palette = context.palette;
    let money = currency(context);
    sheet.set_tab_color(palette.accent);
    sheet.set_column_widths(&[16.0, 16.0, 12.0, 12.0, 16.0, 14.0]);
    sheet.add_brand_header(
        context.brand,
        palette,
        "AYLIK CİRO RAPORU",
        &format!(
            "{}  |  Tarih: {}  |  Dönem: {}",
            or_dash(&data.business_name),
            context.date_label(),
            or_dash(&data.period)
        ),
    );
    sheet.add_section_header("HAFTALIK VERİLER", palette.accent, palette.cream);

    let mut spec = TableSpec::new(["Hafta", "Ciro", "COGS %", "Müşteri", "Ort. Hesap", "Ciro Payı %"]);
    for week in &data.weeks {
        spec.push_row(vec![
            TableCell::text(or_dash(&week.week)),
            TableCell::optional(parse_number(&week.revenue), money.clone()),
            TableCell::optional(parse_number(&week.cogs_rate), NumberFormat::Percent),
            TableCell::optional(parse_number(&week.customers), NumberFormat::Integer),
            TableCell::optional(parse_number(&week.average_check), money.clone()),
            TableCell::blank(),
        ]);
    }
    let weeks = sheet.add_table(spec);

    let total_row = sheet.cursor();
    let total_revenue = cell_ref(total_row, REVENUE);
    for row in weeks.rows().rows() {
        let share = formula::guarded_ratio(&cell_ref(row, REVENUE), &total_revenue);
        let format = sheet
            .cell(row, SHARE)
            .map(|cell| cell.format.clone())
            .unwrap_or_default()
            .number(NumberFormat::Percent);
        sheet.set_cell(row, SHARE, share, format);
    }
    sheet.add_formula_row(
        &weeks,
        "TOPLAM",
        vec![
            FormulaCell::new(REVENUE, money.clone(), |range| formula::sum(range, REVENUE)),
            FormulaCell::new(CUSTOMERS, NumberFormat::Integer, |range| formula::sum(range, CUSTOMERS)),
        ],
    );
    let average_row = sheet.cursor();
    sheet.add_formula_row(
        &weeks,
        "ORTALAMA",
        vec![
            FormulaCell::new(REVENUE, money.clone(), |range| formula::guarded_average(range, REVENUE)),
            FormulaCell::new(COGS, NumberFormat::Percent, |range| formula::guarded_average(range, COGS)),
            FormulaCell::new(CUSTOMERS, NumberFormat::Integer, |range| formula::guarded_average(range, CUSTOMERS)),
            FormulaCell::new(CHECK, money.clone(), |range| formula::guarded_average(range, CHECK)),
        ],
    );

    sheet.add_spacer(8.0);
    sheet.add_section_header("HEDEF KARŞILAŞTIRMASI", palette.primary, palette.light_bg);
    let actual = total_revenue.clone();
    let achievement = sheet.add_table(TableSpec::new(["Metrik", "Hedef", "Gerçekleşen", "Başarı %"]).row(vec![
        TableCell::text("Aylık Ciro"),
        TableCell::optional(parse_number(&data.target_revenue), money.clone()),
        TableCell::formula(
            move |_| Formula::new(format!("IF({0}=\"\",0,{0})", actual)),
            money.clone(),
        ),
        TableCell::formula(
            |row| formula::guarded_ratio(&cell_ref(row, 2), &cell_ref(row, 1)),
            NumberFormat::Percent,
        )
        .bold(),
    ]));
    sheet.add_conditional_format(
        achievement.column(3),
        vec![
            ConditionalRule::new(Condition::AtLeast(100.0), CellFormat::new().bold().color(palette.success)),
            ConditionalRule::new(Condition::AtLeast(90.0), CellFormat::new().bold().color(palette.warning)),
            ConditionalRule::new(Condition::Below(90.0), CellFormat::new().bold().color(palette.danger)),
        ],
    );
    sheet.add_footer(&context.brand.contact_line(), palette.cream);
    sheet.freeze_rows(4);

    MonthlyLayout {
        weeks,
        total_row,
        average_row,
        achievement,
    }
}

pub fn workbook(data: &MonthlyReport, context: &ReportContext<'_>) -> Result<Workbook, WorkbookError> {
    let mut sheet = Sheet::new(SHEET_NAME, WIDTH);
    write_sheet(&mut sheet, data, context);
    let mut workbook = Workbook::new();
    workbook.add_sheet(sheet)?;
    Ok(workbook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::reports::monthly::WeeklyFigures;
    use crate::workbook::Value;
    use chrono::NaiveDate;

    fn data(revenues: &[&str]) -> MonthlyReport {
        MonthlyReport {
            business_name: "Cafe Noir".into(),
            target_revenue: "92000".into(),
            weeks: revenues
                .iter()
                .enumerate()
                .map(|(index, revenue)| WeeklyFigures {
                    week: format!("{}. Hafta", index + 1),
                    revenue: (*revenue).into(),
                    ..WeeklyFigures::default()
                })
                .collect(),
            ..MonthlyReport::default()
        }
    }

    #[test]
    fn totals_and_ratio_read_back() {
        let config = EngineConfig::default();
        let context = ReportContext::new(&config, NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        let mut sheet = Sheet::new(SHEET_NAME, WIDTH);
        let layout = write_sheet(&mut sheet, &data(&["10000", "12000", "11000", "13000"]), &context);
        assert_eq!(sheet.value(layout.total_row, REVENUE), Value::Number(46000.0));
        assert_eq!(sheet.value(layout.average_row, REVENUE), Value::Number(11500.0));
        assert_eq!(sheet.value(layout.average_row, COGS), Value::Text(String::new()));
        assert_eq!(sheet.value(layout.achievement.first_row, 3), Value::Number(50.0));
        assert_eq!(
            sheet.conditional_rule(layout.achievement.first_row, 3).map(|rule| rule.format.font_color),
            Some(Some(config.palette.danger))
        );
    }

    #[test]
    fn no_weeks_gives_blank_aggregates() {
        let config = EngineConfig::default();
        let context = ReportContext::new(&config, NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        let mut sheet = Sheet::new(SHEET_NAME, WIDTH);
        let layout = write_sheet(&mut sheet, &data(&[]), &context);
        assert!(layout.weeks.rows().is_empty());
        assert_eq!(sheet.value(layout.total_row, REVENUE), Value::Text(String::new()));
        assert_eq!(sheet.value(layout.achievement.first_row, 3), Value::Number(0.0));
    }
}
