//! Daily cash reconciliation workbook ("Günlük Kasa Raporu") with a monthly
//! summary sheet.
//!
//! The daily sheet is a shift-end form: sales summary, physical cash count,
//! drawer expenses and the reconciliation of expected against counted cash.
//! The monthly sheet collects one row per day and derives net cash, totals
//! and daily statistics.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::workbook::formula::{self, cell_ref};
use crate::workbook::{
    CellFormat, Condition, ConditionalRule, Formula, FormulaCell, NumberFormat, RowRange, Sheet, TableCell,
    TableRange, TableSpec, Workbook, WorkbookError,
};

use super::{or_dash, ReportContext};

pub const REPORT_TYPE: &str = "GunlukKasa";
pub const DAILY_SHEET: &str = "Günlük Kasa";
pub const MONTHLY_SHEET: &str = "Aylık Özet";

/// Accepted gap between expected and counted cash, in currency units.
pub const TOLERANCE: f64 = 50.0;
pub const ACCEPTED: &str = "Kabul";
pub const REVIEW: &str = "İnceleme";

pub const BANKNOTES: [f64; 6] = [200.0, 100.0, 50.0, 20.0, 10.0, 5.0];
const EXPENSE_ROWS: usize = 8;
const DAYS_IN_MONTH: usize = 31;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesSummary {
    #[serde(alias = "pos_z")]
    pub pos_total: Option<f64>,
    #[serde(alias = "nakit")]
    pub cash: Option<f64>,
    #[serde(alias = "kredi_karti")]
    pub card: Option<f64>,
    #[serde(alias = "online")]
    pub online: Option<f64>,
    #[serde(alias = "acik_hesap")]
    pub on_account: Option<f64>,
    #[serde(alias = "indirim")]
    pub discounts: Option<f64>,
}

impl SalesSummary {
    fn lines(&self) -> [(&'static str, Option<f64>); 6] {
        [
            ("POS Z Raporu Toplam", self.pos_total),
            ("Nakit Satış", self.cash),
            ("Kredi Kartı Satış", self.card),
            ("Online Sipariş", self.online),
            ("Açık Hesap / Veresiye", self.on_account),
            ("İndirim / İkram Toplam", self.discounts),
        ]
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Expense {
    #[serde(alias = "kalem")]
    pub item: String,
    #[serde(alias = "tutar")]
    pub amount: Option<f64>,
    #[serde(alias = "fis_no")]
    pub receipt: String,
    #[serde(alias = "not")]
    pub note: String,
}

/// One day of the monthly summary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashDay {
    #[serde(alias = "gun")]
    pub day: String,
    #[serde(alias = "pos_z")]
    pub pos_total: Option<f64>,
    #[serde(alias = "nakit")]
    pub cash: Option<f64>,
    #[serde(alias = "kredi_karti")]
    pub card: Option<f64>,
    #[serde(alias = "online")]
    pub online: Option<f64>,
    #[serde(alias = "indirim")]
    pub discounts: Option<f64>,
    #[serde(alias = "gider")]
    pub expenses: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashReport {
    #[serde(alias = "isletme_adi")]
    pub business_name: String,
    #[serde(alias = "sube")]
    pub branch: String,
    #[serde(alias = "vardiya")]
    pub shift: String,
    #[serde(alias = "donem")]
    pub period: String,
    #[serde(alias = "satislar")]
    pub sales: SalesSummary,
    /// Note counts in the order of [`BANKNOTES`].
    #[serde(alias = "banknot_adetleri")]
    pub banknotes: Vec<Option<f64>>,
    /// 1 ₺ pieces and smaller change, counted as an amount.
    #[serde(alias = "bozuk_para")]
    pub coins: Option<f64>,
    #[serde(alias = "giderler")]
    pub expenses: Vec<Expense>,
    #[serde(alias = "gunler")]
    pub days: Vec<CashDay>,
}

/// Rows of the daily sheet the reconciliation reads.
#[derive(Clone, Copy, Debug)]
pub struct DailyLayout {
    pub sales: TableRange,
    pub count: TableRange,
    pub cash_total_row: u32,
    pub expenses: TableRange,
    pub expense_total_row: u32,
    pub reconciliation: TableRange,
}

fn section_fill(context: &ReportContext<'_>) -> (Rgb, Rgb) {
    (context.palette.accent, context.palette.cream)
}

fn status_rules(context: &ReportContext<'_>) -> Vec<ConditionalRule> {
    let palette = context.palette;
    vec![
        ConditionalRule::new(
            Condition::ContainsText(ACCEPTED.to_owned()),
            CellFormat::new().bold().color(palette.success),
        ),
        ConditionalRule::new(
            Condition::ContainsText(REVIEW.to_owned()),
            CellFormat::new().bold().color(palette.danger),
        ),
    ]
}

/// `Kabul` when the difference in `cell` stays within the tolerance.
fn tolerance_check(cell: &str) -> Formula {
    Formula::new(format!(
        "IF({d}=\"\",\"\",IF(AND({d}>=-{t},{d}<={t}),\"{ok}\",\"{review}\"))",
        d = cell,
        t = TOLERANCE,
        ok = ACCEPTED,
        review = REVIEW
    ))
}

pub fn write_daily_sheet(sheet: &mut Sheet, data: &CashReport, context: &ReportContext<'_>) -> DailyLayout {
    let palette = context.palette;
    let currency = NumberFormat::Currency(context.brand.currency_suffix.clone());
    let (accent, background) = section_fill(context);
    sheet.set_column_widths(&[6.0, 32.0, 20.0, 20.0, 24.0]);
    sheet.add_brand_header(
        context.brand,
        palette,
        "GÜNLÜK KASA RAPORU",
        "Vardiya sonu kasa mutabakat belgesi",
    );
    sheet.add_key_values(
        &[("İşletme", or_dash(&data.business_name)), ("Şube", or_dash(&data.branch))],
        palette,
    );
    sheet.add_key_values(
        &[("Vardiya", or_dash(&data.shift)), ("Tarih", context.date_label())],
        palette,
    );
    sheet.add_spacer(8.0);

    sheet.add_section_header("A. SATIŞ ÖZETİ", accent, background);
    let mut sales = TableSpec::new(["#", "Açıklama", "Tutar", "Adet", "Not"]);
    for (index, (label, amount)) in data.sales.lines().into_iter().enumerate() {
        sales.push_row(vec![
            TableCell::number((index + 1) as f64, NumberFormat::Integer).centered(),
            TableCell::text(label),
            TableCell::optional(amount, currency.clone()),
            TableCell::blank(),
            TableCell::blank(),
        ]);
    }
    let sales = sheet.add_table(sales);
    sheet.add_spacer(8.0);

    sheet.add_section_header("B. FİİLİ KASA SAYIMI", accent, background);
    let mut count = TableSpec::new(["#", "Banknot / Bozuk", "Adet", "Tutar", "Not"]);
    for (index, face) in BANKNOTES.iter().copied().enumerate() {
        let pieces = data.banknotes.get(index).copied().flatten();
        count.push_row(vec![
            TableCell::number((index + 1) as f64, NumberFormat::Integer).centered(),
            TableCell::text(format!("{} {}", face, context.brand.currency_suffix)),
            TableCell::optional(pieces, NumberFormat::Integer).centered(),
            TableCell::formula(
                move |row| {
                    let pieces = cell_ref(row, 2);
                    Formula::new(format!("IF({p}=\"\",\"\",{p}*{f})", p = pieces, f = face))
                },
                currency.clone(),
            ),
            TableCell::blank(),
        ]);
    }
    count.push_row(vec![
        TableCell::number((BANKNOTES.len() + 1) as f64, NumberFormat::Integer).centered(),
        TableCell::text(format!("1 {} ve Kuruş", context.brand.currency_suffix)),
        TableCell::blank(),
        TableCell::optional(data.coins, currency.clone()),
        TableCell::blank(),
    ]);
    let count = sheet.add_table(count);
    let cash_total_row = sheet.cursor();
    sheet.add_formula_row(
        &count,
        "TOPLAM NAKİT",
        vec![FormulaCell::new(3, currency.clone(), |range| formula::sum(range, 3))],
    );
    sheet.add_spacer(8.0);

    sheet.add_section_header("C. GÜNLÜK GİDERLER", accent, background);
    let mut expenses = data.expenses.clone();
    if expenses.len() < EXPENSE_ROWS {
        expenses.resize(EXPENSE_ROWS, Expense::default());
    }
    let mut spec = TableSpec::new(["#", "Gider Kalemi", "Tutar", "Fiş No", "Not"]);
    for (index, expense) in expenses.iter().enumerate() {
        spec.push_row(vec![
            TableCell::number((index + 1) as f64, NumberFormat::Integer).centered(),
            TableCell::text(expense.item.trim()),
            TableCell::optional(expense.amount, currency.clone()),
            TableCell::text(expense.receipt.trim()).centered(),
            TableCell::text(expense.note.trim()),
        ]);
    }
    let expense_table = sheet.add_table(spec);
    let expense_total_row = sheet.cursor();
    sheet.add_formula_row(
        &expense_table,
        "TOPLAM GİDER",
        vec![FormulaCell::new(2, currency.clone(), |range| formula::sum(range, 2))],
    );
    sheet.add_spacer(8.0);

    // Expected drawer cash is cash sales less expenses paid from the drawer.
    sheet.add_section_header("D. KASA FARKI", accent, background);
    let cash_sales = cell_ref(sales.first_row + 1, 2);
    let expense_total = cell_ref(expense_total_row, 2);
    let counted = cell_ref(cash_total_row, 3);
    let reconciliation = TableSpec::new(["#", "Kalem", "Tutar", "Durum", "Açıklama"])
        .row(vec![
            TableCell::number(1.0, NumberFormat::Integer).centered(),
            TableCell::text("Beklenen Nakit (Nakit Satış - Gider)"),
            TableCell::formula(
                move |_| {
                    Formula::new(format!(
                        "IF({s}=\"\",\"\",{s}-{e})",
                        s = cash_sales,
                        e = expense_total
                    ))
                },
                currency.clone(),
            ),
            TableCell::blank(),
            TableCell::blank(),
        ])
        .row(vec![
            TableCell::number(2.0, NumberFormat::Integer).centered(),
            TableCell::text("Fiili Kasa Toplam (B)"),
            TableCell::formula(
                move |_| {
                    Formula::new(format!(
                        "IF(COUNT({first}:{last})=0,\"\",{total})",
                        first = cell_ref(count.first_row, 3),
                        last = cell_ref(count.last_row, 3),
                        total = counted
                    ))
                },
                currency.clone(),
            ),
            TableCell::blank(),
            TableCell::blank(),
        ])
        .row(vec![
            TableCell::number(3.0, NumberFormat::Integer).centered(),
            TableCell::text("FARK (Fiili - Beklenen)").bold(),
            TableCell::formula(
                |row| {
                    Formula::new(format!(
                        "IF(OR({e}=\"\",{c}=\"\"),\"\",{c}-{e})",
                        e = cell_ref(row - 2, 2),
                        c = cell_ref(row - 1, 2)
                    ))
                },
                currency.clone(),
            )
            .bold(),
            TableCell::formula(|row| tolerance_check(&cell_ref(row, 2)), NumberFormat::General)
                .bold()
                .centered(),
            TableCell::text(format!(
                "Tolerans: ±{} {}",
                TOLERANCE, context.brand.currency_suffix
            )),
        ]);
    let reconciliation = sheet.add_table(reconciliation);
    sheet.add_conditional_format(reconciliation.column(3), status_rules(context));
    sheet.add_spacer(8.0);

    sheet.add_key_values(
        &[("Kasa Sorumlusu", String::new()), ("Yönetici Onay", String::new())],
        palette,
    );
    sheet.add_footer(&context.brand.contact_line(), palette.cream);
    DailyLayout {
        sales,
        count,
        cash_total_row,
        expenses: expense_table,
        expense_total_row,
        reconciliation,
    }
}

pub fn write_monthly_sheet(sheet: &mut Sheet, data: &CashReport, context: &ReportContext<'_>) -> TableRange {
    let palette = context.palette;
    let currency = NumberFormat::Currency(context.brand.currency_suffix.clone());
    sheet.set_tab_color(palette.info);
    sheet.set_column_widths(&[6.0, 14.0, 16.0, 16.0, 16.0, 16.0, 16.0, 16.0, 18.0]);
    let period = if data.period.trim().is_empty() {
        context.date.format("%m.%Y").to_string()
    } else {
        data.period.trim().to_owned()
    };
    sheet.add_brand_header(
        context.brand,
        palette,
        "AYLIK KASA ÖZETİ",
        &format!("{}  |  Dönem: {}", or_dash(&data.business_name), period),
    );

    let days = if data.days.is_empty() {
        (1..=DAYS_IN_MONTH)
            .map(|day| CashDay {
                day: format!("{}.", day),
                ..CashDay::default()
            })
            .collect()
    } else {
        data.days.clone()
    };
    let mut spec = TableSpec::new([
        "#",
        "Tarih",
        "POS Z Raporu",
        "Nakit Satış",
        "Kredi Kartı",
        "Online Sipariş",
        "İndirim/İkram",
        "Toplam Gider",
        "Net Kasa",
    ])
    .with_header_fill(palette.info);
    for (index, day) in days.iter().enumerate() {
        let label = if day.day.trim().is_empty() {
            format!("{}.", index + 1)
        } else {
            day.day.trim().to_owned()
        };
        let mut row = vec![
            TableCell::number((index + 1) as f64, NumberFormat::Integer).centered(),
            TableCell::text(label).centered(),
        ];
        for amount in [day.pos_total, day.cash, day.card, day.online, day.discounts, day.expenses] {
            row.push(TableCell::optional(amount, currency.clone()));
        }
        // Card and online sales settle to the bank, so only cash stays in the drawer.
        row.push(
            TableCell::formula(
                |row| {
                    Formula::new(format!(
                        "IF({c}=\"\",\"\",{c}-{e})",
                        c = cell_ref(row, 3),
                        e = cell_ref(row, 7)
                    ))
                },
                currency.clone(),
            )
            .bold(),
        );
        spec.push_row(row);
    }
    let table = sheet.add_table(spec);
    sheet.freeze_rows(table.header_row);

    let columns = 2..=8u16;
    let rows: [(&str, fn(RowRange, u16) -> Formula, NumberFormat); 5] = [
        ("TOPLAM", formula::sum, currency.clone()),
        ("Günlük Ortalama", formula::guarded_average, currency.clone()),
        ("En Yüksek Gün", formula::guarded_max, currency.clone()),
        ("En Düşük Gün", formula::guarded_min, currency),
        ("Veri Giren Gün", formula::count_numbers, NumberFormat::Integer),
    ];
    for (label, template, number) in rows {
        let cells = columns
            .clone()
            .map(|column| FormulaCell::new(column, number.clone(), move |range| template(range, column)))
            .collect();
        sheet.add_formula_row(&table, label, cells);
    }
    sheet.add_instruction_row(
        "Her gün Günlük Kasa sayfasını doldurun ve ana rakamları ilgili günün satırına aktarın. Toplam ve istatistikler otomatik hesaplanır.",
        palette.light_bg,
    );
    sheet.add_key_values(
        &[
            ("Hazırlayan", String::new()),
            ("Kontrol Eden", String::new()),
            ("Yönetici Onay", String::new()),
        ],
        palette,
    );
    sheet.add_footer(&context.brand.contact_line(), palette.cream);
    table
}

pub fn workbook(data: &CashReport, context: &ReportContext<'_>) -> Result<Workbook, WorkbookError> {
    let mut workbook = Workbook::new();
    let mut daily = Sheet::new(DAILY_SHEET, 5);
    write_daily_sheet(&mut daily, data, context);
    workbook.add_sheet(daily)?;

    let mut monthly = Sheet::new(MONTHLY_SHEET, 9);
    write_monthly_sheet(&mut monthly, data, context);
    workbook.add_sheet(monthly)?;
    Ok(workbook)
}
