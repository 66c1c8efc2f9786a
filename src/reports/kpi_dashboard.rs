//! KPI dashboard workbook: KPI scorecard, daily revenue, COGS, customer
//! satisfaction, table turnover and staff turnover.
//!
//! Every derived column is a formula over the captured table rows, so the
//! sheets keep working when the business fills in the blank cells later.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::workbook::formula::{self, cell_ref, column_letter};
use crate::workbook::{
    CellFormat, CellRange, Condition, ConditionalRule, Formula, FormulaCell, NumberFormat, Sheet, TableCell,
    TableRange, TableSpec, Workbook, WorkbookError,
};

use super::{display_date, or_dash, ReportContext};

pub const REPORT_TYPE: &str = "KPIDashboard";
pub const KPI_SHEET: &str = "KPI Dashboard";
pub const DAILY_SHEET: &str = "Günlük Ciro";
pub const TURNOVER_SHEET: &str = "Masa Devir Hızı";
pub const COGS_SHEET: &str = "COGS Hesaplama";
pub const SATISFACTION_SHEET: &str = "Müşteri Memnuniyet";
pub const STAFF_SHEET: &str = "Personel Takip";

pub const ACTIVE: &str = "Aktif";
pub const LEFT: &str = "Ayrıldı";

const DAYS_IN_MONTH: usize = 31;
const FEEDBACK_ROWS: usize = 20;
const STAFF_ROWS: usize = 15;
const COGS_CATEGORIES: [&str; 8] = [
    "Kahve & Çay Hammaddeleri",
    "Süt & Süt Ürünleri",
    "Gıda Hammaddeleri (Et, Sebze)",
    "Ekmek & Unlu Mamuller",
    "İçecek (Şurup, Meyve Suyu)",
    "Ambalaj & Sarf Malzeme",
    "Temizlik Malzemeleri",
    "Diğer",
];
const COGS_FIXES: [(&str, &str); 6] = [
    ("Porsiyon Kontrolü", "Tüm ürünlerin gramajlarını kontrol edin. Standart reçetelere uyuluyor mu?"),
    ("Tedarikçi Pazarlığı", "3 farklı tedarikçiden teklif alın. Toplu alım indirimi isteyin."),
    ("Menü Fiyat Güncelleme", "COGS %35 üzerindeki ürünlerin fiyatlarını %10-15 artırın."),
    ("Fire Azaltma", "FIFO kuralını sıkılaştırın. Hazırlık miktarlarını satışa göre ayarlayın."),
    ("Menü Mühendisliği", "Düşük karlı ürünleri çıkarın veya dönüştürün. Yıldız ürünleri öne çıkarın."),
    ("Stok Yönetimi", "Haftalık sayım yapın. Par-level sistemi kurun. Aşırı stoktan kaçının."),
];
const STAFF_STRATEGY: [&str; 6] = [
    "Çıkış mülakatı yapın: en sık nedenler maaş, çalışma saatleri ve yönetimdir.",
    "Piyasa maaş araştırması yapın. Rakiplerden %10 düşük ücret personel kaybettirir.",
    "Kariyer planı sunun: Barista, Kıdemli Barista, Bar Şefi, Asistan Müdür.",
    "Çalışma koşullarını iyileştirin: düzenli çizelge, önceden bildirim, mola düzeni.",
    "Ödül sistemi kurun: ayın elemanı, prim, ücretsiz yemek ve içecek.",
    "Eğitim verin: latte art kursu, sertifika programları gibi gelişim fırsatları.",
];
const WEEKDAYS: [&str; 7] = ["Pazartesi", "Salı", "Çarşamba", "Perşembe", "Cuma", "Cumartesi", "Pazar"];

const GOOD: (Rgb, Rgb) = (Rgb::from_hex(0x16A34A), Rgb::from_hex(0xF0FDF4));
const WATCH: (Rgb, Rgb) = (Rgb::from_hex(0xD97706), Rgb::from_hex(0xFFFBEB));
const CRITICAL: (Rgb, Rgb) = (Rgb::from_hex(0xDC2626), Rgb::from_hex(0xFEF2F2));

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Kpi {
    #[serde(alias = "ad")]
    pub name: String,
    #[serde(alias = "hedef")]
    pub target: Option<f64>,
    #[serde(alias = "gerceklesen")]
    pub actual: Option<f64>,
    #[serde(alias = "sorumlu")]
    pub owner: String,
    #[serde(alias = "periyot")]
    pub period: String,
    /// Cost-style KPIs where exceeding the target is a miss.
    #[serde(alias = "dusuk_iyi")]
    pub lower_is_better: bool,
}

impl Kpi {
    fn new(name: &str, target: f64, owner: &str, period: &str, lower_is_better: bool) -> Self {
        Self {
            name: name.to_owned(),
            target: Some(target),
            actual: None,
            owner: owner.to_owned(),
            period: period.to_owned(),
            lower_is_better,
        }
    }
}

/// The scorecard a restaurant starts from when none is supplied.
pub fn default_kpis() -> Vec<Kpi> {
    vec![
        Kpi::new("Günlük Ortalama Ciro (₺)", 15000.0, "Müdür", "Haftalık", false),
        Kpi::new("COGS Oranı (%)", 30.0, "Şef", "Haftalık", true),
        Kpi::new("Fire Oranı (%)", 3.0, "Depo Sorumlusu", "Haftalık", true),
        Kpi::new("Müşteri Memnuniyeti (1-5)", 4.5, "Müdür", "Haftalık", false),
        Kpi::new("Masa Devir Hızı (x/gün)", 3.0, "Kaptan", "Haftalık", false),
        Kpi::new("Personel Devir Oranı (%/yıl)", 10.0, "İK", "Aylık", true),
        Kpi::new("Kasa Fark Oranı (₺)", 50.0, "Kasiyer", "Günlük", true),
    ]
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyRevenue {
    #[serde(alias = "gun")]
    pub day: String,
    #[serde(alias = "hedef")]
    pub target: Option<f64>,
    #[serde(alias = "ciro")]
    pub actual: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnoverDay {
    #[serde(alias = "gun")]
    pub day: String,
    #[serde(alias = "tarih")]
    pub date: String,
    #[serde(alias = "ogle")]
    pub lunch: Option<f64>,
    #[serde(alias = "aksam")]
    pub dinner: Option<f64>,
}

/// Stock movement of one cost category over the period.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CogsLine {
    #[serde(alias = "kategori")]
    pub category: String,
    #[serde(alias = "donem_basi")]
    pub opening: Option<f64>,
    #[serde(alias = "alimlar")]
    pub purchases: Option<f64>,
    #[serde(alias = "donem_sonu")]
    pub closing: Option<f64>,
    #[serde(alias = "not")]
    pub note: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feedback {
    #[serde(alias = "tarih")]
    pub date: String,
    #[serde(alias = "kaynak")]
    pub source: String,
    /// 1 to 5.
    #[serde(alias = "puan")]
    pub score: Option<f64>,
    #[serde(alias = "kategori")]
    pub category: String,
    #[serde(alias = "geri_bildirim")]
    pub comment: String,
    #[serde(alias = "aksiyon")]
    pub action: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffMember {
    #[serde(alias = "ad")]
    pub name: String,
    #[serde(alias = "pozisyon")]
    pub position: String,
    /// `YYYY-MM-DD` or `DD.MM.YYYY`.
    #[serde(alias = "giris")]
    pub start: String,
    #[serde(alias = "cikis")]
    pub end: String,
    #[serde(alias = "not")]
    pub note: String,
}

impl StaffMember {
    /// Whole months worked up to the exit date, or up to `today` while still
    /// employed. `None` without a readable start date.
    pub fn tenure_months(&self, today: NaiveDate) -> Option<u32> {
        let start = parse_day(&self.start)?;
        let end = parse_day(&self.end).unwrap_or(today);
        let mut months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
        if end.day() < start.day() {
            months -= 1;
        }
        Some(months.max(0) as u32)
    }
}

fn parse_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiDashboard {
    #[serde(alias = "isletme_adi")]
    pub business_name: String,
    #[serde(alias = "donem")]
    pub period: String,
    pub kpis: Vec<Kpi>,
    #[serde(alias = "gunluk_ciro")]
    pub daily: Vec<DailyRevenue>,
    #[serde(alias = "masa_sayisi")]
    pub tables_count: Option<f64>,
    #[serde(alias = "masa_devir")]
    pub turnover: Vec<TurnoverDay>,
    /// Total sales of the period, the COGS denominator.
    #[serde(alias = "donem_satis")]
    pub period_sales: Option<f64>,
    #[serde(alias = "cogs_kalemleri")]
    pub cogs: Vec<CogsLine>,
    #[serde(alias = "geri_bildirimler")]
    pub feedback: Vec<Feedback>,
    #[serde(alias = "personel")]
    pub staff: Vec<StaffMember>,
}

fn traffic_light(range: CellRange, good: f64, watch: f64) -> (CellRange, Vec<ConditionalRule>) {
    let rule = |condition, (color, fill): (Rgb, Rgb)| {
        ConditionalRule::new(condition, CellFormat::new().bold().color(color).fill(fill))
    };
    (
        range,
        vec![
            rule(Condition::AtLeast(good), GOOD),
            rule(Condition::AtLeast(watch), WATCH),
            rule(Condition::Below(watch), CRITICAL),
        ],
    )
}

fn subtitle(data: &KpiDashboard, context: &ReportContext<'_>) -> String {
    let period = if data.period.trim().is_empty() {
        context.date.format("%m.%Y").to_string()
    } else {
        data.period.trim().to_owned()
    };
    format!("{}  |  Dönem: {}", or_dash(&data.business_name), period)
}

/// Achievement of row `row` in percent: actual over target, or the mirrored
/// overshoot for lower-is-better KPIs. Blank until both figures exist.
fn achievement(row: u32, lower_is_better: bool) -> Formula {
    let target = cell_ref(row, 2);
    let actual = cell_ref(row, 3);
    if lower_is_better {
        Formula::new(format!(
            "IF(OR({t}=\"\",{t}=0,{a}=\"\"),\"\",(1-({a}-{t})/{t})*100)",
            t = target,
            a = actual
        ))
    } else {
        let ratio = formula::guarded_ratio(&actual, &target);
        Formula::new(format!("IF({}=\"\",\"\",{})", actual, ratio.expression()))
    }
}

pub fn write_kpi_sheet(sheet: &mut Sheet, data: &KpiDashboard, context: &ReportContext<'_>) -> TableRange {
    let palette = context.palette;
    sheet.set_tab_color(palette.primary);
    sheet.set_column_widths(&[6.0, 34.0, 12.0, 14.0, 12.0, 12.0, 18.0, 16.0]);
    sheet.add_brand_header(context.brand, palette, "KPI TAKİP PANOSU", &subtitle(data, context));
    sheet.add_instruction_row(
        "Gerçekleşen sütununu doldurun; başarı oranı ve durum otomatik hesaplanır.",
        palette.cream,
    );

    let kpis = if data.kpis.is_empty() {
        default_kpis()
    } else {
        data.kpis.clone()
    };
    let mut spec = TableSpec::new([
        "#",
        "KPI Göstergesi",
        "Hedef",
        "Gerçekleşen",
        "Başarı %",
        "Durum",
        "Sorumlu",
        "Takip Periyodu",
    ])
    .with_header_fill(palette.primary);
    for (index, kpi) in kpis.iter().enumerate() {
        let lower_is_better = kpi.lower_is_better;
        spec.push_row(vec![
            TableCell::number((index + 1) as f64, NumberFormat::Integer).centered(),
            TableCell::text(or_dash(&kpi.name)).bold(),
            TableCell::optional(kpi.target, NumberFormat::General).centered(),
            TableCell::optional(kpi.actual, NumberFormat::General).centered(),
            TableCell::formula(move |row| achievement(row, lower_is_better), NumberFormat::Percent).centered(),
            TableCell::formula(
                |row| formula::tiered_label(&cell_ref(row, 4), &[(90.0, "İyi"), (70.0, "Dikkat")], "Kritik"),
                NumberFormat::General,
            )
            .bold()
            .centered(),
            TableCell::text(or_dash(&kpi.owner)),
            TableCell::text(or_dash(&kpi.period)),
        ]);
    }
    let table = sheet.add_table(spec);
    sheet.freeze_rows(table.header_row);

    let score_row = sheet.cursor();
    sheet.add_formula_row(
        &table,
        "GENEL SKOR",
        vec![FormulaCell::new(4, NumberFormat::Percent, |range| formula::guarded_average(range, 4))],
    );

    let (range, rules) = traffic_light(CellRange::new(table.first_row, 4, score_row, 4), 90.0, 70.0);
    sheet.add_conditional_format(range, rules);
    sheet.add_conditional_format(
        table.column(5),
        label_rules(&[("İyi", GOOD), ("Dikkat", WATCH), ("Kritik", CRITICAL)]),
    );
    sheet.add_footer(&context.brand.contact_line(), palette.cream);
    table
}

pub fn write_daily_sheet(sheet: &mut Sheet, data: &KpiDashboard, context: &ReportContext<'_>) -> TableRange {
    let palette = context.palette;
    let currency = NumberFormat::Currency(context.brand.currency_suffix.clone());
    sheet.set_tab_color(palette.success);
    sheet.set_column_widths(&[10.0, 16.0, 18.0, 12.0, 18.0]);
    sheet.add_brand_header(context.brand, palette, "GÜNLÜK CİRO TAKİBİ", &subtitle(data, context));

    let days = if data.daily.is_empty() {
        (1..=DAYS_IN_MONTH)
            .map(|day| DailyRevenue {
                day: day.to_string(),
                ..DailyRevenue::default()
            })
            .collect()
    } else {
        data.daily.clone()
    };
    let first_row = sheet.cursor() + 1;
    let mut spec = TableSpec::new(["Gün", "Hedef", "Gerçekleşen", "Başarı %", "Kümülatif"]).with_header_fill(palette.success);
    for (index, day) in days.iter().enumerate() {
        let label = if day.day.trim().is_empty() {
            (index + 1).to_string()
        } else {
            day.day.trim().to_owned()
        };
        spec.push_row(vec![
            TableCell::text(label).centered(),
            TableCell::optional(day.target, currency.clone()),
            TableCell::optional(day.actual, currency.clone()),
            TableCell::formula(
                |row| {
                    let actual = cell_ref(row, 2);
                    let ratio = formula::guarded_ratio(&actual, &cell_ref(row, 1));
                    Formula::new(format!("IF({}=\"\",\"\",{})", actual, ratio.expression()))
                },
                NumberFormat::Percent,
            )
            .centered(),
            TableCell::formula(
                move |row| {
                    let column = column_letter(2);
                    Formula::new(format!(
                        "IF({c}{r}=\"\",\"\",SUM({c}${f}:{c}{r}))",
                        c = column,
                        r = row,
                        f = first_row
                    ))
                },
                currency.clone(),
            ),
        ]);
    }
    let table = sheet.add_table(spec);
    sheet.freeze_rows(table.header_row);

    let total_row = sheet.cursor();
    sheet.add_formula_row(
        &table,
        "TOPLAM",
        vec![
            FormulaCell::new(1, currency.clone(), |range| formula::sum(range, 1)),
            FormulaCell::new(2, currency, |range| formula::sum(range, 2)),
            FormulaCell::new(3, NumberFormat::Percent, move |_| {
                formula::guarded_ratio(&cell_ref(total_row, 2), &cell_ref(total_row, 1))
            }),
        ],
    );
    let (range, rules) = traffic_light(CellRange::new(table.first_row, 3, total_row, 3), 90.0, 70.0);
    sheet.add_conditional_format(range, rules);
    sheet.add_footer(&context.brand.contact_line(), palette.cream);
    table
}

pub fn write_turnover_sheet(sheet: &mut Sheet, data: &KpiDashboard, context: &ReportContext<'_>) -> TableRange {
    let palette = context.palette;
    sheet.set_tab_color(palette.info);
    sheet.set_column_widths(&[12.0, 12.0, 14.0, 14.0, 14.0, 14.0, 16.0]);
    sheet.add_brand_header(context.brand, palette, "MASA DEVİR HIZI", &subtitle(data, context));

    // Table count lives in one input cell that every turnover formula reads.
    let count_row = sheet.cursor();
    sheet.set_cell(
        count_row,
        5,
        "Masa Sayısı",
        CellFormat::new().bold().size(10.0).color(palette.primary).fill(palette.cream),
    );
    match data.tables_count {
        Some(count) => sheet.set_cell(count_row, 6, count, CellFormat::new().bold().size(10.0).centered()),
        None => sheet.set_cell(count_row, 6, "", CellFormat::new().bold().size(10.0).centered()),
    }
    sheet.add_spacer(24.0);
    sheet.add_spacer(8.0);
    let count_ref = format!("{}${}", column_letter(6), count_row);

    let days = if data.turnover.is_empty() {
        WEEKDAYS
            .iter()
            .map(|day| TurnoverDay {
                day: (*day).to_owned(),
                ..TurnoverDay::default()
            })
            .collect()
    } else {
        data.turnover.clone()
    };
    let mut spec = TableSpec::new([
        "Gün",
        "Tarih",
        "Öğle Misafir",
        "Akşam Misafir",
        "Toplam Misafir",
        "Devir Hızı",
        "Ort. Oturma (dk)",
    ])
    .with_header_fill(palette.info);
    for day in &days {
        let turnover_count = count_ref.clone();
        spec.push_row(vec![
            TableCell::text(or_dash(&day.day)).bold(),
            TableCell::text(or_dash(&day.date)).centered(),
            TableCell::optional(day.lunch, NumberFormat::Integer).centered(),
            TableCell::optional(day.dinner, NumberFormat::Integer).centered(),
            TableCell::formula(
                |row| {
                    Formula::new(format!(
                        "IF(AND({l}=\"\",{d}=\"\"),\"\",{l}+{d})",
                        l = cell_ref(row, 2),
                        d = cell_ref(row, 3)
                    ))
                },
                NumberFormat::Integer,
            )
            .centered(),
            TableCell::formula(
                move |row| {
                    Formula::new(format!(
                        "IF(OR({e}=\"\",{g}=\"\",{g}=0),\"\",{e}/({g}*2))",
                        e = cell_ref(row, 4),
                        g = turnover_count
                    ))
                },
                NumberFormat::Decimal,
            )
            .centered(),
            TableCell::formula(|row| formula::seating_minutes(&cell_ref(row, 5)), NumberFormat::Integer).centered(),
        ]);
    }
    let table = sheet.add_table(spec);

    let average_row = sheet.cursor();
    sheet.add_formula_row(
        &table,
        "ORTALAMA",
        vec![
            FormulaCell::new(4, NumberFormat::Integer, |range| formula::guarded_average(range, 4)),
            FormulaCell::new(5, NumberFormat::Decimal, |range| formula::guarded_average(range, 5)),
            FormulaCell::new(6, NumberFormat::Integer, |range| formula::guarded_average(range, 6)),
        ],
    );
    let (range, rules) = traffic_light(CellRange::new(table.first_row, 5, average_row, 5), 3.0, 2.0);
    sheet.add_conditional_format(range, rules);
    sheet.add_instruction_row(
        "Devir hızı = toplam misafir / (masa sayısı x 2). Oturma süresi devir hızına göre tahmini değerdir.",
        palette.light_bg,
    );
    sheet.add_footer(&context.brand.contact_line(), palette.cream);
    table
}

/// Rows of the COGS sheet the verdict and totals live on.
#[derive(Clone, Copy, Debug)]
pub struct CogsLayout {
    pub categories: TableRange,
    pub total_row: u32,
    pub verdict_row: u32,
}

/// An entry table followed by its formula summary.
#[derive(Clone, Copy, Debug)]
pub struct TrackerLayout {
    pub entries: TableRange,
    pub summary: TableRange,
}

/// Rules for cost-style percentages: at most `ideal` is good, at most `limit`
/// needs watching, anything above is critical.
fn cost_light(range: CellRange, ideal: f64, limit: f64) -> (CellRange, Vec<ConditionalRule>) {
    let rule = |condition, (color, fill): (Rgb, Rgb)| {
        ConditionalRule::new(condition, CellFormat::new().bold().color(color).fill(fill))
    };
    (
        range,
        vec![
            rule(Condition::Between(f64::MIN, ideal), GOOD),
            rule(Condition::Between(ideal, limit), WATCH),
            rule(Condition::AtLeast(limit), CRITICAL),
        ],
    )
}

fn label_rules(labels: &[(&str, (Rgb, Rgb))]) -> Vec<ConditionalRule> {
    labels
        .iter()
        .map(|(label, (color, fill))| {
            ConditionalRule::new(
                Condition::ContainsText((*label).to_owned()),
                CellFormat::new().bold().color(*color).fill(*fill),
            )
        })
        .collect()
}

fn metric(label: &str, value: TableCell, unit: &str) -> Vec<TableCell> {
    vec![TableCell::text(label).bold(), value.bold().centered(), TableCell::text(unit)]
}

/// Cost of goods sold for row `row`: opening stock plus purchases minus
/// closing stock, blank until opening and purchases are filled.
fn cogs_amount(row: u32) -> Formula {
    Formula::new(format!(
        "IF(OR({o}=\"\",{p}=\"\"),\"\",{o}+{p}-{c})",
        o = cell_ref(row, 2),
        p = cell_ref(row, 3),
        c = cell_ref(row, 4)
    ))
}

/// `cogs` as a percentage of `sales`, blank while either is missing.
fn cogs_share(cogs: &str, sales: &str) -> Formula {
    Formula::new(format!(
        "IF(OR({c}=\"\",{s}=0,{s}=\"\"),\"\",{c}/{s}*100)",
        c = cogs,
        s = sales
    ))
}

fn cogs_verdict(share: &str) -> Formula {
    Formula::new(format!(
        "IF({g}=\"\",\"Veri giriniz\",IF({g}<=30,\"İdeal Aralıkta (%25-30)\",\
         IF({g}<=35,\"Dikkat: Sınırda (%30-35)\",\"KRİTİK: Acil düzeltme gerekli (>%35)\")))",
        g = share
    ))
}

fn staff_status(row: u32) -> Formula {
    Formula::new(format!(
        "IF({s}=\"\",\"\",IF({e}=\"\",\"{active}\",\"{left}\"))",
        s = cell_ref(row, 3),
        e = cell_ref(row, 4),
        active = ACTIVE,
        left = LEFT
    ))
}

pub fn write_cogs_sheet(sheet: &mut Sheet, data: &KpiDashboard, context: &ReportContext<'_>) -> CogsLayout {
    let palette = context.palette;
    let currency = NumberFormat::Currency(context.brand.currency_suffix.clone());
    sheet.set_tab_color(palette.accent);
    sheet.set_column_widths(&[5.0, 24.0, 16.0, 16.0, 16.0, 16.0, 14.0, 22.0]);
    sheet.add_brand_header(context.brand, palette, "COGS HESAPLAMA & TAKİP", &subtitle(data, context));
    sheet.add_instruction_row(
        "COGS = (Dönem Başı Stok + Alımlar - Dönem Sonu Stok) / Toplam Satış x 100. Stok ve alım sütunlarını girin.",
        palette.cream,
    );

    sheet.add_section_header("DÖNEM SATIŞ BİLGİSİ", palette.info, palette.light_bg);
    let sales_row = sheet.cursor();
    sheet.set_cell(
        sales_row,
        1,
        "Dönem Toplam Satış",
        CellFormat::new().bold().size(10.0).color(palette.primary).fill(palette.cream),
    );
    let input = CellFormat::new()
        .bold()
        .size(12.0)
        .color(palette.primary)
        .fill(palette.highlight)
        .centered()
        .number(currency.clone());
    match data.period_sales {
        Some(sales) => sheet.set_cell(sales_row, 2, sales, input),
        None => sheet.set_cell(sales_row, 2, "", input),
    }
    sheet.set_cell(
        sales_row,
        3,
        "Ay sonu toplam ciro, COGS % hesabı için zorunlu",
        CellFormat::new().italic().size(9.0).color(palette.danger),
    );
    sheet.add_spacer(30.0);
    sheet.add_spacer(8.0);
    let sales = format!("{}${}", column_letter(2), sales_row);

    sheet.add_section_header("KATEGORİ BAZLI MALİYET HESABI", palette.accent, palette.cream);
    let lines = if data.cogs.is_empty() {
        COGS_CATEGORIES
            .iter()
            .map(|category| CogsLine {
                category: (*category).to_owned(),
                ..CogsLine::default()
            })
            .collect()
    } else {
        data.cogs.clone()
    };
    let mut spec = TableSpec::new([
        "#",
        "Kategori",
        "Dönem Başı Stok",
        "Dönem Alımları",
        "Dönem Sonu Stok",
        "COGS",
        "COGS %",
        "Not / Aksiyon",
    ])
    .with_header_fill(palette.accent);
    for (index, line) in lines.iter().enumerate() {
        let sales = sales.clone();
        spec.push_row(vec![
            TableCell::number((index + 1) as f64, NumberFormat::Integer).centered(),
            TableCell::text(or_dash(&line.category)).bold(),
            TableCell::optional(line.opening, currency.clone()),
            TableCell::optional(line.purchases, currency.clone()),
            TableCell::optional(line.closing, currency.clone()),
            TableCell::formula(cogs_amount, currency.clone()),
            TableCell::formula(move |row| cogs_share(&cell_ref(row, 5), &sales), NumberFormat::Percent).centered(),
            TableCell::text(line.note.trim()),
        ]);
    }
    let table = sheet.add_table(spec);

    let total_row = sheet.cursor();
    let total_sales = sales.clone();
    let mut totals: Vec<FormulaCell> = (2..=5)
        .map(|column| FormulaCell::new(column, currency.clone(), move |range| formula::sum(range, column)))
        .collect();
    totals.push(FormulaCell::new(6, NumberFormat::Percent, move |_| {
        cogs_share(&cell_ref(total_row, 5), &total_sales)
    }));
    sheet.add_formula_row(&table, "TOPLAM", totals);
    let (range, rules) = cost_light(CellRange::new(table.first_row, 6, total_row, 6), 30.0, 35.0);
    sheet.add_conditional_format(range, rules);

    sheet.add_spacer(8.0);
    sheet.add_section_header("COGS DEĞERLENDİRME", palette.primary, palette.light_bg);
    let verdict_row = sheet.cursor();
    sheet.set_cell(verdict_row, 1, "Genel COGS Durumu", CellFormat::new().bold().size(10.0));
    sheet.set_cell(
        verdict_row,
        3,
        cogs_verdict(&cell_ref(total_row, 6)),
        CellFormat::new().bold().size(11.0),
    );
    sheet.add_conditional_format(
        CellRange::new(verdict_row, 3, verdict_row, 3),
        label_rules(&[("İdeal", GOOD), ("Dikkat", WATCH), ("KRİTİK", CRITICAL)]),
    );
    sheet.add_spacer(30.0);

    sheet.add_spacer(8.0);
    sheet.add_section_header("COGS YÜKSEKSE: DÜZELTME PLANI", palette.danger, CRITICAL.1);
    let mut fixes = TableSpec::new(["#", "Adım", "Uygulama"]).with_header_fill(palette.danger);
    for (index, (step, detail)) in COGS_FIXES.iter().enumerate() {
        fixes.push_row(vec![
            TableCell::number((index + 1) as f64, NumberFormat::Integer).centered(),
            TableCell::text(*step).bold(),
            TableCell::text(*detail),
        ]);
    }
    sheet.add_table(fixes);
    sheet.add_instruction_row(
        "İdeal COGS: kahve dükkanı %25-30, restoran %28-35. Haftalık stok sayımı zorunludur.",
        palette.light_bg,
    );
    sheet.add_footer(&context.brand.contact_line(), palette.cream);
    CogsLayout {
        categories: table,
        total_row,
        verdict_row,
    }
}

pub fn write_satisfaction_sheet(sheet: &mut Sheet, data: &KpiDashboard, context: &ReportContext<'_>) -> TrackerLayout {
    let palette = context.palette;
    sheet.set_tab_color(palette.success);
    sheet.set_column_widths(&[5.0, 14.0, 20.0, 12.0, 18.0, 30.0, 24.0]);
    sheet.add_brand_header(context.brand, palette, "MÜŞTERİ MEMNUNİYET TAKİBİ", &subtitle(data, context));
    sheet.add_instruction_row(
        "Her geri bildirimi kaydedin. Puan sütununa 1-5 arası değer girin; analiz otomatik hesaplanır.",
        palette.cream,
    );

    let mut entries = data.feedback.clone();
    if entries.len() < FEEDBACK_ROWS {
        entries.resize(FEEDBACK_ROWS, Feedback::default());
    }
    let mut spec = TableSpec::new([
        "#",
        "Tarih",
        "Müşteri / Kaynak",
        "Puan (1-5)",
        "Kategori",
        "Geri Bildirim Detayı",
        "Yapılan Aksiyon",
    ])
    .with_header_fill(palette.success);
    for (index, entry) in entries.iter().enumerate() {
        spec.push_row(vec![
            TableCell::number((index + 1) as f64, NumberFormat::Integer).centered(),
            TableCell::text(display_date(&entry.date)).centered(),
            TableCell::text(entry.source.trim()),
            TableCell::optional(entry.score, NumberFormat::General).centered(),
            TableCell::text(entry.category.trim()),
            TableCell::text(entry.comment.trim()),
            TableCell::text(entry.action.trim()),
        ]);
    }
    let table = sheet.add_table(spec);
    sheet.freeze_rows(table.header_row);
    let (range, rules) = traffic_light(table.column(3), 4.0, 3.0);
    sheet.add_conditional_format(range, rules);

    sheet.add_spacer(8.0);
    sheet.add_section_header("MEMNUNİYET ANALİZİ", palette.success, GOOD.1);
    let scores = table.rows();
    let summary = TableSpec::new(["Gösterge", "Değer", "Birim"])
        .starting_at(1)
        .row(metric(
            "Ortalama Puan",
            TableCell::formula(move |_| formula::guarded_average(scores, 3), NumberFormat::Decimal),
            "/ 5.0",
        ))
        .row(metric(
            "Toplam Geri Bildirim",
            TableCell::formula(move |_| formula::count_filled(scores, 3), NumberFormat::Integer),
            "adet",
        ))
        .row(metric(
            "Memnun Müşteri (4-5 puan)",
            TableCell::formula(move |_| formula::count_matching(scores, 3, ">=4"), NumberFormat::Integer),
            "kişi",
        ))
        .row(metric(
            "Memnuniyet Oranı",
            TableCell::formula(
                |row| formula::guarded_ratio(&cell_ref(row - 1, 2), &cell_ref(row - 2, 2)),
                NumberFormat::Percent,
            ),
            "%",
        ))
        .row(metric(
            "Düşük Puan (1-2)",
            TableCell::formula(move |_| formula::count_matching(scores, 3, "<=2"), NumberFormat::Integer),
            "kişi, acil aksiyon",
        ));
    let summary = sheet.add_table(summary);
    sheet.add_instruction_row(
        "Hedef: 4.5/5 üzeri. Kategoriler: Ürün, Servis, Hijyen, Fiyat, Mekan, Personel.",
        palette.light_bg,
    );
    sheet.add_footer(&context.brand.contact_line(), palette.cream);
    TrackerLayout {
        entries: table,
        summary,
    }
}

pub fn write_staff_sheet(sheet: &mut Sheet, data: &KpiDashboard, context: &ReportContext<'_>) -> TrackerLayout {
    let palette = context.palette;
    sheet.set_tab_color(palette.text_gray);
    sheet.set_column_widths(&[5.0, 22.0, 16.0, 14.0, 14.0, 14.0, 14.0, 22.0]);
    sheet.add_brand_header(context.brand, palette, "PERSONEL & İK TAKİP", &subtitle(data, context));
    sheet.add_instruction_row(
        "Ayrılan personel için çıkış tarihini yazın. Çalışma süresi rapor tarihine göre hesaplanır.",
        palette.cream,
    );

    let mut members = data.staff.clone();
    if members.len() < STAFF_ROWS {
        members.resize(STAFF_ROWS, StaffMember::default());
    }
    let mut spec = TableSpec::new([
        "#",
        "Personel Adı",
        "Pozisyon",
        "Giriş Tarihi",
        "Çıkış Tarihi",
        "Çalışma (Ay)",
        "Durum",
        "Not",
    ])
    .with_header_fill(palette.primary);
    for (index, member) in members.iter().enumerate() {
        spec.push_row(vec![
            TableCell::number((index + 1) as f64, NumberFormat::Integer).centered(),
            TableCell::text(member.name.trim()).bold(),
            TableCell::text(member.position.trim()),
            TableCell::text(display_date(&member.start)).centered(),
            TableCell::text(display_date(&member.end)).centered(),
            TableCell::optional(member.tenure_months(context.date).map(f64::from), NumberFormat::Integer).centered(),
            TableCell::formula(staff_status, NumberFormat::General).bold().centered(),
            TableCell::text(member.note.trim()),
        ]);
    }
    let table = sheet.add_table(spec);
    sheet.freeze_rows(table.header_row);
    sheet.add_conditional_format(table.column(6), label_rules(&[(ACTIVE, GOOD), (LEFT, CRITICAL)]));

    sheet.add_spacer(8.0);
    sheet.add_section_header("İK PERFORMANS ÖZETİ", palette.primary, palette.light_bg);
    let staff = table.rows();
    let summary = TableSpec::new(["Gösterge", "Değer", "Birim"])
        .starting_at(1)
        .row(metric(
            "Toplam Personel (Aktif)",
            TableCell::formula(move |_| formula::count_matching(staff, 6, ACTIVE), NumberFormat::Integer),
            "kişi",
        ))
        .row(metric(
            "Ayrılan Personel",
            TableCell::formula(move |_| formula::count_matching(staff, 6, LEFT), NumberFormat::Integer),
            "kişi",
        ))
        .row(metric(
            "Devir Oranı",
            TableCell::formula(
                |row| {
                    let active = cell_ref(row - 2, 2);
                    let left = cell_ref(row - 1, 2);
                    formula::guarded_ratio(&left, &format!("({}+{})", active, left))
                },
                NumberFormat::Percent,
            ),
            "%",
        ))
        .row(metric(
            "Ort. Çalışma Süresi",
            TableCell::formula(move |_| formula::guarded_average(staff, 5), NumberFormat::Decimal),
            "ay",
        ));
    let summary = sheet.add_table(summary);
    let turnover_cell = summary.first_row + 2;
    let (range, rules) = cost_light(CellRange::new(turnover_cell, 2, turnover_cell, 2), 10.0, 25.0);
    sheet.add_conditional_format(range, rules);

    sheet.add_spacer(8.0);
    sheet.add_section_header("DEVİR ORANI YÜKSEKSE: İK STRATEJİSİ", palette.danger, CRITICAL.1);
    let mut strategy = TableSpec::new(["#", "Strateji"]).with_header_fill(palette.danger);
    for (index, step) in STAFF_STRATEGY.iter().enumerate() {
        strategy.push_row(vec![
            TableCell::number((index + 1) as f64, NumberFormat::Integer).centered(),
            TableCell::text(*step),
        ]);
    }
    sheet.add_table(strategy);
    sheet.add_instruction_row(
        "İdeal personel devir oranı yıllık %10 altıdır. %25 üzeri acil İK müdahalesi gerektirir.",
        palette.light_bg,
    );
    sheet.add_footer(&context.brand.contact_line(), palette.cream);
    TrackerLayout {
        entries: table,
        summary,
    }
}

pub fn workbook(data: &KpiDashboard, context: &ReportContext<'_>) -> Result<Workbook, WorkbookError> {
    let mut workbook = Workbook::new();

    let mut kpi = Sheet::new(KPI_SHEET, 8);
    write_kpi_sheet(&mut kpi, data, context);
    workbook.add_sheet(kpi)?;

    let mut daily = Sheet::new(DAILY_SHEET, 5);
    write_daily_sheet(&mut daily, data, context);
    workbook.add_sheet(daily)?;

    let mut cogs = Sheet::new(COGS_SHEET, 8);
    write_cogs_sheet(&mut cogs, data, context);
    workbook.add_sheet(cogs)?;

    let mut satisfaction = Sheet::new(SATISFACTION_SHEET, 7);
    write_satisfaction_sheet(&mut satisfaction, data, context);
    workbook.add_sheet(satisfaction)?;

    let mut turnover = Sheet::new(TURNOVER_SHEET, 7);
    write_turnover_sheet(&mut turnover, data, context);
    workbook.add_sheet(turnover)?;

    let mut staff = Sheet::new(STAFF_SHEET, 8);
    write_staff_sheet(&mut staff, data, context);
    workbook.add_sheet(staff)?;
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
    fn empty_input_gets_the_default_scorecard() {
        let config = EngineConfig::default();
        let mut sheet = Sheet::new(KPI_SHEET, 8);
        let table = write_kpi_sheet(&mut sheet, &KpiDashboard::default(), &context(&config));
        assert_eq!(table.rows().len(), 7);
        assert_eq!(sheet.value(table.first_row, 4), Value::Text(String::new()));
        assert_eq!(sheet.value(table.first_row, 5), Value::Text(String::new()));
        assert_eq!(sheet.value(table.next_row, 4), Value::Text(String::new()));
        assert!(sheet.conditional_rule(table.first_row, 5).is_none());
    }

    #[test]
    fn achievement_mirrors_cost_kpis() {
        let config = EngineConfig::default();
        let data: KpiDashboard = serde_json::from_str(
            r#"{"kpis": [
                {"ad": "Ortalama Ciro", "hedef": 16000, "gerceklesen": 12000},
                {"ad": "COGS", "hedef": 20, "gerceklesen": 25, "dusuk_iyi": true},
                {"ad": "Memnuniyet", "hedef": 4, "gerceklesen": 4.5},
                {"ad": "Fire", "hedef": 3}
            ]}"#,
        )
        .unwrap();
        let mut sheet = Sheet::new(KPI_SHEET, 8);
        let table = write_kpi_sheet(&mut sheet, &data, &context(&config));
        let first = table.first_row;
        assert_eq!(sheet.value(first, 4), Value::Number(75.0));
        assert_eq!(sheet.value(first + 1, 4), Value::Number(75.0));
        assert_eq!(sheet.value(first + 2, 4), Value::Number(112.5));
        assert_eq!(sheet.value(first + 3, 4), Value::Text(String::new()));
        assert_eq!(sheet.value(first, 5), Value::Text("Dikkat".into()));
        assert_eq!(sheet.value(first + 2, 5), Value::Text("İyi".into()));
        assert_eq!(
            sheet.conditional_rule(first + 2, 5).map(|rule| rule.format.font_color),
            Some(Some(GOOD.0))
        );
        let overall = sheet.value(table.next_row, 4).as_number().unwrap();
        assert!((overall - 87.5).abs() < 1e-9);
    }

    #[test]
    fn cumulative_revenue_skips_blank_days() {
        let config = EngineConfig::default();
        let data: KpiDashboard = serde_json::from_str(
            r#"{"gunluk_ciro": [
                {"gun": "1", "hedef": 2000, "ciro": 1000},
                {"gun": "2", "hedef": 2000},
                {"gun": "3", "hedef": 2000, "ciro": 2000}
            ]}"#,
        )
        .unwrap();
        let mut sheet = Sheet::new(DAILY_SHEET, 5);
        let table = write_daily_sheet(&mut sheet, &data, &context(&config));
        let first = table.first_row;
        assert_eq!(sheet.value(first, 3), Value::Number(50.0));
        assert_eq!(sheet.value(first + 1, 4), Value::Text(String::new()));
        assert_eq!(sheet.value(first + 2, 4), Value::Number(3000.0));
        assert_eq!(sheet.value(table.next_row, 3), Value::Number(50.0));

        let mut empty = Sheet::new(DAILY_SHEET, 5);
        let table = write_daily_sheet(&mut empty, &KpiDashboard::default(), &context(&config));
        assert_eq!(table.rows().len(), DAYS_IN_MONTH as u32);
        assert_eq!(empty.value(table.next_row, 3), Value::Text(String::new()));
    }

    #[test]
    fn turnover_reads_the_table_count_cell() {
        let config = EngineConfig::default();
        let data: KpiDashboard = serde_json::from_str(
            r#"{"masa_sayisi": 10, "masa_devir": [
                {"gun": "Cuma", "ogle": 30, "aksam": 20},
                {"gun": "Cumartesi"}
            ]}"#,
        )
        .unwrap();
        let mut sheet = Sheet::new(TURNOVER_SHEET, 7);
        let table = write_turnover_sheet(&mut sheet, &data, &context(&config));
        let first = table.first_row;
        assert_eq!(sheet.value(first, 4), Value::Number(50.0));
        assert_eq!(sheet.value(first, 5), Value::Number(2.5));
        assert_eq!(sheet.value(first, 6), Value::Number(60.0));
        assert_eq!(sheet.value(first + 1, 5), Value::Text(String::new()));
        assert_eq!(
            sheet.conditional_rule(first, 5).map(|rule| rule.format.font_color),
            Some(Some(WATCH.0))
        );

        let mut unset = Sheet::new(TURNOVER_SHEET, 7);
        let table = write_turnover_sheet(&mut unset, &KpiDashboard::default(), &context(&config));
        assert_eq!(table.rows().len(), 7);
        assert_eq!(unset.value(table.first_row, 5), Value::Text(String::new()));
    }

    #[test]
    fn cogs_rows_share_the_period_sales_cell() {
        let config = EngineConfig::default();
        let data: KpiDashboard = serde_json::from_str(
            r#"{"donem_satis": 100000, "cogs_kalemleri": [
                {"kategori": "Kahve", "donem_basi": 10000, "alimlar": 30000, "donem_sonu": 8000},
                {"kategori": "Süt", "donem_basi": 2000}
            ]}"#,
        )
        .unwrap();
        let mut sheet = Sheet::new(COGS_SHEET, 8);
        let layout = write_cogs_sheet(&mut sheet, &data, &context(&config));
        let first = layout.categories.first_row;
        assert_eq!(layout.categories.rows().len(), 2);
        assert_eq!(sheet.value(first, 5), Value::Number(32000.0));
        let share = sheet.value(first, 6).as_number().unwrap();
        assert!((share - 32.0).abs() < 1e-9);
        assert_eq!(sheet.value(first + 1, 5), Value::Text(String::new()));
        assert_eq!(sheet.value(first + 1, 6), Value::Text(String::new()));

        assert_eq!(sheet.value(layout.total_row, 2), Value::Number(12000.0));
        assert_eq!(sheet.value(layout.total_row, 5), Value::Number(32000.0));
        assert_eq!(
            sheet.value(layout.verdict_row, 3),
            Value::Text("Dikkat: Sınırda (%30-35)".into())
        );
        assert_eq!(
            sheet.conditional_rule(layout.total_row, 6).map(|rule| rule.format.font_color),
            Some(Some(WATCH.0))
        );
    }

    #[test]
    fn cogs_without_sales_asks_for_data() {
        let config = EngineConfig::default();
        let mut sheet = Sheet::new(COGS_SHEET, 8);
        let layout = write_cogs_sheet(&mut sheet, &KpiDashboard::default(), &context(&config));
        assert_eq!(layout.categories.rows().len(), COGS_CATEGORIES.len() as u32);
        assert_eq!(
            sheet.value(layout.categories.first_row, 1),
            Value::Text("Kahve & Çay Hammaddeleri".into())
        );
        assert_eq!(sheet.value(layout.total_row, 6), Value::Text(String::new()));
        assert_eq!(sheet.value(layout.verdict_row, 3), Value::Text("Veri giriniz".into()));
    }

    #[test]
    fn satisfaction_summary_counts_scores() {
        let config = EngineConfig::default();
        let data: KpiDashboard = serde_json::from_str(
            r#"{"geri_bildirimler": [
                {"tarih": "2024-04-28", "kaynak": "Google", "puan": 5},
                {"kaynak": "QR Anket", "puan": 4},
                {"kaynak": "Masa", "puan": 2, "geri_bildirim": "Soğuk servis"},
                {"tarih": "2024-04-30", "kaynak": "Telefon"}
            ]}"#,
        )
        .unwrap();
        let mut sheet = Sheet::new(SATISFACTION_SHEET, 7);
        let layout = write_satisfaction_sheet(&mut sheet, &data, &context(&config));
        let first = layout.entries.first_row;
        assert_eq!(layout.entries.rows().len(), FEEDBACK_ROWS as u32);
        assert_eq!(sheet.value(first, 1), Value::Text("28.04.2024".into()));
        assert_eq!(
            sheet.conditional_rule(first, 3).map(|rule| rule.format.font_color),
            Some(Some(GOOD.0))
        );
        assert_eq!(
            sheet.conditional_rule(first + 2, 3).map(|rule| rule.format.font_color),
            Some(Some(CRITICAL.0))
        );
        assert!(sheet.conditional_rule(first + 3, 3).is_none());

        let summary = layout.summary.first_row;
        let average = sheet.value(summary, 2).as_number().unwrap();
        assert!((average - 11.0 / 3.0).abs() < 1e-9);
        assert_eq!(sheet.value(summary + 1, 2), Value::Number(3.0));
        assert_eq!(sheet.value(summary + 2, 2), Value::Number(2.0));
        let ratio = sheet.value(summary + 3, 2).as_number().unwrap();
        assert!((ratio - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(sheet.value(summary + 4, 2), Value::Number(1.0));
    }

    #[test]
    fn empty_feedback_keeps_the_summary_blank() {
        let config = EngineConfig::default();
        let mut sheet = Sheet::new(SATISFACTION_SHEET, 7);
        let layout = write_satisfaction_sheet(&mut sheet, &KpiDashboard::default(), &context(&config));
        let summary = layout.summary.first_row;
        assert_eq!(sheet.value(summary, 2), Value::Text(String::new()));
        assert_eq!(sheet.value(summary + 1, 2), Value::Number(0.0));
        assert_eq!(sheet.value(summary + 3, 2), Value::Text(String::new()));
    }

    #[test]
    fn tenure_counts_whole_months() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let member = |start: &str, end: &str| StaffMember {
            start: start.to_owned(),
            end: end.to_owned(),
            ..StaffMember::default()
        };
        assert_eq!(member("2023-01-15", "").tenure_months(today), Some(15));
        assert_eq!(member("01.03.2024", "2024-04-20").tenure_months(today), Some(1));
        assert_eq!(member("2024-04-10", "2024-04-02").tenure_months(today), Some(0));
        assert_eq!(member("", "").tenure_months(today), None);
        assert_eq!(member("geçen yıl", "").tenure_months(today), None);
    }

    #[test]
    fn staff_turnover_follows_exit_dates() {
        let config = EngineConfig::default();
        let data: KpiDashboard = serde_json::from_str(
            r#"{"personel": [
                {"ad": "Ayşe", "pozisyon": "Barista", "giris": "2023-01-15"},
                {"ad": "Mehmet", "pozisyon": "Garson", "giris": "01.03.2024", "cikis": "2024-04-20"},
                {"ad": "Can"}
            ]}"#,
        )
        .unwrap();
        let mut sheet = Sheet::new(STAFF_SHEET, 8);
        let layout = write_staff_sheet(&mut sheet, &data, &context(&config));
        let first = layout.entries.first_row;
        assert_eq!(layout.entries.rows().len(), STAFF_ROWS as u32);
        assert_eq!(sheet.value(first, 5), Value::Number(15.0));
        assert_eq!(sheet.value(first, 6), Value::Text(ACTIVE.into()));
        assert_eq!(sheet.value(first + 1, 4), Value::Text("20.04.2024".into()));
        assert_eq!(sheet.value(first + 1, 6), Value::Text(LEFT.into()));
        assert_eq!(sheet.value(first + 2, 6), Value::Text(String::new()));
        assert_eq!(
            sheet.conditional_rule(first + 1, 6).map(|rule| rule.format.font_color),
            Some(Some(CRITICAL.0))
        );

        let summary = layout.summary.first_row;
        assert_eq!(sheet.value(summary, 2), Value::Number(1.0));
        assert_eq!(sheet.value(summary + 1, 2), Value::Number(1.0));
        assert_eq!(sheet.value(summary + 2, 2), Value::Number(50.0));
        assert_eq!(sheet.value(summary + 3, 2), Value::Number(8.0));
        assert_eq!(
            sheet.conditional_rule(summary + 2, 2).map(|rule| rule.format.font_color),
            Some(Some(CRITICAL.0))
        );
    }

    #[test]
    fn dashboard_sheets_keep_their_order() {
        let config = EngineConfig::default();
        let workbook = workbook(&KpiDashboard::default(), &context(&config)).unwrap();
        let names: Vec<&str> = workbook.sheets().iter().map(|sheet| sheet.name()).collect();
        assert_eq!(
            names,
            [KPI_SHEET, DAILY_SHEET, COGS_SHEET, SATISFACTION_SHEET, TURNOVER_SHEET, STAFF_SHEET]
        );
    }
}
