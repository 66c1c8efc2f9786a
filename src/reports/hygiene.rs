//! Daily hygiene checklist ("Hijyen Kontrol Listesi"), HACCP style.
//!
//! Three sections: equipment temperatures against their limits, staff
//! hygiene and surface cleaning. The workbook judges temperatures with a
//! formula so a printed blank form can be filled in later; the PDF judges
//! whatever readings the data already carries.

use serde::{Deserialize, Serialize};

use crate::model::{
    Block, CellRule, CellStyle, Column, HorizontalAlignment, InfoGrid, RowSelector, SectionHeader, SignatureBlock,
    Table, TitleBar, ValuePredicate,
};
use crate::workbook::formula::{self, cell_ref};
use crate::workbook::{
    CellFormat, CellRange, Condition, ConditionalRule, Formula, NumberFormat, Sheet, TableCell, TableRange, TableSpec,
    Workbook, WorkbookError,
};

use super::{or_dash, ReportContext};

pub const REPORT_TYPE: &str = "HijyenKontrol";
pub const TITLE: &str = "Günlük Hijyen Kontrol Listesi";
pub const SHEET_NAME: &str = "Hijyen Kontrol";

pub const COMPLIANT: &str = "Uygun";
pub const NON_COMPLIANT: &str = "Uygun Değil";

const WIDTH: u16 = 7;
const MARK: &str = "X";
const UNMARKED: &str = "☐";
const CLOSING_NOTE: &str = "HACCP uyumlu. Uygun değil işaretlemelerde aynı gün düzeltici faaliyet başlatılmalıdır.";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureReading {
    #[serde(alias = "ekipman")]
    pub equipment: String,
    #[serde(alias = "alt_sinir")]
    pub min: Option<f64>,
    #[serde(alias = "ust_sinir")]
    pub max: Option<f64>,
    #[serde(alias = "sabah")]
    pub morning: Option<f64>,
    #[serde(alias = "aksam")]
    pub evening: Option<f64>,
    #[serde(alias = "not")]
    pub note: String,
}

impl TemperatureReading {
    fn new(equipment: &str, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            equipment: equipment.to_owned(),
            min,
            max,
            ..Self::default()
        }
    }

    /// Target range as printed, e.g. `0 - 4 °C` or `min 63 °C`.
    pub fn target(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("{} - {} °C", min, max),
            (Some(min), None) => format!("min {} °C", min),
            (None, Some(max)) => format!("max {} °C", max),
            (None, None) => "-".to_owned(),
        }
    }

    fn within(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    /// `None` until a reading exists or when the equipment has no limits.
    pub fn compliant(&self) -> Option<bool> {
        if self.min.is_none() && self.max.is_none() {
            return None;
        }
        let readings: Vec<f64> = self.morning.into_iter().chain(self.evening).collect();
        if readings.is_empty() {
            return None;
        }
        Some(readings.iter().all(|value| self.within(*value)))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckItem {
    #[serde(alias = "madde")]
    pub item: String,
    /// Unset prints empty tick boxes.
    #[serde(alias = "uygun")]
    pub ok: Option<bool>,
    #[serde(alias = "kim")]
    pub owner: String,
    #[serde(alias = "aksiyon")]
    pub action: String,
}

impl CheckItem {
    fn new(item: &str) -> Self {
        Self {
            item: item.to_owned(),
            ..Self::default()
        }
    }

    /// Marks for the positive and negative columns.
    fn marks(&self, blank: &'static str) -> (&'static str, &'static str) {
        match self.ok {
            Some(true) => (MARK, ""),
            Some(false) => ("", MARK),
            None => (blank, blank),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HygieneCheck {
    #[serde(alias = "isletme_adi")]
    pub business_name: String,
    #[serde(alias = "sube")]
    pub branch: String,
    #[serde(alias = "vardiya")]
    pub shift: String,
    #[serde(alias = "kontrol_eden")]
    pub inspector: String,
    #[serde(alias = "sicakliklar")]
    pub temperatures: Vec<TemperatureReading>,
    #[serde(alias = "personel")]
    pub staff: Vec<CheckItem>,
    #[serde(alias = "yuzeyler")]
    pub surfaces: Vec<CheckItem>,
}

impl HygieneCheck {
    /// The data with every empty section replaced by the standard list.
    pub fn with_defaults(&self) -> Self {
        let mut filled = self.clone();
        if filled.temperatures.is_empty() {
            filled.temperatures = default_temperatures();
        }
        if filled.staff.is_empty() {
            filled.staff = default_staff_checks();
        }
        if filled.surfaces.is_empty() {
            filled.surfaces = default_surface_checks();
        }
        filled
    }

    fn header_line(&self, context: &ReportContext<'_>) -> String {
        format!(
            "{}  |  Şube: {}  |  Vardiya: {}  |  {}",
            or_dash(&self.business_name),
            or_dash(&self.branch),
            or_dash(&self.shift),
            context.date_label()
        )
    }
}

pub fn default_temperatures() -> Vec<TemperatureReading> {
    vec![
        TemperatureReading::new("Buzdolabı 1 (Ana)", Some(0.0), Some(4.0)),
        TemperatureReading::new("Buzdolabı 2 (İçecek)", Some(0.0), Some(4.0)),
        TemperatureReading::new("Dondurucu", None, Some(-18.0)),
        TemperatureReading::new("Sıcak Servis Tezgahı", Some(63.0), None),
        TemperatureReading::new("Bulaşık Mak. Son Durulama", Some(82.0), None),
    ]
}

pub fn default_staff_checks() -> Vec<CheckItem> {
    [
        "Temiz iş kıyafeti giyilmiş",
        "Saç bonesi / başlık takılmış",
        "Tırnaklar kısa ve ojesi yok",
        "El yıkama yapılıyor (20 sn)",
        "Yara/kesik varsa eldiven giyilmiş",
        "Takı/yüzük çıkarılmış",
    ]
    .into_iter()
    .map(CheckItem::new)
    .collect()
}

pub fn default_surface_checks() -> Vec<CheckItem> {
    [
        "Hazırlık tezgahları",
        "Kesme tahtaları (renk kodlu)",
        "Bar makineleri",
        "Zemin",
        "Lavabolar",
        "Çöp alanı",
        "Depo / Raf düzeni",
        "WC alanları",
    ]
    .into_iter()
    .map(CheckItem::new)
    .collect()
}

/// Limit test for one reading cell, or `None` when there are no limits.
fn limit_test(reading: &TemperatureReading, cell: &str) -> Option<String> {
    match (reading.min, reading.max) {
        (Some(min), Some(max)) => Some(format!("AND({c}>={min},{c}<={max})", c = cell, min = min, max = max)),
        (Some(min), None) => Some(format!("{}>={}", cell, min)),
        (None, Some(max)) => Some(format!("{}<={}", cell, max)),
        (None, None) => None,
    }
}

/// `Uygun` when every entered reading is within limits, blank until one is entered.
fn compliance(reading: &TemperatureReading, row: u32) -> Formula {
    let morning = cell_ref(row, 3);
    let evening = cell_ref(row, 4);
    match (limit_test(reading, &morning), limit_test(reading, &evening)) {
        (Some(morning_ok), Some(evening_ok)) => Formula::new(format!(
            "IF(AND({m}=\"\",{e}=\"\"),\"\",IF(AND(OR({m}=\"\",{mo}),OR({e}=\"\",{eo})),\"{ok}\",\"{bad}\"))",
            m = morning,
            e = evening,
            mo = morning_ok,
            eo = evening_ok,
            ok = COMPLIANT,
            bad = NON_COMPLIANT
        )),
        _ => Formula::blank(),
    }
}

#[derive(Clone, Copy, Debug)]
pub struct HygieneLayout {
    pub temperatures: TableRange,
    pub staff: TableRange,
    pub surfaces: TableRange,
    pub summary: TableRange,
}

fn check_table(sheet: &mut Sheet, headers: [&str; 6], items: &[CheckItem]) -> TableRange {
    let mut spec = TableSpec::new(headers);
    for (index, item) in items.iter().enumerate() {
        let (good, bad) = item.marks(UNMARKED);
        spec.push_row(vec![
            TableCell::number((index + 1) as f64, NumberFormat::Integer).centered(),
            TableCell::text(or_dash(&item.item)),
            TableCell::text(good).centered(),
            TableCell::text(bad).centered(),
            TableCell::text(item.owner.trim()),
            TableCell::text(item.action.trim()),
        ]);
    }
    sheet.add_table(spec)
}

pub fn write_hygiene_sheet(sheet: &mut Sheet, data: &HygieneCheck, context: &ReportContext<'_>) -> HygieneLayout {
    let palette = context.palette;
    let data = data.with_defaults();
    sheet.set_tab_color(palette.success);
    sheet.set_column_widths(&[6.0, 32.0, 14.0, 14.0, 14.0, 14.0, 24.0]);
    sheet.add_brand_header(context.brand, palette, "GÜNLÜK HİJYEN KONTROL LİSTESİ", &data.header_line(context));
    sheet.add_instruction_row(
        "Sabah ve akşam ölçümlerini girin; hedef dışındaki değerler otomatik olarak işaretlenir.",
        palette.cream,
    );

    sheet.add_section_header("A. SICAKLIK KAYITLARI", palette.danger, palette.light_bg);
    let mut spec = TableSpec::new(["#", "Ekipman", "Hedef", "Sabah (°C)", "Akşam (°C)", "Uygun?", "Not / Aksiyon"]);
    for (index, reading) in data.temperatures.iter().enumerate() {
        let judged = reading.clone();
        spec.push_row(vec![
            TableCell::number((index + 1) as f64, NumberFormat::Integer).centered(),
            TableCell::text(or_dash(&reading.equipment)),
            TableCell::text(reading.target()).centered(),
            TableCell::optional(reading.morning, NumberFormat::Decimal).centered(),
            TableCell::optional(reading.evening, NumberFormat::Decimal).centered(),
            TableCell::formula(move |row| compliance(&judged, row), NumberFormat::General)
                .bold()
                .centered(),
            TableCell::text(reading.note.trim()),
        ]);
    }
    let temperatures = sheet.add_table(spec);
    sheet.add_conditional_format(
        temperatures.column(5),
        vec![
            ConditionalRule::new(
                Condition::ContainsText(NON_COMPLIANT.to_owned()),
                CellFormat::new().bold().color(palette.danger).fill(palette.light_bg),
            ),
            ConditionalRule::new(
                Condition::ContainsText(COMPLIANT.to_owned()),
                CellFormat::new().bold().color(palette.success),
            ),
        ],
    );

    sheet.add_spacer(8.0);
    sheet.add_section_header("B. PERSONEL HİJYEN KONTROLÜ", palette.info, palette.light_bg);
    let staff = check_table(sheet, ["#", "Kontrol Maddesi", "Uygun", "Uygun Değil", "Kim?", "Aksiyon"], &data.staff);

    sheet.add_spacer(8.0);
    sheet.add_section_header("C. YÜZEY & ALAN TEMİZLİK KONTROLÜ", palette.success, palette.light_bg);
    let surfaces = check_table(sheet, ["#", "Alan / Yüzey", "Temiz", "Kirli", "Sorumlu", "Aksiyon"], &data.surfaces);

    sheet.add_spacer(8.0);
    sheet.add_section_header("KONTROL ÖZETİ", palette.primary, palette.light_bg);
    let (temps, people, areas) = (temperatures.rows(), staff.rows(), surfaces.rows());
    let summary = TableSpec::new(["Gösterge", "Adet"])
        .starting_at(1)
        .row(vec![
            TableCell::text("Uygun Ölçüm").bold(),
            TableCell::formula(move |_| formula::count_matching(temps, 5, COMPLIANT), NumberFormat::Integer)
                .centered(),
        ])
        .row(vec![
            TableCell::text("Hedef Dışı Ölçüm").bold(),
            TableCell::formula(move |_| formula::count_matching(temps, 5, NON_COMPLIANT), NumberFormat::Integer)
                .centered(),
        ])
        .row(vec![
            TableCell::text("Personel Uygunsuzluğu").bold(),
            TableCell::formula(move |_| formula::count_matching(people, 3, MARK), NumberFormat::Integer).centered(),
        ])
        .row(vec![
            TableCell::text("Kirli Alan").bold(),
            TableCell::formula(move |_| formula::count_matching(areas, 3, MARK), NumberFormat::Integer).centered(),
        ]);
    let summary = sheet.add_table(summary);
    sheet.add_conditional_format(
        CellRange::new(summary.first_row + 1, 2, summary.last_row, 2),
        vec![ConditionalRule::new(
            Condition::AtLeast(1.0),
            CellFormat::new().bold().color(palette.danger).fill(palette.light_bg),
        )],
    );

    sheet.add_spacer(8.0);
    sheet.add_key_values(
        &[("Kontrol Eden", or_dash(&data.inspector)), ("Yönetici Onay", String::new())],
        palette,
    );
    sheet.add_instruction_row(CLOSING_NOTE, palette.light_bg);
    sheet.add_footer(&context.brand.contact_line(), palette.cream);
    HygieneLayout {
        temperatures,
        staff,
        surfaces,
        summary,
    }
}

pub fn workbook(data: &HygieneCheck, context: &ReportContext<'_>) -> Result<Workbook, WorkbookError> {
    let mut workbook = Workbook::new();
    let mut sheet = Sheet::new(SHEET_NAME, WIDTH);
    write_hygiene_sheet(&mut sheet, data, context);
    workbook.add_sheet(sheet)?;
    Ok(workbook)
}

fn flag_rule(column: usize, value: &str, context: &ReportContext<'_>) -> CellRule {
    CellRule {
        column: Some(column),
        row: RowSelector::Any,
        predicate: ValuePredicate::Equals(value.to_owned()),
        style: CellStyle::text(context.palette.danger).bold(),
    }
}

fn temperature_table(readings: &[TemperatureReading], context: &ReportContext<'_>) -> Table {
    let reading = |value: Option<f64>| value.map(|value| value.to_string()).unwrap_or_default();
    let mut table = Table::new(vec![
        Column::fixed("#", 8.0).aligned(HorizontalAlignment::Center),
        Column::flex("Ekipman", 2.0),
        Column::flex("Hedef", 1.0).aligned(HorizontalAlignment::Center),
        Column::flex("Sabah (°C)", 0.8).aligned(HorizontalAlignment::Center),
        Column::flex("Akşam (°C)", 0.8).aligned(HorizontalAlignment::Center),
        Column::flex("Uygun?", 0.9).aligned(HorizontalAlignment::Center),
        Column::flex("Not", 1.4),
    ]);
    for (index, item) in readings.iter().enumerate() {
        let verdict = match item.compliant() {
            Some(true) => COMPLIANT,
            Some(false) => NON_COMPLIANT,
            None => "",
        };
        table.push_row([
            (index + 1).to_string(),
            or_dash(&item.equipment),
            item.target(),
            reading(item.morning),
            reading(item.evening),
            verdict.to_owned(),
            item.note.trim().to_owned(),
        ]);
    }
    table.with_rule(flag_rule(5, NON_COMPLIANT, context))
}

fn check_pdf_table(headers: [&str; 5], items: &[CheckItem], context: &ReportContext<'_>) -> Table {
    let [number, label, good, bad, owner] = headers;
    let mut table = Table::new(vec![
        Column::fixed(number, 8.0).aligned(HorizontalAlignment::Center),
        Column::flex(label, 2.4),
        Column::flex(good, 0.7).aligned(HorizontalAlignment::Center),
        Column::flex(bad, 0.8).aligned(HorizontalAlignment::Center),
        Column::flex(owner, 0.9),
        Column::flex("Aksiyon", 1.4),
    ]);
    for (index, item) in items.iter().enumerate() {
        let (good, bad) = item.marks("");
        table.push_row([
            (index + 1).to_string(),
            or_dash(&item.item),
            good.to_owned(),
            bad.to_owned(),
            item.owner.trim().to_owned(),
            item.action.trim().to_owned(),
        ]);
    }
    table.with_rule(flag_rule(3, MARK, context))
}

pub fn blocks(data: &HygieneCheck, context: &ReportContext<'_>) -> Vec<Block> {
    let palette = context.palette;
    let data = data.with_defaults();
    vec![
        TitleBar::new(TITLE)
            .with_subtitle(or_dash(&data.business_name))
            .with_meta(format!("HACCP  |  {}", context.date_label()))
            .into(),
        InfoGrid::new()
            .with_columns(4)
            .entry("Tarih", context.date_label())
            .entry("Şube", or_dash(&data.branch))
            .entry("Vardiya", or_dash(&data.shift))
            .entry("Kontrol Eden", or_dash(&data.inspector))
            .into(),
        SectionHeader::new("Sıcaklık Kayıtları").with_accent(palette.danger).into(),
        temperature_table(&data.temperatures, context).into(),
        SectionHeader::new("Personel Hijyen Kontrolü").with_accent(palette.info).into(),
        check_pdf_table(["#", "Kontrol Maddesi", "Uygun", "Uygun Değil", "Kim?"], &data.staff, context).into(),
        SectionHeader::new("Yüzey & Alan Temizlik Kontrolü").with_accent(palette.success).into(),
        check_pdf_table(["#", "Alan / Yüzey", "Temiz", "Kirli", "Sorumlu"], &data.surfaces, context).into(),
        SignatureBlock::new()
            .party("Kontrol Eden", or_dash(&data.inspector))
            .party("Yönetici Onay", "-")
            .with_caption("İmza")
            .into(),
    ]
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

    fn filled() -> HygieneCheck {
        serde_json::from_str(
            r#"{
                "isletme_adi": "Cafe Noir",
                "kontrol_eden": "Ayşe",
                "sicakliklar": [
                    {"ekipman": "Buzdolabı", "alt_sinir": 0, "ust_sinir": 4, "sabah": 3, "aksam": 6},
                    {"ekipman": "Dondurucu", "ust_sinir": -18, "sabah": -20},
                    {"ekipman": "Tezgah", "alt_sinir": 63},
                    {"ekipman": "Depo"}
                ],
                "personel": [
                    {"madde": "Bone", "uygun": true},
                    {"madde": "Eldiven", "uygun": false, "aksiyon": "Uyarıldı"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn readings_are_judged_against_their_limits() {
        let data = filled();
        assert_eq!(data.temperatures[0].compliant(), Some(false));
        assert_eq!(data.temperatures[1].compliant(), Some(true));
        assert_eq!(data.temperatures[2].compliant(), None);
        assert_eq!(data.temperatures[3].compliant(), None);
        assert_eq!(data.temperatures[1].target(), "max -18 °C");
        assert_eq!(data.temperatures[3].target(), "-");
    }

    #[test]
    fn workbook_formulas_flag_out_of_range_readings() {
        let config = EngineConfig::default();
        let mut sheet = Sheet::new(SHEET_NAME, WIDTH);
        let layout = write_hygiene_sheet(&mut sheet, &filled(), &context(&config));
        let first = layout.temperatures.first_row;
        assert_eq!(sheet.value(first, 5), Value::Text(NON_COMPLIANT.into()));
        assert_eq!(sheet.value(first + 1, 5), Value::Text(COMPLIANT.into()));
        assert_eq!(sheet.value(first + 2, 5), Value::Text(String::new()));
        assert_eq!(sheet.value(first + 3, 5), Value::Text(String::new()));
        assert_eq!(
            sheet.conditional_rule(first, 5).map(|rule| rule.format.font_color),
            Some(Some(config.palette.danger))
        );
        assert_eq!(
            sheet.conditional_rule(first + 1, 5).map(|rule| rule.format.font_color),
            Some(Some(config.palette.success))
        );

        let summary = layout.summary.first_row;
        assert_eq!(sheet.value(summary, 2), Value::Number(1.0));
        assert_eq!(sheet.value(summary + 1, 2), Value::Number(1.0));
        assert_eq!(sheet.value(summary + 2, 2), Value::Number(1.0));
        assert_eq!(sheet.value(summary + 3, 2), Value::Number(0.0));
        assert!(sheet.conditional_rule(summary + 2, 2).is_some());
        assert!(sheet.conditional_rule(summary + 3, 2).is_none());
    }

    #[test]
    fn blank_form_uses_the_standard_lists() {
        let config = EngineConfig::default();
        let mut sheet = Sheet::new(SHEET_NAME, WIDTH);
        let layout = write_hygiene_sheet(&mut sheet, &HygieneCheck::default(), &context(&config));
        assert_eq!(layout.temperatures.rows().len(), 5);
        assert_eq!(layout.staff.rows().len(), 6);
        assert_eq!(layout.surfaces.rows().len(), 8);
        assert_eq!(sheet.value(layout.staff.first_row, 2), Value::Text(UNMARKED.into()));
        assert_eq!(sheet.value(layout.temperatures.first_row, 5), Value::Text(String::new()));
        assert_eq!(sheet.value(layout.summary.first_row + 1, 2), Value::Number(0.0));
    }

    #[test]
    fn pdf_marks_failures_without_tick_boxes() {
        let config = EngineConfig::default();
        let blocks = blocks(&filled(), &context(&config));
        let tables: Vec<&Table> = blocks
            .iter()
            .filter_map(|block| match block {
                Block::Table(table) => Some(table),
                _ => None,
            })
            .collect();
        assert_eq!(tables.len(), 3);
        assert_eq!(tables[0].rows()[0][5], NON_COMPLIANT);
        assert!(tables[0].cell_style(0, 5).is_some());
        assert!(tables[0].cell_style(1, 5).is_none());
        assert_eq!(tables[1].rows()[1][3], MARK);
        assert!(tables[1].cell_style(1, 3).is_some());
        assert_eq!(tables[2].rows().len(), 8);
        assert!(tables
            .into_iter()
            .flat_map(|table| table.rows().iter().flatten())
            .all(|cell| !cell.contains(UNMARKED)));
        assert!(matches!(blocks.last(), Some(Block::SignatureBlock(_))));
    }
}
