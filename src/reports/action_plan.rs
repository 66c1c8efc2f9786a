//! Action plan ("Aksiyon Planı") workbook.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::workbook::formula::{self, cell_ref};
use crate::workbook::{NumberFormat, Sheet, TableCell, TableRange, TableSpec, Workbook, WorkbookError};

use super::{display_date, or_dash, ReportContext};

pub const REPORT_TYPE: &str = "AksiyonPlani";
pub const SHEET_NAME: &str = "Aksiyon Planı";
pub const NOTES_SHEET: &str = "Notlar";

const WIDTH: u16 = 8;
const STATUS: u16 = 7;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "yuksek")]
    High,
    #[default]
    #[serde(alias = "orta")]
    Medium,
    #[serde(alias = "dusuk")]
    Low,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "Yüksek",
            Priority::Medium => "Orta",
            Priority::Low => "Düşük",
        }
    }

    /// Text and fill colours.
    pub fn colors(self) -> (Rgb, Rgb) {
        match self {
            Priority::High => (Rgb::from_hex(0xEF4444), Rgb::from_hex(0xFEF2F2)),
            Priority::Medium => (Rgb::from_hex(0xF59E0B), Rgb::from_hex(0xFFFBEB)),
            Priority::Low => (Rgb::from_hex(0x22C55E), Rgb::from_hex(0xF0FDF4)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    #[default]
    #[serde(alias = "bekliyor")]
    Waiting,
    #[serde(alias = "devam")]
    InProgress,
    #[serde(alias = "tamamlandi")]
    Done,
}

impl ActionStatus {
    pub const ALL: [ActionStatus; 3] = [ActionStatus::Waiting, ActionStatus::InProgress, ActionStatus::Done];

    pub fn label(self) -> &'static str {
        match self {
            ActionStatus::Waiting => "Bekliyor",
            ActionStatus::InProgress => "Devam Ediyor",
            ActionStatus::Done => "Tamamlandı",
        }
    }

    pub fn colors(self) -> (Rgb, Rgb) {
        match self {
            ActionStatus::Waiting => (Rgb::from_hex(0x6B7280), Rgb::from_hex(0xF3F4F6)),
            ActionStatus::InProgress => (Rgb::from_hex(0x3B82F6), Rgb::from_hex(0xEFF6FF)),
            ActionStatus::Done => (Rgb::from_hex(0x22C55E), Rgb::from_hex(0xF0FDF4)),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionItem {
    #[serde(alias = "gorev")]
    pub task: String,
    #[serde(alias = "kategori")]
    pub category: String,
    #[serde(alias = "oncelik")]
    pub priority: Priority,
    #[serde(alias = "sorumlu")]
    pub owner: String,
    #[serde(alias = "baslangic")]
    pub start: String,
    #[serde(alias = "bitis")]
    pub end: String,
    #[serde(alias = "durum")]
    pub status: ActionStatus,
    #[serde(alias = "notlar")]
    pub notes: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionPlan {
    #[serde(alias = "isletme_adi")]
    pub business_name: String,
    #[serde(alias = "aksiyonlar")]
    pub items: Vec<ActionItem>,
}

impl ActionPlan {
    fn tasks(&self) -> impl Iterator<Item = &ActionItem> {
        self.items.iter().filter(|item| !item.task.trim().is_empty())
    }

    pub fn count(&self, status: ActionStatus) -> usize {
        self.tasks().filter(|item| item.status == status).count()
    }
}

/// Where the action table and its status summary landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanLayout {
    pub actions: TableRange,
    pub summary: TableRange,
}

fn badge(label: &str, (color, fill): (Rgb, Rgb)) -> TableCell {
    TableCell::text(label).with_color(color).with_fill(fill).bold().centered()
}

pub fn write_plan_sheet(sheet: &mut Sheet, data: &ActionPlan, context: &ReportContext<'_>) -> PlanLayout {
    let palette = context.palette;
    sheet.set_tab_color(palette.accent);
    sheet.set_column_widths(&[6.0, 45.0, 18.0, 12.0, 18.0, 14.0, 14.0, 16.0]);
    sheet.add_brand_header(
        context.brand,
        palette,
        "AKSİYON PLANI",
        &format!("{}  |  Tarih: {}", or_dash(&data.business_name), context.date_label()),
    );

    let mut spec = TableSpec::new(["#", "Görev / Aksiyon", "Kategori", "Öncelik", "Sorumlu", "Başlangıç", "Bitiş", "Durum"])
        .with_header_fill(palette.accent);
    for (index, item) in data.tasks().enumerate() {
        spec.push_row(vec![
            TableCell::number((index + 1) as f64, NumberFormat::Integer).centered(),
            TableCell::text(item.task.trim()),
            TableCell::text(or_dash(&item.category)),
            badge(item.priority.label(), item.priority.colors()),
            TableCell::text(or_dash(&item.owner)),
            TableCell::text(or_dash(&display_date(&item.start))).centered(),
            TableCell::text(or_dash(&display_date(&item.end))).centered(),
            badge(item.status.label(), item.status.colors()),
        ]);
    }
    let actions = sheet.add_table(spec);
    sheet.freeze_rows(actions.header_row);

    sheet.add_instruction_row(
        &format!(
            "Toplam: {} aksiyon | Bekliyor: {} | Devam: {} | Tamamlandı: {}",
            data.tasks().count(),
            data.count(ActionStatus::Waiting),
            data.count(ActionStatus::InProgress),
            data.count(ActionStatus::Done)
        ),
        palette.cream,
    );
    sheet.add_spacer(8.0);
    sheet.add_section_header("DURUM ÖZETİ", palette.primary, palette.light_bg);

    let range = actions.rows();
    let mut summary = TableSpec::new(["Durum", "Adet"]).starting_at(1);
    for status in ActionStatus::ALL {
        summary.push_row(vec![
            badge(status.label(), status.colors()),
            TableCell::formula(move |_| formula::count_matching(range, STATUS, status.label()), NumberFormat::Integer),
        ]);
    }
    summary.push_row(vec![
        TableCell::text("Toplam").bold(),
        TableCell::formula(move |_| formula::count_filled(range, 1), NumberFormat::Integer).bold(),
    ]);
    summary.push_row(vec![
        TableCell::text("Tamamlanma %").bold(),
        TableCell::formula(
            |row| formula::guarded_ratio(&cell_ref(row - 2, 2), &cell_ref(row - 1, 2)),
            NumberFormat::Percent,
        )
        .bold(),
    ]);
    let summary = sheet.add_table(summary);
    sheet.add_footer(&context.brand.contact_line(), palette.cream);
    PlanLayout { actions, summary }
}

fn write_notes_sheet(sheet: &mut Sheet, data: &ActionPlan, context: &ReportContext<'_>) {
    let palette = context.palette;
    sheet.set_column_widths(&[6.0, 40.0, 60.0]);
    sheet.add_section_header("AKSİYON NOTLARI", palette.primary, palette.cream);
    let mut spec = TableSpec::new(["#", "Görev", "Notlar"]);
    for (index, item) in data.tasks().enumerate() {
        if item.notes.trim().is_empty() {
            continue;
        }
        spec.push_row(vec![
            TableCell::number((index + 1) as f64, NumberFormat::Integer).centered(),
            TableCell::text(item.task.trim()),
            TableCell::text(item.notes.trim()),
        ]);
    }
    sheet.add_table(spec);
}

pub fn workbook(data: &ActionPlan, context: &ReportContext<'_>) -> Result<Workbook, WorkbookError> {
    let mut workbook = Workbook::new();
    let mut plan = Sheet::new(SHEET_NAME, WIDTH);
    write_plan_sheet(&mut plan, data, context);
    workbook.add_sheet(plan)?;

    if data.tasks().any(|item| !item.notes.trim().is_empty()) {
        let mut notes = Sheet::new(NOTES_SHEET, 3);
        write_notes_sheet(&mut notes, data, context);
        workbook.add_sheet(notes)?;
    }
    Ok(workbook)
}
