//! Operations checklist ("Kontrol Listesi") workbook with embedded photos.

use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::assets::ImageAsset;
use crate::color::Rgb;
use crate::workbook::formula::{self, cell_ref};
use crate::workbook::{
    CellFormat, CellRange, Condition, Formula, ConditionalRule, FormulaCell, NumberFormat, Sheet, TableCell, TableRange, TableSpec,
    Workbook, WorkbookError,
};

use super::{or_dash, ReportContext};

pub const REPORT_TYPE: &str = "KontrolListesi";
pub const SUMMARY_SHEET: &str = "Özet";
pub const DETAIL_SHEET: &str = "Detay";
pub const MISSING_SHEET: &str = "Eksikler";

const PHOTO_COLUMN: u16 = 5;
const PHOTO_WIDTH: u32 = 140;
const PHOTO_HEIGHT: u32 = 105;
const PHOTO_ROW_HEIGHT: f64 = 85.0;

const DONE: Rgb = Rgb::from_hex(0x22C55E);
const AMBER: Rgb = Rgb::from_hex(0xF59E0B);
const MISSING: Rgb = Rgb::from_hex(0xEF4444);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    #[serde(alias = "kritik")]
    Critical,
    #[serde(alias = "onemli")]
    Important,
    #[default]
    Normal,
}

impl Importance {
    pub fn label(self) -> &'static str {
        match self {
            Importance::Critical => "Kritik",
            Importance::Important => "Önemli",
            Importance::Normal => "Normal",
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            Importance::Critical => MISSING,
            Importance::Important => AMBER,
            Importance::Normal => Rgb::from_hex(0x6B7280),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckItem {
    pub text: String,
    pub checked: bool,
    #[serde(alias = "not")]
    pub note: String,
    #[serde(alias = "onem")]
    pub importance: Importance,
    pub photo: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckCategory {
    pub title: String,
    pub items: Vec<CheckItem>,
}

impl CheckCategory {
    pub fn done(&self) -> usize {
        self.items.iter().filter(|item| item.checked).count()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Checklist {
    #[serde(alias = "isletme_adi")]
    pub business_name: String,
    #[serde(alias = "kategoriler")]
    pub categories: Vec<CheckCategory>,
}

impl Checklist {
    fn items(&self) -> impl Iterator<Item = (&CheckCategory, &CheckItem)> {
        self.categories
            .iter()
            .flat_map(|category| category.items.iter().map(move |item| (category, item)))
    }

    /// Distinct photo references in item order.
    pub fn photo_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        for (_, item) in self.items() {
            let url = item.photo.trim();
            if !url.is_empty() && !urls.iter().any(|seen| seen == url) {
                urls.push(url.to_owned());
            }
        }
        urls
    }
}

fn write_summary(sheet: &mut Sheet, data: &Checklist, context: &ReportContext<'_>) -> TableRange {
    let palette = context.palette;
    sheet.set_tab_color(palette.accent);
    sheet.set_column_widths(&[30.0, 12.0, 12.0, 12.0, 12.0]);
    sheet.add_brand_header(
        context.brand,
        palette,
        "KONTROL LİSTESİ RAPORU",
        &format!("{}  |  Tarih: {}", or_dash(&data.business_name), context.date_label()),
    );

    let mut spec = TableSpec::new(["Kategori", "Toplam", "Tamam", "Eksik", "Oran %"]).with_header_fill(palette.accent);
    for category in &data.categories {
        spec.push_row(vec![
            TableCell::text(or_dash(&category.title)).bold(),
            TableCell::number(category.items.len() as f64, NumberFormat::Integer).centered(),
            TableCell::number(category.done() as f64, NumberFormat::Integer).centered(),
            TableCell::formula(
                |row| Formula::new(format!("{}-{}", cell_ref(row, 1), cell_ref(row, 2))),
                NumberFormat::Integer,
            )
            .centered(),
            TableCell::formula(|row| formula::guarded_ratio(&cell_ref(row, 2), &cell_ref(row, 1)), NumberFormat::Percent)
                .centered(),
        ]);
    }
    let table = sheet.add_table(spec);
    let total_row = sheet.cursor();
    sheet.add_formula_row(
        &table,
        "TOPLAM",
        vec![
            FormulaCell::new(1, NumberFormat::Integer, |range| formula::sum(range, 1)),
            FormulaCell::new(2, NumberFormat::Integer, |range| formula::sum(range, 2)),
            FormulaCell::new(3, NumberFormat::Integer, |range| formula::sum(range, 3)),
            FormulaCell::new(4, NumberFormat::Percent, move |_| {
                formula::guarded_ratio(&cell_ref(total_row, 2), &cell_ref(total_row, 1))
            }),
        ],
    );
    sheet.add_conditional_format(
        CellRange::new(table.first_row, 4, total_row, 4),
        vec![
            ConditionalRule::new(Condition::AtLeast(80.0), CellFormat::new().bold().color(DONE)),
            ConditionalRule::new(Condition::AtLeast(50.0), CellFormat::new().bold().color(AMBER)),
            ConditionalRule::new(Condition::Below(50.0), CellFormat::new().bold().color(MISSING)),
        ],
    );
    sheet.add_footer(&context.brand.contact_line(), palette.cream);
    table
}

fn write_detail(
    sheet: &mut Sheet,
    data: &Checklist,
    context: &ReportContext<'_>,
    photos: &HashMap<&str, ImageAsset>,
) -> TableRange {
    let palette = context.palette;
    sheet.set_column_widths(&[26.0, 50.0, 10.0, 10.0, 30.0, 22.0]);
    sheet.add_section_header("Kontrol Listesi: Detaylı Sonuçlar", palette.primary, palette.cream);

    let mut spec = TableSpec::new(["Kategori", "Madde", "Önem", "Durum", "Not", "Fotoğraf"]);
    let mut thumbnails = Vec::new();
    for (index, (category, item)) in data.items().enumerate() {
        let photo = match photos.get(item.photo.trim()) {
            Some(ImageAsset::Ready(image)) => match image.thumbnail_png(PHOTO_WIDTH, PHOTO_HEIGHT) {
                Ok(thumbnail) => {
                    thumbnails.push((index, thumbnail));
                    TableCell::blank()
                }
                Err(reason) => {
                    warn!("Checklist photo {} not embedded: {}", item.photo, reason);
                    TableCell::text(context.brand.unavailable_label.clone())
                }
            },
            Some(ImageAsset::Unavailable { .. }) => TableCell::text(context.brand.unavailable_label.clone()),
            None => TableCell::text("-"),
        };
        let (status, color) = if item.checked { ("TAMAM", DONE) } else { ("EKSİK", MISSING) };
        spec.push_row(vec![
            TableCell::text(or_dash(&category.title)),
            TableCell::text(or_dash(&item.text)),
            TableCell::text(item.importance.label()).with_color(item.importance.color()).bold(),
            TableCell::text(status).with_color(color).bold().centered(),
            TableCell::text(or_dash(&item.note)),
            photo,
        ]);
    }
    let table = sheet.add_table(spec);
    for (index, (png, width, height)) in thumbnails {
        let row = table.first_row + index as u32;
        sheet.place_image(row, PHOTO_COLUMN, png, width, height);
        sheet.set_row_height(row, PHOTO_ROW_HEIGHT);
    }
    sheet.freeze_rows(table.header_row);
    table
}

fn write_missing(sheet: &mut Sheet, data: &Checklist, context: &ReportContext<'_>) -> TableRange {
    sheet.set_tab_color(MISSING);
    sheet.set_column_widths(&[26.0, 50.0, 10.0, 30.0]);
    sheet.add_section_header("Eksik Maddeler", MISSING, Rgb::from_hex(0xFEF2F2));
    let mut spec = TableSpec::new(["Kategori", "Madde", "Önem", "Not"]).with_header_fill(MISSING);
    for (category, item) in data.items().filter(|(_, item)| !item.checked) {
        spec.push_row(vec![
            TableCell::text(or_dash(&category.title)),
            TableCell::text(or_dash(&item.text)),
            TableCell::text(item.importance.label()).with_color(item.importance.color()).bold(),
            TableCell::text(or_dash(&item.note)),
        ]);
    }
    let table = sheet.add_table(spec);
    sheet.add_footer(&context.brand.contact_line(), context.palette.cream);
    table
}

/// Builds the workbook. `photos` are the resolved images of `urls`, which
/// should come from [`Checklist::photo_urls`].
pub fn workbook(
    data: &Checklist,
    context: &ReportContext<'_>,
    urls: &[String],
    photos: Vec<ImageAsset>,
) -> Result<Workbook, WorkbookError> {
    let photos: HashMap<&str, ImageAsset> = urls.iter().map(String::as_str).zip(photos).collect();
    let mut workbook = Workbook::new();

    let mut summary = Sheet::new(SUMMARY_SHEET, 5);
    write_summary(&mut summary, data, context);
    workbook.add_sheet(summary)?;

    let mut detail = Sheet::new(DETAIL_SHEET, 6);
    write_detail(&mut detail, data, context, &photos);
    workbook.add_sheet(detail)?;

    if data.items().any(|(_, item)| !item.checked) {
        let mut missing = Sheet::new(MISSING_SHEET, 4);
        write_missing(&mut missing, data, context);
        workbook.add_sheet(missing)?;
    }
    Ok(workbook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::assets::EmbeddedImage;
    use crate::config::EngineConfig;
    use crate::workbook::{CellValue, Value};
    use chrono::NaiveDate;
    use image::DynamicImage;

    fn checklist() -> Checklist {
        serde_json::from_str(
            r#"{
                "isletme_adi": "Cafe Noir",
                "kategoriler": [
                    {"title": "Mutfak", "items": [
                        {"text": "Soğuk oda ısısı", "checked": true, "photo": "/uploads/a.jpg"},
                        {"text": "Etiketler", "onem": "kritik", "photo": "/uploads/b.jpg"},
                        {"text": "Zemin", "checked": true},
                        {"text": "Davlumbaz", "checked": true}
                    ]},
                    {"title": "Salon", "items": [
                        {"text": "Masa düzeni", "checked": false, "not": "Akşam tekrar"}
                    ]}
                ]
            }"#,
        )
        .unwrap()
    }

    fn context(config: &EngineConfig) -> ReportContext<'_> {
        ReportContext::new(config, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
    }

    #[test]
    fn summary_ratios_follow_category_counts() {
        let config = EngineConfig::default();
        let mut sheet = Sheet::new(SUMMARY_SHEET, 5);
        let table = write_summary(&mut sheet, &checklist(), &context(&config));
        assert_eq!(sheet.value(table.first_row, 3), Value::Number(1.0));
        assert_eq!(sheet.value(table.first_row, 4), Value::Number(75.0));
        assert_eq!(sheet.value(table.last_row, 4), Value::Number(0.0));
        let total_row = table.next_row;
        assert_eq!(sheet.value(total_row, 1), Value::Number(5.0));
        let overall = sheet.value(total_row, 4).as_number().unwrap();
        assert!((overall - 60.0).abs() < 1e-9);
        assert_eq!(
            sheet.conditional_rule(table.last_row, 4).map(|rule| rule.format.font_color),
            Some(Some(MISSING))
        );
    }

    #[test]
    fn photos_embed_or_fall_back_to_a_note() {
        let config = EngineConfig::default();
        let data = checklist();
        let urls = data.photo_urls();
        assert_eq!(urls, vec!["/uploads/a.jpg".to_owned(), "/uploads/b.jpg".to_owned()]);
        let ready = ImageAsset::Ready(Arc::new(EmbeddedImage::from_dynamic(&DynamicImage::new_rgb8(280, 140))));
        let failed = ImageAsset::Unavailable {
            url: urls[1].clone(),
            reason: "404".into(),
        };
        let photos: HashMap<&str, ImageAsset> =
            urls.iter().map(String::as_str).zip(vec![ready, failed]).collect();

        let mut sheet = Sheet::new(DETAIL_SHEET, 6);
        let table = write_detail(&mut sheet, &data, &context(&config), &photos);
        assert_eq!(sheet.images().len(), 1);
        assert_eq!(sheet.images()[0].row, table.first_row);
        assert_eq!((sheet.images()[0].width_px, sheet.images()[0].height_px), (140, 70));
        assert_eq!(
            sheet.cell(table.first_row + 1, PHOTO_COLUMN).map(|cell| cell.value.clone()),
            Some(CellValue::Text("Foto yüklenemedi".into()))
        );
        assert_eq!(
            sheet.cell(table.first_row + 2, PHOTO_COLUMN).map(|cell| cell.value.clone()),
            Some(CellValue::Text("-".into()))
        );
    }

    #[test]
    fn missing_sheet_lists_unchecked_items() {
        let config = EngineConfig::default();
        let data = checklist();
        let mut sheet = Sheet::new(MISSING_SHEET, 4);
        let table = write_missing(&mut sheet, &data, &context(&config));
        assert_eq!(table.rows().len(), 2);
        assert_eq!(sheet.tab_color(), Some(MISSING));

        let workbook = workbook(&data, &context(&config), &[], Vec::new()).unwrap();
        assert_eq!(workbook.sheets().len(), 3);
        let mut complete = data;
        complete
            .categories
            .iter_mut()
            .flat_map(|category| category.items.iter_mut())
            .for_each(|item| item.checked = true);
        let workbook = super::workbook(&complete, &context(&config), &[], Vec::new()).unwrap();
        assert!(workbook.sheet(MISSING_SHEET).is_none());
    }
}
