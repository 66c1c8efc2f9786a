//! A worksheet filled top to bottom through a row cursor.
//!
//! Every `add_*` operation writes at the cursor and returns the next free row.
//! Tables hand back the rows they occupied as a [`TableRange`]; formula rows
//! receive that captured range instead of recomputing row numbers, so earlier
//! sections can grow or shrink without breaking later formulas.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use crate::color::Rgb;
use crate::config::{BrandConfig, Palette};

use super::eval::{evaluate_cell, Value};
use super::model::{
    Align, Cell, CellFormat, CellRange, CellValue, ConditionalRule, Formula, Merge,
    NumberFormat, RowRange, SheetImage,
};

const HEADER_ROW_HEIGHT: f64 = 28.0;
const DATA_ROW_HEIGHT: f64 = 22.0;
const BORDER: Rgb = Rgb::from_hex(0xD1D5DB);
const ZEBRA: Rgb = Rgb::from_hex(0xF5F5F5);
/// Default row height in pixels, used to reserve rows under images.
const ROW_PX: u32 = 20;

/// Formula computed from the row a table cell lands on.
pub type RowFormula = Arc<dyn Fn(u32) -> Formula + Send + Sync>;

/// Formula computed from a captured data range.
pub type RangeFormula = Box<dyn Fn(RowRange) -> Formula>;

#[derive(Clone)]
pub enum TableValue {
    Text(String),
    Number(f64),
    Formula(RowFormula),
    Blank,
}

/// One data cell of a table with optional style overrides.
#[derive(Clone)]
pub struct TableCell {
    pub value: TableValue,
    pub number: NumberFormat,
    pub fill: Option<Rgb>,
    pub font_color: Option<Rgb>,
    pub bold: bool,
    pub align: Option<Align>,
}

impl TableCell {
    fn with_value(value: TableValue) -> Self {
        Self {
            value,
            number: NumberFormat::General,
            fill: None,
            font_color: None,
            bold: false,
            align: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::with_value(TableValue::Text(text.into()))
    }

    pub fn number(value: f64, format: NumberFormat) -> Self {
        Self::with_value(TableValue::Number(value)).with_number(format)
    }

    /// Number cell that stays empty when `value` is `None`.
    pub fn optional(value: Option<f64>, format: NumberFormat) -> Self {
        match value {
            Some(value) => Self::number(value, format),
            None => Self::blank().with_number(format),
        }
    }

    pub fn formula(
        template: impl Fn(u32) -> Formula + Send + Sync + 'static,
        format: NumberFormat,
    ) -> Self {
        Self::with_value(TableValue::Formula(Arc::new(template))).with_number(format)
    }

    pub fn blank() -> Self {
        Self::with_value(TableValue::Blank)
    }

    pub fn with_number(mut self, format: NumberFormat) -> Self {
        self.number = format;
        self
    }

    pub fn with_fill(mut self, color: Rgb) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.font_color = Some(color);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn centered(mut self) -> Self {
        self.align = Some(Align::Center);
        self
    }
}

impl From<&str> for TableCell {
    fn from(value: &str) -> Self {
        TableCell::text(value)
    }
}

impl From<String> for TableCell {
    fn from(value: String) -> Self {
        TableCell::text(value)
    }
}

impl From<f64> for TableCell {
    fn from(value: f64) -> Self {
        TableCell::number(value, NumberFormat::General)
    }
}

/// Header and rows of a table written by [`Sheet::add_table`].
#[derive(Clone, Default)]
pub struct TableSpec {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<TableCell>>,
    /// Column of the first header cell.
    pub first_column: u16,
    pub header_fill: Option<Rgb>,
    pub row_height: Option<f64>,
}

impl TableSpec {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn row(mut self, cells: Vec<TableCell>) -> Self {
        self.rows.push(cells);
        self
    }

    pub fn push_row(&mut self, cells: Vec<TableCell>) {
        self.rows.push(cells);
    }

    pub fn starting_at(mut self, column: u16) -> Self {
        self.first_column = column;
        self
    }

    pub fn with_header_fill(mut self, color: Rgb) -> Self {
        self.header_fill = Some(color);
        self
    }

    pub fn with_row_height(mut self, height: f64) -> Self {
        self.row_height = Some(height);
        self
    }
}

/// Rows occupied by a written table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableRange {
    pub header_row: u32,
    pub first_row: u32,
    /// Equal to `first_row - 1` when the table has no data rows.
    pub last_row: u32,
    pub next_row: u32,
    pub first_column: u16,
    pub last_column: u16,
}

impl TableRange {
    pub fn rows(&self) -> RowRange {
        RowRange::new(self.first_row, self.last_row)
    }

    /// Data cells of one column, for conditional formats.
    pub fn column(&self, column: u16) -> CellRange {
        CellRange::column(column, self.rows())
    }
}

/// A formula placed in an aggregate row.
pub struct FormulaCell {
    pub column: u16,
    pub template: RangeFormula,
    pub number: NumberFormat,
}

impl FormulaCell {
    pub fn new(
        column: u16,
        number: NumberFormat,
        template: impl Fn(RowRange) -> Formula + 'static,
    ) -> Self {
        Self {
            column,
            template: Box::new(template),
            number,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Sheet {
    name: String,
    width: u16,
    tab_color: Option<Rgb>,
    column_widths: Vec<f64>,
    cells: BTreeMap<(u32, u16), Cell>,
    row_heights: BTreeMap<u32, f64>,
    merges: Vec<Merge>,
    conditional_formats: Vec<(CellRange, Vec<ConditionalRule>)>,
    images: Vec<SheetImage>,
    frozen_rows: u32,
    cursor: u32,
}

impl Sheet {
    /// Creates an empty sheet whose banners span `width` columns.
    pub fn new(name: impl Into<String>, width: u16) -> Self {
        Self {
            name: name.into(),
            width: width.max(1),
            tab_color: None,
            column_widths: Vec::new(),
            cells: BTreeMap::new(),
            row_heights: BTreeMap::new(),
            merges: Vec::new(),
            conditional_formats: Vec::new(),
            images: Vec::new(),
            frozen_rows: 0,
            cursor: 1,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of columns spanned by banners and footers.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Next free row.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn tab_color(&self) -> Option<Rgb> {
        self.tab_color
    }

    pub fn column_widths(&self) -> &[f64] {
        &self.column_widths
    }

    pub fn cells(&self) -> impl Iterator<Item = (&(u32, u16), &Cell)> {
        self.cells.iter()
    }

    pub fn cell(&self, row: u32, column: u16) -> Option<&Cell> {
        self.cells.get(&(row, column))
    }

    /// Evaluated value of a cell.
    pub fn value(&self, row: u32, column: u16) -> Value {
        evaluate_cell(self, row, column)
    }

    pub fn row_heights(&self) -> &BTreeMap<u32, f64> {
        &self.row_heights
    }

    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    pub fn conditional_formats(&self) -> &[(CellRange, Vec<ConditionalRule>)] {
        &self.conditional_formats
    }

    pub fn images(&self) -> &[SheetImage] {
        &self.images
    }

    pub fn frozen_rows(&self) -> u32 {
        self.frozen_rows
    }

    /// Writes one cell without moving the cursor.
    pub fn set_cell(&mut self, row: u32, column: u16, value: impl Into<CellValue>, format: CellFormat) {
        self.cells.insert((row, column), Cell::new(value, format));
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.row_heights.insert(row, height);
    }

    pub fn set_tab_color(&mut self, color: Rgb) {
        self.tab_color = Some(color);
    }

    pub fn set_column_widths(&mut self, widths: &[f64]) {
        self.column_widths = widths.to_vec();
    }

    /// Keeps the first `rows` rows visible while scrolling.
    pub fn freeze_rows(&mut self, rows: u32) {
        self.frozen_rows = rows;
    }

    fn merged_row(&mut self, row: u32, text: impl Into<String>, format: CellFormat, height: f64) {
        self.set_cell(row, 0, CellValue::Text(text.into()), format);
        if self.width > 1 {
            self.merges.push(Merge {
                row,
                first_col: 0,
                last_col: self.width - 1,
            });
        }
        self.set_row_height(row, height);
    }

    /// Brand bar, title, subtitle and a thin spacer row.
    pub fn add_brand_header(
        &mut self,
        brand: &BrandConfig,
        palette: &Palette,
        title: &str,
        subtitle: &str,
    ) -> u32 {
        let row = self.cursor;
        self.merged_row(
            row,
            brand.banner(),
            CellFormat::new().bold().size(14.0).color(Rgb::WHITE).fill(palette.primary).centered(),
            36.0,
        );
        self.merged_row(
            row + 1,
            title,
            CellFormat::new().bold().size(12.0).color(Rgb::WHITE).fill(palette.accent).centered(),
            30.0,
        );
        self.merged_row(
            row + 2,
            subtitle,
            CellFormat::new().italic().size(9.0).color(palette.text_gray).fill(palette.cream).centered(),
            24.0,
        );
        self.set_row_height(row + 3, 8.0);
        self.cursor = row + 4;
        self.cursor
    }

    /// Full-width section label in `color` on `background`.
    pub fn add_section_header(&mut self, label: &str, color: Rgb, background: Rgb) -> u32 {
        let row = self.cursor;
        self.merged_row(
            row,
            label,
            CellFormat::new().bold().size(11.0).color(color).fill(background),
            28.0,
        );
        self.cursor = row + 1;
        self.cursor
    }

    /// Full-width italic note row.
    pub fn add_instruction_row(&mut self, text: &str, background: Rgb) -> u32 {
        let row = self.cursor;
        self.merged_row(
            row,
            text,
            CellFormat::new()
                .italic()
                .size(9.0)
                .color(Rgb::from_hex(0x6B7280))
                .fill(background)
                .wrapped(),
            36.0,
        );
        self.cursor = row + 1;
        self.cursor
    }

    /// Writes a header row and the data rows below it.
    pub fn add_table(&mut self, spec: TableSpec) -> TableRange {
        let header_row = self.cursor;
        let first_column = spec.first_column;
        let columns = spec
            .headers
            .len()
            .max(spec.rows.iter().map(Vec::len).max().unwrap_or(0))
            .max(1) as u16;
        let last_column = first_column + columns - 1;

        let header_format = CellFormat::new()
            .bold()
            .size(10.0)
            .color(Rgb::WHITE)
            .fill(spec.header_fill.unwrap_or(Rgb::from_hex(0x0B1F3B)))
            .centered()
            .wrapped()
            .bordered(BORDER);
        for column in 0..columns {
            let label = spec.headers.get(usize::from(column)).cloned().unwrap_or_default();
            self.set_cell(header_row, first_column + column, label, header_format.clone());
        }
        self.set_row_height(header_row, HEADER_ROW_HEIGHT);

        let first_row = header_row + 1;
        for (index, cells) in spec.rows.iter().enumerate() {
            let row = first_row + index as u32;
            let zebra = if index % 2 == 1 { ZEBRA } else { Rgb::WHITE };
            for column in 0..columns {
                let cell = cells.get(usize::from(column)).cloned().unwrap_or_else(TableCell::blank);
                let mut format = CellFormat::new()
                    .size(10.0)
                    .fill(cell.fill.unwrap_or(zebra))
                    .bordered(BORDER)
                    .number(cell.number.clone())
                    .align(cell.align.unwrap_or(Align::Left));
                format.font_color = cell.font_color;
                format.bold = cell.bold;
                let value = match &cell.value {
                    TableValue::Text(text) => CellValue::Text(text.clone()),
                    TableValue::Number(number) => CellValue::Number(*number),
                    TableValue::Formula(template) => CellValue::Formula(template(row)),
                    TableValue::Blank => CellValue::Empty,
                };
                self.set_cell(row, first_column + column, value, format);
            }
            self.set_row_height(row, spec.row_height.unwrap_or(DATA_ROW_HEIGHT));
        }

        let last_row = first_row + spec.rows.len() as u32 - 1;
        self.cursor = last_row + 1;
        debug!(
            "sheet {:?}: table rows {}..={} ({} data rows)",
            self.name,
            first_row,
            last_row,
            spec.rows.len()
        );
        TableRange {
            header_row,
            first_row,
            last_row,
            next_row: self.cursor,
            first_column,
            last_column,
        }
    }

    /// Aggregate row under a table: `label` in the table's first column and
    /// each template evaluated against the table's captured data rows.
    pub fn add_formula_row(&mut self, table: &TableRange, label: &str, cells: Vec<FormulaCell>) -> u32 {
        let row = self.cursor;
        let format = CellFormat::new()
            .bold()
            .size(10.0)
            .color(Rgb::WHITE)
            .fill(Rgb::from_hex(0x0B1F3B))
            .bordered(BORDER);
        for column in table.first_column..=table.last_column {
            self.set_cell(row, column, CellValue::Empty, format.clone());
        }
        self.set_cell(row, table.first_column, label, format.clone());
        let range = table.rows();
        for cell in cells {
            let formula = (cell.template)(range);
            self.set_cell(row, cell.column, formula, format.clone().number(cell.number));
        }
        self.set_row_height(row, HEADER_ROW_HEIGHT);
        self.cursor = row + 1;
        self.cursor
    }

    /// Attaches ordered rules to `range`; the first matching rule styles a cell.
    pub fn add_conditional_format(&mut self, range: CellRange, rules: Vec<ConditionalRule>) {
        if range.is_empty() || rules.is_empty() {
            return;
        }
        self.conditional_formats.push((range, rules));
    }

    /// The conditional rule that styles the cell, if any.
    pub fn conditional_rule(&self, row: u32, column: u16) -> Option<&ConditionalRule> {
        let value = self.value(row, column);
        self.conditional_formats
            .iter()
            .filter(|(range, _)| range.contains(row, column))
            .flat_map(|(_, rules)| rules.iter())
            .find(|rule| rule.condition.matches(&value))
    }

    /// Italic closing line across the sheet.
    pub fn add_footer(&mut self, text: &str, background: Rgb) -> u32 {
        let row = self.cursor + 1;
        self.merged_row(
            row,
            text,
            CellFormat::new()
                .italic()
                .size(8.0)
                .color(Rgb::from_hex(0x6B7280))
                .fill(background)
                .centered(),
            22.0,
        );
        self.cursor = row + 1;
        self.cursor
    }

    pub fn add_spacer(&mut self, height: f64) -> u32 {
        self.set_row_height(self.cursor, height);
        self.cursor += 1;
        self.cursor
    }

    /// Anchors an image at the cursor in column `column` and moves the cursor
    /// below it.
    pub fn add_image(&mut self, column: u16, bytes: Vec<u8>, width_px: u32, height_px: u32) -> u32 {
        let row = self.cursor;
        self.place_image(row, column, bytes, width_px, height_px);
        self.cursor = row + ((height_px + ROW_PX - 1) / ROW_PX).max(1);
        self.cursor
    }

    /// Anchors an image at a fixed cell without moving the cursor.
    pub fn place_image(&mut self, row: u32, column: u16, bytes: Vec<u8>, width_px: u32, height_px: u32) {
        self.images.push(SheetImage {
            row,
            column,
            bytes,
            width_px,
            height_px,
        });
    }

    /// Label/value pairs side by side, e.g. business name and visit date.
    pub fn add_key_values(&mut self, pairs: &[(&str, String)], palette: &Palette) -> u32 {
        let row = self.cursor;
        let label = CellFormat::new().bold().size(10.0).color(palette.primary).fill(palette.cream).bordered(BORDER);
        let value = CellFormat::new().size(10.0).bordered(BORDER);
        for (index, (key, text)) in pairs.iter().enumerate() {
            let column = (index * 2) as u16;
            if column + 1 >= self.width.max(2) {
                break;
            }
            self.set_cell(row, column, *key, label.clone());
            self.set_cell(row, column + 1, text.clone(), value.clone());
        }
        self.set_row_height(row, 24.0);
        self.cursor = row + 1;
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::formula;
    use crate::workbook::model::Condition;

    fn weekly(sheet: &mut Sheet, revenues: &[f64]) -> TableRange {
        let mut spec = TableSpec::new(["Hafta", "Ciro"]);
        for (index, revenue) in revenues.iter().enumerate() {
            spec.push_row(vec![
                TableCell::text(format!("{}. Hafta", index + 1)),
                TableCell::number(*revenue, NumberFormat::Integer),
            ]);
        }
        sheet.add_table(spec)
    }

    #[test]
    fn brand_header_takes_four_rows() {
        let mut sheet = Sheet::new("Özet", 6);
        let next = sheet.add_brand_header(&BrandConfig::default(), &Palette::default(), "Başlık", "Alt");
        assert_eq!(next, 5);
        assert_eq!(sheet.merges().len(), 3);
        assert_eq!(sheet.merges()[0].last_col, 5);
        assert_eq!(sheet.row_heights().get(&4), Some(&8.0));
    }

    #[test]
    fn formula_rows_follow_the_captured_range() {
        for extra_rows in [0u32, 3, 7] {
            let mut sheet = Sheet::new("Aylık", 2);
            sheet.add_brand_header(&BrandConfig::default(), &Palette::default(), "T", "S");
            for _ in 0..extra_rows {
                sheet.add_spacer(10.0);
            }
            let table = weekly(&mut sheet, &[10000.0, 12000.0, 11000.0, 13000.0]);
            assert_eq!(table.first_row, 6 + extra_rows);
            let total_row = sheet.cursor();
            sheet.add_formula_row(
                &table,
                "TOPLAM",
                vec![FormulaCell::new(1, NumberFormat::Integer, |range| formula::sum(range, 1))],
            );
            assert_eq!(sheet.value(total_row, 1), Value::Number(46000.0));
            let average_row = sheet.cursor();
            sheet.add_formula_row(
                &table,
                "ORTALAMA",
                vec![FormulaCell::new(1, NumberFormat::Integer, |range| formula::guarded_average(range, 1))],
            );
            assert_eq!(sheet.value(average_row, 1), Value::Number(11500.0));
        }
    }

    #[test]
    fn empty_table_gives_blank_aggregates() {
        let mut sheet = Sheet::new("Boş", 2);
        let table = weekly(&mut sheet, &[]);
        assert!(table.rows().is_empty());
        assert_eq!(table.next_row, table.header_row + 1);
        let row = sheet.cursor();
        sheet.add_formula_row(
            &table,
            "ORTALAMA",
            vec![FormulaCell::new(1, NumberFormat::Integer, |range| formula::guarded_average(range, 1))],
        );
        assert_eq!(sheet.value(row, 1), Value::Text(String::new()));
    }

    #[test]
    fn row_formulas_receive_their_row() {
        let mut sheet = Sheet::new("Satır", 3);
        sheet.add_spacer(8.0);
        let spec = TableSpec::new(["A", "B", "A/B"]).row(vec![
            TableCell::number(50.0, NumberFormat::General),
            TableCell::number(0.0, NumberFormat::General),
            TableCell::formula(|row| formula::guarded_ratio(&format!("A{}", row), &format!("B{}", row)), NumberFormat::Percent),
        ]);
        let table = sheet.add_table(spec);
        assert_eq!(
            sheet.cell(table.first_row, 2).map(|cell| cell.value.clone()),
            Some(CellValue::Formula(Formula::new("=IF(OR(B3=0,B3=\"\"),\"\",A3/B3*100)")))
        );
        assert_eq!(sheet.value(table.first_row, 2), Value::Text(String::new()));
    }

    #[test]
    fn first_matching_conditional_rule_wins() {
        let mut sheet = Sheet::new("KPI", 2);
        let table = weekly(&mut sheet, &[95.0, 75.0, 10.0]);
        let green = CellFormat::new().bold().color(Rgb::from_hex(0x16A34A));
        let amber = CellFormat::new().bold().color(Rgb::from_hex(0xD97706));
        sheet.add_conditional_format(
            table.column(1),
            vec![
                ConditionalRule::new(Condition::AtLeast(90.0), green.clone()),
                ConditionalRule::new(Condition::AtLeast(70.0), amber.clone()),
            ],
        );
        assert_eq!(sheet.conditional_rule(table.first_row, 1).map(|r| &r.format), Some(&green));
        assert_eq!(sheet.conditional_rule(table.first_row + 1, 1).map(|r| &r.format), Some(&amber));
        assert_eq!(sheet.conditional_rule(table.last_row, 1), None);
        assert_eq!(sheet.conditional_rule(table.first_row, 0), None);
    }

    #[test]
    fn images_reserve_rows() {
        let mut sheet = Sheet::new("Foto", 2);
        let next = sheet.add_image(0, vec![1, 2, 3], 200, 150);
        assert_eq!(next, 1 + 8);
        assert_eq!(sheet.images().len(), 1);
    }
}
