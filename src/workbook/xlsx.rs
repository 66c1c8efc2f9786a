//! Serialises sheets with `rust_xlsxwriter`.
//!
//! Rows are 1-based in [`Sheet`] and 0-based in the writer. Formulas are
//! written together with the result computed by [`super::eval`] so viewers
//! that never recalculate still show the right figures.

use std::collections::HashSet;

use log::{debug, warn};
use rust_xlsxwriter::{
    Color, ConditionalFormatCell, ConditionalFormatCellRule, ConditionalFormatText,
    ConditionalFormatTextRule, Format, FormatAlign, FormatBorder, Image, Workbook as XlsxWorkbook,
    Worksheet, XlsxError,
};

use crate::color::Rgb;

use super::model::{Align, CellFormat, CellValue, Condition, ConditionalRule};
use super::sheet::Sheet;
use super::{Workbook, WorkbookError};

fn color(rgb: Rgb) -> Color {
    Color::RGB(rgb.as_u32())
}

fn format(cell: &CellFormat) -> Format {
    let mut format = Format::new().set_align(FormatAlign::VerticalCenter);
    if cell.bold {
        format = format.set_bold();
    }
    if cell.italic {
        format = format.set_italic();
    }
    if let Some(size) = cell.font_size {
        format = format.set_font_size(size);
    }
    if let Some(font_color) = cell.font_color {
        format = format.set_font_color(color(font_color));
    }
    if let Some(fill) = cell.fill {
        format = format.set_background_color(color(fill));
    }
    format = match cell.align {
        Align::Left => format,
        Align::Center => format.set_align(FormatAlign::Center),
        Align::Right => format.set_align(FormatAlign::Right),
    };
    if cell.wrap {
        format = format.set_text_wrap();
    }
    if let Some(border) = cell.border {
        format = format
            .set_border(FormatBorder::Thin)
            .set_border_color(color(border));
    }
    if let Some(code) = cell.number.code() {
        format = format.set_num_format(code);
    }
    format
}

fn write_conditional(
    worksheet: &mut Worksheet,
    sheet_range: &super::model::CellRange,
    rule: &ConditionalRule,
) -> Result<(), XlsxError> {
    let first_row = sheet_range.first_row - 1;
    let last_row = sheet_range.last_row - 1;
    let style = format(&rule.format);
    match &rule.condition {
        Condition::ContainsText(needle) => {
            let conditional = ConditionalFormatText::new()
                .set_rule(ConditionalFormatTextRule::Contains(needle.clone()))
                .set_format(style)
                .set_stop_if_true(true);
            worksheet.add_conditional_format(
                first_row,
                sheet_range.first_col,
                last_row,
                sheet_range.last_col,
                &conditional,
            )?;
        }
        numeric => {
            let cell_rule = match *numeric {
                Condition::AtLeast(threshold) => ConditionalFormatCellRule::GreaterThanOrEqualTo(threshold),
                Condition::Below(threshold) => ConditionalFormatCellRule::LessThan(threshold),
                Condition::Between(low, high) => ConditionalFormatCellRule::Between(low, high),
                Condition::EqualTo(expected) => ConditionalFormatCellRule::EqualTo(expected),
                Condition::ContainsText(_) => return Ok(()),
            };
            let conditional = ConditionalFormatCell::new()
                .set_rule(cell_rule)
                .set_format(style)
                .set_stop_if_true(true);
            worksheet.add_conditional_format(
                first_row,
                sheet_range.first_col,
                last_row,
                sheet_range.last_col,
                &conditional,
            )?;
        }
    }
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet) -> Result<(), XlsxError> {
    worksheet.set_name(sheet.name())?;
    if let Some(tab) = sheet.tab_color() {
        worksheet.set_tab_color(color(tab));
    }
    for (column, width) in sheet.column_widths().iter().enumerate() {
        worksheet.set_column_width(column as u16, *width)?;
    }
    for (row, height) in sheet.row_heights() {
        worksheet.set_row_height(row - 1, *height)?;
    }

    let mut anchors = HashSet::new();
    for merge in sheet.merges() {
        let (text, style) = match sheet.cell(merge.row, merge.first_col) {
            Some(cell) => (
                match &cell.value {
                    CellValue::Text(text) => text.clone(),
                    CellValue::Number(number) => number.to_string(),
                    CellValue::Formula(_) | CellValue::Empty => String::new(),
                },
                format(&cell.format),
            ),
            None => (String::new(), Format::new()),
        };
        worksheet.merge_range(merge.row - 1, merge.first_col, merge.row - 1, merge.last_col, &text, &style)?;
        anchors.insert((merge.row, merge.first_col));
    }

    for (&(row, column), cell) in sheet.cells() {
        if anchors.contains(&(row, column)) {
            continue;
        }
        let style = format(&cell.format);
        let row0 = row - 1;
        match &cell.value {
            CellValue::Empty => {
                worksheet.write_blank(row0, column, &style)?;
            }
            CellValue::Text(text) => {
                worksheet.write_string_with_format(row0, column, text, &style)?;
            }
            CellValue::Number(number) => {
                worksheet.write_number_with_format(row0, column, *number, &style)?;
            }
            CellValue::Formula(formula) => {
                let result = sheet.value(row, column);
                if result.is_error() {
                    warn!(
                        "sheet {:?}: {} in {} evaluates to {}",
                        sheet.name(),
                        formula,
                        super::formula::cell_ref(row, column),
                        result.display()
                    );
                }
                let formula = rust_xlsxwriter::Formula::new(formula.as_str()).set_result(result.display());
                worksheet.write_formula_with_format(row0, column, formula, &style)?;
            }
        }
    }

    for (range, rules) in sheet.conditional_formats() {
        for rule in rules {
            write_conditional(worksheet, range, rule)?;
        }
    }

    for image in sheet.images() {
        let picture = Image::new_from_buffer(&image.bytes)?;
        worksheet.insert_image(image.row - 1, image.column, &picture)?;
    }

    if sheet.frozen_rows() > 0 {
        worksheet.set_freeze_panes(sheet.frozen_rows(), 0)?;
    }
    Ok(())
}

/// Encodes every sheet of `workbook` into an XLSX file.
pub(crate) fn write_workbook(workbook: &Workbook) -> Result<Vec<u8>, WorkbookError> {
    if workbook.sheets().is_empty() {
        return Err(WorkbookError::Empty);
    }
    let mut output = XlsxWorkbook::new();
    for sheet in workbook.sheets() {
        let worksheet = output.add_worksheet();
        write_sheet(worksheet, sheet)?;
        debug!("wrote sheet {:?} ({} rows)", sheet.name(), sheet.cursor() - 1);
    }
    Ok(output.save_to_buffer()?)
}
