//! Formula-driven XLSX workbooks.
//!
//! Sheets are filled through a row cursor ([`Sheet`]); aggregate formulas are
//! built from the row ranges captured while writing ([`formula`]) and
//! evaluated locally ([`eval`]) so tests and cached results agree with what a
//! spreadsheet application computes.

pub mod eval;
pub mod formula;
pub mod model;
mod sheet;
mod xlsx;

use thiserror::Error;

pub use eval::{evaluate, evaluate_cell, FormulaError, Value};
pub use model::{
    Align, Cell, CellFormat, CellRange, CellValue, Condition, ConditionalRule, Formula, Merge,
    NumberFormat, RowRange, SheetImage,
};
pub use sheet::{FormulaCell, Sheet, TableCell, TableRange, TableSpec, TableValue};

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("xlsx writer failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("duplicate sheet name {0:?}")]
    DuplicateSheet(String),
    #[error("workbook has no sheets")]
    Empty,
}

/// Ordered collection of sheets.
#[derive(Clone, Debug, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sheet; names must be unique, ignoring case.
    pub fn add_sheet(&mut self, sheet: Sheet) -> Result<(), WorkbookError> {
        if self.sheet(sheet.name()).is_some() {
            return Err(WorkbookError::DuplicateSheet(sheet.name().to_owned()));
        }
        self.sheets.push(sheet);
        Ok(())
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name().to_lowercase() == name.to_lowercase())
    }

    /// XLSX bytes of the whole workbook.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WorkbookError> {
        xlsx::write_workbook(self)
    }
}

/// XLSX bytes of `workbook`.
pub fn build_workbook(workbook: &Workbook) -> Result<Vec<u8>, WorkbookError> {
    workbook.to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_sheet_names() {
        let mut workbook = Workbook::new();
        workbook.add_sheet(Sheet::new("Özet", 4)).unwrap();
        assert!(matches!(
            workbook.add_sheet(Sheet::new("özet", 4)),
            Err(WorkbookError::DuplicateSheet(_))
        ));
    }

    #[test]
    fn empty_workbook_is_an_error() {
        assert!(matches!(Workbook::new().to_bytes(), Err(WorkbookError::Empty)));
    }

    #[test]
    fn writes_a_zip_container() {
        let mut sheet = Sheet::new("Veri", 2);
        sheet.set_cell(1, 0, "Ciro", CellFormat::new().bold());
        sheet.set_cell(1, 1, 1250.0, CellFormat::new().number(NumberFormat::Integer));
        sheet.set_cell(2, 1, Formula::new("=B1*2"), CellFormat::new());
        let mut workbook = Workbook::new();
        workbook.add_sheet(sheet).unwrap();
        let bytes = workbook.to_bytes().unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
