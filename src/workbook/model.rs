//! Cell values, formats, ranges and conditional rules of a workbook sheet.
//!
//! Rows are 1-based as in spreadsheet notation; columns are 0-based indices
//! (`0` is column `A`).

use std::fmt;

use crate::color::Rgb;

use super::formula::{cell_ref, column_letter};

/// Formula text, always stored with its leading `=`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Formula(String);

impl Formula {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.starts_with('=') {
            Formula(trimmed.to_owned())
        } else {
            Formula(format!("={}", trimmed))
        }
    }

    /// Formula evaluating to an empty string.
    pub fn blank() -> Self {
        Formula("=\"\"".to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Formula text without the leading `=`.
    pub fn expression(&self) -> &str {
        &self.0[1..]
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Formula(Formula),
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<Formula> for CellValue {
    fn from(value: Formula) -> Self {
        CellValue::Formula(value)
    }
}

/// Display format of numeric cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NumberFormat {
    #[default]
    General,
    /// `#,##0`
    Integer,
    /// `#,##0.0`
    Decimal,
    /// Raw number shown with a `%` suffix: `0.0"%"`.
    Percent,
    /// Thousands separator and a trailing currency suffix.
    Currency(String),
    Custom(String),
}

impl NumberFormat {
    /// Excel format code, `None` for the general format.
    pub fn code(&self) -> Option<String> {
        match self {
            NumberFormat::General => None,
            NumberFormat::Integer => Some("#,##0".to_owned()),
            NumberFormat::Decimal => Some("#,##0.0".to_owned()),
            NumberFormat::Percent => Some("0.0\"%\"".to_owned()),
            NumberFormat::Currency(suffix) => Some(format!("#,##0\" {}\"", suffix)),
            NumberFormat::Custom(code) => Some(code.clone()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Font, fill, border and number format of a cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellFormat {
    pub bold: bool,
    pub italic: bool,
    pub font_size: Option<f64>,
    pub font_color: Option<Rgb>,
    pub fill: Option<Rgb>,
    pub align: Align,
    pub wrap: bool,
    pub border: Option<Rgb>,
    pub number: NumberFormat,
}

impl CellFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn size(mut self, points: f64) -> Self {
        self.font_size = Some(points);
        self
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.font_color = Some(color);
        self
    }

    pub fn fill(mut self, color: Rgb) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn centered(self) -> Self {
        self.align(Align::Center)
    }

    pub fn wrapped(mut self) -> Self {
        self.wrap = true;
        self
    }

    pub fn bordered(mut self, color: Rgb) -> Self {
        self.border = Some(color);
        self
    }

    pub fn number(mut self, number: NumberFormat) -> Self {
        self.number = number;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub format: CellFormat,
}

impl Cell {
    pub fn new(value: impl Into<CellValue>, format: CellFormat) -> Self {
        Self {
            value: value.into(),
            format,
        }
    }
}

/// Inclusive span of data rows. Empty when `last < first`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowRange {
    pub first: u32,
    pub last: u32,
}

impl RowRange {
    pub fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    /// An empty range positioned at `row`.
    pub fn empty_at(row: u32) -> Self {
        Self {
            first: row,
            last: row.saturating_sub(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }

    pub fn len(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.last - self.first + 1
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = u32> {
        self.first..=self.last
    }

    /// `B5:B8` for column 1, `None` when the range is empty.
    pub fn span(&self, column: u16) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(format!("{}:{}", cell_ref(self.first, column), cell_ref(self.last, column)))
        }
    }
}

/// Rectangular block of cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl CellRange {
    pub fn new(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> Self {
        Self {
            first_row,
            first_col,
            last_row,
            last_col,
        }
    }

    /// One column over `rows`.
    pub fn column(column: u16, rows: RowRange) -> Self {
        Self::new(rows.first, column, rows.last, column)
    }

    pub fn is_empty(&self) -> bool {
        self.last_row < self.first_row || self.last_col < self.first_col
    }

    pub fn contains(&self, row: u32, column: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&column)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            column_letter(self.first_col),
            self.first_row,
            column_letter(self.last_col),
            self.last_row
        )
    }
}

/// Test applied by a conditional format.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    AtLeast(f64),
    Below(f64),
    Between(f64, f64),
    EqualTo(f64),
    ContainsText(String),
}

impl Condition {
    /// Whether a cell showing `value` satisfies the condition. Blank and
    /// non-numeric cells never satisfy a numeric condition.
    pub fn matches(&self, value: &super::eval::Value) -> bool {
        use super::eval::Value;
        match (self, value) {
            (Condition::ContainsText(needle), Value::Text(text)) => text.contains(needle.as_str()),
            (Condition::ContainsText(_), _) => false,
            (_, Value::Number(number)) => match self {
                Condition::AtLeast(threshold) => *number >= *threshold,
                Condition::Below(threshold) => *number < *threshold,
                Condition::Between(low, high) => (*low..=*high).contains(number),
                Condition::EqualTo(expected) => (number - expected).abs() < f64::EPSILON,
                Condition::ContainsText(_) => false,
            },
            _ => false,
        }
    }
}

/// One ordered conditional format rule; the first matching rule wins.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionalRule {
    pub condition: Condition,
    pub format: CellFormat,
}

impl ConditionalRule {
    pub fn new(condition: Condition, format: CellFormat) -> Self {
        Self { condition, format }
    }
}

/// Raster placed with its top-left corner at a cell.
#[derive(Clone, Debug, PartialEq)]
pub struct SheetImage {
    pub row: u32,
    pub column: u16,
    pub bytes: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

/// Horizontal merge within one row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Merge {
    pub row: u32,
    pub first_col: u16,
    pub last_col: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formulas_gain_a_leading_equals_sign() {
        assert_eq!(Formula::new("SUM(B2:B3)").as_str(), "=SUM(B2:B3)");
        assert_eq!(Formula::new("=1+1").expression(), "1+1");
        assert_eq!(Formula::blank().expression(), "\"\"");
    }

    #[test]
    fn row_range_spans() {
        assert_eq!(RowRange::new(5, 8).span(1).as_deref(), Some("B5:B8"));
        let empty = RowRange::empty_at(9);
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);
        assert_eq!(empty.span(1), None);
        assert_eq!(empty.rows().count(), 0);
    }

    #[test]
    fn number_format_codes() {
        assert_eq!(NumberFormat::Percent.code().as_deref(), Some("0.0\"%\""));
        assert_eq!(NumberFormat::Currency("₺".into()).code().as_deref(), Some("#,##0\" ₺\""));
        assert_eq!(NumberFormat::General.code(), None);
    }

    #[test]
    fn cell_range_display() {
        assert_eq!(CellRange::new(3, 0, 7, 2).to_string(), "A3:C7");
        assert!(CellRange::new(3, 0, 7, 2).contains(5, 1));
        assert!(!CellRange::new(3, 0, 7, 2).contains(8, 1));
    }
}
