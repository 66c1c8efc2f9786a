use report_forge::color::Rgb;
use report_forge::config::EngineConfig;
use report_forge::workbook::formula::{self, cell_ref};
use report_forge::workbook::{
    build_workbook, CellRange, Condition, ConditionalRule, CellFormat, FormulaCell, NumberFormat, Sheet, TableCell,
    TableSpec, Value, Workbook, WorkbookError,
};

fn revenue_table(sheet: &mut Sheet, weeks: &[f64]) -> report_forge::workbook::TableRange {
    let mut spec = TableSpec::new(["Hafta", "Ciro", "Pay %"]);
    for (index, revenue) in weeks.iter().enumerate() {
        spec.push_row(vec![
            TableCell::text(format!("{}. Hafta", index + 1)),
            TableCell::number(*revenue, NumberFormat::Integer),
            TableCell::blank(),
        ]);
    }
    let table = sheet.add_table(spec);
    sheet.add_formula_row(
        &table,
        "TOPLAM",
        vec![FormulaCell::new(1, NumberFormat::Integer, |range| formula::sum(range, 1))],
    );
    table
}

#[test]
fn sections_of_any_length_keep_their_formulas_aligned() {
    let config = EngineConfig::default();
    let mut sheet = Sheet::new("Ciro", 3);
    sheet.add_brand_header(&config.brand, &config.palette, "CİRO", "Cafe Noir");
    let first = revenue_table(&mut sheet, &[1000.0, 2000.0, 3000.0]);
    sheet.add_spacer(8.0);
    sheet.add_section_header("İkinci Dönem", config.palette.primary, config.palette.cream);
    let second = revenue_table(&mut sheet, &[500.0, 700.0]);

    assert_eq!(sheet.value(first.next_row, 1), Value::Number(6000.0));
    assert_eq!(sheet.value(second.next_row, 1), Value::Number(1200.0));
    assert!(second.header_row > first.next_row);
}

#[test]
fn empty_sections_produce_blank_aggregates() {
    let mut sheet = Sheet::new("Bos", 3);
    let table = revenue_table(&mut sheet, &[]);
    assert_eq!(sheet.value(table.next_row, 1), Value::Text(String::new()));
}

#[test]
fn guarded_ratios_never_divide_by_zero() {
    let mut sheet = Sheet::new("Oran", 3);
    let mut spec = TableSpec::new(["Hedef", "Gerçekleşen", "Oran"]);
    for (target, actual) in [(Some(200.0), Some(150.0)), (Some(0.0), Some(10.0)), (None, Some(5.0))] {
        spec.push_row(vec![
            TableCell::optional(target, NumberFormat::Integer),
            TableCell::optional(actual, NumberFormat::Integer),
            TableCell::formula(
                |row| formula::guarded_ratio(&cell_ref(row, 1), &cell_ref(row, 0)),
                NumberFormat::Percent,
            ),
        ]);
    }
    let table = sheet.add_table(spec);
    assert_eq!(sheet.value(table.first_row, 2), Value::Number(75.0));
    for row in table.first_row + 1..=table.last_row {
        assert!(!sheet.value(row, 2).is_error());
        assert_eq!(sheet.value(row, 2), Value::Text(String::new()));
    }
}

#[test]
fn conditional_rules_apply_in_order() {
    let mut sheet = Sheet::new("Skor", 1);
    let spec = TableSpec::new(["Skor"])
        .row(vec![TableCell::number(95.0, NumberFormat::General)])
        .row(vec![TableCell::number(75.0, NumberFormat::General)])
        .row(vec![TableCell::number(10.0, NumberFormat::General)]);
    let table = sheet.add_table(spec);
    let green = Rgb::from_hex(0x22C55E);
    let amber = Rgb::from_hex(0xF59E0B);
    let red = Rgb::from_hex(0xEF4444);
    sheet.add_conditional_format(
        CellRange::column(0, table.rows()),
        vec![
            ConditionalRule::new(Condition::AtLeast(90.0), CellFormat::new().color(green)),
            ConditionalRule::new(Condition::AtLeast(70.0), CellFormat::new().color(amber)),
            ConditionalRule::new(Condition::Below(70.0), CellFormat::new().color(red)),
        ],
    );
    let color = |row| sheet.conditional_rule(row, 0).and_then(|rule| rule.format.font_color);
    assert_eq!(color(table.first_row), Some(green));
    assert_eq!(color(table.first_row + 1), Some(amber));
    assert_eq!(color(table.last_row), Some(red));
}

#[test]
fn serialises_to_an_xlsx_archive() {
    let config = EngineConfig::default();
    let mut sheet = Sheet::new("Ciro", 3);
    sheet.add_brand_header(&config.brand, &config.palette, "CİRO", "Cafe Noir");
    revenue_table(&mut sheet, &[1000.0, 2000.0]);
    sheet.add_footer(&config.brand.contact_line(), config.palette.cream);

    let mut workbook = Workbook::new();
    workbook.add_sheet(sheet).unwrap();
    let bytes = build_workbook(&workbook).unwrap();
    assert!(bytes.starts_with(b"PK"), "xlsx files are zip archives");
}

#[test]
fn sheet_names_must_be_unique_and_present() {
    let mut workbook = Workbook::new();
    assert!(matches!(build_workbook(&workbook), Err(WorkbookError::Empty)));
    workbook.add_sheet(Sheet::new("Özet", 2)).unwrap();
    assert!(matches!(
        workbook.add_sheet(Sheet::new("özet", 2)),
        Err(WorkbookError::DuplicateSheet(_))
    ));
}
