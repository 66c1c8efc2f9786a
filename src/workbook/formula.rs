//! Formula templates over captured row ranges.
//!
//! Every helper takes the [`RowRange`] returned when the data rows were
//! written, so a formula keeps pointing at the right rows however many rows
//! earlier sections produced. An empty range always yields a formula that
//! evaluates to `""`, and every average or ratio guards its denominator.

use super::model::{Formula, RowRange};

/// Spreadsheet column name for a 0-based index: `0 → A`, `26 → AA`.
pub fn column_letter(column: u16) -> String {
    let mut index = u32::from(column) + 1;
    let mut letters = Vec::new();
    while index > 0 {
        let rem = ((index - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// `B5` for row 5, column 1.
pub fn cell_ref(row: u32, column: u16) -> String {
    format!("{}{}", column_letter(column), row)
}

fn over_range(range: RowRange, column: u16, build: impl FnOnce(&str) -> String) -> Formula {
    match range.span(column) {
        Some(span) => Formula::new(build(&span)),
        None => Formula::blank(),
    }
}

pub fn sum(range: RowRange, column: u16) -> Formula {
    over_range(range, column, |span| format!("SUM({})", span))
}

/// Average that is blank instead of `#DIV/0!` when no cell holds a number.
pub fn guarded_average(range: RowRange, column: u16) -> Formula {
    over_range(range, column, |span| format!("IFERROR(AVERAGE({}),\"\")", span))
}

pub fn guarded_max(range: RowRange, column: u16) -> Formula {
    over_range(range, column, |span| format!("IF(COUNT({0})=0,\"\",MAX({0}))", span))
}

pub fn guarded_min(range: RowRange, column: u16) -> Formula {
    over_range(range, column, |span| format!("IF(COUNT({0})=0,\"\",MIN({0}))", span))
}

/// Number of non-empty cells.
pub fn count_filled(range: RowRange, column: u16) -> Formula {
    over_range(range, column, |span| format!("COUNTA({})", span))
}

/// Number of cells holding a number; formula blanks (`""`) are not counted.
pub fn count_numbers(range: RowRange, column: u16) -> Formula {
    over_range(range, column, |span| format!("COUNT({})", span))
}

/// Number of cells equal to `label`.
pub fn count_matching(range: RowRange, column: u16, label: &str) -> Formula {
    over_range(range, column, |span| format!("COUNTIF({},{})", span, quote(label)))
}

/// `numerator / denominator * 100`, blank when the denominator is zero or empty.
///
/// Both arguments are formula expressions such as cell references.
pub fn guarded_ratio(numerator: &str, denominator: &str) -> Formula {
    Formula::new(format!(
        "IF(OR({d}=0,{d}=\"\"),\"\",{n}/{d}*100)",
        n = numerator,
        d = denominator
    ))
}

/// Nested `IF` choosing the label of the first tier whose threshold `value`
/// reaches, checked in the given order; blank when `value` is blank.
pub fn tiered_label(value: &str, tiers: &[(f64, &str)], fallback: &str) -> Formula {
    let mut expression = quote(fallback);
    for (threshold, label) in tiers.iter().rev() {
        expression = format!("IF({}>={},{},{})", value, threshold, quote(label), expression);
    }
    Formula::new(format!("IF({v}=\"\",\"\",{e})", v = value, e = expression))
}

/// Average seating time in minutes from a daily table turnover figure.
///
/// Placeholder heuristic: fixed minute bands per turnover step, not a
/// measured model.
pub fn seating_minutes(turnover: &str) -> Formula {
    Formula::new(format!(
        "IF({t}=\"\",\"\",IF({t}>=4,30,IF({t}>=3,45,IF({t}>=2,60,IF({t}>=1,90,120)))))",
        t = turnover
    ))
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
        assert_eq!(cell_ref(12, 2), "C12");
    }

    #[test]
    fn range_helpers_reference_the_captured_rows() {
        let range = RowRange::new(8, 11);
        assert_eq!(sum(range, 1).as_str(), "=SUM(B8:B11)");
        assert_eq!(guarded_average(range, 1).as_str(), "=IFERROR(AVERAGE(B8:B11),\"\")");
        assert_eq!(guarded_max(range, 2).as_str(), "=IF(COUNT(C8:C11)=0,\"\",MAX(C8:C11))");
        assert_eq!(count_filled(range, 0).as_str(), "=COUNTA(A8:A11)");
        assert_eq!(count_numbers(range, 8).as_str(), "=COUNT(I8:I11)");
        assert_eq!(count_matching(range, 7, "Bekliyor").as_str(), "=COUNTIF(H8:H11,\"Bekliyor\")");
    }

    #[test]
    fn empty_ranges_give_blank_formulas() {
        let empty = RowRange::empty_at(8);
        for formula in [
            sum(empty, 1),
            guarded_average(empty, 1),
            guarded_max(empty, 1),
            guarded_min(empty, 1),
            count_filled(empty, 1),
            count_matching(empty, 1, "x"),
        ] {
            assert_eq!(formula, Formula::blank());
        }
    }

    #[test]
    fn ratio_guards_its_denominator() {
        assert_eq!(
            guarded_ratio("B5", "C5").as_str(),
            "=IF(OR(C5=0,C5=\"\"),\"\",B5/C5*100)"
        );
    }

    #[test]
    fn tiers_nest_in_order() {
        let formula = tiered_label("D5", &[(90.0, "İyi"), (70.0, "Dikkat")], "Kritik");
        assert_eq!(
            formula.as_str(),
            "=IF(D5=\"\",\"\",IF(D5>=90,\"İyi\",IF(D5>=70,\"Dikkat\",\"Kritik\")))"
        );
    }
}
