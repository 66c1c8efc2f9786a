//! Advance widths of the PDF base-14 Helvetica faces for printable ASCII,
//! in thousandths of an em.

const FIRST: u32 = 32;
const FALLBACK_WIDTH: u16 = 556;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Width of `ch` in em thousandths; characters outside printable ASCII use the
/// width of a digit.
pub(crate) fn glyph_width(ch: char, bold: bool) -> u16 {
    let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
    (ch as u32)
        .checked_sub(FIRST)
        .and_then(|index| table.get(index as usize))
        .copied()
        .unwrap_or(FALLBACK_WIDTH)
}

/// Sum of glyph widths for `text` in em thousandths.
pub(crate) fn string_width(text: &str, bold: bool) -> u32 {
    text.chars().map(|ch| u32::from(glyph_width(ch, bold))).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_widths() {
        assert_eq!(glyph_width(' ', false), 278);
        assert_eq!(glyph_width('A', false), 667);
        assert_eq!(glyph_width('A', true), 722);
        assert_eq!(glyph_width('i', false), 222);
        assert_eq!(glyph_width('~', true), 584);
        assert_eq!(glyph_width('\u{00e7}', false), FALLBACK_WIDTH);
    }

    #[test]
    fn bold_is_never_narrower_for_letters() {
        for ch in ('a'..='z').chain('A'..='Z') {
            assert!(glyph_width(ch, true) >= glyph_width(ch, false), "{}", ch);
        }
    }
}
