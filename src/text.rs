//! Greedy word wrapping shared by block measurement and rendering.
//!
//! Both phases call [`wrap`] with the same font, size and width, which is what
//! keeps measured heights and drawn heights identical.

use crate::fonts::{line_height, FontSet};

/// Breaks `text` into lines no wider than `max_width` millimetres.
///
/// The text is prepared for the font family first (ASCII-folded for the
/// built-in family), explicit newlines start new lines, and words wider than a
/// whole line are split between characters. Blank input yields no lines.
pub fn wrap(fonts: &FontSet, text: &str, size: u8, bold: bool, max_width: f64) -> Vec<String> {
    let prepared = fonts.prepare(text);
    if prepared.trim().is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    for paragraph in prepared.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_owned()
            } else {
                format!("{} {}", current, word)
            };
            if fonts.text_width(&candidate, size, bold) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if fonts.text_width(word, size, bold) <= max_width {
                current = word.to_owned();
            } else {
                let mut pieces = split_long_word(fonts, word, size, bold, max_width);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }
        lines.push(current);
    }

    while lines.last().map_or(false, |line| line.is_empty()) {
        lines.pop();
    }
    lines
}

fn split_long_word(fonts: &FontSet, word: &str, size: u8, bold: bool, max_width: f64) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if current.chars().count() > 1 && fonts.text_width(&current, size, bold) > max_width {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Height of `line_count` lines at `size`.
pub fn block_height(line_count: usize, size: u8) -> f64 {
    line_count as f64 * line_height(size)
}

/// First wrapped line of `text`, with an ellipsis when more text follows.
pub fn single_line(fonts: &FontSet, text: &str, size: u8, bold: bool, max_width: f64) -> String {
    let lines = wrap(fonts, text, size, bold, max_width);
    match lines.len() {
        0 => String::new(),
        1 => lines.into_iter().next().unwrap_or_default(),
        _ => {
            let mut first = lines.into_iter().next().unwrap_or_default();
            while !first.is_empty() && fonts.text_width(&format!("{}...", first), size, bold) > max_width {
                first.pop();
            }
            format!("{}...", first.trim_end())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fonts() -> FontSet {
        FontSet::builtin()
    }

    #[test]
    fn short_text_stays_on_one_line() {
        assert_eq!(wrap(&fonts(), "Cafe Noir", 9, false, 100.0), vec!["Cafe Noir"]);
    }

    #[test]
    fn blank_text_has_no_lines() {
        assert!(wrap(&fonts(), "   ", 9, false, 100.0).is_empty());
        assert!(wrap(&fonts(), "", 9, false, 100.0).is_empty());
    }

    #[test]
    fn every_line_fits_the_width() {
        let fonts = fonts();
        let text = "Soğuk zincir sıcaklıkları uygun mu? Buzdolabı dört derecenin altında tutulmalı ve kayıt altına alınmalıdır.";
        let lines = wrap(&fonts, text, 9, false, 60.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(fonts.text_width(line, 9, false) <= 60.0, "{}", line);
        }
        assert_eq!(lines.join(" "), fonts.prepare(text));
    }

    #[test]
    fn explicit_newlines_are_kept() {
        assert_eq!(wrap(&fonts(), "a\nb", 9, false, 100.0), vec!["a", "b"]);
    }

    #[test]
    fn long_words_are_split() {
        let fonts = fonts();
        let lines = wrap(&fonts, &"W".repeat(40), 12, true, 30.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "W".repeat(40));
        for line in &lines {
            assert!(fonts.text_width(line, 12, true) <= 30.0);
        }
    }

    #[test]
    fn single_line_truncates_with_ellipsis() {
        let fonts = fonts();
        let line = single_line(&fonts, "Operasyonel Analiz ve Durum Tespiti", 9, false, 30.0);
        assert!(line.ends_with("..."));
        assert!(fonts.text_width(&line, 9, false) <= 30.0);
    }
}
