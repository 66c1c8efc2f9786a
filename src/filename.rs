//! Deterministic, filesystem-safe names for generated files.

use chrono::NaiveDate;

use crate::fonts::transliterate;

/// Entity used when the business or person name is blank.
pub const FALLBACK_ENTITY: &str = "Rapor";

const FORBIDDEN: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Strips characters Windows, macOS or Linux refuse in file names and joins
/// whitespace runs with `_`. With `ascii_only` the text is transliterated and
/// anything still outside ASCII is dropped.
pub fn sanitize_component(text: &str, ascii_only: bool) -> String {
    let text = if ascii_only {
        transliterate(text)
    } else {
        text.to_owned()
    };
    let kept: String = text
        .chars()
        .filter(|ch| !FORBIDDEN.contains(ch) && !ch.is_control())
        .filter(|ch| !ascii_only || ch.is_ascii())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("_")
}

/// `{report_type}_{entity}_{YYYY-MM-DD}.{extension}`.
pub fn report_filename(
    report_type: &str,
    entity: &str,
    date: NaiveDate,
    extension: &str,
    ascii_only: bool,
) -> String {
    let mut entity = sanitize_component(entity, ascii_only);
    if entity.trim_matches(|ch| ch == '_' || ch == '.').is_empty() {
        entity = FALLBACK_ENTITY.to_owned();
    }
    format!(
        "{}_{}_{}.{}",
        sanitize_component(report_type, true),
        entity,
        date.format("%Y-%m-%d"),
        extension.trim_start_matches('.')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn whitespace_becomes_underscores() {
        assert_eq!(
            report_filename("DurumOzeti", "Cafe  Noir", date(), "pdf", false),
            "DurumOzeti_Cafe_Noir_2024-05-01.pdf"
        );
    }

    #[test]
    fn forbidden_characters_are_stripped() {
        assert_eq!(sanitize_component("A/B:C*D?\"E<F>G|H\\I\t", false), "ABCDEFGHI");
    }

    #[test]
    fn turkish_names_are_transliterated_when_ascii_only() {
        assert_eq!(
            report_filename("Kontrol", "Şişli Çay Evi", date(), "xlsx", true),
            "Kontrol_Sisli_Cay_Evi_2024-05-01.xlsx"
        );
        assert_eq!(sanitize_component("Şişli", false), "Şişli");
    }

    #[test]
    fn blank_entity_falls_back() {
        assert_eq!(
            report_filename("Teklif", " / ", date(), ".pdf", true),
            "Teklif_Rapor_2024-05-01.pdf"
        );
    }
}
