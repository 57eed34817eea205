/*!
 * Version registry: human release labels to program-identifier suffixes
 */

use serde::Serialize;
use std::fmt;

/// A released version of the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum VersionToken {
    Cc2017,
    Cc2018,
    Cc2019,
    Cc2020,
    Cc2021,
    Cc2022,
    Cc2023,
    Cc2024,
    Cc2025,
}

/// (token, release label, identifier suffix), oldest first
const VERSION_TABLE: &[(VersionToken, &str, &str)] = &[
    (VersionToken::Cc2017, "2017", "110"),
    (VersionToken::Cc2018, "2018", "120"),
    (VersionToken::Cc2019, "2019", "130"),
    (VersionToken::Cc2020, "2020", "140"),
    (VersionToken::Cc2021, "2021", "150"),
    (VersionToken::Cc2022, "2022", "160"),
    (VersionToken::Cc2023, "2023", "170"),
    (VersionToken::Cc2024, "2024", "180"),
    (VersionToken::Cc2025, "2025", "190"),
];

impl VersionToken {
    /// All known versions, oldest first
    pub fn all() -> impl DoubleEndedIterator<Item = VersionToken> {
        VERSION_TABLE.iter().map(|(token, _, _)| *token)
    }

    fn row(&self) -> &'static (VersionToken, &'static str, &'static str) {
        // The table holds exactly one row per variant
        &VERSION_TABLE[*self as usize]
    }

    /// Release label, e.g. "2024"
    pub fn year(&self) -> &'static str {
        self.row().1
    }

    /// Program-identifier suffix, e.g. "180"
    pub fn suffix(&self) -> &'static str {
        self.row().2
    }

    pub fn from_year(year: &str) -> Option<Self> {
        VERSION_TABLE
            .iter()
            .find(|(_, y, _)| *y == year)
            .map(|(token, _, _)| *token)
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        VERSION_TABLE
            .iter()
            .find(|(_, _, s)| *s == suffix)
            .map(|(token, _, _)| *token)
    }

    /// Accept either a release label or a raw suffix
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::from_year(value).or_else(|| Self::from_suffix(value))
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.year(), self.suffix())
    }
}

/// Normalize a caller's version hint to an identifier suffix.
///
/// Release labels are mapped through the table; anything else is taken as a raw suffix
/// (trimmed) so versions newer than the table still resolve.
pub fn normalize(hint: &str) -> String {
    let hint = hint.trim();
    match VersionToken::from_year(hint) {
        Some(token) => token.suffix().to_string(),
        None => hint.to_string(),
    }
}

/// Release label for a suffix, if known
pub fn year_for_suffix(suffix: &str) -> Option<&'static str> {
    VersionToken::from_suffix(suffix).map(|token| token.year())
}

/// Format `<root>.<class>[.<version>]`
pub fn program_id(root: &str, object_class: &str, version: Option<&str>) -> String {
    match version {
        Some(version) if !version.is_empty() => format!("{}.{}.{}", root, object_class, version),
        _ => format!("{}.{}", root, object_class),
    }
}

/// One row of the version table, as printed by the CLI
#[derive(Debug, Clone, Serialize)]
pub struct VersionEntry {
    pub token: VersionToken,
    pub year: &'static str,
    pub suffix: &'static str,
}

/// The full table, newest first
pub fn table() -> Vec<VersionEntry> {
    VersionToken::all()
        .rev()
        .map(|token| VersionEntry {
            token,
            year: token.year(),
            suffix: token.suffix(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rows_match_variants() {
        for token in VersionToken::all() {
            assert_eq!(token.row().0, token);
        }
    }

    #[test]
    fn test_year_suffix_roundtrip() {
        assert_eq!(VersionToken::Cc2024.suffix(), "180");
        assert_eq!(VersionToken::from_year("2025"), Some(VersionToken::Cc2025));
        assert_eq!(VersionToken::from_suffix("110"), Some(VersionToken::Cc2017));
        assert_eq!(VersionToken::from_year("1999"), None);
    }

    #[test]
    fn test_normalize_accepts_label_or_raw() {
        assert_eq!(normalize("2024"), "180");
        assert_eq!(normalize(" 2020 "), "140");
        assert_eq!(normalize("180"), "180");
        assert_eq!(normalize("200"), "200");
    }

    #[test]
    fn test_parse() {
        assert_eq!(VersionToken::parse("2023"), Some(VersionToken::Cc2023));
        assert_eq!(VersionToken::parse("170"), Some(VersionToken::Cc2023));
        assert_eq!(VersionToken::parse("abc"), None);
    }

    #[test]
    fn test_program_id() {
        assert_eq!(
            program_id("Photoshop", "Application", Some("180")),
            "Photoshop.Application.180"
        );
        assert_eq!(program_id("Photoshop", "Application", None), "Photoshop.Application");
        assert_eq!(
            program_id("Photoshop", "BMPSaveOptions", Some("")),
            "Photoshop.BMPSaveOptions"
        );
    }

    #[test]
    fn test_table_is_newest_first() {
        let table = table();
        assert_eq!(table.first().map(|e| e.year), Some("2025"));
        assert_eq!(table.last().map(|e| e.suffix), Some("110"));
        assert_eq!(year_for_suffix("160"), Some("2022"));
    }
}
