//! Name derivation helpers used when guessing backend model names.

use heck::ToUpperCamelCase;

/// Characters treated as word separators in client slugs.
const SLUG_SEPARATORS: &[char] = &['-', '_', '.', ':', '/'];

/// Derives a "proper name" from a backend client's slug.
///
/// Separators become spaces, the result is split into words, and each word is
/// title-cased before the words are concatenated. An empty or separator-only
/// slug yields an empty string.
///
/// ```rust
/// use intake_util::proper_name_from_slug;
///
/// assert_eq!(proper_name_from_slug("acme-crm"), "AcmeCrm");
/// assert_eq!(proper_name_from_slug("north_star.sales"), "NorthStarSales");
/// assert_eq!(proper_name_from_slug(""), "");
/// ```
pub fn proper_name_from_slug(slug: &str) -> String {
    slug.replace(SLUG_SEPARATORS, " ")
        .split_whitespace()
        .map(|word| word.to_upper_camel_case())
        .collect()
}

/// True when `haystack` contains any of `hints`, ignoring case.
///
/// Blank hints never match.
pub fn contains_any_hint<S: AsRef<str>>(haystack: &str, hints: &[S]) -> bool {
    let haystack = haystack.to_lowercase();
    hints.iter().map(|hint| hint.as_ref().trim().to_lowercase()).any(|hint| !hint.is_empty() && haystack.contains(&hint))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proper_name_title_cases_each_word() {
        assert_eq!(proper_name_from_slug("ACME sales"), "AcmeSales");
        assert_eq!(proper_name_from_slug("  -_ "), "");
        assert_eq!(proper_name_from_slug("crm"), "Crm");
        assert_eq!(proper_name_from_slug("acme/crm:v2"), "AcmeCrmV2");
    }

    #[test]
    fn hint_matching_is_case_insensitive() {
        let hints = ["inquir", "Deal"];
        assert!(contains_any_hint("Sales INQUIRIES crm_inquiry", &hints));
        assert!(contains_any_hint("deals", &hints));
        assert!(!contains_any_hint("contacts contact", &hints));
    }

    #[test]
    fn blank_hints_are_ignored() {
        assert!(!contains_any_hint("anything", &["", "  "]));
    }
}
