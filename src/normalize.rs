//! Diacritic folding for keyword search
//!
//! Text is decomposed (NFD) and every combining mark is dropped, so
//! "Việt" folds to "Viet". Matching lower-cases both sides after folding.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Strip diacritics. Case is preserved.
pub fn fold(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Strip diacritics and lower-case.
pub fn fold_lower(s: &str) -> String {
    fold(s).to_lowercase()
}

/// True if the folded keyword occurs in any of the folded fields.
///
/// An empty keyword matches everything.
pub fn matches_keyword<'a, I>(fields: I, keyword: &str) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = fold_lower(keyword);
    if needle.is_empty() {
        return true;
    }
    fields
        .into_iter()
        .any(|field| fold_lower(field).contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_vietnamese() {
        assert_eq!(fold("Việt Nam"), "Viet Nam");
        assert!(fold_lower("Contest Việt Nam").contains("viet nam"));
    }

    #[test]
    fn keyword_matches_across_diacritics() {
        assert!(matches_keyword(["Cuộc thi Việt Nam"], "viet"));
        assert!(matches_keyword(["Cuộc thi Việt Nam"], "VIỆT"));
        assert!(!matches_keyword(["Cuộc thi Việt Nam"], "hanoi"));
    }

    #[test]
    fn empty_keyword_matches_all() {
        assert!(matches_keyword(["anything"], ""));
        assert!(matches_keyword(std::iter::empty::<&str>(), ""));
    }

    #[test]
    fn plain_ascii_is_unchanged() {
        assert_eq!(fold("Summer Photo 2025"), "Summer Photo 2025");
    }
}
