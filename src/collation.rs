//! Primary-strength Unicode collation, the ordering contract of the aar
//! word index.
//!
//! The aar index stores words sorted by their primary-strength collation
//! keys, which fold case and accent differences. Keys are opaque and only
//! ever compared to each other, so the service exposes the comparison
//! directly instead of key material.
use icu_collator::options::{CollatorOptions, Strength};
use icu_collator::{Collator, CollatorBorrowed};
use icu_locale_core::LanguageIdentifier;
use std::cmp::Ordering;
use std::sync::LazyLock;

// Root locale at primary strength. Collation data is compiled into the
// binary, so construction cannot fail at runtime.
static COLLATOR: LazyLock<CollatorBorrowed<'static>> = LazyLock::new(|| {
    let mut options = CollatorOptions::default();
    options.strength = Some(Strength::Primary);
    Collator::try_new(Default::default(), options).expect("compiled root collation data")
});

/// Compare two strings at primary strength: case and accent differences are
/// ignored, so `primary_cmp("APP", "app")` is [`Ordering::Equal`].
pub fn primary_cmp(a: &str, b: &str) -> Ordering {
    COLLATOR.compare(a, b)
}

/// Whether two strings have equal primary-strength collation keys.
pub fn primary_eq(a: &str, b: &str) -> bool {
    primary_cmp(a, b) == Ordering::Equal
}

/// Reduce a declared dictionary language such as `en_US` to its language
/// subtag. Values that do not parse as a language identifier are returned
/// unchanged.
pub fn normalize_lang(declared: &str) -> String {
    let bcp47 = declared.replace('_', "-");
    match bcp47.parse::<LanguageIdentifier>() {
        Ok(id) if id.language.as_str() != "und" => id.language.to_string(),
        _ => declared.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::init;
    use pretty_assertions::assert_eq;

    #[test]
    fn case_and_accents_fold() {
        init();
        assert_eq!(primary_cmp("APP", "app"), Ordering::Equal);
        assert_eq!(primary_cmp("Apricot", "apricot"), Ordering::Equal);
        assert_eq!(primary_cmp("pêche", "peche"), Ordering::Equal);
        assert!(primary_eq("Émile", "emile"));
    }

    #[test]
    fn primary_order() {
        init();
        assert_eq!(primary_cmp("apple", "Apricot"), Ordering::Less);
        assert_eq!(primary_cmp("Apricot", "banana"), Ordering::Less);
        assert_eq!(primary_cmp("banana", "apple"), Ordering::Greater);
    }

    #[test]
    fn language_normalization() {
        init();
        assert_eq!(normalize_lang("en_US"), "en");
        assert_eq!(normalize_lang("de-AT"), "de");
        assert_eq!(normalize_lang("fr"), "fr");
        // not a language identifier, kept as declared
        assert_eq!(normalize_lang(""), "");
        assert_eq!(normalize_lang("english (simple)"), "english (simple)");
    }
}
