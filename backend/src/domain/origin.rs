//! Document origin normalisation.
//!
//! The warehouse tags every document with a raw origin code naming the
//! ingestion connector. Several connectors fan out into families of codes
//! (`Easily_XXX`, `DOC_EXTERNE_YYY`) that reports want collapsed into a
//! single category. The rules here are applied everywhere grouped counts
//! are produced so dashboards and reports agree on category labels.

/// Category label for the `Easily` connector family.
pub const EASILY_CATEGORY: &str = "Easily";

/// Category label for the external-document connector family.
pub const DOC_EXTERNE_CATEGORY: &str = "DOC_EXTERNE";

/// Collapse a raw origin code into its reporting category.
///
/// Codes starting with `Easily` map to [`EASILY_CATEGORY`], codes starting
/// with `DOC_EXTERNE` map to [`DOC_EXTERNE_CATEGORY`], and every other code
/// maps to itself unchanged. The function is pure and idempotent.
///
/// # Examples
/// ```
/// use backend::domain::origin::normalize_origin;
///
/// assert_eq!(normalize_origin("Easily_LAB"), "Easily");
/// assert_eq!(normalize_origin("DOC_EXTERNE_PDF"), "DOC_EXTERNE");
/// assert_eq!(normalize_origin("RDV_DOCTOLIB"), "RDV_DOCTOLIB");
/// ```
pub fn normalize_origin(raw: &str) -> &str {
    if raw.starts_with(EASILY_CATEGORY) {
        EASILY_CATEGORY
    } else if raw.starts_with(DOC_EXTERNE_CATEGORY) {
        DOC_EXTERNE_CATEGORY
    } else {
        raw
    }
}

/// Normalise an optional origin code.
///
/// Documents without an origin keep their null key; callers group them
/// under `None` rather than inventing a placeholder category.
pub fn normalize_origin_key(raw: Option<&str>) -> Option<String> {
    raw.map(|code| normalize_origin(code).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Easily", "Easily")]
    #[case("Easily_LAB", "Easily")]
    #[case("EasilyAnything", "Easily")]
    #[case("DOC_EXTERNE", "DOC_EXTERNE")]
    #[case("DOC_EXTERNE_SCAN", "DOC_EXTERNE")]
    #[case("RDV_DOCTOLIB", "RDV_DOCTOLIB")]
    #[case("LAB", "LAB")]
    #[case("", "")]
    fn prefix_rules(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_origin(raw), expected);
    }

    #[rstest]
    #[case("Easily_LAB")]
    #[case("DOC_EXTERNE_SCAN")]
    #[case("LAB")]
    #[case("")]
    #[case("easily_lowercase_is_not_matched")]
    fn normalisation_is_idempotent(#[case] raw: &str) {
        let once = normalize_origin(raw);
        assert_eq!(normalize_origin(once), once);
    }

    #[rstest]
    fn null_keys_pass_through() {
        assert_eq!(normalize_origin_key(None), None);
        assert_eq!(
            normalize_origin_key(Some("Easily_B")),
            Some("Easily".to_owned())
        );
    }
}
