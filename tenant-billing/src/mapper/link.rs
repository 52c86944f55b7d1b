//! Identifier extraction from hypermedia self-links.

use regex::Regex;

/// Extracts an identifier from a self-link.
///
/// Returns the first capture group of the leftmost match of `pattern` in
/// `link`, or `None` if the pattern does not match or has no first group.
/// Never panics, whatever the input.
///
/// # Examples
///
/// ```
/// use regex::Regex;
/// use tenant_billing::mapper::extract_identifier_from_link;
///
/// let pattern = Regex::new("/coupons/(.+)$").unwrap();
/// assert_eq!(
///     extract_identifier_from_link("https://api.example.com/v2/coupons/SUMMER20", &pattern),
///     Some("SUMMER20".to_owned())
/// );
/// assert_eq!(extract_identifier_from_link("https://api.example.com/v2/plans/gold", &pattern), None);
/// ```
#[must_use]
pub fn extract_identifier_from_link(link: &str, pattern: &Regex) -> Option<String> {
    pattern
        .captures(link)
        .and_then(|captures| captures.get(1))
        .map(|matched| matched.as_str().to_owned())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn coupons() -> Regex {
        Regex::new("/coupons/(.+)$").unwrap()
    }

    #[test]
    fn test_extracts_trailing_segment() {
        assert_eq!(
            extract_identifier_from_link("https://api.example.com/v2/coupons/SUMMER20", &coupons()),
            Some("SUMMER20".to_owned())
        );
    }

    #[test]
    fn test_relative_link() {
        assert_eq!(extract_identifier_from_link("/coupons/a-b_c", &coupons()), Some("a-b_c".to_owned()));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(extract_identifier_from_link("https://api.example.com/v2/plans/gold", &coupons()), None);
        assert_eq!(extract_identifier_from_link("", &coupons()), None);
        assert_eq!(extract_identifier_from_link("/coupons/", &coupons()), None);
    }

    #[test]
    fn test_pattern_without_group() {
        let pattern = Regex::new("/coupons/").unwrap();
        assert_eq!(extract_identifier_from_link("/coupons/x", &pattern), None);
    }

    proptest! {
        #[test]
        fn prop_never_panics(link in ".*") {
            let _ = extract_identifier_from_link(&link, &coupons());
        }

        #[test]
        fn prop_recovers_code(code in "[A-Za-z0-9_-]{1,32}") {
            let link = format!("https://api.example.com/v2/coupons/{code}");
            prop_assert_eq!(extract_identifier_from_link(&link, &coupons()), Some(code));
        }
    }
}
