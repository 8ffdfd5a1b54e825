//! Engine identifier matching.
//!
//! Records list the engines they apply to as patterns:
//! - an exact identifier, e.g. `"google"`, matches only itself
//! - a prefix followed by [`WILDCARD`], e.g. `"amazon*"`, matches every
//!   identifier starting with `"amazon"`
//!
//! Resolution and update propagation must agree on this rule, so both go
//! through [`identifier_matches`].

/// Marker that turns a pattern into a prefix match when it is the last character.
pub const WILDCARD: char = '*';

/// Returns `true` if `identifier` matches a single pattern.
///
/// The empty identifier only matches `""` and the bare wildcard `"*"`.
///
/// # Examples
///
/// ```
/// use seicon_types::pattern_matches;
///
/// assert!(pattern_matches("amazon-de", "amazon*"));
/// assert!(pattern_matches("google", "google"));
/// assert!(!pattern_matches("google-b", "google"));
/// ```
pub fn pattern_matches(identifier: &str, pattern: &str) -> bool {
    match pattern.strip_suffix(WILDCARD) {
        Some(prefix) => identifier.starts_with(prefix),
        None => identifier == pattern,
    }
}

/// Returns `true` if `identifier` matches any of `patterns`.
pub fn identifier_matches<S: AsRef<str>>(identifier: &str, patterns: &[S]) -> bool {
    patterns
        .iter()
        .any(|pattern| pattern_matches(identifier, pattern.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn exact_match() {
        assert!(identifier_matches("google", &["google"]));
        assert!(!identifier_matches("googl", &["google"]));
        assert!(!identifier_matches("google-b", &["google"]));
    }

    #[test]
    fn wildcard_prefix() {
        assert!(identifier_matches("shopify", &["shop*"]));
        assert!(identifier_matches("shop", &["shop*"]));
        assert!(!identifier_matches("sho", &["shop*"]));
        assert!(!identifier_matches("eshop", &["shop*"]));
    }

    #[test]
    fn wildcard_only_at_end() {
        // A marker in the middle is literal.
        assert!(identifier_matches("a*b", &["a*b"]));
        assert!(!identifier_matches("axb", &["a*b"]));
        // Only the final marker is stripped.
        assert!(identifier_matches("a*bc", &["a*b*"]));
        assert!(!identifier_matches("axbc", &["a*b*"]));
    }

    #[test]
    fn empty_identifier() {
        assert!(!identifier_matches("", &["google", "shop*"]));
        assert!(identifier_matches("", &["*"]));
        assert!(identifier_matches("", &[""]));
    }

    #[test]
    fn empty_pattern_list_never_matches() {
        let none: [&str; 0] = [];
        assert!(!identifier_matches("google", &none));
    }

    #[test]
    fn any_pattern_suffices() {
        let patterns = vec!["bing".to_string(), "amazon*".to_string()];
        assert!(identifier_matches("amazon-fr", &patterns));
        assert!(identifier_matches("bing", &patterns));
        assert!(!identifier_matches("ddg", &patterns));
    }

    fn reference(identifier: &str, patterns: &[String]) -> bool {
        patterns.iter().any(|p| {
            p == identifier
                || (p.ends_with('*') && identifier.starts_with(&p[..p.len() - 1]))
        })
    }

    proptest! {
        #[test]
        fn matches_iff_exact_or_prefix(
            identifier in "[a-c*]{0,6}",
            patterns in proptest::collection::vec("[a-c*]{0,5}", 0..5),
        ) {
            prop_assert_eq!(
                identifier_matches(&identifier, &patterns),
                reference(&identifier, &patterns)
            );
        }

        #[test]
        fn prefix_pattern_matches_all_extensions(
            prefix in "[a-z]{0,8}",
            suffix in "[a-z0-9-]{0,8}",
        ) {
            let identifier = format!("{prefix}{suffix}");
            let pattern = format!("{prefix}*");
            prop_assert!(pattern_matches(&identifier, &pattern));
        }
    }
}
