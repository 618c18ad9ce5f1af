//! Content-Type based detection of FHIR-JSON documents

use crate::host::{ResourceType, ResponseDetails, ResponseHeader};
use crate::preferences::Preferences;
use std::collections::BTreeSet;

/// Outcome of classifying one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeMatch {
    /// Value of the matching Content-Type header, or of the first one seen
    pub header_value: Option<String>,
    pub matched: bool,
}

impl ContentTypeMatch {
    fn miss(header_value: Option<String>) -> Self {
        Self {
            header_value,
            matched: false,
        }
    }
}

/// Classify a set of response headers against the configured substrings
///
/// Matches when some `Content-Type` header (name compared case-insensitively)
/// has a value containing one of `handled` verbatim. The value comparison is
/// case-sensitive. A missing header is a plain miss.
pub fn classify_headers(
    headers: &[ResponseHeader],
    handled: &BTreeSet<String>,
) -> ContentTypeMatch {
    let mut first_seen = None;

    for header in headers
        .iter()
        .filter(|h| h.name.eq_ignore_ascii_case("content-type"))
    {
        if handled.iter().any(|hct| header.value.contains(hct.as_str())) {
            return ContentTypeMatch {
                header_value: Some(header.value.clone()),
                matched: true,
            };
        }
        first_seen.get_or_insert_with(|| header.value.clone());
    }

    ContentTypeMatch::miss(first_seen)
}

/// Classify a response, considering only top-level document loads
pub fn classify(details: &ResponseDetails, prefs: &Preferences) -> ContentTypeMatch {
    if details.resource_type != ResourceType::MainFrame {
        return ContentTypeMatch::miss(None);
    }
    classify_headers(&details.headers, &prefs.handle_content_types)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handled(types: &[&str]) -> BTreeSet<String> {
        types.iter().map(|s| s.to_string()).collect()
    }

    fn headers(pairs: &[(&str, &str)]) -> Vec<ResponseHeader> {
        pairs
            .iter()
            .map(|(n, v)| ResponseHeader::new(*n, *v))
            .collect()
    }

    #[test]
    fn test_matches_fhir_json_with_charset() {
        let result = classify_headers(
            &headers(&[("Content-Type", "application/fhir+json; charset=utf-8")]),
            &Preferences::default().handle_content_types,
        );
        assert!(result.matched);
        assert_eq!(
            result.header_value.as_deref(),
            Some("application/fhir+json; charset=utf-8")
        );
    }

    #[test]
    fn test_header_name_is_case_insensitive() {
        let set = handled(&["application/fhir+json"]);
        for name in ["content-type", "CONTENT-TYPE", "Content-type"] {
            assert!(classify_headers(&headers(&[(name, "application/fhir+json")]), &set).matched);
        }
    }

    #[test]
    fn test_value_match_is_case_sensitive() {
        let set = handled(&["application/fhir+json"]);
        let result = classify_headers(&headers(&[("Content-Type", "Application/FHIR+JSON")]), &set);
        assert!(!result.matched);
        assert_eq!(result.header_value.as_deref(), Some("Application/FHIR+JSON"));
    }

    #[test]
    fn test_missing_header_is_a_miss() {
        let result = classify_headers(
            &headers(&[("Cache-Control", "no-cache")]),
            &handled(&["application/fhir+json"]),
        );
        assert_eq!(result, ContentTypeMatch::miss(None));
    }

    #[test]
    fn test_any_content_type_header_may_match() {
        let result = classify_headers(
            &headers(&[
                ("Content-Type", "text/plain"),
                ("Content-Type", "application/json+fhir"),
            ]),
            &Preferences::default().handle_content_types,
        );
        assert!(result.matched);
        assert_eq!(result.header_value.as_deref(), Some("application/json+fhir"));
    }

    #[test]
    fn test_plain_json_is_not_fhir() {
        let result = classify_headers(
            &headers(&[("Content-Type", "application/json")]),
            &Preferences::default().handle_content_types,
        );
        assert!(!result.matched);
    }

    #[test]
    fn test_sub_resources_never_match() {
        let mut details = ResponseDetails::main_frame(
            "https://example.org/fhir/Patient/1",
            headers(&[("Content-Type", "application/fhir+json")]),
        );
        details.resource_type = ResourceType::Xmlhttprequest;

        assert!(!classify(&details, &Preferences::default()).matched);
    }

    #[test]
    fn test_matches_exactly_when_some_value_contains_some_substring() {
        let sets = [
            handled(&["fhir"]),
            handled(&["application/fhir+json", "text/x"]),
            handled(&["nothing-matches"]),
        ];
        let header_sets = [
            headers(&[]),
            headers(&[("content-type", "application/fhir+json")]),
            headers(&[("Content-Type", "text/xml"), ("X-Other", "fhir")]),
            headers(&[("X-Content-Type", "application/fhir+json")]),
        ];

        for set in &sets {
            for hs in &header_sets {
                let expected = hs.iter().any(|h| {
                    h.name.eq_ignore_ascii_case("content-type")
                        && set.iter().any(|s| h.value.contains(s.as_str()))
                });
                assert_eq!(classify_headers(hs, set).matched, expected, "{hs:?} / {set:?}");
            }
        }
    }
}
