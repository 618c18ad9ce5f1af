//! Resolve `Reference(...)` summaries into links on the hosting server
//!
//! The conversion engine summarizes FHIR references as `Reference(Type/id)`.
//! Turning those into links needs the FHIR server base URL, which is guessed
//! from the page URL:
//!
//! - with a query string (a search, `.../Patient?name=x`), the base is the
//!   origin plus every path segment except the last;
//! - without one (a read, `.../Patient/123`), the base is the origin plus
//!   every path segment except the last two.
//!
//! This is an approximation of how FHIR servers lay out their URLs. Servers
//! that nest resources differently (compartments, `_history`) get wrong
//! links.

use super::markup::rewrite_text;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static REFERENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Reference\(([^)<>"]+)\)"#).expect("valid reference regex"));

/// Guess the FHIR server base URL from the page URL
///
/// Returns `None` for unparseable URLs and URLs without a usable origin
/// (`file:`, `data:`).
pub fn reference_base(page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    let origin = url.origin();
    if !origin.is_tuple() {
        return None;
    }

    let segments: Vec<&str> = url.path().split('/').collect();
    let has_query = url.query().is_some_and(|q| !q.is_empty());
    let drop = if has_query { 1 } else { 2 };
    let kept = &segments[..segments.len().saturating_sub(drop)];

    Some(format!("{}{}", origin.ascii_serialization(), kept.join("/")))
}

/// Rewrite every `Reference(token)` outside tags and anchors into a link to
/// `base/token`
pub fn resolve_references(markup: &str, base: &str) -> String {
    let base = base.trim_end_matches('/');
    rewrite_text(markup, |text| {
        REFERENCE_REGEX
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let token = caps[1].trim();
                format!(
                    r#"<a href="{}/{}">{}</a>"#,
                    base,
                    token.trim_start_matches('/'),
                    token
                )
            })
            .into_owned()
    })
}
