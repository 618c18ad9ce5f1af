//! Turn bare URLs into anchors

use super::markup::rewrite_text;
use regex::Regex;
use std::sync::LazyLock;

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"'`]+"#).expect("valid url regex")
});

/// Characters that end a sentence rather than a URL
const TRAILING_PUNCTUATION: [char; 7] = ['.', ',', ';', ':', '!', '?', '*'];

/// Wrap bare URLs in `markup` with anchors
///
/// Tags and the contents of existing anchors are left alone, so running this
/// over its own output changes nothing.
pub fn linkify(markup: &str) -> String {
    rewrite_text(markup, link_urls)
}

fn link_urls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for m in URL_REGEX.find_iter(text) {
        let url = trim_url(m.as_str());
        if url.is_empty() {
            continue;
        }
        let end = m.start() + url.len();

        out.push_str(&text[last..m.start()]);
        let href = if url.len() >= 4 && url[..4].eq_ignore_ascii_case("www.") {
            format!("http://{url}")
        } else {
            url.to_string()
        };
        out.push_str(&format!(r#"<a href="{href}">{url}</a>"#));
        last = end;
    }

    out.push_str(&text[last..]);
    out
}

/// Drop trailing punctuation, escaped angle brackets and unbalanced closing
/// brackets from a URL candidate
fn trim_url(candidate: &str) -> &str {
    let mut url = candidate;
    for entity in ["&lt;", "&gt;", "&quot;", "&#39;"] {
        if let Some(pos) = url.find(entity) {
            url = &url[..pos];
        }
    }

    loop {
        let before = url.len();
        url = url.trim_end_matches(TRAILING_PUNCTUATION);
        if url.ends_with(')') && url.matches('(').count() < url.matches(')').count() {
            url = &url[..url.len() - 1];
        }
        if url.ends_with(']') && url.matches('[').count() < url.matches(']').count() {
            url = &url[..url.len() - 1];
        }
        if url.len() == before {
            return url;
        }
    }
}
