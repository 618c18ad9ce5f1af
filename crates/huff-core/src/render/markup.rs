//! Markup helpers shared by the postprocessing passes
//!
//! Every rewrite after highlighting runs over HTML. [`rewrite_text`] walks
//! the markup and hands only text outside tags and outside existing anchors
//! to the rewriting closure, so passes never corrupt tags and never wrap an
//! anchor twice.

use std::sync::LazyLock;

use regex::Regex;

static ENTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid entity regex")
});

/// Escape text for use as element content
pub fn escape_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape text for use inside a double-quoted attribute value
pub fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

/// Decode character references back to text
pub fn decode_entities(text: &str) -> String {
    ENTITY_REGEX
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "amp" => Some('&'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Text content of a markup fragment: tags dropped, entities decoded
pub fn text_content(markup: &str) -> String {
    let mut text = String::with_capacity(markup.len());
    for segment in segments(markup) {
        if let Segment::Text(t) = segment {
            text.push_str(t);
        }
    }
    decode_entities(&text)
}

/// One piece of a markup string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// A complete tag, `<` through `>`
    Tag(&'a str),
    Text(&'a str),
}

/// Split markup into tags and text runs
///
/// A `<` that does not open a tag (followed by whitespace, a digit, or
/// never closed) is kept as text.
pub fn segments(markup: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let bytes = markup.as_bytes();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'<' && opens_tag(bytes.get(i + 1).copied()) {
            if let Some(rel_end) = markup[i..].find('>') {
                if text_start < i {
                    out.push(Segment::Text(&markup[text_start..i]));
                }
                let end = i + rel_end + 1;
                out.push(Segment::Tag(&markup[i..end]));
                i = end;
                text_start = end;
                continue;
            }
        }
        i += 1;
    }

    if text_start < markup.len() {
        out.push(Segment::Text(&markup[text_start..]));
    }
    out
}

fn opens_tag(next: Option<u8>) -> bool {
    matches!(next, Some(b) if b.is_ascii_alphabetic() || b == b'/' || b == b'!')
}

/// Lower-cased tag name and whether it is a closing tag
pub fn tag_name(tag: &str) -> (String, bool) {
    let inner = tag.trim_start_matches('<');
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    (name, closing)
}

/// Rewrite text runs that are outside tags and outside `<a>` elements
pub fn rewrite_text<F>(markup: &str, mut rewrite: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(markup.len());
    let mut anchor_depth = 0usize;

    for segment in segments(markup) {
        match segment {
            Segment::Tag(tag) => {
                let (name, closing) = tag_name(tag);
                if name == "a" {
                    if closing {
                        anchor_depth = anchor_depth.saturating_sub(1);
                    } else if !tag.ends_with("/>") {
                        anchor_depth += 1;
                    }
                }
                out.push_str(tag);
            }
            Segment::Text(text) if anchor_depth == 0 => out.push_str(&rewrite(text)),
            Segment::Text(text) => out.push_str(text),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(escape_text("say \"hi\""), "say \"hi\"");
        assert_eq!(escape_attr("say \"hi\""), "say &quot;hi&quot;");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("&lt;b&gt; &amp; &#39;x&#x27; &quot;"), "<b> & 'x' \"");
        assert_eq!(decode_entities("&unknown; &"), "&unknown; &");
    }

    #[test]
    fn test_segments() {
        let parts = segments(r#"a <span class="x">b</span> 1 < 2"#);
        assert_eq!(
            parts,
            vec![
                Segment::Text("a "),
                Segment::Tag(r#"<span class="x">"#),
                Segment::Text("b"),
                Segment::Tag("</span>"),
                Segment::Text(" 1 < 2"),
            ]
        );
    }

    #[test]
    fn test_text_content() {
        assert_eq!(
            text_content(r#"{"a": "<b>x</b> &amp; y"}"#),
            r#"{"a": "x & y"}"#
        );
    }

    #[test]
    fn test_rewrite_text_skips_tags_and_anchors() {
        let markup = r#"x <a href="x">x</a> <span title="x">x</span>"#;
        let out = rewrite_text(markup, |t| t.replace('x', "y"));
        assert_eq!(out, r#"y <a href="x">x</a> <span title="x">y</span>"#);
    }

    #[test]
    fn test_tag_name() {
        assert_eq!(tag_name(r#"<A href="x">"#), ("a".to_string(), false));
        assert_eq!(tag_name("</span>"), ("span".to_string(), true));
    }
}
