//! YAML syntax highlighting
//!
//! Highlighting runs through syntect's YAML grammar and emits classed spans
//! prefixed with [`CLASS_PREFIX`]; [`theme_css`] produces the matching
//! stylesheet. Input is plain YAML text; output is escaped markup wrapped in
//! a single `source.yaml` span.

use super::markup::escape_text;
use std::sync::LazyLock;
use syntect::highlighting::ThemeSet;
use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tracing::warn;

/// Prefix of every class the highlighter emits
pub const CLASS_PREFIX: &str = "hl-";

/// Theme the bundled stylesheet is generated from
const THEME: &str = "base16-ocean.dark";

/// Opening tag of highlighted output
const HIGHLIGHT_ROOT: &str = r#"<span class="hl-source hl-yaml">"#;

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

static THEME_CSS: LazyLock<String> = LazyLock::new(|| {
    let themes = ThemeSet::load_defaults();
    let Some(theme) = themes
        .themes
        .get(THEME)
        .or_else(|| themes.themes.values().next())
    else {
        return String::new();
    };
    css_for_theme_with_class_style(theme, class_style()).unwrap_or_else(|e| {
        warn!("Cannot generate highlight theme CSS: {}", e);
        String::new()
    })
});

fn class_style() -> ClassStyle {
    ClassStyle::SpacedPrefixed {
        prefix: CLASS_PREFIX,
    }
}

/// Stylesheet for the classes [`highlight_yaml`] emits
pub fn theme_css() -> &'static str {
    &THEME_CSS
}

/// Whether `markup` is already highlighter output
pub fn is_highlighted(markup: &str) -> bool {
    markup.starts_with(HIGHLIGHT_ROOT)
}

/// Highlight a YAML document
///
/// Markup this function produced is returned unchanged. If the grammar
/// fails on a line the whole document falls back to escaped text.
pub fn highlight_yaml(yaml: &str) -> String {
    if yaml.is_empty() || is_highlighted(yaml) {
        return yaml.to_string();
    }

    let syntax = SYNTAXES
        .find_syntax_by_token("yaml")
        .unwrap_or_else(|| SYNTAXES.find_syntax_plain_text());
    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAXES, class_style());

    for line in LinesWithEndings::from(yaml) {
        if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
            warn!("YAML highlighting failed, inserting plain text: {}", e);
            return escape_text(yaml);
        }
    }
    generator.finalize()
}
