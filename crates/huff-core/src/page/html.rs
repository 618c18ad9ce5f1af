//! In-memory HTML document implementing [`Page`]
//!
//! The document is kept as serialized markup and parsed with `scraper`
//! (html5ever) for every query or edit, so `<pre>` text hidden in comments,
//! scripts or attribute values is never mistaken for an element.
//! Attachments (carriers, modules, head styles) are held separately and
//! grafted into the tree on [`HtmlPage::to_html`].

use super::{Page, RawElement};
use crate::error::HuffError;
use crate::render::markup::{escape_attr, escape_text};
use crate::result::Result;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

static PRE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("pre").expect("valid pre selector"));

static HEAD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("head").expect("valid head selector"));

static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid body selector"));

static VIEWER_CONTROLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body > div").expect("valid viewer selector"));

/// HTML page with its pending attachments
#[derive(Debug, Clone, Default)]
pub struct HtmlPage {
    url: Option<String>,
    document: String,
    carriers: BTreeMap<String, String>,
    modules: Vec<String>,
    head_additions: Vec<String>,
}

impl HtmlPage {
    /// Parse a document
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html).html(),
            ..Self::default()
        }
    }

    /// The page a browser shows for a raw JSON (or text) response
    pub fn from_raw_text(text: &str) -> Self {
        Self::parse(&format!(
            "<html><head></head><body><pre>{}</pre></body></html>",
            escape_text(text)
        ))
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Serialize the document including everything attached to it
    pub fn to_html(&self) -> String {
        let mut document = Html::parse_document(&self.document);

        let head_markup = self.head_additions.concat();
        if !head_markup.is_empty() {
            graft_markup(&mut document, &HEAD, 0, &head_markup, false);
        }

        let body_markup: String = self
            .carriers
            .iter()
            .map(|(id, value)| {
                format!(
                    r#"<input type="hidden" id="{}" value="{}">"#,
                    escape_attr(id),
                    escape_attr(value)
                )
            })
            .chain(
                self.modules
                    .iter()
                    .map(|m| format!(r#"<script type="module" src="{}"></script>"#, escape_attr(m))),
            )
            .collect();
        if !body_markup.is_empty() {
            graft_markup(&mut document, &BODY, 0, &body_markup, false);
        }

        document.html()
    }

    /// Inner markup of the raw element at `index`
    pub fn element_html(&self, index: usize) -> Option<String> {
        Html::parse_document(&self.document)
            .select(&PRE)
            .nth(index)
            .map(|pre| pre.inner_html())
    }

    pub fn head_additions(&self) -> &[String] {
        &self.head_additions
    }
}

/// Append the nodes of `markup` to the `nth` element matching `target`,
/// replacing its children when `replace` is set
///
/// Returns `false` when no such element exists.
fn graft_markup(document: &mut Html, target: &Selector, nth: usize, markup: &str, replace: bool) -> bool {
    let Some(parent) = document.select(target).nth(nth).map(|element| element.id()) else {
        return false;
    };

    if replace {
        let children: Vec<_> = document
            .tree
            .get(parent)
            .map(|node| node.children().map(|child| child.id()).collect())
            .unwrap_or_default();
        for child in children {
            if let Some(mut node) = document.tree.get_mut(child) {
                node.detach();
            }
        }
    }

    let fragment = Html::parse_fragment(markup);
    let mut pending = vec![(parent, fragment.root_element().id())];
    while let Some((destination, source)) = pending.pop() {
        let Some(source) = fragment.tree.get(source) else {
            continue;
        };
        for child in source.children() {
            let Some(mut parent_node) = document.tree.get_mut(destination) else {
                break;
            };
            let copied = parent_node.append(child.value().clone()).id();
            pending.push((copied, child.id()));
        }
    }
    true
}

impl Page for HtmlPage {
    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn write_carrier(&mut self, id: &str, payload: &str) -> Result<()> {
        self.carriers.insert(id.to_string(), payload.to_string());
        Ok(())
    }

    fn read_carrier(&self, id: &str) -> Option<String> {
        self.carriers.get(id).cloned()
    }

    fn raw_elements(&self) -> Vec<RawElement> {
        Html::parse_document(&self.document)
            .select(&PRE)
            .enumerate()
            .map(|(index, pre)| RawElement {
                index,
                text: pre.text().collect(),
            })
            .collect()
    }

    fn replace_content(&mut self, index: usize, html: &str) -> Result<()> {
        let mut document = Html::parse_document(&self.document);
        if !graft_markup(&mut document, &PRE, index, html, true) {
            return Err(HuffError::page_error(format!("No raw element at index {index}")));
        }
        self.document = document.html();
        Ok(())
    }

    fn attach_module(&mut self, module: &str) -> Result<()> {
        if !self.has_module(module) {
            self.modules.push(module.to_string());
        }
        Ok(())
    }

    fn has_module(&self, module: &str) -> bool {
        self.modules.iter().any(|m| m == module)
    }

    fn attach_style(&mut self, css: &str) -> Result<()> {
        self.head_additions.push(format!("<style>{css}</style>"));
        Ok(())
    }

    fn attach_stylesheet_link(&mut self, href: &str) -> Result<()> {
        self.head_additions
            .push(format!(r#"<link rel="stylesheet" href="{}">"#, escape_attr(href)));
        Ok(())
    }

    fn remove_viewer_controls(&mut self) -> bool {
        let mut document = Html::parse_document(&self.document);
        let Some(controls) = document.select(&VIEWER_CONTROLS).next().map(|div| div.id()) else {
            return false;
        };
        if let Some(mut node) = document.tree.get_mut(controls) {
            debug!("Removing raw viewer controls");
            node.detach();
        }
        self.document = document.html();
        true
    }
}
