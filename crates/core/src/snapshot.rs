//! Page snapshots and rendered-text derivation.
//!
//! A [`PageSnapshot`] is the immutable capture of one rendered page state:
//! the raw markup, the rendered text a browser would report for the body,
//! and the capture time. Extraction only ever reads snapshots.
//!
//! When a renderer can only supply markup (static HTTP fetches, replayed
//! captures without a text file), [`render_text`] approximates the browser's
//! rendered text from the markup.

use scraper::node::Node;
use scraper::{ElementRef, Html};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Immutable capture of one rendered page state.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    html: String,
    text: String,
    captured_at: OffsetDateTime,
}

impl PageSnapshot {
    /// Creates a snapshot captured now.
    pub fn new(html: impl Into<String>, text: impl Into<String>) -> Self {
        Self::captured_at(html, text, OffsetDateTime::now_utc())
    }

    /// Creates a snapshot with an explicit capture time.
    pub fn captured_at(html: impl Into<String>, text: impl Into<String>, captured_at: OffsetDateTime) -> Self {
        Self { html: html.into(), text: text.into(), captured_at }
    }

    /// Creates a snapshot whose rendered text is derived from the markup.
    pub fn from_markup(html: impl Into<String>) -> Self {
        let html = html.into();
        let text = render_text(&html);
        Self::new(html, text)
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn captured_at_time(&self) -> OffsetDateTime {
        self.captured_at
    }

    /// Capture time formatted as RFC 3339.
    pub fn timestamp(&self) -> String {
        self.captured_at.format(&Rfc3339).unwrap_or_default()
    }

    /// True when neither markup nor text carries anything to extract from.
    pub fn is_blank(&self) -> bool {
        self.html.trim().is_empty() && self.text.trim().is_empty()
    }
}

/// Elements whose contents never reach rendered text.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head", "svg"];

/// Elements that start and end their own line in rendered text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "button", "dd", "div", "dl", "dt", "fieldset", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "table", "tr", "td", "th", "ul",
];

/// Approximates a browser's rendered body text from markup.
///
/// Block elements break lines, `br` breaks a line, image `alt` text is emitted
/// on its own line, and whitespace inside a line is collapsed. Empty lines are
/// dropped.
pub fn render_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();
    walk(document.root_element(), &mut raw);

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn walk(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if SKIPPED_TAGS.contains(&name) {
        return;
    }

    match name {
        "br" => {
            out.push('\n');
            return;
        }
        "img" => {
            if let Some(alt) = element.value().attr("alt")
                && !alt.trim().is_empty()
            {
                out.push('\n');
                out.push_str(alt.trim());
                out.push('\n');
            }
            return;
        }
        _ => {}
    }

    let block = BLOCK_TAGS.contains(&name);
    if block {
        out.push('\n');
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text.replace('\n', " ")),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    walk(child_element, out);
                }
            }
            _ => {}
        }
    }

    if block {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text_breaks_blocks() {
        let html = r#"<html><body><div>1.</div><div><a href="/x">ExampleApp</a><p>A cool app</p></div>
            <div><span>42.0M</span><span>tokens</span></div></body></html>"#;
        assert_eq!(render_text(html), "1.\nExampleApp\nA cool app\n42.0Mtokens");
    }

    #[test]
    fn test_render_text_skips_scripts_and_styles() {
        let html = "<html><head><title>T</title></head><body><script>var a = 1;</script>\
                    <style>.x{}</style><div>Visible</div></body></html>";
        assert_eq!(render_text(html), "Visible");
    }

    #[test]
    fn test_render_text_emits_image_alt() {
        let html = r#"<body><div><img alt="Favicon for https://www.example.com/" src="x.png">Name</div></body>"#;
        assert_eq!(render_text(html), "Favicon for https://www.example.com/\nName");
    }

    #[test]
    fn test_render_text_collapses_whitespace() {
        let html = "<body><p>  spaced    out\n   text </p><br><p>next</p></body>";
        assert_eq!(render_text(html), "spaced out text\nnext");
    }

    #[test]
    fn test_snapshot_from_markup() {
        let snapshot = PageSnapshot::from_markup("<body><div>Top Apps</div></body>");
        assert_eq!(snapshot.text(), "Top Apps");
        assert!(!snapshot.is_blank());
        assert!(snapshot.timestamp().contains('T'));
    }

    #[test]
    fn test_blank_snapshot() {
        assert!(PageSnapshot::new("  ", "\n").is_blank());
    }
}
