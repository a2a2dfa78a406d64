//! Link and icon extraction from raw markup.
//!
//! Apps link out through an internal redirect of the form
//! `href="/apps?url=<percent-encoded target>"`. [`extract`] collects those
//! targets in document order together with the icon image rendered next to
//! each link, keeping both lists positionally aligned so the record merger
//! can pair them with text-derived ranks by index.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Icon service used for both copied and synthesized icon URLs.
pub const ICON_SERVICE: &str = "https://t0.gstatic.com/faviconV2";

static REDIRECT_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="(/apps\?url=([^"]+))""#).expect("valid redirect href regex"));

static LOOSE_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]*url=([^"]+))""#).expect("valid loose href regex"));

static SERVICE_ICON_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src="(https://t0\.gstatic\.com/faviconV2[^"]+)""#).expect("valid icon regex"));

static FAVICON_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src="([^"]*favicon[^"]*)""#).expect("valid favicon regex"));

/// Target URLs and their icons, positionally aligned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkAssets {
    urls: Vec<String>,
    icons: Vec<String>,
}

impl LinkAssets {
    fn push(&mut self, url: String, icon: String) {
        self.urls.push(url);
        self.icons.push(icon);
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn icons(&self) -> &[String] {
        &self.icons
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// URL and icon at a zero-based position.
    pub fn get(&self, index: usize) -> Option<(&str, &str)> {
        Some((self.urls.get(index)?.as_str(), self.icons.get(index)?.as_str()))
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (self.urls, self.icons)
    }
}

/// Scans markup for redirect links and their icons, capped at `limit`.
///
/// The strict `/apps?url=` pattern is tried first; the looser `...url=`
/// pattern only when the strict one finds nothing. Each icon is searched
/// within `icon_window` characters on either side of its link.
pub fn extract(markup: &str, limit: usize, icon_window: usize) -> LinkAssets {
    let mut assets = LinkAssets::default();

    let mut matches: Vec<_> = REDIRECT_HREF.captures_iter(markup).collect();
    if matches.is_empty() {
        tracing::debug!("no redirect hrefs found, trying loose pattern");
        matches = LOOSE_HREF.captures_iter(markup).collect();
    }

    for caps in matches.into_iter().take(limit) {
        let (Some(href), Some(encoded)) = (caps.get(1), caps.get(2)) else {
            continue;
        };

        let bytes = urlencoding::decode_binary(encoded.as_str().as_bytes());
        match String::from_utf8_lossy(&bytes) {
            Cow::Borrowed(decoded) => {
                let icon = locate_icon(markup, href.start(), icon_window, decoded);
                assets.push(decoded.to_string(), icon);
            }
            Cow::Owned(lossy) => {
                tracing::warn!(href = href.as_str(), "link target is not valid UTF-8 once decoded");
                assets.push(lossy, String::new());
            }
        }
    }

    tracing::debug!(count = assets.len(), "extracted link assets");
    assets
}

/// Icon for the link at `position`: service image, any favicon image, or a
/// synthesized service URL for `target`.
fn locate_icon(markup: &str, position: usize, icon_window: usize, target: &str) -> String {
    let block = char_window(markup, position.saturating_sub(icon_window), position.saturating_add(icon_window));

    if let Some(src) = SERVICE_ICON_SRC.captures(block).and_then(|caps| caps.get(1)) {
        return decode_entities(src.as_str());
    }

    if let Some(src) = FAVICON_SRC.captures(block).and_then(|caps| caps.get(1)) {
        return decode_entities(src.as_str());
    }

    if target.is_empty() { String::new() } else { favicon_service_url(target) }
}

/// Icon-service request for a target URL.
pub fn favicon_service_url(target: &str) -> String {
    format!(
        "{}?client=SOCIAL&type=FAVICON&fallback_opts=TYPE,SIZE,URL&url={}&size=256",
        ICON_SERVICE,
        urlencoding::encode(target)
    )
}

/// Host (and port, when explicit) of a URL; empty when it cannot be parsed.
pub fn domain_of(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };

    match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}

/// Decodes the HTML entities that appear inside attribute values.
pub fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Slice of `text` between byte offsets, widened outwards to char boundaries
/// and clamped to the text.
pub(crate) fn char_window(text: &str, start: usize, end: usize) -> &str {
    let mut start = start.min(text.len());
    while !text.is_char_boundary(start) {
        start -= 1;
    }

    let mut end = end.clamp(start, text.len());
    while !text.is_char_boundary(end) {
        end += 1;
    }

    &text[start..end]
}
