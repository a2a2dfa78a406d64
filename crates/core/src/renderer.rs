//! Page renderer collaborators.
//!
//! The [`Renderer`] trait is the seam between the extraction engine and
//! whatever produces rendered pages: a headless browser, a static HTTP
//! fetch, or captured snapshots replayed from disk. The engine only needs
//! navigation, clicks on labelled controls, scrolling, and the current
//! markup and text.
//!
//! Clicks are attempted with each [`ClickStrategy`] in turn by
//! [`Renderer::click_matching`]; a control nobody can click is a warning,
//! never an error.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crate::snapshot::{PageSnapshot, render_text};
use crate::{RankwatchError, Result};

/// Ways of activating a control, in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickStrategy {
    /// Native click on the element.
    Direct,
    /// Click dispatched from page script.
    Scripted,
    /// Simulated pointer movement followed by a click.
    Pointer,
}

impl ClickStrategy {
    pub const ALL: [ClickStrategy; 3] = [ClickStrategy::Direct, ClickStrategy::Scripted, ClickStrategy::Pointer];
}

/// Scroll targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPosition {
    Top,
    Bottom,
    Offset(u32),
}

/// A rendered page session.
pub trait Renderer {
    /// Loads a page.
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Activates the control labelled or selected by `target` with one strategy.
    fn click(&mut self, target: &str, strategy: ClickStrategy) -> Result<()>;

    /// Markup of the page as currently rendered.
    fn current_html(&mut self) -> Result<String>;

    /// Rendered text of the page body.
    fn current_text(&mut self) -> Result<String>;

    fn scroll_to(&mut self, position: ScrollPosition) -> Result<()>;

    /// Blocks for `duration`. Renderers over static content may skip the wait.
    fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }

    /// Tries every click strategy in order until one succeeds.
    ///
    /// Returns `false` when all strategies fail; each failure is logged.
    fn click_matching(&mut self, target: &str) -> bool {
        for strategy in ClickStrategy::ALL {
            match self.click(target, strategy) {
                Ok(()) => {
                    tracing::debug!(label = target, ?strategy, "clicked");
                    return true;
                }
                Err(e) => tracing::warn!(label = target, ?strategy, error = %e, "click strategy failed"),
            }
        }
        false
    }

    /// Captures the current page state.
    fn snapshot(&mut self) -> Result<PageSnapshot> {
        let html = self.current_html()?;
        let text = self.current_text()?;
        Ok(PageSnapshot::new(html, text))
    }
}

/// Polls `predicate` until it holds or `timeout` elapses.
///
/// The predicate is always evaluated at least once.
pub fn wait_until<R, F>(renderer: &mut R, mut predicate: F, timeout: Duration, poll_interval: Duration) -> bool
where
    R: Renderer + ?Sized,
    F: FnMut(&mut R) -> bool,
{
    let started = Instant::now();
    loop {
        if predicate(&mut *renderer) {
            return true;
        }
        if started.elapsed() >= timeout {
            return false;
        }
        renderer.pause(poll_interval.min(timeout.saturating_sub(started.elapsed())));
    }
}

/// Waits until the current markup contains any of `markers`.
///
/// An empty marker list is satisfied immediately. Expiry is logged as a
/// warning and reported as `false`.
pub fn wait_for_markup<R>(renderer: &mut R, markers: &[String], timeout: Duration, poll_interval: Duration) -> bool
where
    R: Renderer + ?Sized,
{
    if markers.is_empty() {
        return true;
    }

    let ready = wait_until(
        renderer,
        |r| {
            r.current_html()
                .map(|html| markers.iter().any(|marker| html.contains(marker.as_str())))
                .unwrap_or(false)
        },
        timeout,
        poll_interval,
    );

    if !ready {
        tracing::warn!(timeout_secs = timeout.as_secs(), "expected content did not appear in time");
    }
    ready
}

/// One fixed page. Clicks succeed only for targets present in the markup.
#[derive(Debug, Clone)]
pub struct StaticRenderer {
    html: String,
    text: String,
    visited: Vec<String>,
    clicks: Vec<(String, ClickStrategy)>,
    rejected: Vec<ClickStrategy>,
}

impl StaticRenderer {
    pub fn new(html: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            text: text.into(),
            visited: Vec::new(),
            clicks: Vec::new(),
            rejected: Vec::new(),
        }
    }

    /// Page whose text is derived from its markup.
    pub fn from_markup(html: impl Into<String>) -> Self {
        let html = html.into();
        let text = render_text(&html);
        Self::new(html, text)
    }

    /// Makes every click with `strategy` fail.
    pub fn reject(mut self, strategy: ClickStrategy) -> Self {
        self.rejected.push(strategy);
        self
    }

    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    /// Successful clicks in order.
    pub fn clicks(&self) -> &[(String, ClickStrategy)] {
        &self.clicks
    }
}

impl Renderer for StaticRenderer {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.visited.push(url.to_string());
        Ok(())
    }

    fn click(&mut self, target: &str, strategy: ClickStrategy) -> Result<()> {
        if self.rejected.contains(&strategy) {
            return Err(RankwatchError::Renderer(format!("{:?} click rejected", strategy)));
        }
        if !self.html.contains(target) {
            return Err(RankwatchError::ElementNotFound(target.to_string()));
        }
        self.clicks.push((target.to_string(), strategy));
        Ok(())
    }

    fn current_html(&mut self) -> Result<String> {
        Ok(self.html.clone())
    }

    fn current_text(&mut self) -> Result<String> {
        Ok(self.text.clone())
    }

    fn scroll_to(&mut self, _position: ScrollPosition) -> Result<()> {
        Ok(())
    }

    fn pause(&mut self, _duration: Duration) {}
}

/// File name stem used for a period's captured snapshot.
///
/// Lowercase ASCII alphanumerics with every other run of characters turned
/// into a single hyphen: `"Top this week"` becomes `top-this-week`.
pub fn period_slug(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Replays captured snapshots from a directory.
///
/// Each page is a `<slug>.html` file with an optional `<slug>.txt` holding
/// the browser-rendered text; without one the text is derived from the
/// markup. Navigating loads `index.html` when present. Clicking a label
/// whose slug names a capture switches to it; clicking any other label
/// succeeds only if the label appears in the current markup.
#[derive(Debug)]
pub struct ReplayRenderer {
    dir: PathBuf,
    pages: HashMap<String, PathBuf>,
    current: Option<(String, String)>,
}

impl ReplayRenderer {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(RankwatchError::FileNotFound(dir));
        }

        let mut pages = HashMap::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("html") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                pages.insert(stem.to_string(), path);
            }
        }

        tracing::debug!(dir = %dir.display(), pages = pages.len(), "opened snapshot directory");
        Ok(Self { dir, pages, current: None })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Slugs of every captured page.
    pub fn pages(&self) -> Vec<&str> {
        let mut slugs: Vec<&str> = self.pages.keys().map(String::as_str).collect();
        slugs.sort_unstable();
        slugs
    }

    fn load(&mut self, slug: &str) -> Result<()> {
        let html_path = self
            .pages
            .get(slug)
            .ok_or_else(|| RankwatchError::NoSnapshot(format!("no capture named '{}'", slug)))?;
        let html = fs::read_to_string(html_path)?;

        let text_path = html_path.with_extension("txt");
        let text = if text_path.exists() { fs::read_to_string(&text_path)? } else { render_text(&html) };

        self.current = Some((html, text));
        Ok(())
    }

    fn current(&self) -> Result<&(String, String)> {
        self.current
            .as_ref()
            .ok_or_else(|| RankwatchError::NoSnapshot(format!("nothing loaded from {}", self.dir.display())))
    }
}

impl Renderer for ReplayRenderer {
    fn navigate(&mut self, url: &str) -> Result<()> {
        tracing::debug!(url, "replaying navigation");
        if self.pages.contains_key("index") {
            self.load("index")?;
        }
        Ok(())
    }

    fn click(&mut self, target: &str, _strategy: ClickStrategy) -> Result<()> {
        let slug = period_slug(target);
        if self.pages.contains_key(&slug) {
            return self.load(&slug);
        }

        match &self.current {
            Some((html, _)) if html.contains(target) => Ok(()),
            _ => Err(RankwatchError::ElementNotFound(target.to_string())),
        }
    }

    fn current_html(&mut self) -> Result<String> {
        Ok(self.current()?.0.clone())
    }

    fn current_text(&mut self) -> Result<String> {
        Ok(self.current()?.1.clone())
    }

    fn scroll_to(&mut self, _position: ScrollPosition) -> Result<()> {
        Ok(())
    }

    fn pause(&mut self, _duration: Duration) {}
}
