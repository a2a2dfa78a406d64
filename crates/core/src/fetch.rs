//! Page content from URLs, files, and stdin.
//!
//! [`HttpRenderer`] is a [`Renderer`](crate::Renderer) over plain HTTP: it
//! fetches server-rendered markup and derives the text from it. It cannot run
//! page script, so clicks always fail and every period scraped through it
//! sees the same page. [`fetch_file`] and [`fetch_stdin`] read captured markup
//! for the static renderer.

use std::fs;
use std::path::PathBuf;

use crate::{RankwatchError, Result};

/// HTTP client configuration for fetching pages.
///
/// This struct controls timeout and user agent settings for HTTP requests.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; Rankwatch/0.3; +https://github.com/rankwatch/rankwatch)".to_string(),
        }
    }
}

#[cfg(feature = "fetch")]
pub use http::HttpRenderer;

#[cfg(feature = "fetch")]
mod http {
    use std::time::Duration;

    use reqwest::blocking::Client;
    use url::Url;

    use super::FetchConfig;
    use crate::renderer::{ClickStrategy, Renderer, ScrollPosition};
    use crate::snapshot::render_text;
    use crate::{RankwatchError, Result};

    /// Renderer over a blocking HTTP client.
    #[derive(Debug)]
    pub struct HttpRenderer {
        client: Client,
        config: FetchConfig,
        html: Option<String>,
    }

    impl HttpRenderer {
        pub fn new(config: FetchConfig) -> Result<Self> {
            let client = Client::builder()
                .timeout(Duration::from_secs(config.timeout))
                .user_agent(config.user_agent.clone())
                .build()
                .map_err(RankwatchError::HttpError)?;

            Ok(Self { client, config, html: None })
        }

        fn page(&self) -> Result<&str> {
            self.html
                .as_deref()
                .ok_or_else(|| RankwatchError::NoSnapshot("no page fetched yet".to_string()))
        }
    }

    impl Renderer for HttpRenderer {
        fn navigate(&mut self, url: &str) -> Result<()> {
            let parsed_url = Url::parse(url).map_err(|e| RankwatchError::InvalidUrl(e.to_string()))?;

            if !matches!(parsed_url.scheme(), "http" | "https") {
                return Err(RankwatchError::InvalidUrl(
                    "URL must use http:// or https://".to_string(),
                ));
            }

            tracing::info!(url, "fetching page");
            let response = self
                .client
                .get(parsed_url)
                .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
                .header("Accept-Language", "en-US,en;q=0.9")
                .send()
                .map_err(|e| {
                    if e.is_timeout() {
                        RankwatchError::Timeout { timeout: self.config.timeout }
                    } else {
                        RankwatchError::HttpError(e)
                    }
                })?
                .error_for_status()?;

            self.html = Some(response.text()?);
            Ok(())
        }

        fn click(&mut self, target: &str, strategy: ClickStrategy) -> Result<()> {
            Err(RankwatchError::Renderer(format!(
                "static HTTP page cannot perform {:?} click on '{}'",
                strategy, target
            )))
        }

        fn current_html(&mut self) -> Result<String> {
            Ok(self.page()?.to_string())
        }

        fn current_text(&mut self) -> Result<String> {
            Ok(render_text(self.page()?))
        }

        fn scroll_to(&mut self, _position: ScrollPosition) -> Result<()> {
            Ok(())
        }
    }
}

/// Reads captured markup from a local file.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(RankwatchError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(RankwatchError::from)
    }
}

/// Reads markup from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(RankwatchError::from)?;

    Ok(buffer)
}
