//! Author to domain lookup used for model icons.
//!
//! A [`DomainMap`] is built once, before scraping starts, from a built-in
//! table of well-known model vendors optionally extended by `domains.txt`
//! files. It is immutable afterwards and passed by reference to icon
//! resolution.
//!
//! # File format
//!
//! ```text
//! # comment
//! Anthropic: anthropic.com
//! Nous Research: nousresearch.com
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::{RankwatchError, Result};

/// Name of the domain file looked up in each directory.
pub const DOMAINS_FILE: &str = "domains.txt";

const BUILTIN_DOMAINS: &[(&str, &str)] = &[
    ("OpenAI", "openai.com"),
    ("Anthropic", "anthropic.com"),
    ("Google", "google.com"),
    ("Meta", "meta.com"),
    ("Microsoft", "microsoft.com"),
    ("Cohere", "cohere.com"),
    ("Mistral AI", "mistral.ai"),
    ("Hugging Face", "huggingface.co"),
    ("Stability AI", "stability.ai"),
    ("ElevenLabs", "elevenlabs.io"),
    ("Perplexity", "perplexity.ai"),
    ("DeepSeek", "deepseek.com"),
    ("Qwen", "qwenlm.com"),
    ("Claude", "anthropic.com"),
    ("GPT", "openai.com"),
    ("Gemini", "google.com"),
    ("Llama", "meta.com"),
    ("PaLM", "google.com"),
    ("Vicuna", "lmsys.org"),
    ("Alpaca", "crfm.stanford.edu"),
    ("WizardLM", "wizardlm.ai"),
    ("CodeLlama", "meta.com"),
    ("Falcon", "falconllm.tii.ae"),
    ("MPT", "mosaicml.com"),
    ("RedPajama", "together.ai"),
    ("OpenAssistant", "open-assistant.io"),
    ("Dolly", "databricks.com"),
    ("Cerebras", "cerebras.net"),
    ("Baichuan", "baichuan-ai.com"),
    ("Zhipu", "zhipuai.cn"),
    ("GLM", "zhipuai.cn"),
    ("ChatGLM", "zhipuai.cn"),
    ("InternLM", "internlm.org"),
    ("Yi", "01.ai"),
    ("Moonshot", "moonshot.cn"),
    ("MiniMax", "minimax.chat"),
    ("Abab", "abab.ai"),
];

/// Immutable author to domain lookup.
#[derive(Debug, Clone)]
pub struct DomainMap {
    entries: HashMap<String, String>,
}

impl DomainMap {
    /// Map holding only the built-in vendor table.
    pub fn builtin() -> Self {
        let entries = BUILTIN_DOMAINS
            .iter()
            .map(|(author, domain)| (author.to_string(), domain.to_string()))
            .collect();
        Self { entries }
    }

    /// Map with no entries; every lookup uses the derived fallback.
    pub fn empty() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Creates a builder starting from the built-in table.
    pub fn builder() -> DomainMapBuilder {
        DomainMapBuilder::new()
    }

    /// Built-in table extended by the user config directory and, when given,
    /// a custom directory whose entries win.
    pub fn load(custom_dir: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder();

        if let Some(standard_dir) = Self::default_config_dir() {
            builder = builder.standard_dir(standard_dir);
        }
        if let Some(custom_dir) = custom_dir {
            builder = builder.custom_dir(custom_dir);
        }

        builder.build()
    }

    /// Domain for an author.
    ///
    /// Exact match first, then a case-insensitive match, then the author
    /// lowercased with spaces and hyphens removed plus `.com`.
    pub fn domain_for(&self, author: &str) -> String {
        if let Some(domain) = self.entries.get(author) {
            return domain.clone();
        }

        if let Some((_, domain)) = self.entries.iter().find(|(key, _)| key.eq_ignore_ascii_case(author)) {
            return domain.clone();
        }

        format!("{}.com", author.to_lowercase().replace([' ', '-'], ""))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `~/.config/rankwatch` (platform equivalent).
    fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rankwatch"))
    }

    /// Parses `Author: domain` lines.
    pub fn parse_string(content: &str) -> Result<Vec<(String, String)>> {
        content
            .lines()
            .enumerate()
            .filter_map(|(index, line)| parse_line(line, index + 1).transpose())
            .collect()
    }

    /// Parses `Author: domain` lines from a reader.
    pub fn parse_reader<R: BufRead>(reader: R) -> Result<Vec<(String, String)>> {
        let mut entries = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line_number = index + 1;
            let line = line
                .map_err(|e| RankwatchError::ConfigError(format!("Read error at line {}: {}", line_number, e)))?;

            if let Some(entry) = parse_line(&line, line_number)? {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    /// Parses a domain file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>> {
        let file = fs::File::open(&path).map_err(|e| {
            RankwatchError::ConfigError(format!("Cannot open file {}: {}", path.as_ref().display(), e))
        })?;

        Self::parse_reader(BufReader::new(file))
    }
}

impl Default for DomainMap {
    fn default() -> Self {
        Self::builtin()
    }
}

fn parse_line(line: &str, line_number: usize) -> Result<Option<(String, String)>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let Some((author, domain)) = line.split_once(':') else {
        return Err(RankwatchError::ConfigError(format!(
            "Parse error at line {}: expected 'Author: domain'",
            line_number
        )));
    };

    let author = author.trim();
    let domain = domain.trim().trim_end_matches('/');
    if author.is_empty() || domain.is_empty() || domain.contains(char::is_whitespace) {
        return Err(RankwatchError::ConfigError(format!(
            "Parse error at line {}: invalid entry '{}'",
            line_number, line
        )));
    }

    Ok(Some((author.to_string(), domain.to_string())))
}

/// Builder for [`DomainMap`].
#[derive(Debug, Default)]
pub struct DomainMapBuilder {
    custom_dir: Option<PathBuf>,
    standard_dir: Option<PathBuf>,
    extra: Vec<(String, String)>,
}

impl DomainMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory whose `domains.txt` overrides everything else.
    pub fn custom_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.custom_dir = Some(dir.into());
        self
    }

    /// Directory whose `domains.txt` extends the built-in table.
    pub fn standard_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.standard_dir = Some(dir.into());
        self
    }

    /// Adds a single entry, applied last.
    pub fn entry(mut self, author: impl Into<String>, domain: impl Into<String>) -> Self {
        self.extra.push((author.into(), domain.into()));
        self
    }

    /// Builds the map: built-ins, then standard, then custom, then single entries.
    ///
    /// A missing directory or file is skipped; a malformed file is an error.
    pub fn build(self) -> Result<DomainMap> {
        let mut map = DomainMap::builtin();

        for dir in [self.standard_dir, self.custom_dir].into_iter().flatten() {
            let path = dir.join(DOMAINS_FILE);
            if !path.exists() {
                continue;
            }

            let entries = DomainMap::parse_file(&path)?;
            tracing::debug!(path = %path.display(), count = entries.len(), "loaded domain entries");
            map.entries.extend(entries);
        }

        map.entries.extend(self.extra);
        Ok(map)
    }
}
