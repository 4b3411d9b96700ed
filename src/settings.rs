use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_SERVICE_URL: &str = "http://localhost:5001";
const DEFAULT_DB_PATH: &str = "data/resume_tailor.sqlite";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime settings: defaults, then `resume_tailor.toml` (optional), then `TAILOR_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub service_url: String,
    pub db_path: String,
    pub timeout_secs: u64,
    pub narrow: bool,
    pub max_heading_level: Option<u8>,
}

impl Settings {
    pub fn load() -> Result<Self> {
        ::config::Config::builder()
            .set_default("service_url", DEFAULT_SERVICE_URL)?
            .set_default("db_path", DEFAULT_DB_PATH)?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("narrow", false)?
            .add_source(::config::File::with_name("resume_tailor").required(false))
            .add_source(::config::Environment::with_prefix("TAILOR").try_parsing(true))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Extractor configuration, with CLI flags taking precedence over settings.
    pub fn extractor_config(&self, narrow: bool, max_heading_level: Option<u8>) -> ExtractorConfig {
        let base = if narrow || self.narrow {
            ExtractorConfig::narrow()
        } else {
            ExtractorConfig::full()
        };
        match max_heading_level.or(self.max_heading_level) {
            Some(level) => base.with_max_heading_level(level),
            None => base,
        }
    }
}

const FULL_KEYWORDS: &[&str] = &[
    "Job Description",
    "Key Responsibilities",
    "Responsibilities",
    "Requirements",
    "Minimum Requirements",
    "Qualifications",
    "Desired Skills",
    "What we are looking for",
    "Role Overview",
];

const NARROW_KEYWORDS: &[&str] = &[
    "Job Description",
    "Responsibilities",
    "Requirements",
    "Qualifications",
    "Desired Skills",
    "What we are looking for",
    "Role Overview",
];

/// Keyword set and heading range the job-description extractor works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    keywords: Vec<String>,
    max_heading_level: u8,
}

impl ExtractorConfig {
    /// Keywords are lower-cased; the level is clamped to `1..=6`.
    pub fn new<I, S>(keywords: I, max_heading_level: u8) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            max_heading_level: max_heading_level.clamp(1, 6),
        }
    }

    /// Headings `h1`–`h6` with the extended keyword set.
    pub fn full() -> Self {
        Self::new(FULL_KEYWORDS, 6)
    }

    /// Headings `h1`–`h4` with the shorter keyword set.
    pub fn narrow() -> Self {
        Self::new(NARROW_KEYWORDS, 4)
    }

    pub fn with_max_heading_level(mut self, level: u8) -> Self {
        self.max_heading_level = level.clamp(1, 6);
        self
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn max_heading_level(&self) -> u8 {
        self.max_heading_level
    }

    /// `text` must already be trimmed and lower-cased.
    pub fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|kw| text.contains(kw.as_str()))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::full()
    }
}
