pub mod dom;
pub mod tiers;

use std::fmt;

use scraper::Html;
use serde::Serialize;
use tracing::debug;

use crate::settings::ExtractorConfig;

/// Which stage of the cascade produced a job description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Heading,
    LargestList,
    DensestParagraphs,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Heading => "heading",
            Tier::LargestList => "largest_list",
            Tier::DensestParagraphs => "densest_paragraphs",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-tier cascade: keyword heading → largest list → densest paragraph container.
/// The first tier with non-empty text wins; `None` when none qualifies.
pub fn extract_with_tier(document: &Html, config: &ExtractorConfig) -> Option<(Tier, String)> {
    let cascade: [(Tier, fn(&Html, &ExtractorConfig) -> String); 3] = [
        (Tier::Heading, tiers::heading_section),
        (Tier::LargestList, |doc, _| tiers::largest_list(doc)),
        (Tier::DensestParagraphs, |doc, _| tiers::densest_paragraphs(doc)),
    ];

    for (tier, run) in cascade {
        let text = run(document, config);
        if !text.is_empty() {
            debug!(%tier, chars = text.len(), "job description located");
            return Some((tier, text));
        }
        debug!(%tier, "tier produced nothing, falling through");
    }
    None
}

/// Plain-text job description, or an empty string when nothing plausible was found.
pub fn extract_job_description(document: &Html, config: &ExtractorConfig) -> String {
    extract_with_tier(document, config)
        .map(|(_, text)| text)
        .unwrap_or_default()
}

/// Parse `html` and run the cascade on it.
pub fn extract_from_html(html: &str, config: &ExtractorConfig) -> Option<(Tier, String)> {
    let document = Html::parse_document(html);
    extract_with_tier(&document, config)
}

// ── Tests ──
