use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::dom;
use crate::settings::ExtractorConfig;

/// `HEADING_SELECTORS[n - 1]` matches `h1` through `hn`.
static HEADING_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    (1..=6)
        .map(|max| {
            let group = (1..=max).map(|l| format!("h{}", l)).collect::<Vec<_>>().join(", ");
            Selector::parse(&group).unwrap()
        })
        .collect()
});
static LIST_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("ul, ol").unwrap());
static PARAGRAPH_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());

/// Least item or paragraph count the fallback tiers accept.
pub const MIN_FALLBACK_COUNT: usize = 3;

/// First heading in range whose text contains a keyword.
pub fn anchor_heading<'a>(document: &'a Html, config: &ExtractorConfig) -> Option<ElementRef<'a>> {
    let selector = &HEADING_SELECTORS[usize::from(config.max_heading_level()) - 1];
    let found = document.select(selector).find(|h| {
        let text = dom::rendered_text(*h).trim().to_lowercase();
        config.matches(&text)
    });
    if found.is_none() {
        debug!(
            keywords = config.keywords().len(),
            max_level = config.max_heading_level(),
            "no keyword heading"
        );
    }
    found
}

/// Paragraphs and lists that follow the keyword heading, up to the next heading in range.
pub fn heading_section(document: &Html, config: &ExtractorConfig) -> String {
    let Some(heading) = anchor_heading(document, config) else {
        return String::new();
    };
    let max_level = config.max_heading_level();

    let blocks = dom::following_elements(heading)
        .take_while(|sib| !dom::is_heading_within(*sib, max_level))
        .filter_map(|sib| {
            if dom::is_paragraph(sib) {
                Some(dom::rendered_text(sib))
            } else if dom::is_list(sib) {
                Some(dom::render_list(sib))
            } else {
                None
            }
        });
    dom::join_blocks(blocks)
}

/// List with the strictly greatest own item count; earliest wins ties.
pub fn largest_list(document: &Html) -> String {
    let mut best: Option<ElementRef<'_>> = None;
    let mut max_items = 0;
    for list in document.select(&LIST_SELECTOR) {
        let count = dom::list_items(list).count();
        if count > max_items {
            max_items = count;
            best = Some(list);
        }
    }
    match best {
        // A winner with only blank items yields nothing, so the cascade moves on.
        Some(list) if max_items >= MIN_FALLBACK_COUNT && dom::has_visible_items(list) => {
            dom::render_list(list)
        }
        _ => String::new(),
    }
}

/// Parent element with the strictly greatest number of `<p>` children; earliest wins ties.
pub fn densest_paragraphs(document: &Html) -> String {
    let mut best: Option<ElementRef<'_>> = None;
    let mut max_paragraphs = 0;
    for p in document.select(&PARAGRAPH_SELECTOR) {
        let Some(parent) = p.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        let count = dom::paragraph_children(parent).count();
        if count > max_paragraphs {
            max_paragraphs = count;
            best = Some(parent);
        }
    }
    match best {
        Some(parent) if max_paragraphs >= MIN_FALLBACK_COUNT => dom::render_paragraphs(parent),
        _ => String::new(),
    }
}
