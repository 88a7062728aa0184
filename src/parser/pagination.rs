use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::stripped_text;
use crate::site::{Query, Site, RESULTS_PER_PAGE};

/// Page-number items of the results pager.
pub const INDICATOR_SELECTOR: &str = "li.css-227srf.eu4oa1w0";

static INDICATOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(INDICATOR_SELECTOR).unwrap());

/// Non-empty pager labels in document order. The first one is the current page.
pub fn page_indicators(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&INDICATOR)
        .map(stripped_text)
        .filter(|text| !text.is_empty())
        .collect()
}

/// URLs of the pages after the first, at offsets 10, 20, ...
pub fn plan_pages(html: &str, site: &Site, query: &Query) -> Vec<String> {
    let additional = page_indicators(html).len().saturating_sub(1) as u32;
    (1..=additional)
        .map(|page| site.search_url(query, page * RESULTS_PER_PAGE))
        .collect()
}
