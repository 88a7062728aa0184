use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::stripped_text;
use crate::error::ParseError;
use crate::record::JobRecord;

/// Description container on a job-detail page.
pub const CONTAINER_SELECTOR: &str = r#"div[id="jobDescriptionText"]"#;

static CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(CONTAINER_SELECTOR).unwrap());
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Description {
    pub bullets: Vec<String>,
    pub paragraphs: Vec<String>,
}

pub fn extract_description(html: &str) -> Result<Description, ParseError> {
    let document = Html::parse_document(html);
    let container = document
        .select(&CONTAINER)
        .next()
        .ok_or(ParseError::MissingElement {
            selector: CONTAINER_SELECTOR,
        })?;

    Ok(Description {
        bullets: container.select(&LIST_ITEM).map(stripped_text).collect(),
        paragraphs: container.select(&PARAGRAPH).map(stripped_text).collect(),
    })
}

/// Attach the description of a rendered detail page to its record.
pub fn enrich(record: &mut JobRecord, html: &str) -> Result<(), ParseError> {
    let description = extract_description(html)?;
    record.job_desc1 = description.bullets;
    record.job_desc2 = description.paragraphs;
    Ok(())
}
