use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::raw_text;
use crate::error::ParseError;
use crate::normalize::{
    annualize_salary, coerce_numeric_or_string, parse_relative_duration, SalaryFilter,
};
use crate::record::{IntOrText, JobRecord, SalaryPeriod, TAXONOMY_SLOTS};
use crate::site::Site;

/// Script element that carries the page's provider data.
pub const SCRIPT_SELECTOR: &str = r#"script[id="mosaic-data"]"#;

static SCRIPT: LazyLock<Selector> = LazyLock::new(|| Selector::parse(SCRIPT_SELECTOR).unwrap());
static PROVIDER_DATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"window\.mosaic\.providerData\["mosaic-provider-jobcards"\]=(\{.+?\});"#)
        .unwrap()
});

const RESULTS_PATH: [&str; 3] = ["metaData", "mosaicProviderJobCardsModel", "results"];

/// Optional part of a job entry that was absent and replaced by its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Salary,
    CompanyRating,
    ActivityDate,
    HiresNeeded,
    SalarySnippet,
    Taxonomy(&'static str),
    JobKey,
}

#[derive(Debug, Clone)]
pub struct Listing {
    pub record: JobRecord,
    pub missing: Vec<MissingField>,
}

/// Project every job entry of a rendered results page into a record.
///
/// Any structural problem (no script, no provider blob, bad JSON, a required
/// key absent) fails the whole page.
pub fn extract_listings(
    html: &str,
    site: &Site,
    filter: &dyn SalaryFilter,
) -> Result<Vec<Listing>, ParseError> {
    let blob = provider_data(html)?;
    results(&blob)?
        .iter()
        .enumerate()
        .map(|(index, value)| Entry { index, value }.extract(site, filter))
        .collect()
}

fn provider_data(html: &str) -> Result<Value, ParseError> {
    let document = Html::parse_document(html);
    let script = document
        .select(&SCRIPT)
        .next()
        .ok_or(ParseError::MissingElement {
            selector: SCRIPT_SELECTOR,
        })?;
    let text = raw_text(script);
    let caps = PROVIDER_DATA
        .captures(&text)
        .ok_or(ParseError::MissingProviderData)?;
    Ok(serde_json::from_str(&caps[1])?)
}

fn results(blob: &Value) -> Result<&Vec<Value>, ParseError> {
    let mut node = blob;
    let mut path = String::new();
    for key in RESULTS_PATH {
        if !path.is_empty() {
            path.push('.');
        }
        path.push_str(key);
        node = node
            .get(key)
            .ok_or_else(|| ParseError::MissingKey { path: path.clone() })?;
    }
    node.as_array().ok_or(ParseError::WrongType {
        path,
        expected: "an array",
    })
}

struct Entry<'a> {
    index: usize,
    value: &'a Value,
}

impl<'a> Entry<'a> {
    fn path(&self, key: &str) -> String {
        format!("results[{}].{}", self.index, key)
    }

    fn required(&self, key: &str) -> Result<&'a Value, ParseError> {
        self.value
            .get(key)
            .ok_or_else(|| ParseError::MissingKey { path: self.path(key) })
    }

    fn required_str(&self, key: &str) -> Result<&'a str, ParseError> {
        self.required(key)?
            .as_str()
            .ok_or_else(|| ParseError::WrongType {
                path: self.path(key),
                expected: "a string",
            })
    }

    fn required_bool(&self, key: &str) -> Result<bool, ParseError> {
        self.required(key)?
            .as_bool()
            .ok_or_else(|| ParseError::WrongType {
                path: self.path(key),
                expected: "a boolean",
            })
    }

    fn extract(&self, site: &Site, filter: &dyn SalaryFilter) -> Result<Listing, ParseError> {
        let mut missing = Vec::new();
        let v = self.value;

        let company_rating = v.get("companyRating").and_then(Value::as_f64);
        if company_rating.is_none() {
            missing.push(MissingField::CompanyRating);
        }

        let (min_salary, max_salary, salary_type) = match salary(v) {
            Some((min, max, period)) => {
                let (min, max) = annualize_salary(min, max, period, filter);
                (min, max, period)
            }
            None => {
                missing.push(MissingField::Salary);
                (0, 0, SalaryPeriod::Unknown)
            }
        };

        let activity_days = match v
            .get("formattedActivityDate")
            .and_then(Value::as_str)
            .map(parse_relative_duration)
        {
            Some(IntOrText::Int(days)) => Some(days),
            _ => {
                missing.push(MissingField::ActivityDate);
                None
            }
        };

        let hires_needed = hires_needed(v).unwrap_or_else(|| {
            missing.push(MissingField::HiresNeeded);
            IntOrText::default()
        });

        let salary_snippet = match v
            .get("salarySnippet")
            .and_then(|s| s.get("text"))
            .and_then(Value::as_str)
        {
            Some(text) => text.to_string(),
            None => {
                missing.push(MissingField::SalarySnippet);
                String::new()
            }
        };

        let groups = v.get("taxonomyAttributes").and_then(Value::as_array);
        let taxonomy: [String; 6] = std::array::from_fn(|slot| {
            match groups.and_then(|g| g.get(slot)).and_then(taxonomy_label) {
                Some(label) => label,
                None => {
                    missing.push(MissingField::Taxonomy(TAXONOMY_SLOTS[slot]));
                    String::new()
                }
            }
        });

        let job_key = v.get("jobkey").and_then(Value::as_str);
        if job_key.is_none() {
            missing.push(MissingField::JobKey);
        }

        let record = JobRecord {
            company: self.required_str("company")?.to_string(),
            company_rating,
            display_title: self.required_str("displayTitle")?.to_string(),
            employer_responsive: self.required_bool("employerResponsive")?,
            max_salary,
            min_salary,
            salary_type,
            formatted_location: self.required_str("formattedLocation")?.to_string(),
            activity_days,
            relative_time: parse_relative_duration(self.required_str("formattedRelativeTime")?),
            hires_needed,
            salary_snippet,
            taxonomy,
            urgently_hiring: self.required_bool("urgentlyHiring")?,
            job_url: job_key.map(|key| site.detail_url(key)),
            job_desc1: Vec::new(),
            job_desc2: Vec::new(),
        };

        if !missing.is_empty() {
            debug!(
                index = self.index,
                job_key = job_key.unwrap_or("-"),
                ?missing,
                "Defaulted optional fields"
            );
        }

        Ok(Listing { record, missing })
    }
}

/// Whole-number salary bounds only; a fractional bound invalidates the block.
fn salary(entry: &Value) -> Option<(i64, i64, SalaryPeriod)> {
    let block = entry.get("extractedSalary")?;
    let min = block.get("min")?.as_i64()?;
    let max = block.get("max")?.as_i64()?;
    let period = SalaryPeriod::parse(block.get("type")?.as_str()?);
    Some((min, max, period))
}

fn hires_needed(entry: &Value) -> Option<IntOrText> {
    match entry
        .get("hiringMultipleCandidatesModel")?
        .get("hiresNeededExact")?
    {
        Value::String(s) => Some(coerce_numeric_or_string(s)),
        Value::Number(n) => n.as_i64().map(IntOrText::Int),
        _ => None,
    }
}

/// Label of the group's first attribute, "" when the group holds none.
fn taxonomy_label(group: &Value) -> Option<String> {
    let attributes = group.get("attributes")?.as_array()?;
    match attributes.first() {
        None => Some(String::new()),
        Some(first) => first.get("label")?.as_str().map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{AcceptAll, MinSetBits};
    use crate::parser::fixtures;

    fn page1() -> Vec<Listing> {
        let html = fixtures::load("results_page1");
        extract_listings(&html, &Site::default(), &MinSetBits(4)).unwrap()
    }

    #[test]
    fn extracts_every_entry_in_order() {
        let listings = page1();
        let titles: Vec<&str> = listings
            .iter()
            .map(|l| l.record.display_title.as_str())
            .collect();
        assert_eq!(
            titles,
            vec![
                "Python Analyst",
                "Data Analyst - Python",
                "Junior Python Developer",
                "Reporting Analyst"
            ]
        );
    }

    #[test]
    fn complete_entry() {
        let r = &page1()[0].record;
        assert_eq!(r.company, "Acme Analytics");
        assert_eq!(r.company_rating, Some(4.1));
        assert!(r.employer_responsive);
        assert_eq!((r.min_salary, r.max_salary), (600000, 900000));
        assert_eq!(r.salary_type, SalaryPeriod::Yearly);
        assert_eq!(r.formatted_location, "New Delhi, Delhi");
        assert_eq!(r.activity_days, Some(4));
        assert_eq!(r.relative_time, IntOrText::Int(30));
        assert_eq!(r.hires_needed, IntOrText::Int(5));
        assert_eq!(r.salary_snippet, "₹6,00,000 - ₹9,00,000 a year");
        assert_eq!(r.taxonomy_label("job_type"), Some("Full-time"));
        assert_eq!(r.taxonomy_label("shift"), Some("Day shift"));
        assert_eq!(r.taxonomy_label("remote"), Some(""));
        assert_eq!(r.taxonomy_label("benefits"), Some("Health insurance"));
        assert_eq!(r.taxonomy_label("schedules"), Some("Monday to Friday"));
        assert!(!r.urgently_hiring);
        assert_eq!(
            r.job_url.as_deref(),
            Some("https://in.indeed.com/m/basecamp/viewjob?viewtype=embedded&jk=a1b2c3d4e5f60718")
        );
        assert!(r.job_desc1.is_empty() && r.job_desc2.is_empty());
        assert!(page1()[0].missing.is_empty());
    }

    #[test]
    fn monthly_entry_with_enum_hires() {
        let r = &page1()[1].record;
        assert_eq!((r.min_salary, r.max_salary), (600000, 840000));
        assert_eq!(r.salary_type, SalaryPeriod::Monthly);
        assert_eq!(r.hires_needed, IntOrText::Text("RECURRING_HIRE".into()));
        assert_eq!(r.relative_time, IntOrText::Text("Today".into()));
        assert_eq!(r.activity_days, None);
        assert!(r.taxonomy.iter().all(String::is_empty));
        assert!(r.urgently_hiring);
    }

    #[test]
    fn missing_salary_defaults_to_zero() {
        let listing = &page1()[2];
        let r = &listing.record;
        assert_eq!((r.max_salary, r.min_salary, r.salary_type.as_str()), (0, 0, ""));
        assert_eq!(r.hires_needed, IntOrText::Text(String::new()));
        assert_eq!(r.salary_snippet, "");
        assert_eq!(r.company_rating, None);
        assert!(listing.missing.contains(&MissingField::Salary));
        assert!(listing.missing.contains(&MissingField::HiresNeeded));
        assert!(listing.missing.contains(&MissingField::SalarySnippet));
    }

    #[test]
    fn short_taxonomy_fills_remaining_slots() {
        let listing = &page1()[2];
        assert_eq!(listing.record.taxonomy_label("job_type"), Some("Internship"));
        assert_eq!(listing.record.taxonomy_label("shift"), Some(""));
        assert!(!listing.missing.contains(&MissingField::Taxonomy("shift")));
        assert!(listing.missing.contains(&MissingField::Taxonomy("remote")));
        assert!(listing.missing.contains(&MissingField::Taxonomy("schedules")));
    }

    #[test]
    fn no_job_key_means_no_url() {
        let listing = &page1()[2];
        assert_eq!(listing.record.job_url, None);
        assert!(listing.missing.contains(&MissingField::JobKey));
    }

    #[test]
    fn sentinel_salary_is_filtered() {
        let r = &page1()[3].record;
        assert_eq!((r.min_salary, r.max_salary), (0, 100000));

        let html = fixtures::load("results_page1");
        let unfiltered = extract_listings(&html, &Site::default(), &AcceptAll).unwrap();
        assert_eq!(unfiltered[3].record.min_salary, 4096);
    }

    #[test]
    fn numeric_hires_in_json() {
        let html = fixtures::results_page(&[fixtures::entry(
            "Zeta",
            r#""hiringMultipleCandidatesModel":{"hiresNeededExact":3},"jobkey":"z1""#,
        )]);
        let listings = extract_listings(&html, &Site::default(), &AcceptAll).unwrap();
        assert_eq!(listings[0].record.hires_needed, IntOrText::Int(3));
    }

    #[test]
    fn fractional_salary_is_treated_as_missing() {
        let html = fixtures::results_page(&[fixtures::entry(
            "Hourly Co",
            r#""extractedSalary":{"min":150.5,"max":250.75,"type":"hourly"},"jobkey":"h1""#,
        )]);
        let listings = extract_listings(&html, &Site::default(), &AcceptAll).unwrap();
        let r = &listings[0].record;
        assert_eq!((r.min_salary, r.max_salary, r.salary_type.as_str()), (0, 0, ""));
        assert!(listings[0].missing.contains(&MissingField::Salary));
    }

    #[test]
    fn missing_script_fails_page() {
        let err = extract_listings("<html><body></body></html>", &Site::default(), &AcceptAll)
            .unwrap_err();
        assert!(matches!(err, ParseError::MissingElement { .. }));
    }

    #[test]
    fn missing_provider_blob_fails_page() {
        let html = r#"<html><script id="mosaic-data">window.mosaic.providerData["mosaic-provider-rich-media"]={};</script></html>"#;
        let err = extract_listings(html, &Site::default(), &AcceptAll).unwrap_err();
        assert!(matches!(err, ParseError::MissingProviderData));
    }

    #[test]
    fn missing_required_key_fails_page() {
        let html = fixtures::results_page(&[r#"{"company":"NoTitle","jobkey":"x"}"#.to_string()]);
        let err = extract_listings(&html, &Site::default(), &AcceptAll).unwrap_err();
        match err {
            ParseError::MissingKey { path } => assert_eq!(path, "results[0].displayTitle"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_results_is_not_an_error() {
        let html = fixtures::results_page(&[]);
        assert!(extract_listings(&html, &Site::default(), &AcceptAll)
            .unwrap()
            .is_empty());
    }
}
