use std::fmt;

use url::form_urlencoded;

pub const DEFAULT_SITE: &str = "https://in.indeed.com";
/// Listings per results page; pagination offsets step by this.
pub const RESULTS_PER_PAGE: u32 = 10;

/// One (keyword, location) search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub keyword: String,
    pub location: String,
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" in \"{}\"", self.keyword, self.location)
    }
}

/// Every keyword paired with every location, keyword-major.
pub fn cross_product(keywords: &[String], locations: &[String]) -> Vec<Query> {
    keywords
        .iter()
        .flat_map(|keyword| {
            locations.iter().map(move |location| Query {
                keyword: keyword.clone(),
                location: location.clone(),
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Site {
    base: String,
}

impl Site {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Results page URL; offset 0 is the seed page and carries no `start`.
    pub fn search_url(&self, query: &Query, offset: u32) -> String {
        let mut params = form_urlencoded::Serializer::new(String::new());
        params
            .append_pair("q", &query.keyword)
            .append_pair("l", &query.location);
        if offset > 0 {
            params.append_pair("start", &offset.to_string());
        }
        format!("{}/jobs?{}", self.base, params.finish())
    }

    pub fn detail_url(&self, job_key: &str) -> String {
        let params = form_urlencoded::Serializer::new(String::new())
            .append_pair("viewtype", "embedded")
            .append_pair("jk", job_key)
            .finish();
        format!("{}/m/basecamp/viewjob?{}", self.base, params)
    }
}

impl Default for Site {
    fn default() -> Self {
        Site::new(DEFAULT_SITE)
    }
}
