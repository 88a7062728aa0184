use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::dataset::DEFAULT_DATASET;
use crate::fetch::{FetcherKind, Waits};
use crate::normalize::{AcceptAll, MinSetBits, SalaryFilter};
use crate::site::DEFAULT_SITE;

const CONFIG_FILE: &str = "indeed_scraper";
const ENV_PREFIX: &str = "INDEED";

/// Run settings: defaults, then `indeed_scraper.toml`, then `INDEED_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub site: String,
    pub dataset_path: PathBuf,
    pub fetcher: FetcherKind,
    pub headless: bool,
    pub ready_timeout_secs: u64,
    pub dismiss_timeout_secs: u64,
    /// 0 turns the salary plausibility filter off.
    pub salary_min_set_bits: u32,
    pub dedupe: bool,
    pub skip_failed_details: bool,
    pub keywords: Vec<String>,
    pub locations: Vec<String>,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(
                    Environment::with_prefix(ENV_PREFIX)
                        .try_parsing(true)
                        .list_separator(";")
                        .with_list_parse_key("keywords")
                        .with_list_parse_key("locations"),
                ),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder
            .set_default("site", DEFAULT_SITE)?
            .set_default("dataset_path", DEFAULT_DATASET)?
            .set_default("fetcher", "chrome")?
            .set_default("headless", true)?
            .set_default("ready_timeout_secs", 20)?
            .set_default("dismiss_timeout_secs", 5)?
            .set_default("salary_min_set_bits", 4)?
            .set_default("dedupe", false)?
            .set_default("skip_failed_details", false)?
            .set_default("keywords", vec!["Python Analyst"])?
            .set_default("locations", vec!["New Delhi, Delhi"])?
            .build()?
            .try_deserialize()
    }

    pub fn waits(&self) -> Waits {
        Waits {
            ready: Duration::from_secs(self.ready_timeout_secs),
            dismiss: Duration::from_secs(self.dismiss_timeout_secs),
        }
    }

    pub fn salary_filter(&self) -> Box<dyn SalaryFilter> {
        match self.salary_min_set_bits {
            0 => Box::new(AcceptAll),
            bits => Box::new(MinSetBits(bits)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::from_builder(Config::builder()).unwrap();
        assert_eq!(s.site, DEFAULT_SITE);
        assert_eq!(s.dataset_path, PathBuf::from(DEFAULT_DATASET));
        assert_eq!(s.fetcher, FetcherKind::Chrome);
        assert_eq!(s.keywords, vec!["Python Analyst"]);
        assert_eq!(s.locations, vec!["New Delhi, Delhi"]);
        assert_eq!(s.waits().dismiss, Duration::from_secs(5));
        assert!(!s.dedupe);
        assert!(!s.salary_filter().is_plausible(4096));
    }

    #[test]
    fn overrides_from_source() {
        let s = Settings::from_builder(
            Config::builder()
                .set_override("fetcher", "http")
                .unwrap()
                .set_override("salary_min_set_bits", 0)
                .unwrap(),
        )
        .unwrap();
        assert_eq!(s.fetcher, FetcherKind::Http);
        assert!(s.salary_filter().is_plausible(4096));
    }
}
