use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::debug;

use super::{PageFetcher, PageRequest};
use crate::error::FetchError;

/// One browser with a single tab, reused for every page of a query.
pub struct ChromeFetcher {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeFetcher {
    pub fn launch(headless: bool) -> Result<Self, FetchError> {
        let options = LaunchOptions::default_builder()
            .headless(headless)
            .sandbox(false)
            .window_size(Some((1920, 1080)))
            .args(vec![
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-notifications"),
            ])
            .build()
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        let browser = Browser::new(options).map_err(|e| FetchError::Launch(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| FetchError::Launch(e.to_string()))?;
        Ok(Self {
            _browser: browser,
            tab,
        })
    }
}

impl PageFetcher for ChromeFetcher {
    async fn fetch(&self, request: &PageRequest<'_>) -> Result<String, FetchError> {
        let tab = Arc::clone(&self.tab);
        let url = request.url.to_string();
        let ready = request.ready.to_string();
        let dismiss = request.dismiss.map(str::to_string);
        let waits = request.waits;

        tokio::task::spawn_blocking(move || {
            render(&tab, &url, &ready, dismiss.as_deref(), waits.ready, waits.dismiss)
        })
        .await
        .map_err(|e| FetchError::Navigation {
            url: request.url.to_string(),
            reason: e.to_string(),
        })?
    }

    fn close(self) -> Result<(), FetchError> {
        self.tab
            .close_target()
            .map(|_| ())
            .map_err(|e| FetchError::Release(e.to_string()))
    }
}

fn render(
    tab: &Tab,
    url: &str,
    ready: &str,
    dismiss: Option<&str>,
    ready_timeout: Duration,
    dismiss_timeout: Duration,
) -> Result<String, FetchError> {
    tab.navigate_to(url)
        .and_then(|t| t.wait_until_navigated())
        .map_err(|e| FetchError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    tab.wait_for_element_with_custom_timeout(ready, ready_timeout)
        .map_err(|_| FetchError::Timeout {
            url: url.to_string(),
            selector: ready.to_string(),
            waited: ready_timeout,
        })?;

    if let Some(selector) = dismiss {
        // The dialog only shows up sometimes; not finding it is fine.
        let closed = tab
            .wait_for_element_with_custom_timeout(selector, dismiss_timeout)
            .and_then(|button| button.click().map(|_| ()))
            .is_ok();
        debug!(url, closed, "Interstitial dialog");
    }

    tab.get_content().map_err(|e| FetchError::Navigation {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
