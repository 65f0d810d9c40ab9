use std::time::Duration;

use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::traits::Driver;
use super::types::WaitPolicy;
use crate::error::{Result, ScrapeError};

/// Parse a CSS selector
pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Text content of every element matching `selector`, untrimmed
pub fn texts(page: &Html, selector: &Selector) -> Vec<String> {
    page.select(selector)
        .map(|el| el.text().collect::<String>())
        .collect()
}

/// A driver plus the waiting rules applied to it
pub struct Session<D: Driver> {
    driver: D,
    wait: WaitPolicy,
}

impl<D: Driver> Session<D> {
    pub fn new(driver: D, wait: WaitPolicy) -> Self {
        Self { driver, wait }
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Fixed pause for asynchronous content to render
    pub fn settle(&mut self, duration: Duration) {
        if !duration.is_zero() {
            self.driver.pause(duration);
        }
    }

    pub fn snapshot(&mut self) -> Result<Html> {
        let html = self.driver.html()?;
        Ok(Html::parse_document(&html))
    }

    /// Poll the page until `probe` yields a value or the timeout runs out.
    /// `what` names the awaited thing in the `PageLoad` error.
    pub fn wait_for<T>(&mut self, what: &str, mut probe: impl FnMut(&Html) -> Option<T>) -> Result<T> {
        let step = self.wait.poll.max(Duration::from_millis(1));
        let mut waited = Duration::ZERO;
        loop {
            let page = self.snapshot()?;
            if let Some(found) = probe(&page) {
                debug!("`{}` present after {:?}", what, waited);
                return Ok(found);
            }
            if waited >= self.wait.timeout {
                warn!("Gave up waiting for `{}` after {:?}", what, waited);
                return Err(ScrapeError::PageLoad {
                    selector: what.to_string(),
                    waited,
                });
            }
            self.driver.pause(step);
            waited += step;
        }
    }

    /// Wait until at least one element matches, then return all their texts
    pub fn wait_for_texts(&mut self, css: &str) -> Result<Vec<String>> {
        let sel = selector(css)?;
        self.wait_for(css, |page| {
            let found = texts(page, &sel);
            (!found.is_empty()).then_some(found)
        })
    }

    /// Wait until at least `min` elements match; returns the match count
    pub fn wait_for_count(&mut self, css: &str, min: usize) -> Result<usize> {
        let sel = selector(css)?;
        let min = min.max(1);
        self.wait_for(css, |page| {
            let count = page.select(&sel).count();
            (count >= min).then_some(count)
        })
    }

    /// Wait until every selector matches something, then return that snapshot
    pub fn wait_for_all(&mut self, selectors: &[&str]) -> Result<Html> {
        let parsed = selectors
            .iter()
            .map(|css| selector(css))
            .collect::<Result<Vec<_>>>()?;
        let what = selectors.join(", ");
        let html = self.wait_for(&what, |page| {
            parsed
                .iter()
                .all(|sel| page.select(sel).next().is_some())
                .then(|| page.html())
        })?;
        Ok(Html::parse_document(&html))
    }
}
