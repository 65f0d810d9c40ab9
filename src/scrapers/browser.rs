use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result as AnyResult};
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use tracing::{debug, info};

use super::traits::Driver;
use crate::error::{Result, ScrapeError};

/// How long a history navigation may take to leave the current URL
const BACK_TIMEOUT: Duration = Duration::from_secs(30);
const BACK_POLL: Duration = Duration::from_millis(100);

/// `Driver` backed by a headless Chrome tab.
///
/// Queries run as page scripts against either the top document or the
/// `contentDocument` of the entered frame, which requires the frame to be
/// same-origin with the portal.
pub struct ChromeDriver {
    // Dropping the browser kills the Chrome process.
    _browser: Browser,
    tab: Arc<Tab>,
    frame: Option<(String, usize)>,
}

impl ChromeDriver {
    /// Launch Chrome and open a blank tab
    pub fn launch(headless: bool) -> AnyResult<Self> {
        info!("Launching {} Chrome...", if headless { "headless" } else { "visible" });

        let options = LaunchOptions::default_builder()
            .headless(headless)
            .window_size(Some((1920, 1080)))
            .idle_browser_timeout(Duration::from_secs(600))
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open a tab")?;

        Ok(Self {
            _browser: browser,
            tab,
            frame: None,
        })
    }

    /// JS expression for the document queries should run against
    fn root(&self) -> String {
        match &self.frame {
            None => "document".to_string(),
            Some((selector, index)) => format!(
                "(function() {{ const f = document.querySelectorAll({})[{}]; return f ? f.contentDocument : null; }})()",
                js_string(selector),
                index
            ),
        }
    }

    fn eval(&self, script: &str) -> Result<Option<Value>> {
        let object = self
            .tab
            .evaluate(script, false)
            .map_err(ScrapeError::browser)?;
        Ok(object.value)
    }
}

fn js_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// Poll `current` until it differs from `from`, pausing `poll` between
/// reads. Returns the time waited, or `PageLoad` once `timeout` is used up.
fn wait_until_changed(
    what: &str,
    from: &str,
    timeout: Duration,
    poll: Duration,
    mut current: impl FnMut() -> String,
    mut pause: impl FnMut(Duration),
) -> Result<Duration> {
    let mut waited = Duration::ZERO;
    while current() == from {
        if waited >= timeout {
            return Err(ScrapeError::PageLoad {
                selector: what.to_string(),
                waited,
            });
        }
        pause(poll);
        waited += poll;
    }
    Ok(waited)
}

impl Driver for ChromeDriver {
    fn open(&mut self, url: &str) -> Result<()> {
        info!("Opening {}", url);
        self.frame = None;
        self.tab.navigate_to(url).map_err(ScrapeError::browser)?;
        self.tab.wait_until_navigated().map_err(ScrapeError::browser)?;
        Ok(())
    }

    fn html(&mut self) -> Result<String> {
        let script = format!(
            "(function() {{ const root = {}; return root && root.documentElement ? root.documentElement.outerHTML : ''; }})()",
            self.root()
        );
        let html = self
            .eval(&script)?
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        Ok(html)
    }

    fn click(&mut self, selector: &str, index: usize) -> Result<()> {
        debug!("Clicking {}[{}]", selector, index);
        let script = format!(
            "(function() {{ const root = {}; if (!root) return false; const els = root.querySelectorAll({}); if (els.length <= {}) return false; els[{}].click(); return true; }})()",
            self.root(),
            js_string(selector),
            index,
            index
        );
        match self.eval(&script)? {
            Some(Value::Bool(true)) => Ok(()),
            _ => Err(ScrapeError::MissingElement {
                selector: selector.to_string(),
                index,
            }),
        }
    }

    /// Go back one history entry and block until the previous page has
    /// loaded. `history.back()` returns before the navigation starts, so the
    /// URL change is awaited first.
    fn back(&mut self) -> Result<()> {
        self.frame = None;
        let from = self.tab.get_url();
        self.eval("history.back()")?;

        let tab = Arc::clone(&self.tab);
        let waited = wait_until_changed(
            "history.back()",
            &from,
            BACK_TIMEOUT,
            BACK_POLL,
            || tab.get_url(),
            thread::sleep,
        )?;
        self.tab.wait_until_navigated().map_err(ScrapeError::browser)?;
        debug!("Back from {} after {:?}", from, waited);
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        self.frame = None;
        self.tab.reload(false, None).map_err(ScrapeError::browser)?;
        self.tab.wait_until_navigated().map_err(ScrapeError::browser)?;
        Ok(())
    }

    fn scroll_height(&mut self) -> Result<u64> {
        let height = self
            .eval("document.body.scrollHeight")?
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        Ok(height as u64)
    }

    fn scroll_to_bottom(&mut self) -> Result<()> {
        self.eval("window.scrollTo(0, document.body.scrollHeight)")?;
        Ok(())
    }

    fn enter_frame(&mut self, selector: &str, index: usize) -> Result<()> {
        let script = format!(
            "(function() {{ const f = document.querySelectorAll({})[{}]; return !!(f && f.contentDocument); }})()",
            js_string(selector),
            index
        );
        match self.eval(&script)? {
            Some(Value::Bool(true)) => {
                self.frame = Some((selector.to_string(), index));
                Ok(())
            }
            _ => Err(ScrapeError::FrameUnavailable {
                selector: selector.to_string(),
                index,
            }),
        }
    }

    fn leave_frame(&mut self) {
        self.frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_for_the_url_to_change() {
        let mut urls = vec!["/city", "/hood", "/hood"];
        let mut pauses = Vec::new();
        let waited = wait_until_changed(
            "back",
            "/hood",
            Duration::from_secs(5),
            Duration::from_secs(1),
            || urls.pop().unwrap_or("/city").to_string(),
            |d| pauses.push(d),
        )
        .unwrap();

        assert_eq!(waited, Duration::from_secs(2));
        assert_eq!(pauses.len(), 2);
    }

    #[test]
    fn url_that_never_changes_times_out() {
        let err = wait_until_changed(
            "back",
            "/hood",
            Duration::from_secs(3),
            Duration::from_secs(1),
            || "/hood".to_string(),
            |_| {},
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ScrapeError::PageLoad { ref selector, waited } if selector == "back" && waited == Duration::from_secs(3)
        ));
    }
}
