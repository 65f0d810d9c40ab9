use std::path::PathBuf;
use std::time::Duration;

/// Errors raised by navigation, extraction and persistence.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// A wait predicate was never satisfied. The portal gives no way to tell
    /// a slow page from a missing element, so both end up here.
    #[error("page did not load: `{selector}` not present after {waited:?}")]
    PageLoad { selector: String, waited: Duration },

    #[error("no element #{index} for `{selector}`")]
    MissingElement { selector: String, index: usize },

    #[error("frame #{index} of `{selector}` is not accessible")]
    FrameUnavailable { selector: String, index: usize },

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("browser error: {0:#}")]
    Browser(anyhow::Error),

    /// Accumulator columns differ in length at flush time.
    #[error("ragged table: column `{column}` has {found} values, expected {expected}")]
    RaggedTable {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("checkpoint {} does not match {expected}", .path.display())]
    Checkpoint { path: PathBuf, expected: String },
}

impl ScrapeError {
    pub fn browser(err: anyhow::Error) -> Self {
        Self::Browser(err)
    }

    /// Failures that come from the page rather than from our own output.
    /// Only these are eligible for skip policies.
    pub fn is_page_failure(&self) -> bool {
        matches!(
            self,
            Self::PageLoad { .. }
                | Self::MissingElement { .. }
                | Self::FrameUnavailable { .. }
                | Self::Browser(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
