use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const PRICING_URL: &str = "https://www.nadlan.gov.il/Pricing";

/// Number of cities listed on the portal's landing table
pub const DEFAULT_CITY_LIMIT: usize = 80;

/// Which scraper a set of parameters belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScraperKind {
    Listings,
    Environment,
}

impl ScraperKind {
    pub fn name(self) -> &'static str {
        match self {
            ScraperKind::Listings => "listings",
            ScraperKind::Environment => "environment",
        }
    }
}

/// Bounded polling for "wait until present"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll: Duration,
}

impl WaitPolicy {
    pub fn new(timeout: Duration, poll: Duration) -> Self {
        Self { timeout, poll }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(60), Duration::from_secs(1))
    }
}

/// What to do when a step of the crawl fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    Skip,
    Abort,
}

/// Per call-site failure handling. City-list failures and persistence
/// failures always abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPolicy {
    /// Neighborhood list of a city could not be read or entered
    pub city: OnFailure,
    /// Content of a neighborhood could not be loaded or extracted
    pub neighborhood: OnFailure,
}

impl ErrorPolicy {
    pub fn strict() -> Self {
        Self {
            city: OnFailure::Abort,
            neighborhood: OnFailure::Abort,
        }
    }
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self {
            city: OnFailure::Skip,
            neighborhood: OnFailure::Skip,
        }
    }
}

/// Scroll-until-stable settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollParams {
    pub settle: Duration,
    /// Consecutive unchanged heights that count as "bottom reached"
    pub stable_rounds: u32,
    /// Hard cap on scroll rounds for pages that never settle
    pub max_rounds: u32,
}

impl Default for ScrollParams {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(2),
            stable_rounds: 6,
            max_rounds: 500,
        }
    }
}

/// Everything a crawl needs to know
#[derive(Debug, Clone)]
pub struct ScrapeParams {
    pub kind: ScraperKind,
    pub url: String,
    /// How many cities to visit, counted from the top of the table
    pub city_limit: usize,
    pub wait: WaitPolicy,
    /// Pause before reading a button list
    pub list_settle: Duration,
    /// Pause before reading the environment panel
    pub panel_settle: Duration,
    pub scroll: ScrollParams,
    pub output: PathBuf,
    /// Prepend an unnamed running row index to the CSV
    pub index_column: bool,
    /// Reload the parent page after going back
    pub reload_on_back: bool,
    /// Name used when the first neighborhood label is empty once its prefix
    /// is stripped
    pub first_neighborhood_fallback: Option<String>,
    pub policy: ErrorPolicy,
    pub resume: bool,
    pub headless: bool,
}

impl ScrapeParams {
    /// Defaults for the transaction listings scraper
    pub fn listings() -> Self {
        Self {
            kind: ScraperKind::Listings,
            url: PRICING_URL.to_string(),
            city_limit: DEFAULT_CITY_LIMIT,
            wait: WaitPolicy::default(),
            list_settle: Duration::from_secs(5),
            panel_settle: Duration::from_secs(10),
            scroll: ScrollParams::default(),
            output: PathBuf::from("listings.csv"),
            index_column: true,
            reload_on_back: false,
            first_neighborhood_fallback: None,
            policy: ErrorPolicy::default(),
            resume: false,
            headless: true,
        }
    }

    /// Defaults for the neighborhood environment scraper
    pub fn environment() -> Self {
        Self {
            kind: ScraperKind::Environment,
            wait: WaitPolicy::new(Duration::from_secs(5), Duration::from_secs(1)),
            list_settle: Duration::from_secs(2),
            output: PathBuf::from("environment.csv"),
            index_column: false,
            reload_on_back: true,
            ..Self::listings()
        }
    }

    pub fn for_kind(kind: ScraperKind) -> Self {
        match kind {
            ScraperKind::Listings => Self::listings(),
            ScraperKind::Environment => Self::environment(),
        }
    }
}

impl Default for ScrapeParams {
    fn default() -> Self {
        Self::listings()
    }
}
