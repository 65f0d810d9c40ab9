pub mod browser;
pub mod crawler;
pub mod environment;
pub mod listing;
pub mod loader;
pub mod navigator;
pub mod session;
pub mod traits;
pub mod types;

pub use browser::ChromeDriver;
pub use crawler::{CrawlSummary, Crawler};
pub use environment::EnvironmentScraper;
pub use listing::ListingScraper;
pub use navigator::{EntryHandle, Level, Navigator};
pub use session::Session;
pub use traits::{Driver, NeighborhoodScraper};
pub use types::{ErrorPolicy, OnFailure, ScrapeParams, ScraperKind, ScrollParams, WaitPolicy};
