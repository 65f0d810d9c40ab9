//! Crawls the government real-estate pricing portal city by city and
//! neighborhood by neighborhood, writing transaction deals or neighborhood
//! environment statistics to CSV after every neighborhood.

pub mod error;
pub mod models;
pub mod scrapers;
pub mod storage;

pub use error::{Result, ScrapeError};
