use std::thread;
use std::time::Duration;

use scraper::Html;

use super::session::Session;
use super::types::ScraperKind;
use crate::error::Result;
use crate::models::{Place, TableRow};
use crate::storage::ColumnTable;

/// Minimal browser surface the crawler needs.
///
/// Every query goes through the markup of the current browsing context,
/// which is the top document unless a frame has been entered.
pub trait Driver {
    fn open(&mut self, url: &str) -> Result<()>;

    /// Outer HTML of the current browsing context
    fn html(&mut self) -> Result<String>;

    /// Click the `index`-th element matching `selector`
    fn click(&mut self, selector: &str, index: usize) -> Result<()>;

    fn back(&mut self) -> Result<()>;

    fn reload(&mut self) -> Result<()>;

    /// Height of the top document's body
    fn scroll_height(&mut self) -> Result<u64>;

    fn scroll_to_bottom(&mut self) -> Result<()>;

    /// Route subsequent queries into the `index`-th frame matching `selector`
    fn enter_frame(&mut self, selector: &str, index: usize) -> Result<()>;

    /// Route queries back to the top document
    fn leave_frame(&mut self);

    fn pause(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Per-neighborhood half of a scraper: how to get the content on screen and
/// how to turn it into records.
pub trait NeighborhoodScraper {
    type Record: TableRow;

    fn kind(&self) -> ScraperKind;

    /// Make the neighborhood's content available and snapshot it
    fn load<D: Driver>(&self, session: &mut Session<D>) -> Result<Html>;

    /// Decode the snapshot, append the records to `table` and return how
    /// many were appended
    fn extract(&self, page: &Html, place: &Place, table: &mut ColumnTable) -> Result<usize>;
}
