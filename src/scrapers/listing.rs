use scraper::Html;
use tracing::{debug, info, warn};

use super::loader::scroll_until_stable;
use super::session::{selector, texts, Session};
use super::traits::{Driver, NeighborhoodScraper};
use super::types::{ScrapeParams, ScraperKind, ScrollParams};
use crate::error::Result;
use crate::models::{Place, TransactionRecord};
use crate::storage::ColumnTable;

/// Position of each field inside one row of the neighborhood's deal table.
///
/// The table is a flat run of `div.tableCol` cells; `stride` cells make one
/// deal. Offsets not named here (2, 8, 9) are separators or columns we do
/// not keep. A markup change on the portal is fixed by editing this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingLayout {
    pub cell_selector: &'static str,
    pub stride: usize,
    pub sale_date: usize,
    pub address: usize,
    pub property_type: usize,
    pub rooms: usize,
    pub floor: usize,
    pub area: usize,
    pub price: usize,
}

pub const LISTING_LAYOUT: ListingLayout = ListingLayout {
    cell_selector: "div.tableCol",
    stride: 10,
    sale_date: 0,
    address: 1,
    property_type: 3,
    rooms: 4,
    floor: 5,
    area: 6,
    price: 7,
};

/// Split "street number" on its last whitespace run.
///
/// An address with no tokens gives no street and no number; a single token is
/// taken as the street.
pub fn split_address(text: &str) -> (Option<String>, Option<String>) {
    let text = text.trim();
    if text.is_empty() {
        return (None, None);
    }
    match text.rsplit_once(char::is_whitespace) {
        Some((street, number)) => (
            Some(street.trim_end().to_string()),
            Some(number.to_string()),
        ),
        None => (Some(text.to_string()), None),
    }
}

/// Decode table cells into one record per complete row
pub fn decode_rows(cells: &[String], layout: &ListingLayout, place: &Place) -> Vec<TransactionRecord> {
    let stride = layout.stride.max(1);
    let leftover = cells.len() % stride;
    if leftover != 0 {
        warn!(
            "{} trailing cells in {} do not form a full row; skipped",
            leftover, place.neighborhood.name
        );
    }

    cells
        .chunks_exact(stride)
        .map(|row| {
            let cell = |offset: usize| row.get(offset).map(|c| c.trim().to_string()).unwrap_or_default();
            let (street, building_number) = split_address(&cell(layout.address));
            TransactionRecord {
                sale_date: cell(layout.sale_date),
                city: place.city.name.clone(),
                neighborhood: place.neighborhood.name.clone(),
                street,
                building_number,
                property_type: cell(layout.property_type),
                rooms: cell(layout.rooms),
                floor: cell(layout.floor),
                area_sqm: cell(layout.area),
                price: cell(layout.price),
            }
        })
        .collect()
}

/// Transaction rows of every neighborhood
pub struct ListingScraper {
    layout: ListingLayout,
    scroll: ScrollParams,
}

impl ListingScraper {
    pub fn new(params: &ScrapeParams) -> Self {
        Self {
            layout: LISTING_LAYOUT,
            scroll: params.scroll,
        }
    }
}

impl NeighborhoodScraper for ListingScraper {
    type Record = TransactionRecord;

    fn kind(&self) -> ScraperKind {
        ScraperKind::Listings
    }

    fn load<D: Driver>(&self, session: &mut Session<D>) -> Result<Html> {
        let outcome = scroll_until_stable(session, &self.scroll)?;
        debug!("Scrolled {} rounds, height {}", outcome.rounds, outcome.height);
        session.snapshot()
    }

    fn extract(&self, page: &Html, place: &Place, table: &mut ColumnTable) -> Result<usize> {
        let cells = texts(page, &selector(self.layout.cell_selector)?);
        info!(
            "{} / {}: ~{} housing units",
            place.city.name,
            place.neighborhood.name,
            cells.len() / self.layout.stride.max(1)
        );

        let records = decode_rows(&cells, &self.layout, place);
        for record in &records {
            table.append(record);
        }
        Ok(records.len())
    }
}
