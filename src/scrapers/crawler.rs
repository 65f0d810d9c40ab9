use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::navigator::{Level, Navigator};
use super::session::Session;
use super::traits::{Driver, NeighborhoodScraper};
use super::types::{OnFailure, ScrapeParams};
use crate::error::Result;
use crate::models::{City, CrawlState, Neighborhood, Phase, Place, TableRow};
use crate::storage::{Checkpoint, ColumnTable, Persister};

/// Counters reported at the end of a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub cities_visited: usize,
    pub cities_skipped: usize,
    pub neighborhoods_scraped: usize,
    pub neighborhoods_skipped: usize,
    pub rows_written: usize,
    pub interrupted: bool,
}

enum Flow {
    Completed,
    Stopped,
}

/// Walks cities and neighborhoods, runs the scraper on each neighborhood
/// and flushes after every one of them.
pub struct Crawler<D: Driver, S: NeighborhoodScraper> {
    nav: Navigator<D>,
    scraper: S,
    params: ScrapeParams,
    table: ColumnTable,
    persister: Persister,
    checkpoint_path: PathBuf,
    state: CrawlState,
    summary: CrawlSummary,
    stop: Arc<AtomicBool>,
}

impl<D: Driver, S: NeighborhoodScraper> Crawler<D, S> {
    pub fn new(driver: D, scraper: S, params: ScrapeParams) -> Self {
        let session = Session::new(driver, params.wait);
        let nav = Navigator::new(session, params.list_settle, params.reload_on_back)
            .with_first_neighborhood_fallback(params.first_neighborhood_fallback.clone());
        let persister = Persister::new(&params.output, S::Record::COLUMNS, params.index_column);
        let checkpoint_path = Checkpoint::path_for(&params.output);

        Self {
            nav,
            scraper,
            table: ColumnTable::for_rows::<S::Record>(),
            persister,
            checkpoint_path,
            state: CrawlState::default(),
            summary: CrawlSummary::default(),
            stop: Arc::new(AtomicBool::new(false)),
            params,
        }
    }

    /// Share a flag that, once set, ends the crawl after the current
    /// neighborhood
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn persister(&self) -> &Persister {
        &self.persister
    }

    pub fn into_driver(self) -> D {
        self.nav.into_session().into_driver()
    }

    /// Pick up the rows and position of an earlier run. Returns the restored
    /// state, or `None` when there is no checkpoint.
    pub fn resume(&mut self) -> Result<Option<CrawlState>> {
        let kind = self.scraper.kind().name();
        let Some(checkpoint) = Checkpoint::load(&self.checkpoint_path, kind)? else {
            info!("No checkpoint at {}; starting fresh", self.checkpoint_path.display());
            return Ok(None);
        };

        let loaded = self.persister.load_existing()?;
        if loaded != checkpoint.rows_written {
            warn!(
                "Checkpoint expected {} rows, {} holds {}",
                checkpoint.rows_written,
                self.persister.path().display(),
                loaded
            );
        }

        self.state = checkpoint.state;
        if self.state.phase == Phase::Flushing {
            self.state.phase = Phase::Accumulating;
        }
        info!(
            "Resuming at city #{}, neighborhood #{} ({} rows on disk)",
            self.state.city_index, self.state.neighborhood_index, loaded
        );
        Ok(Some(self.state))
    }

    pub fn run(&mut self) -> Result<CrawlSummary> {
        if self.state.phase == Phase::Done {
            info!("Checkpoint says this crawl already finished");
            self.summary.rows_written = self.persister.row_count();
            return Ok(self.summary.clone());
        }

        let result = self
            .nav
            .open(&self.params.url)
            .and_then(|()| self.crawl_cities());

        if let Err(e) = &result {
            error!("Aborting crawl: {}", e);
            self.table.clear();
        }
        let finished = self.finish(result.is_ok());

        result?;
        finished?;
        Ok(self.summary.clone())
    }

    fn stopped(&mut self) -> bool {
        let stopped = self.stop.load(Ordering::SeqCst);
        if stopped && !self.summary.interrupted {
            warn!("Stop requested; finishing up");
            self.summary.interrupted = true;
        }
        stopped
    }

    fn crawl_cities(&mut self) -> Result<()> {
        while self.state.city_index < self.params.city_limit {
            if self.stopped() {
                return Ok(());
            }

            self.nav.select_neighborhood_view()?;
            let cities = self.nav.enumerate(Level::City)?;
            let Some(entry) = cities.get(self.state.city_index).cloned() else {
                info!("Only {} cities listed; done", cities.len());
                break;
            };
            self.nav.enter(&entry)?;

            let city = City {
                index: entry.index,
                name: entry.name,
            };
            info!("🏙  City #{}: {}", city.index, city.name);

            match self.crawl_neighborhoods(&city) {
                Ok(Flow::Completed) => self.summary.cities_visited += 1,
                Ok(Flow::Stopped) => return Ok(()),
                Err(e) if e.is_page_failure() && self.params.policy.city == OnFailure::Skip => {
                    warn!("Skipping rest of {}: {}", city.name, e);
                    self.table.clear();
                    self.summary.cities_skipped += 1;
                }
                Err(e) => return Err(e),
            }

            self.nav.return_to(0)?;
            self.state.next_city();
            self.save_checkpoint()?;
        }
        Ok(())
    }

    fn crawl_neighborhoods(&mut self, city: &City) -> Result<Flow> {
        loop {
            if self.stopped() {
                return Ok(Flow::Stopped);
            }

            let neighborhoods = self.nav.enumerate(Level::Neighborhood)?;
            let Some(entry) = neighborhoods.get(self.state.neighborhood_index).cloned() else {
                debug!("{}: {} neighborhoods", city.name, neighborhoods.len());
                return Ok(Flow::Completed);
            };
            self.nav.enter(&entry)?;

            let place = Place {
                city: city.clone(),
                neighborhood: Neighborhood {
                    index: entry.index,
                    name: entry.name,
                },
            };

            match self.scrape_neighborhood(&place) {
                Ok(rows) => {
                    info!("  {} -> {} rows", place.neighborhood.name, rows);
                    self.summary.neighborhoods_scraped += 1;
                }
                Err(e) if e.is_page_failure() && self.params.policy.neighborhood == OnFailure::Skip => {
                    warn!("  Skipping {}: {}", place.neighborhood.name, e);
                    self.table.clear();
                    self.summary.neighborhoods_skipped += 1;
                }
                Err(e) => return Err(e),
            }

            self.flush_neighborhood()?;
            self.nav.return_to(1)?;
            self.nav.select_neighborhood_view()?;
        }
    }

    fn scrape_neighborhood(&mut self, place: &Place) -> Result<usize> {
        let page = self.scraper.load(self.nav.session())?;
        self.scraper.extract(&page, place, &mut self.table)
    }

    /// Accumulating -> Flushing -> Accumulating, one neighborhood further
    fn flush_neighborhood(&mut self) -> Result<()> {
        self.state.phase = Phase::Flushing;
        self.persister.flush(&mut self.table)?;
        self.state.next_neighborhood();
        self.state.phase = Phase::Accumulating;
        self.save_checkpoint()
    }

    /// Final flush. The checkpoint only moves to `Done` when the crawl ran to
    /// the end, so an aborted or interrupted run can be resumed.
    fn finish(&mut self, completed: bool) -> Result<()> {
        self.state.phase = Phase::Flushing;
        let flushed = self.persister.flush(&mut self.table);
        self.state.phase = if completed && !self.summary.interrupted {
            Phase::Done
        } else {
            Phase::Accumulating
        };
        flushed?;

        self.summary.rows_written = self.persister.row_count();
        self.save_checkpoint()?;
        info!(
            "💾 {} rows in {} after {} flushes",
            self.summary.rows_written,
            self.persister.path().display(),
            self.persister.flush_count()
        );
        Ok(())
    }

    fn save_checkpoint(&self) -> Result<()> {
        Checkpoint::new(self.scraper.kind().name(), self.state, self.persister.row_count())
            .save(&self.checkpoint_path)
    }
}
