use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::replace_atomically;
use crate::error::{Result, ScrapeError};
use crate::models::CrawlState;

/// Crawl position saved next to the CSV after every flush
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub scraper: String,
    pub state: CrawlState,
    pub rows_written: usize,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(scraper: &str, state: CrawlState, rows_written: usize) -> Self {
        Self {
            scraper: scraper.to_string(),
            state,
            rows_written,
            updated_at: Utc::now(),
        }
    }

    /// `listings.csv` -> `listings.csv.state.json`
    pub fn path_for(output: &Path) -> PathBuf {
        let mut name = output
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".state.json");
        output.with_file_name(name)
    }

    /// Load a checkpoint written by `scraper`. A missing file is `None`; a
    /// checkpoint from the other scraper kind is an error.
    pub fn load(path: &Path, scraper: &str) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)?;
        let checkpoint: Checkpoint = serde_json::from_str(&json)?;
        if checkpoint.scraper != scraper {
            return Err(ScrapeError::Checkpoint {
                path: path.to_path_buf(),
                expected: scraper.to_string(),
            });
        }
        Ok(Some(checkpoint))
    }

    /// Write through a temporary sibling so a crash never leaves a truncated
    /// checkpoint behind
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        replace_atomically(path, |tmp| -> Result<()> {
            fs::write(tmp, json)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Phase;

    #[test]
    fn path_sits_next_to_output() {
        let path = Checkpoint::path_for(Path::new("out/listings.csv"));
        assert_eq!(path, PathBuf::from("out/listings.csv.state.json"));
    }

    #[test]
    fn save_then_load_keeps_position() {
        let mut path = std::env::temp_dir();
        path.push(format!("pricing_scout_{}_ckpt.json", std::process::id()));

        let state = CrawlState {
            city_index: 3,
            neighborhood_index: 2,
            phase: Phase::Accumulating,
        };
        Checkpoint::new("listings", state, 41).save(&path).unwrap();

        let loaded = Checkpoint::load(&path, "listings").unwrap().unwrap();
        assert_eq!(loaded.state, state);
        assert_eq!(loaded.rows_written, 41);

        assert!(matches!(
            Checkpoint::load(&path, "environment"),
            Err(ScrapeError::Checkpoint { .. })
        ));
    }

    #[test]
    fn stale_tmp_file_does_not_break_resume() {
        let mut path = std::env::temp_dir();
        path.push(format!("pricing_scout_{}_stale_ckpt.json", std::process::id()));
        let tmp = crate::storage::tmp_path(&path);

        let state = CrawlState {
            city_index: 1,
            neighborhood_index: 4,
            phase: Phase::Accumulating,
        };
        Checkpoint::new("environment", state, 9).save(&path).unwrap();
        assert!(!tmp.exists());

        // a write interrupted halfway through
        fs::write(&tmp, "{\"scraper\": \"envir").unwrap();

        let loaded = Checkpoint::load(&path, "environment").unwrap().unwrap();
        assert_eq!(loaded.state, state);

        Checkpoint::new("environment", CrawlState::default(), 0).save(&path).unwrap();
        assert!(!tmp.exists());
        let reloaded = Checkpoint::load(&path, "environment").unwrap().unwrap();
        assert_eq!(reloaded.rows_written, 0);
    }
}
