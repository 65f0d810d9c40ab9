use std::time::Duration;

use tracing::{debug, warn};

use super::session::Session;
use super::traits::Driver;
use crate::error::Result;

/// City and neighborhood lists are rendered with the same button widget
pub const LIST_BUTTONS: &str = "button.text";

/// The table-view toggle is the 11th button on the page
pub const VIEW_BUTTONS: &str = "button";
pub const NEIGHBORHOOD_VIEW_INDEX: usize = 10;

/// Characters of template text in front of every city label
pub const CITY_LABEL_PREFIX: usize = 8;

/// Characters of template text in front of the first neighborhood label.
/// Later neighborhood labels carry no prefix.
pub const FIRST_NEIGHBORHOOD_PREFIX: usize = 6;

/// True when a label marks the end of a button list: it starts with a space,
/// or there is nothing left to read.
pub fn is_blank(label: &str) -> bool {
    label.chars().next().map_or(true, |c| c == ' ')
}

/// Drop the first `count` characters (not bytes; labels are Hebrew)
pub fn strip_chars(label: &str, count: usize) -> String {
    label.chars().skip(count).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    City,
    Neighborhood,
}

impl Level {
    /// Template prefix length of the label at `index`
    pub fn prefix_len(self, index: usize) -> usize {
        match (self, index) {
            (Level::City, _) => CITY_LABEL_PREFIX,
            (Level::Neighborhood, 0) => FIRST_NEIGHBORHOOD_PREFIX,
            (Level::Neighborhood, _) => 0,
        }
    }
}

/// One enterable entry of a button list. Element handles go stale on every
/// navigation, so the handle keeps the position and the label instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHandle {
    pub level: Level,
    pub index: usize,
    pub label: String,
    pub name: String,
}

/// Turn raw button labels into entry handles, stopping at the first blank
pub fn entries_from_labels(level: Level, labels: &[String], fallback: Option<&str>) -> Vec<EntryHandle> {
    let mut entries = Vec::new();
    for (index, label) in labels.iter().enumerate() {
        let mut name = strip_chars(label, level.prefix_len(index));
        if name.is_empty() && index == 0 && level == Level::Neighborhood {
            if let Some(fallback) = fallback {
                name = fallback.to_string();
            }
        }
        if is_blank(&name) {
            debug!("{:?} list ends at #{}", level, index);
            break;
        }
        entries.push(EntryHandle {
            level,
            index,
            label: label.clone(),
            name,
        });
    }
    entries
}

/// Moves between the landing table, a city and a neighborhood
pub struct Navigator<D: Driver> {
    session: Session<D>,
    list_settle: Duration,
    reload_on_back: bool,
    first_neighborhood_fallback: Option<String>,
    depth: usize,
}

impl<D: Driver> Navigator<D> {
    pub fn new(session: Session<D>, list_settle: Duration, reload_on_back: bool) -> Self {
        Self {
            session,
            list_settle,
            reload_on_back,
            first_neighborhood_fallback: None,
            depth: 0,
        }
    }

    pub fn with_first_neighborhood_fallback(mut self, fallback: Option<String>) -> Self {
        self.first_neighborhood_fallback = fallback;
        self
    }

    pub fn session(&mut self) -> &mut Session<D> {
        &mut self.session
    }

    pub fn into_session(self) -> Session<D> {
        self.session
    }

    /// 0 on the landing table, 1 inside a city, 2 inside a neighborhood
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn open(&mut self, url: &str) -> Result<()> {
        self.session.driver().open(url)?;
        self.depth = 0;
        Ok(())
    }

    /// Switch the table to neighborhoods rather than streets
    pub fn select_neighborhood_view(&mut self) -> Result<()> {
        self.session.settle(self.list_settle);
        self.session
            .wait_for_count(VIEW_BUTTONS, NEIGHBORHOOD_VIEW_INDEX + 1)?;
        self.session
            .driver()
            .click(VIEW_BUTTONS, NEIGHBORHOOD_VIEW_INDEX)
    }

    /// Read the button list of the current page
    pub fn enumerate(&mut self, level: Level) -> Result<Vec<EntryHandle>> {
        self.session.settle(self.list_settle);
        let labels = self.session.wait_for_texts(LIST_BUTTONS)?;
        let entries = entries_from_labels(
            level,
            &labels,
            self.first_neighborhood_fallback.as_deref(),
        );
        debug!("{} {:?} entries on page", entries.len(), level);
        Ok(entries)
    }

    pub fn enter(&mut self, entry: &EntryHandle) -> Result<()> {
        let labels = self.session.wait_for_texts(LIST_BUTTONS)?;
        if labels.get(entry.index) != Some(&entry.label) {
            warn!(
                "Button #{} changed since enumeration (expected {:?})",
                entry.index, entry.name
            );
        }
        self.session.driver().click(LIST_BUTTONS, entry.index)?;
        self.depth += 1;
        Ok(())
    }

    pub fn exit_to_parent(&mut self) -> Result<()> {
        let driver = self.session.driver();
        driver.leave_frame();
        driver.back()?;
        if self.reload_on_back {
            driver.reload()?;
        }
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }

    /// Go back until the navigator is at `depth`
    pub fn return_to(&mut self, depth: usize) -> Result<()> {
        while self.depth > depth {
            self.exit_to_parent()?;
        }
        Ok(())
    }
}
