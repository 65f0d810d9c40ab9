use tracing::{debug, warn};

use super::session::Session;
use super::traits::Driver;
use super::types::ScrollParams;
use crate::error::Result;

/// Control that opens the "what's around" panel of a neighborhood
pub const ENVIRONMENT_CONTROL: &str = "a.mwa-top-bar__mwa";

/// The panel lives in the second iframe; the first one is page chrome
pub const PANEL_FRAME: &str = "iframe";
pub const PANEL_FRAME_INDEX: usize = 1;

/// Counts consecutive scroll rounds that left the page height unchanged
#[derive(Debug, Clone)]
pub struct StuckCounter {
    threshold: u32,
    stuck: u32,
    last: u64,
}

impl StuckCounter {
    pub fn new(threshold: u32, initial_height: u64) -> Self {
        Self {
            threshold,
            stuck: 0,
            last: initial_height,
        }
    }

    /// Record the height read after a scroll. Returns true once the height
    /// has been unchanged for `threshold` consecutive reads.
    pub fn observe(&mut self, height: u64) -> bool {
        if height == self.last {
            self.stuck += 1;
        } else {
            self.stuck = 0;
            self.last = height;
        }
        self.is_stable()
    }

    pub fn is_stable(&self) -> bool {
        self.stuck >= self.threshold
    }

    pub fn stuck(&self) -> u32 {
        self.stuck
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOutcome {
    pub rounds: u32,
    pub height: u64,
    /// False when the round cap ended the loop
    pub settled: bool,
}

/// Scroll to the bottom until the page height stops changing, so the
/// infinite-scroll table has rendered every row. Hitting the bottom is a
/// heuristic: a slow network can end this early. At least one round always
/// runs.
pub fn scroll_until_stable<D: Driver>(
    session: &mut Session<D>,
    params: &ScrollParams,
) -> Result<ScrollOutcome> {
    let mut counter = StuckCounter::new(params.stable_rounds, session.driver().scroll_height()?);
    let max_rounds = params.max_rounds.max(1);
    let mut rounds = 0;
    let mut height = 0;

    while rounds < max_rounds {
        session.driver().scroll_to_bottom()?;
        session.settle(params.settle);
        height = session.driver().scroll_height()?;
        rounds += 1;

        if counter.observe(height) {
            debug!("Page height settled at {} after {} rounds", height, rounds);
            return Ok(ScrollOutcome {
                rounds,
                height,
                settled: true,
            });
        }
    }

    warn!(
        "Page height still changing after {} scroll rounds; extracting what is loaded",
        rounds
    );
    Ok(ScrollOutcome {
        rounds,
        height,
        settled: false,
    })
}

/// Open the environment panel and route queries into its frame
pub fn open_environment_panel<D: Driver>(session: &mut Session<D>) -> Result<()> {
    session.wait_for_count(ENVIRONMENT_CONTROL, 1)?;
    session.driver().click(ENVIRONMENT_CONTROL, 0)?;
    session.wait_for_count(PANEL_FRAME, PANEL_FRAME_INDEX + 1)?;
    session.driver().enter_frame(PANEL_FRAME, PANEL_FRAME_INDEX)?;
    debug!("Switched into environment panel frame");
    Ok(())
}
