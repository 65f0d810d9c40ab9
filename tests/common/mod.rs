// Scripted stand-in for the pricing portal.
#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use pricing_scout::scrapers::{Driver, ScrapeParams, ScraperKind, WaitPolicy};
use pricing_scout::{Result, ScrapeError};

pub struct FakeNeighborhood {
    pub label: String,
    pub deals: Vec<[String; 10]>,
}

pub struct FakeCity {
    pub label: String,
    pub neighborhoods: Vec<FakeNeighborhood>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Cities,
    City(usize),
    Neighborhood(usize, usize),
}

pub struct FakeSite {
    pub cities: Vec<FakeCity>,
    /// Neighborhoods whose environment panel never becomes reachable
    pub broken_panels: HashSet<(usize, usize)>,
    /// Heights returned by `scroll_height`; the last one repeats
    pub heights: VecDeque<u64>,
    pub visits: Vec<(usize, usize)>,
    pub view_clicks: usize,
    pub reloads: usize,
    pub pauses: Vec<Duration>,
    stack: Vec<Screen>,
    panel_open: bool,
    in_frame: bool,
}

pub fn deal(date: &str, address: &str, price: &str) -> [String; 10] {
    [date, address, "", "Apartment", "3", "1", "70", price, "", ""].map(str::to_string)
}

fn neighborhood(label: &str, deals: usize, seed: usize) -> FakeNeighborhood {
    FakeNeighborhood {
        label: label.to_string(),
        deals: (0..deals)
            .map(|i| deal("01.01.2022", &format!("Herzl {}", seed * 10 + i), &format!("{}", 1_000_000 + i)))
            .collect(),
    }
}

fn sentinel() -> FakeNeighborhood {
    FakeNeighborhood {
        label: " ".to_string(),
        deals: Vec::new(),
    }
}

impl FakeSite {
    pub fn new(cities: Vec<FakeCity>) -> Self {
        Self {
            cities,
            broken_panels: HashSet::new(),
            heights: VecDeque::from([1000]),
            visits: Vec::new(),
            view_clicks: 0,
            reloads: 0,
            pauses: Vec::new(),
            stack: vec![Screen::Cities],
            panel_open: false,
            in_frame: false,
        }
    }

    /// Haifa: 2 neighborhoods, Tel Aviv: 3, Eilat: 1; each followed by a
    /// blank sentinel button and holding 2 deals per neighborhood.
    pub fn three_cities() -> Self {
        Self::new(vec![
            FakeCity {
                label: "City -- Haifa".into(),
                neighborhoods: vec![
                    neighborhood("Area: Carmel", 2, 1),
                    neighborhood("Hadar", 2, 2),
                    sentinel(),
                ],
            },
            FakeCity {
                label: "City -- Tel Aviv".into(),
                neighborhoods: vec![
                    neighborhood("Area: Florentin", 2, 3),
                    neighborhood("Neve Tzedek", 2, 4),
                    neighborhood("Jaffa", 2, 5),
                    sentinel(),
                ],
            },
            FakeCity {
                label: "City -- Eilat".into(),
                neighborhoods: vec![neighborhood("Area: Shahamon", 2, 6), sentinel()],
            },
        ])
    }

    pub fn with_broken_panel(mut self, city: usize, neighborhood: usize) -> Self {
        self.broken_panels.insert((city, neighborhood));
        self
    }

    fn screen(&self) -> Screen {
        *self.stack.last().unwrap_or(&Screen::Cities)
    }

    fn buttons(labels: &[String]) -> String {
        let mut html = String::new();
        for i in 0..10 {
            html.push_str(&format!("<button class=\"nav\">nav {}</button>", i));
        }
        html.push_str("<button class=\"toggle\">neighborhoods</button>");
        for label in labels {
            html.push_str(&format!("<button class=\"text\">{}</button>", label));
        }
        html
    }

    fn panel(&self, city: usize, hood: usize) -> String {
        let mut html = String::new();
        for value in ["5", "11", "3", "650"] {
            html.push_str(&format!(
                "<div class=\"mwa-education__item-title ng-binding\">{}</div>",
                value
            ));
        }
        for i in 0..12 {
            html.push_str(&format!("<b class=\"ng-binding\">{}{}{}</b>", city, hood, i));
        }
        html.push_str("<div class=\"mwa-cols__item-title ng-binding\">280</div>");
        html
    }

    fn page(&self) -> String {
        let body = if self.in_frame {
            match self.screen() {
                Screen::Neighborhood(c, h) => self.panel(c, h),
                _ => String::new(),
            }
        } else {
            match self.screen() {
                Screen::Cities => {
                    let labels: Vec<String> = self.cities.iter().map(|c| c.label.clone()).collect();
                    Self::buttons(&labels)
                }
                Screen::City(c) => {
                    let labels: Vec<String> = self.cities[c]
                        .neighborhoods
                        .iter()
                        .map(|n| n.label.clone())
                        .collect();
                    Self::buttons(&labels)
                }
                Screen::Neighborhood(c, h) => {
                    let mut html = String::from("<a class=\"mwa-top-bar__mwa\">around</a>");
                    if self.panel_open {
                        html.push_str("<iframe></iframe><iframe></iframe>");
                    }
                    html.push_str("<div class=\"table\">");
                    for deal in &self.cities[c].neighborhoods[h].deals {
                        for cell in deal {
                            html.push_str(&format!("<div class=\"tableCol\">{}</div>", cell));
                        }
                    }
                    html.push_str("</div>");
                    html
                }
            }
        };
        format!("<html><body>{}</body></html>", body)
    }

    fn missing(selector: &str, index: usize) -> ScrapeError {
        ScrapeError::MissingElement {
            selector: selector.to_string(),
            index,
        }
    }
}

impl Driver for FakeSite {
    fn open(&mut self, _url: &str) -> Result<()> {
        self.stack = vec![Screen::Cities];
        self.in_frame = false;
        self.panel_open = false;
        Ok(())
    }

    fn html(&mut self) -> Result<String> {
        Ok(self.page())
    }

    fn click(&mut self, selector: &str, index: usize) -> Result<()> {
        match (selector, self.screen()) {
            ("button", Screen::Cities | Screen::City(_)) if index == 10 => {
                self.view_clicks += 1;
            }
            ("button.text", Screen::Cities) if index < self.cities.len() => {
                self.stack.push(Screen::City(index));
            }
            ("button.text", Screen::City(c)) if index < self.cities[c].neighborhoods.len() => {
                self.visits.push((c, index));
                self.stack.push(Screen::Neighborhood(c, index));
            }
            ("a.mwa-top-bar__mwa", Screen::Neighborhood(..)) if index == 0 => {
                self.panel_open = true;
            }
            _ => return Err(Self::missing(selector, index)),
        }
        Ok(())
    }

    fn back(&mut self) -> Result<()> {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
        self.panel_open = false;
        self.in_frame = false;
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        self.reloads += 1;
        self.panel_open = false;
        self.in_frame = false;
        Ok(())
    }

    fn scroll_height(&mut self) -> Result<u64> {
        let height = if self.heights.len() > 1 {
            self.heights.pop_front()
        } else {
            self.heights.front().copied()
        };
        Ok(height.unwrap_or(0))
    }

    fn scroll_to_bottom(&mut self) -> Result<()> {
        Ok(())
    }

    fn enter_frame(&mut self, selector: &str, index: usize) -> Result<()> {
        let reachable = match self.screen() {
            Screen::Neighborhood(c, h) => self.panel_open && index == 1 && !self.broken_panels.contains(&(c, h)),
            _ => false,
        };
        if !reachable {
            return Err(ScrapeError::FrameUnavailable {
                selector: selector.to_string(),
                index,
            });
        }
        self.in_frame = true;
        Ok(())
    }

    fn leave_frame(&mut self) {
        self.in_frame = false;
    }

    fn pause(&mut self, duration: Duration) {
        self.pauses.push(duration);
    }
}

/// Parameters with every delay zeroed and a single-poll wait
pub fn fast_params(kind: ScraperKind, name: &str) -> ScrapeParams {
    let mut params = ScrapeParams::for_kind(kind);
    params.output = scratch(name);
    params.wait = WaitPolicy::new(Duration::ZERO, Duration::from_millis(1));
    params.list_settle = Duration::ZERO;
    params.panel_settle = Duration::ZERO;
    params.scroll.settle = Duration::ZERO;
    params
}

/// Fresh output path in the temp dir, with any earlier output and checkpoint
/// removed
pub fn scratch(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("pricing_scout_{}_{}", std::process::id(), name));
    let _ = fs::remove_file(&path);
    let mut state = path.clone().into_os_string();
    state.push(".state.json");
    let _ = fs::remove_file(PathBuf::from(state));
    path
}

/// Rows of a written CSV, header excluded
pub fn read_rows(path: &PathBuf) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).expect("open output");
    reader
        .records()
        .map(|r| r.expect("read row").iter().map(str::to_string).collect())
        .collect()
}
