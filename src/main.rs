use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use pricing_scout::scrapers::types::DEFAULT_CITY_LIMIT;
use pricing_scout::scrapers::{
    ChromeDriver, CrawlSummary, Crawler, EnvironmentScraper, ErrorPolicy, ListingScraper,
    NeighborhoodScraper, ScrapeParams, ScraperKind,
};
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pricing-scout")]
#[command(about = "Scrapes deals and neighborhood environment data from the real-estate pricing portal", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Log level when RUST_LOG is not set"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Transaction deals of every neighborhood
    Listings(CrawlArgs),
    /// Schools, green areas and public buildings of every neighborhood
    Environment(CrawlArgs),
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// CSV file to write (rewritten after every neighborhood)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of cities to visit from the top of the table
    #[arg(long, default_value_t = DEFAULT_CITY_LIMIT)]
    cities: usize,

    /// Continue from the checkpoint next to the output file
    #[arg(long)]
    resume: bool,

    /// Abort on the first failing city or neighborhood instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Seconds to wait for an element before giving up
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    #[arg(long)]
    url: Option<String>,

    /// Name for a first neighborhood whose label comes up empty
    #[arg(long, value_name = "LABEL")]
    fallback_neighborhood: Option<String>,

    /// Stop scrolling a listing table after this many rounds
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    max_scroll_rounds: Option<u32>,
}

impl CrawlArgs {
    fn into_params(self, kind: ScraperKind) -> ScrapeParams {
        let mut params = ScrapeParams::for_kind(kind);
        if let Some(output) = self.output {
            params.output = output;
        }
        if let Some(url) = self.url {
            params.url = url;
        }
        if let Some(secs) = self.timeout {
            params.wait.timeout = Duration::from_secs(secs);
        }
        if let Some(rounds) = self.max_scroll_rounds {
            params.scroll.max_rounds = rounds;
        }
        if self.strict {
            params.policy = ErrorPolicy::strict();
        }
        params.city_limit = self.cities;
        params.resume = self.resume;
        params.headless = !self.headful;
        params.first_neighborhood_fallback = self.fallback_neighborhood;
        params
    }
}

fn init_tracing(level: LogLevel) {
    // RUST_LOG wins over --log-level
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    let (kind, args) = match cli.command {
        Commands::Listings(args) => (ScraperKind::Listings, args),
        Commands::Environment(args) => (ScraperKind::Environment, args),
    };
    let params = args.into_params(kind);

    info!("🏠 Pricing Scout - {} scraper", kind.name());
    info!("Writing to {}", params.output.display());

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl-C received; stopping after the current neighborhood");
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    let summary = tokio::task::spawn_blocking(move || run(params, stop))
        .await
        .context("Crawler thread panicked")??;

    info!("");
    info!("✅ Done{}", if summary.interrupted { " (interrupted)" } else { "" });
    info!("   Cities visited:        {}", summary.cities_visited);
    info!("   Cities skipped:        {}", summary.cities_skipped);
    info!("   Neighborhoods scraped: {}", summary.neighborhoods_scraped);
    info!("   Neighborhoods skipped: {}", summary.neighborhoods_skipped);
    info!("   Rows written:          {}", summary.rows_written);

    Ok(())
}

fn run(params: ScrapeParams, stop: Arc<AtomicBool>) -> anyhow::Result<CrawlSummary> {
    let driver = ChromeDriver::launch(params.headless)?;
    match params.kind {
        ScraperKind::Listings => crawl(driver, ListingScraper::new(&params), params, stop),
        ScraperKind::Environment => crawl(driver, EnvironmentScraper::new(&params), params, stop),
    }
}

fn crawl<S: NeighborhoodScraper>(
    driver: ChromeDriver,
    scraper: S,
    params: ScrapeParams,
    stop: Arc<AtomicBool>,
) -> anyhow::Result<CrawlSummary> {
    let resume = params.resume;
    let mut crawler = Crawler::new(driver, scraper, params).with_stop_flag(stop);
    if resume {
        crawler.resume().context("Failed to resume from checkpoint")?;
    }
    let summary = crawler.run().context("Crawl failed; rerun with --resume to continue")?;
    Ok(summary)
}
