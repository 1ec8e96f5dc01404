//! Harvests product records from the catalog into a local directory.
//!
//! Requires a WebDriver server (chromedriver or geckodriver) listening on the
//! configured URL, port 4444 by default.
//!
//! # Usage
//!
//! ```bash
//! chromedriver --port=4444 &
//! cargo run --bin harvest -- --category "DC Motors" --limit 5
//! ```

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use catalog_harvest::{
    BrowserKind, CrawlConfig, CrawlSession, NavigationTarget, PacingRange,
    config::{DEFAULT_CATALOG_URL, DEFAULT_OUTPUT_ROOT, DEFAULT_WEBDRIVER_URL},
};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BrowserArg {
    Chrome,
    Firefox,
}

impl From<BrowserArg> for BrowserKind {
    fn from(arg: BrowserArg) -> Self {
        match arg {
            BrowserArg::Chrome => BrowserKind::Chrome,
            BrowserArg::Firefox => BrowserKind::Firefox,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Exact name of the category to harvest (defaults to a fixed catalog position)
    #[arg(long, env = "HARVEST_CATEGORY")]
    category: Option<String>,
    /// Number of products to harvest
    #[arg(long, env = "HARVEST_LIMIT", default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    limit: u64,
    /// Directory receiving `<id>.json` files and `assets/<id>/`
    #[arg(long, env = "HARVEST_OUTPUT", default_value = DEFAULT_OUTPUT_ROOT)]
    output: PathBuf,
    /// Catalog root URL
    #[arg(long, env = "HARVEST_CATALOG_URL", default_value = DEFAULT_CATALOG_URL)]
    catalog_url: String,
    /// WebDriver server URL
    #[arg(long, env = "HARVEST_WEBDRIVER_URL", default_value = DEFAULT_WEBDRIVER_URL)]
    webdriver_url: String,
    /// Browser behind the WebDriver server
    #[arg(long, env = "HARVEST_BROWSER", value_enum, default_value_t = BrowserArg::Chrome)]
    browser: BrowserArg,
    /// Run the browser without a window
    #[arg(long, env = "HARVEST_HEADLESS")]
    headless: bool,
    /// Seconds to wait for page elements before giving up
    #[arg(long, env = "HARVEST_WAIT_SECS", default_value_t = 10)]
    wait_secs: u64,
    /// Lower bound of the random pause between interactions, in milliseconds
    #[arg(long, env = "HARVEST_PACING_MIN_MS", default_value_t = 2000)]
    pacing_min_ms: u64,
    /// Upper bound of the random pause between interactions, in milliseconds
    #[arg(long, env = "HARVEST_PACING_MAX_MS", default_value_t = 5000)]
    pacing_max_ms: u64,
    /// Zero-based category position clicked when no category is named
    #[arg(long, env = "HARVEST_DEFAULT_CATEGORY_POSITION")]
    default_category_position: Option<usize>,
    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> CrawlConfig {
        let defaults = CrawlConfig::default();
        CrawlConfig {
            catalog_url: self.catalog_url.clone(),
            webdriver_url: self.webdriver_url.clone(),
            browser: self.browser.into(),
            headless: self.headless,
            wait_timeout: Duration::from_secs(self.wait_secs),
            pacing: PacingRange::new(
                Duration::from_millis(self.pacing_min_ms),
                Duration::from_millis(self.pacing_max_ms),
            ),
            output_root: self.output.clone(),
            default_category_position: self
                .default_category_position
                .unwrap_or(defaults.default_category_position),
            ..defaults
        }
    }

    fn target(&self) -> NavigationTarget {
        NavigationTarget {
            category: self.category.clone(),
            limit: self.limit as usize,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let default_filter = if args.verbose {
        "catalog_harvest=debug,harvest=debug"
    } else {
        "catalog_harvest=info,harvest=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = args.config();
    let session = CrawlSession::connect(&config)
        .await
        .with_context(|| format!("failed to start session on {}", config.webdriver_url))?;

    let report = session
        .run(&args.target())
        .await
        .context("harvest aborted")?;

    info!(
        visited = report.products.visited,
        saved = report.products.persisted,
        failed = report.products.failed,
        output = %config.output_root.display(),
        "harvest complete"
    );
    Ok(())
}
