//! # Catalog Harvest
//!
//! A library for harvesting product records from a JavaScript-rendered
//! product catalog.
//!
//! A run drives one WebDriver session through the catalog:
//!
//! 1. **Navigation** - open the catalog, accept the consent popup, pick a
//!    category and walk its product list one detail page at a time.
//! 2. **Extraction** - parse each rendered detail page into a
//!    [`ProductRecord`]: title, description, allow-listed specs and the bill
//!    of materials.
//! 3. **Assets** - download the product manual and image, if the page has them.
//! 4. **Persistence** - write the record as `<output>/<product id>.json`.
//!
//! Everything runs sequentially on a single browser session, with randomized
//! pauses between interactions.
//!
//! ## Example
//!
//! ```no_run
//! use catalog_harvest::{CrawlConfig, CrawlSession, NavigationTarget};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CrawlConfig::default();
//!     let session = CrawlSession::connect(&config).await?;
//!     let report = session
//!         .run(&NavigationTarget {
//!             category: Some("DC Motors".to_string()),
//!             limit: 5,
//!         })
//!         .await?;
//!     println!("Saved {} products", report.products.persisted);
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod navigator;
pub mod pacing;
pub mod pipeline;
pub mod policy;
pub mod record;
pub mod sink;

pub use browser::{Browser, Locator, WebDriverBrowser};
pub use config::{BrowserKind, CrawlConfig, Selectors};
pub use error::{BrowserError, FetchError, HarvestError};
pub use extract::{AssetKind, Extractor};
pub use fetcher::AssetFetcher;
pub use navigator::{
    CategoryOutcome, ConsentOutcome, DetailPage, DetailPageHandler, NavState, NavigationTarget,
    Navigator, ScrapeSummary,
};
pub use pacing::{DelayPolicy, HumanPacing, NoPacing, PacingRange, Pause};
pub use pipeline::{CrawlSession, ProductPipeline, RunReport};
pub use record::{AssetPaths, BomEntry, ProductRecord, UNIDENTIFIED};
pub use sink::JsonSink;
