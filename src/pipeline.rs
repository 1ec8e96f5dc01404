//! End-to-end run: catalog → category → products → records on disk.

use std::path::PathBuf;

use async_trait::async_trait;
use scraper::Html;
use tracing::{error, info, warn};
use url::Url;

use crate::{
    browser::{Browser, WebDriverBrowser},
    config::CrawlConfig,
    error::Result,
    extract::{AssetKind, Extractor, MissingAsset},
    fetcher::AssetFetcher,
    navigator::{
        CategoryOutcome, ConsentOutcome, DetailPage, DetailPageHandler, NavigationTarget,
        Navigator, ScrapeSummary,
    },
    pacing::{DelayPolicy, HumanPacing},
    record::ProductRecord,
    sink::JsonSink,
};

/// Extracts, downloads and persists one product per detail page.
pub struct ProductPipeline {
    extractor: Extractor,
    fetcher: AssetFetcher,
    sink: JsonSink,
}

impl ProductPipeline {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        Ok(Self {
            extractor: Extractor::new(&config.selectors, &config.spec_keys)?,
            fetcher: AssetFetcher::new(config)?,
            sink: JsonSink::new(&config.output_root),
        })
    }

    /// Builds the record for a detail page, downloads its assets and writes
    /// it to disk. Missing assets leave their path empty.
    pub async fn process(&self, page: &DetailPage) -> Result<ProductRecord> {
        let (mut record, manual, image) = {
            let document = Html::parse_document(&page.source);
            (
                self.extractor.extract(&document),
                self.extractor
                    .asset_url(&document, AssetKind::Manual, &page.url),
                self.extractor
                    .asset_url(&document, AssetKind::Image, &page.url),
            )
        };

        let name = record.storage_name();
        record.assets.manual = self.download(manual, &name, AssetKind::Manual).await;
        record.assets.image = self.download(image, &name, AssetKind::Image).await;

        self.sink.persist(&record).await?;
        Ok(record)
    }

    async fn download(
        &self,
        lookup: Result<Url, MissingAsset>,
        name: &str,
        kind: AssetKind,
    ) -> Option<PathBuf> {
        let url = match lookup {
            Ok(url) => url,
            Err(MissingAsset::Element) => {
                warn!(?kind, "asset not found on the page");
                return None;
            }
            Err(MissingAsset::Attribute) => {
                warn!(?kind, "asset element has no link");
                return None;
            }
            Err(MissingAsset::InvalidUrl(reason)) => {
                warn!(?kind, %reason, "asset link is not a valid URL");
                return None;
            }
        };

        match self.fetcher.fetch(&url, name, kind).await {
            Ok(path) => Some(path),
            Err(e) => {
                error!(?kind, %url, error = %e, "failed to download asset");
                None
            }
        }
    }
}

#[async_trait]
impl DetailPageHandler for ProductPipeline {
    async fn handle(&mut self, page: DetailPage) -> Result<()> {
        self.process(&page).await.map(|_| ())
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub consent: ConsentOutcome,
    pub category: CategoryOutcome,
    pub products: ScrapeSummary,
}

/// One browser session plus the product pipeline it feeds.
pub struct CrawlSession<B, D> {
    navigator: Navigator<B, D>,
    pipeline: ProductPipeline,
}

impl CrawlSession<WebDriverBrowser, HumanPacing> {
    /// Starts a WebDriver session paced by the configured delay range.
    pub async fn connect(config: &CrawlConfig) -> Result<Self> {
        let pipeline = ProductPipeline::new(config)?;
        let browser = WebDriverBrowser::connect(config).await?;
        Ok(Self::new(
            browser,
            HumanPacing::new(config.pacing),
            pipeline,
            config,
        ))
    }
}

impl<B: Browser, D: DelayPolicy> CrawlSession<B, D> {
    pub fn new(browser: B, pacing: D, pipeline: ProductPipeline, config: &CrawlConfig) -> Self {
        Self {
            navigator: Navigator::new(browser, pacing, config),
            pipeline,
        }
    }

    /// Runs the whole crawl and closes the browser session afterwards,
    /// whether or not the crawl succeeded.
    ///
    /// A structural failure (no categories, no products) aborts the run.
    pub async fn run(mut self, target: &NavigationTarget) -> Result<RunReport> {
        let outcome = self.drive(target).await;
        if let Err(e) = self.navigator.exit().await {
            error!(error = %e, "failed to close browser session");
        }
        outcome
    }

    async fn drive(&mut self, target: &NavigationTarget) -> Result<RunReport> {
        let consent = self.navigator.open().await?;
        let category = self
            .navigator
            .load_products_page(target.category.as_deref())
            .await?;
        let products = self
            .navigator
            .scrap_product(target.limit, &mut self.pipeline)
            .await?;

        let report = RunReport {
            consent,
            category,
            products,
        };
        info!(?report, "crawl finished");
        Ok(report)
    }
}
