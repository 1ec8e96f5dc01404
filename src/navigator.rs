//! Drives the browser from the catalog root to each product's detail page.
//!
//! A run moves through
//! `Init → ConsentHandled → ListLoaded → (DetailLoaded → Extracted → Persisted → ListLoaded)* → Done`.
//! The navigator never keeps element handles across navigations: the product
//! list is looked up again every time the browser returns to it.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::{
    browser::{Browser, Locator},
    config::CrawlConfig,
    error::{BrowserError, HarvestError, Result},
    pacing::{DelayPolicy, Pause},
    policy::{CategorySelection, category_selection, product_link_position},
};

/// What to crawl. Fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavigationTarget {
    /// Exact category label; `None` falls back to the positional default.
    pub category: Option<String>,
    /// Number of products to visit.
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Init,
    ConsentHandled,
    ListLoaded,
    DetailLoaded,
    Extracted,
    Persisted,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentOutcome {
    Accepted,
    NotShown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryOutcome {
    /// Clicked the category with this label.
    Selected(String),
    /// Clicked the positional default.
    Default(usize),
    /// No category carried the requested label; nothing was clicked.
    NotFound(String),
}

/// A rendered detail page, captured right after navigation.
#[derive(Debug, Clone)]
pub struct DetailPage {
    /// Zero-based product index within the run.
    pub index: usize,
    pub url: String,
    pub title: String,
    pub source: String,
}

/// Consumes detail pages as the navigator reaches them.
#[async_trait]
pub trait DetailPageHandler: Send {
    /// Extracts and stores one product. An error marks that product failed
    /// without stopping the run.
    async fn handle(&mut self, page: DetailPage) -> Result<()>;
}

/// Counts for one pass over the product list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrapeSummary {
    pub visited: usize,
    pub persisted: usize,
    pub failed: usize,
}

pub struct Navigator<B, D> {
    browser: B,
    pacing: D,
    catalog_url: String,
    wait_timeout: Duration,
    consent_settle: Duration,
    category_settle: Duration,
    consent_button: Locator,
    categories: Locator,
    product_links: Locator,
    detail_ready: Locator,
    default_category_position: usize,
    product_link_offset: usize,
    state: NavState,
}

impl<B: Browser, D: DelayPolicy> Navigator<B, D> {
    pub fn new(browser: B, pacing: D, config: &CrawlConfig) -> Self {
        Self {
            browser,
            pacing,
            catalog_url: config.catalog_url.clone(),
            wait_timeout: config.wait_timeout,
            consent_settle: config.consent_settle,
            category_settle: config.category_settle,
            consent_button: config.selectors.consent_button.clone(),
            categories: config.selectors.categories.clone(),
            product_links: config.selectors.product_links.clone(),
            detail_ready: config.selectors.detail_ready.clone(),
            default_category_position: config.default_category_position,
            product_link_offset: config.product_link_offset,
            state: NavState::Init,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    fn transition(&mut self, next: NavState) {
        debug!(from = ?self.state, to = ?next, "navigation state");
        self.state = next;
    }

    /// Opens the catalog root and dismisses the consent popup if one shows up.
    pub async fn open(&mut self) -> Result<ConsentOutcome> {
        info!(url = %self.catalog_url, "opening catalog");
        self.browser.navigate(&self.catalog_url).await?;
        let consent = self.handle_consent_popup().await;
        self.transition(NavState::ConsentHandled);
        Ok(consent)
    }

    /// Accepts the consent popup. A missing popup is not an error.
    pub async fn handle_consent_popup(&mut self) -> ConsentOutcome {
        let button = match self
            .browser
            .wait_for_clickable(&self.consent_button, self.wait_timeout)
            .await
        {
            Ok(button) => button,
            Err(e) => {
                warn!(error = %e, "no consent popup detected");
                return ConsentOutcome::NotShown;
            }
        };

        if let Err(e) = self.browser.click(&button).await {
            warn!(error = %e, "consent button could not be clicked");
            return ConsentOutcome::NotShown;
        }
        info!("accepted consent popup");
        settle(self.consent_settle).await;
        ConsentOutcome::Accepted
    }

    /// Selects a category on the catalog page.
    ///
    /// With a name, the first category whose label matches exactly is
    /// clicked; no match is logged and leaves the page and the navigation
    /// state as they are. Without a
    /// name the positional default is clicked. The category settle delay is
    /// applied whatever the outcome.
    ///
    /// # Errors
    ///
    /// [`HarvestError::NoCategories`] when the category list never renders,
    /// [`HarvestError::CategoryOutOfRange`] when the default position does not
    /// exist.
    pub async fn load_products_page(&mut self, target: Option<&str>) -> Result<CategoryOutcome> {
        let outcome = self.select_category(target).await;
        settle(self.category_settle).await;

        match &outcome {
            Ok(selected) => {
                if !matches!(selected, CategoryOutcome::NotFound(_)) {
                    self.transition(NavState::ListLoaded);
                }
                let title = self.browser.title().await.unwrap_or_default();
                info!(?selected, %title, "products page loaded");
            }
            Err(e) => error!(error = %e, "failed to load products page"),
        }
        outcome
    }

    async fn select_category(&mut self, target: Option<&str>) -> Result<CategoryOutcome> {
        let categories = self
            .wait_for_list(&self.categories, HarvestError::NoCategories)
            .await?;
        self.pacing.pause(Pause::BeforeCategoryClick).await;
        info!(count = categories.len(), "found categories in catalog");

        let outcome = match category_selection(target, self.default_category_position) {
            CategorySelection::ByName(name) => {
                let mut matched = None;
                for category in &categories {
                    if self.browser.text(category).await?.trim() == name {
                        matched = Some(category);
                        break;
                    }
                }
                match matched {
                    Some(category) => {
                        self.browser.click(category).await?;
                        CategoryOutcome::Selected(name)
                    }
                    None => {
                        warn!(category = %name, "category not found in catalog");
                        CategoryOutcome::NotFound(name)
                    }
                }
            }
            CategorySelection::ByPosition(position) => {
                let category =
                    categories
                        .get(position)
                        .ok_or(HarvestError::CategoryOutOfRange {
                            position,
                            available: categories.len(),
                        })?;
                self.browser.script_click(category).await?;
                CategoryOutcome::Default(position)
            }
        };

        self.pacing.pause(Pause::AfterCategoryClick).await;
        Ok(outcome)
    }

    /// Visits up to `limit` products of the current list, handing each detail
    /// page to `handler` and returning to the list afterwards.
    ///
    /// The first link of the list is not a product and is skipped. Iteration
    /// ends early when the list holds fewer products than requested. A detail
    /// page that does not render in time counts as failed.
    ///
    /// # Errors
    ///
    /// [`HarvestError::NoProducts`] when the product list is empty or does
    /// not render again after returning from a detail page; browser errors
    /// while navigating.
    pub async fn scrap_product<H>(&mut self, limit: usize, handler: &mut H) -> Result<ScrapeSummary>
    where
        H: DetailPageHandler + ?Sized,
    {
        let mut summary = ScrapeSummary::default();
        let mut links = Some(
            self.wait_for_list(&self.product_links, HarvestError::NoProducts)
                .await?,
        );
        self.pacing.pause(Pause::BeforeProducts).await;

        for index in 0..limit {
            let current = match links.take() {
                Some(links) => links,
                None => {
                    self.wait_for_list(&self.product_links, HarvestError::NoProducts)
                        .await?
                }
            };

            let position = product_link_position(index, self.product_link_offset);
            let Some(link) = current.get(position) else {
                warn!(
                    requested = limit,
                    available = current.len().saturating_sub(self.product_link_offset),
                    "product list exhausted"
                );
                break;
            };

            self.browser.script_click(link).await?;
            summary.visited += 1;

            match self.capture_detail(index).await? {
                Some(page) => {
                    self.transition(NavState::DetailLoaded);
                    match handler.handle(page).await {
                        Ok(()) => {
                            self.transition(NavState::Extracted);
                            self.transition(NavState::Persisted);
                            summary.persisted += 1;
                        }
                        Err(e) => {
                            error!(index, error = %e, "failed to store product");
                            summary.failed += 1;
                        }
                    }
                }
                None => summary.failed += 1,
            }

            self.pacing.pause(Pause::AfterProduct).await;
            self.browser.back().await?;
            self.transition(NavState::ListLoaded);
        }

        info!(?summary, "finished product list");
        Ok(summary)
    }

    /// Waits for the detail page to render, then captures it. `None` when it
    /// never rendered within the wait timeout.
    async fn capture_detail(&self, index: usize) -> Result<Option<DetailPage>> {
        match self
            .browser
            .wait_for_all(&self.detail_ready, self.wait_timeout)
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_timeout() => {
                error!(index, error = %e, "product detail page did not render");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        let page = DetailPage {
            index,
            url: self.browser.current_url().await?,
            title: self.browser.title().await.unwrap_or_default(),
            source: self.browser.page_source().await?,
        };
        info!(index, title = %page.title, url = %page.url, "loaded product detail page");
        Ok(Some(page))
    }

    /// Marks the run finished and ends the browser session.
    pub async fn exit(&mut self) -> Result<(), BrowserError> {
        self.transition(NavState::Done);
        self.browser.quit().await
    }

    async fn wait_for_list(
        &self,
        locator: &Locator,
        missing: HarvestError,
    ) -> Result<Vec<B::Element>> {
        match self.browser.wait_for_all(locator, self.wait_timeout).await {
            Ok(elements) if !elements.is_empty() => Ok(elements),
            Ok(_) => Err(missing),
            Err(e) if e.is_timeout() => {
                debug!(error = %e, "list wait timed out");
                Err(missing)
            }
            Err(e) => Err(e.into()),
        }
    }
}

async fn settle(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
