//! Run configuration.
//!
//! Every constant the crawler depends on lives here so that the CLI, tests and
//! alternative catalog layouts can override it.

use std::{path::PathBuf, time::Duration};

use crate::{
    browser::Locator,
    pacing::PacingRange,
    policy::{DEFAULT_CATEGORY_POSITION, PRODUCT_LINK_OFFSET},
};

pub const DEFAULT_CATALOG_URL: &str = "https://www.baldor.com/catalog";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://127.0.0.1:4444";
pub const DEFAULT_OUTPUT_ROOT: &str = "output";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
pub const DEFAULT_SPEC_KEYS: [&str; 4] = ["HP", "VOLTS", "RPM", "FRAME"];

/// Which WebDriver-backed browser to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserKind {
    #[default]
    Chrome,
    Firefox,
}

/// Selectors for the catalog pages.
///
/// The first four are resolved live in the browser, the rest against the
/// page source of a detail page.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub consent_button: Locator,
    pub categories: Locator,
    pub product_links: Locator,
    /// Present once a detail page has rendered.
    pub detail_ready: Locator,
    pub title: String,
    pub description: String,
    pub specs_table: String,
    pub bom_container: String,
    pub bom_table: String,
    pub manual_link: String,
    pub image: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            consent_button: Locator::XPath(
                r#"//div[@class="adroll_button_text" and contains(text(), "Allow All")]"#.into(),
            ),
            categories: Locator::Css("div.ng-binding".into()),
            product_links: Locator::Css("a.ng-binding".into()),
            detail_ready: Locator::Css(
                r#"div.page-title, table.nameplate, div[data-tab="parts"]"#.into(),
            ),
            title: "div.page-title".into(),
            description: "div.product-description".into(),
            specs_table: "table.nameplate".into(),
            bom_container: r#"div[data-tab="parts"]"#.into(),
            bom_table: "table.data-table".into(),
            manual_link: "a#infoPacket".into(),
            image: ".product-image".into(),
        }
    }
}

/// Everything a crawl run needs besides its target.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub catalog_url: String,
    pub webdriver_url: String,
    pub browser: BrowserKind,
    pub headless: bool,
    pub user_agent: String,
    /// Upper bound for every wait condition.
    pub wait_timeout: Duration,
    /// Pause after dismissing the consent popup.
    pub consent_settle: Duration,
    /// Pause after the category step, whatever its outcome.
    pub category_settle: Duration,
    pub pacing: PacingRange,
    pub request_timeout: Duration,
    pub output_root: PathBuf,
    /// Spec table headers to keep, matched case-sensitively.
    pub spec_keys: Vec<String>,
    pub default_category_position: usize,
    pub product_link_offset: usize,
    pub selectors: Selectors,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.into(),
            webdriver_url: DEFAULT_WEBDRIVER_URL.into(),
            browser: BrowserKind::default(),
            headless: false,
            user_agent: DEFAULT_USER_AGENT.into(),
            wait_timeout: Duration::from_secs(10),
            consent_settle: Duration::from_secs(4),
            category_settle: Duration::from_secs(3),
            pacing: PacingRange::default(),
            request_timeout: Duration::from_secs(60),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            spec_keys: DEFAULT_SPEC_KEYS.iter().map(|k| k.to_string()).collect(),
            default_category_position: DEFAULT_CATEGORY_POSITION,
            product_link_offset: PRODUCT_LINK_OFFSET,
            selectors: Selectors::default(),
        }
    }
}

impl CrawlConfig {
    /// Config with every pause set to zero, for deterministic runs.
    pub fn without_pauses(mut self) -> Self {
        self.consent_settle = Duration::ZERO;
        self.category_settle = Duration::ZERO;
        self.pacing = PacingRange::none();
        self
    }
}
