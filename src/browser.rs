//! The browser seam.
//!
//! [`Browser`] is the narrow set of operations the navigator needs from a
//! browser automation engine. [`WebDriverBrowser`] implements it on top of a
//! Selenium-compatible WebDriver server via `thirtyfour`.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use thirtyfour::{ChromiumLikeCapabilities, error::WebDriverError, prelude::*};
use tracing::{debug, info};

use crate::{
    config::{BrowserKind, CrawlConfig},
    error::BrowserError,
};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How to find elements in the live page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    fn to_by(&self) -> By {
        match self {
            Locator::Css(css) => By::Css(css.clone()),
            Locator::XPath(xpath) => By::XPath(xpath.clone()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(css) => write!(f, "css `{css}`"),
            Locator::XPath(xpath) => write!(f, "xpath `{xpath}`"),
        }
    }
}

/// Operations the crawler performs against a live browser session.
///
/// Element handles may go stale once the page changes; callers re-query after
/// every navigation instead of holding on to them.
#[async_trait]
pub trait Browser: Send + Sync {
    type Element: Send + Sync;

    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    /// Waits until at least one element matches, then returns all matches.
    async fn wait_for_all(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<Self::Element>, BrowserError>;

    /// Waits until a matching element is displayed and enabled.
    async fn wait_for_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Self::Element, BrowserError>;

    async fn click(&self, element: &Self::Element) -> Result<(), BrowserError>;

    /// Clicks through JavaScript, for elements a native click cannot reach.
    async fn script_click(&self, element: &Self::Element) -> Result<(), BrowserError>;

    async fn text(&self, element: &Self::Element) -> Result<String, BrowserError>;

    async fn page_source(&self) -> Result<String, BrowserError>;

    async fn current_url(&self) -> Result<String, BrowserError>;

    async fn title(&self) -> Result<String, BrowserError>;

    async fn back(&self) -> Result<(), BrowserError>;

    /// Ends the session. Safe to call once per session.
    async fn quit(&self) -> Result<(), BrowserError>;
}

/// A [`Browser`] backed by a WebDriver server (chromedriver or geckodriver).
pub struct WebDriverBrowser {
    driver: WebDriver,
}

impl WebDriverBrowser {
    /// Opens a new session on the configured WebDriver server.
    ///
    /// Chrome sessions get the flags that hide the automation banner and
    /// the `navigator.webdriver` hint, plus a desktop user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or rejects the
    /// capabilities.
    pub async fn connect(config: &CrawlConfig) -> Result<Self, BrowserError> {
        info!(
            server = %config.webdriver_url,
            browser = ?config.browser,
            headless = config.headless,
            "starting browser session"
        );
        let driver = match config.browser {
            BrowserKind::Chrome => {
                let mut caps = DesiredCapabilities::chrome();
                caps.add_arg("--disable-blink-features=AutomationControlled")?;
                caps.add_arg(&format!("user-agent={}", config.user_agent))?;
                if config.headless {
                    caps.set_headless()?;
                }
                WebDriver::new(&config.webdriver_url, caps).await?
            }
            BrowserKind::Firefox => {
                let mut caps = DesiredCapabilities::firefox();
                if config.headless {
                    caps.set_headless()?;
                }
                WebDriver::new(&config.webdriver_url, caps).await?
            }
        };
        Ok(Self { driver })
    }
}

fn timeout_error(locator: &Locator, waited: Duration, error: WebDriverError) -> BrowserError {
    BrowserError::Timeout {
        locator: locator.to_string(),
        waited,
        reason: error.to_string(),
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    type Element = WebElement;

    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        debug!(url, "navigating");
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn wait_for_all(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<WebElement>, BrowserError> {
        self.driver
            .query(locator.to_by())
            .wait(timeout, POLL_INTERVAL)
            .all_from_selector_required()
            .await
            .map_err(|e| timeout_error(locator, timeout, e))
    }

    async fn wait_for_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<WebElement, BrowserError> {
        self.driver
            .query(locator.to_by())
            .and_clickable()
            .wait(timeout, POLL_INTERVAL)
            .first()
            .await
            .map_err(|e| timeout_error(locator, timeout, e))
    }

    async fn click(&self, element: &WebElement) -> Result<(), BrowserError> {
        element.click().await?;
        Ok(())
    }

    async fn script_click(&self, element: &WebElement) -> Result<(), BrowserError> {
        self.driver
            .execute("arguments[0].click();", vec![element.to_json()?])
            .await?;
        Ok(())
    }

    async fn text(&self, element: &WebElement) -> Result<String, BrowserError> {
        Ok(element.text().await?)
    }

    async fn page_source(&self) -> Result<String, BrowserError> {
        Ok(self.driver.source().await?)
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.driver.current_url().await?.to_string())
    }

    async fn title(&self) -> Result<String, BrowserError> {
        Ok(self.driver.title().await?)
    }

    async fn back(&self) -> Result<(), BrowserError> {
        self.driver.back().await?;
        Ok(())
    }

    async fn quit(&self) -> Result<(), BrowserError> {
        info!("closing browser session");
        self.driver.clone().quit().await?;
        Ok(())
    }
}
