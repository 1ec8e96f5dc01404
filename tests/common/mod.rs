//! A scripted in-memory catalog standing in for a real browser session.

#![allow(dead_code)]

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use axum::Router;
use catalog_harvest::{
    Browser, BrowserError, CrawlConfig, DelayPolicy, Locator, Pause,
};
use tower_http::services::ServeDir;

pub const CATALOG_URL: &str = "https://catalog.test/catalog";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Blank,
    Catalog,
    List,
    Detail(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Consent,
    Category(usize),
    ProductLink { position: usize, generation: u64 },
    DetailContent,
}

#[derive(Debug, Default)]
struct State {
    page: Option<Page>,
    history: Vec<Page>,
    consent_visible: bool,
    list_generation: u64,
    detail_opened_at: Option<Instant>,
    events: Vec<String>,
    quit_calls: usize,
}

/// Catalog layout served by [`ScriptedBrowser`].
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub consent_popup: bool,
    pub categories: Vec<String>,
    /// Number of links on the product list, including the leading non-product link.
    pub product_links: usize,
    /// Page source for the detail page behind each link position.
    pub details: Vec<String>,
    /// How long a detail page takes to render after its link is clicked.
    pub detail_render_delay: Duration,
}

const LIST_SOURCE: &str = r#"<html><body><a class="ng-binding">list</a></body></html>"#;
const DETAIL_MARKERS: [&str; 3] = ["page-title", "nameplate", "data-tab"];

#[derive(Clone)]
pub struct ScriptedBrowser {
    catalog: Arc<Catalog>,
    state: Arc<Mutex<State>>,
    config: CrawlConfig,
}

impl ScriptedBrowser {
    pub fn new(catalog: Catalog, config: &CrawlConfig) -> Self {
        let state = State {
            consent_visible: catalog.consent_popup,
            ..State::default()
        };
        Self {
            catalog: Arc::new(catalog),
            state: Arc::new(Mutex::new(state)),
            config: config.clone(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn events(&self) -> Vec<String> {
        self.state().events.clone()
    }

    pub fn page(&self) -> Page {
        self.state().page.unwrap_or(Page::Blank)
    }

    pub fn quit_calls(&self) -> usize {
        self.state().quit_calls
    }

    fn timeout(locator: &Locator, waited: Duration) -> BrowserError {
        BrowserError::Timeout {
            locator: locator.to_string(),
            waited,
            reason: "element not found".into(),
        }
    }

    /// When the detail page currently open finishes rendering, if ever.
    fn detail_ready_at(&self, state: &State) -> Option<Instant> {
        let (Some(Page::Detail(position)), Some(opened)) = (state.page, state.detail_opened_at)
        else {
            return None;
        };
        let source = self.catalog.details.get(position)?;
        DETAIL_MARKERS
            .iter()
            .any(|marker| source.contains(marker))
            .then(|| opened + self.catalog.detail_render_delay)
    }

    fn detail_rendered(&self, state: &State) -> bool {
        self.detail_ready_at(state)
            .is_some_and(|ready| Instant::now() >= ready)
    }

    fn enter_list(state: &mut State) {
        state.list_generation += 1;
        state.page = Some(Page::List);
    }

    fn activate(&self, element: &Element, how: &str) -> Result<(), BrowserError> {
        let mut state = self.state();
        match (element, state.page) {
            (Element::Consent, Some(Page::Catalog)) if state.consent_visible => {
                state.consent_visible = false;
                state.events.push("accept consent".into());
            }
            (Element::Category(i), Some(Page::Catalog)) => {
                let name = self.catalog.categories[*i].clone();
                state.events.push(format!("{how} category {name}"));
                state.history.push(Page::Catalog);
                Self::enter_list(&mut state);
            }
            (Element::ProductLink { position, generation }, Some(Page::List)) => {
                if *generation != state.list_generation {
                    return Err(BrowserError::Session("stale element reference".into()));
                }
                state.events.push(format!("{how} product {position}"));
                state.history.push(Page::List);
                state.page = Some(Page::Detail(*position));
                state.detail_opened_at = Some(Instant::now());
            }
            (element, page) => {
                return Err(BrowserError::Session(format!(
                    "{element:?} not interactable on {page:?}"
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        let mut state = self.state();
        state.events.push(format!("navigate {url}"));
        if let Some(page) = state.page {
            state.history.push(page);
        }
        state.page = Some(if url == CATALOG_URL {
            Page::Catalog
        } else {
            Page::Blank
        });
        Ok(())
    }

    async fn wait_for_all(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<Element>, BrowserError> {
        if *locator == self.config.selectors.detail_ready {
            let ready_at = {
                let state = self.state();
                self.detail_ready_at(&state)
            };
            return match ready_at {
                Some(ready) if ready <= Instant::now() + timeout => {
                    tokio::time::sleep(ready.saturating_duration_since(Instant::now())).await;
                    Ok(vec![Element::DetailContent])
                }
                _ => Err(Self::timeout(locator, timeout)),
            };
        }

        let state = self.state();
        let selectors = &self.config.selectors;
        let found: Vec<Element> = match state.page {
            Some(Page::Catalog) if *locator == selectors.categories => {
                (0..self.catalog.categories.len())
                    .map(Element::Category)
                    .collect()
            }
            Some(Page::List) if *locator == selectors.product_links => (0..self
                .catalog
                .product_links)
                .map(|position| Element::ProductLink {
                    position,
                    generation: state.list_generation,
                })
                .collect(),
            _ => Vec::new(),
        };
        if found.is_empty() {
            return Err(Self::timeout(locator, timeout));
        }
        Ok(found)
    }

    async fn wait_for_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Element, BrowserError> {
        let state = self.state();
        if *locator == self.config.selectors.consent_button
            && state.page == Some(Page::Catalog)
            && state.consent_visible
        {
            return Ok(Element::Consent);
        }
        Err(Self::timeout(locator, timeout))
    }

    async fn click(&self, element: &Element) -> Result<(), BrowserError> {
        self.activate(element, "click")
    }

    async fn script_click(&self, element: &Element) -> Result<(), BrowserError> {
        self.activate(element, "script-click")
    }

    async fn text(&self, element: &Element) -> Result<String, BrowserError> {
        match element {
            Element::Category(i) => Ok(format!("  {}\n", self.catalog.categories[*i])),
            Element::Consent => Ok("Allow All".into()),
            Element::ProductLink { position, .. } => Ok(format!("Product {position}")),
            Element::DetailContent => Ok(String::new()),
        }
    }

    async fn page_source(&self) -> Result<String, BrowserError> {
        let rendered = self.detail_rendered(&self.state());
        match self.page() {
            Page::Detail(_) if !rendered => Ok(LIST_SOURCE.into()),
            Page::Detail(position) => Ok(self
                .catalog
                .details
                .get(position)
                .cloned()
                .unwrap_or_default()),
            page => Ok(format!("<html><body><!-- {page:?} --></body></html>")),
        }
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let rendered = self.detail_rendered(&self.state());
        Ok(match self.page() {
            Page::Detail(_) if !rendered => "https://catalog.test/catalog/list".into(),
            Page::Detail(position) => format!("https://catalog.test/product/{position}"),
            Page::List => "https://catalog.test/catalog/list".into(),
            Page::Catalog => CATALOG_URL.into(),
            Page::Blank => "about:blank".into(),
        })
    }

    async fn title(&self) -> Result<String, BrowserError> {
        Ok(format!("{:?}", self.page()))
    }

    async fn back(&self) -> Result<(), BrowserError> {
        let mut state = self.state();
        state.events.push("back".into());
        match state.history.pop() {
            Some(Page::List) => Self::enter_list(&mut state),
            Some(page) => state.page = Some(page),
            None => state.page = Some(Page::Blank),
        }
        Ok(())
    }

    async fn quit(&self) -> Result<(), BrowserError> {
        let mut state = self.state();
        state.quit_calls += 1;
        state.events.push("quit".into());
        Ok(())
    }
}

/// Remembers every pause point it was asked to wait at.
#[derive(Clone, Default)]
pub struct RecordingPacing {
    pauses: Arc<Mutex<Vec<Pause>>>,
}

impl RecordingPacing {
    pub fn pauses(&self) -> Vec<Pause> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl DelayPolicy for RecordingPacing {
    async fn pause(&self, at: Pause) {
        self.pauses.lock().unwrap().push(at);
    }
}

pub fn test_config(output_root: &Path) -> CrawlConfig {
    CrawlConfig {
        catalog_url: CATALOG_URL.into(),
        output_root: output_root.to_path_buf(),
        wait_timeout: Duration::from_millis(50),
        ..CrawlConfig::default()
    }
    .without_pauses()
}

pub fn categories(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Detail page markup in the catalog's layout.
pub fn detail_html(id: Option<&str>, manual: Option<&str>, image: Option<&str>) -> String {
    let title = id
        .map(|id| format!(r#"<div class="page-title">{id}</div>"#))
        .unwrap_or_default();
    let manual = manual
        .map(|href| format!(r#"<a id="infoPacket" href="{href}">Info Packet</a>"#))
        .unwrap_or_default();
    let image = image
        .map(|src| format!(r#"<img class="product-image" src="{src}">"#))
        .unwrap_or_default();
    format!(
        r#"<html><body>
            {title}
            <div class="product-description">DC motor {id}</div>
            <table class="nameplate">
              <tr><th>HP</th><td>1</td><th>Enclosure</th><td>TEFC</td></tr>
              <tr><th>VOLTS</th><td>90</td><th>RPM</th><td>1750</td></tr>
            </table>
            <div data-tab="parts">
              <table class="data-table"><tbody>
                <tr><td>EP001</td><td>Brush</td><td>4</td></tr>
                <tr><td>EP002</td><td>Cap</td></tr>
                <tr><td>EP003</td><td>Bearing</td><td>2</td></tr>
              </tbody></table>
            </div>
            {manual}
            {image}
        </body></html>"#,
        id = id.unwrap_or("")
    )
}

/// Serves the files in `dir` on an ephemeral local port.
pub async fn serve_assets(dir: &Path) -> String {
    let app = Router::new().fallback_service(ServeDir::new(dir));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
