//! Record extraction from the rendered page source of a detail page.
//!
//! Everything here is a pure function of the HTML. Sections that are missing
//! from a page come back as explicit "absent" values; [`Extractor::extract`]
//! turns those into warnings and empty fields.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use crate::{
    config::Selectors,
    error::{HarvestError, Result},
    record::{BomEntry, ProductRecord},
};

/// Title and description of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub identifier: Option<String>,
    pub description: Option<String>,
}

/// Why a page has no BOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingBom {
    /// No parts tab container on the page.
    Container,
    /// Parts tab present but without the BOM table.
    Table,
}

/// Downloadable assets a detail page may link to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Manual,
    Image,
}

impl AssetKind {
    /// File name the asset is stored under.
    pub fn file_name(self) -> &'static str {
        match self {
            AssetKind::Manual => "manual.pdf",
            AssetKind::Image => "img.jpg",
        }
    }

    fn attribute(self) -> &'static str {
        match self {
            AssetKind::Manual => "href",
            AssetKind::Image => "src",
        }
    }
}

/// Why an asset URL could not be determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingAsset {
    Element,
    Attribute,
    InvalidUrl(String),
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| HarvestError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Text content with each text node trimmed and the pieces concatenated.
fn clean_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

fn children_named<'a>(
    element: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == name)
}

/// Compiled detail-page selectors plus the allow-list of spec headers.
pub struct Extractor {
    title: Selector,
    description: Selector,
    specs_table: Selector,
    bom_container: Selector,
    bom_table: Selector,
    manual_link: Selector,
    image: Selector,
    row: Selector,
    header_cell: Selector,
    data_cell: Selector,
    spec_keys: Vec<String>,
}

impl Extractor {
    /// Compiles the detail-page selectors.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Selector`] for any selector that does not parse.
    pub fn new(selectors: &Selectors, spec_keys: &[String]) -> Result<Self> {
        Ok(Self {
            title: compile(&selectors.title)?,
            description: compile(&selectors.description)?,
            specs_table: compile(&selectors.specs_table)?,
            bom_container: compile(&selectors.bom_container)?,
            bom_table: compile(&selectors.bom_table)?,
            manual_link: compile(&selectors.manual_link)?,
            image: compile(&selectors.image)?,
            row: compile("tr")?,
            header_cell: compile("th")?,
            data_cell: compile("td")?,
            spec_keys: spec_keys.to_vec(),
        })
    }

    fn first_text(&self, document: &Html, selector: &Selector) -> Option<String> {
        document.select(selector).next().map(clean_text)
    }

    pub fn metadata(&self, document: &Html) -> Metadata {
        Metadata {
            identifier: self.first_text(document, &self.title),
            description: self.first_text(document, &self.description),
        }
    }

    /// Allow-listed spec values keyed by lower-cased header, or `None` when the
    /// page has no specs table.
    ///
    /// Header and value cells of a row are paired by position; surplus cells
    /// on either side are ignored.
    pub fn specs(&self, document: &Html) -> Option<BTreeMap<String, String>> {
        let table = document.select(&self.specs_table).next()?;
        let mut specs = BTreeMap::new();
        for row in table.select(&self.row) {
            let headers = row.select(&self.header_cell).map(clean_text);
            let values = row.select(&self.data_cell).map(clean_text);
            for (key, value) in headers.zip(values) {
                if self.spec_keys.iter().any(|allowed| *allowed == key) {
                    specs.insert(key.to_lowercase(), value);
                }
            }
        }
        Some(specs)
    }

    /// BOM rows of the parts tab. Rows without exactly three cells are skipped.
    pub fn bom(&self, document: &Html) -> Result<Vec<BomEntry>, MissingBom> {
        let container = document
            .select(&self.bom_container)
            .next()
            .ok_or(MissingBom::Container)?;
        let table = container
            .select(&self.bom_table)
            .next()
            .ok_or(MissingBom::Table)?;

        let entries = children_named(table, "tbody")
            .flat_map(|body| children_named(body, "tr"))
            .filter_map(|row| {
                let cells: Vec<String> = row.select(&self.data_cell).map(clean_text).collect();
                match <[String; 3]>::try_from(cells) {
                    Ok([part_number, description, quantity]) => Some(BomEntry {
                        part_number,
                        description,
                        quantity,
                    }),
                    Err(_) => None,
                }
            })
            .collect();
        Ok(entries)
    }

    /// Absolute URL of an asset, resolved against the page it appears on.
    pub fn asset_url(
        &self,
        document: &Html,
        kind: AssetKind,
        page_url: &str,
    ) -> Result<Url, MissingAsset> {
        let selector = match kind {
            AssetKind::Manual => &self.manual_link,
            AssetKind::Image => &self.image,
        };
        let element = document
            .select(selector)
            .next()
            .ok_or(MissingAsset::Element)?;
        let raw = element
            .value()
            .attr(kind.attribute())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(MissingAsset::Attribute)?;

        let resolved = match Url::parse(page_url) {
            Ok(base) => base.join(raw),
            Err(_) => Url::parse(raw),
        };
        resolved.map_err(|e| MissingAsset::InvalidUrl(format!("{raw}: {e}")))
    }

    /// Builds a fresh record from a detail page, logging every absent section.
    pub fn extract(&self, document: &Html) -> ProductRecord {
        let Metadata {
            identifier,
            description,
        } = self.metadata(document);

        let specs = self.specs(document).unwrap_or_else(|| {
            warn!("no specs table found on detail page");
            BTreeMap::new()
        });

        let bom = match self.bom(document) {
            Ok(bom) => bom,
            Err(MissingBom::Container) => {
                warn!("no parts tab found on detail page");
                Vec::new()
            }
            Err(MissingBom::Table) => {
                warn!("no BOM table found inside parts tab");
                Vec::new()
            }
        };

        ProductRecord {
            identifier,
            description,
            specs,
            bom,
            ..Default::default()
        }
    }
}
