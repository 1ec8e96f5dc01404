//! The product record produced for every detail page.

use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Name used for files and directories when a page has no title.
pub const UNIDENTIFIED: &str = "unidentified";

/// One bill-of-materials row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomEntry {
    pub part_number: String,
    pub description: String,
    pub quantity: String,
}

/// Where the downloaded assets of a product ended up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPaths {
    pub manual: Option<PathBuf>,
    pub image: Option<PathBuf>,
}

/// Structured data extracted from one detail page.
///
/// Built fresh for every product and dropped once persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "product_id")]
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub specs: BTreeMap<String, String>,
    pub bom: Vec<BomEntry>,
    #[serde(skip)]
    pub assets: AssetPaths,
}

impl ProductRecord {
    /// Name under which the record and its assets are stored.
    ///
    /// Falls back to [`UNIDENTIFIED`] and replaces path separators so the
    /// name always stays a single path component.
    pub fn storage_name(&self) -> String {
        match self.identifier.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.replace(['/', '\\'], "_"),
            _ => UNIDENTIFIED.to_string(),
        }
    }
}
