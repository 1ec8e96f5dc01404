//! Error types for the harvesting pipeline.
//!
//! Absence of optional page content is not an error anywhere in this crate;
//! the variants here cover only conditions that stop a step.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Failures reported by a [`Browser`](crate::browser::Browser) implementation.
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("timed out after {waited:?} waiting for {locator}: {reason}")]
    Timeout {
        locator: String,
        waited: Duration,
        reason: String,
    },
    #[error("webdriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),
    #[error("browser session error: {0}")]
    Session(String),
}

impl BrowserError {
    /// Whether the error came from a wait condition that was never met.
    pub fn is_timeout(&self) -> bool {
        matches!(self, BrowserError::Timeout { .. })
    }
}

/// Failures while downloading a single asset.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run-level failures.
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("no categories found on the catalog page")]
    NoCategories,
    #[error("no products found on the category page")]
    NoProducts,
    #[error("category position {position} is out of range ({available} categories)")]
    CategoryOutOfRange { position: usize, available: usize },
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
    #[error("failed to serialize record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = HarvestError> = std::result::Result<T, E>;
