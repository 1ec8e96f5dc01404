//! Best-effort asset downloads.

use std::path::PathBuf;

use reqwest::{StatusCode, header::USER_AGENT};
use tokio::fs;
use tracing::{debug, info};
use url::Url;

use crate::{config::CrawlConfig, error::FetchError, extract::AssetKind, sink::write_atomically};

/// Downloads product assets into `<output_root>/assets/<storage name>/`.
pub struct AssetFetcher {
    client: reqwest::Client,
    user_agent: String,
    assets_root: PathBuf,
}

impl AssetFetcher {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &CrawlConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            assets_root: config.output_root.join("assets"),
        })
    }

    /// Directory holding the assets of one product.
    pub fn asset_dir(&self, storage_name: &str) -> PathBuf {
        self.assets_root.join(storage_name)
    }

    /// Downloads `url` and stores it under the fixed file name for `kind`.
    ///
    /// Only a `200 OK` response is written. The body goes to a temporary file
    /// first, so a failed download never leaves a partial asset behind.
    pub async fn fetch(
        &self,
        url: &Url,
        storage_name: &str,
        kind: AssetKind,
    ) -> Result<PathBuf, FetchError> {
        debug!(%url, ?kind, "downloading asset");
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;

        let dir = self.asset_dir(storage_name);
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| FetchError::Io {
                path: dir.clone(),
                source,
            })?;

        let target = dir.join(kind.file_name());
        write_atomically(&target, &bytes)
            .await
            .map_err(|source| FetchError::Io {
                path: target.clone(),
                source,
            })?;
        info!(path = %target.display(), bytes = bytes.len(), "asset saved");
        Ok(target)
    }
}
