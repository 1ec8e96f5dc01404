//! Writes finished records to `<output_root>/<storage name>.json`.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::{
    error::{HarvestError, Result},
    record::ProductRecord,
};

pub struct JsonSink {
    root: PathBuf,
}

impl JsonSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path the record is written to.
    pub fn record_path(&self, record: &ProductRecord) -> PathBuf {
        self.root.join(format!("{}.json", record.storage_name()))
    }

    /// Serializes the record as indented UTF-8 JSON, replacing any previous
    /// file for the same identifier.
    pub async fn persist(&self, record: &ProductRecord) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(record)?;
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| HarvestError::Io { path, source }
        };

        fs::create_dir_all(&self.root)
            .await
            .map_err(io_error(&self.root))?;
        let path = self.record_path(record);
        write_atomically(&path, json.as_bytes())
            .await
            .map_err(io_error(&path))?;

        info!(path = %path.display(), "record saved");
        Ok(path)
    }
}

/// Writes `bytes` next to `target` under a `.part` name and renames it into
/// place, so `target` never holds a truncated file. The temporary file is
/// removed when either step fails.
pub(crate) async fn write_atomically(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut partial = target.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    let result = match fs::write(&partial, bytes).await {
        Ok(()) => fs::rename(&partial, target).await,
        Err(e) => Err(e),
    };
    if result.is_err() {
        let _ = fs::remove_file(&partial).await;
    }
    result
}
