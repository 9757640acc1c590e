use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::Utc;
use itertools::Itertools;

use crate::{
    batch_created_at,
    datastore::{validate_component, BatchStore},
    domain::BATCH_ID_REGEX,
    BatchIndex, BatchListing, StoreError, SummaryRecord, BATCH_ID_FORMAT,
};

const INDEX_FILE: &str = "metadata.json";
const CONSOLIDATED_FILE: &str = "consolidated.md";

/// Batch store rooted at a local directory: `<root>/<batch_id>/...`
#[derive(Debug, Clone)]
pub struct FsBatchStore {
    root: PathBuf,
}

impl FsBatchStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsBatchStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Only well-formed batch ids resolve; anything else could name the root
    /// itself (`.`) or a directory outside the batch layout
    fn batch_dir(&self, batch_id: &str) -> Result<PathBuf, StoreError> {
        let batch_id = validate_component(batch_id)?;
        if !BATCH_ID_REGEX.is_match(batch_id) {
            tracing::warn!(batch_id, "Rejected malformed batch id");
            return Err(StoreError::PathTraversal(batch_id.to_string()));
        }
        Ok(self.root.join(batch_id))
    }

    /// Resolves the batch directory and fails with `NotFound` if it is absent
    async fn existing_batch_dir(&self, batch_id: &str) -> Result<PathBuf, StoreError> {
        let dir = self.batch_dir(batch_id)?;
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(dir),
            Ok(_) => Err(StoreError::NotFound(format!("batch {batch_id}"))),
            Err(e) => Err(not_found_or(e, || format!("batch {batch_id}"))),
        }
    }

    async fn listing_for(&self, batch_id: String, dir: &Path) -> Result<BatchListing, StoreError> {
        let created_at = batch_created_at(&batch_id);

        match tokio::fs::read_to_string(dir.join(INDEX_FILE)).await {
            Ok(raw) => match serde_json::from_str::<BatchIndex>(&raw) {
                Ok(index) => {
                    return Ok(BatchListing {
                        batch_id,
                        created_at,
                        summary_count: index.summaries.len(),
                        complete: true,
                        summaries: index.summaries,
                    })
                }
                Err(e) => {
                    tracing::warn!(
                        error = ?e,
                        %batch_id,
                        "Unreadable batch index, listing as incomplete"
                    )
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut summary_count = 0;
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.ends_with(".md") && name != CONSOLIDATED_FILE {
                summary_count += 1;
            }
        }

        Ok(BatchListing {
            batch_id,
            created_at,
            summary_count,
            complete: false,
            summaries: Vec::new(),
        })
    }
}

impl BatchStore for FsBatchStore {
    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    async fn create_batch(&self) -> Result<String, StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to create batch root"))?;

        let batch_id = Utc::now().format(BATCH_ID_FORMAT).to_string();
        let dir = self.root.join(&batch_id);

        // an existing directory means another run minted the same id
        match tokio::fs::create_dir(&dir).await {
            Ok(()) => {
                tracing::info!(%batch_id, path = %dir.display(), "Created batch");
                Ok(batch_id)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::error!(%batch_id, "Batch id collision");
                Err(StoreError::BatchExists(batch_id))
            }
            Err(e) => {
                tracing::error!(error = ?e, %batch_id, "Failed to create batch directory");
                Err(e.into())
            }
        }
    }

    async fn append_summary(
        &self,
        batch_id: &str,
        record: &SummaryRecord,
        text: &str,
    ) -> Result<(), StoreError> {
        let filename = validate_component(&record.filename)?;
        let dir = self.existing_batch_dir(batch_id).await?;

        write_atomic(&dir.join(filename), text.as_bytes())
            .await
            .inspect_err(|e| {
                tracing::error!(
                    error = ?e,
                    batch_id,
                    filename,
                    "Failed to write summary"
                )
            })?;

        tracing::debug!(batch_id, filename, ordinal = record.ordinal, "Persisted summary");
        Ok(())
    }

    async fn finalize(&self, batch_id: &str, index: &BatchIndex) -> Result<(), StoreError> {
        let dir = self.existing_batch_dir(batch_id).await?;
        let data = serde_json::to_vec_pretty(index)?;

        write_atomic(&dir.join(INDEX_FILE), &data)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, batch_id, "Failed to write batch index"))?;

        tracing::info!(batch_id, summaries = index.summaries.len(), "Finalized batch");
        Ok(())
    }

    async fn list_batches(&self) -> Result<Vec<BatchListing>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut listings = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(batch_id) = entry.file_name().into_string() else {
                continue;
            };
            if !BATCH_ID_REGEX.is_match(&batch_id) || !entry.file_type().await?.is_dir() {
                continue;
            }
            listings.push(self.listing_for(batch_id, &entry.path()).await?);
        }

        Ok(listings
            .into_iter()
            .sorted_by(|a, b| b.batch_id.cmp(&a.batch_id))
            .collect())
    }

    async fn read_summary_text(
        &self,
        batch_id: &str,
        filename: &str,
    ) -> Result<String, StoreError> {
        let dir = self.batch_dir(batch_id)?;
        let filename = validate_component(filename)?;

        tokio::fs::read_to_string(dir.join(filename))
            .await
            .map_err(|e| not_found_or(e, || format!("summary {batch_id}/{filename}")))
    }

    async fn read_metadata(&self, batch_id: &str) -> Result<BatchIndex, StoreError> {
        let dir = self.batch_dir(batch_id)?;

        let raw = tokio::fs::read_to_string(dir.join(INDEX_FILE))
            .await
            .map_err(|e| not_found_or(e, || format!("index of batch {batch_id}")))?;

        Ok(serde_json::from_str(&raw)?)
    }

    async fn write_consolidated(&self, batch_id: &str, text: &str) -> Result<(), StoreError> {
        let dir = self.existing_batch_dir(batch_id).await?;
        write_atomic(&dir.join(CONSOLIDATED_FILE), text.as_bytes()).await?;
        tracing::info!(batch_id, "Saved consolidated analysis");
        Ok(())
    }
}

/// Write to a `.tmp` sibling, then rename over the target
async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, data).await?;
    tokio::fs::rename(&tmp, path).await
}

fn not_found_or(e: std::io::Error, what: impl FnOnce() -> String) -> StoreError {
    if e.kind() == ErrorKind::NotFound {
        StoreError::NotFound(what())
    } else {
        StoreError::Io(e)
    }
}
