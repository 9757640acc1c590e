use std::future::Future;

use crate::{BatchIndex, BatchListing, StoreError, SummaryRecord};

pub mod fs;

pub trait BatchStore {
    /// Mints a new batch id and materializes its storage location.
    /// Fails instead of reusing an existing batch.
    fn create_batch(&self) -> impl Future<Output = Result<String, StoreError>> + Send;

    fn append_summary(
        &self,
        batch_id: &str,
        record: &SummaryRecord,
        text: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Writes the metadata index, marking the batch complete
    fn finalize(
        &self,
        batch_id: &str,
        index: &BatchIndex,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All batches, newest first
    fn list_batches(&self) -> impl Future<Output = Result<Vec<BatchListing>, StoreError>> + Send;

    fn read_summary_text(
        &self,
        batch_id: &str,
        filename: &str,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    fn read_metadata(
        &self,
        batch_id: &str,
    ) -> impl Future<Output = Result<BatchIndex, StoreError>> + Send;

    fn write_consolidated(
        &self,
        batch_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<T: BatchStore + Send + Sync> BatchStore for &T {
    async fn create_batch(&self) -> Result<String, StoreError> {
        (**self).create_batch().await
    }

    async fn append_summary(
        &self,
        batch_id: &str,
        record: &SummaryRecord,
        text: &str,
    ) -> Result<(), StoreError> {
        (**self).append_summary(batch_id, record, text).await
    }

    async fn finalize(&self, batch_id: &str, index: &BatchIndex) -> Result<(), StoreError> {
        (**self).finalize(batch_id, index).await
    }

    async fn list_batches(&self) -> Result<Vec<BatchListing>, StoreError> {
        (**self).list_batches().await
    }

    async fn read_summary_text(
        &self,
        batch_id: &str,
        filename: &str,
    ) -> Result<String, StoreError> {
        (**self).read_summary_text(batch_id, filename).await
    }

    async fn read_metadata(&self, batch_id: &str) -> Result<BatchIndex, StoreError> {
        (**self).read_metadata(batch_id).await
    }

    async fn write_consolidated(&self, batch_id: &str, text: &str) -> Result<(), StoreError> {
        (**self).write_consolidated(batch_id, text).await
    }
}

/// Rejects anything that could escape the batch root when joined onto a path.
///
/// Runs before any filesystem access, whether or not the target exists.
pub fn validate_component(component: &str) -> Result<&str, StoreError> {
    let rejected = component.is_empty()
        || component == "."
        || component.contains("..")
        || component.contains('/')
        || component.contains('\\')
        || component.contains('\0');

    if rejected {
        tracing::warn!(component, "Rejected path component");
        return Err(StoreError::PathTraversal(component.to_string()));
    }
    Ok(component)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_component() {
        assert!(validate_component("20261015_083600").is_ok());
        assert!(validate_component("01_intro.md").is_ok());

        for bad in [".", "..", "../x", "a/b", "a\\b", "x..y", "", "nul\0"] {
            assert!(
                matches!(validate_component(bad), Err(StoreError::PathTraversal(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
