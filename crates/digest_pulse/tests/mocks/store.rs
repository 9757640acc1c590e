use std::io;

use digest_store::{BatchIndex, BatchListing, BatchStore, FsBatchStore, StoreError, SummaryRecord};

/// A real [`FsBatchStore`] that can be told to fail specific writes
pub struct FlakyStore {
    pub inner: FsBatchStore,
    pub fail_create: bool,
    pub fail_append_on: Option<u32>,
}

impl FlakyStore {
    pub fn new(inner: FsBatchStore) -> Self {
        Self {
            inner,
            fail_create: false,
            fail_append_on: None,
        }
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_append_on(mut self, ordinal: u32) -> Self {
        self.fail_append_on = Some(ordinal);
        self
    }
}

fn disk_full() -> StoreError {
    StoreError::Io(io::Error::other("no space left on device"))
}

impl BatchStore for FlakyStore {
    async fn create_batch(&self) -> Result<String, StoreError> {
        if self.fail_create {
            return Err(disk_full());
        }
        self.inner.create_batch().await
    }

    async fn append_summary(
        &self,
        batch_id: &str,
        record: &SummaryRecord,
        text: &str,
    ) -> Result<(), StoreError> {
        if self.fail_append_on == Some(record.ordinal) {
            return Err(disk_full());
        }
        self.inner.append_summary(batch_id, record, text).await
    }

    async fn finalize(&self, batch_id: &str, index: &BatchIndex) -> Result<(), StoreError> {
        self.inner.finalize(batch_id, index).await
    }

    async fn list_batches(&self) -> Result<Vec<BatchListing>, StoreError> {
        self.inner.list_batches().await
    }

    async fn read_summary_text(
        &self,
        batch_id: &str,
        filename: &str,
    ) -> Result<String, StoreError> {
        self.inner.read_summary_text(batch_id, filename).await
    }

    async fn read_metadata(&self, batch_id: &str) -> Result<BatchIndex, StoreError> {
        self.inner.read_metadata(batch_id).await
    }

    async fn write_consolidated(&self, batch_id: &str, text: &str) -> Result<(), StoreError> {
        self.inner.write_consolidated(batch_id, text).await
    }
}
