use digest_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid recency window: {0}")]
    InvalidWindow(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Summarization service failed: {0}")]
    Summarizer(String),
    #[error("Batch {0} has no summaries to consolidate")]
    EmptyBatch(String),
}

impl Error {
    /// `true` when the requested batch or file does not exist, as opposed to
    /// an internal fault
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Store(e) if e.is_not_found())
    }
}
