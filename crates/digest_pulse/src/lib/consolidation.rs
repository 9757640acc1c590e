use digest_store::{BatchStore, SummaryRecord};
use itertools::Itertools;

use crate::{error::Error, Summarizer, SummaryRequest, SummaryRole};

/// Produces one meta-analysis across every summary of a finished batch
pub struct Consolidator<D, M> {
    store: D,
    summarizer: M,
}

impl<D, M> Consolidator<D, M>
where
    D: BatchStore + Send + Sync,
    M: Summarizer + Send + Sync,
{
    pub fn new(store: D, summarizer: M) -> Self {
        Self { store, summarizer }
    }

    #[tracing::instrument(skip(self))]
    pub async fn consolidate(&self, batch_id: &str) -> Result<String, Error> {
        let index = self
            .store
            .read_metadata(batch_id)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to read batch index"))?;

        if index.summaries.is_empty() {
            return Err(Error::EmptyBatch(batch_id.to_string()));
        }

        let mut sections = Vec::with_capacity(index.summaries.len());
        for record in index.summaries.iter().sorted_by_key(|r| r.ordinal) {
            let text = self.store.read_summary_text(batch_id, &record.filename).await?;
            sections.push((record, text));
        }
        let document = build_document(&sections);

        let request = SummaryRequest {
            content: &document,
            title: batch_id,
            topic: &index.query,
            role: SummaryRole::Consolidated,
        };
        let response = self
            .summarizer
            .summarize(&request)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to consolidate batch"))
            .map_err(|e| Error::Summarizer(e.to_string()))?;

        tracing::info!(summaries = sections.len(), "Consolidated batch");
        Ok(response.summary)
    }

    /// Same as [`Self::consolidate`], also saving the analysis next to the
    /// batch's summaries
    pub async fn consolidate_and_save(&self, batch_id: &str) -> Result<String, Error> {
        let analysis = self.consolidate(batch_id).await?;
        self.store.write_consolidated(batch_id, &analysis).await?;
        Ok(analysis)
    }
}

fn build_document(sections: &[(&SummaryRecord, String)]) -> String {
    sections
        .iter()
        .map(|(record, text)| {
            format!(
                "### {}. {} ({})\n\n{}",
                record.ordinal,
                record.title,
                record.channel_title,
                text.trim()
            )
        })
        .join("\n\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use digest_store::SummaryStatus;

    #[test]
    fn test_build_document_keeps_given_order() {
        let first = SummaryRecord::new(1, "a", "First", "Chan A", SummaryStatus::Summarized);
        let second = SummaryRecord::new(2, "b", "Second", "Chan B", SummaryStatus::Summarized);

        let doc = build_document(&[(&first, "one\n".into()), (&second, "two".into())]);

        assert_eq!(
            doc,
            "### 1. First (Chan A)\n\none\n\n---\n\n### 2. Second (Chan B)\n\ntwo"
        );
    }
}
