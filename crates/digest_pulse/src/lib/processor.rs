pub mod builder;

use std::panic::AssertUnwindSafe;

use chrono::Utc;
use digest_store::{BatchIndex, BatchStore, SummaryRecord, SummaryStatus};
use futures::FutureExt;
use tracing::Instrument;

use crate::{
    aggregator::VideoSearchAggregator,
    job::{FailureKind, JobFailure, JobHandle, JobOutcome, JobReporter, JobStage, JobState},
    window::RecencyWindow,
    yt::{SearchService, TranscriptService, VideoResult},
    Summarizer, SummaryRequest, SummaryRole,
};

pub const TRANSCRIPT_UNAVAILABLE: &str =
    "Summary unavailable: no transcript could be retrieved for this video.";

// The batch summarization pipeline: search, then transcript + summary for
// each video, one at a time, persisting as it goes
pub struct BatchProcessor<D, S, T, M>
where
    D: BatchStore + Send + Sync + 'static,
    S: SearchService + Send + Sync + 'static,
    T: TranscriptService + Send + Sync + 'static,
    M: Summarizer + Send + Sync + 'static,
{
    store: D,
    aggregator: VideoSearchAggregator<S>,
    transcripts: T,
    summarizer: M,
    languages: Vec<String>,
}

impl<D, S, T, M> BatchProcessor<D, S, T, M>
where
    D: BatchStore + Send + Sync + 'static,
    S: SearchService + Send + Sync + 'static,
    T: TranscriptService + Send + Sync + 'static,
    M: Summarizer + Send + Sync + 'static,
{
    /// Spawns the job on the current tokio runtime and returns immediately
    pub fn start(self, query: impl Into<String>, window: RecencyWindow) -> JobHandle {
        let (reporter, handle) = JobReporter::channel();
        let query = query.into();

        tokio::spawn(async move {
            let run = AssertUnwindSafe(self.run(&query, window, &reporter))
                .catch_unwind()
                .await;

            if run.is_err() {
                let stage = reporter.current_stage().unwrap_or(JobStage::CreateBatch);
                tracing::error!(?stage, "Batch job panicked");
                reporter.finish(JobState::Failed(JobFailure::new(
                    stage,
                    FailureKind::Internal,
                    "batch job panicked",
                )));
            }
        });

        handle
    }

    /// Runs the job to completion and reports its terminal state
    #[tracing::instrument(skip(self, window, reporter), fields(window = %window))]
    pub async fn run(
        &self,
        query: &str,
        window: RecencyWindow,
        reporter: &JobReporter,
    ) -> JobState {
        let state = match self.execute(query, window, reporter).await {
            Ok(outcome) => {
                tracing::info!(
                    batch_id = %outcome.batch_id,
                    summary_count = outcome.summary_count,
                    "Batch job succeeded"
                );
                JobState::Succeeded(outcome)
            }
            Err(failure) => {
                tracing::error!(%failure, "Batch job failed");
                JobState::Failed(failure)
            }
        };

        reporter.finish(state.clone());
        state
    }

    async fn execute(
        &self,
        query: &str,
        window: RecencyWindow,
        reporter: &JobReporter,
    ) -> Result<JobOutcome, JobFailure> {
        let created_at = Utc::now();

        reporter.progress(JobStage::CreateBatch, "Creating batch", None);
        let batch_id = self
            .store
            .create_batch()
            .await
            .map_err(|e| JobFailure::new(JobStage::CreateBatch, FailureKind::Persistence, e))?;

        reporter.progress(JobStage::Search, "Searching for videos", None);
        let videos = self.aggregator.aggregate(query, &window).await;
        let total = videos.len();
        if videos.is_empty() {
            tracing::info!(%batch_id, "No videos published in window");
        }

        let mut summaries = Vec::with_capacity(total);
        for (idx, video) in videos.iter().enumerate() {
            reporter.progress(
                JobStage::ProcessVideo,
                format!("Processing video {} of {total}: {}", idx + 1, video.title),
                Some((idx, total)),
            );

            let span = tracing::info_span!("process_video", %batch_id, video_id = %video.video_id);
            let record = self
                .process_video(&batch_id, idx as u32 + 1, video)
                .instrument(span)
                .await?;
            summaries.push(record);
        }

        reporter.progress(JobStage::Finalize, "Writing batch index", Some((total, total)));
        let index = BatchIndex {
            batch_id: batch_id.clone(),
            query: query.to_string(),
            window: window.to_string(),
            created_at,
            completed_at: Utc::now(),
            summaries,
        };
        self.store
            .finalize(&batch_id, &index)
            .await
            .map_err(|e| JobFailure::new(JobStage::Finalize, FailureKind::Persistence, e))?;

        Ok(JobOutcome {
            batch_id,
            summary_count: index.summaries.len(),
        })
    }

    /// Transcript, summary, then an immediate write so a crash later in the
    /// batch keeps this record
    async fn process_video(
        &self,
        batch_id: &str,
        ordinal: u32,
        video: &VideoResult,
    ) -> Result<SummaryRecord, JobFailure> {
        let languages = self.languages.iter().map(String::as_str).collect::<Vec<_>>();
        let transcript = self.transcripts.fetch(&video.video_id, &languages).await;

        let (status, text) = match transcript {
            None => {
                tracing::info!("No transcript, storing placeholder summary");
                (
                    SummaryStatus::TranscriptUnavailable,
                    TRANSCRIPT_UNAVAILABLE.to_string(),
                )
            }
            Some(transcript) => {
                let request = SummaryRequest {
                    content: &transcript,
                    title: &video.title,
                    topic: &video.channel_title,
                    role: SummaryRole::PerVideo,
                };
                match self.summarizer.summarize(&request).await {
                    Ok(response) => (SummaryStatus::Summarized, response.summary),
                    Err(e) => {
                        tracing::error!(error = ?e, "Failed to summarize transcript");
                        (
                            SummaryStatus::SummarizerFailed,
                            format!("Summary unavailable: the summarization service failed ({e})."),
                        )
                    }
                }
            }
        };

        let record = SummaryRecord::new(
            ordinal,
            &video.video_id,
            &video.title,
            &video.channel_title,
            status,
        );

        self.store
            .append_summary(batch_id, &record, &text)
            .await
            .map_err(|e| {
                JobFailure::new(
                    JobStage::ProcessVideo,
                    FailureKind::Persistence,
                    format!("video {} ({}): {e}", ordinal, video.video_id),
                )
            })?;

        Ok(record)
    }
}
