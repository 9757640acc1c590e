mod aggregator;
mod consolidation;
mod error;
mod job;
mod llm;
mod processor;
pub mod tracing;
pub mod types;
mod window;
pub mod yt;

pub use aggregator::VideoSearchAggregator;
pub use consolidation::Consolidator;
pub use error::Error;
pub use job::{
    FailureKind, JobFailure, JobHandle, JobOutcome, JobProgress, JobReporter, JobStage, JobState,
};
pub use llm::openai;
pub use llm::summarizer::{Summarizer, SummaryRequest, SummaryResponse, SummaryRole};
pub use processor::{builder::BatchProcessorBuilder, BatchProcessor, TRANSCRIPT_UNAVAILABLE};
pub use window::{RecencyWindow, WindowUnit};
