use std::{fmt::Debug, future::Future};

use serde::Deserialize;

/// Which persona the summarization service should adopt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryRole {
    /// Summary of a single video transcript
    PerVideo,
    /// Meta-analysis across all summaries of a batch
    Consolidated,
}

#[derive(Debug, Clone, Copy)]
pub struct SummaryRequest<'a> {
    pub content: &'a str,
    pub title: &'a str,
    pub topic: &'a str,
    pub role: SummaryRole,
}

pub trait Summarizer {
    const CONTEXT_WINDOW_LIMIT: usize = 128_000 - 18_000;
    const SUMMARIZER_MODEL: &str;

    type Error: Debug + std::fmt::Display + Send;

    fn summarize(
        &self,
        request: &SummaryRequest<'_>,
    ) -> impl Future<Output = Result<SummaryResponse, Self::Error>> + Send;
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}
