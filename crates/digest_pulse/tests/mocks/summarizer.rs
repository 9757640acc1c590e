use std::sync::{Arc, Mutex};

use digest_pulse::{Summarizer, SummaryRequest, SummaryResponse, SummaryRole};

#[derive(Debug, Clone)]
pub struct SummaryCall {
    pub role: SummaryRole,
    pub title: String,
    pub topic: String,
    pub content: String,
}

#[derive(Clone)]
pub struct MockSummarizer {
    pub summary: String,
    pub calls: Arc<Mutex<Vec<SummaryCall>>>,
    pub fail_with: Option<String>,
    pub panics: bool,
}

impl MockSummarizer {
    pub fn new(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
            panics: false,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Self::new("")
        }
    }

    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::new("")
        }
    }
}

impl Summarizer for MockSummarizer {
    const CONTEXT_WINDOW_LIMIT: usize = 128_000;
    const SUMMARIZER_MODEL: &'static str = "mock-gpt";
    type Error = anyhow::Error;

    async fn summarize(
        &self,
        request: &SummaryRequest<'_>,
    ) -> Result<SummaryResponse, Self::Error> {
        self.calls.lock().unwrap().push(SummaryCall {
            role: request.role,
            title: request.title.to_string(),
            topic: request.topic.to_string(),
            content: request.content.to_string(),
        });

        if self.panics {
            panic!("summarizer blew up");
        }
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(SummaryResponse {
            summary: self.summary.clone(),
        })
    }
}
