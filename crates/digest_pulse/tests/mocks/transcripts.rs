use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use digest_pulse::yt::TranscriptService;

/// Returns `transcript of <video_id>` for every video not marked missing
#[derive(Clone, Default)]
pub struct MockTranscripts {
    pub missing: HashSet<String>,
    pub calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl MockTranscripts {
    pub fn missing(mut self, video_id: &str) -> Self {
        self.missing.insert(video_id.to_string());
        self
    }
}

impl TranscriptService for MockTranscripts {
    async fn fetch(&self, video_id: &str, languages: &[&str]) -> Option<String> {
        self.calls.lock().unwrap().push((
            video_id.to_string(),
            languages.iter().map(|l| l.to_string()).collect(),
        ));

        if self.missing.contains(video_id) {
            return None;
        }
        Some(format!("transcript of {video_id}"))
    }
}
