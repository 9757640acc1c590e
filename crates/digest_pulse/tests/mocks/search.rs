use std::sync::{Arc, Mutex};

use digest_pulse::yt::{
    channel::ChannelReference, SearchRequest, SearchScope, SearchService, VideoResult,
};

pub fn video(video_id: &str, title: &str, channel_title: &str) -> VideoResult {
    VideoResult {
        video_id: video_id.to_string(),
        title: title.to_string(),
        channel_title: channel_title.to_string(),
        published_at: None,
    }
}

#[derive(Clone, Default)]
pub struct MockSearchService {
    pub results: Vec<(SearchScope, Vec<VideoResult>)>,
    pub failing_scopes: Vec<SearchScope>,
    /// reference value -> channel id
    pub channels: Vec<(String, String)>,
    pub fail_lookups: bool,
    pub search_calls: Arc<Mutex<Vec<SearchRequest>>>,
    pub lookup_calls: Arc<Mutex<Vec<ChannelReference>>>,
}

impl MockSearchService {
    pub fn with_results(mut self, scope: SearchScope, videos: Vec<VideoResult>) -> Self {
        self.results.push((scope, videos));
        self
    }

    pub fn failing_for(mut self, scope: SearchScope) -> Self {
        self.failing_scopes.push(scope);
        self
    }

    pub fn with_channel(mut self, reference: &str, channel_id: &str) -> Self {
        self.channels
            .push((reference.to_string(), channel_id.to_string()));
        self
    }

    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    pub fn searched_scopes(&self) -> Vec<SearchScope> {
        self.search_calls
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.scope.clone())
            .collect()
    }
}

impl SearchService for MockSearchService {
    async fn search(&self, request: &SearchRequest) -> anyhow::Result<Vec<VideoResult>> {
        self.search_calls.lock().unwrap().push(request.clone());

        if self.failing_scopes.contains(&request.scope) {
            anyhow::bail!("quota exceeded for {:?}", request.scope);
        }

        Ok(self
            .results
            .iter()
            .find(|(scope, _)| *scope == request.scope)
            .map(|(_, videos)| videos.clone())
            .unwrap_or_default())
    }

    async fn resolve_channel_id(
        &self,
        reference: &ChannelReference,
    ) -> anyhow::Result<Option<String>> {
        self.lookup_calls.lock().unwrap().push(reference.clone());

        if self.fail_lookups {
            anyhow::bail!("channel lookup unavailable");
        }

        Ok(self
            .channels
            .iter()
            .find(|(value, _)| *value == reference.value)
            .map(|(_, id)| id.clone()))
    }
}
