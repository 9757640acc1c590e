use std::collections::HashMap;

use chrono::Utc;

use crate::{
    error::Error,
    window::RecencyWindow,
    yt::{channel::ChannelReference, SearchRequest, SearchScope, SearchService, VideoResult},
};

/// Runs one search per comma-separated query token and merges the results,
/// deduplicated by video id.
///
/// A token that fails to search is logged and skipped; the remaining tokens
/// still contribute.
pub struct VideoSearchAggregator<S> {
    service: S,
    max_results: u32,
}

impl<S: SearchService> VideoSearchAggregator<S> {
    pub const DEFAULT_MAX_RESULTS: u32 = 10;

    pub fn new(service: S) -> Self {
        Self {
            service,
            max_results: Self::DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Validates the raw window first; an invalid window aborts the whole
    /// call before any search is issued.
    pub async fn aggregate_raw(
        &self,
        query: &str,
        unit: &str,
        amount: &str,
    ) -> Result<Vec<VideoResult>, Error> {
        let window = RecencyWindow::parse(unit, amount)
            .inspect_err(|e| tracing::error!(error = %e, "Rejected search window"))?;
        Ok(self.aggregate(query, &window).await)
    }

    /// Results keep first-seen order: token order, then the service's order
    /// within each token. A duplicate replaces the earlier entry's metadata in
    /// place.
    #[tracing::instrument(skip(self, window), fields(window = %window))]
    pub async fn aggregate(&self, query: &str, window: &RecencyWindow) -> Vec<VideoResult> {
        let published_after = window.cutoff_from(Utc::now());

        let mut tokens = split_query(query).into_iter().map(Some).collect::<Vec<_>>();
        if tokens.is_empty() {
            tokens.push(None);
        }

        let mut merged: Vec<VideoResult> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for token in tokens {
            let request = SearchRequest {
                scope: self.scope_for(token).await,
                published_after,
                max_results: self.max_results,
            };

            let videos = match self.service.search(&request).await {
                Ok(videos) => videos,
                Err(e) => {
                    tracing::error!(error = ?e, ?token, "Search failed for query token, skipping");
                    continue;
                }
            };
            tracing::info!(?token, count = videos.len(), "Search returned videos");

            for video in videos {
                match positions.get(&video.video_id) {
                    Some(&idx) => merged[idx] = video,
                    None => {
                        positions.insert(video.video_id.clone(), merged.len());
                        merged.push(video);
                    }
                }
            }
        }

        tracing::info!(count = merged.len(), "Aggregated distinct videos");
        merged
    }

    /// Maps a token to a search scope, resolving usernames and handles to a
    /// channel id. A failed lookup degrades to a keyword search on the raw
    /// token.
    async fn scope_for(&self, token: Option<&str>) -> SearchScope {
        let Some(token) = token else {
            return SearchScope::Unfiltered;
        };

        let Some(reference) = ChannelReference::parse(token) else {
            return SearchScope::Keyword(token.to_string());
        };

        if !reference.needs_lookup() {
            return SearchScope::Channel(reference.value);
        }

        match self.service.resolve_channel_id(&reference).await {
            Ok(Some(channel_id)) => SearchScope::Channel(channel_id),
            Ok(None) => {
                tracing::warn!(token, "No channel found for reference, searching as keyword");
                SearchScope::Keyword(token.to_string())
            }
            Err(e) => {
                tracing::warn!(error = ?e, token, "Channel lookup failed, searching as keyword");
                SearchScope::Keyword(token.to_string())
            }
        }
    }
}

fn split_query(query: &str) -> Vec<&str> {
    query
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}
