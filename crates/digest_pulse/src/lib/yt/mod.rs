pub mod channel;
pub mod search;
pub mod transcript;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::yt::channel::ChannelReference;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoResult {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// What a single search call is restricted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchScope {
    Channel(String),
    Keyword(String),
    Unfiltered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub scope: SearchScope,
    pub published_after: DateTime<Utc>,
    pub max_results: u32,
}

/// Video search backend. Results are expected newest first.
pub trait SearchService {
    fn search(
        &self,
        request: &SearchRequest,
    ) -> impl Future<Output = anyhow::Result<Vec<VideoResult>>> + Send;

    /// Looks up the channel id behind a username or handle
    fn resolve_channel_id(
        &self,
        reference: &ChannelReference,
    ) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;
}

pub trait TranscriptService {
    /// Best-effort transcript in the first available of `languages`.
    ///
    /// Implementations never fail: any problem is logged and yields `None`.
    fn fetch(
        &self,
        video_id: &str,
        languages: &[&str],
    ) -> impl Future<Output = Option<String>> + Send;
}
