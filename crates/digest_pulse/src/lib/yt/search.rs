use std::time::Duration;

use anyhow::Context;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;

use crate::{
    types::{ApiErrorResponse, ChannelListResponse, SearchListResponse},
    yt::{
        channel::{ChannelReference, ChannelReferenceKind},
        SearchRequest, SearchScope, SearchService, VideoResult,
    },
};

/// YouTube Data API v3 client
pub struct YouTubeDataApi {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
}

impl YouTubeDataApi {
    const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
    const MAX_RETRIES: u32 = 3;

    pub fn new(api_key: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .context("Failed to build http client")?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(Self::MAX_RETRIES);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: Self::BASE_URL.into(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> anyhow::Result<T> {
        let resp = self
            .client
            .get(format!("{}/{endpoint}", self.base_url))
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, endpoint, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| format!("{} - {}", e.error.code, e.error.message))
                .unwrap_or(body);
            anyhow::bail!("YouTube API error on /{endpoint}: {status} - {message}");
        }

        resp.json::<T>()
            .await
            .with_context(|| format!("Failed to decode /{endpoint} response"))
    }
}

impl SearchService for YouTubeDataApi {
    #[tracing::instrument(skip(self))]
    async fn search(&self, request: &SearchRequest) -> anyhow::Result<Vec<VideoResult>> {
        let response: SearchListResponse = self.get_json("search", &search_params(request)).await?;
        Ok(into_video_results(response))
    }

    #[tracing::instrument(skip(self))]
    async fn resolve_channel_id(
        &self,
        reference: &ChannelReference,
    ) -> anyhow::Result<Option<String>> {
        let param = match reference.kind {
            ChannelReferenceKind::ExplicitId => return Ok(Some(reference.value.clone())),
            ChannelReferenceKind::Username => "forUsername",
            ChannelReferenceKind::Handle => "forHandle",
        };

        let params = [("part", "id".to_string()), (param, reference.value.clone())];
        let response: ChannelListResponse = self.get_json("channels", &params).await?;

        Ok(response.items.into_iter().next().map(|item| item.id))
    }
}

fn search_params(request: &SearchRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("part", "snippet".to_string()),
        ("type", "video".to_string()),
        ("order", "date".to_string()),
        ("maxResults", request.max_results.to_string()),
        (
            "publishedAfter",
            request
                .published_after
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        ),
    ];

    match &request.scope {
        SearchScope::Channel(channel_id) => params.push(("channelId", channel_id.clone())),
        SearchScope::Keyword(query) => params.push(("q", query.clone())),
        SearchScope::Unfiltered => {}
    }

    params
}

fn into_video_results(response: SearchListResponse) -> Vec<VideoResult> {
    response
        .items
        .into_iter()
        .filter_map(|item| {
            // channels and playlists can slip into results despite `type=video`
            let video_id = item.id.video_id?;
            let snippet = item.snippet?;
            Some(VideoResult {
                video_id,
                title: decode_html_entities(&snippet.title),
                channel_title: decode_html_entities(&snippet.channel_title),
                published_at: snippet.published_at,
            })
        })
        .collect()
}

/// The search endpoint returns HTML-escaped snippet text
fn decode_html_entities(s: &str) -> String {
    html_escape::decode_html_entities(s).into_owned()
}
