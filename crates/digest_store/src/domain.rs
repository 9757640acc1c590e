use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// `chrono` format of a batch id. Fixed width, so sorting ids as strings
/// sorts them chronologically.
pub const BATCH_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

const MAX_SLUG_LEN: usize = 50;

pub(crate) static BATCH_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}_\d{6}$").unwrap());

static NON_ALNUM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// How the text of a summary came to be
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    Summarized,
    TranscriptUnavailable,
    SummarizerFailed,
}

/// One entry of a batch's metadata index.
///
/// The summary text itself lives in `filename` inside the batch directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryRecord {
    /// 1-based position within the batch
    pub ordinal: u32,
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub filename: String,
    pub status: SummaryStatus,
}

impl SummaryRecord {
    pub fn new(
        ordinal: u32,
        video_id: impl Into<String>,
        title: impl Into<String>,
        channel_title: impl Into<String>,
        status: SummaryStatus,
    ) -> Self {
        let title = title.into();
        SummaryRecord {
            ordinal,
            video_id: video_id.into(),
            filename: summary_filename(ordinal, &title),
            title,
            channel_title: channel_title.into(),
            status,
        }
    }
}

/// Contents of `metadata.json`. Written once when a batch completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchIndex {
    pub batch_id: String,
    pub query: String,
    pub window: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub summaries: Vec<SummaryRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchListing {
    pub batch_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub summary_count: usize,
    /// `false` when the batch has no metadata index
    pub complete: bool,
    pub summaries: Vec<SummaryRecord>,
}

/// Builds the on-disk filename for a summary, e.g. `03_rust_in_2026.md`
pub fn summary_filename(ordinal: u32, title: &str) -> String {
    let lowered = title.to_lowercase();
    let slug = NON_ALNUM_REGEX.replace_all(&lowered, "_");
    let mut slug = slug.trim_matches('_').chars().take(MAX_SLUG_LEN).collect::<String>();
    // truncation may leave a trailing separator
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("video");
    }
    format!("{ordinal:02}_{slug}.md")
}

/// Recovers the creation time encoded in a batch id
pub fn batch_created_at(batch_id: &str) -> Option<DateTime<Utc>> {
    if !BATCH_ID_REGEX.is_match(batch_id) {
        return None;
    }
    NaiveDateTime::parse_from_str(batch_id, BATCH_ID_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
