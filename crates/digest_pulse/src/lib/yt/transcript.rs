use yt_transcript_rs::api::YouTubeTranscriptApi;

use crate::yt::TranscriptService;

pub struct YtTranscriptClient {
    api: YouTubeTranscriptApi,
}

impl YtTranscriptClient {
    pub fn new() -> anyhow::Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| anyhow::anyhow!("Failed to create transcript client: {e:?}"))?;
        Ok(Self { api })
    }
}

impl TranscriptService for YtTranscriptClient {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, video_id: &str, languages: &[&str]) -> Option<String> {
        match self.api.fetch_transcript(video_id, languages, false).await {
            Ok(transcript) => {
                let mut parts = Vec::new();
                for entry in transcript {
                    parts.push(entry.text);
                }
                join_snippets(parts)
            }
            Err(e) => {
                tracing::warn!(error = ?e, video_id, "Transcript unavailable");
                None
            }
        }
    }
}

/// Joins caption snippets into one line of text; `None` if nothing is left
fn join_snippets(parts: Vec<String>) -> Option<String> {
    let text = parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_snippets() {
        let parts = vec![" hello ".to_string(), "".into(), "world\n".into()];
        assert_eq!(join_snippets(parts).as_deref(), Some("hello world"));
    }

    #[test]
    fn test_join_snippets_empty_is_none() {
        assert_eq!(join_snippets(vec![]), None);
        assert_eq!(join_snippets(vec!["  ".into()]), None);
    }
}
