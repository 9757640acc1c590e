//! # Channel references
//!
//! Extracts a channel identifier from the URL-ish strings users paste in:
//! `https://www.youtube.com/channel/UC...`, `youtube.com/user/name`,
//! `/c/name` and `youtube.com/@handle`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static CHANNEL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/channel/([a-zA-Z0-9_-]+)").unwrap());

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(?:user|c)/([a-zA-Z0-9_-]+)").unwrap());

static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/@([a-zA-Z0-9_.-]+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelReferenceKind {
    ExplicitId,
    /// legacy `/user/` and custom `/c/` urls
    Username,
    Handle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelReference {
    pub kind: ChannelReferenceKind,
    pub value: String,
}

impl ChannelReference {
    pub fn new(kind: ChannelReferenceKind, value: impl Into<String>) -> Self {
        ChannelReference {
            kind,
            value: value.into(),
        }
    }

    /// Returns `None` when `raw` matches no known channel url shape.
    ///
    /// Explicit ids win over usernames, usernames over handles.
    pub fn parse(raw: &str) -> Option<Self> {
        let patterns = [
            (&*CHANNEL_ID_RE, ChannelReferenceKind::ExplicitId),
            (&*USERNAME_RE, ChannelReferenceKind::Username),
            (&*HANDLE_RE, ChannelReferenceKind::Handle),
        ];

        patterns.into_iter().find_map(|(re, kind)| {
            re.captures(raw)
                .and_then(|cap| cap.get(1))
                .map(|m| ChannelReference::new(kind, m.as_str()))
        })
    }

    pub fn needs_lookup(&self) -> bool {
        self.kind != ChannelReferenceKind::ExplicitId
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_id() {
        assert_eq!(
            ChannelReference::parse("https://www.youtube.com/channel/ABC123"),
            Some(ChannelReference::new(ChannelReferenceKind::ExplicitId, "ABC123"))
        );
        assert_eq!(
            ChannelReference::parse("youtube.com/channel/UC_x-5Y/videos"),
            Some(ChannelReference::new(ChannelReferenceKind::ExplicitId, "UC_x-5Y"))
        );
    }

    #[test]
    fn test_username_and_custom_url() {
        assert_eq!(
            ChannelReference::parse("https://youtube.com/user/oldschool"),
            Some(ChannelReference::new(ChannelReferenceKind::Username, "oldschool"))
        );
        assert_eq!(
            ChannelReference::parse("https://youtube.com/c/CustomName"),
            Some(ChannelReference::new(ChannelReferenceKind::Username, "CustomName"))
        );
    }

    #[test]
    fn test_handle() {
        assert_eq!(
            ChannelReference::parse("https://www.youtube.com/@someHandle"),
            Some(ChannelReference::new(ChannelReferenceKind::Handle, "someHandle"))
        );
        assert_eq!(
            ChannelReference::parse("youtube.com/@dots.and-dashes_1/streams"),
            Some(ChannelReference::new(
                ChannelReferenceKind::Handle,
                "dots.and-dashes_1"
            ))
        );
    }

    #[test]
    fn test_priority_explicit_id_first() {
        let parsed = ChannelReference::parse("https://youtube.com/@handle/channel/UC999").unwrap();
        assert_eq!(parsed.kind, ChannelReferenceKind::ExplicitId);
        assert_eq!(parsed.value, "UC999");
        assert!(!parsed.needs_lookup());
    }

    #[test]
    fn test_unrelated_strings() {
        assert_eq!(ChannelReference::parse("rust programming"), None);
        assert_eq!(ChannelReference::parse("@notapath"), None);
        assert_eq!(ChannelReference::parse(""), None);
    }
}
