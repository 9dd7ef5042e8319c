// src/article.rs
//! Article model as delivered by the aggregation API, plus the identity rule
//! shared by every dedup path (processed set, legacy cache, filtering).

use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// Provider literal meaning "this article has no event".
pub const NULL_EVENT_SENTINEL: &str = "null";

/// Publisher name used when the provider omits `source.title`.
pub const UNKNOWN_SOURCE: &str = "Unknown";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleSource {
    #[serde(default)]
    pub title: Option<String>,
}

/// One ingested news item. Read-only after parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default, rename = "eventUri")]
    pub event_uri: Option<String>,
    #[serde(default)]
    pub source: Option<ArticleSource>,
}

/// The provider sends `null` for some empty text fields.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Articles believed to report the same event. Downstream stages only accept
/// clusters with at least two members.
pub type Cluster = Vec<Article>;

/// Smallest cluster that is worth summarizing.
pub const MIN_CLUSTER_SIZE: usize = 2;

impl Article {
    /// Stable identity: the provider URI when present and non-empty, otherwise
    /// SHA-256 (hex) over `title` followed by `body`.
    pub fn identity(&self) -> String {
        match self.uri.as_deref() {
            Some(uri) if !uri.is_empty() => uri.to_string(),
            _ => content_hash(&self.title, &self.body),
        }
    }

    /// Event key with both "absent" encodings (missing field, `"null"`) folded
    /// to `None`. Empty strings count as absent too.
    pub fn event_key(&self) -> Option<&str> {
        self.event_uri
            .as_deref()
            .filter(|e| !e.is_empty() && *e != NULL_EVENT_SENTINEL)
    }

    pub fn source_title(&self) -> &str {
        self.source
            .as_ref()
            .and_then(|s| s.title.as_deref())
            .unwrap_or(UNKNOWN_SOURCE)
    }
}

/// Derived identity for URI-less articles.
pub fn content_hash(title: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(body.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
pub(crate) fn sample(uri: &str, title: &str) -> Article {
    Article {
        uri: Some(uri.to_string()),
        title: title.to_string(),
        body: format!("Body of {title}"),
        event_uri: None,
        source: Some(ArticleSource {
            title: Some(format!("src-{uri}")),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_is_identity_when_present() {
        let a = sample("a1", "Fed raises rates");
        assert_eq!(a.identity(), "a1");
    }

    #[test]
    fn empty_uri_falls_back_to_content_hash() {
        let mut a = sample("", "Fed raises rates");
        let expected = content_hash(&a.title, &a.body);
        assert_eq!(a.identity(), expected);
        a.uri = None;
        assert_eq!(a.identity(), expected);
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn content_hash_depends_on_order() {
        // title ++ body, so swapping fields must not collide in general
        assert_ne!(content_hash("ab", "c"), content_hash("c", "ab"));
        assert_eq!(content_hash("ab", "c"), content_hash("a", "bc"));
    }

    #[test]
    fn null_sentinel_event_is_absent() {
        let mut a = sample("a1", "t");
        assert_eq!(a.event_key(), None);
        a.event_uri = Some("null".into());
        assert_eq!(a.event_key(), None);
        a.event_uri = Some(String::new());
        assert_eq!(a.event_key(), None);
        a.event_uri = Some("eng-123".into());
        assert_eq!(a.event_key(), Some("eng-123"));
    }

    #[test]
    fn missing_source_title_defaults_to_unknown() {
        let json = r#"{"uri":"x","title":"t","body":"b","source":{}}"#;
        let a: Article = serde_json::from_str(json).unwrap();
        assert_eq!(a.source_title(), "Unknown");
        let bare: Article = serde_json::from_str(r#"{"uri":"y","title":"t","body":"b"}"#).unwrap();
        assert_eq!(bare.source_title(), "Unknown");
    }
}
