//! Decoded articles and their markup tags.
//!
//! aar articles are stored as a JSON pair `[text, tags]`; rendering the tags
//! is the caller's concern, this module only carries them. sdct articles are
//! plain text and never have tags.
use crate::dictionary::DictKey;
use log::warn;
use serde::Deserialize;
use std::collections::HashMap;

/// A markup span over an article's text. Offsets are character positions;
/// negative offsets mean the span boundary is unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub start: i64,
    pub end: i64,
    pub attributes: HashMap<String, String>,
}

impl Tag {
    pub fn new(name: &str, start: i64, end: i64, attributes: HashMap<String, String>) -> Self {
        Tag { name: name.to_owned(), start, end, attributes }
    }
}

impl Default for Tag {
    fn default() -> Self {
        Tag { name: String::new(), start: -1, end: -1, attributes: HashMap::new() }
    }
}

/// On-disk tag shape: `[name, start, end, attributes]`.
#[derive(Deserialize)]
struct RawTag(String, i64, i64, HashMap<String, String>);

/// A decompressed article: text, the tags spanning it, and the key of the
/// dictionary it came from. The key is a non-owning back-reference; the
/// article stays valid after its dictionary is closed, but resolving the key
/// back to a dictionary is only possible while that dictionary is open.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub text: String,
    pub tags: Vec<Tag>,
    pub source: Option<DictKey>,
}

impl Article {
    /// An article holding plain text and no tags.
    pub fn plain(text: String) -> Self {
        Article { text, tags: Vec::new(), source: None }
    }

    /// Decode a decompressed aar payload, a JSON array
    /// `[text, [[name, start, end, attributes], ...]]`.
    /// A payload that fails to parse is recovered as a tag-less article
    /// carrying the raw bytes as text.
    pub fn from_payload(payload: &[u8]) -> Self {
        match serde_json::from_slice::<(String, Vec<RawTag>)>(payload) {
            Ok((text, raw_tags)) => {
                let tags = raw_tags
                    .into_iter()
                    .map(|RawTag(name, start, end, attributes)| Tag { name, start, end, attributes })
                    .collect();
                Article { text, tags, source: None }
            }
            Err(e) => {
                warn!("article payload is not a [text, tags] pair ({e}), keeping raw text");
                Article::plain(String::from_utf8_lossy(payload).into_owned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::init;
    use pretty_assertions::assert_eq;

    #[test]
    fn payload_with_tags() {
        init();
        let payload = br#"["aardvark: a burrowing mammal",
            [["b", 0, 8, {}], ["a", 11, 20, {"href": "Mammal"}]]]"#;
        let article = Article::from_payload(payload);
        assert_eq!(article.text, "aardvark: a burrowing mammal");
        assert_eq!(article.tags.len(), 2);
        assert_eq!(article.tags[0], Tag::new("b", 0, 8, HashMap::new()));
        assert_eq!(article.tags[1].attributes["href"], "Mammal");
        assert_eq!(article.source, None);
    }

    #[test]
    fn malformed_payload_recovers_raw_text() {
        init();
        let article = Article::from_payload(b"not json at all");
        assert_eq!(article.text, "not json at all");
        assert!(article.tags.is_empty());
    }

    #[test]
    fn unset_tag_offsets() {
        init();
        let tag = Tag::default();
        assert_eq!(tag.start, -1);
        assert_eq!(tag.end, -1);
        assert!(tag.attributes.is_empty());
    }
}
