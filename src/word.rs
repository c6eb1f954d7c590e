//! Words read from a dictionary index.
use crate::collation;
use encoding_rs::Encoding;
use log::error;
use std::cmp::Ordering;
use std::fmt;
use std::str;

/// A word from a dictionary index: the raw on-disk bytes plus their decoded
/// Unicode form. Bytes that do not decode keep their raw form and carry the
/// sentinel text `"error"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    raw: Vec<u8>,
    text: String,
}

/// Truncate to the first `n` chars, the whole string if it is shorter.
pub(crate) fn char_prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

impl Word {
    /// A word from caller-supplied text, e.g. a query string.
    pub fn new(text: &str) -> Self {
        Word { raw: text.as_bytes().to_vec(), text: text.to_owned() }
    }

    /// A word from UTF-8 index bytes (the aar key pool).
    pub fn from_bytes(raw: Vec<u8>) -> Self {
        let text = match str::from_utf8(&raw) {
            Ok(text) => text.to_owned(),
            Err(_) => {
                error!("unable to decode word {raw:?}");
                "error".to_owned()
            }
        };
        Word { raw, text }
    }

    /// A word in the declared encoding of an sdct dictionary.
    pub fn from_encoded(raw: Vec<u8>, encoding: &'static Encoding) -> Self {
        let (decoded, _, had_errors) = encoding.decode(&raw);
        let text = if had_errors {
            error!("unable to decode word {raw:?} as {}", encoding.name());
            "error".to_owned()
        } else {
            decoded.into_owned()
        };
        Word { raw, text }
    }

    /// The decoded Unicode form.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The raw index bytes.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Compare against a query at primary collation strength after truncating
    /// `self` to the query's length in chars.
    ///
    /// The truncation is one-sided on purpose: it makes a leftmost binary
    /// search land on the first index entry whose collation prefix equals the
    /// query, which is where prefix enumeration starts. Making this
    /// symmetric breaks prefix lookup.
    pub fn prefix_cmp(&self, query: &Word) -> Ordering {
        let truncated = char_prefix(&self.text, query.text.chars().count());
        collation::primary_cmp(truncated, &query.text)
    }

    /// Whether this word begins with the query under primary collation.
    pub fn prefix_matches(&self, query: &Word) -> bool {
        self.prefix_cmp(query) == Ordering::Equal
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
