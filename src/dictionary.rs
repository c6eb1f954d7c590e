//! Format-independent view over an open dictionary.
use crate::aar::{AarArticle, AarDict, AarPrefixLookup};
use crate::article::Article;
use crate::sdct::{SdctArticle, SdctDict, SdctPrefixLookup};
use crate::word::Word;
use crate::{DictFormatError, Result};
use std::fmt;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::path::Path;

/// Identity of a dictionary: `(title, version, file name)`. Two open
/// dictionaries are the same dictionary iff their keys are equal; the key is
/// also the stable hash, and the non-owning back-reference carried by
/// [`Article`](crate::Article).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DictKey {
    pub title: String,
    pub version: String,
    pub file_name: String,
}

/// An open dictionary in either supported format.
#[derive(Debug)]
pub enum Dictionary {
    Aar(AarDict),
    Sdct(SdctDict),
}

impl Dictionary {
    /// Open a dictionary file, deciding the format from its magic bytes.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut magic = [0_u8; 4];
        File::open(&path)?.read_exact(&mut magic)?;
        if magic.starts_with(b"aar") {
            Ok(Dictionary::Aar(AarDict::open(path)?))
        } else if &magic == b"sdct" {
            Ok(Dictionary::Sdct(SdctDict::open(path)?))
        } else {
            Err(DictFormatError::BadMagic { file: path.as_ref().to_string_lossy().into_owned() })
        }
    }

    /// Close the underlying file handles. Idempotent.
    pub fn close(&mut self) {
        match self {
            Dictionary::Aar(dict) => dict.close(),
            Dictionary::Sdct(dict) => dict.close(),
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            Dictionary::Aar(dict) => dict.file_name(),
            Dictionary::Sdct(dict) => dict.file_name(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Dictionary::Aar(dict) => dict.title(),
            Dictionary::Sdct(dict) => dict.title(),
        }
    }

    pub fn version(&self) -> &str {
        match self {
            Dictionary::Aar(dict) => dict.version(),
            Dictionary::Sdct(dict) => dict.version(),
        }
    }

    /// Language of the index words, used for grouping in a
    /// [`DictionaryCollection`](crate::DictionaryCollection).
    pub fn index_language(&self) -> &str {
        match self {
            Dictionary::Aar(dict) => dict.index_language(),
            Dictionary::Sdct(dict) => dict.word_lang(),
        }
    }

    pub fn word_count(&self) -> usize {
        match self {
            Dictionary::Aar(dict) => dict.word_count(),
            Dictionary::Sdct(dict) => dict.word_count(),
        }
    }

    pub fn key(&self) -> DictKey {
        match self {
            Dictionary::Aar(dict) => dict.key(),
            Dictionary::Sdct(dict) => dict.key(),
        }
    }

    /// All index entries whose word begins with `query`, lazily, in on-disk
    /// order. aar matches by primary collation, sdct byte-wise in its
    /// declared encoding.
    pub fn prefix_lookup<'a>(&'a self, query: &str) -> Result<PrefixLookup<'a>> {
        match self {
            Dictionary::Aar(dict) => Ok(PrefixLookup::Aar(dict.prefix_lookup(query)?)),
            Dictionary::Sdct(dict) => Ok(PrefixLookup::Sdct(dict.prefix_lookup(query))),
        }
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Dictionary {}

impl Hash for Dictionary {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Lazy handle to one article in either format. Evaluating the same handle
/// twice yields equal articles.
#[derive(Debug, Clone, Copy)]
pub enum ArticleHandle<'a> {
    Aar(AarArticle<'a>),
    Sdct(SdctArticle<'a>),
}

impl ArticleHandle<'_> {
    /// Perform the deferred read: one random-access read plus decompression.
    pub fn read(&self) -> Result<Article> {
        match self {
            ArticleHandle::Aar(handle) => handle.read(),
            ArticleHandle::Sdct(handle) => handle.read(),
        }
    }
}

/// Iterator over `(word, article handle)` pairs from one dictionary.
pub enum PrefixLookup<'a> {
    Aar(AarPrefixLookup<'a>),
    Sdct(SdctPrefixLookup<'a>),
}

impl<'a> Iterator for PrefixLookup<'a> {
    type Item = Result<(Word, ArticleHandle<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            PrefixLookup::Aar(it) => {
                it.next().map(|item| item.map(|(word, article)| (word, ArticleHandle::Aar(article))))
            }
            PrefixLookup::Sdct(it) => {
                it.next().map(|item| item.map(|(word, article)| (word, ArticleHandle::Sdct(article))))
            }
        }
    }
}
