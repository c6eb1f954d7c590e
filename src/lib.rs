//! Read-only lookup over two on-disk dictionary file formats: the multi-volume
//! `aar` format and the single-file `sdct` format.
//!
//! Both formats pair an ordered word index with a compressed article store.
//! Opening a file yields a [`Dictionary`]; prefix queries walk the on-disk
//! index and return words together with lazy [`ArticleHandle`]s that read and
//! decompress a single article on demand. A [`DictionaryCollection`] groups
//! open dictionaries by index language and fans queries out across them.
//!
//! ```no_run
//! use aardict::Dictionary;
//!
//! let dictionary = Dictionary::open("wikipedia-en.aar")?;
//! for item in dictionary.prefix_lookup("aard")? {
//!     let (word, article) = item?;
//!     println!("{word}: {}", article.read()?.text);
//! }
//! # Ok::<(), aardict::DictFormatError>(())
//! ```
// reading aar index entries and articles
pub mod aar;
// decoded article and tag value types
pub mod article;
// primary-strength Unicode collation
pub mod collation;
pub mod collection;
// the none/gzip/bzip2 decompressor registry
pub mod compress;
pub mod dictionary;
// reading the sdct short index and full index chain
pub mod sdct;
pub mod word;

pub use aar::AarDict;
pub use article::{Article, Tag};
pub use collection::{DictionaryCollection, WordLookup};
pub use compress::Compression;
pub use dictionary::{ArticleHandle, DictKey, Dictionary, PrefixLookup};
pub use sdct::SdctDict;
pub use word::Word;

/// The error type for opening dictionary files and reading their indexes.
#[derive(thiserror::Error, Debug)]
pub enum DictFormatError {
    #[error("IO error")]
    Io(#[from] std::io::Error),
    #[error("{file}: not a recognized dictionary file")]
    BadMagic { file: String },
    #[error("{file}: format version {found} is not supported by this reader")]
    IncompatibleVersion { file: String, found: String },
    #[error("{file}: metadata length is not an 8-digit decimal number")]
    BadMetadataLength { file: String },
    #[error("{file}: malformed metadata")]
    Metadata {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{file}: timestamp does not match the first volume")]
    VolumeMismatch { file: String },
    #[error("{file}: not a valid sdct dictionary")]
    BadSignature { file: String },
    #[error("unknown compression method {0}")]
    UnknownCompression(u8),
    #[error("{method} decompression failed")]
    Decompress {
        method: Compression,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = core::result::Result<T, DictFormatError>;
