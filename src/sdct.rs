//! Reader for the single-file sdct dictionary format.
//!
//! An sdct file carries a 43-byte little-endian header, a handful of
//! length-prefixed compressed "units" (title, copyright, version, articles)
//! and a two-level index: a short index mapping the first few chars of a
//! word to a position in the full index, and the full index itself, a
//! singly-linked forward chain of variable-length word records.
use crate::article::Article;
use crate::compress::Compression;
use crate::dictionary::DictKey;
use crate::word::{Word, char_prefix};
use crate::{DictFormatError, Result};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

pub const HEADER_SIZE: usize = 43;

fn le_u16(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

/// Three-byte language field, NUL padding stripped.
fn lang_str(b: &[u8]) -> String {
    String::from_utf8_lossy(b).trim_end_matches('\0').to_owned()
}

/// The fixed 43-byte file header.
#[derive(Debug, Clone)]
pub struct SdctHeader {
    pub word_lang: String,
    pub article_lang: String,
    pub compression: Compression,
    /// Number of short-index levels, from the high nibble of byte 0x0A.
    pub short_index_depth: usize,
    pub num_of_words: u32,
    pub short_index_length: u32,
    pub title_offset: u32,
    pub copyright_offset: u32,
    pub version_offset: u32,
    pub short_index_offset: u32,
    pub full_index_offset: u32,
    pub articles_offset: u32,
}

impl SdctHeader {
    pub fn parse(buf: &[u8; HEADER_SIZE], file: &str) -> Result<Self> {
        if &buf[0x00..0x04] != b"sdct" {
            return Err(DictFormatError::BadSignature { file: file.to_owned() });
        }
        let packed = buf[0x0A];
        Ok(SdctHeader {
            word_lang: lang_str(&buf[0x04..0x07]),
            article_lang: lang_str(&buf[0x07..0x0A]),
            compression: Compression::try_from(packed & 0x0F)?,
            short_index_depth: (packed >> 4) as usize,
            num_of_words: le_u32(&buf[0x0B..]),
            short_index_length: le_u32(&buf[0x0F..]),
            title_offset: le_u32(&buf[0x13..]),
            copyright_offset: le_u32(&buf[0x17..]),
            version_offset: le_u32(&buf[0x1B..]),
            short_index_offset: le_u32(&buf[0x1F..]),
            full_index_offset: le_u32(&buf[0x23..]),
            articles_offset: le_u32(&buf[0x27..]),
        })
    }
}

/// One record of the full index chain. The terminator record has
/// `next_delta == 0` and carries no word.
#[derive(Debug)]
struct FullIndexItem {
    next_delta: u16,
    article_ptr: u32,
    word: Option<Vec<u8>>,
}

/// An open sdct dictionary owning its single file handle.
#[derive(Debug)]
pub struct SdctDict {
    file_name: String,
    file: Option<File>,
    header: SdctHeader,
    encoding: &'static Encoding,
    /// Map `k` holds `k`-char prefixes (re-encoded to the dictionary
    /// encoding) and their deltas into the full index region.
    short_index: Vec<HashMap<Vec<u8>, u32>>,
    title: String,
    version: String,
    copyright: String,
}

impl SdctDict {
    /// Open a dictionary assuming the de facto default encoding, UTF-8.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_encoding(path, UTF_8)
    }

    /// Open a dictionary whose words and articles use the given encoding.
    /// The format itself does not declare one.
    pub fn open_with_encoding(path: impl AsRef<Path>, encoding: &'static Encoding) -> Result<Self> {
        let file_name = path.as_ref().to_string_lossy().into_owned();
        let mut file = File::open(&path)?;
        let mut buf = [0_u8; HEADER_SIZE];
        file.read_exact(&mut buf)?;
        let header = SdctHeader::parse(&buf, &file_name)?;

        let title = decode_unit(&file, &header, header.title_offset, encoding)?;
        let version = decode_unit(&file, &header, header.version_offset, encoding)?;
        let copyright = decode_unit(&file, &header, header.copyright_offset, encoding)?;
        let short_index = read_short_index(&file, &header, encoding)?;
        debug!("{file_name}: {} words, depth {} short index", header.num_of_words, header.short_index_depth);
        Ok(SdctDict { file_name, file: Some(file), header, encoding, short_index, title, version, copyright })
    }

    /// Close the file handle. Idempotent; reads afterwards report an IO
    /// error instead of panicking.
    pub fn close(&mut self) {
        self.file = None;
    }

    fn file(&self) -> Result<&File> {
        self.file
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "dictionary is closed").into())
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn header(&self) -> &SdctHeader {
        &self.header
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn copyright(&self) -> &str {
        &self.copyright
    }

    /// Declared language of the index words.
    pub fn word_lang(&self) -> &str {
        &self.header.word_lang
    }

    /// Declared language of the articles.
    pub fn article_lang(&self) -> &str {
        &self.header.article_lang
    }

    pub fn word_count(&self) -> usize {
        self.header.num_of_words as usize
    }

    pub fn key(&self) -> DictKey {
        DictKey {
            title: self.title.clone(),
            version: self.version.clone(),
            file_name: self.file_name.clone(),
        }
    }

    fn unit(&self, pos: u64) -> Result<Vec<u8>> {
        read_unit(self.file()?, &self.header, pos)
    }

    /// Deepest short-index level containing a prefix of `word` decides where
    /// the full-index walk starts. No level matching means no result.
    fn search_position(&self, word: &str) -> Option<(u32, Vec<u8>)> {
        let mut found = None;
        for k in 1..=self.header.short_index_depth {
            let prefix = self.encoding.encode(char_prefix(word, k)).0;
            if let Some(&delta) = self.short_index.get(k).and_then(|map| map.get(prefix.as_ref())) {
                found = Some((delta, prefix.into_owned()));
            }
        }
        found
    }

    /// Read one chain record at an absolute file offset. A position inside
    /// the article region means a corrupt chain; the walk treats it as the
    /// end instead of failing.
    fn read_full_index_item(&self, pos: u64) -> Result<Option<FullIndexItem>> {
        if pos >= self.header.articles_offset as u64 {
            warn!("{}: full index chain points at {pos}, inside the article region", self.file_name);
            return Ok(None);
        }
        let mut file = self.file()?;
        file.seek(SeekFrom::Start(pos))?;
        let mut fixed = [0_u8; 8];
        file.read_exact(&mut fixed)?;
        let next_delta = le_u16(&fixed[0..2]);
        let article_ptr = le_u32(&fixed[4..8]);
        let word = if next_delta != 0 {
            let mut word = vec![0_u8; next_delta.saturating_sub(8) as usize];
            file.read_exact(&mut word)?;
            Some(word)
        } else {
            None
        };
        Ok(Some(FullIndexItem { next_delta, article_ptr, word }))
    }

    /// Exact-match lookup, returning a lazy handle to the article.
    pub fn lookup(&self, word: &str) -> Result<Option<SdctArticle<'_>>> {
        let Some((delta, starts_with)) = self.search_position(word) else {
            return Ok(None);
        };
        let target = self.encoding.encode(word).0;
        let mut pos = self.header.full_index_offset as u64 + delta as u64;
        loop {
            let Some(item) = self.read_full_index_item(pos)? else {
                return Ok(None);
            };
            match &item.word {
                Some(bytes) => {
                    if !bytes.starts_with(&starts_with) {
                        return Ok(None);
                    }
                    if bytes[..] == target[..] {
                        return Ok(Some(SdctArticle { dict: self, article_ptr: item.article_ptr }));
                    }
                }
                // the terminator record carries no word
                None => return Ok(None),
            }
            if item.next_delta == 0 {
                return Ok(None);
            }
            pos += item.next_delta as u64;
        }
    }

    /// All chain entries whose word begins with `query`, in chain order.
    /// Matching is byte-wise in the dictionary encoding.
    pub fn prefix_lookup<'a>(&'a self, query: &str) -> SdctPrefixLookup<'a> {
        match self.search_position(query) {
            Some((delta, starts_with)) => SdctPrefixLookup {
                dict: self,
                query: self.encoding.encode(query).0.into_owned(),
                starts_with,
                pos: self.header.full_index_offset as u64 + delta as u64,
                done: false,
            },
            None => SdctPrefixLookup {
                dict: self,
                query: Vec::new(),
                starts_with: Vec::new(),
                pos: 0,
                done: true,
            },
        }
    }

    fn read_article(&self, article_ptr: u32) -> Result<Article> {
        let data = self.unit(self.header.articles_offset as u64 + article_ptr as u64)?;
        let (text, _, _) = self.encoding.decode(&data);
        let mut article = Article::plain(text.into_owned());
        article.source = Some(self.key());
        Ok(article)
    }
}

/// A unit is a u32 length followed by that many compressed bytes.
fn read_unit(mut file: &File, header: &SdctHeader, pos: u64) -> Result<Vec<u8>> {
    file.seek(SeekFrom::Start(pos))?;
    let mut length = [0_u8; 4];
    file.read_exact(&mut length)?;
    let mut payload = vec![0_u8; le_u32(&length) as usize];
    file.read_exact(&mut payload)?;
    header.compression.decompress(&payload)
}

fn decode_unit(file: &File, header: &SdctHeader, pos: u32, encoding: &'static Encoding) -> Result<String> {
    let bytes = read_unit(file, header, pos as u64)?;
    let (text, _, _) = encoding.decode(&bytes);
    Ok(text.into_owned())
}

/// Decode the short index into per-depth prefix maps. The table is stored
/// as one compressed blob of fixed-size records: `depth` u32 codepoints
/// (zero-padded) plus the full-index delta.
fn read_short_index(
    mut file: &File, header: &SdctHeader, encoding: &'static Encoding,
) -> Result<Vec<HashMap<Vec<u8>, u32>>> {
    let depth = header.short_index_depth;
    let record_size = (depth + 1) * 4;
    file.seek(SeekFrom::Start(header.short_index_offset as u64))?;
    // The decompressed table is record_size * length bytes. A stored blob is
    // usually shorter than that but a tiny table can expand under
    // compression, so also take the distance to the next section; the
    // decompressor ignores trailing bytes.
    let expected = record_size * header.short_index_length as usize;
    let span = header.full_index_offset.saturating_sub(header.short_index_offset) as usize;
    let mut raw = Vec::new();
    file.take(expected.max(span) as u64).read_to_end(&mut raw)?;
    let table = header.compression.decompress(&raw)?;

    let mut short_index = vec![HashMap::new(); depth + 1];
    for record in table.chunks_exact(record_size).take(header.short_index_length as usize) {
        let mut prefix = String::new();
        for level in 0..depth {
            let code = le_u32(&record[level * 4..]);
            if code != 0 {
                if let Some(c) = char::from_u32(code) {
                    prefix.push(c);
                }
            }
        }
        let delta = le_u32(&record[depth * 4..]);
        let length = prefix.chars().count();
        short_index[length].insert(encoding.encode(&prefix).0.into_owned(), delta);
    }
    Ok(short_index)
}

/// Lazy handle to one sdct article: a pointer into the article region.
/// Reading seeks and decompresses afresh each time.
#[derive(Debug, Clone, Copy)]
pub struct SdctArticle<'a> {
    dict: &'a SdctDict,
    article_ptr: u32,
}

impl SdctArticle<'_> {
    pub fn read(&self) -> Result<Article> {
        self.dict.read_article(self.article_ptr)
    }
}

/// Iterator over `(word, article handle)` pairs matching a prefix query.
pub struct SdctPrefixLookup<'a> {
    dict: &'a SdctDict,
    query: Vec<u8>,
    starts_with: Vec<u8>,
    pos: u64,
    done: bool,
}

impl<'a> Iterator for SdctPrefixLookup<'a> {
    type Item = Result<(Word, SdctArticle<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let item = match self.dict.read_full_index_item(self.pos) {
                Ok(Some(item)) => item,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            let Some(bytes) = item.word else {
                self.done = true;
                return None;
            };
            if !bytes.starts_with(&self.starts_with) {
                self.done = true;
                return None;
            }
            // the match is decided before the terminator check so that the
            // last record of a chain is still emitted
            let matches = bytes.starts_with(&self.query);
            if item.next_delta == 0 {
                self.done = true;
            } else {
                self.pos += item.next_delta as u64;
            }
            if matches {
                let word = Word::from_encoded(bytes, self.dict.encoding);
                return Some(Ok((word, SdctArticle { dict: self.dict, article_ptr: item.article_ptr })));
            }
        }
        None
    }
}
