//! Reader for the multi-volume aar dictionary format.
//!
//! An aar dictionary is one or more files sharing a timestamp. Each file
//! starts with a JSON metadata blob; file 0 additionally holds the word
//! index (fixed 12-byte big-endian records), the key pool and the first
//! article region. Index records address articles as `(file_no, unit_ptr)`,
//! where the pointer is relative to that volume's own article region.
use crate::article::Article;
use crate::collation;
use crate::compress::decompress_any;
use crate::dictionary::DictKey;
use crate::word::Word;
use crate::{DictFormatError, Result};
use log::debug;
use serde::Deserialize;
use std::cmp::Ordering;
use std::fs::File;
use std::io;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::str;

/// `key_pos | file_no | article_unit_ptr`, each a big-endian u32.
const INDEX_RECORD_SIZE: u64 = 12;

/// The JSON metadata blob carried by every volume.
#[derive(Debug, Deserialize)]
pub struct AarMetadata {
    pub index1_offset: u64,
    pub index2_offset: u64,
    pub index_count: u64,
    pub article_count: u64,
    pub article_offset: u64,
    pub file_count: u64,
    /// Only ever compared across volumes, any scalar works.
    pub timestamp: serde_json::Value,
    #[serde(default)]
    pub index_language: String,
    #[serde(default)]
    pub article_language: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub aarddict_version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub copyright: String,
}

/// An open aar dictionary owning one file handle per volume.
#[derive(Debug)]
pub struct AarDict {
    file_name: String,
    files: Vec<File>,
    /// Article region offset per volume, from each volume's own metadata.
    article_offsets: Vec<u64>,
    metadata: AarMetadata,
    index_language: String,
    article_language: String,
}

fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

/// Volume `i` replaces the last two chars of the primary file name with the
/// zero-padded volume number.
fn volume_name(primary: &str, volume: u64) -> String {
    let cut = primary.char_indices().rev().nth(1).map_or(0, |(i, _)| i);
    format!("{}{volume:02}", &primary[..cut])
}

/// Parse the per-file header: `aar` magic, version `01`, 8 ASCII digits of
/// metadata length, then the JSON metadata itself.
fn read_metadata<R: Read>(reader: &mut R, file: &str) -> Result<AarMetadata> {
    let mut magic = [0_u8; 3];
    reader.read_exact(&mut magic)?;
    if &magic != b"aar" {
        return Err(DictFormatError::BadMagic { file: file.to_owned() });
    }
    let mut version = [0_u8; 2];
    reader.read_exact(&mut version)?;
    if &version != b"01" {
        return Err(DictFormatError::IncompatibleVersion {
            file: file.to_owned(),
            found: String::from_utf8_lossy(&version).into_owned(),
        });
    }
    let mut digits = [0_u8; 8];
    reader.read_exact(&mut digits)?;
    let length = str::from_utf8(&digits)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| DictFormatError::BadMetadataLength { file: file.to_owned() })?;
    let mut blob = vec![0_u8; length];
    reader.read_exact(&mut blob)?;
    serde_json::from_slice(&blob).map_err(|source| DictFormatError::Metadata { file: file.to_owned(), source })
}

impl AarDict {
    /// Open the primary file and every continuation volume its metadata
    /// announces. Any failure drops the handles opened so far.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file_name = path.as_ref().to_string_lossy().into_owned();
        let mut file = File::open(&path)?;
        let metadata = read_metadata(&mut file, &file_name)?;
        let mut files = vec![file];
        let mut article_offsets = vec![metadata.article_offset];
        for i in 1..metadata.file_count {
            let name = volume_name(&file_name, i);
            let mut volume = File::open(&name)?;
            let volume_metadata = read_metadata(&mut volume, &name)?;
            if volume_metadata.timestamp != metadata.timestamp {
                return Err(DictFormatError::VolumeMismatch { file: name });
            }
            article_offsets.push(volume_metadata.article_offset);
            files.push(volume);
        }
        let index_language = collation::normalize_lang(&metadata.index_language);
        let article_language = collation::normalize_lang(&metadata.article_language);
        debug!("{file_name}: {} words in {} volume(s)", metadata.index_count, files.len());
        Ok(AarDict { file_name, files, article_offsets, metadata, index_language, article_language })
    }

    /// Close all volume handles. Idempotent; reads afterwards report an IO
    /// error instead of panicking.
    pub fn close(&mut self) {
        self.files.clear();
    }

    fn volume(&self, no: usize) -> Result<&File> {
        self.files
            .get(no)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("volume {no} is not open")).into())
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    pub fn version(&self) -> &str {
        &self.metadata.aarddict_version
    }

    pub fn description(&self) -> &str {
        &self.metadata.description
    }

    pub fn copyright(&self) -> &str {
        &self.metadata.copyright
    }

    /// Language subtag of the declared index language.
    pub fn index_language(&self) -> &str {
        &self.index_language
    }

    /// Language subtag of the declared article language.
    pub fn article_language(&self) -> &str {
        &self.article_language
    }

    pub fn key(&self) -> DictKey {
        DictKey {
            title: self.title().to_owned(),
            version: self.version().to_owned(),
            file_name: self.file_name.clone(),
        }
    }

    /// Number of entries in the word index.
    pub fn word_count(&self) -> usize {
        self.metadata.index_count as usize
    }

    fn index_record(&self, i: usize) -> Result<(u32, u32, u32)> {
        let mut file = self.volume(0)?;
        file.seek(SeekFrom::Start(self.metadata.index1_offset + i as u64 * INDEX_RECORD_SIZE))?;
        let mut record = [0_u8; 12];
        file.read_exact(&mut record)?;
        Ok((be_u32(&record[0..4]), be_u32(&record[4..8]), be_u32(&record[8..12])))
    }

    /// The word at index position `i`, in on-disk (collation) order.
    pub fn word_at(&self, i: usize) -> Result<Word> {
        let (key_pos, _, _) = self.index_record(i)?;
        let mut file = self.volume(0)?;
        file.seek(SeekFrom::Start(self.metadata.index2_offset + key_pos as u64))?;
        let mut length = [0_u8; 4];
        file.read_exact(&mut length)?;
        let mut key = vec![0_u8; be_u32(&length) as usize];
        file.read_exact(&mut key)?;
        Ok(Word::from_bytes(key))
    }

    /// All index words in order.
    pub fn words(&self) -> impl Iterator<Item = Result<Word>> + '_ {
        (0..self.word_count()).map(|i| self.word_at(i))
    }

    /// Lazy handle to the article belonging to index position `i`.
    pub fn article_at(&self, i: usize) -> Result<AarArticle<'_>> {
        let (_, file_no, unit_ptr) = self.index_record(i)?;
        let file_no = file_no as usize;
        let base = self.article_offsets.get(file_no).copied().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, format!("index entry {i} references missing volume {file_no}"))
        })?;
        Ok(AarArticle { dict: self, file_no, offset: base + unit_ptr as u64 })
    }

    fn read_article(&self, file_no: usize, offset: u64) -> Result<Article> {
        let mut file = self.volume(file_no)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut length = [0_u8; 4];
        file.read_exact(&mut length)?;
        let mut payload = vec![0_u8; be_u32(&length) as usize];
        file.read_exact(&mut payload)?;
        let mut article = Article::from_payload(&decompress_any(&payload));
        article.source = Some(self.key());
        Ok(article)
    }

    /// Leftmost index position whose word is not less than the query under
    /// the truncating primary-strength comparison.
    fn bisect_left(&self, query: &Word) -> Result<usize> {
        let mut low = 0;
        let mut high = self.word_count();
        while low < high {
            let mid = usize::midpoint(low, high);
            if self.word_at(mid)?.prefix_cmp(query) == Ordering::Less {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        Ok(low)
    }

    /// All index entries whose word begins with `query` under primary
    /// collation, in on-disk order. Entries with equal collation keys keep
    /// their on-disk order, there is no secondary reorder.
    pub fn prefix_lookup<'a>(&'a self, query: &str) -> Result<AarPrefixLookup<'a>> {
        let query = Word::new(query);
        let pos = self.bisect_left(&query)?;
        Ok(AarPrefixLookup { dict: self, query, pos, done: false })
    }
}

/// Lazy handle to one aar article: a volume number and the absolute offset
/// of the article unit. Reading seeks and decompresses afresh each time, so
/// evaluating the same handle twice yields equal articles.
#[derive(Debug, Clone, Copy)]
pub struct AarArticle<'a> {
    dict: &'a AarDict,
    file_no: usize,
    offset: u64,
}

impl AarArticle<'_> {
    pub fn read(&self) -> Result<Article> {
        self.dict.read_article(self.file_no, self.offset)
    }
}

/// Iterator over `(word, article handle)` pairs matching a prefix query.
pub struct AarPrefixLookup<'a> {
    dict: &'a AarDict,
    query: Word,
    pos: usize,
    done: bool,
}

impl<'a> Iterator for AarPrefixLookup<'a> {
    type Item = Result<(Word, AarArticle<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.dict.word_count() {
            return None;
        }
        let item = self.dict.word_at(self.pos).and_then(|word| {
            if word.prefix_matches(&self.query) {
                Some(self.dict.article_at(self.pos).map(|article| (word, article))).transpose()
            } else {
                Ok(None)
            }
        });
        match item {
            Ok(Some(pair)) => {
                self.pos += 1;
                Some(Ok(pair))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testdata {
    //! Synthetic aar volumes for tests: metadata is padded to a fixed length
    //! so every offset is known up front.
    use serde_json::json;

    pub(crate) const META_LEN: usize = 512;
    const HEADER_LEN: usize = 3 + 2 + 8;

    pub(crate) struct MetaSpec {
        pub(crate) title: &'static str,
        pub(crate) lang: &'static str,
        pub(crate) timestamp: &'static str,
        pub(crate) file_count: u64,
    }

    impl Default for MetaSpec {
        fn default() -> Self {
            MetaSpec { title: "test", lang: "en", timestamp: "T1", file_count: 1 }
        }
    }

    /// Lay out article units, returning the region bytes and each unit's
    /// pointer relative to the region start.
    pub(crate) fn article_region(payloads: &[Vec<u8>]) -> (Vec<u8>, Vec<u32>) {
        let mut region = Vec::new();
        let mut pointers = Vec::new();
        for payload in payloads {
            pointers.push(region.len() as u32);
            region.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            region.extend_from_slice(payload);
        }
        (region, pointers)
    }

    /// One complete volume. `entries` are `(word, file_no, article_ptr)` and
    /// must already be in collation order; continuation volumes pass none.
    pub(crate) fn volume_bytes(meta: &MetaSpec, entries: &[(&str, u32, u32)], articles: &[u8]) -> Vec<u8> {
        let index1_offset = (HEADER_LEN + META_LEN) as u64;
        let index2_offset = index1_offset + 12 * entries.len() as u64;

        let mut index1 = Vec::new();
        let mut key_pool = Vec::new();
        for (word, file_no, article_ptr) in entries {
            index1.extend_from_slice(&(key_pool.len() as u32).to_be_bytes());
            index1.extend_from_slice(&file_no.to_be_bytes());
            index1.extend_from_slice(&article_ptr.to_be_bytes());
            key_pool.extend_from_slice(&(word.len() as u32).to_be_bytes());
            key_pool.extend_from_slice(word.as_bytes());
        }
        let article_offset = index2_offset + key_pool.len() as u64;

        let blob = json!({
            "index1_offset": index1_offset,
            "index2_offset": index2_offset,
            "index_count": entries.len(),
            "article_count": entries.len(),
            "article_offset": article_offset,
            "file_count": meta.file_count,
            "timestamp": meta.timestamp,
            "index_language": meta.lang,
            "article_language": meta.lang,
            "title": meta.title,
            "aarddict_version": "1.0",
            "description": "synthetic dictionary",
            "copyright": "(c) test",
        })
        .to_string();
        assert!(blob.len() <= META_LEN, "metadata blob too large for fixture");

        let mut volume = Vec::new();
        volume.extend_from_slice(b"aar01");
        volume.extend_from_slice(format!("{META_LEN:08}").as_bytes());
        volume.extend_from_slice(format!("{blob:<META_LEN$}").as_bytes());
        volume.extend_from_slice(&index1);
        volume.extend_from_slice(&key_pool);
        volume.extend_from_slice(articles);
        volume
    }

    /// JSON article payload with no tags, zlib-compressed.
    pub(crate) fn compressed_article(text: &str) -> Vec<u8> {
        use std::io::Write;
        let payload = json!([text, []]).to_string();
        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(payload.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    /// Write a single-volume dictionary into `dir` and return its path.
    pub(crate) fn write_simple(
        dir: &std::path::Path, name: &str, title: &'static str, lang: &'static str, words: &[&str],
    ) -> std::path::PathBuf {
        let payloads: Vec<Vec<u8>> = words.iter().map(|w| compressed_article(&format!("article for {w}"))).collect();
        let (region, pointers) = article_region(&payloads);
        let entries: Vec<(&str, u32, u32)> = words.iter().zip(&pointers).map(|(w, p)| (*w, 0, *p)).collect();
        let meta = MetaSpec { title, lang, ..MetaSpec::default() };
        let path = dir.join(name);
        std::fs::write(&path, volume_bytes(&meta, &entries, &region)).unwrap();
        path
    }
}
