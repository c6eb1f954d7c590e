//! Grouping open dictionaries by index language.
use crate::article::Article;
use crate::dictionary::{ArticleHandle, Dictionary};
use crate::word::Word;
use crate::Result;
use std::collections::BTreeMap;

/// Cap on results taken from a single dictionary during a collection lookup.
pub const DEFAULT_MAX_FROM_ONE_DICT: usize = 50;

/// One query result: a word and the lazy handles of its articles.
#[derive(Debug)]
pub struct WordLookup<'a> {
    pub word: Word,
    pub articles: Vec<ArticleHandle<'a>>,
}

impl<'a> WordLookup<'a> {
    pub fn new(word: Word, article: ArticleHandle<'a>) -> Self {
        WordLookup { word, articles: vec![article] }
    }

    /// Evaluate all handles.
    pub fn read_articles(&self) -> Result<Vec<Article>> {
        self.articles.iter().map(|handle| handle.read()).collect()
    }
}

impl std::fmt::Display for WordLookup<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.word)
    }
}

/// Open dictionaries partitioned by index language. Queries stay within one
/// language bucket; there is no cross-language merge.
#[derive(Debug, Default)]
pub struct DictionaryCollection {
    dictionaries: BTreeMap<String, Vec<Dictionary>>,
}

impl DictionaryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dictionary to its language bucket.
    pub fn add(&mut self, dictionary: Dictionary) {
        self.dictionaries.entry(dictionary.index_language().to_owned()).or_default().push(dictionary);
    }

    /// Whether exactly one entry equal to `dictionary` sits in its language
    /// bucket. Equality is by `(title, version, file name)`.
    pub fn has(&self, dictionary: &Dictionary) -> bool {
        self.dictionaries
            .get(dictionary.index_language())
            .is_some_and(|bucket| bucket.iter().filter(|d| *d == dictionary).count() == 1)
    }

    /// Remove one entry equal to `dictionary`; an emptied bucket is dropped.
    /// Returns the removed dictionary so the caller can close it.
    pub fn remove(&mut self, dictionary: &Dictionary) -> Option<Dictionary> {
        let lang = dictionary.index_language().to_owned();
        let bucket = self.dictionaries.get_mut(&lang)?;
        let position = bucket.iter().position(|d| d == dictionary)?;
        let removed = bucket.remove(position);
        if bucket.is_empty() {
            self.dictionaries.remove(&lang);
        }
        Some(removed)
    }

    /// Total number of dictionaries across all buckets.
    pub fn len(&self) -> usize {
        self.dictionaries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionaries.is_empty()
    }

    /// All dictionaries, languages in sorted order, bucket order within.
    pub fn all(&self) -> impl Iterator<Item = &Dictionary> {
        self.dictionaries.values().flatten()
    }

    /// The known index languages, in sorted order.
    pub fn langs(&self) -> impl Iterator<Item = &str> {
        self.dictionaries.keys().map(String::as_str)
    }

    /// Prefix lookup across every dictionary of one language, taking at most
    /// `max_from_one_dict` results per dictionary. All results of a
    /// dictionary are emitted before any of the next one, in bucket order.
    pub fn lookup(&self, lang: &str, start_word: &str, max_from_one_dict: usize) -> Result<Vec<WordLookup<'_>>> {
        let mut results = Vec::new();
        if let Some(bucket) = self.dictionaries.get(lang) {
            for dictionary in bucket {
                for item in dictionary.prefix_lookup(start_word)?.take(max_from_one_dict) {
                    let (word, article) = item?;
                    results.push(WordLookup::new(word, article));
                }
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aar::testdata::write_simple;
    use crate::tests::init;
    use pretty_assertions::assert_eq;

    fn collection(dir: &std::path::Path) -> Result<DictionaryCollection> {
        let mut collection = DictionaryCollection::new();
        for (name, title, lang, words) in [
            ("en1.aar", "english one", "en", ["the", "theme", "this"]),
            ("en2.aar", "english two", "en", ["thaw", "the", "tide"]),
            ("fr1.aar", "french one", "fr", ["thé", "tisane", "tonneau"]),
        ] {
            collection.add(Dictionary::open(write_simple(dir, name, title, lang, &words))?);
        }
        Ok(collection)
    }

    #[test]
    fn buckets_and_counts() -> color_eyre::Result<()> {
        init();
        let dir = tempfile::tempdir()?;
        let mut collection = collection(dir.path())?;
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.langs().collect::<Vec<_>>(), ["en", "fr"]);
        assert_eq!(collection.all().count(), 3);

        let fr = Dictionary::open(dir.path().join("fr1.aar"))?;
        assert!(collection.has(&fr));
        let removed = collection.remove(&fr).expect("one french dictionary");
        assert_eq!(removed.title(), "french one");
        assert!(!collection.has(&fr));
        // the emptied bucket is gone
        assert_eq!(collection.langs().collect::<Vec<_>>(), ["en"]);
        assert_eq!(collection.len(), 2);
        assert!(collection.remove(&fr).is_none());
        Ok(())
    }

    #[test]
    fn has_means_exactly_one() -> color_eyre::Result<()> {
        init();
        let dir = tempfile::tempdir()?;
        let path = write_simple(dir.path(), "dup.aar", "dup", "en", &["word"]);
        let mut collection = DictionaryCollection::new();
        collection.add(Dictionary::open(&path)?);
        let probe = Dictionary::open(&path)?;
        assert!(collection.has(&probe));
        // a second equal entry makes the count two, not one
        collection.add(Dictionary::open(&path)?);
        assert!(!collection.has(&probe));
        assert_eq!(collection.len(), 2);
        Ok(())
    }

    #[test]
    fn lookup_is_language_partitioned_and_capped() -> color_eyre::Result<()> {
        init();
        let dir = tempfile::tempdir()?;
        let collection = collection(dir.path())?;

        // one result per dictionary, first dictionary's results first
        let capped = collection.lookup("en", "th", 1)?;
        let sources: Vec<String> =
            capped.iter().map(|l| l.articles[0].read().unwrap().source.unwrap().title).collect();
        assert_eq!(sources, ["english one", "english two"]);

        let all = collection.lookup("en", "th", DEFAULT_MAX_FROM_ONE_DICT)?;
        let words: Vec<&str> = all.iter().map(|l| l.word.text()).collect();
        assert_eq!(words, ["the", "theme", "this", "thaw", "the"]);

        // no cross-language leakage; "thé" folds to "the" only within fr
        let french = collection.lookup("fr", "the", DEFAULT_MAX_FROM_ONE_DICT)?;
        assert_eq!(french.len(), 1);
        assert_eq!(french[0].word.text(), "thé");
        assert_eq!(french[0].read_articles()?[0].text, "article for thé");

        assert!(collection.lookup("de", "th", 5)?.is_empty());
        Ok(())
    }
}
